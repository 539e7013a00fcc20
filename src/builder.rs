//! Structural expansion of a subject into URI contexts.
//!
//! The builder turns one subject into its full working set: one
//! [`UriContext`](crate::context::UriContext) per (route definition ×
//! locale). No URI generation and no conflict handling happens here.

use std::rc::Rc;

use crate::adapter::Adapter;
use crate::context::UriContextCollection;
use crate::error::WaypostError;
use crate::metadata::MetadataFactory;
use crate::model::types::Locale;

/// Expands a collection with one context per (definition × locale).
#[derive(Debug)]
pub struct UriContextCollectionBuilder {
    factory: Rc<MetadataFactory>,
}

impl UriContextCollectionBuilder {
    /// Create a builder resolving metadata through `factory`.
    #[must_use]
    pub const fn new(factory: Rc<MetadataFactory>) -> Self {
        Self { factory }
    }

    /// The metadata factory this builder resolves through.
    #[must_use]
    pub fn factory(&self) -> Rc<MetadataFactory> {
        Rc::clone(&self.factory)
    }

    /// Populate `collection` with contexts.
    ///
    /// Canonicalizes the declared type via the adapter (proxying is an
    /// adapter concern), resolves the merged metadata, then appends one
    /// context per definition (resolution order) per locale (adapter
    /// order). An untranslated subject gets a single "no locale" context.
    ///
    /// # Errors
    /// Propagates metadata resolution failures unchanged.
    pub fn build<A: Adapter>(
        &self,
        collection: &mut UriContextCollection<A::Subject>,
        adapter: &A,
    ) -> Result<(), WaypostError> {
        let canonical = adapter.real_type_name(collection.type_name());
        collection.set_type_name(canonical.clone());
        let metadata = self.factory.metadata_for_type(&canonical)?;

        let subject = collection.subject();
        let mut locales: Vec<Option<Locale>> =
            adapter.locales(&subject).into_iter().map(Some).collect();
        if locales.is_empty() {
            locales.push(None);
        }

        for (name, definition) in metadata.definitions() {
            for locale in &locales {
                let context = collection.create_uri_context(
                    name,
                    definition,
                    metadata.token_providers(),
                    metadata.conflict_resolver(),
                    locale.clone(),
                );
                collection.push(context);
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
