//! Conflict resolution strategies.
//!
//! When a generated URI is already claimed by a different route, the
//! context's bound strategy decides what happens: `auto_increment`
//! searches for a free `-N` suffix, `throw` fails, and custom strategies
//! can register under any free name.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::adapter::Adapter;
use crate::context::{UriContext, UriContextCollection};
use crate::error::WaypostError;
use crate::model::types::Uri;

/// Registry name of [`AutoIncrementResolver`].
pub const AUTO_INCREMENT: &str = "auto_increment";

/// Registry name of [`ThrowResolver`].
pub const THROW: &str = "throw";

// ---------------------------------------------------------------------------
// ConflictResolver
// ---------------------------------------------------------------------------

/// A pluggable URI conflict strategy.
pub trait ConflictResolver<A: Adapter> {
    /// Produce a non-conflicting URI for the context, or fail.
    ///
    /// The collection is the in-flight working set (checked before the
    /// persisted store: batch membership is authoritative and cheaper);
    /// the adapter provides persisted lookup.
    ///
    /// # Errors
    /// Strategy-specific; `throw` always fails with the conflicting URI.
    fn resolve_conflict(
        &self,
        collection: &UriContextCollection<A::Subject>,
        context: &UriContext<A::Subject>,
        adapter: &A,
        options: &BTreeMap<String, Value>,
    ) -> Result<Uri, WaypostError>;
}

/// Name-keyed registry of conflict strategies.
pub struct ConflictResolverRegistry<A: Adapter> {
    resolvers: BTreeMap<String, Box<dyn ConflictResolver<A>>>,
}

impl<A: Adapter> ConflictResolverRegistry<A> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            resolvers: BTreeMap::new(),
        }
    }

    /// Register a strategy under a name, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, resolver: Box<dyn ConflictResolver<A>>) {
        self.resolvers.insert(name.into(), resolver);
    }

    /// Look up a strategy by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn ConflictResolver<A>> {
        self.resolvers.get(name).map(Box::as_ref)
    }
}

impl<A: Adapter> Default for ConflictResolverRegistry<A> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// AutoIncrementResolver
// ---------------------------------------------------------------------------

/// Appends `-1`, `-2`, `-3`, … to the generated URI until a candidate is
/// free in both the collection and the persisted store.
///
/// Intentionally unbounded: an environment where every candidate
/// conflicts will loop forever. Capping here would silently change which
/// URI a pathological configuration receives, so the liveness risk is
/// documented instead.
#[derive(Clone, Copy, Debug, Default)]
pub struct AutoIncrementResolver;

impl<A: Adapter> ConflictResolver<A> for AutoIncrementResolver {
    fn resolve_conflict(
        &self,
        collection: &UriContextCollection<A::Subject>,
        context: &UriContext<A::Subject>,
        adapter: &A,
        _options: &BTreeMap<String, Value>,
    ) -> Result<Uri, WaypostError> {
        let base = context
            .uri()
            .ok_or_else(|| WaypostError::UriNotGenerated {
                definition: context.definition_name().to_owned(),
            })?
            .clone();

        let mut n: u64 = 1;
        loop {
            let candidate = Uri::new(&format!("{base}-{n}"))?;
            let taken = collection.context_for_uri(&candidate).is_some()
                || adapter.route_for_uri(&candidate, context).is_some();
            if !taken {
                tracing::debug!(uri = %candidate, tries = n, "resolved URI conflict");
                return Ok(candidate);
            }
            n += 1;
        }
    }
}

// ---------------------------------------------------------------------------
// ThrowResolver
// ---------------------------------------------------------------------------

/// Unconditionally fails, naming the conflicting URI.
///
/// This is the default strategy: types that want automatic resolution
/// must opt in explicitly.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThrowResolver;

impl<A: Adapter> ConflictResolver<A> for ThrowResolver {
    fn resolve_conflict(
        &self,
        _collection: &UriContextCollection<A::Subject>,
        context: &UriContext<A::Subject>,
        _adapter: &A,
        _options: &BTreeMap<String, Value>,
    ) -> Result<Uri, WaypostError> {
        let uri = context
            .uri()
            .ok_or_else(|| WaypostError::UriNotGenerated {
                definition: context.definition_name().to_owned(),
            })?;
        Err(WaypostError::ExistingUri {
            uri: uri.as_str().to_owned(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
