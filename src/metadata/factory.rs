//! Metadata resolution across inheritance chains.
//!
//! The [`MetadataFactory`] folds a type's declared ancestor chain
//! (`subclass_of` links) and each ancestor's configuration-level `extends`
//! chain into one fully-merged [`ClassMetadata`]. Resolution order:
//!
//! 1. Walk `subclass_of` links from the queried type to the most remote
//!    ancestor.
//! 2. For each ancestor, most remote first, recursively resolve its own
//!    `extends` chain (extends only — never the ancestor chain).
//! 3. Fold left to right: later (more specific) metadata wins on scalar
//!    fields, definitions and token providers merge key-wise.
//!
//! A single visited list per resolution call detects cycles across both
//! link kinds; hitting any type twice fails with the full offending
//! chain. Fully resolved metadata is cached per type for the lifetime of
//! the factory; in-progress chains are never cached.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::error::WaypostError;
use crate::metadata::class::ClassMetadata;
use crate::model::types::TypeName;

// ---------------------------------------------------------------------------
// MetadataFactory
// ---------------------------------------------------------------------------

/// Resolves and caches merged routing metadata per content type.
#[derive(Debug, Default)]
pub struct MetadataFactory {
    metadatas: BTreeMap<TypeName, ClassMetadata>,
    cache: RefCell<BTreeMap<TypeName, Rc<ClassMetadata>>>,
}

impl MetadataFactory {
    /// Create an empty factory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register metadata for one or more types.
    ///
    /// Re-registering a type merges the new metadata onto the metadata
    /// already known for that type (the new registration wins key-wise).
    /// Any cached resolutions are discarded.
    pub fn add_metadatas(&mut self, metadatas: Vec<ClassMetadata>) {
        for metadata in metadatas {
            let type_name = metadata.type_name().clone();
            let merged = match self.metadatas.remove(&type_name) {
                Some(known) => known.merged_with(&metadata),
                None => metadata,
            };
            self.metadatas.insert(type_name, merged);
        }
        self.cache.borrow_mut().clear();
    }

    /// Resolve the fully-merged metadata for a type.
    ///
    /// # Errors
    /// - [`WaypostError::ClassNotMapped`] if the type, or a type one of
    ///   its links points at, has no registered metadata.
    /// - [`WaypostError::CircularReference`] if the `subclass_of` or
    ///   `extends` links loop.
    pub fn metadata_for_type(&self, type_name: &TypeName) -> Result<Rc<ClassMetadata>, WaypostError> {
        if let Some(hit) = self.cache.borrow().get(type_name) {
            return Ok(Rc::clone(hit));
        }

        let mut visited: Vec<TypeName> = Vec::new();
        let resolved = Rc::new(self.resolve_type(type_name, &mut visited)?);
        self.cache
            .borrow_mut()
            .insert(type_name.clone(), Rc::clone(&resolved));
        tracing::debug!(type_name = %type_name, "resolved routing metadata");
        Ok(resolved)
    }

    /// Resolve the declared ancestor chain of `type_name` and fold it.
    fn resolve_type(
        &self,
        type_name: &TypeName,
        visited: &mut Vec<TypeName>,
    ) -> Result<ClassMetadata, WaypostError> {
        // Most-derived first; reversed below so the most remote ancestor
        // becomes the fold base.
        let mut chain: Vec<&ClassMetadata> = Vec::new();
        let mut cursor = Some(type_name.clone());
        while let Some(current) = cursor {
            Self::visit(&current, visited)?;
            let metadata = self.lookup(&current)?;
            cursor = metadata.subclass_of().cloned();
            chain.push(metadata);
        }

        let mut ancestors = chain.into_iter().rev();
        let Some(root) = ancestors.next() else {
            return Err(WaypostError::ClassNotMapped {
                type_name: type_name.clone(),
            });
        };

        let mut resolved = self.resolve_extends(root, visited)?;
        for metadata in ancestors {
            let folded = self.resolve_extends(metadata, visited)?;
            resolved = resolved.merged_with(&folded);
        }
        Ok(resolved)
    }

    /// Resolve the configuration-level `extends` chain of one metadata.
    fn resolve_extends(
        &self,
        metadata: &ClassMetadata,
        visited: &mut Vec<TypeName>,
    ) -> Result<ClassMetadata, WaypostError> {
        let Some(target) = metadata.extended_type() else {
            return Ok(metadata.clone());
        };
        Self::visit(target, visited)?;
        let target_metadata = self.lookup(target)?;
        let base = self.resolve_extends(target_metadata, visited)?;
        Ok(base.merged_with(metadata))
    }

    fn lookup(&self, type_name: &TypeName) -> Result<&ClassMetadata, WaypostError> {
        self.metadatas
            .get(type_name)
            .ok_or_else(|| WaypostError::ClassNotMapped {
                type_name: type_name.clone(),
            })
    }

    fn visit(type_name: &TypeName, visited: &mut Vec<TypeName>) -> Result<(), WaypostError> {
        if visited.contains(type_name) {
            let mut chain = visited.clone();
            chain.push(type_name.clone());
            return Err(WaypostError::CircularReference { chain });
        }
        visited.push(type_name.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::class::{AutoRouteDefinition, ServiceBinding};
    use crate::model::types::TokenName;

    fn ty(name: &str) -> TypeName {
        TypeName::new(name).unwrap()
    }

    fn token(name: &str) -> TokenName {
        TokenName::new(name).unwrap()
    }

    fn factory_with(metadatas: Vec<ClassMetadata>) -> MetadataFactory {
        let mut factory = MetadataFactory::new();
        factory.add_metadatas(metadatas);
        factory
    }

    #[test]
    fn unmapped_type_fails() {
        let factory = MetadataFactory::new();
        let err = factory.metadata_for_type(&ty("ghost")).unwrap_err();
        assert!(matches!(err, WaypostError::ClassNotMapped { .. }));
    }

    #[test]
    fn single_type_resolves_to_itself() {
        let mut meta = ClassMetadata::new(ty("page"));
        meta.add_definition("_default", AutoRouteDefinition::new("/pages/{slug}"));
        let factory = factory_with(vec![meta]);

        let resolved = factory.metadata_for_type(&ty("page")).unwrap();
        assert_eq!(resolved.definitions()["_default"].schema, "/pages/{slug}");
    }

    #[test]
    fn extends_chain_splices_parent_schema_and_merges_providers() {
        let mut base = ClassMetadata::new(ty("base"));
        base.add_definition("one", AutoRouteDefinition::new("/{category}"));
        base.set_token_provider(token("category"), ServiceBinding::new("base_category"));
        base.set_token_provider(token("title"), ServiceBinding::new("base_title"));

        let mut child = ClassMetadata::new(ty("child"));
        child.set_extended_type(ty("base"));
        child.add_definition("one", AutoRouteDefinition::new("{parent}/{title}"));
        child.set_token_provider(token("title"), ServiceBinding::new("child_title"));

        let factory = factory_with(vec![base, child]);
        let resolved = factory.metadata_for_type(&ty("child")).unwrap();

        assert_eq!(resolved.definitions()["one"].schema, "/{category}/{title}");
        // Child-declared provider overrides; base-only provider is preserved.
        assert_eq!(resolved.token_providers()[&token("title")].name, "child_title");
        assert_eq!(
            resolved.token_providers()[&token("category")].name,
            "base_category"
        );
    }

    #[test]
    fn subclass_chain_folds_most_remote_first() {
        let mut grandparent = ClassMetadata::new(ty("content"));
        grandparent.add_definition("_default", AutoRouteDefinition::new("/content/{slug}"));
        grandparent.set_conflict_resolver(ServiceBinding::new("auto_increment"));

        let mut parent = ClassMetadata::new(ty("post"));
        parent.set_subclass_of(ty("content"));
        parent.add_definition("_default", AutoRouteDefinition::new("/posts/{slug}"));

        let mut child = ClassMetadata::new(ty("news_post"));
        child.set_subclass_of(ty("post"));

        let factory = factory_with(vec![grandparent, parent, child]);
        let resolved = factory.metadata_for_type(&ty("news_post")).unwrap();

        // The middle type's definition wins over the most remote one.
        assert_eq!(resolved.definitions()["_default"].schema, "/posts/{slug}");
        // Strategy bindings survive the fold.
        assert_eq!(resolved.conflict_resolver().name, "auto_increment");
        assert_eq!(resolved.type_name(), &ty("news_post"));
    }

    #[test]
    fn extends_cycle_is_detected_with_chain() {
        let mut a = ClassMetadata::new(ty("a"));
        a.set_extended_type(ty("b"));
        let mut b = ClassMetadata::new(ty("b"));
        b.set_extended_type(ty("a"));

        let factory = factory_with(vec![a, b]);
        let err = factory.metadata_for_type(&ty("a")).unwrap_err();
        match err {
            WaypostError::CircularReference { chain } => {
                assert_eq!(chain.first(), Some(&ty("a")));
                assert_eq!(chain.last(), Some(&ty("a")));
                assert!(chain.contains(&ty("b")));
            }
            other => panic!("expected CircularReference, got {other:?}"),
        }
    }

    #[test]
    fn self_extends_is_detected() {
        let mut a = ClassMetadata::new(ty("a"));
        a.set_extended_type(ty("a"));

        let factory = factory_with(vec![a]);
        let err = factory.metadata_for_type(&ty("a")).unwrap_err();
        assert!(matches!(err, WaypostError::CircularReference { .. }));
    }

    #[test]
    fn subclass_cycle_is_detected() {
        let mut a = ClassMetadata::new(ty("a"));
        a.set_subclass_of(ty("b"));
        let mut b = ClassMetadata::new(ty("b"));
        b.set_subclass_of(ty("a"));

        let factory = factory_with(vec![a, b]);
        let err = factory.metadata_for_type(&ty("b")).unwrap_err();
        assert!(matches!(err, WaypostError::CircularReference { .. }));
    }

    #[test]
    fn link_to_unmapped_type_fails() {
        let mut a = ClassMetadata::new(ty("a"));
        a.set_extended_type(ty("missing"));

        let factory = factory_with(vec![a]);
        let err = factory.metadata_for_type(&ty("a")).unwrap_err();
        match err {
            WaypostError::ClassNotMapped { type_name } => assert_eq!(type_name, ty("missing")),
            other => panic!("expected ClassNotMapped, got {other:?}"),
        }
    }

    #[test]
    fn resolution_is_cached() {
        let mut meta = ClassMetadata::new(ty("page"));
        meta.add_definition("_default", AutoRouteDefinition::new("/p/{slug}"));
        let factory = factory_with(vec![meta]);

        let first = factory.metadata_for_type(&ty("page")).unwrap();
        let second = factory.metadata_for_type(&ty("page")).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn reregistering_a_type_merges_onto_known_metadata() {
        let mut first = ClassMetadata::new(ty("page"));
        first.add_definition("_default", AutoRouteDefinition::new("/{section}"));

        let mut second = ClassMetadata::new(ty("page"));
        second.add_definition("_default", AutoRouteDefinition::new("{parent}/{slug}"));

        let mut factory = MetadataFactory::new();
        factory.add_metadatas(vec![first]);
        factory.add_metadatas(vec![second]);

        let resolved = factory.metadata_for_type(&ty("page")).unwrap();
        assert_eq!(resolved.definitions()["_default"].schema, "/{section}/{slug}");
    }
}
