//! Shared helpers for waypost integration tests.
//!
//! Everything runs against the in-memory adapter — no side effects
//! outside the test process.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::Value;
use waypost::adapter::memory::{MemoryAdapter, MemoryContent};
use waypost::manager::AutoRouteManager;
use waypost::metadata::{AutoRouteDefinition, ClassMetadata, MetadataFactory, ServiceBinding};
use waypost::model::types::{Locale, TokenName, TypeName};
use waypost::token::SubjectFieldProvider;

pub fn ty(name: &str) -> TypeName {
    TypeName::new(name).expect("valid type name")
}

pub fn locale(tag: &str) -> Locale {
    Locale::new(tag).expect("valid locale")
}

/// A `subject_field` binding reading the given field (slugified).
pub fn field_binding(field: &str) -> ServiceBinding {
    let mut options = BTreeMap::new();
    options.insert("field".to_owned(), Value::String(field.to_owned()));
    ServiceBinding::with_options("subject_field", options)
}

/// Metadata for a blog-ish type: `/blog/{category}/{slug}` with
/// auto-increment conflict resolution.
pub fn blog_metadata(type_name: &str) -> ClassMetadata {
    let mut meta = ClassMetadata::new(ty(type_name));
    meta.add_definition(
        "_default",
        AutoRouteDefinition::new("/blog/{category}/{slug}"),
    );
    meta.set_token_provider(TokenName::new("category").expect("token"), field_binding("category"));
    meta.set_token_provider(TokenName::new("slug").expect("token"), field_binding("slug"));
    meta.set_conflict_resolver(ServiceBinding::new("auto_increment"));
    meta
}

/// Manager over a fresh in-memory adapter with the `subject_field`
/// provider registered.
pub fn manager(metadatas: Vec<ClassMetadata>) -> AutoRouteManager<MemoryAdapter> {
    let mut factory = MetadataFactory::new();
    factory.add_metadatas(metadatas);
    let mut manager = AutoRouteManager::new(MemoryAdapter::new(), Rc::new(factory));
    register_field_provider(&mut manager);
    manager
}

/// Manager resolving through an externally-built factory.
pub fn manager_with_factory(factory: MetadataFactory) -> AutoRouteManager<MemoryAdapter> {
    let mut manager = AutoRouteManager::new(MemoryAdapter::new(), Rc::new(factory));
    register_field_provider(&mut manager);
    manager
}

fn register_field_provider(manager: &mut AutoRouteManager<MemoryAdapter>) {
    manager.generator_mut().providers_mut().register(
        "subject_field",
        Box::new(SubjectFieldProvider::new(
            |subject: &MemoryContent, field| subject.field(field).map(str::to_owned),
        )),
    );
}

/// An untranslated blog post with category and slug fields.
pub fn blog_post(id: &str, category: &str, slug: &str) -> MemoryContent {
    MemoryContent::new(id)
        .with_field("category", category)
        .with_field("slug", slug)
}
