//! Routing metadata: per-type configuration and its resolution.

pub mod class;
pub mod factory;

pub use class::{AutoRouteDefinition, ClassMetadata, ServiceBinding};
pub use factory::MetadataFactory;
