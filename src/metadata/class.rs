//! Per-type routing metadata.
//!
//! A [`ClassMetadata`] holds everything the engine needs to route one
//! content type: its URI schema definitions, token provider bindings,
//! strategy bindings, and the two inheritance links (`subclass_of` for the
//! declared type hierarchy, `extended_type` for configuration-level
//! reuse). Metadata merges non-destructively: folding a more-specific
//! metadata onto a less-specific base produces a new value and never
//! mutates either input.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::model::types::{TokenName, TypeName};

/// Strategy name for the default conflict resolver (fail on collision).
pub const DEFAULT_CONFLICT_RESOLVER: &str = "throw";

/// Strategy name for the default defunct-route handler.
pub const DEFAULT_DEFUNCT_HANDLER: &str = "remove";

// ---------------------------------------------------------------------------
// ServiceBinding
// ---------------------------------------------------------------------------

/// A named strategy binding with its configured options.
///
/// Used uniformly for token providers, conflict resolvers, and
/// defunct-route handlers: the name selects a registered implementation,
/// the options parameterize it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceBinding {
    /// Registry name of the bound implementation.
    pub name: String,
    /// Configured options, passed through to the implementation.
    pub options: BTreeMap<String, Value>,
}

impl ServiceBinding {
    /// Create a binding with no options.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: BTreeMap::new(),
        }
    }

    /// Create a binding with options.
    #[must_use]
    pub fn with_options(name: impl Into<String>, options: BTreeMap<String, Value>) -> Self {
        Self {
            name: name.into(),
            options,
        }
    }
}

// ---------------------------------------------------------------------------
// AutoRouteDefinition
// ---------------------------------------------------------------------------

/// One URI schema variant within a type's metadata.
///
/// The schema string contains `{token}` placeholders resolved at
/// generation time, plus the literal magic placeholder `{parent}` which is
/// only meaningful during merge: merging a child definition onto a base
/// splices the base's full schema in place of `{parent}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AutoRouteDefinition {
    /// The URI schema, e.g. `"/blog/{category}/{slug}"`.
    pub schema: String,
    /// Default key/value pairs applied to the resulting route.
    pub defaults: BTreeMap<String, String>,
}

impl AutoRouteDefinition {
    /// Create a definition with no defaults.
    #[must_use]
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            defaults: BTreeMap::new(),
        }
    }

    /// Merge this (child) definition onto a base definition.
    ///
    /// The child's `{parent}` placeholder is replaced by the base's full
    /// schema; the child's defaults win on key collision.
    #[must_use]
    pub fn merged_onto(&self, base: &Self) -> Self {
        let schema = self.schema.replace("{parent}", &base.schema);
        let mut defaults = base.defaults.clone();
        defaults.extend(self.defaults.clone());
        Self { schema, defaults }
    }
}

// ---------------------------------------------------------------------------
// ClassMetadata
// ---------------------------------------------------------------------------

/// Routing metadata for one content type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassMetadata {
    type_name: TypeName,
    definitions: BTreeMap<String, AutoRouteDefinition>,
    token_providers: BTreeMap<TokenName, ServiceBinding>,
    conflict_resolver: Option<ServiceBinding>,
    defunct_route_handler: Option<ServiceBinding>,
    extended_type: Option<TypeName>,
    subclass_of: Option<TypeName>,
}

impl ClassMetadata {
    /// Create empty metadata for a type.
    #[must_use]
    pub const fn new(type_name: TypeName) -> Self {
        Self {
            type_name,
            definitions: BTreeMap::new(),
            token_providers: BTreeMap::new(),
            conflict_resolver: None,
            defunct_route_handler: None,
            extended_type: None,
            subclass_of: None,
        }
    }

    /// The type this metadata describes.
    #[must_use]
    pub const fn type_name(&self) -> &TypeName {
        &self.type_name
    }

    /// Add (or replace) a named route definition.
    pub fn add_definition(&mut self, name: impl Into<String>, definition: AutoRouteDefinition) {
        self.definitions.insert(name.into(), definition);
    }

    /// All route definitions, keyed by definition name.
    ///
    /// `BTreeMap` keeps iteration order deterministic, which fixes the
    /// context creation order for a build.
    #[must_use]
    pub const fn definitions(&self) -> &BTreeMap<String, AutoRouteDefinition> {
        &self.definitions
    }

    /// Bind a token provider for a token name.
    ///
    /// The reserved token name is already rejected by
    /// [`TokenName::new`], so this cannot bind `schema`.
    pub fn set_token_provider(&mut self, token: TokenName, binding: ServiceBinding) {
        self.token_providers.insert(token, binding);
    }

    /// All token provider bindings.
    #[must_use]
    pub const fn token_providers(&self) -> &BTreeMap<TokenName, ServiceBinding> {
        &self.token_providers
    }

    /// Set the conflict resolver binding.
    pub fn set_conflict_resolver(&mut self, binding: ServiceBinding) {
        self.conflict_resolver = Some(binding);
    }

    /// The effective conflict resolver binding (default: `throw`).
    #[must_use]
    pub fn conflict_resolver(&self) -> ServiceBinding {
        self.conflict_resolver
            .clone()
            .unwrap_or_else(|| ServiceBinding::new(DEFAULT_CONFLICT_RESOLVER))
    }

    /// Set the defunct-route handler binding.
    pub fn set_defunct_route_handler(&mut self, binding: ServiceBinding) {
        self.defunct_route_handler = Some(binding);
    }

    /// The effective defunct-route handler binding (default: `remove`).
    #[must_use]
    pub fn defunct_route_handler(&self) -> ServiceBinding {
        self.defunct_route_handler
            .clone()
            .unwrap_or_else(|| ServiceBinding::new(DEFAULT_DEFUNCT_HANDLER))
    }

    /// Set the configuration-level `extends` link.
    pub fn set_extended_type(&mut self, target: TypeName) {
        self.extended_type = Some(target);
    }

    /// The configuration-level `extends` link, if any.
    #[must_use]
    pub const fn extended_type(&self) -> Option<&TypeName> {
        self.extended_type.as_ref()
    }

    /// Set the declared type-hierarchy ancestor link.
    pub fn set_subclass_of(&mut self, target: TypeName) {
        self.subclass_of = Some(target);
    }

    /// The declared type-hierarchy ancestor link, if any.
    #[must_use]
    pub const fn subclass_of(&self) -> Option<&TypeName> {
        self.subclass_of.as_ref()
    }

    /// Merge a more-specific metadata onto this one.
    ///
    /// Returns a new metadata carrying the child's type name and links.
    /// Definitions merge key-wise with `{parent}` splicing; token
    /// providers merge key-wise with the child overriding; strategy
    /// bindings fall back to the base when the child leaves them unset.
    #[must_use]
    pub fn merged_with(&self, child: &Self) -> Self {
        let mut definitions = self.definitions.clone();
        for (name, child_defn) in &child.definitions {
            let merged = match self.definitions.get(name) {
                Some(base_defn) => child_defn.merged_onto(base_defn),
                None => child_defn.clone(),
            };
            definitions.insert(name.clone(), merged);
        }

        let mut token_providers = self.token_providers.clone();
        token_providers.extend(
            child
                .token_providers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );

        Self {
            type_name: child.type_name.clone(),
            definitions,
            token_providers,
            conflict_resolver: child
                .conflict_resolver
                .clone()
                .or_else(|| self.conflict_resolver.clone()),
            defunct_route_handler: child
                .defunct_route_handler
                .clone()
                .or_else(|| self.defunct_route_handler.clone()),
            extended_type: child.extended_type.clone(),
            subclass_of: child.subclass_of.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
