//! Declarative metadata configuration (`routes.toml`).
//!
//! Parses typed TOML into [`ClassMetadata`] values. Unknown fields are
//! rejected; identifier validation (type names, token names, the
//! reserved `schema` token) happens during conversion so defects surface
//! with the offending value named.
//!
//! ```toml
//! [types.article]
//! extends = "seo-base"
//!
//! [types.article.definitions._default]
//! schema = "/articles/{category}/{slug}"
//! defaults = { controller = "article" }
//!
//! [types.article.token_providers.slug]
//! name = "subject_field"
//! options = { field = "title" }
//!
//! [types.article.conflict_resolver]
//! name = "auto_increment"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::WaypostError;
use crate::metadata::class::{AutoRouteDefinition, ClassMetadata, ServiceBinding};
use crate::model::types::{TokenName, TypeName};

// ---------------------------------------------------------------------------
// Raw file shape
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MetadataFile {
    /// Per-type routing configuration, keyed by type name.
    #[serde(default)]
    types: BTreeMap<String, TypeConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TypeConfig {
    /// Declared type-hierarchy ancestor.
    subclass_of: Option<String>,

    /// Configuration-level inheritance link.
    extends: Option<String>,

    /// Route definitions, keyed by definition name (e.g. `_default`).
    #[serde(default)]
    definitions: BTreeMap<String, DefinitionConfig>,

    /// Token provider bindings, keyed by token name.
    #[serde(default)]
    token_providers: BTreeMap<String, BindingConfig>,

    /// Conflict resolver binding (default: `throw`).
    conflict_resolver: Option<BindingConfig>,

    /// Defunct route handler binding (default: `remove`).
    defunct_handler: Option<BindingConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DefinitionConfig {
    /// URI schema with `{token}` placeholders.
    schema: String,

    /// Default key/value pairs applied to the resulting route.
    #[serde(default)]
    defaults: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BindingConfig {
    /// Registry name of the bound implementation.
    name: String,

    /// Options passed through to the implementation.
    #[serde(default)]
    options: BTreeMap<String, toml::Value>,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Parse metadata from a TOML string.
///
/// # Errors
/// - [`WaypostError::Config`] on TOML syntax errors or unknown fields.
/// - [`WaypostError::Validation`] for invalid type or token names
///   (including the reserved `schema` token).
pub fn load_from_str(source: &str) -> Result<Vec<ClassMetadata>, WaypostError> {
    let file: MetadataFile = toml::from_str(source).map_err(|err| WaypostError::Config {
        path: None,
        detail: err.to_string(),
    })?;

    let mut metadatas = Vec::with_capacity(file.types.len());
    for (name, config) in file.types {
        metadatas.push(convert_type(&name, config)?);
    }
    Ok(metadatas)
}

/// Parse metadata from a TOML file on disk.
///
/// # Errors
/// As [`load_from_str`], with the file path attached to configuration
/// errors; unreadable files are configuration errors too.
pub fn load_from_path(path: &Path) -> Result<Vec<ClassMetadata>, WaypostError> {
    let source = fs::read_to_string(path).map_err(|err| WaypostError::Config {
        path: Some(path.to_path_buf()),
        detail: err.to_string(),
    })?;
    load_from_str(&source).map_err(|err| match err {
        WaypostError::Config { path: None, detail } => WaypostError::Config {
            path: Some(path.to_path_buf()),
            detail,
        },
        other => other,
    })
}

fn convert_type(name: &str, config: TypeConfig) -> Result<ClassMetadata, WaypostError> {
    let mut metadata = ClassMetadata::new(TypeName::new(name)?);

    if let Some(target) = config.subclass_of {
        metadata.set_subclass_of(TypeName::new(&target)?);
    }
    if let Some(target) = config.extends {
        metadata.set_extended_type(TypeName::new(&target)?);
    }
    for (defn_name, defn) in config.definitions {
        let mut definition = AutoRouteDefinition::new(defn.schema);
        definition.defaults = defn.defaults;
        metadata.add_definition(defn_name, definition);
    }
    for (token, binding) in config.token_providers {
        metadata.set_token_provider(TokenName::new(&token)?, convert_binding(binding));
    }
    if let Some(binding) = config.conflict_resolver {
        metadata.set_conflict_resolver(convert_binding(binding));
    }
    if let Some(binding) = config.defunct_handler {
        metadata.set_defunct_route_handler(convert_binding(binding));
    }
    Ok(metadata)
}

fn convert_binding(config: BindingConfig) -> ServiceBinding {
    let options = config
        .options
        .into_iter()
        .map(|(name, value)| (name, to_json(value)))
        .collect();
    ServiceBinding::with_options(config.name, options)
}

/// Convert a TOML value to the engine's option value type.
fn to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::Value::Number(i.into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map_or(serde_json::Value::Null, serde_json::Value::Number),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(to_json).collect())
        }
        toml::Value::Table(table) => serde_json::Value::Object(
            table
                .into_iter()
                .map(|(name, value)| (name, to_json(value)))
                .collect(),
        ),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
