//! Unified error type for Waypost.
//!
//! Defines [`WaypostError`], the single error type for metadata
//! resolution, URI generation, conflict resolution, and route lifecycle
//! operations. Every variant describes a configuration or provider defect
//! that the caller must fix; nothing here is retried internally.

use std::fmt;
use std::path::PathBuf;

use crate::model::types::{TypeName, ValidationError};

// ---------------------------------------------------------------------------
// WaypostError
// ---------------------------------------------------------------------------

/// Unified error type for routing operations.
///
/// All variants are fatal and surface synchronously at the point of
/// detection. Messages carry enough context (token, provider, schema,
/// type) that the offending configuration can be located without a
/// debugger.
#[derive(Debug)]
pub enum WaypostError {
    /// A type's `extends`/`subclass_of` chain loops back on itself.
    CircularReference {
        /// The resolution chain, in visit order, ending at the repeated type.
        chain: Vec<TypeName>,
    },

    /// No routing metadata is registered for the requested type.
    ClassNotMapped {
        /// The type that has no configuration.
        type_name: TypeName,
    },

    /// A schema references a token with no provider binding on the context.
    UnknownToken {
        /// The unbound token name.
        token: String,
        /// The schema that references it.
        schema: String,
    },

    /// A token binding names a provider that is not registered.
    UnknownTokenProvider {
        /// The unregistered provider name.
        name: String,
    },

    /// A conflict-resolver binding names a strategy that is not registered.
    UnknownConflictResolver {
        /// The unregistered strategy name.
        name: String,
    },

    /// A defunct-handler binding names a strategy that is not registered.
    UnknownDefunctHandler {
        /// The unregistered handler name.
        name: String,
    },

    /// A token binding configures an option its provider does not declare.
    UnknownProviderOption {
        /// The provider whose option set was violated.
        provider: String,
        /// The unrecognized option name.
        option: String,
    },

    /// A required provider option was not configured.
    MissingProviderOption {
        /// The provider that requires the option.
        provider: String,
        /// The missing option name.
        option: String,
    },

    /// A provider produced an empty value and `allow_empty` is off.
    EmptyTokenValue {
        /// The provider that produced the empty value.
        provider: String,
        /// The token being substituted.
        token: String,
        /// The schema being generated.
        schema: String,
    },

    /// A provider rejected its input or produced an unusable value.
    ProviderValue {
        /// The provider reporting the failure.
        provider: String,
        /// Human-readable description of the problem.
        detail: String,
    },

    /// Token substitution produced a URI that does not start with `/`.
    MalformedUri {
        /// The malformed result.
        uri: String,
        /// The subject type whose schema produced it.
        type_name: TypeName,
    },

    /// The `throw` conflict strategy found the URI already taken.
    ExistingUri {
        /// The conflicting URI.
        uri: String,
    },

    /// Conflict resolution was requested for a context with no generated URI.
    UriNotGenerated {
        /// The route definition the context was built from.
        definition: String,
    },

    /// The persistence adapter reported a failure.
    Adapter {
        /// Human-readable description from the adapter.
        detail: String,
    },

    /// A metadata configuration file could not be loaded or parsed.
    Config {
        /// Path to the configuration file, if it was read from disk.
        path: Option<PathBuf>,
        /// Human-readable description of the problem.
        detail: String,
    },

    /// An identifier value failed validation.
    Validation(ValidationError),
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for WaypostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CircularReference { chain } => {
                write!(f, "circular metadata reference: ")?;
                for (i, ty) in chain.iter().enumerate() {
                    if i > 0 {
                        write!(f, " -> ")?;
                    }
                    write!(f, "'{ty}'")?;
                }
                write!(f, ". Break the extends/subclass_of loop in the routing configuration.")
            }
            Self::ClassNotMapped { type_name } => {
                write!(
                    f,
                    "no routing metadata mapped for type '{type_name}'. Register it with the metadata factory or add it to the routing configuration."
                )
            }
            Self::UnknownToken { token, schema } => {
                write!(
                    f,
                    "unknown token '{{{token}}}' in schema '{schema}': no token provider is bound for it on this type"
                )
            }
            Self::UnknownTokenProvider { name } => {
                write!(f, "token provider '{name}' is not registered")
            }
            Self::UnknownConflictResolver { name } => {
                write!(f, "conflict resolver '{name}' is not registered")
            }
            Self::UnknownDefunctHandler { name } => {
                write!(f, "defunct route handler '{name}' is not registered")
            }
            Self::UnknownProviderOption { provider, option } => {
                write!(
                    f,
                    "token provider '{provider}' does not recognize option '{option}'"
                )
            }
            Self::MissingProviderOption { provider, option } => {
                write!(
                    f,
                    "token provider '{provider}' requires option '{option}', which is not configured"
                )
            }
            Self::EmptyTokenValue {
                provider,
                token,
                schema,
            } => {
                write!(
                    f,
                    "token provider '{provider}' returned an empty value for token '{{{token}}}' in schema '{schema}'. Set allow_empty = true on the token to collapse empty segments."
                )
            }
            Self::ProviderValue { provider, detail } => {
                write!(f, "token provider '{provider}': {detail}")
            }
            Self::MalformedUri { uri, type_name } => {
                write!(
                    f,
                    "generated URI '{uri}' for type '{type_name}' is not absolute: the schema must produce a path starting with '/'"
                )
            }
            Self::ExistingUri { uri } => {
                write!(
                    f,
                    "URI '{uri}' already exists and automatic conflict resolution is disabled for this type"
                )
            }
            Self::UriNotGenerated { definition } => {
                write!(
                    f,
                    "conflict resolution invoked for definition '{definition}' before a URI was generated"
                )
            }
            Self::Adapter { detail } => {
                write!(f, "adapter failure: {detail}")
            }
            Self::Config { path, detail } => match path {
                Some(p) => write!(
                    f,
                    "routing configuration error in '{}': {detail}",
                    p.display()
                ),
                None => write!(f, "routing configuration error: {detail}"),
            },
            Self::Validation(err) => fmt::Display::fmt(err, f),
        }
    }
}

// ---------------------------------------------------------------------------
// std::error::Error
// ---------------------------------------------------------------------------

impl std::error::Error for WaypostError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// From impls
// ---------------------------------------------------------------------------

impl From<ValidationError> for WaypostError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
