//! Core identifier types for Waypost.
//!
//! Foundation newtypes used throughout the engine: content type names,
//! schema token names, locales, generated URIs, and persisted-route
//! identifiers. Each type validates on construction so the rest of the
//! engine can assume well-formed values.

use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// TypeName
// ---------------------------------------------------------------------------

/// A content type identifier (e.g. `"article"`, `"app.blog_post"`).
///
/// Routing metadata is keyed by type name; both configuration-level
/// `extends` links and declared `subclass_of` links refer to other types
/// by this name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName(String);

impl TypeName {
    /// Create a new `TypeName`, validating format.
    ///
    /// # Errors
    /// Returns an error if the name is empty or contains whitespace.
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.is_empty() {
            return Err(ValidationError {
                kind: ErrorKind::TypeName,
                value: s.to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }
        if s.chars().any(char::is_whitespace) {
            return Err(ValidationError {
                kind: ErrorKind::TypeName,
                value: s.to_owned(),
                reason: "must not contain whitespace".to_owned(),
            });
        }
        Ok(Self(s.to_owned()))
    }

    /// Return the inner string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TypeName {
    type Err = ValidationError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

// ---------------------------------------------------------------------------
// TokenName
// ---------------------------------------------------------------------------

/// The token name `"schema"` is reserved for the engine itself and can
/// never be bound to a provider.
pub const RESERVED_TOKEN: &str = "schema";

/// A named `{token}` placeholder in a URI schema.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenName(String);

impl TokenName {
    /// Create a new `TokenName`, validating format.
    ///
    /// # Errors
    /// Returns an error if the name is empty, contains characters other
    /// than ASCII alphanumerics and `_`, or is the reserved name
    /// [`RESERVED_TOKEN`].
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.is_empty() {
            return Err(ValidationError {
                kind: ErrorKind::TokenName,
                value: s.to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }
        if !s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ValidationError {
                kind: ErrorKind::TokenName,
                value: s.to_owned(),
                reason: "must contain only ASCII alphanumerics and '_'".to_owned(),
            });
        }
        if s == RESERVED_TOKEN {
            return Err(ValidationError {
                kind: ErrorKind::TokenName,
                value: s.to_owned(),
                reason: format!("'{RESERVED_TOKEN}' is reserved"),
            });
        }
        Ok(Self(s.to_owned()))
    }

    /// Return the inner string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TokenName {
    type Err = ValidationError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

// ---------------------------------------------------------------------------
// Locale
// ---------------------------------------------------------------------------

/// A locale tag (e.g. `"de"`, `"fr-CH"`).
///
/// "No locale" is represented as `Option<Locale>::None` throughout the
/// engine, never as an empty tag.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Locale(String);

impl Locale {
    /// Create a new `Locale`, validating format.
    ///
    /// # Errors
    /// Returns an error if the tag is empty or contains whitespace or `/`.
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.is_empty() {
            return Err(ValidationError {
                kind: ErrorKind::Locale,
                value: s.to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }
        if s.chars().any(|c| c.is_whitespace() || c == '/') {
            return Err(ValidationError {
                kind: ErrorKind::Locale,
                value: s.to_owned(),
                reason: "must not contain whitespace or '/'".to_owned(),
            });
        }
        Ok(Self(s.to_owned()))
    }

    /// Return the inner tag.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Locale {
    type Err = ValidationError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

// ---------------------------------------------------------------------------
// Uri
// ---------------------------------------------------------------------------

/// A generated absolute URI path.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Uri(String);

impl Uri {
    /// Create a new `Uri`, validating format.
    ///
    /// # Errors
    /// Returns an error if the path does not start with `/`.
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if !s.starts_with('/') {
            return Err(ValidationError {
                kind: ErrorKind::Uri,
                value: s.to_owned(),
                reason: "must start with '/'".to_owned(),
            });
        }
        Ok(Self(s.to_owned()))
    }

    /// Return the inner path.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if `other` lies strictly below this URI in the path
    /// hierarchy (e.g. `/a/b` is a descendant of `/a`).
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        other.0.len() > self.0.len()
            && other.0.starts_with(&self.0)
            && other.0.as_bytes().get(self.0.len()) == Some(&b'/')
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Uri {
    type Err = ValidationError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

// ---------------------------------------------------------------------------
// RouteId
// ---------------------------------------------------------------------------

/// Opaque identity of a persisted route.
///
/// Assigned by the adapter at creation time. Route membership tests (is
/// this referring route among the just-assigned ones?) compare by id, not
/// by URI, because conflict resolution can move a route's URI.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteId(String);

impl RouteId {
    /// Create a new `RouteId`.
    ///
    /// # Errors
    /// Returns an error if the id is empty.
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.is_empty() {
            return Err(ValidationError {
                kind: ErrorKind::RouteId,
                value: s.to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }
        Ok(Self(s.to_owned()))
    }

    /// Return the inner string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// RouteTag
// ---------------------------------------------------------------------------

/// Correlation tag stamped onto an auto route by the adapter.
///
/// Usually the locale tag, or a fixed sentinel for untranslated content;
/// it lets a persisted route be matched back to the context (and locale)
/// that produced it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteTag(String);

impl RouteTag {
    /// Create a new `RouteTag`.
    ///
    /// # Errors
    /// Returns an error if the tag is empty.
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.is_empty() {
            return Err(ValidationError {
                kind: ErrorKind::RouteTag,
                value: s.to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }
        Ok(Self(s.to_owned()))
    }

    /// Return the inner string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RouteTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// ValidationError
// ---------------------------------------------------------------------------

/// Which identifier type failed validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// A [`TypeName`] failed validation.
    TypeName,
    /// A [`TokenName`] failed validation.
    TokenName,
    /// A [`Locale`] failed validation.
    Locale,
    /// A [`Uri`] failed validation.
    Uri,
    /// A [`RouteId`] failed validation.
    RouteId,
    /// A [`RouteTag`] failed validation.
    RouteTag,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeName => write!(f, "type name"),
            Self::TokenName => write!(f, "token name"),
            Self::Locale => write!(f, "locale"),
            Self::Uri => write!(f, "URI"),
            Self::RouteId => write!(f, "route id"),
            Self::RouteTag => write!(f, "route tag"),
        }
    }
}

/// An identifier value failed validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationError {
    /// Which identifier type was being constructed.
    pub kind: ErrorKind,
    /// The invalid value that was provided.
    pub value: String,
    /// Why the value is invalid.
    pub reason: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {} '{}': {}", self.kind, self.value, self.reason)
    }
}

impl std::error::Error for ValidationError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
