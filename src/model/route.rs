//! The persisted route model.
//!
//! Routes are owned by the persistence adapter; the engine only exchanges
//! snapshot values. A [`Route`] carries the minimum the reconciliation and
//! defunct-handling logic needs: identity, URI, kind, and the correlation
//! tag that links it back to the context (and locale) that produced it.

use std::collections::BTreeMap;
use std::fmt;

use crate::model::types::{RouteId, RouteTag, Uri};

// ---------------------------------------------------------------------------
// RouteKind
// ---------------------------------------------------------------------------

/// Whether a route represents content directly or points elsewhere.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RouteKind {
    /// The route represents its content object directly.
    Primary,
    /// The route redirects to another route (used to preserve old URIs
    /// after content or URI changes).
    Redirect,
}

impl fmt::Display for RouteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Redirect => write!(f, "redirect"),
        }
    }
}

// ---------------------------------------------------------------------------
// Route
// ---------------------------------------------------------------------------

/// Snapshot of a persisted auto route.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route {
    /// Stable identity assigned by the adapter.
    pub id: RouteId,
    /// The URI this route answers to.
    pub uri: Uri,
    /// Primary vs redirect.
    pub kind: RouteKind,
    /// Correlation tag (usually the locale) assigned at creation.
    pub tag: RouteTag,
    /// Default key/value pairs copied from the route definition.
    pub defaults: BTreeMap<String, String>,
    /// For redirect routes, the URI the route forwards to.
    pub redirect_target: Option<Uri>,
}

impl Route {
    /// Create a new primary route.
    #[must_use]
    pub const fn primary(
        id: RouteId,
        uri: Uri,
        tag: RouteTag,
        defaults: BTreeMap<String, String>,
    ) -> Self {
        Self {
            id,
            uri,
            kind: RouteKind::Primary,
            tag,
            defaults,
            redirect_target: None,
        }
    }

    /// Returns `true` if this is a redirect route.
    #[must_use]
    pub fn is_redirect(&self) -> bool {
        self.kind == RouteKind::Redirect
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} route {} at {}", self.kind, self.id, self.uri)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn sample() -> Route {
        Route::primary(
            RouteId::new("r1").unwrap(),
            Uri::new("/blog/hello").unwrap(),
            RouteTag::new("de").unwrap(),
            BTreeMap::new(),
        )
    }

    #[test]
    fn primary_constructor_sets_kind() {
        let route = sample();
        assert_eq!(route.kind, RouteKind::Primary);
        assert!(!route.is_redirect());
        assert!(route.redirect_target.is_none());
    }

    #[test]
    fn display_names_kind_id_and_uri() {
        let msg = format!("{}", sample());
        assert!(msg.contains("primary"));
        assert!(msg.contains("r1"));
        assert!(msg.contains("/blog/hello"));
    }
}
