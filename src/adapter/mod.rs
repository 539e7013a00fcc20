//! Persistence adapter trait and the in-memory reference implementation.
//!
//! Defines the interface between the routing engine and whatever actually
//! stores content and routes. The engine never touches storage directly:
//! translation lookup, route persistence, and content comparison all go
//! through an [`Adapter`].

pub mod memory;

use std::rc::Rc;

use crate::context::UriContext;
use crate::error::WaypostError;
use crate::model::route::Route;
use crate::model::types::{Locale, RouteTag, TypeName, Uri};

/// A persistence adapter.
///
/// Implementations own the subject and route stores; the engine only sees
/// snapshot [`Route`] values and `Rc`-shared subjects. All calls are
/// synchronous and blocking (the engine is single-threaded by design).
///
/// # Key invariants
///
/// - **Route identity**: `create_auto_route` assigns each route a
///   [`RouteId`](crate::model::types::RouteId) that is stable for the
///   route's lifetime, even if conflict resolution later moves its URI.
/// - **Tag correlation**: the tag passed to `create_auto_route` must be
///   recoverable from the stored route so `compare_route_locale` can
///   correlate routes back to locales.
/// - **Lookup consistency**: a route returned by `create_auto_route` is
///   immediately visible to `route_for_uri`.
pub trait Adapter {
    /// The content object type this adapter serves.
    type Subject;

    /// All locales the subject is available in.
    ///
    /// An empty list means the subject is not translated; the engine
    /// normalizes that to a single "no locale" context.
    fn locales(&self, subject: &Self::Subject) -> Vec<Locale>;

    /// Obtain a translated view of the subject for a locale.
    ///
    /// Returns `None` when no distinct translation exists (the original
    /// subject applies as-is). Returning `Some` with a translated view
    /// makes the engine record it on the context, so token providers see
    /// translated field values.
    fn translate_subject(&self, subject: &Self::Subject, locale: &Locale) -> Option<Rc<Self::Subject>>;

    /// Map a declared type name to the canonical one.
    ///
    /// Wrapping and proxying of content objects is an adapter concern;
    /// the engine resolves metadata for whatever this returns.
    fn real_type_name(&self, declared: &TypeName) -> TypeName;

    /// Produce the correlation tag for a context (usually its locale).
    fn auto_route_tag(&self, context: &UriContext<Self::Subject>) -> RouteTag;

    /// Create and persist a new primary route for the context's URI.
    ///
    /// # Errors
    /// Returns an error if the route cannot be persisted.
    fn create_auto_route(
        &mut self,
        context: &UriContext<Self::Subject>,
        tag: &RouteTag,
    ) -> Result<Route, WaypostError>;

    /// Look up a persisted route by URI.
    fn route_for_uri(&self, uri: &Uri, context: &UriContext<Self::Subject>) -> Option<Route>;

    /// Does this route represent the given subject's content?
    fn compare_route_content(&self, route: &Route, subject: &Self::Subject) -> bool;

    /// Does this route's tag correspond to the given locale?
    fn compare_route_locale(&self, route: &Route, locale: Option<&Locale>) -> bool;

    /// All persisted auto routes that refer to the subject.
    fn referring_routes(&self, subject: &Self::Subject) -> Vec<Route>;

    /// Re-parent all descendant routes of `src` under `dest`.
    ///
    /// # Errors
    /// Returns an error if the migration cannot be persisted.
    fn migrate_route_children(&mut self, src: &Route, dest: &Route) -> Result<(), WaypostError>;

    /// Delete a persisted route.
    ///
    /// # Errors
    /// Returns an error if the route cannot be removed.
    fn remove_route(&mut self, route: &Route) -> Result<(), WaypostError>;

    /// Turn `old` into a redirect pointing at `new`, preserving `old`'s
    /// URI so stale links keep working.
    ///
    /// # Errors
    /// Returns an error if the redirect cannot be persisted.
    fn create_redirect_route(&mut self, old: &Route, new: &Route) -> Result<Route, WaypostError>;
}
