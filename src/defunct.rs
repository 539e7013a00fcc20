//! Defunct route handling.
//!
//! After a collection has been reconciled, routes that still refer to the
//! subject but were not re-assigned in the batch are defunct: their URIs
//! no longer correspond to anything the schemas produce. The bound
//! strategy decides their fate — delete them (`remove`), keep them as
//! redirects (`leave_redirect`), or dispatch per type (delegation).

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::adapter::Adapter;
use crate::context::UriContextCollection;
use crate::error::WaypostError;
use crate::events::EventBus;
use crate::metadata::MetadataFactory;
use crate::model::route::Route;

/// Registry name of [`RemoveHandler`].
pub const REMOVE: &str = "remove";

/// Registry name of [`LeaveRedirectHandler`].
pub const LEAVE_REDIRECT: &str = "leave_redirect";

// ---------------------------------------------------------------------------
// DefunctRouteHandler
// ---------------------------------------------------------------------------

/// A pluggable strategy applied to a reconciled collection's defunct
/// routes.
pub trait DefunctRouteHandler<A: Adapter> {
    /// Handle every defunct route of the collection's subject.
    ///
    /// # Errors
    /// Metadata and adapter failures propagate unchanged.
    fn handle_defunct_routes(
        &self,
        collection: &UriContextCollection<A::Subject>,
        adapter: &mut A,
        events: &EventBus<A::Subject>,
    ) -> Result<(), WaypostError>;
}

/// Routes referring to the subject that were not re-assigned in this
/// batch, in adapter order.
fn defunct_routes<A: Adapter>(
    collection: &UriContextCollection<A::Subject>,
    adapter: &A,
) -> Vec<Route> {
    let subject = collection.subject();
    adapter
        .referring_routes(&subject)
        .into_iter()
        .filter(|referring| collection.routes().all(|assigned| assigned.id != referring.id))
        .collect()
}

/// The just-assigned route whose context locale matches the defunct
/// route's tag, if any.
fn replacement_for<A: Adapter>(
    collection: &UriContextCollection<A::Subject>,
    adapter: &A,
    defunct: &Route,
) -> Option<Route> {
    collection
        .contexts()
        .find(|context| {
            context.route().is_some() && adapter.compare_route_locale(defunct, context.locale())
        })
        .and_then(|context| context.route().cloned())
}

// ---------------------------------------------------------------------------
// RemoveHandler
// ---------------------------------------------------------------------------

/// Deletes defunct routes, migrating their descendants to the same-locale
/// replacement first when one exists.
#[derive(Clone, Copy, Debug, Default)]
pub struct RemoveHandler;

impl<A: Adapter> DefunctRouteHandler<A> for RemoveHandler {
    fn handle_defunct_routes(
        &self,
        collection: &UriContextCollection<A::Subject>,
        adapter: &mut A,
        events: &EventBus<A::Subject>,
    ) -> Result<(), WaypostError> {
        for defunct in defunct_routes(collection, adapter) {
            if let Some(replacement) = replacement_for(collection, adapter, &defunct) {
                adapter.migrate_route_children(&defunct, &replacement)?;
                events.children_migrated(&defunct, &replacement);
            }
            tracing::debug!(uri = %defunct.uri, "removing defunct route");
            adapter.remove_route(&defunct)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// LeaveRedirectHandler
// ---------------------------------------------------------------------------

/// Converts defunct routes into redirects to their same-locale
/// replacement, migrating descendants.
///
/// A defunct route with no same-locale replacement is left untouched:
/// there is nothing to redirect to.
#[derive(Clone, Copy, Debug, Default)]
pub struct LeaveRedirectHandler;

impl<A: Adapter> DefunctRouteHandler<A> for LeaveRedirectHandler {
    fn handle_defunct_routes(
        &self,
        collection: &UriContextCollection<A::Subject>,
        adapter: &mut A,
        events: &EventBus<A::Subject>,
    ) -> Result<(), WaypostError> {
        for defunct in defunct_routes(collection, adapter) {
            let Some(replacement) = replacement_for(collection, adapter, &defunct) else {
                continue;
            };
            adapter.migrate_route_children(&defunct, &replacement)?;
            events.children_migrated(&defunct, &replacement);
            tracing::debug!(from = %defunct.uri, to = %replacement.uri, "leaving redirect for defunct route");
            adapter.create_redirect_route(&defunct, &replacement)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// DelegatingDefunctHandler
// ---------------------------------------------------------------------------

/// Dispatches to the handler named by the subject's resolved metadata,
/// letting different content types choose different defunct behavior.
///
/// Owns its own registry of leaf strategies; a fresh delegating handler
/// ships with `remove` and `leave_redirect` registered.
pub struct DelegatingDefunctHandler<A: Adapter> {
    factory: Rc<MetadataFactory>,
    handlers: BTreeMap<String, Box<dyn DefunctRouteHandler<A>>>,
}

impl<A: Adapter> DelegatingDefunctHandler<A> {
    /// Create a delegating handler with the built-in strategies.
    #[must_use]
    pub fn new(factory: Rc<MetadataFactory>) -> Self {
        let mut handlers: BTreeMap<String, Box<dyn DefunctRouteHandler<A>>> = BTreeMap::new();
        handlers.insert(REMOVE.to_owned(), Box::new(RemoveHandler));
        handlers.insert(LEAVE_REDIRECT.to_owned(), Box::new(LeaveRedirectHandler));
        Self { factory, handlers }
    }

    /// Register a custom leaf strategy, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, handler: Box<dyn DefunctRouteHandler<A>>) {
        self.handlers.insert(name.into(), handler);
    }
}

impl<A: Adapter> DefunctRouteHandler<A> for DelegatingDefunctHandler<A> {
    fn handle_defunct_routes(
        &self,
        collection: &UriContextCollection<A::Subject>,
        adapter: &mut A,
        events: &EventBus<A::Subject>,
    ) -> Result<(), WaypostError> {
        let metadata = self.factory.metadata_for_type(collection.type_name())?;
        let binding = metadata.defunct_route_handler();
        let handler =
            self.handlers
                .get(&binding.name)
                .ok_or_else(|| WaypostError::UnknownDefunctHandler {
                    name: binding.name.clone(),
                })?;
        handler.handle_defunct_routes(collection, adapter, events)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
