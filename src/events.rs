//! Route lifecycle notifications.
//!
//! A pure side channel: the engine announces route creation and
//! child-route migration to subscribed listeners, and nothing in the
//! engine's control flow depends on them.

use crate::context::UriContext;
use crate::model::route::Route;

/// Observer of route lifecycle events. All hooks default to no-ops.
pub trait RouteEventListener<S> {
    /// A new auto route was created for a context.
    fn route_created(&self, route: &Route, context: &UriContext<S>) {
        let _ = (route, context);
    }

    /// Descendant routes were migrated from `src` to `dest`.
    fn children_migrated(&self, src: &Route, dest: &Route) {
        let _ = (src, dest);
    }
}

/// Fan-out dispatcher for route lifecycle events.
pub struct EventBus<S> {
    listeners: Vec<Box<dyn RouteEventListener<S>>>,
}

impl<S> EventBus<S> {
    /// Create a bus with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    /// Subscribe a listener.
    pub fn subscribe(&mut self, listener: Box<dyn RouteEventListener<S>>) {
        self.listeners.push(listener);
    }

    /// Announce a route creation.
    pub fn route_created(&self, route: &Route, context: &UriContext<S>) {
        tracing::debug!(uri = %route.uri, definition = context.definition_name(), "auto route created");
        for listener in &self.listeners {
            listener.route_created(route, context);
        }
    }

    /// Announce a child-route migration.
    pub fn children_migrated(&self, src: &Route, dest: &Route) {
        tracing::debug!(from = %src.uri, to = %dest.uri, "migrated child routes");
        for listener in &self.listeners {
            listener.children_migrated(src, dest);
        }
    }
}

impl<S> Default for EventBus<S> {
    fn default() -> Self {
        Self::new()
    }
}
