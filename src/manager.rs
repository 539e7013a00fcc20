//! The route manager: build, reconcile, defer cleanup.
//!
//! [`AutoRouteManager`] drives one subject through the full pipeline:
//! expand contexts, translate, generate, reconcile against the in-flight
//! batch and the persisted store, create or reuse routes, and queue the
//! finished collection for deferred defunct-route handling.
//!
//! Reconciliation is strictly sequential within one collection because a
//! later context's conflict checks depend on the routes assigned by
//! earlier ones.

use std::rc::Rc;

use crate::adapter::Adapter;
use crate::builder::UriContextCollectionBuilder;
use crate::context::UriContextCollection;
use crate::defunct::{DefunctRouteHandler, DelegatingDefunctHandler};
use crate::error::WaypostError;
use crate::events::{EventBus, RouteEventListener};
use crate::generator::UriGenerator;
use crate::metadata::MetadataFactory;
use crate::model::route::RouteKind;

// ---------------------------------------------------------------------------
// AutoRouteManager
// ---------------------------------------------------------------------------

/// Top-level orchestrator over one adapter.
///
/// The deferred defunct stack is owned by this instance and is meant for
/// a single logical workflow (one request or one batch job); it is not
/// synchronized.
pub struct AutoRouteManager<A: Adapter> {
    adapter: A,
    generator: UriGenerator<A>,
    builder: UriContextCollectionBuilder,
    defunct: DelegatingDefunctHandler<A>,
    events: EventBus<A::Subject>,
    pending: Vec<UriContextCollection<A::Subject>>,
}

impl<A: Adapter> AutoRouteManager<A> {
    /// Create a manager resolving metadata through `factory`.
    ///
    /// Ships with the built-in token providers, conflict strategies, and
    /// defunct handlers registered.
    #[must_use]
    pub fn new(adapter: A, factory: Rc<MetadataFactory>) -> Self {
        Self {
            adapter,
            generator: UriGenerator::new(),
            builder: UriContextCollectionBuilder::new(Rc::clone(&factory)),
            defunct: DelegatingDefunctHandler::new(factory),
            events: EventBus::new(),
            pending: Vec::new(),
        }
    }

    /// Borrow the adapter.
    pub const fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Mutably borrow the adapter (e.g. to seed fixtures).
    pub fn adapter_mut(&mut self) -> &mut A {
        &mut self.adapter
    }

    /// The generator, for registering custom providers and strategies.
    pub fn generator_mut(&mut self) -> &mut UriGenerator<A> {
        &mut self.generator
    }

    /// The delegating defunct handler, for registering custom strategies.
    pub fn defunct_handler_mut(&mut self) -> &mut DelegatingDefunctHandler<A> {
        &mut self.defunct
    }

    /// Subscribe a route lifecycle listener.
    pub fn subscribe(&mut self, listener: Box<dyn RouteEventListener<A::Subject>>) {
        self.events.subscribe(listener);
    }

    /// Collections reconciled but not yet flushed through defunct
    /// handling, oldest first.
    #[must_use]
    pub fn pending_collections(&self) -> &[UriContextCollection<A::Subject>] {
        &self.pending
    }

    /// Build, generate, and reconcile all routes for one subject.
    ///
    /// On success the collection is queued for deferred defunct handling
    /// (see [`Self::handle_defunct_routes`]). On failure the collection
    /// is discarded: partially assigned contexts are not rolled back, and
    /// a failed build is never enqueued.
    ///
    /// # Errors
    /// Metadata resolution, generation, conflict resolution, and adapter
    /// failures propagate unchanged and abort the remaining contexts.
    pub fn build_uri_contexts(
        &mut self,
        mut collection: UriContextCollection<A::Subject>,
    ) -> Result<(), WaypostError> {
        self.builder.build(&mut collection, &self.adapter)?;
        tracing::debug!(
            type_name = %collection.type_name(),
            contexts = collection.len(),
            "reconciling URI contexts"
        );

        for i in 0..collection.len() {
            // Translated view, recorded only when it differs.
            if let Some(locale) = collection.context(i).locale().cloned() {
                let subject = collection.subject();
                if let Some(translated) = self.adapter.translate_subject(&subject, &locale) {
                    collection.context_mut(i).set_translated_subject(translated);
                }
            }

            let uri = self.generator.generate_uri(collection.context(i))?;
            collection.context_mut(i).set_uri(uri.clone());

            // Existing claim on this URI: the batch wins over the store.
            let existing = collection
                .route_for_uri(&uri)
                .cloned()
                .or_else(|| self.adapter.route_for_uri(&uri, collection.context(i)));

            if let Some(mut route) = existing {
                let context = collection.context(i);
                let subject = context.subject();
                let matches = self.adapter.compare_route_content(&route, &subject)
                    && self.adapter.compare_route_locale(&route, context.locale());
                if matches {
                    route.kind = RouteKind::Primary;
                    tracing::debug!(uri = %uri, "reusing existing route");
                    collection.context_mut(i).set_route(route);
                    continue;
                }

                let resolved = self.generator.resolve_conflict(
                    &collection,
                    collection.context(i),
                    &self.adapter,
                )?;
                collection.context_mut(i).set_uri(resolved);
            }

            let tag = self.adapter.auto_route_tag(collection.context(i));
            let route = self.adapter.create_auto_route(collection.context(i), &tag)?;
            self.events.route_created(&route, collection.context(i));
            collection.context_mut(i).set_route(route);
        }

        self.pending.push(collection);
        Ok(())
    }

    /// Flush deferred defunct-route handling.
    ///
    /// Pops pending collections in last-in-first-out order until the
    /// stack is empty, dispatching each through the delegating handler.
    /// The LIFO order is a contract: bulk callers may build several
    /// collections and flush once.
    ///
    /// # Errors
    /// Handler and adapter failures propagate unchanged; the failing
    /// collection and any still-pending ones stay un-flushed only insofar
    /// as they were not yet popped.
    pub fn handle_defunct_routes(&mut self) -> Result<(), WaypostError> {
        while let Some(collection) = self.pending.pop() {
            self.defunct
                .handle_defunct_routes(&collection, &mut self.adapter, &self.events)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
