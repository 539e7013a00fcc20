//! Per-(definition, locale) units of work and their batch container.
//!
//! A [`UriContext`] tracks one URI-to-be through generation and
//! reconciliation; a [`UriContextCollection`] is the working set for one
//! subject across all of its routes in one build operation. Contexts are
//! owned exclusively by their collection and mutated in place as the
//! pipeline advances (URI, then translated subject, then route).

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::metadata::class::{AutoRouteDefinition, ServiceBinding};
use crate::model::route::Route;
use crate::model::types::{Locale, TokenName, TypeName, Uri};

// ---------------------------------------------------------------------------
// UriContext
// ---------------------------------------------------------------------------

/// One (route definition × locale) unit of work.
///
/// Lifecycle invariants:
/// - `uri` is `None` until generation succeeds, and may be overwritten
///   only by conflict resolution before a route is assigned.
/// - `route` is `None` until reconciliation assigns one, and is never
///   reassigned afterwards.
#[derive(Clone, Debug)]
pub struct UriContext<S> {
    type_name: TypeName,
    definition_name: String,
    schema: String,
    defaults: BTreeMap<String, String>,
    token_providers: BTreeMap<TokenName, ServiceBinding>,
    conflict_resolver: ServiceBinding,
    locale: Option<Locale>,
    subject: Rc<S>,
    uri: Option<Uri>,
    route: Option<Route>,
}

impl<S> UriContext<S> {
    /// The subject's canonical type name.
    #[must_use]
    pub const fn type_name(&self) -> &TypeName {
        &self.type_name
    }

    /// The route definition this context was built from.
    #[must_use]
    pub fn definition_name(&self) -> &str {
        &self.definition_name
    }

    /// The URI schema string.
    #[must_use]
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Default key/value pairs for the resulting route.
    #[must_use]
    pub const fn defaults(&self) -> &BTreeMap<String, String> {
        &self.defaults
    }

    /// Token provider bindings, copied from the resolved metadata.
    #[must_use]
    pub const fn token_providers(&self) -> &BTreeMap<TokenName, ServiceBinding> {
        &self.token_providers
    }

    /// Look up the provider binding for a token name string.
    #[must_use]
    pub fn token_provider(&self, token: &str) -> Option<&ServiceBinding> {
        self.token_providers
            .iter()
            .find(|(name, _)| name.as_str() == token)
            .map(|(_, binding)| binding)
    }

    /// The conflict resolver binding, copied from the resolved metadata.
    #[must_use]
    pub const fn conflict_resolver(&self) -> &ServiceBinding {
        &self.conflict_resolver
    }

    /// The locale this context generates for; `None` means no translation
    /// applies.
    #[must_use]
    pub const fn locale(&self) -> Option<&Locale> {
        self.locale.as_ref()
    }

    /// The effective subject: the translated view when one was recorded,
    /// the original subject otherwise.
    #[must_use]
    pub fn subject(&self) -> Rc<S> {
        Rc::clone(&self.subject)
    }

    /// Record a translated view of the subject for this context's locale.
    pub fn set_translated_subject(&mut self, subject: Rc<S>) {
        self.subject = subject;
    }

    /// The generated URI, if generation has run.
    #[must_use]
    pub const fn uri(&self) -> Option<&Uri> {
        self.uri.as_ref()
    }

    /// Store the generated (or conflict-resolved) URI.
    pub fn set_uri(&mut self, uri: Uri) {
        debug_assert!(
            self.route.is_none(),
            "URI must not change after a route is assigned"
        );
        self.uri = Some(uri);
    }

    /// The assigned route, once reconciliation has completed.
    #[must_use]
    pub const fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    /// Assign the reconciled route. A route is assigned at most once.
    pub fn set_route(&mut self, route: Route) {
        debug_assert!(self.route.is_none(), "route is assigned at most once");
        self.route = Some(route);
    }
}

// ---------------------------------------------------------------------------
// UriContextCollection
// ---------------------------------------------------------------------------

/// The working set for one subject in one build operation.
///
/// Context order is insertion order and stays stable; lookups are linear
/// scans returning the first match. Duplicate URIs within one collection
/// are a caller error and are not detected here.
#[derive(Debug)]
pub struct UriContextCollection<S> {
    subject: Rc<S>,
    type_name: TypeName,
    contexts: Vec<UriContext<S>>,
}

impl<S> UriContextCollection<S> {
    /// Create an empty collection for a subject with its declared type.
    #[must_use]
    pub const fn new(subject: Rc<S>, type_name: TypeName) -> Self {
        Self {
            subject,
            type_name,
            contexts: Vec::new(),
        }
    }

    /// The original (untranslated) subject.
    #[must_use]
    pub fn subject(&self) -> Rc<S> {
        Rc::clone(&self.subject)
    }

    /// The subject's type name. After the builder has run this is the
    /// canonical name reported by the adapter.
    #[must_use]
    pub const fn type_name(&self) -> &TypeName {
        &self.type_name
    }

    /// Replace the declared type name with the canonical one.
    pub fn set_type_name(&mut self, type_name: TypeName) {
        self.type_name = type_name;
    }

    /// Create a context for one (definition × locale) pair.
    ///
    /// The context copies the definition's schema and defaults plus the
    /// resolved metadata's provider and resolver bindings, and starts
    /// with the collection's subject as its effective subject.
    #[must_use]
    pub fn create_uri_context(
        &self,
        definition_name: &str,
        definition: &AutoRouteDefinition,
        token_providers: &BTreeMap<TokenName, ServiceBinding>,
        conflict_resolver: ServiceBinding,
        locale: Option<Locale>,
    ) -> UriContext<S> {
        UriContext {
            type_name: self.type_name.clone(),
            definition_name: definition_name.to_owned(),
            schema: definition.schema.clone(),
            defaults: definition.defaults.clone(),
            token_providers: token_providers.clone(),
            conflict_resolver,
            locale,
            subject: Rc::clone(&self.subject),
            uri: None,
            route: None,
        }
    }

    /// Append a context. Order of insertion is preserved.
    pub fn push(&mut self, context: UriContext<S>) {
        self.contexts.push(context);
    }

    /// Number of contexts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    /// Returns `true` if no contexts have been created yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// Borrow the context at `index`.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    #[must_use]
    pub fn context(&self, index: usize) -> &UriContext<S> {
        &self.contexts[index]
    }

    /// Mutably borrow the context at `index`.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    pub fn context_mut(&mut self, index: usize) -> &mut UriContext<S> {
        &mut self.contexts[index]
    }

    /// Iterate over all contexts in insertion order.
    pub fn contexts(&self) -> impl Iterator<Item = &UriContext<S>> {
        self.contexts.iter()
    }

    /// First context whose generated URI equals `uri`.
    #[must_use]
    pub fn context_for_uri(&self, uri: &Uri) -> Option<&UriContext<S>> {
        self.contexts.iter().find(|c| c.uri() == Some(uri))
    }

    /// First assigned route whose context generated `uri`.
    #[must_use]
    pub fn route_for_uri(&self, uri: &Uri) -> Option<&Route> {
        self.contexts
            .iter()
            .find(|c| c.uri() == Some(uri) && c.route().is_some())
            .and_then(UriContext::route)
    }

    /// Iterate over all assigned routes in context order.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.contexts.iter().filter_map(UriContext::route)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::{RouteId, RouteTag};

    struct Doc;

    fn collection() -> UriContextCollection<Doc> {
        UriContextCollection::new(Rc::new(Doc), TypeName::new("doc").unwrap())
    }

    fn push_context(
        collection: &mut UriContextCollection<Doc>,
        locale: Option<&str>,
    ) {
        let definition = AutoRouteDefinition::new("/docs/{slug}");
        let context = collection.create_uri_context(
            "_default",
            &definition,
            &BTreeMap::new(),
            ServiceBinding::new("throw"),
            locale.map(|l| Locale::new(l).unwrap()),
        );
        collection.push(context);
    }

    fn route(id: &str, uri: &str) -> Route {
        Route::primary(
            RouteId::new(id).unwrap(),
            Uri::new(uri).unwrap(),
            RouteTag::new("n/a").unwrap(),
            BTreeMap::new(),
        )
    }

    #[test]
    fn create_uri_context_copies_metadata() {
        let mut coll = collection();
        push_context(&mut coll, Some("de"));

        let ctx = coll.context(0);
        assert_eq!(ctx.schema(), "/docs/{slug}");
        assert_eq!(ctx.definition_name(), "_default");
        assert_eq!(ctx.conflict_resolver().name, "throw");
        assert_eq!(ctx.locale().map(Locale::as_str), Some("de"));
        assert!(ctx.uri().is_none());
        assert!(ctx.route().is_none());
    }

    #[test]
    fn insertion_order_is_stable() {
        let mut coll = collection();
        push_context(&mut coll, Some("de"));
        push_context(&mut coll, Some("fr"));
        push_context(&mut coll, None);

        let locales: Vec<_> = coll
            .contexts()
            .map(|c| c.locale().map(Locale::as_str))
            .collect();
        assert_eq!(locales, vec![Some("de"), Some("fr"), None]);
    }

    #[test]
    fn uri_lookup_finds_first_match() {
        let mut coll = collection();
        push_context(&mut coll, Some("de"));
        push_context(&mut coll, Some("fr"));

        let uri = Uri::new("/docs/hallo").unwrap();
        coll.context_mut(0).set_uri(uri.clone());

        assert!(coll.context_for_uri(&uri).is_some());
        assert!(coll.context_for_uri(&Uri::new("/docs/nope").unwrap()).is_none());
    }

    #[test]
    fn route_lookup_skips_contexts_without_routes() {
        let mut coll = collection();
        push_context(&mut coll, Some("de"));
        push_context(&mut coll, Some("fr"));

        let uri = Uri::new("/docs/hallo").unwrap();
        // Both contexts generated the same URI, but only the second has a
        // route assigned.
        coll.context_mut(0).set_uri(uri.clone());
        coll.context_mut(1).set_uri(uri.clone());
        coll.context_mut(1).set_route(route("r1", "/docs/hallo"));

        let found = coll.route_for_uri(&uri).unwrap();
        assert_eq!(found.id.as_str(), "r1");
    }

    #[test]
    fn translated_subject_replaces_effective_subject() {
        let original = Rc::new(Doc);
        let translated = Rc::new(Doc);
        let mut coll = UriContextCollection::new(Rc::clone(&original), TypeName::new("doc").unwrap());
        push_context(&mut coll, Some("de"));

        assert!(Rc::ptr_eq(&coll.context(0).subject(), &original));
        coll.context_mut(0).set_translated_subject(Rc::clone(&translated));
        assert!(Rc::ptr_eq(&coll.context(0).subject(), &translated));
    }

    #[test]
    fn routes_iterates_assigned_routes_in_order() {
        let mut coll = collection();
        push_context(&mut coll, None);
        push_context(&mut coll, None);
        coll.context_mut(0).set_uri(Uri::new("/a").unwrap());
        coll.context_mut(0).set_route(route("r1", "/a"));

        let ids: Vec<_> = coll.routes().map(|r| r.id.as_str().to_owned()).collect();
        assert_eq!(ids, vec!["r1"]);
    }
}
