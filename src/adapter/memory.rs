//! In-memory reference adapter.
//!
//! Stores content and routes in plain `BTreeMap`s. This is the simplest
//! complete [`Adapter`] and doubles as the test harness for the engine;
//! real deployments implement the trait against their own persistence.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::adapter::Adapter;
use crate::context::UriContext;
use crate::error::WaypostError;
use crate::model::route::{Route, RouteKind};
use crate::model::types::{Locale, RouteId, RouteTag, TypeName, Uri};

/// Tag stamped on routes generated for untranslated content.
pub const NO_LOCALE_TAG: &str = "no-multilang";

// ---------------------------------------------------------------------------
// MemoryContent
// ---------------------------------------------------------------------------

/// A minimal content object for the in-memory adapter.
///
/// Translations are per-locale field overrides; a translated view keeps
/// the same id, so content comparison works across locales.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryContent {
    /// Stable content identity.
    pub id: String,
    /// Locales this content is available in (empty = untranslated).
    pub locales: Vec<Locale>,
    /// Field values, consulted by token providers.
    pub fields: BTreeMap<String, String>,
    /// Per-locale field overrides, keyed by locale tag.
    pub translations: BTreeMap<String, BTreeMap<String, String>>,
}

impl MemoryContent {
    /// Create content with no fields, locales, or translations.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            locales: Vec::new(),
            fields: BTreeMap::new(),
            translations: BTreeMap::new(),
        }
    }

    /// Set a field value.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Declare a locale this content is available in.
    #[must_use]
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locales.push(locale);
        self
    }

    /// Override a field value for one locale.
    #[must_use]
    pub fn with_translation(
        mut self,
        locale: &Locale,
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.translations
            .entry(locale.as_str().to_owned())
            .or_default()
            .insert(field.into(), value.into());
        self
    }

    /// Look up a field value.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// MemoryAdapter
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
struct StoredRoute {
    route: Route,
    content_id: String,
}

/// BTreeMap-backed adapter over [`MemoryContent`] subjects.
#[derive(Debug, Default)]
pub struct MemoryAdapter {
    routes: BTreeMap<RouteId, StoredRoute>,
    by_uri: BTreeMap<Uri, RouteId>,
    aliases: BTreeMap<TypeName, TypeName>,
    next_id: u64,
}

impl MemoryAdapter {
    /// Create an empty adapter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a canonical name for a declared type (proxy unwrapping).
    pub fn alias_type(&mut self, declared: TypeName, canonical: TypeName) {
        self.aliases.insert(declared, canonical);
    }

    /// Seed a pre-existing route, e.g. from an earlier build.
    pub fn insert_route(&mut self, route: Route, content_id: impl Into<String>) {
        self.by_uri.insert(route.uri.clone(), route.id.clone());
        self.routes.insert(
            route.id.clone(),
            StoredRoute {
                route,
                content_id: content_id.into(),
            },
        );
    }

    /// Number of stored routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Look up a stored route by id.
    #[must_use]
    pub fn route(&self, id: &RouteId) -> Option<&Route> {
        self.routes.get(id).map(|stored| &stored.route)
    }

    /// All stored routes in id order.
    #[must_use]
    pub fn all_routes(&self) -> Vec<&Route> {
        self.routes.values().map(|stored| &stored.route).collect()
    }

    fn fresh_id(&mut self) -> RouteId {
        self.next_id += 1;
        RouteId::new(&format!("route-{}", self.next_id)).expect("generated id is non-empty")
    }

    fn reindex(&mut self, id: &RouteId, old_uri: &Uri, new_uri: Uri) {
        self.by_uri.remove(old_uri);
        self.by_uri.insert(new_uri, id.clone());
    }
}

impl Adapter for MemoryAdapter {
    type Subject = MemoryContent;

    fn locales(&self, subject: &MemoryContent) -> Vec<Locale> {
        subject.locales.clone()
    }

    fn translate_subject(&self, subject: &MemoryContent, locale: &Locale) -> Option<Rc<MemoryContent>> {
        let overrides = subject.translations.get(locale.as_str())?;
        let mut translated = subject.clone();
        translated
            .fields
            .extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        Some(Rc::new(translated))
    }

    fn real_type_name(&self, declared: &TypeName) -> TypeName {
        self.aliases
            .get(declared)
            .cloned()
            .unwrap_or_else(|| declared.clone())
    }

    fn auto_route_tag(&self, context: &UriContext<MemoryContent>) -> RouteTag {
        let tag = context.locale().map_or(NO_LOCALE_TAG, Locale::as_str);
        RouteTag::new(tag).expect("locale tags are non-empty")
    }

    fn create_auto_route(
        &mut self,
        context: &UriContext<MemoryContent>,
        tag: &RouteTag,
    ) -> Result<Route, WaypostError> {
        let uri = context
            .uri()
            .ok_or_else(|| WaypostError::UriNotGenerated {
                definition: context.definition_name().to_owned(),
            })?
            .clone();
        let route = Route::primary(self.fresh_id(), uri, tag.clone(), context.defaults().clone());
        self.insert_route(route.clone(), context.subject().id.clone());
        Ok(route)
    }

    fn route_for_uri(&self, uri: &Uri, _context: &UriContext<MemoryContent>) -> Option<Route> {
        let id = self.by_uri.get(uri)?;
        self.routes.get(id).map(|stored| stored.route.clone())
    }

    fn compare_route_content(&self, route: &Route, subject: &MemoryContent) -> bool {
        self.routes
            .get(&route.id)
            .is_some_and(|stored| stored.content_id == subject.id)
    }

    fn compare_route_locale(&self, route: &Route, locale: Option<&Locale>) -> bool {
        let tag = locale.map_or(NO_LOCALE_TAG, Locale::as_str);
        route.tag.as_str() == tag
    }

    fn referring_routes(&self, subject: &MemoryContent) -> Vec<Route> {
        self.routes
            .values()
            .filter(|stored| stored.content_id == subject.id)
            .map(|stored| stored.route.clone())
            .collect()
    }

    fn migrate_route_children(&mut self, src: &Route, dest: &Route) -> Result<(), WaypostError> {
        let descendants: Vec<RouteId> = self
            .routes
            .values()
            .filter(|stored| src.uri.is_ancestor_of(&stored.route.uri))
            .map(|stored| stored.route.id.clone())
            .collect();

        for id in descendants {
            let Some(stored) = self.routes.get(&id) else {
                continue;
            };
            let old_uri = stored.route.uri.clone();
            let suffix = &old_uri.as_str()[src.uri.as_str().len()..];
            let new_uri = Uri::new(&format!("{}{suffix}", dest.uri)).map_err(|err| {
                WaypostError::Adapter {
                    detail: format!("migrated child URI is invalid: {err}"),
                }
            })?;
            self.reindex(&id, &old_uri, new_uri.clone());
            if let Some(stored) = self.routes.get_mut(&id) {
                stored.route.uri = new_uri;
            }
        }
        Ok(())
    }

    fn remove_route(&mut self, route: &Route) -> Result<(), WaypostError> {
        let stored = self
            .routes
            .remove(&route.id)
            .ok_or_else(|| WaypostError::Adapter {
                detail: format!("cannot remove unknown route '{}'", route.id),
            })?;
        self.by_uri.remove(&stored.route.uri);
        Ok(())
    }

    fn create_redirect_route(&mut self, old: &Route, new: &Route) -> Result<Route, WaypostError> {
        let stored = self
            .routes
            .get_mut(&old.id)
            .ok_or_else(|| WaypostError::Adapter {
                detail: format!("cannot redirect unknown route '{}'", old.id),
            })?;
        stored.route.kind = RouteKind::Redirect;
        stored.route.redirect_target = Some(new.uri.clone());
        Ok(stored.route.clone())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
