//! Token providers: pluggable `{token}` value sources.
//!
//! A token provider turns one schema placeholder into a string value for
//! a given context. Providers declare their recognized options through an
//! [`OptionsResolver`]; unknown or missing options are configuration
//! errors, mirroring the strict-fields posture used for the declarative
//! configuration files.

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use serde_json::Value;

use crate::context::UriContext;
use crate::error::WaypostError;

/// Registry name of [`SubjectFieldProvider`].
pub const SUBJECT_FIELD: &str = "subject_field";

/// Registry name of [`ContextLocaleProvider`].
pub const CONTEXT_LOCALE: &str = "context_locale";

// ---------------------------------------------------------------------------
// OptionsResolver / ResolvedOptions
// ---------------------------------------------------------------------------

/// Declares a provider's option surface and resolves configured options
/// against it.
///
/// The generator seeds every resolver with the global `allow_empty`
/// default before the provider declares its own options, so providers may
/// override the global layer but every token understands it.
#[derive(Clone, Debug, Default)]
pub struct OptionsResolver {
    defaults: BTreeMap<String, Value>,
    required: BTreeSet<String>,
}

impl OptionsResolver {
    /// Create an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an option with a default value.
    pub fn set_default(&mut self, name: impl Into<String>, value: Value) {
        self.defaults.insert(name.into(), value);
    }

    /// Declare an option that must be configured.
    pub fn set_required(&mut self, name: impl Into<String>) {
        self.required.insert(name.into());
    }

    /// Resolve configured options against the declared surface.
    ///
    /// # Errors
    /// - [`WaypostError::UnknownProviderOption`] for an option the
    ///   provider never declared.
    /// - [`WaypostError::MissingProviderOption`] for a required option
    ///   left unconfigured.
    pub fn resolve(
        &self,
        provider: &str,
        configured: &BTreeMap<String, Value>,
    ) -> Result<ResolvedOptions, WaypostError> {
        let mut merged = self.defaults.clone();
        for (name, value) in configured {
            if !self.defaults.contains_key(name) && !self.required.contains(name) {
                return Err(WaypostError::UnknownProviderOption {
                    provider: provider.to_owned(),
                    option: name.clone(),
                });
            }
            merged.insert(name.clone(), value.clone());
        }
        for name in &self.required {
            if !merged.contains_key(name) {
                return Err(WaypostError::MissingProviderOption {
                    provider: provider.to_owned(),
                    option: name.clone(),
                });
            }
        }
        Ok(ResolvedOptions(merged))
    }
}

/// Fully-resolved provider options with typed accessors.
#[derive(Clone, Debug)]
pub struct ResolvedOptions(BTreeMap<String, Value>);

impl ResolvedOptions {
    /// Read a boolean option.
    ///
    /// # Errors
    /// Returns an error if the option is absent or not a boolean.
    pub fn get_bool(&self, provider: &str, name: &str) -> Result<bool, WaypostError> {
        match self.0.get(name) {
            Some(Value::Bool(flag)) => Ok(*flag),
            Some(other) => Err(WaypostError::ProviderValue {
                provider: provider.to_owned(),
                detail: format!("option '{name}' must be a boolean, got {other}"),
            }),
            None => Err(WaypostError::MissingProviderOption {
                provider: provider.to_owned(),
                option: name.to_owned(),
            }),
        }
    }

    /// Read a string option.
    ///
    /// # Errors
    /// Returns an error if the option is absent or not a string.
    pub fn get_str(&self, provider: &str, name: &str) -> Result<&str, WaypostError> {
        match self.0.get(name) {
            Some(Value::String(value)) => Ok(value),
            Some(other) => Err(WaypostError::ProviderValue {
                provider: provider.to_owned(),
                detail: format!("option '{name}' must be a string, got {other}"),
            }),
            None => Err(WaypostError::MissingProviderOption {
                provider: provider.to_owned(),
                option: name.to_owned(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// TokenProvider
// ---------------------------------------------------------------------------

/// A pluggable `{token}` value source.
pub trait TokenProvider<S> {
    /// Declare recognized options on the resolver.
    ///
    /// Called once per substitution with a resolver already carrying the
    /// global option layer.
    fn configure_options(&self, resolver: &mut OptionsResolver);

    /// Produce the raw substitution value for a context.
    ///
    /// # Errors
    /// Provider-specific validation failures surface as
    /// [`WaypostError::ProviderValue`].
    fn provide_value(
        &self,
        context: &UriContext<S>,
        options: &ResolvedOptions,
    ) -> Result<String, WaypostError>;
}

/// Name-keyed registry of token providers.
pub struct TokenProviderRegistry<S> {
    providers: BTreeMap<String, Box<dyn TokenProvider<S>>>,
}

impl<S> TokenProviderRegistry<S> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            providers: BTreeMap::new(),
        }
    }

    /// Register a provider under a name, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, provider: Box<dyn TokenProvider<S>>) {
        self.providers.insert(name.into(), provider);
    }

    /// Look up a provider by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn TokenProvider<S>> {
        self.providers.get(name).map(Box::as_ref)
    }
}

impl<S> Default for TokenProviderRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// slugify
// ---------------------------------------------------------------------------

/// Reduce a value to a URI-safe slug.
///
/// Lowercases and joins alphanumeric runs with single `-`; everything
/// else is a separator. Leading and trailing separators are dropped.
#[must_use]
pub fn slugify(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut pending_separator = false;
    for c in value.chars() {
        if c.is_alphanumeric() {
            if pending_separator && !out.is_empty() {
                out.push('-');
            }
            pending_separator = false;
            out.extend(c.to_lowercase());
        } else {
            pending_separator = true;
        }
    }
    out
}

// ---------------------------------------------------------------------------
// SubjectFieldProvider
// ---------------------------------------------------------------------------

/// Extracts a named field from the subject via a caller-supplied accessor.
///
/// Options: `field` (required) names the field; `slugify` (default
/// `true`) reduces the value to a URI-safe slug.
pub struct SubjectFieldProvider<S> {
    accessor: Box<dyn Fn(&S, &str) -> Option<String>>,
}

impl<S> SubjectFieldProvider<S> {
    /// Create a provider with the given field accessor.
    ///
    /// The accessor returns `None` when the subject has no such field,
    /// which surfaces as a provider error naming the field.
    #[must_use]
    pub fn new(accessor: impl Fn(&S, &str) -> Option<String> + 'static) -> Self {
        Self {
            accessor: Box::new(accessor),
        }
    }
}

impl<S> TokenProvider<S> for SubjectFieldProvider<S> {
    fn configure_options(&self, resolver: &mut OptionsResolver) {
        resolver.set_required("field");
        resolver.set_default("slugify", Value::Bool(true));
    }

    fn provide_value(
        &self,
        context: &UriContext<S>,
        options: &ResolvedOptions,
    ) -> Result<String, WaypostError> {
        let field = options.get_str(SUBJECT_FIELD, "field")?;
        let subject: Rc<S> = context.subject();
        let value =
            (self.accessor)(&subject, field).ok_or_else(|| WaypostError::ProviderValue {
                provider: SUBJECT_FIELD.to_owned(),
                detail: format!("subject has no value for field '{field}'"),
            })?;
        if options.get_bool(SUBJECT_FIELD, "slugify")? {
            Ok(slugify(&value))
        } else {
            Ok(value)
        }
    }
}

// ---------------------------------------------------------------------------
// ContextLocaleProvider
// ---------------------------------------------------------------------------

/// Substitutes the context's locale tag.
///
/// A context without a locale yields the empty string, so the token
/// collapses cleanly when `allow_empty` is on.
#[derive(Clone, Copy, Debug, Default)]
pub struct ContextLocaleProvider;

impl<S> TokenProvider<S> for ContextLocaleProvider {
    fn configure_options(&self, _resolver: &mut OptionsResolver) {}

    fn provide_value(
        &self,
        context: &UriContext<S>,
        _options: &ResolvedOptions,
    ) -> Result<String, WaypostError> {
        Ok(context
            .locale()
            .map_or_else(String::new, |locale| locale.as_str().to_owned()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
