//! URI generation by token substitution.
//!
//! The generator scans a schema string for `{token}` placeholders, asks
//! the bound provider for each value, and performs one simultaneous
//! substitution pass. Empty values (exactly `""` or exactly `"/"`)
//! either fail or, with `allow_empty`, collapse their adjacent separator:
//! an interior empty token swallows its trailing `/`, and the last token
//! in a schema also swallows a leading `/`. The result must be absolute.
//!
//! Conflict resolution is delegated to the strategy named by the
//! context's conflict-resolver binding.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::adapter::Adapter;
use crate::conflict::{AutoIncrementResolver, ConflictResolverRegistry, ThrowResolver, AUTO_INCREMENT, THROW};
use crate::context::{UriContext, UriContextCollection};
use crate::error::WaypostError;
use crate::model::types::Uri;
use crate::token::{ContextLocaleProvider, OptionsResolver, TokenProviderRegistry, CONTEXT_LOCALE};

/// The global option every token understands (default `false`).
pub const ALLOW_EMPTY: &str = "allow_empty";

// ---------------------------------------------------------------------------
// UriGenerator
// ---------------------------------------------------------------------------

/// Substitutes schema tokens and delegates conflicts.
///
/// Owns the token-provider registry and the conflict-resolver registry.
/// A fresh generator ships with the built-in `context_locale` provider
/// and the `auto_increment` and `throw` conflict strategies registered.
pub struct UriGenerator<A: Adapter> {
    providers: TokenProviderRegistry<A::Subject>,
    resolvers: ConflictResolverRegistry<A>,
}

impl<A: Adapter> UriGenerator<A> {
    /// Create a generator with the built-in providers and strategies.
    #[must_use]
    pub fn new() -> Self {
        let mut providers = TokenProviderRegistry::new();
        providers.register(CONTEXT_LOCALE, Box::new(ContextLocaleProvider));

        let mut resolvers = ConflictResolverRegistry::new();
        resolvers.register(AUTO_INCREMENT, Box::new(AutoIncrementResolver));
        resolvers.register(THROW, Box::new(ThrowResolver));

        Self {
            providers,
            resolvers,
        }
    }

    /// The token provider registry, for registering custom providers.
    pub fn providers_mut(&mut self) -> &mut TokenProviderRegistry<A::Subject> {
        &mut self.providers
    }

    /// The conflict resolver registry, for registering custom strategies.
    pub fn resolvers_mut(&mut self) -> &mut ConflictResolverRegistry<A> {
        &mut self.resolvers
    }

    /// Generate the URI for a context.
    ///
    /// Deterministic and side-effect free: calling this twice on an
    /// unmodified context yields the same URI.
    ///
    /// # Errors
    /// - [`WaypostError::UnknownToken`] for a placeholder with no binding.
    /// - [`WaypostError::UnknownTokenProvider`] for a binding naming an
    ///   unregistered provider.
    /// - Option resolution and provider errors, unchanged.
    /// - [`WaypostError::EmptyTokenValue`] for an empty value without
    ///   `allow_empty`.
    /// - [`WaypostError::MalformedUri`] if the result is not absolute.
    pub fn generate_uri(&self, context: &UriContext<A::Subject>) -> Result<Uri, WaypostError> {
        let schema = context.schema().to_owned();
        let tokens = placeholders(&schema);
        let last_token = tokens.last().cloned();

        let mut substitutions: BTreeMap<String, String> = BTreeMap::new();
        for token in &tokens {
            let binding =
                context
                    .token_provider(token)
                    .ok_or_else(|| WaypostError::UnknownToken {
                        token: token.clone(),
                        schema: schema.clone(),
                    })?;
            let provider =
                self.providers
                    .get(&binding.name)
                    .ok_or_else(|| WaypostError::UnknownTokenProvider {
                        name: binding.name.clone(),
                    })?;

            let mut resolver = OptionsResolver::new();
            resolver.set_default(ALLOW_EMPTY, Value::Bool(false));
            provider.configure_options(&mut resolver);
            let options = resolver.resolve(&binding.name, &binding.options)?;

            let value = provider.provide_value(context, &options)?;
            let is_empty = value.is_empty() || value == "/";
            if is_empty {
                if !options.get_bool(&binding.name, ALLOW_EMPTY)? {
                    return Err(WaypostError::EmptyTokenValue {
                        provider: binding.name.clone(),
                        token: token.clone(),
                        schema: schema.clone(),
                    });
                }
                // Collapse the trailing separator; for the final token
                // also the leading one.
                substitutions.insert(format!("{{{token}}}/"), String::new());
                if last_token.as_deref() == Some(token.as_str()) {
                    substitutions.insert(format!("/{{{token}}}"), String::new());
                }
            }
            substitutions.insert(format!("{{{token}}}"), value);
        }

        let candidate = substitute(&schema, &substitutions);
        match Uri::new(&candidate) {
            Ok(uri) => Ok(uri),
            Err(_) => Err(WaypostError::MalformedUri {
                uri: candidate,
                type_name: context.type_name().clone(),
            }),
        }
    }

    /// Resolve a URI conflict via the context's bound strategy.
    ///
    /// # Errors
    /// - [`WaypostError::UnknownConflictResolver`] for a binding naming
    ///   an unregistered strategy.
    /// - Whatever the strategy itself raises (`throw` always fails).
    pub fn resolve_conflict(
        &self,
        collection: &UriContextCollection<A::Subject>,
        context: &UriContext<A::Subject>,
        adapter: &A,
    ) -> Result<Uri, WaypostError> {
        let binding = context.conflict_resolver().clone();
        let strategy =
            self.resolvers
                .get(&binding.name)
                .ok_or_else(|| WaypostError::UnknownConflictResolver {
                    name: binding.name.clone(),
                })?;
        strategy.resolve_conflict(collection, context, adapter, &binding.options)
    }
}

impl<A: Adapter> Default for UriGenerator<A> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Schema scanning and substitution
// ---------------------------------------------------------------------------

/// Extract `{name}` placeholders in left-to-right order.
///
/// An unmatched `{` is treated as a literal character.
fn placeholders(schema: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut i = 0;
    while let Some(open) = schema[i..].find('{') {
        let open = i + open;
        match schema[open + 1..].find(['{', '}']) {
            Some(rel) if schema.as_bytes()[open + 1 + rel] == b'}' => {
                let name = &schema[open + 1..open + 1 + rel];
                if !name.is_empty() {
                    tokens.push(name.to_owned());
                }
                i = open + rel + 2;
            }
            // Nested `{` before any `}`: the outer brace is literal.
            Some(rel) => i = open + 1 + rel,
            None => break,
        }
    }
    tokens
}

/// One simultaneous substitution pass.
///
/// At each position the longest matching key wins (ties broken
/// lexicographically); replaced text is never rescanned.
fn substitute(schema: &str, substitutions: &BTreeMap<String, String>) -> String {
    let mut keys: Vec<&String> = substitutions.keys().collect();
    keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let mut out = String::with_capacity(schema.len());
    let mut i = 0;
    'scan: while i < schema.len() {
        for key in &keys {
            if schema[i..].starts_with(key.as_str()) {
                out.push_str(&substitutions[*key]);
                i += key.len();
                continue 'scan;
            }
        }
        let Some(c) = schema[i..].chars().next() else {
            break;
        };
        out.push(c);
        i += c.len_utf8();
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::adapter::memory::{MemoryAdapter, MemoryContent};
    use crate::metadata::class::{AutoRouteDefinition, ServiceBinding};
    use crate::model::types::{Locale, TokenName, TypeName};
    use crate::token::{ResolvedOptions, TokenProvider};

    /// Provider returning a fixed value, declaring no options of its own.
    struct StaticProvider(&'static str);

    impl TokenProvider<MemoryContent> for StaticProvider {
        fn configure_options(&self, _resolver: &mut OptionsResolver) {}

        fn provide_value(
            &self,
            _context: &UriContext<MemoryContent>,
            _options: &ResolvedOptions,
        ) -> Result<String, WaypostError> {
            Ok(self.0.to_owned())
        }
    }

    struct TokenSpec {
        token: &'static str,
        provider: &'static str,
        allow_empty: bool,
    }

    fn generator_with(
        values: &[(&'static str, &'static str)],
    ) -> UriGenerator<MemoryAdapter> {
        let mut generator = UriGenerator::new();
        for (name, value) in values {
            generator
                .providers_mut()
                .register(*name, Box::new(StaticProvider(value)));
        }
        generator
    }

    fn context_with(
        schema: &str,
        specs: &[TokenSpec],
        locale: Option<&str>,
    ) -> UriContext<MemoryContent> {
        let mut providers = std::collections::BTreeMap::new();
        for spec in specs {
            let mut options = std::collections::BTreeMap::new();
            if spec.allow_empty {
                options.insert(ALLOW_EMPTY.to_owned(), Value::Bool(true));
            }
            providers.insert(
                TokenName::new(spec.token).unwrap(),
                ServiceBinding::with_options(spec.provider, options),
            );
        }
        let collection = UriContextCollection::new(
            Rc::new(MemoryContent::new("c1")),
            TypeName::new("doc").unwrap(),
        );
        collection.create_uri_context(
            "_default",
            &AutoRouteDefinition::new(schema),
            &providers,
            ServiceBinding::new(THROW),
            locale.map(|l| Locale::new(l).unwrap()),
        )
    }

    #[test]
    fn schema_without_placeholders_passes_through() {
        let generator = generator_with(&[]);
        let ctx = context_with("/plain/path", &[], None);
        assert_eq!(generator.generate_uri(&ctx).unwrap().as_str(), "/plain/path");
    }

    #[test]
    fn relative_schema_without_placeholders_is_malformed() {
        let generator = generator_with(&[]);
        let ctx = context_with("plain/path", &[], None);
        let err = generator.generate_uri(&ctx).unwrap_err();
        match err {
            WaypostError::MalformedUri { uri, type_name } => {
                assert_eq!(uri, "plain/path");
                assert_eq!(type_name.as_str(), "doc");
            }
            other => panic!("expected MalformedUri, got {other:?}"),
        }
    }

    #[test]
    fn nonempty_values_substitute_in_place() {
        let generator = generator_with(&[("cat", "news"), ("slug", "hello-world")]);
        let ctx = context_with(
            "/blog/{category}/{slug}",
            &[
                TokenSpec { token: "category", provider: "cat", allow_empty: false },
                TokenSpec { token: "slug", provider: "slug", allow_empty: false },
            ],
            None,
        );
        assert_eq!(
            generator.generate_uri(&ctx).unwrap().as_str(),
            "/blog/news/hello-world"
        );
    }

    #[test]
    fn generation_is_idempotent() {
        let generator = generator_with(&[("slug", "stable")]);
        let ctx = context_with(
            "/x/{slug}",
            &[TokenSpec { token: "slug", provider: "slug", allow_empty: false }],
            None,
        );
        let first = generator.generate_uri(&ctx).unwrap();
        let second = generator.generate_uri(&ctx).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn unknown_token_names_token_and_schema() {
        let generator = generator_with(&[]);
        let ctx = context_with("/x/{mystery}", &[], None);
        let err = generator.generate_uri(&ctx).unwrap_err();
        match err {
            WaypostError::UnknownToken { token, schema } => {
                assert_eq!(token, "mystery");
                assert_eq!(schema, "/x/{mystery}");
            }
            other => panic!("expected UnknownToken, got {other:?}"),
        }
    }

    #[test]
    fn unregistered_provider_is_an_error() {
        let generator = generator_with(&[]);
        let ctx = context_with(
            "/x/{slug}",
            &[TokenSpec { token: "slug", provider: "ghost", allow_empty: false }],
            None,
        );
        let err = generator.generate_uri(&ctx).unwrap_err();
        assert!(matches!(
            err,
            WaypostError::UnknownTokenProvider { ref name } if name == "ghost"
        ));
    }

    #[test]
    fn empty_value_without_allow_empty_fails() {
        let generator = generator_with(&[("empty", "")]);
        let ctx = context_with(
            "/x/{slug}",
            &[TokenSpec { token: "slug", provider: "empty", allow_empty: false }],
            None,
        );
        let err = generator.generate_uri(&ctx).unwrap_err();
        match err {
            WaypostError::EmptyTokenValue { provider, token, schema } => {
                assert_eq!(provider, "empty");
                assert_eq!(token, "slug");
                assert_eq!(schema, "/x/{slug}");
            }
            other => panic!("expected EmptyTokenValue, got {other:?}"),
        }
    }

    #[test]
    fn single_slash_value_counts_as_empty() {
        let generator = generator_with(&[("root", "/")]);
        let ctx = context_with(
            "/x/{slug}",
            &[TokenSpec { token: "slug", provider: "root", allow_empty: false }],
            None,
        );
        assert!(matches!(
            generator.generate_uri(&ctx).unwrap_err(),
            WaypostError::EmptyTokenValue { .. }
        ));
    }

    #[test]
    fn whitespace_value_is_not_empty() {
        let generator = generator_with(&[("blank", " ")]);
        let ctx = context_with(
            "/x/{slug}",
            &[TokenSpec { token: "slug", provider: "blank", allow_empty: false }],
            None,
        );
        assert_eq!(generator.generate_uri(&ctx).unwrap().as_str(), "/x/ ");
    }

    #[test]
    fn empty_last_token_collapses_leading_separator() {
        let generator = generator_with(&[("empty", "")]);
        let ctx = context_with(
            "/{parent}/title",
            &[TokenSpec { token: "parent", provider: "empty", allow_empty: true }],
            None,
        );
        assert_eq!(generator.generate_uri(&ctx).unwrap().as_str(), "/title");
    }

    #[test]
    fn empty_trailing_token_collapses_to_locale_only() {
        let generator = generator_with(&[("locale", "de"), ("empty", "")]);
        let specs = [
            TokenSpec { token: "locale", provider: "locale", allow_empty: true },
            TokenSpec { token: "parent", provider: "empty", allow_empty: true },
        ];
        let ctx = context_with("/{locale}/{parent}", &specs, None);
        assert_eq!(generator.generate_uri(&ctx).unwrap().as_str(), "/de");

        let ctx = context_with("/{locale}/{parent}/", &specs, None);
        assert_eq!(generator.generate_uri(&ctx).unwrap().as_str(), "/de/");
    }

    #[test]
    fn interior_empty_token_collapses_trailing_separator_only() {
        let generator = generator_with(&[("empty", ""), ("slug", "b")]);
        let ctx = context_with(
            "/a/{mid}/{slug}",
            &[
                TokenSpec { token: "mid", provider: "empty", allow_empty: true },
                TokenSpec { token: "slug", provider: "slug", allow_empty: false },
            ],
            None,
        );
        assert_eq!(generator.generate_uri(&ctx).unwrap().as_str(), "/a/b");
    }

    #[test]
    fn context_locale_provider_integrates_with_collapsing() {
        let generator = generator_with(&[("slug", "post")]);
        let specs = [
            TokenSpec { token: "locale", provider: CONTEXT_LOCALE, allow_empty: true },
            TokenSpec { token: "slug", provider: "slug", allow_empty: false },
        ];

        let with_locale = context_with("/{locale}/{slug}", &specs, Some("de"));
        assert_eq!(generator.generate_uri(&with_locale).unwrap().as_str(), "/de/post");

        // Without a locale the token is empty and its separator collapses.
        let without = context_with("/{locale}/{slug}", &specs, None);
        assert_eq!(generator.generate_uri(&without).unwrap().as_str(), "/post");
    }

    #[test]
    fn fully_collapsed_schema_is_malformed() {
        let generator = generator_with(&[("empty", "")]);
        let ctx = context_with(
            "/{only}",
            &[TokenSpec { token: "only", provider: "empty", allow_empty: true }],
            None,
        );
        assert!(matches!(
            generator.generate_uri(&ctx).unwrap_err(),
            WaypostError::MalformedUri { .. }
        ));
    }

    #[test]
    fn unknown_conflict_resolver_is_an_error() {
        let generator = generator_with(&[]);
        let collection = UriContextCollection::new(
            Rc::new(MemoryContent::new("c1")),
            TypeName::new("doc").unwrap(),
        );
        // Bind a strategy nobody registered.
        let mut ctx = collection.create_uri_context(
            "_default",
            &AutoRouteDefinition::new("/x"),
            &std::collections::BTreeMap::new(),
            ServiceBinding::new("bespoke"),
            None,
        );
        ctx.set_uri(Uri::new("/x").unwrap());
        let adapter = MemoryAdapter::new();
        let err = generator
            .resolve_conflict(&collection, &ctx, &adapter)
            .unwrap_err();
        assert!(matches!(
            err,
            WaypostError::UnknownConflictResolver { ref name } if name == "bespoke"
        ));
    }

    // -- placeholder scanning --

    #[test]
    fn placeholder_scan_handles_literals_and_unclosed_braces() {
        assert_eq!(placeholders("/a/{x}/{y}"), vec!["x", "y"]);
        assert!(placeholders("/no/tokens").is_empty());
        assert!(placeholders("/unclosed/{oops").is_empty());
        assert_eq!(placeholders("/outer{/{x}").len(), 1);
        assert!(placeholders("/{}").is_empty());
    }
}

// ---------------------------------------------------------------------------
// Property tests
// ---------------------------------------------------------------------------

#[cfg(all(test, feature = "proptests"))]
mod proptests {
    use proptest::prelude::*;

    use super::tests_support::{prop_context, prop_generator};

    proptest! {
        #[test]
        fn nonempty_values_appear_verbatim(value in "[a-z0-9][a-z0-9-]{0,15}") {
            let generator = prop_generator(&value);
            let ctx = prop_context("/fixed/{slug}");
            let uri = generator.generate_uri(&ctx).unwrap();
            prop_assert_eq!(uri.as_str(), format!("/fixed/{value}"));
        }

        #[test]
        fn generation_is_deterministic(value in "[a-z0-9]{1,12}") {
            let generator = prop_generator(&value);
            let ctx = prop_context("/p/{slug}");
            let first = generator.generate_uri(&ctx).unwrap();
            let second = generator.generate_uri(&ctx).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
