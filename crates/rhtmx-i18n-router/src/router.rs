// File: src/router.rs
// Purpose: Per-request router: lookup, URL generation, language switching

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::filter::Filter;
use crate::path;
use crate::request::RequestContext;
use crate::route::Route;
use crate::table::{RouteEntry, RouteTable};
use crate::{DebugHook, Params};

/// Router over a shared [`RouteTable`] for one request
///
/// Holds mutable per-request state (current route, lookup memo, overloaded
/// parameters), so create one per request and share only the table.
///
/// # Examples
///
/// ```
/// use rhtmx_i18n_router::{RequestContext, RouteDeclarations, Router, TableBuilder};
///
/// let mut decls = RouteDeclarations::new();
/// decls
///     .set("NEWS", "__", "News::show")
///     .set("NEWS", "FR", "actualites/{slug}")
///     .set("NEWS", "EN", "news/{slug}");
/// let table = TableBuilder::new().build(&decls).unwrap();
///
/// let request = RequestContext::new().with_uri("/actualites/rentree?ref=home");
/// let mut router = Router::new(table, request, "FR");
/// router.run();
///
/// assert_eq!(router.current().id(), "NEWS");
/// assert_eq!(router.switch_lang("EN", false).url(), "/news/rentree?ref=home");
/// ```
pub struct Router {
    table: Arc<RouteTable>,
    request: RequestContext,
    current: Route,
    found: HashMap<String, Route>,
    overloaded: IndexMap<String, Params>,
    base_url: String,
    debug: Option<DebugHook>,
}

impl Router {
    pub fn new(table: impl Into<Arc<RouteTable>>, request: RequestContext, default_lang: &str) -> Self {
        let base_url = request.build_base_url(false, None);
        Self {
            table: table.into(),
            request,
            current: Route::new("", default_lang, None),
            found: HashMap::new(),
            overloaded: IndexMap::new(),
            base_url,
            debug: None,
        }
    }

    /// Matches the request path and makes the result the current route
    ///
    /// The request's query parameters are attached to the current route.
    /// When nothing matches, the current route is left untouched.
    pub fn run(&mut self) -> &mut Self {
        let path = self.request.path().to_string();
        let route = self.find(&path);
        if !route.is_empty() {
            self.current = route;
            self.current.set_query_params(self.request.query_params());
        }
        self
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn current(&self) -> &Route {
        &self.current
    }

    pub fn table(&self) -> &Arc<RouteTable> {
        &self.table
    }

    pub fn request(&self) -> &RequestContext {
        &self.request
    }

    /// Mutable request; clears the lookup memo since matching depends on the method
    pub fn request_mut(&mut self) -> &mut RequestContext {
        self.found.clear();
        &mut self.request
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sets a custom base URL, or rebuilds it from the request with `None`
    pub fn set_base_url(&mut self, custom: Option<&str>) -> &mut Self {
        self.base_url = match custom {
            Some(url) => url.to_string(),
            None => self.request.build_base_url(false, None),
        };
        self
    }

    /// The request URI as received, optionally prefixed with the base URL
    pub fn raw_current_url(&self, full: bool) -> String {
        let uri = self.request.uri();
        if full {
            format!("{}{}", self.base_url, uri)
        } else {
            uri
        }
    }

    /// Installs (or removes) the callback notified of generation errors
    ///
    /// Routes created afterwards, and the current route, receive it. The
    /// lookup memo is cleared so remembered routes pick up the new hook.
    pub fn set_debug(&mut self, hook: Option<DebugHook>) -> &mut Self {
        self.found.clear();
        self.current.set_debug(hook.clone());
        self.debug = hook;
        self
    }

    // ------------------------------------------------------------------------
    // Matching
    // ------------------------------------------------------------------------

    /// Finds the first route matching a path (query string allowed)
    ///
    /// Routes are tried in declaration order, then languages in declaration
    /// order; routes whose methods exclude the request method are skipped.
    /// Returns the empty route when nothing matches. Results are memoized per
    /// raw input.
    pub fn find(&mut self, url: &str) -> Route {
        if let Some(route) = self.found.get(url) {
            return route.clone();
        }

        let queries = path::parse_query(path::query_string(url));
        let cleaned = path::clean(url);
        let method = self.request.method();

        let matched = self
            .table
            .iter()
            .filter(|entry| entry.accepts_method(method))
            .find_map(|entry| {
                entry.routes().find_map(|(lang, variant)| {
                    variant
                        .captures(cleaned)
                        .map(|params| (Arc::clone(entry), lang.to_string(), params))
                })
            });

        let route = match matched {
            Some((entry, lang, params)) => {
                debug!(path = cleaned, id = entry.id(), lang = %lang, "Route matched");
                let mut route = self.make_route(entry.id().to_string(), lang, Some(entry));
                route.set_rewrite_params(params).set_query_params(queries);
                route
            }
            None => {
                debug!(path = cleaned, method, "No route matched");
                Route::empty()
            }
        };

        self.found.insert(url.to_string(), route.clone());
        route
    }

    // ------------------------------------------------------------------------
    // Generation
    // ------------------------------------------------------------------------

    /// A route by id, in `lang` or the current language
    ///
    /// An unknown id still gives a route with that id; rendering it records
    /// an unknown-language error.
    pub fn route(&self, id: &str, lang: Option<&str>) -> Route {
        let lang = self.lang_or_current(lang);
        let entry = self.table.get(id).cloned();
        self.make_route(id.to_string(), lang, entry)
    }

    /// A route by id with its parameters set
    pub fn url(&self, id: &str, lang: Option<&str>, rewrite: Params, query: Params, full: bool) -> Route {
        let mut route = self.route(id, lang);
        route
            .set_rewrite_params(rewrite)
            .set_query_params(query)
            .set_full_scheme(full);
        route
    }

    /// The current route in another language
    ///
    /// Current rewrite parameters are replaced by the overloaded ones
    /// registered for `lang`; query parameters carry over.
    pub fn switch_lang(&self, lang: &str, full: bool) -> Route {
        let mut route = self.route(self.current.id(), Some(lang));
        route
            .set_rewrite_params(self.switched_rewrites(lang))
            .set_query_params(self.current.query_params().clone())
            .set_full_scheme(full);
        route
    }

    /// The current route in another language, with parameter overrides
    ///
    /// Rewrite parameters: explicit `rewrite` values win over overloaded
    /// ones, which win over the current ones. Query parameters: explicit
    /// values win over the current ones, and `None` removes a key.
    pub fn switch(
        &self,
        lang: &str,
        rewrite: Params,
        query: IndexMap<String, Option<String>>,
        full: bool,
    ) -> Route {
        let mut rewrites = self.switched_rewrites(lang);
        rewrites.extend(rewrite);

        let mut queries = self.current.query_params().clone();
        for (key, value) in query {
            match value {
                Some(value) => {
                    queries.insert(key, value);
                }
                None => {
                    queries.shift_remove(&key);
                }
            }
        }

        let mut route = self.route(self.current.id(), Some(lang));
        route
            .set_rewrite_params(rewrites)
            .set_query_params(queries)
            .set_full_scheme(full);
        route
    }

    fn switched_rewrites(&self, lang: &str) -> Params {
        let mut rewrites = self.current.rewrite_params().clone();
        if let Some(overloads) = self.overloaded.get(lang) {
            rewrites.extend(overloads.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        rewrites
    }

    // ------------------------------------------------------------------------
    // Overloaded parameters
    // ------------------------------------------------------------------------

    /// Registers translated parameter values for one language
    ///
    /// Used only when switching languages; values are percent-encoded here.
    pub fn overload_params<I, K, V>(&mut self, lang: &str, params: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let registered = self.overloaded.entry(lang.to_string()).or_default();
        for (name, value) in params {
            registered.insert(name.into(), path::encode_param(value.as_ref()));
        }
        self
    }

    pub fn overloaded_params(&self) -> &IndexMap<String, Params> {
        &self.overloaded
    }

    pub fn reset_overloaded_params(&mut self) -> &mut Self {
        self.overloaded.clear();
        self
    }

    /// `extra`, then the current query, then the current rewrite parameters,
    /// later sources winning
    pub fn overload_get(&self, extra: Params) -> Params {
        let mut merged = extra;
        merged.extend(self.current.query_params().clone());
        merged.extend(self.current.rewrite_params().clone());
        merged
    }

    // ------------------------------------------------------------------------
    // Filtering
    // ------------------------------------------------------------------------

    /// Every route satisfying the filter, in declaration order
    pub fn filter(&self, filter: &Filter) -> Vec<Route> {
        let lang = self.lang_or_current(filter.target_lang());
        self.table
            .iter()
            .filter(|entry| filter.matches(entry))
            .map(|entry| self.make_route(entry.id().to_string(), lang.clone(), Some(Arc::clone(entry))))
            .collect()
    }

    fn lang_or_current(&self, lang: Option<&str>) -> String {
        lang.filter(|lang| !lang.is_empty())
            .unwrap_or_else(|| self.current.lang())
            .to_string()
    }

    fn make_route(&self, id: String, lang: String, entry: Option<Arc<RouteEntry>>) -> Route {
        let mut route = Route::new(id, lang, entry);
        route
            .set_debug(self.debug.clone())
            .set_base_url(self.base_url.clone());
        route
    }
}
