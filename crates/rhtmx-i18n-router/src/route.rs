// File: src/route.rs
// Purpose: Per-lookup route value: parameters, URL generation, recorded errors

use std::fmt;
use std::sync::Arc;

use indexmap::IndexSet;
use once_cell::sync::Lazy;
use tracing::warn;

use crate::declaration::{OptionValue, Options};
use crate::error::GenerationError;
use crate::path;
use crate::table::RouteEntry;
use crate::{DebugHook, Params};

static NO_OPTIONS: Lazy<Options> = Lazy::new(Options::new);
static NO_METHODS: Lazy<IndexSet<String>> = Lazy::new(IndexSet::new);

/// A route bound to one language, with the values used to build its URL
///
/// Returned by [`Router::find`](crate::Router::find) (parameters filled from
/// the matched path) and by the generation helpers of the router. An empty id
/// means "no route found".
#[derive(Clone, Default)]
pub struct Route {
    id: String,
    lang: String,
    entry: Option<Arc<RouteEntry>>,
    rewrites: Params,
    queries: Params,
    full: bool,
    base_url: String,
    errors: Vec<GenerationError>,
    debug: Option<DebugHook>,
}

impl Route {
    pub(crate) fn new(id: impl Into<String>, lang: impl Into<String>, entry: Option<Arc<RouteEntry>>) -> Self {
        Self {
            id: id.into(),
            lang: lang.into(),
            entry,
            ..Self::default()
        }
    }

    /// The "not found" route
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    pub fn set_lang(&mut self, lang: impl Into<String>) -> &mut Self {
        self.lang = lang.into();
        self
    }

    /// Controller reference of the route, empty when there is none
    pub fn controller(&self) -> &str {
        self.entry.as_deref().map(RouteEntry::controller).unwrap_or("")
    }

    pub fn entry(&self) -> Option<&RouteEntry> {
        self.entry.as_deref()
    }

    pub fn options(&self) -> &Options {
        self.entry.as_deref().map(RouteEntry::options).unwrap_or(&NO_OPTIONS)
    }

    pub fn option(&self, name: &str) -> Option<&OptionValue> {
        self.options().get(name)
    }

    pub fn methods(&self) -> &IndexSet<String> {
        self.entry.as_deref().map(RouteEntry::methods).unwrap_or(&NO_METHODS)
    }

    pub fn langs(&self) -> Vec<&str> {
        self.entry
            .as_deref()
            .map(|entry| entry.langs().collect())
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------------
    // Parameters
    // ------------------------------------------------------------------------

    pub fn rewrite_params(&self) -> &Params {
        &self.rewrites
    }

    pub fn set_rewrite_params(&mut self, params: Params) -> &mut Self {
        self.rewrites = params;
        self
    }

    pub fn set_rewrite_param(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.rewrites.insert(name.into(), value.into());
        self
    }

    pub fn unset_rewrite_param(&mut self, name: &str) -> &mut Self {
        self.rewrites.shift_remove(name);
        self
    }

    pub fn query_params(&self) -> &Params {
        &self.queries
    }

    pub fn set_query_params(&mut self, params: Params) -> &mut Self {
        self.queries = params;
        self
    }

    pub fn set_query_param(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.queries.insert(name.into(), value.into());
        self
    }

    pub fn unset_query_param(&mut self, name: &str) -> &mut Self {
        self.queries.shift_remove(name);
        self
    }

    /// Looks a parameter up in the rewrite parameters, then in the query
    pub fn param(&self, name: &str) -> Option<&str> {
        self.rewrites
            .get(name)
            .or_else(|| self.queries.get(name))
            .map(String::as_str)
    }

    // ------------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------------

    pub fn is_full_scheme(&self) -> bool {
        self.full
    }

    /// Prefix generated URLs with the base URL
    pub fn set_full_scheme(&mut self, full: bool) -> &mut Self {
        self.full = full;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_base_url(&mut self, base_url: impl Into<String>) -> &mut Self {
        self.base_url = base_url.into();
        self
    }

    /// Builds the URL without touching the error list
    ///
    /// Every parameter is checked in template order: a non-empty value must
    /// satisfy its constraint, a missing value is only allowed inside an
    /// optional group. The empty route renders as an empty string.
    pub fn try_url(&self) -> Result<String, GenerationError> {
        if self.id.is_empty() {
            return Ok(String::new());
        }

        let variant = self
            .entry
            .as_deref()
            .and_then(|entry| entry.route(&self.lang))
            .ok_or_else(|| GenerationError::UnknownLanguage {
                id: self.id.clone(),
                lang: self.lang.clone(),
            })?;

        for param in variant.params() {
            match self.rewrite_value(&param.name) {
                Some(value) if !variant.accepts(param.key, value) => {
                    return Err(GenerationError::ParamMismatch {
                        id: self.id.clone(),
                        lang: self.lang.clone(),
                        name: param.name.clone(),
                        regex: param.regex.clone(),
                        value: value.to_string(),
                    });
                }
                Some(_) => {}
                None if param.is_optional() => {}
                None => {
                    return Err(GenerationError::MissingParam {
                        id: self.id.clone(),
                        lang: self.lang.clone(),
                        name: param.name.clone(),
                    });
                }
            }
        }

        let rendered = variant
            .template()
            .render(|param| self.rewrite_value(&param.name));
        let mut url = rendered.trim_matches(['/', '-']).to_string();
        if !self.queries.is_empty() {
            url.push('?');
            url.push_str(&path::build_query(&self.queries));
        }

        let base = if self.full { self.base_url.as_str() } else { "" };
        Ok(format!("{}/{}", base, url))
    }

    /// Builds the URL, recording any failure and returning an empty string
    pub fn url(&mut self) -> String {
        match self.try_url() {
            Ok(url) => url,
            Err(err) => {
                self.record(err);
                String::new()
            }
        }
    }

    fn rewrite_value(&self, name: &str) -> Option<&str> {
        self.rewrites
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    // ------------------------------------------------------------------------
    // Errors
    // ------------------------------------------------------------------------

    /// Installs (or removes) the callback notified of every recorded error
    pub fn set_debug(&mut self, hook: Option<DebugHook>) -> &mut Self {
        self.debug = hook;
        self
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[GenerationError] {
        &self.errors
    }

    fn record(&mut self, err: GenerationError) {
        warn!(id = %self.id, lang = %self.lang, "{}", err);
        if let Some(hook) = &self.debug {
            hook(&err);
        }
        self.errors.push(err);
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.try_url().unwrap_or_default())
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("id", &self.id)
            .field("lang", &self.lang)
            .field("controller", &self.controller())
            .field("rewrites", &self.rewrites)
            .field("queries", &self.queries)
            .field("full", &self.full)
            .field("errors", &self.errors)
            .finish()
    }
}
