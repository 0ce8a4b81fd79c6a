// File: src/table.rs
// Purpose: Route table construction, lookup data and cache round trip

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::declaration::{DeclValue, OptionValue, Options, RouteDeclarations};
use crate::error::{Result, RouterError};
use crate::path;
use crate::template::{template_from_cache, CompiledRoute, ParamSpec, Template};
use crate::Params;

// ============================================================================
// Construction Options
// ============================================================================

/// Reserved keys inside a route declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Labels {
    /// Key holding the controller reference (default: "__")
    #[serde(default = "default_controller_label")]
    pub controller: String,

    /// Key holding the option bag (default: "options")
    #[serde(default = "default_options_label")]
    pub options: String,

    /// Key inside the option bag holding the space separated method list (default: "methods")
    #[serde(default = "default_methods_label")]
    pub methods: String,
}

fn default_controller_label() -> String {
    "__".to_string()
}

fn default_options_label() -> String {
    "options".to_string()
}

fn default_methods_label() -> String {
    "methods".to_string()
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            controller: default_controller_label(),
            options: default_options_label(),
            methods: default_methods_label(),
        }
    }
}

/// Compiles [`RouteDeclarations`] into a [`RouteTable`]
///
/// # Examples
///
/// ```
/// use rhtmx_i18n_router::{RouteDeclarations, TableBuilder};
///
/// let mut decls = RouteDeclarations::new();
/// decls.set("TEST_ROOT", "__", "ControllerTest::Root").set("TEST_ROOT", "FR", "accueil");
///
/// let table = TableBuilder::new().base_path("/fr/").build(&decls).unwrap();
/// let entry = table.get("TEST_ROOT").unwrap();
/// assert_eq!(entry.route("FR").unwrap().original(), "fr/accueil");
/// ```
#[derive(Debug, Clone, Default)]
pub struct TableBuilder {
    base_path: String,
    labels: Labels,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefix joined in front of every template (cleaned of slashes)
    pub fn base_path(mut self, base_path: impl AsRef<str>) -> Self {
        self.base_path = path::clean(base_path.as_ref()).to_string();
        self
    }

    pub fn labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    /// Builds every route, failing on the first configuration error
    pub fn build(&self, decls: &RouteDeclarations) -> Result<RouteTable> {
        if decls.is_empty() {
            return Err(RouterError::NoRoutes);
        }

        let entries = decls
            .iter()
            .map(|(id, keys)| {
                let entry = self.build_entry(id, keys)?;
                Ok((id.clone(), Arc::new(entry)))
            })
            .collect::<Result<IndexMap<_, _>>>()?;

        let table = RouteTable { entries };
        debug!(
            routes = table.len(),
            variants = table.iter().map(|entry| entry.routes.len()).sum::<usize>(),
            base_path = %self.base_path,
            "Route table built"
        );
        Ok(table)
    }

    fn build_entry(&self, id: &str, keys: &IndexMap<String, DeclValue>) -> Result<RouteEntry> {
        let controller = match keys.get(&self.labels.controller) {
            Some(DeclValue::Text(controller)) if !controller.trim().is_empty() => controller.clone(),
            _ => return Err(RouterError::MissingController { id: id.to_string() }),
        };

        let options = match keys.get(&self.labels.options) {
            None => Options::new(),
            Some(DeclValue::Options(options)) => options.clone(),
            Some(DeclValue::Text(_)) => {
                return Err(invalid(id, &self.labels.options, "expected a mapping of options"))
            }
        };

        let methods = match options.get(&self.labels.methods) {
            None => IndexSet::new(),
            Some(OptionValue::Str(list)) => list
                .split_whitespace()
                .map(str::to_ascii_uppercase)
                .collect(),
            Some(_) => {
                return Err(invalid(id, &self.labels.methods, "expected a space separated list of methods"))
            }
        };

        let mut routes = IndexMap::new();
        for (lang, value) in keys {
            if *lang == self.labels.controller || *lang == self.labels.options {
                continue;
            }
            let DeclValue::Text(raw) = value else {
                return Err(invalid(id, lang, "expected a path template"));
            };
            if query_mark_in_param(raw) {
                return Err(invalid(id, lang, "a '?' inside a parameter would cut the template"));
            }
            let cleaned = path::clean(raw);
            let full = path::join_base(&self.base_path, cleaned);
            let template = Template::parse(&full)?;
            routes.insert(lang.clone(), LangRoute::from_template(template)?);
        }

        Ok(RouteEntry {
            id: id.to_string(),
            controller,
            methods,
            options,
            routes,
        })
    }
}

/// Whether the first `?` of a template sits inside a `{...}` token
///
/// Templates are cut at the first `?`, so such a template would lose the
/// end of its constraint.
fn query_mark_in_param(template: &str) -> bool {
    let Some(pos) = template.find('?') else {
        return false;
    };
    let depth = template[..pos].chars().fold(0i32, |depth, ch| match ch {
        '{' => depth + 1,
        '}' => (depth - 1).max(0),
        _ => depth,
    });
    depth > 0
}

fn invalid(id: &str, key: &str, reason: &str) -> RouterError {
    RouterError::InvalidDeclaration {
        id: id.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

// ============================================================================
// Compiled Routes
// ============================================================================

/// One compiled language variant: cache data plus the compiled matchers
#[derive(Debug, Clone)]
pub struct LangRoute {
    compiled: CompiledRoute,
    template: Template,
    matcher: Regex,
    validators: Vec<Regex>,
}

impl LangRoute {
    fn from_template(template: Template) -> Result<Self> {
        let compiled = template.clone().into_compiled();
        Self::assemble(compiled, template)
    }

    /// Restores a cached variant without recompiling its template
    fn from_compiled(compiled: CompiledRoute) -> Result<Self> {
        let template = template_from_cache(&compiled)?;
        Self::assemble(compiled, template)
    }

    fn assemble(compiled: CompiledRoute, template: Template) -> Result<Self> {
        let validators = compiled
            .params
            .iter()
            .map(|param| anchored(&param.regex, &compiled.original))
            .collect::<Result<Vec<_>>>()?;
        let matcher = anchored(&compiled.regex, &compiled.original)?;

        Ok(Self {
            compiled,
            template,
            matcher,
            validators,
        })
    }

    /// Cleaned absolute template, base path included
    pub fn original(&self) -> &str {
        &self.compiled.original
    }

    /// Unanchored matching pattern
    pub fn regex(&self) -> &str {
        &self.compiled.regex
    }

    pub fn rewrite(&self) -> &str {
        &self.compiled.rewrite
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.compiled.params
    }

    pub fn compiled(&self) -> &CompiledRoute {
        &self.compiled
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Matches a cleaned path, returning the captured parameters by name
    ///
    /// Optional parameters that did not take part in the match are left out.
    pub fn captures(&self, path: &str) -> Option<Params> {
        let caps = self.matcher.captures(path)?;
        Some(
            self.compiled
                .params
                .iter()
                .filter_map(|param| {
                    caps.name(&param.capture_name())
                        .map(|m| (param.name.clone(), m.as_str().to_string()))
                })
                .collect(),
        )
    }

    /// Whether a value satisfies the constraint of the parameter at `key`
    pub fn accepts(&self, key: usize, value: &str) -> bool {
        self.validators
            .get(key)
            .is_some_and(|validator| validator.is_match(value))
    }
}

/// Anchored, case-insensitive regex for a pattern
fn anchored(pattern: &str, template: &str) -> Result<Regex> {
    RegexBuilder::new(&format!("^(?:{})$", pattern))
        .case_insensitive(true)
        .build()
        .map_err(|source| RouterError::InvalidConstraint {
            template: template.to_string(),
            pattern: pattern.to_string(),
            source,
        })
}

/// Everything known about one route id
#[derive(Debug, Clone)]
pub struct RouteEntry {
    id: String,
    controller: String,
    methods: IndexSet<String>,
    options: Options,
    routes: IndexMap<String, LangRoute>,
}

impl RouteEntry {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Controller reference, exactly as declared
    pub fn controller(&self) -> &str {
        &self.controller
    }

    /// Upper-cased accepted methods; empty means every method
    pub fn methods(&self) -> &IndexSet<String> {
        &self.methods
    }

    pub fn accepts_method(&self, method: &str) -> bool {
        self.methods.is_empty() || self.methods.contains(&method.to_ascii_uppercase())
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn option(&self, label: &str) -> Option<&OptionValue> {
        self.options.get(label)
    }

    /// Language codes in declaration order
    pub fn langs(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    pub fn has_lang(&self, lang: &str) -> bool {
        self.routes.contains_key(lang)
    }

    pub fn route(&self, lang: &str) -> Option<&LangRoute> {
        self.routes.get(lang)
    }

    pub fn routes(&self) -> impl Iterator<Item = (&str, &LangRoute)> {
        self.routes.iter().map(|(lang, route)| (lang.as_str(), route))
    }
}

// ============================================================================
// Table & Cache
// ============================================================================

/// Serializable shape of one [`RouteEntry`], as stored in the route cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedEntry {
    pub id: String,
    pub controller: String,
    #[serde(default)]
    pub methods: Vec<String>,
    #[serde(default)]
    pub options: Options,
    pub langs: Vec<String>,
    pub routes: IndexMap<String, CompiledRoute>,
}

impl From<&RouteEntry> for CachedEntry {
    fn from(entry: &RouteEntry) -> Self {
        Self {
            id: entry.id.clone(),
            controller: entry.controller.clone(),
            methods: entry.methods.iter().cloned().collect(),
            options: entry.options.clone(),
            langs: entry.routes.keys().cloned().collect(),
            routes: entry
                .routes
                .iter()
                .map(|(lang, route)| (lang.clone(), route.compiled.clone()))
                .collect(),
        }
    }
}

impl TryFrom<CachedEntry> for RouteEntry {
    type Error = RouterError;

    fn try_from(cached: CachedEntry) -> Result<Self> {
        let langs: Vec<&String> = cached.routes.keys().collect();
        if cached.langs.iter().collect::<Vec<_>>() != langs {
            return Err(invalid(&cached.id, "langs", "language list does not match the cached routes"));
        }
        if cached.controller.trim().is_empty() {
            return Err(RouterError::MissingController { id: cached.id });
        }

        let routes = cached
            .routes
            .into_iter()
            .map(|(lang, compiled)| Ok((lang, LangRoute::from_compiled(compiled)?)))
            .collect::<Result<IndexMap<_, _>>>()?;

        Ok(Self {
            id: cached.id,
            controller: cached.controller,
            methods: cached
                .methods
                .iter()
                .map(|method| method.to_ascii_uppercase())
                .collect(),
            options: cached.options,
            routes,
        })
    }
}

/// Immutable set of compiled routes, in declaration order
///
/// Entries are shared behind [`Arc`], so a table can be cloned cheaply and
/// handed to one router per request.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: IndexMap<String, Arc<RouteEntry>>,
}

impl RouteTable {
    /// Restores a table from its exported form without recompiling templates
    ///
    /// Constraints are still checked while their matchers are rebuilt.
    pub fn from_cache(cache: IndexMap<String, CachedEntry>) -> Result<Self> {
        if cache.is_empty() {
            return Err(RouterError::NoRoutes);
        }

        let entries = cache
            .into_iter()
            .map(|(id, mut cached)| {
                cached.id = id.clone();
                Ok((id, Arc::new(RouteEntry::try_from(cached)?)))
            })
            .collect::<Result<IndexMap<_, _>>>()?;

        debug!(routes = entries.len(), "Route table restored from cache");
        Ok(Self { entries })
    }

    pub fn from_cache_json(json: &str) -> Result<Self> {
        let cache: IndexMap<String, CachedEntry> = serde_json::from_str(json)?;
        Self::from_cache(cache)
    }

    /// Exports the table as plain data (for logging or caching)
    pub fn export(&self) -> IndexMap<String, CachedEntry> {
        self.entries
            .iter()
            .map(|(id, entry)| (id.clone(), CachedEntry::from(entry.as_ref())))
            .collect()
    }

    pub fn to_cache_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.export())?)
    }

    pub fn get(&self, id: &str) -> Option<&Arc<RouteEntry>> {
        self.entries.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<RouteEntry>> {
        self.entries.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
