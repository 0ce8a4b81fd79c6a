// File: src/config.rs
// Purpose: Router configuration parsing from routes.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::loader::{load_sources, RouteSource, SourceFormat};
use crate::request::RequestContext;
use crate::router::Router;
use crate::table::{Labels, RouteTable, TableBuilder};

/// Router configuration
///
/// ```toml
/// cache = "var/routes.cache.json"
///
/// [routing]
/// base_path = ""
/// default_lang = "FR"
///
/// [[sources]]
/// path = "config/routes.yml"
///
/// [[sources]]
/// path = "config/admin.json"
/// prefix = "ADMIN_"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RouterConfig {
    #[serde(default)]
    pub routing: RoutingConfig,

    #[serde(default)]
    pub sources: Vec<SourceConfig>,

    /// JSON route cache, read instead of the sources when present
    #[serde(default)]
    pub cache: Option<PathBuf>,
}

/// Routing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Prefix joined in front of every template (e.g., "app")
    #[serde(default)]
    pub base_path: String,

    /// Language of the current route before any match (default: "EN")
    #[serde(default = "default_lang")]
    pub default_lang: String,

    /// Base URL for full-scheme URLs; built from the request when unset
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub labels: Labels,
}

/// One route file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub path: PathBuf,

    /// Prepended to every route id of this file
    #[serde(default)]
    pub prefix: String,

    /// Inferred from the extension when unset
    #[serde(default)]
    pub format: Option<SourceFormat>,
}

fn default_lang() -> String {
    "EN".to_string()
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            base_path: String::new(),
            default_lang: default_lang(),
            base_url: None,
            labels: Labels::default(),
        }
    }
}

impl RouterConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // A missing or empty file gives the default config
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let mut config: RouterConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        // Relative paths are relative to the config file
        if let Some(dir) = path.parent() {
            for source in &mut config.sources {
                if source.path.is_relative() {
                    source.path = dir.join(&source.path);
                }
            }
            if let Some(cache) = config.cache.as_mut().filter(|cache| cache.is_relative()) {
                *cache = dir.join(&*cache);
            }
        }

        Ok(config)
    }

    /// Load configuration from the default path (./routes.toml)
    pub fn load_default() -> Result<Self> {
        Self::load("routes.toml")
    }

    pub fn route_sources(&self) -> Vec<RouteSource> {
        self.sources
            .iter()
            .map(|source| RouteSource {
                path: source.path.clone(),
                prefix: source.prefix.clone(),
                format: source.format,
            })
            .collect()
    }

    pub fn table_builder(&self) -> TableBuilder {
        TableBuilder::new()
            .base_path(&self.routing.base_path)
            .labels(self.routing.labels.clone())
    }

    /// Builds the route table, from the cache file when it exists
    pub fn build_table(&self) -> Result<RouteTable> {
        if let Some(cache) = self.cache.as_ref().filter(|cache| cache.exists()) {
            let json = fs::read_to_string(cache)
                .with_context(|| format!("Failed to read route cache: {:?}", cache))?;
            return RouteTable::from_cache_json(&json)
                .with_context(|| format!("Invalid route cache: {:?}", cache));
        }

        let decls = load_sources(&self.route_sources()).context("Failed to load route sources")?;
        self.table_builder()
            .build(&decls)
            .context("Failed to build route table")
    }

    /// Builds a router for one request
    pub fn router(&self, table: impl Into<std::sync::Arc<RouteTable>>, request: RequestContext) -> Router {
        let mut router = Router::new(table, request, &self.routing.default_lang);
        if let Some(base_url) = &self.routing.base_url {
            router.set_base_url(Some(base_url));
        }
        router
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = RouterConfig::default();
        assert_eq!(config.routing.default_lang, "EN");
        assert_eq!(config.routing.labels.controller, "__");
        assert!(config.sources.is_empty());
        assert!(config.cache.is_none());
    }

    #[test]
    fn test_empty_config() {
        let config = toml::from_str::<RouterConfig>("").unwrap_or_default();
        assert_eq!(config.routing.default_lang, "EN");
        assert_eq!(config.routing.labels.methods, "methods");
    }

    #[test]
    fn test_full_config() {
        let toml = r#"
            cache = "var/routes.json"

            [routing]
            base_path = "/fr/"
            default_lang = "FR"
            base_url = "https://example.com"

            [routing.labels]
            controller = "controller"

            [[sources]]
            path = "routes.yml"

            [[sources]]
            path = "admin.routes"
            prefix = "ADMIN_"
            format = "json"
        "#;
        let config: RouterConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.routing.default_lang, "FR");
        assert_eq!(config.routing.labels.controller, "controller");
        assert_eq!(config.routing.labels.options, "options");
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources[1].format, Some(SourceFormat::Json));

        let sources = config.route_sources();
        assert_eq!(sources[1].prefix, "ADMIN_");
        assert_eq!(sources[0].format, None);
    }

    #[test]
    fn test_missing_file_gives_default() {
        let config = RouterConfig::load("/path/does/not/exist/routes.toml").unwrap();
        assert_eq!(config.routing.default_lang, "EN");
    }
}
