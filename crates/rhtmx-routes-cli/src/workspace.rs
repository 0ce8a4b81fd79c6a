// File: src/workspace.rs
// Purpose: Configuration and route table shared by every command

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use rhtmx_i18n_router::{load_sources, RequestContext, RouteSource, RouteTable, Router, RouterConfig};
use tracing::info;

pub struct Workspace {
    pub config: RouterConfig,
    pub table: Arc<RouteTable>,
}

impl Workspace {
    /// Loads the config, then the table from `sources` when given
    ///
    /// Explicit sources bypass the configured cache.
    pub fn load(config_path: &Path, sources: &[PathBuf]) -> Result<Self> {
        let config = RouterConfig::load(config_path)?;

        let table = if sources.is_empty() {
            config.build_table()?
        } else {
            let sources: Vec<RouteSource> = sources.iter().cloned().map(RouteSource::from).collect();
            let decls = load_sources(&sources).context("Failed to load route sources")?;
            config
                .table_builder()
                .build(&decls)
                .context("Failed to build route table")?
        };

        info!(routes = table.len(), "Route table ready");

        Ok(Self {
            config,
            table: Arc::new(table),
        })
    }

    pub fn router(&self, request: RequestContext) -> Router {
        self.config.router(Arc::clone(&self.table), request)
    }
}
