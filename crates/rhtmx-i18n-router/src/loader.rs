// File: src/loader.rs
// Purpose: Reading route declarations from YAML, JSON and TOML files

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::declaration::RouteDeclarations;
use crate::error::{Result, RouterError};

/// Route file syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Yaml,
    Json,
    Toml,
}

impl SourceFormat {
    /// Guesses the format from the file extension, YAML when unknown
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("json") => SourceFormat::Json,
            Some("toml") => SourceFormat::Toml,
            _ => SourceFormat::Yaml,
        }
    }
}

/// One route file, with an optional id prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSource {
    pub path: PathBuf,
    pub prefix: String,
    pub format: Option<SourceFormat>,
}

impl RouteSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            prefix: String::new(),
            format: None,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_format(mut self, format: SourceFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn format(&self) -> SourceFormat {
        self.format.unwrap_or_else(|| SourceFormat::from_path(&self.path))
    }

    /// Reads and parses the file; `None` for an empty document
    pub fn read(&self) -> Result<Option<RouteDeclarations>> {
        if !self.path.exists() {
            return Err(RouterError::FileNotFound(self.path.clone()));
        }

        let content = fs::read_to_string(&self.path).map_err(|source| RouterError::Io {
            path: self.path.clone(),
            source,
        })?;

        let decls = parse(&content, self.format()).map_err(|message| RouterError::Parse {
            path: self.path.clone(),
            message,
        })?;

        Ok(decls.map(|decls| decls.with_prefix(&self.prefix)))
    }
}

impl From<&str> for RouteSource {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<PathBuf> for RouteSource {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}

/// Parses one document; blank, comment-only, `null` and empty-map documents give `None`
fn parse(content: &str, format: SourceFormat) -> std::result::Result<Option<RouteDeclarations>, String> {
    let blank = content.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#')
    });
    if blank {
        return Ok(None);
    }

    let decls = match format {
        SourceFormat::Yaml => {
            let value: serde_yaml::Value = serde_yaml::from_str(content).map_err(|e| e.to_string())?;
            if value.is_null() {
                return Ok(None);
            }
            serde_yaml::from_value(value).map_err(|e| e.to_string())?
        }
        SourceFormat::Json => {
            let value: serde_json::Value = serde_json::from_str(content).map_err(|e| e.to_string())?;
            if value.is_null() {
                return Ok(None);
            }
            serde_json::from_value(value).map_err(|e| e.to_string())?
        }
        SourceFormat::Toml => RouteDeclarations::from_toml_str(content).map_err(|e| e.to_string())?,
    };

    Ok(Some(decls).filter(|decls: &RouteDeclarations| !decls.is_empty()))
}

/// Loads and merges route files, in order
///
/// Later files win on conflicting values (see [`RouteDeclarations::merge`]).
///
/// # Errors
///
/// [`RouterError::EmptySource`] for an empty list, [`RouterError::FileNotFound`],
/// [`RouterError::Io`] or [`RouterError::Parse`] for a bad file, and
/// [`RouterError::NoRoutes`] when every file is empty.
pub fn load_sources(sources: &[RouteSource]) -> Result<RouteDeclarations> {
    if sources.is_empty() {
        return Err(RouterError::EmptySource);
    }

    let mut merged = RouteDeclarations::new();
    for source in sources {
        match source.read()? {
            Some(decls) => {
                debug!(path = ?source.path, routes = decls.len(), "Route source loaded");
                merged.merge(decls);
            }
            None => debug!(path = ?source.path, "Route source is empty, skipped"),
        }
    }

    if merged.is_empty() {
        return Err(RouterError::NoRoutes);
    }
    Ok(merged)
}
