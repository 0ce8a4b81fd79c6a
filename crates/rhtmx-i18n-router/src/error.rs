/// Error types
///
/// Two tiers, mirroring when they can happen:
/// - [`RouterError`]: configuration problems found while loading sources or
///   building a route table. Fatal, returned from constructors.
/// - [`GenerationError`]: bad input to URL generation. Never returned across
///   `Route::url()`; recorded on the route and forwarded to the debug hook.
///
/// [`DispatchError`] belongs to the controller registry.
use std::path::PathBuf;

use thiserror::Error;

/// Configuration-time failure (sources, compiler, table, cache)
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("no route source given")]
    EmptySource,

    #[error("route source does not exist: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("cannot read route source {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse route source {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("no routes available")]
    NoRoutes,

    #[error("controller not found in route: {id}")]
    MissingController { id: String },

    #[error("invalid entry \"{key}\" in route {id}: {reason}")]
    InvalidDeclaration {
        id: String,
        key: String,
        reason: String,
    },

    #[error("parameter \"{name}\" is declared twice in template \"{template}\"")]
    DuplicateParam { template: String, name: String },

    #[error("invalid pattern \"{pattern}\" in template \"{template}\": {source}")]
    InvalidConstraint {
        template: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("cached template \"{template}\" does not agree with its parameter list")]
    CacheMismatch { template: String },

    #[error("invalid route cache: {0}")]
    Cache(#[from] serde_json::Error),

    #[error("unknown option type \"{0}\", expected one of: bool, boolean, int, integer, float, double, string")]
    InvalidOptionType(String),
}

/// URL generation failure, recorded on the `Route` that produced it
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    #[error("no route defined for language \"{lang}\" for id {id}")]
    UnknownLanguage { id: String, lang: String },

    #[error(
        "route param regex not match, name: {name}, regex: {regex}, value: {value}, lang: {lang}, id: {id}"
    )]
    ParamMismatch {
        id: String,
        lang: String,
        name: String,
        regex: String,
        value: String,
    },

    #[error("route required param not found for rewrite url: {name}, lang: {lang}, id: {id}")]
    MissingParam {
        id: String,
        lang: String,
        name: String,
    },
}

/// Controller resolution failure
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    #[error("controller not found")]
    NotFound,

    #[error("controller reference does not match Controller::method: {0}")]
    InvalidReference(String),

    #[error("namespace is not allowed: {0}")]
    NamespaceNotAllowed(String),

    #[error("controller is not callable: {0}")]
    NotCallable(String),
}

impl DispatchError {
    /// HTTP-like status the fallback chain is keyed on
    pub fn status(&self) -> u16 {
        match self {
            DispatchError::NotFound => 404,
            _ => 500,
        }
    }
}

pub type Result<T, E = RouterError> = std::result::Result<T, E>;
