//! # RHTMX i18n Router
//!
//! Declarative multilingual routing with bidirectional path templates:
//! - Route tables built from YAML/JSON/TOML declarations (one template per language)
//! - Required parameters (`{id}`), constrained parameters (`{id:\d+}`)
//! - Optional groups, nestable (`list[/page-{num:\d+}]`)
//! - First-match lookup with HTTP method filtering
//! - URL generation, language switching and option-based filtering
//! - JSON cache round trip that skips recompilation
//!
//! ## Matching and generation
//!
//! Each language variant of a route is compiled once into an anchored,
//! case-insensitive pattern plus a reverse template. [`Router::find`] walks
//! the table in declaration order and returns a [`Route`]; the same [`Route`]
//! renders back to a URL with [`Route::url`].
//!
//! ## Example
//!
//! ```
//! use rhtmx_i18n_router::{RequestContext, RouteDeclarations, Router, TableBuilder};
//!
//! let decls = RouteDeclarations::from_yaml_str(
//!     r#"
//! ARTICLE:
//!   __: "Blog::article"
//!   FR: 'articles/{slug}[/page-{page:\d+}]'
//!   EN: 'posts/{slug}[/page-{page:\d+}]'
//! "#,
//! )
//! .unwrap();
//! let table = TableBuilder::new().build(&decls).unwrap();
//! let mut router = Router::new(table, RequestContext::new(), "FR");
//!
//! let route = router.find("/articles/bonjour/page-2");
//! assert_eq!(route.id(), "ARTICLE");
//! assert_eq!(route.param("page"), Some("2"));
//!
//! let mut english = route.clone();
//! english.set_lang("EN");
//! assert_eq!(english.url(), "/posts/bonjour/page-2");
//! ```

use std::sync::Arc;

use indexmap::IndexMap;

// ============================================================================
// Module Declarations
// ============================================================================

pub mod config;
pub mod declaration;
pub mod dispatch;
mod error;
pub mod filter;
pub mod loader;
pub mod path;
pub mod request;
mod route;
mod router;
pub mod table;
pub mod template;

pub use config::RouterConfig;
pub use declaration::{DeclValue, OptionType, OptionValue, RouteDeclarations};
pub use dispatch::{Controller, ControllerRegistry, Handler};
pub use error::{DispatchError, GenerationError, Result, RouterError};
pub use filter::Filter;
pub use loader::{load_sources, RouteSource, SourceFormat};
pub use request::{HttpAccept, RequestContext};
pub use route::Route;
pub use router::Router;
pub use table::{Labels, LangRoute, RouteEntry, RouteTable, TableBuilder};
pub use template::{compile, CompiledRoute, ParamSpec, Template};

// ============================================================================
// Shared Types
// ============================================================================

/// Ordered parameter map (rewrite or query parameters)
pub type Params = IndexMap<String, String>;

/// Callback receiving every generation error as it is recorded
pub type DebugHook = Arc<dyn Fn(&GenerationError) + Send + Sync>;
