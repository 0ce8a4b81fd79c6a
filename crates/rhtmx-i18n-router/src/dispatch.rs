// File: src/dispatch.rs
// Purpose: Controller resolution for matched routes

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::error::DispatchError;
use crate::route::Route;

static REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?P<controller>[\\a-z0-9_]+)::(?P<method>[a-z0-9_]+)$").unwrap()
});

/// Callback notified when a fallback kicks in
pub type DispatchHook = Arc<dyn Fn(&DispatchError) + Send + Sync>;

/// Controller instance built by a [`Handler::Factory`]
///
/// `call` returns `None` when the instance has no method by that name.
pub trait Controller<C, R> {
    fn call(&mut self, method: &str, route: &Route, ctx: &C) -> Option<R>;
}

/// How a controller reference is served
pub enum Handler<C, R> {
    /// Static function registered under a full `Controller::method` reference
    Function(fn(&Route, &C) -> R),
    /// Builds an instance from the context; registered under the controller part
    Factory(fn(&C) -> Box<dyn Controller<C, R>>),
}

struct Fallback {
    controller: String,
    hook: Option<DispatchHook>,
}

/// Maps controller references (`Namespace\Controller::method`) to handlers
///
/// `C` is an explicit context handed to every handler, `R` the handler
/// output.
///
/// # Examples
///
/// ```
/// use rhtmx_i18n_router::{ControllerRegistry, DispatchError, Route};
///
/// fn home(_route: &Route, greeting: &String) -> String {
///     format!("{} home", greeting)
/// }
///
/// let registry = ControllerRegistry::new().with_function("App\\Home::index", home);
/// let ctx = "hello".to_string();
///
/// assert_eq!(registry.load("App\\Home::index", &Route::empty(), &ctx).unwrap(), "hello home");
/// assert_eq!(registry.dispatch(&Route::empty(), &ctx), Err(DispatchError::NotFound));
/// ```
pub struct ControllerRegistry<C, R> {
    functions: HashMap<String, fn(&Route, &C) -> R>,
    factories: HashMap<String, fn(&C) -> Box<dyn Controller<C, R>>>,
    allowed_namespaces: Vec<String>,
    not_found: Option<Fallback>,
    not_callable: Option<Fallback>,
}

impl<C, R> ControllerRegistry<C, R> {
    pub fn new() -> Self {
        Self {
            functions: HashMap::new(),
            factories: HashMap::new(),
            allowed_namespaces: Vec::new(),
            not_found: None,
            not_callable: None,
        }
    }

    /// Registers a handler
    ///
    /// A function is keyed by the full reference, a factory by the
    /// controller part only.
    pub fn with_handler(mut self, reference: impl Into<String>, handler: Handler<C, R>) -> Self {
        match handler {
            Handler::Function(function) => {
                self.functions.insert(reference.into(), function);
            }
            Handler::Factory(factory) => {
                self.factories.insert(reference.into(), factory);
            }
        }
        self
    }

    pub fn with_function(self, reference: impl Into<String>, function: fn(&Route, &C) -> R) -> Self {
        self.with_handler(reference, Handler::Function(function))
    }

    pub fn with_factory(self, controller: impl Into<String>, factory: fn(&C) -> Box<dyn Controller<C, R>>) -> Self {
        self.with_handler(controller, Handler::Factory(factory))
    }

    /// Only controllers starting with one of the allowed prefixes are served
    pub fn with_allowed_namespace(mut self, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        if !namespace.is_empty() && !self.allowed_namespaces.contains(&namespace) {
            self.allowed_namespaces.push(namespace);
        }
        self
    }

    pub fn with_allowed_namespaces<I, S>(self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        namespaces
            .into_iter()
            .fold(self, |registry, namespace| registry.with_allowed_namespace(namespace))
    }

    /// Controller served when the route has no controller (404)
    pub fn with_fallback_not_found(mut self, controller: impl Into<String>, hook: Option<DispatchHook>) -> Self {
        self.not_found = Some(Fallback {
            controller: controller.into(),
            hook,
        });
        self
    }

    /// Controller served when a reference cannot be resolved (500)
    pub fn with_fallback_not_callable(mut self, controller: impl Into<String>, hook: Option<DispatchHook>) -> Self {
        self.not_callable = Some(Fallback {
            controller: controller.into(),
            hook,
        });
        self
    }

    /// Runs the controller of a route, falling back on failure
    ///
    /// On failure the matching hook is notified, then the fallback
    /// controller is tried (each controller at most once). The original
    /// error is returned when no fallback succeeds.
    pub fn dispatch(&self, route: &Route, ctx: &C) -> Result<R, DispatchError> {
        let mut tried = Vec::new();
        self.dispatch_reference(route.controller(), route, ctx, &mut tried)
    }

    fn dispatch_reference(
        &self,
        reference: &str,
        route: &Route,
        ctx: &C,
        tried: &mut Vec<String>,
    ) -> Result<R, DispatchError> {
        tried.push(reference.to_string());

        let err = match self.load(reference, route, ctx) {
            Ok(output) => return Ok(output),
            Err(err) => err,
        };
        warn!(reference, status = err.status(), "{}", err);

        let fallback = if err.status() == 404 {
            self.not_found.as_ref()
        } else {
            self.not_callable.as_ref()
        };

        if let Some(fallback) = fallback {
            if let Some(hook) = &fallback.hook {
                hook(&err);
            }
            if !fallback.controller.is_empty() && !tried.contains(&fallback.controller) {
                if let Ok(output) = self.dispatch_reference(&fallback.controller, route, ctx, tried) {
                    return Ok(output);
                }
            }
        }

        Err(err)
    }

    /// Resolves and runs one reference, without fallbacks
    pub fn load(&self, reference: &str, route: &Route, ctx: &C) -> Result<R, DispatchError> {
        if reference.is_empty() {
            return Err(DispatchError::NotFound);
        }

        let caps = REFERENCE
            .captures(reference)
            .ok_or_else(|| DispatchError::InvalidReference(reference.to_string()))?;
        let controller = &caps["controller"];
        let method = &caps["method"];

        if !self.allowed_namespaces.is_empty()
            && !self
                .allowed_namespaces
                .iter()
                .any(|namespace| controller.starts_with(namespace.as_str()))
        {
            return Err(DispatchError::NamespaceNotAllowed(reference.to_string()));
        }

        debug!(reference, "Dispatching controller");

        if let Some(function) = self.functions.get(reference) {
            return Ok(function(route, ctx));
        }

        self.factories
            .get(controller)
            .and_then(|factory| factory(ctx).call(method, route, ctx))
            .ok_or_else(|| DispatchError::NotCallable(reference.to_string()))
    }
}

impl<C, R> Default for ControllerRegistry<C, R> {
    fn default() -> Self {
        Self::new()
    }
}
