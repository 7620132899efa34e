//! User-facing route definitions (spec §3): the recursive, declarative tree
//! handed to [`crate::mapper`] for expansion into flat [`crate::route::Route`]s.
//!
//! Builder-style fluent setters, consuming `self` and returning `Self` —
//! grounded on the `Config`/`Builder` pattern in the routing example from
//! the wider retrieval pack (`valar::routing::route`), adapted to Rust's
//! idiom of chainable `fn foo(mut self, ...) -> Self` rather than a mutable
//! struct-literal DSL.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::event::Binder;
use crate::handler::{Callable, ClassController, Component, Resolver};
use crate::middleware::Middleware;
use crate::route::Protocol;

/// Pre-mapper handler shape. Reified into [`crate::handler::Handler`] once
/// the mapper has finished merging inherited attributes (spec §4.6 step 6).
#[derive(Clone)]
pub enum HandlerSpec {
    Callable(Arc<dyn Callable>),
    /// Invoked once, lazily, with a resolver (spec §4.3 "isFactory").
    Factory(Arc<dyn Fn(Resolver) -> Arc<dyn Callable> + Send + Sync>),
    Class {
        controller: Arc<dyn ClassController>,
        class_name: String,
        action: String,
    },
    Component(ComponentSpec),
    /// No handler of its own — a group-only definition (spec §4.6 step 3).
    None,
}

#[derive(Clone)]
pub enum ComponentSpec {
    Eager(Arc<dyn Component>),
    Lazy(
        Arc<
            dyn Fn() -> std::pin::Pin<Box<dyn std::future::Future<Output = Arc<dyn Component>> + Send>>
                + Send
                + Sync,
        >,
    ),
}

impl Default for HandlerSpec {
    fn default() -> Self {
        HandlerSpec::None
    }
}

/// Pre-mapper redirect shape (spec §3 `redirect`).
#[derive(Clone)]
pub enum RedirectSpec {
    Static(String),
    WithStatus { location: String, status: u16 },
    Dynamic(Arc<dyn Fn(&dyn crate::event::IncomingEvent) -> RedirectSpec + Send + Sync>),
}

/// Pre-mapper binding shape (spec §3 `bindings`).
#[derive(Clone)]
pub enum BindingSpec {
    Binder(Arc<dyn Binder>),
    /// `"Alias@method"` string DSL, reified at mapper time into the
    /// resolved container/method pair (spec §9 design note).
    AliasMethod(String),
}

/// Split an `"Alias@method"` binder string into its container and method
/// halves. Defaults the method half to `resolveRouteBinding` when the `@`
/// separator is absent, matching the framework convention this DSL is
/// borrowed from.
pub fn parse_alias_method(spec: &str) -> (String, String) {
    match spec.split_once('@') {
        Some((container, method)) => (container.to_string(), method.to_string()),
        None => (spec.to_string(), "resolveRouteBinding".to_string()),
    }
}

#[derive(Default, Clone)]
pub struct RouteDefinition {
    pub path: Option<String>,
    pub method: Option<http::Method>,
    pub methods: Option<Vec<http::Method>>,
    pub handler: HandlerSpec,
    pub redirect: Option<RedirectSpec>,
    pub name: Option<String>,
    pub domain: Option<String>,
    pub protocol: Option<Protocol>,
    pub rules: HashMap<String, String>,
    pub defaults: HashMap<String, Value>,
    pub bindings: HashMap<String, BindingSpec>,
    pub middleware: Vec<Arc<dyn Middleware>>,
    pub exclude_middleware: Vec<String>,
    pub strict: Option<bool>,
    pub fallback: bool,
    pub children: Vec<RouteDefinition>,
    pub page_layout: Option<Value>,
    pub custom_options: Option<Value>,
    pub is_internal_header: bool,
}

impl RouteDefinition {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }

    pub fn method(mut self, method: http::Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn methods(mut self, methods: Vec<http::Method>) -> Self {
        self.methods = Some(methods);
        self
    }

    pub fn handler(mut self, handler: HandlerSpec) -> Self {
        self.handler = handler;
        self
    }

    pub fn callable(self, callable: Arc<dyn Callable>) -> Self {
        self.handler(HandlerSpec::Callable(callable))
    }

    pub fn redirect(mut self, redirect: RedirectSpec) -> Self {
        self.redirect = Some(redirect);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = Some(protocol);
        self
    }

    pub fn rule(mut self, param: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.rules.insert(param.into(), pattern.into());
        self
    }

    pub fn default_value(mut self, param: impl Into<String>, value: Value) -> Self {
        self.defaults.insert(param.into(), value);
        self
    }

    pub fn binding(mut self, param: impl Into<String>, binding: BindingSpec) -> Self {
        self.bindings.insert(param.into(), binding);
        self
    }

    pub fn middleware(mut self, mw: Arc<dyn Middleware>) -> Self {
        self.middleware.push(mw);
        self
    }

    pub fn exclude_middleware(mut self, name: impl Into<String>) -> Self {
        self.exclude_middleware.push(name.into());
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = Some(strict);
        self
    }

    pub fn fallback(mut self, fallback: bool) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn children(mut self, children: Vec<RouteDefinition>) -> Self {
        self.children = children;
        self
    }

    pub fn page_layout(mut self, layout: Value) -> Self {
        self.page_layout = Some(layout);
        self
    }

    pub fn custom_options(mut self, options: Value) -> Self {
        self.custom_options = Some(options);
        self
    }
}
