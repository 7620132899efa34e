//! C4 — Route (spec §3/§4.4): a single compiled, bindable, runnable unit.
//!
//! Mutated only through `bind()` and the fluent setters (spec §5 concurrency
//! model); everything else is `&self`. The bind state lives behind a
//! `Mutex` rather than requiring `&mut self` because the router hands the
//! same `Arc<Route>` to matchers, middleware, and the dispatcher within one
//! cooperative suspension window (spec §5/§9 design note).

use regex::Regex;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::dispatcher::{DispatcherTable, HandlerKind};
use crate::error::{Error, Result};
use crate::event::{BoundValue, ExternalResolver, IncomingEvent};
use crate::handler::{DispatchOutcome, Handler};
use crate::matchers::{self, Matcher};
use crate::middleware::Middleware;
use crate::uri::{Compiled, Constraint};

/// `bindings[param]` — either a class/function binder, or a reified
/// `"Alias@method"` string resolved at mapper time into its container and
/// method halves (spec §9 design note). Named `container`/`method` rather
/// than reusing `alias` to avoid colliding with the constraint-level
/// parameter rename, which is a different "alias" in the spec's vocabulary.
#[derive(Clone)]
pub enum BindingSource {
    Binder(Arc<dyn crate::event::Binder>),
    ContainerAlias { container: String, method: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Protocol {
    Http,
    Https,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }
}

/// Everything the mapper flattens a `RouteDefinition` into for a single
/// method/path pair (spec §3, §4.6).
pub struct RouteOptions {
    pub path: String,
    pub method: http::Method,
    pub handler: Handler,
    pub name: Option<String>,
    pub domain: Option<String>,
    pub protocol: Option<Protocol>,
    pub rules: HashMap<String, String>,
    pub defaults: HashMap<String, Value>,
    pub bindings: HashMap<String, BindingSource>,
    pub middleware: Vec<Arc<dyn Middleware>>,
    pub exclude_middleware: HashSet<String>,
    pub strict: bool,
    pub fallback: bool,
    /// True for a route synthesized to answer HEAD for a user's GET
    /// (spec §4.6 step 6 / Open Question a).
    pub is_internal_head: bool,
    pub page_layout: Option<Value>,
    pub custom_options: Option<Value>,
}

/// State captured by the most recent `bind()` call (spec §4.4).
#[derive(Clone, Default)]
pub struct BindState {
    pub route_params: HashMap<String, BoundValue>,
    pub query_params: HashMap<String, String>,
}

pub struct Route {
    options: RouteOptions,
    constraints: Vec<Constraint>,
    path_regex: Regex,
    host_regex: Option<Regex>,
    matchers: Vec<Arc<dyn Matcher>>,
    dispatchers: DispatcherTable,
    resolver: Option<Arc<dyn ExternalResolver>>,
    bind_state: Mutex<Option<BindState>>,
}

impl Route {
    pub fn new(options: RouteOptions, compiled: Compiled, resolver: Option<Arc<dyn ExternalResolver>>) -> Self {
        Self {
            options,
            constraints: compiled.constraints,
            path_regex: compiled.path_regex,
            host_regex: compiled.host_regex,
            matchers: matchers::default_matchers(),
            dispatchers: DispatcherTable::default(),
            resolver,
            bind_state: Mutex::new(None),
        }
    }

    // -- accessors used by matchers.rs / collection.rs / mapper.rs --------

    pub fn path(&self) -> &str {
        &self.options.path
    }

    pub fn method(&self) -> &http::Method {
        &self.options.method
    }

    pub fn name(&self) -> Option<&str> {
        self.options.name.as_deref()
    }

    pub fn domain(&self) -> Option<&str> {
        self.options.domain.as_deref()
    }

    pub fn protocol(&self) -> Option<&str> {
        self.options.protocol.as_ref().map(Protocol::as_str)
    }

    pub fn path_regex(&self) -> &Regex {
        &self.path_regex
    }

    pub fn host_regex(&self) -> Option<&Regex> {
        self.host_regex.as_ref()
    }

    pub fn matchers(&self) -> &[Arc<dyn Matcher>] {
        &self.matchers
    }

    pub fn set_matchers(&mut self, matchers: Vec<Arc<dyn Matcher>>) {
        self.matchers = matchers;
    }

    pub fn set_dispatchers(&mut self, dispatchers: DispatcherTable) {
        self.dispatchers = dispatchers;
    }

    pub fn set_resolver(&mut self, resolver: Option<Arc<dyn ExternalResolver>>) {
        self.resolver = resolver;
    }

    pub fn handler(&self) -> &Handler {
        &self.options.handler
    }

    pub fn handler_kind(&self) -> Option<HandlerKind> {
        match &self.options.handler {
            Handler::Callable(_) | Handler::Factory(_) => Some(HandlerKind::Callable),
            Handler::Class { .. } => Some(HandlerKind::Class),
            Handler::Component { .. } => Some(HandlerKind::Component),
            Handler::Redirect(_) => Some(HandlerKind::Redirect),
            Handler::None => None,
        }
    }

    pub fn resolver(&self) -> Option<&Arc<dyn ExternalResolver>> {
        self.resolver.as_ref()
    }

    pub fn is_internal_head(&self) -> bool {
        self.options.is_internal_head
    }

    pub fn is_fallback(&self) -> bool {
        self.options.fallback
    }

    pub fn is_strict(&self) -> bool {
        self.options.strict
    }

    pub fn is_https_only(&self) -> bool {
        self.options.protocol == Some(Protocol::Https)
    }

    pub fn is_http_only(&self) -> bool {
        self.options.protocol == Some(Protocol::Http)
    }

    pub fn is_secure(&self) -> bool {
        self.is_https_only()
    }

    pub fn middleware(&self) -> &[Arc<dyn Middleware>] {
        &self.options.middleware
    }

    pub fn is_middleware_excluded(&self, mw: &Arc<dyn Middleware>) -> bool {
        self.options.exclude_middleware.contains(mw.name())
    }

    pub fn get_option(&self, key: &str, fallback: Option<Value>) -> Option<Value> {
        match key {
            "path" => Some(Value::String(self.options.path.clone())),
            "method" => Some(Value::String(self.options.method.to_string())),
            "name" => self.options.name.clone().map(Value::String),
            "domain" => self.options.domain.clone().map(Value::String),
            "strict" => Some(Value::Bool(self.options.strict)),
            "fallback" => Some(Value::Bool(self.options.fallback)),
            "pageLayout" => self.options.page_layout.clone(),
            "customOptions" => self.options.custom_options.clone(),
            _ => None,
        }
        .or(fallback)
    }

    /// Batch form of `getOption` (spec §4.4 "getOptions(keys[])").
    pub fn get_options(&self, keys: &[&str]) -> HashMap<String, Option<Value>> {
        keys.iter()
            .map(|key| (key.to_string(), self.get_option(key, None)))
            .collect()
    }

    // -- matching -----------------------------------------------------

    pub fn matches(&self, event: &dyn IncomingEvent, include_method: bool) -> bool {
        matchers::matches(&self.matchers, event, self, include_method)
    }

    // -- param introspection (spec §4.4 "params API") ------------------

    pub fn has_param(&self, name: &str) -> bool {
        self.constraints.iter().any(|c| c.param_name() == Some(name))
    }

    pub fn get_param_names(&self) -> Vec<&str> {
        self.constraints.iter().filter_map(|c| c.param_name()).collect()
    }

    pub fn get_optional_param_names(&self) -> Vec<&str> {
        self.constraints
            .iter()
            .filter(|c| c.is_optional())
            .filter_map(|c| c.param_name())
            .collect()
    }

    pub fn is_param_optional(&self, name: &str) -> bool {
        self.constraints
            .iter()
            .find(|c| c.param_name() == Some(name))
            .map(Constraint::is_optional)
            .unwrap_or(false)
    }

    pub fn get_defined_params(&self) -> &HashMap<String, Value> {
        &self.options.defaults
    }

    /// Bound value for `name` from the most recent `bind()`, if any.
    pub fn get_param(&self, name: &str) -> Option<BoundValue> {
        let state = self.bind_state.lock().unwrap_or_else(|e| e.into_inner());
        state.as_ref()?.route_params.get(name).cloned()
    }

    /// All route params bound by the most recent `bind()` (spec §4.7
    /// `Router::getParams`).
    pub fn params(&self) -> HashMap<String, BoundValue> {
        let state = self.bind_state.lock().unwrap_or_else(|e| e.into_inner());
        state.as_ref().map(|s| s.route_params.clone()).unwrap_or_default()
    }

    pub fn query_params(&self) -> HashMap<String, String> {
        let state = self.bind_state.lock().unwrap_or_else(|e| e.into_inner());
        state.as_ref().map(|s| s.query_params.clone()).unwrap_or_default()
    }

    // -- binding (spec §4.4) ------------------------------------------

    /// Extract raw string captures from `path_regex`/`host_regex` against
    /// `event`, apply defaults for unmatched optional params, run any
    /// configured binder per parameter, and stash the result for
    /// `get_param`/`run` to read back.
    pub async fn bind(&self, event: &dyn IncomingEvent) -> Result<()> {
        let uri = event.get_uri();
        let captures = self
            .path_regex
            .captures(&uri)
            .ok_or_else(|| Error::router(format!("uri {uri:?} does not satisfy route {}", self.options.path)))?;

        let mut route_params = HashMap::new();
        let mut capture_index = 1usize;
        for c in self.constraints.iter().filter(|c| !c.is_host()) {
            if let Constraint::Param { name, default, alias, optional, .. } = c {
                let raw = captures.get(capture_index).map(|m| m.as_str().to_string());
                capture_index += 1;
                self.resolve_one(name, alias.as_deref(), raw, default, *optional, event, &mut route_params)
                    .await?;
            }
        }

        if let Some(host_regex) = &self.host_regex {
            if let Some(host_captures) = host_regex.captures(event.host()) {
                let mut host_index = 1usize;
                for c in self.constraints.iter().filter(|c| c.is_host()) {
                    if let Constraint::Param { name, default, alias, optional, .. } = c {
                        let raw = host_captures.get(host_index).map(|m| m.as_str().to_string());
                        host_index += 1;
                        self.resolve_one(name, alias.as_deref(), raw, default, *optional, event, &mut route_params)
                            .await?;
                    }
                }
            }
        }

        let query_params = event.query();
        *self.bind_state.lock().unwrap_or_else(|e| e.into_inner()) = Some(BindState {
            route_params,
            query_params,
        });
        event.set_route_resolver(None);
        Ok(())
    }

    async fn resolve_one(
        &self,
        name: &str,
        alias: Option<&str>,
        raw: Option<String>,
        default: &Option<Value>,
        optional: bool,
        event: &dyn IncomingEvent,
        out: &mut HashMap<String, BoundValue>,
    ) -> Result<()> {
        let value = match self.options.bindings.get(name) {
            Some(BindingSource::Binder(binder)) => {
                binder.resolve(name, raw.as_deref(), event).await?
            }
            Some(BindingSource::ContainerAlias { container, method }) => {
                let resolver = self
                    .resolver
                    .as_ref()
                    .ok_or_else(|| Error::router("route has an Alias@method binding but no resolver was configured"))?;
                resolver
                    .resolve_alias_binder(container)?
                    .invoke(method, name, raw.as_deref())
                    .await?
            }
            None => match raw.or_else(|| default.as_ref().map(|v| v.to_string())) {
                Some(s) => BoundValue::Json(coerce_scalar(&s)),
                None => BoundValue::Json(Value::Null),
            },
        };

        // spec §4.4 step 6: a non-optional param that resolved to undefined
        // (a binder's "not found" signal, or simply an unmatched capture)
        // fails the whole bind rather than binding null.
        if !optional && matches!(value, BoundValue::Json(Value::Null)) {
            return Err(Error::route_not_found(format!(
                "route {}: required parameter {name:?} resolved to no value",
                self.options.path
            )));
        }

        out.insert(name.to_string(), value.clone());
        if let Some(alias) = alias {
            out.insert(alias.to_string(), value);
        }
        Ok(())
    }

    // -- generation (spec §4.4 "generate") ------------------------------

    /// Reconstruct a concrete URI from this route's constraints and the
    /// supplied parameter values, applying defaults for anything omitted.
    /// Any `params` key not consumed by a constraint becomes a query-string
    /// entry (spec §4.4 "generate").
    pub fn generate(&self, params: &HashMap<String, Value>) -> Result<String> {
        let mut out = String::new();
        let mut consumed: HashSet<&str> = HashSet::new();
        for c in self.constraints.iter().filter(|c| !c.is_host()) {
            match c {
                Constraint::Literal { text, .. } => out.push_str(text),
                Constraint::Param {
                    name,
                    prefix,
                    suffix,
                    default,
                    optional,
                    ..
                } => {
                    consumed.insert(name.as_str());
                    let value = params.get(name).cloned().or_else(|| default.clone());
                    match value {
                        Some(v) => {
                            out.push_str(prefix);
                            out.push_str(&value_to_path_segment(&v));
                            out.push_str(suffix);
                        }
                        None if *optional => {}
                        None => {
                            return Err(Error::router(format!(
                                "generate: missing required parameter {name:?} for route {}",
                                self.options.path
                            )))
                        }
                    }
                }
            }
        }
        if out.is_empty() {
            out.push('/');
        }

        let mut leftover: Vec<(&String, &Value)> =
            params.iter().filter(|(k, _)| !consumed.contains(k.as_str())).collect();
        leftover.sort_by(|a, b| a.0.cmp(b.0));
        if !leftover.is_empty() {
            let pairs: Vec<String> = leftover
                .into_iter()
                .map(|(k, v)| {
                    format!(
                        "{}={}",
                        urlencoding::encode(k),
                        urlencoding::encode(&value_to_path_segment(v))
                    )
                })
                .collect();
            out.push('?');
            out.push_str(&pairs.join("&"));
        }
        Ok(out)
    }

    // -- running (spec §4.4 "run") ---------------------------------------

    /// Select a dispatcher by the handler's shape (spec §4.3 selection
    /// rules) and run it; fails if no dispatcher is registered for that
    /// shape, or the route has no handler at all (group-only definitions
    /// never reach here — the mapper rejects them, spec §4.6).
    pub async fn run(&self, event: &dyn IncomingEvent) -> Result<DispatchOutcome> {
        let kind = self.handler_kind().ok_or_else(|| {
            Error::router(format!("route {} has no handler to run", self.options.path))
        })?;
        let dispatcher = self.dispatchers.get(kind).ok_or_else(|| {
            Error::router(format!("no dispatcher registered for handler shape {kind:?}"))
        })?;
        dispatcher.dispatch(event, self).await
    }

    // -- introspection (spec §4.4 "toJson"/dump) --------------------------

    /// `{path, method, handler: dispatcher.name(route), name, domain,
    /// fallback}` (spec §4.4 "toJSON").
    pub fn to_json(&self) -> Value {
        let handler_name = self
            .handler_kind()
            .and_then(|kind| self.dispatchers.get(kind))
            .map(|d| d.name(self))
            .unwrap_or_else(|| "N/A".to_string());

        let mut obj = Map::new();
        obj.insert("path".into(), Value::String(self.options.path.clone()));
        obj.insert("method".into(), Value::String(self.options.method.to_string()));
        obj.insert("handler".into(), Value::String(handler_name));
        obj.insert(
            "name".into(),
            self.options
                .name
                .clone()
                .map(Value::String)
                .unwrap_or_else(|| Value::String("N/A".to_string())),
        );
        obj.insert(
            "domain".into(),
            self.options
                .domain
                .clone()
                .map(Value::String)
                .unwrap_or_else(|| Value::String("N/A".to_string())),
        );
        obj.insert("fallback".into(), Value::Bool(self.options.fallback));
        Value::Object(obj)
    }
}

fn coerce_scalar(raw: &str) -> Value {
    if let Ok(i) = raw.parse::<i64>() {
        Value::from(i)
    } else if let Ok(f) = raw.parse::<f64>() {
        Value::from(f)
    } else {
        Value::String(raw.to_string())
    }
}

fn value_to_path_segment(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
