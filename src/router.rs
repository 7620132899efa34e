//! C7 — Router (spec §4.7): the public façade. Registration, configuration,
//! dispatch, named navigation, URL generation, route-middleware gathering.
//!
//! State lives behind `Mutex`/`ArcSwap` rather than requiring `&mut self`
//! everywhere — the teacher crate's `Dispatcher`/`Router` types are built to
//! be shared behind an `Arc` across coroutines, and this follows the same
//! shape so one `Router` can serve concurrent dispatches while a
//! `configure()` rebuild swaps the compiled collection atomically
//! underneath them (spec §5: the *hot path* is single-threaded cooperative
//! per dispatch, not that the whole `Router` is single-owner).

use arc_swap::{ArcSwap, ArcSwapOption};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::collection::{MatchOutcome, RouteCollection};
use crate::definition::RouteDefinition;
use crate::dispatcher::DispatcherTable;
use crate::error::{Error, Result};
use crate::event::{EventEmitter, ExternalResolver, IncomingEvent, SimpleEventEmitter};
use crate::handler::{DispatchOutcome, HandlerSpec};
use crate::mapper::{MapperOptions, RouteMapper};
use crate::matchers::Matcher;
use crate::middleware::{self, Middleware};
use crate::route::{Protocol, Route};

const ALL_VERBS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS"];

/// User options merged by `configure()` and handed to the mapper on every
/// rebuild (spec §4.7 "State").
#[derive(Clone)]
pub struct RouterOptions {
    pub middleware: Vec<Arc<dyn Middleware>>,
    pub rules: HashMap<String, String>,
    pub defaults: HashMap<String, serde_json::Value>,
    pub matchers: Vec<Arc<dyn Matcher>>,
    pub dispatchers: DispatcherTable,
    pub resolver: Option<Arc<dyn ExternalResolver>>,
    pub max_depth: usize,
    pub skip_middleware: bool,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            middleware: Vec::new(),
            rules: HashMap::new(),
            defaults: HashMap::new(),
            matchers: crate::matchers::default_matchers(),
            dispatchers: DispatcherTable::default(),
            resolver: None,
            max_depth: 16,
            skip_middleware: false,
        }
    }
}

pub struct GenerateOptions {
    pub name: String,
    pub params: HashMap<String, serde_json::Value>,
    pub query: HashMap<String, String>,
    pub hash: Option<String>,
    pub with_domain: bool,
    pub protocol: Option<Protocol>,
}

impl GenerateOptions {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: HashMap::new(),
            query: HashMap::new(),
            hash: None,
            with_domain: false,
            protocol: None,
        }
    }
}

pub struct Router {
    collection: ArcSwap<RouteCollection>,
    pending: std::sync::Mutex<Vec<RouteDefinition>>,
    group_stack: std::sync::Mutex<Vec<RouteDefinition>>,
    options: std::sync::Mutex<RouterOptions>,
    current_route: ArcSwapOption<Route>,
    emitter: Arc<dyn EventEmitter>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self {
            collection: ArcSwap::from_pointee(RouteCollection::new()),
            pending: std::sync::Mutex::new(Vec::new()),
            group_stack: std::sync::Mutex::new(Vec::new()),
            options: std::sync::Mutex::new(RouterOptions::default()),
            current_route: ArcSwapOption::from(None),
            emitter: Arc::new(SimpleEventEmitter::new()),
        }
    }

    pub fn with_emitter(emitter: Arc<dyn EventEmitter>) -> Self {
        let mut router = Self::new();
        router.emitter = emitter;
        router
    }

    // -- registration -----------------------------------------------------

    pub fn get(&self, def: RouteDefinition) {
        self.push_definition(def.method(http::Method::GET));
    }

    pub fn post(&self, def: RouteDefinition) {
        self.push_definition(def.method(http::Method::POST));
    }

    pub fn put(&self, def: RouteDefinition) {
        self.push_definition(def.method(http::Method::PUT));
    }

    pub fn patch(&self, def: RouteDefinition) {
        self.push_definition(def.method(http::Method::PATCH));
    }

    pub fn delete(&self, def: RouteDefinition) {
        self.push_definition(def.method(http::Method::DELETE));
    }

    pub fn options(&self, def: RouteDefinition) {
        self.push_definition(def.method(http::Method::OPTIONS));
    }

    pub fn any(&self, def: RouteDefinition) {
        let verbs = ALL_VERBS
            .iter()
            .map(|v| http::Method::from_bytes(v.as_bytes()).expect("ALL_VERBS are valid methods"))
            .collect();
        self.push_definition(def.methods(verbs));
    }

    /// GET alias (spec §4.7 "page").
    pub fn page(&self, def: RouteDefinition) {
        self.get(def);
    }

    /// GET alias (spec §4.7 "add").
    pub fn add(&self, def: RouteDefinition) {
        self.get(def);
    }

    pub fn route_match(&self, def: RouteDefinition, methods: Vec<http::Method>) {
        self.push_definition(def.methods(methods));
    }

    /// `fallback(handler)`: sets `fallback:true` and a catch-all path
    /// (spec §4.7).
    pub fn fallback(&self, handler: HandlerSpec) {
        let verbs: Vec<http::Method> = ALL_VERBS
            .iter()
            .map(|v| http::Method::from_bytes(v.as_bytes()).expect("ALL_VERBS are valid methods"))
            .collect();
        let def = RouteDefinition::new("/:omnirouterFallback(.*)")
            .methods(verbs)
            .handler(handler)
            .fallback(true)
            .strict(true);
        self.push_definition(def);
    }

    /// Enter a group scope: `prefix` and `def`'s attributes are merged into
    /// every definition registered until the matching `no_group()` (spec
    /// §4.7 "group"/"noGroup").
    pub fn enter_group(&self, prefix: impl Into<String>, mut def: RouteDefinition) {
        def.path = Some(prefix.into());
        self.group_stack.lock().unwrap_or_else(|e| e.into_inner()).push(def);
    }

    pub fn no_group(&self) {
        let completed = self
            .group_stack
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop();
        if let Some(completed) = completed {
            self.push_definition(completed);
        }
    }

    /// `group(prefix, def)` with a closure scope — the idiomatic-Rust
    /// counterpart of calling `enter_group` then `no_group` by hand.
    pub fn group(&self, prefix: impl Into<String>, def: RouteDefinition, f: impl FnOnce(&Router)) {
        self.enter_group(prefix, def);
        f(self);
        self.no_group();
    }

    /// Register a batch of possibly-nested definitions directly (spec §4.7
    /// "define").
    pub fn define(&self, definitions: Vec<RouteDefinition>) {
        self.pending.lock().unwrap_or_else(|e| e.into_inner()).extend(definitions);
        self.rebuild();
    }

    /// Replace the compiled collection outright, bypassing the mapper
    /// (spec §4.7 "setRoutes").
    pub fn set_routes(&self, collection: RouteCollection) {
        self.collection.store(Arc::new(collection));
    }

    fn push_definition(&self, def: RouteDefinition) {
        let mut stack = self.group_stack.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(parent) = stack.last_mut() {
            parent.children.push(def);
        } else {
            drop(stack);
            self.pending.lock().unwrap_or_else(|e| e.into_inner()).push(def);
            self.rebuild();
        }
    }

    /// Merge `f` into the current options and rebuild the collection via
    /// C6 (spec §4.7 "configure").
    pub fn configure(&self, f: impl FnOnce(&mut RouterOptions)) {
        let mut options = self.options.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut options);
        drop(options);
        self.rebuild();
    }

    fn rebuild(&self) {
        let definitions = self.pending.lock().unwrap_or_else(|e| e.into_inner()).clone();
        let options = self.options.lock().unwrap_or_else(|e| e.into_inner()).clone();

        let mapper = match RouteMapper::new(MapperOptions {
            max_depth: options.max_depth,
            matchers: options.matchers.clone(),
            dispatchers: options.dispatchers.clone(),
            resolver: options.resolver.clone(),
        }) {
            Ok(m) => m,
            Err(e) => {
                tracing::error!(error = %e, "failed to construct route mapper during rebuild");
                return;
            }
        };

        match mapper.to_routes(definitions) {
            Ok(routes) => {
                let mut collection = RouteCollection::new();
                for route in routes {
                    collection.add(route);
                }
                self.collection.store(Arc::new(collection));
            }
            Err(e) => {
                tracing::error!(error = %e, "route collection rebuild failed; keeping previous collection");
            }
        }
    }

    /// `use(mw)`: append global middleware (spec §4.7 "Middleware").
    pub fn use_middleware(&self, mw: Arc<dyn Middleware>) {
        self.options
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .middleware
            .push(mw);
    }

    /// `useOn(name, mw)`: append middleware to an already-named, already
    /// compiled route (spec §4.7 "Middleware").
    pub fn use_on(&self, name: &str, mw: Arc<dyn Middleware>) -> Result<()> {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        let def = find_named_mut(&mut pending, name)
            .ok_or_else(|| Error::route_not_found(format!("no registered definition named {name:?}")))?;
        def.middleware.push(mw);
        drop(pending);
        self.rebuild();
        Ok(())
    }

    pub fn on(&self, name: &str, listener: Arc<dyn Fn(Option<&dyn std::any::Any>) + Send + Sync>) {
        self.emitter.on(name, listener);
    }

    // -- dispatch -----------------------------------------------------------

    /// Route → match → bind → gather middleware → run (spec §4.7
    /// "Dispatch").
    pub async fn dispatch(&self, event: &dyn IncomingEvent) -> Result<DispatchOutcome> {
        self.emitter.emit("routing", None);

        let collection = self.collection.load_full();
        match collection.matching(event)? {
            MatchOutcome::OptionsAllowed { allow } => {
                Ok(DispatchOutcome::OptionsAllowed { status: 200, allow })
            }
            MatchOutcome::Matched(found) => {
                let route = found.route;
                event.set_route_resolver(Some(route.clone()));
                route.bind(event).await?;
                self.current_route.store(Some(route.clone()));

                let chain = self.gather_route_middleware(&route);
                self.emitter.emit("routed", None);
                middleware::execute(&chain, event, &route).await
            }
        }
    }

    /// Global middleware ∪ the route's own, insertion-order, de-duplicated
    /// by name, filtered by `route.isMiddlewareExcluded` and the
    /// `skipMiddleware` flag (spec §4.7 "gatherRouteMiddleware"). Global
    /// middleware runs first — SPEC_FULL.md Open Question (b).
    pub fn gather_route_middleware(&self, route: &Route) -> Vec<Arc<dyn Middleware>> {
        let options = self.options.lock().unwrap_or_else(|e| e.into_inner());
        if options.skip_middleware {
            return Vec::new();
        }
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for mw in options.middleware.iter().chain(route.middleware().iter()) {
            if route.is_middleware_excluded(mw) {
                continue;
            }
            if seen.insert(mw.name().to_string()) {
                out.push(mw.clone());
            }
        }
        out
    }

    // -- named navigation -----------------------------------------------

    pub async fn respond_with_route_name(
        &self,
        event: &dyn IncomingEvent,
        name: &str,
    ) -> Result<DispatchOutcome> {
        let collection = self.collection.load();
        let route = collection
            .get_by_name(name)
            .ok_or_else(|| Error::route_not_found(format!("no route named {name:?}")))?
            .clone();
        route.bind(event).await?;
        self.current_route.store(Some(route.clone()));
        route.run(event).await
    }

    /// Rebuild a concrete URL from a named route's template (spec §4.7
    /// "generate").
    pub fn generate(&self, opts: GenerateOptions) -> Result<String> {
        let collection = self.collection.load();
        let route = collection
            .get_by_name(&opts.name)
            .ok_or_else(|| Error::router(format!("cannot generate: no route named {:?}", opts.name)))?;

        let mut url = route.generate(&opts.params)?;

        if !opts.query.is_empty() {
            let pairs: Vec<String> = opts
                .query
                .iter()
                .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
                .collect();
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str(&pairs.join("&"));
        }

        if let Some(hash) = &opts.hash {
            url.push('#');
            url.push_str(hash);
        }

        if opts.with_domain {
            if let Some(domain) = route.domain() {
                let scheme = opts.protocol.map(|p| p.as_str()).or_else(|| route.protocol()).unwrap_or("http");
                url = format!("{scheme}://{domain}{url}");
            }
        }

        Ok(url)
    }

    /// Browser-only (spec §4.7 "navigate"). This build never has a browser
    /// global, so this always takes the documented failure branch.
    pub fn navigate(&self, _target: &str, _replace: bool) -> Result<()> {
        Err(Error::router("navigate requires a browser environment; none is present in this build"))
    }

    // -- introspection ----------------------------------------------------

    pub fn current_route(&self) -> Option<Arc<Route>> {
        self.current_route.load_full()
    }

    pub fn current_route_name(&self) -> Option<String> {
        self.current_route().and_then(|r| r.name().map(str::to_string))
    }

    pub fn is_current_route_named(&self, name: &str) -> bool {
        self.current_route_name().as_deref() == Some(name)
    }

    pub fn get_params(&self) -> HashMap<String, crate::event::BoundValue> {
        self.current_route().map(|r| r.params()).unwrap_or_default()
    }

    pub fn get_param(&self, name: &str, fallback: Option<serde_json::Value>) -> Option<serde_json::Value> {
        self.current_route()
            .and_then(|r| r.get_param(name))
            .and_then(|v| v.as_json().cloned())
            .or(fallback)
    }

    pub fn has_route(&self, name: &str) -> bool {
        self.collection.load().has_named_route(name)
    }

    pub fn has_any_route(&self, names: &[&str]) -> bool {
        names.iter().any(|n| self.has_route(n))
    }

    pub fn dump_routes(&self) -> serde_json::Value {
        self.collection.load().dump()
    }
}

fn find_named_mut<'a>(defs: &'a mut [RouteDefinition], name: &str) -> Option<&'a mut RouteDefinition> {
    for def in defs.iter_mut() {
        if def.name.as_deref() == Some(name) {
            return Some(def);
        }
        if let Some(found) = find_named_mut(&mut def.children, name) {
            return Some(found);
        }
    }
    None
}
