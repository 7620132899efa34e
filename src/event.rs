//! External collaborator interfaces (spec §6).
//!
//! The core never owns a transport, a concrete request/response type, or a
//! DI container. Everything it needs from its host is expressed here as a
//! narrow trait, the same way the teacher crate keeps `server::Request` and
//! `security::SecurityProvider` behind traits so the router core stays
//! decoupled from `may_minihttp`.

use async_trait::async_trait;
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Result;
use crate::route::Route;

/// Back-reference slot the router writes the current route into before
/// dispatching (design note, spec §9): a weak, per-dispatch pointer, never
/// ownership. `ArcSwapOption` gives a lock-free read for handlers that want
/// `event.current_route()` mid-request.
pub type RouteSlot = Arc<arc_swap::ArcSwapOption<Route>>;

/// `event.preferredType()` (spec §6) — used by the co-operating error
/// handler to pick a response body shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferredType {
    Html,
    Json,
    Text,
    Xml,
}

/// The incoming-event contract the core consumes (spec §6).
///
/// Implementations own the real transport object (a server request, a
/// `web_sys::Request`, a test fixture, …); the core only ever reads through
/// this trait.
pub trait IncomingEvent: Send + Sync {
    /// Full parsed URL, scheme and all.
    fn url(&self) -> &url::Url;

    /// Raw path, as received.
    fn pathname(&self) -> &str {
        self.url().path()
    }

    /// Percent-decoded path, when the host already decoded it for us.
    /// Matching prefers this over `pathname()` when present (spec §4.2).
    fn decoded_pathname(&self) -> Option<&str> {
        None
    }

    fn method(&self) -> &http::Method;

    /// `"http"` | `"https"` — scheme without `://`.
    fn protocol(&self) -> &str {
        self.url().scheme()
    }

    fn host(&self) -> &str {
        self.url().host_str().unwrap_or_default()
    }

    /// Required by `Route::bind` (spec §4.4 step 1).
    fn get_uri(&self) -> String {
        self.decoded_pathname()
            .unwrap_or_else(|| self.pathname())
            .to_string()
    }

    fn query(&self) -> HashMap<String, String> {
        self.url()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    fn is_method(&self, method: &str) -> bool {
        self.method().as_str().eq_ignore_ascii_case(method)
    }

    fn preferred_type(&self) -> PreferredType {
        PreferredType::Json
    }

    /// The weak back-reference slot this event exposes to the router.
    fn route_slot(&self) -> &RouteSlot;

    fn set_route_resolver(&self, route: Option<Arc<Route>>) {
        self.route_slot().store(route);
    }

    fn get_metadata_value(&self, _key: &str) -> Option<String> {
        None
    }
}

/// A value produced by a binder (class `resolveRouteBinding`, plain
/// function, or `Alias@method`) before it is written into `routeParams`.
#[derive(Clone)]
pub enum BoundValue {
    Json(Value),
    Opaque(Arc<dyn Any + Send + Sync>),
}

impl BoundValue {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            BoundValue::Json(v) => Some(v),
            BoundValue::Opaque(_) => None,
        }
    }
}

impl std::fmt::Debug for BoundValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoundValue::Json(v) => write!(f, "BoundValue::Json({v})"),
            BoundValue::Opaque(_) => write!(f, "BoundValue::Opaque(..)"),
        }
    }
}

/// A class with `resolveRouteBinding`, or a plain function — both share this
/// call shape (spec §4.4 step 3).
#[async_trait]
pub trait Binder: Send + Sync {
    async fn resolve(
        &self,
        key: &str,
        raw: Option<&str>,
        event: &dyn IncomingEvent,
    ) -> Result<BoundValue>;
}

/// The resolved half of an `"Alias@method"` string binder (spec §9 design
/// note: reify at mapper time, not at bind time).
#[async_trait]
pub trait AliasBinder: Send + Sync {
    async fn invoke(
        &self,
        method: &str,
        key: &str,
        raw: Option<&str>,
    ) -> Result<BoundValue>;
}

/// DI-container-shaped external resolver (spec §6, optional collaborator).
pub trait ExternalResolver: Send + Sync {
    fn has(&self, id: &str) -> bool;

    /// Resolve a class/service by id. `singleton` asks for a cached
    /// instance rather than a fresh construction.
    fn resolve(&self, id: &str, singleton: bool) -> Result<Arc<dyn Any + Send + Sync>>;

    /// Resolve an `Alias@method` binder target by alias name.
    fn resolve_alias_binder(&self, alias: &str) -> Result<Arc<dyn AliasBinder>>;

    fn alias(&self, _id: &str, _aliases: &[&str]) {}

    fn instance(&self, _id: &str, _value: Arc<dyn Any + Send + Sync>) {}
}

/// Optional event-emitter collaborator (spec §6): `"routing"` / `"routed"`.
pub trait EventEmitter: Send + Sync {
    fn emit(&self, name: &str, payload: Option<&dyn Any>);
    fn on(&self, name: &str, listener: Arc<dyn Fn(Option<&dyn Any>) + Send + Sync>);
}

/// A minimal in-memory emitter, useful for embedding hosts that don't need
/// their own pub/sub and for tests.
#[derive(Default)]
pub struct SimpleEventEmitter {
    listeners: std::sync::Mutex<HashMap<String, Vec<Arc<dyn Fn(Option<&dyn Any>) + Send + Sync>>>>,
}

impl SimpleEventEmitter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventEmitter for SimpleEventEmitter {
    fn emit(&self, name: &str, payload: Option<&dyn Any>) {
        let listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(fns) = listeners.get(name) {
            for f in fns {
                f(payload);
            }
        }
    }

    fn on(&self, name: &str, listener: Arc<dyn Fn(Option<&dyn Any>) + Send + Sync>) {
        let mut listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        listeners.entry(name.to_string()).or_default().push(listener);
    }
}
