//! The four handler shapes a route can dispatch to (spec §3/§4.3):
//! callable, class, component, redirect.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::Result;
use crate::event::IncomingEvent;

/// Whatever a handler or redirect resolution produces. The router never
/// transforms this (spec §6 "Outgoing response contract").
#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    Redirect { status: u16, location: String },
    OptionsAllowed { status: u16, allow: String },
    /// Handler-produced payload — the router passes it through untouched.
    Value(Value),
    /// The resolved UI component for a `component` handler (spec §4.3
    /// "Return the component").
    Component(Arc<dyn Component>),
}

/// `handler` is a bare function or closure (spec §4.3 "callable").
#[async_trait]
pub trait Callable: Send + Sync {
    async fn call(&self, event: &dyn IncomingEvent) -> Result<DispatchOutcome>;
}

#[async_trait]
impl<F> Callable for F
where
    F: Fn(&dyn IncomingEvent) -> Result<DispatchOutcome> + Send + Sync,
{
    async fn call(&self, event: &dyn IncomingEvent) -> Result<DispatchOutcome> {
        self(event)
    }
}

/// A resolver handed to a factory so it can pull its dependencies before
/// producing the real callable (spec §4.3 "isFactory").
pub type Resolver = Arc<dyn crate::event::ExternalResolver>;

/// `handler` is a class with an `action` method (spec §4.3 "class").
/// Rust has no dynamic `instance[action]()` dispatch, so the class shape is
/// modeled as a controller that dispatches on an action name itself.
#[async_trait]
pub trait ClassController: Send + Sync {
    async fn invoke(&self, action: &str, event: &dyn IncomingEvent) -> Result<DispatchOutcome>;
}

/// `handler` is a UI component (spec §4.3 "component").
pub trait Component: Send + Sync + std::fmt::Debug {}

/// How to resolve a redirect target (spec §3 `redirect` / §4.3 "redirect").
#[derive(Clone)]
pub enum RedirectTarget {
    Static(String),
    WithStatus { location: String, status: u16 },
    Dynamic(Arc<dyn Fn(&dyn IncomingEvent) -> RedirectTarget + Send + Sync>),
}

/// The resolved shape a route's `handler`/`redirect` field takes after the
/// mapper has flattened and validated a definition (spec §3, §4.6 step 4).
#[derive(Clone)]
pub enum Handler {
    Callable(Arc<dyn Callable>),
    /// Invoked once with a resolver to obtain the real callable, then
    /// treated exactly like `Callable` from then on (spec §4.3).
    Factory(FactorySlot),
    Class {
        controller: Arc<dyn ClassController>,
        class_name: String,
        action: String,
    },
    Component {
        loader: ComponentSlot,
    },
    Redirect(RedirectTarget),
    /// A group-only definition: children carry the real handlers.
    None,
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Handler::Callable(_) => write!(f, "Handler::Callable"),
            Handler::Factory(_) => write!(f, "Handler::Factory"),
            Handler::Class {
                class_name, action, ..
            } => write!(f, "Handler::Class({class_name}@{action})"),
            Handler::Component { .. } => write!(f, "Handler::Component"),
            Handler::Redirect(_) => write!(f, "Handler::Redirect"),
            Handler::None => write!(f, "Handler::None"),
        }
    }
}

/// A factory is invoked exactly once; the resolved callable is cached for
/// every subsequent dispatch (spec §4.3: "invoke `module(resolver)` once").
#[derive(Clone)]
pub struct FactorySlot {
    factory: Arc<dyn Fn(Resolver) -> Arc<dyn Callable> + Send + Sync>,
    resolved: Arc<Mutex<Option<Arc<dyn Callable>>>>,
}

impl FactorySlot {
    pub fn new(factory: Arc<dyn Fn(Resolver) -> Arc<dyn Callable> + Send + Sync>) -> Self {
        Self {
            factory,
            resolved: Arc::new(Mutex::new(None)),
        }
    }

    pub fn resolve(&self, resolver: Resolver) -> Arc<dyn Callable> {
        let mut slot = self.resolved.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = slot.as_ref() {
            return existing.clone();
        }
        let resolved = (self.factory)(resolver);
        *slot = Some(resolved.clone());
        resolved
    }
}

/// A lazy component loader mutates itself to eager once resolved (spec §4.3
/// / §9 design note: "carries an async loader that mutates itself to eager
/// once resolved"). `ArcSwapOption` is the interior-mutability cell the
/// design note calls for under the single-threaded-cooperative invariant.
#[derive(Clone)]
pub struct ComponentSlot {
    loader: Arc<dyn Fn() -> std::pin::Pin<Box<dyn std::future::Future<Output = Arc<dyn Component>> + Send>> + Send + Sync>,
    eager: Arc<arc_swap::ArcSwapOption<dyn Component>>,
    is_lazy: Arc<AtomicBool>,
}

impl ComponentSlot {
    pub fn lazy(
        loader: Arc<
            dyn Fn() -> std::pin::Pin<Box<dyn std::future::Future<Output = Arc<dyn Component>> + Send>>
                + Send
                + Sync,
        >,
    ) -> Self {
        Self {
            loader,
            eager: Arc::new(arc_swap::ArcSwapOption::from(None)),
            is_lazy: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn eager(component: Arc<dyn Component>) -> Self {
        Self {
            loader: Arc::new(|| Box::pin(async move { unreachable!("eager component never loads") })),
            eager: Arc::new(arc_swap::ArcSwapOption::from(Some(component))),
            is_lazy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_lazy(&self) -> bool {
        self.is_lazy.load(Ordering::Acquire)
    }

    /// Resolve the concrete component, loading and caching it the first
    /// time. Subsequent calls are a lock-free read.
    pub async fn resolve(&self) -> Arc<dyn Component> {
        if let Some(existing) = self.eager.load_full() {
            return existing;
        }
        let component = (self.loader)().await;
        self.eager.store(Some(component.clone()));
        self.is_lazy.store(false, Ordering::Release);
        component
    }
}
