//! C3 — Dispatchers (spec §4.3): one strategy object per handler shape.
//! Each exposes `name(route)` and `dispatch(event, route)`. `Route` holds a
//! [`DispatcherTable`] — injected by the mapper/router rather than
//! hardcoded — and selects an entry by the handler's shape at `run()` time
//! (spec §4.4 "run"/"toJSON").
//!
//! Grounded on the teacher's `dispatcher/core.rs` `Dispatcher` struct, which
//! plays the same "selected by handler identity, producing the response"
//! role against its `may`-coroutine handler channels; here the four shapes
//! are compile-time variants instead of a runtime handler registry.

mod callable;
mod class;
mod component;
mod redirect;

pub use callable::CallableDispatcher;
pub use class::ClassDispatcher;
pub use component::ComponentDispatcher;
pub use redirect::RedirectDispatcher;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Result;
use crate::event::IncomingEvent;
use crate::handler::DispatchOutcome;
use crate::route::Route;

/// Which of the four handler shapes a route currently carries (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    Callable,
    Class,
    Component,
    Redirect,
}

#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Human-readable handler identity for `Route::toJSON` (spec §4.4).
    fn name(&self, route: &Route) -> String;

    async fn dispatch(&self, event: &dyn IncomingEvent, route: &Route) -> Result<DispatchOutcome>;
}

/// Maps a [`HandlerKind`] to the [`Dispatcher`] that knows how to run it.
/// Swappable wholesale via `Route::set_dispatchers`/`Router::configure`
/// (spec §4.7 "dispatchers" option, §4.4 `setDispatchers`).
#[derive(Clone)]
pub struct DispatcherTable {
    table: HashMap<HandlerKind, Arc<dyn Dispatcher>>,
}

impl DispatcherTable {
    pub fn new(table: HashMap<HandlerKind, Arc<dyn Dispatcher>>) -> Self {
        Self { table }
    }

    pub fn get(&self, kind: HandlerKind) -> Option<&Arc<dyn Dispatcher>> {
        self.table.get(&kind)
    }

    pub fn insert(&mut self, kind: HandlerKind, dispatcher: Arc<dyn Dispatcher>) {
        self.table.insert(kind, dispatcher);
    }
}

impl Default for DispatcherTable {
    /// The four built-in dispatchers, one per handler shape (spec §4.3).
    fn default() -> Self {
        let mut table: HashMap<HandlerKind, Arc<dyn Dispatcher>> = HashMap::new();
        table.insert(HandlerKind::Callable, Arc::new(CallableDispatcher));
        table.insert(HandlerKind::Class, Arc::new(ClassDispatcher));
        table.insert(HandlerKind::Component, Arc::new(ComponentDispatcher));
        table.insert(HandlerKind::Redirect, Arc::new(RedirectDispatcher));
        Self { table }
    }
}
