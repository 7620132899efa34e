//! Middleware chain-of-responsibility (spec §4.7 step 6, §9 Non-goals: only
//! the gather-and-order contract is specified by the wider system; this
//! module supplies the minimal executor that contract needs so
//! `Router::dispatch` has something real to drive).
//!
//! Grounded on the teacher's `middleware/core.rs` `Middleware` trait
//! (`before`/`after`), generalized from its fixed two-hook shape into the
//! classic onion/`next()` chain so a route-local middleware can run code on
//! both sides of the handler in one function.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::event::IncomingEvent;
use crate::handler::DispatchOutcome;
use crate::route::Route;

#[async_trait]
pub trait Middleware: Send + Sync {
    /// Identity used for de-duplication and `excludeMiddleware` matching
    /// (spec §3 `excludeMiddleware`, §4.6 merge step).
    fn name(&self) -> &str;

    async fn handle<'a>(
        &'a self,
        event: &'a (dyn IncomingEvent + 'a),
        route: &'a Route,
        next: Next<'a>,
    ) -> Result<DispatchOutcome>;
}

/// The remainder of the pipeline, terminating in `route.run(event)`.
pub struct Next<'a> {
    remaining: &'a [Arc<dyn Middleware>],
    route: &'a Route,
}

impl<'a> Next<'a> {
    pub fn new(remaining: &'a [Arc<dyn Middleware>], route: &'a Route) -> Self {
        Self { remaining, route }
    }

    pub async fn run(self, event: &'a (dyn IncomingEvent + 'a)) -> Result<DispatchOutcome> {
        match self.remaining.split_first() {
            Some((mw, rest)) => {
                mw.handle(event, self.route, Next::new(rest, self.route)).await
            }
            None => self.route.run(event).await,
        }
    }
}

/// Execute `chain` end-to-end against `event`, ending in `route.run`.
pub async fn execute<'a>(
    chain: &'a [Arc<dyn Middleware>],
    event: &'a (dyn IncomingEvent + 'a),
    route: &'a Route,
) -> Result<DispatchOutcome> {
    Next::new(chain, route).run(event).await
}
