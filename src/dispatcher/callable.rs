use async_trait::async_trait;

use super::Dispatcher;
use crate::error::{Error, Result};
use crate::event::IncomingEvent;
use crate::handler::{DispatchOutcome, Handler};
use crate::route::Route;

/// Runs a bare function/closure handler, resolving a factory on first use
/// and caching the result (spec §4.3 "callable").
pub struct CallableDispatcher;

#[async_trait]
impl Dispatcher for CallableDispatcher {
    fn name(&self, _route: &Route) -> String {
        "callable".to_string()
    }

    async fn dispatch(&self, event: &dyn IncomingEvent, route: &Route) -> Result<DispatchOutcome> {
        match route.handler() {
            Handler::Callable(callable) => callable.call(event).await,
            Handler::Factory(factory) => {
                let resolver = route
                    .resolver()
                    .ok_or_else(|| Error::router("route handler is a factory but no resolver was configured"))?
                    .clone();
                factory.resolve(resolver).call(event).await
            }
            other => Err(Error::router(format!(
                "callable dispatcher invoked against non-callable handler {other:?}"
            ))),
        }
    }
}
