use async_trait::async_trait;

use super::Dispatcher;
use crate::error::{Error, Result};
use crate::event::IncomingEvent;
use crate::handler::{DispatchOutcome, Handler};
use crate::route::Route;

/// Resolves a (possibly lazy) UI component (spec §4.3 "component").
/// Resolution is one of the four permitted suspension points (spec §5).
pub struct ComponentDispatcher;

#[async_trait]
impl Dispatcher for ComponentDispatcher {
    fn name(&self, route: &Route) -> String {
        match route.handler() {
            Handler::Component { loader } if loader.is_lazy() => "component (lazy)".to_string(),
            Handler::Component { .. } => "component".to_string(),
            _ => "component".to_string(),
        }
    }

    async fn dispatch(&self, _event: &dyn IncomingEvent, route: &Route) -> Result<DispatchOutcome> {
        match route.handler() {
            Handler::Component { loader } => {
                let component = loader.resolve().await;
                Ok(DispatchOutcome::Component(component))
            }
            other => Err(Error::router(format!(
                "component dispatcher invoked against non-component handler {other:?}"
            ))),
        }
    }
}
