use async_trait::async_trait;

use super::Dispatcher;
use crate::error::{Error, Result};
use crate::event::IncomingEvent;
use crate::handler::{DispatchOutcome, Handler, RedirectTarget};
use crate::route::Route;

/// Resolves a redirect target — static, with an explicit status, or
/// computed from the event — into a redirect response (spec §4.3
/// "redirect").
pub struct RedirectDispatcher;

#[async_trait]
impl Dispatcher for RedirectDispatcher {
    fn name(&self, _route: &Route) -> String {
        "redirect".to_string()
    }

    async fn dispatch(&self, event: &dyn IncomingEvent, route: &Route) -> Result<DispatchOutcome> {
        match route.handler() {
            Handler::Redirect(target) => Ok(resolve(target, event)),
            other => Err(Error::router(format!(
                "redirect dispatcher invoked against non-redirect handler {other:?}"
            ))),
        }
    }
}

fn resolve(target: &RedirectTarget, event: &dyn IncomingEvent) -> DispatchOutcome {
    match target {
        RedirectTarget::Static(location) => DispatchOutcome::Redirect {
            status: 302,
            location: location.clone(),
        },
        RedirectTarget::WithStatus { location, status } => DispatchOutcome::Redirect {
            status: *status,
            location: location.clone(),
        },
        RedirectTarget::Dynamic(f) => resolve(&f(event), event),
    }
}
