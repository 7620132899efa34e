use async_trait::async_trait;

use super::Dispatcher;
use crate::error::{Error, Result};
use crate::event::IncomingEvent;
use crate::handler::{DispatchOutcome, Handler};
use crate::route::Route;

/// Runs a class-shaped handler by invoking the configured action on its
/// controller (spec §4.3 "class").
pub struct ClassDispatcher;

#[async_trait]
impl Dispatcher for ClassDispatcher {
    fn name(&self, route: &Route) -> String {
        match route.handler() {
            Handler::Class {
                class_name, action, ..
            } => format!("{class_name}@{action}"),
            _ => "class".to_string(),
        }
    }

    async fn dispatch(&self, event: &dyn IncomingEvent, route: &Route) -> Result<DispatchOutcome> {
        match route.handler() {
            Handler::Class { controller, action, .. } => controller.invoke(action, event).await,
            other => Err(Error::router(format!(
                "class dispatcher invoked against non-class handler {other:?}"
            ))),
        }
    }
}
