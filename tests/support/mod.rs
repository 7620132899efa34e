//! Shared `IncomingEvent` fixture for integration tests — a bare-bones
//! stand-in for whatever transport object an embedding host would normally
//! hand the router (spec §6).

use std::sync::Arc;

use omnirouter::event::RouteSlot;
use omnirouter::IncomingEvent;

pub struct TestEvent {
    url: url::Url,
    method: http::Method,
    route_slot: RouteSlot,
}

impl TestEvent {
    pub fn new(method: http::Method, url: &str) -> Self {
        Self {
            url: url::Url::parse(url).expect("fixture URL must parse"),
            method,
            route_slot: Arc::new(arc_swap::ArcSwapOption::from(None)),
        }
    }

    pub fn get(url: &str) -> Self {
        Self::new(http::Method::GET, url)
    }

    pub fn post(url: &str) -> Self {
        Self::new(http::Method::POST, url)
    }
}

impl IncomingEvent for TestEvent {
    fn url(&self) -> &url::Url {
        &self.url
    }

    fn method(&self) -> &http::Method {
        &self.method
    }

    fn route_slot(&self) -> &RouteSlot {
        &self.route_slot
    }
}
