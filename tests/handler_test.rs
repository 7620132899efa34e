//! C3 — component dispatcher: the resolved component is observable by the
//! caller, not discarded (spec §4.3 "component").

mod support;

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;

use omnirouter::dispatcher::DispatcherTable;
use omnirouter::handler::{Component, ComponentSlot, Handler};
use omnirouter::route::{Route, RouteOptions};
use omnirouter::uri::{self, CompileInput};
use omnirouter::DispatchOutcome;

use support::TestEvent;

#[derive(Debug, PartialEq, Eq)]
struct Dashboard {
    name: &'static str,
}

impl Component for Dashboard {}

fn build_component_route(loader: ComponentSlot) -> Route {
    let compiled = uri::compile(CompileInput {
        domain: None,
        path: "/dashboard",
        rules: &HashMap::new(),
        defaults: &HashMap::new(),
        binding_aliases: &HashMap::new(),
        strict: false,
    })
    .unwrap();

    let options = RouteOptions {
        path: "/dashboard".to_string(),
        method: Method::GET,
        handler: Handler::Component { loader },
        name: Some("dashboard".to_string()),
        domain: None,
        protocol: None,
        rules: HashMap::new(),
        defaults: HashMap::new(),
        bindings: HashMap::new(),
        middleware: Vec::new(),
        exclude_middleware: Default::default(),
        strict: false,
        fallback: false,
        is_internal_head: false,
        page_layout: None,
        custom_options: None,
    };

    let mut route = Route::new(options, compiled, None);
    route.set_dispatchers(DispatcherTable::default());
    route
}

#[tokio::test]
async fn eager_component_is_returned_by_run() {
    let component: Arc<dyn Component> = Arc::new(Dashboard { name: "eager" });
    let route = build_component_route(ComponentSlot::eager(component.clone()));
    let event = TestEvent::get("http://example.test/dashboard");

    match route.run(&event).await.unwrap() {
        DispatchOutcome::Component(resolved) => assert!(Arc::ptr_eq(&resolved, &component)),
        other => panic!("expected DispatchOutcome::Component, got {other:?}"),
    }
}

#[tokio::test]
async fn lazy_component_is_resolved_and_returned_by_run() {
    let loader = ComponentSlot::lazy(Arc::new(|| {
        Box::pin(async move {
            let component: Arc<dyn Component> = Arc::new(Dashboard { name: "lazy" });
            component
        })
    }));
    let route = build_component_route(loader);
    let event = TestEvent::get("http://example.test/dashboard");

    match route.run(&event).await.unwrap() {
        DispatchOutcome::Component(resolved) => {
            assert_eq!(format!("{resolved:?}"), "Dashboard { name: \"lazy\" }");
        }
        other => panic!("expected DispatchOutcome::Component, got {other:?}"),
    }
}
