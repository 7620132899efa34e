//! C4 — Route: compile, bind, generate, run (spec §4.4).

mod support;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use http::Method;
use serde_json::{json, Value};

use omnirouter::dispatcher::DispatcherTable;
use omnirouter::event::{Binder, BoundValue};
use omnirouter::handler::Handler;
use omnirouter::route::{BindingSource, Route, RouteOptions};
use omnirouter::uri::{self, CompileInput};
use omnirouter::{Callable, DispatchOutcome};

use support::TestEvent;

struct Echo;

#[async_trait]
impl Callable for Echo {
    async fn call(&self, event: &dyn omnirouter::IncomingEvent) -> omnirouter::Result<DispatchOutcome> {
        Ok(DispatchOutcome::Value(json!({ "path": event.pathname() })))
    }
}

/// A binder that never finds anything — the Laravel-style
/// `resolveRouteBinding` "not found" signal (spec §4.4 step 6).
struct MissingBinder;

#[async_trait]
impl Binder for MissingBinder {
    async fn resolve(
        &self,
        _key: &str,
        _raw: Option<&str>,
        _event: &dyn omnirouter::IncomingEvent,
    ) -> omnirouter::Result<BoundValue> {
        Ok(BoundValue::Json(Value::Null))
    }
}

fn build_route(path: &str, method: Method, rules: HashMap<String, String>) -> Route {
    build_route_with_bindings(path, method, rules, HashMap::new())
}

fn build_route_with_bindings(
    path: &str,
    method: Method,
    rules: HashMap<String, String>,
    bindings: HashMap<String, BindingSource>,
) -> Route {
    let compiled = uri::compile(CompileInput {
        domain: None,
        path,
        rules: &rules,
        defaults: &HashMap::new(),
        binding_aliases: &HashMap::new(),
        strict: false,
    })
    .unwrap();

    let options = RouteOptions {
        path: path.to_string(),
        method,
        handler: Handler::Callable(Arc::new(Echo)),
        name: Some("users.show".to_string()),
        domain: None,
        protocol: None,
        rules,
        defaults: HashMap::new(),
        bindings,
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
async fn binds_required_param_with_numeric_coercion() {
    let route = build_route("/users/:id", Method::GET, HashMap::new());
    let event = TestEvent::get("http://example.test/users/42");

    route.bind(&event).await.unwrap();

    let id = route.get_param("id").unwrap();
    assert_eq!(id.as_json(), Some(&json!(42)));
}

#[tokio::test]
async fn bind_fails_when_uri_does_not_satisfy_route() {
    let route = build_route("/users/:id", Method::GET, HashMap::new());
    let event = TestEvent::get("http://example.test/posts/42");

    assert!(route.bind(&event).await.is_err());
}

#[test]
fn generate_reconstructs_uri_from_params() {
    let route = build_route("/users/:id", Method::GET, HashMap::new());
    let mut params = HashMap::new();
    params.insert("id".to_string(), json!(7));

    assert_eq!(route.generate(&params).unwrap(), "/users/7");
}

#[test]
fn generate_fails_on_missing_required_param() {
    let route = build_route("/users/:id", Method::GET, HashMap::new());
    assert!(route.generate(&HashMap::new()).is_err());
}

#[tokio::test]
async fn run_dispatches_through_callable_dispatcher() {
    let route = build_route("/users/:id", Method::GET, HashMap::new());
    let event = TestEvent::get("http://example.test/users/9");
    route.bind(&event).await.unwrap();

    match route.run(&event).await.unwrap() {
        DispatchOutcome::Value(Value::Object(obj)) => {
            assert_eq!(obj.get("path").and_then(Value::as_str), Some("/users/9"));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn bind_fails_route_not_found_when_required_binder_resolves_to_null() {
    let mut bindings = HashMap::new();
    bindings.insert("id".to_string(), BindingSource::Binder(Arc::new(MissingBinder)));
    let route = build_route_with_bindings("/users/:id", Method::GET, HashMap::new(), bindings);
    let event = TestEvent::get("http://example.test/users/42");

    match route.bind(&event).await {
        Err(e) => assert_eq!(e.status_code(), 404),
        Ok(_) => panic!("expected a route-not-found error"),
    }
}

#[tokio::test]
async fn bind_succeeds_when_optional_binder_resolves_to_null() {
    let mut bindings = HashMap::new();
    bindings.insert("id".to_string(), BindingSource::Binder(Arc::new(MissingBinder)));
    let route = build_route_with_bindings("/:id?", Method::GET, HashMap::new(), bindings);
    let event = TestEvent::get("http://example.test/");

    route.bind(&event).await.unwrap();
    assert_eq!(route.get_param("id").unwrap().as_json(), Some(&Value::Null));
}

#[test]
fn generate_appends_unknown_params_as_query_string() {
    let route = build_route("/users/:id", Method::GET, HashMap::new());
    let mut params = HashMap::new();
    params.insert("id".to_string(), json!(7));
    params.insert("sort".to_string(), json!("name"));

    assert_eq!(route.generate(&params).unwrap(), "/users/7?sort=name");
}

#[test]
fn get_option_falls_back_and_get_options_batches() {
    let route = build_route("/users/:id", Method::GET, HashMap::new());

    assert_eq!(route.get_option("unknown", Some(json!("default"))), Some(json!("default")));
    assert_eq!(route.get_option("method", Some(json!("ignored"))), Some(json!("GET")));

    let batch = route.get_options(&["path", "method", "unknown"]);
    assert_eq!(batch.get("path"), Some(&Some(json!("/users/:id"))));
    assert_eq!(batch.get("method"), Some(&Some(json!("GET"))));
    assert_eq!(batch.get("unknown"), Some(&None));
}

#[test]
fn to_json_matches_spec_shape() {
    let route = build_route("/users/:id", Method::GET, HashMap::new());
    let dumped = route.to_json();
    assert_eq!(dumped["path"], json!("/users/:id"));
    assert_eq!(dumped["method"], json!("GET"));
    assert_eq!(dumped["handler"], json!("callable"));
    assert_eq!(dumped["name"], json!("users.show"));
    assert_eq!(dumped["domain"], json!("N/A"));
    assert_eq!(dumped["fallback"], json!(false));
}
