//! C7 — Router: registration, dispatch, middleware gathering, fallback,
//! named generation (spec §4.7).

mod support;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use http::Method;
use serde_json::{json, Value};

use omnirouter::middleware::{Middleware, Next};
use omnirouter::route::Route;
use omnirouter::router::GenerateOptions;
use omnirouter::{Callable, DispatchOutcome, HandlerSpec, RouteDefinition, Router};

use support::TestEvent;

struct Echo;

#[async_trait]
impl Callable for Echo {
    async fn call(&self, event: &dyn omnirouter::IncomingEvent) -> omnirouter::Result<DispatchOutcome> {
        Ok(DispatchOutcome::Value(json!({ "path": event.pathname() })))
    }
}

struct CountingMiddleware {
    name: &'static str,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Middleware for CountingMiddleware {
    fn name(&self) -> &str {
        self.name
    }

    async fn handle<'a>(
        &'a self,
        event: &'a (dyn omnirouter::IncomingEvent + 'a),
        _route: &'a Route,
        next: Next<'a>,
    ) -> omnirouter::Result<DispatchOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        next.run(event).await
    }
}

#[tokio::test]
async fn dispatches_to_the_matching_route() {
    let router = Router::new();
    router.get(
        RouteDefinition::new("/users/:id")
            .name("users.show")
            .callable(Arc::new(Echo)),
    );

    let event = TestEvent::get("http://example.test/users/5");
    match router.dispatch(&event).await.unwrap() {
        DispatchOutcome::Value(Value::Object(obj)) => {
            assert_eq!(obj.get("path").and_then(Value::as_str), Some("/users/5"));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    assert!(router.is_current_route_named("users.show"));
}

#[tokio::test]
async fn unregistered_path_yields_route_not_found() {
    let router = Router::new();
    router.get(RouteDefinition::new("/users").callable(Arc::new(Echo)));

    let event = TestEvent::get("http://example.test/nowhere");
    let err = router.dispatch(&event).await.unwrap_err();
    assert_eq!(err.status_code(), 404);
}

#[tokio::test]
async fn options_request_on_a_registered_path_reports_allowed_methods() {
    let router = Router::new();
    router.get(RouteDefinition::new("/users").callable(Arc::new(Echo)));
    router.post(RouteDefinition::new("/users").callable(Arc::new(Echo)));

    let event = TestEvent::new(Method::OPTIONS, "http://example.test/users");
    match router.dispatch(&event).await.unwrap() {
        DispatchOutcome::OptionsAllowed { status, allow } => {
            assert_eq!(status, 200);
            assert_eq!(allow, "GET,HEAD,POST");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn global_middleware_runs_before_route_middleware_deduplicated_by_name() {
    let router = Router::new();
    let calls = Arc::new(AtomicUsize::new(0));

    router.use_middleware(Arc::new(CountingMiddleware {
        name: "global",
        calls: calls.clone(),
    }));

    router.get(
        RouteDefinition::new("/users")
            .middleware(Arc::new(CountingMiddleware {
                name: "route-local",
                calls: calls.clone(),
            }))
            .callable(Arc::new(Echo)),
    );

    let event = TestEvent::get("http://example.test/users");
    router.dispatch(&event).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn fallback_handles_any_unmatched_path() {
    let router = Router::new();
    router.get(RouteDefinition::new("/users").callable(Arc::new(Echo)));
    router.fallback(HandlerSpec::Callable(Arc::new(Echo)));

    let event = TestEvent::get("http://example.test/totally/unknown/path");
    match router.dispatch(&event).await.unwrap() {
        DispatchOutcome::Value(_) => {}
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(router.current_route().map(|r| r.is_fallback()).unwrap_or(false));
}

#[test]
fn generate_builds_a_url_from_a_named_route() {
    let router = Router::new();
    router.get(
        RouteDefinition::new("/users/:id")
            .name("users.show")
            .callable(Arc::new(Echo)),
    );

    let mut opts = GenerateOptions::named("users.show");
    opts.params.insert("id".to_string(), json!(42));
    let url = router.generate(opts).unwrap();
    assert_eq!(url, "/users/42");
}

#[test]
fn generate_fails_for_an_unknown_route_name() {
    let router = Router::new();
    let opts = GenerateOptions::named("does.not.exist");
    assert!(router.generate(opts).is_err());
}

#[tokio::test]
async fn nested_group_registration_produces_a_prefixed_named_route() {
    let router = Router::new();
    router.group("/admin", RouteDefinition::new(""), |r| {
        r.get(RouteDefinition::new("/users").name("admin.users").callable(Arc::new(Echo)));
    });

    assert!(router.has_route("admin.users"));

    let event = TestEvent::get("http://example.test/admin/users");
    router.dispatch(&event).await.unwrap();
    assert!(router.is_current_route_named("admin.users"));
}
