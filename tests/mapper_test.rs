//! C6 — RouteMapper: prefix/name inheritance, middleware merge order, HEAD
//! synthesis, depth guard (spec §4.6).

use std::sync::Arc;

use async_trait::async_trait;
use http::Method;
use serde_json::json;

use omnirouter::mapper::{MapperOptions, RouteMapper};
use omnirouter::middleware::{Middleware, Next};
use omnirouter::route::Route;
use omnirouter::{Callable, DispatchOutcome, RouteDefinition};

struct Noop;

#[async_trait]
impl Callable for Noop {
    async fn call(&self, _event: &dyn omnirouter::IncomingEvent) -> omnirouter::Result<DispatchOutcome> {
        Ok(DispatchOutcome::Value(json!(null)))
    }
}

struct NamedMiddleware(&'static str);

#[async_trait]
impl Middleware for NamedMiddleware {
    fn name(&self) -> &str {
        self.0
    }

    async fn handle<'a>(
        &'a self,
        event: &'a (dyn omnirouter::IncomingEvent + 'a),
        _route: &'a Route,
        next: Next<'a>,
    ) -> omnirouter::Result<DispatchOutcome> {
        next.run(event).await
    }
}

#[test]
fn nested_groups_compose_path_and_name_and_inherit_middleware() {
    let admin_mw: Arc<dyn Middleware> = Arc::new(NamedMiddleware("admin"));
    let users_mw: Arc<dyn Middleware> = Arc::new(NamedMiddleware("users"));

    let tree = vec![RouteDefinition::new("/admin/")
        .name("admin.")
        .middleware(admin_mw)
        .children(vec![RouteDefinition::new("/users")
            .name("users.show")
            .method(Method::GET)
            .middleware(users_mw)
            .callable(Arc::new(Noop))])];

    let mapper = RouteMapper::new(MapperOptions::default()).unwrap();
    let routes = mapper.to_routes(tree).unwrap();

    let get_route = routes
        .iter()
        .find(|r| *r.method() == Method::GET)
        .expect("GET route present");

    assert_eq!(get_route.path(), "/admin/users");
    assert_eq!(get_route.name(), Some("admin.users.show"));

    // Child middleware goes first, then inherited parent middleware.
    let names: Vec<&str> = get_route.middleware().iter().map(|m| m.name()).collect();
    assert_eq!(names, vec!["users", "admin"]);
}

#[test]
fn get_route_gets_a_synthesized_head_twin() {
    let tree = vec![RouteDefinition::new("/ping")
        .method(Method::GET)
        .name("ping")
        .callable(Arc::new(Noop))];

    let mapper = RouteMapper::new(MapperOptions::default()).unwrap();
    let routes = mapper.to_routes(tree).unwrap();

    let head = routes
        .iter()
        .find(|r| *r.method() == Method::HEAD)
        .expect("a HEAD twin was synthesized");
    assert!(head.is_internal_head());
    assert_eq!(head.name(), None);
    assert_eq!(head.path(), "/ping");
}

#[test]
fn explicit_head_route_is_not_overwritten_by_synthesis() {
    let tree = vec![
        RouteDefinition::new("/ping").method(Method::GET).callable(Arc::new(Noop)),
        RouteDefinition::new("/ping")
            .method(Method::HEAD)
            .name("ping.head")
            .callable(Arc::new(Noop)),
    ];

    let mapper = RouteMapper::new(MapperOptions::default()).unwrap();
    let routes = mapper.to_routes(tree).unwrap();

    let heads: Vec<_> = routes.iter().filter(|r| *r.method() == Method::HEAD).collect();
    assert_eq!(heads.len(), 1);
    assert!(!heads[0].is_internal_head());
    assert_eq!(heads[0].name(), Some("ping.head"));
}

#[test]
fn definition_without_handler_redirect_or_children_is_rejected() {
    let tree = vec![RouteDefinition::new("/broken")];
    let mapper = RouteMapper::new(MapperOptions::default()).unwrap();
    assert!(mapper.to_routes(tree).is_err());
}

#[test]
fn mapper_rejects_zero_max_depth() {
    let mut options = MapperOptions::default();
    options.max_depth = 0;
    assert!(RouteMapper::new(options).is_err());
}

#[test]
fn deeply_nested_groups_exceeding_max_depth_fail() {
    let mut leaf = RouteDefinition::new("/leaf").method(Method::GET).callable(Arc::new(Noop));
    for _ in 0..5 {
        leaf = RouteDefinition::new("/g").children(vec![leaf]);
    }

    let mut options = MapperOptions::default();
    options.max_depth = 2;
    let mapper = RouteMapper::new(options).unwrap();
    assert!(mapper.to_routes(vec![leaf]).is_err());
}
