//! C5 — RouteCollection (spec §4.5): an ordered sequence of routes plus two
//! derived indices (by method, by name), rebuilt on every `add`.
//!
//! Grounded on the teacher's `router/core.rs` radix-tree `Router`, which
//! keeps the same "ordered store plus derived lookup structures, matched
//! with tracing at each attempt" shape — this collection just indexes by
//! method/name instead of by radix-tree segment, since route templates here
//! compile straight to a regex rather than a trie path.

use smallvec::SmallVec;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::event::IncomingEvent;
use crate::route::Route;

pub type ParamVec = SmallVec<[(Arc<str>, String); 8]>;

/// The result of a successful collection match: the route plus the query
/// parameters lifted straight off the event (path params come from
/// `route.bind`, spec §4.4).
pub struct RouteMatch {
    pub route: Arc<Route>,
    pub query_params: ParamVec,
}

/// `RouteCollection::matching` either resolves to a route to bind and run,
/// or — on an `OPTIONS` request hitting only a method mismatch — a
/// synthesized Allow-header response that bypasses binding and dispatch
/// entirely (spec §4.5 step 2).
pub enum MatchOutcome {
    Matched(RouteMatch),
    OptionsAllowed { allow: String },
}

#[derive(Default)]
pub struct RouteCollection {
    routes: Vec<Arc<Route>>,
    by_method: HashMap<http::Method, Vec<Arc<Route>>>,
    by_name: HashMap<String, Arc<Route>>,
}

impl RouteCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route and rebuild its two derived indices (spec §4.5: "by
    /// insertion order; derived indices are rebuilt on `add`").
    pub fn add(&mut self, route: Arc<Route>) {
        self.by_method
            .entry(route.method().clone())
            .or_default()
            .push(route.clone());
        if let Some(name) = route.name() {
            self.by_name.insert(name.to_string(), route.clone());
        }
        self.routes.push(route);
    }

    pub fn get_routes_by_method(&self, method: &http::Method) -> &[Arc<Route>] {
        self.by_method.get(method).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Arc<Route>> {
        self.by_name.get(name)
    }

    pub fn has_named_route(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Route>> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Sorted by `path` ascending, internal-HEAD twins excluded (spec §4.5
    /// "dump").
    pub fn dump(&self) -> serde_json::Value {
        let mut visible: Vec<&Arc<Route>> =
            self.routes.iter().filter(|r| !r.is_internal_head()).collect();
        visible.sort_by(|a, b| a.path().cmp(b.path()));
        serde_json::Value::Array(visible.iter().map(|r| r.to_json()).collect())
    }

    /// Find the route satisfying `event` (spec §4.5):
    /// 1. From the by-method bucket, return the first whose remaining
    ///    matchers (method already guaranteed by the bucket) all succeed.
    /// 2. If none, rescan every route with the method matcher skipped. A
    ///    hit means the path/host/protocol matched but the method didn't:
    ///    on an `OPTIONS` event, synthesize the Allow-header response;
    ///    otherwise fail with `MethodNotAllowedError` carrying the allowed
    ///    set.
    /// 3. If still nothing, fail with `RouteNotFoundError`.
    pub fn matching(&self, event: &dyn IncomingEvent) -> Result<MatchOutcome> {
        for route in self.by_method.get(event.method()).into_iter().flatten() {
            if route.matches(event, false) {
                return Ok(MatchOutcome::Matched(RouteMatch {
                    route: route.clone(),
                    query_params: query_param_vec(event),
                }));
            }
        }

        let mut allowed = BTreeSet::new();
        for route in &self.routes {
            if route.matches(event, false) {
                allowed.insert(route.method().to_string());
            }
        }

        if allowed.is_empty() {
            return Err(Error::route_not_found(format!(
                "no route matches {} {}",
                event.method(),
                event.pathname()
            )));
        }

        if event.is_method("OPTIONS") {
            return Ok(MatchOutcome::OptionsAllowed {
                allow: allowed.into_iter().collect::<Vec<_>>().join(","),
            });
        }

        Err(Error::method_not_allowed(event.pathname().to_string(), allowed))
    }
}

impl std::fmt::Display for RouteCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for route in &self.routes {
            writeln!(f, "{} {}", route.method(), route.path())?;
        }
        Ok(())
    }
}

fn query_param_vec(event: &dyn IncomingEvent) -> ParamVec {
    event
        .query()
        .into_iter()
        .map(|(k, v)| (Arc::<str>::from(k), v))
        .collect()
}
