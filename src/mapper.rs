//! C6 — RouteMapper (spec §4.6): expands a nested `RouteDefinition` tree
//! into a flat list of compiled [`Route`]s — prefix/name concatenation,
//! attribute inheritance, method fan-out, HEAD synthesis, depth limiting.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use http::Method;
use serde_json::Value;

use crate::definition::{BindingSpec, HandlerSpec, RedirectSpec, RouteDefinition};
use crate::dispatcher::DispatcherTable;
use crate::error::{Error, Result};
use crate::event::ExternalResolver;
use crate::handler::{ComponentSlot, FactorySlot, Handler, RedirectTarget};
use crate::matchers::Matcher;
use crate::middleware::Middleware;
use crate::route::{BindingSource, Protocol, Route, RouteOptions};
use crate::uri::{self, CompileInput};

const ALLOWED_VERBS: &[&str] = &["GET", "HEAD", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"];

pub struct MapperOptions {
    pub max_depth: usize,
    pub matchers: Vec<Arc<dyn Matcher>>,
    pub dispatchers: DispatcherTable,
    pub resolver: Option<Arc<dyn ExternalResolver>>,
}

impl Default for MapperOptions {
    fn default() -> Self {
        Self {
            max_depth: 16,
            matchers: crate::matchers::default_matchers(),
            dispatchers: DispatcherTable::default(),
            resolver: None,
        }
    }
}

pub struct RouteMapper {
    options: MapperOptions,
}

/// One fully-merged, method-resolved node, ready for HEAD synthesis and
/// compilation — everything a [`RouteOptions`] needs except the compiled
/// constraints/regex, which only happen once HEAD twins have been added.
struct ExpandedNode {
    path: String,
    method: Method,
    handler: Handler,
    name: Option<String>,
    domain: Option<String>,
    protocol: Option<Protocol>,
    rules: HashMap<String, String>,
    defaults: HashMap<String, Value>,
    bindings: HashMap<String, BindingSource>,
    middleware: Vec<Arc<dyn Middleware>>,
    exclude_middleware: HashSet<String>,
    strict: bool,
    fallback: bool,
    page_layout: Option<Value>,
    custom_options: Option<Value>,
    is_internal_head: bool,
}

/// Context merged down from ancestors while walking the definition tree
/// (spec §4.6 step 2).
#[derive(Clone, Default)]
struct Inherited {
    prefix: String,
    name: String,
    middleware: Vec<Arc<dyn Middleware>>,
    exclude_middleware: Vec<String>,
    rules: HashMap<String, String>,
    defaults: HashMap<String, Value>,
    bindings: HashMap<String, BindingSpec>,
    page_layout: Option<Value>,
    custom_options: Option<Value>,
    protocol: Option<Protocol>,
    domain: Option<String>,
    strict: Option<bool>,
    fallback: bool,
}

impl RouteMapper {
    pub fn new(options: MapperOptions) -> Result<Self> {
        if options.max_depth == 0 {
            return Err(Error::router("RouteMapper requires maxDepth > 0"));
        }
        Ok(Self { options })
    }

    pub fn to_routes(&self, definitions: Vec<RouteDefinition>) -> Result<Vec<Arc<Route>>> {
        let mut nodes = Vec::new();
        for def in definitions {
            self.walk(def, &Inherited::default(), 0, &mut nodes)?;
        }

        synthesize_head_twins(&mut nodes);

        nodes
            .into_iter()
            .map(|node| self.compile(node))
            .collect::<Result<Vec<_>>>()
    }

    fn walk(
        &self,
        def: RouteDefinition,
        parent: &Inherited,
        depth: usize,
        out: &mut Vec<ExpandedNode>,
    ) -> Result<()> {
        if depth > self.options.max_depth {
            return Err(Error::router(format!(
                "route definition nesting exceeds maxDepth={}",
                self.options.max_depth
            )));
        }

        let path = def
            .path
            .as_deref()
            .ok_or_else(|| Error::router("route definition is missing a path"))?;
        let merged_path = join_path(&parent.prefix, path);

        let merged_name = def
            .name
            .as_deref()
            .map(|n| join_name(&parent.name, n))
            .unwrap_or_else(|| parent.name.clone());

        let mut merged_middleware = def.middleware.clone();
        merged_middleware.extend(parent.middleware.iter().cloned());

        let mut merged_exclude = def.exclude_middleware.clone();
        merged_exclude.extend(parent.exclude_middleware.iter().cloned());

        let mut merged_rules = parent.rules.clone();
        merged_rules.extend(def.rules.clone());

        let mut merged_defaults = parent.defaults.clone();
        merged_defaults.extend(def.defaults.clone());

        let mut merged_bindings = parent.bindings.clone();
        merged_bindings.extend(def.bindings.clone());

        let merged_page_layout = def.page_layout.clone().or_else(|| parent.page_layout.clone());
        let merged_custom_options = def.custom_options.clone().or_else(|| parent.custom_options.clone());
        let merged_protocol = def.protocol.or(parent.protocol);
        let merged_domain = def.domain.clone().or_else(|| parent.domain.clone());
        let merged_strict = def.strict.or(parent.strict);
        let merged_fallback = def.fallback || parent.fallback;

        let inherited = Inherited {
            prefix: merged_path.clone(),
            name: merged_name.clone(),
            middleware: merged_middleware.clone(),
            exclude_middleware: merged_exclude.clone(),
            rules: merged_rules.clone(),
            defaults: merged_defaults.clone(),
            bindings: merged_bindings.clone(),
            page_layout: merged_page_layout.clone(),
            custom_options: merged_custom_options.clone(),
            protocol: merged_protocol,
            domain: merged_domain.clone(),
            strict: merged_strict,
            fallback: merged_fallback,
        };

        let has_children = !def.children.is_empty();
        let has_redirect = def.redirect.is_some();
        let has_handler = !matches!(def.handler, HandlerSpec::None);

        if !has_handler && !has_redirect && !has_children {
            return Err(Error::router(format!(
                "route definition at {merged_path:?} has no handler, redirect, or children"
            )));
        }

        let methods = resolve_methods(&def)?;

        if let Some(methods) = methods {
            let bindings = resolve_bindings(&merged_bindings)?;
            for method in methods {
                let handler = if has_redirect {
                    Handler::Redirect(to_redirect_target(def.redirect.clone().expect("checked above")))
                } else {
                    to_handler(&def.handler)
                };
                out.push(ExpandedNode {
                    path: merged_path.clone(),
                    method,
                    handler,
                    name: non_empty(&merged_name),
                    domain: merged_domain.clone(),
                    protocol: merged_protocol,
                    rules: merged_rules.clone(),
                    defaults: merged_defaults.clone(),
                    bindings: bindings.clone(),
                    middleware: merged_middleware.clone(),
                    exclude_middleware: merged_exclude.iter().cloned().collect(),
                    strict: merged_strict.unwrap_or(false),
                    fallback: merged_fallback,
                    page_layout: merged_page_layout.clone(),
                    custom_options: merged_custom_options.clone(),
                    is_internal_head: false,
                });
            }
        }

        for child in def.children {
            self.walk(child, &inherited, depth + 1, out)?;
        }

        Ok(())
    }

    fn compile(&self, node: ExpandedNode) -> Result<Arc<Route>> {
        let binding_aliases = HashMap::new(); // constraint-level aliasing is attached per-param in rules/defaults already
        let compiled = uri::compile(CompileInput {
            domain: node.domain.as_deref(),
            path: &node.path,
            rules: &node.rules,
            defaults: &node.defaults,
            binding_aliases: &binding_aliases,
            strict: node.strict,
        })?;

        let options = RouteOptions {
            path: node.path,
            method: node.method,
            handler: node.handler,
            name: node.name,
            domain: node.domain,
            protocol: node.protocol,
            rules: node.rules,
            defaults: node.defaults,
            bindings: node.bindings,
            middleware: node.middleware,
            exclude_middleware: node.exclude_middleware,
            strict: node.strict,
            fallback: node.fallback,
            is_internal_head: node.is_internal_head,
            page_layout: node.page_layout,
            custom_options: node.custom_options,
        };

        let mut route = Route::new(options, compiled, self.options.resolver.clone());
        route.set_matchers(self.options.matchers.clone());
        route.set_dispatchers(self.options.dispatchers.clone());
        Ok(Arc::new(route))
    }
}

/// Resolve `method`/`methods` for one definition (spec §4.6 step 3).
/// Returns `None` for a group-only node (no methods produced at this
/// level, only via its children).
fn resolve_methods(def: &RouteDefinition) -> Result<Option<Vec<Method>>> {
    if let Some(methods) = &def.methods {
        for m in methods {
            validate_verb(m)?;
        }
        return Ok(Some(methods.clone()));
    }
    if let Some(method) = &def.method {
        validate_verb(method)?;
        return Ok(Some(vec![method.clone()]));
    }
    if def.redirect.is_some() {
        return Ok(Some(vec![Method::GET]));
    }
    if !matches!(def.handler, HandlerSpec::None) {
        return Ok(Some(vec![Method::GET]));
    }
    Ok(None)
}

fn validate_verb(method: &Method) -> Result<()> {
    if ALLOWED_VERBS.contains(&method.as_str()) {
        Ok(())
    } else {
        Err(Error::router(format!("{method} is not an allowed route verb")))
    }
}

fn resolve_bindings(specs: &HashMap<String, BindingSpec>) -> Result<HashMap<String, BindingSource>> {
    let mut out = HashMap::with_capacity(specs.len());
    for (param, spec) in specs {
        let source = match spec {
            BindingSpec::Binder(binder) => BindingSource::Binder(binder.clone()),
            BindingSpec::AliasMethod(s) => {
                let (container, method) = crate::definition::parse_alias_method(s);
                BindingSource::ContainerAlias { container, method }
            }
        };
        out.insert(param.clone(), source);
    }
    Ok(out)
}

fn to_handler(spec: &HandlerSpec) -> Handler {
    match spec {
        HandlerSpec::Callable(c) => Handler::Callable(c.clone()),
        HandlerSpec::Factory(f) => Handler::Factory(FactorySlot::new(f.clone())),
        HandlerSpec::Class {
            controller,
            class_name,
            action,
        } => Handler::Class {
            controller: controller.clone(),
            class_name: class_name.clone(),
            action: action.clone(),
        },
        HandlerSpec::Component(component_spec) => Handler::Component {
            loader: match component_spec {
                crate::definition::ComponentSpec::Eager(c) => ComponentSlot::eager(c.clone()),
                crate::definition::ComponentSpec::Lazy(loader) => ComponentSlot::lazy(loader.clone()),
            },
        },
        HandlerSpec::None => Handler::None,
    }
}

fn to_redirect_target(spec: RedirectSpec) -> RedirectTarget {
    match spec {
        RedirectSpec::Static(s) => RedirectTarget::Static(s),
        RedirectSpec::WithStatus { location, status } => RedirectTarget::WithStatus { location, status },
        RedirectSpec::Dynamic(f) => RedirectTarget::Dynamic(Arc::new(move |event| {
            to_redirect_target_ref(&f(event))
        })),
    }
}

fn to_redirect_target_ref(spec: &RedirectSpec) -> RedirectTarget {
    match spec {
        RedirectSpec::Static(s) => RedirectTarget::Static(s.clone()),
        RedirectSpec::WithStatus { location, status } => RedirectTarget::WithStatus {
            location: location.clone(),
            status: *status,
        },
        RedirectSpec::Dynamic(f) => RedirectTarget::Dynamic(f.clone()),
    }
}

/// Collapse repeated `/`, trim a trailing `/` unless the whole path is `/`
/// (spec §4.6 step 2 "Path").
fn join_path(prefix: &str, path: &str) -> String {
    let combined = format!("{prefix}/{path}");
    let mut collapsed = String::with_capacity(combined.len());
    let mut last_was_slash = false;
    for ch in combined.chars() {
        if ch == '/' {
            if last_was_slash {
                continue;
            }
            last_was_slash = true;
        } else {
            last_was_slash = false;
        }
        collapsed.push(ch);
    }
    if collapsed.len() > 1 && collapsed.ends_with('/') {
        collapsed.pop();
    }
    if !collapsed.starts_with('/') {
        collapsed.insert(0, '/');
    }
    collapsed
}

/// Collapse repeated `.`, strip leading/trailing `.` (spec §4.6 step 2
/// "Name").
fn join_name(parent: &str, name: &str) -> String {
    let combined = format!("{parent}.{name}");
    let mut collapsed = String::with_capacity(combined.len());
    let mut last_was_dot = false;
    for ch in combined.chars() {
        if ch == '.' {
            if last_was_dot {
                continue;
            }
            last_was_dot = true;
        } else {
            last_was_dot = false;
        }
        collapsed.push(ch);
    }
    collapsed.trim_matches('.').to_string()
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// For every produced `GET` route, add a `HEAD` twin flagged
/// `isInternalHeader=true`, unless the definitions already produced an
/// explicit `HEAD` at the same `(path, domain)` — resolving spec §9's
/// Open Question (a) in favor of the user's own route winning.
fn synthesize_head_twins(nodes: &mut Vec<ExpandedNode>) {
    let explicit_heads: HashSet<(String, Option<String>)> = nodes
        .iter()
        .filter(|n| n.method == Method::HEAD)
        .map(|n| (n.path.clone(), n.domain.clone()))
        .collect();

    let twins: Vec<ExpandedNode> = nodes
        .iter()
        .filter(|n| n.method == Method::GET)
        .filter(|n| !explicit_heads.contains(&(n.path.clone(), n.domain.clone())))
        .map(|n| ExpandedNode {
            path: n.path.clone(),
            method: Method::HEAD,
            handler: n.handler.clone(),
            name: None,
            domain: n.domain.clone(),
            protocol: n.protocol,
            rules: n.rules.clone(),
            defaults: n.defaults.clone(),
            bindings: n.bindings.clone(),
            middleware: n.middleware.clone(),
            exclude_middleware: n.exclude_middleware.clone(),
            strict: n.strict,
            fallback: n.fallback,
            page_layout: n.page_layout.clone(),
            custom_options: n.custom_options.clone(),
            is_internal_head: true,
        })
        .collect();

    nodes.extend(twins);
}
