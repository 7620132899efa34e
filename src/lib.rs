//! `omnirouter` — a universal, transport-agnostic HTTP-style router core.
//!
//! Given a declarative collection of route definitions, this crate compiles
//! them into matchable entries, selects the best match for an incoming
//! event, binds URI parameters (optionally resolved through external
//! bindings), and dispatches to one of four handler shapes: a function, a
//! factory, a class action, a UI component, or a redirect.
//!
//! The crate owns none of: a transport, a concrete request/response type,
//! or a dependency-injection container. Those are narrow traits supplied by
//! the embedding host — see [`event`].
//!
//! ```text
//! definitions ──▶ RouteMapper ──▶ RouteCollection
//!                                      │
//! event ──▶ Router::dispatch ──▶ RouteCollection::matching ──▶ Route::bind
//!                                      │                          │
//!                                      └──────────▶ Route::run ◀──┘
//!                                                       │
//!                                                  Dispatcher
//! ```

pub mod collection;
pub mod definition;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod handler;
pub mod logging;
pub mod mapper;
pub mod matchers;
pub mod middleware;
pub mod route;
pub mod router;
pub mod uri;

pub use collection::{MatchOutcome, RouteCollection, RouteMatch};
pub use definition::{BindingSpec, ComponentSpec, HandlerSpec, RedirectSpec, RouteDefinition};
pub use dispatcher::{Dispatcher, DispatcherTable, HandlerKind};
pub use error::{Error, MethodNotAllowedError, Result, RouteNotFoundError, RouterError};
pub use event::{Binder, BoundValue, EventEmitter, ExternalResolver, IncomingEvent, PreferredType};
pub use handler::{Callable, ClassController, Component, DispatchOutcome, Handler};
pub use mapper::{MapperOptions, RouteMapper};
pub use middleware::Middleware;
pub use route::{BindingSource, Protocol, Route, RouteOptions};
pub use router::{GenerateOptions, Router, RouterOptions};
