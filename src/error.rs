//! Error taxonomy for the router core (spec §7).
//!
//! Three kinds are surfaced, matching the wire-stable names a co-operating
//! error handler maps to status codes: [`RouterError`] (config/programmer
//! error, 500), [`RouteNotFoundError`] (404) and [`MethodNotAllowedError`]
//! (405, carrying the allowed-method set).
//!
//! Hand-rolled `Display`/`Error` impls, no `thiserror` — matches
//! `middleware/cors/error.rs` in the teacher crate, which does the same.

use std::collections::BTreeSet;
use std::fmt;

/// No route in the collection matched the event by any criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteNotFoundError {
    pub message: String,
}

impl RouteNotFoundError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for RouteNotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "route not found: {}", self.message)
    }
}

impl std::error::Error for RouteNotFoundError {}

/// A route matched by path/host/protocol but not by method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodNotAllowedError {
    pub path: String,
    pub allowed: BTreeSet<String>,
}

impl MethodNotAllowedError {
    pub fn new(path: impl Into<String>, allowed: BTreeSet<String>) -> Self {
        Self {
            path: path.into(),
            allowed,
        }
    }

    /// Comma-joined allowed methods, ascending — used both for the `Allow`
    /// header on OPTIONS fallback and for this error's message.
    pub fn allowed_header(&self) -> String {
        self.allowed.iter().cloned().collect::<Vec<_>>().join(",")
    }
}

impl fmt::Display for MethodNotAllowedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "method not allowed for {}: allowed methods are {}",
            self.path,
            self.allowed_header()
        )
    }
}

impl std::error::Error for MethodNotAllowedError {}

/// Configuration or programmer errors: missing options, invalid handler
/// shape, unknown dispatcher, unresolvable binding, depth exceeded, a
/// `generate` call missing a required parameter, `navigate` outside a
/// browser, an invalid `RouteCollection`, a missing `getUri` on the event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterError {
    pub message: String,
}

impl RouterError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for RouterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "router error: {}", self.message)
    }
}

impl std::error::Error for RouterError {}

/// Top-level error composing the three kinds so call sites can use `?`
/// across module boundaries and still recover the original kind for the
/// error-handler status mapping in §7.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    Router(RouterError),
    RouteNotFound(RouteNotFoundError),
    MethodNotAllowed(MethodNotAllowedError),
}

impl Error {
    pub fn router(message: impl Into<String>) -> Self {
        Error::Router(RouterError::new(message))
    }

    pub fn route_not_found(message: impl Into<String>) -> Self {
        Error::RouteNotFound(RouteNotFoundError::new(message))
    }

    pub fn method_not_allowed(path: impl Into<String>, allowed: BTreeSet<String>) -> Self {
        Error::MethodNotAllowed(MethodNotAllowedError::new(path, allowed))
    }

    /// Status code a co-operating `RouterErrorHandler` would map this to (§7).
    pub fn status_code(&self) -> u16 {
        match self {
            Error::RouteNotFound(_) => 404,
            Error::MethodNotAllowed(_) => 405,
            Error::Router(_) => 500,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Router(e) => e.fmt(f),
            Error::RouteNotFound(e) => e.fmt(f),
            Error::MethodNotAllowed(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for Error {}

impl From<RouterError> for Error {
    fn from(e: RouterError) -> Self {
        Error::Router(e)
    }
}

impl From<RouteNotFoundError> for Error {
    fn from(e: RouteNotFoundError) -> Self {
        Error::RouteNotFound(e)
    }
}

impl From<MethodNotAllowedError> for Error {
    fn from(e: MethodNotAllowedError) -> Self {
        Error::MethodNotAllowed(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
