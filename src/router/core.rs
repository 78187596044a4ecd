//! Router core module - route table and priority ordering.
//!
//! Routes are kept sorted by a priority key derived once at registration time,
//! so matching is a single walk in priority order: the first route whose
//! method accepts the request and whose pattern matches wins.

use http::Method;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::matcher::{match_decoded, DecodedPath, MatchResult};
use super::params::Params;
use crate::error::CompileError;
use crate::pattern::{CompiledPattern, PriorityKey};

/// Default threshold above which a route lookup is logged as slow
pub const DEFAULT_SLOW_MATCH: Duration = Duration::from_millis(1);

/// A registered route: method filter, compiled pattern and handler value
///
/// `H` is whatever the owner dispatches to; the [`Dispatcher`](crate::dispatcher::Dispatcher)
/// stores handler closures, the CLI stores handler names.
pub struct Route<H> {
    method: Option<Method>,
    name: Arc<str>,
    pattern: CompiledPattern,
    priority_key: PriorityKey,
    handler: H,
}

impl<H> Route<H> {
    /// `None` means the route accepts any method
    #[must_use]
    pub fn method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    /// Route name used in logs, listings and metrics
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn pattern(&self) -> &CompiledPattern {
        &self.pattern
    }

    #[must_use]
    pub fn priority_key(&self) -> &PriorityKey {
        &self.priority_key
    }

    #[must_use]
    pub fn handler(&self) -> &H {
        &self.handler
    }

    #[inline]
    fn accepts(&self, method: &Method) -> bool {
        self.method.as_ref().map_or(true, |m| m == method)
    }
}

impl<H> fmt::Debug for Route<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("name", &self.name)
            .field("pattern", &self.pattern.to_string())
            .field("priority_key", &self.priority_key.as_slice())
            .finish_non_exhaustive()
    }
}

impl<H> fmt::Display for Route<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.method {
            Some(m) => write!(f, "{m} {} -> {}", self.pattern, self.name),
            None => write!(f, "* {} -> {}", self.pattern, self.name),
        }
    }
}

/// Result of successfully matching a request to a route
///
/// Holds an `Arc` to the route so the match outlives the table snapshot it
/// came from; the params are owned by the request.
#[derive(Debug)]
pub struct RouteMatch<H> {
    /// The matched route
    pub route: Arc<Route<H>>,
    /// Typed path parameters
    pub params: Params,
}

impl<H> Clone for RouteMatch<H> {
    fn clone(&self) -> Self {
        Self {
            route: Arc::clone(&self.route),
            params: self.params.clone(),
        }
    }
}

/// Priority-ordered route table
///
/// More specific routes come first: at the first position where two patterns
/// differ, a literal outranks a parameter and a parameter outranks a greedy
/// tail. Routes with identical keys keep registration order.
///
/// A greedy `path` tail therefore ranks below an ordinary parameter at the
/// same position: `/files/{name}/meta` is tried before `/files/{rest<path>}`,
/// whichever was registered first.
///
/// The table is built during start-up and read-only afterwards. Cloning is
/// cheap (routes are shared), which is what [`SharedRouter`](super::SharedRouter)
/// relies on for copy-on-write registration.
pub struct Router<H> {
    routes: Vec<Arc<Route<H>>>,
    slow_match: Duration,
}

impl<H> Clone for Router<H> {
    fn clone(&self) -> Self {
        Self {
            routes: self.routes.clone(),
            slow_match: self.slow_match,
        }
    }
}

impl<H> Default for Router<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> fmt::Debug for Router<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes)
            .field("slow_match", &self.slow_match)
            .finish()
    }
}

impl<H> Router<H> {
    /// Create an empty router
    #[must_use]
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            slow_match: DEFAULT_SLOW_MATCH,
        }
    }

    /// Set the lookup duration above which a match is logged at `warn`
    #[must_use]
    pub fn with_slow_match_threshold(mut self, threshold: Duration) -> Self {
        self.slow_match = threshold;
        self
    }

    #[must_use]
    pub fn slow_match_threshold(&self) -> Duration {
        self.slow_match
    }

    /// Register a route for one method
    ///
    /// The route name defaults to the template text.
    ///
    /// # Errors
    ///
    /// Returns the [`CompileError`] of a malformed template; the table is left
    /// unchanged.
    pub fn register(&mut self, method: Method, pattern: &str, handler: H) -> Result<(), CompileError> {
        self.insert(Some(method), pattern, pattern, handler)
    }

    /// Register a route that accepts every method
    ///
    /// # Errors
    ///
    /// Returns the [`CompileError`] of a malformed template.
    pub fn register_any(&mut self, pattern: &str, handler: H) -> Result<(), CompileError> {
        self.insert(None, pattern, pattern, handler)
    }

    /// Register a route with an explicit name
    ///
    /// # Errors
    ///
    /// Returns the [`CompileError`] of a malformed template.
    pub fn register_named(
        &mut self,
        method: Option<Method>,
        pattern: &str,
        name: &str,
        handler: H,
    ) -> Result<(), CompileError> {
        self.insert(method, pattern, name, handler)
    }

    fn insert(
        &mut self,
        method: Option<Method>,
        pattern: &str,
        name: &str,
        handler: H,
    ) -> Result<(), CompileError> {
        let compiled = match CompiledPattern::compile(pattern) {
            Ok(compiled) => compiled,
            Err(e) => {
                warn!(
                    method = ?method,
                    pattern = %pattern,
                    error = %e,
                    "Route registration rejected"
                );
                return Err(e);
            }
        };
        let priority_key = compiled.priority_key();

        // Insert after every route with a key <= ours: equal keys keep
        // registration order without re-sorting the table.
        let position = self
            .routes
            .partition_point(|r| r.priority_key <= priority_key);

        info!(
            method = ?method,
            pattern = %compiled,
            route_name = %name,
            position = position,
            routes_count = self.routes.len() + 1,
            "Route registered"
        );

        self.routes.insert(
            position,
            Arc::new(Route {
                method,
                name: Arc::from(name),
                pattern: compiled,
                priority_key,
                handler,
            }),
        );
        Ok(())
    }

    /// Match a request to a route
    ///
    /// Walks the table in priority order, skipping routes whose method does not
    /// accept the request, and returns the first pattern match.
    ///
    /// # Returns
    ///
    /// * `Some(RouteMatch)` - the first matching route and its typed params
    /// * `None` - no route matched (the caller's not-found case)
    #[must_use]
    pub fn route(&self, method: &Method, path: &str) -> Option<RouteMatch<H>> {
        debug!(method = %method, path = %path, "Route match attempt");

        let match_start = Instant::now();
        let result = DecodedPath::parse(path).and_then(|decoded| self.find(method, &decoded));
        let match_duration = match_start.elapsed();

        match &result {
            Some(m) => {
                if match_duration > self.slow_match {
                    warn!(
                        method = %method,
                        path = %path,
                        route_name = %m.route.name,
                        route_pattern = %m.route.pattern,
                        duration_us = match_duration.as_micros(),
                        "Slow route matching detected"
                    );
                } else {
                    debug!(
                        method = %method,
                        path = %path,
                        route_name = %m.route.name,
                        route_pattern = %m.route.pattern,
                        path_params = ?m.params,
                        duration_us = match_duration.as_micros(),
                        "Route matched"
                    );
                }
            }
            None => {
                debug!(
                    method = %method,
                    path = %path,
                    duration_us = match_duration.as_micros(),
                    "No route matched"
                );
            }
        }

        result
    }

    fn find(&self, method: &Method, path: &DecodedPath<'_>) -> Option<RouteMatch<H>> {
        self.routes
            .iter()
            .filter(|r| r.accepts(method))
            .find_map(|r| match match_decoded(&r.pattern, path) {
                MatchResult::Matched(params) => Some(RouteMatch {
                    route: Arc::clone(r),
                    params,
                }),
                MatchResult::NoMatch => None,
            })
    }

    /// Methods of every route whose pattern matches `path`
    ///
    /// Lets a host tell "405 Method Not Allowed" apart from "404 Not Found".
    /// A method-agnostic route contributes nothing here; if one matches, the
    /// request would have been routed anyway.
    #[must_use]
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let Some(decoded) = DecodedPath::parse(path) else {
            return Vec::new();
        };
        let mut methods: Vec<Method> = Vec::new();
        for route in &self.routes {
            if let Some(m) = &route.method {
                if !methods.contains(m) && match_decoded(&route.pattern, &decoded).is_match() {
                    methods.push(m.clone());
                }
            }
        }
        methods
    }

    /// Routes in priority order
    pub fn iter(&self) -> impl Iterator<Item = &Route<H>> {
        self.routes.iter().map(AsRef::as_ref)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Print all registered routes to stdout, in priority order
    ///
    /// Useful for debugging and verifying that routes are loaded correctly.
    pub fn dump_routes(&self) {
        println!("[routes] count={}", self.routes.len());
        for route in &self.routes {
            println!("[route] {route}");
        }
    }
}
