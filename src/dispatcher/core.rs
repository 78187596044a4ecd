//! Dispatcher core module - request dispatch hot path.
//!
//! One dispatch = one snapshot load, one route walk, and exactly one handler
//! (or fallback) invocation wrapped in the middleware pipeline.

use http::Method;
use serde::Serialize;
use serde_json::Value;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::error::CompileError;
use crate::ids::RequestId;
use crate::middleware::Middleware;
use crate::router::{Params, Router, SharedRouter};

/// Maximum inline headers / query pairs before heap allocation
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header storage for the dispatch path
///
/// Header names use `Arc<str>`: they repeat across requests and cloning is an
/// atomic increment.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Decoded query string pairs, in request order
pub type QueryVec = SmallVec<[(String, String); MAX_INLINE_HEADERS]>;

/// A route handler
///
/// Handlers receive the request by value (params included) and return the
/// response synchronously. Whether the handler blocks is the host's concern.
pub type Handler = Arc<dyn Fn(HandlerRequest) -> HandlerResponse + Send + Sync>;

/// Wrap a closure as a [`Handler`]
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(HandlerRequest) -> HandlerResponse + Send + Sync + 'static,
{
    Arc::new(f)
}

/// An incoming request as handed to [`Dispatcher::dispatch_request`]
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    pub method: Method,
    /// Raw request target; may carry a query string
    pub path: String,
    pub headers: HeaderVec,
    pub body: Option<Value>,
}

impl DispatchRequest {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderVec::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((Arc::from(name), value.into()));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Request data passed to a handler
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    /// Unique request ID for tracing and correlation
    pub request_id: RequestId,
    pub method: Method,
    /// Raw request path, query string included
    pub path: String,
    /// Name of the matched route; `None` when the fallback runs
    pub route_name: Option<Arc<str>>,
    /// Canonical pattern of the matched route; `None` when the fallback runs
    pub route_pattern: Option<String>,
    /// Typed path parameters
    pub params: Params,
    /// Decoded query string parameters
    pub query_params: QueryVec,
    pub headers: HeaderVec,
    pub body: Option<Value>,
    /// Set only when the request is handed to an error handler
    pub error: Option<HandlerError>,
}

/// Why an error handler was invoked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerError {
    /// Status the error handler was selected for (404, 500)
    pub status: u16,
    pub message: String,
}

/// The parts of a request that `after` middleware hooks see
///
/// The handler takes the [`HandlerRequest`] by value, so headers and body are
/// not kept around for the hooks.
#[derive(Debug, Clone)]
pub struct RequestInfo {
    pub request_id: RequestId,
    pub method: Method,
    pub path: String,
    /// `None` when the fallback ran
    pub route_name: Option<Arc<str>>,
    pub route_pattern: Option<String>,
}

impl From<&HandlerRequest> for RequestInfo {
    fn from(req: &HandlerRequest) -> Self {
        Self {
            request_id: req.request_id,
            method: req.method.clone(),
            path: req.path.clone(),
            route_name: req.route_name.clone(),
            route_pattern: req.route_pattern.clone(),
        }
    }
}

impl HandlerRequest {
    /// Get a query parameter by name
    ///
    /// Uses "last write wins" semantics: `?limit=10&limit=20` yields `20`.
    #[inline]
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .rfind(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Response data returned by a handler
#[derive(Debug, Clone, Serialize)]
pub struct HandlerResponse {
    /// HTTP status code (200, 404, 500, etc.)
    pub status: u16,
    #[serde(skip_serializing)]
    pub headers: HeaderVec,
    pub body: Value,
}

impl HandlerResponse {
    #[must_use]
    pub fn new(status: u16, headers: HeaderVec, body: Value) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Create a JSON response with a content-type header
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "application/json".to_string()));
        Self {
            status,
            headers,
            body,
        }
    }

    /// Create an error response: `{"error": message}`
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, serde_json::json!({ "error": message }))
    }

    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a header
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }
}

/// Result of one dispatch call
#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    /// A route handler or the fallback produced a response
    Handled(HandlerResponse),
    /// No route matched and no fallback was available
    NoRoute,
}

impl DispatchOutcome {
    #[must_use]
    pub fn is_handled(&self) -> bool {
        matches!(self, DispatchOutcome::Handled(_))
    }

    #[must_use]
    pub fn into_response(self) -> Option<HandlerResponse> {
        match self {
            DispatchOutcome::Handled(resp) => Some(resp),
            DispatchOutcome::NoRoute => None,
        }
    }
}

/// Matches requests against the route table and invokes the chosen handler
///
/// The table lives behind a [`SharedRouter`], so routes can be registered
/// through `&self` while other threads are dispatching. Middleware runs in
/// registration order around whichever handler is chosen, fallback included.
///
/// Exact-path redirects are answered before routing and skip middleware.
/// Error handlers are keyed by status (`404`, `500`) with `0` as the
/// catch-all; they answer unmatched requests when no fallback is set and
/// replace the default 500 body when a handler panics.
#[derive(Clone, Default)]
pub struct Dispatcher {
    routes: Arc<SharedRouter<Handler>>,
    middlewares: Vec<Arc<dyn Middleware>>,
    not_found: Option<Handler>,
    error_handlers: HashMap<u16, Handler>,
    redirects: HashMap<String, (String, u16)>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut statuses: Vec<u16> = self.error_handlers.keys().copied().collect();
        statuses.sort_unstable();
        f.debug_struct("Dispatcher")
            .field("routes", &self.routes.snapshot().len())
            .field("middlewares", &self.middlewares.len())
            .field("not_found", &self.not_found.is_some())
            .field("error_handlers", &statuses)
            .field("redirects", &self.redirects.len())
            .finish()
    }
}

impl Dispatcher {
    /// Create a dispatcher with an empty route table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a dispatcher over a prebuilt route table
    #[must_use]
    pub fn with_router(router: Router<Handler>) -> Self {
        Self::with_shared(Arc::new(SharedRouter::new(router)))
    }

    /// Create a dispatcher over a table shared with another owner (e.g. a
    /// manifest watcher)
    #[must_use]
    pub fn with_shared(routes: Arc<SharedRouter<Handler>>) -> Self {
        Self {
            routes,
            middlewares: Vec::new(),
            not_found: None,
            error_handlers: HashMap::new(),
            redirects: HashMap::new(),
        }
    }

    /// The shared route table
    #[must_use]
    pub fn shared_routes(&self) -> Arc<SharedRouter<Handler>> {
        Arc::clone(&self.routes)
    }

    /// Snapshot of the current route table
    #[must_use]
    pub fn routes(&self) -> Arc<Router<Handler>> {
        self.routes.snapshot()
    }

    /// Register a handler for one method
    ///
    /// # Errors
    ///
    /// Returns the [`CompileError`] of a malformed template; the route is not added.
    pub fn register(&self, method: Method, pattern: &str, handler: Handler) -> Result<(), CompileError> {
        self.routes.register(Some(method), pattern, pattern, handler)
    }

    /// Register a handler that accepts every method
    ///
    /// # Errors
    ///
    /// Returns the [`CompileError`] of a malformed template.
    pub fn register_any(&self, pattern: &str, handler: Handler) -> Result<(), CompileError> {
        self.routes.register(None, pattern, pattern, handler)
    }

    /// Register a handler under an explicit route name
    ///
    /// # Errors
    ///
    /// Returns the [`CompileError`] of a malformed template.
    pub fn register_named(
        &self,
        method: Option<Method>,
        pattern: &str,
        name: &str,
        handler: Handler,
    ) -> Result<(), CompileError> {
        self.routes.register(method, pattern, name, handler)
    }

    /// Default fallback used when a dispatch call passes none
    pub fn set_not_found(&mut self, handler: Handler) {
        self.not_found = Some(handler);
    }

    /// Register an error handler for `status`
    ///
    /// `404` answers requests no route or fallback took, `500` answers handler
    /// panics, and `0` stands in for any status without its own handler. The
    /// handler sees the cause in [`HandlerRequest::error`].
    pub fn set_error_handler(&mut self, status: u16, handler: Handler) {
        self.error_handlers.insert(status, handler);
    }

    /// Answer requests for exactly `from` with a redirect to `to`
    ///
    /// `status` must be a 3xx code; anything else is replaced by 302. The
    /// request's query string is ignored when looking up `from`.
    pub fn add_redirect(&mut self, from: &str, to: impl Into<String>, status: u16) {
        let status = if (300..400).contains(&status) {
            status
        } else {
            warn!(from = %from, status = status, "Redirect status is not 3xx, using 302");
            302
        };
        self.redirects.insert(from.to_string(), (to.into(), status));
    }

    /// Add middleware to the processing pipeline
    ///
    /// Middleware is executed in the order it's added.
    pub fn add_middleware(&mut self, mw: Arc<dyn Middleware>) {
        self.middlewares.push(mw);
    }

    fn error_handler(&self, status: u16) -> Option<&Handler> {
        self.error_handlers
            .get(&status)
            .or_else(|| self.error_handlers.get(&0))
    }

    /// Dispatch a bare method + path
    ///
    /// `not_found` overrides the dispatcher's default fallback for this call.
    /// Returns [`DispatchOutcome::NoRoute`] when nothing matched and no
    /// fallback is available.
    #[must_use]
    pub fn dispatch(&self, method: Method, path: &str, not_found: Option<&Handler>) -> DispatchOutcome {
        self.dispatch_request(DispatchRequest::new(method, path), not_found)
    }

    /// Dispatch a request carrying headers and body
    #[must_use]
    pub fn dispatch_request(&self, req: DispatchRequest, not_found: Option<&Handler>) -> DispatchOutcome {
        let DispatchRequest {
            method,
            path,
            headers,
            body,
        } = req;

        let request_id = RequestId::from_header_or_new(
            headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case("x-request-id"))
                .map(|(_, v)| v.as_str()),
        );

        let bare_path = path.split(['?', '#']).next().unwrap_or_default();
        if let Some((location, status)) = self.redirects.get(bare_path) {
            debug!(
                request_id = %request_id,
                method = %method,
                path = %path,
                location = %location,
                status = status,
                "Redirecting request"
            );
            let mut headers = HeaderVec::new();
            headers.push((Arc::from("location"), location.clone()));
            return DispatchOutcome::Handled(HandlerResponse::new(*status, headers, Value::Null));
        }

        let query_params = parse_query_params(&path);

        let table = self.routes.snapshot();
        let (chosen, route_name, route_pattern, params, error) = match table.route(&method, &path) {
            Some(m) => (
                Arc::clone(m.route.handler()),
                Some(Arc::from(m.route.name())),
                Some(m.route.pattern().to_string()),
                m.params,
                None,
            ),
            None => match not_found.or(self.not_found.as_ref()) {
                Some(fallback) => {
                    debug!(
                        request_id = %request_id,
                        method = %method,
                        path = %path,
                        "No route matched - invoking fallback"
                    );
                    (Arc::clone(fallback), None, None, Params::new(), None)
                }
                None => match self.error_handler(404) {
                    Some(on_error) => {
                        debug!(
                            request_id = %request_id,
                            method = %method,
                            path = %path,
                            "No route matched - invoking 404 error handler"
                        );
                        let error = HandlerError {
                            status: 404,
                            message: format!("no route for {method} {bare_path}"),
                        };
                        (Arc::clone(on_error), None, None, Params::new(), Some(error))
                    }
                    None => {
                        info!(
                            request_id = %request_id,
                            method = %method,
                            path = %path,
                            "No route matched and no fallback supplied"
                        );
                        return DispatchOutcome::NoRoute;
                    }
                },
            },
        };

        let request = HandlerRequest {
            request_id,
            method,
            path,
            route_name,
            route_pattern,
            params,
            query_params,
            headers,
            body,
            error,
        };

        DispatchOutcome::Handled(self.run_pipeline(&chosen, request))
    }

    /// Run middleware `before` hooks, the handler, then `after` hooks
    fn run_pipeline(&self, handler: &Handler, request: HandlerRequest) -> HandlerResponse {
        let mut early_resp: Option<HandlerResponse> = None;
        for (idx, mw) in self.middlewares.iter().enumerate() {
            early_resp = mw.before(&request);
            if early_resp.is_some() {
                debug!(
                    request_id = %request.request_id,
                    middleware_idx = idx,
                    "Middleware returned early response"
                );
                break;
            }
        }

        let info = RequestInfo::from(&request);
        let (mut resp, latency) = match early_resp {
            Some(r) => (r, Duration::ZERO),
            None => {
                let start = Instant::now();
                let resp = self.handle(handler, request);
                (resp, start.elapsed())
            }
        };

        for mw in &self.middlewares {
            mw.after(&info, &mut resp, latency);
        }

        resp
    }

    /// Invoke the handler; a panic goes to the 500 error handler if one is
    /// registered, else becomes the default 500 body
    fn handle(&self, handler: &Handler, request: HandlerRequest) -> HandlerResponse {
        let on_panic = self.error_handler(500);
        // The handler consumes the request; keep a copy only when an error
        // handler will need it.
        let spare = on_panic.map(|_| request.clone());
        let request_id = request.request_id;
        let route_name = request.route_name.clone();

        let panic_message = match invoke(handler, request) {
            Ok(resp) => return resp,
            Err(message) => message,
        };
        error!(
            request_id = %request_id,
            route_name = ?route_name,
            panic_message = %panic_message,
            "Handler panicked - CRITICAL"
        );

        let default = || HandlerResponse::error(500, &format!("Handler panicked: {panic_message}"));
        let (Some(on_error), Some(mut spare)) = (on_panic, spare) else {
            return default();
        };
        spare.error = Some(HandlerError {
            status: 500,
            message: panic_message.clone(),
        });
        match invoke(on_error, spare) {
            Ok(resp) => resp,
            Err(second) => {
                error!(
                    request_id = %request_id,
                    panic_message = %second,
                    "Error handler panicked"
                );
                default()
            }
        }
    }
}

/// Call the handler, catching a panic and returning its message
fn invoke(handler: &Handler, request: HandlerRequest) -> Result<HandlerResponse, String> {
    catch_unwind(AssertUnwindSafe(|| handler(request))).map_err(|panic| {
        panic
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string())
    })
}


/// Parse the query string of a request target
///
/// Names and values are form-urlencoded decoded (`+` becomes a space).
#[must_use]
pub fn parse_query_params(path: &str) -> QueryVec {
    let Some((_, rest)) = path.split_once('?') else {
        return QueryVec::new();
    };
    let query = rest.split('#').next().unwrap_or_default();
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}
