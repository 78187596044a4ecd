//! # Dispatcher Module
//!
//! The dispatcher selects the first matching route for a request and invokes
//! its handler, or a caller-supplied fallback when nothing matches.
//!
//! ## Overview
//!
//! - Reads a lock-free snapshot of the route table for every dispatch
//! - Walks routes in priority order and stops at the first match
//! - Hands the typed params to the handler by value
//! - Runs middleware before and after the chosen handler
//! - Converts handler panics into 500 responses
//!
//! ## Request Flow
//!
//! 1. An exact-path redirect answers immediately (no middleware)
//! 2. Snapshot the route table
//! 3. Router matches method + path → route and params
//! 4. On no match, pick the call's fallback, else the dispatcher default, else
//!    the 404 error handler, else return [`DispatchOutcome::NoRoute`]
//! 5. Middleware `before` hooks (any may answer early)
//! 6. Handler invocation; a panic goes to the 500 error handler if set
//! 7. Middleware `after` hooks
//!
//! ## Example
//!
//! ```rust
//! use http::Method;
//! use segrouter::dispatcher::{handler, DispatchOutcome, Dispatcher, HandlerResponse};
//! use serde_json::json;
//!
//! let dispatcher = Dispatcher::new();
//! dispatcher
//!     .register(
//!         Method::GET,
//!         "/user/{id<int>}",
//!         handler(|req| HandlerResponse::json(200, json!({ "id": req.params.get_int("id") }))),
//!     )
//!     .unwrap();
//!
//! match dispatcher.dispatch(Method::GET, "/user/7", None) {
//!     DispatchOutcome::Handled(resp) => assert_eq!(resp.body, json!({ "id": 7 })),
//!     DispatchOutcome::NoRoute => unreachable!(),
//! }
//! assert!(!dispatcher.dispatch(Method::GET, "/user/abc", None).is_handled());
//! ```

mod core;

pub use self::core::{
    handler, parse_query_params, DispatchOutcome, DispatchRequest, Dispatcher, Handler,
    HandlerError, HandlerRequest, HandlerResponse, HeaderVec, QueryVec, RequestInfo,
    MAX_INLINE_HEADERS,
};
