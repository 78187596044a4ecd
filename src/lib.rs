//! # segrouter
//!
//! **segrouter** is a segment-based HTTP route matcher and dispatcher. Route
//! templates such as `/user/{id<int>}` or `/files/{rest<path>}` are compiled
//! once into segment lists; incoming paths are matched against them in a fixed
//! priority order and the winning handler receives typed path parameters.
//!
//! ## Overview
//!
//! ```rust
//! use http::Method;
//! use segrouter::dispatcher::{handler, Dispatcher, HandlerResponse};
//! use serde_json::json;
//!
//! let dispatcher = Dispatcher::new();
//! dispatcher
//!     .register(Method::GET, "/post/{slug}", handler(|req| {
//!         HandlerResponse::json(200, json!({"slug": req.params.get_str("slug")}))
//!     }))
//!     .unwrap();
//! dispatcher
//!     .register(Method::GET, "/post/popular", handler(|_| {
//!         HandlerResponse::json(200, json!({"popular": true}))
//!     }))
//!     .unwrap();
//!
//! // The literal route wins even though it was registered second
//! let res = dispatcher.dispatch(Method::GET, "/post/popular", None).into_response().unwrap();
//! assert_eq!(res.body, json!({"popular": true}));
//! ```
//!
//! ## Architecture
//!
//! - **[`pattern`]** - Segment model and the template compiler
//! - **[`router`]** - Path matcher, priority-ordered route table and the
//!   copy-on-write [`SharedRouter`](router::SharedRouter)
//! - **[`dispatcher`]** - Handler invocation, not-found fallback, panic isolation
//! - **[`middleware`]** - Before/after hooks (tracing, metrics)
//! - **[`config`]** - Route manifests (TOML / YAML / JSON) bound to named handlers
//! - **[`hot_reload`]** - Manifest watcher that swaps the table on change
//! - **[`logging`]** - `tracing-subscriber` initialisation
//! - **[`runtime_config`]** - Environment-driven runtime knobs
//! - **[`cli`]** - The `segrouter` manifest tool
//!
//! ## Route Priority
//!
//! Patterns are ordered by comparing, position by position, the kind of each
//! segment: a literal beats a parameter, a parameter beats a greedy `path`
//! tail. The first position where two patterns differ decides. Patterns that
//! rank equally keep registration order. Type coercion happens during matching,
//! so `/post/{id<int>}` rejects `/post/hello` and the walk continues to the
//! next candidate.
//!
//! ## Logging
//!
//! All modules log through `tracing` with structured fields (`method`, `path`,
//! `route_name`, `duration_us`, ...). Call
//! [`logging::init_logging_with_config`] once at start-up to see them.

pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod hot_reload;
pub mod ids;
pub mod logging;
pub mod middleware;
pub mod pattern;
pub mod router;
pub mod runtime_config;

pub use config::{HandlerRegistry, RouteEntry, RouteManifest};
pub use dispatcher::{DispatchOutcome, Dispatcher, Handler, HandlerRequest, HandlerResponse};
pub use error::CompileError;
pub use pattern::{CompiledPattern, ParamKind, Segment};
pub use router::{MatchResult, ParamValue, Params, Router, SharedRouter};
