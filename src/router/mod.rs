//! # Router Module
//!
//! The router module matches incoming request paths against a priority-ordered
//! table of compiled patterns and extracts typed path parameters.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Keeping registered routes ordered so specific routes win over generic ones
//! - Percent-decoding and splitting request paths once per lookup
//! - Matching each candidate pattern and coercing parameters to their types
//! - Sharing the table with request threads while a single writer updates it
//!
//! ## Architecture
//!
//! The router uses a two-phase approach:
//!
//! 1. **Registration**: templates like `/user/{id<int>}` are compiled by the
//!    [`pattern`](crate::pattern) module and inserted at the position given by
//!    their priority key (literal before parameter before greedy tail, compared
//!    position by position).
//!
//! 2. **Matching**: for each request the table is walked in priority order; the
//!    first route whose method accepts the request and whose pattern matches is
//!    returned with its parameters. A type coercion failure is a plain no-match,
//!    so `/post/{id<int>}` and `/post/{slug}` can coexist.
//!
//! ## Example
//!
//! ```rust
//! use http::Method;
//! use segrouter::router::Router;
//!
//! let mut router = Router::new();
//! router.register(Method::GET, "/post/{slug}", "show_post").unwrap();
//! router.register(Method::GET, "/post/popular", "popular_posts").unwrap();
//!
//! // The literal route wins although it was registered second
//! let m = router.route(&Method::GET, "/post/popular").unwrap();
//! assert_eq!(*m.route.handler(), "popular_posts");
//!
//! let m = router.route(&Method::GET, "/post/hello%20world").unwrap();
//! assert_eq!(m.params.get_str("slug"), Some("hello world"));
//! ```

mod core;
mod matcher;
mod params;
mod shared;

pub use self::core::{Route, RouteMatch, Router, DEFAULT_SLOW_MATCH};
pub use matcher::{match_decoded, match_path, DecodedPath, MatchResult};
pub use params::{ParamValue, Params, MAX_INLINE_PARAMS};
pub use shared::SharedRouter;
