//! # Pattern Module
//!
//! The pattern module turns route templates into typed segment lists that the
//! [`router`](crate::router) can match without touching the template text again.
//!
//! ## Template syntax
//!
//! | Component          | Segment                                   |
//! |--------------------|-------------------------------------------|
//! | `posts`            | `Static { value: "posts" }`               |
//! | `{slug}`           | `Param { kind: String }`                  |
//! | `{id<int>}`        | `Param { kind: Int }`                     |
//! | `{ratio<float>}`   | `Param { kind: Float }`                   |
//! | `{token<uuid>}`    | `Param { kind: Uuid }`                    |
//! | `{rest<path>}`     | `Param { kind: Path, greedy: true }`      |
//!
//! Leading, trailing and doubled slashes are ignored, so `/`, `` and `//` all
//! compile to the empty pattern, which only matches the root path.
//!
//! ## Example
//!
//! ```rust
//! use segrouter::pattern::{CompiledPattern, ParamKind, Segment};
//!
//! let pattern = CompiledPattern::compile("/user/{id<int>}/posts/{slug}").unwrap();
//! assert_eq!(pattern.segments().len(), 4);
//! assert!(matches!(
//!     &pattern.segments()[1],
//!     Segment::Param { kind: ParamKind::Int, .. }
//! ));
//!
//! // A greedy tail must come last
//! assert!(CompiledPattern::compile("/files/{path<path>}/metadata").is_err());
//! ```
//!
//! Errors are reported as [`CompileError`](crate::error::CompileError) at
//! registration time and never surface while requests are being matched.

mod compile;
mod types;

pub use compile::{CompiledPattern, PriorityKey};
pub use types::{ParamKind, Segment};
