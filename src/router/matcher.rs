//! Path matcher: one compiled pattern against one decoded request path.
//!
//! A request path is split and percent-decoded once ([`DecodedPath`]) and then
//! matched against each candidate pattern in a single left-to-right pass.
//! Type coercion failures are part of the matching signal: they yield
//! [`MatchResult::NoMatch`] so the caller simply tries the next route.

use smallvec::SmallVec;
use std::borrow::Cow;
use std::sync::Arc;
use uuid::Uuid;

use super::params::{ParamValue, Params};
use crate::pattern::{CompiledPattern, ParamKind, Segment};

/// Path depth kept on the stack before spilling to the heap
const INLINE_COMPONENTS: usize = 16;

/// Length of the hyphenated 8-4-4-4-12 UUID form
const HYPHENATED_UUID_LEN: usize = 36;

/// Outcome of matching one pattern against one path
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    /// Component count, a literal, or a type coercion did not fit
    NoMatch,
    /// Every segment matched; captured parameters in pattern order
    Matched(Params),
}

impl MatchResult {
    #[inline]
    #[must_use]
    pub fn is_match(&self) -> bool {
        matches!(self, MatchResult::Matched(_))
    }

    #[must_use]
    pub fn into_params(self) -> Option<Params> {
        match self {
            MatchResult::Matched(params) => Some(params),
            MatchResult::NoMatch => None,
        }
    }
}

/// A request path split on `/` with each component percent-decoded
///
/// Query strings and fragments are cut off first; empty components (root,
/// doubled or trailing slashes) are dropped the same way the compiler drops
/// them from templates.
#[derive(Debug, Clone)]
pub struct DecodedPath<'a> {
    components: SmallVec<[Cow<'a, str>; INLINE_COMPONENTS]>,
}

impl<'a> DecodedPath<'a> {
    /// Split and decode a raw request path
    ///
    /// Returns `None` when a component does not decode to valid UTF-8; such a
    /// path cannot match any route.
    #[must_use]
    pub fn parse(raw: &'a str) -> Option<Self> {
        let path = raw.split(['?', '#']).next().unwrap_or_default();
        let mut components = SmallVec::new();
        for component in path.split('/').filter(|c| !c.is_empty()) {
            components.push(urlencoding::decode(component).ok()?);
        }
        Some(Self { components })
    }

    /// Decoded components, in path order
    #[must_use]
    pub fn components(&self) -> &[Cow<'a, str>] {
        &self.components
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// Match a compiled pattern against an already decoded path
#[must_use]
pub fn match_decoded(pattern: &CompiledPattern, path: &DecodedPath<'_>) -> MatchResult {
    let components = path.components();
    let fixed = pattern.fixed_len();

    if pattern.has_greedy_tail() {
        if components.len() < fixed {
            return MatchResult::NoMatch;
        }
    } else if components.len() != fixed {
        return MatchResult::NoMatch;
    }

    let mut params = Params::with_capacity(pattern.segments().len());

    for (idx, segment) in pattern.segments().iter().enumerate() {
        match segment {
            Segment::Static { value } => {
                if components[idx] != value.as_str() {
                    return MatchResult::NoMatch;
                }
            }
            Segment::Param {
                name, greedy: true, ..
            } => {
                params.push(Arc::clone(name), ParamValue::Str(components[idx..].join("/")));
            }
            Segment::Param { name, kind, .. } => match coerce(*kind, &components[idx]) {
                Some(value) => params.push(Arc::clone(name), value),
                None => return MatchResult::NoMatch,
            },
        }
    }

    MatchResult::Matched(params)
}

/// Split, decode and match a raw request path in one call
#[must_use]
pub fn match_path(pattern: &CompiledPattern, path: &str) -> MatchResult {
    match DecodedPath::parse(path) {
        Some(decoded) => match_decoded(pattern, &decoded),
        None => MatchResult::NoMatch,
    }
}

/// Coerce one decoded component to the parameter's type
fn coerce(kind: ParamKind, component: &str) -> Option<ParamValue> {
    match kind {
        ParamKind::String | ParamKind::Path => Some(ParamValue::Str(component.to_string())),
        ParamKind::Int => component.parse::<i64>().ok().map(ParamValue::Int),
        ParamKind::Float => component
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(ParamValue::Float),
        ParamKind::Uuid => {
            if component.len() != HYPHENATED_UUID_LEN {
                return None;
            }
            Uuid::try_parse(component).ok().map(ParamValue::Uuid)
        }
    }
}
