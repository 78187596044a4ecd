//! Template → segment compiler.
//!
//! Runs once per route at registration time. Everything that can be rejected
//! about a template is rejected here, so the matcher only ever sees valid
//! segment lists.

use once_cell::sync::Lazy;
use regex::Regex;
use smallvec::SmallVec;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use super::types::{ParamKind, Segment};
use crate::error::CompileError;

/// `{name}` or `{name<type>}`; name and type are validated separately so the
/// error can say which part is wrong.
#[allow(clippy::expect_used)]
static PARAM_TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\{([^{}<>]*)(?:<([^{}<>]*)>)?\}$").expect("param token regex should be valid")
});

#[allow(clippy::expect_used)]
static PARAM_NAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("param name regex should be valid")
});

/// Inline capacity of a priority key; deeper routes spill to the heap.
const INLINE_KEY_LEN: usize = 8;

/// Per-position ranks used to order routes, compared lexicographically
pub type PriorityKey = SmallVec<[u8; INLINE_KEY_LEN]>;

/// An ordered, immutable list of [`Segment`]s compiled from a route template
///
/// Equality is structural: two patterns are equal when their segment lists
/// are equal, regardless of how the source template was spelled
/// (`/a/b/` and `/a//b` compile to the same pattern).
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    source: Arc<str>,
    segments: Vec<Segment>,
}

impl CompiledPattern {
    /// Compile a route template
    ///
    /// # Errors
    ///
    /// Returns a [`CompileError`] for malformed parameter syntax, an unknown
    /// type token, an invalid or repeated parameter name, or a `path`
    /// parameter that is not the last component.
    pub fn compile(template: &str) -> Result<Self, CompileError> {
        let components: Vec<&str> = template
            .trim_matches('/')
            .split('/')
            .filter(|c| !c.is_empty())
            .collect();

        let mut segments = Vec::with_capacity(components.len());
        let mut seen: HashSet<&str> = HashSet::new();
        let last = components.len().saturating_sub(1);

        for (idx, component) in components.iter().enumerate() {
            if !component.contains(['{', '}']) {
                segments.push(Segment::Static {
                    value: (*component).to_string(),
                });
                continue;
            }

            let caps = PARAM_TOKEN_REGEX.captures(component).ok_or_else(|| {
                CompileError::MalformedSegment {
                    segment: (*component).to_string(),
                }
            })?;

            let name = caps.get(1).map_or("", |m| m.as_str());
            if name.is_empty() {
                return Err(CompileError::EmptyParamName {
                    segment: (*component).to_string(),
                });
            }
            if !PARAM_NAME_REGEX.is_match(name) {
                return Err(CompileError::InvalidParamName {
                    name: name.to_string(),
                });
            }

            let kind = match caps.get(2) {
                None => ParamKind::String,
                Some(token) => token.as_str().parse::<ParamKind>().map_err(|()| {
                    CompileError::UnknownParamType {
                        name: name.to_string(),
                        token: token.as_str().to_string(),
                    }
                })?,
            };

            let greedy = kind == ParamKind::Path;
            if greedy && idx != last {
                return Err(CompileError::GreedyNotLast {
                    name: name.to_string(),
                });
            }

            if !seen.insert(name) {
                return Err(CompileError::DuplicateParam {
                    name: name.to_string(),
                });
            }

            segments.push(Segment::Param {
                name: Arc::from(name),
                kind,
                greedy,
            });
        }

        Ok(Self {
            source: Arc::from(template),
            segments,
        })
    }

    /// The template text this pattern was compiled from
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The compiled segments, in path order
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Whether the last segment is a greedy `path` parameter
    #[inline]
    #[must_use]
    pub fn has_greedy_tail(&self) -> bool {
        self.segments.last().is_some_and(Segment::is_greedy)
    }

    /// Number of segments that consume exactly one component
    #[inline]
    #[must_use]
    pub fn fixed_len(&self) -> usize {
        if self.has_greedy_tail() {
            self.segments.len() - 1
        } else {
            self.segments.len()
        }
    }

    /// Names of the captured parameters, in path order
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param { name, .. } => Some(name.as_ref()),
            Segment::Static { .. } => None,
        })
    }

    /// Derive the priority key: one rank per position
    ///
    /// Keys compare lexicographically, so a static segment outranks a
    /// parameter at the first position where two patterns differ.
    #[must_use]
    pub fn priority_key(&self) -> PriorityKey {
        self.segments.iter().map(Segment::rank).collect()
    }
}

impl PartialEq for CompiledPattern {
    fn eq(&self, other: &Self) -> bool {
        self.segments == other.segments
    }
}

impl Eq for CompiledPattern {}

impl fmt::Display for CompiledPattern {
    /// Canonical template: `/` for the root, `/a/{id<int>}` otherwise
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}
