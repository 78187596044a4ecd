use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Type of a named route parameter
///
/// Selected by the `<type>` suffix of a template parameter; `{name}` without a
/// suffix is [`ParamKind::String`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// Any single component, captured verbatim (`str`)
    String,
    /// Base-10 signed 64-bit integer (`int`)
    Int,
    /// Finite floating-point literal (`float`)
    Float,
    /// Hyphenated 8-4-4-4-12 UUID (`uuid`)
    Uuid,
    /// Rest of the path joined with `/` (`path`); always greedy
    Path,
}

impl ParamKind {
    /// The template token for this kind
    #[must_use]
    pub fn token(self) -> &'static str {
        match self {
            ParamKind::String => "str",
            ParamKind::Int => "int",
            ParamKind::Float => "float",
            ParamKind::Uuid => "uuid",
            ParamKind::Path => "path",
        }
    }
}

impl FromStr for ParamKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "str" => Ok(ParamKind::String),
            "int" => Ok(ParamKind::Int),
            "float" => Ok(ParamKind::Float),
            "uuid" => Ok(ParamKind::Uuid),
            "path" => Ok(ParamKind::Path),
            _ => Err(()),
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// One `/`-delimited unit of a compiled route pattern
///
/// Parameter names use `Arc<str>` because every successful match hands the
/// name to the request's parameter list; cloning the `Arc` is an atomic
/// increment rather than a string copy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Literal component, matched verbatim and case-sensitively
    Static {
        /// The literal text
        value: String,
    },
    /// Named capture
    Param {
        /// Parameter name, used as the key in the matched params
        name: Arc<str>,
        /// Coercion applied to the captured component
        kind: ParamKind,
        /// `true` only for [`ParamKind::Path`]; consumes every remaining component
        greedy: bool,
    },
}

impl Segment {
    /// Per-position priority weight, lower sorts first
    ///
    /// Static = 0, single-component parameter = 1, greedy tail = 2.
    #[inline]
    #[must_use]
    pub fn rank(&self) -> u8 {
        match self {
            Segment::Static { .. } => 0,
            Segment::Param { greedy: false, .. } => 1,
            Segment::Param { greedy: true, .. } => 2,
        }
    }

    /// Whether this segment consumes the rest of the path
    #[inline]
    #[must_use]
    pub fn is_greedy(&self) -> bool {
        matches!(self, Segment::Param { greedy: true, .. })
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Static { value } => f.write_str(value),
            Segment::Param {
                name,
                kind: ParamKind::String,
                ..
            } => write!(f, "{{{name}}}"),
            Segment::Param { name, kind, .. } => write!(f, "{{{name}<{kind}>}}"),
        }
    }
}
