use std::fmt;

/// Route template compile error
///
/// Returned by [`CompiledPattern::compile`](crate::pattern::CompiledPattern::compile)
/// and by every registration call when a template is malformed. These errors
/// are raised at registration time; a route that fails to compile is never
/// added to the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// A component contains `{` or `}` but is not a single `{name}` or
    /// `{name<type>}` token
    MalformedSegment {
        /// The offending path component
        segment: String,
    },
    /// `{}` or `{<int>}`: the parameter has no name
    EmptyParamName {
        /// The offending path component
        segment: String,
    },
    /// The parameter name is not an identifier (`[A-Za-z_][A-Za-z0-9_]*`)
    InvalidParamName {
        /// The rejected name
        name: String,
    },
    /// The type token between `<` and `>` is not one of
    /// `str`, `int`, `float`, `uuid`, `path`
    UnknownParamType {
        /// The parameter carrying the token
        name: String,
        /// The unrecognized token
        token: String,
    },
    /// A `path` parameter appears anywhere but the last component
    GreedyNotLast {
        /// The greedy parameter name
        name: String,
    },
    /// The same parameter name is captured twice by one template
    DuplicateParam {
        /// The repeated name
        name: String,
    },
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::MalformedSegment { segment } => {
                write!(
                    f,
                    "malformed route segment '{}': expected a literal, {{name}} or {{name<type>}}",
                    segment
                )
            }
            CompileError::EmptyParamName { segment } => {
                write!(f, "parameter in segment '{}' has an empty name", segment)
            }
            CompileError::InvalidParamName { name } => {
                write!(
                    f,
                    "invalid parameter name '{}': names must match [A-Za-z_][A-Za-z0-9_]*",
                    name
                )
            }
            CompileError::UnknownParamType { name, token } => {
                write!(
                    f,
                    "unknown type '{}' for parameter '{}': expected one of str, int, float, uuid, path",
                    token, name
                )
            }
            CompileError::GreedyNotLast { name } => {
                write!(
                    f,
                    "path parameter '{}' must be the last segment of the route",
                    name
                )
            }
            CompileError::DuplicateParam { name } => {
                write!(f, "parameter '{}' is captured more than once", name)
            }
        }
    }
}

impl std::error::Error for CompileError {}
