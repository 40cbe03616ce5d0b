//! Evaluator errors.
//!
//! Every error is fatal to the current pass; nothing is caught internally,
//! and a failed pass leaves the caller's inputs unchanged.

use glyph_foundation::Path;
use thiserror::Error;

/// Evaluator result type.
pub type Result<T> = std::result::Result<T, EvalError>;

/// Errors surfaced by evaluation, path resolution, and the state adapter.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("unresolved path: {0}")]
    UnresolvedPath(Path),

    #[error("type mismatch: {op} is not defined for {lhs} and {rhs}")]
    TypeMismatch {
        op: &'static str,
        lhs: &'static str,
        rhs: &'static str,
    },

    #[error("invalid operand: {op} is not defined for {operand}")]
    InvalidOperand {
        op: &'static str,
        operand: &'static str,
    },

    #[error("index {index} out of bounds for length {len} at {path}")]
    IndexOutOfBounds {
        path: Path,
        index: i64,
        len: usize,
    },

    #[error("unimplemented: {0}")]
    Unimplemented(&'static str),

    #[error("encountered an unsubstituted varying value; varyings must be inserted before evaluation")]
    UnsubstitutedVarying,

    #[error("unsupported list element of type {0}")]
    UnsupportedListElement(&'static str),

    #[error("declared shape {0:?} has no evaluated shape")]
    ShapeOrderingUnmatched(String),

    #[error("expression at {0} evaluated to a shape where a value was required")]
    UnexpectedGpi(Path),

    #[error("path {0} does not resolve to a shape")]
    NotAShape(Path),

    #[error("aligned path and value arrays disagree in length: {paths} paths, {values} values")]
    VaryingMismatch { paths: usize, values: usize },

    #[error("unknown computation function: {0}")]
    UnknownFunction(String),

    #[error("{name} expects {expected} argument(s), got {got}")]
    BadArity {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("{name} expects {expected}, got {got}")]
    BadArgument {
        name: String,
        expected: &'static str,
        got: &'static str,
    },
}
