//! Glyph Eval
//!
//! The diagram expression evaluator. One evaluation pass takes a translation
//! (the symbolic program produced by the upstream style compiler) plus the
//! optimizer's varying values, and produces fully evaluated shapes for
//! rendering together with the differentiable arguments of objective and
//! constraint functions.
//!
//! The pass is single-threaded and synchronous. It deep-clones the
//! translation at entry, memoizes every resolved path as a cached value in
//! the clone, and discards the clone at return, so callers never observe
//! intermediate writes.

pub mod ast;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod operations;
pub mod shapes;
pub mod state;
pub mod translation;

pub use ast::{AnnoFloat, BinaryOp, Expr, FnKind, StyleFn, TagExpr, UnaryOp};
pub use error::{EvalError, Result};
pub use evaluator::{eval_expr, eval_fns, resolve_path, EvalContext, FnEvaled};
pub use shapes::{eval_shape, eval_shapes, sort_shapes, Shape};
pub use state::{
    decode_state, encode_state, gen_path_map, insert_varyings, DebugInfo, Params, State,
    VaryingMap, WireState,
};
pub use translation::{FieldEntry, Found, PropertyDict, Translation};
