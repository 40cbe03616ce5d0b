//! The style expression language.
//!
//! Expressions arrive from the upstream style compiler inside the
//! translation and are never constructed by the evaluator itself, with one
//! exception: indexed varying writes rewrite single vector elements (see the
//! translation store). All sums are closed; new variants are a compile-time
//! event, not a runtime one.

use glyph_foundation::{Path, Value};
use serde::{Deserialize, Serialize};

/// A style expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    IntLit(i64),
    StrLit(String),
    BoolLit(bool),
    /// A float literal, either fixed or still owned by the optimizer.
    AFloat(AnnoFloat),
    UOp {
        op: UnaryOp,
        arg: Box<Expr>,
    },
    BinOp {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Tuple(Box<Expr>, Box<Expr>),
    List(Vec<Expr>),
    /// A vector literal; a vector of vectors denotes a matrix.
    Vector(Vec<Expr>),
    /// A general matrix literal. Upstream never emits these; evaluation
    /// always fails.
    Matrix(Vec<Expr>),
    /// Indexed access into the vector stored at a path.
    VectorAccess(Path, Box<Expr>),
    /// Two-index access into the matrix stored at a path.
    MatrixAccess(Path, Box<Expr>, Box<Expr>),
    /// Indexed access into a list. Upstream never emits these; evaluation
    /// always fails.
    ListAccess(Path, usize),
    /// A reference to another translation cell.
    Path(Path),
    /// Application of a named computation function.
    CompApp {
        name: String,
        args: Vec<Expr>,
    },
}

impl Expr {
    /// Stable name of this variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Expr::IntLit(_) => "int literal",
            Expr::StrLit(_) => "string literal",
            Expr::BoolLit(_) => "bool literal",
            Expr::AFloat(_) => "float literal",
            Expr::UOp { .. } => "unary operation",
            Expr::BinOp { .. } => "binary operation",
            Expr::Tuple(..) => "tuple",
            Expr::List(_) => "list",
            Expr::Vector(_) => "vector",
            Expr::Matrix(_) => "matrix",
            Expr::VectorAccess(..) => "vector access",
            Expr::MatrixAccess(..) => "matrix access",
            Expr::ListAccess(..) => "list access",
            Expr::Path(_) => "path",
            Expr::CompApp { .. } => "computation application",
        }
    }
}

/// A float literal: fixed by the compiler, or varying until the optimizer
/// substitutes a value for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnnoFloat {
    Fix(f64),
    Vary,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    BPlus,
    BMinus,
    Multiply,
    Divide,
    Exp,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::BPlus => "+",
            BinaryOp::BMinus => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Exp => "^",
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    UPlus,
    UMinus,
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::UPlus => "unary +",
            UnaryOp::UMinus => "unary -",
        }
    }
}

/// A translation cell: an expression awaiting evaluation, a cached result,
/// or a value awaiting an asynchronous side channel (treated exactly like a
/// cached result by the evaluator).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TagExpr<T> {
    OptEval(Expr),
    Done(Value<T>),
    Pending(Value<T>),
}

impl<T> TagExpr<T> {
    /// Stable name of this variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            TagExpr::OptEval(_) => "unevaluated expression",
            TagExpr::Done(v) | TagExpr::Pending(v) => v.kind(),
        }
    }
}

/// Whether a style function acts as an objective or a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FnKind {
    Objective,
    Constraint,
}

/// A named objective or constraint together with its argument expressions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleFn {
    pub name: String,
    pub args: Vec<Expr>,
    pub kind: FnKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expr_round_trips_through_json() {
        let e = Expr::BinOp {
            op: BinaryOp::BPlus,
            left: Box::new(Expr::IntLit(2)),
            right: Box::new(Expr::AFloat(AnnoFloat::Fix(1.5))),
        };
        let json = serde_json::to_string(&e).unwrap();
        let back: Expr = serde_json::from_str(&json).unwrap();
        assert_eq!(back, e);
    }

    #[test]
    fn tag_expr_kind_reports_inner_value() {
        let done: TagExpr<f64> = TagExpr::Done(Value::Int(1));
        assert_eq!(done.kind(), "int");
        let pending: TagExpr<f64> = TagExpr::Pending(Value::Vector(vec![1.0]));
        assert_eq!(pending.kind(), "vector");
        let opt: TagExpr<f64> = TagExpr::OptEval(Expr::IntLit(1));
        assert_eq!(opt.kind(), "unevaluated expression");
    }
}
