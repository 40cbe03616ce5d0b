//! The expression evaluator and path resolver.
//!
//! Evaluation walks the expression tree recursively, producing values in the
//! differentiable domain. Memoization happens at path granularity only: when
//! a path resolves through an unevaluated cell, the result is written back
//! into the pass-private translation so later lookups are cache hits. Pure
//! sub-expressions that do not route through a path are re-evaluated.
//!
//! Sub-expressions, computation arguments, and shape properties evaluate
//! left-to-right / in declaration order; because evaluation mutates the
//! translation cache, this order is observable and deliberate.

use glyph_autodiff::{Tape, Var};
use glyph_foundation::{ArgVal, Gpi, Path, Value};
use indexmap::IndexMap;

use crate::ast::{AnnoFloat, Expr, FnKind, StyleFn, TagExpr};
use crate::error::{EvalError, Result};
use crate::functions::{self, Arity, CompImpl};
use crate::operations::{eval_binop, eval_unop};
use crate::state::{DebugInfo, VaryingMap};
use crate::translation::{Found, Translation};

/// Everything one evaluation needs: the pass-private translation, the tape
/// nodes are recorded on, the optional varying override map, and the debug
/// gradient channel.
pub struct EvalContext<'a> {
    pub trans: &'a mut Translation<Var>,
    pub tape: &'a mut Tape,
    pub varying: Option<&'a VaryingMap>,
    pub debug: &'a DebugInfo,
}

/// Evaluate one style expression to a value or shape.
pub fn eval_expr(expr: &Expr, ctx: &mut EvalContext) -> Result<ArgVal<Var>> {
    match expr {
        Expr::IntLit(i) => Ok(ArgVal::Val(Value::Int(*i))),
        Expr::StrLit(s) => Ok(ArgVal::Val(Value::Str(s.clone()))),
        Expr::BoolLit(b) => Ok(ArgVal::Val(Value::Bool(*b))),
        Expr::AFloat(AnnoFloat::Fix(x)) => {
            Ok(ArgVal::Val(Value::Float(ctx.tape.constant(*x))))
        }
        Expr::AFloat(AnnoFloat::Vary) => Err(EvalError::UnsubstitutedVarying),
        Expr::UOp { op, arg } => {
            let operand = operand_value(eval_expr(arg, ctx)?, "unary operation")?;
            Ok(ArgVal::Val(eval_unop(*op, operand, ctx.tape)?))
        }
        Expr::BinOp { op, left, right } => {
            let lhs = operand_value(eval_expr(left, ctx)?, "binary operation")?;
            let rhs = operand_value(eval_expr(right, ctx)?, "binary operation")?;
            Ok(ArgVal::Val(eval_binop(*op, lhs, rhs, ctx.tape)?))
        }
        Expr::Tuple(a, b) => {
            let a = operand_value(eval_expr(a, ctx)?, "tuple")?;
            let b = operand_value(eval_expr(b, ctx)?, "tuple")?;
            let a = coerce_scalar(a, "tuple element", ctx.tape)?;
            let b = coerce_scalar(b, "tuple element", ctx.tape)?;
            Ok(ArgVal::Val(Value::Tuple(a, b)))
        }
        Expr::List(es) => eval_list(es, ctx),
        Expr::Vector(es) => eval_vector(es, ctx),
        Expr::VectorAccess(path, index) => eval_vector_access(path, index, ctx),
        Expr::MatrixAccess(path, i, j) => eval_matrix_access(path, i, j, ctx),
        Expr::ListAccess(..) => Err(EvalError::Unimplemented("list access")),
        Expr::Matrix(_) => Err(EvalError::Unimplemented("matrix literals")),
        Expr::Path(p) => resolve_path(p, ctx),
        Expr::CompApp { name, args } => eval_comp_app(name, args, ctx),
    }
}

fn eval_list(es: &[Expr], ctx: &mut EvalContext) -> Result<ArgVal<Var>> {
    let mut values = Vec::with_capacity(es.len());
    for e in es {
        values.push(operand_value(eval_expr(e, ctx)?, "list element")?);
    }
    match values.first() {
        None => Ok(ArgVal::Val(Value::List(Vec::new()))),
        Some(Value::Float(_)) => {
            let scalars = values
                .into_iter()
                .map(|v| coerce_scalar(v, "list element", ctx.tape))
                .collect::<Result<Vec<_>>>()?;
            Ok(ArgVal::Val(Value::List(scalars)))
        }
        Some(Value::Vector(_)) => {
            let rows = values
                .into_iter()
                .map(|v| match v {
                    Value::Vector(row) => Ok(row),
                    other => Err(EvalError::TypeMismatch {
                        op: "list element",
                        lhs: other.kind(),
                        rhs: "vector",
                    }),
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(ArgVal::Val(Value::LList(rows)))
        }
        Some(other) => Err(EvalError::UnsupportedListElement(other.kind())),
    }
}

fn eval_vector(es: &[Expr], ctx: &mut EvalContext) -> Result<ArgVal<Var>> {
    let mut values = Vec::with_capacity(es.len());
    for e in es {
        values.push(operand_value(eval_expr(e, ctx)?, "vector element")?);
    }
    // A vector of vectors denotes a matrix.
    if matches!(values.first(), Some(Value::Vector(_))) {
        let rows = values
            .into_iter()
            .map(|v| match v {
                Value::Vector(row) => Ok(row),
                other => Err(EvalError::TypeMismatch {
                    op: "matrix row",
                    lhs: other.kind(),
                    rhs: "vector",
                }),
            })
            .collect::<Result<Vec<_>>>()?;
        return Ok(ArgVal::Val(Value::Matrix(rows)));
    }
    let scalars = values
        .into_iter()
        .map(|v| coerce_scalar(v, "vector element", ctx.tape))
        .collect::<Result<Vec<_>>>()?;
    Ok(ArgVal::Val(Value::Vector(scalars)))
}

fn eval_vector_access(path: &Path, index: &Expr, ctx: &mut EvalContext) -> Result<ArgVal<Var>> {
    let target = operand_value(resolve_path(path, ctx)?, "indexed access")?;
    let i = eval_index(index, ctx)?;
    match target {
        Value::LList(rows) => {
            let i = check_bounds(path, i, rows.len())?;
            Ok(ArgVal::Val(Value::Vector(rows[i].clone())))
        }
        Value::Vector(elems) => {
            let i = check_bounds(path, i, elems.len())?;
            Ok(ArgVal::Val(Value::Float(elems[i])))
        }
        other => Err(EvalError::TypeMismatch {
            op: "vector access",
            lhs: other.kind(),
            rhs: "vector",
        }),
    }
}

fn eval_matrix_access(
    path: &Path,
    i: &Expr,
    j: &Expr,
    ctx: &mut EvalContext,
) -> Result<ArgVal<Var>> {
    let target = operand_value(resolve_path(path, ctx)?, "indexed access")?;
    let rows = match target {
        Value::Matrix(rows) => rows,
        other => {
            return Err(EvalError::TypeMismatch {
                op: "matrix access",
                lhs: other.kind(),
                rhs: "matrix",
            })
        }
    };
    let i = eval_index(i, ctx)?;
    let j = eval_index(j, ctx)?;
    let i = check_bounds(path, i, rows.len())?;
    let j = check_bounds(path, j, rows[i].len())?;
    Ok(ArgVal::Val(Value::Float(rows[i][j])))
}

fn eval_comp_app(name: &str, args: &[Expr], ctx: &mut EvalContext) -> Result<ArgVal<Var>> {
    let desc = functions::get(name).ok_or_else(|| EvalError::UnknownFunction(name.to_string()))?;
    if let Arity::Fixed(expected) = desc.arity {
        if args.len() != expected {
            return Err(EvalError::BadArity {
                name: name.to_string(),
                expected,
                got: args.len(),
            });
        }
    }
    match desc.implementation {
        CompImpl::GradientPath(f) => {
            // The single argument names the varying component whose gradient
            // is requested; accessors are rewritten into canonical indexed
            // paths before keying the debug map.
            let path = accessor_to_path(name, &args[0], ctx)?;
            let key = DebugInfo::path_key(&path);
            f(ctx.tape, ctx.debug, &key).map(ArgVal::Val)
        }
        CompImpl::Values(f) => {
            let mut evaled = Vec::with_capacity(args.len());
            for a in args {
                evaled.push(eval_expr(a, ctx)?);
            }
            f(ctx.tape, &evaled).map(ArgVal::Val)
        }
    }
}

fn accessor_to_path(name: &str, arg: &Expr, ctx: &mut EvalContext) -> Result<Path> {
    match arg {
        Expr::Path(p) => Ok(p.clone()),
        Expr::VectorAccess(p, index) => {
            let i = eval_accessor_index(name, index, ctx)?;
            Ok(Path::access(p.clone(), vec![i]))
        }
        Expr::MatrixAccess(p, i, j) => {
            let i = eval_accessor_index(name, i, ctx)?;
            let j = eval_accessor_index(name, j, ctx)?;
            Ok(Path::access(p.clone(), vec![i, j]))
        }
        other => Err(EvalError::BadArgument {
            name: name.to_string(),
            expected: "a path or indexed path argument",
            got: other.kind(),
        }),
    }
}

fn eval_accessor_index(name: &str, e: &Expr, ctx: &mut EvalContext) -> Result<usize> {
    let i = eval_index(e, ctx)?;
    usize::try_from(i).map_err(|_| EvalError::BadArgument {
        name: name.to_string(),
        expected: "a non-negative index",
        got: "negative int",
    })
}

/// Resolve a path to its evaluated value or shape.
///
/// The varying override map is consulted before the translation; resolved
/// expression cells are written back as `Done` so the second lookup within a
/// pass is a cache hit.
pub fn resolve_path(path: &Path, ctx: &mut EvalContext) -> Result<ArgVal<Var>> {
    if matches!(path, Path::Access { .. }) {
        return Err(EvalError::Unimplemented("indexed paths in the resolver"));
    }
    if let Some(map) = ctx.varying {
        if let Some(var) = map.get(path) {
            return Ok(ArgVal::Val(Value::Float(*var)));
        }
    }

    // Clone the found cell out so the translation can be mutated while the
    // cell's expression evaluates. For a shape only the property names are
    // cloned: each property re-reads its live cell, so re-entrant references
    // between properties observe earlier `Done` writes.
    enum Cell {
        Tag(TagExpr<Var>),
        Gpi(String, Vec<String>),
    }
    let cell = match ctx.trans.find_expr(path)? {
        Found::Expr(te) => Cell::Tag(te.clone()),
        Found::Gpi { shape_type, props } => {
            Cell::Gpi(shape_type.to_string(), props.keys().cloned().collect())
        }
    };

    match cell {
        Cell::Gpi(shape_type, prop_names) => {
            let (name, field) = match path {
                Path::Field { name, field } => (name.as_str(), field.as_str()),
                // Property and access paths never yield a raw shape entry.
                _ => return Err(EvalError::UnresolvedPath(path.clone())),
            };
            let mut evaluated = IndexMap::with_capacity(prop_names.len());
            for prop in &prop_names {
                let prop_path = Path::property(name, field, prop.clone());
                let tag = match ctx.trans.find_expr(&prop_path)? {
                    Found::Expr(te) => te.clone(),
                    Found::Gpi { .. } => return Err(EvalError::UnexpectedGpi(prop_path)),
                };
                let v = eval_property(name, field, prop, &tag, ctx)?;
                evaluated.insert(prop.clone(), v);
            }
            Ok(ArgVal::Gpi(Gpi {
                shape_type,
                props: evaluated,
            }))
        }
        Cell::Tag(TagExpr::OptEval(e)) => match eval_expr(&e, ctx)? {
            ArgVal::Val(v) => {
                ctx.trans
                    .insert_expr(path, TagExpr::Done(v.clone()), ctx.tape)?;
                Ok(ArgVal::Val(v))
            }
            ArgVal::Gpi(_) => Err(EvalError::UnexpectedGpi(path.clone())),
        },
        Cell::Tag(TagExpr::Done(v)) | Cell::Tag(TagExpr::Pending(v)) => Ok(ArgVal::Val(v)),
    }
}

/// Evaluate one shape property, memoizing expression cells and letting fresh
/// varying overrides shadow cached values.
fn eval_property(
    name: &str,
    field: &str,
    prop: &str,
    tag: &TagExpr<Var>,
    ctx: &mut EvalContext,
) -> Result<Value<Var>> {
    let prop_path = Path::property(name, field, prop);
    match tag {
        TagExpr::OptEval(e) => match eval_expr(e, ctx)? {
            ArgVal::Val(v) => {
                ctx.trans
                    .insert_expr(&prop_path, TagExpr::Done(v.clone()), ctx.tape)?;
                Ok(v)
            }
            ArgVal::Gpi(_) => Err(EvalError::UnexpectedGpi(prop_path)),
        },
        TagExpr::Done(v) | TagExpr::Pending(v) => {
            if let Some(map) = ctx.varying {
                if let Some(var) = map.get(&prop_path) {
                    return Ok(Value::Float(*var));
                }
            }
            Ok(v.clone())
        }
    }
}

fn operand_value(arg: ArgVal<Var>, op: &'static str) -> Result<Value<Var>> {
    match arg {
        ArgVal::Val(v) => Ok(v),
        ArgVal::Gpi(_) => Err(EvalError::InvalidOperand {
            op,
            operand: "shape",
        }),
    }
}

fn coerce_scalar(v: Value<Var>, op: &'static str, tape: &mut Tape) -> Result<Var> {
    match v {
        Value::Float(v) => Ok(v),
        Value::Int(i) => Ok(tape.constant(i as f64)),
        other => Err(EvalError::TypeMismatch {
            op,
            lhs: other.kind(),
            rhs: "float",
        }),
    }
}

fn eval_index(e: &Expr, ctx: &mut EvalContext) -> Result<i64> {
    match operand_value(eval_expr(e, ctx)?, "index")? {
        Value::Int(i) => Ok(i),
        other => Err(EvalError::TypeMismatch {
            op: "index",
            lhs: other.kind(),
            rhs: "int",
        }),
    }
}

fn check_bounds(path: &Path, index: i64, len: usize) -> Result<usize> {
    match usize::try_from(index) {
        Ok(i) if i < len => Ok(i),
        _ => Err(EvalError::IndexOutOfBounds {
            path: path.clone(),
            index,
            len,
        }),
    }
}

/// One objective or constraint with its fully evaluated argument tuple.
#[derive(Debug, Clone, PartialEq)]
pub struct FnEvaled {
    pub name: String,
    pub kind: FnKind,
    pub args: Vec<ArgVal<Var>>,
}

/// Evaluate the argument lists of objectives and constraints against a
/// private clone of the translation. Varyings are not inserted here — the
/// override map shadows the translation instead — and the debug gradient
/// channel is empty.
pub fn eval_fns(
    fns: &[StyleFn],
    trans: &Translation<Var>,
    varying_map: &VaryingMap,
    tape: &mut Tape,
) -> Result<Vec<FnEvaled>> {
    let mut pass_trans = trans.clone();
    let debug = DebugInfo::default();
    let mut ctx = EvalContext {
        trans: &mut pass_trans,
        tape,
        varying: Some(varying_map),
        debug: &debug,
    };
    let mut out = Vec::with_capacity(fns.len());
    for f in fns {
        let mut args = Vec::with_capacity(f.args.len());
        for a in &f.args {
            args.push(eval_expr(a, &mut ctx)?);
        }
        out.push(FnEvaled {
            name: f.name.clone(),
            kind: f.kind,
            args,
        });
    }
    Ok(out)
}
