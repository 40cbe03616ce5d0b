//! Unary and binary operation semantics.
//!
//! Dispatch is by typed operand pair. Integer-to-float promotion happens
//! before dispatch when exactly one operand is an integer; integer division
//! always promotes to a true float division. Combinations outside the table
//! are type mismatches, not best-effort coercions.

use glyph_autodiff::{vadd, vdiv, vmul, vneg, vsub, Tape, Var};
use glyph_foundation::Value;

use crate::ast::{BinaryOp, UnaryOp};
use crate::error::{EvalError, Result};

/// Evaluate a binary operation over two evaluated operands.
pub fn eval_binop(
    op: BinaryOp,
    lhs: Value<Var>,
    rhs: Value<Var>,
    tape: &mut Tape,
) -> Result<Value<Var>> {
    match (lhs, rhs) {
        (Value::Float(a), Value::Float(b)) => float_float(op, a, b, tape),
        (Value::Float(a), Value::Int(b)) => {
            let b = tape.constant(b as f64);
            float_float(op, a, b, tape)
        }
        (Value::Int(a), Value::Float(b)) => {
            let a = tape.constant(a as f64);
            float_float(op, a, b, tape)
        }
        (Value::Int(a), Value::Int(b)) => int_int(op, a, b, tape),
        (Value::Float(a), Value::Vector(v)) => match op {
            BinaryOp::Multiply => Ok(Value::Vector(vmul(tape, a, &v))),
            _ => Err(mismatch(op, "float", "vector")),
        },
        (Value::Int(a), Value::Vector(v)) => {
            let a = tape.constant(a as f64);
            eval_binop(op, Value::Float(a), Value::Vector(v), tape)
        }
        (Value::Vector(v), Value::Float(b)) => match op {
            BinaryOp::Divide => Ok(Value::Vector(vdiv(tape, &v, b))),
            _ => Err(mismatch(op, "vector", "float")),
        },
        (Value::Vector(v), Value::Int(b)) => {
            let b = tape.constant(b as f64);
            eval_binop(op, Value::Vector(v), Value::Float(b), tape)
        }
        (Value::Vector(a), Value::Vector(b)) => {
            if a.len() != b.len() {
                return Err(mismatch(op, "vector", "vector of different length"));
            }
            match op {
                BinaryOp::BPlus => Ok(Value::Vector(vadd(tape, &a, &b))),
                BinaryOp::BMinus => Ok(Value::Vector(vsub(tape, &a, &b))),
                _ => Err(mismatch(op, "vector", "vector")),
            }
        }
        (l, r) => Err(mismatch(op, l.kind(), r.kind())),
    }
}

fn float_float(op: BinaryOp, a: Var, b: Var, tape: &mut Tape) -> Result<Value<Var>> {
    let v = match op {
        BinaryOp::BPlus => tape.add(a, b),
        BinaryOp::BMinus => tape.sub(a, b),
        BinaryOp::Multiply => tape.mul(a, b),
        BinaryOp::Divide => tape.div(a, b),
        BinaryOp::Exp => return Err(EvalError::Unimplemented("exponentiation on floats")),
    };
    Ok(Value::Float(v))
}

fn int_int(op: BinaryOp, a: i64, b: i64, tape: &mut Tape) -> Result<Value<Var>> {
    match op {
        BinaryOp::BPlus => Ok(Value::Int(a + b)),
        BinaryOp::BMinus => Ok(Value::Int(a - b)),
        BinaryOp::Multiply => Ok(Value::Int(a * b)),
        // Integer division is true division and stays differentiable.
        BinaryOp::Divide => Ok(Value::Float(tape.constant(a as f64 / b as f64))),
        BinaryOp::Exp => {
            let e = u32::try_from(b).map_err(|_| EvalError::InvalidOperand {
                op: "^",
                operand: "negative exponent",
            })?;
            let v = a.checked_pow(e).ok_or(EvalError::InvalidOperand {
                op: "^",
                operand: "overflowing exponent",
            })?;
            Ok(Value::Int(v))
        }
    }
}

fn mismatch(op: BinaryOp, lhs: &'static str, rhs: &'static str) -> EvalError {
    EvalError::TypeMismatch {
        op: op.symbol(),
        lhs,
        rhs,
    }
}

/// Evaluate a unary operation over an evaluated operand.
pub fn eval_unop(op: UnaryOp, operand: Value<Var>, tape: &mut Tape) -> Result<Value<Var>> {
    match op {
        UnaryOp::UPlus => Err(EvalError::InvalidOperand {
            op: op.symbol(),
            operand: operand.kind(),
        }),
        UnaryOp::UMinus => match operand {
            Value::Float(v) => Ok(Value::Float(tape.neg(v))),
            Value::Int(i) => Ok(Value::Int(-i)),
            Value::Vector(v) => Ok(Value::Vector(vneg(tape, &v))),
            other => Err(EvalError::InvalidOperand {
                op: op.symbol(),
                operand: other.kind(),
            }),
        },
    }
}
