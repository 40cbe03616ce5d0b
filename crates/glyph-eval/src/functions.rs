//! The computation dictionary.
//!
//! Named style functions callable from `CompApp` expressions. The dictionary
//! is a fixed descriptor table; each entry carries its name, a signature
//! string for diagnostics, an arity, and one of two implementation flavors:
//!
//! - **Values** — receives the unwrapped evaluated arguments.
//! - **GradientPath** — the two reserved names `derivative` and
//!   `derivativePreconditioned`, which receive the debug gradient channel
//!   and a serialized path key instead of values. This is the sole channel
//!   through which gradient components surface at evaluation time.

use glyph_autodiff::{vadd, vdiv, vmul, Tape, Var};
use glyph_foundation::{ArgVal, Color, Value};
use tracing::warn;

use crate::error::{EvalError, Result};
use crate::state::DebugInfo;

/// An ordinary computation: unwrapped arguments in, value out.
pub type ValueFn = fn(&mut Tape, &[ArgVal<Var>]) -> Result<Value<Var>>;

/// A gradient lookup: debug channel and serialized path key in, value out.
pub type GradientFn = fn(&mut Tape, &DebugInfo, &str) -> Result<Value<Var>>;

/// The implementation of a dictionary entry.
#[derive(Clone, Copy)]
pub enum CompImpl {
    Values(ValueFn),
    GradientPath(GradientFn),
}

/// Argument count expected by an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Fixed(usize),
    Variadic,
}

/// A registered computation function.
pub struct CompFnDescriptor {
    pub name: &'static str,
    pub signature: &'static str,
    pub arity: Arity,
    pub implementation: CompImpl,
}

/// The fixed dictionary, in lookup order.
pub static COMP_FNS: &[CompFnDescriptor] = &[
    CompFnDescriptor {
        name: "derivative",
        signature: "derivative(path) -> float",
        arity: Arity::Fixed(1),
        implementation: CompImpl::GradientPath(derivative),
    },
    CompFnDescriptor {
        name: "derivativePreconditioned",
        signature: "derivativePreconditioned(path) -> float",
        arity: Arity::Fixed(1),
        implementation: CompImpl::GradientPath(derivative_preconditioned),
    },
    CompFnDescriptor {
        name: "average",
        signature: "average(x, ...) -> float",
        arity: Arity::Variadic,
        implementation: CompImpl::Values(average),
    },
    CompFnDescriptor {
        name: "norm",
        signature: "norm(v) -> float",
        arity: Arity::Fixed(1),
        implementation: CompImpl::Values(norm),
    },
    CompFnDescriptor {
        name: "unit",
        signature: "unit(v) -> vector",
        arity: Arity::Fixed(1),
        implementation: CompImpl::Values(unit),
    },
    CompFnDescriptor {
        name: "midpoint",
        signature: "midpoint(a, b) -> vector",
        arity: Arity::Fixed(2),
        implementation: CompImpl::Values(midpoint),
    },
    CompFnDescriptor {
        name: "max",
        signature: "max(a, b) -> float",
        arity: Arity::Fixed(2),
        implementation: CompImpl::Values(max),
    },
    CompFnDescriptor {
        name: "min",
        signature: "min(a, b) -> float",
        arity: Arity::Fixed(2),
        implementation: CompImpl::Values(min),
    },
    CompFnDescriptor {
        name: "rgba",
        signature: "rgba(r, g, b, a) -> color",
        arity: Arity::Fixed(4),
        implementation: CompImpl::Values(rgba),
    },
];

/// Look up a dictionary entry by name.
pub fn get(name: &str) -> Option<&'static CompFnDescriptor> {
    COMP_FNS.iter().find(|d| d.name == name)
}

fn derivative(tape: &mut Tape, debug: &DebugInfo, key: &str) -> Result<Value<Var>> {
    gradient_component(tape, &debug.gradient, key, "derivative")
}

fn derivative_preconditioned(tape: &mut Tape, debug: &DebugInfo, key: &str) -> Result<Value<Var>> {
    gradient_component(
        tape,
        &debug.gradient_preconditioned,
        key,
        "derivativePreconditioned",
    )
}

fn gradient_component(
    tape: &mut Tape,
    map: &indexmap::IndexMap<String, f64>,
    key: &str,
    function: &str,
) -> Result<Value<Var>> {
    let g = match map.get(key) {
        Some(g) => *g,
        None => {
            warn!(%key, function, "no gradient entry for path; returning zero");
            0.0
        }
    };
    Ok(Value::Float(tape.constant(g)))
}

fn average(tape: &mut Tape, args: &[ArgVal<Var>]) -> Result<Value<Var>> {
    if args.is_empty() {
        return Err(EvalError::BadArity {
            name: "average".to_string(),
            expected: 1,
            got: 0,
        });
    }
    let mut sum = tape.constant(0.0);
    for i in 0..args.len() {
        let v = scalar_arg("average", args, i, tape)?;
        sum = tape.add(sum, v);
    }
    let n = tape.constant(args.len() as f64);
    Ok(Value::Float(tape.div(sum, n)))
}

fn norm(tape: &mut Tape, args: &[ArgVal<Var>]) -> Result<Value<Var>> {
    let v = vector_arg("norm", args, 0)?;
    Ok(Value::Float(vector_norm(tape, &v)))
}

fn unit(tape: &mut Tape, args: &[ArgVal<Var>]) -> Result<Value<Var>> {
    let v = vector_arg("unit", args, 0)?;
    let n = vector_norm(tape, &v);
    Ok(Value::Vector(vdiv(tape, &v, n)))
}

fn midpoint(tape: &mut Tape, args: &[ArgVal<Var>]) -> Result<Value<Var>> {
    let a = vector_arg("midpoint", args, 0)?;
    let b = vector_arg("midpoint", args, 1)?;
    if a.len() != b.len() {
        return Err(EvalError::TypeMismatch {
            op: "midpoint",
            lhs: "vector",
            rhs: "vector of different length",
        });
    }
    let sum = vadd(tape, &a, &b);
    let half = tape.constant(0.5);
    Ok(Value::Vector(vmul(tape, half, &sum)))
}

fn max(tape: &mut Tape, args: &[ArgVal<Var>]) -> Result<Value<Var>> {
    let a = scalar_arg("max", args, 0, tape)?;
    let b = scalar_arg("max", args, 1, tape)?;
    Ok(Value::Float(tape.max(a, b)))
}

fn min(tape: &mut Tape, args: &[ArgVal<Var>]) -> Result<Value<Var>> {
    let a = scalar_arg("min", args, 0, tape)?;
    let b = scalar_arg("min", args, 1, tape)?;
    Ok(Value::Float(tape.min(a, b)))
}

fn rgba(tape: &mut Tape, args: &[ArgVal<Var>]) -> Result<Value<Var>> {
    let mut channels = [0.0; 4];
    for (i, channel) in channels.iter_mut().enumerate() {
        let v = scalar_arg("rgba", args, i, tape)?;
        *channel = tape.value_of(v);
    }
    Ok(Value::Color(Color::Rgba(channels)))
}

fn vector_norm(tape: &mut Tape, v: &[Var]) -> Var {
    let mut sum = tape.constant(0.0);
    for x in v {
        let s = tape.squared(*x);
        sum = tape.add(sum, s);
    }
    tape.sqrt(sum)
}

fn scalar_arg(
    name: &'static str,
    args: &[ArgVal<Var>],
    i: usize,
    tape: &mut Tape,
) -> Result<Var> {
    match &args[i] {
        ArgVal::Val(Value::Float(v)) => Ok(*v),
        ArgVal::Val(Value::Int(n)) => Ok(tape.constant(*n as f64)),
        other => Err(EvalError::BadArgument {
            name: name.to_string(),
            expected: "a scalar argument",
            got: other.kind(),
        }),
    }
}

fn vector_arg(name: &'static str, args: &[ArgVal<Var>], i: usize) -> Result<Vec<Var>> {
    match &args[i] {
        ArgVal::Val(Value::Vector(v)) => Ok(v.clone()),
        other => Err(EvalError::BadArgument {
            name: name.to_string(),
            expected: "a vector argument",
            got: other.kind(),
        }),
    }
}
