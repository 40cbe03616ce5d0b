//! Vector operations over differentiable scalars.
//!
//! All operations take and return same-length sequences of [`Var`] handles;
//! callers uphold the length contract.

use crate::tape::{Tape, Var};

/// Elementwise vector addition.
pub fn vadd(tape: &mut Tape, a: &[Var], b: &[Var]) -> Vec<Var> {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(x, y)| tape.add(*x, *y)).collect()
}

/// Elementwise vector subtraction.
pub fn vsub(tape: &mut Tape, a: &[Var], b: &[Var]) -> Vec<Var> {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(x, y)| tape.sub(*x, *y)).collect()
}

/// Scale a vector by a scalar.
pub fn vmul(tape: &mut Tape, s: Var, v: &[Var]) -> Vec<Var> {
    v.iter().map(|x| tape.mul(s, *x)).collect()
}

/// Divide a vector by a scalar.
pub fn vdiv(tape: &mut Tape, v: &[Var], s: Var) -> Vec<Var> {
    v.iter().map(|x| tape.div(*x, s)).collect()
}

/// Negate a vector pointwise.
pub fn vneg(tape: &mut Tape, v: &[Var]) -> Vec<Var> {
    v.iter().map(|x| tape.neg(*x)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lift(tape: &mut Tape, xs: &[f64]) -> Vec<Var> {
        xs.iter().map(|x| tape.input(*x)).collect()
    }

    fn values(tape: &Tape, vs: &[Var]) -> Vec<f64> {
        vs.iter().map(|v| tape.value_of(*v)).collect()
    }

    #[test]
    fn elementwise_add_sub() {
        let mut tape = Tape::new();
        let a = lift(&mut tape, &[1.0, 2.0, 3.0]);
        let b = lift(&mut tape, &[10.0, 20.0, 30.0]);
        let sum = vadd(&mut tape, &a, &b);
        let diff = vsub(&mut tape, &b, &a);
        assert_eq!(values(&tape, &sum), vec![11.0, 22.0, 33.0]);
        assert_eq!(values(&tape, &diff), vec![9.0, 18.0, 27.0]);
    }

    #[test]
    fn scale_and_divide() {
        let mut tape = Tape::new();
        let v = lift(&mut tape, &[2.0, 4.0]);
        let s = tape.constant(3.0);
        let scaled = vmul(&mut tape, s, &v);
        assert_eq!(values(&tape, &scaled), vec![6.0, 12.0]);

        let halved = vdiv(&mut tape, &v, s);
        assert_eq!(values(&tape, &halved), vec![2.0 / 3.0, 4.0 / 3.0]);
    }

    #[test]
    fn pointwise_negation() {
        let mut tape = Tape::new();
        let v = lift(&mut tape, &[1.0, -2.0]);
        let n = vneg(&mut tape, &v);
        assert_eq!(values(&tape, &n), vec![-1.0, 2.0]);
    }

    #[test]
    fn gradients_flow_through_vector_ops() {
        let mut tape = Tape::new();
        let a = lift(&mut tape, &[1.0, 2.0]);
        let b = lift(&mut tape, &[3.0, 4.0]);
        let sum = vadd(&mut tape, &a, &b);
        // Reduce to a scalar so there is a single root.
        let total = tape.add(sum[0], sum[1]);
        let g = tape.gradient_wrt(total, &[a[0], a[1], b[0], b[1]]);
        assert_eq!(g, vec![1.0, 1.0, 1.0, 1.0]);
    }
}
