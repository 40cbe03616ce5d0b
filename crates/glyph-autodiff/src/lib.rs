//! Glyph Autodiff
//!
//! The differentiable-scalar library backing diagram evaluation. Scalars are
//! opaque [`Var`] handles — stable indices into a [`Tape`] arena — so cloning
//! a structure full of scalars copies indices, never graph nodes. Forward
//! values are computed eagerly as nodes are created; gradients are produced
//! on demand by a single reverse sweep.

mod tape;
mod vector;

pub use tape::{Tape, Var};
pub use vector::{vadd, vdiv, vmul, vneg, vsub};
