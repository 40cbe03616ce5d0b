//! Shape materialization.
//!
//! A shape is the non-differentiable projection of an evaluated GPI: the
//! display layer consumes plain numbers. One call to [`eval_shapes`] is a
//! complete pass — it owns a private clone of the translation, so the
//! caller's state never observes intermediate cache writes.

use glyph_autodiff::Var;
use glyph_foundation::{ArgVal, Path, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EvalError, Result};
use crate::evaluator::{resolve_path, EvalContext};
use crate::state::{gen_path_map, insert_varyings, DebugInfo, State};

/// A fully evaluated shape, ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    #[serde(rename = "shapeType")]
    pub shape_type: String,
    pub properties: IndexMap<String, Value<f64>>,
}

impl Shape {
    /// The shape's `name` property, when it is a string.
    pub fn name(&self) -> Option<&str> {
        match self.properties.get("name") {
            Some(Value::Str(s)) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// Materialize the shape at `path`: resolve its GPI entry (evaluating and
/// memoizing every property) and project the result to plain numbers.
pub fn eval_shape(path: &Path, ctx: &mut EvalContext) -> Result<Shape> {
    match resolve_path(path, ctx)? {
        ArgVal::Gpi(gpi) => {
            let tape = &*ctx.tape;
            let gpi = gpi.map_scalars(&mut |v| tape.value_of(v));
            Ok(Shape {
                shape_type: gpi.shape_type,
                properties: gpi.props,
            })
        }
        ArgVal::Val(_) => Err(EvalError::NotAShape(path.clone())),
    }
}

/// Reorder evaluated shapes to match the declared ordering, by name.
pub fn sort_shapes(mut shapes: Vec<Shape>, ordering: &[String]) -> Result<Vec<Shape>> {
    let mut sorted = Vec::with_capacity(ordering.len());
    for want in ordering {
        let pos = shapes
            .iter()
            .position(|s| s.name() == Some(want.as_str()))
            .ok_or_else(|| EvalError::ShapeOrderingUnmatched(want.clone()))?;
        sorted.push(shapes.remove(pos));
    }
    Ok(sorted)
}

/// One complete evaluation pass.
///
/// Lifts each varying value as a differentiable leaf, inserts them into a
/// private clone of the translation, evaluates every shape path, and sorts
/// the results by the declared ordering. The returned state is the input
/// state with freshened `shapes` and `varying_map`; the caller-visible
/// translation is untouched.
pub fn eval_shapes(state: State) -> Result<State> {
    let State {
        seed,
        rng,
        varying_paths,
        varying_values,
        shape_paths,
        shape_ordering,
        translation,
        original_translation,
        shapes: _,
        params,
        varying_map: _,
        pending_paths,
        mut tape,
    } = state;

    debug!(
        shapes = shape_paths.len(),
        varyings = varying_values.len(),
        "starting shape evaluation pass"
    );

    let leaves: Vec<Var> = varying_values.iter().map(|v| tape.input(*v)).collect();
    let varying_map = gen_path_map(&varying_paths, &leaves)?;

    let mut pass_trans = translation.clone();
    insert_varyings(&mut pass_trans, &varying_map, &tape)?;

    let debug_info = DebugInfo::from_params(&params, &varying_paths);
    let mut ctx = EvalContext {
        trans: &mut pass_trans,
        tape: &mut tape,
        varying: Some(&varying_map),
        debug: &debug_info,
    };

    let mut shapes = Vec::with_capacity(shape_paths.len());
    for path in &shape_paths {
        shapes.push(eval_shape(path, &mut ctx)?);
    }
    let shapes = sort_shapes(shapes, &shape_ordering)?;

    Ok(State {
        seed,
        rng,
        varying_paths,
        varying_values,
        shape_paths,
        shape_ordering,
        translation,
        original_translation,
        shapes,
        params,
        varying_map,
        pending_paths,
        tape,
    })
}
