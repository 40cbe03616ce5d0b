//! The state adapter.
//!
//! Maps between the wire representation shared with the optimizer backend
//! and the richer in-memory state the evaluator works on. Decoding lifts the
//! numeric translation onto a fresh tape and derives every dependent piece
//! (varying map, original-translation snapshot, pending paths, RNG stream);
//! encoding projects handles back to numbers and strips the derived pieces.

use glyph_autodiff::{Tape, Var};
use glyph_foundation::{Path, RngStream, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ast::{StyleFn, TagExpr};
use crate::error::{EvalError, Result};
use crate::shapes::Shape;
use crate::translation::Translation;

/// Varying path → differentiable leaf, for one pass.
pub type VaryingMap = IndexMap<Path, Var>;

/// Build a map from aligned path and value arrays.
///
/// Empty inputs produce an empty map; a length skew is fatal.
pub fn gen_path_map<T: Clone>(paths: &[Path], values: &[T]) -> Result<IndexMap<Path, T>> {
    if paths.len() != values.len() {
        return Err(EvalError::VaryingMismatch {
            paths: paths.len(),
            values: values.len(),
        });
    }
    Ok(paths.iter().cloned().zip(values.iter().cloned()).collect())
}

/// Write every varying as a cached float at its path.
pub fn insert_varyings(
    trans: &mut Translation<Var>,
    varying_map: &VaryingMap,
    tape: &Tape,
) -> Result<()> {
    for (path, var) in varying_map {
        trans.insert_expr(path, TagExpr::Done(Value::Float(*var)), tape)?;
    }
    Ok(())
}

/// The gradient side channel consumed by the reserved `derivative`
/// computations, keyed by the JSON serialization of each varying path.
#[derive(Debug, Clone, Default)]
pub struct DebugInfo {
    pub gradient: IndexMap<String, f64>,
    pub gradient_preconditioned: IndexMap<String, f64>,
}

impl DebugInfo {
    /// The canonical debug-map key for a path.
    pub fn path_key(path: &Path) -> String {
        serde_json::to_string(path).unwrap_or_else(|_| path.to_string())
    }

    /// Zip the most recent gradient vectors against the varying paths.
    pub fn from_params(params: &Params, varying_paths: &[Path]) -> Self {
        let keyed = |grad: &[f64]| {
            varying_paths
                .iter()
                .zip(grad)
                .map(|(p, g)| (Self::path_key(p), *g))
                .collect()
        };
        DebugInfo {
            gradient: keyed(&params.last_gradient),
            gradient_preconditioned: keyed(&params.last_gradient_preconditioned),
        }
    }
}

/// The optimizer-owned parameter bundle carried through evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Params {
    #[serde(rename = "objFns")]
    pub obj_fns: Vec<StyleFn>,
    #[serde(rename = "constrFns")]
    pub constr_fns: Vec<StyleFn>,
    #[serde(rename = "lastGradient")]
    pub last_gradient: Vec<f64>,
    #[serde(rename = "lastGradientPreconditioned")]
    pub last_gradient_preconditioned: Vec<f64>,
}

/// The in-memory diagram state.
#[derive(Debug)]
pub struct State {
    pub seed: String,
    pub rng: RngStream,
    pub varying_paths: Vec<Path>,
    pub varying_values: Vec<f64>,
    pub shape_paths: Vec<Path>,
    pub shape_ordering: Vec<String>,
    pub translation: Translation<Var>,
    /// Immutable snapshot of the translation as decoded; never written to.
    pub original_translation: Translation<Var>,
    pub shapes: Vec<Shape>,
    pub params: Params,
    pub varying_map: VaryingMap,
    pub pending_paths: Vec<Path>,
    pub tape: Tape,
}

/// The wire representation shared with the optimizer backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireState {
    pub rng: String,
    #[serde(rename = "varyingState")]
    pub varying_state: Vec<f64>,
    #[serde(rename = "varyingPaths")]
    pub varying_paths: Vec<Path>,
    #[serde(rename = "shapePaths")]
    pub shape_paths: Vec<Path>,
    #[serde(rename = "shapeOrdering")]
    pub shape_ordering: Vec<String>,
    #[serde(rename = "pendingPaths", default)]
    pub pending_paths: Vec<Path>,
    pub transr: Translation<f64>,
    pub paramsr: Params,
    #[serde(default)]
    pub shapesr: Vec<Shape>,
}

/// Decode a wire state into the in-memory form.
pub fn decode_state(wire: WireState) -> Result<State> {
    let mut tape = Tape::new();
    let translation = wire.transr.map_scalars(&mut |x| tape.constant(x));
    let leaves: Vec<Var> = wire.varying_state.iter().map(|v| tape.input(*v)).collect();
    let varying_map = gen_path_map(&wire.varying_paths, &leaves)?;
    let pending_paths = translation.pending_paths();
    let original_translation = translation.clone();
    let rng = RngStream::from_label(&wire.rng);

    debug!(
        varyings = wire.varying_state.len(),
        shapes = wire.shape_paths.len(),
        pending = pending_paths.len(),
        "decoded state"
    );

    Ok(State {
        seed: wire.rng,
        rng,
        varying_paths: wire.varying_paths,
        varying_values: wire.varying_state,
        shape_paths: wire.shape_paths,
        shape_ordering: wire.shape_ordering,
        translation,
        original_translation,
        shapes: wire.shapesr,
        params: wire.paramsr,
        varying_map,
        pending_paths,
        tape,
    })
}

/// Encode the in-memory state back to the wire form, projecting handles to
/// numbers and dropping derived fields.
pub fn encode_state(state: &State) -> WireState {
    let tape = &state.tape;
    WireState {
        rng: state.seed.clone(),
        varying_state: state.varying_values.clone(),
        varying_paths: state.varying_paths.clone(),
        shape_paths: state.shape_paths.clone(),
        shape_ordering: state.shape_ordering.clone(),
        pending_paths: state.pending_paths.clone(),
        transr: state
            .translation
            .clone()
            .map_scalars(&mut |v| tape.value_of(v)),
        paramsr: state.params.clone(),
        shapesr: state.shapes.clone(),
    }
}
