//! Glyph Foundation
//!
//! Core foundational types for the glyph diagram engine: the value algebra
//! shared by the evaluator and the display layer, typed translation paths,
//! stable hashing, and deterministic pseudo-random streams.

pub mod path;
pub mod rng;
pub mod stable_hash;
pub mod value;

pub use path::Path;
pub use rng::RngStream;
pub use stable_hash::{fnv1a64, fnv1a64_str};
pub use value::{ArgVal, Color, Gpi, Value};
