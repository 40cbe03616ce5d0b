//! The value algebra.
//!
//! A [`Value`] is the result of evaluating a style expression. It is generic
//! over the scalar type `T`: the evaluator instantiates it with autodiff
//! handles, while the display layer consumes the `f64` projection. Keeping
//! scalars opaque here is what makes a translation clone cheap — clones copy
//! handles, never computation-graph nodes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// An evaluated style value, parameterized by the scalar representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value<T> {
    /// A single scalar.
    Float(T),
    /// A machine integer; preserved until promotion is forced.
    Int(i64),
    /// A boolean literal.
    Bool(bool),
    /// A string literal.
    Str(String),
    /// An ordered sequence of scalars.
    Vector(Vec<T>),
    /// An ordered sequence of equal-length vectors. Producers uphold the
    /// equal-length invariant; the type does not.
    Matrix(Vec<Vec<T>>),
    /// A pair of scalars.
    Tuple(T, T),
    /// A homogeneous list of scalars.
    List(Vec<T>),
    /// A list whose elements are themselves vectors (not a matrix).
    LList(Vec<Vec<T>>),
    /// A color payload; passes through evaluation opaquely.
    Color(Color),
    /// A style string payload (e.g. a stroke style); passes through opaquely.
    Style(String),
}

impl<T> Value<T> {
    /// Stable name of this variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Float(_) => "float",
            Value::Int(_) => "int",
            Value::Bool(_) => "bool",
            Value::Str(_) => "string",
            Value::Vector(_) => "vector",
            Value::Matrix(_) => "matrix",
            Value::Tuple(..) => "tuple",
            Value::List(_) => "list",
            Value::LList(_) => "list-of-vectors",
            Value::Color(_) => "color",
            Value::Style(_) => "style",
        }
    }

    /// Attempt to get the value as a scalar.
    pub fn as_float(&self) -> Option<&T> {
        match self {
            Value::Float(v) => Some(v),
            _ => None,
        }
    }

    /// Attempt to get the value as an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Attempt to get the value as a vector of scalars.
    pub fn as_vector(&self) -> Option<&[T]> {
        match self {
            Value::Vector(v) => Some(v),
            _ => None,
        }
    }

    /// Rewrite every scalar through `f`, leaving non-scalar payloads
    /// (integers, strings, colors) untouched.
    ///
    /// This single operation is both the lift (plain numbers onto a
    /// differentiable tape) and the projection (handles back to numbers).
    pub fn map_scalars<U>(self, f: &mut impl FnMut(T) -> U) -> Value<U> {
        match self {
            Value::Float(v) => Value::Float(f(v)),
            Value::Int(v) => Value::Int(v),
            Value::Bool(v) => Value::Bool(v),
            Value::Str(v) => Value::Str(v),
            Value::Vector(vs) => Value::Vector(vs.into_iter().map(&mut *f).collect()),
            Value::Matrix(rows) => {
                Value::Matrix(rows.into_iter().map(|r| r.into_iter().map(&mut *f).collect()).collect())
            }
            Value::Tuple(a, b) => {
                let a = f(a);
                let b = f(b);
                Value::Tuple(a, b)
            }
            Value::List(vs) => Value::List(vs.into_iter().map(&mut *f).collect()),
            Value::LList(rows) => {
                Value::LList(rows.into_iter().map(|r| r.into_iter().map(&mut *f).collect()).collect())
            }
            Value::Color(c) => Value::Color(c),
            Value::Style(s) => Value::Style(s),
        }
    }
}

/// A color in either RGBA or HSVA form, components in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Color {
    Rgba([f64; 4]),
    Hsva([f64; 4]),
}

/// A graphical primitive instance: a shape type together with its evaluated
/// property values. Property order is the declaration order from upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gpi<T> {
    #[serde(rename = "shapeType")]
    pub shape_type: String,
    pub props: IndexMap<String, Value<T>>,
}

impl<T> Gpi<T> {
    /// Rewrite every scalar in every property through `f`.
    pub fn map_scalars<U>(self, f: &mut impl FnMut(T) -> U) -> Gpi<U> {
        Gpi {
            shape_type: self.shape_type,
            props: self.props.into_iter().map(|(k, v)| (k, v.map_scalars(f))).collect(),
        }
    }
}

/// The result of evaluating one expression: either a plain value or a whole
/// shape. Shape properties are always values, never nested shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArgVal<T> {
    Val(Value<T>),
    Gpi(Gpi<T>),
}

impl<T> ArgVal<T> {
    /// Stable name of this variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            ArgVal::Val(v) => v.kind(),
            ArgVal::Gpi(_) => "shape",
        }
    }
}
