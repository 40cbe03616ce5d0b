//! Typed handles into the translation.
//!
//! A [`Path`] addresses a cell of the translation: a field of a substance, a
//! property of a shape, or an indexed element inside a vector or matrix
//! stored at another path. Paths are struct keys with value equality; the
//! canonical string form produced by `Display` exists for diagnostics and
//! the wire boundary, never for map keys.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A typed address into the translation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Path {
    /// A field of a substance: `A.x`.
    Field { name: String, field: String },
    /// A property of a shape held in a field: `A.icon.center`.
    Property {
        name: String,
        field: String,
        property: String,
    },
    /// An indexed element inside the vector (one index) or matrix (two
    /// indices) stored at `base`.
    Access { base: Box<Path>, indices: Vec<usize> },
}

impl Path {
    pub fn field(name: impl Into<String>, field: impl Into<String>) -> Self {
        Path::Field {
            name: name.into(),
            field: field.into(),
        }
    }

    pub fn property(
        name: impl Into<String>,
        field: impl Into<String>,
        property: impl Into<String>,
    ) -> Self {
        Path::Property {
            name: name.into(),
            field: field.into(),
            property: property.into(),
        }
    }

    pub fn access(base: Path, indices: Vec<usize>) -> Self {
        Path::Access {
            base: Box::new(base),
            indices,
        }
    }

    /// The substance name this path roots at.
    pub fn name(&self) -> &str {
        match self {
            Path::Field { name, .. } | Path::Property { name, .. } => name,
            Path::Access { base, .. } => base.name(),
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Path::Field { name, field } => write!(f, "{}.{}", name, field),
            Path::Property {
                name,
                field,
                property,
            } => write!(f, "{}.{}.{}", name, field, property),
            Path::Access { base, indices } => {
                write!(f, "{}", base)?;
                for i in indices {
                    write!(f, "[{}]", i)?;
                }
                Ok(())
            }
        }
    }
}
