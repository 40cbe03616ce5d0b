//! The translation store.
//!
//! A translation is the symbolic environment produced by the upstream style
//! compiler: substance name → field name → entry, where an entry is either a
//! plain tagged expression or a shape with its own property dictionary. The
//! store trusts upstream to hand it an acyclic, well-typed structure.
//!
//! Reads and writes are path-addressed. Writing `Done` at a path is monotone
//! within a pass: once a result is cached, later reads return it.

use glyph_autodiff::{Tape, Var};
use glyph_foundation::{Path, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ast::{AnnoFloat, Expr, TagExpr};
use crate::error::{EvalError, Result};

/// Property name → tagged expression, in declaration order.
pub type PropertyDict<T> = IndexMap<String, TagExpr<T>>;

/// A field entry: a plain expression cell or a shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldEntry<T> {
    FExpr(TagExpr<T>),
    FGpi(String, PropertyDict<T>),
}

/// The nested substance → field → entry mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Translation<T> {
    pub subs: IndexMap<String, IndexMap<String, FieldEntry<T>>>,
}

/// A successful `find_expr` lookup: the tagged expression at a field or
/// property, or the raw shape entry when the field holds one.
#[derive(Debug)]
pub enum Found<'a, T> {
    Expr(&'a TagExpr<T>),
    Gpi {
        shape_type: &'a str,
        props: &'a PropertyDict<T>,
    },
}

impl<T> Translation<T> {
    pub fn new() -> Self {
        Translation {
            subs: IndexMap::new(),
        }
    }

    /// Read the entry at a field or property path.
    ///
    /// Indexed access paths are not readable here; callers evaluate a vector
    /// or matrix access expression instead.
    pub fn find_expr(&self, path: &Path) -> Result<Found<'_, T>> {
        match path {
            Path::Field { name, field } => match self.field_entry(name, field) {
                Some(FieldEntry::FExpr(te)) => Ok(Found::Expr(te)),
                Some(FieldEntry::FGpi(shape_type, props)) => Ok(Found::Gpi {
                    shape_type,
                    props,
                }),
                None => Err(EvalError::UnresolvedPath(path.clone())),
            },
            Path::Property {
                name,
                field,
                property,
            } => match self.field_entry(name, field) {
                Some(FieldEntry::FGpi(_, props)) => props
                    .get(property)
                    .map(Found::Expr)
                    .ok_or_else(|| EvalError::UnresolvedPath(path.clone())),
                _ => Err(EvalError::UnresolvedPath(path.clone())),
            },
            Path::Access { .. } => Err(EvalError::Unimplemented(
                "reading an indexed path through find_expr",
            )),
        }
    }

    fn field_entry(&self, name: &str, field: &str) -> Option<&FieldEntry<T>> {
        self.subs.get(name).and_then(|fields| fields.get(field))
    }

    fn field_entry_mut(&mut self, name: &str, field: &str) -> Option<&mut FieldEntry<T>> {
        self.subs
            .get_mut(name)
            .and_then(|fields| fields.get_mut(field))
    }

    /// Paths of every `Pending` cell, in declaration order.
    pub fn pending_paths(&self) -> Vec<Path> {
        let mut out = Vec::new();
        for (name, fields) in &self.subs {
            for (field, entry) in fields {
                match entry {
                    FieldEntry::FExpr(TagExpr::Pending(_)) => {
                        out.push(Path::field(name.clone(), field.clone()));
                    }
                    FieldEntry::FGpi(_, props) => {
                        for (prop, te) in props {
                            if matches!(te, TagExpr::Pending(_)) {
                                out.push(Path::property(name.clone(), field.clone(), prop.clone()));
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
        out
    }

    /// Rewrite every scalar in every cached value through `f`, leaving
    /// unevaluated expressions untouched.
    pub fn map_scalars<U>(self, f: &mut impl FnMut(T) -> U) -> Translation<U> {
        let subs = self
            .subs
            .into_iter()
            .map(|(name, fields)| {
                let fields = fields
                    .into_iter()
                    .map(|(field, entry)| (field, entry.map_scalars(f)))
                    .collect();
                (name, fields)
            })
            .collect();
        Translation { subs }
    }
}

impl<T> FieldEntry<T> {
    pub fn map_scalars<U>(self, f: &mut impl FnMut(T) -> U) -> FieldEntry<U> {
        match self {
            FieldEntry::FExpr(te) => FieldEntry::FExpr(te.map_scalars(f)),
            FieldEntry::FGpi(shape_type, props) => FieldEntry::FGpi(
                shape_type,
                props
                    .into_iter()
                    .map(|(k, te)| (k, te.map_scalars(f)))
                    .collect(),
            ),
        }
    }
}

impl<T> TagExpr<T> {
    pub fn map_scalars<U>(self, f: &mut impl FnMut(T) -> U) -> TagExpr<U> {
        match self {
            TagExpr::OptEval(e) => TagExpr::OptEval(e),
            TagExpr::Done(v) => TagExpr::Done(v.map_scalars(f)),
            TagExpr::Pending(v) => TagExpr::Pending(v.map_scalars(f)),
        }
    }
}

impl Translation<Var> {
    /// Write `tag` at `path`, overwriting whatever was there.
    ///
    /// Field writes replace the whole entry; property writes require the
    /// field to hold a shape. An indexed write overwrites one element of the
    /// vector stored at the base path — inside a `Done` the raw handle is
    /// kept, inside an `OptEval` vector literal the scalar is re-wrapped as a
    /// fixed float literal. Two-index and nested indexed writes are not
    /// supported.
    pub fn insert_expr(&mut self, path: &Path, tag: TagExpr<Var>, tape: &Tape) -> Result<()> {
        match path {
            Path::Field { name, field } => {
                self.subs
                    .entry(name.clone())
                    .or_default()
                    .insert(field.clone(), FieldEntry::FExpr(tag));
                Ok(())
            }
            Path::Property {
                name,
                field,
                property,
            } => match self.field_entry_mut(name, field) {
                Some(FieldEntry::FGpi(_, props)) => {
                    props.insert(property.clone(), tag);
                    Ok(())
                }
                _ => Err(EvalError::UnresolvedPath(path.clone())),
            },
            Path::Access { base, indices } => self.insert_element(path, base, indices, tag, tape),
        }
    }

    fn insert_element(
        &mut self,
        path: &Path,
        base: &Path,
        indices: &[usize],
        tag: TagExpr<Var>,
        tape: &Tape,
    ) -> Result<()> {
        let &[index] = indices else {
            return Err(EvalError::Unimplemented("two-index indexed writes"));
        };
        let scalar = match tag {
            TagExpr::Done(Value::Float(v)) => v,
            other => {
                return Err(EvalError::TypeMismatch {
                    op: "indexed write",
                    lhs: other.kind(),
                    rhs: "float",
                })
            }
        };
        let cell = match base {
            Path::Field { name, field } => match self.field_entry_mut(name, field) {
                Some(FieldEntry::FExpr(te)) => te,
                Some(FieldEntry::FGpi(..)) => {
                    return Err(EvalError::UnresolvedPath(path.clone()))
                }
                None => return Err(EvalError::UnresolvedPath(path.clone())),
            },
            Path::Property {
                name,
                field,
                property,
            } => match self.field_entry_mut(name, field) {
                Some(FieldEntry::FGpi(_, props)) => props
                    .get_mut(property)
                    .ok_or_else(|| EvalError::UnresolvedPath(path.clone()))?,
                _ => return Err(EvalError::UnresolvedPath(path.clone())),
            },
            Path::Access { .. } => {
                return Err(EvalError::Unimplemented("nested indexed writes"))
            }
        };
        match cell {
            TagExpr::OptEval(Expr::Vector(elems)) => {
                if index >= elems.len() {
                    return Err(EvalError::IndexOutOfBounds {
                        path: path.clone(),
                        index: index as i64,
                        len: elems.len(),
                    });
                }
                // The typed AST cannot hold a handle, so the write projects
                // the scalar back to a number.
                elems[index] = Expr::AFloat(AnnoFloat::Fix(tape.value_of(scalar)));
                Ok(())
            }
            TagExpr::Done(Value::Vector(elems)) | TagExpr::Pending(Value::Vector(elems)) => {
                if index >= elems.len() {
                    return Err(EvalError::IndexOutOfBounds {
                        path: path.clone(),
                        index: index as i64,
                        len: elems.len(),
                    });
                }
                elems[index] = scalar;
                Ok(())
            }
            other => Err(EvalError::TypeMismatch {
                op: "indexed write",
                lhs: other.kind(),
                rhs: "vector",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_translation(tape: &mut Tape) -> Translation<Var> {
        let mut trans = Translation::new();
        let x = tape.constant(3.0);
        trans
            .insert_expr(
                &Path::field("A", "x"),
                TagExpr::Done(Value::Float(x)),
                tape,
            )
            .unwrap();
        trans
            .insert_expr(
                &Path::field("A", "v"),
                TagExpr::OptEval(Expr::Vector(vec![
                    Expr::IntLit(1),
                    Expr::IntLit(2),
                ])),
                tape,
            )
            .unwrap();
        let mut props = PropertyDict::new();
        props.insert(
            "r".to_string(),
            TagExpr::OptEval(Expr::AFloat(AnnoFloat::Fix(5.0))),
        );
        trans
            .subs
            .entry("A".to_string())
            .or_default()
            .insert("icon".to_string(), FieldEntry::FGpi("Circle".to_string(), props));
        trans
    }

    #[test]
    fn find_field_and_property() {
        let mut tape = Tape::new();
        let trans = small_translation(&mut tape);

        assert!(matches!(
            trans.find_expr(&Path::field("A", "x")),
            Ok(Found::Expr(TagExpr::Done(Value::Float(_))))
        ));
        assert!(matches!(
            trans.find_expr(&Path::field("A", "icon")),
            Ok(Found::Gpi { shape_type: "Circle", .. })
        ));
        assert!(matches!(
            trans.find_expr(&Path::property("A", "icon", "r")),
            Ok(Found::Expr(TagExpr::OptEval(_)))
        ));
    }

    #[test]
    fn missing_entries_are_unresolved() {
        let mut tape = Tape::new();
        let trans = small_translation(&mut tape);

        for path in [
            Path::field("B", "x"),
            Path::field("A", "y"),
            Path::property("A", "icon", "center"),
            Path::property("A", "x", "r"), // field is an FExpr
        ] {
            assert!(matches!(
                trans.find_expr(&path),
                Err(EvalError::UnresolvedPath(_))
            ));
        }
    }

    #[test]
    fn indexed_reads_are_rejected() {
        let mut tape = Tape::new();
        let trans = small_translation(&mut tape);
        let path = Path::access(Path::field("A", "v"), vec![0]);
        assert!(matches!(
            trans.find_expr(&path),
            Err(EvalError::Unimplemented(_))
        ));
    }

    #[test]
    fn property_write_requires_a_shape() {
        let mut tape = Tape::new();
        let mut trans = small_translation(&mut tape);
        let v = tape.constant(1.0);
        let err = trans.insert_expr(
            &Path::property("A", "x", "r"),
            TagExpr::Done(Value::Float(v)),
            &tape,
        );
        assert!(matches!(err, Err(EvalError::UnresolvedPath(_))));
    }

    #[test]
    fn indexed_write_into_expression_vector_rewrites_literal() {
        let mut tape = Tape::new();
        let mut trans = small_translation(&mut tape);
        let v = tape.input(9.0);
        trans
            .insert_expr(
                &Path::access(Path::field("A", "v"), vec![1]),
                TagExpr::Done(Value::Float(v)),
                &tape,
            )
            .unwrap();

        match trans.find_expr(&Path::field("A", "v")).unwrap() {
            Found::Expr(TagExpr::OptEval(Expr::Vector(elems))) => {
                assert_eq!(elems[0], Expr::IntLit(1));
                assert_eq!(elems[1], Expr::AFloat(AnnoFloat::Fix(9.0)));
            }
            other => panic!("unexpected entry: {:?}", other),
        }
    }

    #[test]
    fn indexed_write_into_done_vector_keeps_handle() {
        let mut tape = Tape::new();
        let mut trans = Translation::new();
        let a = tape.constant(1.0);
        let b = tape.constant(2.0);
        trans
            .insert_expr(
                &Path::field("A", "v"),
                TagExpr::Done(Value::Vector(vec![a, b])),
                &tape,
            )
            .unwrap();

        let fresh = tape.input(7.0);
        trans
            .insert_expr(
                &Path::access(Path::field("A", "v"), vec![0]),
                TagExpr::Done(Value::Float(fresh)),
                &tape,
            )
            .unwrap();

        match trans.find_expr(&Path::field("A", "v")).unwrap() {
            Found::Expr(TagExpr::Done(Value::Vector(elems))) => {
                assert_eq!(elems[0], fresh);
                assert_eq!(elems[1], b);
            }
            other => panic!("unexpected entry: {:?}", other),
        }
    }

    #[test]
    fn two_index_and_nested_writes_are_rejected() {
        let mut tape = Tape::new();
        let mut trans = small_translation(&mut tape);
        let v = tape.constant(0.0);

        let two = Path::access(Path::field("A", "v"), vec![0, 1]);
        assert!(matches!(
            trans.insert_expr(&two, TagExpr::Done(Value::Float(v)), &tape),
            Err(EvalError::Unimplemented(_))
        ));

        let nested = Path::access(Path::access(Path::field("A", "v"), vec![0]), vec![1]);
        assert!(matches!(
            trans.insert_expr(&nested, TagExpr::Done(Value::Float(v)), &tape),
            Err(EvalError::Unimplemented(_))
        ));
    }

    #[test]
    fn indexed_write_bounds_are_checked() {
        let mut tape = Tape::new();
        let mut trans = small_translation(&mut tape);
        let v = tape.constant(0.0);
        let path = Path::access(Path::field("A", "v"), vec![2]);
        assert!(matches!(
            trans.insert_expr(&path, TagExpr::Done(Value::Float(v)), &tape),
            Err(EvalError::IndexOutOfBounds { len: 2, index: 2, .. })
        ));
    }

    #[test]
    fn pending_paths_walks_fields_and_properties() {
        let mut tape = Tape::new();
        let mut trans = small_translation(&mut tape);
        let v = tape.constant(0.0);
        trans
            .insert_expr(
                &Path::field("B", "label"),
                TagExpr::Pending(Value::Float(v)),
                &tape,
            )
            .unwrap();
        if let Some(FieldEntry::FGpi(_, props)) = trans.field_entry_mut("A", "icon") {
            props.insert(
                "width".to_string(),
                TagExpr::Pending(Value::Float(v)),
            );
        }

        assert_eq!(
            trans.pending_paths(),
            vec![
                Path::property("A", "icon", "width"),
                Path::field("B", "label"),
            ]
        );
    }
}
