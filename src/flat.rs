//! Flattened views of nested types.
//!
//! A flat view linearizes a composite type depth-first into a list of
//! [`FlatType`] entries: every type contributes a head entry for itself,
//! records follow with their fields (field names appended to the name
//! parts), streams follow with their element. Leaf wires end up with a
//! full name path; abstract containers remain in the list as grouping
//! markers until the VHDL filter removes them.
//!
//! [`FlatType`]: ./struct.FlatType.html

use crate::database::{Database, TypeId};
use crate::typ::TypeKind;
use crate::traits::Identify;

/// One entry of a flattened type.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatType {
    /// The type of this entry.
    pub typ: TypeId,
    /// Name parts accumulated from enclosing record fields.
    pub name_parts: Vec<String>,
    /// Nesting depth of this entry below the flattened root.
    pub nesting_level: usize,
    /// True if an ancestor field (or the entry itself) is inverted.
    pub invert: bool,
}

impl FlatType {
    /// Render the flat name below some root, joining parts with `_`.
    pub fn name(&self, root: &str) -> String {
        let mut result = root.to_string();
        for part in &self.name_parts {
            if part.is_empty() {
                continue;
            }
            if !result.is_empty() {
                result.push('_');
            }
            result.push_str(part);
        }
        result
    }
}

/// Flatten a type into its depth-first list of entries.
///
/// The first entry is always the type itself.
pub fn flatten(db: &Database, typ: TypeId) -> Vec<FlatType> {
    let mut list = Vec::new();
    flatten_into(db, &mut list, typ, vec![], 0, false);
    list
}

fn flatten_into(
    db: &Database,
    list: &mut Vec<FlatType>,
    typ: TypeId,
    name_parts: Vec<String>,
    nesting_level: usize,
    invert: bool,
) {
    list.push(FlatType {
        typ,
        name_parts: name_parts.clone(),
        nesting_level,
        invert,
    });
    match db.typ(typ).kind() {
        TypeKind::Record { fields } => {
            for field in fields {
                let mut parts = name_parts.clone();
                parts.push(field.identifier().to_string());
                flatten_into(
                    db,
                    list,
                    field.typ(),
                    parts,
                    nesting_level + 1,
                    invert ^ field.is_inverted(),
                );
            }
        }
        TypeKind::Stream { element, .. } => {
            // The element does not contribute a name part; leaf names
            // come from record fields and from handshake expansion.
            flatten_into(db, list, *element, name_parts, nesting_level + 1, invert);
        }
        _ => {}
    }
}

/// Compare two types for weak equality: their flat views must have the
/// same length, and the same type variant and nesting level at every
/// index. A registered mapper between the two types also satisfies weak
/// equality.
pub fn weakly_equal(db: &Database, a: TypeId, b: TypeId) -> bool {
    let fa = flatten(db, a);
    let fb = flatten(db, b);
    let mut equal = fa.len() == fb.len();
    if equal {
        for (ea, eb) in fa.iter().zip(fb.iter()) {
            if !db.typ(ea.typ).kind().same_variant(db.typ(eb.typ).kind())
                || ea.nesting_level != eb.nesting_level
            {
                equal = false;
                break;
            }
        }
    }
    if !equal {
        for mapper in &db.typ(a).mappers {
            if mapper.can_convert(a, b) {
                return true;
            }
        }
    }
    equal
}
