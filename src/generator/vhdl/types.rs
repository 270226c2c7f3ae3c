//! VHDL-specific types and type filtering.

use crate::database::{Database, TypeId};
use crate::flat::FlatType;
use crate::node::Mode;
use crate::traits::Reversed;
use crate::typ::{Type, TypeKind};

/// Metadata key marking a type's role in stream expansion. Values are
/// `stream`, `record`, `valid` and `ready`.
pub const META_EXPAND: &str = "vhdl:expand";
/// Metadata key marking a type whose mappers have been re-issued after
/// expansion.
pub const META_EXPAND_DONE: &str = "vhdl:expand-done";
/// Metadata key forcing a stream to be emitted with vector slices even
/// with a single producer and consumer.
pub const META_FORCE_VECTOR: &str = "vhdl:force-stream-vector";
/// Metadata key marking a component as a primitive provided by an
/// existing library, which must not be re-declared.
pub const META_PRIMITIVE: &str = "primitive";

fn handshake_bit(db: &mut Database, name: &str) -> TypeId {
    if let Some(id) = db.find_type(name) {
        return id;
    }
    let mut t = Type::new(name, TypeKind::Bit);
    t.set_meta(META_EXPAND, name);
    match db.intern_type(t) {
        Ok(id) => id,
        // The pool cannot conflict here, but do not panic on it.
        Err(_) => {
            let mut t = Type::new(name, TypeKind::Bit);
            t.set_meta(META_EXPAND, name);
            db.add_type(t)
        }
    }
}

/// The handshake "valid" bit type.
pub fn valid(db: &mut Database) -> TypeId {
    handshake_bit(db, "valid")
}

/// The handshake "ready" bit type.
pub fn ready(db: &mut Database) -> TypeId {
    handshake_bit(db, "ready")
}

/// Render a port mode as VHDL.
pub fn mode_to_string(mode: Mode) -> &'static str {
    match mode {
        Mode::In => "in",
        Mode::Out => "out",
    }
}

/// True when a flat entry renders as a single `std_logic`.
pub(crate) fn is_single_bit(db: &Database, typ: TypeId) -> bool {
    matches!(
        db.typ(typ).kind(),
        TypeKind::Bit | TypeKind::Clock { .. } | TypeKind::Reset { .. }
    )
}

/// Filter a flat type view down to entries VHDL can express.
///
/// Abstract scalars and record heads are dropped. A stream head that has
/// not been expanded resolves to a `valid` and an inverted `ready` bit
/// in place; an expanded stream head is dropped, since its handshake
/// lives in the record the expansion inserted.
pub fn filter_for_vhdl(db: &mut Database, list: &[FlatType]) -> Vec<FlatType> {
    let mut result = Vec::new();
    for ft in list {
        let typ = db.typ(ft.typ);
        if typ.is_abstract() && !matches!(typ.kind(), TypeKind::Boolean) {
            if matches!(typ.kind(), TypeKind::Stream { .. })
                && typ.get_meta(META_EXPAND).is_none()
            {
                let mut v = ft.clone();
                v.name_parts.push("valid".to_string());
                v.typ = valid(db);
                let mut r = ft.clone();
                r.name_parts.push("ready".to_string());
                r.typ = ready(db);
                r.invert = !r.invert;
                result.push(v);
                result.push(r);
            }
            // Other abstract entries are grouping markers only.
        } else {
            result.push(ft.clone());
        }
    }
    result
}

/// The effective mode of a flat entry on a port: inverted entries swap
/// direction.
pub(crate) fn flat_mode(mode: Mode, ft: &FlatType) -> Mode {
    if ft.invert {
        mode.reversed()
    } else {
        mode
    }
}
