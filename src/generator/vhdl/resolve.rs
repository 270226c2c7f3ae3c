//! Graph lowering for VHDL.
//!
//! Two transformations run before emission. *Port-to-port resolution*
//! rewrites direct connections between instance ports, which VHDL cannot
//! express at the architecture level, into two connections through a
//! fresh signal on the enclosing component. *Stream expansion* rewrites
//! every reachable stream type into a record carrying a valid/ready
//! handshake next to the original element, and re-issues the type
//! mappers of the affected types against the post-expansion flat views.
//! Both transformations are idempotent.

use log::debug;

use crate::database::{Database, GraphId, NodeId, TypeId};
use crate::error::{Error, Result};
use crate::flat::{flatten, FlatType};
use crate::generator::vhdl::types::{ready, valid, META_EXPAND, META_EXPAND_DONE};
use crate::mapper::{MappingMatrix, TypeMapper};
use crate::traits::Identify;
use crate::typ::{Field, Type, TypeKind};

/// The VHDL lowering transformations.
pub struct Resolve;

impl Resolve {
    /// Insert signals on edges that connect ports of two different
    /// instances inside `comp`.
    ///
    /// Each resolved edge `src -> dst` is replaced by `src -> signal`
    /// and `signal -> dst`, with the signal named after the edge and
    /// registered on `comp`. Pairs are processed once, so re-running
    /// the resolution leaves the graph unchanged.
    pub fn port_to_port(db: &mut Database, comp: GraphId) -> Result<()> {
        debug!(
            "resolving port-to-port connections in \"{}\"",
            db.graph(comp).identifier()
        );
        let mut resolved: Vec<(NodeId, NodeId)> = vec![];
        for inst in db.instances_of(comp) {
            let mut ports = db.ports_of(inst);
            for array in db.graph(inst).arrays().to_vec() {
                ports.extend(db.array(array).nodes().iter().copied());
            }
            for port in ports {
                for edge in db.node(port).outs().to_vec() {
                    let src = db.edge(edge).src();
                    let dst = db.edge(edge).dst();
                    if !db.node(src).is_port() || !db.node(dst).is_port() {
                        continue;
                    }
                    // Component-port to instance-port edges are legal.
                    if db.node(src).parent() == Some(comp) || db.node(dst).parent() == Some(comp)
                    {
                        continue;
                    }
                    if resolved.contains(&(src, dst)) {
                        continue;
                    }
                    if db.node(src).parent().is_none() || db.node(dst).parent().is_none() {
                        return Err(Error::TransformError(format!(
                            "cannot resolve edge \"{}\": an endpoint has no parent",
                            db.edge(edge).identifier()
                        )));
                    }
                    debug!("  inserting signal for \"{}\"", db.edge(edge).identifier());
                    let signal = Self::insert_signal(db, edge)?;
                    db.add_object(comp, signal)?;
                    resolved.push((src, dst));
                }
            }
        }
        Ok(())
    }

    /// Replace an edge by two edges through a fresh signal of the
    /// destination type, named after the edge.
    fn insert_signal(db: &mut Database, edge: crate::database::EdgeId) -> Result<NodeId> {
        let src = db.edge(edge).src();
        let dst = db.edge(edge).dst();
        let name = crate::util::sanitize_identifier(db.edge(edge).identifier());
        let typ = db.node(dst).typ();
        let signal = db.signal(name, typ);
        db.remove_edge(edge);
        db.connect(signal, src)?;
        db.connect(dst, signal)?;
        Ok(signal)
    }

    /// Expand every stream type reachable from `comp`.
    ///
    /// Expansion markers on the types keep the pass idempotent.
    pub fn expand_streams(db: &mut Database, comp: GraphId) -> Result<()> {
        debug!(
            "materializing stream handshakes for \"{}\"",
            db.graph(comp).identifier()
        );
        let mut types = vec![];
        let mut seen = vec![];
        Self::gather_types(db, comp, &mut types, &mut seen);
        for typ in types {
            if db.typ(typ).get_meta(META_EXPAND_DONE).is_none() {
                Self::expand_mappers(db, typ)?;
            }
        }
        Ok(())
    }

    fn gather_types(
        db: &Database,
        graph: GraphId,
        types: &mut Vec<TypeId>,
        seen: &mut Vec<GraphId>,
    ) {
        if seen.contains(&graph) {
            return;
        }
        seen.push(graph);
        let mut push = |types: &mut Vec<TypeId>, t: TypeId| {
            if !types.contains(&t) {
                types.push(t);
            }
        };
        for &node in db.graph(graph).nodes() {
            push(types, db.node(node).typ());
        }
        for &array in db.graph(graph).arrays() {
            push(types, db.array_type(array));
        }
        for &child in db.graph(graph).children() {
            Self::gather_types(db, child, types, seen);
            if let Some(component) = db.graph(child).component() {
                Self::gather_types(db, component, types, seen);
            }
        }
    }

    fn has_stream(db: &Database, flat: &[FlatType]) -> bool {
        flat.iter()
            .any(|ft| matches!(db.typ(ft.typ).kind(), TypeKind::Stream { .. }))
    }

    /// Rewrite each unexpanded stream in a flat view: its element type
    /// becomes a record of `valid`, inverted `ready` and the original
    /// element, and the stream is marked expanded.
    fn expand_stream_types(db: &mut Database, flat: &[FlatType]) {
        for ft in flat {
            let (element, element_name) = match db.typ(ft.typ).kind() {
                TypeKind::Stream {
                    element,
                    element_name,
                } => (*element, element_name.clone()),
                _ => continue,
            };
            if db.typ(ft.typ).get_meta(META_EXPAND).is_some() {
                continue;
            }
            let valid_typ = valid(db);
            let ready_typ = ready(db);
            let mut record = Type::new(
                crate::cat!(db.typ(ft.typ).identifier(), "vr"),
                TypeKind::Record {
                    fields: vec![
                        Field::new("valid", valid_typ, false),
                        Field::new("ready", ready_typ, true),
                        Field::new(element_name, element, false),
                    ],
                },
            );
            record.set_meta(META_EXPAND, "record");
            let record_id = db.add_type(record);
            db.typ_mut(ft.typ).set_stream_element(record_id);
            db.typ_mut(ft.typ).set_meta(META_EXPAND, "stream");
        }
    }

    /// Expand the streams below a type and re-issue its mappers against
    /// the post-expansion flat views.
    fn expand_mappers(db: &mut Database, typ: TypeId) -> Result<()> {
        let mappers: Vec<TypeMapper> = db.typ(typ).mappers.clone();
        if mappers.is_empty() {
            let flat = flatten(db, typ);
            if Self::has_stream(db, &flat) {
                Self::expand_stream_types(db, &flat);
            }
            return Ok(());
        }
        for mapper in mappers {
            if !Self::has_stream(db, mapper.flat_a()) && !Self::has_stream(db, mapper.flat_b()) {
                continue;
            }
            // Expand both sides. The flat views captured by the mapper
            // still describe the pre-expansion shapes.
            Self::expand_stream_types(db, mapper.flat_a());
            let a = mapper.a();
            let b = mapper.b();
            db.typ_mut(a).set_meta(META_EXPAND_DONE, "true");
            Self::expand_stream_types(db, mapper.flat_b());
            db.typ_mut(b).set_meta(META_EXPAND_DONE, "true");

            let rebuilt = Self::rebuild_matrix(db, &mapper)?;
            db.add_mapper(rebuilt);
        }
        Ok(())
    }

    /// Walk the old mapping matrix against the expanded flat views.
    ///
    /// Matching expanded entries on both sides keep their ordinal at the
    /// head of the expanded group; the inserted record, valid and ready
    /// columns are skipped according to the expansion shape. Unmatched
    /// expanded entries stay unmapped.
    fn rebuild_matrix(db: &mut Database, mapper: &TypeMapper) -> Result<TypeMapper> {
        let old = mapper.matrix().clone();
        let mut rebuilt = TypeMapper::new(db, mapper.a(), mapper.b());
        let flat_a = rebuilt.flat_a().to_vec();
        let flat_b = rebuilt.flat_b().to_vec();
        let height = flat_a.len();
        let width = flat_b.len();
        let mut matrix = MappingMatrix::new(height, width);

        let mark =
            |db: &Database, t: TypeId| db.typ(t).get_meta(META_EXPAND).map(str::to_string);

        let mut old_row = 0;
        for new_row in 0..height {
            let a_mark = mark(db, flat_a[new_row].typ);
            let mut old_col = 0;
            let mut new_col = 0;
            while new_col < width {
                let b_mark = mark(db, flat_b[new_col].typ);
                let old_value = if old_row < old.height() && old_col < old.width() {
                    old.get(old_row, old_col)?
                } else {
                    0
                };
                match (a_mark.as_deref(), b_mark.as_deref()) {
                    (Some("stream"), Some("stream")) => {
                        matrix.set(new_row, new_col, old_value)?;
                        new_col += 4;
                        old_col += 1;
                    }
                    (Some("record"), Some("record")) => {
                        matrix.set(new_row, new_col, old_value)?;
                        new_col += 3;
                        old_col += 1;
                    }
                    (Some("valid"), Some("valid")) => {
                        matrix.set(new_row, new_col, old_value)?;
                        new_col += 2;
                        old_col += 1;
                    }
                    (Some("ready"), Some("ready")) => {
                        matrix.set(new_row, new_col, old_value)?;
                        new_col += 1;
                    }
                    _ => {
                        // Rows of unexpanded entries copy through; an
                        // expanded row against a non-matching column
                        // gets its value on another row.
                        if a_mark.is_none() {
                            matrix.set(new_row, new_col, old_value)?;
                        }
                        new_col += 1;
                    }
                }
                if b_mark.is_none() || b_mark.as_deref() == Some("ready") {
                    old_col += 1;
                }
            }
            if a_mark.is_none() || a_mark.as_deref() == Some("ready") {
                old_row += 1;
            }
        }
        rebuilt.set_matrix(matrix);
        Ok(rebuilt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Mode;

    fn pass_through(db: &mut Database) -> GraphId {
        let v8 = db.vec(8);
        let a = db.port("A", v8, Mode::Out);
        let b = db.port("B", v8, Mode::In);
        let x_comp = db.component("X");
        db.add_object(x_comp, a).unwrap();
        let y_comp = db.component("Y");
        db.add_object(y_comp, b).unwrap();
        let top = db.component("top");
        let x = db.instance_named("x", x_comp).unwrap();
        let y = db.instance_named("y", y_comp).unwrap();
        db.add_child(top, x).unwrap();
        db.add_child(top, y).unwrap();
        let xa = db.get_node(x, "A").unwrap();
        let yb = db.get_node(y, "B").unwrap();
        db.connect(yb, xa).unwrap();
        top
    }

    #[test]
    fn port_to_port_inserts_signal() {
        let mut db = Database::new();
        let top = pass_through(&mut db);
        Resolve::port_to_port(&mut db, top).unwrap();
        let signals = db.signals_of(top);
        assert_eq!(signals.len(), 1);
        assert_eq!(db.node(signals[0]).identifier(), "x_A_to_y_B");

        // The signal now sits between the two ports.
        let x = db.instances_of(top)[0];
        let xa = db.get_node(x, "A").unwrap();
        assert_eq!(db.node(xa).outs().len(), 1);
        let edge = db.node(xa).outs()[0];
        assert_eq!(db.edge(edge).dst(), signals[0]);
    }

    #[test]
    fn port_to_port_is_idempotent() {
        let mut db = Database::new();
        let top = pass_through(&mut db);
        Resolve::port_to_port(&mut db, top).unwrap();
        Resolve::port_to_port(&mut db, top).unwrap();
        assert_eq!(db.signals_of(top).len(), 1);
    }

    #[test]
    fn component_port_edges_are_left_alone() {
        let mut db = Database::new();
        let v8 = db.vec(8);
        let a = db.port("A", v8, Mode::Out);
        let x_comp = db.component("X");
        db.add_object(x_comp, a).unwrap();
        let top = db.component("top");
        let out = db.port("OUT", v8, Mode::Out);
        db.add_object(top, out).unwrap();
        let x = db.instance_named("x", x_comp).unwrap();
        db.add_child(top, x).unwrap();
        let xa = db.get_node(x, "A").unwrap();
        db.connect(out, xa).unwrap();
        Resolve::port_to_port(&mut db, top).unwrap();
        assert!(db.signals_of(top).is_empty());
    }

    #[test]
    fn stream_expansion_marks_and_wraps() {
        let mut db = Database::new();
        let v8 = db.vec(8);
        let stream = db.stream("s", v8).unwrap();
        let p = db.port("p", stream, Mode::In);
        let comp = db.component("c");
        db.add_object(comp, p).unwrap();
        Resolve::expand_streams(&mut db, comp).unwrap();

        assert_eq!(db.typ(stream).get_meta(META_EXPAND), Some("stream"));
        let element = db.typ(stream).stream_element().unwrap();
        assert_eq!(db.typ(element).get_meta(META_EXPAND), Some("record"));
        let fields = db.typ(element).fields().unwrap().to_vec();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].identifier(), "valid");
        assert_eq!(fields[1].identifier(), "ready");
        assert!(fields[1].is_inverted());
        assert_eq!(fields[2].identifier(), "data");
        assert_eq!(fields[2].typ(), v8);
    }

    #[test]
    fn stream_expansion_is_idempotent() {
        let mut db = Database::new();
        let v8 = db.vec(8);
        let stream = db.stream("s", v8).unwrap();
        let p = db.port("p", stream, Mode::In);
        let comp = db.component("c");
        db.add_object(comp, p).unwrap();
        Resolve::expand_streams(&mut db, comp).unwrap();
        let element = db.typ(stream).stream_element().unwrap();
        Resolve::expand_streams(&mut db, comp).unwrap();
        assert_eq!(db.typ(stream).stream_element(), Some(element));
        assert_eq!(db.typ(element).fields().unwrap().len(), 3);
    }

    #[test]
    fn expansion_rebuilds_mappers() {
        let mut db = Database::new();
        let bit = db.bit();
        // A: stream of a record with a plain bit and a nested stream.
        let child = db.stream_named("se", "data", bit).unwrap();
        let rec = db
            .record(
                "a",
                vec![
                    Field::new("other", bit, false),
                    Field::new("child", child, false),
                ],
            )
            .unwrap();
        let ta = db.stream_named("split", "data", rec).unwrap();
        // B: a plain stream of bits.
        let tb = db.stream_named("concat", "data", bit).unwrap();

        // Flat A: 0 stream, 1 record, 2 other, 3 child stream, 4 bit.
        // Flat B: 0 stream, 1 bit.
        let mut mapper = TypeMapper::new(&db, ta, tb);
        mapper.add(0, 0).unwrap();
        mapper.add(2, 1).unwrap();
        mapper.add(3, 0).unwrap();
        mapper.add(4, 1).unwrap();
        db.add_mapper(mapper);

        let pa = db.port("A", ta, Mode::Out);
        let comp = db.component("X");
        db.add_object(comp, pa).unwrap();
        Resolve::expand_streams(&mut db, comp).unwrap();

        let rebuilt = db.get_mapper(ta, tb).unwrap();
        let fa = rebuilt.flat_a().to_vec();
        let fb = rebuilt.flat_b().to_vec();
        // Expanded A: stream, record(vr), valid, ready, record a, other,
        // child stream, record(vr), valid, ready, data bit.
        assert_eq!(fa.len(), 11);
        assert_eq!(fb.len(), 5);
        let m = rebuilt.matrix();
        // Head ordinals survive at the head of each expanded group.
        assert_eq!(m.get(0, 0).unwrap(), 1);
        assert_eq!(m.get(6, 0).unwrap(), 2);
        // Valids map to valid, readys to ready.
        assert_eq!(m.get(2, 2).unwrap(), 1);
        assert_eq!(m.get(8, 2).unwrap(), 2);
        assert_eq!(m.get(3, 3).unwrap(), 1);
        assert_eq!(m.get(9, 3).unwrap(), 2);
        // Data bits map to the data bit.
        assert_eq!(m.get(5, 4).unwrap(), 1);
        assert_eq!(m.get(10, 4).unwrap(), 2);
    }
}
