//! VHDL instantiation.
//!
//! Rendering an instance means rendering its generic map and its port
//! map. The port map is the subtle part: every edge of every port is
//! looked up in the type mappers, and each mapping pair walks both
//! sides in concatenation order while two offset expressions track the
//! slice positions. Nodes that belong to a node array are emitted under
//! the array's name, offset by their element index times the width of
//! the counterpart side. When several edges fan into one side of a
//! node, each edge starts at its offset among its siblings, so the
//! edges land on sequential slices of the shared wire bundle.

use crate::database::{Database, EdgeId, GraphId, NodeId};
use crate::error::{Error, Result};
use crate::generator::vhdl::block::{Block, Line, MultiBlock};
use crate::generator::vhdl::types::{is_single_bit, META_FORCE_VECTOR};
use crate::mapper::MappingPair;
use crate::node::{LitValue, Mode};
use crate::traits::Identify;
use crate::typ::TypeKind;

/// Instantiation generators.
pub struct Inst;

/// How an edge lands on one side of a node: whether other edges share
/// that side, and the summed width of the siblings preceding it.
struct FanIn {
    fanned: bool,
    offset: NodeId,
}

impl Inst {
    fn fan_in(db: &mut Database, node: NodeId, edge: EdgeId) -> Result<FanIn> {
        let fanned = db.siblings(node, edge)?.len() > 1;
        let offset = db.vector_offset(node, edge)?;
        let offset = db.int_lit(offset);
        Ok(FanIn { fanned, offset })
    }

    fn lit_to_vhdl(db: &Database, lit: NodeId) -> String {
        match db.node(lit).lit() {
            Some(LitValue::Str(value)) => format!("\"{}\"", value),
            Some(LitValue::Bool(value)) => value.to_string(),
            Some(LitValue::Int(value)) => value.to_string(),
            None => db.node_to_string(lit),
        }
    }

    /// Render the generic map binding of a parameter, if it resolves to
    /// a value. Free generics keep the component default.
    pub fn generic_map(db: &mut Database, param: NodeId) -> Block {
        let mut ret = Block::new(0);
        if let Some(value) = db.param_resolve(param) {
            let mut l = Line::new();
            l.push(db.node(param).identifier().to_string());
            l.push(" => ");
            if db.node(value).is_literal() {
                l.push(Self::lit_to_vhdl(db, value));
            } else {
                l.push(db.render_node(value));
            }
            ret.line(l);
        }
        ret
    }

    /// Render one leaf mapping line of a mapping pair.
    ///
    /// Pairs whose head entry is a stream or record are grouping
    /// markers and produce no line. A side is sliced when the other
    /// side concatenates onto it, when the node is an array element, or
    /// when several edges fan into that side; bit-typed leaves get an
    /// index, vector-typed leaves a range.
    #[allow(clippy::too_many_arguments)]
    fn mapping_pair(
        db: &mut Database,
        pair: &MappingPair,
        ia: usize,
        offset_a: NodeId,
        ib: usize,
        offset_b: NodeId,
        lh_prefix: &str,
        rh_prefix: &str,
        a_sliced: bool,
        b_sliced: bool,
    ) -> Block {
        let mut ret = Block::new(0);
        let head = pair.flat_a(0).typ;
        if matches!(
            db.typ(head).kind(),
            TypeKind::Stream { .. } | TypeKind::Record { .. }
        ) {
            return ret;
        }

        let a_typ = pair.flat_a(ia).typ;
        let b_typ = pair.flat_b(ib).typ;
        let a_width = db.width_of(a_typ);
        let b_width = db.width_of(b_typ);
        let zero = db.zero();
        let next_a = db.add(offset_a, b_width.unwrap_or(zero));
        let next_b = db.add(offset_b, a_width.unwrap_or(zero));

        let mut l = Line::new();
        l.push(pair.flat_a(ia).name(lh_prefix));
        if pair.num_b() > 1 || a_sliced {
            if is_single_bit(db, a_typ) {
                l.append(format!("({})", db.render_node(offset_a)));
            } else {
                let one = db.one();
                let high = db.sub(next_a, one);
                l.append(format!(
                    "({} downto {})",
                    db.render_node(high),
                    db.render_node(offset_a)
                ));
            }
        }
        l.push(" => ");
        l.push(pair.flat_b(ib).name(rh_prefix));
        if pair.num_a() > 1 || b_sliced {
            if is_single_bit(db, b_typ) {
                l.append(format!("({})", db.render_node(offset_b)));
            } else {
                let one = db.one();
                let high = db.sub(next_b, one);
                l.append(format!(
                    "({} downto {})",
                    db.render_node(high),
                    db.render_node(offset_b)
                ));
            }
        }
        ret.line(l);
        ret
    }

    /// Array membership, element index and emitted name prefix of a
    /// node. A stream type can force vector emission through metadata.
    fn array_info(db: &Database, node: NodeId) -> (bool, usize, String) {
        let mut is_array = false;
        let mut index = 0;
        let mut prefix = db.node(node).identifier().to_string();
        if let Some(array) = db.node(node).array() {
            is_array = true;
            index = db.array_index_of(array, node).unwrap_or(0);
            prefix = db.array(array).identifier().to_string();
        }
        if db
            .typ(db.node(node).typ())
            .get_meta(META_FORCE_VECTOR)
            .is_some()
        {
            is_array = true;
        }
        (is_array, index, prefix)
    }

    /// Render all leaf mappings between two connected nodes.
    ///
    /// Array elements start at their element index times the width of
    /// the counterpart side; fanned-in edges additionally start at
    /// their offset among their siblings.
    fn port_node_mapping(
        db: &mut Database,
        pairs: &[MappingPair],
        a: NodeId,
        b: NodeId,
        a_fan: &FanIn,
        b_fan: &FanIn,
    ) -> Block {
        let mut ret = Block::new(0);
        let (a_is_array, a_index, a_prefix) = Self::array_info(db, a);
        let (b_is_array, b_index, b_prefix) = Self::array_info(db, b);
        let a_sliced = a_is_array || a_fan.fanned;
        let b_sliced = b_is_array || b_fan.fanned;
        for pair in pairs {
            let one = db.one();
            let width_a = pair.width_a(db, one);
            let b_index_lit = db.int_lit(b_index as i64);
            let scaled_b = db.mul(width_a, b_index_lit);
            let mut offset_b = db.add(scaled_b, b_fan.offset);
            for ia in 0..pair.num_a() {
                let a_width = db.width_of(pair.flat_a(ia).typ);
                let one = db.one();
                let width_b = pair.width_b(db, one);
                let a_index_lit = db.int_lit(a_index as i64);
                let scaled_a = db.mul(width_b, a_index_lit);
                let mut offset_a = db.add(scaled_a, a_fan.offset);
                for ib in 0..pair.num_b() {
                    let b_width = db.width_of(pair.flat_b(ib).typ);
                    let block = Self::mapping_pair(
                        db, pair, ia, offset_a, ib, offset_b, &a_prefix, &b_prefix, a_sliced,
                        b_sliced,
                    );
                    ret.block(block);
                    let one = db.one();
                    offset_a = db.add(offset_a, b_width.unwrap_or(one));
                }
                let one = db.one();
                offset_b = db.add(offset_b, a_width.unwrap_or(one));
            }
        }
        ret
    }

    /// Render the port map lines for one port of an instance.
    pub fn port_maps(db: &mut Database, port: NodeId) -> Result<Block> {
        let mut ret = Block::new(0);
        let edges: Vec<EdgeId> = if db.node(port).mode() == Some(Mode::In) {
            db.node(port).ins().to_vec()
        } else {
            db.node(port).outs().to_vec()
        };
        for edge in edges {
            let other = db.edge(edge).other(port)?;
            let port_typ = db.node(port).typ();
            let other_typ = db.node(other).typ();
            let mapper = db.get_mapper(port_typ, other_typ).ok_or_else(|| {
                Error::ConnectivityError(format!(
                    "no type mapping available for port \"{}\" ({}) to \"{}\" ({})",
                    db.node(port).identifier(),
                    db.typ(port_typ).identifier(),
                    db.node(other).identifier(),
                    db.typ(other_typ).identifier()
                ))
            })?;
            let pairs = mapper.unique_mapping_pairs();
            let a_fan = Self::fan_in(db, port, edge)?;
            let b_fan = Self::fan_in(db, other, edge)?;
            let block = Self::port_node_mapping(db, &pairs, port, other, &a_fan, &b_fan);
            ret.block(block);
        }
        Ok(ret)
    }

    /// Render the port map lines for every element of a port array.
    pub fn port_array_maps(db: &mut Database, array: crate::database::ArrayId) -> Result<Block> {
        let mut ret = Block::new(0);
        let elements: Vec<NodeId> = db.array(array).nodes().to_vec();
        for element in elements {
            let block = Self::port_maps(db, element)?;
            ret.block(block);
        }
        Ok(ret)
    }

    /// Render the instantiation statement of an instance graph.
    pub fn generate(db: &mut Database, inst: GraphId) -> Result<MultiBlock> {
        let component = db.graph(inst).component().ok_or_else(|| {
            Error::BackEndError(format!(
                "graph \"{}\" is not an instance",
                db.graph(inst).identifier()
            ))
        })?;
        let mut ret = MultiBlock::new(1);
        let indent = ret.indent;

        let mut ih = Block::new(indent);
        ih.line(Line::from(format!(
            "{} : {}",
            db.graph(inst).identifier(),
            db.graph(component).identifier()
        )));

        // Generic map.
        let mut gmb = Block::new(indent + 2);
        for param in db.parameters_of(inst) {
            gmb.block(Self::generic_map(db, param));
        }

        // Port map.
        let mut pmb = Block::new(indent + 2);
        for port in db.ports_of(inst) {
            pmb.block(Self::port_maps(db, port)?);
        }
        for array in db.graph(inst).arrays().to_vec() {
            pmb.block(Self::port_array_maps(db, array)?);
        }

        let has_generics = !gmb.is_empty();
        let has_ports = !pmb.is_empty();
        if !has_generics && !has_ports {
            ih.suffix_all(";");
        }
        ret.block(ih);

        if has_generics {
            let mut gmh = Block::new(indent + 1);
            gmh.line(Line::from("generic map ("));
            gmb.suffix_all_but_last(",");
            let mut gmf = Block::new(indent + 1);
            gmf.line(Line::from(if has_ports { ")" } else { ");" }));
            ret.block(gmh).block(gmb).block(gmf);
        }

        if has_ports {
            let mut pmh = Block::new(indent + 1);
            pmh.line(Line::from("port map ("));
            pmb.suffix_all_but_last(",");
            let mut pmf = Block::new(indent + 1);
            pmf.line(Line::from(");"));
            ret.block(pmh).block(pmb).block(pmf);
        }

        Ok(ret)
    }
}
