//! VHDL declarations.

use crate::database::{ArrayId, Database, GraphId, NodeId, TypeId};
use crate::error::{Error, Result};
use crate::flat::flatten;
use crate::generator::vhdl::block::{Block, Line, MultiBlock};
use crate::generator::vhdl::types::{filter_for_vhdl, flat_mode, mode_to_string};
use crate::traits::{Document, Identify};
use crate::typ::TypeKind;

/// Declaration generators.
pub struct Decl;

/// Render user documentation as comment lines into a block.
fn doc_lines(block: &mut Block, doc: Option<String>) {
    if let Some(doc) = doc {
        for line in doc.lines() {
            block.line(Line::from(format!("-- {}", line)));
        }
    }
}

impl Decl {
    /// Render a type as a VHDL type literal.
    ///
    /// With a `multiplier`, single-bit types widen to a vector of the
    /// multiplier and vector widths are multiplied, which vectorizes
    /// array ports.
    pub fn typ(db: &mut Database, typ: TypeId, multiplier: Option<NodeId>) -> String {
        match db.typ(typ).kind().clone() {
            TypeKind::Bit | TypeKind::Clock { .. } | TypeKind::Reset { .. } => match multiplier {
                None => "std_logic".to_string(),
                Some(m) => {
                    let one = db.one();
                    let high = db.sub(m, one);
                    format!("std_logic_vector({} downto 0)", db.render_node(high))
                }
            },
            TypeKind::Vector { width } => {
                let scaled = match multiplier {
                    None => width,
                    Some(m) => db.mul(m, width),
                };
                let one = db.one();
                let high = db.sub(scaled, one);
                format!("std_logic_vector({} downto 0)", db.render_node(high))
            }
            TypeKind::Record { .. } => db.typ(typ).identifier().to_string(),
            TypeKind::Integer => "integer".to_string(),
            TypeKind::Natural => "natural".to_string(),
            TypeKind::String => "string".to_string(),
            TypeKind::Boolean => "boolean".to_string(),
            TypeKind::Stream { element, .. } => Decl::typ(db, element, multiplier),
        }
    }

    /// Render a generic declaration: `name : type [:= value]`.
    pub fn parameter(db: &mut Database, param: NodeId, indent: usize) -> Block {
        let mut ret = Block::new(indent);
        let mut l = Line::new();
        l.push(db.node(param).identifier().to_string());
        l.push(" : ");
        l.push(Decl::typ(db, db.node(param).typ(), None));
        if let Some(value) = db.param_resolve(param) {
            l.push(" := ");
            l.push(db.render_node(value));
        }
        ret.line(l);
        ret
    }

    /// Render the flattened declaration lines of a port.
    pub fn port(db: &mut Database, port: NodeId, indent: usize) -> Result<Block> {
        Decl::port_lines(db, port, indent, None)
    }

    /// Render the flattened declaration lines of a port array. Vector
    /// widths are multiplied by the array size.
    pub fn port_array(db: &mut Database, array: ArrayId, indent: usize) -> Result<Block> {
        let base = db.array(array).base();
        let size = db.array(array).size();
        Decl::port_lines(db, base, indent, Some(size))
    }

    fn port_lines(
        db: &mut Database,
        port: NodeId,
        indent: usize,
        multiplier: Option<NodeId>,
    ) -> Result<Block> {
        let mut ret = Block::new(indent);
        let mode = db.node(port).mode().ok_or_else(|| {
            Error::BackEndError(format!(
                "cannot declare \"{}\" as a port: it is a {}",
                db.node(port).identifier(),
                db.node(port).kind().token()
            ))
        })?;
        doc_lines(&mut ret, db.node(port).doc());
        let prefix = db.node(port).identifier().to_string();
        let flat = flatten(db, db.node(port).typ());
        for ft in filter_for_vhdl(db, &flat) {
            let mut l = Line::new();
            l.push(ft.name(&prefix));
            l.push(" : ");
            l.push(format!("{} ", mode_to_string(flat_mode(mode, &ft))));
            l.push(Decl::typ(db, ft.typ, multiplier));
            ret.line(l);
        }
        Ok(ret)
    }

    /// Render the flattened declaration lines of a signal.
    pub fn signal(db: &mut Database, signal: NodeId, indent: usize) -> Block {
        Decl::signal_lines(db, signal, indent, None)
    }

    /// Render the flattened declaration lines of a signal array.
    pub fn signal_array(db: &mut Database, array: ArrayId, indent: usize) -> Block {
        let base = db.array(array).base();
        let size = db.array(array).size();
        Decl::signal_lines(db, base, indent, Some(size))
    }

    fn signal_lines(
        db: &mut Database,
        signal: NodeId,
        indent: usize,
        multiplier: Option<NodeId>,
    ) -> Block {
        let mut ret = Block::new(indent);
        let prefix = db.node(signal).identifier().to_string();
        let flat = flatten(db, db.node(signal).typ());
        for ft in filter_for_vhdl(db, &flat) {
            let mut l = Line::new();
            l.push(format!("signal {}", ft.name(&prefix)));
            l.push(" : ");
            l.push(format!("{};", Decl::typ(db, ft.typ, multiplier)));
            ret.line(l);
        }
        ret
    }

    /// Render a component or entity declaration.
    pub fn component(db: &mut Database, comp: GraphId, entity: bool) -> Result<MultiBlock> {
        let mut ret = MultiBlock::new(if entity { 0 } else { 1 });
        let indent = ret.indent;

        let mut h = Block::new(indent);
        doc_lines(&mut h, db.graph(comp).doc());
        h.line(Line::from(format!(
            "{} {} is",
            if entity { "entity" } else { "component" },
            db.graph(comp).identifier()
        )));
        ret.block(h);

        let generics = db.parameters_of(comp);
        if !generics.is_empty() {
            let mut gdh = Block::new(indent + 1);
            gdh.line(Line::from("generic ("));
            let mut gd = Block::new(indent + 2);
            for (i, gen) in generics.iter().enumerate() {
                let mut g = Decl::parameter(db, *gen, indent + 2);
                if i + 1 < generics.len() {
                    g.suffix_all(";");
                } else {
                    g.suffix_all_but_last(";");
                }
                gd.block(g);
            }
            let mut gdf = Block::new(indent + 1);
            gdf.line(Line::from(");"));
            ret.block(gdh).block(gd).block(gdf);
        }

        let ports = db.ports_of(comp);
        let arrays = db.graph(comp).arrays().to_vec();
        if !ports.is_empty() || !arrays.is_empty() {
            let mut pdh = Block::new(indent + 1);
            pdh.line(Line::from("port ("));
            let mut pd = Block::new(indent + 2);
            for (i, port) in ports.iter().enumerate() {
                let mut p = Decl::port(db, *port, indent + 2)?;
                if i + 1 < ports.len() || !arrays.is_empty() {
                    p.suffix_all(";");
                } else {
                    p.suffix_all_but_last(";");
                }
                pd.block(p);
            }
            for (i, array) in arrays.iter().enumerate() {
                let mut p = Decl::port_array(db, *array, indent + 2)?;
                if i + 1 < arrays.len() {
                    p.suffix_all(";");
                } else {
                    p.suffix_all_but_last(";");
                }
                pd.block(p);
            }
            let mut pdf = Block::new(indent + 1);
            pdf.line(Line::from(");"));
            ret.block(pdh).block(pd).block(pdf);
        }

        let mut f = Block::new(indent);
        f.line(Line::from(if entity {
            "end entity;"
        } else {
            "end component;"
        }));
        ret.block(f);

        Ok(ret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Mode;
    use crate::typ::Field;

    #[test]
    fn type_literals() {
        let mut db = Database::new();
        let bit = db.bit();
        let v8 = db.vec(8);
        assert_eq!(Decl::typ(&mut db, bit, None), "std_logic");
        assert_eq!(
            Decl::typ(&mut db, v8, None),
            "std_logic_vector(7 downto 0)"
        );
        let int = db.integer();
        assert_eq!(Decl::typ(&mut db, int, None), "integer");
        let nat = db.natural();
        assert_eq!(Decl::typ(&mut db, nat, None), "natural");
        let boolean = db.boolean();
        assert_eq!(Decl::typ(&mut db, boolean, None), "boolean");
    }

    #[test]
    fn parametric_vector_width() {
        let mut db = Database::new();
        let int = db.integer();
        let dflt = db.int_lit(32);
        let w = db.parameter("W", int, Some(dflt)).unwrap();
        let v = db.vector("pvec", w).unwrap();
        assert_eq!(
            Decl::typ(&mut db, v, None),
            "std_logic_vector(W-1 downto 0)"
        );
    }

    #[test]
    fn multiplied_vector_width() {
        let mut db = Database::new();
        let int = db.integer();
        let zero = db.zero();
        let size = db.parameter("size", int, Some(zero)).unwrap();
        let v8 = db.vec(8);
        assert_eq!(
            Decl::typ(&mut db, v8, Some(size)),
            "std_logic_vector(size*8-1 downto 0)"
        );
        let bit = db.bit();
        assert_eq!(
            Decl::typ(&mut db, bit, Some(size)),
            "std_logic_vector(size-1 downto 0)"
        );
    }

    #[test]
    fn port_declaration() {
        let mut db = Database::new();
        let v10 = db.vec(10);
        let p = db.port("test", v10, Mode::In);
        let block = Decl::port(&mut db, p, 0).unwrap();
        assert_eq!(
            block.to_string(),
            "test : in std_logic_vector(9 downto 0)\n"
        );
    }

    #[test]
    fn stream_port_declaration_resolves_handshake() {
        let mut db = Database::new();
        let v8 = db.vec(8);
        let s = db.stream("str", v8).unwrap();
        let p = db.port("a", s, Mode::In);
        let block = Decl::port(&mut db, p, 0).unwrap();
        assert_eq!(
            block.to_string(),
            concat!(
                "a_valid : in  std_logic\n",
                "a_ready : out std_logic\n",
                "a       : in  std_logic_vector(7 downto 0)\n",
            )
        );
    }

    #[test]
    fn signal_declaration() {
        let mut db = Database::new();
        let bit = db.bit();
        let v4 = db.vec(4);
        let rec = db
            .record(
                "rec",
                vec![Field::new("c", bit, false), Field::new("d", v4, false)],
            )
            .unwrap();
        let s = db.signal("s", rec);
        let block = Decl::signal(&mut db, s, 0);
        assert_eq!(
            block.to_string(),
            concat!(
                "signal s_c : std_logic;\n",
                "signal s_d : std_logic_vector(3 downto 0);\n",
            )
        );
    }

    #[test]
    fn component_declaration() {
        let mut db = Database::new();
        let int = db.integer();
        let bit = db.bit();
        let v8 = db.vec(8);
        let v32 = db.vec(32);
        let dflt = db.int_lit(16);
        let depth = db.parameter("depth", int, Some(dflt)).unwrap();
        let clk = db.port("clk", bit, Mode::In);
        let a = db.port("a", v8, Mode::In);
        let b = db.port("b", v32, Mode::Out);
        let comp = db.component("test_comp");
        db.add_object(comp, depth).unwrap();
        db.add_object(comp, clk).unwrap();
        db.add_object(comp, a).unwrap();
        db.add_object(comp, b).unwrap();

        let code = Decl::component(&mut db, comp, false).unwrap().to_string();
        assert_eq!(
            code,
            concat!(
                "component test_comp is\n",
                "  generic (\n",
                "    depth : integer := 16\n",
                "  );\n",
                "  port (\n",
                "    clk : in  std_logic;\n",
                "    a   : in  std_logic_vector(7 downto 0);\n",
                "    b   : out std_logic_vector(31 downto 0)\n",
                "  );\n",
                "end component;\n",
            )
        );
    }

    #[test]
    fn entity_declaration() {
        let mut db = Database::new();
        let bit = db.bit();
        let clk = db.port("clk", bit, Mode::In);
        let comp = db.component("top");
        db.add_object(comp, clk).unwrap();
        let code = Decl::component(&mut db, comp, true).unwrap().to_string();
        assert_eq!(
            code,
            concat!(
                "entity top is\n",
                "  port (\n",
                "    clk : in std_logic\n",
                "  );\n",
                "end entity;\n",
            )
        );
    }

    #[test]
    fn documentation_renders_as_comments() {
        let mut db = Database::new();
        let bit = db.bit();
        let v8 = db.vec(8);
        let clk = db.port("clk", bit, Mode::In);
        db.node_mut(clk).set_doc("Kernel clock.");
        let data = db.port("data", v8, Mode::Out);
        let comp = db.component("krnl");
        db.graph_mut(comp).set_doc("Generated kernel wrapper.");
        db.add_object(comp, clk).unwrap();
        db.add_object(comp, data).unwrap();

        let code = Decl::component(&mut db, comp, false).unwrap().to_string();
        assert_eq!(
            code,
            concat!(
                "  -- Generated kernel wrapper.\n",
                "  component krnl is\n",
                "    port (\n",
                "      -- Kernel clock.\n",
                "      clk  : in  std_logic;\n",
                "      data : out std_logic_vector(7 downto 0)\n",
                "    );\n",
                "  end component;\n",
            )
        );
    }

    #[test]
    fn array_port_declaration_is_vectorized() {
        let mut db = Database::new();
        let int = db.integer();
        let zero = db.zero();
        let size = db.parameter("size", int, Some(zero)).unwrap();
        let v8 = db.vec(8);
        let array = db.port_array("a", v8, size, Mode::Out);
        let comp = db.component("x");
        db.add_object(comp, size).unwrap();
        db.add_array_object(comp, array).unwrap();
        let block = Decl::port_array(&mut db, array, 0).unwrap();
        assert_eq!(
            block.to_string(),
            "a : out std_logic_vector(size*8-1 downto 0)\n"
        );
    }
}
