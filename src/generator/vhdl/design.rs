//! Full-design emission.

use crate::database::{Database, GraphId};
use crate::error::Result;
use crate::generator::vhdl::block::{Block, Line, MultiBlock};
use crate::generator::vhdl::decl::Decl;
use crate::generator::vhdl::inst::Inst;
use crate::generator::vhdl::resolve::Resolve;
use crate::generator::vhdl::types::META_PRIMITIVE;
use crate::generator::vhdl::VhdlConfig;
use crate::traits::Identify;

/// Whole-design generator for one top component.
pub struct Design;

fn blank() -> Block {
    let mut b = Block::new(0);
    b.line(Line::new());
    b
}

impl Design {
    /// Emit the architecture of a component: declarations for each
    /// distinct non-primitive child component, local signal
    /// declarations, and the instance statements.
    pub fn architecture(db: &mut Database, comp: GraphId) -> Result<MultiBlock> {
        let mut ret = MultiBlock::new(0);

        let mut h = Block::new(0);
        h.line(Line::from(format!(
            "architecture Implementation of {} is",
            db.graph(comp).identifier()
        )));
        ret.block(h);

        for child in db.unique_child_components(comp) {
            if db.graph(child).get_meta(META_PRIMITIVE) == Some("true") {
                continue;
            }
            ret.block(blank());
            ret.multi(Decl::component(db, child, false)?);
        }

        let signals = db.signals_of(comp);
        let signal_arrays: Vec<_> = db
            .graph(comp)
            .arrays()
            .iter()
            .copied()
            .filter(|&a| db.node(db.array(a).base()).is_signal())
            .collect();
        if !signals.is_empty() || !signal_arrays.is_empty() {
            let mut sd = Block::new(1);
            for signal in signals {
                sd.block(Decl::signal(db, signal, 1));
            }
            for array in signal_arrays {
                sd.block(Decl::signal_array(db, array, 1));
            }
            ret.block(blank());
            ret.block(sd);
        }

        let mut b = Block::new(0);
        b.line(Line::from("begin"));
        ret.block(b);

        for inst in db.instances_of(comp) {
            ret.block(blank());
            ret.multi(Inst::generate(db, inst)?);
        }

        let mut f = Block::new(0);
        f.line(Line::from("end architecture;"));
        ret.block(blank());
        ret.block(f);

        Ok(ret)
    }

    /// Emit a complete design file for a top component.
    ///
    /// Runs port-to-port resolution and stream expansion first, then
    /// emits the library header, the top-level entity (or component,
    /// depending on the configuration) and its architecture.
    pub fn generate(db: &mut Database, top: GraphId, config: &VhdlConfig) -> Result<MultiBlock> {
        Resolve::port_to_port(db, top)?;
        Resolve::expand_streams(db, top)?;

        let mut ret = MultiBlock::new(0);
        let mut header = Block::new(0);
        header.line(Line::from("library ieee;"));
        header.line(Line::from("use ieee.std_logic_1164.all;"));
        header.line(Line::from("use ieee.numeric_std.all;"));

        // Primitive child components come from existing libraries.
        let mut uses: Vec<(String, String)> = vec![];
        for child in db.unique_child_components(top) {
            if db.graph(child).get_meta(META_PRIMITIVE) != Some("true") {
                continue;
            }
            if let (Some(lib), Some(pkg)) = (
                db.graph(child).get_meta("library").map(str::to_string),
                db.graph(child).get_meta("package").map(str::to_string),
            ) {
                if !uses.contains(&(lib.clone(), pkg.clone())) {
                    uses.push((lib, pkg));
                }
            }
        }
        for (lib, pkg) in uses {
            header.line(Line::from(format!("library {};", lib)));
            header.line(Line::from(format!("use {}.{}.all;", lib, pkg)));
        }
        ret.block(header);
        ret.block(blank());

        ret.multi(Decl::component(db, top, config.entity_mode)?);
        ret.block(blank());

        ret.multi(Self::architecture(db, top)?);

        if config.indent > 0 {
            ret.shift(config.indent);
        }
        Ok(ret)
    }
}
