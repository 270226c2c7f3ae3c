//! VHDL back-end.
//!
//! This module lowers a component tree to VHDL source files. Lowering
//! runs port-to-port resolution and stream expansion over the database,
//! then renders each component as an entity with an architecture
//! holding component declarations, signal declarations and instance
//! statements.

use std::fs;
use std::path::Path;

use log::debug;

use crate::database::{Database, GraphId};
use crate::generator::GenerateDesign;
use crate::traits::Identify;
use crate::Result;

pub mod block;
pub mod decl;
pub mod design;
pub mod inst;
pub mod resolve;
pub mod types;

pub use self::decl::Decl;
pub use self::design::Design;
pub use self::inst::Inst;
pub use self::resolve::Resolve;

/// VHDL back-end configuration parameters.
pub struct VhdlConfig {
    /// An optional suffix appended to generated files.
    /// The suffix is added as follows: `<filename>.<suffix>.vhd`.
    pub gen_suffix: Option<String>,
    /// Whether an existing file is preserved as `<file>.bak` before
    /// being overwritten.
    pub backup_existing: bool,
    /// Whether the top component renders as `entity` (true) or
    /// `component` (false).
    pub entity_mode: bool,
    /// Base indentation level for the emitted blocks.
    pub indent: usize,
}

impl Default for VhdlConfig {
    fn default() -> Self {
        VhdlConfig {
            gen_suffix: Some("gen".to_string()),
            backup_existing: false,
            entity_mode: true,
            indent: 0,
        }
    }
}

/// A configurable VHDL back-end entry point.
#[derive(Default)]
pub struct VhdlBackEnd {
    /// Configuration for the VHDL back-end.
    config: VhdlConfig,
}

impl VhdlBackEnd {
    /// Construct a back-end with the given configuration.
    pub fn new(config: VhdlConfig) -> VhdlBackEnd {
        VhdlBackEnd { config }
    }

    /// Return the configuration.
    pub fn config(&self) -> &VhdlConfig {
        &self.config
    }

    fn file_name(&self, component: &str) -> String {
        match &self.config.gen_suffix {
            None => format!("{}.vhd", component),
            Some(suffix) => format!("{}.{}.vhd", component, suffix),
        }
    }

    /// Collect the top component and every distinct non-primitive
    /// component below it.
    fn emitted_components(db: &Database, top: GraphId) -> Vec<GraphId> {
        let mut result = vec![top];
        let mut i = 0;
        while i < result.len() {
            let comp = result[i];
            i += 1;
            for child in db.unique_child_components(comp) {
                if db.graph(child).get_meta(types::META_PRIMITIVE) == Some("true") {
                    continue;
                }
                if !result.contains(&child) {
                    result.push(child);
                }
            }
        }
        result
    }
}

impl GenerateDesign for VhdlBackEnd {
    /// Generate one `.vhd` file per emitted component of the design.
    fn generate(&self, db: &mut Database, top: GraphId, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        for comp in Self::emitted_components(db, top) {
            let code = design::Design::generate(db, comp, &self.config)?;
            let file = path.join(self.file_name(db.graph(comp).identifier()));
            if self.config.backup_existing && file.exists() {
                let mut backup = file.clone().into_os_string();
                backup.push(".bak");
                fs::rename(&file, backup)?;
            }
            debug!("writing {}", file.display());
            fs::write(&file, code.to_string())?;
        }
        Ok(())
    }
}
