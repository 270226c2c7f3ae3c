//! Generator back-ends.
//!
//! The generator module is enabled by the `generator` feature flag.

use std::path::Path;

use crate::database::{Database, GraphId};
use crate::Result;

pub mod vhdl;

/// Trait to generate output files for a whole design.
pub trait GenerateDesign {
    /// Generate output for the design rooted at `top` into a directory.
    ///
    /// Back-ends may run lowering transformations on the database before
    /// emitting; the graph structure itself is treated as read-only.
    fn generate(&self, db: &mut Database, top: GraphId, path: &Path) -> Result<()>;
}
