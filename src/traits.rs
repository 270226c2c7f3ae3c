//! Common traits of the graph IR.

/// In-place direction reversal.
///
/// Directions in the IR flip whenever a bundle is viewed from the other
/// end of a connection: an output port reads as an input on the far
/// side, and an inverted record field, like the `ready` wire of a
/// handshake, swaps its mode against the enclosing port.
///
/// ```rust
/// use draad::node::Mode;
/// use draad::{Reverse, Reversed};
///
/// let mut mode = Mode::Out;
/// mode.reverse();
/// assert_eq!(mode, Mode::In);
///
/// // `Reversed` comes for free with `Reverse + Clone`.
/// assert_eq!(mode.reversed(), Mode::Out);
/// ```
pub trait Reverse {
    /// Reverse in-place.
    fn reverse(&mut self);
}

/// Construct reversed items.
pub trait Reversed {
    /// Returns a reversed copy of self.
    fn reversed(&self) -> Self;
}

impl<T> Reversed for T
where
    T: Reverse + Clone,
{
    fn reversed(&self) -> T {
        let mut result = self.clone();
        result.reverse();
        result
    }
}

/// Things with a name.
///
/// Types, nodes, edges, graphs and mappers all identify themselves by a
/// borrowed string; emitted VHDL identifiers and diagnostics are built
/// from these.
pub trait Identify {
    /// Return the identifier of self.
    fn identifier(&self) -> &str;
}

/// Things that can carry user-written documentation.
///
/// Documentation on nodes and graphs is rendered as comment lines above
/// their declarations in the emitted VHDL.
///
/// ```rust
/// use draad::node::Mode;
/// use draad::{Database, Document};
///
/// let mut db = Database::new();
/// let bit = db.bit();
/// let clk = db.port("clk", bit, Mode::In);
/// db.node_mut(clk).set_doc("Kernel clock.");
/// assert_eq!(db.node(clk).doc(), Some("Kernel clock.".to_string()));
/// ```
pub trait Document {
    /// Return optionally existing user-written documentation of self.
    fn doc(&self) -> Option<String>;
}
