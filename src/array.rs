//! Node arrays: replicated ports and signals.
//!
//! A node array groups N copies of a base node, where N is itself a
//! node: a literal, an expression, or a parameter whose binding grows as
//! elements are appended. The VHDL back-end vectorizes an array into a
//! single wide port and gives each element its own slice.

use crate::database::{ArrayId, Database, GraphId, NodeId, TypeId};
use crate::error::{Error, Result};
use crate::node::Mode;
use crate::traits::Identify;

/// A group of replicated nodes sharing a base node and a size node.
#[derive(Debug, Clone)]
pub struct NodeArray {
    name: String,
    /// Template for the element nodes.
    base: NodeId,
    /// Number of elements, as a node.
    size: NodeId,
    /// The element nodes.
    pub(crate) nodes: Vec<NodeId>,
    pub(crate) parent: Option<GraphId>,
}

impl NodeArray {
    /// The template node for elements.
    pub fn base(&self) -> NodeId {
        self.base
    }

    /// The size node.
    pub fn size(&self) -> NodeId {
        self.size
    }

    /// The element nodes, in append order.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// The number of appended elements.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// The graph that owns this array, if any.
    pub fn parent(&self) -> Option<GraphId> {
        self.parent
    }

    pub(crate) fn set_size(&mut self, size: NodeId) {
        self.size = size;
    }
}

impl Identify for NodeArray {
    fn identifier(&self) -> &str {
        self.name.as_str()
    }
}

impl Database {
    /// Create a port array with the given base type, size node and mode.
    pub fn port_array(
        &mut self,
        name: impl Into<String>,
        typ: TypeId,
        size: NodeId,
        mode: Mode,
    ) -> ArrayId {
        let name = name.into();
        let base = self.port(name.clone(), typ, mode);
        self.new_array(name, base, size)
    }

    /// Create a signal array with the given base type and size node.
    pub fn signal_array(&mut self, name: impl Into<String>, typ: TypeId, size: NodeId) -> ArrayId {
        let name = name.into();
        let base = self.signal(name.clone(), typ);
        self.new_array(name, base, size)
    }

    fn new_array(&mut self, name: String, base: NodeId, size: NodeId) -> ArrayId {
        let id = self.add_array(NodeArray {
            name,
            base,
            size,
            nodes: vec![],
            parent: None,
        });
        self.node_mut(base).array = Some(id);
        id
    }

    /// Copy an array for instantiation: a fresh base, the given size
    /// node, and no elements.
    pub(crate) fn copy_array(&mut self, array: ArrayId, size: NodeId) -> ArrayId {
        let name = self.array(array).identifier().to_string();
        let base = self.copy_node(self.array(array).base());
        self.new_array(name, base, size)
    }

    /// The element type of an array.
    pub fn array_type(&self, array: ArrayId) -> TypeId {
        self.node(self.array(array).base()).typ()
    }

    /// Append an element to an array.
    ///
    /// The new element is a copy of the base named `<base>N`, with N the
    /// element count before the append. The size node grows by one:
    /// literals and expressions are replaced by `size + 1`, parameters
    /// are re-bound to their incremented value (or to literal 1 when
    /// unbound). Returns the new element.
    pub fn append_to_array(&mut self, array: ArrayId) -> Result<NodeId> {
        let base = self.array(array).base();
        let element = self.copy_node(base);
        let name = format!(
            "{}{}",
            self.array(array).identifier(),
            self.array(array).num_nodes()
        );
        self.node_mut(element).set_name(name);
        self.node_mut(element).array = Some(array);
        self.node_mut(element).parent = self.array(array).parent();
        self.array_mut(array).nodes.push(element);

        let size = self.array(array).size();
        let new_size = self.increment_node(size)?;
        self.array_mut(array).set_size(new_size);
        Ok(element)
    }

    /// Return element `i` of an array.
    pub fn array_node(&self, array: ArrayId, i: usize) -> Result<NodeId> {
        if i < self.array(array).num_nodes() {
            Ok(self.array(array).nodes[i])
        } else {
            Err(Error::IndexError(format!(
                "index {} out of bounds for array \"{}\" of {} nodes",
                i,
                self.array(array).identifier(),
                self.array(array).num_nodes()
            )))
        }
    }

    /// Return the index of an element within its array.
    pub fn array_index_of(&self, array: ArrayId, node: NodeId) -> Option<usize> {
        self.array(array).nodes.iter().position(|&n| n == node)
    }

    /// Grow a size node by one.
    ///
    /// Literals and expressions become a `node + 1` expression.
    /// Parameters keep their identity: their bound value is incremented
    /// recursively, or set to literal 1 when unbound.
    pub fn increment_node(&mut self, node: NodeId) -> Result<NodeId> {
        if self.node(node).is_literal() || self.node(node).is_expression() {
            let one = self.one();
            Ok(self.add(node, one))
        } else if self.node(node).is_parameter() {
            match self.param_value(node) {
                Some(value) => {
                    let incremented = self.increment_node(value)?;
                    self.rebind_parameter(node, incremented)?;
                }
                None => {
                    let one = self.one();
                    self.rebind_parameter(node, one)?;
                }
            }
            Ok(node)
        } else {
            Err(Error::TypeError(format!(
                "cannot increment node \"{}\" of kind {}",
                self.node(node).identifier(),
                self.node(node).kind().token()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_names_and_size() {
        let mut db = Database::new();
        let v8 = db.vec(8);
        let zero = db.zero();
        let array = db.port_array("a", v8, zero, Mode::Out);
        let e0 = db.append_to_array(array).unwrap();
        let e1 = db.append_to_array(array).unwrap();
        assert_eq!(db.node(e0).identifier(), "a0");
        assert_eq!(db.node(e1).identifier(), "a1");
        assert_eq!(db.node(e0).array(), Some(array));
        assert_eq!(db.array_index_of(array, e1), Some(1));
        // Size is 0 + 1 + 1, minimized to 2.
        let size = db.array(array).size();
        assert_eq!(db.render_node(size), "2");
    }

    #[test]
    fn append_grows_parameter_binding() {
        let mut db = Database::new();
        let v8 = db.vec(8);
        let int = db.integer();
        let zero = db.zero();
        let size = db.parameter("size", int, Some(zero)).unwrap();
        let array = db.port_array("a", v8, size, Mode::Out);

        db.append_to_array(array).unwrap();
        // The size node is still the parameter.
        assert_eq!(db.array(array).size(), size);
        assert_eq!(db.render_node(db.param_value(size).unwrap()), "1");

        db.append_to_array(array).unwrap();
        assert_eq!(db.array(array).size(), size);
        assert_eq!(db.render_node(db.param_value(size).unwrap()), "2");
    }

    #[test]
    fn index_bounds() {
        let mut db = Database::new();
        let v8 = db.vec(8);
        let zero = db.zero();
        let array = db.port_array("a", v8, zero, Mode::Out);
        db.append_to_array(array).unwrap();
        assert!(db.array_node(array, 0).is_ok());
        match db.array_node(array, 1).unwrap_err() {
            Error::IndexError(msg) => assert!(msg.contains("\"a\"")),
            _ => panic!(),
        }
    }

    #[test]
    fn increment_rejects_wires() {
        let mut db = Database::new();
        let v8 = db.vec(8);
        let port = db.port("p", v8, Mode::In);
        assert!(db.increment_node(port).is_err());
    }
}
