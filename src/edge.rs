//! Edges: directed connections between nodes.
//!
//! An edge is shared by both endpoints: the source holds it in its
//! outgoing list, the destination in its incoming list. Connecting does
//! not validate direction legality; that is checked against the type
//! mappers at emission time.

use log::debug;

use crate::database::{Database, EdgeId, NodeId};
use crate::error::{Error, Result};
use crate::traits::Identify;
use crate::typ::TypeKind;

/// A directed edge between two nodes.
#[derive(Debug, Clone)]
pub struct Edge {
    name: String,
    pub(crate) src: NodeId,
    pub(crate) dst: NodeId,
}

impl Edge {
    /// The source node.
    pub fn src(&self) -> NodeId {
        self.src
    }

    /// The destination node.
    pub fn dst(&self) -> NodeId {
        self.dst
    }

    /// Return the endpoint opposite to `node`.
    pub fn other(&self, node: NodeId) -> Result<NodeId> {
        if self.src == node {
            Ok(self.dst)
        } else if self.dst == node {
            Ok(self.src)
        } else {
            Err(Error::ConnectivityError(format!(
                "edge \"{}\" is not connected to the queried node",
                self.name
            )))
        }
    }
}

impl Identify for Edge {
    fn identifier(&self) -> &str {
        self.name.as_str()
    }
}

impl Database {
    /// Return the node name qualified with its parent graph name, when
    /// it has one.
    pub fn qualified_name(&self, node: NodeId) -> String {
        match self.node(node).parent() {
            Some(parent) => crate::cat!(
                self.graph(parent).identifier(),
                self.node(node).identifier()
            ),
            None => self.node(node).identifier().to_string(),
        }
    }

    /// Connect two nodes, returning the new edge.
    ///
    /// Literal sources connect to any destination; any other source must
    /// have the same type variant as the destination. Deeper structural
    /// compatibility is verified through the type mappers at emission
    /// time.
    pub fn connect(&mut self, dst: NodeId, src: NodeId) -> Result<EdgeId> {
        if !self.node(src).is_literal() {
            let src_kind = self.typ(self.node(src).typ()).kind();
            let dst_kind = self.typ(self.node(dst).typ()).kind();
            if !src_kind.same_variant(dst_kind) {
                return Err(Error::ConnectivityError(format!(
                    "cannot connect \"{}\" ({}) to \"{}\" ({})",
                    self.node(src).identifier(),
                    src_kind.token(),
                    self.node(dst).identifier(),
                    dst_kind.token()
                )));
            }
        }
        let name = crate::cat!(self.qualified_name(src), "to", self.qualified_name(dst));
        debug!("connect: {}", name);
        let edge = self.add_edge(Edge { name, src, dst });
        self.node_mut(src).outs.push(edge);
        self.node_mut(dst).ins.push(edge);
        Ok(edge)
    }

    /// Detach an edge from both of its endpoints. The edge stays in the
    /// arena but is no longer reachable through any node.
    pub(crate) fn remove_edge(&mut self, edge: EdgeId) {
        let (src, dst) = (self.edge(edge).src, self.edge(edge).dst);
        self.node_mut(src).outs.retain(|&e| e != edge);
        self.node_mut(dst).ins.retain(|&e| e != edge);
    }

    /// Bind a parameter to a value, replacing any existing binding.
    pub fn rebind_parameter(&mut self, param: NodeId, value: NodeId) -> Result<EdgeId> {
        if !self.node(param).is_parameter() {
            return Err(Error::ConnectivityError(format!(
                "\"{}\" is not a parameter",
                self.node(param).identifier()
            )));
        }
        let old: Vec<EdgeId> = self.node(param).ins.clone();
        for edge in old {
            self.remove_edge(edge);
        }
        self.connect(param, value)
    }

    /// Return the sibling edges of `edge` on the side of `node`: the
    /// outgoing list when `node` is the source, the incoming list when it
    /// is the destination.
    pub fn siblings(&self, node: NodeId, edge: EdgeId) -> Result<&[EdgeId]> {
        let e = self.edge(edge);
        if e.src == node {
            Ok(&self.node(node).outs)
        } else if e.dst == node {
            Ok(&self.node(node).ins)
        } else {
            Err(Error::ConnectivityError(format!(
                "edge \"{}\" is not an edge of node \"{}\"",
                e.identifier(),
                self.node(node).identifier()
            )))
        }
    }

    /// Return the bit offset of `edge` among its siblings on `node`:
    /// the summed widths of all preceding siblings. Used to slice a
    /// vector-typed node when several edges fan into it.
    ///
    /// Only literal widths contribute; parametric widths are not
    /// supported here and count as zero.
    pub fn vector_offset(&self, node: NodeId, edge: EdgeId) -> Result<i64> {
        let siblings: Vec<EdgeId> = self.siblings(node, edge)?.to_vec();
        let mut offset = 0;
        for sibling in siblings {
            if sibling == edge {
                break;
            }
            let other = self.edge(sibling).other(node)?;
            let mut typ = self.node(other).typ();
            // Streams count as their element.
            if let TypeKind::Stream { element, .. } = db_kind(self, typ) {
                typ = element;
            }
            if let TypeKind::Vector { width } = db_kind(self, typ) {
                if let Some(value) = self.node(width).int_value() {
                    offset += value;
                }
            }
        }
        Ok(offset)
    }
}

fn db_kind(db: &Database, typ: crate::database::TypeId) -> TypeKind {
    db.typ(typ).kind().clone()
}
