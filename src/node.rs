//! Nodes.
//!
//! A node is anything that can terminate an edge: ports and signals carry
//! wires, parameters and literals carry elaboration-time values, and
//! expression nodes carry width and offset arithmetic over the others.

use indexmap::IndexMap;

use crate::database::{ArrayId, Database, EdgeId, GraphId, NodeId, TypeId};
use crate::error::{Error, Result};
use crate::expr::Operator;
use crate::traits::{Document, Identify, Reverse};

/// Port modes.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Mode {
    /// Input.
    In,
    /// Output.
    Out,
}

impl Reverse for Mode {
    fn reverse(&mut self) {
        *self = match self {
            Mode::In => Mode::Out,
            Mode::Out => Mode::In,
        };
    }
}

/// Storage of a literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum LitValue {
    /// A boolean literal.
    Bool(bool),
    /// An integer literal.
    Int(i64),
    /// A string literal.
    Str(String),
}

/// Node variants.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// A literal value, e.g. a vector width or a generic binding.
    Literal(LitValue),
    /// An elaboration-time parameter, optionally with a default literal.
    /// A bound value, when present, is the source of the parameter's
    /// first incoming edge.
    Parameter { default: Option<NodeId> },
    /// A wire bundle at a graph boundary.
    Port { mode: Mode },
    /// A wire bundle inside a component.
    Signal,
    /// A binary arithmetic expression over two other nodes.
    Expression {
        op: Operator,
        lhs: NodeId,
        rhs: NodeId,
    },
}

impl NodeKind {
    /// Return the variant name.
    pub fn token(&self) -> &'static str {
        match self {
            NodeKind::Literal(_) => "literal",
            NodeKind::Parameter { .. } => "parameter",
            NodeKind::Port { .. } => "port",
            NodeKind::Signal => "signal",
            NodeKind::Expression { .. } => "expression",
        }
    }
}

/// A node in some database.
#[derive(Debug, Clone)]
pub struct Node {
    name: String,
    kind: NodeKind,
    typ: TypeId,
    /// Optional clock domain, for ports and signals.
    domain: Option<String>,
    doc: Option<String>,
    pub(crate) ins: Vec<EdgeId>,
    pub(crate) outs: Vec<EdgeId>,
    pub(crate) parent: Option<GraphId>,
    pub(crate) array: Option<ArrayId>,
    meta: IndexMap<String, String>,
}

impl Node {
    /// Construct a new node without edges, parent or array membership.
    pub fn new(name: impl Into<String>, kind: NodeKind, typ: TypeId) -> Node {
        Node {
            name: name.into(),
            kind,
            typ,
            domain: None,
            doc: None,
            ins: vec![],
            outs: vec![],
            parent: None,
            array: None,
            meta: IndexMap::new(),
        }
    }

    /// Return the node variant.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Return the node type.
    pub fn typ(&self) -> TypeId {
        self.typ
    }

    /// Return the clock domain, if any.
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// Set the clock domain.
    pub fn set_domain(&mut self, domain: impl Into<String>) {
        self.domain = Some(domain.into());
    }

    /// Set the documentation of this node.
    pub fn set_doc(&mut self, doc: impl Into<String>) {
        self.doc = Some(doc.into());
    }

    /// Rename this node.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Return the incoming edges.
    pub fn ins(&self) -> &[EdgeId] {
        &self.ins
    }

    /// Return the outgoing edges.
    pub fn outs(&self) -> &[EdgeId] {
        &self.outs
    }

    /// Return the parent graph, if the node was added to one.
    pub fn parent(&self) -> Option<GraphId> {
        self.parent
    }

    /// Return the node array this node is an element of, if any.
    pub fn array(&self) -> Option<ArrayId> {
        self.array
    }

    pub fn is_port(&self) -> bool {
        matches!(self.kind, NodeKind::Port { .. })
    }

    pub fn is_signal(&self) -> bool {
        matches!(self.kind, NodeKind::Signal)
    }

    pub fn is_parameter(&self) -> bool {
        matches!(self.kind, NodeKind::Parameter { .. })
    }

    pub fn is_literal(&self) -> bool {
        matches!(self.kind, NodeKind::Literal(_))
    }

    pub fn is_expression(&self) -> bool {
        matches!(self.kind, NodeKind::Expression { .. })
    }

    /// Return the port mode, if this is a port.
    pub fn mode(&self) -> Option<Mode> {
        match self.kind {
            NodeKind::Port { mode } => Some(mode),
            _ => None,
        }
    }

    /// Return the literal value, if this is a literal.
    pub fn lit(&self) -> Option<&LitValue> {
        match &self.kind {
            NodeKind::Literal(value) => Some(value),
            _ => None,
        }
    }

    /// Return the integer value, if this is an integer literal.
    pub fn int_value(&self) -> Option<i64> {
        match &self.kind {
            NodeKind::Literal(LitValue::Int(value)) => Some(*value),
            _ => None,
        }
    }

    /// Return the default value node, if this is a parameter with one.
    pub fn default_value(&self) -> Option<NodeId> {
        match self.kind {
            NodeKind::Parameter { default } => default,
            _ => None,
        }
    }

    /// Get a metadata value.
    pub fn get_meta(&self, key: &str) -> Option<&str> {
        self.meta.get(key).map(|s| s.as_str())
    }

    /// Set a metadata value.
    pub fn set_meta(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.meta.insert(key.into(), value.into());
    }
}

impl Identify for Node {
    fn identifier(&self) -> &str {
        self.name.as_str()
    }
}

impl Document for Node {
    fn doc(&self) -> Option<String> {
        self.doc.clone()
    }
}

impl Database {
    /// Create a parameter node, optionally with a default literal.
    pub fn parameter(
        &mut self,
        name: impl Into<String>,
        typ: TypeId,
        default: Option<NodeId>,
    ) -> Result<NodeId> {
        let name = name.into();
        if let Some(default) = default {
            if !self.node(default).is_literal() {
                return Err(Error::TypeError(format!(
                    "default value of parameter \"{}\" must be a literal",
                    name
                )));
            }
        }
        Ok(self.add_node(Node::new(name, NodeKind::Parameter { default }, typ)))
    }

    /// Create a port node.
    pub fn port(&mut self, name: impl Into<String>, typ: TypeId, mode: Mode) -> NodeId {
        self.add_node(Node::new(name, NodeKind::Port { mode }, typ))
    }

    /// Create a port node in a clock domain.
    pub fn port_in_domain(
        &mut self,
        name: impl Into<String>,
        typ: TypeId,
        mode: Mode,
        domain: impl Into<String>,
    ) -> NodeId {
        let id = self.port(name, typ, mode);
        self.node_mut(id).set_domain(domain);
        id
    }

    /// Create a signal node.
    pub fn signal(&mut self, name: impl Into<String>, typ: TypeId) -> NodeId {
        self.add_node(Node::new(name, NodeKind::Signal, typ))
    }

    /// Create a signal node in a clock domain.
    pub fn signal_in_domain(
        &mut self,
        name: impl Into<String>,
        typ: TypeId,
        domain: impl Into<String>,
    ) -> NodeId {
        let id = self.signal(name, typ);
        self.node_mut(id).set_domain(domain);
        id
    }

    /// Create a fresh copy of a node: same name, kind, type, domain and
    /// documentation, but no edges, parent or array membership.
    pub fn copy_node(&mut self, node: NodeId) -> NodeId {
        let src = self.node(node);
        let mut copy = Node::new(src.identifier(), src.kind().clone(), src.typ());
        if let Some(domain) = src.domain() {
            copy.set_domain(domain);
        }
        if let Some(doc) = src.doc() {
            copy.set_doc(doc);
        }
        self.add_node(copy)
    }

    /// Return the bound value of a parameter: the source of its first
    /// incoming edge.
    pub fn param_value(&self, param: NodeId) -> Option<NodeId> {
        if !self.node(param).is_parameter() {
            return None;
        }
        self.node(param)
            .ins
            .first()
            .map(|&edge| self.edge(edge).src)
    }

    /// Resolve a parameter for rendering: bound value if present, else
    /// the default. `None` means the parameter is a free generic.
    pub fn param_resolve(&self, param: NodeId) -> Option<NodeId> {
        self.param_value(param)
            .or_else(|| self.node(param).default_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_reverse() {
        use crate::traits::Reversed;
        assert_eq!(Mode::In.reversed(), Mode::Out);
        assert_eq!(Mode::Out.reversed(), Mode::In);
    }

    #[test]
    fn parameter_default_must_be_literal() {
        let mut db = Database::new();
        let int = db.integer();
        let lit = db.int_lit(3);
        let ok = db.parameter("depth", int, Some(lit));
        assert!(ok.is_ok());

        let port = db.port("p", int, Mode::In);
        let err = db.parameter("bad", int, Some(port)).unwrap_err();
        match err {
            Error::TypeError(msg) => assert!(msg.contains("bad")),
            _ => panic!(),
        }
    }

    #[test]
    fn copy_preserves_type_and_detaches() {
        let mut db = Database::new();
        let v8 = db.vec(8);
        let a = db.port("a", v8, Mode::Out);
        let b = db.copy_node(a);
        db.node_mut(b).set_name("b");
        assert_eq!(db.node(a).typ(), db.node(b).typ());
        assert_eq!(db.node(b).identifier(), "b");
        assert!(db.node(b).ins().is_empty());
        assert!(db.node(b).outs().is_empty());
        assert_eq!(db.node(b).parent(), None);
    }

    #[test]
    fn parameter_resolution_order() {
        let mut db = Database::new();
        let int = db.integer();
        let dflt = db.int_lit(32);
        let param = db.parameter("w", int, Some(dflt)).unwrap();
        assert_eq!(db.param_resolve(param), Some(dflt));

        let bound = db.int_lit(64);
        db.connect(param, bound).unwrap();
        assert_eq!(db.param_resolve(param), Some(bound));

        let free = db.parameter("f", int, None).unwrap();
        assert_eq!(db.param_resolve(free), None);
    }
}
