//! The database owning all IR storage.
//!
//! Types, nodes, edges, graphs and node arrays live in arenas inside a
//! [`Database`] and are addressed through small copyable ids. A database
//! spans one generation run; ids from one database are meaningless in
//! another.
//!
//! The database also owns the two name-keyed pools: the type pool, which
//! shares wire-level types between users, and the component pool, which
//! prevents shared primitive components from being generated twice.
//!
//! [`Database`]: ./struct.Database.html

use indexmap::IndexMap;
use log::debug;

use crate::array::NodeArray;
use crate::edge::Edge;
use crate::error::{Error, Result};
use crate::graph::Graph;
use crate::node::{LitValue, Node, NodeKind};
use crate::traits::Identify;
use crate::typ::{Type, TypeKind};

/// Id of a [`Type`] in a database.
///
/// [`Type`]: ../typ/struct.Type.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub(crate) usize);

/// Id of a [`Node`] in a database.
///
/// [`Node`]: ../node/struct.Node.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

/// Id of an [`Edge`] in a database.
///
/// [`Edge`]: ../edge/struct.Edge.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub(crate) usize);

/// Id of a [`Graph`] in a database.
///
/// [`Graph`]: ../graph/struct.Graph.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GraphId(pub(crate) usize);

/// Id of a [`NodeArray`] in a database.
///
/// [`NodeArray`]: ../array/struct.NodeArray.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArrayId(pub(crate) usize);

/// Arena storage and pools for a single generation run.
#[derive(Debug)]
pub struct Database {
    pub(crate) types: Vec<Type>,
    pub(crate) nodes: Vec<Node>,
    pub(crate) edges: Vec<Edge>,
    pub(crate) graphs: Vec<Graph>,
    pub(crate) arrays: Vec<NodeArray>,

    /// Wire-level types shared by canonical name.
    type_pool: IndexMap<String, TypeId>,
    /// Components shared by name.
    component_pool: IndexMap<String, GraphId>,
    /// Interned integer literal nodes.
    int_literals: IndexMap<i64, NodeId>,

    // Static singleton types and literals.
    bit: TypeId,
    integer: TypeId,
    natural: TypeId,
    string: TypeId,
    boolean: TypeId,
    lit_true: NodeId,
    lit_false: NodeId,
}

impl Database {
    /// Construct an empty database holding the primitive singleton types
    /// and the interned boolean literals.
    pub fn new() -> Database {
        let mut db = Database {
            types: vec![],
            nodes: vec![],
            edges: vec![],
            graphs: vec![],
            arrays: vec![],
            type_pool: IndexMap::new(),
            component_pool: IndexMap::new(),
            int_literals: IndexMap::new(),
            bit: TypeId(0),
            integer: TypeId(0),
            natural: TypeId(0),
            string: TypeId(0),
            boolean: TypeId(0),
            lit_true: NodeId(0),
            lit_false: NodeId(0),
        };
        db.bit = db.add_type(Type::new("bit", TypeKind::Bit));
        db.integer = db.add_type(Type::new("integer", TypeKind::Integer));
        db.natural = db.add_type(Type::new("natural", TypeKind::Natural));
        db.string = db.add_type(Type::new("string", TypeKind::String));
        db.boolean = db.add_type(Type::new("boolean", TypeKind::Boolean));
        db.lit_true = db.add_node(Node::new(
            "lit_true",
            NodeKind::Literal(LitValue::Bool(true)),
            db.boolean,
        ));
        db.lit_false = db.add_node(Node::new(
            "lit_false",
            NodeKind::Literal(LitValue::Bool(false)),
            db.boolean,
        ));
        db
    }

    // Singleton types.

    /// The generic single-wire bit type.
    pub fn bit(&self) -> TypeId {
        self.bit
    }

    /// The abstract integer type.
    pub fn integer(&self) -> TypeId {
        self.integer
    }

    /// The abstract natural type.
    pub fn natural(&self) -> TypeId {
        self.natural
    }

    /// The abstract string type.
    pub fn string(&self) -> TypeId {
        self.string
    }

    /// The abstract boolean type.
    pub fn boolean(&self) -> TypeId {
        self.boolean
    }

    // Arena accessors. Ids are only minted by the database itself, so
    // lookups index directly.

    /// Return a reference to a type.
    pub fn typ(&self, id: TypeId) -> &Type {
        &self.types[id.0]
    }

    /// Return a mutable reference to a type.
    pub fn typ_mut(&mut self, id: TypeId) -> &mut Type {
        &mut self.types[id.0]
    }

    /// Return a reference to a node.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Return a mutable reference to a node.
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Return a reference to an edge.
    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.0]
    }

    /// Return a reference to a graph.
    pub fn graph(&self, id: GraphId) -> &Graph {
        &self.graphs[id.0]
    }

    /// Return a mutable reference to a graph.
    pub fn graph_mut(&mut self, id: GraphId) -> &mut Graph {
        &mut self.graphs[id.0]
    }

    /// Return a reference to a node array.
    pub fn array(&self, id: ArrayId) -> &NodeArray {
        &self.arrays[id.0]
    }

    /// Return a mutable reference to a node array.
    pub fn array_mut(&mut self, id: ArrayId) -> &mut NodeArray {
        &mut self.arrays[id.0]
    }

    // Arena insertion.

    /// Add a type to the arena without pooling it. Used for anonymous
    /// helper types; named wire-level types should go through
    /// [`intern_type`].
    ///
    /// [`intern_type`]: #method.intern_type
    pub fn add_type(&mut self, typ: Type) -> TypeId {
        let id = TypeId(self.types.len());
        self.types.push(typ);
        id
    }

    pub(crate) fn add_node(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub(crate) fn add_edge(&mut self, edge: Edge) -> EdgeId {
        let id = EdgeId(self.edges.len());
        self.edges.push(edge);
        id
    }

    pub(crate) fn add_graph(&mut self, graph: Graph) -> GraphId {
        let id = GraphId(self.graphs.len());
        self.graphs.push(graph);
        id
    }

    pub(crate) fn add_array(&mut self, array: NodeArray) -> ArrayId {
        let id = ArrayId(self.arrays.len());
        self.arrays.push(array);
        id
    }

    // Pools.

    /// Register a type in the type pool, or return the id already cached
    /// under its name.
    ///
    /// Re-requesting a name with an identical structure is an idempotent
    /// reference bump. Re-requesting it with a different structure is
    /// fatal.
    pub fn intern_type(&mut self, typ: Type) -> Result<TypeId> {
        if let Some(&cached) = self.type_pool.get(typ.identifier()) {
            if self.typ(cached).kind() == typ.kind() {
                debug!("type pool: reusing \"{}\"", typ.identifier());
                return Ok(cached);
            }
            return Err(Error::PoolError(format!(
                "type \"{}\" already registered with a different structure",
                typ.identifier()
            )));
        }
        let name = typ.identifier().to_string();
        let id = self.add_type(typ);
        self.type_pool.insert(name, id);
        Ok(id)
    }

    /// Look up a pooled type by name.
    pub fn find_type(&self, name: &str) -> Option<TypeId> {
        self.type_pool.get(name).copied()
    }

    pub(crate) fn pool_component(&mut self, name: &str, id: GraphId) {
        if self.component_pool.contains_key(name) {
            debug!("component pool: \"{}\" already registered, keeping first", name);
            return;
        }
        self.component_pool.insert(name.to_string(), id);
    }

    /// Look up a pooled component by name.
    pub fn find_component(&self, name: &str) -> Option<GraphId> {
        self.component_pool.get(name).copied()
    }

    // Interned literals.

    /// Return the interned integer literal node for `value`.
    pub fn int_lit(&mut self, value: i64) -> NodeId {
        if let Some(&id) = self.int_literals.get(&value) {
            return id;
        }
        let id = self.add_node(Node::new(
            format!("lit_{}", value),
            NodeKind::Literal(LitValue::Int(value)),
            self.integer,
        ));
        self.int_literals.insert(value, id);
        id
    }

    /// Return the interned boolean literal node for `value`.
    pub fn bool_lit(&self, value: bool) -> NodeId {
        if value {
            self.lit_true
        } else {
            self.lit_false
        }
    }

    /// Create a string literal node. The node is named after its value.
    pub fn str_lit(&mut self, value: impl Into<String>) -> NodeId {
        let value = value.into();
        self.add_node(Node::new(
            value.clone(),
            NodeKind::Literal(LitValue::Str(value)),
            self.string,
        ))
    }

    /// The interned literal 0.
    pub fn zero(&mut self) -> NodeId {
        self.int_lit(0)
    }

    /// The interned literal 1.
    pub fn one(&mut self) -> NodeId {
        self.int_lit(1)
    }
}

impl Default for Database {
    fn default() -> Self {
        Database::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singletons() {
        let db = Database::new();
        assert_eq!(db.bit(), db.bit());
        assert_ne!(db.bit(), db.integer());
        assert_eq!(db.typ(db.natural()).identifier(), "natural");
    }

    #[test]
    fn literal_interning() {
        let mut db = Database::new();
        assert_eq!(db.int_lit(42), db.int_lit(42));
        assert_ne!(db.int_lit(42), db.int_lit(43));
        assert_eq!(db.bool_lit(true), db.bool_lit(true));
        assert_ne!(db.str_lit("a"), db.str_lit("a"));
    }

    #[test]
    fn type_pool_idempotent() {
        let mut db = Database::new();
        let a = db.intern_type(Type::new("t", TypeKind::Bit)).unwrap();
        let b = db.intern_type(Type::new("t", TypeKind::Bit)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn type_pool_conflict() {
        let mut db = Database::new();
        db.intern_type(Type::new("t", TypeKind::Bit)).unwrap();
        let err = db
            .intern_type(Type::new("t", TypeKind::Integer))
            .unwrap_err();
        match err {
            Error::PoolError(msg) => assert!(msg.contains("\"t\"")),
            _ => panic!(),
        }
    }
}
