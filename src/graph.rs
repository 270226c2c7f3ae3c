//! Graphs: components and instances.
//!
//! A component is a named reusable block owning parameters, ports,
//! signals, node arrays and child instances. An instance is a placement
//! of a component inside another graph; it carries its own copies of the
//! component's parameters, ports and port arrays, so that bindings and
//! connections of one placement do not affect another. Instances may not
//! own signals, and components may only have instances as children.

use indexmap::IndexMap;
use log::warn;

use crate::database::{ArrayId, Database, GraphId, NodeId};
use crate::error::{Error, Result};
use crate::traits::{Document, Identify};

/// Graph variants.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphKind {
    /// A reusable component.
    Component,
    /// A placement of a component.
    Instance {
        /// The component this instance places.
        component: GraphId,
    },
}

/// A graph in some database.
#[derive(Debug, Clone)]
pub struct Graph {
    name: String,
    kind: GraphKind,
    /// Nodes owned by this graph, in insertion order.
    pub(crate) nodes: Vec<NodeId>,
    /// Node arrays owned by this graph, in insertion order.
    pub(crate) arrays: Vec<ArrayId>,
    /// Child graphs.
    pub(crate) children: Vec<GraphId>,
    /// Graphs this graph has been added to.
    pub(crate) parents: Vec<GraphId>,
    meta: IndexMap<String, String>,
    doc: Option<String>,
}

impl Graph {
    pub(crate) fn new(name: impl Into<String>, kind: GraphKind) -> Graph {
        Graph {
            name: name.into(),
            kind,
            nodes: vec![],
            arrays: vec![],
            children: vec![],
            parents: vec![],
            meta: IndexMap::new(),
            doc: None,
        }
    }

    /// Return the graph variant.
    pub fn kind(&self) -> &GraphKind {
        &self.kind
    }

    pub fn is_component(&self) -> bool {
        matches!(self.kind, GraphKind::Component)
    }

    pub fn is_instance(&self) -> bool {
        matches!(self.kind, GraphKind::Instance { .. })
    }

    /// Return the instantiated component, if this is an instance.
    pub fn component(&self) -> Option<GraphId> {
        match self.kind {
            GraphKind::Instance { component } => Some(component),
            _ => None,
        }
    }

    /// Nodes owned by this graph, in insertion order.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Node arrays owned by this graph, in insertion order.
    pub fn arrays(&self) -> &[ArrayId] {
        &self.arrays
    }

    /// Child graphs, in insertion order.
    pub fn children(&self) -> &[GraphId] {
        &self.children
    }

    /// Get a metadata value.
    pub fn get_meta(&self, key: &str) -> Option<&str> {
        self.meta.get(key).map(|s| s.as_str())
    }

    /// Set a metadata value.
    pub fn set_meta(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.meta.insert(key.into(), value.into());
    }

    /// Set the documentation of this graph.
    pub fn set_doc(&mut self, doc: impl Into<String>) {
        self.doc = Some(doc.into());
    }
}

impl Identify for Graph {
    fn identifier(&self) -> &str {
        self.name.as_str()
    }
}

impl Document for Graph {
    fn doc(&self) -> Option<String> {
        self.doc.clone()
    }
}

impl Database {
    /// Create an empty component and register it in the component pool.
    pub fn component(&mut self, name: impl Into<String>) -> GraphId {
        let name = name.into();
        let id = self.add_graph(Graph::new(name.clone(), GraphKind::Component));
        self.pool_component(&name, id);
        id
    }

    /// Add a node to a graph, making the graph its parent.
    ///
    /// Instances cannot own signals.
    pub fn add_object(&mut self, graph: GraphId, node: NodeId) -> Result<()> {
        if self.graph(graph).is_instance() && self.node(node).is_signal() {
            return Err(Error::ConnectivityError(format!(
                "cannot add signal \"{}\" to instance \"{}\"",
                self.node(node).identifier(),
                self.graph(graph).identifier()
            )));
        }
        self.node_mut(node).parent = Some(graph);
        self.graph_mut(graph).nodes.push(node);
        Ok(())
    }

    /// Add a node array to a graph, making the graph its parent.
    pub fn add_array_object(&mut self, graph: GraphId, array: ArrayId) -> Result<()> {
        let base = self.array(array).base();
        if self.graph(graph).is_instance() && self.node(base).is_signal() {
            return Err(Error::ConnectivityError(format!(
                "cannot add signal array \"{}\" to instance \"{}\"",
                self.array(array).identifier(),
                self.graph(graph).identifier()
            )));
        }
        self.array_mut(array).parent = Some(graph);
        self.node_mut(base).parent = Some(graph);
        let elements: Vec<NodeId> = self.array(array).nodes().to_vec();
        for element in elements {
            self.node_mut(element).parent = Some(graph);
        }
        self.graph_mut(graph).arrays.push(array);
        Ok(())
    }

    /// Add a child graph to a component. Only instances may be children.
    ///
    /// Re-adding a child that already has a parent is allowed; its
    /// parent list grows.
    pub fn add_child(&mut self, parent: GraphId, child: GraphId) -> Result<()> {
        if !self.graph(parent).is_component() {
            return Err(Error::ConnectivityError(format!(
                "\"{}\" is not a component; cannot add children to it",
                self.graph(parent).identifier()
            )));
        }
        if !self.graph(child).is_instance() {
            return Err(Error::ConnectivityError(format!(
                "components may only have instance children; \"{}\" is not an instance",
                self.graph(child).identifier()
            )));
        }
        if !self.graph(child).parents.is_empty() {
            warn!(
                "instance \"{}\" is already a child of another graph",
                self.graph(child).identifier()
            );
        }
        self.graph_mut(child).parents.push(parent);
        self.graph_mut(parent).children.push(child);
        Ok(())
    }

    /// Instantiate a component, naming the instance `<component>_inst`.
    pub fn instance(&mut self, component: GraphId) -> Result<GraphId> {
        let name = crate::cat!(self.graph(component).identifier(), "inst");
        self.instance_named(name, component)
    }

    /// Instantiate a component under a given instance name.
    ///
    /// The instance receives fresh copies of the component's parameters,
    /// ports and port arrays; port array sizes are re-pointed at the
    /// copied parameters.
    pub fn instance_named(
        &mut self,
        name: impl Into<String>,
        component: GraphId,
    ) -> Result<GraphId> {
        if !self.graph(component).is_component() {
            return Err(Error::ConnectivityError(format!(
                "cannot instantiate \"{}\": it is not a component",
                self.graph(component).identifier()
            )));
        }
        let id = self.add_graph(Graph::new(name, GraphKind::Instance { component }));

        // Copy parameters first, keeping a map to re-point array sizes.
        let mut param_map: Vec<(NodeId, NodeId)> = vec![];
        let nodes: Vec<NodeId> = self.graph(component).nodes.clone();
        for node in nodes.iter().copied() {
            if self.node(node).is_parameter() {
                let copy = self.copy_node(node);
                param_map.push((node, copy));
                self.add_object(id, copy)?;
            }
        }
        for node in nodes.iter().copied() {
            if self.node(node).is_port() {
                let copy = self.copy_node(node);
                self.add_object(id, copy)?;
            }
        }
        let arrays: Vec<ArrayId> = self.graph(component).arrays.clone();
        for array in arrays {
            let size = self.array(array).size();
            let size = param_map
                .iter()
                .find(|(old, _)| *old == size)
                .map(|(_, new)| *new)
                .unwrap_or(size);
            let copy = self.copy_array(array, size);
            self.add_array_object(id, copy)?;
        }
        Ok(id)
    }

    /// Get a node of a graph by name.
    pub fn get_node(&self, graph: GraphId, name: &str) -> Result<NodeId> {
        self.graph(graph)
            .nodes
            .iter()
            .copied()
            .find(|&n| self.node(n).identifier() == name)
            .ok_or_else(|| {
                Error::ConnectivityError(format!(
                    "node \"{}\" does not exist on graph \"{}\"",
                    name,
                    self.graph(graph).identifier()
                ))
            })
    }

    /// Get a node array of a graph by name.
    pub fn get_array(&self, graph: GraphId, name: &str) -> Result<ArrayId> {
        self.graph(graph)
            .arrays
            .iter()
            .copied()
            .find(|&a| self.array(a).identifier() == name)
            .ok_or_else(|| {
                Error::ConnectivityError(format!(
                    "array \"{}\" does not exist on graph \"{}\"",
                    name,
                    self.graph(graph).identifier()
                ))
            })
    }

    /// All parameter nodes of a graph, in insertion order.
    pub fn parameters_of(&self, graph: GraphId) -> Vec<NodeId> {
        self.nodes_of(graph, |db, n| db.node(n).is_parameter())
    }

    /// All port nodes of a graph, in insertion order.
    pub fn ports_of(&self, graph: GraphId) -> Vec<NodeId> {
        self.nodes_of(graph, |db, n| db.node(n).is_port())
    }

    /// All signal nodes of a graph, in insertion order.
    pub fn signals_of(&self, graph: GraphId) -> Vec<NodeId> {
        self.nodes_of(graph, |db, n| db.node(n).is_signal())
    }

    fn nodes_of(&self, graph: GraphId, keep: impl Fn(&Database, NodeId) -> bool) -> Vec<NodeId> {
        self.graph(graph)
            .nodes
            .iter()
            .copied()
            .filter(|&n| keep(self, n))
            .collect()
    }

    /// All instance children of a component.
    pub fn instances_of(&self, graph: GraphId) -> Vec<GraphId> {
        self.graph(graph)
            .children
            .iter()
            .copied()
            .filter(|&c| self.graph(c).is_instance())
            .collect()
    }

    /// The distinct components placed by the children of a graph, in
    /// first-use order.
    pub fn unique_child_components(&self, graph: GraphId) -> Vec<GraphId> {
        let mut result = vec![];
        for child in &self.graph(graph).children {
            let component = match self.graph(*child).kind() {
                GraphKind::Instance { component } => *component,
                GraphKind::Component => *child,
            };
            if !result.contains(&component) {
                result.push(component);
            }
        }
        result
    }
}
