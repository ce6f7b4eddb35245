/*
 * World Module
 *
 * The world owns every node and connection. It is centred on the origin:
 * nodes live in [-half_width, half_width] x [-half_height, half_height].
 *
 * Nodes are only ever appended, so a node's index is a stable identity for
 * the whole run and connections can refer to their endpoints by NodeId.
 */

use std::collections::BTreeMap;

use crate::connection::{Connection, PairKey};
use crate::node::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub half_width: f32,
    pub half_height: f32,
}

impl Bounds {
    pub fn new(half_width: f32, half_height: f32) -> Self {
        Self { half_width, half_height }
    }

    pub fn from_size(width: f32, height: f32) -> Self {
        Self::new(width / 2.0, height / 2.0)
    }

    pub fn width(&self) -> f32 {
        self.half_width * 2.0
    }

    pub fn height(&self) -> f32 {
        self.half_height * 2.0
    }
}

#[derive(Debug, Clone)]
pub struct World {
    pub bounds: Bounds,
    nodes: Vec<Node>,
    pub connections: BTreeMap<PairKey, Connection>,
}

impl World {
    pub fn new(bounds: Bounds) -> Self {
        Self { bounds, nodes: Vec::new(), connections: BTreeMap::new() }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    // Mutable access to the nodes without the ability to remove any
    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    // Nodes and connections borrowed separately
    pub fn parts_mut(&mut self) -> (&mut [Node], &mut BTreeMap<PairKey, Connection>) {
        (&mut self.nodes, &mut self.connections)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn push_node(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn connection(&self, a: NodeId, b: NodeId) -> Option<&Connection> {
        self.connections.get(&PairKey::new(a, b))
    }

    /// Drops every node and connection.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.connections.clear();
    }
}
