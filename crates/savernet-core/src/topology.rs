//! Topology and placement
//!
//! The placement pins every agent id to exactly one node of an undirected
//! graph; edges are the only legal opponent pairs. Node indices stay stable
//! across removals, so a shocked topology keeps its traversal order.

use std::collections::HashMap;

use petgraph::stable_graph::{NodeIndex, StableUnGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};

use crate::agent::AgentId;
use crate::error::{ConfigError, StateError};

/// Bare graph shape produced by the builders in [`crate::setup`].
pub type Topology = StableUnGraph<(), ()>;

/// Node-to-agent bijection over an undirected graph.
#[derive(Debug, Clone)]
pub struct Placement {
    graph: StableUnGraph<AgentId, ()>,
    nodes: HashMap<AgentId, NodeIndex>,
}

impl Placement {
    /// Pairs agents with nodes in iteration order: the i-th agent id lands on
    /// the i-th node of `topology`. Counts must match exactly.
    pub fn bijection(ids: &[AgentId], topology: &Topology) -> Result<Self, ConfigError> {
        if ids.len() != topology.node_count() {
            return Err(ConfigError::PlacementMismatch {
                agents: ids.len(),
                nodes: topology.node_count(),
            });
        }

        let mut graph = StableUnGraph::with_capacity(ids.len(), topology.edge_count());
        let mut nodes = HashMap::with_capacity(ids.len());
        let mut remap = HashMap::with_capacity(ids.len());
        for (old, id) in topology.node_indices().zip(ids.iter().copied()) {
            let node = graph.add_node(id);
            nodes.insert(id, node);
            remap.insert(old, node);
        }
        for edge in topology.edge_references() {
            if let (Some(&a), Some(&b)) = (remap.get(&edge.source()), remap.get(&edge.target())) {
                graph.add_edge(a, b, ());
            }
        }

        Ok(Self { graph, nodes })
    }

    pub fn agent_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, id: AgentId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node_of(&self, id: AgentId) -> Option<NodeIndex> {
        self.nodes.get(&id).copied()
    }

    pub fn agent_at(&self, node: NodeIndex) -> Option<AgentId> {
        self.graph.node_weight(node).copied()
    }

    /// Placed agent ids in deterministic node-index order.
    pub fn ids(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.graph
            .node_indices()
            .filter_map(|node| self.graph.node_weight(node).copied())
    }

    /// Node indices in deterministic traversal order.
    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    pub fn neighbor_nodes(&self, node: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors(node)
    }

    /// Ids adjacent to `id`. Unknown agents are a state error, not an empty
    /// answer.
    pub fn neighbors(&self, id: AgentId) -> Result<Vec<AgentId>, StateError> {
        let node = self.require(id)?;
        Ok(self
            .graph
            .neighbors(node)
            .filter_map(|n| self.graph.node_weight(n).copied())
            .collect())
    }

    pub fn has_edge(&self, a: AgentId, b: AgentId) -> bool {
        match (self.node_of(a), self.node_of(b)) {
            (Some(na), Some(nb)) => self.graph.find_edge(na, nb).is_some(),
            _ => false,
        }
    }

    /// All edges as id pairs, in edge-index order.
    pub fn edges(&self) -> impl Iterator<Item = (AgentId, AgentId)> + '_ {
        self.graph.edge_references().filter_map(move |edge| {
            let a = self.graph.node_weight(edge.source())?;
            let b = self.graph.node_weight(edge.target())?;
            Some((*a, *b))
        })
    }

    /// Removes the agent's node and every incident edge.
    pub fn remove(&mut self, id: AgentId) -> Result<(), StateError> {
        let node = self.require(id)?;
        self.graph.remove_node(node);
        self.nodes.remove(&id);
        Ok(())
    }

    /// Connects two placed agents. Returns false (a no-op) for an existing
    /// edge or a self-loop.
    pub fn add_edge(&mut self, a: AgentId, b: AgentId) -> Result<bool, StateError> {
        let na = self.require(a)?;
        let nb = self.require(b)?;
        if na == nb || self.graph.find_edge(na, nb).is_some() {
            return Ok(false);
        }
        self.graph.add_edge(na, nb, ());
        Ok(true)
    }

    /// Disconnects two placed agents. Returns false when no such edge exists.
    pub fn remove_edge(&mut self, a: AgentId, b: AgentId) -> Result<bool, StateError> {
        let na = self.require(a)?;
        let nb = self.require(b)?;
        match self.graph.find_edge(na, nb) {
            Some(edge) => {
                self.graph.remove_edge(edge);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn require(&self, id: AgentId) -> Result<NodeIndex, StateError> {
        self.node_of(id).ok_or(StateError::UnknownAgent(id))
    }
}
