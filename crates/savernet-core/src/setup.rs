//! Topology and population builders
//!
//! Programmatic construction of the undirected graphs games run on, plus a
//! builder for seeding saver/non-saver populations. Builders that draw
//! randomness take the caller's generator so seeded runs stay reproducible.

use petgraph::stable_graph::NodeIndex;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::agent::{SaverAgent, SaverTraits};
use crate::error::ConfigError;
use crate::memory::MemoryRule;
use crate::topology::Topology;

/// Ring lattice: `n` nodes, each joined to its `k` nearest neighbors
/// (`k / 2` on each side). `k` must be even, at least 2, and below `n`.
pub fn ring_lattice(n: usize, k: usize) -> Result<Topology, ConfigError> {
    check_ring(n, k)?;
    let mut graph = Topology::with_capacity(n, n * k / 2);
    let nodes: Vec<NodeIndex> = (0..n).map(|_| graph.add_node(())).collect();
    for offset in 1..=k / 2 {
        for i in 0..n {
            graph.add_edge(nodes[i], nodes[(i + offset) % n], ());
        }
    }
    Ok(graph)
}

/// Watts-Strogatz small world: start from a ring lattice and rewire each
/// lattice edge with probability `p` to a uniformly chosen non-adjacent
/// endpoint. Node and edge counts are preserved.
pub fn small_world<R: Rng>(n: usize, k: usize, p: f64, rng: &mut R) -> Result<Topology, ConfigError> {
    check_probability(p, "rewiring probability")?;
    let mut graph = ring_lattice(n, k)?;
    let nodes: Vec<NodeIndex> = graph.node_indices().collect();

    for offset in 1..=k / 2 {
        for i in 0..n {
            if !rng.gen_bool(p) {
                continue;
            }
            let far: Vec<NodeIndex> = nodes
                .iter()
                .copied()
                .filter(|&w| w != nodes[i] && graph.find_edge(nodes[i], w).is_none())
                .collect();
            // A saturated node keeps its lattice edge.
            if let Some(&new_end) = far.choose(rng) {
                if let Some(edge) = graph.find_edge(nodes[i], nodes[(i + offset) % n]) {
                    graph.remove_edge(edge);
                    graph.add_edge(nodes[i], new_end, ());
                }
            }
        }
    }
    Ok(graph)
}

/// Independent-edge random graph: every unordered pair is wired with
/// probability `p`.
pub fn random_graph<R: Rng>(n: usize, p: f64, rng: &mut R) -> Result<Topology, ConfigError> {
    if n == 0 {
        return Err(ConfigError::Graph(
            "random graph needs at least one node".to_string(),
        ));
    }
    check_probability(p, "edge probability")?;
    let mut graph = Topology::with_capacity(n, 0);
    let nodes: Vec<NodeIndex> = (0..n).map(|_| graph.add_node(())).collect();
    for i in 0..n {
        for j in (i + 1)..n {
            if rng.gen_bool(p) {
                graph.add_edge(nodes[i], nodes[j], ());
            }
        }
    }
    Ok(graph)
}

/// Starts a population seed: `num_savers` savers followed by
/// `num_non_savers` non-savers, in that order.
pub fn seed_agents(num_savers: usize, num_non_savers: usize) -> Population {
    Population {
        num_savers,
        num_non_savers,
        memory_rule: None,
        homophily: None,
        income_per_period: 1.0,
        num_groups: None,
    }
}

/// Builder for a homogeneous population sharing one memory rule and one
/// set of optional traits.
#[derive(Debug, Clone)]
pub struct Population {
    num_savers: usize,
    num_non_savers: usize,
    memory_rule: Option<MemoryRule>,
    homophily: Option<f64>,
    income_per_period: f64,
    num_groups: Option<u32>,
}

impl Population {
    pub fn with_memory_rule(mut self, rule: MemoryRule) -> Self {
        self.memory_rule = Some(rule);
        self
    }

    pub fn with_homophily(mut self, homophily: f64) -> Self {
        self.homophily = Some(homophily);
        self
    }

    pub fn with_income(mut self, income_per_period: f64) -> Self {
        self.income_per_period = income_per_period;
        self
    }

    /// Assigns group labels `0..num_groups` round-robin across the whole
    /// population.
    pub fn with_groups(mut self, num_groups: u32) -> Self {
        self.num_groups = Some(num_groups);
        self
    }

    pub fn build(&self) -> Result<Vec<SaverAgent>, ConfigError> {
        let total = self.num_savers + self.num_non_savers;
        let mut agents = Vec::with_capacity(total);
        for i in 0..total {
            let mut traits =
                SaverTraits::new(i < self.num_savers).with_income(self.income_per_period);
            if let Some(h) = self.homophily {
                traits = traits.with_homophily(h)?;
            }
            if let Some(groups) = self.num_groups {
                if groups > 0 {
                    traits = traits.with_group(i as u32 % groups);
                }
            }
            agents.push(SaverAgent::new(traits, self.memory_rule.clone()));
        }
        Ok(agents)
    }
}

fn check_ring(n: usize, k: usize) -> Result<(), ConfigError> {
    if k < 2 || k % 2 != 0 {
        return Err(ConfigError::Graph(format!(
            "ring lattice degree must be even and at least 2, got {k}"
        )));
    }
    if k >= n {
        return Err(ConfigError::Graph(format!(
            "ring lattice degree {k} must be below the node count {n}"
        )));
    }
    Ok(())
}

fn check_probability(p: f64, what: &str) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&p) {
        return Err(ConfigError::Graph(format!(
            "{what} must lie in [0, 1], got {p}"
        )));
    }
    Ok(())
}
