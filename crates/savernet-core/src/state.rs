//! Game state
//!
//! A snapshot of the whole game at one point in time: the agent arena plus
//! the placement, stamped with a round counter. The engine never mutates a
//! yielded state; each round is played on a clone that becomes the next
//! snapshot.

use std::collections::HashMap;

use crate::agent::{AgentId, SaverAgent};
use crate::error::{ConfigError, StateError};
use crate::topology::{Placement, Topology};

/// Insertion-ordered arena of agents with id lookup.
#[derive(Debug, Clone, Default)]
pub struct Agents {
    items: Vec<SaverAgent>,
    index: HashMap<AgentId, usize>,
}

impl Agents {
    pub fn new(items: Vec<SaverAgent>) -> Self {
        let index = items
            .iter()
            .enumerate()
            .map(|(pos, agent)| (agent.id(), pos))
            .collect();
        Self { items, index }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: AgentId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn get(&self, id: AgentId) -> Option<&SaverAgent> {
        self.index.get(&id).map(|&pos| &self.items[pos])
    }

    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut SaverAgent> {
        self.index.get(&id).map(|&pos| &mut self.items[pos])
    }

    /// Agents in insertion order; removal keeps the relative order of the
    /// survivors, so iteration stays deterministic.
    pub fn iter(&self) -> impl Iterator<Item = &SaverAgent> {
        self.items.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.items.iter().map(|agent| agent.id())
    }

    pub fn remove(&mut self, id: AgentId) -> Result<SaverAgent, StateError> {
        let pos = self
            .index
            .remove(&id)
            .ok_or(StateError::UnknownAgent(id))?;
        let agent = self.items.remove(pos);
        for (new_pos, item) in self.items.iter().enumerate().skip(pos) {
            self.index.insert(item.id(), new_pos);
        }
        Ok(agent)
    }
}

/// Topology + agents at time `t`.
#[derive(Debug, Clone)]
pub struct GameState {
    round: u64,
    agents: Agents,
    placement: Placement,
}

impl GameState {
    /// Builds the initial state: the i-th agent is placed on the i-th node.
    pub fn new(agents: Vec<SaverAgent>, topology: &Topology) -> Result<Self, ConfigError> {
        let ids: Vec<AgentId> = agents.iter().map(|agent| agent.id()).collect();
        let placement = Placement::bijection(&ids, topology)?;
        Ok(Self {
            round: 0,
            agents: Agents::new(agents),
            placement,
        })
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn num_agents(&self) -> usize {
        self.agents.len()
    }

    pub fn agent(&self, id: AgentId) -> Option<&SaverAgent> {
        self.agents.get(id)
    }

    pub fn agents(&self) -> impl Iterator<Item = &SaverAgent> {
        self.agents.iter()
    }

    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    /// Neighboring agents of `id`, resolved through the placement.
    pub fn neighbors_of(&self, id: AgentId) -> Result<Vec<&SaverAgent>, StateError> {
        self.placement
            .neighbors(id)?
            .into_iter()
            .map(|neighbor| {
                self.agents
                    .get(neighbor)
                    .ok_or(StateError::UnknownAgent(neighbor))
            })
            .collect()
    }

    /// Removes an agent from both the arena and the topology.
    pub fn remove_agent(&mut self, id: AgentId) -> Result<SaverAgent, StateError> {
        self.placement.remove(id)?;
        self.agents.remove(id)
    }

    pub fn add_edge(&mut self, a: AgentId, b: AgentId) -> Result<bool, StateError> {
        self.placement.add_edge(a, b)
    }

    pub fn remove_edge(&mut self, a: AgentId, b: AgentId) -> Result<bool, StateError> {
        self.placement.remove_edge(a, b)
    }

    pub fn has_edge(&self, a: AgentId, b: AgentId) -> bool {
        self.placement.has_edge(a, b)
    }

    pub(crate) fn agent_mut(&mut self, id: AgentId) -> Option<&mut SaverAgent> {
        self.agents.get_mut(id)
    }

    pub(crate) fn advance_round(&mut self) {
        self.round += 1;
    }
}
