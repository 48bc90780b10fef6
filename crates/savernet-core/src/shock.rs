//! Shocks
//!
//! Exogenous, scheduled mutations of the running game: players leave, edges
//! appear, disappear, or get rewired. Shocks targeting a named agent fail
//! hard when that agent is gone; the random variants degrade to logged
//! no-ops when the topology gives them nothing to do.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::agent::AgentId;
use crate::error::StateError;
use crate::state::GameState;

/// How many candidate far nodes a random edge swap samples before giving up.
pub const MAX_SWAP_ATTEMPTS: usize = 10;

/// One exogenous mutation, applied strictly before a round's matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shock {
    /// Remove a named player and its node.
    RemovePlayer { agent: AgentId },
    /// Remove a uniformly chosen player.
    RemoveRandomPlayer,
    /// Connect two named players.
    AddEdge { a: AgentId, b: AgentId },
    /// Disconnect two named players.
    RemoveEdge { a: AgentId, b: AgentId },
    /// Remove one edge incident to a uniformly chosen player.
    RemoveRandomEdge,
    /// Rewire pivot-detach into pivot-attach.
    SwapEdge {
        pivot: AgentId,
        detach: AgentId,
        attach: AgentId,
    },
    /// Rewire a random edge of a random player toward a non-neighbor.
    SwapRandomEdge,
}

impl Shock {
    pub fn name(&self) -> &'static str {
        match self {
            Shock::RemovePlayer { .. } => "remove_player",
            Shock::RemoveRandomPlayer => "remove_random_player",
            Shock::AddEdge { .. } => "add_edge",
            Shock::RemoveEdge { .. } => "remove_edge",
            Shock::RemoveRandomEdge => "remove_random_edge",
            Shock::SwapEdge { .. } => "swap_edge",
            Shock::SwapRandomEdge => "swap_random_edge",
        }
    }

    /// Mutates `state` in place. Node removal and edge rewiring preserve the
    /// node-agent bijection for every surviving agent.
    pub fn apply<R: Rng>(&self, state: &mut GameState, rng: &mut R) -> Result<(), StateError> {
        match self {
            Shock::RemovePlayer { agent } => {
                let removed = state.remove_agent(*agent)?;
                tracing::debug!(
                    agent = %removed.id(),
                    savings = removed.savings(),
                    "shock removed player"
                );
                Ok(())
            }
            Shock::RemoveRandomPlayer => {
                let target = random_agent(state, rng)?;
                let removed = state.remove_agent(target)?;
                tracing::debug!(
                    agent = %removed.id(),
                    savings = removed.savings(),
                    "shock removed random player"
                );
                Ok(())
            }
            Shock::AddEdge { a, b } => {
                if !state.add_edge(*a, *b)? {
                    tracing::debug!(a = %a, b = %b, "add-edge shock was a no-op");
                }
                Ok(())
            }
            Shock::RemoveEdge { a, b } => {
                if !state.remove_edge(*a, *b)? {
                    tracing::debug!(a = %a, b = %b, "remove-edge shock was a no-op");
                }
                Ok(())
            }
            Shock::RemoveRandomEdge => {
                let pivot = random_agent(state, rng)?;
                let neighbors = state.placement().neighbors(pivot)?;
                match neighbors.choose(rng).copied() {
                    Some(other) => {
                        state.remove_edge(pivot, other)?;
                        tracing::debug!(a = %pivot, b = %other, "shock removed random edge");
                    }
                    None => {
                        tracing::warn!(agent = %pivot, "random edge removal hit an isolated node");
                    }
                }
                Ok(())
            }
            Shock::SwapEdge {
                pivot,
                detach,
                attach,
            } => {
                state.remove_edge(*pivot, *detach)?;
                state.add_edge(*pivot, *attach)?;
                tracing::debug!(
                    pivot = %pivot,
                    detach = %detach,
                    attach = %attach,
                    "shock swapped edge"
                );
                Ok(())
            }
            Shock::SwapRandomEdge => swap_random_edge(state, rng),
        }
    }
}

/// Uniform choice over placed agents, in deterministic node order.
fn random_agent<R: Rng>(state: &GameState, rng: &mut R) -> Result<AgentId, StateError> {
    let ids: Vec<AgentId> = state.placement().ids().collect();
    ids.choose(rng).copied().ok_or(StateError::NoAgents)
}

fn swap_random_edge<R: Rng>(state: &mut GameState, rng: &mut R) -> Result<(), StateError> {
    let pivot = random_agent(state, rng)?;
    let neighbors = state.placement().neighbors(pivot)?;
    let detach = match neighbors.choose(rng).copied() {
        Some(id) => id,
        None => {
            tracing::warn!(agent = %pivot, "edge swap hit an isolated node");
            return Ok(());
        }
    };

    let everyone: Vec<AgentId> = state.placement().ids().collect();
    for _ in 0..MAX_SWAP_ATTEMPTS {
        if let Some(attach) = everyone.choose(rng).copied() {
            if attach != pivot && !neighbors.contains(&attach) {
                state.remove_edge(pivot, detach)?;
                state.add_edge(pivot, attach)?;
                tracing::debug!(
                    pivot = %pivot,
                    detach = %detach,
                    attach = %attach,
                    "shock swapped random edge"
                );
                return Ok(());
            }
        }
    }
    tracing::warn!(
        agent = %pivot,
        attempts = MAX_SWAP_ATTEMPTS,
        "edge swap found no far node, topology unchanged"
    );
    Ok(())
}
