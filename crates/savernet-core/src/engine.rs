//! Game engine
//!
//! Orchestrates rounds: pair agents across the topology, let the strategy
//! price each match, update and maybe flip both sides, and hand back a new
//! state. [`GameEngine::play_game`] wraps the whole schedule into a lazy
//! iterator that applies scheduled shocks strictly before each round's
//! matching.

use std::collections::HashSet;

use petgraph::stable_graph::NodeIndex;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::agent::{AgentId, MemoryItem, SaverAgent};
use crate::error::StateError;
use crate::plan::GamePlan;
use crate::state::GameState;
use crate::strategy::CooperationStrategy;

/// Outcome of one matching pass: who plays whom, and who found nobody.
#[derive(Debug, Clone, Default)]
pub struct Matching {
    /// Matched pairs in traversal order.
    pub pairs: Vec<(AgentId, AgentId)>,
    /// Agents left without an eligible opponent this round.
    pub sit_outs: Vec<AgentId>,
}

impl Matching {
    pub fn participant_count(&self) -> usize {
        self.pairs.len() * 2
    }

    pub fn is_matched(&self, id: AgentId) -> bool {
        self.pairs.iter().any(|&(a, b)| a == id || b == id)
    }
}

/// Drives play with one strategy. The random source is injected per call, so
/// identical seeds replay identical games.
#[derive(Debug, Clone)]
pub struct GameEngine {
    strategy: CooperationStrategy,
}

impl GameEngine {
    pub fn new(strategy: CooperationStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> &CooperationStrategy {
        &self.strategy
    }

    /// Pairs agents for one round without playing it.
    ///
    /// Traverses nodes in index order; each unmatched node picks an opponent
    /// among its still-unmatched neighbors, biased by its homophily
    /// coefficient. Candidates are always neighbors. A node whose neighbors
    /// are all taken sits out, and stays out: any later chooser adjacent to
    /// it would have picked from a set containing it already.
    pub fn match_round<R: Rng>(&self, state: &GameState, rng: &mut R) -> Matching {
        let placement = state.placement();
        let order: Vec<NodeIndex> = placement.node_indices().collect();
        let mut matched: HashSet<NodeIndex> = HashSet::with_capacity(order.len());
        let mut matching = Matching::default();

        for node in order {
            if matched.contains(&node) {
                continue;
            }
            let id = match placement.agent_at(node) {
                Some(id) => id,
                None => continue,
            };
            let chooser = match state.agent(id) {
                Some(agent) => agent,
                None => continue,
            };
            let candidates: Vec<NodeIndex> = placement
                .neighbor_nodes(node)
                .filter(|candidate| !matched.contains(candidate))
                .collect();

            match choose_opponent(state, chooser, &candidates, rng) {
                Some(opponent_node) => {
                    if let Some(opponent) = placement.agent_at(opponent_node) {
                        matched.insert(node);
                        matched.insert(opponent_node);
                        tracing::trace!(a = %id, b = %opponent, "matched pair");
                        matching.pairs.push((id, opponent));
                    }
                }
                None => {
                    tracing::trace!(agent = %id, round = state.round(), "no eligible opponent, sitting out");
                    matching.sit_outs.push(id);
                }
            }
        }

        matching
    }

    /// Plays one round and returns the next state; the input snapshot is
    /// left untouched.
    ///
    /// Per matched pair: one strategy invocation, then both updates, then
    /// both flip checks. Sit-outs receive no payoff and no memory entry.
    pub fn play_round<R: Rng>(&self, state: &GameState, rng: &mut R) -> GameState {
        let matching = self.match_round(state, rng);
        let round = state.round();
        let mut next = state.clone();

        for &(a_id, b_id) in &matching.pairs {
            let (payoff_a, payoff_b) = match (next.agent(a_id), next.agent(b_id)) {
                (Some(a), Some(b)) => self.strategy.calculate_payoff(a, b, rng),
                _ => continue,
            };
            if let Some(a) = next.agent_mut(a_id) {
                a.update(MemoryItem::new(round, payoff_a, payoff_a - payoff_b));
            }
            if let Some(b) = next.agent_mut(b_id) {
                b.update(MemoryItem::new(round, payoff_b, payoff_b - payoff_a));
            }
            if let Some(a) = next.agent_mut(a_id) {
                a.maybe_flip();
            }
            if let Some(b) = next.agent_mut(b_id) {
                b.maybe_flip();
            }
        }

        next.advance_round();
        next
    }

    /// Lazy sequence of `(round_index, state)` over the whole plan.
    ///
    /// Shocks scheduled for round `i` are applied before round `i`'s
    /// matching, so a removed agent never plays that round. A failed shock
    /// yields its error and fuses the iterator; round indices always start
    /// at 0 and are never reused.
    pub fn play_game<R: Rng>(&self, initial: GameState, plan: GamePlan, rng: R) -> GameRounds<'_, R> {
        GameRounds {
            engine: self,
            state: initial,
            plan,
            next_round: 0,
            rng,
            halted: false,
        }
    }
}

/// Candidate choice with homophily bias: with probability `h` restrict to
/// same-trait candidates when any exist, otherwise choose uniformly.
fn choose_opponent<R: Rng>(
    state: &GameState,
    chooser: &SaverAgent,
    candidates: &[NodeIndex],
    rng: &mut R,
) -> Option<NodeIndex> {
    if candidates.is_empty() {
        return None;
    }
    if let Some(h) = chooser.traits().homophily() {
        if rng.gen_bool(h) {
            let same_trait: Vec<NodeIndex> = candidates
                .iter()
                .copied()
                .filter(|&node| {
                    state
                        .placement()
                        .agent_at(node)
                        .and_then(|id| state.agent(id))
                        .map(|agent| agent.is_saver() == chooser.is_saver())
                        .unwrap_or(false)
                })
                .collect();
            if !same_trait.is_empty() {
                return same_trait.choose(rng).copied();
            }
        }
    }
    candidates.choose(rng).copied()
}

/// Pull-based round iterator created by [`GameEngine::play_game`].
/// Finite, fused after an error, not restartable.
pub struct GameRounds<'e, R: Rng> {
    engine: &'e GameEngine,
    state: GameState,
    plan: GamePlan,
    next_round: u64,
    rng: R,
    halted: bool,
}

impl<R: Rng> GameRounds<'_, R> {
    /// The most recently produced state (the initial one before any round).
    pub fn state(&self) -> &GameState {
        &self.state
    }
}

impl<R: Rng> Iterator for GameRounds<'_, R> {
    type Item = Result<(u64, GameState), StateError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.halted || self.next_round >= self.plan.num_rounds() {
            return None;
        }
        let round = self.next_round;
        self.next_round += 1;

        for shock in self.plan.shocks_for(round) {
            tracing::debug!(round, shock = shock.name(), "applying scheduled shock");
            if let Err(error) = shock.apply(&mut self.state, &mut self.rng) {
                self.halted = true;
                return Some(Err(error));
            }
        }

        self.state = self.engine.play_round(&self.state, &mut self.rng);
        Some(Ok((round, self.state.clone())))
    }
}
