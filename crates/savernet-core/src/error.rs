//! Error taxonomy for the game engine.
//!
//! Two families: [`ConfigError`] for values rejected at construction time and
//! [`StateError`] for operations that reference agents missing from the
//! current state. Sit-outs (an agent finding no opponent in a round) are not
//! errors; they are reported through [`crate::engine::Matching`].

use thiserror::Error;

use crate::agent::AgentId;

/// Invalid parameters detected while building strategies, rules, plans,
/// placements, or graphs. Raised at construction, never during play.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("differential_efficient must be non-negative, got {0}")]
    DifferentialEfficient(f64),

    #[error("differential_inefficient must be in [0, 1), got {0}")]
    DifferentialInefficient(f64),

    #[error("memory_length must be at least 1")]
    EmptyMemory,

    #[error("memory rule fraction must be in [0, 1], got {0}")]
    Fraction(f64),

    #[error("expected {expected} memory weights, got {actual}")]
    WeightCount { expected: usize, actual: usize },

    #[error("memory weights must be non-negative with a positive sum")]
    Weights,

    #[error("homophily must be in [0, 1], got {0}")]
    Homophily(f64),

    #[error("a game plan needs at least one round")]
    NoRounds,

    #[error("shock scheduled at round {round}, but the plan has {total} rounds")]
    ShockOutOfRange { round: u64, total: u64 },

    #[error("{agents} agents cannot be placed on a graph with {nodes} nodes")]
    PlacementMismatch { agents: usize, nodes: usize },

    #[error("invalid graph parameters: {0}")]
    Graph(String),
}

/// The running game referenced something that is no longer there.
/// Not recoverable: the surrounding game halts at the first occurrence.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("agent {0} is not present in the game state")]
    UnknownAgent(AgentId),

    #[error("no agents remain in the game state")]
    NoAgents,
}

/// Umbrella error for callers that mix construction and play.
#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    State(#[from] StateError),
}
