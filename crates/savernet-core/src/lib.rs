//! Core game logic: agents, memory rules, strategies, topology, shocks, engine.

pub mod agent;
pub mod memory;
pub mod strategy;
pub mod topology;
pub mod state;
pub mod plan;
pub mod shock;
pub mod engine;
pub mod setup;
pub mod error;

pub use agent::{AgentId, MemoryItem, SaverAgent, SaverTraits};
pub use engine::{GameEngine, GameRounds, Matching};
pub use error::{ConfigError, GameError, StateError};
pub use memory::MemoryRule;
pub use plan::GamePlan;
pub use shock::Shock;
pub use state::GameState;
pub use strategy::CooperationStrategy;
pub use topology::{Placement, Topology};
