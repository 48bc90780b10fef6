//! Experiment harness for the saver game.
//!
//! The lab sits on top of `savernet-core`: it reads a TOML spec, assembles
//! a population, a topology, and a plan, plays the game, and streams one
//! record per round to a JSONL file.
//!
//! ```text
//! ┌───────────┐    ExperimentSpec     ┌───────────────┐    rounds.jsonl
//! │ spec.toml │ ────────────────────▶ │ savernet-core │ ──────────────────▶
//! └───────────┘                       └───────────────┘
//! ```
//!
//! # Modules
//!
//! - [`spec`]: TOML experiment specification and core-object construction
//! - [`experiment`]: the runner, round records, and summaries
//! - [`stats`]: read-only statistics over game states
//! - [`output`]: JSONL round logging

pub mod error;
pub mod experiment;
pub mod output;
pub mod spec;
pub mod stats;

// Re-export spec types
pub use spec::{
    default_spec_toml, ExperimentSpec, GameSection, MemorySection, NetworkKind, NetworkSection,
    PopulationSection, RuleName, ShockKind, ShockSpec, StrategySection,
};

// Re-export experiment types
pub use experiment::{ExperimentSummary, RoundRecord, SurvivalExperiment};

// Re-export output types
pub use output::{read_records, RoundLog};

pub use error::LabError;
