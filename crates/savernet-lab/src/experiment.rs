//! Experiment runner
//!
//! Drives one configured game from start to finish, recording a summary
//! line per round and watching for absorption: once savers hit zero or the
//! whole population, the composition can only change through noise, so the
//! run can stop early.

use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use savernet_core::engine::GameEngine;
use savernet_core::error::GameError;
use savernet_core::state::GameState;

use crate::error::LabError;
use crate::output::RoundLog;
use crate::spec::ExperimentSpec;
use crate::stats;

/// One line of experiment output: the state of the world after a round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    /// Round index, starting at 0
    pub round: u64,
    /// Agents still in the game
    pub agents: usize,
    /// Agents carrying the saver trait
    pub savers: usize,
    /// Sum of all savings balances
    pub total_savings: f64,
    /// Savings inequality across the population
    pub gini: f64,
}

impl RoundRecord {
    pub fn from_state(round: u64, state: &GameState) -> Self {
        let savings: Vec<f64> = state.agents().map(|agent| agent.savings()).collect();
        Self {
            round,
            agents: state.num_agents(),
            savers: stats::saver_count(state),
            total_savings: savings.iter().sum(),
            gini: stats::gini(&savings),
        }
    }

    /// True when the saver composition can no longer move without noise.
    pub fn is_absorbing(&self) -> bool {
        self.savers == 0 || self.savers == self.agents
    }
}

/// Final accounting for a finished run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentSummary {
    /// Rounds actually played
    pub rounds_played: u64,
    /// Agents alive at the end
    pub final_agents: usize,
    /// Savers at the end
    pub final_savers: usize,
    /// Total savings at the end
    pub final_total_savings: f64,
    /// Savings inequality at the end
    pub final_gini: f64,
    /// Lowest saver count seen across the run
    pub min_savers: usize,
    /// Round where the low point occurred
    pub min_savers_round: u64,
    /// First round that ended in an absorbing state, if any
    pub absorbed_at: Option<u64>,
}

impl ExperimentSummary {
    pub fn absorbed(&self) -> bool {
        self.absorbed_at.is_some()
    }
}

/// Runs one spec to completion.
///
/// All randomness flows from the spec's seed: the topology is built first,
/// then the same generator drives shocks, matching, and payoffs, so a rerun
/// of the same spec reproduces the same records.
pub struct SurvivalExperiment {
    spec: ExperimentSpec,
}

impl SurvivalExperiment {
    pub fn new(spec: ExperimentSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &ExperimentSpec {
        &self.spec
    }

    /// Plays the configured game, appending one record per round to `log`.
    pub fn run(&self, log: &mut RoundLog) -> Result<ExperimentSummary, LabError> {
        let spec = &self.spec;
        let mut rng = SmallRng::seed_from_u64(spec.game.seed);

        let topology = spec.build_topology(&mut rng)?;
        let agents = spec.build_population()?;
        let plan = spec.build_plan()?;
        let engine = GameEngine::new(spec.build_strategy()?);
        let state = GameState::new(agents, &topology).map_err(GameError::from)?;

        tracing::info!(
            agents = state.num_agents(),
            savers = stats::saver_count(&state),
            rounds = spec.game.rounds,
            seed = spec.game.seed,
            "starting experiment"
        );

        let mut min_savers = stats::saver_count(&state);
        let mut min_savers_round = 0;
        let mut rounds_played = 0;
        let mut absorbed_at = None;
        let mut last = state.clone();

        for item in engine.play_game(state, plan, rng) {
            let (round, state) = item.map_err(GameError::from)?;
            let record = RoundRecord::from_state(round, &state);
            log.record(&record)?;
            tracing::debug!(
                round,
                savers = record.savers,
                total_savings = record.total_savings,
                "round complete"
            );

            if record.savers < min_savers {
                min_savers = record.savers;
                min_savers_round = round;
            }
            rounds_played = round + 1;
            let absorbing = record.is_absorbing();
            last = state;

            if absorbing {
                if absorbed_at.is_none() {
                    absorbed_at = Some(round);
                }
                if spec.game.stop_at_absorption {
                    tracing::info!(round, savers = record.savers, "absorbing state reached");
                    break;
                }
            }
        }
        log.flush()?;

        let savings: Vec<f64> = last.agents().map(|agent| agent.savings()).collect();
        Ok(ExperimentSummary {
            rounds_played,
            final_agents: last.num_agents(),
            final_savers: stats::saver_count(&last),
            final_total_savings: savings.iter().sum(),
            final_gini: stats::gini(&savings),
            min_savers,
            min_savers_round,
            absorbed_at,
        })
    }
}
