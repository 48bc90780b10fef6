//! Experiment specification
//!
//! All experiment settings are loaded from a TOML file (or built from
//! defaults and edited in code). The spec validates itself by constructing
//! the core objects it describes.

use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};

use savernet_core::agent::SaverAgent;
use savernet_core::memory::MemoryRule;
use savernet_core::plan::GamePlan;
use savernet_core::setup::{random_graph, ring_lattice, seed_agents, small_world};
use savernet_core::shock::Shock;
use savernet_core::strategy::CooperationStrategy;
use savernet_core::topology::Topology;

use crate::error::LabError;

/// Complete experiment specification.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExperimentSpec {
    /// Round count, seed, stop conditions
    #[serde(default)]
    pub game: GameSection,
    /// Who plays: counts, traits, memory
    #[serde(default)]
    pub population: PopulationSection,
    /// The graph agents play on
    #[serde(default)]
    pub network: NetworkSection,
    /// Payoff parameters
    #[serde(default)]
    pub strategy: StrategySection,
    /// Memory rule shared by the whole population
    #[serde(default)]
    pub memory: MemorySection,
    /// Scheduled shocks, applied before the named round
    #[serde(default)]
    pub shocks: Vec<ShockSpec>,
}

impl ExperimentSpec {
    /// Loads a spec from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, LabError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parses a spec from a TOML string.
    pub fn from_str(content: &str) -> Result<Self, LabError> {
        Ok(toml::from_str(content)?)
    }

    /// Serializes the spec back to TOML.
    pub fn to_toml(&self) -> Result<String, LabError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Saver and non-saver counts derived from the share.
    pub fn saver_counts(&self) -> Result<(usize, usize), LabError> {
        let share = self.population.saver_share;
        if !(0.0..=1.0).contains(&share) {
            return Err(LabError::Spec(format!(
                "saver_share must lie in [0, 1], got {share}"
            )));
        }
        let total = self.population.agents;
        let savers = ((total as f64) * share).round() as usize;
        let savers = savers.min(total);
        Ok((savers, total - savers))
    }

    /// The shared memory rule, or `None` for agents that never flip.
    pub fn memory_rule(&self) -> Result<Option<MemoryRule>, LabError> {
        let memory = &self.memory;
        let rule = match memory.rule {
            RuleName::None => return Ok(None),
            RuleName::AnyPast => MemoryRule::any_past(memory.length)?,
            RuleName::AllPast => MemoryRule::all_past(memory.length)?,
            RuleName::Average => MemoryRule::average(memory.length)?,
            RuleName::Fraction => MemoryRule::fraction(memory.length, memory.fraction)?,
            RuleName::WeightedLinear => {
                MemoryRule::weighted_linear(memory.length, memory.fraction)?
            }
        };
        Ok(Some(rule))
    }

    /// Builds the population in arena order: savers first.
    pub fn build_population(&self) -> Result<Vec<SaverAgent>, LabError> {
        let (savers, non_savers) = self.saver_counts()?;
        let mut population =
            seed_agents(savers, non_savers).with_income(self.population.income_per_period);
        if let Some(rule) = self.memory_rule()? {
            population = population.with_memory_rule(rule);
        }
        if let Some(h) = self.population.homophily {
            population = population.with_homophily(h);
        }
        if let Some(groups) = self.population.groups {
            population = population.with_groups(groups);
        }
        Ok(population.build()?)
    }

    /// Builds the configured topology, drawing from `rng` where the kind
    /// is random.
    pub fn build_topology<R: Rng>(&self, rng: &mut R) -> Result<Topology, LabError> {
        let n = self.population.agents;
        let network = &self.network;
        let topology = match network.kind {
            NetworkKind::RingLattice => ring_lattice(n, network.degree)?,
            NetworkKind::SmallWorld => {
                small_world(n, network.degree, network.rewire_probability, rng)?
            }
            NetworkKind::Random => random_graph(n, network.edge_probability, rng)?,
        };
        Ok(topology)
    }

    /// Builds the payoff strategy.
    pub fn build_strategy(&self) -> Result<CooperationStrategy, LabError> {
        let strategy = CooperationStrategy::new(
            self.strategy.differential_efficient,
            self.strategy.differential_inefficient,
        )?
        .stochastic(self.strategy.stochastic);
        Ok(strategy)
    }

    /// Builds the game plan, scheduling every configured shock.
    pub fn build_plan(&self) -> Result<GamePlan, LabError> {
        let mut plan = GamePlan::new(self.game.rounds)?;
        for shock in &self.shocks {
            plan.schedule(shock.round, shock.kind.to_shock())?;
        }
        Ok(plan)
    }
}

/// Round count, seed, and stop conditions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSection {
    /// Total rounds to play
    pub rounds: u64,
    /// Seed for every random draw in the run
    pub seed: u64,
    /// Stop once savers hit zero or the whole population
    pub stop_at_absorption: bool,
}

impl Default for GameSection {
    fn default() -> Self {
        Self {
            rounds: 100,
            seed: 42,
            stop_at_absorption: true,
        }
    }
}

/// Population size and shared traits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationSection {
    /// Total number of agents
    pub agents: usize,
    /// Fraction of the population seeded as savers
    pub saver_share: f64,
    /// Income multiplier applied to every payoff
    pub income_per_period: f64,
    /// Preference for same-trait opponents, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homophily: Option<f64>,
    /// Round-robin group labels, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<u32>,
}

impl Default for PopulationSection {
    fn default() -> Self {
        Self {
            agents: 24,
            saver_share: 0.5,
            income_per_period: 1.0,
            homophily: None,
            groups: None,
        }
    }
}

/// Topology settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSection {
    /// Graph family to build
    pub kind: NetworkKind,
    /// Lattice degree (ring and small world)
    pub degree: usize,
    /// Rewiring probability (small world)
    pub rewire_probability: f64,
    /// Independent edge probability (random)
    pub edge_probability: f64,
}

impl Default for NetworkSection {
    fn default() -> Self {
        Self {
            kind: NetworkKind::SmallWorld,
            degree: 4,
            rewire_probability: 0.1,
            edge_probability: 0.1,
        }
    }
}

/// Graph family for the playing field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NetworkKind {
    /// Regular ring lattice
    RingLattice,
    /// Watts-Strogatz rewired lattice
    #[default]
    SmallWorld,
    /// Independent-edge random graph
    Random,
}

/// Payoff parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategySection {
    /// Gain when two savers meet
    pub differential_efficient: f64,
    /// Drag when at least one side is a non-saver
    pub differential_inefficient: f64,
    /// Draw payoffs from a lognormal instead of using the expectation
    pub stochastic: bool,
}

impl Default for StrategySection {
    fn default() -> Self {
        Self {
            differential_efficient: 0.15,
            differential_inefficient: 0.1,
            stochastic: true,
        }
    }
}

/// Memory rule shared by the population.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemorySection {
    /// Rule deciding when an agent flips its trait
    pub rule: RuleName,
    /// Outcomes the rule looks back over
    pub length: usize,
    /// Loss fraction threshold (fraction and weighted rules)
    pub fraction: f64,
}

impl Default for MemorySection {
    fn default() -> Self {
        Self {
            rule: RuleName::Average,
            length: 10,
            fraction: 0.5,
        }
    }
}

/// Memory rule families available to specs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RuleName {
    /// Agents never flip
    None,
    /// Flip on any remembered loss
    AnyPast,
    /// Flip only when every remembered outcome lost
    AllPast,
    /// Flip when the remembered deltas average below zero
    #[default]
    Average,
    /// Flip when the loss fraction reaches the threshold
    Fraction,
    /// Fraction rule with linearly increasing recency weights
    WeightedLinear,
}

/// A scheduled shock. Specs can only target randomly; picking out a
/// specific agent or edge requires the core API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShockSpec {
    /// Round the shock lands on, before matching
    pub round: u64,
    /// What the shock does
    pub kind: ShockKind,
}

/// Random-target shock kinds available to specs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShockKind {
    /// Remove one uniformly chosen agent
    RemoveRandomPlayer,
    /// Remove one uniformly chosen edge
    RemoveRandomEdge,
    /// Rewire one uniformly chosen edge to a far node
    SwapRandomEdge,
}

impl ShockKind {
    pub fn to_shock(self) -> Shock {
        match self {
            ShockKind::RemoveRandomPlayer => Shock::RemoveRandomPlayer,
            ShockKind::RemoveRandomEdge => Shock::RemoveRandomEdge,
            ShockKind::SwapRandomEdge => Shock::SwapRandomEdge,
        }
    }
}

/// Generates a commented default spec file.
pub fn default_spec_toml() -> String {
    r#"# Savernet experiment specification

[game]
rounds = 100
seed = 42
stop_at_absorption = true

[population]
agents = 24
saver_share = 0.5
income_per_period = 1.0
# homophily = 0.5
# groups = 2

[network]
kind = "small_world"   # ring_lattice | small_world | random
degree = 4
rewire_probability = 0.1
edge_probability = 0.1

[strategy]
differential_efficient = 0.15
differential_inefficient = 0.1
stochastic = true

[memory]
rule = "average"       # none | any_past | all_past | average | fraction | weighted_linear
length = 10
fraction = 0.5

# [[shocks]]
# round = 50
# kind = "remove_random_player"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_default_spec() {
        let spec = ExperimentSpec::default();

        assert_eq!(spec.game.rounds, 100);
        assert_eq!(spec.game.seed, 42);
        assert!(spec.game.stop_at_absorption);
        assert_eq!(spec.population.agents, 24);
        assert_eq!(spec.network.kind, NetworkKind::SmallWorld);
        assert_eq!(spec.memory.rule, RuleName::Average);
        assert!(spec.shocks.is_empty());
    }

    #[test]
    fn test_parse_spec_from_toml() {
        let toml = r#"
            [game]
            rounds = 50
            seed = 7

            [population]
            agents = 10
            saver_share = 0.3

            [network]
            kind = "ring_lattice"
            degree = 2

            [memory]
            rule = "fraction"
            length = 5
            fraction = 0.6
        "#;

        let spec = ExperimentSpec::from_str(toml).unwrap();

        assert_eq!(spec.game.rounds, 50);
        assert_eq!(spec.game.seed, 7);
        assert_eq!(spec.population.agents, 10);
        assert_eq!(spec.network.kind, NetworkKind::RingLattice);
        assert_eq!(spec.memory.rule, RuleName::Fraction);
        assert_eq!(spec.memory.length, 5);
    }

    #[test]
    fn test_partial_spec_uses_defaults() {
        let toml = r#"
            [population]
            agents = 16
        "#;

        let spec = ExperimentSpec::from_str(toml).unwrap();

        assert_eq!(spec.population.agents, 16);
        assert_eq!(spec.population.saver_share, 0.5);
        assert_eq!(spec.game.rounds, 100);
        assert_eq!(spec.strategy.differential_efficient, 0.15);
    }

    #[test]
    fn test_spec_with_shocks() {
        let toml = r#"
            [[shocks]]
            round = 10
            kind = "remove_random_player"

            [[shocks]]
            round = 20
            kind = "swap_random_edge"
        "#;

        let spec = ExperimentSpec::from_str(toml).unwrap();

        assert_eq!(spec.shocks.len(), 2);
        assert_eq!(spec.shocks[0].round, 10);
        assert_eq!(spec.shocks[0].kind, ShockKind::RemoveRandomPlayer);
        assert_eq!(spec.shocks[1].kind, ShockKind::SwapRandomEdge);

        let plan = spec.build_plan().unwrap();
        assert_eq!(plan.shock_count(), 2);
    }

    #[test]
    fn test_saver_counts_from_share() {
        let mut spec = ExperimentSpec::default();
        spec.population.agents = 10;
        spec.population.saver_share = 0.3;
        assert_eq!(spec.saver_counts().unwrap(), (3, 7));

        spec.population.saver_share = 1.0;
        assert_eq!(spec.saver_counts().unwrap(), (10, 0));

        spec.population.saver_share = 1.5;
        assert!(spec.saver_counts().is_err());
    }

    #[test]
    fn test_build_population_applies_spec() {
        let mut spec = ExperimentSpec::default();
        spec.population.agents = 8;
        spec.population.saver_share = 0.25;
        spec.population.homophily = Some(0.4);
        spec.memory.rule = RuleName::AnyPast;
        spec.memory.length = 3;

        let agents = spec.build_population().unwrap();

        assert_eq!(agents.len(), 8);
        assert_eq!(agents.iter().filter(|a| a.is_saver()).count(), 2);
        assert!(agents[0].is_saver(), "savers come first");
        for agent in &agents {
            assert_eq!(agent.memory().capacity(), 3);
            assert_eq!(agent.traits().homophily(), Some(0.4));
        }
    }

    #[test]
    fn test_rule_none_leaves_agents_ruleless() {
        let mut spec = ExperimentSpec::default();
        spec.memory.rule = RuleName::None;

        assert!(spec.memory_rule().unwrap().is_none());
        let agents = spec.build_population().unwrap();
        assert!(agents[0].rule().is_none());
    }

    #[test]
    fn test_build_topology_matches_population() {
        let mut spec = ExperimentSpec::default();
        spec.population.agents = 12;
        spec.network.kind = NetworkKind::RingLattice;
        spec.network.degree = 4;

        let mut rng = SmallRng::seed_from_u64(1);
        let topology = spec.build_topology(&mut rng).unwrap();

        assert_eq!(topology.node_count(), 12);
        assert_eq!(topology.edge_count(), 24);
    }

    #[test]
    fn test_bad_shock_round_is_rejected() {
        let mut spec = ExperimentSpec::default();
        spec.game.rounds = 10;
        spec.shocks.push(ShockSpec {
            round: 10,
            kind: ShockKind::RemoveRandomPlayer,
        });

        assert!(spec.build_plan().is_err());
    }

    #[test]
    fn test_default_spec_toml_parses() {
        let spec = ExperimentSpec::from_str(&default_spec_toml()).unwrap();
        assert_eq!(spec.game.rounds, 100);
        assert_eq!(spec.population.agents, 24);
        assert_eq!(spec.memory.rule, RuleName::Average);
    }

    #[test]
    fn test_spec_round_trips_through_toml() {
        let mut spec = ExperimentSpec::default();
        spec.population.homophily = Some(0.25);
        spec.shocks.push(ShockSpec {
            round: 5,
            kind: ShockKind::RemoveRandomEdge,
        });

        let toml = spec.to_toml().unwrap();
        let parsed = ExperimentSpec::from_str(&toml).unwrap();

        assert_eq!(parsed.population.homophily, Some(0.25));
        assert_eq!(parsed.shocks.len(), 1);
        assert_eq!(parsed.shocks[0].kind, ShockKind::RemoveRandomEdge);
    }
}
