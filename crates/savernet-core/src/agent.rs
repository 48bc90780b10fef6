//! Agents
//!
//! The players of the game: immutable traits, accumulated savings, and a
//! bounded memory of recent match outcomes. The saver trait is only ever
//! changed through [`SaverAgent::maybe_flip`], which consults the agent's
//! memory rule.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ConfigError;
use crate::memory::MemoryRule;

/// Memory capacity used when an agent carries no memory rule.
pub const DEFAULT_MEMORY_LENGTH: usize = 10;

/// Stable identity of an agent, independent of its place in the topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(Uuid);

impl AgentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form for logs; the full uuid stays available via `uuid()`.
        let hex = self.0.simple().to_string();
        write!(f, "{}", &hex[..8])
    }
}

/// Fixed attributes assigned at creation.
///
/// Fields are private so the saver flag can only change through the agent's
/// flip path; everything else is frozen for the agent's lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaverTraits {
    is_saver: bool,
    /// Optional membership label, usable by experiment-level grouping.
    group: Option<u32>,
    /// Probability of preferring same-trait opponents during pairing.
    homophily: Option<f64>,
    /// Scale applied to payoffs when accumulating savings.
    income_per_period: f64,
}

impl SaverTraits {
    pub fn new(is_saver: bool) -> Self {
        Self {
            is_saver,
            group: None,
            homophily: None,
            income_per_period: 1.0,
        }
    }

    pub fn with_group(mut self, group: u32) -> Self {
        self.group = Some(group);
        self
    }

    pub fn with_income(mut self, income_per_period: f64) -> Self {
        self.income_per_period = income_per_period;
        self
    }

    pub fn with_homophily(mut self, homophily: f64) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&homophily) {
            return Err(ConfigError::Homophily(homophily));
        }
        self.homophily = Some(homophily);
        Ok(self)
    }

    pub fn is_saver(&self) -> bool {
        self.is_saver
    }

    pub fn group(&self) -> Option<u32> {
        self.group
    }

    pub fn homophily(&self) -> Option<f64> {
        self.homophily
    }

    pub fn income_per_period(&self) -> f64 {
        self.income_per_period
    }
}

impl Default for SaverTraits {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Mutable per-agent quantities, updated once per played round.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaverProperties {
    savings: f64,
}

impl SaverProperties {
    pub fn savings(&self) -> f64 {
        self.savings
    }

    fn deposit(&mut self, amount: f64) {
        self.savings += amount;
    }
}

/// One recorded match outcome from the agent's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemoryItem {
    /// Round in which the match was played.
    pub round: u64,
    /// The agent's own payoff.
    pub payoff: f64,
    /// Own payoff minus the opponent's payoff.
    pub delta: f64,
    /// True when the agent earned strictly less than its opponent.
    pub lost: bool,
}

impl MemoryItem {
    pub fn new(round: u64, payoff: f64, delta: f64) -> Self {
        Self {
            round,
            payoff,
            delta,
            lost: delta < 0.0,
        }
    }
}

/// Bounded ring of recent outcomes; oldest entries drop off on overflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryBuffer {
    items: VecDeque<MemoryItem>,
    capacity: usize,
}

impl MemoryBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record(&mut self, item: MemoryItem) {
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() == self.capacity
    }

    /// Outcomes in recording order, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &MemoryItem> {
        self.items.iter()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// A player: identity, traits, savings, memory, and an optional flip rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaverAgent {
    id: AgentId,
    traits: SaverTraits,
    properties: SaverProperties,
    memory: MemoryBuffer,
    rule: Option<MemoryRule>,
}

impl SaverAgent {
    /// Builds an agent; memory capacity follows the rule's length when a rule
    /// is present, [`DEFAULT_MEMORY_LENGTH`] otherwise.
    pub fn new(traits: SaverTraits, rule: Option<MemoryRule>) -> Self {
        let capacity = rule
            .as_ref()
            .map(|r| r.memory_length())
            .unwrap_or(DEFAULT_MEMORY_LENGTH);
        Self {
            id: AgentId::new(),
            traits,
            properties: SaverProperties::default(),
            memory: MemoryBuffer::new(capacity),
            rule,
        }
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn traits(&self) -> &SaverTraits {
        &self.traits
    }

    pub fn is_saver(&self) -> bool {
        self.traits.is_saver
    }

    pub fn savings(&self) -> f64 {
        self.properties.savings()
    }

    pub fn memory(&self) -> &MemoryBuffer {
        &self.memory
    }

    pub fn rule(&self) -> Option<&MemoryRule> {
        self.rule.as_ref()
    }

    /// Applies one match outcome: accumulate income-scaled payoff and
    /// remember the result.
    pub fn update(&mut self, outcome: MemoryItem) {
        self.properties
            .deposit(self.traits.income_per_period * outcome.payoff);
        self.memory.record(outcome);
    }

    /// Consults the memory rule; on a flip the saver trait toggles and the
    /// memory is cleared, so a fresh run of outcomes is needed before the
    /// agent can flip again.
    pub fn maybe_flip(&mut self) -> bool {
        let fire = match &self.rule {
            Some(rule) => rule.should_flip(&self.memory),
            None => false,
        };
        if !fire {
            return false;
        }
        self.traits.is_saver = !self.traits.is_saver;
        self.memory.clear();
        tracing::debug!(
            agent = %self.id,
            now_saver = self.traits.is_saver,
            "memory rule fired, saver trait flipped"
        );
        true
    }

    /// Zeroes savings and forgets all outcomes; identity and traits keep.
    pub fn reset(&mut self) {
        self.properties = SaverProperties::default();
        self.memory.clear();
    }
}
