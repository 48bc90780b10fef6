//! Game plan
//!
//! How long a game runs and which shocks hit it when. Shock rounds are
//! validated against the round count up front; during play the engine asks
//! for the shocks of each round in schedule order.

use std::collections::BTreeMap;

use crate::error::ConfigError;
use crate::shock::Shock;

/// A validated schedule: total rounds plus per-round shock lists.
#[derive(Debug, Clone, Default)]
pub struct GamePlan {
    num_rounds: u64,
    shocks: BTreeMap<u64, Vec<Shock>>,
}

impl GamePlan {
    /// A plan with no shocks. `num_rounds` must be positive.
    pub fn new(num_rounds: u64) -> Result<Self, ConfigError> {
        if num_rounds == 0 {
            return Err(ConfigError::NoRounds);
        }
        Ok(Self {
            num_rounds,
            shocks: BTreeMap::new(),
        })
    }

    /// A plan with a prebuilt shock schedule; every round index must lie in
    /// `[0, num_rounds)`.
    pub fn with_shocks(
        num_rounds: u64,
        shocks: BTreeMap<u64, Vec<Shock>>,
    ) -> Result<Self, ConfigError> {
        let mut plan = Self::new(num_rounds)?;
        for (round, list) in shocks {
            for shock in list {
                plan.schedule(round, shock)?;
            }
        }
        Ok(plan)
    }

    /// Appends a shock to round `round`'s list; execution keeps this order.
    pub fn schedule(&mut self, round: u64, shock: Shock) -> Result<(), ConfigError> {
        if round >= self.num_rounds {
            return Err(ConfigError::ShockOutOfRange {
                round,
                total: self.num_rounds,
            });
        }
        self.shocks.entry(round).or_default().push(shock);
        Ok(())
    }

    pub fn num_rounds(&self) -> u64 {
        self.num_rounds
    }

    /// Shocks scheduled for one round, in schedule order.
    pub fn shocks_for(&self, round: u64) -> &[Shock] {
        self.shocks.get(&round).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn shock_count(&self) -> usize {
        self.shocks.values().map(Vec::len).sum()
    }

    /// Rounds with at least one shock, ascending.
    pub fn shock_rounds(&self) -> impl Iterator<Item = u64> + '_ {
        self.shocks.keys().copied()
    }
}
