//! Payoff strategy
//!
//! Computes the payoff pair for a matched pair of agents. A pair of savers
//! plays the efficient technology, every other combination the inefficient
//! one; stochastic play draws two independent log-normal samples at the
//! pair's specialization scale, deterministic play returns the model's
//! closed-form expected payoff (the specialization itself).

use rand::Rng;
use rand_distr::{Distribution, LogNormal};

use crate::agent::SaverAgent;
use crate::error::ConfigError;

/// Location parameter of the payoff distribution, the model's canonical mean.
pub const LOGNORMAL_LOCATION: f64 = 1.0;

/// Default gain of the efficient (saver/saver) technology.
pub const DEFAULT_DIFFERENTIAL_EFFICIENT: f64 = 0.15;

/// Default drag of the inefficient technology.
pub const DEFAULT_DIFFERENTIAL_INEFFICIENT: f64 = 0.1;

/// The repeated two-player savings game.
#[derive(Debug, Clone, Copy)]
pub struct CooperationStrategy {
    differential_efficient: f64,
    differential_inefficient: f64,
    stochastic: bool,
    efficient: LogNormal<f64>,
    inefficient: LogNormal<f64>,
}

impl CooperationStrategy {
    /// Builds a deterministic strategy; enable sampling with
    /// [`CooperationStrategy::stochastic`].
    ///
    /// `differential_efficient` must be non-negative and
    /// `differential_inefficient` in `[0, 1)` so both specialization scales
    /// stay positive.
    pub fn new(
        differential_efficient: f64,
        differential_inefficient: f64,
    ) -> Result<Self, ConfigError> {
        if !differential_efficient.is_finite() || differential_efficient < 0.0 {
            return Err(ConfigError::DifferentialEfficient(differential_efficient));
        }
        if !(0.0..1.0).contains(&differential_inefficient) {
            return Err(ConfigError::DifferentialInefficient(differential_inefficient));
        }
        let efficient = LogNormal::new(LOGNORMAL_LOCATION, 1.0 + differential_efficient)
            .map_err(|_| ConfigError::DifferentialEfficient(differential_efficient))?;
        let inefficient = LogNormal::new(LOGNORMAL_LOCATION, 1.0 - differential_inefficient)
            .map_err(|_| ConfigError::DifferentialInefficient(differential_inefficient))?;
        Ok(Self {
            differential_efficient,
            differential_inefficient,
            stochastic: false,
            efficient,
            inefficient,
        })
    }

    pub fn stochastic(mut self, enabled: bool) -> Self {
        self.stochastic = enabled;
        self
    }

    pub fn is_stochastic(&self) -> bool {
        self.stochastic
    }

    pub fn differential_efficient(&self) -> f64 {
        self.differential_efficient
    }

    pub fn differential_inefficient(&self) -> f64 {
        self.differential_inefficient
    }

    /// Scale of the payoff distribution for a given trait combination.
    pub fn specialization(&self, a_saver: bool, b_saver: bool) -> f64 {
        if a_saver && b_saver {
            1.0 + self.differential_efficient
        } else {
            1.0 - self.differential_inefficient
        }
    }

    /// Payoffs for one match, in argument order.
    ///
    /// Stochastic mode consumes exactly two draws from `rng`; deterministic
    /// mode consumes none.
    pub fn calculate_payoff<R: Rng>(
        &self,
        a: &SaverAgent,
        b: &SaverAgent,
        rng: &mut R,
    ) -> (f64, f64) {
        let both_savers = a.is_saver() && b.is_saver();
        if !self.stochastic {
            let expected = self.specialization(a.is_saver(), b.is_saver());
            return (expected, expected);
        }
        let dist = if both_savers {
            &self.efficient
        } else {
            &self.inefficient
        };
        (dist.sample(rng), dist.sample(rng))
    }
}
