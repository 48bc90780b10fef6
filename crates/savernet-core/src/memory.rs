//! Memory rules
//!
//! Pure decision functions turning an agent's recorded outcomes into a
//! "flip the saver trait" signal. The rule set is a closed family of tagged
//! kinds behind one constructor-validated type; every kind waits for a full
//! memory before it can fire.

use serde::{Deserialize, Serialize};

use crate::agent::MemoryBuffer;
use crate::error::ConfigError;

/// A validated flip rule: how far back to look plus the decision kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRule {
    memory_length: usize,
    kind: RuleKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RuleKind {
    AnyPast,
    AllPast,
    Average,
    Fraction { fraction: f64 },
    Weighted { fraction: f64, weights: Vec<f64> },
}

impl MemoryRule {
    /// Flip on any remembered loss.
    pub fn any_past(memory_length: usize) -> Result<Self, ConfigError> {
        Ok(Self {
            memory_length: check_length(memory_length)?,
            kind: RuleKind::AnyPast,
        })
    }

    /// Flip only when every remembered outcome is a loss.
    pub fn all_past(memory_length: usize) -> Result<Self, ConfigError> {
        Ok(Self {
            memory_length: check_length(memory_length)?,
            kind: RuleKind::AllPast,
        })
    }

    /// Flip when the mean payoff delta over the memory is negative.
    pub fn average(memory_length: usize) -> Result<Self, ConfigError> {
        Ok(Self {
            memory_length: check_length(memory_length)?,
            kind: RuleKind::Average,
        })
    }

    /// Flip when losses reach `fraction` of the memory. A fraction of exactly
    /// zero means "flip on any loss".
    pub fn fraction(memory_length: usize, fraction: f64) -> Result<Self, ConfigError> {
        Ok(Self {
            memory_length: check_length(memory_length)?,
            kind: RuleKind::Fraction {
                fraction: check_fraction(fraction)?,
            },
        })
    }

    /// Flip when the weighted loss share reaches `fraction`. Weights are
    /// ordered oldest to newest and must be non-negative with a positive sum.
    pub fn weighted(
        memory_length: usize,
        fraction: f64,
        weights: Vec<f64>,
    ) -> Result<Self, ConfigError> {
        let memory_length = check_length(memory_length)?;
        let fraction = check_fraction(fraction)?;
        if weights.len() != memory_length {
            return Err(ConfigError::WeightCount {
                expected: memory_length,
                actual: weights.len(),
            });
        }
        if weights.iter().any(|w| *w < 0.0) || weights.iter().sum::<f64>() <= 0.0 {
            return Err(ConfigError::Weights);
        }
        Ok(Self {
            memory_length,
            kind: RuleKind::Weighted { fraction, weights },
        })
    }

    /// Weighted rule with linearly increasing weights 1..=memory_length, so
    /// the most recent outcome counts the most.
    pub fn weighted_linear(memory_length: usize, fraction: f64) -> Result<Self, ConfigError> {
        let weights = (1..=memory_length).map(|w| w as f64).collect();
        Self::weighted(memory_length, fraction, weights)
    }

    pub fn memory_length(&self) -> usize {
        self.memory_length
    }

    pub fn name(&self) -> &'static str {
        match self.kind {
            RuleKind::AnyPast => "any_past",
            RuleKind::AllPast => "all_past",
            RuleKind::Average => "average",
            RuleKind::Fraction { .. } => "fraction",
            RuleKind::Weighted { .. } => "weighted",
        }
    }

    /// Evaluates the rule over the most recent `memory_length` outcomes.
    /// A shorter history never fires.
    pub fn should_flip(&self, memory: &MemoryBuffer) -> bool {
        if memory.len() < self.memory_length {
            return false;
        }
        let skip = memory.len() - self.memory_length;
        let recent = || memory.iter().skip(skip);

        match &self.kind {
            RuleKind::AnyPast => recent().any(|item| item.lost),
            RuleKind::AllPast => recent().all(|item| item.lost),
            RuleKind::Average => recent().map(|item| item.delta).sum::<f64>() < 0.0,
            RuleKind::Fraction { fraction } => {
                let losses = recent().filter(|item| item.lost).count();
                if *fraction == 0.0 {
                    losses > 0
                } else {
                    losses as f64 >= self.memory_length as f64 * fraction
                }
            }
            RuleKind::Weighted { fraction, weights } => {
                let lost_weight: f64 = recent()
                    .zip(weights.iter())
                    .filter(|(item, _)| item.lost)
                    .map(|(_, w)| *w)
                    .sum();
                if *fraction == 0.0 {
                    lost_weight > 0.0
                } else {
                    let total: f64 = weights.iter().sum();
                    lost_weight / total >= *fraction
                }
            }
        }
    }
}

fn check_length(memory_length: usize) -> Result<usize, ConfigError> {
    if memory_length == 0 {
        return Err(ConfigError::EmptyMemory);
    }
    Ok(memory_length)
}

fn check_fraction(fraction: f64) -> Result<f64, ConfigError> {
    if !(0.0..=1.0).contains(&fraction) {
        return Err(ConfigError::Fraction(fraction));
    }
    Ok(fraction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::MemoryItem;

    fn buffer_from(outcomes: &[bool]) -> MemoryBuffer {
        let mut buffer = MemoryBuffer::new(outcomes.len());
        for (round, lost) in outcomes.iter().enumerate() {
            let delta = if *lost { -0.5 } else { 0.5 };
            buffer.record(MemoryItem::new(round as u64, 1.0, delta));
        }
        buffer
    }

    fn buffer_with_deltas(deltas: &[f64]) -> MemoryBuffer {
        let mut buffer = MemoryBuffer::new(deltas.len());
        for (round, delta) in deltas.iter().enumerate() {
            buffer.record(MemoryItem::new(round as u64, 1.0, *delta));
        }
        buffer
    }

    #[test]
    fn test_any_past() {
        let rule = MemoryRule::any_past(4).unwrap();
        assert!(rule.should_flip(&buffer_from(&[false, false, true, false])));
        assert!(!rule.should_flip(&buffer_from(&[false, false, false, false])));
    }

    #[test]
    fn test_all_past_three_of_three() {
        let rule = MemoryRule::all_past(3).unwrap();
        assert!(rule.should_flip(&buffer_from(&[true, true, true])));
        assert!(!rule.should_flip(&buffer_from(&[true, false, true])));
    }

    #[test]
    fn test_underfull_memory_never_fires() {
        let short = buffer_from(&[true, true]);
        for rule in [
            MemoryRule::any_past(3).unwrap(),
            MemoryRule::all_past(3).unwrap(),
            MemoryRule::average(3).unwrap(),
            MemoryRule::fraction(3, 0.0).unwrap(),
            MemoryRule::weighted_linear(3, 0.0).unwrap(),
        ] {
            assert!(!rule.should_flip(&short), "{} fired early", rule.name());
        }
    }

    #[test]
    fn test_empty_memory_never_fires() {
        let empty = MemoryBuffer::new(3);
        let rule = MemoryRule::any_past(3).unwrap();
        assert!(!rule.should_flip(&empty));
    }

    #[test]
    fn test_average_on_payoff_deltas() {
        let rule = MemoryRule::average(4).unwrap();
        assert!(rule.should_flip(&buffer_with_deltas(&[1.0, -2.0, 0.5, -1.0])));
        assert!(!rule.should_flip(&buffer_with_deltas(&[1.0, -0.5, 0.5, -0.5])));
        // Balanced history stays put.
        assert!(!rule.should_flip(&buffer_with_deltas(&[1.0, -1.0, 0.5, -0.5])));
    }

    #[test]
    fn test_fraction_threshold() {
        let rule = MemoryRule::fraction(4, 0.5).unwrap();
        assert!(rule.should_flip(&buffer_from(&[true, false, true, false])));
        assert!(!rule.should_flip(&buffer_from(&[true, false, false, false])));
    }

    #[test]
    fn test_fraction_zero_means_any_loss() {
        let rule = MemoryRule::fraction(3, 0.0).unwrap();
        assert!(rule.should_flip(&buffer_from(&[false, true, false])));
        assert!(!rule.should_flip(&buffer_from(&[false, false, false])));
    }

    #[test]
    fn test_fraction_one_matches_all_past() {
        let rule = MemoryRule::fraction(3, 1.0).unwrap();
        assert!(rule.should_flip(&buffer_from(&[true, true, true])));
        assert!(!rule.should_flip(&buffer_from(&[true, true, false])));
    }

    #[test]
    fn test_weighted_prefers_recent_losses() {
        // Linear weights [1, 2, 3]: a single loss in the newest slot carries
        // 3/6 of the mass, in the oldest slot only 1/6.
        let rule = MemoryRule::weighted_linear(3, 0.5).unwrap();
        assert!(rule.should_flip(&buffer_from(&[false, false, true])));
        assert!(!rule.should_flip(&buffer_from(&[true, false, false])));
    }

    #[test]
    fn test_weighted_validation() {
        assert!(MemoryRule::weighted(3, 0.5, vec![1.0, 2.0]).is_err());
        assert!(MemoryRule::weighted(3, 0.5, vec![1.0, -1.0, 2.0]).is_err());
        assert!(MemoryRule::weighted(3, 0.5, vec![0.0, 0.0, 0.0]).is_err());
        assert!(MemoryRule::weighted(3, 0.5, vec![1.0, 1.0, 1.0]).is_ok());
    }

    #[test]
    fn test_parameter_validation() {
        assert!(MemoryRule::any_past(0).is_err());
        assert!(MemoryRule::fraction(3, 1.5).is_err());
        assert!(MemoryRule::fraction(3, -0.1).is_err());
    }

    #[test]
    fn test_rule_survives_longer_buffers() {
        // An agent-owned buffer always matches the rule length, but the rule
        // itself only looks at the newest window.
        let rule = MemoryRule::all_past(2).unwrap();
        let mut buffer = MemoryBuffer::new(4);
        for round in 0..2 {
            buffer.record(MemoryItem::new(round, 1.5, 0.5));
        }
        for round in 2..4 {
            buffer.record(MemoryItem::new(round, 0.5, -0.5));
        }
        assert!(rule.should_flip(&buffer));
    }
}
