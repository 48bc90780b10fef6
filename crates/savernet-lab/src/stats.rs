//! Summary statistics over game states
//!
//! Read-only accessors used by experiment records and by callers poking at
//! yielded states between rounds.

use savernet_core::agent::SaverAgent;
use savernet_core::state::GameState;

/// Sum of all savings balances.
pub fn total_savings(state: &GameState) -> f64 {
    state.agents().map(|agent| agent.savings()).sum()
}

/// Number of agents currently carrying the saver trait.
pub fn saver_count(state: &GameState) -> usize {
    count_matching(state, |agent| agent.is_saver())
}

/// Number of agents satisfying an arbitrary predicate.
pub fn count_matching<F>(state: &GameState, predicate: F) -> usize
where
    F: Fn(&SaverAgent) -> bool,
{
    state.agents().filter(|agent| predicate(agent)).count()
}

/// Total savings split into (savers, non-savers).
pub fn savings_by_trait(state: &GameState) -> (f64, f64) {
    let mut savers = 0.0;
    let mut non_savers = 0.0;
    for agent in state.agents() {
        if agent.is_saver() {
            savers += agent.savings();
        } else {
            non_savers += agent.savings();
        }
    }
    (savers, non_savers)
}

/// Population Gini coefficient over non-negative values.
///
/// Returns 0.0 for an empty population or an all-zero one, where the ratio
/// is undefined.
pub fn gini(values: &[f64]) -> f64 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    let total: f64 = values.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let weighted: f64 = sorted
        .iter()
        .enumerate()
        .map(|(i, value)| (i as f64 + 1.0) * value)
        .sum();
    let n = n as f64;
    (2.0 * weighted) / (n * total) - (n + 1.0) / n
}
