//! Game lifecycle tests
//!
//! Multi-round games driven through the public API: round accounting,
//! scheduled shocks landing mid-game, and the structural invariants that
//! must hold in every yielded state.

use rand::rngs::SmallRng;
use rand::SeedableRng;

use savernet_core::agent::AgentId;
use savernet_core::engine::GameEngine;
use savernet_core::memory::MemoryRule;
use savernet_core::plan::GamePlan;
use savernet_core::setup::{random_graph, ring_lattice, seed_agents};
use savernet_core::shock::Shock;
use savernet_core::state::GameState;
use savernet_core::strategy::CooperationStrategy;

fn engine() -> GameEngine {
    GameEngine::new(CooperationStrategy::new(0.25, 0.1).unwrap())
}

/// Twelve agents on a ring lattice, ids captured in arena order.
fn lattice_state(num_savers: usize) -> (Vec<AgentId>, GameState) {
    let agents = seed_agents(num_savers, 12 - num_savers).build().unwrap();
    let ids: Vec<AgentId> = agents.iter().map(|a| a.id()).collect();
    let topology = ring_lattice(12, 4).unwrap();
    (ids, GameState::new(agents, &topology).unwrap())
}

/// The iterator yields exactly the planned rounds, indexed from zero, and
/// every yielded state carries the advanced round stamp.
#[test]
fn test_round_accounting_over_a_full_game() {
    let (_, state) = lattice_state(6);
    let plan = GamePlan::new(30).unwrap();
    let rng = SmallRng::seed_from_u64(5);

    let rounds: Vec<_> = engine()
        .play_game(state, plan, rng)
        .collect::<Result<Vec<_>, _>>()
        .unwrap();

    assert_eq!(rounds.len(), 30);
    for (expected, (index, state)) in rounds.iter().enumerate() {
        assert_eq!(*index, expected as u64);
        assert_eq!(state.round(), expected as u64 + 1);
        assert_eq!(state.num_agents(), 12);
    }
}

/// An agent removed at round k is absent from every state of round k on.
#[test]
fn test_removed_agent_stays_gone() {
    let (ids, state) = lattice_state(6);
    let mut plan = GamePlan::new(8).unwrap();
    plan.schedule(3, Shock::RemovePlayer { agent: ids[0] }).unwrap();
    let rng = SmallRng::seed_from_u64(21);

    for item in engine().play_game(state, plan, rng) {
        let (round, state) = item.unwrap();
        if round < 3 {
            assert!(state.agent(ids[0]).is_some(), "present before the shock");
        } else {
            assert!(state.agent(ids[0]).is_none(), "gone from round 3 on");
            assert_eq!(state.num_agents(), 11);
        }
    }
}

/// Named edge shocks land before matching and persist afterwards.
#[test]
fn test_edge_shocks_rewire_midgame() {
    let (ids, state) = lattice_state(6);
    assert!(!state.has_edge(ids[0], ids[6]));
    assert!(state.has_edge(ids[0], ids[1]));

    let mut plan = GamePlan::new(4).unwrap();
    plan.schedule(1, Shock::AddEdge { a: ids[0], b: ids[6] }).unwrap();
    plan.schedule(1, Shock::RemoveEdge { a: ids[0], b: ids[1] }).unwrap();
    let rng = SmallRng::seed_from_u64(17);

    for item in engine().play_game(state, plan, rng) {
        let (round, state) = item.unwrap();
        if round >= 1 {
            assert!(state.has_edge(ids[0], ids[6]), "added edge persists");
            assert!(!state.has_edge(ids[0], ids[1]), "removed edge stays gone");
        } else {
            assert!(!state.has_edge(ids[0], ids[6]));
            assert!(state.has_edge(ids[0], ids[1]));
        }
    }
}

/// Random rewiring keeps the roster and the edge count intact.
#[test]
fn test_swap_shocks_preserve_roster_and_edge_count() {
    let (ids, state) = lattice_state(6);
    let edges_before = state.placement().edge_count();

    let mut plan = GamePlan::new(10).unwrap();
    plan.schedule(2, Shock::SwapRandomEdge).unwrap();
    plan.schedule(5, Shock::SwapRandomEdge).unwrap();
    plan.schedule(7, Shock::SwapRandomEdge).unwrap();
    let rng = SmallRng::seed_from_u64(33);

    for item in engine().play_game(state, plan, rng) {
        let (_, state) = item.unwrap();
        assert_eq!(state.num_agents(), 12);
        assert_eq!(state.placement().edge_count(), edges_before);
        for id in &ids {
            assert!(state.placement().contains(*id), "every agent stays placed");
        }
    }
}

/// Memories never grow beyond the rule's window, no matter how long the
/// game runs. Without noise every delta is zero, so nobody ever flips.
#[test]
fn test_memory_stays_bounded() {
    let rule = MemoryRule::average(5).unwrap();
    let agents = seed_agents(6, 6).with_memory_rule(rule).build().unwrap();
    let topology = ring_lattice(12, 4).unwrap();
    let state = GameState::new(agents, &topology).unwrap();

    let plan = GamePlan::new(50).unwrap();
    let rng = SmallRng::seed_from_u64(2);

    let (_, last) = engine()
        .play_game(state, plan, rng)
        .last()
        .unwrap()
        .unwrap();

    for agent in last.agents() {
        assert!(agent.memory().len() <= 5);
    }
    // The first node always finds an unmatched neighbor, so its window fills.
    let first = last.agents().next().unwrap();
    assert!(first.memory().is_full());
    assert_eq!(last.agents().filter(|a| a.is_saver()).count(), 6);
}

/// An edgeless population sits out every round and never earns anything.
#[test]
fn test_edgeless_population_never_plays() {
    let agents = seed_agents(3, 3).build().unwrap();
    let mut rng = SmallRng::seed_from_u64(13);
    let topology = random_graph(6, 0.0, &mut rng).unwrap();
    let state = GameState::new(agents, &topology).unwrap();

    let plan = GamePlan::new(10).unwrap();
    let (_, last) = engine()
        .play_game(state, plan, SmallRng::seed_from_u64(14))
        .last()
        .unwrap()
        .unwrap();

    for agent in last.agents() {
        assert_eq!(agent.savings(), 0.0);
        assert!(agent.memory().is_empty());
    }
    assert_eq!(last.round(), 10);
}
