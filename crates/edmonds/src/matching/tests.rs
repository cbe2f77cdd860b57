//! Unit and property tests for the matching engine.
//!
//! Small fixed scenarios pin down the contract (odd cycles, planted cheap
//! pairs, infeasible instances); randomized properties check validity,
//! optimality against a brute-force oracle, and strong LP duality.

use proptest::prelude::*;

use super::{Matching, MatchingError};
use crate::graph::rand::{random_perfect_instance, InstanceCfg, ReplayToken};
use crate::graph::{rand as graph_rand, Graph};

/// Every vertex covered at most once; exactly once when `perfect`.
fn assert_valid_matching(g: &Graph, matching: &[usize], perfect: bool) {
    let mut covered = vec![false; g.vertex_count()];
    for &e in matching {
        let (u, v) = g.edge(e);
        assert!(!covered[u], "vertex {u} matched twice");
        assert!(!covered[v], "vertex {v} matched twice");
        covered[u] = true;
        covered[v] = true;
    }
    if perfect {
        assert!(covered.iter().all(|&c| c), "matching is not perfect");
    }
}

/// Exhaustive minimum-cost perfect matching; `None` if none exists.
fn brute_force_min_cost(g: &Graph, costs: &[f64], covered: &mut [bool]) -> Option<f64> {
    let u = match covered.iter().position(|&c| !c) {
        Some(u) => u,
        None => return Some(0.0),
    };
    covered[u] = true;
    let mut best: Option<f64> = None;
    for &v in g.adj_list(u) {
        if covered[v] {
            continue;
        }
        covered[v] = true;
        let e = g.edge_index(u, v).unwrap();
        if let Some(rest) = brute_force_min_cost(g, costs, covered) {
            let total = costs[e] + rest;
            if best.map_or(true, |b| total < b) {
                best = Some(total);
            }
        }
        covered[v] = false;
    }
    covered[u] = false;
    best
}

#[test]
fn triangle_maximum_matching_has_one_edge() {
    let g = graph_rand::cycle(3);
    let mut m = Matching::new(&g);
    let matching = m.solve_maximum_matching();
    assert_eq!(matching.len(), 1);
    assert_valid_matching(&g, &matching, false);
}

#[test]
fn four_cycle_unit_costs_picks_opposite_edges() {
    let g = graph_rand::cycle(4);
    let mut m = Matching::new(&g);
    let (mut edges, cost) = m
        .solve_minimum_cost_perfect_matching(&[1.0; 4])
        .expect("a 4-cycle has a perfect matching");
    assert!((cost - 2.0).abs() < 1e-9);
    edges.sort_unstable();
    assert!(edges == [0, 2] || edges == [1, 3], "got {edges:?}");
    assert_valid_matching(&g, &edges, true);
}

#[test]
fn k4_selects_the_planted_cheap_pair() {
    // Edge order of complete(4): (0,1) (0,2) (0,3) (1,2) (1,3) (2,3).
    let g = graph_rand::complete(4);
    let costs = [1.0, 5.0, 5.0, 5.0, 5.0, 1.0];
    let mut m = Matching::new(&g);
    let (mut edges, cost) = m.solve_minimum_cost_perfect_matching(&costs).unwrap();
    edges.sort_unstable();
    assert_eq!(edges, [0, 5]);
    assert!((cost - 2.0).abs() < 1e-9);
}

#[test]
fn odd_vertex_count_is_infeasible() {
    let g = graph_rand::complete(5);
    let mut m = Matching::new(&g);
    let err = m
        .solve_minimum_cost_perfect_matching(&vec![1.0; g.edge_count()])
        .unwrap_err();
    assert_eq!(err, MatchingError::Infeasible);

    // The failure leaves the engine cleared and usable.
    let matching = m.solve_maximum_matching();
    assert_eq!(matching.len(), 2);
    assert_valid_matching(&g, &matching, false);
}

#[test]
fn star_graph_maximum_matching_has_one_edge() {
    for k in 2..8 {
        let edges: Vec<(usize, usize)> = (1..=k).map(|i| (0, i)).collect();
        let g = Graph::new(k + 1, &edges);
        let mut m = Matching::new(&g);
        let matching = m.solve_maximum_matching();
        assert_eq!(matching.len(), 1, "star with {k} leaves");
        assert_valid_matching(&g, &matching, false);
    }
}

#[test]
fn resolving_keeps_cardinality() {
    let inst = random_perfect_instance(
        InstanceCfg::default(),
        ReplayToken { seed: 11, index: 0 },
    );
    let mut m = Matching::new(&inst.graph);
    let first = m.solve_maximum_matching().len();
    let second = m.solve_maximum_matching().len();
    assert_eq!(first, second);
    assert_eq!(first, inst.graph.vertex_count() / 2);
}

#[test]
fn petersen_graph_unit_costs() {
    // Outer 5-cycle, inner pentagram, spokes; 3-regular with perfect matchings.
    let mut edges = Vec::new();
    for i in 0..5 {
        edges.push((i, (i + 1) % 5));
    }
    for i in 0..5 {
        edges.push((i, i + 5));
    }
    for i in 0..5 {
        edges.push((5 + i, 5 + (i + 2) % 5));
    }
    let g = Graph::new(10, &edges);

    let mut m = Matching::new(&g);
    let (matching, cost) = m
        .solve_minimum_cost_perfect_matching(&vec![1.0; g.edge_count()])
        .unwrap();
    assert_valid_matching(&g, &matching, true);
    assert!((cost - 5.0).abs() < 1e-9);
}

#[test]
fn petersen_graph_matches_brute_force() {
    let mut edges = Vec::new();
    for i in 0..5 {
        edges.push((i, (i + 1) % 5));
    }
    for i in 0..5 {
        edges.push((i, i + 5));
    }
    for i in 0..5 {
        edges.push((5 + i, 5 + (i + 2) % 5));
    }
    let g = Graph::new(10, &edges);
    let costs: Vec<f64> = (0..g.edge_count()).map(|i| ((i * 7) % 10) as f64 + 1.0).collect();

    let mut m = Matching::new(&g);
    let (matching, cost) = m.solve_minimum_cost_perfect_matching(&costs).unwrap();
    assert_valid_matching(&g, &matching, true);

    let mut covered = vec![false; 10];
    let expected = brute_force_min_cost(&g, &costs, &mut covered).unwrap();
    assert!((cost - expected).abs() < 1e-6, "got {cost}, expected {expected}");
    assert!((cost - m.dual_objective()).abs() < 1e-4);
}

#[test]
fn small_complete_graphs_match_brute_force() {
    for &n in &[4usize, 6] {
        let g = graph_rand::complete(n);
        let costs: Vec<f64> = (0..g.edge_count())
            .map(|i| ((i * 13 + n) % 17) as f64 + 1.0)
            .collect();
        let mut m = Matching::new(&g);
        let (matching, cost) = m.solve_minimum_cost_perfect_matching(&costs).unwrap();
        assert_valid_matching(&g, &matching, true);

        let mut covered = vec![false; n];
        let expected = brute_force_min_cost(&g, &costs, &mut covered).unwrap();
        assert!((cost - expected).abs() < 1e-6, "K{n}: got {cost}, expected {expected}");
        assert!((cost - m.dual_objective()).abs() < 1e-4);
    }
}

#[test]
fn nested_odd_structures_match_brute_force() {
    // Inner triangle 0-1-2 closed into a five-cycle through 3 and 4; vertex 5
    // hangs off 4, so 4-5 is forced and the rest threads the odd cycles.
    let g = Graph::new(
        6,
        &[(0, 1), (1, 2), (0, 2), (2, 3), (3, 4), (4, 0), (4, 5)],
    );
    let costs = [2.0, 1.0, 2.0, 1.0, 3.0, 1.0, 1.0];
    let mut m = Matching::new(&g);
    let (matching, cost) = m.solve_minimum_cost_perfect_matching(&costs).unwrap();
    assert_valid_matching(&g, &matching, true);

    // The only perfect matching is 0-1, 2-3, 4-5.
    let mut edges = matching.clone();
    edges.sort_unstable();
    assert_eq!(edges, [0, 3, 6]);
    assert!((cost - 4.0).abs() < 1e-9);
}

#[test]
fn two_triangles_bridge_forces_blossoms() {
    // Two triangles joined by a bridge; the only perfect matching must use
    // the bridge, which the forest can only reach through contractions.
    let g = Graph::new(
        6,
        &[(0, 1), (1, 2), (0, 2), (2, 3), (3, 4), (4, 5), (3, 5)],
    );
    let costs = [4.0, 2.0, 3.0, 1.0, 4.0, 2.0, 3.0];
    let mut m = Matching::new(&g);
    let (matching, cost) = m.solve_minimum_cost_perfect_matching(&costs).unwrap();
    assert_valid_matching(&g, &matching, true);
    // Forced structure: 0-1, 2-3, 4-5.
    let mut edges = matching.clone();
    edges.sort_unstable();
    assert_eq!(edges, [0, 3, 5]);
    assert!((cost - 7.0).abs() < 1e-9);
}

#[test]
fn negative_costs_are_shifted_consistently() {
    let g = graph_rand::cycle(4);
    let costs = [-3.0, 1.0, -3.0, 1.0];
    let mut m = Matching::new(&g);
    let (mut edges, cost) = m.solve_minimum_cost_perfect_matching(&costs).unwrap();
    edges.sort_unstable();
    assert_eq!(edges, [0, 2]);
    assert!((cost + 6.0).abs() < 1e-9);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_feasible_instances_reach_optimality(
        seed in 0u64..1000,
        vertices in 2usize..20,
        extra in 0usize..48,
    ) {
        let cfg = InstanceCfg { vertices, extra_edges: extra, max_cost: 50.0 };
        let inst = random_perfect_instance(cfg, ReplayToken { seed, index: 0 });
        let mut m = Matching::new(&inst.graph);
        let (edges, cost) = m
            .solve_minimum_cost_perfect_matching(&inst.costs)
            .expect("planted instances are feasible");
        assert_valid_matching(&inst.graph, &edges, true);
        prop_assert!(cost <= inst.planted_cost() + 1e-6);
        // Strong duality: primal equals the dual objective at the optimum.
        prop_assert!((cost - m.dual_objective()).abs() < 1e-4);
    }

    #[test]
    fn small_instances_match_brute_force(
        seed in 0u64..400,
        half in 1usize..4,
        extra in 0usize..16,
    ) {
        let cfg = InstanceCfg { vertices: 2 * half, extra_edges: extra, max_cost: 20.0 };
        let inst = random_perfect_instance(cfg, ReplayToken { seed, index: 1 });
        let mut m = Matching::new(&inst.graph);
        let (_, cost) = m
            .solve_minimum_cost_perfect_matching(&inst.costs)
            .expect("planted instances are feasible");
        let mut covered = vec![false; inst.graph.vertex_count()];
        let expected = brute_force_min_cost(&inst.graph, &inst.costs, &mut covered)
            .expect("planted instances are feasible");
        prop_assert!((cost - expected).abs() < 1e-6);
    }

    #[test]
    fn maximum_matching_is_perfect_on_feasible_instances(
        seed in 0u64..1000,
        vertices in 2usize..24,
    ) {
        let cfg = InstanceCfg { vertices, extra_edges: vertices, max_cost: 1.0 };
        let inst = random_perfect_instance(cfg, ReplayToken { seed, index: 2 });
        let mut m = Matching::new(&inst.graph);
        let matching = m.solve_maximum_matching();
        assert_valid_matching(&inst.graph, &matching, true);
        prop_assert_eq!(matching.len(), inst.graph.vertex_count() / 2);
    }
}
