use std::time::{Duration, Instant};

use ecmp_controller::domain::network::routing::{Hop, RoutingEngine, RoutingSnapshot};
use ecmp_controller::domain::network::topology::TopologyGraph;
use ecmp_controller::domain::utils::id::SwitchId;
use ecmp_controller::error::RoutingError;

fn sw(id: u64) -> SwitchId {
    SwitchId::new(id)
}

/// Adds both directions of a physical link.
fn link(graph: &mut TopologyGraph, a: u64, port_a: u16, b: u64, port_b: u16) {
    graph.add_link(sw(a), port_a, sw(b)).unwrap();
    graph.add_link(sw(b), port_b, sw(a)).unwrap();
}

/// S1 - S2 - S3, ports numbered from 1 in link order.
fn create_line() -> TopologyGraph {
    let mut graph = TopologyGraph::new();
    for id in 1..=3 {
        graph.add_switch(sw(id));
    }
    link(&mut graph, 1, 1, 2, 1);
    link(&mut graph, 2, 2, 3, 1);
    graph
}

/// S1 - S2 - S4 and S1 - S3 - S4.
fn create_square() -> TopologyGraph {
    let mut graph = TopologyGraph::new();
    for id in 1..=4 {
        graph.add_switch(sw(id));
    }
    link(&mut graph, 1, 1, 2, 1);
    link(&mut graph, 1, 2, 3, 1);
    link(&mut graph, 2, 2, 4, 1);
    link(&mut graph, 3, 2, 4, 2);
    graph
}

/// n x n grid plus a hub wired to every corner and a pendant switch on the hub.
fn create_grid(n: u64) -> TopologyGraph {
    let mut graph = TopologyGraph::new();
    let id = |r: u64, c: u64| r * n + c + 1;
    let hub = n * n + 1;
    let pendant = n * n + 2;
    for switch in 1..=pendant {
        graph.add_switch(sw(switch));
    }

    for r in 0..n {
        for c in 0..n {
            if c + 1 < n {
                link(&mut graph, id(r, c), 1, id(r, c + 1), 2);
            }
            if r + 1 < n {
                link(&mut graph, id(r, c), 3, id(r + 1, c), 4);
            }
        }
    }
    for (port, corner) in [id(0, 0), id(0, n - 1), id(n - 1, 0), id(n - 1, n - 1)].into_iter().enumerate() {
        link(&mut graph, hub, port as u16 + 1, corner, 5);
    }
    link(&mut graph, hub, 9, pendant, 1);
    graph
}

#[test]
fn test_line_route_uses_recorded_egress_ports() {
    let graph = create_line();
    let mut engine = RoutingEngine::new();

    let route = engine.get_path(&graph, sw(1), sw(3)).unwrap();

    assert_eq!(route.hops, vec![Hop { switch: sw(1), egress: 1 }, Hop { switch: sw(2), egress: 2 }]);
    assert_eq!(route.first_egress(), Some(1));
    assert_eq!(route.switches(), vec![sw(1), sw(2), sw(3)]);

    let back = engine.get_path(&graph, sw(3), sw(1)).unwrap();
    assert_eq!(back.hops, vec![Hop { switch: sw(3), egress: 1 }, Hop { switch: sw(2), egress: 1 }]);
}

#[test]
fn test_use_counts_on_a_tree() {
    // Without redundancy every pair has exactly one path, so an edge is used
    // by 2 * |left| * |right| ordered pairs.
    let snapshot = RoutingSnapshot::compute(&create_line());

    assert_eq!(snapshot.path_count(), 6);
    assert_eq!(snapshot.use_count(sw(1), sw(2)), 4);
    assert_eq!(snapshot.use_count(sw(2), sw(1)), 4);
    assert_eq!(snapshot.use_count(sw(2), sw(3)), 4);
    assert_eq!(snapshot.use_count(sw(3), sw(2)), 4);
    assert_eq!(snapshot.use_count(sw(1), sw(3)), 0, "No edge between S1 and S3");
}

#[test]
fn test_use_counts_are_symmetric() {
    let snapshot = RoutingSnapshot::compute(&create_square());

    for ((a, b), count) in snapshot.use_counts() {
        assert_eq!(snapshot.use_count(*b, *a), *count, "Use count of {} -> {} differs from the reverse direction", a, b);
    }
}

#[test]
fn test_duplicate_link_does_not_change_use_counts() {
    let once = RoutingSnapshot::compute(&create_square());

    let mut graph = create_square();
    assert_eq!(graph.add_link(sw(1), 1, sw(2)), Ok(false));
    let twice = RoutingSnapshot::compute(&graph);

    assert_eq!(once.use_counts(), twice.use_counts());
}

#[test]
fn test_redundant_links_share_the_load() {
    let snapshot = RoutingSnapshot::compute(&create_square());

    assert!(snapshot.use_count(sw(1), sw(2)) > 0);
    assert!(snapshot.use_count(sw(1), sw(3)) > 0);
    assert!(snapshot.use_count(sw(2), sw(4)) > 0);
    assert!(snapshot.use_count(sw(3), sw(4)) > 0);
}

#[test]
fn test_recompute_is_deterministic() {
    let graph = create_square();
    let first = RoutingSnapshot::compute(&graph);
    let second = RoutingSnapshot::compute(&graph);

    for from in 1..=4 {
        for to in 1..=4 {
            assert_eq!(first.path(sw(from), sw(to)), second.path(sw(from), sw(to)));
        }
    }
    assert_eq!(first.use_counts(), second.use_counts());
}

#[test]
fn test_recompute_is_lazy() {
    let mut graph = create_square();
    let mut engine = RoutingEngine::new();
    assert!(engine.is_dirty(&graph));

    engine.get_path(&graph, sw(1), sw(4)).unwrap();
    engine.get_path(&graph, sw(2), sw(3)).unwrap();
    assert_eq!(engine.recompute_count(), 1);
    assert!(!engine.is_dirty(&graph));

    // Several mutations in a row still cost one recompute.
    graph.remove_link(sw(1), 1, sw(2)).unwrap();
    graph.remove_link(sw(2), 1, sw(1)).unwrap();
    assert!(engine.is_dirty(&graph));
    engine.get_path(&graph, sw(1), sw(4)).unwrap();
    assert_eq!(engine.recompute_count(), 2);
}

#[test]
fn test_mutation_invalidates_cached_path() {
    let mut graph = create_square();
    let mut engine = RoutingEngine::new();

    let before = engine.get_path(&graph, sw(1), sw(4)).unwrap().switches();
    let via = before[1];

    // Cut the link between S1 and the switch the first path went through.
    let port_out = graph.neighbors(sw(1)).unwrap().iter().find(|e| e.neighbor == via).unwrap().local_port;
    let port_in = graph.neighbors(via).unwrap().iter().find(|e| e.neighbor == sw(1)).unwrap().local_port;
    graph.remove_link(sw(1), port_out, via).unwrap();
    graph.remove_link(via, port_in, sw(1)).unwrap();

    let after = engine.get_path(&graph, sw(1), sw(4)).unwrap().switches();
    assert_ne!(after[1], via, "Path must not use the removed link");
    assert_eq!(after.first(), Some(&sw(1)));
    assert_eq!(after.last(), Some(&sw(4)));
}

#[test]
fn test_removed_switch_makes_pair_unreachable() {
    let mut graph = create_line();
    let mut engine = RoutingEngine::new();
    assert!(engine.get_path(&graph, sw(1), sw(3)).is_ok());

    graph.remove_switch(sw(2)).unwrap();

    assert_eq!(engine.get_path(&graph, sw(1), sw(3)), Err(RoutingError::PathNotFound { from: sw(1), to: sw(3) }));
}

#[test]
fn test_same_switch_route_is_empty() {
    let graph = create_line();
    let mut engine = RoutingEngine::new();

    let route = engine.get_path(&graph, sw(2), sw(2)).unwrap();
    assert!(route.hops.is_empty());
    assert_eq!(route.destination, sw(2));

    assert!(engine.get_path(&graph, sw(9), sw(9)).is_err());
}

#[test]
fn test_one_directional_link_has_no_reverse_egress() {
    let mut graph = TopologyGraph::new();
    graph.add_switch(sw(1));
    graph.add_switch(sw(2));
    graph.add_link(sw(1), 4, sw(2)).unwrap();
    let mut engine = RoutingEngine::new();

    assert!(engine.snapshot().neighbors(sw(2)).is_empty(), "Nothing computed yet");
    let forward = engine.get_path(&graph, sw(1), sw(2)).unwrap();
    assert_eq!(forward.first_egress(), Some(4));

    // Traversable both ways, but S2 has no port towards S1.
    assert_eq!(engine.snapshot().neighbors(sw(2)), &[sw(1)]);
    assert_eq!(engine.get_path(&graph, sw(2), sw(1)), Err(RoutingError::MissingEgressPort { from: sw(2), to: sw(1) }));
}

#[test]
fn test_parallel_links_route_through_first_port() {
    let mut graph = create_line();
    link(&mut graph, 1, 5, 2, 5);
    let mut engine = RoutingEngine::new();

    assert_eq!(engine.get_path(&graph, sw(1), sw(2)).unwrap().first_egress(), Some(1));
}

#[test]
fn test_recompute_on_large_grid_is_bounded() {
    let graph = create_grid(10);
    let switches = graph.switch_count();

    let started = Instant::now();
    let snapshot = RoutingSnapshot::compute(&graph);
    let elapsed = started.elapsed();

    assert_eq!(snapshot.path_count(), switches * (switches - 1), "Every ordered pair of a connected fabric has a path");
    assert!(elapsed < Duration::from_secs(10), "Recompute of {} switches took {:?}", switches, elapsed);

    // Paths are simple: no switch appears twice.
    let path = snapshot.path(sw(1), sw(102)).unwrap();
    let mut seen = path.to_vec();
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), path.len());
    assert_eq!(path.last(), Some(&sw(102)));
}
