use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use union_find::{QuickUnionUf, UnionBySize, UnionFind};

use crate::domain::network::addr::PortNo;
use crate::domain::network::topology::TopologyGraph;
use crate::domain::utils::id::SwitchId;
use crate::error::RoutingError;
use crate::logger::ANALYTICS_TARGET;

/// A switch on a route together with the port the traffic leaves it through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hop {
    pub switch: SwitchId,
    pub egress: PortNo,
}

/// A computed route. `hops` lists every switch before the destination; it is
/// empty when source and destination are the same switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub hops: Vec<Hop>,
    pub destination: SwitchId,
}

impl Route {
    pub fn first_egress(&self) -> Option<PortNo> {
        self.hops.first().map(|h| h.egress)
    }

    /// Every switch visited, destination included.
    pub fn switches(&self) -> Vec<SwitchId> {
        self.hops.iter().map(|h| h.switch).chain(std::iter::once(self.destination)).collect()
    }
}

/// Everything produced by one full recomputation.
///
/// A snapshot is immutable once published; the engine swaps in a fresh one
/// instead of updating it in place.
#[derive(Debug, Default)]
pub struct RoutingSnapshot {
    /// Topology generation this snapshot was computed from.
    pub generation: u64,

    /// Symmetric adjacency view, neighbors in first-seen order.
    links: BTreeMap<SwitchId, Vec<SwitchId>>,

    /// Egress port for every directed pair that was reported by discovery.
    ports: HashMap<(SwitchId, SwitchId), PortNo>,

    /// How many cached paths traverse each edge, counted in both directions.
    use_counts: HashMap<(SwitchId, SwitchId), u32>,

    /// Switch sequence (source and destination included) per ordered pair.
    paths: HashMap<(SwitchId, SwitchId), Vec<SwitchId>>,
}

impl RoutingSnapshot {
    /// Builds the snapshot for `graph`. Unreachable pairs get no path entry.
    pub fn compute(graph: &TopologyGraph) -> Self {
        let vertices: Vec<SwitchId> = graph.switches().collect();
        let mut links: BTreeMap<SwitchId, Vec<SwitchId>> = vertices.iter().map(|v| (*v, Vec::new())).collect();
        let mut ports: HashMap<(SwitchId, SwitchId), PortNo> = HashMap::new();

        // A direction reported on its own still counts as traversable; only
        // the egress lookup needs the real edge.
        for (switch, edge) in graph.edges() {
            ports.entry((switch, edge.neighbor)).or_insert(edge.local_port);

            let forward = links.entry(switch).or_default();
            if !forward.contains(&edge.neighbor) {
                forward.push(edge.neighbor);
            }
            let backward = links.entry(edge.neighbor).or_default();
            if !backward.contains(&switch) {
                backward.push(switch);
            }
        }

        let mut use_counts: HashMap<(SwitchId, SwitchId), u32> = HashMap::new();
        for (origin, neighbors) in &links {
            for neighbor in neighbors {
                use_counts.insert((*origin, *neighbor), 0);
            }
        }

        let index_of: HashMap<SwitchId, usize> = vertices.iter().enumerate().map(|(i, v)| (*v, i)).collect();
        let mut components = QuickUnionUf::<UnionBySize>::new(vertices.len());
        for (origin, neighbors) in &links {
            for neighbor in neighbors {
                if let (Some(&a), Some(&b)) = (index_of.get(origin), index_of.get(neighbor)) {
                    components.union(a, b);
                }
            }
        }

        let mut paths: HashMap<(SwitchId, SwitchId), Vec<SwitchId>> = HashMap::new();

        for (i, v1) in vertices.iter().enumerate() {
            for (j, v2) in vertices.iter().enumerate() {
                if i == j || components.find(i) != components.find(j) {
                    continue;
                }

                let found = PathSearch { links: &links, use_counts: &use_counts }.find(*v1, *v2);

                let Some(path) = found else {
                    log::debug!("NoPathFound: {} => {}", v1, v2);
                    continue;
                };

                for pair in path.windows(2) {
                    *use_counts.entry((pair[0], pair[1])).or_insert(0) += 1;
                    *use_counts.entry((pair[1], pair[0])).or_insert(0) += 1;
                }
                paths.insert((*v1, *v2), path);
            }
        }

        Self { generation: graph.generation(), links, ports, use_counts, paths }
    }

    pub fn use_count(&self, a: SwitchId, b: SwitchId) -> u32 {
        self.use_counts.get(&(a, b)).copied().unwrap_or(0)
    }

    pub fn use_counts(&self) -> &HashMap<(SwitchId, SwitchId), u32> {
        &self.use_counts
    }

    /// Raw switch sequence of a cached path.
    pub fn path(&self, from: SwitchId, to: SwitchId) -> Option<&[SwitchId]> {
        self.paths.get(&(from, to)).map(Vec::as_slice)
    }

    pub fn path_count(&self) -> usize {
        self.paths.len()
    }

    pub fn egress_port(&self, from: SwitchId, to: SwitchId) -> Option<PortNo> {
        self.ports.get(&(from, to)).copied()
    }

    pub fn neighbors(&self, switch: SwitchId) -> &[SwitchId] {
        self.links.get(&switch).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Translates a cached path into egress hops.
    pub fn route(&self, from: SwitchId, to: SwitchId) -> Result<Route, RoutingError> {
        let path = self.paths.get(&(from, to)).ok_or(RoutingError::PathNotFound { from, to })?;

        let mut hops = Vec::with_capacity(path.len().saturating_sub(1));
        for pair in path.windows(2) {
            let egress = self
                .egress_port(pair[0], pair[1])
                .ok_or(RoutingError::MissingEgressPort { from: pair[0], to: pair[1] })?;
            hops.push(Hop { switch: pair[0], egress });
        }

        Ok(Route { hops, destination: to })
    }
}

/// One level of the depth-first search: the switch and the neighbors of it
/// that have not been tried yet, best candidate first.
#[derive(Debug)]
struct SearchFrame {
    node: SwitchId,
    candidates: std::vec::IntoIter<SwitchId>,
}

/// Greedy depth-first search that always tries the least used edge first.
///
/// The first branch reaching the target wins. The result is neither a
/// shortest path nor globally balanced; it only avoids local contention at
/// each hop.
///
/// The search keeps an explicit stack. A switch stays visited after its
/// frame is popped: a popped frame never reached the target, so every switch
/// expanded below it can only reach the target through the branch above it,
/// and retrying it from a sibling branch can not succeed. The first path found
/// is the same as with a per-branch visited set, but each switch is expanded
/// at most once per search.
pub struct PathSearch<'a> {
    pub links: &'a BTreeMap<SwitchId, Vec<SwitchId>>,
    pub use_counts: &'a HashMap<(SwitchId, SwitchId), u32>,
}

impl<'a> PathSearch<'a> {
    /// Returns the switch sequence from `start` to `end`, both included.
    pub fn find(&self, start: SwitchId, end: SwitchId) -> Option<Vec<SwitchId>> {
        if start == end {
            return Some(vec![start]);
        }
        if self.links.get(&start).is_none_or(Vec::is_empty) {
            return None;
        }

        let mut visited: HashSet<SwitchId> = HashSet::from([start]);
        let mut stack = vec![self.frame(start)];

        while let Some(frame) = stack.last_mut() {
            let Some(next) = frame.candidates.next() else {
                stack.pop();
                continue;
            };

            if next == end {
                let mut path: Vec<SwitchId> = stack.iter().map(|f| f.node).collect();
                path.push(end);
                return Some(path);
            }

            if !visited.insert(next) {
                continue;
            }
            stack.push(self.frame(next));
        }

        None
    }

    /// Neighbors of `node` ordered by ascending use count. The sort is
    /// stable, so ties keep the neighbor order of the adjacency view.
    pub fn ranked_neighbors(&self, node: SwitchId) -> Vec<SwitchId> {
        let mut neighbors = self.links.get(&node).cloned().unwrap_or_default();
        neighbors.sort_by_key(|n| self.use_counts.get(&(node, *n)).copied().unwrap_or(0));
        neighbors
    }

    fn frame(&self, node: SwitchId) -> SearchFrame {
        SearchFrame { node, candidates: self.ranked_neighbors(node).into_iter() }
    }
}

/// Computes and memoizes paths between every pair of switches.
///
/// Recomputation is lazy: topology changes only make the cached snapshot
/// stale, and the next path request rebuilds it from scratch.
#[derive(Debug, Default)]
pub struct RoutingEngine {
    snapshot: Arc<RoutingSnapshot>,
    computed_generation: Option<u64>,
    recompute_count: u64,
}

impl RoutingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dirty(&self, graph: &TopologyGraph) -> bool {
        self.computed_generation != Some(graph.generation())
    }

    /// Number of full recomputations so far.
    pub fn recompute_count(&self) -> u64 {
        self.recompute_count
    }

    /// Handle to the currently published snapshot.
    pub fn snapshot(&self) -> Arc<RoutingSnapshot> {
        Arc::clone(&self.snapshot)
    }

    pub fn recompute(&mut self, graph: &TopologyGraph) {
        let snapshot = RoutingSnapshot::compute(graph);

        tracing::info!(
            target: ANALYTICS_TARGET,
            LogDescription = "Routing recomputed",
            Generation = snapshot.generation,
            Switches = graph.switch_count(),
            Paths = snapshot.path_count(),
        );

        self.computed_generation = Some(snapshot.generation);
        self.snapshot = Arc::new(snapshot);
        self.recompute_count += 1;
    }

    /// Route from `from` to `to`, recomputing first if the topology changed.
    pub fn get_path(&mut self, graph: &TopologyGraph, from: SwitchId, to: SwitchId) -> Result<Route, RoutingError> {
        if self.is_dirty(graph) {
            self.recompute(graph);
        }

        if from == to {
            if graph.contains_switch(from) {
                return Ok(Route { hops: Vec::new(), destination: to });
            }
            return Err(RoutingError::PathNotFound { from, to });
        }

        self.snapshot.route(from, to)
    }
}
