use std::collections::BTreeMap;

use crate::domain::network::addr::PortNo;
use crate::domain::utils::id::SwitchId;
use crate::error::TopologyError;

/// One direction of a physical link: traffic leaves the owning switch on
/// `local_port` towards `neighbor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    pub neighbor: SwitchId,
    pub local_port: PortNo,
}

/// Models the switch fabric as an undirected multigraph.
///
/// Every physical link is stored as two directed [`Edge`]s, one in the
/// adjacency list of each endpoint. Discovery reports the two directions
/// separately, so the graph tolerates a direction being present on its own
/// for a while. Routing can only leave a switch through a direction that was
/// actually reported.
///
/// Switches are kept in a `BTreeMap` and edges in insertion order, which makes
/// every traversal of the graph deterministic.
#[derive(Debug, Clone, Default)]
pub struct TopologyGraph {
    adjacency: BTreeMap<SwitchId, Vec<Edge>>,

    /// Bumped on every mutation that changed the graph. Consumers compare it
    /// against the generation they last computed from.
    generation: u64,
}

impl TopologyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn contains_switch(&self, id: SwitchId) -> bool {
        self.adjacency.contains_key(&id)
    }

    pub fn switches(&self) -> impl Iterator<Item = SwitchId> + '_ {
        self.adjacency.keys().copied()
    }

    pub fn switch_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Number of directed edges, i.e. twice the number of symmetric links.
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum()
    }

    /// Returns `true` if the switch was not known before.
    pub fn add_switch(&mut self, id: SwitchId) -> bool {
        if self.adjacency.contains_key(&id) {
            return false;
        }

        self.adjacency.insert(id, Vec::new());
        self.generation += 1;
        true
    }

    /// Removes the switch and strips it from the adjacency of every neighbor.
    pub fn remove_switch(&mut self, id: SwitchId) -> Result<(), TopologyError> {
        self.adjacency.remove(&id).ok_or(TopologyError::SwitchNotFound(id))?;

        // Scan every list, not just the neighbors of `id`: a one-directional
        // edge pointing at `id` has no mirror in its own list.
        for neighbor_edges in self.adjacency.values_mut() {
            neighbor_edges.retain(|e| e.neighbor != id);
        }

        self.generation += 1;
        Ok(())
    }

    /// Records that `a` reaches `b` through `port_a`.
    ///
    /// Returns `Ok(false)` when the exact edge already exists; nothing is
    /// touched in that case.
    pub fn add_link(&mut self, a: SwitchId, port_a: PortNo, b: SwitchId) -> Result<bool, TopologyError> {
        if a == b {
            return Err(TopologyError::SelfLoop(a));
        }
        if !self.adjacency.contains_key(&b) {
            return Err(TopologyError::SwitchNotFound(b));
        }

        let edges = self.adjacency.get_mut(&a).ok_or(TopologyError::SwitchNotFound(a))?;
        let edge = Edge { neighbor: b, local_port: port_a };
        if edges.contains(&edge) {
            return Ok(false);
        }

        edges.push(edge);
        self.generation += 1;
        Ok(true)
    }

    /// Returns `Ok(false)` when the edge was not present.
    pub fn remove_link(&mut self, a: SwitchId, port_a: PortNo, b: SwitchId) -> Result<bool, TopologyError> {
        let edges = self.adjacency.get_mut(&a).ok_or(TopologyError::SwitchNotFound(a))?;
        let before = edges.len();
        edges.retain(|e| !(e.neighbor == b && e.local_port == port_a));

        if edges.len() == before {
            return Ok(false);
        }

        self.generation += 1;
        Ok(true)
    }

    pub fn neighbors(&self, id: SwitchId) -> Result<&[Edge], TopologyError> {
        self.adjacency.get(&id).map(Vec::as_slice).ok_or(TopologyError::SwitchNotFound(id))
    }

    /// Whether `port` on `id` leads to another switch (as opposed to a host).
    pub fn is_inter_switch_port(&self, id: SwitchId, port: PortNo) -> bool {
        self.adjacency.get(&id).is_some_and(|edges| edges.iter().any(|e| e.local_port == port))
    }

    /// All directed edges in deterministic order.
    pub fn edges(&self) -> impl Iterator<Item = (SwitchId, Edge)> + '_ {
        self.adjacency.iter().flat_map(|(sw, edges)| edges.iter().map(move |e| (*sw, *e)))
    }

    /// Logs the adjacency of every switch at debug level.
    pub fn log_topology(&self) {
        log::debug!("Current topology ({} switches, {} directed edges):", self.switch_count(), self.edge_count());
        for (switch, edges) in &self.adjacency {
            let adjacent: Vec<String> = edges.iter().map(|e| format!("{}@{}", e.neighbor, e.local_port)).collect();
            log::debug!("  switch {} has adjacents [{}]", switch, adjacent.join(", "));
        }
    }
}
