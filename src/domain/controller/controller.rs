use std::collections::BTreeMap;

use crate::domain::clock::clock::SharedClock;
use crate::domain::controller::config::{ControllerConfig, MissPolicy};
use crate::domain::controller::events::{ControllerEvent, DropReason, EventOutcome, LinkEvent, PacketOutcome};
use crate::domain::controller::host_tracker::{HostLocation, HostLocator};
use crate::domain::controller::southbound::Southbound;
use crate::domain::controller::switch_controller::SwitchController;
use crate::domain::firewall::firewall::FirewallMonitor;
use crate::domain::network::addr::{FlowMatch, OutputPort, PacketIn, PortNo};
use crate::domain::network::routing::{Hop, Route, RoutingEngine};
use crate::domain::network::topology::TopologyGraph;
use crate::domain::utils::id::SwitchId;
use crate::domain::utils::statistics::{StatsCollector, StatsRow};
use crate::error::{RoutingError, TopologyError};

/// Ties the topology, routing, per-switch tables and the firewall together.
///
/// The controller is the only writer of all of its state. Events are handed
/// to [`Controller::handle_event`] one at a time and every handler runs to
/// completion before the next one starts.
pub struct Controller {
    config: ControllerConfig,
    graph: TopologyGraph,
    routing: RoutingEngine,

    /// Live switches. An entry exists exactly between SwitchUp and SwitchDown.
    switches: BTreeMap<SwitchId, SwitchController>,

    firewall: FirewallMonitor,
    southbound: Box<dyn Southbound>,
    host_locator: Box<dyn HostLocator>,
    clock: SharedClock,
    stats: Option<StatsCollector>,

    /// Number of link events seen since start-up.
    links_counter: u64,
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("config", &self.config)
            .field("switches", &self.switches.keys().collect::<Vec<_>>())
            .field("graph_generation", &self.graph.generation())
            .field("links_counter", &self.links_counter)
            .finish()
    }
}

impl Controller {
    pub fn new(config: ControllerConfig, southbound: Box<dyn Southbound>, host_locator: Box<dyn HostLocator>, clock: SharedClock) -> Self {
        let firewall = FirewallMonitor::new(config.firewall, clock.clone());

        log::info!("Controller initialized");

        Self {
            config,
            graph: TopologyGraph::new(),
            routing: RoutingEngine::new(),
            switches: BTreeMap::new(),
            firewall,
            southbound,
            host_locator,
            clock,
            stats: None,
            links_counter: 0,
        }
    }

    pub fn with_stats(mut self, stats: StatsCollector) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn graph(&self) -> &TopologyGraph {
        &self.graph
    }

    pub fn routing(&self) -> &RoutingEngine {
        &self.routing
    }

    pub fn firewall(&self) -> &FirewallMonitor {
        &self.firewall
    }

    pub fn switch(&self, dpid: SwitchId) -> Option<&SwitchController> {
        self.switches.get(&dpid)
    }

    pub fn connected_switches(&self) -> Vec<SwitchId> {
        self.switches.keys().copied().collect()
    }

    pub fn links_counter(&self) -> u64 {
        self.links_counter
    }

    /// Path between two switches, recomputing the routing state if needed.
    pub fn route(&mut self, from: SwitchId, to: SwitchId) -> Result<Route, RoutingError> {
        let before = self.routing.recompute_count();
        let result = self.routing.get_path(&self.graph, from, to);
        if self.routing.recompute_count() != before {
            self.record("Recompute", None, format!("generation {}", self.graph.generation()));
        }
        result
    }

    pub fn handle_event(&mut self, event: ControllerEvent) -> EventOutcome {
        log::trace!("Handling {}", event.name());

        match event {
            ControllerEvent::SwitchUp { dpid, ports } => self.handle_switch_up(dpid, ports),
            ControllerEvent::SwitchDown { dpid } => self.handle_switch_down(dpid),
            ControllerEvent::LinkUp(link) => self.handle_link_up(link),
            ControllerEvent::LinkDown(link) => self.handle_link_down(link),
            ControllerEvent::PacketIn(packet) => EventOutcome::Packet(self.handle_packet_in(packet)),
            ControllerEvent::StatsSampleTick => {
                let switches = self.connected_switches();
                let locked = self.firewall.sample(&switches, self.southbound.as_mut());
                for dst in &locked {
                    self.record("Lock", None, dst.to_string());
                }
                EventOutcome::Locked(locked)
            }
            ControllerEvent::UnlockTick => {
                let switches = self.connected_switches();
                let unlocked = self.firewall.unlock_all(&switches, self.southbound.as_mut());
                for dst in &unlocked {
                    self.record("Unlock", None, dst.to_string());
                }
                EventOutcome::Unlocked(unlocked)
            }
        }
    }

    fn handle_switch_up(&mut self, dpid: SwitchId, ports: Vec<PortNo>) -> EventOutcome {
        if self.switches.contains_key(&dpid) {
            log::debug!("Switch {} is already connected", dpid);
            return EventOutcome::Ignored;
        }

        log::info!("Switch {} has come up.", dpid);
        self.switches.insert(dpid, SwitchController::new(dpid, ports));
        self.graph.add_switch(dpid);
        self.firewall.on_switch_up(dpid, self.southbound.as_mut());
        self.after_topology_change();

        EventOutcome::Applied
    }

    fn handle_switch_down(&mut self, dpid: SwitchId) -> EventOutcome {
        if self.switches.remove(&dpid).is_none() {
            log::debug!("Ignoring disconnect of unknown switch {}", dpid);
            return EventOutcome::Ignored;
        }

        log::info!("Switch {} has gone down.", dpid);
        if let Err(e) = self.graph.remove_switch(dpid) {
            log::warn!("Topology out of sync with connections: {}", e);
        }
        self.host_locator.forget_switch(dpid);
        self.after_topology_change();

        EventOutcome::Applied
    }

    fn handle_link_up(&mut self, link: LinkEvent) -> EventOutcome {
        self.links_counter += 1;
        log::info!("Link has been discovered from {},{} to {},{}", link.dpid_a, link.port_a, link.dpid_b, link.port_b);
        log::info!("The discovered link is the {}th link", self.links_counter);

        let forward = self.graph.add_link(link.dpid_a, link.port_a, link.dpid_b);
        let backward = self.graph.add_link(link.dpid_b, link.port_b, link.dpid_a);
        let changed = Self::mutation_applied(forward, "link up") | Self::mutation_applied(backward, "link up");

        if let Some(switch) = self.switches.get_mut(&link.dpid_a) {
            switch.add_port(link.port_a);
        }
        if let Some(switch) = self.switches.get_mut(&link.dpid_b) {
            switch.add_port(link.port_b);
        }

        if !changed {
            return EventOutcome::Ignored;
        }

        self.after_topology_change();
        self.graph.log_topology();
        EventOutcome::Applied
    }

    fn handle_link_down(&mut self, link: LinkEvent) -> EventOutcome {
        log::info!("Link from {},{} to {},{} is down", link.dpid_a, link.port_a, link.dpid_b, link.port_b);

        let forward = self.graph.remove_link(link.dpid_a, link.port_a, link.dpid_b);
        let backward = self.graph.remove_link(link.dpid_b, link.port_b, link.dpid_a);
        let changed = Self::mutation_applied(forward, "link down") | Self::mutation_applied(backward, "link down");

        if !changed {
            return EventOutcome::Ignored;
        }

        self.after_topology_change();
        self.graph.log_topology();
        EventOutcome::Applied
    }

    fn mutation_applied(result: Result<bool, TopologyError>, what: &str) -> bool {
        match result {
            Ok(changed) => changed,
            Err(e) => {
                log::warn!("Ignoring {}: {}", what, e);
                false
            }
        }
    }

    /// Every cached forwarding decision may now be stale or loop through a
    /// removed link, so all of them go.
    fn after_topology_change(&mut self) {
        self.clear_tables();
        self.record("Topology", None, format!("generation {}", self.graph.generation()));
    }

    /// Empties the cache of every connected switch and the switches' own tables.
    fn clear_tables(&mut self) {
        for (dpid, switch) in self.switches.iter_mut() {
            switch.clear_table();
            if let Err(e) = self.southbound.clear_flow_table(*dpid) {
                log::warn!("Could not clear flow table of {}: {}", dpid, e);
            }
        }
    }

    /// Resolves a forwarding miss.
    fn handle_packet_in(&mut self, packet: PacketIn) -> PacketOutcome {
        let dpid = packet.dpid;
        log::info!("Packet arrived to switch {} from {} to {} (type {:#06x})", dpid, packet.src, packet.dst, packet.ether_type);

        if !self.switches.contains_key(&dpid) {
            log::warn!("Packet from unknown switch {}", dpid);
            return PacketOutcome::Dropped(DropReason::UnknownSwitch);
        }

        if self.config.dropped_ether_types.contains(&packet.ether_type) {
            self.drop_packet(&packet);
            return self.finish(&packet, PacketOutcome::Dropped(DropReason::NotRouted));
        }

        if !self.graph.is_inter_switch_port(dpid, packet.in_port)
            && self.host_locator.observe(packet.src, HostLocation { dpid, port: packet.in_port })
        {
            // Entries towards the old attachment point are wrong now.
            self.clear_tables();
            self.record("HostMoved", Some(dpid), packet.src.to_string());
        }

        if let Some(port) = self.switches.get(&dpid).and_then(|s| s.next_hop(packet.src, packet.dst)) {
            self.forward(&packet, OutputPort::Physical(port));
            return self.finish(&packet, PacketOutcome::Forwarded(port));
        }

        let Some(location) = self.host_locator.resolve(packet.dst) else {
            log::info!("Destination {} is unknown", packet.dst);
            return self.apply_miss_policy(&packet, DropReason::UnknownDestination);
        };

        let hops = if location.dpid == dpid {
            vec![Hop { switch: dpid, egress: location.port }]
        } else {
            match self.route(dpid, location.dpid) {
                Ok(route) if !route.hops.is_empty() => route.hops,
                Ok(_) => return self.apply_miss_policy(&packet, DropReason::Unreachable),
                Err(e) => {
                    log::info!("Cannot route {} -> {}: {}", packet.src, packet.dst, e);
                    return self.apply_miss_policy(&packet, DropReason::Unreachable);
                }
            }
        };

        let port = self.install_and_forward(&packet, &hops);
        self.finish(&packet, PacketOutcome::Forwarded(port))
    }

    /// Writes the (src, dst) entry on every hop and sends the packet out of
    /// the first one. `hops` must not be empty.
    fn install_and_forward(&mut self, packet: &PacketIn, hops: &[Hop]) -> PortNo {
        let flow_match = FlowMatch::for_packet(packet);

        for hop in hops {
            match self.switches.get_mut(&hop.switch) {
                Some(switch) => switch.write_on_table(packet.src, packet.dst, hop.egress),
                None => {
                    log::warn!("Route crosses disconnected switch {}", hop.switch);
                    continue;
                }
            }
            if let Err(e) = self.southbound.install_flow_entry(hop.switch, &flow_match, hop.egress) {
                log::warn!("Could not install flow entry on {}: {}", hop.switch, e);
            }
        }

        let first = hops[0].egress;
        self.forward(packet, OutputPort::Physical(first));
        first
    }

    fn apply_miss_policy(&mut self, packet: &PacketIn, reason: DropReason) -> PacketOutcome {
        let outcome = match self.config.miss_policy {
            MissPolicy::Flood => {
                self.forward(packet, OutputPort::Flood);
                PacketOutcome::Flooded
            }
            MissPolicy::Drop => {
                self.drop_packet(packet);
                PacketOutcome::Dropped(reason)
            }
        };
        self.finish(packet, outcome)
    }

    fn forward(&mut self, packet: &PacketIn, out: OutputPort) {
        if let Err(e) = self.southbound.forward_packet(packet.dpid, out, packet.payload) {
            log::warn!("Could not forward packet on {} to {}: {}", packet.dpid, out, e);
        }
    }

    fn drop_packet(&mut self, packet: &PacketIn) {
        if let Err(e) = self.southbound.drop_packet(packet.dpid, packet.payload) {
            log::warn!("Could not drop packet on {}: {}", packet.dpid, e);
        }
    }

    fn finish(&self, packet: &PacketIn, outcome: PacketOutcome) -> PacketOutcome {
        log::debug!("Packet {} -> {} on {}: {:?}", packet.src, packet.dst, packet.dpid, outcome);
        self.record("Packet", Some(packet.dpid), format!("{:?}", outcome));
        outcome
    }

    fn record(&self, event: &'static str, switch: Option<SwitchId>, detail: String) {
        if let Some(stats) = &self.stats {
            stats.record(StatsRow { time_ms: self.clock.get_current_time_in_ms(), event, switch, detail });
        }
    }
}
