use std::collections::BTreeSet;

use crate::domain::network::addr::{MacAddr, PortNo};
use crate::domain::network::flow_table::FlowTableCache;
use crate::domain::utils::id::SwitchId;

/// Controller-side state of one connected switch.
#[derive(Debug, Clone)]
pub struct SwitchController {
    dpid: SwitchId,
    ports: BTreeSet<PortNo>,
    flow_table: FlowTableCache,
}

impl SwitchController {
    pub fn new(dpid: SwitchId, ports: impl IntoIterator<Item = PortNo>) -> Self {
        Self { dpid, ports: ports.into_iter().collect(), flow_table: FlowTableCache::new() }
    }

    pub fn dpid(&self) -> SwitchId {
        self.dpid
    }

    pub fn ports(&self) -> &BTreeSet<PortNo> {
        &self.ports
    }

    /// Ports learned after the handshake, e.g. from link discovery.
    pub fn add_port(&mut self, port: PortNo) {
        self.ports.insert(port);
    }

    pub fn flow_table(&self) -> &FlowTableCache {
        &self.flow_table
    }

    pub fn next_hop(&self, src: MacAddr, dst: MacAddr) -> Option<PortNo> {
        self.flow_table.lookup(src, dst)
    }

    pub fn write_on_table(&mut self, src: MacAddr, dst: MacAddr, port: PortNo) {
        log::debug!("Switch {}: {} -> {} via port {}", self.dpid, src, dst, port);
        self.flow_table.install(src, dst, port);
    }

    pub fn clear_table(&mut self) {
        self.flow_table.clear_all();
    }
}
