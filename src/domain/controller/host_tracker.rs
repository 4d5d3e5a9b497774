use std::collections::HashMap;

use crate::domain::network::addr::{MacAddr, PortNo};
use crate::domain::utils::id::SwitchId;

/// Attachment point of a host: the switch and the edge port it hangs off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostLocation {
    pub dpid: SwitchId,
    pub port: PortNo,
}

/// Resolves a destination address to where it is attached.
pub trait HostLocator: Send {
    fn resolve(&self, addr: MacAddr) -> Option<HostLocation>;

    /// Called for the source of every packet seen on an edge port. Returns
    /// `true` when a known host showed up at a different location.
    fn observe(&mut self, _addr: MacAddr, _location: HostLocation) -> bool {
        false
    }

    /// Called when a switch disconnects.
    fn forget_switch(&mut self, _dpid: SwitchId) {}
}

/// Host locations from static configuration plus what was learned from
/// traffic. Static entries always win over learned ones.
#[derive(Debug, Clone, Default)]
pub struct HostTracker {
    pinned: HashMap<MacAddr, HostLocation>,
    learned: HashMap<MacAddr, HostLocation>,
}

impl HostTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pin(&mut self, addr: MacAddr, location: HostLocation) {
        self.pinned.insert(addr, location);
    }

    pub fn known_hosts(&self) -> usize {
        self.learned.keys().filter(|k| !self.pinned.contains_key(*k)).count() + self.pinned.len()
    }
}

impl HostLocator for HostTracker {
    fn resolve(&self, addr: MacAddr) -> Option<HostLocation> {
        self.pinned.get(&addr).or_else(|| self.learned.get(&addr)).copied()
    }

    fn observe(&mut self, addr: MacAddr, location: HostLocation) -> bool {
        if addr.is_multicast() || self.pinned.contains_key(&addr) {
            return false;
        }

        match self.learned.insert(addr, location) {
            None => {
                log::info!("Learned host {} at {}.{}", addr, location.dpid, location.port);
                false
            }
            Some(previous) if previous != location => {
                log::info!("Host {} moved from {}.{} to {}.{}", addr, previous.dpid, previous.port, location.dpid, location.port);
                true
            }
            Some(_) => false,
        }
    }

    fn forget_switch(&mut self, dpid: SwitchId) {
        self.learned.retain(|_, location| location.dpid != dpid);
    }
}
