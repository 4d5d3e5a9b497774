use std::collections::HashMap;

use crate::domain::network::addr::{MacAddr, PortNo};

/// Forwarding decisions of one switch, keyed by (source, destination) address.
#[derive(Debug, Clone, Default)]
pub struct FlowTableCache {
    entries: HashMap<(MacAddr, MacAddr), PortNo>,
}

impl FlowTableCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, src: MacAddr, dst: MacAddr) -> Option<PortNo> {
        self.entries.get(&(src, dst)).copied()
    }

    /// Overwrites any earlier entry for the same pair.
    pub fn install(&mut self, src: MacAddr, dst: MacAddr, port: PortNo) {
        self.entries.insert((src, dst), port);
    }

    pub fn clear_all(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
