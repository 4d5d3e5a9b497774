use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::domain::controller::southbound::{Southbound, SouthboundCommand};
use crate::domain::network::addr::{FlowMatch, FlowStat, OutputPort, PayloadRef, PortNo};
use crate::domain::utils::id::SwitchId;
use crate::error::SouthboundError;

#[derive(Debug, Default)]
struct RecorderState {
    commands: Vec<SouthboundCommand>,
    flow_stats: HashMap<SwitchId, Vec<FlowStat>>,
    disconnected: HashSet<SwitchId>,
}

/// In-memory forwarding layer that records every command it accepts.
///
/// Clones share state, so one handle can be moved into the controller while
/// another is kept for inspection. Commands to a switch marked disconnected
/// fail with [`SouthboundError::Disconnected`] and are not recorded.
#[derive(Debug, Clone, Default)]
pub struct RecordingSouthbound {
    inner: Arc<Mutex<RecorderState>>,
}

impl RecordingSouthbound {
    pub fn new() -> Self {
        Self::default()
    }

    /// Statistics returned for `dpid` on every following request.
    pub fn set_flow_stats(&self, dpid: SwitchId, stats: Vec<FlowStat>) {
        self.inner.lock().expect("Mutex poisoned").flow_stats.insert(dpid, stats);
    }

    pub fn disconnect(&self, dpid: SwitchId) {
        self.inner.lock().expect("Mutex poisoned").disconnected.insert(dpid);
    }

    pub fn reconnect(&self, dpid: SwitchId) {
        self.inner.lock().expect("Mutex poisoned").disconnected.remove(&dpid);
    }

    pub fn commands(&self) -> Vec<SouthboundCommand> {
        self.inner.lock().expect("Mutex poisoned").commands.clone()
    }

    /// Returns the recorded commands and forgets them.
    pub fn take_commands(&self) -> Vec<SouthboundCommand> {
        std::mem::take(&mut self.inner.lock().expect("Mutex poisoned").commands)
    }

    fn record(&self, command: SouthboundCommand) -> Result<(), SouthboundError> {
        let mut state = self.inner.lock().expect("Mutex poisoned");
        let dpid = command.dpid();
        if state.disconnected.contains(&dpid) {
            return Err(SouthboundError::Disconnected(dpid));
        }
        state.commands.push(command);
        Ok(())
    }
}

impl Southbound for RecordingSouthbound {
    fn install_flow_entry(&mut self, dpid: SwitchId, flow_match: &FlowMatch, out_port: PortNo) -> Result<(), SouthboundError> {
        self.record(SouthboundCommand::InstallFlowEntry { dpid, flow_match: *flow_match, out_port })
    }

    fn clear_flow_table(&mut self, dpid: SwitchId) -> Result<(), SouthboundError> {
        self.record(SouthboundCommand::ClearFlowTable { dpid })
    }

    fn forward_packet(&mut self, dpid: SwitchId, out: OutputPort, payload: PayloadRef) -> Result<(), SouthboundError> {
        self.record(SouthboundCommand::ForwardPacket { dpid, out, payload })
    }

    fn drop_packet(&mut self, dpid: SwitchId, payload: PayloadRef) -> Result<(), SouthboundError> {
        self.record(SouthboundCommand::DropPacket { dpid, payload })
    }

    fn install_block_rule(&mut self, dpid: SwitchId, flow_match: &FlowMatch, priority: u16) -> Result<(), SouthboundError> {
        self.record(SouthboundCommand::InstallBlockRule { dpid, flow_match: *flow_match, priority })
    }

    fn remove_block_rule(&mut self, dpid: SwitchId, flow_match: &FlowMatch, priority: u16) -> Result<(), SouthboundError> {
        self.record(SouthboundCommand::RemoveBlockRule { dpid, flow_match: *flow_match, priority })
    }

    fn request_flow_statistics(&mut self, dpid: SwitchId) -> Result<Vec<FlowStat>, SouthboundError> {
        self.record(SouthboundCommand::RequestFlowStatistics { dpid })?;
        let state = self.inner.lock().expect("Mutex poisoned");
        Ok(state.flow_stats.get(&dpid).cloned().unwrap_or_default())
    }
}
