use crate::domain::network::addr::{FlowMatch, FlowStat, OutputPort, PayloadRef, PortNo};
use crate::domain::utils::id::SwitchId;
use crate::error::SouthboundError;

/// Commands the controller issues to the forwarding layer.
///
/// Implementations own the wire protocol and the switch connections. Every
/// command targets one switch and may fail independently of the others.
pub trait Southbound: Send {
    fn install_flow_entry(&mut self, dpid: SwitchId, flow_match: &FlowMatch, out_port: PortNo) -> Result<(), SouthboundError>;

    fn clear_flow_table(&mut self, dpid: SwitchId) -> Result<(), SouthboundError>;

    fn forward_packet(&mut self, dpid: SwitchId, out: OutputPort, payload: PayloadRef) -> Result<(), SouthboundError>;

    fn drop_packet(&mut self, dpid: SwitchId, payload: PayloadRef) -> Result<(), SouthboundError>;

    fn install_block_rule(&mut self, dpid: SwitchId, flow_match: &FlowMatch, priority: u16) -> Result<(), SouthboundError>;

    fn remove_block_rule(&mut self, dpid: SwitchId, flow_match: &FlowMatch, priority: u16) -> Result<(), SouthboundError>;

    fn request_flow_statistics(&mut self, dpid: SwitchId) -> Result<Vec<FlowStat>, SouthboundError>;
}

/// A recorded outward command, as issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SouthboundCommand {
    InstallFlowEntry { dpid: SwitchId, flow_match: FlowMatch, out_port: PortNo },
    ClearFlowTable { dpid: SwitchId },
    ForwardPacket { dpid: SwitchId, out: OutputPort, payload: PayloadRef },
    DropPacket { dpid: SwitchId, payload: PayloadRef },
    InstallBlockRule { dpid: SwitchId, flow_match: FlowMatch, priority: u16 },
    RemoveBlockRule { dpid: SwitchId, flow_match: FlowMatch, priority: u16 },
    RequestFlowStatistics { dpid: SwitchId },
}

impl SouthboundCommand {
    pub fn dpid(&self) -> SwitchId {
        match self {
            SouthboundCommand::InstallFlowEntry { dpid, .. }
            | SouthboundCommand::ClearFlowTable { dpid }
            | SouthboundCommand::ForwardPacket { dpid, .. }
            | SouthboundCommand::DropPacket { dpid, .. }
            | SouthboundCommand::InstallBlockRule { dpid, .. }
            | SouthboundCommand::RemoveBlockRule { dpid, .. }
            | SouthboundCommand::RequestFlowStatistics { dpid } => *dpid,
        }
    }
}
