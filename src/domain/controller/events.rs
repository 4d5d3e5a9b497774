use std::net::Ipv4Addr;

use crate::domain::network::addr::{PacketIn, PortNo};
use crate::domain::utils::id::SwitchId;

/// A link as reported by discovery: `port_a` on `dpid_a` is wired to
/// `port_b` on `dpid_b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkEvent {
    pub dpid_a: SwitchId,
    pub port_a: PortNo,
    pub dpid_b: SwitchId,
    pub port_b: PortNo,
}

/// Everything the controller reacts to, delivered one at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    SwitchUp { dpid: SwitchId, ports: Vec<PortNo> },
    SwitchDown { dpid: SwitchId },
    LinkUp(LinkEvent),
    LinkDown(LinkEvent),
    PacketIn(PacketIn),
    StatsSampleTick,
    UnlockTick,
}

impl ControllerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ControllerEvent::SwitchUp { .. } => "SwitchUp",
            ControllerEvent::SwitchDown { .. } => "SwitchDown",
            ControllerEvent::LinkUp(_) => "LinkUp",
            ControllerEvent::LinkDown(_) => "LinkDown",
            ControllerEvent::PacketIn(_) => "PacketIn",
            ControllerEvent::StatsSampleTick => "StatsSampleTick",
            ControllerEvent::UnlockTick => "UnlockTick",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Link-layer type configured as never routed.
    NotRouted,
    UnknownDestination,
    Unreachable,
    /// The packet came from a switch the controller does not know.
    UnknownSwitch,
}

/// Terminal state of a forwarding-miss resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketOutcome {
    Forwarded(PortNo),
    Flooded,
    Dropped(DropReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// The event changed controller state.
    Applied,
    /// The event was a no-op (duplicate, unknown switch, ...).
    Ignored,
    Packet(PacketOutcome),
    Locked(Vec<Ipv4Addr>),
    Unlocked(Vec<Ipv4Addr>),
}
