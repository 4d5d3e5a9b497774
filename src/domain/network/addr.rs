use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::domain::utils::id::SwitchId;
use crate::error::ConversionError;

pub type PortNo = u16;

/// Default flow priority used by OpenFlow 1.0 switches.
pub const OFP_DEFAULT_PRIORITY: u16 = 0x8000;

pub const ETH_TYPE_IPV4: u16 = 0x0800;
pub const ETH_TYPE_ARP: u16 = 0x0806;
pub const ETH_TYPE_IPV6: u16 = 0x86dd;
pub const ETH_TYPE_LLDP: u16 = 0x88cc;

pub const IP_PROTO_TCP: u8 = 6;
pub const IP_PROTO_UDP: u8 = 17;

/// Where a packet-out should be sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputPort {
    Physical(PortNo),
    Flood,
}

impl fmt::Display for OutputPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputPort::Physical(port) => write!(f, "port {}", port),
            OutputPort::Flood => write!(f, "FLOOD"),
        }
    }
}

/// Opaque handle to the buffered packet on the switch side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PayloadRef(pub u32);

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    pub const BROADCAST: MacAddr = MacAddr([0xff; 6]);

    /// Locally administered address with the given value in the low 40 bits.
    pub fn from_u64(value: u64) -> Self {
        let bytes = value.to_be_bytes();
        MacAddr([0x02, bytes[3], bytes[4], bytes[5], bytes[6], bytes[7]])
    }

    pub fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 == 0x01
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.0;
        write!(f, "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}", b[0], b[1], b[2], b[3], b[4], b[5])
    }
}

impl fmt::Debug for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MacAddr({})", self)
    }
}

impl FromStr for MacAddr {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(|c| c == ':' || c == '-').collect();
        if parts.len() != 6 {
            return Err(ConversionError::InvalidMacAddr(s.to_string()));
        }

        let mut bytes = [0u8; 6];
        for (slot, part) in bytes.iter_mut().zip(parts) {
            if part.len() != 2 {
                return Err(ConversionError::InvalidMacAddr(s.to_string()));
            }
            *slot = u8::from_str_radix(part, 16).map_err(|_| ConversionError::InvalidMacAddr(s.to_string()))?;
        }
        Ok(MacAddr(bytes))
    }
}

impl TryFrom<String> for MacAddr {
    type Error = ConversionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MacAddr> for String {
    fn from(mac: MacAddr) -> Self {
        mac.to_string()
    }
}

/// Match key of a flow entry. `None` fields are wildcards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FlowMatch {
    pub dl_src: Option<MacAddr>,
    pub dl_dst: Option<MacAddr>,
    pub dl_type: Option<u16>,
    pub nw_proto: Option<u8>,
    pub nw_dst: Option<Ipv4Addr>,
}

impl FlowMatch {
    pub fn match_all() -> Self {
        Self::default()
    }

    /// Match used for forwarding entries: the address pair plus whatever the
    /// packet carries at the network layer.
    pub fn for_packet(packet: &PacketIn) -> Self {
        Self {
            dl_src: Some(packet.src),
            dl_dst: Some(packet.dst),
            dl_type: Some(packet.ether_type),
            nw_proto: packet.network.map(|n| n.protocol),
            nw_dst: packet.network.map(|n| n.dst),
        }
    }

    /// Match used for the firewall's block rules.
    pub fn udp_to(dst: Ipv4Addr) -> Self {
        Self { dl_type: Some(ETH_TYPE_IPV4), nw_proto: Some(IP_PROTO_UDP), nw_dst: Some(dst), ..Self::default() }
    }
}

/// The IPv4 part of a packet, when there is one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkHeader {
    pub protocol: u8,
    pub src: Ipv4Addr,
    pub dst: Ipv4Addr,
}

/// A packet that reached the controller because the switch had no matching rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketIn {
    pub dpid: SwitchId,
    pub in_port: PortNo,
    pub src: MacAddr,
    pub dst: MacAddr,
    pub ether_type: u16,
    pub network: Option<NetworkHeader>,
    pub payload: PayloadRef,
}

/// One entry of a flow statistics reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowStat {
    pub flow_match: FlowMatch,
    pub packet_count: u64,
}
