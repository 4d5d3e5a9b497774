use std::net::Ipv4Addr;

use crate::api::scenario_dto::{PacketDto, ScenarioDto};
use crate::domain::controller::events::{ControllerEvent, LinkEvent};
use crate::domain::controller::host_tracker::{HostLocation, HostTracker};
use crate::domain::network::addr::{MacAddr, NetworkHeader, PacketIn, PayloadRef, PortNo};
use crate::domain::utils::id::SwitchId;
use crate::error::ConversionError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    pub name: String,
    pub mac: MacAddr,
    pub ip: Option<Ipv4Addr>,
    pub location: HostLocation,
}

/// A validated [`ScenarioDto`]: the topology as controller events, the hosts
/// and the packets to replay.
#[derive(Debug, Clone, Default)]
pub struct Scenario {
    pub switches: Vec<(SwitchId, Vec<PortNo>)>,
    pub links: Vec<LinkEvent>,
    pub hosts: Vec<Host>,
    pub packets: Vec<PacketIn>,
}

impl TryFrom<ScenarioDto> for Scenario {
    type Error = ConversionError;

    fn try_from(dto: ScenarioDto) -> Result<Self, Self::Error> {
        let switches = dto.switches.into_iter().map(|s| (SwitchId::new(s.dpid), s.ports)).collect();

        let links = dto
            .links
            .into_iter()
            .map(|l| LinkEvent { dpid_a: SwitchId::new(l.dpid_a), port_a: l.port_a, dpid_b: SwitchId::new(l.dpid_b), port_b: l.port_b })
            .collect();

        let mut hosts = Vec::with_capacity(dto.hosts.len());
        for host in dto.hosts {
            hosts.push(Host {
                mac: host.mac.parse()?,
                ip: host.ip.as_deref().map(parse_ip).transpose()?,
                location: HostLocation { dpid: SwitchId::new(host.dpid), port: host.port },
                name: host.name,
            });
        }

        let mut packets = Vec::with_capacity(dto.packets.len());
        for (index, packet) in dto.packets.into_iter().enumerate() {
            packets.push(packet_from_dto(packet, PayloadRef(index as u32))?);
        }

        Ok(Scenario { switches, links, hosts, packets })
    }
}

fn parse_ip(value: &str) -> Result<Ipv4Addr, ConversionError> {
    value.parse().map_err(|_| ConversionError::InvalidValue { field: "ip", reason: format!("'{}' is not an IPv4 address", value) })
}

fn packet_from_dto(dto: PacketDto, payload: PayloadRef) -> Result<PacketIn, ConversionError> {
    let network = match (dto.ip_proto, dto.ip_src.as_deref(), dto.ip_dst.as_deref()) {
        (Some(protocol), Some(src), Some(dst)) => Some(NetworkHeader { protocol, src: parse_ip(src)?, dst: parse_ip(dst)? }),
        (None, None, None) => None,
        _ => {
            return Err(ConversionError::InvalidValue {
                field: "packets",
                reason: "ipProto, ipSrc and ipDst must be given together".to_string(),
            });
        }
    };

    Ok(PacketIn {
        dpid: SwitchId::new(dto.dpid),
        in_port: dto.in_port,
        src: dto.src.parse()?,
        dst: dto.dst.parse()?,
        ether_type: dto.ether_type,
        network,
        payload,
    })
}

impl Scenario {
    /// SwitchUp for every switch followed by LinkUp for every link.
    pub fn topology_events(&self) -> Vec<ControllerEvent> {
        let ups = self.switches.iter().map(|(dpid, ports)| ControllerEvent::SwitchUp { dpid: *dpid, ports: ports.clone() });
        let links = self.links.iter().map(|l| ControllerEvent::LinkUp(*l));
        ups.chain(links).collect()
    }

    /// Host locator preloaded with every host of the scenario.
    pub fn host_tracker(&self) -> HostTracker {
        let mut tracker = HostTracker::new();
        for host in &self.hosts {
            tracker.pin(host.mac, host.location);
        }
        tracker
    }

    pub fn host_by_name(&self, name: &str) -> Option<&Host> {
        self.hosts.iter().find(|h| h.name == name)
    }
}
