use std::collections::HashMap;

use crate::api::scenario_dto::{HostDto, LinkDto, ScenarioDto, SwitchDto};
use crate::domain::network::addr::MacAddr;
use crate::error::ConversionError;

const CLIENTS_ON_ROOT: usize = 3;

/// The widest fabric that can be generated: 32 switches on the last level.
pub const MAX_DATACENTER_LEVELS: u32 = 6;

/// Builds a layered datacenter fabric.
///
/// Level `l` holds `2^l` switches and every switch of a level is wired to
/// every switch of the next one. Three clients hang off the root switch and
/// one provider host off each switch of the last level. Ports are handed out
/// per switch in the order links are created, starting at 1.
pub fn datacenter(levels: u32) -> Result<ScenarioDto, ConversionError> {
    if levels == 0 || levels > MAX_DATACENTER_LEVELS {
        return Err(ConversionError::InvalidValue { field: "levels", reason: format!("must be between 1 and {}", MAX_DATACENTER_LEVELS) });
    }

    let mut next_dpid = 1u64;
    let mut switches_by_level: Vec<Vec<u64>> = Vec::new();

    for level in 0..levels {
        let mut level_switches = Vec::new();
        for _ in 0..(1u64 << level) {
            level_switches.push(next_dpid);
            next_dpid += 1;
        }
        switches_by_level.push(level_switches);
    }

    let mut next_port: HashMap<u64, u16> = HashMap::new();
    let mut take_port = |dpid: u64| {
        let port = next_port.entry(dpid).or_insert(1);
        let assigned = *port;
        *port += 1;
        assigned
    };

    let mut links = Vec::new();
    for pair in switches_by_level.windows(2) {
        for upper in &pair[0] {
            for lower in &pair[1] {
                links.push(LinkDto { dpid_a: *upper, port_a: take_port(*upper), dpid_b: *lower, port_b: take_port(*lower) });
            }
        }
    }

    let mut hosts = Vec::new();
    let mut next_host = 1u64;
    let mut add_host = |name: String, dpid: u64, port: u16| {
        hosts.push(HostDto {
            name,
            mac: MacAddr::from_u64(next_host).to_string(),
            ip: Some(format!("10.0.{}.{}", next_host / 256, next_host % 256)),
            dpid,
            port,
        });
        next_host += 1;
    };

    if let Some(root) = switches_by_level.first().and_then(|l| l.first()).copied() {
        for i in 0..CLIENTS_ON_ROOT {
            add_host(format!("client{}", i), root, take_port(root));
        }
    }
    if let Some(leaves) = switches_by_level.last() {
        for (i, leaf) in leaves.iter().enumerate() {
            add_host(format!("h{}", i), *leaf, take_port(*leaf));
        }
    }

    let mut switches: Vec<SwitchDto> = switches_by_level.iter().flatten().map(|dpid| SwitchDto { dpid: *dpid, ports: Vec::new() }).collect();
    for switch in &mut switches {
        let used = next_port.get(&switch.dpid).copied().unwrap_or(1);
        switch.ports = (1..used).collect();
    }

    log::info!("Datacenter topology: {} levels, {} switches, {} links, {} hosts", levels, switches.len(), links.len(), hosts.len());

    Ok(ScenarioDto { switches, links, hosts, packets: Vec::new() })
}
