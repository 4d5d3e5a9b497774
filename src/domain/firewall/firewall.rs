use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::net::Ipv4Addr;
use std::time::Duration;

use crate::domain::clock::clock::SharedClock;
use crate::domain::controller::southbound::Southbound;
use crate::domain::network::addr::{FlowMatch, FlowStat, IP_PROTO_UDP, OFP_DEFAULT_PRIORITY};
use crate::domain::utils::id::SwitchId;
use crate::logger::ANALYTICS_TARGET;

pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_UNLOCK_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_FLOWS_PER_DESTINATION: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirewallConfig {
    /// Period of the statistics sampling.
    pub sample_interval: Duration,

    /// Period of the unlock sweep. Always longer than `sample_interval`.
    pub unlock_interval: Duration,

    /// A destination is locked once a single reply holds more flows than this.
    pub max_flows_per_destination: usize,

    /// Priority of the block rules, above regular forwarding entries.
    pub block_priority: u16,
}

impl Default for FirewallConfig {
    fn default() -> Self {
        Self {
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            unlock_interval: DEFAULT_UNLOCK_INTERVAL,
            max_flows_per_destination: DEFAULT_MAX_FLOWS_PER_DESTINATION,
            block_priority: OFP_DEFAULT_PRIORITY + 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Clear,
    Locked { since_ms: i64 },
}

/// Detects UDP floods towards a single destination and blocks them for a while.
///
/// Each destination is either clear or locked. A sample moves it to locked,
/// and the periodic unlock sweep moves every locked destination back to clear
/// no matter whether the traffic stopped.
#[derive(Debug)]
pub struct FirewallMonitor {
    config: FirewallConfig,
    locked: BTreeMap<Ipv4Addr, i64>,
    clock: SharedClock,
}

impl FirewallMonitor {
    pub fn new(config: FirewallConfig, clock: SharedClock) -> Self {
        Self { config, locked: BTreeMap::new(), clock }
    }

    pub fn config(&self) -> &FirewallConfig {
        &self.config
    }

    pub fn state(&self, dst: Ipv4Addr) -> LockState {
        match self.locked.get(&dst) {
            Some(since_ms) => LockState::Locked { since_ms: *since_ms },
            None => LockState::Clear,
        }
    }

    pub fn is_locked(&self, dst: Ipv4Addr) -> bool {
        self.locked.contains_key(&dst)
    }

    pub fn locked_destinations(&self) -> Vec<Ipv4Addr> {
        self.locked.keys().copied().collect()
    }

    /// Counts the UDP flows per destination in one statistics reply.
    /// Destinations that are already locked are left out.
    pub fn count_flows(&self, stats: &[FlowStat]) -> HashMap<Ipv4Addr, usize> {
        let mut counts: HashMap<Ipv4Addr, usize> = HashMap::new();

        for stat in stats {
            if stat.flow_match.nw_proto != Some(IP_PROTO_UDP) {
                continue;
            }
            let Some(dst) = stat.flow_match.nw_dst else {
                continue;
            };
            if self.locked.contains_key(&dst) {
                continue;
            }
            *counts.entry(dst).or_insert(0) += 1;
        }

        counts
    }

    /// Polls every switch once and locks the destinations above the threshold.
    ///
    /// Counts start from zero on every call. Returns the newly locked
    /// destinations.
    pub fn sample(&mut self, switches: &[SwitchId], southbound: &mut dyn Southbound) -> Vec<Ipv4Addr> {
        let mut offenders: BTreeSet<Ipv4Addr> = BTreeSet::new();

        for dpid in switches {
            let stats = match southbound.request_flow_statistics(*dpid) {
                Ok(stats) => stats,
                Err(e) => {
                    log::warn!("Skipping flow statistics of {}: {}", dpid, e);
                    continue;
                }
            };

            for (dst, count) in self.count_flows(&stats) {
                log::trace!("Switch {} reports {} UDP flows to {}", dpid, count, dst);
                if count > self.config.max_flows_per_destination {
                    offenders.insert(dst);
                }
            }
        }

        for dst in &offenders {
            self.lock(*dst, switches, southbound);
        }

        offenders.into_iter().collect()
    }

    fn lock(&mut self, dst: Ipv4Addr, switches: &[SwitchId], southbound: &mut dyn Southbound) {
        let now = self.clock.get_current_time_in_ms();
        log::info!("Blocking {}", dst);

        let rule = FlowMatch::udp_to(dst);
        for dpid in switches {
            if let Err(e) = southbound.install_block_rule(*dpid, &rule, self.config.block_priority) {
                log::warn!("Could not install block rule for {} on {}: {}", dst, dpid, e);
            }
        }

        self.locked.insert(dst, now);

        tracing::info!(target: ANALYTICS_TARGET, Time = now, LogDescription = "Destination locked", Destination = %dst, Switches = switches.len());
    }

    /// Unlocks every locked destination. Returns what was unlocked.
    pub fn unlock_all(&mut self, switches: &[SwitchId], southbound: &mut dyn Southbound) -> Vec<Ipv4Addr> {
        let now = self.clock.get_current_time_in_ms();
        let locked = std::mem::take(&mut self.locked);

        for (dst, since_ms) in &locked {
            log::info!("Unblocking {}", dst);

            let rule = FlowMatch::udp_to(*dst);
            for dpid in switches {
                if let Err(e) = southbound.remove_block_rule(*dpid, &rule, self.config.block_priority) {
                    log::warn!("Could not remove block rule for {} on {}: {}", dst, dpid, e);
                }
            }

            tracing::info!(target: ANALYTICS_TARGET, Time = now, LogDescription = "Destination unlocked", Destination = %dst, LockedForMs = now - since_ms);
        }

        locked.into_keys().collect()
    }

    /// Pushes the block rules of all locked destinations to a switch that just connected.
    pub fn on_switch_up(&self, dpid: SwitchId, southbound: &mut dyn Southbound) {
        for dst in self.locked.keys() {
            if let Err(e) = southbound.install_block_rule(dpid, &FlowMatch::udp_to(*dst), self.config.block_priority) {
                log::warn!("Could not install block rule for {} on {}: {}", dst, dpid, e);
            }
        }
    }
}
