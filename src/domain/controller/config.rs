use std::collections::BTreeSet;
use std::str::FromStr;
use std::time::Duration;

use crate::api::controller_config_dto::ControllerConfigDto;
use crate::domain::firewall::firewall::FirewallConfig;
use crate::domain::network::addr::{ETH_TYPE_IPV6, ETH_TYPE_LLDP};
use crate::error::ConversionError;

/// What happens to a packet the controller cannot route: either because the
/// destination host is unknown or because no path reaches it. The same policy
/// is applied in both cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissPolicy {
    #[default]
    Flood,
    Drop,
}

impl FromStr for MissPolicy {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "flood" => Ok(MissPolicy::Flood),
            "drop" => Ok(MissPolicy::Drop),
            _ => Err(ConversionError::UnknownMissPolicy(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    pub miss_policy: MissPolicy,

    /// Link-layer types dropped before any lookup.
    pub dropped_ether_types: BTreeSet<u16>,

    pub firewall: FirewallConfig,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self { miss_policy: MissPolicy::default(), dropped_ether_types: BTreeSet::from([ETH_TYPE_LLDP, ETH_TYPE_IPV6]), firewall: FirewallConfig::default() }
    }
}

impl TryFrom<ControllerConfigDto> for ControllerConfig {
    type Error = ConversionError;

    fn try_from(dto: ControllerConfigDto) -> Result<Self, Self::Error> {
        let defaults = ControllerConfig::default();

        let miss_policy = match dto.miss_policy {
            Some(policy) => policy.parse()?,
            None => defaults.miss_policy,
        };

        let dropped_ether_types = match dto.dropped_ether_types {
            Some(types) => types.into_iter().collect(),
            None => defaults.dropped_ether_types,
        };

        let mut firewall = defaults.firewall;
        if let Some(fw) = dto.firewall {
            if let Some(s) = fw.sample_interval_s {
                firewall.sample_interval = Duration::from_secs(s);
            }
            if let Some(s) = fw.unlock_interval_s {
                firewall.unlock_interval = Duration::from_secs(s);
            }
            if let Some(max) = fw.max_flows_per_destination {
                firewall.max_flows_per_destination = max;
            }
            if let Some(priority) = fw.block_priority {
                firewall.block_priority = priority;
            }
        }

        if firewall.sample_interval.is_zero() {
            return Err(ConversionError::InvalidValue { field: "firewall.sampleIntervalS", reason: "must be positive".to_string() });
        }
        if firewall.unlock_interval <= firewall.sample_interval {
            return Err(ConversionError::InvalidFirewallTiming {
                sample_s: firewall.sample_interval.as_secs(),
                unlock_s: firewall.unlock_interval.as_secs(),
            });
        }

        Ok(ControllerConfig { miss_policy, dropped_ether_types, firewall })
    }
}
