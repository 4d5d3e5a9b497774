use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerConfigDto {
    pub miss_policy: Option<String>,
    pub dropped_ether_types: Option<Vec<u16>>,
    pub firewall: Option<FirewallDto>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirewallDto {
    pub sample_interval_s: Option<u64>,
    pub unlock_interval_s: Option<u64>,
    pub max_flows_per_destination: Option<usize>,
    pub block_priority: Option<u16>,
}
