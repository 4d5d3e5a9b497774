use serde::{Deserialize, Serialize};

/// A topology plus traffic to replay through the controller.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioDto {
    pub switches: Vec<SwitchDto>,
    pub links: Vec<LinkDto>,
    #[serde(default)]
    pub hosts: Vec<HostDto>,
    #[serde(default)]
    pub packets: Vec<PacketDto>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchDto {
    pub dpid: u64,
    #[serde(default)]
    pub ports: Vec<u16>,
}

/// A physical link; both directions are announced.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkDto {
    pub dpid_a: u64,
    pub port_a: u16,
    pub dpid_b: u64,
    pub port_b: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostDto {
    pub name: String,
    pub mac: String,
    pub ip: Option<String>,
    pub dpid: u64,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PacketDto {
    pub dpid: u64,
    pub in_port: u16,
    pub src: String,
    pub dst: String,
    pub ether_type: u16,
    pub ip_proto: Option<u8>,
    pub ip_src: Option<String>,
    pub ip_dst: Option<String>,
}
