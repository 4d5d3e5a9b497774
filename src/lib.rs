use crate::api::controller_config_dto::ControllerConfigDto;
use crate::api::scenario_dto::ScenarioDto;
use crate::domain::controller::config::ControllerConfig;
use crate::domain::controller::scenario::Scenario;
use crate::error::Result;
use crate::loader::parser::parse_json_file;

pub mod api;
pub mod domain;
pub mod error;
pub mod loader;
pub mod logger;

/// Loads the controller configuration, or the defaults when no file is given.
pub fn load_config(file_path: Option<&str>) -> Result<ControllerConfig> {
    let dto = match file_path {
        Some(path) => {
            log::info!("Loading controller configuration from '{}'", path);
            parse_json_file::<ControllerConfigDto>(path)?
        }
        None => ControllerConfigDto::default(),
    };

    Ok(ControllerConfig::try_from(dto)?)
}

/// Loads and validates a scenario file.
pub fn load_scenario(file_path: &str) -> Result<Scenario> {
    let dto: ScenarioDto = parse_json_file(file_path)?;
    log::info!("Scenario '{}' parsed: {} switches, {} links, {} hosts, {} packets.", file_path, dto.switches.len(), dto.links.len(), dto.hosts.len(), dto.packets.len());

    Ok(Scenario::try_from(dto)?)
}
