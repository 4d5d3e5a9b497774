pub mod controller_config_dto;
pub mod scenario_dto;
