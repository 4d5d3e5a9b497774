pub mod config;
pub mod controller;
pub mod events;
pub mod host_tracker;
pub mod runtime;
pub mod scenario;
pub mod southbound;
pub mod southbound_mock;
pub mod switch_controller;
