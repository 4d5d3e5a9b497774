pub mod clock;
pub mod controller;
pub mod firewall;
pub mod network;
pub mod utils;
