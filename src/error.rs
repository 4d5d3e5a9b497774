use thiserror::Error;

use crate::domain::utils::id::SwitchId;

#[derive(Debug, Error)]
pub enum Error {
    #[error("File not found or could not be read: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("Failed to build controller model: {0}")]
    ConversionError(#[from] ConversionError),

    #[error("Controller event loop is not running")]
    EventLoopStopped,
}

pub type Result<T> = std::result::Result<T, Error>;

/// Raised while turning DTOs into domain values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversionError {
    #[error("Invalid MAC address: '{0}'")]
    InvalidMacAddr(String),

    #[error("Unknown miss policy: '{0}' (expected 'flood' or 'drop')")]
    UnknownMissPolicy(String),

    #[error("Invalid firewall timing: unlock interval {unlock_s}s must exceed sample interval {sample_s}s")]
    InvalidFirewallTiming { sample_s: u64, unlock_s: u64 },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Topology mutations against switches the graph does not know.
///
/// Callers inside the control loop treat these as logical no-ops.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum TopologyError {
    #[error("Switch {0} is not part of the topology")]
    SwitchNotFound(SwitchId),

    #[error("Refusing self-loop on switch {0}")]
    SelfLoop(SwitchId),
}

#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum RoutingError {
    #[error("No path from {from} to {to}")]
    PathNotFound { from: SwitchId, to: SwitchId },

    #[error("No egress port recorded on {from} towards {to}")]
    MissingEgressPort { from: SwitchId, to: SwitchId },
}

/// Failures reported by the forwarding layer for a single command.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum SouthboundError {
    #[error("Switch {0} is not connected")]
    Disconnected(SwitchId),
}
