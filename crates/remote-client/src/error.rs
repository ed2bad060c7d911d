//! Client error types.
//!
//! Every error here is recoverable by design: storage failures degrade to
//! defaults, probe failures become an `offline` classification, and
//! dispatch failures become user-facing messages. Nothing propagates to a
//! top-level handler.

use thiserror::Error;

use remote_core::{DeviceId, WolError};

/// Local persistence failure. Logged at the registry boundary, never
/// surfaced as a blocking error.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data did not parse.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Registry operation failure.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// No device with the given id exists.
    #[error("device not found: {0}")]
    DeviceNotFound(DeviceId),
}

/// User-facing failure of a dispatched command. The display strings are
/// what the user sees.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// No device is currently selected.
    #[error("No PC selected")]
    NoDeviceSelected,

    /// The selected device has no address to send power commands to.
    #[error("Selected PC has no IP address")]
    MissingAddress,

    /// Power commands are refused while the device is known-offline.
    #[error("PC is offline and cannot receive commands")]
    DeviceOffline,

    /// Wake is refused while the device is known-online.
    #[error("This PC is already online")]
    AlreadyOnline,

    /// Wake-on-LAN failed (bad MAC or socket error).
    #[error("Failed to send Wake-on-LAN: {0}")]
    Wol(#[from] WolError),

    /// The agent answered with a non-success status.
    #[error("Server error {status}: {message}")]
    Agent {
        /// HTTP status code returned by the agent.
        status: u16,
        /// Error text from the agent body, when parseable.
        message: String,
    },

    /// The agent could not be reached within the timeout.
    #[error("Could not connect to PC agent: {0}")]
    Network(String),
}
