//! The device model shared by the client registry, poller, and dispatcher.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Agent port used when a device does not specify one.
pub const DEFAULT_AGENT_PORT: u16 = 3000;

/// Opaque unique device identifier, assigned at creation, immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(Uuid);

impl DeviceId {
    /// Generate a fresh identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DeviceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Last-known reachability of a device, as recorded by the status poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    /// The agent answered a recent health probe.
    Online,
    /// A recent probe timed out, was refused, or returned an error.
    Offline,
    /// Never probed since creation (or since a registry reload).
    #[default]
    Unknown,
}

impl DeviceStatus {
    /// Lowercase label, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Online => "online",
            DeviceStatus::Offline => "offline",
            DeviceStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One remote computer a user can control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Unique across the registry.
    pub id: DeviceId,
    /// User-supplied display label.
    pub name: String,
    /// IPv4 address or hostname. Not validated for format.
    pub ip: String,
    /// Hardware address as entered by the user. Validated at send time
    /// only; a device may be stored with an invalid MAC and simply fail
    /// to wake.
    pub mac: String,
    /// TCP port of the power-command agent; `None` means the default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Advisory reachability state. Written only by the status poller.
    #[serde(default)]
    pub status: DeviceStatus,
    /// When the poller last saw the device online.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
}

impl Device {
    /// Agent port with the default applied (`None` or `0` → 3000).
    pub fn agent_port(&self) -> u16 {
        match self.port {
            Some(port) if port != 0 => port,
            _ => DEFAULT_AGENT_PORT,
        }
    }

    /// Base URL of the device's power-command agent.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.ip, self.agent_port())
    }
}

/// A power command the agent can execute on its host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerCommand {
    /// Shut the host down immediately.
    Shutdown,
    /// Restart the host immediately.
    Restart,
    /// Suspend the host.
    Sleep,
}

impl PowerCommand {
    /// Canonical agent route for this command.
    ///
    /// `restart` is the single canonical spelling; no `reboot` or `lock`
    /// route exists.
    pub fn route(&self) -> &'static str {
        match self {
            PowerCommand::Shutdown => "shutdown",
            PowerCommand::Restart => "restart",
            PowerCommand::Sleep => "sleep",
        }
    }

    /// Acknowledgment message the agent returns on success.
    pub fn ack_message(&self) -> &'static str {
        match self {
            PowerCommand::Shutdown => "Shutting down...",
            PowerCommand::Restart => "Restarting...",
            PowerCommand::Sleep => "Sleeping...",
        }
    }
}

impl fmt::Display for PowerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.route())
    }
}

/// A user action the command dispatcher understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerAction {
    /// Wake the device via Wake-on-LAN broadcast.
    Wake,
    /// Suspend the device through its agent.
    Sleep,
    /// Restart the device through its agent.
    Restart,
    /// Shut the device down through its agent.
    Shutdown,
}

impl PowerAction {
    /// The agent-side command for this action, or `None` for wake (which
    /// goes over UDP, not through the agent).
    pub fn command(&self) -> Option<PowerCommand> {
        match self {
            PowerAction::Wake => None,
            PowerAction::Sleep => Some(PowerCommand::Sleep),
            PowerAction::Restart => Some(PowerCommand::Restart),
            PowerAction::Shutdown => Some(PowerCommand::Shutdown),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(port: Option<u16>) -> Device {
        Device {
            id: DeviceId::new(),
            name: "desk".into(),
            ip: "192.168.1.20".into(),
            mac: "AA:BB:CC:DD:EE:FF".into(),
            port,
            status: DeviceStatus::Unknown,
            last_seen: None,
        }
    }

    #[test]
    fn port_defaults_to_3000() {
        assert_eq!(device(None).agent_port(), 3000);
        assert_eq!(device(Some(0)).agent_port(), 3000);
        assert_eq!(device(Some(8080)).agent_port(), 8080);
    }

    #[test]
    fn base_url_uses_resolved_port() {
        assert_eq!(device(None).base_url(), "http://192.168.1.20:3000");
        assert_eq!(device(Some(4000)).base_url(), "http://192.168.1.20:4000");
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&DeviceStatus::Online).unwrap(),
            "\"online\""
        );
        assert_eq!(
            serde_json::from_str::<DeviceStatus>("\"offline\"").unwrap(),
            DeviceStatus::Offline
        );
    }

    #[test]
    fn device_round_trips_through_json() {
        let original = device(Some(3001));
        let json = serde_json::to_string(&original).unwrap();
        let back: Device = serde_json::from_str(&json).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn wake_has_no_agent_command() {
        assert_eq!(PowerAction::Wake.command(), None);
        assert_eq!(
            PowerAction::Restart.command(),
            Some(PowerCommand::Restart)
        );
    }
}
