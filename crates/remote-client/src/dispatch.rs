//! The command dispatcher.
//!
//! Translates a user action into either a Wake-on-LAN broadcast or an
//! HTTP POST to the selected device's agent, after checking the obvious
//! preconditions against the registry's advisory status. Exactly one
//! attempt per user action; the dispatcher never mutates device status
//! (the poller owns that field).

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use remote_core::{send_wol, Device, DeviceStatus, PowerAction, PowerCommand};

use crate::error::DispatchError;
use crate::registry::DeviceRegistry;

/// Dispatch timeout used when none is configured.
pub const DEFAULT_DISPATCH_TIMEOUT: Duration = Duration::from_secs(5);

/// What the user sees after a successful dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Human-readable confirmation, from the agent when available.
    pub message: String,
}

#[derive(Deserialize)]
struct AckBody {
    message: String,
}

#[derive(Deserialize)]
struct ErrBody {
    error: String,
}

/// Sends user actions to the currently selected device.
pub struct CommandDispatcher {
    registry: Arc<DeviceRegistry>,
    client: reqwest::Client,
    timeout: Duration,
}

impl CommandDispatcher {
    /// Dispatcher with the default 5-second timeout.
    pub fn new(registry: Arc<DeviceRegistry>) -> Self {
        Self::with_timeout(registry, DEFAULT_DISPATCH_TIMEOUT)
    }

    /// Dispatcher with an explicit timeout.
    pub fn with_timeout(registry: Arc<DeviceRegistry>, timeout: Duration) -> Self {
        Self {
            registry,
            client: reqwest::Client::new(),
            timeout,
        }
    }

    /// Perform `action` against the selected device.
    pub async fn dispatch(&self, action: PowerAction) -> Result<DispatchOutcome, DispatchError> {
        let device = self
            .registry
            .selected()
            .await
            .ok_or(DispatchError::NoDeviceSelected)?;

        match action.command() {
            None => self.wake(&device).await,
            Some(command) => self.power(&device, command).await,
        }
    }

    async fn wake(&self, device: &Device) -> Result<DispatchOutcome, DispatchError> {
        if device.status == DeviceStatus::Online {
            return Err(DispatchError::AlreadyOnline);
        }

        // MAC validity is enforced here, at send time; an unusable stored
        // MAC surfaces as InvalidAddress.
        send_wol(&device.mac).await?;
        info!(device = %device.name, "wake-on-LAN packet sent");
        Ok(DispatchOutcome {
            message: "Wake-on-LAN packet sent".into(),
        })
    }

    async fn power(
        &self,
        device: &Device,
        command: PowerCommand,
    ) -> Result<DispatchOutcome, DispatchError> {
        if device.ip.is_empty() {
            return Err(DispatchError::MissingAddress);
        }
        if device.status == DeviceStatus::Offline {
            return Err(DispatchError::DeviceOffline);
        }

        let url = format!("{}/{}", device.base_url(), command.route());
        info!(device = %device.name, %url, "dispatching power command");

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| DispatchError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            let message = match response.json::<AckBody>().await {
                Ok(body) => body.message,
                Err(_) => command.ack_message().to_string(),
            };
            Ok(DispatchOutcome { message })
        } else {
            let message = match response.json::<ErrBody>().await {
                Ok(body) => body.error,
                Err(_) => format!("HTTP {status}"),
            };
            Err(DispatchError::Agent {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remote_core::WolError;

    use crate::registry::{DeviceUpdate, NewDevice};

    async fn registry_with(ip: &str, mac: &str) -> (Arc<DeviceRegistry>, remote_core::DeviceId) {
        let registry = Arc::new(DeviceRegistry::in_memory());
        let device = registry
            .add(NewDevice {
                name: "desk".into(),
                ip: ip.into(),
                mac: mac.into(),
                port: None,
            })
            .await;
        (registry, device.id)
    }

    #[tokio::test]
    async fn no_selection_is_refused() {
        let registry = Arc::new(DeviceRegistry::in_memory());
        let dispatcher = CommandDispatcher::new(registry);
        let err = dispatcher.dispatch(PowerAction::Shutdown).await.unwrap_err();
        assert!(matches!(err, DispatchError::NoDeviceSelected));
    }

    #[tokio::test]
    async fn power_command_needs_an_address() {
        let (registry, _) = registry_with("", "001122334455").await;
        let dispatcher = CommandDispatcher::new(registry);
        let err = dispatcher.dispatch(PowerAction::Sleep).await.unwrap_err();
        assert!(matches!(err, DispatchError::MissingAddress));
    }

    #[tokio::test]
    async fn power_command_refused_while_offline() {
        let (registry, id) = registry_with("192.168.1.77", "001122334455").await;
        registry.set_status(id, DeviceStatus::Offline).await;
        let dispatcher = CommandDispatcher::new(registry);
        let err = dispatcher.dispatch(PowerAction::Restart).await.unwrap_err();
        assert!(matches!(err, DispatchError::DeviceOffline));
    }

    #[tokio::test]
    async fn wake_refused_while_online() {
        let (registry, id) = registry_with("192.168.1.77", "001122334455").await;
        registry.set_status(id, DeviceStatus::Online).await;
        let dispatcher = CommandDispatcher::new(registry);
        let err = dispatcher.dispatch(PowerAction::Wake).await.unwrap_err();
        assert!(matches!(err, DispatchError::AlreadyOnline));
    }

    #[tokio::test]
    async fn wake_with_bad_mac_fails_at_send_time() {
        // Storing the bad MAC succeeds; only the wake attempt rejects it.
        let (registry, id) = registry_with("192.168.1.77", "001122334455").await;
        registry
            .update(
                id,
                DeviceUpdate {
                    mac: Some("AA:BB:CC".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let dispatcher = CommandDispatcher::new(registry);
        let err = dispatcher.dispatch(PowerAction::Wake).await.unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Wol(WolError::InvalidAddress { .. })
        ));
    }
}
