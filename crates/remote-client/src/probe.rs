//! Health probing.
//!
//! A probe is a bounded `GET /health` against a device's agent. The
//! classification is deliberately coarse: any 2xx inside the timeout means
//! `online`, everything else (timeout, refused connection, other status
//! codes) means `offline`.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use remote_core::{Device, DeviceStatus};

/// Probes one device and classifies its reachability.
#[async_trait]
pub trait HealthProber: Send + Sync {
    /// Classify `device` as online or offline.
    async fn probe(&self, device: &Device) -> DeviceStatus;
}

/// Probe timeout used when none is configured.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Real prober: HTTP GET with a per-request timeout.
pub struct HttpProber {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpProber {
    /// Prober with an explicit timeout.
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }
}

impl Default for HttpProber {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_TIMEOUT)
    }
}

#[async_trait]
impl HealthProber for HttpProber {
    async fn probe(&self, device: &Device) -> DeviceStatus {
        let url = format!("{}/health", device.base_url());
        match self.client.get(&url).timeout(self.timeout).send().await {
            Ok(response) if response.status().is_success() => DeviceStatus::Online,
            Ok(response) => {
                debug!(device = %device.name, status = %response.status(), "health probe returned non-success");
                DeviceStatus::Offline
            }
            Err(e) => {
                debug!(device = %device.name, "health probe failed: {e}");
                DeviceStatus::Offline
            }
        }
    }
}
