//! The status poller.
//!
//! On a fixed interval (and once immediately on activation) every device
//! with a non-empty address is probed concurrently; results are written
//! back only when the classified status differs from what is stored, and
//! offline↔online edges optionally raise notifications. Stopping the
//! poller lets in-flight probes finish but discards their results instead
//! of writing state after the fact.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tokio::task::JoinHandle;
use tracing::debug;

use remote_core::{DeviceId, DeviceStatus};

use crate::notify::Notifier;
use crate::prefs::NotificationSettings;
use crate::probe::HealthProber;
use crate::registry::{DeviceRegistry, StatusTransition};

/// Poller timing knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    /// Time between poll cycles.
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    /// Per-probe timeout.
    #[serde(with = "humantime_serde")]
    pub probe_timeout: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            probe_timeout: Duration::from_secs(2),
        }
    }
}

/// Handle to a running poller. Stopping (or dropping) it cancels the
/// timer; an in-flight cycle is abandoned without updating state.
pub struct PollerHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Stop the poller and wait for its task to wind down.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = (&mut self.task).await;
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Periodic reachability poller over the device registry.
pub struct StatusPoller;

impl StatusPoller {
    /// Start polling in a background task. The first cycle runs
    /// immediately.
    pub fn spawn(
        registry: Arc<DeviceRegistry>,
        prober: Arc<dyn HealthProber>,
        notifier: Arc<dyn Notifier>,
        settings: NotificationSettings,
        config: PollerConfig,
    ) -> PollerHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(config.interval);
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => {
                        debug!("status poller stopped");
                        return;
                    }
                    _ = ticker.tick() => {}
                }

                let results = probe_all(&registry, prober.as_ref()).await;

                // A shutdown may have raced the probes; results from a
                // cancelled cycle must not touch the registry.
                if !matches!(shutdown_rx.try_recv(), Err(TryRecvError::Empty)) {
                    debug!("status poller stopped; discarding in-flight probe results");
                    return;
                }

                apply_results(&registry, notifier.as_ref(), &settings, results).await;
            }
        });

        PollerHandle {
            shutdown: Some(shutdown_tx),
            task,
        }
    }

    /// Run exactly one poll cycle, synchronously from the caller's point
    /// of view. Used by the CLI `status` command and by tests.
    pub async fn poll_now(
        registry: &DeviceRegistry,
        prober: &dyn HealthProber,
        notifier: &dyn Notifier,
        settings: &NotificationSettings,
    ) {
        let results = probe_all(registry, prober).await;
        apply_results(registry, notifier, settings, results).await;
    }
}

/// Probe every device with an address, concurrently. One slow or failing
/// device does not block the others.
async fn probe_all(
    registry: &DeviceRegistry,
    prober: &dyn HealthProber,
) -> Vec<(DeviceId, String, DeviceStatus)> {
    let devices = registry.list().await;
    let probes = devices
        .iter()
        .filter(|device| !device.ip.is_empty())
        .map(|device| async move {
            let status = prober.probe(device).await;
            (device.id, device.name.clone(), status)
        });
    futures::future::join_all(probes).await
}

async fn apply_results(
    registry: &DeviceRegistry,
    notifier: &dyn Notifier,
    settings: &NotificationSettings,
    results: Vec<(DeviceId, String, DeviceStatus)>,
) {
    for (id, name, status) in results {
        if let Some(transition) = registry.set_status(id, status).await {
            debug!(
                device = %name,
                from = ?transition.previous,
                to = ?transition.current,
                "device status changed"
            );
            notify_transition(notifier, settings, &name, transition);
        }
    }
}

fn notify_transition(
    notifier: &dyn Notifier,
    settings: &NotificationSettings,
    name: &str,
    transition: StatusTransition,
) {
    if !settings.enabled {
        return;
    }
    if transition.came_online() && settings.online_alert {
        notifier.notify("PC Online", &format!("{name} is now online"));
    } else if transition.went_offline() && settings.disconnect_alert {
        notifier.notify("PC Disconnected", &format!("{name} went offline"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::notify::RecordingNotifier;
    use crate::registry::NewDevice;

    /// Prober that replays a fixed status sequence.
    struct ScriptedProber {
        script: Mutex<Vec<DeviceStatus>>,
    }

    impl ScriptedProber {
        fn new(sequence: &[DeviceStatus]) -> Self {
            let mut script: Vec<_> = sequence.to_vec();
            script.reverse(); // pop() from the back
            Self {
                script: Mutex::new(script),
            }
        }
    }

    #[async_trait]
    impl HealthProber for ScriptedProber {
        async fn probe(&self, _device: &remote_core::Device) -> DeviceStatus {
            self.script
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(DeviceStatus::Offline)
        }
    }

    async fn seeded_registry() -> (Arc<DeviceRegistry>, DeviceId) {
        let registry = Arc::new(DeviceRegistry::in_memory());
        let device = registry
            .add(NewDevice {
                name: "desk".into(),
                ip: "192.168.1.50".into(),
                mac: "001122334455".into(),
                port: None,
            })
            .await;
        (registry, device.id)
    }

    #[tokio::test]
    async fn notifications_fire_only_on_offline_online_edges() {
        let (registry, _) = seeded_registry().await;
        let prober = ScriptedProber::new(&[
            DeviceStatus::Online,
            DeviceStatus::Online,
            DeviceStatus::Offline,
            DeviceStatus::Online,
        ]);
        let notifier = RecordingNotifier::new();
        let settings = NotificationSettings::default();

        for _ in 0..4 {
            StatusPoller::poll_now(&registry, &prober, &notifier, &settings).await;
        }

        let events = notifier.events();
        // unknown→online is silent; then online→online is a no-op; the
        // offline edge and the comeback each fire exactly once.
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].0, "PC Disconnected");
        assert_eq!(events[1].0, "PC Online");
    }

    #[tokio::test]
    async fn unknown_to_offline_is_silent() {
        let (registry, id) = seeded_registry().await;
        let prober = ScriptedProber::new(&[DeviceStatus::Offline]);
        let notifier = RecordingNotifier::new();
        let settings = NotificationSettings::default();

        StatusPoller::poll_now(&registry, &prober, &notifier, &settings).await;

        assert!(notifier.events().is_empty());
        assert_eq!(
            registry.get(id).await.unwrap().status,
            DeviceStatus::Offline
        );
    }

    #[tokio::test]
    async fn disabled_flags_suppress_notifications() {
        let (registry, id) = seeded_registry().await;
        registry.set_status(id, DeviceStatus::Offline).await;
        let prober = ScriptedProber::new(&[DeviceStatus::Online]);
        let notifier = RecordingNotifier::new();
        let settings = NotificationSettings {
            enabled: true,
            online_alert: false,
            disconnect_alert: true,
        };

        StatusPoller::poll_now(&registry, &prober, &notifier, &settings).await;

        assert!(notifier.events().is_empty());
        // The status write still happened; only the alert was suppressed.
        assert_eq!(registry.get(id).await.unwrap().status, DeviceStatus::Online);
    }

    #[tokio::test]
    async fn master_switch_gates_everything() {
        let (registry, id) = seeded_registry().await;
        registry.set_status(id, DeviceStatus::Offline).await;
        let prober = ScriptedProber::new(&[DeviceStatus::Online]);
        let notifier = RecordingNotifier::new();
        let settings = NotificationSettings {
            enabled: false,
            ..Default::default()
        };

        StatusPoller::poll_now(&registry, &prober, &notifier, &settings).await;
        assert!(notifier.events().is_empty());
    }

    #[tokio::test]
    async fn devices_without_an_address_are_skipped() {
        let registry = Arc::new(DeviceRegistry::in_memory());
        let device = registry
            .add(NewDevice {
                name: "no-ip".into(),
                ip: String::new(),
                mac: "001122334455".into(),
                port: None,
            })
            .await;
        let prober = ScriptedProber::new(&[DeviceStatus::Online]);
        let notifier = RecordingNotifier::new();

        StatusPoller::poll_now(&registry, &prober, &notifier, &Default::default()).await;

        // Never probed, never written.
        assert_eq!(
            registry.get(device.id).await.unwrap().status,
            DeviceStatus::Unknown
        );
    }

    #[tokio::test]
    async fn spawned_poller_runs_immediately_and_stops_cleanly() {
        let (registry, id) = seeded_registry().await;
        let prober = Arc::new(ScriptedProber::new(&[DeviceStatus::Online; 8]));
        let notifier = Arc::new(RecordingNotifier::new());

        let handle = StatusPoller::spawn(
            registry.clone(),
            prober,
            notifier,
            NotificationSettings::default(),
            PollerConfig {
                interval: Duration::from_millis(20),
                probe_timeout: Duration::from_millis(100),
            },
        );

        // The first cycle runs without waiting a full interval.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(registry.get(id).await.unwrap().status, DeviceStatus::Online);

        handle.stop().await;

        // No further writes after stop.
        registry.set_status(id, DeviceStatus::Offline).await;
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(
            registry.get(id).await.unwrap().status,
            DeviceStatus::Offline
        );
    }
}
