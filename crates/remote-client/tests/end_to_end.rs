//! End-to-end tests: client library against a live in-process agent.
//!
//! The agent runs in test mode on an ephemeral port, so power routes
//! answer the real HTTP contract without spawning any OS process.

use std::sync::Arc;
use std::time::Duration;

use remote_agent::{serve, AgentConfig};
use remote_client::notify::RecordingNotifier;
use remote_client::poller::StatusPoller;
use remote_client::prefs::NotificationSettings;
use remote_client::probe::HttpProber;
use remote_client::registry::{DeviceRegistry, NewDevice};
use remote_client::{CommandDispatcher, DispatchError};
use remote_core::{DeviceStatus, PowerAction};

async fn live_agent() -> (remote_agent::AgentHandle, u16) {
    let handle = serve(AgentConfig {
        port: 0,
        test_mode: true,
    })
    .await
    .expect("agent failed to start");
    let port = handle.local_addr().port();
    (handle, port)
}

async fn registry_with_device(port: u16) -> (Arc<DeviceRegistry>, remote_core::DeviceId) {
    let registry = Arc::new(DeviceRegistry::in_memory());
    let device = registry
        .add(NewDevice {
            name: "desk".into(),
            ip: "127.0.0.1".into(),
            mac: "00:11:22:33:44:55".into(),
            port: Some(port),
        })
        .await;
    (registry, device.id)
}

/// A port that nothing listens on: bind a listener, read its port, drop it.
async fn dead_port() -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

#[tokio::test]
async fn one_poll_cycle_brings_an_offline_device_online() {
    let (agent, port) = live_agent().await;
    let (registry, id) = registry_with_device(port).await;
    // Seed the stored status as offline so the comeback edge fires.
    registry.set_status(id, DeviceStatus::Offline).await;

    let prober = HttpProber::new(Duration::from_secs(2));
    let notifier = RecordingNotifier::new();
    StatusPoller::poll_now(
        &registry,
        &prober,
        &notifier,
        &NotificationSettings::default(),
    )
    .await;

    assert_eq!(registry.get(id).await.unwrap().status, DeviceStatus::Online);
    let events = notifier.events();
    assert_eq!(events.len(), 1, "exactly one notification queued");
    assert_eq!(events[0].0, "PC Online");

    agent.shutdown().await;
}

#[tokio::test]
async fn unreachable_agent_classifies_as_offline() {
    let port = dead_port().await;
    let (registry, id) = registry_with_device(port).await;
    registry.set_status(id, DeviceStatus::Online).await;

    let prober = HttpProber::new(Duration::from_millis(500));
    let notifier = RecordingNotifier::new();
    StatusPoller::poll_now(
        &registry,
        &prober,
        &notifier,
        &NotificationSettings::default(),
    )
    .await;

    assert_eq!(
        registry.get(id).await.unwrap().status,
        DeviceStatus::Offline
    );
    let events = notifier.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].0, "PC Disconnected");
}

#[tokio::test]
async fn one_slow_device_does_not_block_the_others() {
    let (agent, port) = live_agent().await;
    let registry = Arc::new(DeviceRegistry::in_memory());
    let dead = dead_port().await;

    let slow = registry
        .add(NewDevice {
            name: "slow".into(),
            ip: "127.0.0.1".into(),
            mac: "001122334455".into(),
            port: Some(dead),
        })
        .await;
    let fast = registry
        .add(NewDevice {
            name: "fast".into(),
            ip: "127.0.0.1".into(),
            mac: "665544332211".into(),
            port: Some(port),
        })
        .await;

    let prober = HttpProber::new(Duration::from_millis(500));
    let notifier = RecordingNotifier::new();
    StatusPoller::poll_now(
        &registry,
        &prober,
        &notifier,
        &NotificationSettings::default(),
    )
    .await;

    assert_eq!(
        registry.get(slow.id).await.unwrap().status,
        DeviceStatus::Offline
    );
    assert_eq!(
        registry.get(fast.id).await.unwrap().status,
        DeviceStatus::Online
    );

    agent.shutdown().await;
}

#[tokio::test]
async fn dispatch_shutdown_returns_the_agent_ack() {
    let (agent, port) = live_agent().await;
    let (registry, _) = registry_with_device(port).await;

    let dispatcher = CommandDispatcher::new(registry);
    let outcome = dispatcher.dispatch(PowerAction::Shutdown).await.unwrap();
    assert_eq!(outcome.message, "Shutting down...");

    agent.shutdown().await;
}

#[tokio::test]
async fn dispatch_against_a_dead_agent_is_a_network_error() {
    let port = dead_port().await;
    let (registry, _) = registry_with_device(port).await;

    let dispatcher =
        CommandDispatcher::with_timeout(registry, Duration::from_millis(500));
    let err = dispatcher.dispatch(PowerAction::Sleep).await.unwrap_err();
    assert!(matches!(err, DispatchError::Network(_)));
}

#[tokio::test]
async fn spawned_poller_tracks_a_live_agent() {
    let (agent, port) = live_agent().await;
    let (registry, id) = registry_with_device(port).await;

    let handle = StatusPoller::spawn(
        registry.clone(),
        Arc::new(HttpProber::new(Duration::from_secs(2))),
        Arc::new(RecordingNotifier::new()),
        NotificationSettings::default(),
        remote_client::PollerConfig {
            interval: Duration::from_millis(50),
            probe_timeout: Duration::from_secs(2),
        },
    );

    // The immediate first cycle flips the device online.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(registry.get(id).await.unwrap().status, DeviceStatus::Online);

    handle.stop().await;
    agent.shutdown().await;
}
