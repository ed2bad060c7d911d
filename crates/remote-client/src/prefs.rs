//! Persisted client preferences.
//!
//! Three independent keys: haptics, auto-connect, and the notification
//! settings block. Each key is loaded and written on its own, with no
//! transactional grouping across keys, and a failed read degrades to the
//! default value.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::fs;
use tracing::{error, warn};

use crate::error::StoreError;

/// Storage key for the haptics flag.
pub const HAPTICS_KEY: &str = "haptics";
/// Storage key for the auto-connect flag.
pub const AUTO_CONNECT_KEY: &str = "auto_connect";
/// Storage key for the notification settings block.
pub const NOTIFICATIONS_KEY: &str = "notifications";

/// Flags controlling the status poller's notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    /// Master switch; gates both alerts.
    pub enabled: bool,
    /// Alert on an offline→online transition.
    pub online_alert: bool,
    /// Alert on an online→offline transition.
    pub disconnect_alert: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            online_alert: true,
            disconnect_alert: true,
        }
    }
}

/// The full preference set, with defaults matching the mobile app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientPrefs {
    /// Haptic feedback on button presses (consumed by UI shells).
    pub haptics: bool,
    /// Probe the selected device as soon as the app opens.
    pub auto_connect: bool,
    /// Notification flags for the poller.
    pub notifications: NotificationSettings,
}

impl Default for ClientPrefs {
    fn default() -> Self {
        Self {
            haptics: true,
            auto_connect: false,
            notifications: NotificationSettings::default(),
        }
    }
}

/// Key-value persistence for preferences. Values are JSON.
#[async_trait]
pub trait PrefStore: Send + Sync {
    /// Load one key; `Ok(None)` when never written.
    async fn load_key(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Write one key.
    async fn save_key(&self, key: &str, value: Value) -> Result<(), StoreError>;
}

/// One small JSON file per key inside a directory.
pub struct JsonFilePrefStore {
    dir: PathBuf,
}

impl JsonFilePrefStore {
    /// Store under an explicit directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl PrefStore for JsonFilePrefStore {
    async fn load_key(&self, key: &str) -> Result<Option<Value>, StoreError> {
        match fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save_key(&self, key: &str, value: Value) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).await?;
        fs::write(self.path_for(key), serde_json::to_vec_pretty(&value)?).await?;
        Ok(())
    }
}

/// In-memory store for tests.
#[derive(Default)]
pub struct MemoryPrefStore {
    map: Mutex<HashMap<String, Value>>,
}

impl MemoryPrefStore {
    /// Fresh empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PrefStore for MemoryPrefStore {
    async fn load_key(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.map.lock().unwrap().get(key).cloned())
    }

    async fn save_key(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.map.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }
}

/// Loads and saves the preference keys, absorbing storage failures.
pub struct PreferenceManager {
    store: std::sync::Arc<dyn PrefStore>,
}

impl PreferenceManager {
    /// Manager over the given store.
    pub fn new(store: std::sync::Arc<dyn PrefStore>) -> Self {
        Self { store }
    }

    /// Load every key independently; failures fall back per-key.
    pub async fn load(&self) -> ClientPrefs {
        let defaults = ClientPrefs::default();
        ClientPrefs {
            haptics: self.load_or(HAPTICS_KEY, defaults.haptics).await,
            auto_connect: self.load_or(AUTO_CONNECT_KEY, defaults.auto_connect).await,
            notifications: self
                .load_or(NOTIFICATIONS_KEY, defaults.notifications)
                .await,
        }
    }

    /// Persist the haptics flag.
    pub async fn set_haptics(&self, enabled: bool) {
        self.save(HAPTICS_KEY, json!(enabled)).await;
    }

    /// Persist the auto-connect flag.
    pub async fn set_auto_connect(&self, enabled: bool) {
        self.save(AUTO_CONNECT_KEY, json!(enabled)).await;
    }

    /// Persist the notification settings block.
    pub async fn set_notifications(&self, settings: NotificationSettings) {
        self.save(NOTIFICATIONS_KEY, json!(settings)).await;
    }

    /// Reset every key to its default.
    pub async fn reset(&self) {
        let defaults = ClientPrefs::default();
        self.set_haptics(defaults.haptics).await;
        self.set_auto_connect(defaults.auto_connect).await;
        self.set_notifications(defaults.notifications).await;
    }

    async fn load_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.store.load_key(key).await {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!("stored preference '{key}' did not parse: {e}; using default");
                    default
                }
            },
            Ok(None) => default,
            Err(e) => {
                warn!("failed to load preference '{key}': {e}; using default");
                default
            }
        }
    }

    async fn save(&self, key: &str, value: Value) {
        if let Err(e) = self.store.save_key(key, value).await {
            error!("failed to save preference '{key}': {e}");
        }
    }
}
