//! Registry persistence.
//!
//! The registry is written after every mutation and read once at startup.
//! Devices and the selected-device id live under distinct keys (separate
//! files) and are written independently, with no transactional grouping.
//! The trait is the seam where an encrypted backend would plug in; the
//! shipped backend is plain JSON.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::fs;

use remote_core::{Device, DeviceId};

use crate::error::StoreError;
use crate::registry::RegistryState;

/// Durable storage for the device registry.
#[async_trait]
pub trait DeviceStore: Send + Sync {
    /// Load the persisted state. `Ok(None)` means nothing stored yet.
    async fn load(&self) -> Result<Option<RegistryState>, StoreError>;

    /// Persist the full state. Called after every mutation.
    async fn save(&self, state: &RegistryState) -> Result<(), StoreError>;
}

/// JSON-file-backed store: `devices.json` and `selected.json` in a
/// directory, written independently.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Store under an explicit directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Platform data directory for the application
    /// (e.g. `~/.local/share/pc-remote` on Linux).
    pub fn default_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pc-remote")
    }

    fn devices_path(&self) -> PathBuf {
        self.dir.join("devices.json")
    }

    fn selected_path(&self) -> PathBuf {
        self.dir.join("selected.json")
    }
}

#[async_trait]
impl DeviceStore for JsonFileStore {
    async fn load(&self) -> Result<Option<RegistryState>, StoreError> {
        let devices_path = self.devices_path();
        let selected_path = self.selected_path();
        if !devices_path.exists() && !selected_path.exists() {
            return Ok(None);
        }

        let devices: Vec<Device> = match fs::read(&devices_path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        let selected: Option<DeviceId> = match fs::read(&selected_path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        Ok(Some(RegistryState { devices, selected }))
    }

    async fn save(&self, state: &RegistryState) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).await?;
        let devices = serde_json::to_vec_pretty(&state.devices)?;
        let selected = serde_json::to_vec(&state.selected)?;

        // Both writes are attempted even if the first fails; each key is
        // independent of the other.
        let devices_result = fs::write(self.devices_path(), devices).await;
        let selected_result = fs::write(self.selected_path(), selected).await;
        devices_result?;
        selected_result?;
        Ok(())
    }
}

/// In-memory store for tests and throwaway sessions. Counts writes so
/// idempotence can be asserted.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<Option<RegistryState>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    /// Fresh empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `save` calls observed so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeviceStore for MemoryStore {
    async fn load(&self) -> Result<Option<RegistryState>, StoreError> {
        Ok(self.state.lock().unwrap().clone())
    }

    async fn save(&self, state: &RegistryState) -> Result<(), StoreError> {
        *self.state.lock().unwrap() = Some(state.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
