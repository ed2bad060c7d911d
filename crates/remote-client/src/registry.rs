//! The device registry.
//!
//! Owns the set of known PCs and the single optional selection. The
//! registry is an explicit, injected service (no ambient global state):
//! the composition root creates one and hands it to the poller and the
//! dispatcher.
//!
//! Persistence rules: state is loaded once at startup (a read or parse
//! failure degrades to an empty registry) and written after every actual
//! mutation; write failures are logged and do not roll back the in-memory
//! state. Selection changes additionally propagate a snapshot to the
//! [`SelectionMirror`], best-effort.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

use remote_core::{Device, DeviceId, DeviceStatus};

use crate::error::RegistryError;
use crate::mirror::{NullMirror, SelectionMirror};
use crate::store::{DeviceStore, MemoryStore};

/// The persisted shape: device list plus selected id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryState {
    /// All known devices, in insertion order.
    pub devices: Vec<Device>,
    /// At most one selected device, by id.
    pub selected: Option<DeviceId>,
}

/// Fields supplied when adding a device. The id is assigned by the
/// registry; status starts as `Unknown`.
#[derive(Debug, Clone)]
pub struct NewDevice {
    /// Display label.
    pub name: String,
    /// IPv4 address or hostname.
    pub ip: String,
    /// Hardware address, any separator style.
    pub mac: String,
    /// Agent port override, if any.
    pub port: Option<u16>,
}

/// Partial update; `None` fields are left untouched. Status is not
/// updatable here; that is the poller's write path.
#[derive(Debug, Clone, Default)]
pub struct DeviceUpdate {
    /// New display label.
    pub name: Option<String>,
    /// New address.
    pub ip: Option<String>,
    /// New hardware address.
    pub mac: Option<String>,
    /// New agent port; `0` clears the override back to the default.
    pub port: Option<u16>,
}

/// A status change as observed by [`DeviceRegistry::set_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTransition {
    /// Status before the write.
    pub previous: DeviceStatus,
    /// Status after the write.
    pub current: DeviceStatus,
}

impl StatusTransition {
    /// An `offline → online` edge. `unknown → online` does not count.
    pub fn came_online(&self) -> bool {
        self.previous == DeviceStatus::Offline && self.current == DeviceStatus::Online
    }

    /// An `online → offline` edge. `unknown → offline` does not count.
    pub fn went_offline(&self) -> bool {
        self.previous == DeviceStatus::Online && self.current == DeviceStatus::Offline
    }
}

/// Registry service. Cheap to share behind an [`Arc`]; all methods take
/// `&self`.
pub struct DeviceRegistry {
    state: RwLock<RegistryState>,
    store: Arc<dyn DeviceStore>,
    mirror: Arc<dyn SelectionMirror>,
}

impl DeviceRegistry {
    /// Open the registry, loading persisted state from `store`.
    ///
    /// Never fails: a load error is logged and the registry starts empty.
    pub async fn open(store: Arc<dyn DeviceStore>, mirror: Arc<dyn SelectionMirror>) -> Self {
        let state = match store.load().await {
            Ok(Some(state)) => {
                debug!(devices = state.devices.len(), "device registry loaded");
                state
            }
            Ok(None) => RegistryState::default(),
            Err(e) => {
                warn!("failed to load device registry: {e}; starting empty");
                RegistryState::default()
            }
        };
        Self {
            state: RwLock::new(state),
            store,
            mirror,
        }
    }

    /// Empty in-memory registry with no mirror. For tests and one-shot
    /// CLI invocations that do not touch the stored list.
    pub fn in_memory() -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            store: Arc::new(MemoryStore::new()),
            mirror: Arc::new(NullMirror),
        }
    }

    /// Add a device. Assigns a fresh id; if nothing is selected yet, the
    /// new device becomes selected.
    pub async fn add(&self, new: NewDevice) -> Device {
        let mut state = self.state.write().await;
        let device = Device {
            id: DeviceId::new(),
            name: new.name,
            ip: new.ip,
            mac: new.mac,
            port: new.port.filter(|&p| p != 0),
            status: DeviceStatus::Unknown,
            last_seen: None,
        };
        state.devices.push(device.clone());

        let selection_changed = if state.selected.is_none() {
            state.selected = Some(device.id);
            true
        } else {
            false
        };

        self.persist(&state).await;
        if selection_changed {
            self.publish_selection(&state).await;
        }
        device
    }

    /// Apply a partial update.
    ///
    /// An update that leaves the device identical is a no-op: no
    /// persistence write, no mirror propagation. Updating the selected
    /// device propagates the fresh snapshot to the mirror.
    pub async fn update(&self, id: DeviceId, update: DeviceUpdate) -> Result<Device, RegistryError> {
        let mut state = self.state.write().await;
        let index = state
            .devices
            .iter()
            .position(|d| d.id == id)
            .ok_or(RegistryError::DeviceNotFound(id))?;

        let mut updated = state.devices[index].clone();
        if let Some(name) = update.name {
            updated.name = name;
        }
        if let Some(ip) = update.ip {
            updated.ip = ip;
        }
        if let Some(mac) = update.mac {
            updated.mac = mac;
        }
        if let Some(port) = update.port {
            updated.port = (port != 0).then_some(port);
        }

        if updated == state.devices[index] {
            return Ok(updated);
        }

        state.devices[index] = updated.clone();
        self.persist(&state).await;
        if state.selected == Some(id) {
            self.publish_selection(&state).await;
        }
        Ok(updated)
    }

    /// Remove a device. Removing the selected device reassigns the
    /// selection to the first remaining device, or clears it when the
    /// registry becomes empty.
    pub async fn remove(&self, id: DeviceId) -> Result<(), RegistryError> {
        let mut state = self.state.write().await;
        let before = state.devices.len();
        state.devices.retain(|d| d.id != id);
        if state.devices.len() == before {
            return Err(RegistryError::DeviceNotFound(id));
        }

        let mut selection_changed = false;
        if state.selected == Some(id) {
            state.selected = state.devices.first().map(|d| d.id);
            selection_changed = true;
        }

        self.persist(&state).await;
        if selection_changed {
            self.publish_selection(&state).await;
        }
        Ok(())
    }

    /// Bulk reset: remove every device and clear the selection.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.devices.clear();
        state.selected = None;
        self.persist(&state).await;
        self.publish_selection(&state).await;
    }

    /// Select a device (or `None` to clear). No-op when unchanged.
    pub async fn select(&self, id: Option<DeviceId>) -> Result<(), RegistryError> {
        let mut state = self.state.write().await;
        if let Some(id) = id {
            if !state.devices.iter().any(|d| d.id == id) {
                return Err(RegistryError::DeviceNotFound(id));
            }
        }
        if state.selected == id {
            return Ok(());
        }
        state.selected = id;
        self.persist(&state).await;
        self.publish_selection(&state).await;
        Ok(())
    }

    /// Snapshot of all devices.
    pub async fn list(&self) -> Vec<Device> {
        self.state.read().await.devices.clone()
    }

    /// Look up one device.
    pub async fn get(&self, id: DeviceId) -> Option<Device> {
        self.state
            .read()
            .await
            .devices
            .iter()
            .find(|d| d.id == id)
            .cloned()
    }

    /// The currently selected device, if any.
    pub async fn selected(&self) -> Option<Device> {
        let state = self.state.read().await;
        state
            .selected
            .and_then(|id| state.devices.iter().find(|d| d.id == id).cloned())
    }

    /// Id of the current selection.
    pub async fn selected_id(&self) -> Option<DeviceId> {
        self.state.read().await.selected
    }

    /// Poller write path: record a probed status.
    ///
    /// Writes (and persists) only when the status actually changed,
    /// returning the transition; a redundant reading returns `None` and
    /// touches nothing. Returns `None` as well when the device was
    /// removed while the probe was in flight.
    pub async fn set_status(
        &self,
        id: DeviceId,
        status: DeviceStatus,
    ) -> Option<StatusTransition> {
        let mut state = self.state.write().await;
        let index = state.devices.iter().position(|d| d.id == id)?;
        let previous = state.devices[index].status;
        if previous == status {
            return None;
        }

        state.devices[index].status = status;
        if status == DeviceStatus::Online {
            state.devices[index].last_seen = Some(Utc::now());
        }

        self.persist(&state).await;
        Some(StatusTransition {
            previous,
            current: status,
        })
    }

    async fn persist(&self, state: &RegistryState) {
        if let Err(e) = self.store.save(state).await {
            // In-memory state is kept; the next successful write catches up.
            error!("failed to persist device registry: {e}");
        }
    }

    async fn publish_selection(&self, state: &RegistryState) {
        let selected = state
            .selected
            .and_then(|id| state.devices.iter().find(|d| d.id == id));
        if let Err(e) = self.mirror.publish(selected).await {
            warn!("failed to propagate selected device snapshot: {e}");
        }
    }
}
