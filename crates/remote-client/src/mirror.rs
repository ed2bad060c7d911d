//! Selection mirroring for external consumers.
//!
//! Whatever surface mirrors the "currently selected device" (the home
//! screen widget in the mobile app) receives a fresh snapshot whenever the
//! selection changes or the selected device is edited. Every publish is
//! best-effort: failures are logged by the registry and never reach the
//! caller.

use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Serialize;
use tokio::fs;

use remote_core::{Device, DeviceId};

use crate::error::StoreError;

/// Receives the selected-device snapshot. `None` means nothing selected.
#[async_trait]
pub trait SelectionMirror: Send + Sync {
    /// Publish the current selection.
    async fn publish(&self, selected: Option<&Device>) -> Result<(), StoreError>;
}

/// Mirror that ignores every publish. For tests and headless use.
pub struct NullMirror;

#[async_trait]
impl SelectionMirror for NullMirror {
    async fn publish(&self, _selected: Option<&Device>) -> Result<(), StoreError> {
        Ok(())
    }
}

/// The compact snapshot external consumers read: connection data only,
/// no advisory status.
#[derive(Serialize)]
struct SelectedSnapshot<'a> {
    id: DeviceId,
    name: &'a str,
    ip: &'a str,
    port: u16,
    mac: &'a str,
}

/// Writes the snapshot to a JSON file; clearing the selection removes it.
pub struct JsonFileMirror {
    path: PathBuf,
}

impl JsonFileMirror {
    /// Mirror to an explicit file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SelectionMirror for JsonFileMirror {
    async fn publish(&self, selected: Option<&Device>) -> Result<(), StoreError> {
        match selected {
            Some(device) => {
                let snapshot = SelectedSnapshot {
                    id: device.id,
                    name: &device.name,
                    ip: &device.ip,
                    port: device.agent_port(),
                    mac: &device.mac,
                };
                if let Some(parent) = self.path.parent() {
                    fs::create_dir_all(parent).await?;
                }
                fs::write(&self.path, serde_json::to_vec_pretty(&snapshot)?).await?;
            }
            None => match fs::remove_file(&self.path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            },
        }
        Ok(())
    }
}

/// Records every publish. For asserting propagation (and its absence).
#[derive(Default)]
pub struct RecordingMirror {
    published: Mutex<Vec<Option<Device>>>,
}

impl RecordingMirror {
    /// Fresh recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// All snapshots published so far, oldest first.
    pub fn published(&self) -> Vec<Option<Device>> {
        self.published.lock().unwrap().clone()
    }

    /// Number of publish calls observed.
    pub fn publish_count(&self) -> usize {
        self.published.lock().unwrap().len()
    }
}

#[async_trait]
impl SelectionMirror for RecordingMirror {
    async fn publish(&self, selected: Option<&Device>) -> Result<(), StoreError> {
        self.published.lock().unwrap().push(selected.cloned());
        Ok(())
    }
}
