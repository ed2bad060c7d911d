//! Client library for PC Remote Control.
//!
//! This crate is the phone-side half of the system, minus the UI: a
//! persistent device registry with a single selection, a periodic status
//! poller with notification edges, a command dispatcher, and the
//! preference store. It is UI-agnostic and consumed by the `remote` CLI
//! as well as any future graphical shell.
//!
//! The composition root wires the pieces together explicitly:
//!
//! ```no_run
//! use std::sync::Arc;
//! use remote_client::{
//!     dispatch::CommandDispatcher,
//!     mirror::NullMirror,
//!     notify::LogNotifier,
//!     poller::{PollerConfig, StatusPoller},
//!     prefs::NotificationSettings,
//!     probe::HttpProber,
//!     registry::DeviceRegistry,
//!     store::JsonFileStore,
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let store = Arc::new(JsonFileStore::new(JsonFileStore::default_dir()));
//! let registry = Arc::new(DeviceRegistry::open(store, Arc::new(NullMirror)).await);
//!
//! let dispatcher = CommandDispatcher::new(registry.clone());
//! let poller = StatusPoller::spawn(
//!     registry,
//!     Arc::new(HttpProber::default()),
//!     Arc::new(LogNotifier),
//!     NotificationSettings::default(),
//!     PollerConfig::default(),
//! );
//! # drop((dispatcher, poller));
//! # }
//! ```

pub mod dispatch;
pub mod error;
pub mod mirror;
pub mod notify;
pub mod poller;
pub mod prefs;
pub mod probe;
pub mod registry;
pub mod store;

pub use dispatch::{CommandDispatcher, DispatchOutcome};
pub use error::{DispatchError, RegistryError, StoreError};
pub use mirror::{JsonFileMirror, NullMirror, SelectionMirror};
pub use notify::{LogNotifier, Notifier};
pub use poller::{PollerConfig, PollerHandle, StatusPoller};
pub use prefs::{ClientPrefs, NotificationSettings, PreferenceManager};
pub use probe::{HealthProber, HttpProber};
pub use registry::{DeviceRegistry, DeviceUpdate, NewDevice, RegistryState, StatusTransition};
pub use store::{DeviceStore, JsonFileStore};
