//! The `remote` CLI: manage registered PCs and send them power commands.
//!
//! A thin consumer of the client library: the same registry, poller, and
//! dispatcher a graphical shell would use. State lives in the platform
//! data directory unless `--data-dir` points elsewhere.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use figment::{
    providers::{Format, Serialized, Toml},
    Figment,
};
use tracing::{info, warn};

use remote_client::dispatch::CommandDispatcher;
use remote_client::mirror::JsonFileMirror;
use remote_client::notify::LogNotifier;
use remote_client::poller::{PollerConfig, StatusPoller};
use remote_client::prefs::{JsonFilePrefStore, NotificationSettings, PreferenceManager};
use remote_client::probe::HttpProber;
use remote_client::registry::{DeviceRegistry, DeviceUpdate, NewDevice};
use remote_client::store::JsonFileStore;
use remote_core::{Device, PowerAction};

#[derive(Parser, Debug)]
#[command(author, version, about = "Control PCs on your local network")]
struct Cli {
    /// Data directory for the device list and preferences
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Register a new PC (the first one added becomes selected)
    Add {
        /// Display name
        #[arg(long)]
        name: String,
        /// IPv4 address or hostname
        #[arg(long)]
        ip: String,
        /// MAC address, any separator style
        #[arg(long)]
        mac: String,
        /// Agent port (default 3000)
        #[arg(long)]
        port: Option<u16>,
    },
    /// List known PCs
    List,
    /// Edit a PC
    Edit {
        /// PC to edit, by name or id prefix
        name: String,
        /// New display name
        #[arg(long)]
        rename: Option<String>,
        /// New address
        #[arg(long)]
        ip: Option<String>,
        /// New MAC address
        #[arg(long)]
        mac: Option<String>,
        /// New agent port (0 restores the default)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Remove a PC
    Remove {
        /// PC to remove, by name or id prefix
        name: String,
    },
    /// Select the active PC
    Select {
        /// PC to select, by name or id prefix
        name: String,
    },
    /// Remove every PC and clear the selection
    Clear,
    /// Send a Wake-on-LAN packet to the selected PC
    Wake,
    /// Put the selected PC to sleep
    Sleep,
    /// Restart the selected PC
    Restart,
    /// Shut the selected PC down
    Shutdown,
    /// Probe every PC once and print the results
    Status,
    /// Poll continuously, logging status transitions, until interrupted
    Watch,
    /// Show or change stored preferences
    Prefs {
        #[command(subcommand)]
        action: Option<PrefsAction>,
    },
}

#[derive(Subcommand, Debug)]
enum PrefsAction {
    /// Print the stored preferences
    Show,
    /// Change one or more preference flags
    Set {
        /// Haptic feedback (consumed by UI shells)
        #[arg(long)]
        haptics: Option<bool>,
        /// Probe the selected PC on startup
        #[arg(long)]
        auto_connect: Option<bool>,
        /// Master notification switch
        #[arg(long)]
        notifications: Option<bool>,
        /// Alert when a PC comes online
        #[arg(long)]
        online_alert: Option<bool>,
        /// Alert when a PC goes offline
        #[arg(long)]
        disconnect_alert: Option<bool>,
    },
    /// Reset every preference to its default
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "warn".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    let data_dir = cli.data_dir.unwrap_or_else(JsonFileStore::default_dir);

    let store = Arc::new(JsonFileStore::new(&data_dir));
    let mirror = Arc::new(JsonFileMirror::new(data_dir.join("selected_pc.json")));
    let registry = Arc::new(DeviceRegistry::open(store, mirror).await);
    let prefs = PreferenceManager::new(Arc::new(JsonFilePrefStore::new(data_dir.join("prefs"))));

    match cli.command {
        Commands::Add {
            name,
            ip,
            mac,
            port,
        } => {
            let device = registry.add(NewDevice { name, ip, mac, port }).await;
            println!("added {} ({})", device.name, device.id);
        }
        Commands::List => print_devices(&registry).await,
        Commands::Edit {
            name,
            rename,
            ip,
            mac,
            port,
        } => {
            let device = resolve_device(&registry, &name).await?;
            let updated = registry
                .update(
                    device.id,
                    DeviceUpdate {
                        name: rename,
                        ip,
                        mac,
                        port,
                    },
                )
                .await?;
            println!("updated {}", updated.name);
        }
        Commands::Remove { name } => {
            let device = resolve_device(&registry, &name).await?;
            registry.remove(device.id).await?;
            println!("removed {}", device.name);
        }
        Commands::Select { name } => {
            let device = resolve_device(&registry, &name).await?;
            registry.select(Some(device.id)).await?;
            println!("selected {}", device.name);
        }
        Commands::Clear => {
            registry.clear().await;
            println!("registry cleared");
        }
        Commands::Wake => dispatch(&registry, PowerAction::Wake).await?,
        Commands::Sleep => dispatch(&registry, PowerAction::Sleep).await?,
        Commands::Restart => dispatch(&registry, PowerAction::Restart).await?,
        Commands::Shutdown => dispatch(&registry, PowerAction::Shutdown).await?,
        Commands::Status => {
            let settings = prefs.load().await.notifications;
            let config = load_poller_config(&data_dir);
            let prober = HttpProber::new(config.probe_timeout);
            StatusPoller::poll_now(&registry, &prober, &LogNotifier, &settings).await;
            print_devices(&registry).await;
        }
        Commands::Watch => {
            let settings = prefs.load().await.notifications;
            let config = load_poller_config(&data_dir);
            let prober = HttpProber::new(config.probe_timeout);
            let handle = StatusPoller::spawn(
                registry.clone(),
                Arc::new(prober),
                Arc::new(LogNotifier),
                settings,
                config,
            );
            info!("watching; press ctrl-c to stop");
            tokio::signal::ctrl_c().await?;
            handle.stop().await;
        }
        Commands::Prefs { action } => handle_prefs(&prefs, action).await,
    }

    Ok(())
}

async fn dispatch(registry: &Arc<DeviceRegistry>, action: PowerAction) -> Result<()> {
    let dispatcher = CommandDispatcher::new(registry.clone());
    let outcome = dispatcher.dispatch(action).await?;
    println!("{}", outcome.message);
    Ok(())
}

async fn print_devices(registry: &DeviceRegistry) {
    let devices = registry.list().await;
    if devices.is_empty() {
        println!("no PCs registered; use `remote add`");
        return;
    }
    let selected = registry.selected_id().await;
    for device in devices {
        let marker = if selected == Some(device.id) { "*" } else { " " };
        println!(
            "{marker} {:<20} {:<16} port {:<5} {}",
            device.name,
            device.ip,
            device.agent_port(),
            device.status
        );
    }
}

/// Poller timing from `<data-dir>/client.toml`, when present
/// (e.g. `interval = "30s"`). Falls back to the defaults on any error.
fn load_poller_config(data_dir: &std::path::Path) -> PollerConfig {
    let mut figment = Figment::from(Serialized::defaults(PollerConfig::default()));
    let path = data_dir.join("client.toml");
    if path.exists() {
        figment = figment.merge(Toml::file(&path));
    }
    figment.extract().unwrap_or_else(|e| {
        warn!("invalid client.toml: {e}; using default poll timing");
        PollerConfig::default()
    })
}

/// Find a device by exact name or id prefix.
async fn resolve_device(registry: &DeviceRegistry, needle: &str) -> Result<Device> {
    registry
        .list()
        .await
        .into_iter()
        .find(|d| d.name == needle || d.id.to_string().starts_with(needle))
        .ok_or_else(|| anyhow!("no PC named '{needle}'"))
}

async fn handle_prefs(prefs: &PreferenceManager, action: Option<PrefsAction>) {
    match action.unwrap_or(PrefsAction::Show) {
        PrefsAction::Show => {
            let current = prefs.load().await;
            println!("haptics          {}", current.haptics);
            println!("auto-connect     {}", current.auto_connect);
            println!("notifications    {}", current.notifications.enabled);
            println!("online-alert     {}", current.notifications.online_alert);
            println!("disconnect-alert {}", current.notifications.disconnect_alert);
        }
        PrefsAction::Set {
            haptics,
            auto_connect,
            notifications,
            online_alert,
            disconnect_alert,
        } => {
            if let Some(enabled) = haptics {
                prefs.set_haptics(enabled).await;
            }
            if let Some(enabled) = auto_connect {
                prefs.set_auto_connect(enabled).await;
            }
            if notifications.is_some() || online_alert.is_some() || disconnect_alert.is_some() {
                let current = prefs.load().await.notifications;
                prefs
                    .set_notifications(NotificationSettings {
                        enabled: notifications.unwrap_or(current.enabled),
                        online_alert: online_alert.unwrap_or(current.online_alert),
                        disconnect_alert: disconnect_alert.unwrap_or(current.disconnect_alert),
                    })
                    .await;
            }
            println!("preferences updated");
        }
        PrefsAction::Reset => {
            prefs.reset().await;
            println!("preferences reset to defaults");
        }
    }
}
