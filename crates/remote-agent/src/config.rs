//! Agent configuration.
//!
//! Layered figment-style: library defaults, then an optional `agent.toml`
//! next to the working directory, then the `PORT` and `TEST_MODE`
//! environment variables (the externally documented knobs).

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use remote_core::DEFAULT_AGENT_PORT;

use crate::error::Result;

/// Default config file probed at startup.
pub const CONFIG_FILE: &str = "agent.toml";

/// Runtime configuration for the power-command agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Listen port. `PORT` env var, default 3000.
    pub port: u16,
    /// Simulate mode: report commands instead of executing them.
    /// `TEST_MODE` env var, default off.
    pub test_mode: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_AGENT_PORT,
            test_mode: false,
        }
    }
}

impl AgentConfig {
    /// Load configuration from defaults, `agent.toml` (if present), and
    /// the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Load with an explicit config file path (tests).
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(AgentConfig::default()));

        if config_path.exists() {
            figment = figment.merge(Toml::file(config_path));
        }

        let config = figment
            .merge(Env::raw().only(&["PORT", "TEST_MODE"]))
            .extract()?;
        Ok(config)
    }
}
