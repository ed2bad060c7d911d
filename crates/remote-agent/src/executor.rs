//! Power-command execution.
//!
//! One OS process is spawned per request; concurrent requests spawn
//! concurrent processes with no queuing or serialization between them
//! (a shutdown supersedes anything else in flight anyway). In simulate
//! mode nothing is spawned at all.

use tokio::process::Command;
use tracing::{info, warn};

use remote_core::PowerCommand;

use crate::error::{AgentError, Result};
use crate::platform::Platform;

/// Executes resolved power commands on the host, or simulates them.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    platform: Platform,
    simulate: bool,
}

impl CommandExecutor {
    /// Create an executor for `platform`; `simulate` is the TEST_MODE flag.
    pub fn new(platform: Platform, simulate: bool) -> Self {
        Self { platform, simulate }
    }

    /// Whether commands are simulated instead of executed.
    pub fn is_simulating(&self) -> bool {
        self.simulate
    }

    /// Resolve and run `command`, returning its captured stdout.
    ///
    /// Resolution happens first: an unsupported host fails here even in
    /// simulate mode, without spawning. In simulate mode the resolved
    /// command line is reported back instead of executed.
    pub async fn run(&self, command: PowerCommand) -> Result<String> {
        let line = self.platform.command_line(command)?;

        if self.simulate {
            info!(command = line, "test mode: command simulated, not executed");
            return Ok(format!("[simulated] {line}"));
        }

        let (shell, flag) = self.platform.shell();
        let output = Command::new(shell)
            .arg(flag)
            .arg(line)
            .output()
            .await
            .map_err(|e| AgentError::CommandExecution(format!("failed to spawn '{line}': {e}")))?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            let detail = if stderr.trim().is_empty() {
                format!("exit status {}", output.status)
            } else {
                stderr.trim().to_string()
            };
            return Err(AgentError::CommandExecution(format!(
                "'{line}' failed: {detail}"
            )));
        }

        if !stderr.trim().is_empty() {
            warn!(command = line, stderr = %stderr.trim(), "command wrote to stderr");
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn simulate_mode_reports_the_resolved_command() {
        let executor = CommandExecutor::new(Platform::Linux, true);
        let out = executor.run(PowerCommand::Shutdown).await.unwrap();
        assert!(out.contains("simulated"));
        assert!(out.contains("shutdown -h now"));
    }

    #[tokio::test]
    async fn simulate_mode_is_deterministic_per_platform() {
        for platform in [Platform::Windows, Platform::Linux, Platform::MacOs] {
            let executor = CommandExecutor::new(platform, true);
            let out = executor.run(PowerCommand::Sleep).await.unwrap();
            assert!(out.starts_with("[simulated] "), "{platform:?}: {out}");
        }
    }

    #[tokio::test]
    async fn unsupported_platform_fails_before_simulation() {
        // Resolution precedes the simulate check, so even TEST_MODE
        // answers with the platform error.
        let executor = CommandExecutor::new(Platform::Unsupported, true);
        let err = executor.run(PowerCommand::Restart).await.unwrap_err();
        assert!(matches!(err, AgentError::UnsupportedPlatform));
    }
}
