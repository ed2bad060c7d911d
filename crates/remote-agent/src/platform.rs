//! Host platform detection and power-command resolution.
//!
//! The platform is resolved once at agent startup into a closed variant
//! set; every route handler then goes through an exhaustive match instead
//! of comparing OS name strings per request.

use remote_core::PowerCommand;

use crate::error::AgentError;

/// The agent's host operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Windows (`shutdown /s|/r`, suspend via powrprof.dll).
    Windows,
    /// Linux (`shutdown -h|-r now`, `systemctl suspend`).
    Linux,
    /// macOS (`sudo shutdown`, `pmset sleepnow`).
    MacOs,
    /// Anything else: command resolution fails, no process is spawned.
    Unsupported,
}

impl Platform {
    /// Detect the platform the agent is running on.
    pub fn detect() -> Self {
        Self::from_os_name(std::env::consts::OS)
    }

    /// Classify an OS name as reported by `std::env::consts::OS`.
    pub fn from_os_name(os: &str) -> Self {
        match os {
            "windows" => Platform::Windows,
            "linux" => Platform::Linux,
            "macos" => Platform::MacOs,
            _ => Platform::Unsupported,
        }
    }

    /// Short label for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::Linux => "linux",
            Platform::MacOs => "macos",
            Platform::Unsupported => "unsupported",
        }
    }

    /// Resolve the shell command line for a power command.
    ///
    /// Fails with [`AgentError::UnsupportedPlatform`] on unknown hosts;
    /// the caller turns that into a 500 without spawning anything.
    pub fn command_line(&self, command: PowerCommand) -> Result<&'static str, AgentError> {
        let line = match (self, command) {
            (Platform::Windows, PowerCommand::Shutdown) => "shutdown /s /t 0",
            (Platform::Windows, PowerCommand::Restart) => "shutdown /r /t 0",
            // Standard sleep-or-hibernate entry point; plain `shutdown /h`
            // would hibernate instead.
            (Platform::Windows, PowerCommand::Sleep) => {
                "rundll32.exe powrprof.dll,SetSuspendState 0,1,0"
            }
            (Platform::Linux, PowerCommand::Shutdown) => "shutdown -h now",
            (Platform::Linux, PowerCommand::Restart) => "shutdown -r now",
            (Platform::Linux, PowerCommand::Sleep) => "systemctl suspend",
            (Platform::MacOs, PowerCommand::Shutdown) => "sudo shutdown -h now",
            (Platform::MacOs, PowerCommand::Restart) => "sudo shutdown -r now",
            (Platform::MacOs, PowerCommand::Sleep) => "pmset sleepnow",
            (Platform::Unsupported, _) => return Err(AgentError::UnsupportedPlatform),
        };
        Ok(line)
    }

    /// Shell used to run the resolved command line.
    pub fn shell(&self) -> (&'static str, &'static str) {
        match self {
            Platform::Windows => ("cmd", "/C"),
            _ => ("sh", "-c"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_os_names_classify() {
        assert_eq!(Platform::from_os_name("windows"), Platform::Windows);
        assert_eq!(Platform::from_os_name("linux"), Platform::Linux);
        assert_eq!(Platform::from_os_name("macos"), Platform::MacOs);
    }

    #[test]
    fn unknown_os_is_unsupported() {
        for os in ["freebsd", "android", "ios", ""] {
            assert_eq!(Platform::from_os_name(os), Platform::Unsupported, "{os}");
        }
    }

    #[test]
    fn command_table_matches_each_platform() {
        assert_eq!(
            Platform::Linux.command_line(PowerCommand::Shutdown).unwrap(),
            "shutdown -h now"
        );
        assert_eq!(
            Platform::Linux.command_line(PowerCommand::Sleep).unwrap(),
            "systemctl suspend"
        );
        assert_eq!(
            Platform::Windows.command_line(PowerCommand::Restart).unwrap(),
            "shutdown /r /t 0"
        );
        assert_eq!(
            Platform::MacOs.command_line(PowerCommand::Sleep).unwrap(),
            "pmset sleepnow"
        );
    }

    #[test]
    fn unsupported_platform_resolves_to_error() {
        let err = Platform::Unsupported
            .command_line(PowerCommand::Shutdown)
            .unwrap_err();
        assert!(matches!(err, AgentError::UnsupportedPlatform));
        assert_eq!(err.to_string(), "Unsupported platform");
    }
}
