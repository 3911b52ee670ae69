//! Session configuration.

use drydock_core::constants::{CONTROL_SOCKET_PATH, DAEMON_PROGRAM};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings the editor glue resolves before the session starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Path of the daemon's control socket.
    pub control_socket: PathBuf,
    /// Program spawned when the control socket is not up yet.
    pub daemon_program: String,
    /// Whether `OpenLogger` pushes may surface the logger.
    pub open_logger_on_error: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            control_socket: PathBuf::from(CONTROL_SOCKET_PATH),
            daemon_program: DAEMON_PROGRAM.to_string(),
            open_logger_on_error: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_well_known_daemon() {
        let config = SessionConfig::default();
        assert_eq!(config.control_socket, PathBuf::from("/tmp/drydockd.socket"));
        assert_eq!(config.daemon_program, "drydockd");
        assert!(!config.open_logger_on_error);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"open_logger_on_error":true}"#).unwrap();
        assert!(config.open_logger_on_error);
        assert_eq!(config.daemon_program, "drydockd");
    }
}
