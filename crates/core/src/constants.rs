/// Constants used throughout the drydock workspace
use std::time::Duration;

// Daemon endpoints
pub const CONTROL_SOCKET_PATH: &str = "/tmp/drydockd.socket";
pub const DAEMON_PROGRAM: &str = "drydockd";

// Delay before retrying the control socket after spawning the daemon
pub const SPAWN_RETRY_DELAY: Duration = Duration::from_millis(500);

// Delay before the status surface returns to idle after a successful task
pub const TASK_RESET_DELAY: Duration = Duration::from_secs(3);

// Configurations offered when a target does not declare its own
pub const DEFAULT_CONFIGURATIONS: &[&str] = &["Debug", "Release"];
