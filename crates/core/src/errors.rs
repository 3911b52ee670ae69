/// Result type alias for drydock operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for drydock operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Socket connection errors (refused, reset, closed)
    #[error("connection to '{endpoint}' failed: {message}")]
    Connection { endpoint: String, message: String },

    /// Errors reported by the daemon over the control channel
    #[error("daemon error ({kind}): {msg}")]
    Daemon { kind: String, msg: String },

    /// Protocol contract violations (malformed frames, unexpected shapes)
    #[error("protocol violation: {message} (payload: {payload})")]
    Protocol { message: String, payload: String },

    /// Failure to spawn the daemon process
    #[error("failed to spawn '{program}': {message}")]
    Spawn { program: String, message: String },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// Configuration errors
    #[error("configuration error: {message}")]
    Configuration { message: String },
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::Json {
            message: error.to_string(),
            source: error,
        }
    }
}

// Helper methods for creating errors with context
impl Error {
    /// Create a connection error
    #[must_use]
    pub fn connection(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Connection {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create a daemon-reported error
    #[must_use]
    pub fn daemon(kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Error::Daemon {
            kind: kind.into(),
            msg: msg.into(),
        }
    }

    /// Create a protocol violation error carrying the offending payload
    #[must_use]
    pub fn protocol(message: impl Into<String>, payload: impl Into<String>) -> Self {
        Error::Protocol {
            message: message.into(),
            payload: payload.into(),
        }
    }

    /// Create a daemon spawn error
    #[must_use]
    pub fn spawn(program: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Spawn {
            program: program.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }
}

// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to a Result
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a lazy message
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let base_error = e.into();
            Error::Configuration {
                message: format!("{}: {}", message.into(), base_error),
            }
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let base_error = e.into();
            Error::Configuration {
                message: format!("{}: {}", f(), base_error),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daemon_error_display_carries_kind_and_message() {
        let error = Error::daemon("NotFound", "no project");
        let rendered = error.to_string();
        assert!(rendered.contains("NotFound"));
        assert!(rendered.contains("no project"));
    }

    #[test]
    fn protocol_error_display_carries_payload() {
        let error = Error::protocol("invalid frame", "{bad json");
        assert!(error.to_string().contains("{bad json"));
    }
}
