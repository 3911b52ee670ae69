//! Request/response control channel to the drydock daemon.

use crate::config::SessionConfig;
use drydock_core::constants::SPAWN_RETRY_DELAY;
use drydock_core::{Error, ProjectInfo, Request, Response, Result, Runners};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;
use tokio::process::Command;
use tokio::time::sleep;

/// Client for the daemon's control socket.
///
/// One instance per editor process, shared by every registered root. The wire
/// format carries no request correlation id, so at most one request may be in
/// flight per connection; `request` takes `&mut self` so callers serialize
/// through whatever lock wraps the client.
#[derive(Debug)]
pub struct ControlClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    endpoint: PathBuf,
    closed: bool,
}

impl ControlClient {
    /// Connect to the control socket, spawning the daemon and retrying once
    /// if the socket is not up yet. A second failure is fatal.
    pub async fn connect(config: &SessionConfig) -> Result<Self> {
        let endpoint = config.control_socket.clone();
        let stream = match UnixStream::connect(&endpoint).await {
            Ok(stream) => stream,
            Err(first) => {
                tracing::debug!(
                    error = %first,
                    program = %config.daemon_program,
                    "control socket not up, spawning daemon"
                );
                spawn_daemon(&config.daemon_program)?;
                sleep(SPAWN_RETRY_DELAY).await;
                UnixStream::connect(&endpoint).await.map_err(|e| {
                    Error::connection(
                        endpoint.display().to_string(),
                        format!(
                            "failed to connect after spawning {}: {e}",
                            config.daemon_program
                        ),
                    )
                })?
            }
        };

        tracing::info!(endpoint = %endpoint.display(), "control channel connected");
        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(read_half),
            writer: write_half,
            endpoint,
            closed: false,
        })
    }

    /// Issue one request and await its single response frame.
    ///
    /// The success value is the response's `data` field, which the daemon may
    /// legitimately leave null. A present `error` field fails the call with a
    /// composed daemon error.
    pub async fn request(&mut self, method: &str, args: Value) -> Result<Option<Value>> {
        if self.closed {
            return Err(Error::connection(
                self.endpoint.display().to_string(),
                "control channel already disposed",
            ));
        }

        let frame = serde_json::to_string(&Request {
            method: method.to_string(),
            args,
        })?;

        self.writer
            .write_all(frame.as_bytes())
            .await
            .map_err(|e| self.connection_error(format!("failed to send request: {e}")))?;
        self.writer
            .write_all(b"\n")
            .await
            .map_err(|e| self.connection_error(format!("failed to send request: {e}")))?;
        self.writer
            .flush()
            .await
            .map_err(|e| self.connection_error(format!("failed to flush request: {e}")))?;

        let mut line = String::new();
        let read = self
            .reader
            .read_line(&mut line)
            .await
            .map_err(|e| self.connection_error(format!("failed to read response: {e}")))?;
        if read == 0 {
            return Err(self.connection_error("daemon closed the connection"));
        }

        let response: Response = serde_json::from_str(&line).map_err(|e| {
            Error::protocol(
                format!("malformed response to '{method}': {e}"),
                line.trim().to_string(),
            )
        })?;

        match response.error {
            Some(error) => Err(Error::daemon(error.kind, error.msg)),
            None => Ok(response.data),
        }
    }

    /// Register `root` with the daemon, returning the address of the
    /// broadcast socket to stream its events from.
    pub async fn register(&mut self, root: &Path) -> Result<String> {
        let value = self
            .request("register", json!({ "root": root, "id": std::process::id() }))
            .await?;
        match value {
            Some(Value::String(address)) => Ok(address),
            other => Err(Error::protocol(
                "expected register response to be a broadcast address string",
                format!("{other:?}"),
            )),
        }
    }

    /// Best-effort deregistration of `roots`; a failure is surfaced but must
    /// not block the caller's local cleanup.
    pub async fn drop_roots(&mut self, roots: &[PathBuf]) -> Result<()> {
        self.request("drop", json!({ "roots": roots, "id": std::process::id() }))
            .await?;
        Ok(())
    }

    /// Fetch the daemon's current view of `root`.
    pub async fn get_project_info(&mut self, root: &Path) -> Result<ProjectInfo> {
        let value = self
            .request("get_project_info", json!({ "root": root }))
            .await?
            .ok_or_else(|| Error::protocol("expected project info, got nothing", "null"))?;
        serde_json::from_value(value.clone())
            .map_err(|e| Error::protocol(format!("malformed project info: {e}"), value.to_string()))
    }

    /// Fetch the platform-to-devices mapping.
    pub async fn get_runners(&mut self) -> Result<Runners> {
        let value = self
            .request("get_runners", json!({}))
            .await?
            .ok_or_else(|| Error::protocol("expected runners, got nothing", "null"))?;
        serde_json::from_value(value.clone())
            .map_err(|e| Error::protocol(format!("malformed runners: {e}"), value.to_string()))
    }

    /// Stop writes, flush, and close the socket. Safe to call more than once.
    pub async fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.writer.flush().await {
            tracing::warn!(error = %e, "flush on control shutdown failed");
        }
        if let Err(e) = self.writer.shutdown().await {
            tracing::warn!(error = %e, "control socket shutdown failed");
        }
    }

    fn connection_error(&self, message: impl Into<String>) -> Error {
        Error::connection(self.endpoint.display().to_string(), message)
    }
}

fn spawn_daemon(program: &str) -> Result<()> {
    // The daemon detaches itself; the child handle is not tracked.
    Command::new(program)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| Error::spawn(program, e.to_string()))?;
    Ok(())
}
