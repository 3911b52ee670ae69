//! Streaming broadcast channel for one registered root.
//!
//! The daemon's `register` response names a per-root socket that streams
//! newline-delimited [`Message`] frames for as long as the root stays
//! registered. The client writes a process id handshake line, then reads
//! chunks through the [`FrameDecoder`] and dispatches every frame in arrival
//! order. A handler runs to completion, chained follow-ups included, before
//! the next frame is touched, so the task tracker never sees interleaved
//! mutation.

use crate::codec::FrameDecoder;
use crate::collaborators::{Logger, Notifier};
use crate::restart::RestartCoordinator;
use crate::task::TaskTracker;
use drydock_core::{Error, Message, ProjectInfo, Result, Runners, StateKey};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::task::JoinHandle;

/// Everything a root's message stream can touch.
pub struct Dispatcher {
    pub root: PathBuf,
    pub logger: Arc<dyn Logger>,
    pub notifier: Arc<dyn Notifier>,
    pub tracker: Arc<TaskTracker>,
    pub restart: Arc<RestartCoordinator>,
    pub project_info: Arc<RwLock<ProjectInfo>>,
    pub runners: Arc<RwLock<Runners>>,
    pub open_logger_on_error: bool,
}

impl Dispatcher {
    async fn handle(&self, message: Message) {
        match message {
            Message::Notify { content, level } => self.notifier.notify(&content, level),
            Message::Log { content, level } => {
                if !level.is_verbose() {
                    self.logger.append(&content, level);
                }
            }
            Message::OpenLogger => {
                if self.open_logger_on_error {
                    self.logger.show();
                } else {
                    tracing::debug!("logger open request suppressed by configuration");
                }
            }
            Message::SetCurrentTask {
                kind,
                target,
                status,
            } => self.tracker.begin(kind, target, status),
            Message::UpdateCurrentTask { content, level } => self.tracker.update(&content, level),
            Message::FinishCurrentTask { status } => self.tracker.finish(status),
            Message::ReloadLspServer => {
                if let Err(e) = self.restart.request_restart(Some(self.root.clone())).await {
                    tracing::warn!(
                        root = %self.root.display(),
                        error = %e,
                        "language server restart failed"
                    );
                }
            }
            Message::SetState { key, value } => match key {
                StateKey::ProjectInfo => match serde_json::from_value::<ProjectInfo>(value) {
                    Ok(info) => *self.project_info.write() = info,
                    Err(e) => tracing::error!(
                        root = %self.root.display(),
                        error = %e,
                        "malformed project info state push"
                    ),
                },
                StateKey::Runners => match serde_json::from_value::<Runners>(value) {
                    Ok(runners) => *self.runners.write() = runners,
                    Err(e) => tracing::error!(
                        root = %self.root.display(),
                        error = %e,
                        "malformed runners state push"
                    ),
                },
            },
        }
    }
}

/// Client for one root's broadcast socket.
///
/// Owns the read loop task; dropping the client tears the stream down even
/// when a handler is mid-flight.
pub struct BroadcastClient {
    address: PathBuf,
    reader: JoinHandle<()>,
}

impl BroadcastClient {
    /// Connect to `address`, send the process id handshake, and start
    /// dispatching frames.
    pub async fn connect(address: &Path, dispatcher: Dispatcher) -> Result<Self> {
        let mut stream = UnixStream::connect(address).await.map_err(|e| {
            Error::connection(
                address.display().to_string(),
                format!("broadcast connect failed: {e}"),
            )
        })?;

        stream
            .write_all(format!("{}\n", std::process::id()).as_bytes())
            .await
            .map_err(|e| {
                Error::connection(
                    address.display().to_string(),
                    format!("broadcast handshake failed: {e}"),
                )
            })?;

        tracing::info!(
            address = %address.display(),
            root = %dispatcher.root.display(),
            "broadcast channel connected"
        );

        let endpoint = address.to_path_buf();
        let reader = tokio::spawn(read_loop(stream, dispatcher, endpoint));
        Ok(Self {
            address: address.to_path_buf(),
            reader,
        })
    }

    /// Stop reading and drop the socket.
    pub fn dispose(&self) {
        tracing::debug!(address = %self.address.display(), "broadcast channel disposed");
        self.reader.abort();
    }
}

impl Drop for BroadcastClient {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

async fn read_loop(mut stream: UnixStream, dispatcher: Dispatcher, endpoint: PathBuf) {
    let mut decoder = FrameDecoder::new();
    let mut chunk = vec![0u8; 4096];
    loop {
        let read = match stream.read(&mut chunk).await {
            Ok(0) => {
                tracing::debug!(address = %endpoint.display(), "broadcast stream closed");
                return;
            }
            Ok(read) => read,
            Err(e) => {
                tracing::warn!(address = %endpoint.display(), error = %e, "broadcast read failed");
                return;
            }
        };

        let frames: Vec<Message> = match decoder.decode(&chunk[..read]) {
            Ok(frames) => frames,
            Err(e) => {
                // Framing is lost after a malformed frame, so the stream ends
                // here rather than dispatching garbage.
                tracing::error!(address = %endpoint.display(), error = %e, "broadcast protocol violation");
                return;
            }
        };

        for frame in frames {
            dispatcher.handle(frame).await;
        }
    }
}
