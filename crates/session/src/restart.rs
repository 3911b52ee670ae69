//! Restart coalescing for the auxiliary language server.
//!
//! Focus changes and daemon `ReloadLspServer` pushes both want the language
//! server restarted, and they arrive in bursts (every broadcast stream of a
//! multi-root workspace relays the same reload). Restarting once per trigger
//! would thrash the server, so triggers raised while a restart is already
//! running collapse into one trailing restart against the latest root.

use crate::collaborators::LanguageService;
use drydock_core::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

struct RestartState {
    /// Triggers raised since the in-flight restart started.
    pending: u32,
    /// Root of the most recent trigger; the trailing restart targets this.
    latest: Option<PathBuf>,
    /// Present while a restart is running; receivers resolve when it ends.
    in_flight: Option<watch::Receiver<bool>>,
}

/// Collapses bursts of restart triggers into a single effective restart.
pub struct RestartCoordinator {
    service: Arc<dyn LanguageService>,
    state: Mutex<RestartState>,
}

impl RestartCoordinator {
    #[must_use]
    pub fn new(service: Arc<dyn LanguageService>) -> Self {
        Self {
            service,
            state: Mutex::new(RestartState {
                pending: 0,
                latest: None,
                in_flight: None,
            }),
        }
    }

    /// Trigger a restart against `root`.
    ///
    /// If a restart is already running this only records the trigger; the
    /// caller holding the in-flight restart performs one trailing restart
    /// after it finishes. Concurrent triggers raised while nothing is in
    /// flight still coalesce, because every caller yields once between
    /// recording its trigger and claiming the restart.
    pub async fn request_restart(&self, root: Option<PathBuf>) -> Result<()> {
        {
            let mut state = self.state.lock().await;
            state.pending += 1;
            state.latest = root;
        }

        // Let sibling triggers record themselves before any of us claims the
        // restart. With a restart in flight, wait for it instead.
        let waiter = self.state.lock().await.in_flight.clone();
        match waiter {
            Some(mut done) => {
                while !*done.borrow() {
                    if done.changed().await.is_err() {
                        break;
                    }
                }
            }
            None => tokio::task::yield_now().await,
        }

        loop {
            let (latest, tx) = {
                let mut state = self.state.lock().await;
                if state.pending == 0 || state.in_flight.is_some() {
                    return Ok(());
                }
                state.pending = 0;
                let (tx, rx) = watch::channel(false);
                state.in_flight = Some(rx);
                (state.latest.clone(), tx)
            };

            let result = self.perform_restart(latest).await;

            let more = {
                let mut state = self.state.lock().await;
                state.in_flight = None;
                let _ = tx.send(true);
                state.pending > 0
            };
            result?;
            if !more {
                return Ok(());
            }
        }
    }

    /// Whether triggers are waiting on an in-flight restart.
    pub async fn has_pending(&self) -> bool {
        self.state.lock().await.pending > 0
    }

    async fn perform_restart(&self, root: Option<PathBuf>) -> Result<()> {
        tracing::debug!(?root, "restarting language server");
        self.service.cancel_pending().await;
        self.service.shutdown().await;
        self.service.launch(root).await
    }
}
