//! Multi-root session bookkeeping.
//!
//! The registry owns the control channel, one session per registered root,
//! the focus state, and the observer list that the editor glue subscribes to
//! for lifecycle events. It is the single entry point for editor events
//! (root opened, root closed, focus changed, user command).

use crate::broadcast::{BroadcastClient, Dispatcher};
use crate::collaborators::{
    LanguageService, Logger, Notifier, ProjectDetector, StatusSurface,
};
use crate::commands::{self, CommandKind, PickerEntry};
use crate::config::SessionConfig;
use crate::control::ControlClient;
use crate::restart::RestartCoordinator;
use crate::task::TaskTracker;
use async_trait::async_trait;
use drydock_core::{ContentLevel, ProjectInfo, Result, Root, Runners};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Lifecycle events fanned out to subscribed observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootEvent {
    Added,
    Removed,
    Focused,
    Unfocused,
}

/// Observer of root lifecycle events.
///
/// `root` is absent only for a `Focused` event with no target, which the
/// registry fires so downstream consumers initialize consistently even in a
/// rootless workspace.
#[async_trait]
pub trait RootObserver: Send + Sync {
    async fn on_event(&self, event: RootEvent, root: Option<&Root>);
}

/// Outcome of mapping a file path onto the registered roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// The path lives inside this registered root.
    Registered(Root),
    /// No registered root matched, but this ancestor directory looks like a
    /// project; the caller may register it lazily.
    Candidate(PathBuf),
    /// Nothing between the path and its workspace folder is a project.
    None,
}

enum Focus {
    /// No focus transition happened yet.
    Unset,
    /// Focus was explicitly cleared.
    Empty,
    Root(Root),
}

struct RootSession {
    root: Root,
    broadcast: BroadcastClient,
    project_info: Arc<RwLock<ProjectInfo>>,
}

/// Collaborators handed in by the editor glue at startup.
pub struct Collaborators {
    pub logger: Arc<dyn Logger>,
    pub notifier: Arc<dyn Notifier>,
    pub status: Arc<dyn StatusSurface>,
    pub language_service: Arc<dyn LanguageService>,
    pub detector: Arc<dyn ProjectDetector>,
}

pub struct SessionRegistry {
    config: SessionConfig,
    control: ControlClient,
    collaborators: Collaborators,
    restart: Arc<RestartCoordinator>,
    runners: Arc<RwLock<Runners>>,
    sessions: Vec<RootSession>,
    observers: Vec<(u64, Arc<dyn RootObserver>)>,
    next_observer: u64,
    focus: Focus,
}

impl SessionRegistry {
    /// Connect the control channel (spawning the daemon if needed) and fetch
    /// the initial runner list.
    pub async fn init(config: SessionConfig, collaborators: Collaborators) -> Result<Self> {
        let mut control = ControlClient::connect(&config).await?;
        let runners = control.get_runners().await?;
        let restart = Arc::new(RestartCoordinator::new(
            collaborators.language_service.clone(),
        ));
        Ok(Self {
            config,
            control,
            collaborators,
            restart,
            runners: Arc::new(RwLock::new(runners)),
            sessions: Vec::new(),
            observers: Vec::new(),
            next_observer: 0,
            focus: Focus::Unset,
        })
    }

    /// Subscribe an observer; events are delivered in subscription order
    /// (reverse order for `Removed`). Returns a token for `unsubscribe`.
    pub fn subscribe(&mut self, observer: Arc<dyn RootObserver>) -> u64 {
        let id = self.next_observer;
        self.next_observer += 1;
        self.observers.push((id, observer));
        id
    }

    pub fn unsubscribe(&mut self, id: u64) {
        self.observers.retain(|(existing, _)| *existing != id);
    }

    /// Register `root` with the daemon and open its broadcast stream.
    ///
    /// The status surface shows `[{name}] Registering` for the duration. A
    /// root that is already registered is left alone.
    pub async fn add_root(&mut self, root: Root) -> Result<()> {
        if self.session_index(&root.path).is_some() {
            tracing::warn!(root = %root.path.display(), "root is already registered");
            return Ok(());
        }

        self.collaborators.status.update_progress(
            &format!("[{}] Registering", root.display_name()),
            ContentLevel::Info,
        );
        let outcome = self.open_session(&root).await;
        self.collaborators.status.reset();
        let session = outcome?;

        tracing::info!(root = %root.path.display(), "root registered");
        self.sessions.push(session);
        self.fire_forward(RootEvent::Added, Some(&root)).await;
        Ok(())
    }

    /// Remove `root`, unfocusing it first when it holds the focus.
    ///
    /// Deregistration with the daemon is best-effort; local teardown always
    /// completes.
    pub async fn remove_root(&mut self, path: &Path) {
        let Some(index) = self.session_index(path) else {
            tracing::warn!(root = %path.display(), "removing a root that is not registered");
            return;
        };

        if matches!(&self.focus, Focus::Root(root) if root.path == path) {
            self.focus_root(None).await;
        }

        let session = self.sessions.remove(index);
        self.fire_reverse(RootEvent::Removed, Some(&session.root)).await;
        session.broadcast.dispose();

        if let Err(e) = self.control.drop_roots(&[session.root.path.clone()]).await {
            tracing::warn!(
                root = %session.root.path.display(),
                error = %e,
                "daemon deregistration failed"
            );
        }
        tracing::info!(root = %session.root.path.display(), "root removed");
    }

    /// Move focus to `path` (a registered root) or clear it with `None`.
    ///
    /// A transition to the current focus is a no-op. Otherwise the previous
    /// root's `Unfocused` event is delivered before the new `Focused` event;
    /// only the very first transition of the session has no unfocus to pair.
    pub async fn focus_root(&mut self, path: Option<&Path>) {
        match (&self.focus, path) {
            (Focus::Root(current), Some(path)) if current.path == path => return,
            (Focus::Empty, None) => return,
            _ => {}
        }

        let target = match path {
            Some(path) => match self.session_index(path) {
                Some(index) => Some(self.sessions[index].root.clone()),
                None => {
                    tracing::warn!(root = %path.display(), "cannot focus an unregistered root");
                    return;
                }
            },
            None => None,
        };

        if let Focus::Root(previous) = &self.focus {
            let previous = previous.clone();
            self.fire_forward(RootEvent::Unfocused, Some(&previous)).await;
        }
        self.fire_forward(RootEvent::Focused, target.as_ref()).await;

        self.focus = match target {
            Some(root) => Focus::Root(root),
            None => Focus::Empty,
        };
    }

    /// Apply the startup focus policy: exactly one registered root becomes
    /// focused immediately; otherwise an explicit empty focus is fired so
    /// downstream consumers initialize consistently.
    pub async fn focus_initial(&mut self) {
        if self.sessions.len() == 1 {
            let path = self.sessions[0].root.path.clone();
            self.focus_root(Some(&path)).await;
        } else {
            self.focus_root(None).await;
        }
    }

    /// The currently focused root, if any.
    #[must_use]
    pub fn focused(&self) -> Option<&Root> {
        match &self.focus {
            Focus::Root(root) => Some(root),
            _ => None,
        }
    }

    /// Map `path` onto a registered root, or onto the nearest ancestor
    /// directory (up to `workspace_folder`) the project detector accepts.
    #[must_use]
    pub fn resolve_root_for_path(&self, path: &Path, workspace_folder: &Path) -> Resolved {
        let registered = self
            .sessions
            .iter()
            .filter(|session| session.root.contains(path))
            .max_by_key(|session| session.root.path.components().count());
        if let Some(session) = registered {
            return Resolved::Registered(session.root.clone());
        }

        let start = path.parent().unwrap_or(path);
        for dir in start.ancestors() {
            if !dir.starts_with(workspace_folder) {
                break;
            }
            if self.collaborators.detector.is_project_root(dir) {
                return Resolved::Candidate(dir.to_path_buf());
            }
        }
        Resolved::None
    }

    /// Registered roots, in registration order.
    pub fn roots(&self) -> impl Iterator<Item = &Root> {
        self.sessions.iter().map(|session| &session.root)
    }

    /// The cached daemon view of `path`'s project, if registered.
    #[must_use]
    pub fn project_info(&self, path: &Path) -> Option<ProjectInfo> {
        self.session_index(path)
            .map(|index| self.sessions[index].project_info.read().clone())
    }

    /// The cached platform-to-devices mapping.
    #[must_use]
    pub fn runners(&self) -> Runners {
        self.runners.read().clone()
    }

    /// Picker rows for `command` against a registered root.
    #[must_use]
    pub fn picker_items(&self, path: &Path, command: CommandKind) -> Vec<PickerEntry> {
        let Some(index) = self.session_index(path) else {
            return Vec::new();
        };
        let session = &self.sessions[index];
        commands::picker_items(
            &session.root,
            command,
            &session.project_info.read(),
            &self.runners.read(),
        )
    }

    /// Submit a picked entry to the daemon.
    pub async fn submit(&mut self, path: &Path, entry: &PickerEntry) -> Result<()> {
        let Some(index) = self.session_index(path) else {
            tracing::warn!(root = %path.display(), "submitting against an unregistered root");
            return Ok(());
        };
        let root = self.sessions[index].root.clone();
        commands::submit(&mut self.control, &root, entry).await
    }

    /// Deregister every root and close the control channel.
    pub async fn shutdown(&mut self) {
        let paths: Vec<PathBuf> = self
            .sessions
            .iter()
            .map(|session| session.root.path.clone())
            .collect();
        if !paths.is_empty() {
            if let Err(e) = self.control.drop_roots(&paths).await {
                tracing::warn!(error = %e, "daemon deregistration failed on shutdown");
            }
        }
        for session in self.sessions.drain(..) {
            session.broadcast.dispose();
        }
        self.control.shutdown().await;
    }

    async fn open_session(&mut self, root: &Root) -> Result<RootSession> {
        let address = self.control.register(&root.path).await?;
        let project_info = Arc::new(RwLock::new(
            self.control.get_project_info(&root.path).await?,
        ));

        let tracker = Arc::new(TaskTracker::new(
            self.collaborators.logger.clone(),
            self.collaborators.status.clone(),
        ));
        let broadcast = BroadcastClient::connect(
            Path::new(&address),
            Dispatcher {
                root: root.path.clone(),
                logger: self.collaborators.logger.clone(),
                notifier: self.collaborators.notifier.clone(),
                tracker,
                restart: self.restart.clone(),
                project_info: project_info.clone(),
                runners: self.runners.clone(),
                open_logger_on_error: self.config.open_logger_on_error,
            },
        )
        .await?;

        Ok(RootSession {
            root: root.clone(),
            broadcast,
            project_info,
        })
    }

    fn session_index(&self, path: &Path) -> Option<usize> {
        self.sessions
            .iter()
            .position(|session| session.root.path == path)
    }

    async fn fire_forward(&self, event: RootEvent, root: Option<&Root>) {
        for (_, observer) in &self.observers {
            observer.on_event(event, root).await;
        }
    }

    async fn fire_reverse(&self, event: RootEvent, root: Option<&Root>) {
        for (_, observer) in self.observers.iter().rev() {
            observer.on_event(event, root).await;
        }
    }
}
