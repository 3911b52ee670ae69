//! Interfaces to the editor-side collaborators.
//!
//! The session layer never renders anything and never supervises processes;
//! the surrounding editor glue implements these traits and hands them in at
//! startup.

use async_trait::async_trait;
use drydock_core::{ContentLevel, Result};
use std::path::{Path, PathBuf};

/// The editor's output channel for daemon log content.
pub trait Logger: Send + Sync {
    fn append(&self, content: &str, level: ContentLevel);
    /// Make the channel visible.
    fn show(&self);
    /// Flip the channel's visibility.
    fn toggle(&self);
}

/// Pops user-facing notifications, keyed by level.
pub trait Notifier: Send + Sync {
    fn notify(&self, content: &str, level: ContentLevel);
}

/// The status-bar style surface that shows the current operation.
pub trait StatusSurface: Send + Sync {
    /// Transient in-progress content (spinner style).
    fn update_progress(&self, content: &str, level: ContentLevel);
    /// Final content, colored by success or failure.
    fn set_result(&self, content: &str, level: ContentLevel, success: bool);
    /// Return to the default idle content.
    fn reset(&self);
}

/// The auxiliary language-server connection managed by the restart
/// coordinator. Process supervision lives behind this trait.
#[async_trait]
pub trait LanguageService: Send + Sync {
    /// Cancel any request still outstanding against the current connection.
    async fn cancel_pending(&self);
    /// Tear the current connection down.
    async fn shutdown(&self);
    /// Establish a new connection rooted at `root` (none for a rootless
    /// session).
    async fn launch(&self, root: Option<PathBuf>) -> Result<()>;
}

/// On-disk heuristic that decides whether a directory is a supported
/// project root.
pub trait ProjectDetector: Send + Sync {
    fn is_project_root(&self, path: &Path) -> bool;
}
