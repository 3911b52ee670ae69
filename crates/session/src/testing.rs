//! Recording doubles for the collaborator traits.

use crate::collaborators::{LanguageService, Logger, Notifier, ProjectDetector, StatusSurface};
use async_trait::async_trait;
use drydock_core::{ContentLevel, Result};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Default)]
pub(crate) struct RecordingLogger {
    pub appends: Mutex<Vec<(String, ContentLevel)>>,
    pub shows: AtomicUsize,
    pub toggles: AtomicUsize,
}

impl RecordingLogger {
    pub fn last(&self) -> String {
        self.appends
            .lock()
            .last()
            .map(|(content, _)| content.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.appends.lock().len()
    }

    pub fn shows(&self) -> usize {
        self.shows.load(Ordering::SeqCst)
    }
}

impl Logger for RecordingLogger {
    fn append(&self, content: &str, level: ContentLevel) {
        self.appends.lock().push((content.to_string(), level));
    }

    fn show(&self) {
        self.shows.fetch_add(1, Ordering::SeqCst);
    }

    fn toggle(&self) {
        self.toggles.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub(crate) struct RecordingNotifier {
    pub notifications: Mutex<Vec<(String, ContentLevel)>>,
}

impl RecordingNotifier {
    pub fn last(&self) -> Option<(String, ContentLevel)> {
        self.notifications.lock().last().cloned()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, content: &str, level: ContentLevel) {
        self.notifications.lock().push((content.to_string(), level));
    }
}

#[derive(Default)]
pub(crate) struct RecordingStatus {
    pub progress: Mutex<Vec<(String, ContentLevel)>>,
    pub results: Mutex<Vec<(String, bool)>>,
    pub reset_count: AtomicUsize,
}

impl RecordingStatus {
    pub fn last_progress(&self) -> String {
        self.progress
            .lock()
            .last()
            .map(|(content, _)| content.clone())
            .unwrap_or_default()
    }

    pub fn progress_len(&self) -> usize {
        self.progress.lock().len()
    }

    pub fn last_result(&self) -> (String, bool) {
        self.results.lock().last().cloned().unwrap_or_default()
    }

    pub fn resets(&self) -> usize {
        self.reset_count.load(Ordering::SeqCst)
    }
}

impl StatusSurface for RecordingStatus {
    fn update_progress(&self, content: &str, level: ContentLevel) {
        self.progress.lock().push((content.to_string(), level));
    }

    fn set_result(&self, content: &str, _level: ContentLevel, success: bool) {
        self.results.lock().push((content.to_string(), success));
    }

    fn reset(&self) {
        self.reset_count.fetch_add(1, Ordering::SeqCst);
    }
}

/// Counts lifecycle calls and records the root each launch received.
#[derive(Default)]
pub(crate) struct MockLanguageService {
    pub cancels: AtomicUsize,
    pub shutdowns: AtomicUsize,
    pub launches: Mutex<Vec<Option<PathBuf>>>,
}

impl MockLanguageService {
    pub fn launch_count(&self) -> usize {
        self.launches.lock().len()
    }
}

#[async_trait]
impl LanguageService for MockLanguageService {
    async fn cancel_pending(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }

    async fn shutdown(&self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }

    async fn launch(&self, root: Option<PathBuf>) -> Result<()> {
        self.launches.lock().push(root);
        Ok(())
    }
}

/// Treats every path inside one of the configured directories as a project.
pub(crate) struct FixedDetector {
    pub roots: Vec<PathBuf>,
}

impl ProjectDetector for FixedDetector {
    fn is_project_root(&self, path: &Path) -> bool {
        self.roots.iter().any(|root| root == path)
    }
}
