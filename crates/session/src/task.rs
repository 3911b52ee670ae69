//! Lifecycle state machine for the current operation of one root.
//!
//! At most one build/run/watch task is live per root session. The daemon
//! drives the machine through `SetCurrentTask`, `UpdateCurrentTask`, and
//! `FinishCurrentTask` pushes; the tracker turns those into logger appends
//! and status-surface updates.

use crate::collaborators::{Logger, StatusSurface};
use drydock_core::constants::TASK_RESET_DELAY;
use drydock_core::{ContentLevel, TaskKind, TaskPrefix, TaskStatus};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct ActiveTask {
    target: String,
    kind: TaskKind,
    prefix: TaskPrefix,
    #[allow(dead_code)]
    status: TaskStatus,
}

#[derive(Default)]
struct Inner {
    active: Option<ActiveTask>,
    // Bumped on every begin/finish; a scheduled idle reset only fires if the
    // generation it captured is still current.
    generation: u64,
}

/// Tracks the current task of one root session.
pub struct TaskTracker {
    inner: Arc<Mutex<Inner>>,
    logger: Arc<dyn Logger>,
    status: Arc<dyn StatusSurface>,
}

impl TaskTracker {
    #[must_use]
    pub fn new(logger: Arc<dyn Logger>, status: Arc<dyn StatusSurface>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            logger,
            status,
        }
    }

    /// Whether a task is currently live.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.inner.lock().active.is_some()
    }

    /// Begin a task. A begin while another task is live overwrites it; tasks
    /// never queue.
    pub fn begin(&self, kind: TaskKind, target: String, status: TaskStatus) {
        let prefix = kind.prefix();
        let content = format!("[{target}] {}", prefix.processing);
        {
            let mut inner = self.inner.lock();
            inner.generation += 1;
            inner.active = Some(ActiveTask {
                target,
                kind,
                prefix,
                status,
            });
        }
        self.status.update_progress(&content, ContentLevel::Info);
    }

    /// Progress content for the live task.
    ///
    /// Debug and Trace updates are suppressed entirely. Content is appended
    /// to the logger and, with its `[target]` prefix stripped, pushed to the
    /// in-progress status line.
    pub fn update(&self, content: &str, level: ContentLevel) {
        let task = match self.inner.lock().active.clone() {
            Some(task) => task,
            None => {
                tracing::warn!("trying to update a task that no longer exists");
                return;
            }
        };

        if level.is_verbose() {
            return;
        }

        let content = content.replace(&format!("[{}]", task.target), "");
        self.logger.append(&content, level);
        self.status.update_progress(
            &format!("[{}] {}: {}", task.target, task.prefix.processing, content),
            level,
        );
    }

    /// Finish the live task and emit its final message.
    ///
    /// A Run task's natural end is disconnection, so its message ignores the
    /// status. On success the status surface returns to idle after a fixed
    /// delay; a failure message persists.
    pub fn finish(&self, status: TaskStatus) {
        let (task, generation) = {
            let mut inner = self.inner.lock();
            let task = match inner.active.take() {
                Some(task) => task,
                None => {
                    tracing::warn!("trying to finish a task that no longer exists");
                    return;
                }
            };
            inner.generation += 1;
            (task, inner.generation)
        };

        let failed = status.is_failed();
        let level = if failed {
            ContentLevel::Error
        } else {
            ContentLevel::Info
        };
        let content = if task.kind.is_run() {
            format!("[{}] Device disconnected", task.target)
        } else if failed {
            format!("[{}] {} Failed", task.target, task.prefix.processing)
        } else {
            format!("[{}] {}", task.target, task.prefix.done)
        };

        self.logger.append(&content, level);
        self.status.set_result(&content, level, !failed);

        if !failed {
            let inner = Arc::clone(&self.inner);
            let status = Arc::clone(&self.status);
            tokio::spawn(async move {
                tokio::time::sleep(TASK_RESET_DELAY).await;
                if inner.lock().generation == generation {
                    status.reset();
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingLogger, RecordingStatus};
    use std::time::Duration;

    fn tracker() -> (TaskTracker, Arc<RecordingLogger>, Arc<RecordingStatus>) {
        let logger = Arc::new(RecordingLogger::default());
        let status = Arc::new(RecordingStatus::default());
        let tracker = TaskTracker::new(logger.clone(), status.clone());
        (tracker, logger, status)
    }

    #[tokio::test]
    async fn run_success_finishes_as_device_disconnected() {
        let (tracker, logger, _) = tracker();
        tracker.begin(TaskKind::Run, "App".into(), TaskStatus::Processing);
        tracker.finish(TaskStatus::Succeeded);
        assert_eq!(logger.last(), "[App] Device disconnected");
    }

    #[tokio::test]
    async fn run_failure_also_finishes_as_device_disconnected() {
        let (tracker, logger, _) = tracker();
        tracker.begin(TaskKind::Run, "App".into(), TaskStatus::Processing);
        tracker.finish(TaskStatus::Failed);
        assert_eq!(logger.last(), "[App] Device disconnected");
    }

    #[tokio::test]
    async fn build_failure_uses_processing_label() {
        let (tracker, logger, status) = tracker();
        tracker.begin(TaskKind::Build, "App".into(), TaskStatus::Processing);
        tracker.finish(TaskStatus::Failed);
        assert_eq!(logger.last(), "[App] Building Failed");
        assert_eq!(status.last_result(), ("[App] Building Failed".into(), false));
    }

    #[tokio::test]
    async fn build_success_uses_done_label() {
        let (tracker, logger, status) = tracker();
        tracker.begin(TaskKind::Build, "App".into(), TaskStatus::Processing);
        tracker.finish(TaskStatus::Succeeded);
        assert_eq!(logger.last(), "[App] Built");
        assert_eq!(status.last_result(), ("[App] Built".into(), true));
    }

    #[tokio::test]
    async fn update_strips_target_prefix_on_status_line() {
        let (tracker, logger, status) = tracker();
        tracker.begin(TaskKind::Build, "App".into(), TaskStatus::Processing);
        tracker.update("[App] compiling main.rs", ContentLevel::Info);
        assert_eq!(logger.last(), " compiling main.rs");
        assert_eq!(
            status.last_progress(),
            "[App] Building:  compiling main.rs"
        );
    }

    #[tokio::test]
    async fn verbose_updates_are_suppressed_entirely() {
        let (tracker, logger, status) = tracker();
        tracker.begin(TaskKind::Build, "App".into(), TaskStatus::Processing);
        let appends_before = logger.len();
        let progress_before = status.progress_len();
        tracker.update("debug detail", ContentLevel::Debug);
        tracker.update("trace detail", ContentLevel::Trace);
        assert_eq!(logger.len(), appends_before);
        assert_eq!(status.progress_len(), progress_before);
        assert!(tracker.is_active());
    }

    #[tokio::test]
    async fn update_and_finish_while_idle_are_warn_only_noops() {
        let (tracker, logger, status) = tracker();
        tracker.update("orphan", ContentLevel::Info);
        tracker.finish(TaskStatus::Succeeded);
        assert_eq!(logger.len(), 0);
        assert_eq!(status.progress_len(), 0);
        assert!(!tracker.is_active());
    }

    #[tokio::test]
    async fn second_begin_overwrites_without_queueing() {
        let (tracker, logger, _) = tracker();
        tracker.begin(TaskKind::Build, "App".into(), TaskStatus::Processing);
        tracker.begin(TaskKind::Run, "Widget".into(), TaskStatus::Processing);
        tracker.finish(TaskStatus::Succeeded);
        assert_eq!(logger.last(), "[Widget] Device disconnected");
        // the first task was abandoned, so a second finish is a no-op
        tracker.finish(TaskStatus::Succeeded);
        assert_eq!(logger.last(), "[Widget] Device disconnected");
    }

    #[tokio::test(start_paused = true)]
    async fn successful_finish_resets_status_after_delay() {
        let (tracker, _, status) = tracker();
        tracker.begin(TaskKind::Build, "App".into(), TaskStatus::Processing);
        tracker.finish(TaskStatus::Succeeded);
        tokio::task::yield_now().await;
        assert_eq!(status.resets(), 0);
        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(status.resets(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_finish_never_resets_status() {
        let (tracker, _, status) = tracker();
        tracker.begin(TaskKind::Build, "App".into(), TaskStatus::Processing);
        tracker.finish(TaskStatus::Failed);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(status.resets(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_is_skipped_when_a_new_task_began_meanwhile() {
        let (tracker, _, status) = tracker();
        tracker.begin(TaskKind::Build, "App".into(), TaskStatus::Processing);
        tracker.finish(TaskStatus::Succeeded);
        tokio::task::yield_now().await;
        tracker.begin(TaskKind::Build, "App".into(), TaskStatus::Processing);
        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(status.resets(), 0);
    }
}
