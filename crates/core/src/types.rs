use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Severity attached to log, notify, and task-update content.
///
/// Ordered from most to least verbose so level comparisons read naturally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContentLevel {
    /// Trace Message
    Trace,
    /// Debug Message
    Debug,
    /// Info Message
    Info,
    /// Warn Message
    Warn,
    /// Error Message
    Error,
}

impl ContentLevel {
    /// Whether content at this level is suppressed by default surfaces.
    #[must_use]
    pub fn is_verbose(self) -> bool {
        matches!(self, Self::Trace | Self::Debug)
    }
}

/// What kind of task is currently under progress?
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskKind {
    /// Build Task
    Build,
    /// Run Task
    Run,
    /// Watch Task
    Watch,
}

/// Status labels derived from a task's kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskPrefix {
    pub processing: &'static str,
    pub done: &'static str,
}

impl TaskKind {
    #[must_use]
    pub fn is_run(self) -> bool {
        matches!(self, Self::Run)
    }

    /// Phrasing used for the in-progress and finished status lines.
    #[must_use]
    pub fn prefix(self) -> TaskPrefix {
        match self {
            Self::Build => TaskPrefix {
                processing: "Building",
                done: "Built",
            },
            Self::Run => TaskPrefix {
                processing: "Running",
                done: "Ran",
            },
            Self::Watch => TaskPrefix {
                processing: "Watching",
                done: "Watched",
            },
        }
    }
}

/// What the status of the task currently under progress is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    /// Task Failed
    Failed,
    /// Task Succeeded
    Succeeded,
    /// Processing Task
    Processing,
}

impl TaskStatus {
    #[must_use]
    pub fn is_failed(self) -> bool {
        matches!(self, Self::Failed)
    }
}

/// Per-target metadata reported by the daemon.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetInfo {
    pub platform: String,
    #[serde(default)]
    pub configurations: Vec<String>,
}

/// The daemon's authoritative view of one project root.
///
/// The session registry caches a copy per root; `SetState` pushes replace it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    #[serde(default)]
    pub targets: HashMap<String, TargetInfo>,
    #[serde(default)]
    pub watchlist: Vec<String>,
}

/// A device a Run task can be dispatched to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceLookup {
    pub name: String,
    pub udid: String,
}

/// Mapping from platform name to the devices available for it.
pub type Runners = HashMap<String, Vec<DeviceLookup>>;

/// Target/configuration selection submitted with build and run requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSettings {
    pub target: String,
    pub configuration: String,
    pub scheme: Option<String>,
}

/// How a picked command should execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Execute once
    Once,
    /// Start watching
    Watch,
    /// Stop an active watch
    Stop,
}

/// Which registry cache a `SetState` push replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateKey {
    ProjectInfo,
    Runners,
}

/// Messages received over a root's broadcast stream.
///
/// Closed union: unknown tags fail deserialization instead of being coerced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "args")]
pub enum Message {
    /// Notify the user with a message
    Notify { content: String, level: ContentLevel },
    /// Append to the logger
    Log { content: String, level: ContentLevel },
    /// Ask the logger to become visible
    OpenLogger,
    /// Reload the auxiliary language server
    ReloadLspServer,
    /// Begin the current task
    SetCurrentTask {
        kind: TaskKind,
        target: String,
        status: TaskStatus,
    },
    /// Progress content for the current task
    UpdateCurrentTask { content: String, level: ContentLevel },
    /// End the current task
    FinishCurrentTask { status: TaskStatus },
    /// Replace a cached state entry
    SetState {
        key: StateKey,
        value: serde_json::Value,
    },
}

/// One control-channel request frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub method: String,
    pub args: serde_json::Value,
}

/// One control-channel response frame.
#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<ResponseError>,
}

/// Error payload the daemon attaches to a failed response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseError {
    pub kind: String,
    pub msg: String,
}

/// A project directory registered with the daemon and tracked as one unit
/// of build/run/watch state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Root {
    /// Absolute path of the project root.
    pub path: PathBuf,
    /// The editor workspace folder that owns this root.
    pub workspace_folder: PathBuf,
}

impl Root {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, workspace_folder: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            workspace_folder: workspace_folder.into(),
        }
    }

    /// Capitalized basename of the root path, used as the display name.
    #[must_use]
    pub fn display_name(&self) -> String {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            None => name,
        }
    }

    /// Whether `path` lives inside this root.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        path.starts_with(&self.path)
    }
}
