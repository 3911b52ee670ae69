//! Build/Run/Watch command plumbing.
//!
//! The editor surfaces a quick-pick per command; this module computes the
//! entries from the cached project info and runner list and submits the
//! chosen entry over the control channel. Rendering the picker itself stays
//! in the editor glue.

use crate::control::ControlClient;
use drydock_core::constants::DEFAULT_CONFIGURATIONS;
use drydock_core::{BuildSettings, DeviceLookup, Operation, ProjectInfo, Result, Root, Runners};
use serde_json::json;

/// The three daemon commands a picker can be opened for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Build,
    Run,
    Watch,
}

impl CommandKind {
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Build => "Build",
            Self::Run => "Run",
            Self::Watch => "Watch",
        }
    }

    /// Watch is a modifier over the other two, not a command of its own.
    fn expansion(self) -> &'static [Self] {
        match self {
            Self::Watch => &[Self::Build, Self::Run],
            Self::Build => &[Self::Build],
            Self::Run => &[Self::Run],
        }
    }

    fn method(self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::Run => "run",
            Self::Watch => "watch",
        }
    }
}

/// One row of the quick-pick, carrying everything needed to submit it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerEntry {
    pub label: String,
    pub description: String,
    pub detail: String,
    pub method: &'static str,
    pub settings: BuildSettings,
    pub device: Option<DeviceLookup>,
    pub operation: Operation,
}

/// The daemon's watchlist key for one (command, settings, device) combination.
#[must_use]
pub fn watchlist_key(
    root: &Root,
    command: CommandKind,
    settings: &BuildSettings,
    device: Option<&DeviceLookup>,
) -> String {
    let mut key = format!("{}:{}", root.path.display(), command.title());
    if command == CommandKind::Run {
        match device {
            Some(device) => key.push_str(&format!(":{}", device.name)),
            None => key.push_str(":Bin"),
        }
    }
    key.push_str(&format!(
        "-configuration {} -target {}",
        settings.configuration, settings.target
    ));
    key
}

#[must_use]
pub fn is_watching(
    info: &ProjectInfo,
    root: &Root,
    command: CommandKind,
    settings: &BuildSettings,
    device: Option<&DeviceLookup>,
) -> bool {
    info.watchlist
        .contains(&watchlist_key(root, command, settings, device))
}

/// Compute the picker rows for `command`.
///
/// Watch expands to Build and Run rows whose operation flips between starting
/// and stopping a watcher depending on the daemon's watchlist. Run rows are
/// additionally expanded per device of the target's platform, with a
/// device-less binary row last.
#[must_use]
pub fn picker_items(
    root: &Root,
    command: CommandKind,
    info: &ProjectInfo,
    runners: &Runners,
) -> Vec<PickerEntry> {
    let is_watch_command = command == CommandKind::Watch;
    let mut targets: Vec<&String> = info.targets.keys().collect();
    targets.sort();

    let mut entries = Vec::new();
    for &cmd in command.expansion() {
        for target in &targets {
            let target_info = &info.targets[*target];
            let configurations: Vec<&str> = if target_info.configurations.is_empty() {
                DEFAULT_CONFIGURATIONS.to_vec()
            } else {
                target_info.configurations.iter().map(String::as_str).collect()
            };

            for configuration in configurations {
                let settings = BuildSettings {
                    target: (*target).clone(),
                    configuration: configuration.to_string(),
                    scheme: None,
                };

                let devices: &[DeviceLookup] = if cmd == CommandKind::Run {
                    runners
                        .get(&target_info.platform)
                        .map(Vec::as_slice)
                        .unwrap_or_default()
                } else {
                    &[]
                };

                for device in devices {
                    entries.push(entry(
                        root,
                        cmd,
                        is_watch_command,
                        info,
                        &settings,
                        Some(device),
                    ));
                }
                entries.push(entry(root, cmd, is_watch_command, info, &settings, None));
            }
        }
    }
    entries
}

fn entry(
    root: &Root,
    cmd: CommandKind,
    is_watch_command: bool,
    info: &ProjectInfo,
    settings: &BuildSettings,
    device: Option<&DeviceLookup>,
) -> PickerEntry {
    let watching =
        is_watch_command.then(|| is_watching(info, root, cmd, settings, device));

    let label = match device {
        Some(device) => format!("{} on {}", settings.target, device.name),
        None => settings.target.clone(),
    };

    let mut detail = format!(
        "{} {} with {}",
        cmd.title(),
        settings.target,
        settings.configuration
    );
    if let Some(device) = device {
        detail.push_str(&format!(" on {}", device.name));
    }
    if let Some(watching) = watching {
        let action = if watching { "Stop" } else { "Watch" };
        detail = format!("{action} {detail}");
    }

    let operation = match watching {
        Some(true) => Operation::Stop,
        Some(false) => Operation::Watch,
        None => Operation::Once,
    };

    PickerEntry {
        label,
        description: format!("({})", settings.configuration),
        detail,
        method: cmd.method(),
        settings: settings.clone(),
        device: device.cloned(),
        operation,
    }
}

/// Submit a chosen entry to the daemon.
pub async fn submit(control: &mut ControlClient, root: &Root, entry: &PickerEntry) -> Result<()> {
    control
        .request(
            entry.method,
            json!({
                "root": root.path,
                "settings": entry.settings,
                "operation": entry.operation,
                "device": entry.device,
            }),
        )
        .await?;
    Ok(())
}
