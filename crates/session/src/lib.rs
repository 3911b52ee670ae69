//! Editor-side session layer for the drydock build/run daemon.
//!
//! The daemon exposes two local socket surfaces: a request/response control
//! channel shared by the whole editor process, and one streaming broadcast
//! channel per registered project root. This crate owns both, plus the state
//! that sits on top of them:
//!
//! - [`codec::FrameDecoder`]: newline-delimited JSON framing over byte chunks.
//! - [`control::ControlClient`]: the control channel (connect-or-spawn,
//!   request/response, register/drop).
//! - [`broadcast::BroadcastClient`]: one per root; drives the decoder and
//!   dispatches status/log/task messages.
//! - [`task::TaskTracker`]: the current-operation state machine of one root.
//! - [`registry::SessionRegistry`]: multi-root bookkeeping, focus state, and
//!   lifecycle fan-out to observers.
//! - [`restart::RestartCoordinator`]: collapses bursts of language-server
//!   restart triggers into a single effective restart.
//! - [`commands`]: quick-pick row computation and command submission.
//!
//! Rendering, pickers, project detection heuristics, and language-server
//! supervision stay outside; they plug in through the traits in
//! [`collaborators`].

pub mod broadcast;
pub mod codec;
pub mod collaborators;
pub mod commands;
pub mod config;
pub mod control;
pub mod registry;
pub mod restart;
pub mod task;

#[cfg(test)]
pub(crate) mod testing;

pub use broadcast::BroadcastClient;
pub use codec::FrameDecoder;
pub use collaborators::{LanguageService, Logger, Notifier, ProjectDetector, StatusSurface};
pub use commands::{CommandKind, PickerEntry};
pub use config::SessionConfig;
pub use control::ControlClient;
pub use registry::{Collaborators, Resolved, RootEvent, RootObserver, SessionRegistry};
pub use restart::RestartCoordinator;
pub use task::TaskTracker;
