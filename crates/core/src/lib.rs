//! Core domain types, errors, and constants for the `drydock` session layer.
//!
//! This crate establishes the foundational data structures and error handling
//! mechanisms shared by every drydock crate.
//!
//! ## Key Components
//!
//! - **`errors`**: Defines the primary `Error` enum and `Result` type alias,
//!   centralizing all possible failure modes for predictable error handling.
//! - **`types`**: Domain types (tasks, project info, runners) and the wire
//!   formats of the daemon's control and broadcast channels.
//! - **`constants`**: Shared static constants such as the daemon socket path
//!   and fixed delays.

pub mod constants;
pub mod errors;
pub mod types;

pub use self::{
    constants::*,
    errors::{Error, Result, ResultExt},
    types::*,
};
