#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # roomsync
//!
//! Keeps collaboration room membership in step with directory group
//! membership, driven by a CSV mapping of groups to rooms.
//!
//! This library backs the `roomsync` binary and re-exports the workspace
//! crates for convenience.

pub use roomsync_core;
pub use roomsync_directory;
pub use roomsync_reconciler;

pub mod cli;
pub mod commands;
pub mod config;
pub mod report;
