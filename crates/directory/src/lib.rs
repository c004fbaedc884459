#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # roomsync-directory
//!
//! Directory client for roomsync: read groups, group members, rooms and room
//! memberships from the collaboration platform, and add or remove room
//! memberships.
//!
//! ## Features
//!
//! - The [`Directory`] trait, the seam the reconciler is written against
//! - [`WebexClient`], a reqwest implementation that accumulates every page of
//!   a listing before returning it
//! - Typed records decoded at the boundary; unexpected shapes surface as
//!   [`Error::Protocol`]
//!
//! ## Example
//!
//! ```ignore
//! use roomsync_directory::{BearerToken, Directory, DirectoryConfig, WebexClient};
//!
//! let token = BearerToken::from_env()?;
//! let client = WebexClient::new(DirectoryConfig::from_env(), token)?;
//!
//! for room in client.list_rooms().await? {
//!     println!("{} ({})", room.title, room.id);
//! }
//! ```

pub mod client;
pub mod config;
pub mod directory;
pub mod error;
pub mod types;

// Re-export commonly used items
pub use client::WebexClient;
pub use config::{BearerToken, DirectoryConfig};
pub use directory::Directory;
pub use error::{Error, Result};
pub use types::{Group, GroupMember, RemovalStatus, Room, RoomMembership};
