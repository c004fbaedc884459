#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # roomsync-core
//!
//! Shared building blocks for roomsync: the core error type and the
//! [`GroupRoomMapping`] that tells the reconciler which directory group feeds
//! which room.

pub mod error;
pub mod mapping;

pub use error::{Error, Result};
pub use mapping::{GroupRoomMapping, MappingPair};
