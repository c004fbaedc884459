//! Reconciliation of room membership against directory groups.
//!
//! Each run follows the same three steps:
//!
//! - **Snapshot**: list groups and rooms, keep the ones the mapping names,
//!   then fetch their members with bounded concurrency
//! - **Plan**: per mapping pair, `to_add = group - room` and
//!   `to_remove = room - group`, both in platform order
//! - **Apply**: adds first, then removals, pair by pair in mapping order
//!
//! Every pair is resolved before the first mutation, so a typo in the mapping
//! fails the run without touching any room. A failed add aborts the run; a
//! failed removal is recorded in the [`ChangeReport`] and the run continues.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use roomsync_core::GroupRoomMapping;
//! use roomsync_directory::{BearerToken, DirectoryConfig, WebexClient};
//! use roomsync_reconciler::ReconcilerBuilder;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = WebexClient::new(DirectoryConfig::from_env(), BearerToken::from_env()?)?;
//!     let reconciler = ReconcilerBuilder::new()
//!         .with_directory(Arc::new(client))
//!         .build()?;
//!
//!     let mapping = GroupRoomMapping::from_csv_path("mapping.csv".as_ref())?;
//!     let report = reconciler.run(&mapping).await?;
//!     println!("{} changes", report.total_changes());
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod index;
pub mod reconciler;
pub mod types;

// Re-export main types
pub use error::{EntityKind, Error, Result};
pub use index::{GroupIndex, OrderedIds, RoomIndex, Snapshot};
pub use reconciler::{Reconciler, ReconcilerBuilder, ReconcilerConfig};
pub use types::{ChangeEntry, ChangeReport, PairPlan, PlannedAdd, PlannedRemoval, RemovalFailure, SyncPlan};
