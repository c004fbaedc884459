//! Error types for the reconciler crate.

use std::fmt;

use roomsync_core::MappingPair;
use roomsync_directory::Error as DirectoryError;
use thiserror::Error;

/// Result type alias for reconciler operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Which side of a mapping pair failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Group,
    Room,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Group => write!(f, "group"),
            Self::Room => write!(f, "room"),
        }
    }
}

/// Reconciler error types.
#[derive(Debug, Error)]
pub enum Error {
    /// A read from the directory failed; the run was aborted before any
    /// mutation.
    #[error("failed to fetch {resource}: {source}")]
    FetchFailed {
        resource: String,
        #[source]
        source: DirectoryError,
    },

    /// The mapping names a group or room the platform did not list.
    #[error("{missing} '{name}' from mapping pair ('{group}' -> '{room}') was not found on the platform")]
    UnresolvedMapping {
        missing: EntityKind,
        name: String,
        group: String,
        room: String,
    },

    /// Adding a member to a room failed; the run stopped at this point.
    #[error("failed to add member '{member_name}' ({member_id}) of group '{group}' to room '{room}': {source}")]
    MembershipMutation {
        group: String,
        room: String,
        member_id: String,
        member_name: String,
        #[source]
        source: DirectoryError,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl Error {
    /// Create a fetch failed error.
    pub fn fetch_failed(resource: impl Into<String>, source: DirectoryError) -> Self {
        Self::FetchFailed {
            resource: resource.into(),
            source,
        }
    }

    /// Create an unresolved mapping error for one side of a pair.
    pub fn unresolved(missing: EntityKind, pair: &MappingPair) -> Self {
        let name = match missing {
            EntityKind::Group => pair.group.clone(),
            EntityKind::Room => pair.room.clone(),
        };
        Self::UnresolvedMapping {
            missing,
            name,
            group: pair.group.clone(),
            room: pair.room.clone(),
        }
    }

    /// Create a membership mutation error.
    pub fn membership_mutation(
        group: impl Into<String>,
        room: impl Into<String>,
        member_id: impl Into<String>,
        member_name: impl Into<String>,
        source: DirectoryError,
    ) -> Self {
        Self::MembershipMutation {
            group: group.into(),
            room: room.into(),
            member_id: member_id.into(),
            member_name: member_name.into(),
            source,
        }
    }

    /// Create an invalid config error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// The underlying directory failure, if any.
    pub const fn directory_error(&self) -> Option<&DirectoryError> {
        match self {
            Self::FetchFailed { source, .. } | Self::MembershipMutation { source, .. } => Some(source),
            Self::UnresolvedMapping { .. } | Self::InvalidConfig { .. } => None,
        }
    }

    /// Whether the credential was rejected somewhere during the run.
    pub fn is_auth(&self) -> bool {
        self.directory_error().is_some_and(DirectoryError::is_auth)
    }
}
