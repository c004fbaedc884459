//! The directory seam the reconciler is written against.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Group, GroupMember, RemovalStatus, Room, RoomMembership};

/// Membership reads and writes on the collaboration platform.
///
/// Implementations hold no state between calls and apply no business logic.
/// Every list operation returns the complete collection in platform order,
/// however many pages it took to fetch.
#[async_trait]
pub trait Directory: Send + Sync {
    /// List every group visible to the credential.
    async fn list_groups(&self) -> Result<Vec<Group>>;

    /// List the members of a group previously returned by [`Directory::list_groups`].
    async fn list_group_members(&self, group_id: &str) -> Result<Vec<GroupMember>>;

    /// List every room visible to the credential.
    async fn list_rooms(&self) -> Result<Vec<Room>>;

    /// List the memberships of a room previously returned by [`Directory::list_rooms`].
    async fn list_room_memberships(&self, room_id: &str) -> Result<Vec<RoomMembership>>;

    /// Add a person to a room, returning the new membership ID.
    async fn add_membership(&self, room_id: &str, person_id: &str) -> Result<String>;

    /// Delete a membership record.
    ///
    /// A returned `Ok` does not mean the membership is gone; check
    /// [`RemovalStatus::is_deleted`].
    async fn remove_membership(&self, membership_id: &str) -> Result<RemovalStatus>;
}
