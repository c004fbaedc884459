//! Records exchanged with the collaboration platform.
//!
//! Field names follow the platform's JSON (`displayName`, `personId`, ...).
//! Only the fields roomsync needs are decoded; everything else is ignored.

use serde::{Deserialize, Serialize};

/// A directory group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// Platform-assigned identifier.
    pub id: String,
    /// Display name; the join key against the mapping.
    pub display_name: String,
}

/// A member of a directory group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMember {
    /// Member identifier, scoped to the group's ID space.
    #[serde(rename = "id")]
    pub member_id: String,
    #[serde(default)]
    pub display_name: String,
}

/// A room (space).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    /// Room title; the join key against the mapping.
    pub title: String,
}

/// A membership record linking one person to one room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomMembership {
    /// Identifies the membership record itself, needed for removal.
    #[serde(rename = "id")]
    pub membership_id: String,
    /// Identifies the person, in the platform's global person ID space.
    pub person_id: String,
    #[serde(default)]
    pub person_display_name: String,
}

/// Raw outcome of a membership removal.
///
/// The platform signals success with `204 No Content`; every other status is
/// handed back unchanged for the caller to judge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovalStatus {
    pub status_code: u16,
    pub membership_id: String,
}

impl RemovalStatus {
    /// Status the platform returns for a deleted membership.
    pub const DELETED: u16 = 204;

    /// Create a removal status.
    pub fn new(status_code: u16, membership_id: impl Into<String>) -> Self {
        Self {
            status_code,
            membership_id: membership_id.into(),
        }
    }

    /// Whether the platform confirmed the deletion.
    pub const fn is_deleted(&self) -> bool {
        self.status_code == Self::DELETED
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_decode_group_member_ignores_extra_fields() {
        let member: GroupMember = serde_json::from_str(
            r#"{"id":"Y2lzY29zcGFyazovL3VzL1BFT1BMRS9h","type":"user","displayName":"Ada"}"#,
        )
        .unwrap();
        assert_eq!(member.member_id, "Y2lzY29zcGFyazovL3VzL1BFT1BMRS9h");
        assert_eq!(member.display_name, "Ada");
    }

    #[test]
    fn test_decode_membership() {
        let membership: RoomMembership = serde_json::from_str(
            r#"{"id":"m-1","roomId":"r-1","personId":"p-1","personEmail":"ada@example.com","personDisplayName":"Ada","isModerator":false}"#,
        )
        .unwrap();
        assert_eq!(membership.membership_id, "m-1");
        assert_eq!(membership.person_id, "p-1");
        assert_eq!(membership.person_display_name, "Ada");
    }

    #[test]
    fn test_membership_without_person_id_is_rejected() {
        let result = serde_json::from_str::<RoomMembership>(r#"{"id":"m-1","personDisplayName":"Ada"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_removal_status() {
        assert!(RemovalStatus::new(204, "m-1").is_deleted());
        assert!(!RemovalStatus::new(404, "m-1").is_deleted());
        assert!(!RemovalStatus::new(200, "m-1").is_deleted());
    }
}
