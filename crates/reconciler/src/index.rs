//! In-memory indexes built from one run's directory snapshot.
//!
//! Three opaque ID spaces meet here: group member IDs, person IDs and
//! membership IDs. Group members and room occupants are compared by ID
//! directly, which is only correct while the platform's group member IDs are
//! its person IDs.

use std::collections::{HashMap, HashSet};

use roomsync_directory::{Group, GroupMember, Room, RoomMembership};
use tracing::warn;

/// Insertion-ordered set of identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedIds {
    order: Vec<String>,
    present: HashSet<String>,
}

impl OrderedIds {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an ID, keeping its first position. Returns false for a repeat.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.present.contains(&id) {
            return false;
        }
        self.present.insert(id.clone());
        self.order.push(id);
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.present.contains(id)
    }

    /// IDs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// IDs of `self` absent from `other`, in `self`'s order.
    pub fn difference<'a>(&'a self, other: &'a Self) -> impl Iterator<Item = &'a str> {
        self.iter().filter(move |id| !other.contains(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for OrderedIds {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut ids = Self::new();
        for id in iter {
            ids.insert(id);
        }
        ids
    }
}

/// Room-side indexes.
#[derive(Debug, Clone, Default)]
pub struct RoomIndex {
    /// Room title -> room ID.
    room_ids: HashMap<String, String>,
    /// Room ID -> person IDs currently in the room.
    occupants: HashMap<String, OrderedIds>,
    /// Person ID -> (room ID -> membership ID).
    memberships: HashMap<String, HashMap<String, String>>,
    /// Person ID -> display name, as the room reports it.
    names: HashMap<String, String>,
}

impl RoomIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mapped room. When two rooms share a title the later one wins.
    pub fn record_room(&mut self, room: &Room) {
        if let Some(previous) = self.room_ids.insert(room.title.clone(), room.id.clone()) {
            if previous != room.id {
                warn!(
                    title = %room.title,
                    ignored = %previous,
                    used = %room.id,
                    "Several rooms share a mapped title, using the last one listed"
                );
                self.occupants.remove(&previous);
            }
        }
        self.occupants.entry(room.id.clone()).or_default();
    }

    /// Record one membership of a recorded room.
    pub fn record_membership(&mut self, room_id: &str, membership: RoomMembership) {
        let RoomMembership {
            membership_id,
            person_id,
            person_display_name,
        } = membership;

        self.occupants
            .entry(room_id.to_string())
            .or_default()
            .insert(person_id.clone());
        self.memberships
            .entry(person_id.clone())
            .or_default()
            .insert(room_id.to_string(), membership_id);
        self.names.insert(person_id, person_display_name);
    }

    /// IDs of every recorded room, in no particular order.
    pub fn room_ids(&self) -> impl Iterator<Item = &str> {
        self.room_ids.values().map(String::as_str)
    }

    pub fn room_id(&self, title: &str) -> Option<&str> {
        self.room_ids.get(title).map(String::as_str)
    }

    pub fn occupants(&self, room_id: &str) -> Option<&OrderedIds> {
        self.occupants.get(room_id)
    }

    pub fn membership_id(&self, person_id: &str, room_id: &str) -> Option<&str> {
        self.memberships
            .get(person_id)
            .and_then(|rooms| rooms.get(room_id))
            .map(String::as_str)
    }

    pub fn display_name(&self, person_id: &str) -> Option<&str> {
        self.names.get(person_id).map(String::as_str)
    }
}

/// Group-side indexes.
#[derive(Debug, Clone, Default)]
pub struct GroupIndex {
    /// Group display name -> group ID.
    group_ids: HashMap<String, String>,
    /// Group ID -> member IDs.
    members: HashMap<String, OrderedIds>,
    /// Member ID -> display name, as the group reports it.
    names: HashMap<String, String>,
}

impl GroupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mapped group. When two groups share a name the later one wins.
    pub fn record_group(&mut self, group: &Group) {
        if let Some(previous) = self
            .group_ids
            .insert(group.display_name.clone(), group.id.clone())
        {
            if previous != group.id {
                warn!(
                    name = %group.display_name,
                    ignored = %previous,
                    used = %group.id,
                    "Several groups share a mapped name, using the last one listed"
                );
                self.members.remove(&previous);
            }
        }
        self.members.entry(group.id.clone()).or_default();
    }

    /// Record one member of a recorded group.
    pub fn record_member(&mut self, group_id: &str, member: GroupMember) {
        self.members
            .entry(group_id.to_string())
            .or_default()
            .insert(member.member_id.clone());
        self.names.insert(member.member_id, member.display_name);
    }

    /// IDs of every recorded group, in no particular order.
    pub fn group_ids(&self) -> impl Iterator<Item = &str> {
        self.group_ids.values().map(String::as_str)
    }

    pub fn group_id(&self, name: &str) -> Option<&str> {
        self.group_ids.get(name).map(String::as_str)
    }

    pub fn members(&self, group_id: &str) -> Option<&OrderedIds> {
        self.members.get(group_id)
    }

    pub fn display_name(&self, member_id: &str) -> Option<&str> {
        self.names.get(member_id).map(String::as_str)
    }
}

/// Everything the planner needs from one run's reads.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub rooms: RoomIndex,
    pub groups: GroupIndex,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }
}
