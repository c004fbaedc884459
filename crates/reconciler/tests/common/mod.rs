//! In-memory directory for engine tests.
//!
//! Mutations change the stored state, so a second run sees the effect of the
//! first one.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use roomsync_directory::{
    Directory, Error, Group, GroupMember, RemovalStatus, Result, Room, RoomMembership,
};

/// A mutation the fake received, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Add { room_id: String, person_id: String },
    Remove { membership_id: String },
}

#[derive(Default)]
struct State {
    groups: Vec<Group>,
    members: HashMap<String, Vec<GroupMember>>,
    rooms: Vec<Room>,
    memberships: HashMap<String, Vec<RoomMembership>>,
    mutations: Vec<Mutation>,
    next_membership: u32,
    failing_adds: HashSet<String>,
    failing_removals: HashSet<String>,
    removal_statuses: HashMap<String, u16>,
    failing_room_listing: bool,
}

#[derive(Default)]
pub struct FakeDirectory {
    state: Mutex<State>,
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a group with `(member_id, display_name)` members.
    pub fn with_group(self, id: &str, name: &str, members: &[(&str, &str)]) -> Self {
        {
            let mut state = self.state();
            state.groups.push(Group {
                id: id.to_string(),
                display_name: name.to_string(),
            });
            state.members.insert(
                id.to_string(),
                members
                    .iter()
                    .map(|(member_id, display_name)| GroupMember {
                        member_id: (*member_id).to_string(),
                        display_name: (*display_name).to_string(),
                    })
                    .collect(),
            );
        }
        self
    }

    /// Add a room with `(membership_id, person_id, display_name)` occupants.
    pub fn with_room(self, id: &str, title: &str, occupants: &[(&str, &str, &str)]) -> Self {
        {
            let mut state = self.state();
            state.rooms.push(Room {
                id: id.to_string(),
                title: title.to_string(),
            });
            state.memberships.insert(
                id.to_string(),
                occupants
                    .iter()
                    .map(|(membership_id, person_id, name)| RoomMembership {
                        membership_id: (*membership_id).to_string(),
                        person_id: (*person_id).to_string(),
                        person_display_name: (*name).to_string(),
                    })
                    .collect(),
            );
        }
        self
    }

    /// Make `add_membership` fail with a transport error for this person.
    pub fn failing_add(self, person_id: &str) -> Self {
        self.state().failing_adds.insert(person_id.to_string());
        self
    }

    /// Make `remove_membership` return `status` for this membership.
    pub fn removal_status(self, membership_id: &str, status: u16) -> Self {
        self.state()
            .removal_statuses
            .insert(membership_id.to_string(), status);
        self
    }

    /// Make `remove_membership` fail with a transport error for this membership.
    pub fn failing_removal(self, membership_id: &str) -> Self {
        self.state()
            .failing_removals
            .insert(membership_id.to_string());
        self
    }

    /// Make `list_rooms` fail with a transport error.
    pub fn failing_room_listing(self) -> Self {
        self.state().failing_room_listing = true;
        self
    }

    pub fn mutations(&self) -> Vec<Mutation> {
        self.state().mutations.clone()
    }

    pub fn clear_mutations(&self) {
        self.state().mutations.clear();
    }

    /// Person IDs currently in a room, in membership order.
    pub fn occupants(&self, room_id: &str) -> Vec<String> {
        self.state()
            .memberships
            .get(room_id)
            .map(|list| list.iter().map(|m| m.person_id.clone()).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Directory for FakeDirectory {
    async fn list_groups(&self) -> Result<Vec<Group>> {
        Ok(self.state().groups.clone())
    }

    async fn list_group_members(&self, group_id: &str) -> Result<Vec<GroupMember>> {
        Ok(self.state().members.get(group_id).cloned().unwrap_or_default())
    }

    async fn list_rooms(&self) -> Result<Vec<Room>> {
        let state = self.state();
        if state.failing_room_listing {
            return Err(Error::transport("connection refused"));
        }
        Ok(state.rooms.clone())
    }

    async fn list_room_memberships(&self, room_id: &str) -> Result<Vec<RoomMembership>> {
        Ok(self
            .state()
            .memberships
            .get(room_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn add_membership(&self, room_id: &str, person_id: &str) -> Result<String> {
        let mut state = self.state();
        state.mutations.push(Mutation::Add {
            room_id: room_id.to_string(),
            person_id: person_id.to_string(),
        });
        if state.failing_adds.contains(person_id) {
            return Err(Error::transport("connection reset by peer"));
        }

        state.next_membership = state.next_membership.saturating_add(1);
        let membership_id = format!("m-new-{}", state.next_membership);
        let name = state
            .members
            .values()
            .flatten()
            .find(|m| m.member_id == person_id)
            .map(|m| m.display_name.clone())
            .unwrap_or_default();
        state
            .memberships
            .entry(room_id.to_string())
            .or_default()
            .push(RoomMembership {
                membership_id: membership_id.clone(),
                person_id: person_id.to_string(),
                person_display_name: name,
            });
        Ok(membership_id)
    }

    async fn remove_membership(&self, membership_id: &str) -> Result<RemovalStatus> {
        let mut state = self.state();
        state.mutations.push(Mutation::Remove {
            membership_id: membership_id.to_string(),
        });
        if state.failing_removals.contains(membership_id) {
            return Err(Error::transport("connection reset by peer"));
        }

        let status = state
            .removal_statuses
            .get(membership_id)
            .copied()
            .unwrap_or(RemovalStatus::DELETED);
        if status == RemovalStatus::DELETED {
            for list in state.memberships.values_mut() {
                list.retain(|m| m.membership_id != membership_id);
            }
        }
        Ok(RemovalStatus::new(status, membership_id))
    }
}
