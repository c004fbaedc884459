//! Reconciler implementation.

use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use roomsync_core::{GroupRoomMapping, MappingPair};
use roomsync_directory::Directory;
use tracing::{debug, info, info_span, warn, Instrument};
use ulid::Ulid;

use crate::error::{EntityKind, Error, Result};
use crate::index::{OrderedIds, Snapshot};
use crate::types::{ChangeEntry, ChangeReport, PairPlan, PlannedAdd, PlannedRemoval, RemovalFailure, SyncPlan};

/// Configuration for the reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Upper bound on member listings fetched at the same time.
    pub max_concurrent_fetches: usize,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 4,
        }
    }
}

impl ReconcilerConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] when `max_concurrent_fetches` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_fetches == 0 {
            return Err(Error::invalid_config("max_concurrent_fetches must be greater than zero"));
        }
        Ok(())
    }
}

/// Converges room membership to directory group membership.
///
/// A run reads everything first ([`Reconciler::snapshot`]), computes the
/// whole change set ([`Reconciler::plan`]) and only then mutates
/// ([`Reconciler::apply`]). An unknown group or room therefore fails the run
/// before any membership is touched.
pub struct Reconciler {
    directory: Arc<dyn Directory>,
    config: ReconcilerConfig,
}

impl Reconciler {
    /// Create a new reconciler.
    pub fn new(directory: Arc<dyn Directory>, config: ReconcilerConfig) -> Self {
        Self { directory, config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Run one full reconciliation of `mapping`.
    ///
    /// # Errors
    ///
    /// - [`Error::FetchFailed`] when a listing fails; nothing was mutated.
    /// - [`Error::UnresolvedMapping`] when a mapped name is unknown; nothing
    ///   was mutated.
    /// - [`Error::MembershipMutation`] when an add fails; changes applied
    ///   before it stay applied.
    pub async fn run(&self, mapping: &GroupRoomMapping) -> Result<ChangeReport> {
        let run_id = Ulid::new();
        let span = info_span!("reconcile", %run_id);

        async move {
            let report = ChangeReport::new(run_id);
            info!(pairs = mapping.len(), "Starting reconciliation");

            let plan = self.plan_only(mapping).await?;
            let report = self.apply(&plan, report).await?;

            info!(
                added = report.added.len(),
                removed = report.removed.len(),
                failed_removals = report.failed_removals.len(),
                "Reconciliation complete"
            );
            Ok(report)
        }
        .instrument(span)
        .await
    }

    /// Read and diff without mutating anything.
    ///
    /// # Errors
    ///
    /// Same read and resolution errors as [`Reconciler::run`].
    pub async fn plan_only(&self, mapping: &GroupRoomMapping) -> Result<SyncPlan> {
        for room in mapping.shared_rooms() {
            warn!(room, "Room is mapped from several groups; each pair removes the others' members");
        }

        let snapshot = self.snapshot(mapping).await?;
        let plan = Self::plan(mapping, &snapshot)?;
        debug!(
            to_add = plan.add_count(),
            to_remove = plan.remove_count(),
            "Computed plan"
        );
        Ok(plan)
    }

    /// Fetch and index the groups and rooms named in `mapping`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FetchFailed`] naming the listing that failed.
    pub async fn snapshot(&self, mapping: &GroupRoomMapping) -> Result<Snapshot> {
        let directory = &self.directory;
        let limit = self.config.max_concurrent_fetches.max(1);

        let (groups, rooms) = futures::try_join!(
            async {
                directory
                    .list_groups()
                    .await
                    .map_err(|e| Error::fetch_failed("groups", e))
            },
            async {
                directory
                    .list_rooms()
                    .await
                    .map_err(|e| Error::fetch_failed("rooms", e))
            },
        )?;

        let mut snapshot = Snapshot::new();

        let affected_rooms = mapping.affected_rooms();
        rooms
            .iter()
            .filter(|room| affected_rooms.contains(room.title.as_str()))
            .for_each(|room| snapshot.rooms.record_room(room));

        let affected_groups = mapping.affected_groups();
        groups
            .iter()
            .filter(|group| affected_groups.contains(group.display_name.as_str()))
            .for_each(|group| snapshot.groups.record_group(group));

        let room_ids: Vec<String> = snapshot.rooms.room_ids().map(str::to_string).collect();
        let memberships: Vec<_> = stream::iter(room_ids)
            .map(|room_id| async move {
                let memberships = directory
                    .list_room_memberships(&room_id)
                    .await
                    .map_err(|e| Error::fetch_failed(format!("memberships of room {room_id}"), e))?;
                Ok::<_, Error>((room_id, memberships))
            })
            .buffered(limit)
            .try_collect()
            .await?;

        for (room_id, room_memberships) in memberships {
            debug!(room_id = %room_id, count = room_memberships.len(), "Indexed room memberships");
            for membership in room_memberships {
                snapshot.rooms.record_membership(&room_id, membership);
            }
        }

        let group_ids: Vec<String> = snapshot.groups.group_ids().map(str::to_string).collect();
        let members: Vec<_> = stream::iter(group_ids)
            .map(|group_id| async move {
                let members = directory
                    .list_group_members(&group_id)
                    .await
                    .map_err(|e| Error::fetch_failed(format!("members of group {group_id}"), e))?;
                Ok::<_, Error>((group_id, members))
            })
            .buffered(limit)
            .try_collect()
            .await?;

        for (group_id, group_members) in members {
            debug!(group_id = %group_id, count = group_members.len(), "Indexed group members");
            for member in group_members {
                snapshot.groups.record_member(&group_id, member);
            }
        }

        Ok(snapshot)
    }

    /// Diff every pair of `mapping` against `snapshot`.
    ///
    /// Pure: no directory calls. Fails on the first pair, in mapping order,
    /// whose group or room is missing from the snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnresolvedMapping`].
    pub fn plan(mapping: &GroupRoomMapping, snapshot: &Snapshot) -> Result<SyncPlan> {
        let pairs = mapping
            .iter()
            .map(|pair| plan_pair(pair, snapshot))
            .collect::<Result<Vec<_>>>()?;
        Ok(SyncPlan { pairs })
    }

    /// Apply `plan` in order, recording into `report`.
    ///
    /// Within a pair adds run before removals. A failed add stops the run; a
    /// failed removal is recorded and the run continues.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MembershipMutation`] for the first failed add.
    pub async fn apply(&self, plan: &SyncPlan, mut report: ChangeReport) -> Result<ChangeReport> {
        for pair in &plan.pairs {
            if pair.is_empty() {
                debug!(group = %pair.group, room = %pair.room, "Already in sync");
                continue;
            }

            for add in &pair.to_add {
                let membership_id = self
                    .directory
                    .add_membership(&pair.room_id, &add.member_id)
                    .await
                    .map_err(|e| {
                        Error::membership_mutation(&pair.group, &pair.room, &add.member_id, &add.name, e)
                    })?;

                info!(
                    name = %add.name,
                    room = %pair.room,
                    membership_id = %membership_id,
                    "Added member"
                );
                report
                    .added
                    .push(ChangeEntry::new(&add.name, &pair.room, membership_id));
            }

            for removal in &pair.to_remove {
                let reason = match self.directory.remove_membership(&removal.membership_id).await {
                    Ok(status) if status.is_deleted() => {
                        info!(
                            name = %removal.name,
                            room = %pair.room,
                            membership_id = %removal.membership_id,
                            "Removed member"
                        );
                        report.removed.push(ChangeEntry::new(
                            &removal.name,
                            &pair.room,
                            &removal.membership_id,
                        ));
                        continue;
                    }
                    Ok(status) => format!("HTTP {}", status.status_code),
                    Err(e) => e.to_string(),
                };

                warn!(
                    name = %removal.name,
                    room = %pair.room,
                    membership_id = %removal.membership_id,
                    reason = %reason,
                    "Failed to remove member"
                );
                report.failed_removals.push(RemovalFailure {
                    name: removal.name.clone(),
                    room: pair.room.clone(),
                    membership_id: removal.membership_id.clone(),
                    reason,
                });
            }
        }

        Ok(report.finish())
    }
}

fn plan_pair(pair: &MappingPair, snapshot: &Snapshot) -> Result<PairPlan> {
    let group_id = snapshot
        .groups
        .group_id(&pair.group)
        .ok_or_else(|| Error::unresolved(EntityKind::Group, pair))?;
    let room_id = snapshot
        .rooms
        .room_id(&pair.room)
        .ok_or_else(|| Error::unresolved(EntityKind::Room, pair))?;

    let none = OrderedIds::new();
    let members = snapshot.groups.members(group_id).unwrap_or(&none);
    let occupants = snapshot.rooms.occupants(room_id).unwrap_or(&none);

    let to_add = members
        .difference(occupants)
        .map(|member_id| PlannedAdd {
            member_id: member_id.to_string(),
            name: snapshot
                .groups
                .display_name(member_id)
                .unwrap_or_default()
                .to_string(),
        })
        .collect();

    let to_remove = occupants
        .difference(members)
        .filter_map(|person_id| {
            let Some(membership_id) = snapshot.rooms.membership_id(person_id, room_id) else {
                warn!(person_id, room = %pair.room, "Occupant has no membership record, skipping");
                return None;
            };
            Some(PlannedRemoval {
                person_id: person_id.to_string(),
                name: snapshot
                    .rooms
                    .display_name(person_id)
                    .unwrap_or_default()
                    .to_string(),
                membership_id: membership_id.to_string(),
            })
        })
        .collect();

    Ok(PairPlan {
        group: pair.group.clone(),
        room: pair.room.clone(),
        group_id: group_id.to_string(),
        room_id: room_id.to_string(),
        to_add,
        to_remove,
    })
}

/// Builder for Reconciler.
pub struct ReconcilerBuilder {
    directory: Option<Arc<dyn Directory>>,
    config: ReconcilerConfig,
}

impl ReconcilerBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            directory: None,
            config: ReconcilerConfig::default(),
        }
    }

    /// Set the directory client.
    #[must_use]
    pub fn with_directory(mut self, directory: Arc<dyn Directory>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Set the configuration.
    #[must_use]
    pub fn with_config(mut self, config: ReconcilerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the fetch concurrency.
    #[must_use]
    pub fn max_concurrent_fetches(mut self, max: usize) -> Self {
        self.config.max_concurrent_fetches = max;
        self
    }

    /// Build the reconciler.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] without a directory or with an
    /// invalid configuration.
    pub fn build(self) -> Result<Reconciler> {
        let directory = self
            .directory
            .ok_or_else(|| Error::invalid_config("a directory client is required"))?;
        self.config.validate()?;

        Ok(Reconciler::new(directory, self.config))
    }
}

impl Default for ReconcilerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
