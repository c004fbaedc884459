//! The group-to-room mapping.
//!
//! A mapping is an ordered list of `(group, room)` pairs loaded from a
//! two-column CSV file:
//!
//! ```text
//! group,room
//! Engineering,Eng Room
//! Sales,Sales Floor
//! ```
//!
//! Group names are unique; a group feeds at most one room. Pair order is the
//! order in which the reconciler processes them.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const GROUP_COLUMN: &str = "group";
const ROOM_COLUMN: &str = "room";

/// UTF-8 BOM bytes.
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// One `(group, room)` row of the mapping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MappingPair {
    /// Display name of the directory group.
    pub group: String,
    /// Title of the room whose membership follows the group.
    pub room: String,
}

impl MappingPair {
    /// Create a new pair.
    pub fn new(group: impl Into<String>, room: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            room: room.into(),
        }
    }
}

/// Ordered set of `(group, room)` pairs, unique by group name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRoomMapping {
    pairs: Vec<MappingPair>,
}

impl GroupRoomMapping {
    /// Build a mapping from pairs, rejecting duplicate group names.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateGroup`] when a group name repeats; `line` is
    /// the 1-based position of the offending pair.
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = MappingPair>,
    {
        let mut mapping = Self::default();
        for (line, pair) in (1u64..).zip(pairs) {
            mapping.push(pair, line)?;
        }
        Ok(mapping)
    }

    /// Load a mapping from a CSV file on disk.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or its contents are not a valid
    /// mapping (see [`GroupRoomMapping::from_csv_reader`]).
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|e| Error::file_read_failed(path, e.to_string()))?;
        Self::from_csv_reader(data.as_slice())
    }

    /// Parse a mapping from CSV data.
    ///
    /// The header row must contain `group` and `room` columns, in any order;
    /// other columns are ignored. Cells are trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingColumn`] for a missing header,
    /// [`Error::InvalidRecord`] for a row with an empty cell, and
    /// [`Error::DuplicateGroup`] for a repeated group name.
    pub fn from_csv_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        let data = data.strip_prefix(UTF8_BOM).unwrap_or(data.as_slice());

        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(data);

        let headers = csv_reader.headers()?.clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .ok_or_else(|| Error::missing_column(name))
        };
        let group_idx = column(GROUP_COLUMN)?;
        let room_idx = column(ROOM_COLUMN)?;

        let mut mapping = Self::default();
        for record in csv_reader.records() {
            let record = record?;
            let line = record.position().map_or(0, csv::Position::line);

            let group = record.get(group_idx).unwrap_or_default();
            let room = record.get(room_idx).unwrap_or_default();
            if group.is_empty() {
                return Err(Error::invalid_record(line, "empty group name"));
            }
            if room.is_empty() {
                return Err(Error::invalid_record(line, "empty room name"));
            }

            mapping.push(MappingPair::new(group, room), line)?;
        }

        tracing::debug!(pairs = mapping.len(), "Loaded group-to-room mapping");
        Ok(mapping)
    }

    fn push(&mut self, pair: MappingPair, line: u64) -> Result<()> {
        if self.room_for(&pair.group).is_some() {
            return Err(Error::duplicate_group(pair.group, line));
        }
        self.pairs.push(pair);
        Ok(())
    }

    /// Iterate over the pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = &MappingPair> {
        self.pairs.iter()
    }

    /// The room a group is mapped to, if any.
    pub fn room_for(&self, group: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|p| p.group == group)
            .map(|p| p.room.as_str())
    }

    /// Names of all groups named in the mapping.
    pub fn affected_groups(&self) -> HashSet<&str> {
        self.pairs.iter().map(|p| p.group.as_str()).collect()
    }

    /// Titles of all rooms named in the mapping.
    pub fn affected_rooms(&self) -> HashSet<&str> {
        self.pairs.iter().map(|p| p.room.as_str()).collect()
    }

    /// Rooms that more than one group feeds.
    ///
    /// Such rooms are reconciled once per group, in mapping order, and the
    /// last group wins. Callers usually warn about them.
    pub fn shared_rooms(&self) -> Vec<&str> {
        self.pairs
            .iter()
            .map(|p| p.room.as_str())
            .duplicates()
            .collect_vec()
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether the mapping has no pairs.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<'a> IntoIterator for &'a GroupRoomMapping {
    type Item = &'a MappingPair;
    type IntoIter = std::slice::Iter<'a, MappingPair>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.iter()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use super::*;

    #[test]
    fn test_parse_simple_mapping() {
        let csv = "group,room\nEngineering,Eng Room\nSales,Sales Floor\n";
        let mapping = GroupRoomMapping::from_csv_reader(csv.as_bytes()).unwrap();

        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.room_for("Engineering"), Some("Eng Room"));
        assert_eq!(mapping.room_for("Sales"), Some("Sales Floor"));
        let groups: Vec<_> = mapping.iter().map(|p| p.group.as_str()).collect();
        assert_eq!(groups, vec!["Engineering", "Sales"]);
    }

    #[test]
    fn test_header_order_and_extra_columns() {
        let csv = "room,notes,group\nEng Room,primary,Engineering\n";
        let mapping = GroupRoomMapping::from_csv_reader(csv.as_bytes()).unwrap();

        assert_eq!(mapping.room_for("Engineering"), Some("Eng Room"));
    }

    #[test]
    fn test_utf8_bom_and_whitespace() {
        let mut data = UTF8_BOM.to_vec();
        data.extend_from_slice(b"group , room\n  Engineering ,  Eng Room \n");
        let mapping = GroupRoomMapping::from_csv_reader(data.as_slice()).unwrap();

        assert_eq!(mapping.room_for("Engineering"), Some("Eng Room"));
    }

    #[test]
    fn test_quoted_names_with_commas() {
        let csv = "group,room\n\"Research, Applied\",\"Lab, West\"\n";
        let mapping = GroupRoomMapping::from_csv_reader(csv.as_bytes()).unwrap();

        assert_eq!(mapping.room_for("Research, Applied"), Some("Lab, West"));
    }

    #[test]
    fn test_missing_room_column() {
        let csv = "group,space\nEngineering,Eng Room\n";
        let err = GroupRoomMapping::from_csv_reader(csv.as_bytes()).unwrap_err();

        assert!(matches!(err, Error::MissingColumn { ref column } if column == "room"));
    }

    #[test]
    fn test_duplicate_group_rejected() {
        let csv = "group,room\nEngineering,Eng Room\nEngineering,Other Room\n";
        let err = GroupRoomMapping::from_csv_reader(csv.as_bytes()).unwrap_err();

        assert!(matches!(err, Error::DuplicateGroup { ref group, line: 3 } if group == "Engineering"));
    }

    #[test]
    fn test_empty_cell_rejected() {
        let csv = "group,room\nEngineering,\n";
        let err = GroupRoomMapping::from_csv_reader(csv.as_bytes()).unwrap_err();

        assert!(matches!(err, Error::InvalidRecord { line: 2, .. }));
    }

    #[test]
    fn test_from_pairs_and_affected_sets() {
        let mapping = GroupRoomMapping::from_pairs([
            MappingPair::new("Engineering", "Eng Room"),
            MappingPair::new("Platform", "Eng Room"),
            MappingPair::new("Sales", "Sales Floor"),
        ])
        .unwrap();

        assert_eq!(mapping.affected_groups().len(), 3);
        assert_eq!(mapping.affected_rooms().len(), 2);
        assert_eq!(mapping.shared_rooms(), vec!["Eng Room"]);
    }

    #[test]
    fn test_from_pairs_duplicate() {
        let err = GroupRoomMapping::from_pairs([
            MappingPair::new("Engineering", "Eng Room"),
            MappingPair::new("Engineering", "Other"),
        ])
        .unwrap_err();

        assert!(matches!(err, Error::DuplicateGroup { line: 2, .. }));
    }
}
