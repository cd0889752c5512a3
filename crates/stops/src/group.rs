//! # Stop grouping
//!
//! Merges the per-direction stop records of an intersection into one
//! [`LogicalStop`].

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;
use crate::normalize::{NameKey, normalize, standardize};

/// Prefix marking a composite stop id.
pub const MULTI_PREFIX: &str = "multi:";

/// A stop as published by the agency, one per direction of travel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopRecord {
    pub id: String,
    pub location: Coordinate,
    pub name: String,
}

/// One or more [`StopRecord`]s presented to riders as a single stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogicalStop {
    /// The sole member's id, or `multi:` followed by the comma separated
    /// member ids.
    pub id: String,

    /// Mean of the member locations.
    pub location: Coordinate,

    /// Display name, standardized from the first member's name.
    pub name: String,

    /// Member stop ids, in input order. Never empty.
    pub members: Vec<String>,
}

impl LogicalStop {
    /// Build a logical stop from same-key records. Returns `None` when
    /// `records` is empty.
    #[must_use]
    pub fn from_members(records: &[StopRecord]) -> Option<Self> {
        let first = records.first()?;
        let location = Coordinate::mean(records.iter().map(|r| r.location))?;
        let members: Vec<String> = records.iter().map(|r| r.id.clone()).collect();

        let id = if members.len() == 1 {
            first.id.clone()
        } else {
            format!("{MULTI_PREFIX}{}", members.join(","))
        };

        Some(Self { id, location, name: standardize(&first.name), members })
    }

    #[must_use]
    pub fn is_composite(&self) -> bool {
        self.members.len() > 1
    }
}

/// Split a stop id into the upstream ids it stands for.
///
/// Plain ids yield themselves; composite ids yield their non-empty members.
#[must_use]
pub fn member_ids(stop_id: &str) -> Vec<&str> {
    stop_id.strip_prefix(MULTI_PREFIX).map_or_else(
        || vec![stop_id],
        |members| members.split(',').map(str::trim).filter(|id| !id.is_empty()).collect(),
    )
}

/// Partition items by the [`NameKey`] of their name.
///
/// Keys are ordered; within a key, items keep their input order.
pub fn partition<T>(
    items: impl IntoIterator<Item = T>, name: impl Fn(&T) -> &str,
) -> BTreeMap<NameKey, Vec<T>> {
    let mut groups: BTreeMap<NameKey, Vec<T>> = BTreeMap::new();
    for item in items {
        groups.entry(normalize(name(&item))).or_default().push(item);
    }
    groups
}

/// Group raw stop records into logical stops keyed by their (possibly
/// composite) id.
///
/// Records repeating an already seen stop id are dropped: the same stop is
/// listed once per route serving it. Grouping is by name alone, so two
/// distant stops sharing a name are merged.
pub fn group(records: impl IntoIterator<Item = StopRecord>) -> BTreeMap<String, LogicalStop> {
    let mut seen = HashSet::new();
    let unique = records.into_iter().filter(|r| seen.insert(r.id.clone()));

    partition(unique, |r| r.name.as_str())
        .into_values()
        .filter_map(|members| LogicalStop::from_members(&members))
        .map(|stop| (stop.id.clone(), stop))
        .collect()
}
