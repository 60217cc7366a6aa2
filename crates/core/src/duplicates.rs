//! Duplicate detection against a destination's existing rows.

use crate::columns::{find_column, ColumnRules};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Separator between the parts of a composite identity key.
pub const KEY_SEPARATOR: &str = "|";

/// Which column values identify an order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityKey {
    /// The ORDER ID column alone.
    #[default]
    OrderId,
    /// ORDER ID and TRACKING ID joined with [`KEY_SEPARATOR`].
    OrderAndTracking,
}

/// Outcome of duplicate resolution, as indices into the candidate rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicatePartition {
    pub unique: Vec<usize>,
    pub duplicates: Vec<usize>,
}

/// Rows with their header row, as seen by the resolver.
#[derive(Debug, Clone, Copy)]
pub struct RowSet<'a> {
    pub headers: &'a [String],
    pub rows: &'a [Vec<String>],
}

impl<'a> RowSet<'a> {
    pub fn new(headers: &'a [String], rows: &'a [Vec<String>]) -> Self {
        Self { headers, rows }
    }
}

/// Column positions making up the identity key in one sheet.
struct KeyColumns(Vec<usize>);

impl KeyColumns {
    fn locate(headers: &[String], identity: IdentityKey, rules: &ColumnRules) -> Option<Self> {
        let order = find_column(headers, &rules.order_id)?;
        match identity {
            IdentityKey::OrderId => Some(Self(vec![order])),
            IdentityKey::OrderAndTracking => {
                let tracking = find_column(headers, &rules.tracking_id)?;
                Some(Self(vec![order, tracking]))
            }
        }
    }

    /// The row's key, or `None` when every part of it is blank.
    fn key(&self, row: &[String]) -> Option<String> {
        let parts: Vec<&str> = self
            .0
            .iter()
            .map(|&col| row.get(col).map_or("", |v| v.trim()))
            .collect();
        if parts.iter().all(|p| p.is_empty()) {
            None
        } else {
            Some(parts.join(KEY_SEPARATOR))
        }
    }
}

/// Split candidate rows into new rows and rows already present.
///
/// A candidate is a duplicate when its identity key is already known, either
/// from the existing rows or from an earlier candidate in the same batch.
/// Rows with a blank key are always new and never registered. When the
/// candidates have no identity column every row is treated as new; when only
/// the existing rows lack it, they contribute no keys.
pub fn find_duplicates(
    candidates: RowSet<'_>,
    existing: RowSet<'_>,
    identity: IdentityKey,
    rules: &ColumnRules,
) -> DuplicatePartition {
    let Some(candidate_cols) = KeyColumns::locate(candidates.headers, identity, rules) else {
        tracing::warn!(
            ?identity,
            "Identity column not found in source rows; treating every row as new"
        );
        return DuplicatePartition {
            unique: (0..candidates.rows.len()).collect(),
            duplicates: Vec::new(),
        };
    };

    let mut seen: HashSet<String> = match KeyColumns::locate(existing.headers, identity, rules) {
        Some(cols) => existing.rows.iter().filter_map(|row| cols.key(row)).collect(),
        None => {
            if !existing.rows.is_empty() {
                tracing::warn!(
                    ?identity,
                    "Identity column not found in destination rows; only checking within the batch"
                );
            }
            HashSet::new()
        }
    };

    let mut partition = DuplicatePartition::default();
    for (index, row) in candidates.rows.iter().enumerate() {
        match candidate_cols.key(row) {
            Some(key) if seen.contains(&key) => partition.duplicates.push(index),
            Some(key) => {
                seen.insert(key);
                partition.unique.push(index);
            }
            None => partition.unique.push(index),
        }
    }
    partition
}
