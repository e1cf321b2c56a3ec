//! Calendar-day bucketing of activity timestamps.

use std::collections::BTreeSet;
use std::fmt;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::aggregate::timestamp::parse_instant;
use crate::error::Result;
use crate::models::ActivityLogEntry;

/// Calendar day (`YYYY-MM-DD`) that aligns every series.
///
/// The format sorts lexicographically in chronological order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BucketKey(String);

impl BucketKey {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Truncate a wire timestamp to its calendar day in `offset`.
pub fn day_key(raw: &str, offset: FixedOffset) -> Result<BucketKey> {
    let instant = parse_instant(raw)?;
    Ok(BucketKey(
        instant.with_timezone(&offset).format("%Y-%m-%d").to_string(),
    ))
}

/// Day key of an entry, or `None` (with a warning) when its timestamp is malformed.
pub(crate) fn entry_key(entry: &ActivityLogEntry, offset: FixedOffset) -> Option<BucketKey> {
    match day_key(&entry.timestamp, offset) {
        Ok(key) => Some(key),
        Err(e) => {
            tracing::warn!(entry = entry.id, project = entry.project, "skipping entry: {e}");
            None
        }
    }
}

/// Distinct day keys present in `entries`, ascending.
///
/// Entries with malformed timestamps are skipped.
pub fn bucket_keys<'a, I>(entries: I, offset: FixedOffset) -> Vec<BucketKey>
where
    I: IntoIterator<Item = &'a ActivityLogEntry>,
{
    let keys: BTreeSet<BucketKey> = entries
        .into_iter()
        .filter_map(|e| entry_key(e, offset))
        .collect();
    keys.into_iter().collect()
}
