//! Merging and ranking of records from all successful platforms.
//!
//! Records are ordered by a total order over their content, so the
//! output never depends on which platform answered first:
//!
//! 1. engagement score, descending; unscored records after all scored ones
//! 2. publication time, descending; undated records last
//! 3. `(platform, id)`, ascending
//!
//! Truncation happens once, on the ranked union, never per platform.

use std::cmp::Ordering;

use crate::types::{HighlightRecord, PlatformId};

use super::dedup::deduplicate;

/// Compare two records by rank. `Less` means `a` ranks above `b`.
pub fn rank_order(a: &HighlightRecord, b: &HighlightRecord) -> Ordering {
    let by_score = match (a.engagement_score(), b.engagement_score()) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    // `None < Some(_)`, so reversing puts undated records last.
    by_score
        .then_with(|| b.published_at().cmp(&a.published_at()))
        .then_with(|| a.key().cmp(&b.key()))
}

/// Merge per-platform record lists into one ranked list of at most `limit`.
pub fn merge(
    record_lists: Vec<(PlatformId, Vec<HighlightRecord>)>,
    limit: usize,
) -> Vec<HighlightRecord> {
    merge_records(
        record_lists.into_iter().flat_map(|(_, records)| records),
        limit,
    )
}

/// Deduplicate, rank and truncate a flat sequence of records.
pub fn merge_records(
    records: impl IntoIterator<Item = HighlightRecord>,
    limit: usize,
) -> Vec<HighlightRecord> {
    let mut ranked = deduplicate(records);
    ranked.sort_by(rank_order);
    ranked.truncate(limit);
    ranked
}
