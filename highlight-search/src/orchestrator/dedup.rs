//! Record deduplication by `(platform, id)`.
//!
//! The first occurrence of each key wins, so a platform's own result
//! order decides which copy survives. Input order is otherwise preserved.

use std::collections::HashSet;

use crate::types::{HighlightRecord, PlatformId};

/// Drop every record whose `(platform, id)` key was already seen.
pub fn deduplicate(records: impl IntoIterator<Item = HighlightRecord>) -> Vec<HighlightRecord> {
    let mut seen: HashSet<(PlatformId, String)> = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert((record.platform().clone(), record.id().to_string())))
        .collect()
}
