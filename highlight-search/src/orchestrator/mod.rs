//! Search orchestrator: admission, concurrent fan-out, dedup, ranking.
//!
//! This module gates each platform through its rate limiter, queries the
//! admitted platforms concurrently under a per-call deadline, partitions
//! the outcomes, and merges successful records into one ranked list.

pub mod dedup;
pub mod ranking;
pub mod search;

pub use ranking::{merge, merge_records};
pub use search::SearchOrchestrator;
