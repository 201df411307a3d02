//! Cache module for memoizing API responses in memory
//!
//! This module provides a process-local response cache keyed by request. Entries
//! carry the time they were computed; whether an entry is still usable is decided
//! by the reader, who supplies the freshness window for each lookup.

mod manager;

pub use manager::{CachedData, ResponseCache};
