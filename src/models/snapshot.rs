use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::entry::LogEntry;
use crate::models::tokens::TokenBreakdown;

/// Deduplicated entries of one window plus the aggregates derived while reading them.
#[derive(Clone, Debug, Default)]
pub struct ScanResult {
    pub entries: Vec<LogEntry>,
    pub totals: TokenBreakdown,
    pub by_model: BTreeMap<String, TokenBreakdown>,
    pub session_count: usize,
    /// Mirrors `session_count`; both are derived from per-file identifiers
    pub project_count: usize,
    pub files_scanned: usize,
}

impl ScanResult {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Output of one refresh cycle for "today" (UTC calendar day).
#[derive(Clone, Debug, Serialize)]
pub struct UsageSnapshot {
    pub captured_at: DateTime<Utc>,
    pub today: TokenBreakdown,
    /// Display-priced cost of today's entries
    pub today_cost: f64,
    pub by_model: BTreeMap<String, TokenBreakdown>,
    pub session_count: usize,
    pub project_count: usize,
    pub entry_count: usize,
}
