use chrono::{DateTime, Utc};

/// One assistant response and its token accounting, as read from a log line.
#[derive(Clone, Debug, PartialEq)]
pub struct LogEntry {
    pub ts: DateTime<Utc>,
    /// File stem of the log the entry came from
    pub session_id: String,
    /// Normalized model id (date suffix stripped)
    pub model: String,
    pub input: u64,
    pub output: u64,
    pub cache_create: u64,
    pub cache_read: u64,
    /// Cost recorded by the assistant itself, strictly positive when present
    pub cost_usd: Option<f64>,
    /// `message_id:request_id`
    pub dedup_key: String,
}
