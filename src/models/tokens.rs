use serde::Serialize;

use crate::models::entry::LogEntry;

/// Summed token counts. Values are never mutated in place; accumulation
/// returns a new breakdown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TokenBreakdown {
    pub input: u64,
    pub output: u64,
    pub cache_create: u64,
    pub cache_read: u64,
}

impl TokenBreakdown {
    pub fn from_entry(entry: &LogEntry) -> Self {
        Self {
            input: entry.input,
            output: entry.output,
            cache_create: entry.cache_create,
            cache_read: entry.cache_read,
        }
    }

    #[must_use]
    pub fn with_entry(&self, entry: &LogEntry) -> Self {
        self.combined(&Self::from_entry(entry))
    }

    #[must_use]
    pub fn combined(&self, other: &TokenBreakdown) -> Self {
        Self {
            input: self.input.saturating_add(other.input),
            output: self.output.saturating_add(other.output),
            cache_create: self.cache_create.saturating_add(other.cache_create),
            cache_read: self.cache_read.saturating_add(other.cache_read),
        }
    }

    pub fn total_tokens(&self) -> u64 {
        self.input
            .saturating_add(self.output)
            .saturating_add(self.cache_create)
            .saturating_add(self.cache_read)
    }

    /// Cache writes plus cache reads.
    pub fn cache_tokens(&self) -> u64 {
        self.cache_create.saturating_add(self.cache_read)
    }

    /// Share of input served from cache: cache_read / (cache_read + input).
    pub fn cache_hit_rate(&self) -> f64 {
        let denom = self.cache_read as f64 + self.input as f64;
        if denom <= 0.0 {
            0.0
        } else {
            self.cache_read as f64 / denom
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_tokens() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_hit_rate_is_zero_without_input() {
        let t = TokenBreakdown {
            output: 500,
            cache_create: 100,
            ..Default::default()
        };
        assert_eq!(t.cache_hit_rate(), 0.0);
    }

    #[test]
    fn cache_hit_rate_uses_reads_over_all_input() {
        let t = TokenBreakdown {
            input: 250,
            output: 10,
            cache_create: 0,
            cache_read: 750,
        };
        assert!((t.cache_hit_rate() - 0.75).abs() < 1e-12);
        assert_eq!(t.total_tokens(), 1010);
    }

    #[test]
    fn combined_leaves_operands_untouched() {
        let a = TokenBreakdown {
            input: 1,
            output: 2,
            cache_create: 3,
            cache_read: 4,
        };
        let b = a.combined(&a);
        assert_eq!(a.input, 1);
        assert_eq!(b.input, 2);
        assert_eq!(b.cache_read, 8);
    }

    #[test]
    fn huge_counts_saturate_instead_of_overflowing() {
        let entry = LogEntry {
            ts: chrono::Utc::now(),
            session_id: "s".into(),
            model: "claude-sonnet-4-5".into(),
            input: u64::MAX,
            output: u64::MAX,
            cache_create: u64::MAX,
            cache_read: u64::MAX,
            cost_usd: None,
            dedup_key: "m:r".into(),
        };
        let t = TokenBreakdown::from_entry(&entry);
        assert_eq!(t.total_tokens(), u64::MAX);
        assert_eq!(t.cache_tokens(), u64::MAX);
        assert_eq!(t.with_entry(&entry).input, u64::MAX);
    }
}
