//! # Pricing Module
//!
//! Model rates and cost calculation.
//!
//! ## Pricing Structure
//!
//! Each model has per-million-token rates for:
//! - Input tokens
//! - Output tokens
//! - Cache creation (1.25x input price)
//! - Cache reads (0.1x input price)
//!
//! Two tables exist. The display table follows published API prices. The
//! usage-weight table is what plan limits are measured in: it matches the
//! display table except for the current opus generation, which is still
//! weighted at the pre-price-cut rate.

use std::collections::BTreeMap;

use crate::models::{LogEntry, TokenBreakdown};

const PER_MILLION: f64 = 1_000_000.0;

pub const FLAGSHIP_OPUS: &str = "claude-opus-4-6";
pub const FLAGSHIP_SONNET: &str = "claude-sonnet-4-5";
pub const FLAGSHIP_HAIKU: &str = "claude-haiku-4-5";

/// USD per million tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelRates {
    pub input: f64,
    pub output: f64,
    pub cache_create: f64,
    pub cache_read: f64,
}

impl ModelRates {
    pub fn cost(&self, tokens: &TokenBreakdown) -> f64 {
        (tokens.input as f64 * self.input
            + tokens.output as f64 * self.output
            + tokens.cache_create as f64 * self.cache_create
            + tokens.cache_read as f64 * self.cache_read)
            / PER_MILLION
    }
}

const OPUS_LEGACY: ModelRates = ModelRates {
    input: 15.0,
    output: 75.0,
    cache_create: 18.75,
    cache_read: 1.5,
};
const OPUS_CURRENT: ModelRates = ModelRates {
    input: 5.0,
    output: 25.0,
    cache_create: 6.25,
    cache_read: 0.5,
};
const SONNET: ModelRates = ModelRates {
    input: 3.0,
    output: 15.0,
    cache_create: 3.75,
    cache_read: 0.3,
};
const HAIKU_4: ModelRates = ModelRates {
    input: 1.0,
    output: 5.0,
    cache_create: 1.25,
    cache_read: 0.1,
};
const HAIKU_3_5: ModelRates = ModelRates {
    input: 0.8,
    output: 4.0,
    cache_create: 1.0,
    cache_read: 0.08,
};
const HAIKU_3: ModelRates = ModelRates {
    input: 0.25,
    output: 1.25,
    cache_create: 0.3125,
    cache_read: 0.025,
};

// Ordered: longer keys precede the keys they extend, so prefix lookup
// finds the most specific row first.
const DISPLAY_TABLE: &[(&str, ModelRates)] = &[
    ("claude-opus-4-6", OPUS_CURRENT),
    ("claude-opus-4-5", OPUS_CURRENT),
    ("claude-opus-4-1", OPUS_LEGACY),
    ("claude-opus-4", OPUS_LEGACY),
    ("claude-sonnet-4-5", SONNET),
    ("claude-sonnet-4", SONNET),
    ("claude-3-7-sonnet", SONNET),
    ("claude-3-5-sonnet", SONNET),
    ("claude-haiku-4-5", HAIKU_4),
    ("claude-3-5-haiku", HAIKU_3_5),
    ("claude-3-haiku", HAIKU_3),
];

const USAGE_WEIGHT_TABLE: &[(&str, ModelRates)] = &[
    ("claude-opus-4-6", OPUS_LEGACY),
    ("claude-opus-4-5", OPUS_LEGACY),
    ("claude-opus-4-1", OPUS_LEGACY),
    ("claude-opus-4", OPUS_LEGACY),
    ("claude-sonnet-4-5", SONNET),
    ("claude-sonnet-4", SONNET),
    ("claude-3-7-sonnet", SONNET),
    ("claude-3-5-sonnet", SONNET),
    ("claude-haiku-4-5", HAIKU_4),
    ("claude-3-5-haiku", HAIKU_3_5),
    ("claude-3-haiku", HAIKU_3),
];

/// Which rate table a cost is computed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PricingTable {
    /// Published API prices, shown to the user as spend
    Display,
    /// Internal compute weighting, used for plan-limit percentages
    UsageWeight,
}

impl PricingTable {
    fn rows(&self) -> &'static [(&'static str, ModelRates)] {
        match self {
            Self::Display => DISPLAY_TABLE,
            Self::UsageWeight => USAGE_WEIGHT_TABLE,
        }
    }

    fn row(&self, key: &str) -> Option<ModelRates> {
        self.rows()
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, r)| *r)
    }

    /// Exact match, then first prefix match, then opus/haiku family
    /// heuristics, then the sonnet flagship.
    pub fn rates_for(&self, model_id: &str) -> ModelRates {
        if let Some(r) = self.row(model_id) {
            return r;
        }
        if let Some((_, r)) = self.rows().iter().find(|(k, _)| model_id.starts_with(*k)) {
            return *r;
        }
        let m = model_id.to_lowercase();
        let family = if m.contains("opus") {
            FLAGSHIP_OPUS
        } else if m.contains("haiku") {
            FLAGSHIP_HAIKU
        } else {
            FLAGSHIP_SONNET
        };
        self.row(family).unwrap_or(SONNET)
    }

    pub fn cost(&self, model_id: &str, tokens: &TokenBreakdown) -> f64 {
        self.rates_for(model_id).cost(tokens)
    }

    /// Token-based cost of a set of entries, grouped by model.
    pub fn cost_of_entries<'a, I>(&self, entries: I) -> f64
    where
        I: IntoIterator<Item = &'a LogEntry>,
    {
        tokens_by_model(entries)
            .iter()
            .map(|(model, tokens)| self.cost(model, tokens))
            .sum()
    }
}

pub fn display_cost(model_id: &str, tokens: &TokenBreakdown) -> f64 {
    PricingTable::Display.cost(model_id, tokens)
}

pub fn usage_weight_cost(model_id: &str, tokens: &TokenBreakdown) -> f64 {
    PricingTable::UsageWeight.cost(model_id, tokens)
}

fn tokens_by_model<'a, I>(entries: I) -> BTreeMap<&'a str, TokenBreakdown>
where
    I: IntoIterator<Item = &'a LogEntry>,
{
    let mut grouped: BTreeMap<&str, TokenBreakdown> = BTreeMap::new();
    for e in entries {
        let slot = grouped.entry(e.model.as_str()).or_default();
        *slot = slot.with_entry(e);
    }
    grouped
}

/// Spend at published prices. Entries that carry their own cost are summed
/// as-is; the rest are priced per model from their tokens.
pub fn total_display_cost<'a, I>(entries: I) -> f64
where
    I: IntoIterator<Item = &'a LogEntry>,
{
    let mut precomputed = 0.0;
    let mut unpriced: Vec<&LogEntry> = Vec::new();
    for e in entries {
        match e.cost_usd {
            Some(c) => precomputed += c,
            None => unpriced.push(e),
        }
    }
    precomputed + PricingTable::Display.cost_of_entries(unpriced)
}

/// Plan-limit weight of a set of entries. Always derived from tokens:
/// recorded costs are display prices and would understate the weight.
pub fn total_usage_weight_cost<'a, I>(entries: I) -> f64
where
    I: IntoIterator<Item = &'a LogEntry>,
{
    PricingTable::UsageWeight.cost_of_entries(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn tokens(input: u64, output: u64, cache_create: u64, cache_read: u64) -> TokenBreakdown {
        TokenBreakdown {
            input,
            output,
            cache_create,
            cache_read,
        }
    }

    fn entry(model: &str, input: u64, cost_usd: Option<f64>) -> LogEntry {
        LogEntry {
            ts: Utc::now(),
            session_id: "s".into(),
            model: model.into(),
            input,
            output: 0,
            cache_create: 0,
            cache_read: 0,
            cost_usd,
            dedup_key: format!("{model}:{input}"),
        }
    }

    #[test]
    fn cache_rates_follow_input_rate() {
        for table in [PricingTable::Display, PricingTable::UsageWeight] {
            for (key, r) in table.rows() {
                assert!((r.cache_create - r.input * 1.25).abs() < 1e-9, "{key}");
                assert!((r.cache_read - r.input * 0.1).abs() < 1e-9, "{key}");
            }
        }
    }

    #[test]
    fn exact_then_prefix_match() {
        let t = PricingTable::Display;
        assert_eq!(t.rates_for("claude-opus-4-1"), OPUS_LEGACY);
        assert_eq!(t.rates_for("claude-opus-4-6"), OPUS_CURRENT);
        assert_eq!(t.rates_for("claude-opus-4-6-thinking"), OPUS_CURRENT);
        assert_eq!(t.rates_for("claude-3-5-haiku-latest"), HAIKU_3_5);
    }

    #[test]
    fn family_heuristics() {
        let t = PricingTable::Display;
        assert_eq!(t.rates_for("some-future-OPUS-model"), OPUS_CURRENT);
        assert_eq!(t.rates_for("anthropic.haiku-x"), HAIKU_4);
    }

    #[test]
    fn unknown_model_uses_sonnet_in_both_tables() {
        assert_eq!(PricingTable::Display.rates_for("unknown"), SONNET);
        assert_eq!(PricingTable::UsageWeight.rates_for("gpt-5"), SONNET);
        let t = tokens(1_000_000, 0, 0, 0);
        assert_eq!(display_cost("mystery", &t), 3.0);
        assert_eq!(usage_weight_cost("mystery", &t), 3.0);
    }

    #[test]
    fn usage_weight_exceeds_display_only_for_flagship_opus() {
        let t = tokens(1_000_000, 1_000_000, 1_000_000, 1_000_000);
        assert!(usage_weight_cost(FLAGSHIP_OPUS, &t) > display_cost(FLAGSHIP_OPUS, &t));
        for model in [FLAGSHIP_SONNET, FLAGSHIP_HAIKU, "claude-opus-4-1", "claude-3-5-haiku"] {
            assert_eq!(usage_weight_cost(model, &t), display_cost(model, &t), "{model}");
        }
    }

    #[test]
    fn display_cost_formula() {
        // 1M input @3 + 0.5M output @15 + 0.2M write @3.75 + 2M read @0.3
        let t = tokens(1_000_000, 500_000, 200_000, 2_000_000);
        let c = display_cost(FLAGSHIP_SONNET, &t);
        assert!((c - (3.0 + 7.5 + 0.75 + 0.6)).abs() < 1e-9);
    }

    #[test]
    fn hybrid_total_prefers_recorded_cost() {
        let entries = vec![
            entry(FLAGSHIP_SONNET, 1_000_000, Some(0.5)),
            entry(FLAGSHIP_SONNET, 1_000_000, None),
            entry(FLAGSHIP_HAIKU, 1_000_000, None),
        ];
        let total = total_display_cost(&entries);
        assert!((total - (0.5 + 3.0 + 1.0)).abs() < 1e-9);
        // usage weight ignores the recorded cost
        let weight = total_usage_weight_cost(&entries);
        assert!((weight - (3.0 + 3.0 + 1.0)).abs() < 1e-9);
    }

    #[test]
    fn empty_sets_cost_nothing() {
        let none: Vec<LogEntry> = Vec::new();
        assert_eq!(total_display_cost(&none), 0.0);
        assert_eq!(total_usage_weight_cost(&none), 0.0);
    }
}
