use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::plan::SubscriptionPlan;

/// Display percentages stop growing here.
pub const MAX_DISPLAY_PERCENT: u32 = 999;

/// One budgeted category (session, weekly, monthly overage).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UsageLimitInfo {
    pub label: String,
    pub cost: f64,
    pub budget: f64,
    pub reset_description: String,
    pub resets_at: DateTime<Utc>,
    /// Cost extrapolated to the reset instant at the current burn rate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projected_cost: Option<f64>,
}

impl UsageLimitInfo {
    /// cost / budget, unclamped; 0 when the budget is not positive.
    pub fn fraction(&self) -> f64 {
        usage_fraction(self.cost, self.budget)
    }

    pub fn percent(&self) -> u32 {
        display_percent(self.fraction())
    }

    pub fn projected_percent(&self) -> Option<u32> {
        self.projected_cost
            .map(|c| display_percent(usage_fraction(c, self.budget)))
    }
}

pub fn usage_fraction(cost: f64, budget: f64) -> f64 {
    if budget <= 0.0 || !budget.is_finite() || !cost.is_finite() {
        return 0.0;
    }
    (cost / budget).max(0.0)
}

pub fn display_percent(fraction: f64) -> u32 {
    let pct = (fraction * 100.0).floor();
    if pct.is_nan() || pct <= 0.0 {
        0
    } else if pct >= MAX_DISPLAY_PERCENT as f64 {
        MAX_DISPLAY_PERCENT
    } else {
        pct as u32
    }
}

/// How the current session window was determined.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionSource {
    /// User-pinned reset instant
    Pinned,
    /// Inferred from a gap in recent activity
    Detected,
    /// No usable boundary; window rolls with "now"
    Rolling,
}

/// Inputs behind the monthly overage figure.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MonthlyDetail {
    pub month_cost: f64,
    pub included_budget: f64,
    pub elapsed_days: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlanUsageLimits {
    pub session: UsageLimitInfo,
    pub weekly_all: UsageLimitInfo,
    pub weekly_sonnet: UsageLimitInfo,
    pub monthly_overage: UsageLimitInfo,
    pub monthly: MonthlyDetail,
    pub plan: SubscriptionPlan,
    pub session_source: SessionSource,
    pub session_start: DateTime<Utc>,
}
