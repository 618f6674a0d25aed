//! Subscription tiers and their default budgets.
//!
//! Session and weekly budgets are expressed in internal compute-cost dollars
//! (the usage-weight pricing table), not in published API dollars. The daily
//! budget is an API-equivalent estimate used as the monthly overage baseline.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionPlan {
    Free,
    #[default]
    Pro,
    Max5x,
    Max20x,
    Team,
    TeamPremium,
}

/// Static row of plan constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanSpec {
    pub label: &'static str,
    pub monthly_price: f64,
    pub daily_budget: f64,
    pub session_budget: f64,
    pub weekly_budget: f64,
    pub weekly_sonnet_budget: f64,
}

const PLAN_TABLE: &[(SubscriptionPlan, PlanSpec)] = &[
    (
        SubscriptionPlan::Free,
        PlanSpec {
            label: "Free",
            monthly_price: 0.0,
            daily_budget: 0.0,
            session_budget: 1.5,
            weekly_budget: 10.0,
            weekly_sonnet_budget: 10.0,
        },
    ),
    (
        SubscriptionPlan::Pro,
        PlanSpec {
            label: "Pro",
            monthly_price: 20.0,
            daily_budget: 5.0,
            session_budget: 7.0,
            weekly_budget: 50.0,
            weekly_sonnet_budget: 40.0,
        },
    ),
    (
        SubscriptionPlan::Max5x,
        PlanSpec {
            label: "Max 5x",
            monthly_price: 100.0,
            daily_budget: 25.0,
            session_budget: 35.0,
            weekly_budget: 250.0,
            weekly_sonnet_budget: 200.0,
        },
    ),
    (
        SubscriptionPlan::Max20x,
        PlanSpec {
            label: "Max 20x",
            monthly_price: 200.0,
            daily_budget: 100.0,
            session_budget: 140.0,
            weekly_budget: 1000.0,
            weekly_sonnet_budget: 800.0,
        },
    ),
    (
        SubscriptionPlan::Team,
        PlanSpec {
            label: "Team",
            monthly_price: 30.0,
            daily_budget: 7.5,
            session_budget: 9.0,
            weekly_budget: 65.0,
            weekly_sonnet_budget: 50.0,
        },
    ),
    (
        SubscriptionPlan::TeamPremium,
        PlanSpec {
            label: "Team Premium",
            monthly_price: 150.0,
            daily_budget: 37.5,
            session_budget: 45.0,
            weekly_budget: 325.0,
            weekly_sonnet_budget: 260.0,
        },
    ),
];

impl SubscriptionPlan {
    pub const ALL: [SubscriptionPlan; 6] = [
        Self::Free,
        Self::Pro,
        Self::Max5x,
        Self::Max20x,
        Self::Team,
        Self::TeamPremium,
    ];

    pub fn spec(&self) -> &'static PlanSpec {
        PLAN_TABLE
            .iter()
            .find(|(plan, _)| plan == self)
            .map(|(_, spec)| spec)
            // every variant has a row; Pro is the first non-free tier
            .unwrap_or(&PLAN_TABLE[1].1)
    }

    pub fn label(&self) -> &'static str {
        self.spec().label
    }
}
