pub mod entry;
pub mod limits;
pub mod plan;
pub mod snapshot;
pub mod tokens;

pub use entry::LogEntry;
pub use limits::{
    display_percent, usage_fraction, MonthlyDetail, PlanUsageLimits, SessionSource,
    UsageLimitInfo, MAX_DISPLAY_PERCENT,
};
pub use plan::{PlanSpec, SubscriptionPlan};
pub use snapshot::{ScanResult, UsageSnapshot};
pub use tokens::TokenBreakdown;
