use chrono::{DateTime, Utc, Weekday};
use std::path::PathBuf;

use crate::models::SubscriptionPlan;

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanArg {
    Free,
    Pro,
    Max5x,
    Max20x,
    Team,
    TeamPremium,
}

impl From<PlanArg> for SubscriptionPlan {
    fn from(p: PlanArg) -> Self {
        match p {
            PlanArg::Free => SubscriptionPlan::Free,
            PlanArg::Pro => SubscriptionPlan::Pro,
            PlanArg::Max5x => SubscriptionPlan::Max5x,
            PlanArg::Max20x => SubscriptionPlan::Max20x,
            PlanArg::Team => SubscriptionPlan::Team,
            PlanArg::TeamPremium => SubscriptionPlan::TeamPremium,
        }
    }
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetClockArg {
    /// Weekly reset day/hour are local wall-clock time
    Local,
    /// Weekly reset day/hour are UTC
    Utc,
}

fn parse_weekday(s: &str) -> Result<Weekday, String> {
    s.parse::<Weekday>()
        .map_err(|_| format!("expected a weekday like mon or monday, got {s:?}"))
}

fn parse_instant(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp: {e}"))
}

#[derive(clap::Parser, Debug, Default)]
#[command(about = "Local usage accounting and plan-limit projection for Claude Code logs")]
pub struct Args {
    /// Force Claude data path(s), comma-separated. Defaults to ~/.claude and ~/.config/claude
    #[arg(long, env = "CLAUDE_CONFIG_DIR")]
    pub claude_config_dir: Option<String>,

    /// Settings file (JSON). Defaults to the platform config dir
    #[arg(long, env = "CLAUDE_USAGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Emit JSON instead of colored text
    #[arg(long)]
    pub json: bool,

    /// Subscription plan (overrides settings)
    #[arg(long, value_enum)]
    pub plan: Option<PlanArg>,

    /// Session budget in usage-weight dollars (overrides plan default)
    #[arg(long)]
    pub session_budget: Option<f64>,

    /// Weekly all-models budget in usage-weight dollars
    #[arg(long)]
    pub weekly_budget: Option<f64>,

    /// Weekly Sonnet-only budget in usage-weight dollars
    #[arg(long)]
    pub weekly_sonnet_budget: Option<f64>,

    /// Monthly overage spending ceiling in USD
    #[arg(long)]
    pub monthly_limit: Option<f64>,

    /// Day the weekly limits reset (mon..sun)
    #[arg(long, value_parser = parse_weekday)]
    pub weekly_reset_day: Option<Weekday>,

    /// Hour (0-23) the weekly limits reset
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..24))]
    pub weekly_reset_hour: Option<u32>,

    /// Clock the weekly reset day/hour refer to
    #[arg(long, value_enum)]
    pub reset_clock: Option<ResetClockArg>,

    /// Pin the current session's reset instant (RFC 3339)
    #[arg(long, value_parser = parse_instant)]
    pub session_reset_at: Option<DateTime<Utc>>,

    /// Keep running and refresh on an interval; press Enter to refresh now
    #[arg(long)]
    pub watch: bool,

    /// Refresh interval in seconds for --watch (overrides settings)
    #[arg(long)]
    pub interval: Option<u64>,

    /// Debug mode: verbose logging to stderr
    #[arg(long, env = "CLAUDE_DEBUG")]
    pub debug: bool,
}

impl Args {
    pub fn parse() -> Self {
        <Args as clap::Parser>::parse()
    }
}
