//! # Limits Module
//!
//! Aggregates usage into the four plan-limit categories.
//!
//! ## Categories
//!
//! - **Session**: usage-weight cost since the current 5-hour session began
//! - **Weekly (all models)**: usage-weight cost since the last weekly reset
//! - **Weekly (Sonnet)**: the same, restricted to sonnet models
//! - **Monthly overage**: display cost this UTC month beyond the plan's
//!   included daily budget, measured against the spending ceiling
//!
//! Session and weekly categories share one fetch of the current week; the
//! session is that set narrowed to the detected session start. The month is
//! fetched separately since it can start before or after the weekly window.

use anyhow::Result;
use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use std::fmt::Display;

use crate::config::{AppConfig, ResetClock};
use crate::models::{LogEntry, MonthlyDetail, PlanUsageLimits, UsageLimitInfo, UsageSnapshot};
use crate::pricing::{total_display_cost, total_usage_weight_cost};
use crate::usage::EntrySource;
use crate::window::{
    day_start, elapsed_month_days, format_monthly_reset, format_remaining, format_weekly_reset,
    month_start, next_month_start, next_weekly_reset, project_to_reset, resolve_session_window,
    session_duration, weekly_window_start, SessionWindow,
};

const SONNET_MARKER: &str = "sonnet";

/// Compute all four limit categories as of `now`.
pub fn compute_plan_limits<S>(
    source: &S,
    config: &AppConfig,
    now: DateTime<Utc>,
) -> Result<PlanUsageLimits>
where
    S: EntrySource + ?Sized,
{
    match config.reset_clock {
        ResetClock::Local => compute_in_zone(source, config, now, &Local),
        ResetClock::Utc => compute_in_zone(source, config, now, &Utc),
    }
}

fn compute_in_zone<S, Tz>(
    source: &S,
    config: &AppConfig,
    now: DateTime<Utc>,
    tz: &Tz,
) -> Result<PlanUsageLimits>
where
    S: EntrySource + ?Sized,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let weekly_start = weekly_window_start(now, config.weekly_reset_day, config.weekly_reset_hour, tz);
    let weekly_reset = next_weekly_reset(weekly_start, config.weekly_reset_hour, tz);
    let weekly = source.fetch(weekly_start, now)?.entries;

    // The session is scoped by the weekly set; activity before the weekly
    // reset never counts toward it.
    let (session, window) = session_limit(&weekly, config, now);

    let weekly_sonnet: Vec<&LogEntry> = weekly
        .iter()
        .filter(|e| e.model.to_lowercase().contains(SONNET_MARKER))
        .collect();
    let weekly_description = format_weekly_reset(weekly_reset, tz);

    let weekly_all = UsageLimitInfo {
        label: "Weekly (all models)".into(),
        cost: total_usage_weight_cost(&weekly),
        budget: config.weekly_budget(),
        reset_description: weekly_description.clone(),
        resets_at: weekly_reset,
        projected_cost: None,
    };
    let weekly_sonnet = UsageLimitInfo {
        label: "Weekly (Sonnet)".into(),
        cost: total_usage_weight_cost(weekly_sonnet.iter().copied()),
        budget: config.weekly_sonnet_budget(),
        reset_description: weekly_description,
        resets_at: weekly_reset,
        projected_cost: None,
    };

    let (monthly_overage, monthly) = monthly_limit(source, config, now)?;

    tracing::debug!(
        session = session.cost,
        weekly = weekly_all.cost,
        sonnet = weekly_sonnet.cost,
        overage = monthly_overage.cost,
        "computed plan limits"
    );

    Ok(PlanUsageLimits {
        session,
        weekly_all,
        weekly_sonnet,
        monthly_overage,
        monthly,
        plan: config.plan,
        session_source: window.source,
        session_start: window.start,
    })
}

fn session_limit(
    entries: &[LogEntry],
    config: &AppConfig,
    now: DateTime<Utc>,
) -> (UsageLimitInfo, SessionWindow) {
    let window = resolve_session_window(entries, config.session_reset_at, now);
    let cost = total_usage_weight_cost(entries.iter().filter(|e| e.ts >= window.start));
    let info = UsageLimitInfo {
        label: "Session".into(),
        cost,
        budget: config.session_budget(),
        reset_description: format_remaining(window.resets_at, now),
        resets_at: window.resets_at,
        projected_cost: project_to_reset(
            cost,
            window.start,
            window.start + session_duration(),
            now,
        ),
    };
    (info, window)
}

fn monthly_limit(
    source: &(impl EntrySource + ?Sized),
    config: &AppConfig,
    now: DateTime<Utc>,
) -> Result<(UsageLimitInfo, MonthlyDetail)> {
    let start = month_start(now);
    let month = source.fetch(start, now)?;
    let month_cost = total_display_cost(&month.entries);
    let elapsed_days = elapsed_month_days(now);
    let included_budget = config.daily_budget() * elapsed_days as f64;
    let overage = (month_cost - included_budget).max(0.0);
    let resets_at = next_month_start(now);

    let info = UsageLimitInfo {
        label: "Monthly overage".into(),
        cost: overage,
        budget: config.monthly_spending_limit,
        reset_description: format_monthly_reset(resets_at),
        resets_at,
        projected_cost: None,
    };
    let detail = MonthlyDetail {
        month_cost,
        included_budget,
        elapsed_days,
    };
    Ok((info, detail))
}

/// Token and cost totals for the current UTC calendar day.
pub fn build_snapshot<S>(source: &S, now: DateTime<Utc>) -> Result<UsageSnapshot>
where
    S: EntrySource + ?Sized,
{
    let start = day_start(now);
    let today = source.fetch(start, start + Duration::days(1))?;
    Ok(UsageSnapshot {
        captured_at: now,
        today: today.totals,
        today_cost: total_display_cost(&today.entries),
        by_model: today.by_model,
        session_count: today.session_count,
        project_count: today.project_count,
        entry_count: today.entries.len(),
    })
}
