//! # Window Module
//!
//! Handles the time windows behind each limit: the 5-hour usage session,
//! the weekly reset clock, and the UTC calendar month.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use std::fmt::Display;

use crate::models::{LogEntry, SessionSource};
use crate::utils::{SESSION_LOOKBACK_HOURS, WINDOW_DURATION_HOURS};

/// The current 5-hour session `[start, resets_at)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionWindow {
    pub start: DateTime<Utc>,
    pub resets_at: DateTime<Utc>,
    pub source: SessionSource,
}

pub fn session_duration() -> Duration {
    Duration::hours(WINDOW_DURATION_HOURS)
}

/// Infer where the current session began from gaps in recent activity.
///
/// Walks entries from the last [`SESSION_LOOKBACK_HOURS`] in time order; any
/// gap of at least one session duration starts a new session at the later
/// entry. Shorter gaps, however bursty, stay in the same session.
pub fn detect_session_start(entries: &[LogEntry], now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let lookback = now - Duration::hours(SESSION_LOOKBACK_HOURS);
    let mut stamps: Vec<DateTime<Utc>> = entries
        .iter()
        .map(|e| e.ts)
        .filter(|ts| *ts >= lookback && *ts <= now)
        .collect();
    stamps.sort();

    let mut start = *stamps.first()?;
    for pair in stamps.windows(2) {
        if pair[1] - pair[0] >= session_duration() {
            start = pair[1];
        }
    }
    Some(start)
}

/// Resolve the session window: a pinned reset still in the future wins,
/// then a detected boundary whose reset is still ahead, then a rolling
/// window centred on `now`.
pub fn resolve_session_window(
    entries: &[LogEntry],
    pinned_reset: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> SessionWindow {
    if let Some(reset) = pinned_reset.filter(|r| *r > now) {
        return SessionWindow {
            start: reset - session_duration(),
            resets_at: reset,
            source: SessionSource::Pinned,
        };
    }
    if let Some(start) = detect_session_start(entries, now) {
        let resets_at = start + session_duration();
        if resets_at > now {
            return SessionWindow {
                start,
                resets_at,
                source: SessionSource::Detected,
            };
        }
    }
    // Rolling fallback: the reset stays one full duration away on every refresh.
    SessionWindow {
        start: now - session_duration(),
        resets_at: now + session_duration(),
        source: SessionSource::Rolling,
    }
}

/// Most recent instant at or before `now` that falls on `reset_day` at
/// `reset_hour:00` in `tz`.
pub fn weekly_window_start<Tz: TimeZone>(
    now: DateTime<Utc>,
    reset_day: Weekday,
    reset_hour: u32,
    tz: &Tz,
) -> DateTime<Utc> {
    let local = now.with_timezone(tz);
    let days_back =
        (local.weekday().num_days_from_monday() + 7 - reset_day.num_days_from_monday()) % 7;
    let date = local.date_naive() - Duration::days(days_back as i64);
    let candidate = local_hour_to_utc(tz, date, reset_hour);
    if candidate > now {
        local_hour_to_utc(tz, date - Duration::days(7), reset_hour)
    } else {
        candidate
    }
}

/// The reset that closes the week opened at `start`: the same weekday and
/// hour one week later on the wall clock of `tz`, so a DST change inside the
/// week does not shift it.
pub fn next_weekly_reset<Tz: TimeZone>(
    start: DateTime<Utc>,
    reset_hour: u32,
    tz: &Tz,
) -> DateTime<Utc> {
    let date = start.with_timezone(tz).date_naive() + Duration::days(7);
    local_hour_to_utc(tz, date, reset_hour)
}

fn local_hour_to_utc<Tz: TimeZone>(tz: &Tz, date: NaiveDate, hour: u32) -> DateTime<Utc> {
    let time = NaiveTime::from_hms_opt(hour.min(23), 0, 0).unwrap_or(NaiveTime::MIN);
    let naive = date.and_time(time);
    tz.from_local_datetime(&naive)
        .earliest()
        // the hour was skipped by a DST change; use the first valid hour after it
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}

pub fn day_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

pub fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(now.year(), now.month(), 1)
        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
        .unwrap_or_else(|| day_start(now))
}

pub fn next_month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let start = month_start(now);
    start
        .checked_add_months(Months::new(1))
        .unwrap_or(start + Duration::days(31))
}

/// Whole days since the start of the month, at least one.
pub fn elapsed_month_days(now: DateTime<Utc>) -> i64 {
    (now - month_start(now)).num_days().max(1)
}

/// "2h 5m" until `resets_at`, "0h 0m" once it has passed.
pub fn format_remaining(resets_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (resets_at - now).num_seconds().max(0);
    format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
}

/// "Resets Mon 9am" in the reset clock's zone.
pub fn format_weekly_reset<Tz>(resets_at: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!("Resets {}", resets_at.with_timezone(tz).format("%a %-I%P"))
}

pub fn format_monthly_reset(resets_at: DateTime<Utc>) -> String {
    format!("Resets {}", resets_at.format("%b %-d"))
}

/// Extrapolate `cost` accrued since `start` to `resets_at` at the same rate.
pub fn project_to_reset(
    cost: f64,
    start: DateTime<Utc>,
    resets_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Option<f64> {
    let elapsed = (now - start).num_seconds();
    if elapsed < 60 {
        return None;
    }
    let remaining = (resets_at - now).num_seconds().max(0);
    let per_sec = cost / elapsed as f64;
    Some(cost + per_sec * remaining as f64)
}
