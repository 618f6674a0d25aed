//! # Config Module
//!
//! User settings consumed read-only by every refresh cycle.
//!
//! Settings come from a JSON file (`config.json` in the platform config
//! directory unless `--config`/`CLAUDE_USAGE_CONFIG` points elsewhere),
//! then command-line/env overrides are applied on top. Missing fields take
//! their defaults; budget overrides left empty mean "use the plan default".

use anyhow::{Context, Result};
use chrono::{DateTime, Utc, Weekday};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::{Args, ResetClockArg};
use crate::models::SubscriptionPlan;

const MIN_REFRESH_SECS: u64 = 5;

/// Clock in which the weekly reset day/hour are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetClock {
    #[default]
    Local,
    Utc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub refresh_interval_secs: u64,
    pub plan: SubscriptionPlan,
    pub session_budget: Option<f64>,
    pub weekly_budget: Option<f64>,
    pub weekly_sonnet_budget: Option<f64>,
    pub weekly_reset_day: Weekday,
    pub weekly_reset_hour: u32,
    pub reset_clock: ResetClock,
    /// User-pinned end of the current session
    pub session_reset_at: Option<DateTime<Utc>>,
    pub monthly_spending_limit: f64,
    /// `projects` directories to scan; empty means auto-detect
    pub log_roots: Vec<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 60,
            plan: SubscriptionPlan::Pro,
            session_budget: None,
            weekly_budget: None,
            weekly_sonnet_budget: None,
            weekly_reset_day: Weekday::Mon,
            weekly_reset_hour: 9,
            reset_clock: ResetClock::Local,
            session_reset_at: None,
            monthly_spending_limit: 50.0,
            log_roots: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "claude-usage-meter").map(|d| d.config_dir().join("config.json"))
    }

    /// Load settings from `path` (or the default location). A missing file
    /// yields defaults; an unreadable or invalid one is logged and ignored.
    pub fn load(path: Option<&Path>) -> Self {
        let path = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(p) => p,
            None => return Self::default(),
        };
        if !path.is_file() {
            return Self::default();
        }
        match Self::read(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %format!("{e:#}"), "invalid config, using defaults");
                Self::default()
            }
        }
    }

    pub fn read(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::from_json_str(&data).with_context(|| format!("parse config {}", path.display()))
    }

    pub fn from_json_str(data: &str) -> Result<Self> {
        let config: AppConfig = serde_json::from_str(data)?;
        Ok(config.sanitized())
    }

    /// Clamp or drop values the engine cannot use.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        if self.weekly_reset_hour > 23 {
            tracing::warn!(hour = self.weekly_reset_hour, "weekly reset hour out of range, using 23");
            self.weekly_reset_hour = 23;
        }
        if self.refresh_interval_secs < MIN_REFRESH_SECS {
            self.refresh_interval_secs = MIN_REFRESH_SECS;
        }
        for (name, budget) in [
            ("session_budget", &mut self.session_budget),
            ("weekly_budget", &mut self.weekly_budget),
            ("weekly_sonnet_budget", &mut self.weekly_sonnet_budget),
        ] {
            if budget.is_some_and(|b| !b.is_finite() || b < 0.0) {
                tracing::warn!(field = name, "ignoring invalid budget override");
                *budget = None;
            }
        }
        if !self.monthly_spending_limit.is_finite() || self.monthly_spending_limit < 0.0 {
            self.monthly_spending_limit = Self::default().monthly_spending_limit;
        }
        self
    }

    /// Layer command-line and env overrides on top of file settings.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(p) = args.plan {
            self.plan = p.into();
        }
        if args.session_budget.is_some() {
            self.session_budget = args.session_budget;
        }
        if args.weekly_budget.is_some() {
            self.weekly_budget = args.weekly_budget;
        }
        if args.weekly_sonnet_budget.is_some() {
            self.weekly_sonnet_budget = args.weekly_sonnet_budget;
        }
        if let Some(limit) = args.monthly_limit {
            self.monthly_spending_limit = limit;
        }
        if let Some(day) = args.weekly_reset_day {
            self.weekly_reset_day = day;
        }
        if let Some(hour) = args.weekly_reset_hour {
            self.weekly_reset_hour = hour;
        }
        if let Some(clock) = args.reset_clock {
            self.reset_clock = match clock {
                ResetClockArg::Local => ResetClock::Local,
                ResetClockArg::Utc => ResetClock::Utc,
            };
        }
        if args.session_reset_at.is_some() {
            self.session_reset_at = args.session_reset_at;
        }
        if let Some(secs) = args.interval {
            self.refresh_interval_secs = secs;
        }
        let sanitized = std::mem::take(self).sanitized();
        *self = sanitized;
    }

    pub fn session_budget(&self) -> f64 {
        self.session_budget
            .unwrap_or(self.plan.spec().session_budget)
    }

    pub fn weekly_budget(&self) -> f64 {
        self.weekly_budget.unwrap_or(self.plan.spec().weekly_budget)
    }

    pub fn weekly_sonnet_budget(&self) -> f64 {
        self.weekly_sonnet_budget
            .unwrap_or(self.plan.spec().weekly_sonnet_budget)
    }

    pub fn daily_budget(&self) -> f64 {
        self.plan.spec().daily_budget
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn partial_file_keeps_defaults() {
        let c = AppConfig::from_json_str(r#"{"plan":"max5x","weekly_reset_day":"thu"}"#).unwrap();
        assert_eq!(c.plan, SubscriptionPlan::Max5x);
        assert_eq!(c.weekly_reset_day, Weekday::Thu);
        assert_eq!(c.weekly_reset_hour, 9);
        assert_eq!(c.session_budget(), SubscriptionPlan::Max5x.spec().session_budget);
    }

    #[test]
    fn overrides_replace_plan_defaults() {
        let c = AppConfig::from_json_str(
            r#"{"plan":"pro","session_budget":12.5,"weekly_budget":null}"#,
        )
        .unwrap();
        assert_eq!(c.session_budget(), 12.5);
        assert_eq!(c.weekly_budget(), SubscriptionPlan::Pro.spec().weekly_budget);
    }

    #[test]
    fn out_of_range_values_are_sanitized() {
        let c = AppConfig::from_json_str(
            r#"{"weekly_reset_hour":40,"session_budget":-1,"refresh_interval_secs":0,"monthly_spending_limit":-5}"#,
        )
        .unwrap();
        assert_eq!(c.weekly_reset_hour, 23);
        assert_eq!(c.session_budget, None);
        assert_eq!(c.refresh_interval_secs, MIN_REFRESH_SECS);
        assert_eq!(c.monthly_spending_limit, 50.0);
    }

    #[test]
    fn invalid_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(AppConfig::read(&path).is_err());
        assert_eq!(AppConfig::load(Some(&path)), AppConfig::default());
    }

    #[test]
    fn missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.json");
        assert_eq!(AppConfig::load(Some(&path)), AppConfig::default());
    }

    #[test]
    fn args_override_file() {
        let mut c = AppConfig::default();
        let args = Args {
            plan: Some(crate::cli::PlanArg::Max20x),
            monthly_limit: Some(20.0),
            reset_clock: Some(ResetClockArg::Utc),
            interval: Some(1),
            ..Default::default()
        };
        c.apply_args(&args);
        assert_eq!(c.plan, SubscriptionPlan::Max20x);
        assert_eq!(c.monthly_spending_limit, 20.0);
        assert_eq!(c.reset_clock, ResetClock::Utc);
        assert_eq!(c.refresh_interval_secs, MIN_REFRESH_SECS);
    }
}
