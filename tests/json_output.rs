use chrono::{Duration, TimeZone, Utc};
use serde_json::Value;

use claude_usage_meter::config::{AppConfig, ResetClock};
use claude_usage_meter::display::{build_json_output, render_text};
use claude_usage_meter::models::LogEntry;
use claude_usage_meter::monitor::UsageMonitor;

fn entry(key: &str, model: &str, ts: chrono::DateTime<Utc>, input: u64) -> LogEntry {
    LogEntry {
        ts,
        session_id: "s1".into(),
        model: model.into(),
        input,
        output: 1_000,
        cache_create: 0,
        cache_read: 3 * input,
        cost_usd: None,
        dedup_key: key.into(),
    }
}

#[test]
fn json_output_shape() {
    let now = Utc.with_ymd_and_hms(2025, 10, 15, 12, 0, 0).unwrap();
    let monitor = UsageMonitor::new(vec![
        entry("a:", "claude-sonnet-4-5", now - Duration::hours(1), 10_000),
        entry("b:", "claude-opus-4-6", now - Duration::minutes(30), 20_000),
    ]);
    let config = AppConfig {
        reset_clock: ResetClock::Utc,
        ..Default::default()
    };
    monitor.refresh_at(&config, now);
    let json: Value = build_json_output(&monitor.state());

    for key in ["snapshot", "limits", "last_refresh", "degraded"] {
        assert!(json.get(key).is_some(), "missing key: {key}");
    }
    assert!(json["degraded"].is_null());
    assert_eq!(json["last_refresh"], now.to_rfc3339());

    let snap = &json["snapshot"];
    assert_eq!(snap["entry_count"], 2);
    assert_eq!(snap["tokens"]["input"], 30_000);
    assert!((snap["cache_hit_rate"].as_f64().unwrap() - 0.75).abs() < 1e-9);
    assert!(snap["by_model"]["claude-opus-4-6"].is_object());

    for key in ["session", "weekly_all", "weekly_sonnet", "monthly_overage"] {
        let limit = &json["limits"][key];
        assert!(limit["cost"].is_number(), "{key}");
        assert!(limit["budget"].is_number(), "{key}");
        assert!(limit["percent"].is_u64(), "{key}");
        assert!(limit["resets_at"].is_string(), "{key}");
    }
    assert_eq!(json["limits"]["session_source"], "detected");
    assert_eq!(json["limits"]["weekly_all"]["reset_description"], "Resets Mon 9am");
    assert!(json["limits"]["session"]["projected_cost"].is_number());
    assert!(json["limits"]["weekly_all"]["projected_cost"].is_null());
    assert_eq!(json["limits"]["monthly"]["elapsed_days"], 14);

    let plan = &json["limits"]["plan"];
    assert_eq!(plan["id"], "pro");
    assert_eq!(plan["label"], "Pro");
    assert_eq!(plan["monthly_price"], 20.0);
}

#[test]
fn text_output_lists_every_category() {
    let now = Utc.with_ymd_and_hms(2025, 10, 15, 12, 0, 0).unwrap();
    let monitor = UsageMonitor::new(vec![entry(
        "a:",
        "claude-sonnet-4-5",
        now - Duration::hours(1),
        10_000,
    )]);
    let config = AppConfig {
        reset_clock: ResetClock::Utc,
        ..Default::default()
    };
    monitor.refresh_at(&config, now);
    let text = render_text(&monitor.state(), false);
    for label in [
        "Today:",
        "Plan: Pro ($20.00/mo)",
        "Session",
        "Weekly (all models)",
        "Weekly (Sonnet)",
        "Monthly overage",
        "claude-sonnet-4-5",
        "4h 0m",
    ] {
        assert!(text.contains(label), "missing {label:?} in:\n{text}");
    }
}
