use chrono::{DateTime, Local, Utc};
use std::env;

#[cfg(feature = "colors")]
use owo_colors::OwoColorize;

// Provide a no-op color shim when "colors" feature is disabled
#[cfg(not(feature = "colors"))]
pub mod color_shim {
    use std::fmt::{self, Display, Formatter};

    #[derive(Clone)]
    pub struct Plain(pub String);

    impl Display for Plain {
        fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
            f.write_str(&self.0)
        }
    }

    pub trait ColorizeShim {
        fn as_str(&self) -> &str;

        fn bright_black(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn bright_white(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn bright_cyan(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn red(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn yellow(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn green(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn bold(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn dimmed(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
    }

    impl ColorizeShim for &str {
        fn as_str(&self) -> &str {
            self
        }
    }
    impl ColorizeShim for String {
        fn as_str(&self) -> &str {
            self.as_str()
        }
    }
    impl ColorizeShim for Plain {
        fn as_str(&self) -> &str {
            &self.0
        }
    }
}

#[cfg(not(feature = "colors"))]
use color_shim::ColorizeShim as OwoColorize;

use crate::models::{PlanUsageLimits, SessionSource, UsageLimitInfo, UsageSnapshot};
use crate::monitor::MonitorState;
use crate::utils::{format_currency, format_tokens};

fn colors_enabled() -> bool {
    env::var_os("NO_COLOR").is_none()
}

fn colorize_percent(pct: u32, color: bool) -> String {
    let text = format!("{pct}%");
    if !color {
        text
    } else if pct >= 95 {
        text.red().bold().to_string()
    } else if pct >= 80 {
        text.yellow().bold().to_string()
    } else {
        text.green().to_string()
    }
}

fn dim(s: &str, color: bool) -> String {
    if color {
        s.bright_black().dimmed().to_string()
    } else {
        s.to_string()
    }
}

fn limit_line(limit: &UsageLimitInfo, color: bool) -> String {
    let mut line = format!(
        "{:<20} {:>5}  ${} / ${}  {}",
        limit.label,
        colorize_percent(limit.percent(), color),
        format_currency(limit.cost),
        format_currency(limit.budget),
        dim(&limit.reset_description, color),
    );
    if let Some(p) = limit.projected_percent() {
        line.push_str(&format!(" {}", dim(&format!("(projected {p}%)"), color)));
    }
    line
}

fn snapshot_lines(snap: &UsageSnapshot, color: bool) -> Vec<String> {
    let mut lines = vec![format!(
        "Today: ${}  {} tokens  {} entries  {} sessions  cache hit {:.0}%",
        format_currency(snap.today_cost),
        format_tokens(snap.today.total_tokens()),
        snap.entry_count,
        snap.session_count,
        snap.today.cache_hit_rate() * 100.0,
    )];
    for (model, tokens) in &snap.by_model {
        let name = if color {
            model.bright_cyan().to_string()
        } else {
            model.clone()
        };
        lines.push(format!(
            "  {name}: {} in · {} out · {} cache",
            format_tokens(tokens.input),
            format_tokens(tokens.output),
            format_tokens(tokens.cache_tokens()),
        ));
    }
    lines
}

fn limits_lines(limits: &PlanUsageLimits, color: bool) -> Vec<String> {
    let plan = limits.plan.spec();
    let mut lines = vec![format!(
        "Plan: {} (${}/mo)",
        plan.label,
        format_currency(plan.monthly_price)
    )];
    lines.extend([
        &limits.session,
        &limits.weekly_all,
        &limits.weekly_sonnet,
        &limits.monthly_overage,
    ]
    .into_iter()
    .map(|l| limit_line(l, color)));
    if limits.session_source == SessionSource::Rolling {
        lines.push(dim("  no recent session boundary; session window is rolling", color));
    }
    lines.push(dim(
        &format!(
            "  month: ${} spent, ${} included over {} days",
            format_currency(limits.monthly.month_cost),
            format_currency(limits.monthly.included_budget),
            limits.monthly.elapsed_days,
        ),
        color,
    ));
    lines
}

fn format_refresh(ts: Option<DateTime<Utc>>) -> String {
    match ts {
        Some(t) => t.with_timezone(&Local).format("%H:%M:%S").to_string(),
        None => "never".to_string(),
    }
}

/// Multi-line text report of a monitor state.
pub fn render_text(state: &MonitorState, color: bool) -> String {
    let mut lines = Vec::new();
    if let Some(snap) = &state.snapshot {
        lines.extend(snapshot_lines(snap, color));
    }
    if let Some(limits) = &state.limits {
        lines.extend(limits_lines(limits, color));
    }
    if let Some(msg) = &state.degraded {
        let warn = format!("⚠ refresh failed: {msg}");
        lines.push(if color {
            warn.yellow().bold().to_string()
        } else {
            warn
        });
    }
    lines.push(dim(
        &format!("updated {}", format_refresh(state.last_refresh)),
        color,
    ));
    lines.join("\n")
}

pub fn print_text_output(state: &MonitorState) {
    println!("{}", render_text(state, colors_enabled()));
}

fn limit_json(limit: &UsageLimitInfo) -> serde_json::Value {
    serde_json::json!({
        "label": limit.label,
        "cost": limit.cost,
        "budget": limit.budget,
        "fraction": limit.fraction(),
        "percent": limit.percent(),
        "projected_cost": limit.projected_cost,
        "projected_percent": limit.projected_percent(),
        "reset_description": limit.reset_description,
        "resets_at": limit.resets_at.to_rfc3339(),
    })
}

pub fn build_json_output(state: &MonitorState) -> serde_json::Value {
    // Keys are present even when null to keep the schema stable
    let snapshot = state.snapshot.as_ref().map(|s| {
        serde_json::json!({
            "captured_at": s.captured_at.to_rfc3339(),
            "today_cost": s.today_cost,
            "tokens": {
                "input": s.today.input,
                "output": s.today.output,
                "cache_create": s.today.cache_create,
                "cache_read": s.today.cache_read,
                "total": s.today.total_tokens(),
            },
            "cache_hit_rate": s.today.cache_hit_rate(),
            "by_model": s.by_model,
            "session_count": s.session_count,
            "project_count": s.project_count,
            "entry_count": s.entry_count,
        })
    });
    let limits = state.limits.as_ref().map(|l| {
        serde_json::json!({
            "session": limit_json(&l.session),
            "weekly_all": limit_json(&l.weekly_all),
            "weekly_sonnet": limit_json(&l.weekly_sonnet),
            "monthly_overage": limit_json(&l.monthly_overage),
            "monthly": l.monthly,
            "plan": {
                "id": l.plan,
                "label": l.plan.label(),
                "monthly_price": l.plan.spec().monthly_price,
            },
            "session_source": l.session_source,
            "session_start": l.session_start.to_rfc3339(),
        })
    });
    serde_json::json!({
        "snapshot": snapshot,
        "limits": limits,
        "last_refresh": state.last_refresh.map(|t| t.to_rfc3339()),
        "degraded": state.degraded,
    })
}

pub fn print_json_output(state: &MonitorState) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(&build_json_output(state))?);
    Ok(())
}
