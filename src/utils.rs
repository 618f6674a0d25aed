use std::path::PathBuf;

pub const WINDOW_DURATION_HOURS: i64 = 5;
/// How far back session boundary detection looks for activity.
pub const SESSION_LOOKBACK_HOURS: i64 = 10;

/// Resolve the `projects` directories to scan.
///
/// `override_env` is a comma-separated list of Claude base directories (the
/// parent of `projects/`). When it yields nothing, `~/.claude` and the XDG
/// config `claude` directory are tried. Only existing directories are returned.
pub fn claude_project_roots(override_env: Option<&str>) -> Vec<PathBuf> {
    let mut roots = vec![];
    if let Some(list) = override_env {
        for p in list.split(',') {
            let p = p.trim();
            if p.is_empty() {
                continue;
            }
            let projects = PathBuf::from(p).join("projects");
            if projects.is_dir() {
                roots.push(projects);
            }
        }
        if !roots.is_empty() {
            return roots;
        }
    }
    let basedirs = directories::BaseDirs::new();
    let home = basedirs
        .as_ref()
        .map(|b| b.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~"));
    let xdg_config = basedirs
        .as_ref()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| home.join(".config"));
    // Prefer ~/.claude, then XDG config
    for base in [home.join(".claude"), xdg_config.join("claude")] {
        let projects = base.join("projects");
        if projects.is_dir() && !roots.contains(&projects) {
            roots.push(projects);
        }
    }
    roots
}

pub fn format_currency(v: f64) -> String {
    format!("{v:.2}")
}

pub fn format_tokens(n: u64) -> String {
    if n >= 1_000_000_000 {
        format!("{:.1}B", n as f64 / 1e9)
    } else if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1e6)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1e3)
    } else {
        n.to_string()
    }
}
