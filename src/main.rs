use anyhow::Result;
use std::io::BufRead;
use std::sync::mpsc;
use std::time::Duration;

use claude_usage_meter::cli::Args;
use claude_usage_meter::config::AppConfig;
use claude_usage_meter::display::{print_json_output, print_text_output};
use claude_usage_meter::logging;
use claude_usage_meter::monitor::UsageMonitor;
use claude_usage_meter::usage::{EntrySource, LogDirectory};
use claude_usage_meter::utils::claude_project_roots;

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.debug);

    let mut config = AppConfig::load(args.config.as_deref());
    config.apply_args(&args);

    let roots = if config.log_roots.is_empty() {
        claude_project_roots(args.claude_config_dir.as_deref())
    } else {
        config.log_roots.clone()
    };
    tracing::debug!(?roots, plan = ?config.plan, "starting");
    if roots.is_empty() {
        tracing::warn!("no Claude projects directory found; reporting zero usage");
    }

    let monitor = UsageMonitor::new(LogDirectory::new(roots));
    monitor.refresh(&config);
    print_state(&monitor, &args)?;

    if args.watch {
        watch(&monitor, &config, &args)?;
    }
    Ok(())
}

fn print_state<S: EntrySource>(monitor: &UsageMonitor<S>, args: &Args) -> Result<()> {
    let state = monitor.state();
    if args.json {
        print_json_output(&state)
    } else {
        print_text_output(&state);
        Ok(())
    }
}

/// Refresh on a timer, or immediately when Enter is pressed.
fn watch<S: EntrySource>(monitor: &UsageMonitor<S>, config: &AppConfig, args: &Args) -> Result<()> {
    let interval = Duration::from_secs(config.refresh_interval_secs);
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for _ in stdin.lock().lines().map_while(|l| l.ok()) {
            if tx.send(()).is_err() {
                break;
            }
        }
    });

    loop {
        match rx.recv_timeout(interval) {
            Ok(()) => tracing::debug!("manual refresh"),
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            // stdin closed; keep going on the timer alone
            Err(mpsc::RecvTimeoutError::Disconnected) => std::thread::sleep(interval),
        }
        monitor.refresh(config);
        if !args.json {
            println!();
        }
        print_state(monitor, args)?;
    }
}
