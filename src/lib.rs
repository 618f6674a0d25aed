//! # Claude Usage Meter
//!
//! Local usage accounting for Claude Code activity logs.
//!
//! ## Overview
//!
//! This library reads the per-session JSONL logs Claude Code writes under
//! `~/.claude/projects`, deduplicates the assistant records they contain and
//! reports:
//! - Today's tokens and spend at published API prices
//! - Session (5-hour) usage against the plan's session budget
//! - Weekly usage, all models and Sonnet only, against weekly budgets
//! - Monthly spend beyond the plan's included budget, against a ceiling
//!
//! Plan limits are measured in usage-weight dollars, which differ from
//! published prices for the current Opus generation.
//!
//! ## Features
//!
//! - `colors` (default): Enables terminal color output via owo-colors

/// Command-line argument parsing
pub mod cli;

/// Settings file and overrides
pub mod config;

/// Display formatting for text and JSON output
pub mod display;

/// The four plan-limit categories and today's snapshot
pub mod limits;

/// Tracing subscriber setup
pub mod logging;

/// Data models for entries, token totals, plans and limits
pub mod models;

/// Single-flight refresh orchestration
pub mod monitor;

/// JSONL record parsing
pub mod parser;

/// Model-specific pricing calculations
pub mod pricing;

/// Log discovery, scanning and deduplication
pub mod usage;

/// Utility functions for paths and formatting
pub mod utils;

/// Session, weekly and monthly window math
pub mod window;
