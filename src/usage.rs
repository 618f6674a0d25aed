//! # Usage Module
//!
//! Scans Claude Code project logs for assistant usage records.
//!
//! ## Layout
//!
//! Each root holds one directory per project; each project holds one
//! `*.jsonl` log per session and optionally a `subagents/` directory with
//! more logs. Only those two levels are read.
//!
//! ## Key Functions
//!
//! - `discover_log_files`: Lists the log files under one root
//! - `scan_files`: Parses, windows and deduplicates entries across files
//! - `EntrySource`: Fetch-by-window seam used by the limit aggregator

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::models::{LogEntry, ScanResult, TokenBreakdown};
use crate::parser::parse_line;

pub const LOG_EXTENSION: &str = "jsonl";
pub const SUBAGENTS_DIR: &str = "subagents";

/// Anything that can hand out the deduplicated entries of a time window.
pub trait EntrySource {
    /// Entries with `start <= ts < end`.
    fn fetch(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<ScanResult>;
}

impl<T: EntrySource + ?Sized> EntrySource for &T {
    fn fetch(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<ScanResult> {
        (**self).fetch(start, end)
    }
}

impl EntrySource for [LogEntry] {
    fn fetch(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<ScanResult> {
        Ok(self
            .iter()
            .filter(|e| e.ts >= start && e.ts < end)
            .cloned()
            .collect())
    }
}

impl EntrySource for Vec<LogEntry> {
    fn fetch(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<ScanResult> {
        self.as_slice().fetch(start, end)
    }
}

/// Log roots on disk, typically `~/.claude/projects`.
#[derive(Debug, Clone)]
pub struct LogDirectory {
    roots: Vec<PathBuf>,
}

impl LogDirectory {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    pub fn log_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for root in &self.roots {
            files.extend(discover_log_files(root)?);
        }
        Ok(files)
    }
}

impl EntrySource for LogDirectory {
    fn fetch(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<ScanResult> {
        let files = self.log_files()?;
        let result = scan_files(&files, start, end);
        tracing::debug!(
            files = result.files_scanned,
            entries = result.entries.len(),
            %start,
            %end,
            "scanned usage logs"
        );
        Ok(result)
    }
}

/// List every log file under `root/<project>/` and `root/<project>/subagents/`.
///
/// A missing root is not an error (fresh installs have none). A root that
/// exists but cannot be listed is.
pub fn discover_log_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(e) => e,
            Err(e) if e.depth() == 0 => {
                return Err(e).with_context(|| format!("list log root {}", root.display()));
            }
            Err(e) => {
                tracing::debug!(error = %e, "skipping unreadable project entry");
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        let project = entry.path();
        files.extend(log_files_in(project));
        files.extend(log_files_in(&project.join(SUBAGENTS_DIR)));
    }
    Ok(files)
}

fn log_files_in(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == LOG_EXTENSION))
        .map(|e| e.into_path())
        .collect()
}

/// Session handle of a log file: its base name without extension.
pub fn session_id_for(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string()
}

/// Parse every file, keep entries in `[start, end)`, and drop repeated
/// dedup keys (first occurrence wins, across all files).
pub fn scan_files(files: &[PathBuf], start: DateTime<Utc>, end: DateTime<Utc>) -> ScanResult {
    let mut acc = ScanAccumulator::default();
    for path in files {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "skipping unreadable log");
                continue;
            }
        };
        acc.files_scanned += 1;
        let session_id = session_id_for(path);
        let reader = BufReader::new(file);
        for line in reader.split(b'\n').map_while(|l| l.ok()) {
            let Ok(text) = std::str::from_utf8(&line) else {
                continue;
            };
            let Some(entry) = parse_line(text, &session_id) else {
                continue;
            };
            if entry.ts < start || entry.ts >= end {
                continue;
            }
            acc.push(entry);
        }
    }
    acc.finish()
}

#[derive(Default)]
struct ScanAccumulator {
    seen: HashSet<String>,
    sessions: HashSet<String>,
    entries: Vec<LogEntry>,
    totals: TokenBreakdown,
    by_model: BTreeMap<String, TokenBreakdown>,
    files_scanned: usize,
}

impl ScanAccumulator {
    fn push(&mut self, entry: LogEntry) {
        if !self.seen.insert(entry.dedup_key.clone()) {
            return;
        }
        self.totals = self.totals.with_entry(&entry);
        let model = self.by_model.entry(entry.model.clone()).or_default();
        *model = model.with_entry(&entry);
        if !self.sessions.contains(&entry.session_id) {
            self.sessions.insert(entry.session_id.clone());
        }
        self.entries.push(entry);
    }

    fn finish(self) -> ScanResult {
        let session_count = self.sessions.len();
        ScanResult {
            entries: self.entries,
            totals: self.totals,
            by_model: self.by_model,
            session_count,
            project_count: session_count,
            files_scanned: self.files_scanned,
        }
    }
}

impl FromIterator<LogEntry> for ScanResult {
    /// Deduplicate and aggregate already-parsed entries.
    fn from_iter<I: IntoIterator<Item = LogEntry>>(iter: I) -> Self {
        let mut acc = ScanAccumulator::default();
        for entry in iter {
            acc.push(entry);
        }
        acc.finish()
    }
}
