//! # Monitor Module
//!
//! Runs refresh cycles and holds the latest result.
//!
//! Only one cycle runs at a time. A refresh requested while a cycle is in
//! flight is coalesced: the running cycle runs once more before it returns,
//! however many requests arrived in the meantime. Readers take a cheap
//! `Arc` clone of the current state, which is replaced wholesale at the
//! end of each cycle.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::config::AppConfig;
use crate::limits::{build_snapshot, compute_plan_limits};
use crate::models::{PlanUsageLimits, UsageSnapshot};
use crate::usage::EntrySource;

/// What the latest cycles produced.
#[derive(Clone, Debug, Default, Serialize)]
pub struct MonitorState {
    pub snapshot: Option<UsageSnapshot>,
    pub limits: Option<PlanUsageLimits>,
    /// Time of the last successful cycle
    pub last_refresh: Option<DateTime<Utc>>,
    /// Set when the last cycle failed; earlier results are kept
    pub degraded: Option<String>,
}

impl MonitorState {
    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// This call ran at least one cycle
    Completed,
    /// Another cycle was in flight; it will run again on this call's behalf
    Coalesced,
}

pub struct UsageMonitor<S> {
    source: S,
    state: RwLock<Arc<MonitorState>>,
    in_flight: AtomicBool,
    pending: AtomicBool,
    cycles: AtomicUsize,
}

impl<S: EntrySource> UsageMonitor<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            state: RwLock::new(Arc::new(MonitorState::default())),
            in_flight: AtomicBool::new(false),
            pending: AtomicBool::new(false),
            cycles: AtomicUsize::new(0),
        }
    }

    pub fn state(&self) -> Arc<MonitorState> {
        Arc::clone(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Number of cycles run so far, successful or not.
    pub fn cycles(&self) -> usize {
        self.cycles.load(Ordering::Acquire)
    }

    pub fn refresh(&self, config: &AppConfig) -> RefreshOutcome {
        self.refresh_with(config, Utc::now)
    }

    /// Refresh as of a fixed instant.
    pub fn refresh_at(&self, config: &AppConfig, now: DateTime<Utc>) -> RefreshOutcome {
        self.refresh_with(config, || now)
    }

    fn refresh_with(&self, config: &AppConfig, clock: impl Fn() -> DateTime<Utc>) -> RefreshOutcome {
        // Announce the request before trying for the slot: a running cycle
        // that releases the slot afterwards is then bound to see it.
        self.pending.store(true, Ordering::SeqCst);
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("refresh coalesced into running cycle");
            return RefreshOutcome::Coalesced;
        }
        loop {
            self.pending.store(false, Ordering::SeqCst);
            self.run_cycle(config, clock());
            self.in_flight.store(false, Ordering::SeqCst);
            // a request that arrived mid-cycle gets one more run, unless a
            // new caller already took the slot and will serve it
            if !self.pending.load(Ordering::SeqCst)
                || self
                    .in_flight
                    .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                    .is_err()
            {
                break;
            }
        }
        RefreshOutcome::Completed
    }

    fn run_cycle(&self, config: &AppConfig, now: DateTime<Utc>) {
        let result = build_snapshot(&self.source, now).and_then(|snapshot| {
            compute_plan_limits(&self.source, config, now).map(|limits| (snapshot, limits))
        });
        self.cycles.fetch_add(1, Ordering::AcqRel);

        let next = match result {
            Ok((snapshot, limits)) => MonitorState {
                snapshot: Some(snapshot),
                limits: Some(limits),
                last_refresh: Some(now),
                degraded: None,
            },
            Err(e) => {
                let message = format!("{e:#}");
                tracing::warn!(error = %message, "refresh failed, keeping previous state");
                MonitorState {
                    degraded: Some(message),
                    ..(*self.state()).clone()
                }
            }
        };
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(next);
    }
}
