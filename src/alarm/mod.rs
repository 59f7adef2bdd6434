//! Alarm service boundary
//!
//! One-shot timer registrations addressed by a stable integer handle. The
//! handle is a pure function of `(reminder id, trigger kind)`, so a caller
//! can cancel any trigger it may have registered earlier without keeping a
//! side table of what was actually scheduled.

pub mod timers;

pub use timers::TokioAlarmService;

use crate::config::{
    ADDITIONAL_ALERT_HANDLE_BASE, ADDITIONAL_ALERT_HANDLE_STRIDE, DAILY_SUMMARY_HANDLE_OFFSET,
};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which of a reminder's triggers a registration belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    /// The primary due-time alert
    Exact,
    /// The once-daily nudge for reminders due that day
    DailySummary,
    /// A user-configured secondary alert time, by position
    Additional(usize),
}

/// Derive the alarm handle for a trigger.
///
/// Handles partition into three disjoint ranges: primary handles are the
/// reminder id itself, daily-summary handles sit one offset above, and
/// additional-alert handles occupy a per-reminder block of stride slots in
/// their own namespace. Two distinct reminder ids below the daily-summary
/// offset can never collide, whatever the kind or index.
pub fn alarm_handle(kind: TriggerKind, reminder_id: i64) -> i64 {
    match kind {
        TriggerKind::Exact => reminder_id,
        TriggerKind::DailySummary => reminder_id + DAILY_SUMMARY_HANDLE_OFFSET,
        TriggerKind::Additional(index) => {
            ADDITIONAL_ALERT_HANDLE_BASE
                + reminder_id * ADDITIONAL_ALERT_HANDLE_STRIDE
                + (index as i64 + 1)
        }
    }
}

/// Everything a fired-trigger handler needs to render a notification.
///
/// The payload travels with the registration and is the source of truth at
/// fire time; the handler never has to re-read the store to produce a
/// user-visible message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmPayload {
    pub reminder_id: i64,
    pub kind: TriggerKind,
    pub message: String,
}

/// Requested timer precision.
///
/// Exact registration is a privileged capability on some platforms; when
/// it is unavailable the scheduler downgrades to best effort rather than
/// failing. Both paths share the same handle scheme so cancellation works
/// regardless of which one was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmPrecision {
    Exact,
    BestEffort,
}

/// Platform timer service.
///
/// Registration and cancellation are cheap, synchronous calls; callers may
/// invoke them from whatever task is handling the edit. Registering an
/// already-registered handle replaces the previous timer; cancelling an
/// unknown handle is a no-op.
pub trait AlarmService: Send + Sync {
    /// Register a one-shot timer. A past `at` fires immediately.
    fn register(
        &self,
        handle: i64,
        at: DateTime<Utc>,
        precision: AlarmPrecision,
        payload: AlarmPayload,
    ) -> Result<()>;

    /// Cancel the timer registered under `handle`, if any.
    fn cancel(&self, handle: i64) -> Result<()>;

    /// Whether this service can honor [`AlarmPrecision::Exact`].
    fn exact_supported(&self) -> bool;
}
