//! Application configuration constants
//!
//! Central location for the scheduling constants that form the wire
//! contract between the trigger scheduler and the notification presenter.
//! Changing any of the offsets below orphans alarms registered under the
//! old scheme, so treat them as frozen.

// ===== Daily Summary =====

/// Wall-clock hour (local time, 24h) at which the daily-summary nudge for
/// a reminder's due date fires.
pub const DAILY_SUMMARY_HOUR: u32 = 9;

/// Added to a reminder id to form the daily-summary alarm handle, keeping
/// it out of the primary-handle namespace.
pub const DAILY_SUMMARY_HANDLE_OFFSET: i64 = 1_000_000;

/// Added to a reminder id to form the daily-summary notification id, so a
/// summary notification never replaces the exact-time notification for the
/// same reminder.
pub const DAILY_SUMMARY_NOTIFICATION_OFFSET: i64 = 1_000_000;

// ===== Additional Alerts =====

/// Base of the additional-alert handle namespace. Sits above the
/// daily-summary range so no reminder id below
/// [`DAILY_SUMMARY_HANDLE_OFFSET`] can collide across kinds.
pub const ADDITIONAL_ALERT_HANDLE_BASE: i64 = 2_000_000;

/// Handle slots reserved per reminder for additional alerts.
pub const ADDITIONAL_ALERT_HANDLE_STRIDE: i64 = 100;

/// Maximum number of additional alerts scheduled per reminder. Bounded by
/// the handle stride; alerts beyond this are dropped with a warning.
pub const MAX_ADDITIONAL_ALERTS: usize = (ADDITIONAL_ALERT_HANDLE_STRIDE - 1) as usize;

/// Floor for the cancellation scan over additional-alert handles. Rows
/// written before the scheduled-alert count was persisted fall back to
/// scanning this many slots.
pub const ADDITIONAL_ALERT_CANCEL_SCAN: usize = 10;
