//! Trigger scheduler
//!
//! Translates persisted reminder state into alarm registrations and back.
//! A reminder fans out into one primary trigger at its due time, one
//! daily-summary trigger at a fixed local hour on its due date, and one
//! trigger per additional alert time. Every trigger is addressed by a
//! handle derived purely from the reminder id and kind, so cancellation
//! never depends on remembering what was registered.

use crate::alarm::{alarm_handle, AlarmPayload, AlarmPrecision, AlarmService, TriggerKind};
use crate::config::{ADDITIONAL_ALERT_CANCEL_SCAN, DAILY_SUMMARY_HOUR, MAX_ADDITIONAL_ALERTS};
use crate::database::Reminder;
use crate::error::Result;
use chrono::{DateTime, Local, TimeZone, Utc};
use std::sync::Arc;

/// Schedules and cancels the alarm fan-out for reminders
#[derive(Clone)]
pub struct TriggerScheduler {
    alarms: Arc<dyn AlarmService>,
}

impl TriggerScheduler {
    pub fn new(alarms: Arc<dyn AlarmService>) -> Self {
        Self { alarms }
    }

    /// Register the full trigger set for a persisted reminder.
    ///
    /// Returns the number of additional-alert triggers registered, which
    /// the caller persists so a later cancellation can sweep exactly that
    /// many handles. Completed reminders register nothing.
    pub fn schedule(&self, reminder: &Reminder) -> Result<usize> {
        if reminder.completed {
            tracing::debug!("Reminder {} is completed, nothing to schedule", reminder.id);
            return Ok(0);
        }

        let now = Utc::now();
        let precision = if self.alarms.exact_supported() {
            AlarmPrecision::Exact
        } else {
            tracing::warn!(
                "Exact alarms unavailable, scheduling reminder {} best-effort",
                reminder.id
            );
            AlarmPrecision::BestEffort
        };

        if reminder.due_at <= now {
            tracing::warn!(
                "Reminder {} is due in the past ({}), registering anyway",
                reminder.id,
                reminder.due_at
            );
        }

        self.alarms.register(
            alarm_handle(TriggerKind::Exact, reminder.id),
            reminder.due_at,
            precision,
            payload(reminder, TriggerKind::Exact),
        )?;

        match daily_summary_at(reminder.due_at, now) {
            Some(at) => {
                self.alarms.register(
                    alarm_handle(TriggerKind::DailySummary, reminder.id),
                    at,
                    precision,
                    payload(reminder, TriggerKind::DailySummary),
                )?;
            }
            None => {
                tracing::debug!(
                    "Daily summary for reminder {} already passed, skipping",
                    reminder.id
                );
            }
        }

        if reminder.additional_alerts.len() > MAX_ADDITIONAL_ALERTS {
            tracing::warn!(
                "Reminder {} has {} additional alerts, only the first {} are scheduled",
                reminder.id,
                reminder.additional_alerts.len(),
                MAX_ADDITIONAL_ALERTS
            );
        }

        let mut registered = 0;
        for (index, &at) in reminder
            .additional_alerts
            .iter()
            .take(MAX_ADDITIONAL_ALERTS)
            .enumerate()
        {
            self.alarms.register(
                alarm_handle(TriggerKind::Additional(index), reminder.id),
                at,
                precision,
                payload(reminder, TriggerKind::Additional(index)),
            )?;
            registered += 1;
        }

        tracing::debug!(
            "Scheduled reminder {}: primary at {}, {} additional alert(s)",
            reminder.id,
            reminder.due_at,
            registered
        );
        Ok(registered)
    }

    /// Cancel every trigger the reminder may have registered.
    ///
    /// `scheduled_alert_count` is the count persisted by the last schedule
    /// pass; the scan is floored at [`ADDITIONAL_ALERT_CANCEL_SCAN`] to
    /// also cover rows that predate the persisted count. Cancelling an
    /// unregistered handle is a no-op, so this is safe to call
    /// defensively.
    pub fn cancel(&self, reminder_id: i64, scheduled_alert_count: usize) -> Result<()> {
        self.alarms
            .cancel(alarm_handle(TriggerKind::Exact, reminder_id))?;
        self.alarms
            .cancel(alarm_handle(TriggerKind::DailySummary, reminder_id))?;

        let scan = scheduled_alert_count
            .max(ADDITIONAL_ALERT_CANCEL_SCAN)
            .min(MAX_ADDITIONAL_ALERTS);
        for index in 0..scan {
            self.alarms
                .cancel(alarm_handle(TriggerKind::Additional(index), reminder_id))?;
        }

        tracing::debug!("Cancelled triggers for reminder {}", reminder_id);
        Ok(())
    }
}

fn payload(reminder: &Reminder, kind: TriggerKind) -> AlarmPayload {
    AlarmPayload {
        reminder_id: reminder.id,
        kind,
        message: reminder.title.clone(),
    }
}

/// The daily-summary instant for a due time: the configured local hour on
/// the due date, or None if that instant is not strictly in the future.
///
/// The hour is resolved against the local timezone at call time and not
/// revisited if the timezone later changes. A due date whose summary hour
/// does not exist locally (DST gap) yields None.
pub fn daily_summary_at(due_at: DateTime<Utc>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let due_date = due_at.with_timezone(&Local).date_naive();
    let naive = due_date.and_hms_opt(DAILY_SUMMARY_HOUR, 0, 0)?;
    let summary = Local
        .from_local_datetime(&naive)
        .earliest()?
        .with_timezone(&Utc);

    (summary > now).then_some(summary)
}
