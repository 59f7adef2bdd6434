//! Notification presenter boundary
//!
//! A fired alarm is rendered as a user notification. The notification id
//! must be distinct per trigger kind so that, e.g., the daily summary for
//! reminder 5 never replaces reminder 5's exact-time notification. The
//! kind-to-id mapping below is shared with whatever presents the
//! notifications and must not change without migrating both sides.

use crate::alarm::{alarm_handle, AlarmPayload, TriggerKind};
use crate::config::DAILY_SUMMARY_NOTIFICATION_OFFSET;

/// Map a trigger kind to the notification id it posts under.
pub fn notification_id(kind: TriggerKind, reminder_id: i64) -> i64 {
    match kind {
        TriggerKind::Exact => reminder_id,
        TriggerKind::DailySummary => reminder_id + DAILY_SUMMARY_NOTIFICATION_OFFSET,
        // Additional alerts reuse their alarm handle, which is already
        // unique per (reminder, index).
        TriggerKind::Additional(_) => alarm_handle(kind, reminder_id),
    }
}

/// Renders fired alarms for the user.
pub trait NotificationPresenter: Send + Sync {
    fn present(&self, payload: &AlarmPayload);
}

/// Title and body for a fired alarm. Additional alerts render as a generic
/// reminder message; the primary and summary fires get distinct titles.
pub fn render(payload: &AlarmPayload) -> (String, String) {
    match payload.kind {
        TriggerKind::Exact => ("Time's up!".to_string(), payload.message.clone()),
        TriggerKind::DailySummary => (
            "Daily summary".to_string(),
            format!("Still pending: {}", payload.message),
        ),
        TriggerKind::Additional(_) => ("PlanIt".to_string(), payload.message.clone()),
    }
}

/// Headless presenter that writes notifications to the log. Hosts with a
/// real notification surface supply their own implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPresenter;

impl NotificationPresenter for LogPresenter {
    fn present(&self, payload: &AlarmPayload) {
        let (title, body) = render(payload);
        tracing::info!(
            "Notification {}: {} - {}",
            notification_id(payload.kind, payload.reminder_id),
            title,
            body
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_ids_are_distinct_per_kind() {
        let exact = notification_id(TriggerKind::Exact, 5);
        let summary = notification_id(TriggerKind::DailySummary, 5);
        let additional = notification_id(TriggerKind::Additional(0), 5);

        assert_eq!(exact, 5);
        assert_eq!(summary, 5 + DAILY_SUMMARY_NOTIFICATION_OFFSET);
        assert_ne!(additional, exact);
        assert_ne!(additional, summary);
    }

    #[test]
    fn test_render_distinguishes_kinds() {
        let payload = |kind| AlarmPayload {
            reminder_id: 1,
            kind,
            message: "Pay rent".to_string(),
        };

        let (title, body) = render(&payload(TriggerKind::Exact));
        assert_eq!(title, "Time's up!");
        assert_eq!(body, "Pay rent");

        let (title, body) = render(&payload(TriggerKind::DailySummary));
        assert_eq!(title, "Daily summary");
        assert!(body.contains("Pay rent"));

        let (title, _) = render(&payload(TriggerKind::Additional(2)));
        assert_eq!(title, "PlanIt");
    }
}
