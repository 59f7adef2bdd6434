//! Boot reconciliation
//!
//! Live timers do not survive a process restart; persisted reminders do.
//! The reconciler rebuilds every pending reminder's trigger set from the
//! store. The composition root awaits the whole pass before considering
//! startup complete, so the work is never left dangling in a task the
//! host might tear down mid-loop; the returned summary is the explicit
//! completion signal.

use crate::database::Repository;
use crate::error::Result;
use crate::services::TriggerScheduler;
use chrono::Utc;

/// Outcome of one reconciliation pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Pending reminders whose triggers were re-registered
    pub rescheduled: usize,
    /// Pending reminders already past due, left unscheduled
    pub skipped: usize,
    /// Reminders whose scheduling failed (logged, not fatal)
    pub failed: usize,
}

/// Restores alarm registrations from persisted state after a restart
#[derive(Clone)]
pub struct BootReconciler {
    repo: Repository,
    scheduler: TriggerScheduler,
}

impl BootReconciler {
    pub fn new(repo: Repository, scheduler: TriggerScheduler) -> Self {
        Self { repo, scheduler }
    }

    /// Re-derive and re-register triggers for every pending reminder.
    ///
    /// Invoked once per restart. A failure to schedule one reminder is
    /// logged and counted but never aborts the rest of the pass; only a
    /// failure to read the store at all is fatal, since there is nothing
    /// to reconcile from.
    pub async fn reconcile_after_restart(&self) -> Result<ReconcileSummary> {
        tracing::info!("Restoring alarm registrations from the store");

        let pending = self.repo.list_pending_reminders().await?;
        let now = Utc::now();
        let mut summary = ReconcileSummary::default();

        for reminder in pending {
            if reminder.due_at <= now {
                tracing::debug!(
                    "Reminder {} was due {} and is now past, not rescheduling",
                    reminder.id,
                    reminder.due_at
                );
                summary.skipped += 1;
                continue;
            }

            match self.scheduler.schedule(&reminder) {
                Ok(registered) => {
                    if let Err(e) = self
                        .repo
                        .set_scheduled_alert_count(reminder.id, registered)
                        .await
                    {
                        tracing::warn!(
                            "Failed to record alert count for reminder {}: {}",
                            reminder.id,
                            e
                        );
                    }
                    summary.rescheduled += 1;
                }
                Err(e) => {
                    tracing::error!("Failed to reschedule reminder {}: {}", reminder.id, e);
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(
            "Boot reconciliation finished: {} rescheduled, {} past due, {} failed",
            summary.rescheduled,
            summary.skipped,
            summary.failed
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::{AlarmPayload, AlarmPrecision, AlarmService};
    use crate::database::{initialize_database, CreateReminderRequest};
    use crate::error::AppError;
    use chrono::{DateTime, Duration};
    use sqlx::sqlite::SqlitePoolOptions;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingAlarms {
        registered: Mutex<HashSet<i64>>,
        fail_for_reminder: Option<i64>,
    }

    impl AlarmService for RecordingAlarms {
        fn register(
            &self,
            handle: i64,
            _at: DateTime<Utc>,
            _precision: AlarmPrecision,
            payload: AlarmPayload,
        ) -> crate::error::Result<()> {
            if self.fail_for_reminder == Some(payload.reminder_id) {
                return Err(AppError::Alarm("registration refused".to_string()));
            }
            self.registered.lock().unwrap().insert(handle);
            Ok(())
        }

        fn cancel(&self, handle: i64) -> crate::error::Result<()> {
            self.registered.lock().unwrap().remove(&handle);
            Ok(())
        }

        fn exact_supported(&self) -> bool {
            true
        }
    }

    async fn create_test_repo() -> Repository {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap();
        initialize_database(&pool).await.unwrap();
        Repository::new(pool)
    }

    async fn insert_reminder(
        repo: &Repository,
        title: &str,
        due_at: DateTime<Utc>,
        completed: bool,
    ) -> i64 {
        let mut reminder = repo
            .create_reminder(CreateReminderRequest {
                title: title.to_string(),
                description: String::new(),
                due_at,
                additional_alerts: vec![],
            })
            .await
            .unwrap();

        if completed {
            reminder.completed = true;
            repo.update_reminder(&reminder).await.unwrap();
        }
        reminder.id
    }

    #[tokio::test]
    async fn test_reconcile_restores_pending_only() {
        let repo = create_test_repo().await;
        let alarms = Arc::new(RecordingAlarms::default());
        let reconciler =
            BootReconciler::new(repo.clone(), TriggerScheduler::new(alarms.clone()));

        let future = Utc::now() + Duration::hours(3);
        let pending_id = insert_reminder(&repo, "pending", future, false).await;
        let completed_id = insert_reminder(&repo, "completed", future, true).await;

        let summary = reconciler.reconcile_after_restart().await.unwrap();

        assert_eq!(summary.rescheduled, 1);
        assert_eq!(summary.failed, 0);

        let registered = alarms.registered.lock().unwrap();
        assert!(registered.contains(&pending_id));
        assert!(!registered.contains(&completed_id));
    }

    #[tokio::test]
    async fn test_reconcile_skips_past_due() {
        let repo = create_test_repo().await;
        let alarms = Arc::new(RecordingAlarms::default());
        let reconciler =
            BootReconciler::new(repo.clone(), TriggerScheduler::new(alarms.clone()));

        insert_reminder(&repo, "expired", Utc::now() - Duration::hours(1), false).await;

        let summary = reconciler.reconcile_after_restart().await.unwrap();

        assert_eq!(summary.rescheduled, 0);
        assert_eq!(summary.skipped, 1);
        assert!(alarms.registered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_one_failure_does_not_abort_the_pass() {
        let repo = create_test_repo().await;

        let future = Utc::now() + Duration::hours(3);
        let poisoned_id = insert_reminder(&repo, "poisoned", future, false).await;
        let healthy_id = insert_reminder(&repo, "healthy", future, false).await;

        let alarms = Arc::new(RecordingAlarms {
            fail_for_reminder: Some(poisoned_id),
            ..RecordingAlarms::default()
        });
        let reconciler =
            BootReconciler::new(repo.clone(), TriggerScheduler::new(alarms.clone()));

        let summary = reconciler.reconcile_after_restart().await.unwrap();

        assert_eq!(summary.rescheduled, 1);
        assert_eq!(summary.failed, 1);
        assert!(alarms.registered.lock().unwrap().contains(&healthy_id));
    }
}
