//! Reminders service
//!
//! Orchestrates the reminder lifecycle: persist first, then keep the
//! alarm fan-out consistent with what was persisted. Every edit replaces
//! the full trigger set (cancel everything the previous state may have
//! registered, then schedule from the current state) rather than diffing.

use crate::database::{CreateReminderRequest, Reminder, Repository};
use crate::error::{AppError, Result};
use crate::services::TriggerScheduler;
use tokio::sync::watch;

/// Service for managing reminders and their triggers
#[derive(Clone)]
pub struct RemindersService {
    repo: Repository,
    scheduler: TriggerScheduler,
}

impl RemindersService {
    pub fn new(repo: Repository, scheduler: TriggerScheduler) -> Self {
        Self { repo, scheduler }
    }

    /// Create a reminder and register its triggers.
    ///
    /// The reminder is durably stored before any trigger is registered; a
    /// store failure means nothing gets scheduled. A crash in between
    /// leaves the reminder stored but unscheduled, which the next boot
    /// reconciliation repairs.
    pub async fn create_reminder(&self, req: CreateReminderRequest) -> Result<Reminder> {
        tracing::info!("Creating reminder: {}", req.title);

        let mut reminder = self.repo.create_reminder(req).await?;

        let registered = self.scheduler.schedule(&reminder)?;
        self.repo
            .set_scheduled_alert_count(reminder.id, registered)
            .await?;
        reminder.scheduled_alert_count = registered as i64;

        tracing::info!("Reminder created: {}", reminder.id);
        Ok(reminder)
    }

    /// Update a reminder and atomically replace its trigger fan-out.
    ///
    /// Concurrent updates to the same reminder must be serialized by the
    /// caller; interleaved cancel/schedule for one id can leave a partial
    /// trigger set.
    pub async fn update_reminder(&self, mut reminder: Reminder) -> Result<Reminder> {
        tracing::debug!("Updating reminder: {}", reminder.id);

        let previous = self
            .repo
            .get_reminder(reminder.id)
            .await?
            .ok_or(AppError::ReminderNotFound(reminder.id))?;

        self.repo.update_reminder(&reminder).await?;

        self.scheduler
            .cancel(reminder.id, previous.scheduled_alert_count as usize)?;
        let registered = self.scheduler.schedule(&reminder)?;
        self.repo
            .set_scheduled_alert_count(reminder.id, registered)
            .await?;
        reminder.scheduled_alert_count = registered as i64;

        Ok(reminder)
    }

    /// Flip a reminder's completion state. Completing cancels every
    /// trigger; un-completing schedules them again.
    pub async fn set_completed(&self, id: i64, completed: bool) -> Result<Reminder> {
        let mut reminder = self
            .repo
            .get_reminder(id)
            .await?
            .ok_or(AppError::ReminderNotFound(id))?;

        reminder.completed = completed;
        self.update_reminder(reminder).await
    }

    /// Delete a reminder and cancel every trigger it may have registered
    pub async fn delete_reminder(&self, id: i64) -> Result<()> {
        tracing::info!("Deleting reminder: {}", id);

        let existing = self
            .repo
            .get_reminder(id)
            .await?
            .ok_or(AppError::ReminderNotFound(id))?;

        self.repo.delete_reminder(id).await?;
        self.scheduler
            .cancel(id, existing.scheduled_alert_count as usize)?;

        Ok(())
    }

    /// Get a reminder by id, or None if absent
    pub async fn get_reminder(&self, id: i64) -> Result<Option<Reminder>> {
        self.repo.get_reminder(id).await
    }

    /// All reminders, due soonest first
    pub async fn list_reminders(&self) -> Result<Vec<Reminder>> {
        self.repo.list_reminders().await
    }

    /// Pending reminders, due soonest first
    pub async fn list_pending(&self) -> Result<Vec<Reminder>> {
        self.repo.list_pending_reminders().await
    }

    /// Live view of the pending list, updated after every mutation
    pub async fn watch_pending(&self) -> Result<watch::Receiver<Vec<Reminder>>> {
        self.repo.subscribe_pending().await
    }
}
