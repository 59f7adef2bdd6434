//! In-process alarm backend
//!
//! Implements [`AlarmService`] with one spawned tokio timer task per
//! handle. When a timer elapses, the payload is handed to the
//! [`NotificationPresenter`]. Timers live only as long as the process;
//! restoring them after a restart is the boot reconciler's job.

use super::{AlarmPayload, AlarmPrecision, AlarmService};
use crate::error::Result;
use crate::notify::NotificationPresenter;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;

type TaskTable = Arc<Mutex<HashMap<i64, JoinHandle<()>>>>;

/// Tokio-backed timer service.
///
/// Must be used from within a tokio runtime. Whether the service reports
/// exact-alarm support is configurable so hosts can model the privileged
/// capability being denied.
#[derive(Clone)]
pub struct TokioAlarmService {
    presenter: Arc<dyn NotificationPresenter>,
    tasks: TaskTable,
    exact: bool,
}

impl TokioAlarmService {
    pub fn new(presenter: Arc<dyn NotificationPresenter>) -> Self {
        Self {
            presenter,
            tasks: Arc::new(Mutex::new(HashMap::new())),
            exact: true,
        }
    }

    /// Same service, but reporting exact alarms as unavailable.
    pub fn without_exact_alarms(presenter: Arc<dyn NotificationPresenter>) -> Self {
        Self {
            exact: false,
            ..Self::new(presenter)
        }
    }

    /// Number of currently registered timers.
    pub fn registered_count(&self) -> usize {
        lock_tasks(&self.tasks).len()
    }
}

fn lock_tasks(tasks: &TaskTable) -> MutexGuard<'_, HashMap<i64, JoinHandle<()>>> {
    // A panicked timer task cannot leave the table in a bad state, so
    // recover from poisoning instead of propagating it.
    tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl AlarmService for TokioAlarmService {
    fn register(
        &self,
        handle: i64,
        at: DateTime<Utc>,
        precision: AlarmPrecision,
        payload: AlarmPayload,
    ) -> Result<()> {
        let delay = (at - Utc::now())
            .to_std()
            .unwrap_or(std::time::Duration::ZERO);

        tracing::debug!(
            "Registering alarm handle {} at {} ({:?}, fires in {:?})",
            handle,
            at,
            precision,
            delay
        );

        let presenter = Arc::clone(&self.presenter);
        let tasks = Arc::clone(&self.tasks);
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            presenter.present(&payload);
            lock_tasks(&tasks).remove(&handle);
        });

        if let Some(replaced) = lock_tasks(&self.tasks).insert(handle, task) {
            tracing::debug!("Replaced existing alarm for handle {}", handle);
            replaced.abort();
        }

        Ok(())
    }

    fn cancel(&self, handle: i64) -> Result<()> {
        if let Some(task) = lock_tasks(&self.tasks).remove(&handle) {
            task.abort();
            tracing::debug!("Cancelled alarm handle {}", handle);
        }
        Ok(())
    }

    fn exact_supported(&self) -> bool {
        self.exact
    }
}
