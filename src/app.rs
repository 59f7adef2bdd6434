//! Application composition root
//!
//! All services are constructed here, explicitly wired together, and
//! owned for the life of the process. There is no global state; a host
//! embeds [`App`] and hands it the platform's alarm service and data
//! directory.

use crate::alarm::{AlarmService, TokioAlarmService};
use crate::database::{create_pool, Repository};
use crate::error::Result;
use crate::notify::LogPresenter;
use crate::services::{
    AttachmentsService, BootReconciler, NotesService, ReconcileSummary, RemindersService,
    TriggerScheduler,
};
use crate::storage::MediaStore;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Central application state holding all services
#[derive(Clone)]
pub struct App {
    pub repo: Repository,
    pub notes: NotesService,
    pub reminders: RemindersService,
    pub attachments: AttachmentsService,
    reconciler: BootReconciler,
}

impl App {
    /// Build the application against a data directory and the host's
    /// alarm service.
    pub async fn init(data_dir: &Path, alarms: Arc<dyn AlarmService>) -> Result<Self> {
        tracing::info!("Initializing application in {:?}", data_dir);

        std::fs::create_dir_all(data_dir)?;

        let pool = create_pool(&data_dir.join("planit.db")).await?;
        let repo = Repository::new(pool);

        let media = MediaStore::new(data_dir.join("media"));
        media.initialize().await?;

        let scheduler = TriggerScheduler::new(alarms);
        let reconciler = BootReconciler::new(repo.clone(), scheduler.clone());

        Ok(Self {
            notes: NotesService::new(repo.clone()),
            reminders: RemindersService::new(repo.clone(), scheduler),
            attachments: AttachmentsService::new(repo.clone(), media),
            repo,
            reconciler,
        })
    }

    /// Headless setup: in-process tokio timers delivering to the log
    pub async fn init_headless(data_dir: &Path) -> Result<Self> {
        let alarms = TokioAlarmService::new(Arc::new(LogPresenter));
        Self::init(data_dir, Arc::new(alarms)).await
    }

    /// Rebuild alarm registrations from the store after a restart.
    ///
    /// Call once during startup and await the result; the summary is the
    /// completion signal for the reconciliation pass.
    pub async fn restore_alarms(&self) -> Result<ReconcileSummary> {
        self.reconciler.reconcile_after_restart().await
    }
}

/// Initialize logging for hosts that have no subscriber of their own.
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "planit=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
