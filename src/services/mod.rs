//! Services module
//!
//! Business logic coordinating the repository, the alarm service, and the
//! media store.

pub mod attachments;
pub mod boot;
pub mod notes;
pub mod reminders;
pub mod scheduler;

pub use attachments::AttachmentsService;
pub use boot::{BootReconciler, ReconcileSummary};
pub use notes::NotesService;
pub use reminders::RemindersService;
pub use scheduler::TriggerScheduler;
