//! Repository layer for database operations
//!
//! CRUD for notes, reminders, and attachments, plus the live
//! pending-reminder stream the UI and the boot reconciler consume.

use super::models::*;
use crate::error::{AppError, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
    pending_tx: Arc<watch::Sender<Vec<Reminder>>>,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        let (pending_tx, _) = watch::channel(Vec::new());
        Self {
            pool,
            pending_tx: Arc::new(pending_tx),
        }
    }

    // ===== Notes =====

    /// Create a new note
    pub async fn create_note(&self, req: CreateNoteRequest) -> Result<Note> {
        let now = Utc::now();

        let note = sqlx::query_as::<_, Note>(
            r#"
            INSERT INTO notes (title, body, created_at)
            VALUES (?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&req.title)
        .bind(&req.body)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created note: {}", note.id);
        Ok(note)
    }

    /// Get a note by ID
    pub async fn get_note(&self, id: i64) -> Result<Note> {
        sqlx::query_as::<_, Note>("SELECT * FROM notes WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NoteNotFound(id))
    }

    /// List all notes, newest first
    pub async fn list_notes(&self) -> Result<Vec<Note>> {
        let notes = sqlx::query_as::<_, Note>(
            r#"
            SELECT * FROM notes ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(notes)
    }

    /// Update a note. Absent fields keep their current value.
    pub async fn update_note(&self, req: UpdateNoteRequest) -> Result<Note> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE notes
            SET title = COALESCE(?, title), body = COALESCE(?, body)
            WHERE id = ?
            "#,
        )
        .bind(&req.title)
        .bind(&req.body)
        .bind(req.id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NoteNotFound(req.id));
        }

        self.get_note(req.id).await
    }

    /// Delete a note
    pub async fn delete_note(&self, id: i64) -> Result<()> {
        let rows = sqlx::query("DELETE FROM notes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::NoteNotFound(id));
        }

        tracing::debug!("Deleted note: {}", id);
        Ok(())
    }

    // ===== Reminders =====

    /// Create a reminder. The store assigns the id.
    pub async fn create_reminder(&self, req: CreateReminderRequest) -> Result<Reminder> {
        let now = Utc::now();
        let alerts_json = serde_json::to_string(&req.additional_alerts)?;

        let row = sqlx::query_as::<_, ReminderRow>(
            r#"
            INSERT INTO reminders
                (title, description, due_at, additional_alerts, completed,
                 scheduled_alert_count, created_at)
            VALUES (?, ?, ?, ?, 0, 0, ?)
            RETURNING *
            "#,
        )
        .bind(&req.title)
        .bind(&req.description)
        .bind(req.due_at)
        .bind(&alerts_json)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        let reminder = row.into_reminder()?;
        tracing::debug!("Created reminder: {}", reminder.id);

        self.refresh_pending().await?;
        Ok(reminder)
    }

    /// Get a reminder by ID, or None if it does not exist
    pub async fn get_reminder(&self, id: i64) -> Result<Option<Reminder>> {
        let row = sqlx::query_as::<_, ReminderRow>("SELECT * FROM reminders WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(ReminderRow::into_reminder).transpose()
    }

    /// List all reminders ordered by due time
    pub async fn list_reminders(&self) -> Result<Vec<Reminder>> {
        let rows = sqlx::query_as::<_, ReminderRow>(
            r#"
            SELECT * FROM reminders ORDER BY due_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ReminderRow::into_reminder).collect()
    }

    /// List non-completed reminders ordered by due time
    pub async fn list_pending_reminders(&self) -> Result<Vec<Reminder>> {
        let rows = sqlx::query_as::<_, ReminderRow>(
            r#"
            SELECT * FROM reminders WHERE completed = 0 ORDER BY due_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ReminderRow::into_reminder).collect()
    }

    /// Subscribe to the live pending-reminder list. The receiver holds the
    /// current list and updates after every reminder mutation.
    pub async fn subscribe_pending(&self) -> Result<watch::Receiver<Vec<Reminder>>> {
        self.refresh_pending().await?;
        Ok(self.pending_tx.subscribe())
    }

    /// Update a reminder's user-editable fields.
    ///
    /// `scheduled_alert_count` is deliberately not written here; it only
    /// changes through [`Repository::set_scheduled_alert_count`] after a
    /// schedule pass.
    pub async fn update_reminder(&self, reminder: &Reminder) -> Result<()> {
        let alerts_json = serde_json::to_string(&reminder.additional_alerts)?;

        let rows = sqlx::query(
            r#"
            UPDATE reminders
            SET title = ?, description = ?, due_at = ?, additional_alerts = ?,
                completed = ?
            WHERE id = ?
            "#,
        )
        .bind(&reminder.title)
        .bind(&reminder.description)
        .bind(reminder.due_at)
        .bind(&alerts_json)
        .bind(reminder.completed)
        .bind(reminder.id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(AppError::ReminderNotFound(reminder.id));
        }

        tracing::debug!("Updated reminder: {}", reminder.id);
        self.refresh_pending().await
    }

    /// Record how many additional-alert triggers the last schedule pass
    /// registered for this reminder.
    pub async fn set_scheduled_alert_count(&self, id: i64, count: usize) -> Result<()> {
        let rows = sqlx::query("UPDATE reminders SET scheduled_alert_count = ? WHERE id = ?")
            .bind(count as i64)
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::ReminderNotFound(id));
        }

        Ok(())
    }

    /// Delete a reminder
    pub async fn delete_reminder(&self, id: i64) -> Result<()> {
        let rows = sqlx::query("DELETE FROM reminders WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::ReminderNotFound(id));
        }

        tracing::debug!("Deleted reminder: {}", id);
        self.refresh_pending().await
    }

    async fn refresh_pending(&self) -> Result<()> {
        let pending = self.list_pending_reminders().await?;
        self.pending_tx.send_replace(pending);
        Ok(())
    }

    // ===== Combined feed =====

    /// All notes and reminders as one feed, newest timestamp first
    pub async fn list_entries(&self) -> Result<Vec<Entry>> {
        let notes = self.list_notes().await?;
        let reminders = self.list_reminders().await?;

        let mut entries: Vec<Entry> = notes
            .into_iter()
            .map(Entry::Note)
            .chain(reminders.into_iter().map(Entry::Reminder))
            .collect();

        entries.sort_by_key(|entry| std::cmp::Reverse(entry.timestamp()));
        Ok(entries)
    }

    // ===== Attachments =====

    /// Attach a URI to a note or reminder, appended at the end of the
    /// owner's attachment list
    pub async fn add_attachment(
        &self,
        owner: AttachmentOwner,
        uri: &str,
        description: &str,
    ) -> Result<Attachment> {
        let (column, owner_id) = owner_column(owner);
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let position: i64 = sqlx::query_scalar(&format!(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM attachments WHERE {} = ?",
            column
        ))
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        let attachment = sqlx::query_as::<_, Attachment>(&format!(
            r#"
            INSERT INTO attachments (id, {}, uri, description, position, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
            column
        ))
        .bind(&id)
        .bind(owner_id)
        .bind(uri)
        .bind(description)
        .bind(position)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created attachment: {} ({} {})", id, column, owner_id);
        Ok(attachment)
    }

    /// List an owner's attachments in insertion order
    pub async fn list_attachments(&self, owner: AttachmentOwner) -> Result<Vec<Attachment>> {
        let (column, owner_id) = owner_column(owner);

        let attachments = sqlx::query_as::<_, Attachment>(&format!(
            "SELECT * FROM attachments WHERE {} = ? ORDER BY position ASC",
            column
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(attachments)
    }

    /// Delete an attachment, returning its URI so the caller can release
    /// the underlying media
    pub async fn delete_attachment(&self, id: &str) -> Result<String> {
        let uri: String = sqlx::query_scalar("SELECT uri FROM attachments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::Generic(format!("Attachment not found: {}", id)))?;

        sqlx::query("DELETE FROM attachments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        tracing::debug!("Deleted attachment: {}", id);
        Ok(uri)
    }
}

fn owner_column(owner: AttachmentOwner) -> (&'static str, i64) {
    match owner {
        AttachmentOwner::Note(id) => ("note_id", id),
        AttachmentOwner::Reminder(id) => ("reminder_id", id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::schema::initialize_database;
    use chrono::Duration;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_repo() -> Repository {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap();

        initialize_database(&pool).await.unwrap();

        Repository::new(pool)
    }

    fn reminder_request(title: &str, alerts: Vec<chrono::DateTime<Utc>>) -> CreateReminderRequest {
        CreateReminderRequest {
            title: title.to_string(),
            description: String::new(),
            due_at: Utc::now() + Duration::hours(1),
            additional_alerts: alerts,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_note() {
        let repo = create_test_repo().await;

        let note = repo
            .create_note(CreateNoteRequest {
                title: "Test Note".to_string(),
                body: "Hello".to_string(),
            })
            .await
            .unwrap();

        assert!(note.id > 0);

        let fetched = repo.get_note(note.id).await.unwrap();
        assert_eq!(fetched.title, "Test Note");
        assert_eq!(fetched.body, "Hello");
    }

    #[tokio::test]
    async fn test_update_note() {
        let repo = create_test_repo().await;

        let note = repo
            .create_note(CreateNoteRequest {
                title: "Original".to_string(),
                body: String::new(),
            })
            .await
            .unwrap();

        let updated = repo
            .update_note(UpdateNoteRequest {
                id: note.id,
                title: Some("Updated".to_string()),
                body: None,
            })
            .await
            .unwrap();

        assert_eq!(updated.title, "Updated");
    }

    #[tokio::test]
    async fn test_delete_note() {
        let repo = create_test_repo().await;

        let note = repo
            .create_note(CreateNoteRequest {
                title: "To Delete".to_string(),
                body: String::new(),
            })
            .await
            .unwrap();

        repo.delete_note(note.id).await.unwrap();

        assert!(repo.get_note(note.id).await.is_err());
        assert!(matches!(
            repo.delete_note(note.id).await,
            Err(AppError::NoteNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_reminder_alerts_roundtrip() {
        let repo = create_test_repo().await;

        let alerts = vec![
            Utc::now() + Duration::minutes(30),
            Utc::now() + Duration::minutes(45),
        ];
        let reminder = repo
            .create_reminder(reminder_request("Pay rent", alerts.clone()))
            .await
            .unwrap();

        let fetched = repo.get_reminder(reminder.id).await.unwrap().unwrap();
        assert_eq!(fetched.additional_alerts, alerts);
        assert!(!fetched.completed);
        assert_eq!(fetched.scheduled_alert_count, 0);
    }

    #[tokio::test]
    async fn test_get_reminder_absent() {
        let repo = create_test_repo().await;
        assert!(repo.get_reminder(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_pending_filters_and_orders() {
        let repo = create_test_repo().await;

        let later = repo
            .create_reminder(CreateReminderRequest {
                title: "later".to_string(),
                description: String::new(),
                due_at: Utc::now() + Duration::hours(2),
                additional_alerts: vec![],
            })
            .await
            .unwrap();
        let sooner = repo
            .create_reminder(CreateReminderRequest {
                title: "sooner".to_string(),
                description: String::new(),
                due_at: Utc::now() + Duration::hours(1),
                additional_alerts: vec![],
            })
            .await
            .unwrap();

        let mut done = later.clone();
        done.completed = true;
        repo.update_reminder(&done).await.unwrap();

        let pending = repo.list_pending_reminders().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, sooner.id);

        let all = repo.list_reminders().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, sooner.id);
    }

    #[tokio::test]
    async fn test_scheduled_alert_count_persists() {
        let repo = create_test_repo().await;

        let reminder = repo
            .create_reminder(reminder_request("counted", vec![]))
            .await
            .unwrap();

        repo.set_scheduled_alert_count(reminder.id, 7).await.unwrap();

        let fetched = repo.get_reminder(reminder.id).await.unwrap().unwrap();
        assert_eq!(fetched.scheduled_alert_count, 7);

        // Field updates must not clobber the count.
        repo.update_reminder(&fetched).await.unwrap();
        let fetched = repo.get_reminder(reminder.id).await.unwrap().unwrap();
        assert_eq!(fetched.scheduled_alert_count, 7);
    }

    #[tokio::test]
    async fn test_pending_subscription_tracks_mutations() {
        let repo = create_test_repo().await;

        let rx = repo.subscribe_pending().await.unwrap();
        assert!(rx.borrow().is_empty());

        let reminder = repo
            .create_reminder(reminder_request("watched", vec![]))
            .await
            .unwrap();
        assert_eq!(rx.borrow().len(), 1);

        repo.delete_reminder(reminder.id).await.unwrap();
        assert!(rx.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_attachments_per_owner_in_order() {
        let repo = create_test_repo().await;

        let note = repo
            .create_note(CreateNoteRequest {
                title: "n".to_string(),
                body: String::new(),
            })
            .await
            .unwrap();
        let reminder = repo
            .create_reminder(reminder_request("r", vec![]))
            .await
            .unwrap();

        repo.add_attachment(AttachmentOwner::Note(note.id), "media://pictures/a", "first")
            .await
            .unwrap();
        repo.add_attachment(AttachmentOwner::Note(note.id), "media://pictures/b", "second")
            .await
            .unwrap();
        repo.add_attachment(
            AttachmentOwner::Reminder(reminder.id),
            "media://audio/c",
            "memo",
        )
        .await
        .unwrap();

        let note_attachments = repo
            .list_attachments(AttachmentOwner::Note(note.id))
            .await
            .unwrap();
        assert_eq!(note_attachments.len(), 2);
        assert_eq!(note_attachments[0].description, "first");
        assert_eq!(note_attachments[1].description, "second");

        let reminder_attachments = repo
            .list_attachments(AttachmentOwner::Reminder(reminder.id))
            .await
            .unwrap();
        assert_eq!(reminder_attachments.len(), 1);
        assert_eq!(reminder_attachments[0].uri, "media://audio/c");
    }

    #[tokio::test]
    async fn test_delete_attachment_returns_uri() {
        let repo = create_test_repo().await;

        let note = repo
            .create_note(CreateNoteRequest {
                title: "n".to_string(),
                body: String::new(),
            })
            .await
            .unwrap();
        let attachment = repo
            .add_attachment(AttachmentOwner::Note(note.id), "media://files/x", "")
            .await
            .unwrap();

        let uri = repo.delete_attachment(&attachment.id).await.unwrap();
        assert_eq!(uri, "media://files/x");

        assert!(repo.delete_attachment(&attachment.id).await.is_err());
    }

    #[tokio::test]
    async fn test_entries_feed_is_typed_and_sorted() {
        let repo = create_test_repo().await;

        let note = repo
            .create_note(CreateNoteRequest {
                title: "note".to_string(),
                body: "body".to_string(),
            })
            .await
            .unwrap();
        let reminder = repo
            .create_reminder(reminder_request("reminder", vec![]))
            .await
            .unwrap();

        let entries = repo.list_entries().await.unwrap();
        assert_eq!(entries.len(), 2);

        // The reminder is due an hour out, so it sorts first.
        assert_eq!(entries[0].title(), "reminder");
        assert_eq!(entries[0].due_at(), Some(reminder.due_at));
        assert_eq!(entries[1].title(), "note");
        assert_eq!(entries[1].due_at(), None);
        assert_eq!(entries[1].timestamp(), note.created_at);
    }
}
