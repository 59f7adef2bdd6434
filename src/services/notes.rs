//! Notes service
//!
//! High-level operations for plain notes and the combined entry feed.

use crate::database::{CreateNoteRequest, Entry, Note, Repository, UpdateNoteRequest};
use crate::error::Result;

/// Service for managing notes
#[derive(Clone)]
pub struct NotesService {
    repo: Repository,
}

impl NotesService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Create a new note
    pub async fn create_note(&self, title: String, body: String) -> Result<Note> {
        tracing::info!("Creating note: {}", title);

        let note = self.repo.create_note(CreateNoteRequest { title, body }).await?;

        tracing::info!("Note created: {}", note.id);
        Ok(note)
    }

    /// Get a note by ID
    pub async fn get_note(&self, id: i64) -> Result<Note> {
        self.repo.get_note(id).await
    }

    /// List all notes
    pub async fn list_notes(&self) -> Result<Vec<Note>> {
        self.repo.list_notes().await
    }

    /// Update a note
    pub async fn update_note(
        &self,
        id: i64,
        title: Option<String>,
        body: Option<String>,
    ) -> Result<Note> {
        tracing::debug!("Updating note: {}", id);
        self.repo.update_note(UpdateNoteRequest { id, title, body }).await
    }

    /// Delete a note
    pub async fn delete_note(&self, id: i64) -> Result<()> {
        tracing::info!("Deleting note: {}", id);
        self.repo.delete_note(id).await
    }

    /// Case-insensitive substring search over titles and bodies
    pub async fn search_notes(&self, query: &str) -> Result<Vec<Note>> {
        let query_lower = query.to_lowercase();

        let filtered = self
            .list_notes()
            .await?
            .into_iter()
            .filter(|note| {
                note.title.to_lowercase().contains(&query_lower)
                    || note.body.to_lowercase().contains(&query_lower)
            })
            .collect();

        Ok(filtered)
    }

    /// Notes and reminders as one chronological feed
    pub async fn list_entries(&self) -> Result<Vec<Entry>> {
        self.repo.list_entries().await
    }
}
