//! Attachments service
//!
//! Attaches media to notes and reminders. Imported bytes go through the
//! content-addressed media store; externally picked files are attached by
//! their URI as-is.

use crate::database::{Attachment, AttachmentOwner, Repository};
use crate::error::Result;
use crate::storage::{MediaKind, MediaStore};

/// Service for managing attachments
#[derive(Clone)]
pub struct AttachmentsService {
    repo: Repository,
    media: MediaStore,
}

impl AttachmentsService {
    pub fn new(repo: Repository, media: MediaStore) -> Self {
        Self { repo, media }
    }

    /// Import media bytes and attach the resulting URI to an owner
    pub async fn import_media(
        &self,
        owner: AttachmentOwner,
        kind: MediaKind,
        description: &str,
        data: &[u8],
    ) -> Result<Attachment> {
        tracing::info!("Importing {:?} media ({} bytes)", kind, data.len());

        let uri = self.media.import(kind, data).await?;
        let attachment = self.repo.add_attachment(owner, &uri, description).await?;

        tracing::info!("Attachment created: {}", attachment.id);
        Ok(attachment)
    }

    /// Attach an externally managed URI (e.g. a file-picker result)
    /// without copying its bytes
    pub async fn attach_uri(
        &self,
        owner: AttachmentOwner,
        uri: &str,
        description: &str,
    ) -> Result<Attachment> {
        self.repo.add_attachment(owner, uri, description).await
    }

    /// List an owner's attachments in insertion order
    pub async fn list_attachments(&self, owner: AttachmentOwner) -> Result<Vec<Attachment>> {
        self.repo.list_attachments(owner).await
    }

    /// Read back the bytes of an imported attachment
    pub async fn read_media(&self, attachment: &Attachment) -> Result<Vec<u8>> {
        self.media.read(&attachment.uri).await
    }

    /// Remove an attachment. Imported media is released from the store;
    /// external URIs are left untouched.
    pub async fn remove_attachment(&self, attachment_id: &str) -> Result<()> {
        tracing::info!("Removing attachment: {}", attachment_id);

        let uri = self.repo.delete_attachment(attachment_id).await?;
        if MediaStore::owns(&uri) {
            self.media.delete(&uri).await?;
        }

        Ok(())
    }
}
