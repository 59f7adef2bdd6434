//! Content-addressed media storage
//!
//! Imported attachment bytes (photos, audio clips, video, arbitrary
//! files) are stored under a per-kind directory using the SHA-256 hash of
//! the content as the filename, and referenced from the database by an
//! opaque `media://<kind>/<hash>` URI. Writing the same bytes twice yields
//! the same URI.

use crate::error::{AppError, Result};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;

const URI_SCHEME: &str = "media://";

/// Kind of imported media, mapped to a storage subdirectory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Picture,
    Audio,
    Video,
    File,
}

impl MediaKind {
    fn dir(self) -> &'static str {
        match self {
            MediaKind::Picture => "pictures",
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
            MediaKind::File => "files",
        }
    }

    fn from_dir(dir: &str) -> Option<Self> {
        match dir {
            "pictures" => Some(MediaKind::Picture),
            "audio" => Some(MediaKind::Audio),
            "video" => Some(MediaKind::Video),
            "files" => Some(MediaKind::File),
            _ => None,
        }
    }
}

/// Content-addressed media store
#[derive(Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Create the per-kind directories
    pub async fn initialize(&self) -> Result<()> {
        for kind in [
            MediaKind::Picture,
            MediaKind::Audio,
            MediaKind::Video,
            MediaKind::File,
        ] {
            fs::create_dir_all(self.root.join(kind.dir())).await?;
        }
        tracing::info!("Media store initialized at: {:?}", self.root);
        Ok(())
    }

    /// Import media bytes, returning the `media://` URI for them
    pub async fn import(&self, kind: MediaKind, data: &[u8]) -> Result<String> {
        let hash = content_hash(data);
        let uri = format!("{}{}/{}", URI_SCHEME, kind.dir(), hash);
        let path = self.root.join(kind.dir()).join(&hash);

        if fs::try_exists(&path).await? {
            tracing::debug!("Media already stored: {}", uri);
            return Ok(uri);
        }

        // Write through a temp file so a crash mid-write never leaves a
        // half-written object under its final name.
        let temp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        fs::rename(&temp_path, &path).await?;

        tracing::debug!("Imported media: {} ({} bytes)", uri, data.len());
        Ok(uri)
    }

    /// Read media bytes back by URI
    pub async fn read(&self, uri: &str) -> Result<Vec<u8>> {
        let path = self.resolve(uri)?;
        if !fs::try_exists(&path).await? {
            return Err(AppError::MediaStore(format!("Media not found: {}", uri)));
        }
        Ok(fs::read(&path).await?)
    }

    /// Whether the store holds the media a URI points at
    pub async fn exists(&self, uri: &str) -> Result<bool> {
        let path = self.resolve(uri)?;
        Ok(fs::try_exists(&path).await?)
    }

    /// Delete stored media. Missing media is not an error.
    pub async fn delete(&self, uri: &str) -> Result<()> {
        let path = self.resolve(uri)?;
        if fs::try_exists(&path).await? {
            fs::remove_file(&path).await?;
            tracing::debug!("Deleted media: {}", uri);
        }
        Ok(())
    }

    /// Whether a URI belongs to this store at all. External URIs (e.g.
    /// file-picker paths) are attached verbatim and never resolved here.
    pub fn owns(uri: &str) -> bool {
        uri.starts_with(URI_SCHEME)
    }

    fn resolve(&self, uri: &str) -> Result<PathBuf> {
        let rest = uri
            .strip_prefix(URI_SCHEME)
            .ok_or_else(|| AppError::MediaStore(format!("Not a media URI: {}", uri)))?;

        let (dir, hash) = rest
            .split_once('/')
            .ok_or_else(|| AppError::MediaStore(format!("Malformed media URI: {}", uri)))?;

        let kind = MediaKind::from_dir(dir)
            .ok_or_else(|| AppError::MediaStore(format!("Unknown media kind: {}", dir)))?;

        if hash.len() != 64 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AppError::MediaStore(format!("Malformed media URI: {}", uri)));
        }

        Ok(self.root.join(kind.dir()).join(hash))
    }
}

fn content_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
