//! Storage module
//!
//! Content-addressed media storage for attachment bytes.

pub mod media_store;

pub use media_store::{MediaKind, MediaStore};
