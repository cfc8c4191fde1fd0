//! Request-scoped storage for uploaded images.
//!
//! Every request writes its upload to its own uniquely named file, so
//! concurrent requests never observe each other's bytes. The file lives
//! exactly as long as the returned [`TransientImage`] and is removed when it
//! drops, whichever way the request ends.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tracing::debug;
use uuid::Uuid;

/// Hands out request-scoped upload files under one directory.
#[derive(Debug, Clone)]
pub struct TransientStorage {
    root: PathBuf,
}

impl TransientStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `bytes` to a fresh file named after `request_id`.
    pub async fn persist(&self, request_id: Uuid, bytes: Vec<u8>) -> io::Result<TransientImage> {
        let root = self.root.clone();

        // Blocking filesystem work stays off the async workers
        tokio::task::spawn_blocking(move || {
            std::fs::create_dir_all(&root)?;

            let mut file = tempfile::Builder::new()
                .prefix(&format!("moodtunes-{}-", request_id))
                .suffix(".img")
                .tempfile_in(&root)?;
            file.write_all(&bytes)?;
            file.flush()?;

            let path = file.into_temp_path();
            debug!("Persisted {} bytes to {}", bytes.len(), path.display());
            Ok(TransientImage { path, request_id })
        })
        .await
        .map_err(io::Error::other)?
    }
}

/// An upload on disk, deleted on drop.
#[derive(Debug)]
pub struct TransientImage {
    path: TempPath,
    request_id: Uuid,
}

impl TransientImage {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }
}
