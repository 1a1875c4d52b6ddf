//! Staging of uploaded images.
//!
//! An upload is written to a uniquely named file in the upload directory
//! for the lifetime of one request. [`StagedUpload::cleanup`] removes it
//! on both the success and the error path; dropping the guard removes it
//! if the request task never gets that far.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

/// Filename prefix for staged uploads.
const STAGED_PREFIX: &str = "image-";

/// An image staged on disk for the duration of one request.
#[derive(Debug)]
pub struct StagedUpload {
    file: NamedTempFile,
}

impl StagedUpload {
    /// Writes `bytes` to a fresh file under `dir`, creating `dir` if needed.
    ///
    /// `extension` (without the dot) is appended to the generated name.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory or file cannot be written.
    pub async fn stage(dir: &Path, bytes: Vec<u8>, extension: &str) -> std::io::Result<Self> {
        let dir = dir.to_path_buf();
        let suffix = if extension.is_empty() {
            String::new()
        } else {
            format!(".{extension}")
        };

        tokio::task::spawn_blocking(move || -> std::io::Result<Self> {
            std::fs::create_dir_all(&dir)?;
            let mut file = tempfile::Builder::new()
                .prefix(STAGED_PREFIX)
                .suffix(&suffix)
                .tempfile_in(&dir)?;
            file.write_all(&bytes)?;
            file.flush()?;
            tracing::debug!(path = %file.path().display(), bytes = bytes.len(), "upload staged");
            Ok(Self { file })
        })
        .await
        .map_err(std::io::Error::other)?
    }

    /// Path of the staged file.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Reads the staged image back.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file has vanished or is unreadable.
    pub async fn read(&self) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(self.path()).await
    }

    /// Removes the staged file, logging rather than failing.
    pub fn cleanup(self) {
        let path: PathBuf = self.file.path().to_path_buf();
        match self.file.close() {
            Ok(()) => tracing::debug!(path = %path.display(), "cleaned up upload"),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to clean up upload");
            }
        }
    }
}

/// File extension for an image MIME type, or `""` when unknown.
#[must_use]
pub fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/heic" => "heic",
        "image/bmp" => "bmp",
        _ => "",
    }
}

/// MIME type for an image path, inferred from its extension.
#[must_use]
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "heic" => Some("image/heic"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}
