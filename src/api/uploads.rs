use std::path::{Path, PathBuf};

use axum::extract::Multipart;
use chrono::Utc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::ApiError;

const ALLOWED_EXTENSIONS: [&str; 5] = ["jpeg", "jpg", "png", "gif", "pdf"];

/// A file written below the upload root, addressed by its public URL.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub url: String,
    pub file_name: String,
    pub path: PathBuf,
}

/// Local-disk storage for multipart uploads, served under `/uploads`.
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
    max_file_size: usize,
}

fn extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>, max_file_size: usize) -> Self {
        Self { root: root.into(), max_file_size }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    /// Save every part named `field` into `{root}/{folder}`, at most
    /// `max_files` of them. Other parts are ignored. Nothing is left on disk
    /// when the upload is rejected part-way.
    #[instrument(skip(self, multipart))]
    pub async fn save_files(
        &self,
        multipart: &mut Multipart,
        field: &str,
        folder: &str,
        max_files: usize,
    ) -> Result<Vec<StoredFile>, ApiError> {
        let mut stored = Vec::new();
        match self.write_parts(multipart, field, folder, max_files, &mut stored).await {
            Ok(()) if stored.is_empty() => Err(ApiError::BadRequest("Please upload a file".into())),
            Ok(()) => Ok(stored),
            Err(e) => {
                self.discard(&stored).await;
                Err(e)
            }
        }
    }

    async fn write_parts(
        &self,
        multipart: &mut Multipart,
        field: &str,
        folder: &str,
        max_files: usize,
        stored: &mut Vec<StoredFile>,
    ) -> Result<(), ApiError> {
        let dir = self.root.join(folder);

        while let Some(part) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?
        {
            if part.name() != Some(field) {
                continue;
            }
            if stored.len() == max_files {
                return Err(ApiError::BadRequest(format!("At most {max_files} files may be uploaded")));
            }
            let ext = part
                .file_name()
                .and_then(extension)
                .ok_or_else(|| {
                    ApiError::BadRequest("Only images (JPEG, JPG, PNG, GIF) and PDF files are allowed".into())
                })?;
            let bytes = part.bytes().await.map_err(|e| ApiError::BadRequest(e.body_text()))?;
            if bytes.len() > self.max_file_size {
                return Err(ApiError::BadRequest(format!(
                    "File too large, the limit is {} bytes",
                    self.max_file_size
                )));
            }

            let file_name = format!("{field}-{}-{}.{ext}", Utc::now().timestamp_millis(), Uuid::new_v4().simple());
            let path = dir.join(&file_name);
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| ApiError::Internal(format!("Upload directory unavailable: {e}")))?;
            tokio::fs::write(&path, &bytes)
                .await
                .map_err(|e| ApiError::Internal(format!("Upload failed: {e}")))?;
            debug!(file_name = %file_name, size = bytes.len(), "File stored");

            stored.push(StoredFile { url: format!("/uploads/{folder}/{file_name}"), file_name, path });
        }
        Ok(())
    }

    /// Remove files whose upload was not committed.
    pub async fn discard(&self, files: &[StoredFile]) {
        for file in files {
            if let Err(e) = tokio::fs::remove_file(&file.path).await {
                warn!(file_name = %file.file_name, "Could not remove discarded upload: {e}");
            }
        }
    }
}
