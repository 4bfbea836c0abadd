//! Local filesystem storage for attachment bytes.

use std::path::{Path, PathBuf};

use ideaflow_core::types::DbId;

use crate::models::attachment::{Attachment, FileUpload};
use crate::store::StoreResult;

/// Writes uploads under `<root>/<entity_id>/<uuid>-<file name>` and hands out
/// URLs under `url_prefix`.
#[derive(Debug, Clone)]
pub struct LocalAttachmentStorage {
    root: PathBuf,
    url_prefix: String,
}

impl LocalAttachmentStorage {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persist the file and return its public reference.
    pub async fn save(&self, entity_id: DbId, file: FileUpload) -> StoreResult<Attachment> {
        let safe_name = sanitize_file_name(&file.file_name);
        let stored_name = format!("{}-{safe_name}", uuid::Uuid::new_v4());

        let dir = self.root.join(entity_id.to_string());
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&stored_name), &file.bytes).await?;

        tracing::debug!(
            entity_id,
            file_name = %file.file_name,
            size = file.bytes.len(),
            "Attachment stored"
        );

        Ok(Attachment {
            file_name: file.file_name,
            url: format!(
                "{}/{entity_id}/{stored_name}",
                self.url_prefix.trim_end_matches('/')
            ),
        })
    }
}

/// Keep only characters that are safe in a single path segment.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_path_components() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "_.._etc_passwd");
        assert_eq!(sanitize_file_name("plan v2.pdf"), "plan_v2.pdf");
        assert_eq!(sanitize_file_name("..."), "file");
    }

    #[tokio::test]
    async fn save_writes_bytes_under_entity_dir() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalAttachmentStorage::new(dir.path(), "/attachments/");

        let attachment = storage
            .save(
                42,
                FileUpload {
                    file_name: "notes.txt".into(),
                    content_type: Some("text/plain".into()),
                    bytes: b"hello".to_vec(),
                },
            )
            .await
            .unwrap();

        assert_eq!(attachment.file_name, "notes.txt");
        assert!(attachment.url.starts_with("/attachments/42/"));
        assert!(attachment.url.ends_with("-notes.txt"));

        let stored = attachment.url.rsplit('/').next().unwrap();
        let bytes = std::fs::read(dir.path().join("42").join(stored)).unwrap();
        assert_eq!(bytes, b"hello");
    }
}
