//! Attachment references stored alongside ideas and discussion messages.

use serde::{Deserialize, Serialize};

/// A stored attachment as returned by `upload_attachment`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub file_name: String,
    pub url: String,
}

/// Raw file handed to the store for upload.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}
