// 📎 Uploaded Documents
// Metadata for files attached to a registration (IDs, certificates, receipts).
// The file content itself is never stored, only its name, size and SHA-256.

use crate::error::DocumentError;
use crate::step::Step;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedDocument {
    /// Stable identity (UUID)
    pub id: String,

    /// Step that uploaded this document; re-submitting that step replaces it
    pub step: Step,

    /// What the document is, e.g. "national-id", "business-certificate", "receipt"
    pub kind: String,

    pub file_name: String,

    pub size_bytes: u64,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,

    pub uploaded_at: DateTime<Utc>,
}

impl UploadedDocument {
    /// Create a document record without reading any file
    pub fn new(step: Step, kind: &str, file_name: &str, size_bytes: u64) -> Self {
        UploadedDocument {
            id: uuid::Uuid::new_v4().to_string(),
            step,
            kind: kind.to_string(),
            file_name: file_name.to_string(),
            size_bytes,
            sha256: None,
            uploaded_at: Utc::now(),
        }
    }

    /// Read a file from disk and record its name, size and digest
    pub fn from_file<P: AsRef<Path>>(step: Step, kind: &str, path: P) -> Result<Self, DocumentError> {
        let path = path.as_ref();

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| DocumentError::NoFileName(path.to_path_buf()))?;

        let bytes = fs::read(path).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(UploadedDocument::new(step, kind, &file_name, bytes.len() as u64).with_digest(&bytes))
    }

    pub fn with_digest(mut self, bytes: &[u8]) -> Self {
        self.sha256 = Some(sha256_hex(bytes));
        self
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
