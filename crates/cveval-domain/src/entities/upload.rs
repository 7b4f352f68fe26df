//! The `Upload` entity: read-only in the evaluation core.

use serde::{Deserialize, Serialize};

use crate::value_objects::UploadId;

/// A previously ingested document (CV or project report), already
/// text-extracted by the out-of-scope ingest pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Upload {
    /// Unique identifier.
    pub id: UploadId,
    /// Original filename, kept for diagnostics only.
    pub filename: String,
    /// Extracted plain text body.
    pub text: String,
}

impl Upload {
    /// Construct an upload record.
    #[must_use]
    pub fn new(id: UploadId, filename: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id,
            filename: filename.into(),
            text: text.into(),
        }
    }
}
