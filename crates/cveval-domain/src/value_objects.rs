//! Small value objects shared across entities and ports.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a [`crate::entities::job::Job`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[display("{_0}")]
pub struct JobId(Uuid);

impl JobId {
    /// Generate a new random job id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID (e.g. parsed from a broker message).
    #[must_use]
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for an [`crate::entities::upload::Upload`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[display("{_0}")]
pub struct UploadId(String);

impl UploadId {
    /// Wrap a raw id string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Name of a named vector collection consumed by the RAG retriever.
///
/// Only two collections are used by this system (§4.3): `job_description`
/// and `scoring_rubric`. Modeled as a dedicated type rather than a bare
/// `&str` so a typo in a collection name is caught at compile time at every
/// call site that matches exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum CollectionName {
    /// The job-description embeddings collection.
    #[display("job_description")]
    JobDescription,
    /// The scoring-rubric embeddings collection.
    #[display("scoring_rubric")]
    ScoringRubric,
}

impl CollectionName {
    /// The wire-level collection name used in vector store URLs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::JobDescription => "job_description",
            Self::ScoringRubric => "scoring_rubric",
        }
    }
}
