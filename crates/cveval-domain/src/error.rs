//! The stable error taxonomy shared by every layer of the evaluation pipeline.
//!
//! Variant names match the error kinds named in the wire contract: changing
//! them is a compatibility event because the worker runtime's retry policy
//! (§7 of the design doc) branches on `ErrorKind`, not on the error message.

use thiserror::Error;

/// Result alias used throughout the pipeline.
pub type Result<T> = std::result::Result<T, Error>;

/// Stable classification of an error, independent of its textual message.
///
/// The worker runtime and the chain orchestrator both match on this to
/// decide retry behavior; see `ErrorKind::is_broker_retryable` and
/// `ErrorKind::is_task_retryable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ErrorKind {
    /// The broker message failed to deserialize or was missing required fields.
    #[display("invalid_payload")]
    InvalidPayload,
    /// A referenced upload id does not resolve to stored text.
    #[display("upload_missing")]
    UploadMissing,
    /// The LLM endpoint could not be reached or returned a non-content error.
    #[display("llm_transport")]
    LlmTransport,
    /// The LLM output was not valid JSON, or did not match the expected shape.
    #[display("llm_schema")]
    LlmSchema,
    /// A numeric field was present but outside its valid range even after clamping attempts.
    #[display("llm_out_of_range")]
    LlmOutOfRange,
    /// A required string field was empty.
    #[display("llm_empty_field")]
    LlmEmptyField,
    /// Chain-of-thought leakage was detected in a terminal-answer field.
    #[display("llm_cot_leak")]
    LlmCotLeak,
    /// The embedding provider failed.
    #[display("embed_failed")]
    EmbedFailed,
    /// The vector store search failed.
    #[display("vector_search_failed")]
    VectorSearchFailed,
    /// A repository operation failed.
    #[display("persistence_failed")]
    PersistenceFailed,
    /// The circuit breaker for this endpoint is open.
    #[display("breaker_open")]
    BreakerOpen,
    /// The operation was cancelled by the caller (e.g. worker shutdown).
    #[display("cancelled")]
    Cancelled,
}

impl ErrorKind {
    /// In-task (orchestrator) bounded retry: schema-shaped failures only.
    #[must_use]
    pub fn is_task_retryable(self) -> bool {
        matches!(
            self,
            Self::LlmSchema | Self::LlmOutOfRange | Self::LlmEmptyField
        )
    }

    /// Broker-level retry: transport/availability failures, not content failures.
    #[must_use]
    pub fn is_broker_retryable(self) -> bool {
        matches!(
            self,
            Self::LlmTransport
                | Self::EmbedFailed
                | Self::VectorSearchFailed
                | Self::BreakerOpen
                | Self::PersistenceFailed
        )
    }

    /// Fatal: the job should fail immediately with no retry at any level.
    #[must_use]
    pub fn is_fatal(self) -> bool {
        matches!(self, Self::InvalidPayload | Self::UploadMissing)
    }
}

/// Main error type for the evaluation pipeline.
#[derive(Error, Debug)]
pub enum Error {
    /// A broker message was malformed or missing a required field.
    #[error("invalid task payload: {message}")]
    InvalidPayload {
        /// Description of what was invalid.
        message: String,
    },

    /// A referenced upload could not be found.
    #[error("upload not found: {upload_id}")]
    UploadMissing {
        /// The id that was looked up.
        upload_id: String,
    },

    /// The LLM endpoint failed at the transport level (network, HTTP status, timeout).
    #[error("LLM transport error calling {operation}: {message}")]
    LlmTransport {
        /// Which chain step or prompt family was being invoked.
        operation: String,
        /// Description of the transport failure.
        message: String,
    },

    /// The LLM returned text that is not valid JSON.
    #[error("LLM output is not valid JSON: {message}")]
    InvalidJson {
        /// Description of the parse failure.
        message: String,
    },

    /// The LLM JSON did not match the expected schema.
    #[error("LLM output failed schema validation: {message}")]
    SchemaInvalid {
        /// Description of the schema mismatch.
        message: String,
    },

    /// A numeric field remained out of range after clamping was attempted.
    #[error("field {field} out of range: {value}")]
    OutOfRange {
        /// The field name.
        field: String,
        /// The offending value, rendered for diagnostics.
        value: String,
    },

    /// A required field was empty.
    #[error("field {field} is empty")]
    EmptyField {
        /// The field name.
        field: String,
    },

    /// Chain-of-thought leakage was detected.
    #[error("chain-of-thought leakage detected in field {field}")]
    CotDetected {
        /// The field where leakage was found.
        field: String,
    },

    /// The embedding provider failed.
    #[error("embedding provider error: {message}")]
    EmbedFailed {
        /// Description of the failure.
        message: String,
    },

    /// The vector store search failed.
    #[error("vector store search error: {message}")]
    VectorSearchFailed {
        /// Description of the failure.
        message: String,
    },

    /// A repository operation failed.
    #[error("persistence error during {operation}: {message}")]
    PersistenceFailed {
        /// Which repository operation was being performed.
        operation: String,
        /// Description of the failure.
        message: String,
    },

    /// The circuit breaker for this endpoint is currently open.
    #[error("circuit breaker open for {endpoint}/{operation}")]
    BreakerOpen {
        /// The endpoint key.
        endpoint: String,
        /// The operation key.
        operation: String,
    },

    /// The operation was cancelled.
    #[error("operation cancelled: {reason}")]
    Cancelled {
        /// Why it was cancelled.
        reason: String,
    },
}

impl Error {
    /// Stable classification used for retry-policy branching.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidPayload { .. } => ErrorKind::InvalidPayload,
            Self::UploadMissing { .. } => ErrorKind::UploadMissing,
            Self::LlmTransport { .. } => ErrorKind::LlmTransport,
            Self::InvalidJson { .. } | Self::SchemaInvalid { .. } => ErrorKind::LlmSchema,
            Self::OutOfRange { .. } => ErrorKind::LlmOutOfRange,
            Self::EmptyField { .. } => ErrorKind::LlmEmptyField,
            Self::CotDetected { .. } => ErrorKind::LlmCotLeak,
            Self::EmbedFailed { .. } => ErrorKind::EmbedFailed,
            Self::VectorSearchFailed { .. } => ErrorKind::VectorSearchFailed,
            Self::PersistenceFailed { .. } => ErrorKind::PersistenceFailed,
            Self::BreakerOpen { .. } => ErrorKind::BreakerOpen,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }
}
