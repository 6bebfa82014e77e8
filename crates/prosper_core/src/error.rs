use crate::entities::EntityKind;
use thiserror::Error;

/// Failures raised by an [`EntityStore`](crate::store::EntityStore) backend
/// or while mapping records to typed entities.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} record not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("invalid field name in query: {0:?}")]
    InvalidField(String),

    #[error("{kind} payload must be a JSON object")]
    NotAnObject { kind: EntityKind },

    #[error("failed to decode {kind} record: {source}")]
    Decode {
        kind: EntityKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode {kind} record: {source}")]
    Encode {
        kind: EntityKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Failures of a single job invocation (or of one user's unit of work).
#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("LLM call failed: {0:#}")]
    Llm(anyhow::Error),

    #[error("LLM reply did not match the expected shape: {0}")]
    MalformedReply(String),

    #[error("caller is not authenticated")]
    Unauthorized,
}
