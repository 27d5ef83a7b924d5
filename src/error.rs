//! Error taxonomy for the memory core.
//!
//! Every public operation returns [`Result`]. Secondary-index failures during a
//! store are not errors: they travel as a [`ConsistencyWarning`] next to the
//! successfully persisted record.

use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by the memory core.
#[derive(Debug, Error)]
pub enum Error {
    /// A memory or relation referenced by id does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Input rejected before any write (unknown enum value, empty content, bad vector width).
    #[error("invalid input: {0}")]
    Validation(String),

    /// Engine-level open/migrate/read/write failure.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Tags or metadata could not be encoded or decoded as JSON.
    #[error("failed to encode record: {0}")]
    Encoding(#[from] serde_json::Error),

    /// The embedding provider failed (transport, auth, malformed response).
    #[error("embedding provider error: {0:#}")]
    Provider(anyhow::Error),

    /// The resolved configuration cannot be used to build an engine.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn memory_not_found(id: &str) -> Self {
        Self::NotFound {
            kind: "memory",
            id: id.to_string(),
        }
    }

    /// `true` for [`Error::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Which secondary write failed after the primary record was persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningStage {
    /// The provider could not embed the content.
    Embed,
    /// The embedding cache or vector index could not be written.
    Index,
}

/// A failed secondary write, reported alongside an otherwise successful result.
#[derive(Debug, Clone, Serialize)]
pub struct ConsistencyWarning {
    pub memory_id: String,
    pub stage: WarningStage,
    pub message: String,
}

impl std::fmt::Display for ConsistencyWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stage = match self.stage {
            WarningStage::Embed => "embedding",
            WarningStage::Index => "index refresh",
        };
        write!(
            f,
            "{stage} failed for memory {}: {} (record saved, not yet searchable)",
            self.memory_id, self.message
        )
    }
}
