//! Error types shared by the graph, entity and config layers.

use crate::error_codes;

/// Errors surfaced by skillgraph.
///
/// Only [`GraphError::InvalidInput`] is returned from the query and scoring
/// surface. Missing nodes and store failures resolve to empty results there;
/// the other variants show up in store plumbing, build reports and config
/// loading.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    /// Malformed identifier or record, rejected before touching the store
    #[error("invalid {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    /// Edge endpoint does not exist in the graph
    #[error("{label} node '{key}' does not exist")]
    MissingEndpoint { label: String, key: String },

    /// Backing store cannot be reached or failed mid-operation
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Configuration could not be parsed or failed validation
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl GraphError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        GraphError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Recover a typed error from store plumbing; anything else is treated
    /// as the store being unavailable.
    pub fn from_store(err: anyhow::Error) -> Self {
        match err.downcast::<GraphError>() {
            Ok(typed) => typed,
            Err(other) => GraphError::StoreUnavailable(format!("{:#}", other)),
        }
    }

    /// Stable error code, see [`crate::error_codes`]
    pub fn code(&self) -> &'static str {
        match self {
            GraphError::InvalidInput { .. } => error_codes::SKG_IN_001_INVALID_INPUT,
            GraphError::MissingEndpoint { .. } => error_codes::SKG_ST_001_MISSING_ENDPOINT,
            GraphError::StoreUnavailable(_) => error_codes::SKG_ST_002_STORE_UNAVAILABLE,
            GraphError::Config(_) => error_codes::SKG_CF_001_INVALID_CONFIG,
        }
    }
}

/// Reject empty or whitespace-only identifiers at the call boundary.
pub fn require_id(field: &str, value: &str) -> Result<(), GraphError> {
    if value.trim().is_empty() {
        return Err(GraphError::invalid(field, "must not be empty"));
    }
    Ok(())
}
