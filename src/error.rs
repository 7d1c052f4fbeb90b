//! Error types for the packet document layer.
//!
//! The pure sequencer never fails; these errors come from the document,
//! codec and targeted-write paths around it.

use thiserror::Error;

/// Result type alias for packet operations.
pub type PacketResult<T> = Result<T, PacketError>;

/// Errors that can occur while loading, editing or saving a packet.
#[derive(Error, Debug)]
pub enum PacketError {
    /// Automerge error during document operations.
    #[error("Automerge error: {0}")]
    Automerge(#[from] automerge::AutomergeError),

    /// Autosurgeon hydration error.
    #[error("Hydration error: {0}")]
    Hydrate(#[from] autosurgeon::HydrateError),

    /// Autosurgeon reconcile error.
    #[error("Reconcile error: {0}")]
    Reconcile(#[from] autosurgeon::ReconcileError),

    /// JSON encoding or decoding of the persisted page list failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Page not found in the document.
    #[error("Page not found: {0}")]
    PageNotFound(String),

    /// Field not found in a page or the document root.
    #[error("Field not found: {0}")]
    FieldNotFound(String),

    /// Schema violation - document structure is invalid.
    #[error("Schema violation: {0}")]
    SchemaViolation(String),
}

impl PacketError {
    /// Creates a PageNotFound error.
    pub fn page_not_found(id: impl Into<String>) -> Self {
        Self::PageNotFound(id.into())
    }

    /// Creates a FieldNotFound error.
    pub fn field_not_found(field: impl Into<String>) -> Self {
        Self::FieldNotFound(field.into())
    }

    /// Creates a SchemaViolation error.
    pub fn schema_violation(msg: impl Into<String>) -> Self {
        Self::SchemaViolation(msg.into())
    }
}
