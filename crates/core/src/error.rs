use crate::types::DbId;

/// Domain error type shared by every layout engine component.
///
/// Pure validation and repair never produce errors (see
/// [`crate::sanitize`]); only lifecycle operations that hit a capacity
/// limit, an immutability rule, or a persistence failure return `Err`.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
