use catmerge_core::{CoreError, StandardItemId};
use catmerge_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("core error: {0}")]
    Core(#[from] CoreError),

    #[error("tenant not found: {0}")]
    TenantNotFound(String),

    #[error("standard item not found: {0}")]
    StandardItemNotFound(String),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// A requested resolution is itself invalid. Fatal to planning; nothing is
/// committed. Callers branch on the variant, not on message strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("name already in use: {name}")]
    DuplicateName { name: String },

    #[error("order value already in use: {order}")]
    DuplicateOrder { order: i64 },

    #[error("rename resolution for {id} is missing new_name")]
    MissingNewName { id: StandardItemId },

    #[error("reorder resolution for {id} is missing new_order")]
    MissingNewOrder { id: StandardItemId },

    #[error("more than one default item in partition")]
    MultipleDefaults,
}
