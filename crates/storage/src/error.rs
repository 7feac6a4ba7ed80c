use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unique constraint violation: {detail}")]
    UniqueViolation { detail: String },

    #[error("item is protected: {0}")]
    ProtectedItem(String),

    #[error("core error: {0}")]
    Core(#[from] catmerge_core::CoreError),
}
