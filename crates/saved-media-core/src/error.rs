use saved_media_backend::BackendError;
use saved_media_store::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Signed-in toggles need the backend id; local-only items have none
    #[error("item '{0}' has no backend id and cannot be synced")]
    Unreconcilable(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("credential store: {0}")]
    Credentials(String),
}
