//! Board error types

use thiserror::Error;

use crate::store::StoreError;
use crate::types::TileId;

/// Errors surfaced by board operations
#[derive(Error, Debug)]
pub enum BoardError {
    /// Persistence backend could not be opened
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A store operation failed after the backend was opened
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Settings document is not valid JSON or not an object
    #[error("Malformed settings document: {0}")]
    MalformedImport(String),

    /// Operation addressed a tile that does not exist
    #[error("Tile not found: {0}")]
    TileNotFound(TileId),
}

/// Result type for board operations
pub type BoardResult<T> = Result<T, BoardError>;
