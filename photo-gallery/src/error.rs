use crate::models::AssetId;
use thiserror::Error;

/// Errors reported by a host photo library
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Album not found: {0}")]
    MissingAlbum(String),
    #[error("Asset not found: {0}")]
    NotFound(AssetId),
    #[error("Operation cancelled by the user")]
    Cancelled,
    #[error("Image decode error: {0}")]
    Decode(String),
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Other(String),
}

impl From<image::ImageError> for LibraryError {
    fn from(err: image::ImageError) -> Self {
        LibraryError::Decode(err.to_string())
    }
}

/// Errors of the collection and index cache
#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("Photo library access was not authorized")]
    NotAuthorized,
    #[error("Collection has not been loaded")]
    NotLoaded,
    #[error("Position {position} out of range for {count} assets")]
    OutOfRange { position: usize, count: usize },
    #[error("Asset {id} is no longer at position {position}")]
    StaleHandle { position: usize, id: AssetId },
    #[error("Library error: {0}")]
    Library(#[from] LibraryError),
}

/// Terminal failure of an image request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageRequestError {
    #[error("Image could not be decoded: {0}")]
    Decode(String),
    #[error("Image request timed out")]
    TimedOut,
    #[error("Image request was cancelled")]
    Cancelled,
}
