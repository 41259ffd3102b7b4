use crate::config::ConfigError;
use photo_gallery::{GalleryError, ImageRequestError, LibraryError};
use thiserror::Error;

/// Central error type for the PhotoX session layer
#[derive(Debug, Error)]
pub enum AppError {
    /// Collection or index cache error
    #[error("Gallery error: {0}")]
    Gallery(#[from] GalleryError),
    /// Host photo library error
    #[error("Library error: {0}")]
    Library(#[from] LibraryError),
    /// Image could not be delivered
    #[error("Image error: {0}")]
    Image(#[from] ImageRequestError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// User-friendly error messages for the UI
impl AppError {
    pub fn user_message(&self) -> String {
        match self {
            AppError::Gallery(GalleryError::NotAuthorized) => {
                "PhotoX needs access to your photo library. Please allow access in Settings."
                    .to_string()
            }
            AppError::Gallery(GalleryError::Library(LibraryError::Cancelled))
            | AppError::Library(LibraryError::Cancelled) => "Deletion was cancelled.".to_string(),
            AppError::Gallery(_) | AppError::Library(_) => {
                "The photo library could not be read. Please try again.".to_string()
            }
            AppError::Image(_) => "This photo could not be displayed.".to_string(),
            AppError::Config(_) => "The settings file is invalid. Defaults are used.".to_string(),
        }
    }

    pub fn is_not_authorized(&self) -> bool {
        matches!(self, AppError::Gallery(GalleryError::NotAuthorized))
    }
}
