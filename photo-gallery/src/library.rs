//! Port to the host photo library
//!
//! The gallery never talks to a platform photo API directly. Everything it
//! needs from the host (authorization, ordered fetches, favorites, image
//! decoding and permanent deletion) goes through [`PhotoLibrary`].

use crate::error::LibraryError;
use crate::models::{AlbumSource, AssetId, ImageSize, LibraryAsset};
use async_trait::async_trait;
use image::DynamicImage;
use std::sync::Arc;

/// Photo library access level granted by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationStatus {
    NotDetermined,
    Restricted,
    Denied,
    Authorized,
    Limited,
}

/// Ordered snapshot of library photos, fixed at fetch time
#[derive(Debug, Clone, Default)]
pub struct FetchResult {
    assets: Arc<[LibraryAsset]>,
}

impl FetchResult {
    pub fn new(assets: Vec<LibraryAsset>) -> Self {
        Self {
            assets: assets.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&LibraryAsset> {
        self.assets.get(position)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LibraryAsset> {
        self.assets.iter()
    }
}

/// Result of fetching one album
#[derive(Debug, Clone, Default)]
pub struct FetchedAlbum {
    pub title: Option<String>,
    pub assets: FetchResult,
}

#[async_trait]
pub trait PhotoLibrary: Send + Sync {
    fn authorization_status(&self) -> AuthorizationStatus;

    /// Asks the user for read/write access. May show a system prompt.
    async fn request_authorization(&self) -> AuthorizationStatus;

    /// Fetches the photos of an album, newest first
    async fn fetch_album(&self, source: &AlbumSource) -> Result<FetchedAlbum, LibraryError>;

    async fn set_favorite(&self, id: &AssetId, is_favorite: bool) -> Result<(), LibraryError>;

    /// Decodes a photo scaled to fit `target`
    async fn load_image(&self, id: &AssetId, target: ImageSize)
        -> Result<DynamicImage, LibraryError>;

    /// Permanently deletes a photo. The host may ask the user to confirm.
    async fn delete_asset(&self, id: &AssetId) -> Result<(), LibraryError>;
}

/// Returns true when the gallery may read and modify the library
pub async fn check_authorization(library: &dyn PhotoLibrary) -> bool {
    match library.authorization_status() {
        AuthorizationStatus::Authorized => {
            log::debug!("Photo library access authorized.");
            true
        }
        AuthorizationStatus::NotDetermined => {
            log::debug!("Photo library access not determined.");
            library.request_authorization().await == AuthorizationStatus::Authorized
        }
        AuthorizationStatus::Denied => {
            log::debug!("Photo library access denied.");
            false
        }
        AuthorizationStatus::Limited => {
            log::debug!("Photo library access limited.");
            false
        }
        AuthorizationStatus::Restricted => {
            log::debug!("Photo library access restricted.");
            false
        }
    }
}
