//! # Photo Gallery
//!
//! A trash-aware, cached photo collection over a host photo library.
//!
//! This crate provides the state layer behind a photo grid and a detail view:
//! - A lazily built position -> asset index over an ordered library fetch
//! - Soft delete into a client-side trash with bounded undo
//! - Permanent deletion of the trash through the host library
//! - An image request cache with prefetch hints, placeholders and cancellation
//!
//! ## Platform Separation
//!
//! The host library is reached through the [`PhotoLibrary`] trait. A SQLite
//! backed [`LocalPhotoLibrary`] is included for desktop builds; platform
//! libraries implement the trait in the application crate.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use photo_gallery::{CollectionConfig, PhotoCollection};
//!
//! let mut collection = PhotoCollection::new(library, CollectionConfig::default());
//! collection.load().await?;
//!
//! let handle = collection.handle(2)?;
//! collection.delete_image(handle)?;
//! collection.revert_last_trash();
//! ```

pub mod collection;
pub mod error;
pub mod image_cache;
pub mod index_cache;
pub mod library;
pub mod local;
pub mod models;
pub mod schema;
pub mod undo;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use collection::{
    ChangeKind, CollectionChange, CollectionConfig, PhotoCollection, TrashPurgeReport,
};
pub use error::{GalleryError, ImageRequestError, LibraryError};
pub use image_cache::{CachedImageManager, ImageCacheConfig, ImageRequest, RequestState};
pub use index_cache::AssetIndexCache;
pub use library::{
    check_authorization, AuthorizationStatus, FetchResult, FetchedAlbum, PhotoLibrary,
};
pub use local::{LocalLibraryConfig, LocalPhotoLibrary};
pub use models::{
    AlbumSource, Asset, AssetHandle, AssetId, ImageResponse, ImageSize, LibraryAsset,
};
pub use schema::init_library_schema;
pub use undo::UndoStack;
