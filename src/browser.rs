//! Full screen photo browsing
//!
//! Tracks which photo the detail view shows and moves between photos while
//! skipping everything that sits in the trash.

use crate::error::AppError;
use photo_gallery::{AssetHandle, GalleryError, ImageRequest, ImageSize, PhotoCollection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhotoBrowser {
    current: AssetHandle,
}

impl PhotoBrowser {
    pub fn new(collection: &mut PhotoCollection, position: usize) -> Result<Self, GalleryError> {
        let current = collection.handle(position)?;
        Ok(Self { current })
    }

    pub fn index(&self) -> usize {
        self.current.position
    }

    pub fn current(&self) -> AssetHandle {
        self.current
    }

    /// Moves to the next photo not in the trash. Stays put if there is none.
    pub fn show_next(&mut self, collection: &mut PhotoCollection) -> bool {
        let count = collection.count();
        let found = (self.current.position + 1..count).find(|p| is_visible(collection, *p));
        self.move_to(collection, found)
    }

    /// Moves to the previous photo not in the trash. Stays put if there is none.
    pub fn show_previous(&mut self, collection: &mut PhotoCollection) -> bool {
        let found = (0..self.current.position)
            .rev()
            .find(|p| is_visible(collection, *p));
        self.move_to(collection, found)
    }

    /// Trashes the shown photo and moves on to a neighbour, preferring the
    /// next one. Returns false when no photo outside the trash is left.
    pub fn trash_current(&mut self, collection: &mut PhotoCollection) -> Result<bool, GalleryError> {
        collection.delete_image(self.current)?;
        Ok(self.show_next(collection) || self.show_previous(collection))
    }

    /// Reverts the last trash action and shows the restored photo
    pub fn undo_trash(&mut self, collection: &mut PhotoCollection) -> Option<AssetHandle> {
        let restored = collection.revert_last_trash()?;
        self.current = restored;
        Some(restored)
    }

    pub async fn toggle_favorite(&self, collection: &mut PhotoCollection) -> Result<bool, AppError> {
        let is_favorite = !collection.asset(self.current.position)?.is_favorite;
        collection.set_favorite(self.current, is_favorite).await?;
        Ok(is_favorite)
    }

    /// Re-syncs the position after a reload moved or removed the shown photo
    pub fn correct_position(&mut self, collection: &mut PhotoCollection) -> bool {
        if let Some(position) = collection.position_of(&self.current.id) {
            self.current.position = position;
            return true;
        }

        let count = collection.count();
        if count == 0 {
            return false;
        }
        let start = self.current.position.min(count - 1);
        let found = (start..count)
            .chain((0..start).rev())
            .find(|p| is_visible(collection, *p));
        match found {
            Some(position) => self.move_to(collection, Some(position)),
            None => false,
        }
    }

    pub fn request_image(&self, collection: &PhotoCollection, target: ImageSize) -> ImageRequest {
        collection.request_image(&self.current.id, target)
    }

    fn move_to(&mut self, collection: &mut PhotoCollection, position: Option<usize>) -> bool {
        let Some(position) = position else {
            return false;
        };
        match collection.handle(position) {
            Ok(handle) => {
                self.current = handle;
                log::debug!("Showing photo {} at {}", self.current.id, position);
                true
            }
            Err(_) => false,
        }
    }
}

fn is_visible(collection: &mut PhotoCollection, position: usize) -> bool {
    collection
        .asset(position)
        .map(|asset| !asset.is_trash)
        .unwrap_or(false)
}
