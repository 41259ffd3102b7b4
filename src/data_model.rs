use crate::config::AppConfig;
use crate::error::AppError;
use photo_gallery::{
    AssetHandle, CollectionChange, ImageSize, PhotoCollection, PhotoLibrary, TrashPurgeReport,
};
use std::sync::Arc;
use tokio::sync::watch;

/// Session state shared by the grid, trash and detail views.
///
/// Owns the single [`PhotoCollection`] and decides when it is loaded and
/// reloaded. Views get it passed in explicitly and subscribe to its changes.
pub struct DataModel {
    collection: PhotoCollection,
    is_photos_loaded: bool,
    detail_size: ImageSize,
}

impl DataModel {
    pub fn new(library: Arc<dyn PhotoLibrary>, config: &AppConfig) -> Self {
        Self {
            collection: PhotoCollection::new(library, config.collection_config()),
            is_photos_loaded: false,
            detail_size: config.detail_size(),
        }
    }

    /// Loads the library once per session. Failed loads can be retried.
    pub async fn load_photos(&mut self) -> Result<(), AppError> {
        if self.is_photos_loaded {
            return Ok(());
        }
        self.collection.load().await?;
        self.is_photos_loaded = true;
        Ok(())
    }

    pub fn is_photos_loaded(&self) -> bool {
        self.is_photos_loaded
    }

    pub fn collection(&self) -> &PhotoCollection {
        &self.collection
    }

    pub fn collection_mut(&mut self) -> &mut PhotoCollection {
        &mut self.collection
    }

    pub fn subscribe(&self) -> watch::Receiver<CollectionChange> {
        self.collection.subscribe()
    }

    pub fn detail_size(&self) -> ImageSize {
        self.detail_size
    }

    /// Permanently deletes the trash, then reloads from the library.
    ///
    /// Photos the library refused to delete stay in the trash after the
    /// reload. The report is returned even when the reload fails; the
    /// collection then stays stale until the next successful reload.
    pub async fn empty_trash(&mut self) -> TrashPurgeReport {
        let report = self.collection.delete_all_trash_photos().await;
        if report.attempted() == 0 {
            return report;
        }

        if let Err(e) = self.collection.reload().await {
            log::error!("Failed to reload photos after emptying trash: {}", e);
            return report;
        }
        let failed: Vec<_> = report.failed.iter().map(|(id, _)| *id).collect();
        self.collection.retain_in_trash(&failed);
        report
    }

    /// Deletes one photo from the library right away and reloads
    pub async fn delete_photo(&mut self, handle: AssetHandle) -> Result<(), AppError> {
        self.collection.delete_permanently(handle).await?;
        self.collection.reload().await?;
        Ok(())
    }
}
