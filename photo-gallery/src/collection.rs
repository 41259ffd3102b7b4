//! Trash-aware photo collection
//!
//! Combines the [`AssetIndexCache`] with a [`CachedImageManager`] and adds the
//! soft-delete workflow on top: photos are first moved to a client-side trash
//! (reversible through a bounded undo stack) and only removed from the host
//! library when the trash is emptied.
//!
//! Every mutation is published on a `watch` channel so views can re-render.

use crate::error::{GalleryError, LibraryError};
use crate::image_cache::{CachedImageManager, ImageCacheConfig, ImageRequest};
use crate::index_cache::AssetIndexCache;
use crate::library::{check_authorization, PhotoLibrary};
use crate::models::{AlbumSource, Asset, AssetHandle, AssetId, ImageSize};
use crate::undo::UndoStack;
use std::sync::Arc;
use tokio::sync::watch;

/// Configuration for a photo collection
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionConfig {
    pub source: AlbumSource,
    /// How many trash actions can be reverted
    pub undo_depth: usize,
    pub image_cache: ImageCacheConfig,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            source: AlbumSource::UserLibrary,
            undo_depth: 1,
            image_cache: ImageCacheConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Initial,
    Loaded,
    Trashed(AssetHandle),
    Restored(AssetHandle),
    FavoriteChanged(AssetHandle),
    /// Photos were permanently deleted, the collection needs a reload
    Purged,
    /// Trash flags were re-applied after a reload
    TrashRetained,
}

/// Notification published after every mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionChange {
    pub revision: u64,
    pub kind: ChangeKind,
}

/// Outcome of emptying the trash
#[derive(Debug, Default)]
pub struct TrashPurgeReport {
    pub deleted: Vec<AssetId>,
    pub failed: Vec<(AssetId, LibraryError)>,
}

impl TrashPurgeReport {
    pub fn attempted(&self) -> usize {
        self.deleted.len() + self.failed.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct PhotoCollection {
    library: Arc<dyn PhotoLibrary>,
    source: AlbumSource,
    album_name: Option<String>,
    assets: Option<AssetIndexCache>,
    undo: UndoStack<AssetHandle>,
    cache: CachedImageManager,
    stale: bool,
    revision: u64,
    changes: watch::Sender<CollectionChange>,
}

impl PhotoCollection {
    pub fn new(library: Arc<dyn PhotoLibrary>, config: CollectionConfig) -> Self {
        let (changes, _) = watch::channel(CollectionChange {
            revision: 0,
            kind: ChangeKind::Initial,
        });
        Self {
            cache: CachedImageManager::new(library.clone(), config.image_cache),
            library,
            source: config.source,
            album_name: None,
            assets: None,
            undo: UndoStack::new(config.undo_depth),
            stale: false,
            revision: 0,
            changes,
        }
    }

    /// Checks authorization and fetches the album.
    ///
    /// Not guarded against concurrent or repeated calls; the session decides
    /// when to load.
    pub async fn load(&mut self) -> Result<(), GalleryError> {
        if !check_authorization(self.library.as_ref()).await {
            log::error!("Photo library access was not authorized.");
            return Err(GalleryError::NotAuthorized);
        }

        let album = self
            .library
            .fetch_album(&self.source)
            .await
            .map_err(|e| {
                log::error!("Failed to load photo collection: {}", e);
                e
            })?;

        log::info!(
            "Loaded {} photos from {}",
            album.assets.len(),
            album.title.as_deref().unwrap_or("unnamed album")
        );

        self.album_name = album.title;
        self.assets = Some(AssetIndexCache::new(album.assets));
        self.undo.clear();
        self.stale = false;
        self.publish(ChangeKind::Loaded);
        Ok(())
    }

    /// Rebuilds the collection from the current library contents
    pub async fn reload(&mut self) -> Result<(), GalleryError> {
        log::debug!("Reloading photo collection");
        self.load().await
    }

    pub fn subscribe(&self) -> watch::Receiver<CollectionChange> {
        self.changes.subscribe()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_loaded(&self) -> bool {
        self.assets.is_some()
    }

    /// True after a permanent delete until the next reload
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn album_name(&self) -> Option<&str> {
        self.album_name.as_deref()
    }

    pub fn count(&self) -> usize {
        self.assets.as_ref().map_or(0, AssetIndexCache::count)
    }

    pub fn index_cache(&self) -> Option<&AssetIndexCache> {
        self.assets.as_ref()
    }

    pub fn image_cache(&self) -> &CachedImageManager {
        &self.cache
    }

    pub fn asset(&mut self, position: usize) -> Result<&Asset, GalleryError> {
        self.assets
            .as_mut()
            .ok_or(GalleryError::NotLoaded)?
            .get(position)
    }

    /// Every asset in fetch order, trashed ones included
    pub fn photo_assets(&mut self) -> Vec<&Asset> {
        match self.assets.as_mut() {
            Some(cache) => cache.iter_all().collect(),
            None => Vec::new(),
        }
    }

    /// Assets not in the trash, as shown by the grid
    pub fn visible_photo_assets(&mut self) -> Vec<&Asset> {
        self.photo_assets()
            .into_iter()
            .filter(|asset| !asset.is_trash)
            .collect()
    }

    pub fn trash_photo_assets(&self) -> Vec<&Asset> {
        // Only built entries can carry the trash flag
        match self.assets.as_ref() {
            Some(cache) => cache.iter_cached().filter(|asset| asset.is_trash).collect(),
            None => Vec::new(),
        }
    }

    /// Handle of the asset at `position`, for the mutating operations below
    pub fn handle(&mut self, position: usize) -> Result<AssetHandle, GalleryError> {
        let id = self.asset(position)?.id;
        Ok(AssetHandle { position, id })
    }

    /// Fetch position of an asset, if it is part of the loaded collection
    pub fn position_of(&self, id: &AssetId) -> Option<usize> {
        self.assets
            .as_ref()?
            .fetch_result()
            .iter()
            .position(|record| record.id == *id)
    }

    /// Puts assets back into the trash after a reload, without undo records.
    /// Ids not present in the collection are skipped. Returns how many were
    /// trashed.
    pub fn retain_in_trash(&mut self, ids: &[AssetId]) -> usize {
        let positions: Vec<usize> = ids.iter().filter_map(|id| self.position_of(id)).collect();
        let Some(cache) = self.assets.as_mut() else {
            return 0;
        };
        let mut trashed = 0;
        for position in positions {
            if cache.mark_trashed(position).is_ok() {
                trashed += 1;
            }
        }
        if trashed > 0 {
            log::debug!("Kept {} photos in trash after reload", trashed);
            self.publish(ChangeKind::TrashRetained);
        }
        trashed
    }

    pub fn can_revert(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Moves an asset to the trash and records the action for undo. The
    /// library is not touched. Trashing an asset that already is in the trash
    /// still records it, so the next revert restores this asset.
    pub fn delete_image(&mut self, handle: AssetHandle) -> Result<(), GalleryError> {
        let position = self.resolve(handle)?;
        self.assets
            .as_mut()
            .ok_or(GalleryError::NotLoaded)?
            .mark_trashed(position)?;
        self.undo.push(handle);
        log::debug!("Moved photo {} at {} to trash", handle.id, position);
        self.publish(ChangeKind::Trashed(handle));
        Ok(())
    }

    /// Restores the most recently trashed asset, if any
    pub fn revert_last_trash(&mut self) -> Option<AssetHandle> {
        let record = self.undo.pop()?;
        let cache = self.assets.as_mut()?;
        if let Err(e) = cache.restore(record.position) {
            log::warn!("Could not restore photo {}: {}", record.id, e);
            return None;
        }
        log::debug!("Restored photo {} from trash", record.id);
        self.publish(ChangeKind::Restored(record));
        Some(record)
    }

    /// Permanently deletes every trashed asset from the library.
    ///
    /// Deletions are issued one by one and are not rolled back when a later
    /// one fails. Trash flags stay as they are; reload to see library truth.
    pub async fn delete_all_trash_photos(&mut self) -> TrashPurgeReport {
        let trashed: Vec<AssetId> = self.trash_photo_assets().iter().map(|a| a.id).collect();
        let mut report = TrashPurgeReport::default();
        if trashed.is_empty() {
            return report;
        }

        for id in trashed {
            match self.library.delete_asset(&id).await {
                Ok(()) => report.deleted.push(id),
                Err(e) => {
                    log::error!("Failed to delete photo {}: {}", id, e);
                    report.failed.push((id, e));
                }
            }
        }

        log::info!(
            "Emptied trash: {} deleted, {} failed",
            report.deleted.len(),
            report.failed.len()
        );

        self.undo.clear();
        if !report.deleted.is_empty() {
            self.stale = true;
        }
        self.publish(ChangeKind::Purged);
        report
    }

    /// Deletes one asset from the library right away, skipping the trash
    pub async fn delete_permanently(&mut self, handle: AssetHandle) -> Result<(), GalleryError> {
        self.resolve(handle)?;
        self.library.delete_asset(&handle.id).await.map_err(|e| {
            log::error!("Failed to delete photo {}: {}", handle.id, e);
            e
        })?;
        self.stale = true;
        self.publish(ChangeKind::Purged);
        Ok(())
    }

    /// Persists the favorite flag in the library, then updates the asset
    pub async fn set_favorite(
        &mut self,
        handle: AssetHandle,
        is_favorite: bool,
    ) -> Result<(), GalleryError> {
        let position = self.resolve(handle)?;
        self.library
            .set_favorite(&handle.id, is_favorite)
            .await
            .map_err(|e| {
                log::error!("Failed to change favorite state of {}: {}", handle.id, e);
                e
            })?;
        self.assets
            .as_mut()
            .ok_or(GalleryError::NotLoaded)?
            .get_mut(position)?
            .is_favorite = is_favorite;
        self.publish(ChangeKind::FavoriteChanged(handle));
        Ok(())
    }

    pub fn request_image(&self, id: &AssetId, target: ImageSize) -> ImageRequest {
        self.cache.request_image(id, target)
    }

    pub fn start_caching(&self, ids: &[AssetId], target: ImageSize) {
        self.cache.start_caching(ids, target);
    }

    pub fn stop_caching(&self, ids: &[AssetId], target: ImageSize) {
        self.cache.stop_caching(ids, target);
    }

    fn resolve(&mut self, handle: AssetHandle) -> Result<usize, GalleryError> {
        let cache = self.assets.as_mut().ok_or(GalleryError::NotLoaded)?;
        let asset = cache.get(handle.position)?;
        if asset.id != handle.id {
            return Err(GalleryError::StaleHandle {
                position: handle.position,
                id: handle.id,
            });
        }
        Ok(handle.position)
    }

    fn publish(&mut self, kind: ChangeKind) {
        self.revision += 1;
        self.changes.send_replace(CollectionChange {
            revision: self.revision,
            kind,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::AuthorizationStatus;
    use crate::testing::MemoryPhotoLibrary;
    use proptest::prelude::*;

    async fn loaded(count: usize) -> (Arc<MemoryPhotoLibrary>, PhotoCollection) {
        let library = Arc::new(MemoryPhotoLibrary::with_assets(count));
        let mut collection = PhotoCollection::new(library.clone(), CollectionConfig::default());
        collection.load().await.unwrap();
        (library, collection)
    }

    fn handle(collection: &mut PhotoCollection, position: usize) -> AssetHandle {
        collection.handle(position).unwrap()
    }

    fn trash_positions(collection: &PhotoCollection) -> Vec<usize> {
        collection
            .trash_photo_assets()
            .iter()
            .filter_map(|a| a.index)
            .collect()
    }

    fn assert_trash_consistent(collection: &mut PhotoCollection) {
        let expected: Vec<AssetId> = collection
            .photo_assets()
            .into_iter()
            .filter(|a| a.is_trash)
            .map(|a| a.id)
            .collect();
        let actual: Vec<AssetId> = collection.trash_photo_assets().iter().map(|a| a.id).collect();
        assert_eq!(actual, expected);
    }

    #[tokio::test]
    async fn test_load_populates_collection() {
        let (_library, mut collection) = loaded(5).await;
        assert!(collection.is_loaded());
        assert_eq!(collection.count(), 5);
        assert_eq!(collection.album_name(), Some("Recents"));
        assert_eq!(collection.photo_assets().len(), 5);
        assert!(collection.trash_photo_assets().is_empty());
    }

    #[tokio::test]
    async fn test_load_without_authorization_stays_empty() {
        let library = Arc::new(MemoryPhotoLibrary::with_assets(5));
        library.set_authorization(AuthorizationStatus::Denied);
        let mut collection = PhotoCollection::new(library.clone(), CollectionConfig::default());

        let result = collection.load().await;
        assert!(matches!(result, Err(GalleryError::NotAuthorized)));
        assert!(!collection.is_loaded());
        assert!(collection.index_cache().is_none());
        assert!(collection.photo_assets().is_empty());
        assert_eq!(library.fetch_calls(), 0);
    }

    #[tokio::test]
    async fn test_load_missing_album() {
        let library = Arc::new(MemoryPhotoLibrary::with_assets(2));
        let config = CollectionConfig {
            source: AlbumSource::Named("Holidays".to_string()),
            ..Default::default()
        };
        let mut collection = PhotoCollection::new(library, config);
        let result = collection.load().await;
        assert!(matches!(
            result,
            Err(GalleryError::Library(LibraryError::MissingAlbum(_)))
        ));
        assert!(!collection.is_loaded());
    }

    #[tokio::test]
    async fn test_delete_and_revert_scenario() {
        let (library, mut collection) = loaded(5).await;
        let target = handle(&mut collection, 2);

        collection.delete_image(target).unwrap();
        assert_eq!(trash_positions(&collection), vec![2]);
        assert!(collection.can_revert());

        assert_eq!(collection.revert_last_trash(), Some(target));
        assert!(collection.trash_photo_assets().is_empty());
        assert!(!collection.asset(2).unwrap().is_trash);
        assert!(library.delete_calls().is_empty());
    }

    #[tokio::test]
    async fn test_revert_without_record_is_noop() {
        let (_library, mut collection) = loaded(3).await;
        let revision = collection.revision();
        assert_eq!(collection.revert_last_trash(), None);
        assert_eq!(collection.revision(), revision);
    }

    #[tokio::test]
    async fn test_undo_depth_one_only_reverts_latest() {
        let (_library, mut collection) = loaded(5).await;
        let first = handle(&mut collection, 1);
        let second = handle(&mut collection, 3);
        collection.delete_image(first).unwrap();
        collection.delete_image(second).unwrap();

        assert_eq!(collection.revert_last_trash(), Some(second));
        assert_eq!(collection.revert_last_trash(), None);
        assert_eq!(trash_positions(&collection), vec![1]);
    }

    #[tokio::test]
    async fn test_stale_handle_rejected() {
        let (_library, mut collection) = loaded(3).await;
        let mut target = handle(&mut collection, 0);
        target.id = AssetId::new();
        assert!(matches!(
            collection.delete_image(target),
            Err(GalleryError::StaleHandle { .. })
        ));

        let out_of_range = AssetHandle {
            position: 3,
            id: AssetId::new(),
        };
        assert!(matches!(
            collection.delete_image(out_of_range),
            Err(GalleryError::OutOfRange { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_all_trash_photos_only_deletes_trashed() {
        let (library, mut collection) = loaded(5).await;
        let one = handle(&mut collection, 1);
        let three = handle(&mut collection, 3);
        collection.delete_image(one).unwrap();
        collection.delete_image(three).unwrap();

        let report = collection.delete_all_trash_photos().await;
        assert_eq!(report.attempted(), 2);
        assert!(report.is_complete());

        let calls = library.delete_calls();
        assert_eq!(calls.len(), 2);
        assert!(calls.contains(&one.id));
        assert!(calls.contains(&three.id));
        assert!(collection.is_stale());
        assert!(!collection.can_revert());

        collection.reload().await.unwrap();
        assert_eq!(collection.count(), 3);
        assert!(collection.trash_photo_assets().is_empty());
        assert!(!collection.is_stale());
    }

    #[tokio::test]
    async fn test_delete_all_with_partial_failure() {
        let (library, mut collection) = loaded(4).await;
        let kept = handle(&mut collection, 0);
        let removed = handle(&mut collection, 2);
        library.fail_delete(kept.id);
        collection.delete_image(kept).unwrap();
        collection.delete_image(removed).unwrap();

        let report = collection.delete_all_trash_photos().await;
        assert_eq!(report.deleted, vec![removed.id]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, kept.id);
        // Soft trash state is left alone until reload
        assert_eq!(trash_positions(&collection), vec![0, 2]);

        collection.reload().await.unwrap();
        assert_eq!(collection.count(), 3);
        assert!(library.contains(&kept.id));
    }

    #[tokio::test]
    async fn test_retain_in_trash_after_reload() {
        let (library, mut collection) = loaded(4).await;
        let kept = handle(&mut collection, 1);
        library.fail_delete(kept.id);
        collection.delete_image(kept).unwrap();
        let report = collection.delete_all_trash_photos().await;
        assert_eq!(report.failed.len(), 1);

        collection.reload().await.unwrap();
        assert!(collection.trash_photo_assets().is_empty());

        let ids = [kept.id, AssetId::new()];
        assert_eq!(collection.retain_in_trash(&ids), 1);
        assert_eq!(collection.position_of(&kept.id), Some(1));
        assert_eq!(trash_positions(&collection), vec![1]);
        assert!(!collection.can_revert());
    }

    #[tokio::test]
    async fn test_retain_in_trash_publishes_own_change() {
        let (_library, mut collection) = loaded(3).await;
        let mut rx = collection.subscribe();
        rx.borrow_and_update();

        let id = collection.asset(2).unwrap().id;
        collection.retain_in_trash(&[id]);
        assert_eq!(rx.borrow_and_update().kind, ChangeKind::TrashRetained);

        collection.retain_in_trash(&[AssetId::new()]);
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_retrash_then_revert_restores_that_asset() {
        let library = Arc::new(MemoryPhotoLibrary::with_assets(5));
        let config = CollectionConfig {
            undo_depth: 4,
            ..Default::default()
        };
        let mut collection = PhotoCollection::new(library, config);
        collection.load().await.unwrap();

        let first = handle(&mut collection, 1);
        let second = handle(&mut collection, 3);
        collection.delete_image(first).unwrap();
        collection.delete_image(second).unwrap();

        collection.delete_image(first).unwrap();
        assert_eq!(collection.revert_last_trash(), Some(first));
        assert!(!collection.asset(1).unwrap().is_trash);
        assert_eq!(trash_positions(&collection), vec![3]);

        assert_eq!(collection.revert_last_trash(), Some(second));
        assert!(collection.trash_photo_assets().is_empty());
    }

    #[tokio::test]
    async fn test_empty_trash_issues_no_deletes() {
        let (library, mut collection) = loaded(3).await;
        let report = collection.delete_all_trash_photos().await;
        assert_eq!(report.attempted(), 0);
        assert!(library.delete_calls().is_empty());
        assert!(!collection.is_stale());
    }

    #[tokio::test]
    async fn test_delete_permanently() {
        let (library, mut collection) = loaded(3).await;
        let target = handle(&mut collection, 1);
        collection.delete_permanently(target).await.unwrap();
        assert_eq!(library.delete_calls(), vec![target.id]);
        assert!(collection.is_stale());
    }

    #[tokio::test]
    async fn test_set_favorite() {
        let (library, mut collection) = loaded(3).await;
        let target = handle(&mut collection, 0);

        collection.set_favorite(target, true).await.unwrap();
        assert!(collection.asset(0).unwrap().is_favorite);
        assert_eq!(library.is_favorite(&target.id), Some(true));

        library.fail_favorites(true);
        assert!(collection.set_favorite(target, false).await.is_err());
        assert!(collection.asset(0).unwrap().is_favorite);
    }

    #[tokio::test]
    async fn test_changes_are_published() {
        let (_library, mut collection) = loaded(3).await;
        let mut rx = collection.subscribe();
        let target = handle(&mut collection, 1);

        collection.delete_image(target).unwrap();
        assert!(rx.has_changed().unwrap());
        let change = *rx.borrow_and_update();
        assert_eq!(change.kind, ChangeKind::Trashed(target));

        collection.revert_last_trash();
        assert_eq!(rx.borrow_and_update().kind, ChangeKind::Restored(target));
    }

    #[tokio::test]
    async fn test_visible_assets_skip_trash() {
        let (_library, mut collection) = loaded(4).await;
        let target = handle(&mut collection, 2);
        collection.delete_image(target).unwrap();
        let visible: Vec<_> = collection
            .visible_photo_assets()
            .iter()
            .filter_map(|a| a.index)
            .collect();
        assert_eq!(visible, vec![0, 1, 3]);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Trash(usize),
        Revert,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![(0..6usize).prop_map(Op::Trash), Just(Op::Revert)]
    }

    proptest! {
        #[test]
        fn trash_view_matches_flags(ops in prop::collection::vec(op_strategy(), 0..40), depth in 1..4usize) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let library = Arc::new(MemoryPhotoLibrary::with_assets(6));
            let config = CollectionConfig { undo_depth: depth, ..Default::default() };
            let mut collection = PhotoCollection::new(library, config);
            runtime.block_on(collection.load()).unwrap();

            for op in ops {
                match op {
                    Op::Trash(position) => {
                        let target = handle(&mut collection, position);
                        collection.delete_image(target).unwrap();
                        prop_assert!(collection.asset(position).unwrap().is_trash);
                    }
                    Op::Revert => {
                        collection.revert_last_trash();
                    }
                }
                assert_trash_consistent(&mut collection);
            }
        }

        #[test]
        fn delete_then_revert_is_identity(trashed in prop::collection::btree_set(0..6usize, 0..6), target in 0..6usize) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let library = Arc::new(MemoryPhotoLibrary::with_assets(6));
            let mut collection = PhotoCollection::new(library, CollectionConfig::default());
            runtime.block_on(collection.load()).unwrap();

            for position in &trashed {
                let h = handle(&mut collection, *position);
                collection.delete_image(h).unwrap();
            }
            let before: Vec<usize> = trash_positions(&collection)
                .into_iter()
                .filter(|p| *p != target)
                .collect();

            let h = handle(&mut collection, target);
            collection.delete_image(h).unwrap();
            collection.revert_last_trash();

            prop_assert!(!collection.asset(target).unwrap().is_trash);
            prop_assert_eq!(trash_positions(&collection), before);
        }
    }
}
