//! In-memory host library for tests
//!
//! Records every call that reaches the library so tests can assert on what the
//! gallery asked for, and can be told to fail decodes, deletions and favorite
//! updates per asset.

use crate::error::LibraryError;
use crate::library::{AuthorizationStatus, FetchResult, FetchedAlbum, PhotoLibrary};
use crate::models::{AlbumSource, AssetId, ImageSize, LibraryAsset};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use image::DynamicImage;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

pub const MEMORY_ALBUM_TITLE: &str = "Recents";

#[derive(Debug)]
struct MemoryState {
    authorization: AuthorizationStatus,
    prompt_answer: AuthorizationStatus,
    assets: Vec<LibraryAsset>,
    failing_decodes: HashSet<AssetId>,
    failing_deletes: HashSet<AssetId>,
    failing_favorites: bool,
    decode_delay: Option<Duration>,
    fetch_calls: usize,
    load_image_calls: Vec<(AssetId, ImageSize)>,
    delete_calls: Vec<AssetId>,
    favorite_calls: Vec<(AssetId, bool)>,
}

#[derive(Debug)]
pub struct MemoryPhotoLibrary {
    state: Mutex<MemoryState>,
}

impl MemoryPhotoLibrary {
    pub fn new(assets: Vec<LibraryAsset>) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                authorization: AuthorizationStatus::Authorized,
                prompt_answer: AuthorizationStatus::Authorized,
                assets,
                failing_decodes: HashSet::new(),
                failing_deletes: HashSet::new(),
                failing_favorites: false,
                decode_delay: None,
                fetch_calls: 0,
                load_image_calls: Vec::new(),
                delete_calls: Vec::new(),
                favorite_calls: Vec::new(),
            }),
        }
    }

    /// Library with `count` photos, newest first, one minute apart
    pub fn with_assets(count: usize) -> Self {
        let newest = Utc.with_ymd_and_hms(2023, 9, 26, 12, 0, 0).unwrap();
        let assets = (0..count)
            .map(|i| LibraryAsset {
                id: AssetId::new(),
                creation_date: Some(newest - ChronoDuration::minutes(i as i64)),
                is_favorite: false,
                pixel_width: 4032,
                pixel_height: 3024,
            })
            .collect();
        Self::new(assets)
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn asset_ids(&self) -> Vec<AssetId> {
        self.state().assets.iter().map(|a| a.id).collect()
    }

    pub fn asset_id(&self, position: usize) -> AssetId {
        self.state().assets[position].id
    }

    pub fn contains(&self, id: &AssetId) -> bool {
        self.state().assets.iter().any(|a| a.id == *id)
    }

    pub fn is_favorite(&self, id: &AssetId) -> Option<bool> {
        self.state()
            .assets
            .iter()
            .find(|a| a.id == *id)
            .map(|a| a.is_favorite)
    }

    pub fn set_authorization(&self, status: AuthorizationStatus) {
        self.state().authorization = status;
    }

    /// What the simulated permission prompt answers
    pub fn set_prompt_answer(&self, status: AuthorizationStatus) {
        self.state().prompt_answer = status;
    }

    pub fn fail_decode(&self, id: AssetId) {
        self.state().failing_decodes.insert(id);
    }

    pub fn fail_delete(&self, id: AssetId) {
        self.state().failing_deletes.insert(id);
    }

    pub fn fail_favorites(&self, fail: bool) {
        self.state().failing_favorites = fail;
    }

    pub fn set_decode_delay(&self, delay: Option<Duration>) {
        self.state().decode_delay = delay;
    }

    pub fn fetch_calls(&self) -> usize {
        self.state().fetch_calls
    }

    pub fn load_image_calls(&self) -> Vec<(AssetId, ImageSize)> {
        self.state().load_image_calls.clone()
    }

    pub fn delete_calls(&self) -> Vec<AssetId> {
        self.state().delete_calls.clone()
    }

    pub fn favorite_calls(&self) -> Vec<(AssetId, bool)> {
        self.state().favorite_calls.clone()
    }
}

#[async_trait]
impl PhotoLibrary for MemoryPhotoLibrary {
    fn authorization_status(&self) -> AuthorizationStatus {
        self.state().authorization
    }

    async fn request_authorization(&self) -> AuthorizationStatus {
        let mut state = self.state();
        state.authorization = state.prompt_answer;
        state.authorization
    }

    async fn fetch_album(&self, source: &AlbumSource) -> Result<FetchedAlbum, LibraryError> {
        let mut state = self.state();
        state.fetch_calls += 1;
        if let AlbumSource::Named(name) = source {
            if name != MEMORY_ALBUM_TITLE {
                return Err(LibraryError::MissingAlbum(name.clone()));
            }
        }
        Ok(FetchedAlbum {
            title: Some(MEMORY_ALBUM_TITLE.to_string()),
            assets: FetchResult::new(state.assets.clone()),
        })
    }

    async fn set_favorite(&self, id: &AssetId, is_favorite: bool) -> Result<(), LibraryError> {
        let mut state = self.state();
        state.favorite_calls.push((*id, is_favorite));
        if state.failing_favorites {
            return Err(LibraryError::Other("favorite change rejected".to_string()));
        }
        let asset = state
            .assets
            .iter_mut()
            .find(|a| a.id == *id)
            .ok_or(LibraryError::NotFound(*id))?;
        asset.is_favorite = is_favorite;
        Ok(())
    }

    async fn load_image(
        &self,
        id: &AssetId,
        target: ImageSize,
    ) -> Result<DynamicImage, LibraryError> {
        let (delay, failing) = {
            let mut state = self.state();
            state.load_image_calls.push((*id, target));
            (state.decode_delay, state.failing_decodes.contains(id))
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if failing {
            return Err(LibraryError::Decode(format!("corrupt image data for {}", id)));
        }
        Ok(DynamicImage::new_rgb8(target.width, target.height))
    }

    async fn delete_asset(&self, id: &AssetId) -> Result<(), LibraryError> {
        let mut state = self.state();
        state.delete_calls.push(*id);
        if state.failing_deletes.contains(id) {
            return Err(LibraryError::Cancelled);
        }
        let before = state.assets.len();
        state.assets.retain(|a| a.id != *id);
        if state.assets.len() == before {
            return Err(LibraryError::NotFound(*id));
        }
        Ok(())
    }
}
