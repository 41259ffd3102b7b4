//! Image request cache
//!
//! Resolves an asset and a target size to a decoded image. Decoded images are
//! kept in a bounded LRU table keyed by `(asset, size)`. A request that misses
//! the table but finds another size of the same asset gets that image first as
//! a degraded placeholder, then the real decode.
//!
//! Requests run as tokio tasks and must be issued from inside a runtime.

use crate::error::ImageRequestError;
use crate::library::PhotoLibrary;
use crate::models::{AssetId, ImageResponse, ImageSize};
use image::DynamicImage;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

type CacheKey = (AssetId, ImageSize);

/// Configuration for the image request cache
#[derive(Debug, Clone, PartialEq)]
pub struct ImageCacheConfig {
    /// A decode taking longer than this fails the request
    pub request_timeout: Duration,
    pub max_cached_images: usize,
}

impl Default for ImageCacheConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            max_cached_images: 512,
        }
    }
}

#[derive(Debug, Default)]
struct CacheState {
    images: HashMap<CacheKey, Arc<DynamicImage>>,
    // Front is least recently used
    recency: VecDeque<CacheKey>,
    prefetching: HashMap<CacheKey, AbortHandle>,
}

impl CacheState {
    fn touch(&mut self, key: &CacheKey) {
        if let Some(pos) = self.recency.iter().position(|k| k == key) {
            self.recency.remove(pos);
        }
        self.recency.push_back(*key);
    }

    fn lookup(&mut self, key: &CacheKey) -> Option<Arc<DynamicImage>> {
        let image = self.images.get(key).cloned()?;
        self.touch(key);
        Some(image)
    }

    /// Largest cached image of the asset at any other size
    fn placeholder_for(&self, id: &AssetId, target: ImageSize) -> Option<Arc<DynamicImage>> {
        self.images
            .iter()
            .filter(|((asset, size), _)| asset == id && *size != target)
            .max_by_key(|((_, size), _)| size.area())
            .map(|(_, image)| image.clone())
    }

    fn insert(&mut self, key: CacheKey, image: Arc<DynamicImage>, capacity: usize) {
        self.images.insert(key, image);
        self.touch(&key);
        while self.images.len() > capacity.max(1) {
            match self.recency.pop_front() {
                Some(oldest) => {
                    self.images.remove(&oldest);
                }
                None => break,
            }
        }
    }

    fn remove(&mut self, key: &CacheKey) {
        self.images.remove(key);
        self.recency.retain(|k| k != key);
    }

    /// Aborts a pending prefetch and drops the cached image
    fn release(&mut self, key: &CacheKey) {
        if let Some(task) = self.prefetching.remove(key) {
            task.abort();
        }
        self.remove(key);
    }
}

fn lock(state: &Mutex<CacheState>) -> MutexGuard<'_, CacheState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

#[derive(Debug)]
enum Delivery {
    Image(ImageResponse),
    Failed(ImageRequestError),
}

/// Lifecycle of an [`ImageRequest`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestState {
    Pending,
    /// A placeholder was delivered, the final image is still outstanding
    Delivering,
    Completed,
    Failed(ImageRequestError),
    Cancelled,
}

impl RequestState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RequestState::Completed | RequestState::Failed(_) | RequestState::Cancelled
        )
    }
}

/// A running image request: yields at most a placeholder and a final image.
///
/// Dropping the request cancels it.
#[derive(Debug)]
pub struct ImageRequest {
    rx: mpsc::Receiver<Delivery>,
    task: Option<AbortHandle>,
    state: RequestState,
}

impl ImageRequest {
    fn new(rx: mpsc::Receiver<Delivery>, task: Option<AbortHandle>) -> Self {
        Self {
            rx,
            task,
            state: RequestState::Pending,
        }
    }

    pub fn state(&self) -> &RequestState {
        &self.state
    }

    /// Next delivery, or `None` once the request reached a terminal state
    pub async fn next_image(&mut self) -> Option<ImageResponse> {
        if self.state.is_terminal() {
            return None;
        }
        match self.rx.recv().await {
            Some(Delivery::Image(response)) => {
                self.state = if response.is_degraded {
                    RequestState::Delivering
                } else {
                    RequestState::Completed
                };
                Some(response)
            }
            Some(Delivery::Failed(err)) => {
                self.state = RequestState::Failed(err);
                None
            }
            None => {
                // Decode task went away without a final delivery
                self.state = RequestState::Cancelled;
                None
            }
        }
    }

    /// Skips placeholders and waits for the final image
    pub async fn final_image(mut self) -> Result<ImageResponse, ImageRequestError> {
        while let Some(response) = self.next_image().await {
            if !response.is_degraded {
                return Ok(response);
            }
        }
        match &self.state {
            RequestState::Failed(err) => Err(err.clone()),
            _ => Err(ImageRequestError::Cancelled),
        }
    }

    pub fn cancel(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.rx.close();
        self.state = RequestState::Cancelled;
    }
}

impl Drop for ImageRequest {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Caching image manager shared by every view of a collection
#[derive(Clone)]
pub struct CachedImageManager {
    library: Arc<dyn PhotoLibrary>,
    config: ImageCacheConfig,
    state: Arc<Mutex<CacheState>>,
}

impl CachedImageManager {
    pub fn new(library: Arc<dyn PhotoLibrary>, config: ImageCacheConfig) -> Self {
        Self {
            library,
            config,
            state: Arc::new(Mutex::new(CacheState::default())),
        }
    }

    pub fn config(&self) -> &ImageCacheConfig {
        &self.config
    }

    pub fn request_image(&self, id: &AssetId, target: ImageSize) -> ImageRequest {
        let key = (*id, target);
        let (tx, rx) = mpsc::channel(2);

        let (hit, placeholder) = {
            let mut state = lock(&self.state);
            match state.lookup(&key) {
                Some(image) => (Some(image), None),
                None => (None, state.placeholder_for(id, target)),
            }
        };

        if let Some(image) = hit {
            log::debug!("Image cache hit for {} at {:?}", id, target);
            let _ = tx.try_send(Delivery::Image(ImageResponse {
                image,
                is_degraded: false,
            }));
            return ImageRequest::new(rx, None);
        }

        if let Some(image) = placeholder {
            let _ = tx.try_send(Delivery::Image(ImageResponse {
                image,
                is_degraded: true,
            }));
        }

        let library = self.library.clone();
        let shared = self.state.clone();
        let timeout = self.config.request_timeout;
        let capacity = self.config.max_cached_images;
        let task = tokio::spawn(async move {
            let delivery = match tokio::time::timeout(timeout, library.load_image(&key.0, key.1))
                .await
            {
                Ok(Ok(image)) => {
                    let image = Arc::new(image);
                    lock(&shared).insert(key, image.clone(), capacity);
                    Delivery::Image(ImageResponse {
                        image,
                        is_degraded: false,
                    })
                }
                Ok(Err(e)) => {
                    log::warn!("Failed to load image {}: {}", key.0, e);
                    Delivery::Failed(ImageRequestError::Decode(e.to_string()))
                }
                Err(_) => {
                    log::warn!("Image request for {} timed out after {:?}", key.0, timeout);
                    Delivery::Failed(ImageRequestError::TimedOut)
                }
            };
            // Receiver may already be gone
            let _ = tx.send(delivery).await;
        });

        ImageRequest::new(rx, Some(task.abort_handle()))
    }

    /// Prefetch hint for assets about to become visible
    pub fn start_caching(&self, ids: &[AssetId], target: ImageSize) {
        // Held across the spawns so a fast task cannot finish before its
        // abort handle is registered
        let mut state = lock(&self.state);
        for id in ids {
            let key = (*id, target);
            if state.images.contains_key(&key) || state.prefetching.contains_key(&key) {
                continue;
            }

            let library = self.library.clone();
            let shared = self.state.clone();
            let timeout = self.config.request_timeout;
            let capacity = self.config.max_cached_images;
            let task = tokio::spawn(async move {
                let result = tokio::time::timeout(timeout, library.load_image(&key.0, key.1)).await;
                let mut state = lock(&shared);
                // Released by stop_caching while the decode was finishing
                if state.prefetching.remove(&key).is_none() {
                    return;
                }
                match result {
                    Ok(Ok(image)) => state.insert(key, Arc::new(image), capacity),
                    Ok(Err(e)) => log::debug!("Prefetch of {} failed: {}", key.0, e),
                    Err(_) => log::debug!("Prefetch of {} timed out", key.0),
                }
            });
            state.prefetching.insert(key, task.abort_handle());
        }
    }

    /// Release hint for assets that are no longer visible
    pub fn stop_caching(&self, ids: &[AssetId], target: ImageSize) {
        let mut state = lock(&self.state);
        for id in ids {
            state.release(&(*id, target));
        }
    }

    pub fn stop_caching_all(&self) {
        let mut state = lock(&self.state);
        for (_, task) in state.prefetching.drain() {
            task.abort();
        }
        state.images.clear();
        state.recency.clear();
    }

    pub fn is_cached(&self, id: &AssetId, target: ImageSize) -> bool {
        lock(&self.state).images.contains_key(&(*id, target))
    }

    pub fn is_prefetching(&self, id: &AssetId, target: ImageSize) -> bool {
        lock(&self.state).prefetching.contains_key(&(*id, target))
    }

    pub fn cached_count(&self) -> usize {
        lock(&self.state).images.len()
    }
}
