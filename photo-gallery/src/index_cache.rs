use crate::error::GalleryError;
use crate::library::FetchResult;
use crate::models::Asset;
use std::collections::HashMap;

/// Lazily built position -> [`Asset`] table over a fetch result.
///
/// Entries are created on first access and kept for the lifetime of the
/// cache, so trash and favorite state stick to the same entry no matter who
/// reads it. The fetch result is never mutated; a changed library needs a new
/// cache.
#[derive(Debug)]
pub struct AssetIndexCache {
    fetch_result: FetchResult,
    entries: HashMap<usize, Asset>,
}

impl AssetIndexCache {
    pub fn new(fetch_result: FetchResult) -> Self {
        Self {
            fetch_result,
            entries: HashMap::new(),
        }
    }

    pub fn count(&self) -> usize {
        self.fetch_result.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fetch_result.is_empty()
    }

    pub fn fetch_result(&self) -> &FetchResult {
        &self.fetch_result
    }

    pub fn get(&mut self, position: usize) -> Result<&Asset, GalleryError> {
        self.entry(position).map(|asset| &*asset)
    }

    pub fn get_mut(&mut self, position: usize) -> Result<&mut Asset, GalleryError> {
        self.entry(position)
    }

    /// Returns the entry only if it has already been built
    pub fn cached(&self, position: usize) -> Option<&Asset> {
        self.entries.get(&position)
    }

    /// Number of entries built so far
    pub fn materialized(&self) -> usize {
        self.entries.len()
    }

    pub fn mark_trashed(&mut self, position: usize) -> Result<(), GalleryError> {
        self.entry(position)?.is_trash = true;
        Ok(())
    }

    pub fn restore(&mut self, position: usize) -> Result<(), GalleryError> {
        self.entry(position)?.is_trash = false;
        Ok(())
    }

    /// Builds every entry and returns them in fetch order
    pub fn iter_all(&mut self) -> impl Iterator<Item = &Asset> {
        let count = self.count();
        for position in 0..count {
            // In range by construction
            let _ = self.entry(position);
        }
        let entries = &self.entries;
        (0..count).filter_map(move |position| entries.get(&position))
    }

    /// Built entries in fetch order
    pub fn iter_cached(&self) -> impl Iterator<Item = &Asset> {
        (0..self.count()).filter_map(move |position| self.entries.get(&position))
    }

    fn entry(&mut self, position: usize) -> Result<&mut Asset, GalleryError> {
        let record = self
            .fetch_result
            .get(position)
            .ok_or(GalleryError::OutOfRange {
                position,
                count: self.fetch_result.len(),
            })?;
        Ok(self
            .entries
            .entry(position)
            .or_insert_with(|| Asset::from_library(record, position)))
    }
}
