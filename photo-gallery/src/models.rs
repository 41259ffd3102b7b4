use chrono::{DateTime, Utc};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use uuid::Uuid;

/// Stable identifier of a photo resource in the host library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub Uuid);

impl AssetId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AssetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Target size of an image request, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn square(side: u32) -> Self {
        Self::new(side, side)
    }

    /// Converts a size in points to pixels for the given display scale
    pub fn scaled(width_pt: f64, height_pt: f64, scale: f64) -> Self {
        Self::new(
            (width_pt * scale).round().max(1.0) as u32,
            (height_pt * scale).round().max(1.0) as u32,
        )
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Which part of the host library a collection shows
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlbumSource {
    /// Every photo in the library (the "Recents" smart album)
    #[default]
    UserLibrary,
    Named(String),
}

/// One record of a host fetch result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryAsset {
    pub id: AssetId,
    pub creation_date: Option<DateTime<Utc>>,
    pub is_favorite: bool,
    pub pixel_width: u32,
    pub pixel_height: u32,
}

impl LibraryAsset {
    pub fn new(id: AssetId) -> Self {
        Self {
            id,
            creation_date: None,
            is_favorite: false,
            pixel_width: 0,
            pixel_height: 0,
        }
    }
}

/// A library photo plus the client-side state the gallery keeps for it.
///
/// `is_trash` is never written back to the library. Equality and hashing only
/// look at `id`, so the same physical photo compares equal across reloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    pub index: Option<usize>,
    pub is_favorite: bool,
    pub is_trash: bool,
    pub creation_date: Option<DateTime<Utc>>,
}

impl Asset {
    pub fn from_library(record: &LibraryAsset, index: usize) -> Self {
        Self {
            id: record.id,
            index: Some(index),
            is_favorite: record.is_favorite,
            is_trash: false,
            creation_date: record.creation_date,
        }
    }

    pub fn accessibility_label(&self) -> String {
        let mut label = String::from("Photo");
        if self.is_favorite {
            label.push_str(", Favorite");
        }
        if let Some(date) = self.creation_date {
            label.push_str(&format!(" from {}", date.format("%B %-d, %Y")));
        }
        label
    }

    /// Handle for passing this asset back into collection operations.
    /// `None` for assets that were not built from a fetch position.
    pub fn handle(&self) -> Option<AssetHandle> {
        self.index.map(|position| AssetHandle {
            position,
            id: self.id,
        })
    }
}

impl PartialEq for Asset {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Asset {}

impl Hash for Asset {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Position plus identity of an asset inside a loaded collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssetHandle {
    pub position: usize,
    pub id: AssetId,
}

/// One delivery of an image request
#[derive(Debug, Clone)]
pub struct ImageResponse {
    pub image: Arc<DynamicImage>,
    /// Low quality placeholder, a final delivery follows
    pub is_degraded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_asset_equality_is_identity_based() {
        let record = LibraryAsset::new(AssetId::new());
        let a = Asset::from_library(&record, 0);
        let mut b = Asset::from_library(&record, 3);
        b.is_trash = true;
        b.is_favorite = true;
        assert_eq!(a, b);

        let other = Asset::from_library(&LibraryAsset::new(AssetId::new()), 0);
        assert_ne!(a, other);
    }

    #[test]
    fn test_accessibility_label() {
        let mut record = LibraryAsset::new(AssetId::new());
        let mut asset = Asset::from_library(&record, 0);
        assert_eq!(asset.accessibility_label(), "Photo");

        asset.is_favorite = true;
        assert_eq!(asset.accessibility_label(), "Photo, Favorite");

        record.creation_date = Some(Utc.with_ymd_and_hms(2023, 9, 26, 10, 0, 0).unwrap());
        let asset = Asset::from_library(&record, 0);
        assert_eq!(asset.accessibility_label(), "Photo from September 26, 2023");
    }

    #[test]
    fn test_handle_requires_fetch_position() {
        let record = LibraryAsset::new(AssetId::new());
        let mut asset = Asset::from_library(&record, 4);
        assert_eq!(
            asset.handle(),
            Some(AssetHandle {
                position: 4,
                id: record.id
            })
        );

        asset.index = None;
        assert_eq!(asset.handle(), None);
    }

    #[test]
    fn test_scaled_image_size() {
        assert_eq!(ImageSize::scaled(100.0, 50.0, 2.0), ImageSize::new(200, 100));
        assert_eq!(ImageSize::scaled(0.1, 0.1, 1.0), ImageSize::square(1));
    }
}
