//! Local photo library backed by SQLite and image files
//!
//! Stands in for the platform photo library on desktop builds and in host
//! tests. Photos are files below `storage_path`; their metadata lives in the
//! `library_photos` table.

use crate::error::LibraryError;
use crate::library::{AuthorizationStatus, FetchResult, FetchedAlbum, PhotoLibrary};
use crate::models::{AlbumSource, AssetId, ImageSize, LibraryAsset};
use crate::schema::init_library_schema;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use image::{imageops::FilterType, DynamicImage};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// Title reported for the whole-library album
pub const USER_LIBRARY_TITLE: &str = "Recents";

/// Configuration for the local photo library
#[derive(Debug, Clone)]
pub struct LocalLibraryConfig {
    /// Base directory for photo files
    pub storage_path: PathBuf,
}

pub struct LocalPhotoLibrary {
    conn: Mutex<Connection>,
    config: LocalLibraryConfig,
    authorization: Mutex<AuthorizationStatus>,
}

impl LocalPhotoLibrary {
    pub fn new(conn: Connection, config: LocalLibraryConfig) -> Result<Self, LibraryError> {
        init_library_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            config,
            authorization: Mutex::new(AuthorizationStatus::Authorized),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_authorization(&self, status: AuthorizationStatus) {
        *self.authorization.lock().unwrap_or_else(|e| e.into_inner()) = status;
    }

    /// Returns the absolute path of a stored photo
    pub fn absolute_path(&self, relative_path: &str) -> PathBuf {
        self.config.storage_path.join(relative_path)
    }

    /// Registers an image file that already lives below `storage_path`
    pub fn import_photo(
        &self,
        album: Option<&str>,
        relative_path: &str,
        created_at: DateTime<Utc>,
    ) -> Result<AssetId, LibraryError> {
        let path = self.absolute_path(relative_path);
        let (width, height) = image::image_dimensions(&path)?;
        let id = AssetId::new();

        self.conn().execute(
            "INSERT INTO library_photos (uuid, album, relative_path, pixel_width, pixel_height, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id.to_string(),
                album,
                relative_path,
                width,
                height,
                created_at
            ],
        )?;

        log::debug!("Imported photo {} from {:?}", id, path);
        Ok(id)
    }

    fn relative_path(&self, id: &AssetId) -> Result<String, LibraryError> {
        self.conn()
            .query_row(
                "SELECT relative_path FROM library_photos WHERE uuid = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(LibraryError::NotFound(*id))
    }

    fn query_assets(&self, album: Option<&str>) -> Result<Vec<LibraryAsset>, LibraryError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT uuid, created_at, is_favorite, pixel_width, pixel_height
             FROM library_photos
             WHERE ?1 IS NULL OR album = ?1
             ORDER BY created_at DESC",
        )?;

        let rows = stmt.query_map(params![album], |row| {
            let uuid_str: String = row.get(0)?;
            Ok(LibraryAsset {
                id: AssetId(
                    Uuid::parse_str(&uuid_str).map_err(|_| rusqlite::Error::InvalidQuery)?,
                ),
                creation_date: row.get(1)?,
                is_favorite: row.get(2)?,
                pixel_width: row.get(3)?,
                pixel_height: row.get(4)?,
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

/// Scales an image down to fit inside `target`. Never upscales.
fn fit_to_target(img: DynamicImage, target: ImageSize) -> DynamicImage {
    if img.width() <= target.width && img.height() <= target.height {
        return img;
    }
    img.resize(target.width, target.height, FilterType::Lanczos3)
}

#[async_trait]
impl PhotoLibrary for LocalPhotoLibrary {
    fn authorization_status(&self) -> AuthorizationStatus {
        *self.authorization.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn request_authorization(&self) -> AuthorizationStatus {
        // No prompt on desktop: an undetermined local library is granted
        let mut status = self.authorization.lock().unwrap_or_else(|e| e.into_inner());
        if *status == AuthorizationStatus::NotDetermined {
            *status = AuthorizationStatus::Authorized;
        }
        *status
    }

    async fn fetch_album(&self, source: &AlbumSource) -> Result<FetchedAlbum, LibraryError> {
        match source {
            AlbumSource::UserLibrary => Ok(FetchedAlbum {
                title: Some(USER_LIBRARY_TITLE.to_string()),
                assets: FetchResult::new(self.query_assets(None)?),
            }),
            AlbumSource::Named(name) => {
                let assets = self.query_assets(Some(name))?;
                if assets.is_empty() {
                    return Err(LibraryError::MissingAlbum(name.clone()));
                }
                Ok(FetchedAlbum {
                    title: Some(name.clone()),
                    assets: FetchResult::new(assets),
                })
            }
        }
    }

    async fn set_favorite(&self, id: &AssetId, is_favorite: bool) -> Result<(), LibraryError> {
        let rows = self.conn().execute(
            "UPDATE library_photos SET is_favorite = ?1 WHERE uuid = ?2",
            params![is_favorite, id.to_string()],
        )?;
        if rows == 0 {
            return Err(LibraryError::NotFound(*id));
        }
        Ok(())
    }

    async fn load_image(
        &self,
        id: &AssetId,
        target: ImageSize,
    ) -> Result<DynamicImage, LibraryError> {
        let path = self.absolute_path(&self.relative_path(id)?);

        tokio::task::spawn_blocking(move || {
            log::debug!("Decoding {:?} for {:?}", path, target);
            let img = image::open(&path)?;
            Ok(fit_to_target(img, target))
        })
        .await
        .map_err(|e| LibraryError::Other(format!("Task join error: {}", e)))?
    }

    async fn delete_asset(&self, id: &AssetId) -> Result<(), LibraryError> {
        let path = self.absolute_path(&self.relative_path(id)?);

        self.conn().execute(
            "DELETE FROM library_photos WHERE uuid = ?1",
            params![id.to_string()],
        )?;

        if let Err(e) = std::fs::remove_file(&path) {
            log::warn!("Could not remove photo file {:?}: {}", path, e);
        }

        log::info!("Deleted photo {}", id);
        Ok(())
    }
}
