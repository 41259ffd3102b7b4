//! # PhotoX
//!
//! Session layer of the PhotoX gallery: configuration, logging bootstrap, the
//! shared [`DataModel`] and the detail view's [`PhotoBrowser`]. The photo
//! state itself lives in the `photo-gallery` crate.

pub mod browser;
pub mod config;
pub mod data_model;
pub mod error;
pub mod logging;

pub use browser::PhotoBrowser;
pub use config::{AppConfig, ConfigError, GridLayout, ImageCacheSettings};
pub use data_model::DataModel;
pub use error::AppError;
