//! Common utilities and shared types for civic-report-rs.
//!
//! This crate provides foundational components used across all civic-report-rs crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **Geofencing**: Service-area validation via [`ServiceArea`] and [`BoundingBox`]
//! - **Storage**: Photo storage backends via [`PhotoStorage`]
//!
//! # Example
//!
//! ```no_run
//! use civic_common::{Config, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     println!("Listening on port {}", config.server.port);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod geo;
pub mod storage;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use geo::{BoundingBox, Location, LocationInput, ServiceArea};
pub use storage::{DecodedPhoto, LocalPhotoStorage, PhotoStorage, decode_photo_data_uri};
