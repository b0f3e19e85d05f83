//! # Diary Client
//!
//! HTTP client for the baby diary endpoints of the calendars API.
//!
//! This crate provides:
//! - Multipart photo upload to `calendars/baby-diaries/{id}/photo/`
//! - Normalization of the upload response into [`PhotoRecord`]s
//! - Cancellation of in-flight uploads through a `CancellationToken`
//!
//! ## Separation of Concerns
//!
//! This crate only talks to the server. It does **not**:
//! - Keep diary entries in memory (handled by the application)
//! - Track loading or error state for the UI (handled by the application)
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use diary_client::{ApiConfig, DiaryApiClient, PhotoFile};
//!
//! let client = DiaryApiClient::new(ApiConfig::default())?;
//! let photo = PhotoFile::from_path("ultrasound.jpg").await?;
//! let records = client.upload_baby_diary_photo(42, &photo).await?;
//! ```

pub mod models;
pub mod service;

pub use models::{parse_photo_payload, DiaryId, PhotoFile, PhotoId, PhotoPayload, PhotoRecord, RawPhoto};
pub use service::{ApiConfig, ApiError, DiaryApiClient};
pub use tokio_util::sync::CancellationToken;
