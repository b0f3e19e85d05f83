//! # Baby Diary
//!
//! Keeps baby diary entries in memory and attaches uploaded photos to them.
//!
//! The HTTP side lives in the `diary-client` crate; this crate owns the
//! local state: the diary list, the selected entry, and the loading and
//! error flags shown by the UI.

pub mod config;
pub mod error;
pub mod models;
pub mod services;

#[cfg(test)]
mod test_support;

pub use config::AppConfig;
pub use error::AppError;
pub use models::{DiaryEntry, DiaryId, PhotoId, PhotoRecord, StoreStatus, UploadStatus};
pub use services::{DiaryStore, UploadHandle, UPLOAD_FAILED_MESSAGE};
