use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::service::ApiError;

pub type DiaryId = i64;
pub type PhotoId = i64;

/// Normalized photo metadata as kept on a diary entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhotoRecord {
    pub id: PhotoId,
    pub image: String,
    pub image_thumbnail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// One photo object as returned by `calendars/baby-diaries/{id}/photo/`
#[derive(Debug, Clone, Deserialize)]
pub struct RawPhoto {
    pub photo_id: PhotoId,
    pub image: String,
    pub image_thumbnail: Option<String>,
    pub thumbnail_url: Option<String>,
    pub created_at: Option<String>,
}

/// The upload endpoint answers with either a list or a single object
#[derive(Debug, Clone)]
pub enum PhotoPayload {
    Many(Vec<RawPhoto>),
    One(RawPhoto),
}

impl PhotoPayload {
    pub fn into_records(self) -> Vec<PhotoRecord> {
        match self {
            PhotoPayload::Many(photos) => photos.into_iter().map(PhotoRecord::from).collect(),
            PhotoPayload::One(photo) => vec![PhotoRecord::from(photo)],
        }
    }
}

impl From<RawPhoto> for PhotoRecord {
    /// Thumbnail lookup order: `image_thumbnail`, `thumbnail_url`, then `image`.
    /// Empty strings are skipped like missing fields.
    fn from(raw: RawPhoto) -> Self {
        let image_thumbnail = non_empty(raw.image_thumbnail)
            .or_else(|| non_empty(raw.thumbnail_url))
            .unwrap_or_else(|| raw.image.clone());

        Self {
            id: raw.photo_id,
            image: raw.image,
            image_thumbnail,
            created_at: raw.created_at,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// A payload the server sent instead of data: `null`, `false`, `0` or `""`
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Parses the raw response body of a photo upload into records.
///
/// An empty body or a blank JSON value is reported as [`ApiError::EmptyResponse`];
/// anything else that does not match the schema is an [`ApiError::JsonError`].
pub fn parse_photo_payload(body: &[u8]) -> Result<Vec<PhotoRecord>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::EmptyResponse);
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::JsonError(format!("Failed to parse response: {}", e)))?;

    if is_blank(&value) {
        return Err(ApiError::EmptyResponse);
    }

    let payload = match value {
        Value::Array(items) => {
            log::debug!("Array response received, count: {}", items.len());
            let photos = items
                .into_iter()
                .enumerate()
                .map(|(index, item)| {
                    serde_json::from_value(item).map_err(|e| {
                        ApiError::JsonError(format!("Invalid photo at index {}: {}", index, e))
                    })
                })
                .collect::<Result<Vec<RawPhoto>, _>>()?;
            PhotoPayload::Many(photos)
        }
        Value::Object(_) => {
            log::debug!("Single object response received");
            let photo = serde_json::from_value(value)
                .map_err(|e| ApiError::JsonError(format!("Invalid photo: {}", e)))?;
            PhotoPayload::One(photo)
        }
        other => {
            return Err(ApiError::JsonError(format!(
                "Expected a photo object or list, got {}",
                other
            )))
        }
    };

    Ok(payload.into_records())
}

/// A photo file ready to be sent as the `image` form field
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

impl PhotoFile {
    pub fn new(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Reads a file from disk, guessing the MIME type from its extension
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "photo".to_string());
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Ok(Self::new(file_name, mime_type, bytes))
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}
