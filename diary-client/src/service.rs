use crate::models::{parse_photo_payload, DiaryId, PhotoFile, PhotoRecord};
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Error type for calendars API operations
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    NetworkError(String),
    InvalidRequest(String),
    ServerError { status: u16, detail: String },
    JsonError(String),
    EmptyResponse,
    Cancelled,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            ApiError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ApiError::ServerError { status, detail } => {
                write!(f, "Server returned status {}: {}", status, detail)
            }
            ApiError::JsonError(msg) => write!(f, "JSON error: {}", msg),
            ApiError::EmptyResponse => write!(f, "Server response contained no data"),
            ApiError::Cancelled => write!(f, "Request cancelled"),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// HTTP status of the failed response, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::ServerError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// DRF error bodies look like `{"detail": "..."}`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

fn error_detail(body: &[u8]) -> String {
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(err) => err.detail,
        Err(_) => String::from_utf8_lossy(body).trim().to_string(),
    }
}

/// Connection settings for the calendars API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub access_token: Option<String>,
    /// Whole-request limit; unset means an upload runs until it completes or fails
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    "http://localhost:8000/v1/".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    "BabyDiary/0.1.0".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            access_token: None,
            timeout_secs: None,
            connect_timeout_secs: default_connect_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

/// Splits the body into views of the same buffer, without copying
fn upload_chunks(data: Bytes) -> impl Iterator<Item = Bytes> {
    let total = data.len();
    (0..total)
        .step_by(UPLOAD_CHUNK_SIZE)
        .map(move |start| data.slice(start..(start + UPLOAD_CHUNK_SIZE).min(total)))
}

/// Logs upload progress as whole percentages, once per change
struct UploadProgress {
    total: usize,
    sent: usize,
    last_percent: Option<u64>,
}

impl UploadProgress {
    fn new(total: usize) -> Self {
        Self {
            total,
            sent: 0,
            last_percent: None,
        }
    }

    fn advance(&mut self, bytes: usize) {
        self.sent += bytes;
        if self.total == 0 {
            return;
        }
        let percent = ((self.sent as f64 * 100.0) / self.total as f64).round() as u64;
        if self.last_percent != Some(percent) {
            self.last_percent = Some(percent);
            log::debug!("Upload progress: {}%", percent);
        }
    }
}

/// Client for the calendars API
#[derive(Debug, Clone)]
pub struct DiaryApiClient {
    config: ApiConfig,
    http: reqwest::Client,
}

impl DiaryApiClient {
    /// Create a new client; fails only if the HTTP client cannot be built
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .tcp_keepalive(Duration::from_secs(30))
            .user_agent(config.user_agent.clone());
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let http = builder
            .build()
            .map_err(|e| ApiError::NetworkError(format!("Client build failed: {}", e)))?;

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Absolute URL of the photo upload endpoint for one diary
    pub fn photo_upload_url(&self, diary_id: DiaryId) -> String {
        format!(
            "{}/calendars/baby-diaries/{}/photo/",
            self.config.base_url.trim_end_matches('/'),
            diary_id
        )
    }

    fn build_form(photo: &PhotoFile) -> Result<Form, ApiError> {
        let mut progress = UploadProgress::new(photo.size());
        let chunks = upload_chunks(photo.bytes.clone()).map(move |chunk| {
            progress.advance(chunk.len());
            Ok::<_, std::io::Error>(chunk)
        });
        let stream = futures_util::stream::iter(chunks);

        let part = Part::stream_with_length(reqwest::Body::wrap_stream(stream), photo.size() as u64)
            .file_name(photo.file_name.clone())
            .mime_str(&photo.mime_type)
            .map_err(|e| {
                ApiError::InvalidRequest(format!("Invalid MIME type {}: {}", photo.mime_type, e))
            })?;

        log::debug!(
            "FormData: image = File({}, {}, {} bytes)",
            photo.file_name,
            photo.mime_type,
            photo.size()
        );

        Ok(Form::new().part("image", part))
    }

    /// Upload one photo to a baby diary entry.
    ///
    /// Sends a multipart POST with a single `image` field and returns the
    /// normalized photo records from the response.
    pub async fn upload_baby_diary_photo(
        &self,
        diary_id: DiaryId,
        photo: &PhotoFile,
    ) -> Result<Vec<PhotoRecord>, ApiError> {
        log::debug!(
            "Photo file: {} ({}, {} bytes)",
            photo.file_name,
            photo.mime_type,
            photo.size()
        );

        let form = Self::build_form(photo)?;
        let url = self.photo_upload_url(diary_id);
        log::debug!("API call: POST {}", url);

        let mut request = self
            .http
            .post(&url)
            .multipart(form)
            .header("Accept", "application/json")
            .header("X-Requested-With", "XMLHttpRequest");
        if let Some(token) = &self.config.access_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::NetworkError(format!("Upload request failed: {}", e)))?;

        let status = response.status();
        log::debug!("API response: {}", status);

        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::NetworkError(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            let detail = error_detail(&body);
            log::error!("Upload failed with status {}: {}", status.as_u16(), detail);
            return Err(ApiError::ServerError {
                status: status.as_u16(),
                detail,
            });
        }

        let records = parse_photo_payload(&body)?;
        log::debug!("Processed photo data: {:?}", records);
        Ok(records)
    }

    /// Like [`Self::upload_baby_diary_photo`], but gives up as soon as `token` is cancelled.
    /// The in-flight request is dropped in that case.
    pub async fn upload_baby_diary_photo_cancellable(
        &self,
        diary_id: DiaryId,
        photo: &PhotoFile,
        token: &CancellationToken,
    ) -> Result<Vec<PhotoRecord>, ApiError> {
        tokio::select! {
            _ = token.cancelled() => {
                log::warn!("Photo upload for diary {} cancelled", diary_id);
                Err(ApiError::Cancelled)
            }
            result = self.upload_baby_diary_photo(diary_id, photo) => result,
        }
    }
}
