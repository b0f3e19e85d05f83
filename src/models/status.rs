use diary_client::PhotoRecord;

/// Shared UI flags: loading while any upload is pending, plus the last failure message
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreStatus {
    pub is_loading: bool,
    pub error: Option<String>,
}

/// State of a single upload call
#[derive(Debug, Clone, PartialEq)]
pub enum UploadStatus {
    Pending,
    Success(Vec<PhotoRecord>),
    Failure(String),
}

impl UploadStatus {
    pub fn is_finished(&self) -> bool {
        !matches!(self, UploadStatus::Pending)
    }
}
