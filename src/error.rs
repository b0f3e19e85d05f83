use diary_client::ApiError;
use std::fmt;

/// Central error types for the Baby Diary app
#[derive(Debug)]
pub enum AppError {
    /// Calendars API error
    Api(ApiError),
    /// Filesystem error
    Filesystem(std::io::Error),
    /// Invalid or unreadable configuration
    Config(String),
    /// Snapshot (de)serialization error
    Serialization(String),
    /// Resource not found
    NotFound(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Api(e) => write!(f, "API error: {}", e),
            AppError::Filesystem(e) => write!(f, "Filesystem error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Api(e) => Some(e),
            AppError::Filesystem(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ApiError> for AppError {
    fn from(e: ApiError) -> Self {
        AppError::Api(e)
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Filesystem(e)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for AppError {
    fn from(e: toml::de::Error) -> Self {
        AppError::Config(e.to_string())
    }
}

/// User-friendly error messages for UI
impl AppError {
    pub fn user_message(&self) -> String {
        match self {
            AppError::Api(ApiError::Cancelled) => "The upload was cancelled.".to_string(),
            AppError::Api(ApiError::NetworkError(_)) => {
                "Could not reach the server. Please check your connection.".to_string()
            }
            AppError::Api(_) => crate::services::UPLOAD_FAILED_MESSAGE.to_string(),
            AppError::Filesystem(_) => {
                "Error accessing files. Please check the path and permissions.".to_string()
            }
            AppError::Config(msg) => format!("Invalid configuration: {}", msg),
            AppError::Serialization(_) => "The saved diary data could not be read.".to_string(),
            AppError::NotFound(msg) => format!("{} was not found.", msg),
        }
    }
}
