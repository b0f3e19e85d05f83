use diary_client::{DiaryId, PhotoRecord};
use serde::{Deserialize, Serialize};

/// A dated baby diary entry with its photo attachments in upload order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiaryEntry {
    pub id: DiaryId,
    #[serde(default)]
    pub diary_date: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub photos: Vec<PhotoRecord>,
}

impl DiaryEntry {
    pub fn new(id: DiaryId) -> Self {
        Self {
            id,
            diary_date: None,
            content: None,
            photos: Vec::new(),
        }
    }

    /// Appends photos at the end, keeping their order; duplicates are not filtered
    pub fn append_photos(&mut self, photos: &[PhotoRecord]) {
        self.photos.extend_from_slice(photos);
    }
}
