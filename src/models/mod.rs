pub mod diary_entry;
pub mod status;

pub use diary_client::{DiaryId, PhotoId, PhotoRecord};
pub use diary_entry::*;
pub use status::*;
