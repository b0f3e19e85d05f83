//! In-memory baby diary state and the photo upload action.
//!
//! Entries live in one map keyed by id. The selected entry is only an id,
//! so photos appended to an entry are visible through [`DiaryStore::selected`]
//! without a second copy to keep in sync.

use crate::error::AppError;
use crate::models::{DiaryEntry, DiaryId, PhotoRecord, StoreStatus, UploadStatus};
use chrono::Utc;
use diary_client::{ApiError, DiaryApiClient, PhotoFile};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Message shown to the user when an upload fails; details only go to the log
pub const UPLOAD_FAILED_MESSAGE: &str = "An error occurred while uploading the baby diary photo.";

#[derive(Debug, Default)]
struct StoreState {
    diaries: IndexMap<DiaryId, DiaryEntry>,
    selected: Option<DiaryId>,
    in_flight: usize,
    error: Option<String>,
}

impl StoreState {
    fn status(&self) -> StoreStatus {
        StoreStatus {
            is_loading: self.in_flight > 0,
            error: self.error.clone(),
        }
    }

    /// Swaps in a new entry list and selection together; a selection without an entry is dropped
    fn replace_diaries(&mut self, diaries: Vec<DiaryEntry>, selected: Option<DiaryId>) {
        self.diaries = diaries.into_iter().map(|d| (d.id, d)).collect();
        self.selected = selected.filter(|id| self.diaries.contains_key(id));
    }
}

#[derive(Serialize, Deserialize)]
struct DiarySnapshot {
    saved_at: String,
    selected: Option<DiaryId>,
    diaries: Vec<DiaryEntry>,
}

/// Shared diary state; clones refer to the same store
#[derive(Debug, Clone)]
pub struct DiaryStore {
    state: Arc<Mutex<StoreState>>,
    status_tx: Arc<watch::Sender<StoreStatus>>,
}

impl Default for DiaryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Decrements the in-flight counter when the upload finishes, however it finishes
struct LoadingGuard<'a> {
    store: &'a DiaryStore,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.store.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
        self.store.publish(&state);
    }
}

impl DiaryStore {
    pub fn new() -> Self {
        let (status_tx, _) = watch::channel(StoreStatus::default());
        Self {
            state: Arc::new(Mutex::new(StoreState::default())),
            status_tx: Arc::new(status_tx),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &StoreState) {
        self.status_tx.send_replace(state.status());
    }

    /// Replaces all entries; a selection pointing at a removed entry is cleared
    pub fn set_diaries(&self, diaries: Vec<DiaryEntry>) {
        let mut state = self.lock();
        let selected = state.selected;
        state.replace_diaries(diaries, selected);
    }

    /// Inserts or replaces one entry, keeping its position if it already existed
    pub fn upsert_diary(&self, diary: DiaryEntry) {
        self.lock().diaries.insert(diary.id, diary);
    }

    pub fn diary(&self, id: DiaryId) -> Option<DiaryEntry> {
        self.lock().diaries.get(&id).cloned()
    }

    pub fn diaries(&self) -> Vec<DiaryEntry> {
        self.lock().diaries.values().cloned().collect()
    }

    pub fn select_diary(&self, id: DiaryId) -> Result<(), AppError> {
        let mut state = self.lock();
        if !state.diaries.contains_key(&id) {
            return Err(AppError::NotFound(format!("Diary {}", id)));
        }
        state.selected = Some(id);
        Ok(())
    }

    pub fn clear_selection(&self) {
        self.lock().selected = None;
    }

    pub fn selected_id(&self) -> Option<DiaryId> {
        self.lock().selected
    }

    /// The entry currently shown in the detail view
    pub fn selected(&self) -> Option<DiaryEntry> {
        let state = self.lock();
        state.selected.and_then(|id| state.diaries.get(&id).cloned())
    }

    pub fn status(&self) -> StoreStatus {
        self.lock().status()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().in_flight > 0
    }

    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<StoreStatus> {
        self.status_tx.subscribe()
    }

    pub fn clear_error(&self) {
        let mut state = self.lock();
        state.error = None;
        self.publish(&state);
    }

    fn begin_loading(&self) -> LoadingGuard<'_> {
        let mut state = self.lock();
        state.in_flight += 1;
        state.error = None;
        self.publish(&state);
        LoadingGuard { store: self }
    }

    fn fail(&self) {
        let mut state = self.lock();
        state.error = Some(UPLOAD_FAILED_MESSAGE.to_string());
        self.publish(&state);
    }

    fn merge_photos(&self, diary_id: DiaryId, records: &[PhotoRecord]) {
        let mut state = self.lock();
        let selected = state.selected;
        match state.diaries.get_mut(&diary_id) {
            Some(entry) => {
                entry.append_photos(records);
                log::debug!(
                    "Diary {} photo list updated, now {} photos",
                    diary_id,
                    entry.photos.len()
                );
                if selected == Some(diary_id) {
                    log::debug!("Selected diary {} received the new photos", diary_id);
                }
            }
            None => log::info!("Diary {} not found locally, skipping photo merge", diary_id),
        }
    }

    /// Uploads a photo to a diary entry and appends the returned records to it.
    ///
    /// The error flag is cleared at the start and set to [`UPLOAD_FAILED_MESSAGE`]
    /// on failure; the loading flag stays set until the call has finished.
    /// Errors are returned unchanged. A diary that is not held locally is not
    /// an error: the records are still returned, nothing is merged.
    pub async fn upload_photo(
        &self,
        client: &DiaryApiClient,
        diary_id: DiaryId,
        photo: PhotoFile,
    ) -> Result<Vec<PhotoRecord>, ApiError> {
        self.run_upload(client, diary_id, photo, None).await
    }

    /// [`Self::upload_photo`] bound to a cancellation token
    pub async fn upload_photo_cancellable(
        &self,
        client: &DiaryApiClient,
        diary_id: DiaryId,
        photo: PhotoFile,
        token: &CancellationToken,
    ) -> Result<Vec<PhotoRecord>, ApiError> {
        self.run_upload(client, diary_id, photo, Some(token)).await
    }

    async fn run_upload(
        &self,
        client: &DiaryApiClient,
        diary_id: DiaryId,
        photo: PhotoFile,
        token: Option<&CancellationToken>,
    ) -> Result<Vec<PhotoRecord>, ApiError> {
        let _loading = self.begin_loading();
        log::info!(
            "Uploading baby diary photo - diary_id: {}, file: {}",
            diary_id,
            photo.file_name
        );

        let result = match token {
            Some(token) => {
                client
                    .upload_baby_diary_photo_cancellable(diary_id, &photo, token)
                    .await
            }
            None => client.upload_baby_diary_photo(diary_id, &photo).await,
        };

        match result {
            Ok(records) => {
                self.merge_photos(diary_id, &records);
                log::info!(
                    "Baby diary photo upload succeeded ({} photos)",
                    records.len()
                );
                Ok(records)
            }
            Err(e) => {
                log::error!("Baby diary photo upload failed: {}", e);
                self.fail();
                Err(e)
            }
        }
    }

    /// Runs the upload on its own task and reports its progress on a per-call channel
    pub fn spawn_upload(
        &self,
        client: DiaryApiClient,
        diary_id: DiaryId,
        photo: PhotoFile,
        token: CancellationToken,
    ) -> UploadHandle {
        let (status_tx, status_rx) = watch::channel(UploadStatus::Pending);
        let store = self.clone();
        let task_token = token.clone();

        let join = tokio::spawn(async move {
            let result = store
                .upload_photo_cancellable(&client, diary_id, photo, &task_token)
                .await;
            let status = match &result {
                Ok(records) => UploadStatus::Success(records.clone()),
                Err(_) => UploadStatus::Failure(UPLOAD_FAILED_MESSAGE.to_string()),
            };
            status_tx.send_replace(status);
            result
        });

        UploadHandle {
            status: status_rx,
            token,
            join,
        }
    }

    /// Writes all entries and the selection to a JSON file
    pub fn save_snapshot(&self, path: impl AsRef<Path>) -> Result<(), AppError> {
        let path = path.as_ref();
        let snapshot = {
            let state = self.lock();
            DiarySnapshot {
                saved_at: Utc::now().to_rfc3339(),
                selected: state.selected,
                diaries: state.diaries.values().cloned().collect(),
            }
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(&snapshot)?)?;
        log::debug!(
            "Saved {} diaries to {}",
            snapshot.diaries.len(),
            path.display()
        );
        Ok(())
    }

    /// Replaces the store contents with a snapshot written by [`Self::save_snapshot`]
    pub fn load_snapshot(&self, path: impl AsRef<Path>) -> Result<(), AppError> {
        let path = path.as_ref();
        let snapshot: DiarySnapshot = serde_json::from_str(&fs::read_to_string(path)?)?;
        log::debug!(
            "Loaded {} diaries from {} (saved at {})",
            snapshot.diaries.len(),
            path.display(),
            snapshot.saved_at
        );

        self.lock().replace_diaries(snapshot.diaries, snapshot.selected);
        Ok(())
    }
}

/// Handle to an upload started with [`DiaryStore::spawn_upload`]
#[derive(Debug)]
pub struct UploadHandle {
    status: watch::Receiver<UploadStatus>,
    token: CancellationToken,
    join: JoinHandle<Result<Vec<PhotoRecord>, ApiError>>,
}

impl UploadHandle {
    pub fn status(&self) -> watch::Receiver<UploadStatus> {
        self.status.clone()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub async fn join(self) -> Result<Vec<PhotoRecord>, ApiError> {
        match self.join.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => Err(ApiError::Cancelled),
        }
    }
}
