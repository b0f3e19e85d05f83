//! In-process calendars API used by the store tests

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use diary_client::{ApiConfig, DiaryApiClient, PhotoFile};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Pauses the handler until released, to observe state while a request is pending
#[derive(Clone, Default)]
pub struct Gate {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

#[derive(Clone)]
pub struct MockApi {
    pub status: StatusCode,
    pub body: String,
    pub uploads: Arc<Mutex<Vec<(i64, String)>>>,
    pub gate: Option<Gate>,
}

impl MockApi {
    pub fn new(status: StatusCode, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            uploads: Arc::new(Mutex::new(Vec::new())),
            gate: None,
        }
    }

    pub fn gated(mut self) -> (Self, Gate) {
        let gate = Gate::default();
        self.gate = Some(gate.clone());
        (self, gate)
    }

    /// Serves the API on a random local port and returns a client pointing at it
    pub async fn start(self) -> DiaryApiClient {
        let app = Router::new()
            .route("/v1/calendars/baby-diaries/:id/photo/", post(upload))
            .with_state(self);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        DiaryApiClient::new(ApiConfig {
            base_url: format!("http://{}/v1/", addr),
            ..Default::default()
        })
        .unwrap()
    }
}

async fn upload(
    State(api): State<MockApi>,
    Path(diary_id): Path<i64>,
    mut multipart: Multipart,
) -> (StatusCode, String) {
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        field.bytes().await.unwrap();
        api.uploads.lock().unwrap().push((diary_id, name));
    }

    if let Some(gate) = &api.gate {
        gate.entered.notify_one();
        gate.release.notified().await;
    }

    (api.status, api.body.clone())
}

pub fn photo() -> PhotoFile {
    PhotoFile::new("first-kick.jpg", "image/jpeg", vec![0xFF, 0xD8, 0xFF, 0xD9])
}
