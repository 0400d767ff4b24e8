//! HTTP surface of the delivery service.
//!
//! | route | operation |
//! |---|---|
//! | `GET /tracks` | list |
//! | `GET /tracks/{id}` | fetch bytes |
//! | `GET /tracks/{id}/metadata` | fetch metadata |
//! | `GET /search?q=` | search |
//! | `POST /tracks/{id}/rating` | rate |
//! | `GET /health` | liveness |

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::config::ServerSettings;
use crate::library::{TrackId, TrackMetadata};

use super::{DeliveryError, DeliveryService, ErrorBody, LocalLibrary};

/// Error returned by handlers.
#[derive(Debug)]
pub struct ApiError(DeliveryError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            DeliveryError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ErrorBody::from(&self.0))).into_response()
    }
}

impl From<DeliveryError> for ApiError {
    fn from(err: DeliveryError) -> Self {
        Self(err)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RatingRequest {
    pub score: i32,
}

type Library = Arc<LocalLibrary>;

/// Run a filesystem-bound library call on the blocking pool.
async fn blocking<T, F>(library: Library, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&LocalLibrary) -> Result<T, DeliveryError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&library))
        .await
        .map_err(|e| DeliveryError::IoFailure(format!("library task failed: {e}")))?
        .map_err(ApiError::from)
}

async fn list_tracks(State(library): State<Library>) -> Result<Json<Vec<TrackId>>, ApiError> {
    let tracks = blocking(library, |l| l.list_tracks()).await?;
    Ok(Json(tracks))
}

async fn fetch_track(
    State(library): State<Library>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = TrackId::new(id);
    let blob = blocking(library, move |l| l.fetch_track(&id)).await?;
    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        blob.into_bytes(),
    )
        .into_response())
}

async fn fetch_metadata(
    State(library): State<Library>,
    Path(id): Path<String>,
) -> Result<Json<TrackMetadata>, ApiError> {
    let id = TrackId::new(id);
    let metadata = blocking(library, move |l| l.fetch_metadata(&id)).await?;
    Ok(Json(metadata))
}

async fn search(
    State(library): State<Library>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<TrackId>>, ApiError> {
    let tracks = blocking(library, move |l| l.search(&params.q)).await?;
    Ok(Json(tracks))
}

async fn rate(
    State(library): State<Library>,
    Path(id): Path<String>,
    Json(request): Json<RatingRequest>,
) -> Result<StatusCode, ApiError> {
    library.rate(&TrackId::new(id), request.score)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn health() -> &'static str {
    "ok"
}

/// Router exposing `library`.
pub fn router(library: Library) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/tracks", get(list_tracks))
        .route("/tracks/{id}", get(fetch_track))
        .route("/tracks/{id}/metadata", get(fetch_metadata))
        .route("/tracks/{id}/rating", post(rate))
        .route("/search", get(search))
        .with_state(library)
}

/// Serve the library described by `settings` until Ctrl-C.
pub async fn serve(settings: ServerSettings) -> anyhow::Result<()> {
    let bind = settings.bind.clone();
    let library = Arc::new(LocalLibrary::new(settings));

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    tracing::info!(
        addr = %listener.local_addr()?,
        music_dir = %library.root().display(),
        "server ready"
    );

    axum::serve(listener, router(library))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await
        .context("server error")?;
    Ok(())
}
