//! HTTP host: the scoreboard page plus a small JSON API over the session registry.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use crate::compose::from_data_uri;
use crate::config::{SessionLimits, StatCatalog, StatGroup};
use crate::error::ScoreError;
use crate::fonts::Fonts;
use crate::session::{lock, EventOutcome, ImageSlots, SessionId, SessionRegistry, UiEvent};

const INDEX_HTML: &str = include_str!("../web/index.html");

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub fonts: Arc<Fonts>,
}

impl AppState {
    pub fn new(catalog: StatCatalog, limits: SessionLimits, fonts: Fonts) -> Self {
        Self {
            registry: Arc::new(SessionRegistry::with_limits(Arc::new(catalog), limits)),
            fonts: Arc::new(fonts),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/catalog", get(catalog))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(refresh).delete(close_session))
        .route("/api/sessions/:id/events", post(apply_event))
        .route("/api/sessions/:id/images", get(images))
        .route("/api/sessions/:id/images/:group", get(image_png))
        .with_state(state)
}

// *************** Errors ***************

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl From<ScoreError> for ApiError {
    fn from(err: ScoreError) -> Self {
        match err {
            ScoreError::UnknownSession(_) => ApiError::NotFound(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("render task failed: {}", err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}

// *************** Handlers ***************

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn catalog(State(state): State<AppState>) -> Json<StatCatalog> {
    Json(state.registry.catalog().as_ref().clone())
}

#[derive(Serialize)]
struct SessionCreated {
    id: SessionId,
    #[serde(flatten)]
    outcome: EventOutcome,
}

async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionCreated>) {
    let (id, session) = state.registry.create();
    let outcome = lock(&session).apply(UiEvent::Refresh, &state.fonts);
    (StatusCode::CREATED, Json(SessionCreated { id, outcome }))
}

async fn refresh(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> Result<Json<EventOutcome>, ApiError> {
    let session = state.registry.get(id)?;
    let outcome = lock(&session).apply(UiEvent::Refresh, &state.fonts);
    Ok(Json(outcome))
}

async fn close_session(State(state): State<AppState>, Path(id): Path<SessionId>) -> Result<StatusCode, ApiError> {
    if state.registry.remove(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ScoreError::UnknownSession(id).into())
    }
}

async fn apply_event(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
    Json(event): Json<UiEvent>,
) -> Result<Json<EventOutcome>, ApiError> {
    let session = state.registry.get(id)?;
    let outcome = if event == UiEvent::GenerateImages {
        // PNG encoding is CPU-bound; keep it off the async workers
        let fonts = state.fonts.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = lock(&session);
            guard.apply(event, &fonts)
        })
        .await?
    } else {
        let mut guard = lock(&session);
        guard.apply(event, &state.fonts)
    };
    Ok(Json(outcome))
}

async fn images(State(state): State<AppState>, Path(id): Path<SessionId>) -> Result<Json<ImageSlots>, ApiError> {
    let session = state.registry.get(id)?;
    let slots = lock(&session).images().clone();
    Ok(Json(slots))
}

async fn image_png(
    State(state): State<AppState>,
    Path((id, group)): Path<(SessionId, u8)>,
) -> Result<Response, ApiError> {
    let group = StatGroup::from_number(group)
        .ok_or_else(|| ApiError::NotFound(format!("no stat group {}", group)))?;
    let session = state.registry.get(id)?;
    let uri = lock(&session)
        .images()
        .get(group)
        .map(str::to_owned)
        .ok_or_else(|| ApiError::NotFound(format!("no image generated yet for {}", group)))?;
    let png = from_data_uri(&uri).ok_or_else(|| ApiError::Internal("stored image is not a PNG data URI".into()))?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}

// *************** Tests ***************
