//! HTTP route handlers for the styling assistant API.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::services::ServeDir;

use crate::chat::{ChatError, ChatReply, ChatRequest, ErrorReply, ImageReply};
use crate::core::image::validate_base64;
use crate::core::{Session, SessionId, WorkMode};
use crate::storage::StoreError;
use crate::workflow::{UiCommand, UiState, WorkflowError, Workspace, list_of_mode};

use super::state::AppState;

/// Create the API router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.server.static_dir.clone();
    Router::new()
        .route("/health", get(health_check))
        .route("/api/chat", post(chat))
        .route("/api/sessions", get(list_sessions).post(create_session))
        .route("/api/sessions/open", post(open_workspace))
        .route(
            "/api/sessions/{id}",
            get(get_session).delete(delete_session).patch(rename_session),
        )
        .route("/api/sessions/{id}/complete", post(complete_session))
        .route("/api/sessions/{id}/events", post(session_event))
        .fallback_service(ServeDir::new(static_dir))
        .with_state(state)
}

/// Error response: `{ "error": "..." }` with a status.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn not_found(id: SessionId) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("session not found: {id}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorReply { error: self.message })).into_response()
    }
}

impl From<&ChatError> for ApiError {
    fn from(err: &ChatError) -> Self {
        let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        tracing::error!(error = %err, "session store failure");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::InvalidCommand { .. } => Self::new(StatusCode::CONFLICT, err.to_string()),
            WorkflowError::SessionNotFound(id) => Self::not_found(id),
            WorkflowError::Store(store) => store.into(),
        }
    }
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "styling-agent",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Multiplexed chat / image endpoint.
async fn chat(State(state): State<Arc<AppState>>, body: Result<Json<Value>, JsonRejection>) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return ApiError::new(StatusCode::BAD_REQUEST, rejection.body_text()).into_response(),
    };

    let request = match ChatRequest::from_value(&body) {
        Ok(request) => request,
        Err(err) => return ApiError::from(&err).into_response(),
    };

    match request {
        ChatRequest::Image { prompt } => match state.chat.generate_image(&prompt).await {
            Ok(outcome) => Json(ImageReply::from(outcome)).into_response(),
            Err(err) => ApiError::from(&err).into_response(),
        },
        ChatRequest::Chat { messages, mode } => match state.chat.reply(mode, &messages).await {
            Ok(message) => Json(ChatReply { message }).into_response(),
            Err(err) => ApiError::from(&err).into_response(),
        },
    }
}

/// Optional mode filter.
#[derive(Debug, Deserialize)]
pub struct ModeQuery {
    /// Only sessions of this mode.
    pub mode: Option<WorkMode>,
}

/// List sessions, newest first. Read failures yield an empty list.
async fn list_sessions(State(state): State<Arc<AppState>>, Query(query): Query<ModeQuery>) -> Json<Vec<Session>> {
    let sessions = match query.mode {
        Some(mode) => list_of_mode(state.store.as_ref(), mode).await,
        None => state.store.list().await.unwrap_or_else(|err| {
            tracing::warn!(error = %err, "failed to list sessions");
            Vec::new()
        }),
    };
    Json(sessions)
}

/// New session request.
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    /// Workflow mode.
    #[serde(default)]
    pub mode: WorkMode,
    /// Title; defaults to `"<mode label> <date>"`.
    pub title: Option<String>,
}

async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateSessionRequest>,
) -> (StatusCode, Json<Session>) {
    let mut workspace = Workspace::new(Arc::clone(&state.store), request.mode);
    let session = workspace.new_session(request.title).await.clone();
    (StatusCode::CREATED, Json(session))
}

/// Mode selection request.
#[derive(Debug, Deserialize)]
pub struct OpenRequest {
    /// Workflow mode.
    #[serde(default)]
    pub mode: WorkMode,
}

/// Session list plus the session to show.
#[derive(Debug, Serialize)]
pub struct WorkspaceView {
    /// Sessions of the mode, newest first.
    pub sessions: Vec<Session>,
    /// Session to show.
    pub current: Option<Session>,
}

impl From<&Workspace> for WorkspaceView {
    fn from(workspace: &Workspace) -> Self {
        Self {
            sessions: workspace.sessions().to_vec(),
            current: workspace.current().cloned(),
        }
    }
}

/// Open a mode: list its sessions, creating one when there are none.
async fn open_workspace(State(state): State<Arc<AppState>>, Json(request): Json<OpenRequest>) -> Json<WorkspaceView> {
    let workspace = Workspace::load(Arc::clone(&state.store), request.mode).await;
    Json(WorkspaceView::from(&workspace))
}

async fn find_session(state: &AppState, id: SessionId) -> Result<Session, ApiError> {
    state.store.get(id).await?.ok_or_else(|| ApiError::not_found(id))
}

/// Workspace of the session's mode with that session selected.
async fn workspace_for(state: &AppState, id: SessionId) -> Result<Workspace, ApiError> {
    let session = find_session(state, id).await?;
    let mut workspace = Workspace::load(Arc::clone(&state.store), session.mode).await;
    workspace.select(id)?;
    Ok(workspace)
}

async fn get_session(State(state): State<Arc<AppState>>, Path(id): Path<SessionId>) -> Result<Json<Session>, ApiError> {
    Ok(Json(find_session(&state, id).await?))
}

/// Delete a session and return the one to show next.
async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
) -> Result<Json<Option<Session>>, ApiError> {
    let mut workspace = workspace_for(&state, id).await?;
    let next = workspace.delete_session(id).await?.cloned();
    state.ui.remove(&id);
    Ok(Json(next))
}

/// Rename request.
#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    /// New title.
    pub title: String,
}

async fn rename_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
    Json(request): Json<RenameRequest>,
) -> Result<Json<Session>, ApiError> {
    if request.title.trim().is_empty() {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "title must not be empty"));
    }
    let mut workspace = workspace_for(&state, id).await?;
    let session = workspace
        .rename_current(request.title)
        .await
        .cloned()
        .ok_or_else(|| ApiError::not_found(id))?;
    Ok(Json(session))
}

/// Mark a session completed and return the fresh session that follows it.
async fn complete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
) -> Result<Json<Session>, ApiError> {
    let mut workspace = workspace_for(&state, id).await?;
    let next = workspace.proceed_to_next().await.clone();
    state.ui.remove(&id);
    Ok(Json(next))
}

/// Session and UI state after a command.
#[derive(Debug, Serialize)]
pub struct EventResponse {
    /// Updated session.
    pub session: Session,
    /// Updated UI state.
    pub ui: UiState,
}

/// Run one stylist command through the reconciler.
async fn session_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
    Json(command): Json<UiCommand>,
) -> Result<Json<EventResponse>, ApiError> {
    if let UiCommand::SubmitMessage {
        image_base64: Some(image),
        ..
    } = &command
    {
        validate_base64(image)
            .map_err(|err| ApiError::new(StatusCode::BAD_REQUEST, format!("invalid image payload: {err}")))?;
    }

    let mut session = find_session(&state, id).await?;
    let mut ui = state.ui_state(id);

    let result = state.conversation.handle(&mut session, &mut ui, command).await;
    if !matches!(result, Err(WorkflowError::InvalidCommand { .. })) {
        state.ui.insert(id, ui.clone());
    }
    result?;

    Ok(Json(EventResponse { session, ui }))
}
