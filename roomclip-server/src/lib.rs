use std::{collections::HashMap, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use rand::Rng;
use roomclip_core::{
    CLEAR_CLIPBOARD_PATH, CREATE_ROOM_PATH, ClearClipboardRequest, ClipboardResponse, CoreError,
    CreateRoomRequest, CreateRoomResponse, ErrorBody, FETCH_CLIPBOARD_ROUTE, HEALTH_PATH,
    LOGIN_PATH, LoginRequest, RoomId, SAVE_CLIPBOARD_PATH, SaveClipboardRequest, require_field,
};
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{info, warn};

#[derive(Debug)]
struct Room {
    password_salt: String,
    password_hash: String,
    clipboard_text: String,
}

#[derive(Debug, Default)]
struct BackendState {
    rooms: HashMap<RoomId, Room>,
}

#[derive(Debug, Clone)]
pub struct AppState {
    inner: Arc<RwLock<BackendState>>,
}

impl AppState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(BackendState::default())),
        }
    }

    /// Current stored text for `room_id`, bypassing the HTTP layer.
    pub async fn clipboard_text(&self, room_id: &str) -> Option<String> {
        let backend = self.inner.read().await;
        backend
            .rooms
            .get(room_id)
            .map(|room| room.clipboard_text.clone())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Room not found")]
    RoomNotFound,
    #[error("Invalid password")]
    InvalidPassword,
    #[error(transparent)]
    Validation(#[from] CoreError),
    #[error("{message}")]
    InvalidBody { status: StatusCode, message: String },
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            ServerError::RoomNotFound => StatusCode::NOT_FOUND,
            ServerError::InvalidPassword => StatusCode::UNAUTHORIZED,
            ServerError::Validation(_) => StatusCode::BAD_REQUEST,
            ServerError::InvalidBody { status, .. } => *status,
        }
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        ServerError::InvalidBody {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            detail: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[derive(Debug, Serialize)]
struct Acknowledged<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
    #[serde(flatten)]
    body: T,
}

impl<T> Acknowledged<T> {
    fn new(message: Option<&'static str>, body: T) -> Json<Self> {
        Json(Self {
            success: true,
            message,
            body,
        })
    }
}

#[derive(Debug, Serialize)]
struct Empty {}

type ApiResult<T> = Result<Json<Acknowledged<T>>, ServerError>;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(health_handler))
        .route(CREATE_ROOM_PATH, post(create_room_handler))
        .route(LOGIN_PATH, post(login_handler))
        .route(FETCH_CLIPBOARD_ROUTE, get(fetch_clipboard_handler))
        .route(SAVE_CLIPBOARD_PATH, post(save_clipboard_handler))
        .route(CLEAR_CLIPBOARD_PATH, post(clear_clipboard_handler))
        .with_state(state)
}

pub async fn serve(listener: TcpListener, state: AppState) -> Result<(), String> {
    info!(
        "room backend listening on {}",
        listener
            .local_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_owned())
    );
    axum::serve(listener, build_router(state))
        .await
        .map_err(|err| err.to_string())
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({"status": "healthy", "message": "Clipboard API is running"}))
}

async fn create_room_handler(
    State(state): State<AppState>,
    payload: Result<Json<CreateRoomRequest>, JsonRejection>,
) -> ApiResult<CreateRoomResponse> {
    let Json(request) = payload?;
    require_field("password", &request.password)?;

    let room_id = uuid::Uuid::new_v4().to_string();
    let password_salt = random_salt();
    let password_hash = hash_password(&password_salt, &request.password);

    let mut backend = state.inner.write().await;
    backend.rooms.insert(
        room_id.clone(),
        Room {
            password_salt,
            password_hash,
            clipboard_text: String::new(),
        },
    );
    drop(backend);

    info!(room_id = %room_id, "room created");
    Ok(Acknowledged::new(
        Some("Room created successfully"),
        CreateRoomResponse { room_id },
    ))
}

async fn login_handler(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<ClipboardResponse> {
    let Json(request) = payload?;
    let room_id = require_field("room_id", &request.room_id)?;
    require_field("password", &request.password)?;

    let backend = state.inner.read().await;
    let room = backend.rooms.get(room_id).ok_or(ServerError::RoomNotFound)?;
    if hash_password(&room.password_salt, &request.password) != room.password_hash {
        warn!(room_id = %room_id, "login rejected");
        return Err(ServerError::InvalidPassword);
    }

    info!(room_id = %room_id, "login accepted");
    Ok(Acknowledged::new(
        Some("Login successful"),
        ClipboardResponse {
            clipboard_text: Some(room.clipboard_text.clone()),
        },
    ))
}

// No credential check here: anyone holding the room id can read the text.
async fn fetch_clipboard_handler(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> ApiResult<ClipboardResponse> {
    let backend = state.inner.read().await;
    let room = backend
        .rooms
        .get(&room_id)
        .ok_or(ServerError::RoomNotFound)?;
    Ok(Acknowledged::new(
        None,
        ClipboardResponse {
            clipboard_text: Some(room.clipboard_text.clone()),
        },
    ))
}

async fn save_clipboard_handler(
    State(state): State<AppState>,
    payload: Result<Json<SaveClipboardRequest>, JsonRejection>,
) -> ApiResult<Empty> {
    let Json(request) = payload?;
    let room_id = require_field("room_id", &request.room_id)?;
    replace_clipboard_text(&state, room_id, request.text).await?;
    Ok(Acknowledged::new(
        Some("Clipboard saved successfully"),
        Empty {},
    ))
}

async fn clear_clipboard_handler(
    State(state): State<AppState>,
    payload: Result<Json<ClearClipboardRequest>, JsonRejection>,
) -> ApiResult<Empty> {
    let Json(request) = payload?;
    let room_id = require_field("room_id", &request.room_id)?;
    replace_clipboard_text(&state, room_id, String::new()).await?;
    Ok(Acknowledged::new(
        Some("Clipboard cleared successfully"),
        Empty {},
    ))
}

async fn replace_clipboard_text(
    state: &AppState,
    room_id: &str,
    text: String,
) -> Result<(), ServerError> {
    let mut backend = state.inner.write().await;
    let room = backend
        .rooms
        .get_mut(room_id)
        .ok_or(ServerError::RoomNotFound)?;
    let len = text.len();
    room.clipboard_text = text;
    drop(backend);

    info!(room_id = %room_id, bytes = len, "clipboard replaced");
    Ok(())
}

fn random_salt() -> String {
    let mut salt = [0_u8; 16];
    rand::rng().fill(&mut salt);
    hex::encode(salt)
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}
