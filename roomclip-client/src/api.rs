//! Backend calls and their three-way outcome classification.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use roomclip_core::{
    ClipboardResponse, CreateRoomRequest, CreateRoomResponse, Endpoint, LoginRequest, RoomId,
    SaveClipboardRequest, parse_error_detail,
};
use serde::de::{DeserializeOwned, IgnoredAny};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::{config::ClientConfig, session::RequestKind};

/// Result of one backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiOutcome<T> {
    Success(T),
    /// Non-2xx response. Carries the backend's `detail` string when it sent a usable one.
    ApplicationError(Option<String>),
    /// The request never produced a response: refused, reset, DNS, TLS.
    NetworkError(String),
}

impl<T> ApiOutcome<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiOutcome<U> {
        match self {
            ApiOutcome::Success(value) => ApiOutcome::Success(f(value)),
            ApiOutcome::ApplicationError(detail) => ApiOutcome::ApplicationError(detail),
            ApiOutcome::NetworkError(err) => ApiOutcome::NetworkError(err),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ApiOutcome::Success(_))
    }
}

#[async_trait]
pub trait RoomApi: Send + Sync {
    async fn create_room(&self, password: &str) -> ApiOutcome<RoomId>;
    async fn login(&self, room_id: &str, password: &str) -> ApiOutcome<String>;
    async fn fetch_clipboard(&self, room_id: &str) -> ApiOutcome<String>;
    async fn save_clipboard(&self, room_id: &str, text: &str) -> ApiOutcome<()>;
}

/// A call the session wants issued, with everything needed to send it.
#[derive(Clone, PartialEq, Eq)]
pub enum ApiCall {
    CreateRoom { password: String },
    Login { room_id: RoomId, password: String },
    FetchClipboard { room_id: RoomId },
    SaveClipboard { room_id: RoomId, text: String },
}

impl ApiCall {
    pub fn kind(&self) -> RequestKind {
        match self {
            ApiCall::CreateRoom { .. } => RequestKind::CreateRoom,
            ApiCall::Login { .. } => RequestKind::Login,
            ApiCall::FetchClipboard { .. } => RequestKind::FetchClipboard,
            ApiCall::SaveClipboard { .. } => RequestKind::SaveClipboard,
        }
    }
}

impl std::fmt::Debug for ApiCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiCall::CreateRoom { .. } => f.debug_struct("CreateRoom").finish_non_exhaustive(),
            ApiCall::Login { room_id, .. } => f
                .debug_struct("Login")
                .field("room_id", room_id)
                .finish_non_exhaustive(),
            ApiCall::FetchClipboard { room_id } => f
                .debug_struct("FetchClipboard")
                .field("room_id", room_id)
                .finish(),
            ApiCall::SaveClipboard { room_id, text } => f
                .debug_struct("SaveClipboard")
                .field("room_id", room_id)
                .field("text_len", &text.len())
                .finish(),
        }
    }
}

/// Reply to an [`ApiCall`]. Room-scoped replies keep the room id they were issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiResponse {
    CreateRoom(ApiOutcome<RoomId>),
    Login {
        room_id: RoomId,
        outcome: ApiOutcome<String>,
    },
    FetchClipboard {
        room_id: RoomId,
        outcome: ApiOutcome<String>,
    },
    SaveClipboard(ApiOutcome<()>),
}

impl ApiResponse {
    pub fn kind(&self) -> RequestKind {
        match self {
            ApiResponse::CreateRoom(_) => RequestKind::CreateRoom,
            ApiResponse::Login { .. } => RequestKind::Login,
            ApiResponse::FetchClipboard { .. } => RequestKind::FetchClipboard,
            ApiResponse::SaveClipboard(_) => RequestKind::SaveClipboard,
        }
    }
}

pub async fn execute(api: &dyn RoomApi, call: ApiCall) -> ApiResponse {
    match call {
        ApiCall::CreateRoom { password } => ApiResponse::CreateRoom(api.create_room(&password).await),
        ApiCall::Login { room_id, password } => {
            let outcome = api.login(&room_id, &password).await;
            ApiResponse::Login { room_id, outcome }
        }
        ApiCall::FetchClipboard { room_id } => {
            let outcome = api.fetch_clipboard(&room_id).await;
            ApiResponse::FetchClipboard { room_id, outcome }
        }
        ApiCall::SaveClipboard { room_id, text } => {
            ApiResponse::SaveClipboard(api.save_clipboard(&room_id, &text).await)
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiSetupError {
    #[error("backend url {0} cannot be used as a base url")]
    UnusableBaseUrl(String),
    #[error("http client init failed: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// [`RoomApi`] over HTTP+JSON. No timeout and no retries are configured.
#[derive(Debug, Clone)]
pub struct HttpRoomApi {
    client: Client,
    base_url: Url,
}

impl HttpRoomApi {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiSetupError> {
        if config.backend_url.cannot_be_a_base() {
            return Err(ApiSetupError::UnusableBaseUrl(
                config.backend_url.to_string(),
            ));
        }
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: config.backend_url.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, endpoint: Endpoint<'_>) -> Result<Url, String> {
        endpoint.url(&self.base_url).map_err(|err| err.to_string())
    }

    async fn exchange<T: DeserializeOwned>(
        &self,
        kind: RequestKind,
        request: RequestBuilder,
    ) -> ApiOutcome<T> {
        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(%kind, "transport failure: {err}");
                return ApiOutcome::NetworkError(err.to_string());
            }
        };

        let status = response.status();
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(err) => {
                warn!(%kind, %status, "failed reading response body: {err}");
                return ApiOutcome::NetworkError(err.to_string());
            }
        };

        if !status.is_success() {
            let detail = parse_error_detail(&body);
            debug!(%kind, %status, detail = ?detail, "backend rejected request");
            return ApiOutcome::ApplicationError(detail);
        }

        match serde_json::from_slice::<T>(&body) {
            Ok(value) => ApiOutcome::Success(value),
            Err(err) => {
                warn!(%kind, %status, "response does not match contract: {err}");
                ApiOutcome::ApplicationError(None)
            }
        }
    }
}

#[async_trait]
impl RoomApi for HttpRoomApi {
    async fn create_room(&self, password: &str) -> ApiOutcome<RoomId> {
        let url = match self.url(Endpoint::CreateRoom) {
            Ok(url) => url,
            Err(err) => return ApiOutcome::NetworkError(err),
        };
        let body = CreateRoomRequest {
            password: password.to_owned(),
        };
        self.exchange::<CreateRoomResponse>(
            RequestKind::CreateRoom,
            self.client.post(url).json(&body),
        )
        .await
        .map(|created| created.room_id)
    }

    async fn login(&self, room_id: &str, password: &str) -> ApiOutcome<String> {
        let url = match self.url(Endpoint::Login) {
            Ok(url) => url,
            Err(err) => return ApiOutcome::NetworkError(err),
        };
        let body = LoginRequest {
            room_id: room_id.to_owned(),
            password: password.to_owned(),
        };
        self.exchange::<ClipboardResponse>(RequestKind::Login, self.client.post(url).json(&body))
            .await
            .map(ClipboardResponse::into_text)
    }

    async fn fetch_clipboard(&self, room_id: &str) -> ApiOutcome<String> {
        let url = match self.url(Endpoint::FetchClipboard { room_id }) {
            Ok(url) => url,
            Err(err) => return ApiOutcome::NetworkError(err),
        };
        self.exchange::<ClipboardResponse>(RequestKind::FetchClipboard, self.client.get(url))
            .await
            .map(ClipboardResponse::into_text)
    }

    async fn save_clipboard(&self, room_id: &str, text: &str) -> ApiOutcome<()> {
        let url = match self.url(Endpoint::SaveClipboard) {
            Ok(url) => url,
            Err(err) => return ApiOutcome::NetworkError(err),
        };
        let body = SaveClipboardRequest {
            room_id: room_id.to_owned(),
            text: text.to_owned(),
        };
        self.exchange::<IgnoredAny>(
            RequestKind::SaveClipboard,
            self.client.post(url).json(&body),
        )
        .await
        .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_kinds_line_up_with_response_kinds() {
        let room_id = "abc123".to_owned();
        let pairs = [
            (
                ApiCall::CreateRoom {
                    password: "pw".to_owned(),
                },
                ApiResponse::CreateRoom(ApiOutcome::Success(room_id.clone())),
            ),
            (
                ApiCall::Login {
                    room_id: room_id.clone(),
                    password: "pw".to_owned(),
                },
                ApiResponse::Login {
                    room_id: room_id.clone(),
                    outcome: ApiOutcome::Success(String::new()),
                },
            ),
            (
                ApiCall::FetchClipboard {
                    room_id: room_id.clone(),
                },
                ApiResponse::FetchClipboard {
                    room_id: room_id.clone(),
                    outcome: ApiOutcome::ApplicationError(None),
                },
            ),
            (
                ApiCall::SaveClipboard {
                    room_id,
                    text: "t".to_owned(),
                },
                ApiResponse::SaveClipboard(ApiOutcome::NetworkError("refused".to_owned())),
            ),
        ];
        for (call, response) in pairs {
            assert_eq!(call.kind(), response.kind());
        }
    }

    #[test]
    fn call_debug_hides_password_and_text() {
        let login = ApiCall::Login {
            room_id: "abc123".to_owned(),
            password: "hunter2".to_owned(),
        };
        let save = ApiCall::SaveClipboard {
            room_id: "abc123".to_owned(),
            text: "private notes".to_owned(),
        };
        assert!(!format!("{login:?}").contains("hunter2"));
        assert!(!format!("{save:?}").contains("private notes"));
    }

    #[test]
    fn outcome_map_preserves_failures() {
        let failed: ApiOutcome<u8> = ApiOutcome::ApplicationError(Some("nope".to_owned()));
        assert_eq!(
            failed.map(|v| v + 1),
            ApiOutcome::ApplicationError(Some("nope".to_owned()))
        );
        assert_eq!(ApiOutcome::Success(1_u8).map(|v| v + 1), ApiOutcome::Success(2));
    }
}
