use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub const HEALTH_PATH: &str = "/api/health";
pub const CREATE_ROOM_PATH: &str = "/api/rooms/create";
pub const LOGIN_PATH: &str = "/api/rooms/login";
pub const SAVE_CLIPBOARD_PATH: &str = "/api/rooms/clipboard/save";
pub const CLEAR_CLIPBOARD_PATH: &str = "/api/rooms/clipboard/clear";
/// Route pattern for the per-room read endpoint, in the router's `{capture}` syntax.
pub const FETCH_CLIPBOARD_ROUTE: &str = "/api/rooms/{room_id}/clipboard";

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8001";

pub type RoomId = String;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateRoomRequest {
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateRoomResponse {
    pub room_id: RoomId,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    pub room_id: RoomId,
    pub password: String,
}

/// Body of both the login and the fetch responses.
///
/// The text is optional on the wire; callers treat an absent value as an empty buffer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ClipboardResponse {
    #[serde(default)]
    pub clipboard_text: Option<String>,
}

impl ClipboardResponse {
    pub fn into_text(self) -> String {
        self.clipboard_text.unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SaveClipboardRequest {
    pub room_id: RoomId,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClearClipboardRequest {
    pub room_id: RoomId,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub detail: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("{field} must not be empty")]
    BlankField { field: &'static str },
    #[error("base url {0} cannot carry path segments")]
    CannotBeABase(String),
}

/// Backend operations addressable from a base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint<'a> {
    Health,
    CreateRoom,
    Login,
    FetchClipboard { room_id: &'a str },
    SaveClipboard,
    ClearClipboard,
}

impl Endpoint<'_> {
    fn segments(&self) -> Vec<&str> {
        match self {
            Endpoint::Health => vec!["api", "health"],
            Endpoint::CreateRoom => vec!["api", "rooms", "create"],
            Endpoint::Login => vec!["api", "rooms", "login"],
            Endpoint::FetchClipboard { room_id } => vec!["api", "rooms", *room_id, "clipboard"],
            Endpoint::SaveClipboard => vec!["api", "rooms", "clipboard", "save"],
            Endpoint::ClearClipboard => vec!["api", "rooms", "clipboard", "clear"],
        }
    }

    /// Resolve against `base`, keeping any path prefix the base already has.
    ///
    /// Each segment is percent-encoded on its own, so a room id containing `/` or `?` stays a
    /// single segment.
    pub fn url(&self, base: &Url) -> Result<Url, CoreError> {
        let mut url = base.clone();
        url.set_query(None);
        url.set_fragment(None);
        url.path_segments_mut()
            .map_err(|_| CoreError::CannotBeABase(base.to_string()))?
            .pop_if_empty()
            .extend(self.segments());
        Ok(url)
    }
}

/// Trim `value` and reject it when nothing is left.
pub fn require_field<'a>(field: &'static str, value: &'a str) -> Result<&'a str, CoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::BlankField { field });
    }
    Ok(trimmed)
}

/// Pull a human-readable `detail` string out of an error response body.
///
/// Returns `None` for non-JSON bodies, a missing field, a blank string, or a non-string `detail`
/// (validation layers commonly send an array there).
pub fn parse_error_detail(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    let detail = value.get("detail")?.as_str()?.trim();
    if detail.is_empty() {
        None
    } else {
        Some(detail.to_owned())
    }
}
