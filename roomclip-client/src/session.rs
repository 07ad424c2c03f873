use std::{collections::HashMap, fmt};

use roomclip_core::{CoreError, RoomId};
use thiserror::Error;

use crate::message_bus::{Message, MessageBus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Welcome,
    Create,
    Join,
    Clipboard,
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Welcome => write!(f, "welcome"),
            View::Create => write!(f, "create"),
            View::Join => write!(f, "join"),
            View::Clipboard => write!(f, "clipboard"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    CreateRoom,
    Login,
    FetchClipboard,
    SaveClipboard,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestKind::CreateRoom => write!(f, "create-room"),
            RequestKind::Login => write!(f, "login"),
            RequestKind::FetchClipboard => write!(f, "fetch-clipboard"),
            RequestKind::SaveClipboard => write!(f, "save-clipboard"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(pub(crate) u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] CoreError),
    #[error("a {0} request is already in flight")]
    RequestInFlight(RequestKind),
    #[error("cannot {action} from the {view} view")]
    InvalidTransition { action: &'static str, view: View },
    #[error("no room is active")]
    NoActiveRoom,
}

/// Client-side state for the one active room context.
///
/// Fields are only written by [`crate::controller::SessionController`]; everything else sees
/// read-only snapshots.
#[derive(Clone, Default)]
pub struct Session {
    pub(crate) view: View,
    pub(crate) room_id: Option<RoomId>,
    pub(crate) password: Option<String>,
    pub(crate) clipboard_text: String,
    pub(crate) in_flight: HashMap<RequestKind, RequestId>,
    pub(crate) messages: MessageBus,
    pub(crate) generation: u64,
}

impl Session {
    pub fn view(&self) -> View {
        self.view
    }

    pub fn room_id(&self) -> Option<&str> {
        self.room_id.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn clipboard_text(&self) -> &str {
        &self.clipboard_text
    }

    /// True while any request issued from the current context is outstanding.
    pub fn loading(&self) -> bool {
        !self.in_flight.is_empty()
    }

    pub fn is_in_flight(&self, kind: RequestKind) -> bool {
        self.in_flight.contains_key(&kind)
    }

    pub fn message(&self) -> Option<&Message> {
        self.messages.current()
    }

    /// Bumped whenever the room context is replaced; replies tagged with an older value are dropped.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("view", &self.view)
            .field("room_id", &self.room_id)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("clipboard_len", &self.clipboard_text.len())
            .field("in_flight", &self.in_flight)
            .field("message", &self.messages.current())
            .field("generation", &self.generation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_starts_on_welcome_with_nothing_set() {
        let session = Session::default();
        assert_eq!(session.view(), View::Welcome);
        assert!(session.room_id().is_none());
        assert!(session.password().is_none());
        assert_eq!(session.clipboard_text(), "");
        assert!(!session.loading());
        assert!(session.message().is_none());
    }

    #[test]
    fn debug_output_redacts_password() {
        let session = Session {
            view: View::Create,
            password: Some("hunter2".to_owned()),
            ..Session::default()
        };
        let rendered = format!("{session:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
