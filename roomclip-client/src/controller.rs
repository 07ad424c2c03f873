//! The room session state machine.
//!
//! [`SessionController`] never performs I/O. Every command mutates the [`Session`] in place and
//! queues [`Effect`]s; the runtime drains them, runs the calls and timers, and feeds the results
//! back through [`SessionController::complete`] and [`SessionController::expire_message`].

use std::time::Duration;

use roomclip_core::{CoreError, RoomId, require_field};
use tracing::{debug, info, warn};

use crate::{
    api::{ApiCall, ApiOutcome, ApiResponse},
    host_clipboard::ClipboardCopyError,
    message_bus::{MESSAGE_TTL, MessageId, Severity},
    router::Route,
    session::{RequestId, RequestKind, Session, SessionError, View},
};

pub const MSG_PASSWORD_REQUIRED: &str = "Please enter a password";
pub const MSG_LOGIN_FIELDS_REQUIRED: &str = "Please enter both Room ID and password";
pub const MSG_ROOM_CREATED: &str = "Room created successfully!";
pub const MSG_LOGIN_OK: &str = "Login successful!";
pub const MSG_SAVED: &str = "Clipboard saved successfully!";
pub const MSG_CLEARED: &str = "Clipboard cleared locally.";
pub const MSG_COPIED: &str = "Room ID copied to clipboard!";
pub const MSG_COPY_FAILED: &str = "Failed to copy Room ID.";
pub const MSG_EXITED: &str = "Exited room.";
pub const MSG_NETWORK: &str = "Network error. Please try again.";
pub const FALLBACK_CREATE: &str = "Failed to create room";
pub const FALLBACK_LOGIN: &str = "Login failed";
pub const FALLBACK_FETCH: &str = "Failed to load clipboard";
pub const FALLBACK_SAVE: &str = "Failed to save clipboard";

/// Identifies one issued request and the session context it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub id: RequestId,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub ticket: Ticket,
    pub response: ApiResponse,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Call { ticket: Ticket, call: ApiCall },
    ExpireMessage { id: MessageId, after: Duration },
    CopyToHost { text: String },
}

/// User-originated commands, as produced by a front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Navigate(View),
    Open(String),
    SetPassword(String),
    SetRoomId(String),
    EditClipboard(String),
    CreateRoom { password: String },
    LoginRoom { room_id: String, password: String },
    SaveClipboard,
    ClearClipboard,
    CopyRoomId,
    ExitRoom,
}

#[derive(Debug, Default)]
pub struct SessionController {
    session: Session,
    last_request: u64,
    effects: Vec<Effect>,
}

impl SessionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    pub fn apply(&mut self, command: Command) -> Result<(), SessionError> {
        match command {
            Command::Navigate(view) => self.navigate(view),
            Command::Open(location) => {
                self.open_route(Route::resolve(&location));
                Ok(())
            }
            Command::SetPassword(password) => self.set_password(password),
            Command::SetRoomId(room_id) => self.set_room_id(room_id),
            Command::EditClipboard(text) => self.edit_clipboard(text),
            Command::CreateRoom { password } => self.create_room(&password),
            Command::LoginRoom { room_id, password } => self.login_room(&room_id, &password),
            Command::SaveClipboard => self.save_clipboard(),
            Command::ClearClipboard => self.clear_clipboard(),
            Command::CopyRoomId => self.copy_room_id(),
            Command::ExitRoom => {
                self.exit_room();
                Ok(())
            }
        }
    }

    /// In-app navigation intent. Leaving the clipboard view goes through [`Self::exit_room`].
    pub fn navigate(&mut self, target: View) -> Result<(), SessionError> {
        if self.session.view == View::Clipboard || target == View::Clipboard {
            return Err(SessionError::InvalidTransition {
                action: "navigate",
                view: self.session.view,
            });
        }
        self.enter(target);
        Ok(())
    }

    /// Location-driven navigation (initial path, shared link, history).
    pub fn open_route(&mut self, route: Route) {
        if route == Route::for_session(&self.session) {
            return;
        }
        info!(route = %route, "opening location");
        match route {
            Route::Clipboard { room_id } => {
                self.enter(View::Clipboard);
                self.session.room_id = Some(room_id.clone());
                self.issue(ApiCall::FetchClipboard { room_id });
            }
            other => self.enter(other.view()),
        }
    }

    pub fn set_password(&mut self, password: String) -> Result<(), SessionError> {
        self.require_view(&[View::Create, View::Join], "edit the password")?;
        self.session.password = Some(password).filter(|p| !p.is_empty());
        Ok(())
    }

    pub fn set_room_id(&mut self, room_id: String) -> Result<(), SessionError> {
        self.require_view(&[View::Join], "edit the room id")?;
        self.session.room_id = Some(room_id).filter(|id| !id.is_empty());
        Ok(())
    }

    pub fn edit_clipboard(&mut self, text: String) -> Result<(), SessionError> {
        self.require_view(&[View::Clipboard], "edit the clipboard")?;
        self.session.clipboard_text = text;
        Ok(())
    }

    pub fn create_room(&mut self, password: &str) -> Result<(), SessionError> {
        self.require_view(&[View::Create], "create a room")?;
        self.ensure_idle(RequestKind::CreateRoom)?;
        self.set_password(password.to_owned())?;

        if let Err(err) = require_field("password", password) {
            return Err(self.reject(err, MSG_PASSWORD_REQUIRED));
        }

        self.issue(ApiCall::CreateRoom {
            password: password.to_owned(),
        });
        Ok(())
    }

    pub fn login_room(&mut self, room_id: &str, password: &str) -> Result<(), SessionError> {
        self.require_view(&[View::Join], "join a room")?;
        self.ensure_idle(RequestKind::Login)?;
        self.set_room_id(room_id.to_owned())?;
        self.set_password(password.to_owned())?;

        let trimmed_room_id = match require_field("room_id", room_id)
            .and_then(|id| require_field("password", password).map(|_| id))
        {
            Ok(id) => id.to_owned(),
            Err(err) => return Err(self.reject(err, MSG_LOGIN_FIELDS_REQUIRED)),
        };

        self.issue(ApiCall::Login {
            room_id: trimmed_room_id,
            password: password.to_owned(),
        });
        Ok(())
    }

    /// Push the local buffer to the backend, replacing whatever is stored there.
    pub fn save_clipboard(&mut self) -> Result<(), SessionError> {
        self.require_view(&[View::Clipboard], "save the clipboard")?;
        let room_id = self.active_room()?;
        self.ensure_idle(RequestKind::SaveClipboard)?;

        self.issue(ApiCall::SaveClipboard {
            room_id,
            text: self.session.clipboard_text.clone(),
        });
        Ok(())
    }

    pub fn clear_clipboard(&mut self) -> Result<(), SessionError> {
        self.require_view(&[View::Clipboard], "clear the clipboard")?;
        self.session.clipboard_text.clear();
        self.publish(MSG_CLEARED, Severity::Info);
        Ok(())
    }

    pub fn copy_room_id(&mut self) -> Result<(), SessionError> {
        self.require_view(&[View::Clipboard], "copy the room id")?;
        let text = self.active_room()?;
        self.effects.push(Effect::CopyToHost { text });
        Ok(())
    }

    pub fn copy_finished(&mut self, result: Result<(), ClipboardCopyError>) {
        match result {
            Ok(()) => self.publish(MSG_COPIED, Severity::Success),
            Err(err) => {
                warn!("room id copy failed: {err}");
                self.publish(MSG_COPY_FAILED, Severity::Error);
            }
        }
    }

    /// Drop all room context and go back to the welcome view. Server state is not touched.
    pub fn exit_room(&mut self) {
        if let Some(room_id) = self.session.room_id.as_deref() {
            info!(room_id = %room_id, "leaving room");
        }
        self.enter(View::Welcome);
        self.publish(MSG_EXITED, Severity::Info);
    }

    pub fn expire_message(&mut self, id: MessageId) -> bool {
        self.session.messages.expire(id)
    }

    pub fn complete(&mut self, completion: Completion) {
        let Completion { ticket, response } = completion;
        let kind = response.kind();

        if ticket.generation != self.session.generation {
            debug!(
                %kind,
                request = %ticket.id,
                issued_in = ticket.generation,
                current = self.session.generation,
                "discarding reply from a superseded session"
            );
            return;
        }
        if self.session.in_flight.get(&kind) == Some(&ticket.id) {
            self.session.in_flight.remove(&kind);
        }

        match response {
            ApiResponse::CreateRoom(outcome) => self.on_room_created(outcome),
            ApiResponse::Login { room_id, outcome } => self.on_login(room_id, outcome),
            ApiResponse::FetchClipboard { room_id, outcome } => {
                self.on_clipboard_fetched(room_id, outcome)
            }
            ApiResponse::SaveClipboard(outcome) => self.on_clipboard_saved(outcome),
        }
    }

    fn on_room_created(&mut self, outcome: ApiOutcome<RoomId>) {
        match outcome {
            ApiOutcome::Success(room_id) => {
                info!(room_id = %room_id, "room created");
                self.session.room_id = Some(room_id);
                self.session.password = None;
                self.session.clipboard_text.clear();
                self.session.view = View::Clipboard;
                self.publish(MSG_ROOM_CREATED, Severity::Success);
            }
            failure => self.publish_failure(failure, FALLBACK_CREATE),
        }
    }

    fn on_login(&mut self, room_id: RoomId, outcome: ApiOutcome<String>) {
        match outcome {
            ApiOutcome::Success(text) => {
                info!(room_id = %room_id, "joined room");
                self.session.room_id = Some(room_id);
                self.session.password = None;
                self.session.clipboard_text = text;
                self.session.view = View::Clipboard;
                self.publish(MSG_LOGIN_OK, Severity::Success);
            }
            failure => self.publish_failure(failure, FALLBACK_LOGIN),
        }
    }

    fn on_clipboard_fetched(&mut self, room_id: RoomId, outcome: ApiOutcome<String>) {
        if self.session.room_id.as_deref() != Some(room_id.as_str()) {
            debug!(room_id = %room_id, "discarding clipboard for a room that is no longer open");
            return;
        }
        match outcome {
            ApiOutcome::Success(text) => {
                debug!(room_id = %room_id, bytes = text.len(), "clipboard loaded");
                self.session.clipboard_text = text;
            }
            failure => {
                warn!(room_id = %room_id, "clipboard link could not be opened");
                self.enter(View::Join);
                self.publish_failure(failure, FALLBACK_FETCH);
            }
        }
    }

    fn on_clipboard_saved(&mut self, outcome: ApiOutcome<()>) {
        match outcome {
            ApiOutcome::Success(()) => self.publish(MSG_SAVED, Severity::Success),
            failure => self.publish_failure(failure, FALLBACK_SAVE),
        }
    }

    /// Replace the room context and switch to `view`. In-flight requests from the old context
    /// become stale.
    fn enter(&mut self, view: View) {
        let messages = std::mem::take(&mut self.session.messages);
        let generation = self.session.generation + 1;
        self.session = Session {
            view,
            messages,
            generation,
            ..Session::default()
        };
        self.session.messages.dismiss();
    }

    fn issue(&mut self, call: ApiCall) {
        self.last_request += 1;
        let ticket = Ticket {
            id: RequestId(self.last_request),
            generation: self.session.generation,
        };
        let kind = call.kind();
        debug!(%kind, request = %ticket.id, call = ?call, "issuing request");
        self.session.in_flight.insert(kind, ticket.id);
        self.effects.push(Effect::Call { ticket, call });
    }

    fn publish(&mut self, text: impl Into<String>, severity: Severity) {
        let id = self.session.messages.publish(text, severity);
        self.effects.push(Effect::ExpireMessage {
            id,
            after: MESSAGE_TTL,
        });
    }

    fn publish_failure<T>(&mut self, outcome: ApiOutcome<T>, fallback: &str) {
        let text = match outcome {
            ApiOutcome::ApplicationError(Some(detail)) => detail,
            ApiOutcome::ApplicationError(None) => fallback.to_owned(),
            ApiOutcome::NetworkError(err) => {
                warn!("network failure: {err}");
                MSG_NETWORK.to_owned()
            }
            ApiOutcome::Success(_) => return,
        };
        self.publish(text, Severity::Error);
    }

    fn reject(&mut self, err: CoreError, text: &str) -> SessionError {
        debug!("input rejected: {err}");
        self.publish(text, Severity::Error);
        SessionError::Validation(err)
    }

    fn require_view(&self, views: &[View], action: &'static str) -> Result<(), SessionError> {
        if views.contains(&self.session.view) {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                action,
                view: self.session.view,
            })
        }
    }

    fn ensure_idle(&self, kind: RequestKind) -> Result<(), SessionError> {
        if self.session.is_in_flight(kind) {
            return Err(SessionError::RequestInFlight(kind));
        }
        Ok(())
    }

    fn active_room(&self) -> Result<RoomId, SessionError> {
        self.session
            .room_id
            .clone()
            .ok_or(SessionError::NoActiveRoom)
    }
}
