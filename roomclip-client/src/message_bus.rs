//! Single-slot transient notifications.
//!
//! Publishing replaces whatever is visible. Each publish hands back a [`MessageId`]; the expiry
//! scheduled for that id only clears the slot while the same message is still displayed, so an
//! old timer can never wipe a newer message.

use std::{fmt, time::Duration, time::Instant};

pub const MESSAGE_TTL: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Success => write!(f, "success"),
            Severity::Error => write!(f, "error"),
            Severity::Info => write!(f, "info"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub text: String,
    pub severity: Severity,
    pub created_at: Instant,
}

impl Message {
    pub fn expires_at(&self) -> Instant {
        self.created_at + MESSAGE_TTL
    }
}

#[derive(Debug, Clone, Default)]
pub struct MessageBus {
    current: Option<Message>,
    last_id: u64,
}

impl MessageBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `text`, superseding any visible message.
    ///
    /// The caller is responsible for scheduling [`MessageBus::expire`] with the returned id after
    /// [`MESSAGE_TTL`].
    pub fn publish(&mut self, text: impl Into<String>, severity: Severity) -> MessageId {
        self.last_id += 1;
        let id = MessageId(self.last_id);
        self.current = Some(Message {
            id,
            text: text.into(),
            severity,
            created_at: Instant::now(),
        });
        id
    }

    /// Clear the slot if `id` is still the visible message. Returns whether anything was cleared.
    pub fn expire(&mut self, id: MessageId) -> bool {
        if self.current.as_ref().is_some_and(|message| message.id == id) {
            self.current = None;
            true
        } else {
            false
        }
    }

    pub fn dismiss(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<&Message> {
        self.current.as_ref()
    }
}
