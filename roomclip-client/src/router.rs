//! Location ↔ view mapping for the path-addressable client.
//!
//! `/`, `/create`, `/join` and `/clipboard/:roomId` are the only locations. Anything else resolves
//! to `/`.

use std::fmt;

use roomclip_core::RoomId;
use tracing::{debug, warn};

use crate::session::{Session, View};

const CLIPBOARD_PREFIX: &str = "/clipboard/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Welcome,
    Create,
    Join,
    Clipboard { room_id: RoomId },
}

impl Route {
    /// Parse a location path. Query strings, fragments and a trailing slash are ignored; the room
    /// id segment is percent-decoded.
    pub fn parse(location: &str) -> Option<Route> {
        let path = location
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim();
        let path = if path.len() > 1 {
            path.trim_end_matches('/')
        } else {
            path
        };

        match path {
            "" | "/" => Some(Route::Welcome),
            "/create" => Some(Route::Create),
            "/join" => Some(Route::Join),
            _ => {
                let encoded = path.strip_prefix(CLIPBOARD_PREFIX)?;
                if encoded.is_empty() || encoded.contains('/') {
                    return None;
                }
                let room_id = urlencoding::decode(encoded).ok()?;
                if room_id.trim().is_empty() {
                    return None;
                }
                Some(Route::Clipboard {
                    room_id: room_id.into_owned(),
                })
            }
        }
    }

    /// Like [`Route::parse`] but falls back to [`Route::Welcome`] for unknown locations.
    pub fn resolve(location: &str) -> Route {
        Route::parse(location).unwrap_or_else(|| {
            warn!(location, "unknown location, falling back to /");
            Route::Welcome
        })
    }

    pub fn view(&self) -> View {
        match self {
            Route::Welcome => View::Welcome,
            Route::Create => View::Create,
            Route::Join => View::Join,
            Route::Clipboard { .. } => View::Clipboard,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Welcome => "/".to_owned(),
            Route::Create => "/create".to_owned(),
            Route::Join => "/join".to_owned(),
            Route::Clipboard { room_id } => {
                format!("{CLIPBOARD_PREFIX}{}", urlencoding::encode(room_id))
            }
        }
    }

    /// The route that represents `session` right now.
    pub fn for_session(session: &Session) -> Route {
        match (session.view(), session.room_id()) {
            (View::Welcome, _) => Route::Welcome,
            (View::Create, _) => Route::Create,
            (View::Join, _) => Route::Join,
            (View::Clipboard, Some(room_id)) => Route::Clipboard {
                room_id: room_id.to_owned(),
            },
            (View::Clipboard, None) => Route::Welcome,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Keeps the visible location in step with session snapshots.
#[derive(Debug, Clone)]
pub struct ViewRouter {
    active: Route,
}

impl ViewRouter {
    pub fn new() -> Self {
        Self {
            active: Route::Welcome,
        }
    }

    pub fn active(&self) -> &Route {
        &self.active
    }

    pub fn location(&self) -> String {
        self.active.path()
    }

    /// Re-derive the active route from `session`. Returns the new route when it changed.
    pub fn sync(&mut self, session: &Session) -> Option<&Route> {
        let next = Route::for_session(session);
        if next == self.active {
            return None;
        }
        debug!(from = %self.active, to = %next, "location changed");
        self.active = next;
        Some(&self.active)
    }
}

impl Default for ViewRouter {
    fn default() -> Self {
        Self::new()
    }
}
