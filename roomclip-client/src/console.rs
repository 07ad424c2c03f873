//! Line-oriented front end: turns typed lines into [`Command`]s and renders session snapshots.

use std::fmt::Write as _;

use thiserror::Error;

use crate::{
    controller::Command,
    router::Route,
    session::{Session, View},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Command(Command),
    Help,
    Quit,
    Empty,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown command `{command}` in the {view} view, type `help` for a list")]
    UnknownCommand { command: String, view: View },
    #[error("`{command}` needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },
}

/// Interpret one input line against the view currently shown.
pub fn parse_line(line: &str, session: &Session) -> Result<Input, ParseError> {
    let line = line.trim_start();
    if line.trim().is_empty() {
        return Ok(Input::Empty);
    }
    let (word, rest) = match line.split_once(' ') {
        Some((word, rest)) => (word, rest),
        None => (line.trim_end(), ""),
    };

    match word {
        "help" | "?" => return Ok(Input::Help),
        "quit" | "q" => return Ok(Input::Quit),
        "open" => {
            let location = rest.trim();
            if location.is_empty() {
                return Err(ParseError::MissingArgument {
                    command: "open",
                    argument: "a location such as /join",
                });
            }
            return Ok(Input::Command(Command::Open(location.to_owned())));
        }
        _ => {}
    }

    let command = match (session.view(), word) {
        (View::Welcome | View::Join, "create" | "new") => Command::Navigate(View::Create),
        (View::Welcome | View::Create, "join") => Command::Navigate(View::Join),
        (View::Create | View::Join, "back" | "welcome") => Command::Navigate(View::Welcome),

        (View::Create | View::Join, "password") => Command::SetPassword(rest.to_owned()),
        (View::Create, "create" | "submit") => Command::CreateRoom {
            password: if rest.is_empty() {
                session.password().unwrap_or_default().to_owned()
            } else {
                rest.to_owned()
            },
        },

        (View::Join, "room") => Command::SetRoomId(rest.trim().to_owned()),
        (View::Join, "join" | "submit") => match rest.trim_start().split_once(' ') {
            Some((room_id, password)) => Command::LoginRoom {
                room_id: room_id.to_owned(),
                password: password.to_owned(),
            },
            None if !rest.trim().is_empty() => {
                return Err(ParseError::MissingArgument {
                    command: "join",
                    argument: "a room id and a password",
                });
            }
            None => Command::LoginRoom {
                room_id: session.room_id().unwrap_or_default().to_owned(),
                password: session.password().unwrap_or_default().to_owned(),
            },
        },

        (View::Clipboard, "edit") => Command::EditClipboard(rest.to_owned()),
        (View::Clipboard, "append") => {
            let mut text = session.clipboard_text().to_owned();
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(rest);
            Command::EditClipboard(text)
        }
        (View::Clipboard, "save") => Command::SaveClipboard,
        (View::Clipboard, "clear") => Command::ClearClipboard,
        (View::Clipboard, "copy") => Command::CopyRoomId,
        (View::Clipboard, "exit" | "leave") => Command::ExitRoom,

        (view, other) => {
            return Err(ParseError::UnknownCommand {
                command: other.to_owned(),
                view,
            });
        }
    };
    Ok(Input::Command(command))
}

pub fn help_text(view: View) -> &'static str {
    match view {
        View::Welcome => {
            "create            start a new room\n\
             join              join an existing room\n\
             open <location>   go to /, /create, /join or /clipboard/<room id>\n\
             quit"
        }
        View::Create => {
            "create <password> create the room\n\
             password <value>  set the password without submitting\n\
             join              switch to joining a room\n\
             back              return to the welcome screen"
        }
        View::Join => {
            "join <room id> <password>  log in to a room\n\
             room <id> / password <value>  fill the form, then `join`\n\
             create            switch to creating a room\n\
             back              return to the welcome screen"
        }
        View::Clipboard => {
            "edit <text>       replace the local clipboard text\n\
             append <text>     add a line to the local clipboard text\n\
             save              push the local text to the room\n\
             clear             empty the local text (does not touch the room)\n\
             copy              copy the room id to the system clipboard\n\
             exit              leave the room"
        }
    }
}

/// Render one snapshot as plain text.
pub fn render(session: &Session, route: &Route) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[{route}] {} view", session.view());

    match session.view() {
        View::Welcome => {
            let _ = writeln!(out, "Share text between devices through a password protected room.");
        }
        View::Create => {
            let _ = writeln!(
                out,
                "password: {}",
                if session.password().is_some() { "(set)" } else { "(empty)" }
            );
        }
        View::Join => {
            let _ = writeln!(out, "room id:  {}", session.room_id().unwrap_or("(empty)"));
            let _ = writeln!(
                out,
                "password: {}",
                if session.password().is_some() { "(set)" } else { "(empty)" }
            );
        }
        View::Clipboard => {
            let _ = writeln!(out, "room id: {}", session.room_id().unwrap_or_default());
            let _ = writeln!(out, "share link: {route}");
            let _ = writeln!(out, "----");
            if !session.clipboard_text().is_empty() {
                let _ = writeln!(out, "{}", session.clipboard_text());
            }
            let _ = writeln!(out, "----");
        }
    }

    if session.loading() {
        let _ = writeln!(out, "(working...)");
    }
    if let Some(message) = session.message() {
        let _ = writeln!(out, "[{}] {}", message.severity, message.text);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_in(view: View) -> Session {
        Session {
            view,
            ..Session::default()
        }
    }

    fn command(line: &str, session: &Session) -> Command {
        match parse_line(line, session) {
            Ok(Input::Command(command)) => command,
            other => panic!("expected a command for {line:?}, got {other:?}"),
        }
    }

    #[test]
    fn blank_lines_are_ignored() {
        let session = Session::default();
        assert_eq!(parse_line("   ", &session), Ok(Input::Empty));
        assert_eq!(parse_line("help", &session), Ok(Input::Help));
        assert_eq!(parse_line("quit", &session), Ok(Input::Quit));
    }

    #[test]
    fn create_keeps_password_verbatim() {
        let session = session_in(View::Create);
        assert_eq!(
            command("create  two spaces ", &session),
            Command::CreateRoom {
                password: " two spaces ".to_owned()
            }
        );
    }

    #[test]
    fn bare_create_submits_the_form_password() {
        let mut session = session_in(View::Create);
        session.password = Some("typed".to_owned());
        assert_eq!(
            command("create", &session),
            Command::CreateRoom {
                password: "typed".to_owned()
            }
        );
    }

    #[test]
    fn join_splits_room_and_password() {
        let session = session_in(View::Join);
        assert_eq!(
            command("join abc123 my pass", &session),
            Command::LoginRoom {
                room_id: "abc123".to_owned(),
                password: "my pass".to_owned()
            }
        );
        assert!(matches!(
            parse_line("join abc123", &session),
            Err(ParseError::MissingArgument { .. })
        ));
    }

    #[test]
    fn join_from_welcome_only_navigates() {
        let session = Session::default();
        assert_eq!(command("join", &session), Command::Navigate(View::Join));
    }

    #[test]
    fn append_builds_on_the_local_text() {
        let mut session = session_in(View::Clipboard);
        session.clipboard_text = "line one".to_owned();
        assert_eq!(
            command("append line two", &session),
            Command::EditClipboard("line one\nline two".to_owned())
        );
    }

    #[test]
    fn clipboard_commands_are_scoped_to_their_view() {
        let session = Session::default();
        assert!(matches!(
            parse_line("save", &session),
            Err(ParseError::UnknownCommand { .. })
        ));
        let session = session_in(View::Clipboard);
        assert_eq!(command("save", &session), Command::SaveClipboard);
        assert_eq!(command("exit", &session), Command::ExitRoom);
        assert_eq!(command("open /join", &session), Command::Open("/join".to_owned()));
    }

    #[test]
    fn render_never_shows_the_password() {
        let mut session = session_in(View::Join);
        session.room_id = Some("abc123".to_owned());
        session.password = Some("hunter2".to_owned());
        let text = render(&session, &Route::Join);
        assert!(text.contains("abc123"));
        assert!(text.contains("(set)"));
        assert!(!text.contains("hunter2"));
    }

    #[test]
    fn render_clipboard_shows_text_and_message() {
        let mut session = session_in(View::Clipboard);
        session.room_id = Some("abc123".to_owned());
        session.clipboard_text = "shared".to_owned();
        session
            .messages
            .publish("Login successful!", crate::message_bus::Severity::Success);
        let route = Route::for_session(&session);
        let text = render(&session, &route);
        assert!(text.starts_with("[/clipboard/abc123] clipboard view"));
        assert!(text.contains("shared"));
        assert!(text.contains("[success] Login successful!"));
    }
}
