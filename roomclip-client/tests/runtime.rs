use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use roomclip_client::{
    api::{ApiOutcome, RoomApi},
    controller::{Command, MSG_COPIED, MSG_COPY_FAILED, MSG_LOGIN_OK, MSG_PASSWORD_REQUIRED},
    host_clipboard::{ClipboardCopyError, HostClipboard},
    message_bus::MESSAGE_TTL,
    runtime::ClientRuntime,
    session::{SessionError, View},
};
use roomclip_core::RoomId;
use tokio::time::Instant;

#[derive(Default)]
struct ScriptedApi {
    calls: Mutex<Vec<&'static str>>,
    reply_after: Duration,
}

impl ScriptedApi {
    fn slow(reply_after: Duration) -> Self {
        Self {
            reply_after,
            ..Self::default()
        }
    }

    async fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
        if !self.reply_after.is_zero() {
            tokio::time::sleep(self.reply_after).await;
        }
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RoomApi for ScriptedApi {
    async fn create_room(&self, _password: &str) -> ApiOutcome<RoomId> {
        self.record("create").await;
        ApiOutcome::Success("room-1".to_owned())
    }

    async fn login(&self, _room_id: &str, password: &str) -> ApiOutcome<String> {
        self.record("login").await;
        if password == "secret" {
            ApiOutcome::Success("hello".to_owned())
        } else {
            ApiOutcome::ApplicationError(Some("Invalid password".to_owned()))
        }
    }

    async fn fetch_clipboard(&self, _room_id: &str) -> ApiOutcome<String> {
        self.record("fetch").await;
        ApiOutcome::Success("fetched".to_owned())
    }

    async fn save_clipboard(&self, _room_id: &str, _text: &str) -> ApiOutcome<()> {
        self.record("save").await;
        ApiOutcome::Success(())
    }
}

#[derive(Clone, Default)]
struct RecordingClipboard {
    copied: Arc<Mutex<Vec<String>>>,
    unavailable: bool,
}

impl HostClipboard for RecordingClipboard {
    fn copy_text(&mut self, text: &str) -> Result<(), ClipboardCopyError> {
        if self.unavailable {
            return Err(ClipboardCopyError::new("no display"));
        }
        self.copied.lock().unwrap().push(text.to_owned());
        Ok(())
    }
}

fn runtime_with(api: Arc<ScriptedApi>) -> ClientRuntime {
    let (runtime, _snapshots) = ClientRuntime::new(api, Box::new(RecordingClipboard::default()));
    runtime
}

async fn settle(runtime: &mut ClientRuntime) {
    while runtime.session().loading() {
        let event = runtime.next_event().await.expect("runtime channel open");
        runtime.handle_event(event);
    }
}

fn message_text(runtime: &ClientRuntime) -> Option<String> {
    runtime.session().message().map(|m| m.text.clone())
}

async fn join_room(runtime: &mut ClientRuntime, room_id: &str) {
    runtime.dispatch(Command::Navigate(View::Join)).unwrap();
    runtime
        .dispatch(Command::LoginRoom {
            room_id: room_id.to_owned(),
            password: "secret".to_owned(),
        })
        .unwrap();
    settle(runtime).await;
    assert_eq!(runtime.session().view(), View::Clipboard);
}

#[tokio::test(start_paused = true)]
async fn create_flow_publishes_snapshots() {
    let api = Arc::new(ScriptedApi::default());
    let (mut runtime, mut snapshots) =
        ClientRuntime::new(api.clone(), Box::new(RecordingClipboard::default()));

    runtime.dispatch(Command::Navigate(View::Create)).unwrap();
    runtime
        .dispatch(Command::CreateRoom {
            password: "secret".to_owned(),
        })
        .unwrap();
    assert!(snapshots.borrow_and_update().loading());

    settle(&mut runtime).await;

    assert!(snapshots.has_changed().unwrap());
    let snapshot = snapshots.borrow_and_update().clone();
    assert_eq!(snapshot.view(), View::Clipboard);
    assert_eq!(snapshot.room_id(), Some("room-1"));
    assert!(!snapshot.loading());
    assert_eq!(api.calls(), vec!["create"]);
}

#[tokio::test(start_paused = true)]
async fn newer_message_survives_older_timer() {
    let mut runtime = runtime_with(Arc::new(ScriptedApi::default()));
    let start = Instant::now();

    runtime.dispatch(Command::Navigate(View::Create)).unwrap();
    let err = runtime
        .dispatch(Command::CreateRoom {
            password: String::new(),
        })
        .unwrap_err();
    assert!(matches!(err, SessionError::Validation(_)));
    let first = runtime.session().message().unwrap().id;

    tokio::time::sleep(Duration::from_millis(100)).await;
    runtime
        .dispatch(Command::CreateRoom {
            password: "   ".to_owned(),
        })
        .unwrap_err();
    let second = runtime.session().message().unwrap().id;
    assert_ne!(first, second);

    let event = runtime.next_event().await.unwrap();
    let elapsed = start.elapsed();
    assert!(elapsed >= MESSAGE_TTL && elapsed < MESSAGE_TTL + Duration::from_millis(100));
    runtime.handle_event(event);
    let visible = runtime.session().message().expect("newer message still visible");
    assert_eq!(visible.id, second);
    assert_eq!(visible.text, MSG_PASSWORD_REQUIRED);

    let event = runtime.next_event().await.unwrap();
    assert!(start.elapsed() >= MESSAGE_TTL + Duration::from_millis(100));
    runtime.handle_event(event);
    assert!(runtime.session().message().is_none());
}

#[tokio::test(start_paused = true)]
async fn reply_for_an_abandoned_view_is_ignored() {
    let api = Arc::new(ScriptedApi::slow(Duration::from_millis(500)));
    let mut runtime = runtime_with(api.clone());

    runtime.dispatch(Command::Navigate(View::Create)).unwrap();
    runtime
        .dispatch(Command::CreateRoom {
            password: "secret".to_owned(),
        })
        .unwrap();
    runtime.dispatch(Command::Navigate(View::Join)).unwrap();
    assert!(!runtime.session().loading());

    let event = runtime.next_event().await.unwrap();
    runtime.handle_event(event);

    assert_eq!(runtime.session().view(), View::Join);
    assert!(runtime.session().room_id().is_none());
    assert!(runtime.session().message().is_none());
    assert_eq!(api.calls(), vec!["create"]);
}

#[tokio::test(start_paused = true)]
async fn second_submit_while_waiting_is_rejected() {
    let api = Arc::new(ScriptedApi::slow(Duration::from_millis(500)));
    let mut runtime = runtime_with(api.clone());

    runtime.dispatch(Command::Navigate(View::Join)).unwrap();
    let login = Command::LoginRoom {
        room_id: "abc123".to_owned(),
        password: "secret".to_owned(),
    };
    runtime.dispatch(login.clone()).unwrap();
    assert!(matches!(
        runtime.dispatch(login),
        Err(SessionError::RequestInFlight(_))
    ));

    settle(&mut runtime).await;
    assert_eq!(api.calls(), vec!["login"]);
    assert_eq!(message_text(&runtime).as_deref(), Some(MSG_LOGIN_OK));
}

#[tokio::test(start_paused = true)]
async fn clear_then_exit_leaves_server_untouched() {
    let api = Arc::new(ScriptedApi::default());
    let mut runtime = runtime_with(api.clone());
    join_room(&mut runtime, "abc123").await;
    assert_eq!(runtime.session().clipboard_text(), "hello");

    runtime.dispatch(Command::ClearClipboard).unwrap();
    runtime.dispatch(Command::ExitRoom).unwrap();

    assert_eq!(runtime.session().view(), View::Welcome);
    assert_eq!(api.calls(), vec!["login"]);
}

#[tokio::test(start_paused = true)]
async fn shared_link_loads_clipboard() {
    let api = Arc::new(ScriptedApi::default());
    let mut runtime = runtime_with(api.clone());

    runtime
        .dispatch(Command::Open("/clipboard/abc123".to_owned()))
        .unwrap();
    assert_eq!(runtime.session().view(), View::Clipboard);
    settle(&mut runtime).await;

    assert_eq!(runtime.session().room_id(), Some("abc123"));
    assert_eq!(runtime.session().clipboard_text(), "fetched");
    assert_eq!(api.calls(), vec!["fetch"]);
}

#[tokio::test(start_paused = true)]
async fn copy_room_id_reports_host_result() {
    let clipboard = RecordingClipboard::default();
    let (mut runtime, _snapshots) = ClientRuntime::new(
        Arc::new(ScriptedApi::default()),
        Box::new(clipboard.clone()),
    );
    join_room(&mut runtime, "abc123").await;

    runtime.dispatch(Command::CopyRoomId).unwrap();
    assert_eq!(*clipboard.copied.lock().unwrap(), vec!["abc123".to_owned()]);
    assert_eq!(message_text(&runtime).as_deref(), Some(MSG_COPIED));

    let broken = RecordingClipboard {
        unavailable: true,
        ..RecordingClipboard::default()
    };
    let (mut runtime, _snapshots) =
        ClientRuntime::new(Arc::new(ScriptedApi::default()), Box::new(broken));
    join_room(&mut runtime, "abc123").await;
    runtime.dispatch(Command::CopyRoomId).unwrap();
    assert_eq!(message_text(&runtime).as_deref(), Some(MSG_COPY_FAILED));
    assert_eq!(runtime.session().view(), View::Clipboard);
}
