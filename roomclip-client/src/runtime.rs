//! Drives a [`SessionController`]: runs its calls and timers on tokio and publishes a session
//! snapshot after every change.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::debug;

use crate::{
    api::{RoomApi, execute},
    controller::{Command, Completion, Effect, SessionController},
    host_clipboard::HostClipboard,
    message_bus::MessageId,
    session::{Session, SessionError},
};

#[derive(Debug)]
pub enum RuntimeEvent {
    Completed(Completion),
    MessageExpired(MessageId),
}

pub struct ClientRuntime {
    controller: SessionController,
    api: Arc<dyn RoomApi>,
    clipboard: Box<dyn HostClipboard>,
    event_tx: mpsc::UnboundedSender<RuntimeEvent>,
    event_rx: mpsc::UnboundedReceiver<RuntimeEvent>,
    snapshot_tx: watch::Sender<Session>,
}

impl ClientRuntime {
    pub fn new(
        api: Arc<dyn RoomApi>,
        clipboard: Box<dyn HostClipboard>,
    ) -> (Self, watch::Receiver<Session>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(Session::default());
        let runtime = Self {
            controller: SessionController::new(),
            api,
            clipboard,
            event_tx,
            event_rx,
            snapshot_tx,
        };
        (runtime, snapshot_rx)
    }

    pub fn session(&self) -> &Session {
        self.controller.session()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.snapshot_tx.subscribe()
    }

    /// Apply a user command. Effects it queued are started even when the command itself was
    /// rejected, since a rejection may still publish a message.
    pub fn dispatch(&mut self, command: Command) -> Result<(), SessionError> {
        debug!(?command, "dispatch");
        let result = self.controller.apply(command);
        self.run_effects();
        self.publish_snapshot();
        result
    }

    /// Wait for the next call completion or message expiry.
    pub async fn next_event(&mut self) -> Option<RuntimeEvent> {
        self.event_rx.recv().await
    }

    pub fn handle_event(&mut self, event: RuntimeEvent) {
        match event {
            RuntimeEvent::Completed(completion) => {
                self.controller.complete(completion);
                self.run_effects();
                self.publish_snapshot();
            }
            RuntimeEvent::MessageExpired(id) => {
                if self.controller.expire_message(id) {
                    self.publish_snapshot();
                }
            }
        }
    }

    fn run_effects(&mut self) {
        loop {
            let effects = self.controller.take_effects();
            if effects.is_empty() {
                break;
            }
            for effect in effects {
                match effect {
                    Effect::Call { ticket, call } => {
                        let api = Arc::clone(&self.api);
                        let event_tx = self.event_tx.clone();
                        tokio::spawn(async move {
                            let response = execute(api.as_ref(), call).await;
                            let completion = Completion { ticket, response };
                            if event_tx.send(RuntimeEvent::Completed(completion)).is_err() {
                                debug!(request = %ticket.id, "runtime gone before reply arrived");
                            }
                        });
                    }
                    Effect::ExpireMessage { id, after } => {
                        let event_tx = self.event_tx.clone();
                        tokio::spawn(async move {
                            tokio::time::sleep(after).await;
                            let _ = event_tx.send(RuntimeEvent::MessageExpired(id));
                        });
                    }
                    Effect::CopyToHost { text } => {
                        let result = self.clipboard.copy_text(&text);
                        self.controller.copy_finished(result);
                    }
                }
            }
        }
    }

    fn publish_snapshot(&self) {
        self.snapshot_tx
            .send_replace(self.controller.session().clone());
    }
}
