//! Session inter-task communication channels.
//!
//! Uses `embassy-sync` bounded MPMC channels to bridge callers and the
//! transport's callback context with the single session task. Only the
//! session task ever touches session state; everyone else talks to it
//! through these channels.
//!
//! ```text
//! ┌──────────────┐ SessionMsg  ┌───────────────┐
//! │ caller /     │───────────▶│ session task  │
//! │ BLE callbacks│◀───────────│ (actor)       │
//! └──────────────┘ CoolerEvent └───────────────┘
//! ```

use core::time::Duration;
use std::sync::Arc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use futures_lite::future;
use log::warn;

use super::commands::CoolerCommand;
use super::events::CoolerEvent;
use super::ports::EventSink;
use crate::error::Error;
use crate::gatt::TransportEvent;

/// Inbound message for the session task.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionMsg {
    Command(CoolerCommand),
    Transport(TransportEvent),
    /// Tear down and stop the task.
    Shutdown,
}

/// Channel depth for inbound messages.
pub const INBOX_DEPTH: usize = 32;

/// Channel depth for outbound caller events.
pub const OUTBOX_DEPTH: usize = 64;

pub type Inbox = Channel<CriticalSectionRawMutex, SessionMsg, INBOX_DEPTH>;
pub type Outbox = Channel<CriticalSectionRawMutex, CoolerEvent, OUTBOX_DEPTH>;

/// Cloneable handle to a session task's channels.
#[derive(Clone)]
pub struct SessionHandle {
    inbox: Arc<Inbox>,
    outbox: Arc<Outbox>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self {
            inbox: Arc::new(Channel::new()),
            outbox: Arc::new(Channel::new()),
        }
    }

    /// Queue a caller command.
    pub fn send(&self, cmd: CoolerCommand) -> Result<(), Error> {
        self.inbox
            .try_send(SessionMsg::Command(cmd))
            .map_err(|_| Error::QueueFull("session inbox"))
    }

    /// Hand a transport report to the session. Intended for the BLE
    /// stack's callbacks; a full inbox drops the event with a warning.
    pub fn post_transport_event(&self, event: TransportEvent) -> bool {
        if self.inbox.try_send(SessionMsg::Transport(event)).is_err() {
            warn!("session inbox full, dropping transport event");
            return false;
        }
        true
    }

    /// Ask the session task to disconnect and exit.
    pub fn shutdown(&self) -> Result<(), Error> {
        self.inbox
            .try_send(SessionMsg::Shutdown)
            .map_err(|_| Error::QueueFull("session inbox"))
    }

    /// Next caller event, if one is waiting.
    pub fn try_next_event(&self) -> Option<CoolerEvent> {
        self.outbox.try_receive().ok()
    }

    /// Wait for the next caller event.
    pub async fn next_event(&self) -> CoolerEvent {
        self.outbox.receive().await
    }

    /// Block the calling thread until an event arrives or `timeout` passes.
    pub fn next_event_within(&self, timeout: Duration) -> Option<CoolerEvent> {
        future::block_on(future::or(async { Some(self.next_event().await) }, async {
            async_io_mini::Timer::after(timeout).await;
            None
        }))
    }

    pub(crate) fn inbox(&self) -> Arc<Inbox> {
        Arc::clone(&self.inbox)
    }

    /// An [`EventSink`] feeding this handle's outbound channel.
    pub fn event_sink(&self) -> ChannelEventSink {
        ChannelEventSink {
            outbox: Arc::clone(&self.outbox),
        }
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// [`EventSink`] that forwards into the outbound channel.
pub struct ChannelEventSink {
    outbox: Arc<Outbox>,
}

impl EventSink for ChannelEventSink {
    fn emit(&mut self, event: &CoolerEvent) {
        if self.outbox.try_send(event.clone()).is_err() {
            warn!("event channel full, dropping {:?}", event);
        }
    }
}
