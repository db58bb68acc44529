//! Session task: the single serialization point for one cooler session.
//!
//! Runs in a dedicated thread under `futures_lite::future::block_on`, with
//! `async-io-mini` supplying reactor-driven timers (no busy-spinning). Each
//! loop iteration races the inbox against the next tick deadline, except
//! that an overdue tick runs before any queued message:
//!
//! ```text
//!  ┌───────────────────────────────────────────────────────┐
//!  │  session thread                                       │
//!  │   ┌────────────────┐      ┌────────────────────────┐  │
//!  │   │ inbox.receive()│─or──▶│ Timer::after(to_tick)  │  │
//!  │   └───────┬────────┘      └───────────┬────────────┘  │
//!  │           ▼                           ▼               │
//!  │   handle_command /             service.tick()         │
//!  │   handle_transport_event                              │
//!  └───────────────────────────────────────────────────────┘
//! ```
//!
//! The transport is moved into the thread. Its callbacks report back
//! through [`SessionHandle::post_transport_event`], so they never touch
//! session state directly.

use core::time::Duration;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use futures_lite::future;
use log::info;

use super::channels::{ChannelEventSink, Inbox, SessionHandle, SessionMsg};
use super::commands::CoolerCommand;
use super::ports::GattTransport;
use super::service::CoolerService;
use crate::config::SessionConfig;

enum Wake {
    Msg(SessionMsg),
    Tick,
}

/// Spawn the session task on its own thread.
///
/// Callers talk to it through `handle` (and clones of it). The thread exits
/// after a [`SessionMsg::Shutdown`].
pub fn spawn<T>(
    config: SessionConfig,
    transport: T,
    handle: &SessionHandle,
) -> std::io::Result<JoinHandle<()>>
where
    T: GattTransport + Send + 'static,
{
    let inbox = handle.inbox();
    let sink = handle.event_sink();
    thread::Builder::new()
        .name("cooler-session".into())
        .spawn(move || future::block_on(run(config, transport, inbox, sink)))
}

async fn run<T: GattTransport>(
    config: SessionConfig,
    mut transport: T,
    inbox: Arc<Inbox>,
    mut sink: ChannelEventSink,
) {
    let period = Duration::from_millis(u64::from(config.tick_interval_ms));
    let mut service = CoolerService::new(config);
    service.start(&mut transport, &mut sink);

    let mut next_tick = Instant::now() + period;
    loop {
        let until_tick = next_tick.saturating_duration_since(Instant::now());
        // An overdue tick runs before any queued message.
        let wake = if until_tick.is_zero() {
            Wake::Tick
        } else {
            future::or(async { Wake::Msg(inbox.receive().await) }, async {
                async_io_mini::Timer::after(until_tick).await;
                Wake::Tick
            })
            .await
        };

        match wake {
            Wake::Tick => {
                service.tick(&mut transport, &mut sink);
                next_tick += period;
                let now = Instant::now();
                if next_tick < now {
                    // Fell behind: drop the missed ticks.
                    next_tick = now + period;
                }
            }
            Wake::Msg(SessionMsg::Command(cmd)) => {
                service.handle_command(cmd, &mut transport, &mut sink);
            }
            Wake::Msg(SessionMsg::Transport(event)) => {
                service.handle_transport_event(event, &mut transport, &mut sink);
            }
            Wake::Msg(SessionMsg::Shutdown) => {
                service.handle_command(CoolerCommand::Disconnect, &mut transport, &mut sink);
                info!("session task: shutdown");
                return;
            }
        }
    }
}
