//! Concrete state handler functions and table builder.
//!
//! ```text
//!  IDLE ──[connect]──▶ CONNECTING ──[link up]──▶ DISCOVERING
//!    ▲                  │      │                     │
//!    └──[timeout/scan failure] │             [cooler service found]
//!                              │                     ▼
//!                        [link failed]            BINDING ──▶ READY
//!                              ▼                               │
//!  DISCONNECTED ◀────[disconnect · link drop · fatal error]────┘
//!       │
//!       └──[connect]──▶ CONNECTING
//! ```
//!
//! Connect while a session is up tears it down through `DISCONNECTED` and
//! re-enters `CONNECTING` within the same dispatch.

use log::{debug, info, warn};

use super::context::SessionContext;
use super::{SessionInput, StateDescriptor, StateId};
use crate::app::events::CoolerEvent;
use crate::error::Error;
use crate::gatt::bindings::CharacteristicBindings;
use crate::gatt::uuids::Role;
use crate::gatt::{CharHandle, DescHandle, GattStatus, TransportEvent, TransportRequest};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once per session engine.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0: Idle
        StateDescriptor {
            id: StateId::Idle,
            name: "Idle",
            on_enter: Some(idle_enter),
            on_exit: None,
            on_event: idle_event,
        },
        // Index 1: Connecting
        StateDescriptor {
            id: StateId::Connecting,
            name: "Connecting",
            on_enter: Some(connecting_enter),
            on_exit: None,
            on_event: connecting_event,
        },
        // Index 2: Discovering
        StateDescriptor {
            id: StateId::Discovering,
            name: "Discovering",
            on_enter: Some(discovering_enter),
            on_exit: None,
            on_event: discovering_event,
        },
        // Index 3: Binding
        StateDescriptor {
            id: StateId::Binding,
            name: "Binding",
            on_enter: Some(binding_enter),
            on_exit: None,
            on_event: binding_event,
        },
        // Index 4: Ready
        StateDescriptor {
            id: StateId::Ready,
            name: "Ready",
            on_enter: Some(ready_enter),
            on_exit: Some(ready_exit),
            on_event: ready_event,
        },
        // Index 5: Disconnected
        StateDescriptor {
            id: StateId::Disconnected,
            name: "Disconnected",
            on_enter: Some(disconnected_enter),
            on_exit: None,
            on_event: disconnected_event,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  Shared reactions
// ═══════════════════════════════════════════════════════════════════════════

fn ignore(state: &str, event: &TransportEvent) -> Option<StateId> {
    debug!("{}: ignoring {:?}", state, event);
    None
}

/// Connect while a session is up: tear down, then scan again.
fn restart(ctx: &mut SessionContext) -> Option<StateId> {
    info!("session: reconnect requested, tearing down current link");
    ctx.reconnect_pending = true;
    Some(StateId::Disconnected)
}

/// Link status report while connected.
fn link_changed(ctx: &mut SessionContext, status: GattStatus, connected: bool) -> Option<StateId> {
    if status.is_success() && connected {
        debug!("session: redundant link-up report");
        return None;
    }
    if status.is_success() {
        info!("session: link closed by peripheral");
    } else {
        ctx.report(&Error::Connection { status });
    }
    Some(StateId::Disconnected)
}

/// Handling common to every state with a live link.
fn session_input(ctx: &mut SessionContext, state: &str, input: &SessionInput) -> Option<StateId> {
    match input {
        SessionInput::Connect => restart(ctx),
        SessionInput::Disconnect => Some(StateId::Disconnected),
        SessionInput::Tick => None,
        SessionInput::Transport(TransportEvent::ConnectionStateChanged { status, connected }) => {
            link_changed(ctx, *status, *connected)
        }
        SessionInput::Transport(other) => ignore(state, other),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE state
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(ctx: &mut SessionContext) -> Option<StateId> {
    ctx.release_link();
    ctx.reset_session();
    ctx.reconnect_pending = false;
    info!("IDLE: no session");
    None
}

fn idle_event(_ctx: &mut SessionContext, input: &SessionInput) -> Option<StateId> {
    match input {
        SessionInput::Connect => Some(StateId::Connecting),
        SessionInput::Disconnect => {
            debug!("IDLE: disconnect without session, nothing to do");
            None
        }
        SessionInput::Tick => None,
        SessionInput::Transport(event) => ignore("IDLE", event),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  CONNECTING state: scanning for the cooler, then bringing the link up
// ═══════════════════════════════════════════════════════════════════════════

fn connecting_enter(ctx: &mut SessionContext) -> Option<StateId> {
    ctx.reset_session();
    ctx.reconnect_pending = false;
    ctx.scanning = true;
    ctx.request(TransportRequest::StartScan);
    info!(
        "CONNECTING: scanning for '{}' ({}s timeout)",
        ctx.config.device_name, ctx.config.connect_timeout_secs
    );
    None
}

fn connecting_event(ctx: &mut SessionContext, input: &SessionInput) -> Option<StateId> {
    let event = match input {
        SessionInput::Connect => {
            debug!("CONNECTING: attempt already running");
            return None;
        }
        SessionInput::Disconnect => return Some(StateId::Disconnected),
        SessionInput::Tick => {
            if ctx.secs_in_state() >= ctx.config.connect_timeout_secs as f32 {
                let device_name = ctx.config.device_name.clone();
                let secs = ctx.config.connect_timeout_secs;
                let error = if ctx.link.is_some() {
                    Error::LinkTimeout { device_name, secs }
                } else {
                    Error::ConnectTimeout { device_name, secs }
                };
                ctx.report(&error);
                return Some(StateId::Idle);
            }
            return None;
        }
        SessionInput::Transport(event) => event,
    };

    match event {
        TransportEvent::ScanResult { peripheral, name } => {
            if ctx.link.is_some() {
                return ignore("CONNECTING", event);
            }
            let matches = name
                .as_deref()
                .is_some_and(|n| n.trim().eq_ignore_ascii_case(&ctx.config.device_name));
            if !matches {
                debug!("CONNECTING: skipping {} ({:?})", peripheral, name);
                return None;
            }
            info!("CONNECTING: found {}, connecting", peripheral);
            ctx.scanning = false;
            ctx.request(TransportRequest::StopScan);
            ctx.request(TransportRequest::Connect(*peripheral));
            ctx.link = Some(*peripheral);
            None
        }
        TransportEvent::ScanFailed(failure) => {
            ctx.scanning = false;
            ctx.report(&Error::Scan(*failure));
            Some(StateId::Idle)
        }
        TransportEvent::ConnectionStateChanged { status, connected } => {
            if ctx.link.is_none() {
                return ignore("CONNECTING", event);
            }
            if status.is_success() && *connected {
                ctx.emit(CoolerEvent::ConnectionStateChanged(true));
                return Some(StateId::Discovering);
            }
            let status = if status.is_success() {
                GattStatus::LOCAL_FAILURE
            } else {
                *status
            };
            ctx.report(&Error::Connection { status });
            Some(StateId::Disconnected)
        }
        other => ignore("CONNECTING", other),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  DISCOVERING state: waiting for the service table
// ═══════════════════════════════════════════════════════════════════════════

fn discovering_enter(ctx: &mut SessionContext) -> Option<StateId> {
    ctx.request(TransportRequest::DiscoverServices);
    info!("DISCOVERING: requesting service discovery");
    None
}

fn discovering_event(ctx: &mut SessionContext, input: &SessionInput) -> Option<StateId> {
    let SessionInput::Transport(TransportEvent::ServicesDiscovered { status, services }) = input
    else {
        return session_input(ctx, "DISCOVERING", input);
    };

    if !status.is_success() {
        ctx.report(&Error::Discovery { status: *status });
        return Some(StateId::Disconnected);
    }
    let Some(bindings) = CharacteristicBindings::from_services(services) else {
        ctx.report(&Error::ServiceNotFound);
        return Some(StateId::Disconnected);
    };
    for role in bindings.missing() {
        warn!("DISCOVERING: {} characteristic absent, skipping", role);
    }
    ctx.bindings = Some(bindings);
    Some(StateId::Binding)
}

// ═══════════════════════════════════════════════════════════════════════════
//  BINDING state: subscribe and queue the initial read burst
// ═══════════════════════════════════════════════════════════════════════════

fn binding_enter(ctx: &mut SessionContext) -> Option<StateId> {
    let Some(bindings) = ctx.bindings.as_ref() else {
        warn!("BINDING: entered without bindings");
        return Some(StateId::Disconnected);
    };

    let subscriptions: Vec<(CharHandle, Option<DescHandle>)> = Role::TELEMETRY
        .iter()
        .filter_map(|r| bindings.handle(*r).map(|h| (h, bindings.cccd(*r))))
        .collect();
    let reads: Vec<CharHandle> = Role::INITIAL_READS
        .iter()
        .filter_map(|r| bindings.handle(*r))
        .collect();

    for (handle, cccd) in &subscriptions {
        ctx.request(TransportRequest::EnableNotifications(*handle));
        match cccd {
            Some(desc) => ctx.enqueue_descriptor_write(*desc),
            None => debug!("BINDING: {} has no CCCD", handle),
        }
    }
    for handle in &reads {
        ctx.enqueue_read(*handle);
    }

    info!(
        "BINDING: {} subscriptions, {} reads queued",
        subscriptions.len(),
        reads.len()
    );
    Some(StateId::Ready)
}

fn binding_event(ctx: &mut SessionContext, input: &SessionInput) -> Option<StateId> {
    session_input(ctx, "BINDING", input)
}

// ═══════════════════════════════════════════════════════════════════════════
//  READY state: routing completions and notifications
// ═══════════════════════════════════════════════════════════════════════════

fn ready_enter(ctx: &mut SessionContext) -> Option<StateId> {
    let bound = ctx.bindings.as_ref().map_or(0, CharacteristicBindings::bound_count);
    info!("READY: {} of {} roles bound", bound, Role::COUNT);
    None
}

fn ready_exit(ctx: &mut SessionContext) {
    info!(
        "READY: leaving with {} reads and {} CCCD writes pending",
        ctx.sequencer.pending_reads(),
        ctx.sequencer.pending_descriptor_writes()
    );
}

fn ready_event(ctx: &mut SessionContext, input: &SessionInput) -> Option<StateId> {
    let SessionInput::Transport(event) = input else {
        return session_input(ctx, "READY", input);
    };

    match event {
        TransportEvent::CharacteristicRead {
            handle,
            status,
            value,
        } => {
            match ctx.sequencer.on_read_completed(*handle) {
                Ok(next) => next.into_iter().for_each(|r| ctx.request(r)),
                Err(_) => {
                    warn!("READY: read completion for {} is not head, ignoring", handle);
                    return None;
                }
            }
            if status.is_success() {
                ctx.route(*handle, value);
            } else {
                let role = ctx.role_of(*handle);
                ctx.report(&Error::Read {
                    role,
                    handle: *handle,
                    status: *status,
                });
            }
            None
        }
        TransportEvent::DescriptorWritten { handle, status } => {
            match ctx.sequencer.on_descriptor_write_completed(*handle) {
                Ok(next) => next.into_iter().for_each(|r| ctx.request(r)),
                Err(_) => {
                    warn!("READY: CCCD completion for {} is not head, ignoring", handle);
                    return None;
                }
            }
            if !status.is_success() {
                ctx.report(&Error::DescriptorWrite {
                    handle: *handle,
                    status: *status,
                });
            }
            None
        }
        TransportEvent::CharacteristicChanged { handle, value } => {
            ctx.route(*handle, value);
            None
        }
        TransportEvent::CharacteristicWritten { handle, status } => {
            if status.is_success() {
                debug!("READY: write to {} acknowledged", handle);
            } else {
                let role = ctx.role_of(*handle);
                ctx.report(&Error::Write {
                    role,
                    handle: *handle,
                    status: *status,
                });
            }
            None
        }
        _ => session_input(ctx, "READY", input),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  DISCONNECTED state: session torn down
// ═══════════════════════════════════════════════════════════════════════════

fn disconnected_enter(ctx: &mut SessionContext) -> Option<StateId> {
    ctx.release_link();
    let dropped = ctx.reset_session();
    ctx.emit(CoolerEvent::ConnectionStateChanged(false));
    info!("DISCONNECTED: session closed ({} operations discarded)", dropped);

    if ctx.reconnect_pending {
        return Some(StateId::Connecting);
    }
    None
}

fn disconnected_event(_ctx: &mut SessionContext, input: &SessionInput) -> Option<StateId> {
    match input {
        SessionInput::Connect => Some(StateId::Connecting),
        SessionInput::Disconnect | SessionInput::Tick => None,
        SessionInput::Transport(event) => ignore("DISCONNECTED", event),
    }
}
