//! Function-pointer finite state machine engine for the cooler session.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │  StateTable                                                        │
//! │  ┌─────────────┬──────────────────┬──────────┬───────────────────┐ │
//! │  │ StateId     │ on_enter         │ on_exit  │ on_event          │ │
//! │  ├─────────────┼──────────────────┼──────────┼───────────────────┤ │
//! │  │ Idle        │ fn(ctx)->Option  │ fn(ctx)  │ fn(ctx,in)->Option│ │
//! │  │ Connecting  │ fn(ctx)->Option  │ fn(ctx)  │ fn(ctx,in)->Option│ │
//! │  │ Discovering │ fn(ctx)->Option  │ fn(ctx)  │ fn(ctx,in)->Option│ │
//! │  │ Binding     │ fn(ctx)->Option  │ fn(ctx)  │ fn(ctx,in)->Option│ │
//! │  │ Ready       │ fn(ctx)->Option  │ fn(ctx)  │ fn(ctx,in)->Option│ │
//! │  │ Disconnected│ fn(ctx)->Option  │ fn(ctx)  │ fn(ctx,in)->Option│ │
//! │  └─────────────┴──────────────────┴──────────┴───────────────────┘ │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every input (caller command, transport event, timer tick) is handed to
//! `on_event` of the **current** state. If it returns `Some(next_id)`, the
//! engine runs `on_exit` for the current state, then `on_enter` for the
//! next. `on_enter` may itself return a follow-up state, which is how
//! transient states such as `Binding` chain straight into `Ready`.
//!
//! Handlers never touch the transport. They append [`TransportRequest`]s
//! and caller events to the [`SessionContext`], and the owning service
//! performs and delivers them once the dispatch returns.
//!
//! [`TransportRequest`]: crate::gatt::TransportRequest

pub mod context;
pub mod states;

use context::SessionContext;
use log::{info, warn};

use crate::gatt::TransportEvent;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Enumeration of all session states.
/// Must stay in sync with the state table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    Idle = 0,
    Connecting = 1,
    Discovering = 2,
    Binding = 3,
    Ready = 4,
    Disconnected = 5,
}

impl StateId {
    /// Total number of states. Sizes the table array.
    pub const COUNT: usize = 6;

    /// Convert an index back to `StateId`. Panics on out-of-range in
    /// debug builds; returns `Disconnected` in release.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Idle,
            1 => Self::Connecting,
            2 => Self::Discovering,
            3 => Self::Binding,
            4 => Self::Ready,
            5 => Self::Disconnected,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Disconnected
            }
        }
    }

    /// Whether a physical link is requested or up.
    pub fn has_session(self) -> bool {
        matches!(
            self,
            Self::Connecting | Self::Discovering | Self::Binding | Self::Ready
        )
    }
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Everything the state machine reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionInput {
    /// Caller asked for a (re)connection.
    Connect,
    /// Caller asked to tear the session down.
    Disconnect,
    /// Periodic timer; drives the connection timeout.
    Tick,
    /// Asynchronous report from the transport.
    Transport(TransportEvent),
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter`. Returns `Some(next)` to chain straight into
/// another state.
pub type StateEnterFn = fn(&mut SessionContext) -> Option<StateId>;

/// Signature for `on_exit`.
pub type StateExitFn = fn(&mut SessionContext);

/// Signature for the input handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateEventFn = fn(&mut SessionContext, &SessionInput) -> Option<StateId>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single session state.
pub struct StateDescriptor {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateEnterFn>,
    pub on_exit: Option<StateExitFn>,
    pub on_event: StateEventFn,
}

/// Upper bound on `on_enter` chaining within one dispatch.
const MAX_CHAINED_TRANSITIONS: usize = 8;

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The session state machine engine.
pub struct Fsm {
    /// Fixed-size table indexed by `StateId as usize`.
    table: [StateDescriptor; StateId::COUNT],
    /// Index of the currently active state.
    current: usize,
    /// Monotonic tick counter.
    tick_count: u64,
    /// Tick at which the current state was entered.
    state_entry_tick: u64,
}

impl Fsm {
    /// Construct a new FSM with the given state table, starting in `initial`.
    pub fn new(table: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        Self {
            table,
            current: initial as usize,
            tick_count: 0,
            state_entry_tick: 0,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first `dispatch()`.
    pub fn start(&mut self, ctx: &mut SessionContext) {
        info!("session FSM starting in state: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            if let Some(next) = enter(ctx) {
                self.transition(next, ctx);
            }
        }
    }

    /// Feed one input to the current state.
    ///
    /// `Tick` advances the timing counters before the handler sees it.
    pub fn dispatch(&mut self, input: &SessionInput, ctx: &mut SessionContext) {
        if matches!(input, SessionInput::Tick) {
            self.tick_count += 1;
        }
        ctx.ticks_in_state = self.tick_count - self.state_entry_tick;

        if let Some(next) = (self.table[self.current].on_event)(ctx, input) {
            self.transition(next, ctx);
        }
    }

    /// The current state's identity.
    pub fn current_state(&self) -> StateId {
        StateId::from_index(self.current)
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, first: StateId, ctx: &mut SessionContext) {
        let mut next = Some(first);
        let mut hops = 0;
        while let Some(next_id) = next {
            if hops == MAX_CHAINED_TRANSITIONS {
                warn!(
                    "session FSM: transition chain exceeded {} hops, stopping in {}",
                    MAX_CHAINED_TRANSITIONS, self.table[self.current].name
                );
                return;
            }
            hops += 1;
            next = self.step(next_id, ctx);
        }
    }

    fn step(&mut self, next_id: StateId, ctx: &mut SessionContext) -> Option<StateId> {
        let next_idx = next_id as usize;

        info!(
            "session FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;
        self.state_entry_tick = self.tick_count;
        ctx.ticks_in_state = 0;

        self.table[self.current].on_enter.and_then(|enter| enter(ctx))
    }
}
