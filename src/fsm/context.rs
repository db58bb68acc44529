//! Shared mutable context threaded through every session handler.
//!
//! `SessionContext` is the blackboard state handlers read from and write
//! to: configuration, timing, the peripheral link, resolved bindings, the
//! operation queues and the snapshot aggregates. Handlers also leave their
//! side effects here as an ordered list of transport requests and caller
//! events, which the service drains after every dispatch.

use log::{debug, info, warn};

use crate::aggregate::{Aggregators, Update};
use crate::app::events::CoolerEvent;
use crate::config::SessionConfig;
use crate::error::Error;
use crate::gatt::bindings::CharacteristicBindings;
use crate::gatt::sequencer::OperationSequencer;
use crate::gatt::uuids::Role;
use crate::gatt::{CharHandle, DescHandle, PeripheralId, TransportRequest};

/// The shared context passed to every state handler function.
pub struct SessionContext {
    // -- Timing --
    /// Ticks elapsed since the current state was entered.
    pub ticks_in_state: u64,
    /// Duration of one tick in seconds.
    pub tick_period_secs: f32,

    // -- Configuration --
    pub config: SessionConfig,

    // -- Link --
    /// Peripheral a connect was issued to; `Some` until the link is released.
    pub link: Option<PeripheralId>,
    /// A scan is running on the transport.
    pub scanning: bool,
    /// Tear-down was requested as the first half of a reconnect.
    pub reconnect_pending: bool,

    // -- Per-connection state --
    pub bindings: Option<CharacteristicBindings>,
    pub sequencer: OperationSequencer,
    pub aggregates: Aggregators,

    // -- Side effects --
    /// Transport calls to perform after the dispatch, in order.
    pub outbox: Vec<TransportRequest>,
    /// Caller events to deliver after the dispatch, in order.
    pub events: Vec<CoolerEvent>,
}

impl SessionContext {
    /// Create a new context with the given configuration.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            ticks_in_state: 0,
            tick_period_secs: config.tick_period_secs(),
            config,
            link: None,
            scanning: false,
            reconnect_pending: false,
            bindings: None,
            sequencer: OperationSequencer::new(),
            aggregates: Aggregators::default(),
            outbox: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Seconds elapsed since the current state was entered.
    pub fn secs_in_state(&self) -> f32 {
        self.ticks_in_state as f32 * self.tick_period_secs
    }

    pub fn request(&mut self, request: TransportRequest) {
        self.outbox.push(request);
    }

    pub fn emit(&mut self, event: CoolerEvent) {
        self.events.push(event);
    }

    /// Log and surface an error to the caller.
    pub fn report(&mut self, error: &Error) {
        warn!("session: {} ({})", error, error.kind());
        self.emit(CoolerEvent::from_error(error));
    }

    pub fn role_of(&self, handle: CharHandle) -> Option<Role> {
        self.bindings.as_ref().and_then(|b| b.role_of(handle))
    }

    // -- Queues --

    pub fn enqueue_read(&mut self, handle: CharHandle) {
        match self.sequencer.enqueue_read(handle) {
            Ok(Some(request)) => self.request(request),
            Ok(None) => {}
            Err(_) => self.report(&Error::QueueFull("read")),
        }
    }

    pub fn enqueue_descriptor_write(&mut self, handle: DescHandle) {
        match self.sequencer.enqueue_descriptor_write(handle) {
            Ok(Some(request)) => self.request(request),
            Ok(None) => {}
            Err(_) => self.report(&Error::QueueFull("descriptor write")),
        }
    }

    /// Release the link and any running scan without emitting events.
    pub fn release_link(&mut self) {
        if self.scanning {
            self.scanning = false;
            self.request(TransportRequest::StopScan);
        }
        if let Some(peripheral) = self.link.take() {
            debug!("session: releasing {}", peripheral);
            self.request(TransportRequest::Disconnect);
        }
    }

    /// Forget everything tied to the current connection.
    ///
    /// Pending queue entries are dropped without completing them.
    /// Returns the number dropped.
    pub fn reset_session(&mut self) -> usize {
        let dropped = self.sequencer.clear();
        if dropped > 0 {
            info!("session: dropped {} pending operations", dropped);
        }
        self.bindings = None;
        self.aggregates.reset();
        dropped
    }

    // -- Value routing --

    /// Decode `value` for whichever role owns `handle` and turn it into
    /// caller events.
    pub fn route(&mut self, handle: CharHandle, value: &[u8]) {
        let Some(role) = self.role_of(handle) else {
            debug!("session: value for unbound {}, ignoring", handle);
            return;
        };
        let Some(reading) = role.decode(value) else {
            if role == Role::DeviceInfo && value.is_empty() {
                debug!("session: empty device info, no event");
            } else {
                warn!(
                    "session: undecodable {} payload ({} bytes), skipped",
                    role,
                    value.len()
                );
            }
            return;
        };
        match self.aggregates.apply(reading) {
            Update::Telemetry(t) => self.emit(CoolerEvent::TelemetryUpdated(t)),
            Update::Params(p) => self.emit(CoolerEvent::ParametersUpdated(p)),
            Update::DeviceInfo(text) => self.emit(CoolerEvent::DeviceInfo(text)),
            Update::Pending => {}
        }
    }
}
