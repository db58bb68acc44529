//! Cooler service: the hexagonal core.
//!
//! [`CoolerService`] is the single owner of one session: the FSM, its
//! context (bindings, queues, aggregates) and the configuration. Every
//! mutation goes through one of three entry points, each of which takes
//! the ports at the call site:
//!
//! ```text
//!  CoolerCommand ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!  TransportEvent ─▶ │       CoolerService      │
//!  tick ──────────▶  │  FSM · sequencer · codec │ ──▶ GattTransport
//!                    └──────────────────────────┘
//! ```
//!
//! After each dispatch the service delivers the caller events the
//! handlers produced and then performs their transport requests in order.
//! A request the transport rejects synchronously is answered with a
//! synthesized failed completion, so the queues keep moving.
//!
//! Characteristic writes bypass the FSM: they are encoded and issued
//! directly against the bound handle, and only in `Ready`.

use log::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::{Error, Result, TransportError};
use crate::fsm::context::SessionContext;
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, SessionInput, StateId};
use crate::gatt::bindings::CharacteristicBindings;
use crate::gatt::codec::{encode_command, encode_temperature, encode_u16, encode_wifi_credentials};
use crate::gatt::uuids::Role;
use crate::gatt::{CharHandle, GattStatus, TransportEvent, TransportRequest};
use crate::model::{CoolerParams, Telemetry};

use super::commands::{CoolerCommand, ParamsUpdate};
use super::events::CoolerEvent;
use super::ports::{EventSink, GattTransport};

// ───────────────────────────────────────────────────────────────
// CoolerService
// ───────────────────────────────────────────────────────────────

/// Owns and drives one cooler session.
pub struct CoolerService {
    fsm: Fsm,
    ctx: SessionContext,
}

impl CoolerService {
    /// Construct the service from configuration.
    ///
    /// Does **not** start the FSM: call [`start`](Self::start) next.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            fsm: Fsm::new(build_state_table(), StateId::Idle),
            ctx: SessionContext::new(config),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, transport: &mut impl GattTransport, sink: &mut impl EventSink) {
        self.fsm.start(&mut self.ctx);
        self.flush(transport, sink);
        info!("CoolerService started in {:?}", self.fsm.current_state());
    }

    // ── Entry points ──────────────────────────────────────────

    /// Process a caller command.
    pub fn handle_command(
        &mut self,
        cmd: CoolerCommand,
        transport: &mut impl GattTransport,
        sink: &mut impl EventSink,
    ) {
        let result = match cmd {
            CoolerCommand::Connect => {
                self.dispatch(&SessionInput::Connect, transport, sink);
                Ok(())
            }
            CoolerCommand::Disconnect => {
                self.dispatch(&SessionInput::Disconnect, transport, sink);
                Ok(())
            }
            CoolerCommand::SendCommand(bits) => {
                self.write_role(Role::Command, &encode_command(bits), transport)
            }
            CoolerCommand::UpdateSetpoint(c) => self.write_temperature(Role::Setpoint, c, transport),
            CoolerCommand::UpdateHysteresis(c) => {
                self.write_temperature(Role::Hysteresis, c, transport)
            }
            CoolerCommand::UpdateHotCut(c) => self.write_temperature(Role::HotCut, c, transport),
            CoolerCommand::UpdateHotResume(c) => {
                self.write_temperature(Role::HotResume, c, transport)
            }
            CoolerCommand::UpdateFanRunOn(secs) => self.write_fan_run_on(secs, transport),
            CoolerCommand::ApplyParams(update) => {
                self.apply_params(update, transport, sink);
                Ok(())
            }
            CoolerCommand::WriteWifiCredentials { ssid, password } => {
                self.write_wifi_credentials(&ssid, &password, transport)
            }
        };

        report_rejected(result, sink);
    }

    /// Process an asynchronous report from the transport.
    pub fn handle_transport_event(
        &mut self,
        event: TransportEvent,
        transport: &mut impl GattTransport,
        sink: &mut impl EventSink,
    ) {
        self.dispatch(&SessionInput::Transport(event), transport, sink);
    }

    /// Advance session time by one tick.
    pub fn tick(&mut self, transport: &mut impl GattTransport, sink: &mut impl EventSink) {
        self.dispatch(&SessionInput::Tick, transport, sink);
    }

    // ── Queries ───────────────────────────────────────────────

    /// Current FSM state.
    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn is_ready(&self) -> bool {
        self.state() == StateId::Ready
    }

    pub fn config(&self) -> &SessionConfig {
        &self.ctx.config
    }

    /// Latest complete telemetry, if all fields have been seen.
    pub fn telemetry(&self) -> Option<Telemetry> {
        self.ctx.aggregates.telemetry.snapshot()
    }

    pub fn params(&self) -> CoolerParams {
        self.ctx.aggregates.params.current()
    }

    pub fn bindings(&self) -> Option<&CharacteristicBindings> {
        self.ctx.bindings.as_ref()
    }

    pub fn pending_reads(&self) -> usize {
        self.ctx.sequencer.pending_reads()
    }

    pub fn pending_descriptor_writes(&self) -> usize {
        self.ctx.sequencer.pending_descriptor_writes()
    }

    // ── Internal: FSM plumbing ────────────────────────────────

    fn dispatch(
        &mut self,
        input: &SessionInput,
        transport: &mut impl GattTransport,
        sink: &mut impl EventSink,
    ) {
        self.fsm.dispatch(input, &mut self.ctx);
        self.flush(transport, sink);
    }

    /// Deliver pending events, then perform pending requests, until the
    /// context has nothing left.
    fn flush(&mut self, transport: &mut impl GattTransport, sink: &mut impl EventSink) {
        loop {
            for event in self.ctx.events.drain(..) {
                sink.emit(&event);
            }
            if self.ctx.outbox.is_empty() {
                return;
            }

            let batch = std::mem::take(&mut self.ctx.outbox);
            let mut batch = batch.into_iter();
            while let Some(request) = batch.next() {
                let Err(e) = self.perform(&request, transport) else {
                    continue;
                };
                warn!("transport rejected {:?}: {}", request, e);
                if let TransportRequest::EnableNotifications(handle) = &request {
                    let error = Error::SubscribeRejected {
                        role: self.ctx.role_of(*handle),
                        handle: *handle,
                        cause: e,
                    };
                    self.ctx.report(&error);
                    continue;
                }
                let Some(feedback) = rejection_feedback(&request, e) else {
                    continue;
                };
                let before = self.fsm.current_state();
                self.fsm
                    .dispatch(&SessionInput::Transport(feedback), &mut self.ctx);
                if self.fsm.current_state() != before {
                    let stale = batch.len();
                    if stale > 0 {
                        debug!("discarding {} requests made stale by the transition", stale);
                    }
                    break;
                }
            }
        }
    }

    fn perform(
        &self,
        request: &TransportRequest,
        transport: &mut impl GattTransport,
    ) -> core::result::Result<(), TransportError> {
        match request {
            TransportRequest::StartScan => transport.start_scan(&self.ctx.config.device_name),
            TransportRequest::StopScan => transport.stop_scan(),
            TransportRequest::Connect(peripheral) => transport.connect(*peripheral),
            TransportRequest::Disconnect => transport.disconnect(),
            TransportRequest::DiscoverServices => transport.discover_services(),
            TransportRequest::EnableNotifications(handle) => transport.enable_notifications(*handle),
            TransportRequest::Read(handle) => transport.read_characteristic(*handle),
            TransportRequest::WriteDescriptor(handle, value) => {
                transport.write_descriptor(*handle, value)
            }
        }
    }

    // ── Internal: write path ──────────────────────────────────

    /// The handle a write to `role` may go to right now.
    fn writable_handle(&self, role: Role) -> Result<CharHandle> {
        if !self.is_ready() {
            return Err(Error::NotConnected { role: None });
        }
        self.ctx
            .bindings
            .as_ref()
            .and_then(|b| b.handle(role))
            .ok_or(Error::NotConnected { role: Some(role) })
    }

    fn write_role(
        &mut self,
        role: Role,
        value: &[u8],
        transport: &mut impl GattTransport,
    ) -> Result<()> {
        let handle = self.writable_handle(role)?;
        self.write_handle(role, handle, value, transport)
    }

    fn write_handle(
        &mut self,
        role: Role,
        handle: CharHandle,
        value: &[u8],
        transport: &mut impl GattTransport,
    ) -> Result<()> {
        info!("write {} ({}, {} bytes)", role, handle, value.len());
        transport
            .write_characteristic(handle, value, self.ctx.config.write_type)
            .map_err(|cause| Error::WriteRejected { role, cause })
    }

    fn write_temperature(
        &mut self,
        role: Role,
        celsius: f32,
        transport: &mut impl GattTransport,
    ) -> Result<()> {
        if !celsius.is_finite() {
            return Err(Error::InvalidInput("temperature must be a finite number"));
        }
        self.write_role(role, &encode_temperature(celsius), transport)
    }

    fn write_fan_run_on(&mut self, secs: i32, transport: &mut impl GattTransport) -> Result<()> {
        let clamped = secs.clamp(0, i32::from(u16::MAX)) as u16;
        if i32::from(clamped) != secs {
            debug!("fan run-on {}s clamped to {}s", secs, clamped);
        }
        self.write_role(Role::FanRunOn, &encode_u16(clamped), transport)
    }

    /// Each present field is written on its own; a failed field is
    /// reported and the rest of the batch still goes out.
    fn apply_params(
        &mut self,
        update: ParamsUpdate,
        transport: &mut impl GattTransport,
        sink: &mut impl EventSink,
    ) {
        if update.is_empty() {
            debug!("empty parameter batch");
            return;
        }
        let temperatures = [
            (Role::Setpoint, update.setpoint_c),
            (Role::Hysteresis, update.hysteresis_c),
            (Role::HotCut, update.hot_cut_c),
            (Role::HotResume, update.hot_resume_c),
        ];
        for (role, value) in temperatures {
            if let Some(celsius) = value {
                let result = self.write_temperature(role, celsius, transport);
                report_rejected(result, sink);
            }
        }
        if let Some(secs) = update.fan_run_on_secs {
            let result = self.write_fan_run_on(secs, transport);
            report_rejected(result, sink);
        }
    }

    fn write_wifi_credentials(
        &mut self,
        ssid: &str,
        password: &str,
        transport: &mut impl GattTransport,
    ) -> Result<()> {
        let ssid = ssid.trim();
        if ssid.is_empty() {
            return Err(Error::InvalidInput("SSID must not be empty"));
        }
        let handle = self.writable_handle(Role::WifiCredentials)?;
        let payload = encode_wifi_credentials(ssid.as_bytes(), password.as_bytes())?;
        self.write_handle(Role::WifiCredentials, handle, &payload, transport)
    }
}

fn report_rejected(result: Result<()>, sink: &mut impl EventSink) {
    if let Err(e) = result {
        warn!("command rejected: {} ({})", e, e.kind());
        sink.emit(&CoolerEvent::from_error(&e));
    }
}

/// The completion a rejected request would otherwise never receive.
fn rejection_feedback(request: &TransportRequest, error: TransportError) -> Option<TransportEvent> {
    let status = GattStatus::LOCAL_FAILURE;
    match request {
        TransportRequest::StartScan => Some(TransportEvent::ScanFailed(error.into())),
        TransportRequest::Connect(_) => Some(TransportEvent::ConnectionStateChanged {
            status,
            connected: false,
        }),
        TransportRequest::DiscoverServices => Some(TransportEvent::ServicesDiscovered {
            status,
            services: Vec::new(),
        }),
        TransportRequest::Read(handle) => Some(TransportEvent::CharacteristicRead {
            handle: *handle,
            status,
            value: Vec::new(),
        }),
        TransportRequest::WriteDescriptor(handle, _) => Some(TransportEvent::DescriptorWritten {
            handle: *handle,
            status,
        }),
        TransportRequest::StopScan
        | TransportRequest::Disconnect
        | TransportRequest::EnableNotifications(_) => None,
    }
}
