//! Integration tests for the connect → discover → bind → ready pipeline.
//!
//! Drive `CoolerService` through whole sessions against the recording
//! mock transport and check both the requests it issues and the events
//! it reports.

use crate::mock_transport::{
    COOLER, Harness, TransportCall, cccd_handle, char_handle, cooler_service_with,
};

use xtrailcooler::app::events::CoolerEvent;
use xtrailcooler::app::service::CoolerService;
use xtrailcooler::config::SessionConfig;
use xtrailcooler::error::{ErrorKind, TransportError};
use xtrailcooler::fsm::StateId;
use xtrailcooler::gatt::codec::{encode_temperature, encode_u16};
use xtrailcooler::gatt::uuids::{ENABLE_NOTIFICATION_VALUE, Role};
use xtrailcooler::gatt::{GattStatus, ScanFailure, TransportEvent};
use xtrailcooler::model::{CoolerParams, StateBits, Telemetry};
use xtrailcooler::CoolerCommand;

fn harness() -> Harness {
    Harness::new(CoolerService::new(SessionConfig::default()))
}

// ── Happy path ───────────────────────────────────────────────

#[test]
fn connect_walks_through_to_ready() {
    let mut h = harness();
    h.connect();

    assert_eq!(h.service.state(), StateId::Ready);
    assert_eq!(
        &h.transport.calls[..5],
        &[
            TransportCall::StartScan("XTrailCooler".into()),
            TransportCall::StopScan,
            TransportCall::Connect(COOLER),
            TransportCall::DiscoverServices,
            TransportCall::EnableNotifications(char_handle(Role::InsideTemp)),
        ]
    );
    assert_eq!(h.events, vec![CoolerEvent::ConnectionStateChanged(true)]);

    // One CCCD write and one read on the air, the rest queued.
    assert_eq!(
        h.transport.descriptor_writes(),
        vec![cccd_handle(Role::InsideTemp)]
    );
    assert_eq!(h.transport.reads(), vec![char_handle(Role::InsideTemp)]);
    assert_eq!(h.service.pending_descriptor_writes(), 3);
    assert_eq!(h.service.pending_reads(), 9);
}

#[test]
fn subscriptions_use_the_enable_value_in_order() {
    let mut h = harness();
    h.connect();
    h.answer_descriptor_writes();

    let writes: Vec<_> = h
        .transport
        .calls
        .iter()
        .filter_map(|c| match c {
            TransportCall::WriteDescriptor(d, v) => Some((*d, v.clone())),
            _ => None,
        })
        .collect();
    let expected: Vec<_> = Role::TELEMETRY
        .iter()
        .map(|r| (cccd_handle(*r), ENABLE_NOTIFICATION_VALUE.to_vec()))
        .collect();
    assert_eq!(writes, expected);
    assert_eq!(h.service.pending_descriptor_writes(), 0);
}

#[test]
fn initial_reads_produce_snapshot_events() {
    let mut h = harness();
    h.connect();
    h.answer_descriptor_writes();
    h.answer_reads();

    let expected_reads: Vec<_> = Role::INITIAL_READS.iter().map(|r| char_handle(*r)).collect();
    assert_eq!(h.transport.reads(), expected_reads);
    assert_eq!(h.service.pending_reads(), 0);

    let telemetry: Vec<_> = h
        .events
        .iter()
        .filter(|e| matches!(e, CoolerEvent::TelemetryUpdated(_)))
        .collect();
    assert_eq!(telemetry.len(), 1, "telemetry only once all fields are known");
    assert_eq!(
        telemetry[0],
        &CoolerEvent::TelemetryUpdated(Telemetry {
            inside_temp_c: 4.5,
            hot_temp_c: 38.0,
            state: StateBits(0x0005),
        })
    );

    let params = h
        .events
        .iter()
        .filter(|e| matches!(e, CoolerEvent::ParametersUpdated(_)))
        .count();
    assert_eq!(params, 5);
    assert_eq!(
        h.service.params(),
        CoolerParams {
            setpoint_c: 4.0,
            hysteresis_c: 1.5,
            hot_cut_c: 65.0,
            hot_resume_c: 55.0,
            fan_run_on_secs: 120,
        }
    );
    assert_eq!(
        h.events.last(),
        Some(&CoolerEvent::DeviceInfo("XTC fw 2.3".into()))
    );
}

#[test]
fn telemetry_waits_for_all_three_fields() {
    let mut h = harness();
    h.connect();
    h.events.clear();

    h.feed(TransportEvent::CharacteristicChanged {
        handle: char_handle(Role::HotTemp),
        value: encode_temperature(41.2).to_vec(),
    });
    h.feed(TransportEvent::CharacteristicChanged {
        handle: char_handle(Role::InsideTemp),
        value: encode_temperature(-2.5).to_vec(),
    });
    assert!(h.events.is_empty());

    h.feed(TransportEvent::CharacteristicChanged {
        handle: char_handle(Role::StateBits),
        value: encode_u16(StateBits::OVERHEAT_ALARM).to_vec(),
    });
    assert_eq!(
        h.events,
        vec![CoolerEvent::TelemetryUpdated(Telemetry {
            inside_temp_c: -2.5,
            hot_temp_c: 41.2,
            state: StateBits(StateBits::OVERHEAT_ALARM),
        })]
    );
}

#[test]
fn undecodable_notification_is_dropped() {
    let mut h = harness();
    h.ready();

    h.feed(TransportEvent::CharacteristicChanged {
        handle: char_handle(Role::InsideTemp),
        value: vec![0x01],
    });
    h.feed(TransportEvent::CharacteristicChanged {
        handle: char_handle(Role::DeviceInfo),
        value: Vec::new(),
    });
    assert!(h.events.is_empty());
}

// ── Discovery failures ───────────────────────────────────────

#[test]
fn missing_cooler_service_disconnects_without_reads() {
    let mut h = harness();
    h.command(CoolerCommand::Connect);
    h.feed(TransportEvent::ScanResult {
        peripheral: COOLER,
        name: Some("XTrailCooler".into()),
    });
    h.feed(TransportEvent::ConnectionStateChanged {
        status: GattStatus::SUCCESS,
        connected: true,
    });
    h.feed(TransportEvent::ServicesDiscovered {
        status: GattStatus::SUCCESS,
        services: Vec::new(),
    });

    assert_eq!(h.service.state(), StateId::Disconnected);
    assert!(h.transport.reads().is_empty());
    assert!(h.transport.descriptor_writes().is_empty());
    assert_eq!(h.transport.count(&TransportCall::Disconnect), 1);
    assert_eq!(h.error_kinds(), vec![ErrorKind::ServiceNotFound]);
    assert_eq!(
        h.events.last(),
        Some(&CoolerEvent::ConnectionStateChanged(false))
    );
}

#[test]
fn discovery_failure_status_is_fatal() {
    let mut h = harness();
    h.command(CoolerCommand::Connect);
    h.feed(TransportEvent::ScanResult {
        peripheral: COOLER,
        name: Some("XTrailCooler".into()),
    });
    h.feed(TransportEvent::ConnectionStateChanged {
        status: GattStatus::SUCCESS,
        connected: true,
    });
    h.feed(TransportEvent::ServicesDiscovered {
        status: GattStatus(0x81),
        services: Vec::new(),
    });
    assert_eq!(h.service.state(), StateId::Disconnected);
    assert_eq!(h.error_kinds(), vec![ErrorKind::DiscoveryFailed]);
}

#[test]
fn absent_roles_are_skipped() {
    let mut h = harness();
    h.connect_with(cooler_service_with(&[
        Role::InsideTemp,
        Role::Setpoint,
        Role::Command,
    ]));
    h.answer_descriptor_writes();
    h.answer_reads();

    assert_eq!(h.service.state(), StateId::Ready);
    assert_eq!(
        h.transport.reads(),
        vec![char_handle(Role::InsideTemp), char_handle(Role::Setpoint)]
    );
    assert_eq!(
        h.transport.descriptor_writes(),
        vec![cccd_handle(Role::InsideTemp)]
    );
    assert!(h.error_kinds().is_empty());
}

// ── Queue behaviour ──────────────────────────────────────────

#[test]
fn rejected_reads_still_drain_the_queue() {
    let mut h = harness();
    h.transport.reject_reads = Some(TransportError::Busy);
    h.connect();

    assert_eq!(h.service.state(), StateId::Ready);
    assert_eq!(h.service.pending_reads(), 0);
    assert_eq!(h.transport.reads().len(), Role::INITIAL_READS.len());
    let failures = h
        .error_kinds()
        .into_iter()
        .filter(|k| *k == ErrorKind::ReadFailed)
        .count();
    assert_eq!(failures, Role::INITIAL_READS.len());
}

#[test]
fn failed_read_reports_and_moves_on() {
    let mut h = harness();
    h.connect();
    h.events.clear();

    h.feed(TransportEvent::CharacteristicRead {
        handle: char_handle(Role::InsideTemp),
        status: GattStatus(0x02),
        value: Vec::new(),
    });
    assert_eq!(h.error_kinds(), vec![ErrorKind::ReadFailed]);
    assert_eq!(
        h.transport.reads(),
        vec![char_handle(Role::InsideTemp), char_handle(Role::HotTemp)]
    );
    assert_eq!(h.service.state(), StateId::Ready);
}

#[test]
fn out_of_order_completion_is_ignored() {
    let mut h = harness();
    h.connect();
    h.events.clear();

    h.feed(TransportEvent::CharacteristicRead {
        handle: char_handle(Role::Setpoint),
        status: GattStatus::SUCCESS,
        value: encode_temperature(9.0).to_vec(),
    });
    assert!(h.events.is_empty());
    assert_eq!(h.service.pending_reads(), 9);
    assert_eq!(h.transport.reads().len(), 1);
}

#[test]
fn descriptor_write_failure_is_not_fatal() {
    let mut h = harness();
    h.connect();
    h.events.clear();

    h.feed(TransportEvent::DescriptorWritten {
        handle: cccd_handle(Role::InsideTemp),
        status: GattStatus(0x03),
    });
    assert_eq!(h.error_kinds(), vec![ErrorKind::DescriptorWriteFailed]);
    assert_eq!(h.service.state(), StateId::Ready);
    assert_eq!(h.transport.descriptor_writes().len(), 2);
}

#[test]
fn rejected_subscription_is_reported() {
    let mut h = harness();
    h.transport.reject_notifications = Some(TransportError::Busy);
    h.connect();

    assert_eq!(h.service.state(), StateId::Ready);
    assert_eq!(
        h.error_kinds(),
        vec![ErrorKind::DescriptorWriteFailed; Role::TELEMETRY.len()]
    );
    let first = h.events.iter().find_map(|e| match e {
        CoolerEvent::Error { message, .. } => Some(message.as_str()),
        _ => None,
    });
    assert_eq!(
        first,
        Some("Notifications for inside-temp (char#0020) rejected: transport busy")
    );
    // The CCCD writes still go out.
    assert_eq!(
        h.transport.descriptor_writes(),
        vec![cccd_handle(Role::InsideTemp)]
    );
}

// ── Teardown ─────────────────────────────────────────────────

#[test]
fn disconnect_discards_pending_operations() {
    let mut h = harness();
    h.connect();
    h.events.clear();

    h.command(CoolerCommand::Disconnect);
    assert_eq!(h.service.state(), StateId::Disconnected);
    assert_eq!(h.service.pending_reads(), 0);
    assert_eq!(h.service.pending_descriptor_writes(), 0);
    assert_eq!(h.events, vec![CoolerEvent::ConnectionStateChanged(false)]);
    assert_eq!(h.transport.count(&TransportCall::Disconnect), 1);

    // A straggling completion after teardown goes nowhere.
    let reads_before = h.transport.reads().len();
    h.feed(TransportEvent::CharacteristicRead {
        handle: char_handle(Role::InsideTemp),
        status: GattStatus::SUCCESS,
        value: encode_temperature(4.0).to_vec(),
    });
    assert_eq!(h.transport.reads().len(), reads_before);
    assert_eq!(h.events.len(), 1);
    assert!(h.service.telemetry().is_none());
}

#[test]
fn link_loss_tears_down_with_error() {
    let mut h = harness();
    h.ready();

    h.feed(TransportEvent::ConnectionStateChanged {
        status: GattStatus(0x08),
        connected: false,
    });
    assert_eq!(h.service.state(), StateId::Disconnected);
    assert_eq!(
        h.events.first().and_then(CoolerEvent::error_kind),
        Some(ErrorKind::ConnectionFailed)
    );
    assert_eq!(
        h.events.last(),
        Some(&CoolerEvent::ConnectionStateChanged(false))
    );
    assert!(h.service.bindings().is_none());
}

#[test]
fn connect_while_ready_restarts_the_scan() {
    let mut h = harness();
    h.ready();

    h.command(CoolerCommand::Connect);
    assert_eq!(h.service.state(), StateId::Connecting);
    assert_eq!(h.events, vec![CoolerEvent::ConnectionStateChanged(false)]);
    assert_eq!(
        h.transport
            .count(&TransportCall::StartScan("XTrailCooler".into())),
        2
    );
    assert_eq!(h.transport.count(&TransportCall::Disconnect), 1);
}

#[test]
fn reconnect_after_disconnect() {
    let mut h = harness();
    h.ready();
    h.command(CoolerCommand::Disconnect);
    h.ready();
    assert_eq!(h.service.state(), StateId::Ready);
    assert!(h.service.telemetry().is_some());
}

// ── Scan failures and timeout ────────────────────────────────

#[test]
fn scan_failure_returns_to_idle() {
    let mut h = harness();
    h.command(CoolerCommand::Connect);
    h.feed(TransportEvent::ScanFailed(ScanFailure::PermissionDenied));
    assert_eq!(h.service.state(), StateId::Idle);
    assert_eq!(h.error_kinds(), vec![ErrorKind::PermissionDenied]);
}

#[test]
fn rejected_scan_reports_unavailable_adapter() {
    let mut h = harness();
    h.transport.reject_scan = Some(TransportError::Unavailable);
    h.command(CoolerCommand::Connect);
    assert_eq!(h.service.state(), StateId::Idle);
    assert_eq!(h.error_kinds(), vec![ErrorKind::TransportUnavailable]);
}

#[test]
fn connect_times_out_into_idle() {
    let config = SessionConfig {
        connect_timeout_secs: 1,
        tick_interval_ms: 250,
        ..SessionConfig::default()
    };
    let mut h = Harness::new(CoolerService::new(config));
    h.command(CoolerCommand::Connect);

    for _ in 0..3 {
        h.tick();
    }
    assert_eq!(h.service.state(), StateId::Connecting);

    h.tick();
    assert_eq!(h.service.state(), StateId::Idle);
    assert_eq!(h.error_kinds(), vec![ErrorKind::DeviceNotFound]);
    assert_eq!(h.transport.calls.last(), Some(&TransportCall::StopScan));
}

#[test]
fn non_matching_devices_are_skipped() {
    let mut h = harness();
    h.command(CoolerCommand::Connect);
    h.feed(TransportEvent::ScanResult {
        peripheral: COOLER,
        name: None,
    });
    h.feed(TransportEvent::ScanResult {
        peripheral: COOLER,
        name: Some("XTrailCooler Pro".into()),
    });
    assert_eq!(h.service.state(), StateId::Connecting);
    assert_eq!(h.transport.calls.len(), 1);
}
