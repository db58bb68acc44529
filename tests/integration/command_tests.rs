//! Integration tests for the characteristic write path.

use crate::mock_transport::{Harness, TransportCall, char_handle, cooler_service_with};

use xtrailcooler::app::commands::{CoolerCommand, ParamsUpdate};
use xtrailcooler::app::events::CoolerEvent;
use xtrailcooler::app::service::CoolerService;
use xtrailcooler::config::SessionConfig;
use xtrailcooler::error::{ErrorKind, TransportError};
use xtrailcooler::gatt::uuids::Role;
use xtrailcooler::gatt::{GattStatus, TransportEvent, WriteType};
use xtrailcooler::model::CommandBits;

fn ready_harness() -> Harness {
    let mut h = Harness::new(CoolerService::new(SessionConfig::default()));
    h.ready();
    h
}

fn error_message(h: &Harness) -> Option<String> {
    h.events.iter().find_map(|e| match e {
        CoolerEvent::Error { message, .. } => Some(message.clone()),
        _ => None,
    })
}

// ── Connection gating ────────────────────────────────────────

#[test]
fn writes_before_ready_are_refused() {
    let mut h = Harness::new(CoolerService::new(SessionConfig::default()));
    h.command(CoolerCommand::SendCommand(CommandBits::CLEAR_ALARMS));
    h.command(CoolerCommand::UpdateSetpoint(5.0));

    assert!(h.transport.writes().is_empty());
    assert_eq!(
        h.error_kinds(),
        vec![ErrorKind::NotConnected, ErrorKind::NotConnected]
    );
    assert_eq!(error_message(&h).as_deref(), Some("Not connected"));
}

#[test]
fn write_to_unbound_role_names_the_role() {
    let mut h = Harness::new(CoolerService::new(SessionConfig::default()));
    h.connect_with(cooler_service_with(&[Role::InsideTemp, Role::Setpoint]));
    h.events.clear();

    h.command(CoolerCommand::SendCommand(CommandBits::FORCE_FANS));
    assert!(h.transport.writes().is_empty());
    assert_eq!(h.error_kinds(), vec![ErrorKind::NotConnected]);
    assert_eq!(
        error_message(&h).as_deref(),
        Some("Not connected (command unavailable)")
    );
}

// ── Encodings ────────────────────────────────────────────────

#[test]
fn command_bits_are_written_as_one_byte() {
    let mut h = ready_harness();
    h.command(CoolerCommand::SendCommand(
        CommandBits::FORCE_PELLET1 | CommandBits::CLEAR_ALARMS,
    ));
    assert_eq!(
        h.transport.calls.last(),
        Some(&TransportCall::Write {
            handle: char_handle(Role::Command),
            value: vec![0x81],
            write_type: WriteType::WithResponse,
        })
    );
    assert!(h.events.is_empty());
}

#[test]
fn temperatures_round_half_away_from_zero() {
    let mut h = ready_harness();
    h.command(CoolerCommand::UpdateSetpoint(4.25));
    h.command(CoolerCommand::UpdateHysteresis(-0.25));
    h.command(CoolerCommand::UpdateHotCut(70.0));
    h.command(CoolerCommand::UpdateHotResume(-3.5));

    assert_eq!(
        h.transport.writes(),
        vec![
            (char_handle(Role::Setpoint), 43i16.to_le_bytes().to_vec()),
            (char_handle(Role::Hysteresis), (-3i16).to_le_bytes().to_vec()),
            (char_handle(Role::HotCut), 700i16.to_le_bytes().to_vec()),
            (char_handle(Role::HotResume), (-35i16).to_le_bytes().to_vec()),
        ]
    );
}

#[test]
fn non_finite_temperature_is_invalid_input() {
    let mut h = ready_harness();
    h.command(CoolerCommand::UpdateSetpoint(f32::NAN));
    h.command(CoolerCommand::UpdateHotCut(f32::INFINITY));
    assert!(h.transport.writes().is_empty());
    assert_eq!(
        h.error_kinds(),
        vec![ErrorKind::InvalidInput, ErrorKind::InvalidInput]
    );
}

#[test]
fn fan_run_on_is_clamped() {
    let mut h = ready_harness();
    h.command(CoolerCommand::UpdateFanRunOn(70_000));
    h.command(CoolerCommand::UpdateFanRunOn(-5));
    h.command(CoolerCommand::UpdateFanRunOn(300));

    let fan = char_handle(Role::FanRunOn);
    assert_eq!(
        h.transport.writes(),
        vec![
            (fan, vec![0xFF, 0xFF]),
            (fan, vec![0x00, 0x00]),
            (fan, vec![0x2C, 0x01]),
        ]
    );
    assert!(h.events.is_empty());
}

#[test]
fn configured_write_type_is_used() {
    let config = SessionConfig {
        write_type: WriteType::WithoutResponse,
        ..SessionConfig::default()
    };
    let mut h = Harness::new(CoolerService::new(config));
    h.ready();
    h.command(CoolerCommand::UpdateFanRunOn(60));
    assert!(matches!(
        h.transport.calls.last(),
        Some(TransportCall::Write {
            write_type: WriteType::WithoutResponse,
            ..
        })
    ));
}

// ── Batched parameters ───────────────────────────────────────

#[test]
fn apply_params_writes_present_fields_in_order() {
    let mut h = ready_harness();
    h.command(CoolerCommand::ApplyParams(ParamsUpdate {
        setpoint_c: Some(3.0),
        hot_resume_c: Some(50.0),
        fan_run_on_secs: Some(90),
        ..ParamsUpdate::default()
    }));

    let roles: Vec<_> = h
        .transport
        .writes()
        .into_iter()
        .map(|(handle, _)| handle)
        .collect();
    assert_eq!(
        roles,
        vec![
            char_handle(Role::Setpoint),
            char_handle(Role::HotResume),
            char_handle(Role::FanRunOn),
        ]
    );
}

#[test]
fn apply_params_skips_an_unbound_role() {
    let present: Vec<Role> = Role::ALL
        .into_iter()
        .filter(|r| *r != Role::Hysteresis)
        .collect();
    let mut h = Harness::new(CoolerService::new(SessionConfig::default()));
    h.connect_with(cooler_service_with(&present));
    h.answer_descriptor_writes();
    h.answer_reads();
    h.events.clear();

    h.command(CoolerCommand::ApplyParams(ParamsUpdate {
        setpoint_c: Some(3.0),
        hysteresis_c: Some(1.0),
        hot_cut_c: Some(60.0),
        fan_run_on_secs: Some(30),
        ..ParamsUpdate::default()
    }));
    assert_eq!(
        h.transport.writes(),
        vec![
            (char_handle(Role::Setpoint), vec![30, 0]),
            (char_handle(Role::HotCut), 600i16.to_le_bytes().to_vec()),
            (char_handle(Role::FanRunOn), vec![30, 0]),
        ]
    );
    assert_eq!(h.error_kinds(), vec![ErrorKind::NotConnected]);
    assert_eq!(
        error_message(&h).as_deref(),
        Some("Not connected (hysteresis unavailable)")
    );
}

#[test]
fn apply_params_reports_each_bad_field() {
    let mut h = ready_harness();
    h.command(CoolerCommand::ApplyParams(ParamsUpdate {
        setpoint_c: Some(5.0),
        hysteresis_c: Some(f32::INFINITY),
        hot_cut_c: Some(f32::NAN),
        fan_run_on_secs: Some(10),
        ..ParamsUpdate::default()
    }));
    assert_eq!(
        h.transport.writes(),
        vec![
            (char_handle(Role::Setpoint), vec![50, 0]),
            (char_handle(Role::FanRunOn), vec![10, 0]),
        ]
    );
    assert_eq!(
        h.error_kinds(),
        vec![ErrorKind::InvalidInput, ErrorKind::InvalidInput]
    );
}

#[test]
fn apply_params_outside_ready_reports_every_field() {
    let mut h = Harness::new(CoolerService::new(SessionConfig::default()));
    h.command(CoolerCommand::ApplyParams(ParamsUpdate {
        setpoint_c: Some(5.0),
        fan_run_on_secs: Some(10),
        ..ParamsUpdate::default()
    }));
    assert!(h.transport.writes().is_empty());
    assert_eq!(
        h.error_kinds(),
        vec![ErrorKind::NotConnected, ErrorKind::NotConnected]
    );
}

#[test]
fn empty_params_batch_is_a_no_op() {
    let mut h = ready_harness();
    h.command(CoolerCommand::ApplyParams(ParamsUpdate::default()));
    assert!(h.transport.writes().is_empty());
    assert!(h.events.is_empty());
}

// ── Wi-Fi provisioning ───────────────────────────────────────

#[test]
fn wifi_credentials_are_length_prefixed() {
    let mut h = ready_harness();
    h.command(CoolerCommand::WriteWifiCredentials {
        ssid: "  camp  ".into(),
        password: "s3cret".into(),
    });
    let mut expected = vec![4];
    expected.extend_from_slice(b"camp");
    expected.push(6);
    expected.extend_from_slice(b"s3cret");
    assert_eq!(
        h.transport.writes(),
        vec![(char_handle(Role::WifiCredentials), expected)]
    );
}

#[test]
fn blank_ssid_is_rejected_even_when_disconnected() {
    let mut h = Harness::new(CoolerService::new(SessionConfig::default()));
    h.command(CoolerCommand::WriteWifiCredentials {
        ssid: "   ".into(),
        password: "pw".into(),
    });
    assert_eq!(h.error_kinds(), vec![ErrorKind::InvalidInput]);
}

#[test]
fn oversized_credentials_are_rejected() {
    let mut h = ready_harness();
    h.command(CoolerCommand::WriteWifiCredentials {
        ssid: "x".repeat(33),
        password: String::new(),
    });
    h.command(CoolerCommand::WriteWifiCredentials {
        ssid: "camp".into(),
        password: "p".repeat(64),
    });
    assert!(h.transport.writes().is_empty());
    assert_eq!(
        h.error_kinds(),
        vec![ErrorKind::PayloadTooLarge, ErrorKind::PayloadTooLarge]
    );
}

#[test]
fn maximum_length_credentials_fit() {
    let mut h = ready_harness();
    h.command(CoolerCommand::WriteWifiCredentials {
        ssid: "s".repeat(32),
        password: "p".repeat(63),
    });
    let writes = h.transport.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].1.len(), 97);
}

// ── Write failures ───────────────────────────────────────────

#[test]
fn failed_write_acknowledgement_is_reported() {
    let mut h = ready_harness();
    h.feed(TransportEvent::CharacteristicWritten {
        handle: char_handle(Role::Setpoint),
        status: GattStatus(0x03),
    });
    assert_eq!(h.error_kinds(), vec![ErrorKind::WriteFailed]);
    assert_eq!(
        error_message(&h).as_deref(),
        Some("Write of setpoint (char#0026) failed: 0x03")
    );
}

#[test]
fn rejected_write_is_reported() {
    let mut h = ready_harness();
    h.transport.reject_writes = Some(TransportError::Busy);
    h.command(CoolerCommand::SendCommand(CommandBits::FORCE_FANS));
    assert_eq!(h.error_kinds(), vec![ErrorKind::WriteFailed]);
    assert_eq!(
        error_message(&h).as_deref(),
        Some("Write of command rejected: transport busy")
    );
}
