//! Simulated XTrailCooler peripheral.
//!
//! A [`GattTransport`] that answers every request the way the cooler's
//! firmware would, without a radio. It is what the demo binary and the
//! end-to-end tests drive the session task against.
//!
//! ## Attribute layout
//!
//! | Role       | Characteristic handle | CCCD handle          |
//! |------------|-----------------------|----------------------|
//! | role *i*   | `0x0010 + 2·i`        | `0x0011 + 2·i`       |
//!
//! Only the three telemetry roles expose a CCCD.
//!
//! Completions are posted back through a [`SessionHandle`], exactly like
//! a platform stack callback would. Calls made from the session thread
//! therefore never re-enter the service.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info, warn};

use crate::app::channels::SessionHandle;
use crate::app::ports::GattTransport;
use crate::error::TransportError;
use crate::gatt::codec::{encode_temperature, encode_u16};
use crate::gatt::uuids::{
    CLIENT_CONFIG_DESCRIPTOR, ENABLE_NOTIFICATION_VALUE, Role, SERVICE_COOLER,
};
use crate::gatt::{
    CharHandle, DescHandle, DiscoveredCharacteristic, DiscoveredDescriptor, DiscoveredService,
    GattStatus, PeripheralId, TransportEvent, WriteType,
};
use crate::model::{CommandBits, StateBits, Telemetry};

/// Peripheral id the simulated cooler advertises under.
pub const SIM_PERIPHERAL: PeripheralId = PeripheralId(0xC001);

/// A neighbouring device the scan also reports.
const BYSTANDER: PeripheralId = PeripheralId(0xBEEF);

const FIRST_CHAR_HANDLE: u16 = 0x0010;

const DEVICE_INFO: &str = "XTrailCooler sim fw 1.0";

const ALARM_MASK: u16 = StateBits::SENSOR_ALARM | StateBits::OVERHEAT_ALARM | StateBits::SUPPLY_ALARM;

/// Characteristic handle assigned to `role`.
pub fn char_handle(role: Role) -> CharHandle {
    CharHandle(FIRST_CHAR_HANDLE + 2 * role.index() as u16)
}

/// CCCD handle assigned to `role`.
pub fn cccd_handle(role: Role) -> DescHandle {
    DescHandle(FIRST_CHAR_HANDLE + 2 * role.index() as u16 + 1)
}

fn role_at(handle: u16) -> Option<Role> {
    let offset = handle.checked_sub(FIRST_CHAR_HANDLE)?;
    Role::ALL.get(usize::from(offset / 2)).copied()
}

// ───────────────────────────────────────────────────────────────
// Peripheral state
// ───────────────────────────────────────────────────────────────

#[derive(Debug)]
struct SimState {
    advertised_name: String,
    expose_service: bool,
    connected: bool,
    values: [Vec<u8>; Role::COUNT],
    notifying: [bool; Role::COUNT],
    last_command: Option<CommandBits>,
    provisioned_ssid: Option<String>,
}

impl SimState {
    fn new(advertised_name: String) -> Self {
        let mut values: [Vec<u8>; Role::COUNT] = Default::default();
        let mut set = |role: Role, bytes: &[u8]| values[role.index()] = bytes.to_vec();
        set(Role::InsideTemp, &encode_temperature(4.5));
        set(Role::HotTemp, &encode_temperature(38.0));
        set(
            Role::StateBits,
            &encode_u16(StateBits::PELLET1_ACTIVE | StateBits::HOT_FAN_ACTIVE),
        );
        set(Role::Setpoint, &encode_temperature(4.0));
        set(Role::Hysteresis, &encode_temperature(1.5));
        set(Role::HotCut, &encode_temperature(65.0));
        set(Role::HotResume, &encode_temperature(55.0));
        set(Role::FanRunOn, &encode_u16(120));
        set(Role::DeviceInfo, DEVICE_INFO.as_bytes());

        Self {
            advertised_name,
            expose_service: true,
            connected: false,
            values,
            notifying: [false; Role::COUNT],
            last_command: None,
            provisioned_ssid: None,
        }
    }

    fn state_bits(&self) -> u16 {
        let raw = &self.values[Role::StateBits.index()];
        match raw.as_slice() {
            [lo, hi, ..] => u16::from_le_bytes([*lo, *hi]),
            _ => 0,
        }
    }

    fn set_state_bits(&mut self, bits: u16) {
        self.values[Role::StateBits.index()] = encode_u16(bits).to_vec();
    }

    /// Apply a command bitmask the way the firmware does.
    fn apply_command(&mut self, bits: CommandBits) {
        let mut state = self.state_bits();
        if bits.contains(CommandBits::CLEAR_ALARMS) {
            state &= !ALARM_MASK;
        }
        if bits.contains(CommandBits::FORCE_PELLET1) {
            state |= StateBits::PELLET1_ACTIVE;
        }
        if bits.contains(CommandBits::FORCE_PELLET2) {
            state |= StateBits::PELLET2_ACTIVE;
        }
        if bits.contains(CommandBits::FORCE_FANS) {
            state |= StateBits::HOT_FAN_ACTIVE;
        }
        self.set_state_bits(state);
        self.last_command = Some(bits);
    }

    fn services(&self) -> Vec<DiscoveredService> {
        let generic_access = DiscoveredService {
            uuid: 0x00001800_0000_1000_8000_00805f9b34fb,
            characteristics: Vec::new(),
        };
        if !self.expose_service {
            return vec![generic_access];
        }
        let characteristics = Role::ALL
            .iter()
            .map(|&role| DiscoveredCharacteristic {
                uuid: role.uuid(),
                handle: char_handle(role),
                descriptors: Role::TELEMETRY
                    .contains(&role)
                    .then(|| DiscoveredDescriptor {
                        uuid: CLIENT_CONFIG_DESCRIPTOR,
                        handle: cccd_handle(role),
                    })
                    .into_iter()
                    .collect(),
            })
            .collect();
        vec![
            generic_access,
            DiscoveredService {
                uuid: SERVICE_COOLER,
                characteristics,
            },
        ]
    }
}

// ───────────────────────────────────────────────────────────────
// SimulatedCooler
// ───────────────────────────────────────────────────────────────

/// Cloneable simulated cooler. Clones share one peripheral, so a caller
/// can keep a clone to push telemetry while the session owns another.
#[derive(Clone)]
pub struct SimulatedCooler {
    state: Arc<Mutex<SimState>>,
    session: SessionHandle,
}

impl SimulatedCooler {
    /// A cooler advertising as `name` that reports into `session`.
    pub fn new(name: impl Into<String>, session: &SessionHandle) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState::new(name.into()))),
            session: session.clone(),
        }
    }

    /// Hide the cooler service from discovery, as a foreign device would.
    pub fn without_cooler_service(self) -> Self {
        self.lock().expose_service = false;
        self
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn post(&self, event: TransportEvent) {
        self.session.post_transport_event(event);
    }

    pub fn is_connected(&self) -> bool {
        self.lock().connected
    }

    /// Last command bitmask the cooler received.
    pub fn last_command(&self) -> Option<CommandBits> {
        self.lock().last_command
    }

    /// SSID from the last credential write.
    pub fn provisioned_ssid(&self) -> Option<String> {
        self.lock().provisioned_ssid.clone()
    }

    /// Current raw value of `role`.
    pub fn value(&self, role: Role) -> Vec<u8> {
        self.lock().values[role.index()].clone()
    }

    /// Update the cooler's sensors. Subscribed telemetry roles are
    /// notified while a link is up.
    pub fn push_telemetry(&self, telemetry: Telemetry) {
        let changed: Vec<(Role, Vec<u8>)> = {
            let mut state = self.lock();
            state.values[Role::InsideTemp.index()] =
                encode_temperature(telemetry.inside_temp_c).to_vec();
            state.values[Role::HotTemp.index()] = encode_temperature(telemetry.hot_temp_c).to_vec();
            state.set_state_bits(telemetry.state.0);
            if !state.connected {
                return;
            }
            Role::TELEMETRY
                .iter()
                .filter(|role| state.notifying[role.index()])
                .map(|&role| (role, state.values[role.index()].clone()))
                .collect()
        };
        for (role, value) in changed {
            self.post(TransportEvent::CharacteristicChanged {
                handle: char_handle(role),
                value,
            });
        }
    }

    fn on_write(&self, role: Role, value: &[u8]) -> Option<(Role, Vec<u8>)> {
        let mut state = self.lock();
        match role {
            Role::Setpoint | Role::Hysteresis | Role::HotCut | Role::HotResume | Role::FanRunOn => {
                state.values[role.index()] = value.to_vec();
                Some((role, value.to_vec()))
            }
            Role::Command => {
                let bits = CommandBits::from_bits(value.first().copied().unwrap_or(0));
                state.apply_command(bits);
                info!("sim: command 0x{:02x}", bits.bits());
                let notify = state.notifying[Role::StateBits.index()];
                notify.then(|| (Role::StateBits, state.values[Role::StateBits.index()].clone()))
            }
            Role::WifiCredentials => {
                let ssid = value
                    .split_first()
                    .and_then(|(len, rest)| rest.get(..usize::from(*len)))
                    .map(|raw| String::from_utf8_lossy(raw).into_owned());
                info!("sim: provisioned Wi-Fi ssid={:?}", ssid);
                state.provisioned_ssid = ssid;
                None
            }
            Role::InsideTemp | Role::HotTemp | Role::StateBits | Role::DeviceInfo => {
                debug!("sim: ignoring write to read-only {}", role);
                None
            }
        }
    }
}

impl GattTransport for SimulatedCooler {
    fn start_scan(&mut self, name_hint: &str) -> Result<(), TransportError> {
        debug!("sim: scanning for {:?}", name_hint);
        let name = self.lock().advertised_name.clone();
        self.post(TransportEvent::ScanResult {
            peripheral: BYSTANDER,
            name: Some("OtherDevice".into()),
        });
        self.post(TransportEvent::ScanResult {
            peripheral: SIM_PERIPHERAL,
            name: Some(name),
        });
        Ok(())
    }

    fn stop_scan(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    fn connect(&mut self, peripheral: PeripheralId) -> Result<(), TransportError> {
        if peripheral != SIM_PERIPHERAL {
            warn!("sim: connect to unknown {}", peripheral);
            return Err(TransportError::Io);
        }
        self.lock().connected = true;
        self.post(TransportEvent::ConnectionStateChanged {
            status: GattStatus::SUCCESS,
            connected: true,
        });
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), TransportError> {
        let mut state = self.lock();
        state.connected = false;
        state.notifying = [false; Role::COUNT];
        Ok(())
    }

    fn discover_services(&mut self) -> Result<(), TransportError> {
        let services = {
            let state = self.lock();
            if !state.connected {
                return Err(TransportError::NotConnected);
            }
            state.services()
        };
        self.post(TransportEvent::ServicesDiscovered {
            status: GattStatus::SUCCESS,
            services,
        });
        Ok(())
    }

    fn read_characteristic(&mut self, handle: CharHandle) -> Result<(), TransportError> {
        let (status, value) = {
            let state = self.lock();
            if !state.connected {
                return Err(TransportError::NotConnected);
            }
            match role_at(handle.0) {
                Some(role) if handle == char_handle(role) => {
                    (GattStatus::SUCCESS, state.values[role.index()].clone())
                }
                // Invalid handle.
                _ => (GattStatus(0x01), Vec::new()),
            }
        };
        self.post(TransportEvent::CharacteristicRead {
            handle,
            status,
            value,
        });
        Ok(())
    }

    fn write_characteristic(
        &mut self,
        handle: CharHandle,
        value: &[u8],
        write_type: WriteType,
    ) -> Result<(), TransportError> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }
        let Some(role) = role_at(handle.0).filter(|r| char_handle(*r) == handle) else {
            return Err(TransportError::Io);
        };
        let echo = self.on_write(role, value);
        if write_type == WriteType::WithResponse {
            self.post(TransportEvent::CharacteristicWritten {
                handle,
                status: GattStatus::SUCCESS,
            });
        }
        if let Some((role, value)) = echo {
            self.post(TransportEvent::CharacteristicChanged {
                handle: char_handle(role),
                value,
            });
        }
        Ok(())
    }

    fn write_descriptor(&mut self, handle: DescHandle, value: &[u8]) -> Result<(), TransportError> {
        let status = {
            let mut state = self.lock();
            if !state.connected {
                return Err(TransportError::NotConnected);
            }
            match role_at(handle.0).filter(|r| cccd_handle(*r) == handle) {
                Some(role) if Role::TELEMETRY.contains(&role) => {
                    state.notifying[role.index()] = value == ENABLE_NOTIFICATION_VALUE;
                    GattStatus::SUCCESS
                }
                _ => GattStatus(0x01),
            }
        };
        self.post(TransportEvent::DescriptorWritten { handle, status });
        Ok(())
    }

    fn enable_notifications(&mut self, _handle: CharHandle) -> Result<(), TransportError> {
        Ok(())
    }
}
