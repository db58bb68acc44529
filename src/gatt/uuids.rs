//! XTrailCooler GATT identifiers.
//!
//! ## Cooler service layout
//!
//! | Role              | UUID                                   | Perms        |
//! |-------------------|----------------------------------------|--------------|
//! | Cooler service    | `b4f00001-0000-1000-8000-00805f9b34fb` |              |
//! | Inside temp       | `b4f01001-0000-1000-8000-00805f9b34fb` | Read+Notify  |
//! | Hot-side temp     | `b4f01002-0000-1000-8000-00805f9b34fb` | Read+Notify  |
//! | State bits        | `b4f01003-0000-1000-8000-00805f9b34fb` | Read+Notify  |
//! | Setpoint          | `b4f02001-0000-1000-8000-00805f9b34fb` | Read+Write   |
//! | Hysteresis        | `b4f02002-0000-1000-8000-00805f9b34fb` | Read+Write   |
//! | Hot cut           | `b4f02003-0000-1000-8000-00805f9b34fb` | Read+Write   |
//! | Hot resume        | `b4f02004-0000-1000-8000-00805f9b34fb` | Read+Write   |
//! | Fan run-on        | `b4f02005-0000-1000-8000-00805f9b34fb` | Read+Write   |
//! | Command           | `b4f03001-0000-1000-8000-00805f9b34fb` | Write        |
//! | Device info       | `b4f03002-0000-1000-8000-00805f9b34fb` | Read         |
//! | Wi-Fi credentials | `b4f04001-0000-1000-8000-00805f9b34fb` | Write        |

use core::fmt;

// ───────────────────────────────────────────────────────────────
// Constants
// ───────────────────────────────────────────────────────────────

pub const SERVICE_COOLER: u128 = 0xb4f00001_0000_1000_8000_00805f9b34fb;

pub const CHAR_INSIDE_TEMP: u128 = 0xb4f01001_0000_1000_8000_00805f9b34fb;
pub const CHAR_HOT_TEMP: u128 = 0xb4f01002_0000_1000_8000_00805f9b34fb;
pub const CHAR_STATE_BITS: u128 = 0xb4f01003_0000_1000_8000_00805f9b34fb;
pub const CHAR_SETPOINT: u128 = 0xb4f02001_0000_1000_8000_00805f9b34fb;
pub const CHAR_HYSTERESIS: u128 = 0xb4f02002_0000_1000_8000_00805f9b34fb;
pub const CHAR_HOT_CUT: u128 = 0xb4f02003_0000_1000_8000_00805f9b34fb;
pub const CHAR_HOT_RESUME: u128 = 0xb4f02004_0000_1000_8000_00805f9b34fb;
pub const CHAR_FAN_RUN_ON: u128 = 0xb4f02005_0000_1000_8000_00805f9b34fb;
pub const CHAR_COMMAND: u128 = 0xb4f03001_0000_1000_8000_00805f9b34fb;
pub const CHAR_DEVICE_INFO: u128 = 0xb4f03002_0000_1000_8000_00805f9b34fb;
pub const CHAR_WIFI_CREDENTIALS: u128 = 0xb4f04001_0000_1000_8000_00805f9b34fb;

/// Standard Client Characteristic Configuration descriptor (0x2902).
pub const CLIENT_CONFIG_DESCRIPTOR: u128 = 0x00002902_0000_1000_8000_00805f9b34fb;

/// CCCD value that enables notifications.
pub const ENABLE_NOTIFICATION_VALUE: [u8; 2] = [0x01, 0x00];

// ───────────────────────────────────────────────────────────────
// Logical roles
// ───────────────────────────────────────────────────────────────

/// Logical role of a characteristic inside the cooler service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Role {
    InsideTemp = 0,
    HotTemp = 1,
    StateBits = 2,
    Setpoint = 3,
    Hysteresis = 4,
    HotCut = 5,
    HotResume = 6,
    FanRunOn = 7,
    Command = 8,
    DeviceInfo = 9,
    WifiCredentials = 10,
}

impl Role {
    /// Total number of roles. Sizes the binding tables.
    pub const COUNT: usize = 11;

    /// Every role, in table order.
    pub const ALL: [Role; Self::COUNT] = [
        Role::InsideTemp,
        Role::HotTemp,
        Role::StateBits,
        Role::Setpoint,
        Role::Hysteresis,
        Role::HotCut,
        Role::HotResume,
        Role::FanRunOn,
        Role::Command,
        Role::DeviceInfo,
        Role::WifiCredentials,
    ];

    /// Roles that push notifications once their CCCD is written.
    pub const TELEMETRY: [Role; 3] = [Role::InsideTemp, Role::HotTemp, Role::StateBits];

    /// Roles read once after binding, in issue order.
    pub const INITIAL_READS: [Role; 9] = [
        Role::InsideTemp,
        Role::HotTemp,
        Role::StateBits,
        Role::Setpoint,
        Role::Hysteresis,
        Role::HotCut,
        Role::HotResume,
        Role::FanRunOn,
        Role::DeviceInfo,
    ];

    pub const fn uuid(self) -> u128 {
        match self {
            Self::InsideTemp => CHAR_INSIDE_TEMP,
            Self::HotTemp => CHAR_HOT_TEMP,
            Self::StateBits => CHAR_STATE_BITS,
            Self::Setpoint => CHAR_SETPOINT,
            Self::Hysteresis => CHAR_HYSTERESIS,
            Self::HotCut => CHAR_HOT_CUT,
            Self::HotResume => CHAR_HOT_RESUME,
            Self::FanRunOn => CHAR_FAN_RUN_ON,
            Self::Command => CHAR_COMMAND,
            Self::DeviceInfo => CHAR_DEVICE_INFO,
            Self::WifiCredentials => CHAR_WIFI_CREDENTIALS,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::InsideTemp => "inside-temp",
            Self::HotTemp => "hot-temp",
            Self::StateBits => "state-bits",
            Self::Setpoint => "setpoint",
            Self::Hysteresis => "hysteresis",
            Self::HotCut => "hot-cut",
            Self::HotResume => "hot-resume",
            Self::FanRunOn => "fan-run-on",
            Self::Command => "command",
            Self::DeviceInfo => "device-info",
            Self::WifiCredentials => "wifi-credentials",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
