//! Characteristic payload codec.
//!
//! Wire format (all multi-byte integers little-endian, no framing beyond
//! characteristic identity):
//!
//! ```text
//! temperature   ┌──────────────┐  i16, value = raw / 10 (°C)
//!               │ raw (2B) LE  │
//!               └──────────────┘
//! u16 field     ┌──────────────┐  state bits, fan run-on seconds
//!               │ raw (2B) LE  │
//!               └──────────────┘
//! command       ┌──────┐          bitmask
//!               │ (1B) │
//!               └──────┘
//! wifi creds    ┌────────┬──────────────┬────────┬──────────────────┐
//!               │ len(1B)│ ssid (≤32B)  │ len(1B)│ password (≤63B)  │
//!               └────────┴──────────────┴────────┴──────────────────┘
//! device info   raw text, no terminator
//! ```
//!
//! Pure functions, no I/O.

use heapless::Vec;

use super::uuids::Role;
use crate::error::WireError;
use crate::model::CommandBits;

pub const MAX_SSID_LEN: usize = 32;
pub const MAX_PASSWORD_LEN: usize = 63;

/// Largest possible Wi-Fi credential payload.
pub const WIFI_PAYLOAD_CAP: usize = 2 + MAX_SSID_LEN + MAX_PASSWORD_LEN;

/// Temperatures travel as tenths of a degree.
const TEMPERATURE_SCALE: f64 = 10.0;

// ───────────────────────────────────────────────────────────────
// Temperatures
// ───────────────────────────────────────────────────────────────

/// Decode a little-endian `i16` in tenths of a degree.
///
/// Returns `NaN` when fewer than two bytes are present; callers treat NaN
/// as "value unavailable". Trailing bytes are ignored.
pub fn decode_temperature(bytes: &[u8]) -> f32 {
    match bytes {
        [lo, hi, ..] => f32::from(i16::from_le_bytes([*lo, *hi])) / 10.0,
        _ => f32::NAN,
    }
}

/// Encode °C as a little-endian `i16` in tenths of a degree.
///
/// `value × 10` is computed in `f64` from the exact `f32`, rounded half
/// away from zero and clamped to the `i16` range. NaN encodes as 0.
pub fn encode_temperature(value: f32) -> [u8; 2] {
    temperature_to_raw(value).to_le_bytes()
}

/// The raw tenths value [`encode_temperature`] would put on the wire.
pub fn temperature_to_raw(value: f32) -> i16 {
    if value.is_nan() {
        return 0;
    }
    let scaled = (f64::from(value) * TEMPERATURE_SCALE).round();
    scaled.clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16
}

// ───────────────────────────────────────────────────────────────
// Unsigned 16-bit fields
// ───────────────────────────────────────────────────────────────

/// Decode a little-endian `u16`. `None` when fewer than two bytes are present.
pub fn decode_u16(bytes: &[u8]) -> Option<u16> {
    match bytes {
        [lo, hi, ..] => Some(u16::from_le_bytes([*lo, *hi])),
        _ => None,
    }
}

pub fn encode_u16(value: u16) -> [u8; 2] {
    value.to_le_bytes()
}

// ───────────────────────────────────────────────────────────────
// Command / credentials / device info
// ───────────────────────────────────────────────────────────────

pub fn encode_command(bits: CommandBits) -> [u8; 1] {
    [bits.bits()]
}

/// Build the `[len][ssid][len][password]` credential blob.
///
/// No terminator and no encryption; the peripheral relies on the embedded
/// lengths alone.
pub fn encode_wifi_credentials(
    ssid: &[u8],
    password: &[u8],
) -> Result<Vec<u8, WIFI_PAYLOAD_CAP>, WireError> {
    if ssid.len() > MAX_SSID_LEN {
        return Err(WireError::PayloadTooLarge {
            field: "ssid",
            len: ssid.len(),
            max: MAX_SSID_LEN,
        });
    }
    if password.len() > MAX_PASSWORD_LEN {
        return Err(WireError::PayloadTooLarge {
            field: "password",
            len: password.len(),
            max: MAX_PASSWORD_LEN,
        });
    }

    let overflow = || WireError::PayloadTooLarge {
        field: "credentials",
        len: 2 + ssid.len() + password.len(),
        max: WIFI_PAYLOAD_CAP,
    };
    let mut out = Vec::new();
    out.push(ssid.len() as u8).map_err(|_| overflow())?;
    out.extend_from_slice(ssid).map_err(|_| overflow())?;
    out.push(password.len() as u8).map_err(|_| overflow())?;
    out.extend_from_slice(password).map_err(|_| overflow())?;
    Ok(out)
}

/// Interpret the device-info payload as UTF-8 text (lossy).
///
/// An empty payload yields `None`: it produces no event at all.
pub fn decode_device_info(bytes: &[u8]) -> Option<String> {
    if bytes.is_empty() {
        return None;
    }
    Some(String::from_utf8_lossy(bytes).into_owned())
}

// ───────────────────────────────────────────────────────────────
// Role-keyed decoding
// ───────────────────────────────────────────────────────────────

/// A decoded characteristic value, tagged by the role it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    InsideTemp(f32),
    HotTemp(f32),
    StateBits(u16),
    Setpoint(f32),
    Hysteresis(f32),
    HotCut(f32),
    HotResume(f32),
    FanRunOn(u16),
    DeviceInfo(String),
}

impl Role {
    /// Decode a payload received for this role.
    ///
    /// `None` means "nothing usable": a short payload, a NaN temperature,
    /// an empty device-info string, or a write-only role.
    pub fn decode(self, bytes: &[u8]) -> Option<Reading> {
        let temperature = || {
            let value = decode_temperature(bytes);
            (!value.is_nan()).then_some(value)
        };
        match self {
            Self::InsideTemp => temperature().map(Reading::InsideTemp),
            Self::HotTemp => temperature().map(Reading::HotTemp),
            Self::StateBits => decode_u16(bytes).map(Reading::StateBits),
            Self::Setpoint => temperature().map(Reading::Setpoint),
            Self::Hysteresis => temperature().map(Reading::Hysteresis),
            Self::HotCut => temperature().map(Reading::HotCut),
            Self::HotResume => temperature().map(Reading::HotResume),
            Self::FanRunOn => decode_u16(bytes).map(Reading::FanRunOn),
            Self::DeviceInfo => decode_device_info(bytes).map(Reading::DeviceInfo),
            Self::Command | Self::WifiCredentials => None,
        }
    }
}
