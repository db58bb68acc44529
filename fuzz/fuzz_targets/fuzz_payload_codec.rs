//! Fuzz target: characteristic payload codec
//!
//! Decodes arbitrary bytes under every role and splits the same bytes
//! into a credential pair. Decoding must never panic, and an accepted
//! credential pair must encode to exactly its length-prefixed layout.
//!
//! cargo fuzz run fuzz_payload_codec

#![no_main]

use libfuzzer_sys::fuzz_target;
use xtrailcooler::gatt::codec::{Reading, encode_wifi_credentials};
use xtrailcooler::gatt::uuids::Role;

fuzz_target!(|data: &[u8]| {
    for role in Role::ALL {
        if let Some(Reading::DeviceInfo(text)) = role.decode(data) {
            assert!(!text.is_empty(), "empty device info must not decode");
        }
    }

    let split = data.first().map_or(0, |b| usize::from(*b)).min(data.len());
    let (ssid, password) = data.split_at(split);
    if let Ok(payload) = encode_wifi_credentials(ssid, password) {
        assert_eq!(payload.len(), 2 + ssid.len() + password.len());
        assert_eq!(usize::from(payload[0]), ssid.len());
    }
});
