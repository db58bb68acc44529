//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises one part of the session
//! engine against the recording mock transport. Everything runs on the
//! host with no Bluetooth adapter required.

mod command_tests;
mod session_flow_tests;
