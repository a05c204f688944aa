// SPDX-License-Identifier: GPL-2.0
//! hidraw-relay
//!
//! Unlocks a Linux hidraw device by sending an 8-byte key as a feature report,
//! then copies everything the device produces to a writer (stdout in the CLI).
//!
//! The relay is generic over the device and the sink so it can be driven by
//! mocks in tests; [`hidraw::HidrawDevice`] is the real device.

pub mod cli;
pub mod error;
pub mod hidraw;
pub mod key;
pub mod relay;

pub use error::{RelayError, Result};
pub use hidraw::{FeatureReport, HidrawDevice};
pub use key::{KeyParseMode, UnlockKey, FEATURE_REPORT_LEN, KEY_LEN, REPORT_ID};
pub use relay::{handshake, unlock_and_relay, Relay, RelayConfig, RelayStats, BUFFER_SIZE};
