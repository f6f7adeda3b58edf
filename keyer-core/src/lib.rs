#![cfg_attr(not(any(test, feature = "std")), no_std)]

//! # Keyer Core
//!
//! Iambic CW keyer core for embedded systems.
//! Mode A and Mode B paddle keying on a fixed heartbeat, with a Morse
//! codebook, programmatic sending and message memories.

pub mod config;
pub mod controller;
pub mod fsm;
pub mod hal;
pub mod message;
pub mod morse;
pub mod paddle;
pub mod sender;
pub mod timing;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;


pub use config::*;
pub use controller::Keyer;
pub use fsm::{IambicFsm, KeyLine};
pub use hal::*;
pub use message::RecordOutcome;
pub use morse::{Pattern, PatternAccumulator, PatternOverflow};
pub use paddle::PaddleDebouncer;
pub use timing::Speed;
pub use types::*;

/// Keyer library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Factory settings: 15 WPM, Mode B, 800 Hz sidetone, transmitter keyed
pub fn default_settings() -> Settings {
    Settings::default()
}
