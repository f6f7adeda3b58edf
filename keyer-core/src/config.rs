//! Keyer configuration and persisted settings

use crate::types::{FeatureFlag, KeyerMode};

/// Heartbeat period in milliseconds
pub const HEARTBEAT_MS: u32 = 5;

/// Paddle debounce hold-off in milliseconds
pub const DEBOUNCE_MS: u32 = 10;

/// Slowest selectable speed
pub const MIN_WPM: u8 = 5;
/// Fastest selectable speed
pub const MAX_WPM: u8 = 50;
/// Factory speed
pub const DEFAULT_WPM: u8 = 15;

/// Largest Farnsworth extension in dot-units
pub const MAX_FARNSWORTH: u8 = u8::MAX;

/// Sidetone pitch bounds and step, in Hz
pub const MIN_PITCH_HZ: u16 = 400;
pub const MAX_PITCH_HZ: u16 = 1500;
pub const PITCH_STEP_HZ: u16 = 10;
pub const DEFAULT_PITCH_HZ: u16 = 800;

/// Capacity of one stored message, terminator included
pub const MESSAGE_CAPACITY: usize = 100;

/// Silence that ends a message recording, in seconds
pub const RECORD_TIMEOUT_SECS: u32 = 5;

/// Longest steady key-down in tune mode, in seconds
pub const TUNE_SECS: u32 = 20;

/// Converts seconds to heartbeat ticks
pub const fn secs_to_ticks(secs: u32) -> u32 {
    secs * 1000 / HEARTBEAT_MS
}

/// Feature switches and iambic mode
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyerFlags {
    pub mode: KeyerMode,
    /// Key the transmitter line
    pub tx_key: bool,
    /// Sound the sidetone
    pub sidetone: bool,
    /// Transmitter line is active low
    pub tx_invert: bool,
    /// Dit and dah paddles exchanged
    pub paddle_swap: bool,
}

impl Default for KeyerFlags {
    fn default() -> Self {
        Self {
            mode: KeyerMode::ModeB,
            tx_key: true,
            sidetone: true,
            tx_invert: false,
            paddle_swap: false,
        }
    }
}

impl KeyerFlags {
    /// Read one feature switch
    pub const fn get(&self, flag: FeatureFlag) -> bool {
        match flag {
            FeatureFlag::TxKey => self.tx_key,
            FeatureFlag::Sidetone => self.sidetone,
            FeatureFlag::TxInvert => self.tx_invert,
            FeatureFlag::PaddleSwap => self.paddle_swap,
        }
    }

    /// Flip one feature switch
    pub fn toggle(&mut self, flag: FeatureFlag) {
        let slot = match flag {
            FeatureFlag::TxKey => &mut self.tx_key,
            FeatureFlag::Sidetone => &mut self.sidetone,
            FeatureFlag::TxInvert => &mut self.tx_invert,
            FeatureFlag::PaddleSwap => &mut self.paddle_swap,
        };
        *slot = !*slot;
    }
}

/// Settings mirrored to persistent storage
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Settings {
    /// Sidetone pitch in Hz
    pub pitch_hz: u16,
    /// Speed in words per minute (PARIS)
    pub wpm: u8,
    /// Extra dot-units after each character
    pub farnsworth: u8,
    pub flags: KeyerFlags,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pitch_hz: DEFAULT_PITCH_HZ,
            wpm: DEFAULT_WPM,
            farnsworth: 0,
            flags: KeyerFlags::default(),
        }
    }
}

impl Settings {
    /// Create settings with validation
    pub fn new(pitch_hz: u16, wpm: u8, farnsworth: u8, flags: KeyerFlags) -> Result<Self, &'static str> {
        Self {
            pitch_hz,
            wpm,
            farnsworth,
            flags,
        }
        .validate()
    }

    /// Check every field against its bounds
    pub fn validate(self) -> Result<Self, &'static str> {
        if self.wpm < MIN_WPM || self.wpm > MAX_WPM {
            return Err("WPM must be between 5 and 50");
        }
        if self.pitch_hz < MIN_PITCH_HZ || self.pitch_hz > MAX_PITCH_HZ {
            return Err("Pitch must be between 400 and 1500 Hz");
        }
        Ok(self)
    }
}
