//! Dot-unit timing and the speed / Farnsworth model
//!
//! Every duration in the keyer is an integer number of dot-units, and a
//! dot-unit is an integer number of heartbeat ticks derived from the speed.
//! Rounding happens only in that single unit -> tick conversion.

use crate::config::{HEARTBEAT_MS, MAX_FARNSWORTH, MAX_WPM, MIN_WPM};
use crate::types::{Direction, Element};

/// Inter-element gap in dot-units
pub const IEG_UNITS: u16 = 1;
/// Inter-character gap in dot-units
pub const ICG_UNITS: u16 = 3;
/// Inter-word gap in dot-units
pub const IWG_UNITS: u16 = 7;

/// Heartbeat ticks per dot-unit at `wpm` (PARIS: one unit is 1200 ms / wpm)
pub const fn unit_ticks(wpm: u8) -> u16 {
    let divisor = HEARTBEAT_MS * wpm as u32;
    if divisor == 0 {
        return 1;
    }
    let ticks = (1200 + divisor / 2) / divisor;
    if ticks == 0 {
        1
    } else {
        ticks as u16
    }
}

/// Current speed and Farnsworth spacing with the derived tick length
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Speed {
    wpm: u8,
    farnsworth: u8,
    unit_ticks: u16,
}

impl Speed {
    /// Build a speed model, clamping out-of-range values
    pub fn new(wpm: u8, farnsworth: u8) -> Self {
        let wpm = wpm.clamp(MIN_WPM, MAX_WPM);
        Self {
            wpm,
            farnsworth: farnsworth.min(MAX_FARNSWORTH),
            unit_ticks: unit_ticks(wpm),
        }
    }

    pub fn wpm(&self) -> u8 {
        self.wpm
    }

    pub fn farnsworth(&self) -> u8 {
        self.farnsworth
    }

    /// Heartbeat ticks in one dot-unit
    pub fn unit(&self) -> u16 {
        self.unit_ticks
    }

    /// Converts dot-units to heartbeat ticks
    pub fn ticks_for(&self, units: u16) -> u32 {
        units as u32 * self.unit_ticks as u32
    }

    /// Key-down length of an element in ticks
    pub fn element_ticks(&self, element: Element) -> u32 {
        self.ticks_for(element.duration_units())
    }

    /// Ticks of the extra Farnsworth pause after a character
    pub fn farnsworth_ticks(&self) -> u32 {
        self.ticks_for(self.farnsworth as u16)
    }

    /// One WPM step, clamped. Returns the new speed.
    pub fn adjust_wpm(&mut self, direction: Direction) -> u8 {
        self.wpm = match direction {
            Direction::Increase if self.wpm < MAX_WPM => self.wpm + 1,
            Direction::Decrease if self.wpm > MIN_WPM => self.wpm - 1,
            _ => self.wpm,
        };
        self.unit_ticks = unit_ticks(self.wpm);
        self.wpm
    }

    /// One Farnsworth unit, clamped. Returns the new spacing.
    pub fn adjust_farnsworth(&mut self, direction: Direction) -> u8 {
        self.farnsworth = match direction {
            Direction::Increase if self.farnsworth < MAX_FARNSWORTH => self.farnsworth + 1,
            Direction::Decrease => self.farnsworth.saturating_sub(1),
            _ => self.farnsworth,
        };
        self.farnsworth
    }
}
