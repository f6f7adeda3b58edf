//! Paddle debouncing and press latching

use crate::config::{DEBOUNCE_MS, HEARTBEAT_MS};
use crate::types::PaddleState;

/// Debounces the two paddle contacts and latches presses until consumed.
///
/// [`poll`](Self::poll) samples the raw contacts. A change restarts the
/// hold-off; while it runs the previous debounced value stays in force, so a
/// transition shorter than the hold-off is never seen. Every poll ORs the
/// debounced value into sticky latches, which [`take`](Self::take) hands to
/// the FSM and clears.
#[derive(Debug, Clone)]
pub struct PaddleDebouncer {
    holdoff_ticks: u16,
    holdoff: u16,
    candidate: PaddleState,
    debounced: PaddleState,
    latched: PaddleState,
}

impl PaddleDebouncer {
    /// Create a debouncer with the given hold-off in heartbeat ticks
    pub const fn new(holdoff_ticks: u16) -> Self {
        Self {
            holdoff_ticks,
            holdoff: 0,
            candidate: PaddleState::None,
            debounced: PaddleState::None,
            latched: PaddleState::None,
        }
    }

    /// Sample raw contact levels (true = closed), applying paddle swap
    pub fn poll(&mut self, dit: bool, dah: bool, swap: bool) {
        let raw = PaddleState::from_contacts(dit, dah);
        let raw = if swap { raw.swapped() } else { raw };

        if raw != self.candidate {
            self.candidate = raw;
            self.holdoff = self.holdoff_ticks;
        } else if self.holdoff > 0 {
            self.holdoff -= 1;
        }

        if self.holdoff == 0 {
            self.debounced = self.candidate;
        }
        self.latched = self.latched | self.debounced;
    }

    /// Paddle view for one FSM tick; clears the latches
    pub fn take(&mut self) -> PaddleState {
        let view = self.latched;
        self.latched = PaddleState::None;
        view
    }

    /// Current debounced contacts, independent of the latches
    pub fn debounced(&self) -> PaddleState {
        self.debounced
    }

    /// True while a contact change is still settling
    pub fn is_settling(&self) -> bool {
        self.holdoff > 0
    }

    /// Forget all contact history
    pub fn reset(&mut self) {
        *self = Self::new(self.holdoff_ticks);
    }
}

impl Default for PaddleDebouncer {
    fn default() -> Self {
        Self::new((DEBOUNCE_MS / HEARTBEAT_MS) as u16)
    }
}
