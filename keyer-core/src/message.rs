//! Message memories: record from the paddles, play back through the sender

use crate::config::{secs_to_ticks, RECORD_TIMEOUT_SECS};
use crate::controller::Keyer;
use crate::hal::{KeyerHal, Message, PersistenceStore};
use crate::types::MessageSlot;

/// How a recording session ended
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecordOutcome {
    /// Message stored; the length excludes the terminator
    Saved(usize),
    /// Nothing was keyed before the timeout; the slot is untouched
    Empty,
    /// The command key ended the session; the slot is untouched
    Cancelled,
    /// Configuration is locked
    Locked,
    /// The store refused the write
    StoreFailed,
}

impl<H: KeyerHal> Keyer<H> {
    /// Record paddle input into a message slot.
    ///
    /// Recording ends after a pause longer than the record timeout. Running
    /// out of buffer plays the error prosign and starts the message over.
    pub fn record_message(&mut self, slot: MessageSlot) -> RecordOutcome {
        if self.is_config_locked() {
            return RecordOutcome::Locked;
        }

        #[cfg(feature = "defmt")]
        defmt::info!("Recording message {}", slot);

        let timeout = secs_to_ticks(RECORD_TIMEOUT_SECS);
        let mut remaining = timeout;
        let mut buffer = Message::new();
        self.reset_paddles();

        while remaining > 0 {
            remaining -= 1;

            if self.is_cancel_requested(true) {
                self.reset_paddles();
                #[cfg(feature = "defmt")]
                defmt::info!("Recording cancelled");
                return RecordOutcome::Cancelled;
            }

            if let Some(c) = self.tick_iambic(true) {
                // Codebook characters and the word space are all ASCII
                if buffer.push(c as u8).is_err() || buffer.is_full() {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("Message buffer full, starting over");
                    self.send_error();
                    buffer.clear();
                }
                remaining = timeout;
            }

            self.heartbeat();
        }

        if buffer.is_empty() {
            self.send_error();
            return RecordOutcome::Empty;
        }

        // The trailing word space becomes the terminator
        if buffer.last() == Some(&b' ') {
            buffer.pop();
        }
        let len = buffer.len();

        // A full buffer was cleared above, so the terminator always fits
        let stored = buffer.push(0).is_ok() && self.hal.store().save_message(slot, &buffer).is_ok();
        if stored {
            #[cfg(feature = "defmt")]
            defmt::info!("Message {} saved, {} characters", slot, len);
            RecordOutcome::Saved(len)
        } else {
            #[cfg(feature = "defmt")]
            defmt::warn!("Message write failed");
            RecordOutcome::StoreFailed
        }
    }

    /// Play a stored message up to its terminator.
    ///
    /// Returns false if the slot could not be read or the command key cut
    /// playback short. The command request is left pending for the caller.
    pub fn play_message(&mut self, slot: MessageSlot) -> bool {
        let message = match self.hal.store().load_message(slot) {
            Ok(message) => message,
            Err(_) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Message read failed");
                return false;
            }
        };

        for &byte in message.iter().take_while(|&&b| b != 0) {
            if self.is_cancel_requested(false) {
                #[cfg(feature = "defmt")]
                defmt::info!("Playback cancelled");
                return false;
            }
            self.send_char(char::from(byte));
        }
        true
    }
}
