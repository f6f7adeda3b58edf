//! Programmatic transmission: characters, strings, numbers and the error prosign
//!
//! All of these are blocking and paced by the heartbeat, so they run inside
//! the control loop rather than next to the paddle FSM.

use crate::controller::Keyer;
use crate::hal::KeyerHal;
use crate::morse;
use crate::timing::{ICG_UNITS, IEG_UNITS, IWG_UNITS};
use crate::types::Element;

/// Number of dits in the error prosign
const ERROR_DITS: usize = 8;

impl<H: KeyerHal> Keyer<H> {
    /// Key one element and release. The gap after it is the caller's.
    pub fn play_element(&mut self, element: Element) {
        self.key(true);
        self.delay_units(element.duration_units());
        self.key(false);
    }

    /// Extra character spacing configured by Farnsworth
    pub fn farnsworth_pause(&mut self) {
        for _ in 0..self.speed.farnsworth_ticks() {
            self.heartbeat();
        }
    }

    /// Send one character followed by its character gap.
    ///
    /// A space waits out the rest of a word gap. Characters without a code
    /// are skipped silently.
    pub fn send_char(&mut self, c: char) {
        if c == ' ' {
            self.delay_units(IWG_UNITS - ICG_UNITS);
            return;
        }

        let Some(pattern) = morse::encode(c) else {
            #[cfg(feature = "defmt")]
            defmt::debug!("No code for {}", c);
            return;
        };

        for element in pattern.elements() {
            self.play_element(element);
            self.delay_units(IEG_UNITS);
        }
        self.delay_units(ICG_UNITS - IEG_UNITS);
        self.farnsworth_pause();
    }

    /// Send a string. Returns false if the command key cut it short.
    pub fn send_string(&mut self, text: &str) -> bool {
        for c in text.chars() {
            if self.is_cancel_requested(true) {
                #[cfg(feature = "defmt")]
                defmt::info!("Send cancelled");
                return false;
            }
            self.send_char(c);
        }
        true
    }

    /// Send a number as decimal digits followed by a word space
    pub fn send_number(&mut self, value: u16) -> bool {
        // Five digits always hold a u16
        let mut text = [b' '; 6];
        let mut start = 5;
        let mut rest = value;
        loop {
            start -= 1;
            text[start] = b'0' + (rest % 10) as u8;
            rest /= 10;
            if rest == 0 {
                break;
            }
        }

        let text = core::str::from_utf8(&text[start..]).unwrap_or_default();
        self.send_string(text)
    }

    /// Eight dits with dit spacing, then the rest of a dah-length pause
    pub fn send_error(&mut self) {
        #[cfg(feature = "defmt")]
        defmt::debug!("Sending error prosign");
        for _ in 0..ERROR_DITS {
            self.play_element(Element::Dit);
            self.delay_units(IEG_UNITS);
        }
        self.delay_units(Element::Dah.duration_units() - IEG_UNITS);
    }
}
