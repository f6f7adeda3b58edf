//! Iambic keying finite state machine
//!
//! Called once per heartbeat with the debounced paddle view. It keys the
//! line for each element, accumulates the dot/dash pattern of the character
//! being keyed and hands back the decoded character once the
//! inter-character gap has run out.

use crate::morse::{self, PatternAccumulator};
use crate::timing::{Speed, ICG_UNITS, IEG_UNITS, IWG_UNITS};
use crate::types::{Element, KeyerMode, KeyerState, PaddleState, SqueezeMemory, Symbol};

/// Sink for key transitions driven by the FSM
pub trait KeyLine {
    /// `true` = key down, `false` = key up
    fn key(&mut self, down: bool);
}

impl<F: FnMut(bool)> KeyLine for F {
    fn key(&mut self, down: bool) {
        self(down)
    }
}

/// Main keyer FSM implementation
#[derive(Debug, Clone)]
pub struct IambicFsm {
    state: KeyerState,
    timer: u32,
    current: Symbol,
    next: Symbol,
    pressed: SqueezeMemory,
    pattern: PatternAccumulator,
}

impl IambicFsm {
    /// Create an idle FSM
    pub const fn new() -> Self {
        Self {
            state: KeyerState::Idle,
            timer: 0,
            current: Symbol::None,
            next: Symbol::None,
            pressed: SqueezeMemory::None,
            pattern: PatternAccumulator::new(),
        }
    }

    /// Get current FSM state
    pub fn state(&self) -> KeyerState {
        self.state
    }

    /// Pattern of the character being keyed
    pub fn pattern(&self) -> &PatternAccumulator {
        &self.pattern
    }

    /// Element currently sounding or whose gap is running
    pub fn current_element(&self) -> Option<Element> {
        match self.state {
            KeyerState::Elementing | KeyerState::InterElementGap => self.current.element(),
            _ => None,
        }
    }

    /// Reset FSM to initial state. The caller owns the key line.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Advance one heartbeat.
    ///
    /// Transitions cascade within the tick until the machine is stable.
    /// Returns the decoded character when an inter-character gap completes
    /// (`None` for an unknown pattern), or `' '` at the end of an
    /// inter-word gap when `report_words` is set.
    pub fn tick<K: KeyLine + ?Sized>(
        &mut self,
        paddles: PaddleState,
        mode: KeyerMode,
        speed: &Speed,
        report_words: bool,
        key: &mut K,
    ) -> Option<char> {
        self.timer = self.timer.saturating_sub(1);

        let mut decoded = None;
        loop {
            let repeat = match self.state {
                KeyerState::Idle | KeyerState::InterCharacterGap | KeyerState::InterWordGap => {
                    if !paddles.is_none() {
                        // Dit wins a simultaneous press
                        self.next = if paddles.dit() { Symbol::Dit } else { Symbol::Dah };
                        self.state = KeyerState::ElementInit;
                        true
                    } else {
                        if self.state != KeyerState::Idle && self.timer == 0 {
                            decoded = self.finish_gap(speed, report_words);
                        }
                        false
                    }
                }

                KeyerState::ElementInit => {
                    if self.start_element(paddles, mode, speed) {
                        key.key(true);
                        self.state = KeyerState::Elementing;
                    } else {
                        self.state = KeyerState::Idle;
                    }
                    false
                }

                KeyerState::Elementing | KeyerState::InterElementGap => {
                    self.track_squeeze(paddles);
                    if self.timer != 0 {
                        false
                    } else if self.state == KeyerState::Elementing {
                        if self.pressed == SqueezeMemory::Both {
                            self.next = Symbol::Opposite;
                            self.pressed = SqueezeMemory::DontCare;
                        }
                        key.key(false);
                        self.timer = speed.ticks_for(IEG_UNITS);
                        self.state = KeyerState::InterElementGap;
                        false
                    } else {
                        self.resolve_next(paddles);
                        if self.next == Symbol::None {
                            // One unit of the character gap has already elapsed
                            self.timer = speed.ticks_for(ICG_UNITS - IEG_UNITS);
                            self.state = KeyerState::InterCharacterGap;
                            false
                        } else {
                            self.state = KeyerState::ElementInit;
                            true
                        }
                    }
                }
            };

            if !repeat {
                break;
            }
        }

        decoded
    }

    /// Fix the scheduled symbol as current and arm its timer.
    /// Returns false if nothing was scheduled.
    fn start_element(&mut self, paddles: PaddleState, mode: KeyerMode, speed: &Speed) -> bool {
        self.current = self.next;
        self.next = Symbol::None;

        let Some(element) = self.current.element() else {
            return false;
        };

        if self.pattern.push(element).is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("Pattern overflow, character will be dropped");
        }
        self.timer = speed.element_ticks(element);

        self.pressed = match paddles {
            PaddleState::Both => {
                if mode.has_memory() {
                    self.next = Symbol::Opposite;
                }
                SqueezeMemory::Both
            }
            PaddleState::Dit | PaddleState::Dah => {
                let side: Symbol = paddles.single().map(Symbol::from).unwrap_or_default();
                if side == self.current {
                    SqueezeMemory::One
                } else {
                    self.next = side;
                    SqueezeMemory::DontCare
                }
            }
            PaddleState::None => SqueezeMemory::None,
        };

        true
    }

    /// Remember paddle activity seen while the element or its gap runs
    fn track_squeeze(&mut self, paddles: PaddleState) {
        self.pressed = match (self.pressed, paddles) {
            (SqueezeMemory::Both, PaddleState::None) => SqueezeMemory::None,
            (SqueezeMemory::Both, PaddleState::Dit | PaddleState::Dah) => SqueezeMemory::One,
            (SqueezeMemory::One | SqueezeMemory::None, PaddleState::Both) => {
                self.next = Symbol::Opposite;
                SqueezeMemory::DontCare
            }
            (SqueezeMemory::One, PaddleState::None) => SqueezeMemory::None,
            (SqueezeMemory::None, PaddleState::Dit | PaddleState::Dah) => {
                self.next = paddles.single().map(Symbol::from).unwrap_or_default();
                SqueezeMemory::DontCare
            }
            (pressed, _) => pressed,
        };
    }

    /// Decide the element after the inter-element gap
    fn resolve_next(&mut self, paddles: PaddleState) {
        if self.pressed == SqueezeMemory::One && self.next == Symbol::None {
            self.next = paddles.single().map(Symbol::from).unwrap_or_default();
        }
        if self.next == Symbol::Opposite {
            self.next = self.current.element().map_or(Symbol::Dit, |e| e.opposite().into());
        }
    }

    /// Character or word gap ran out with no paddle pressed
    fn finish_gap(&mut self, speed: &Speed, report_words: bool) -> Option<char> {
        match self.state {
            KeyerState::InterCharacterGap => {
                let decoded = self.pattern.finish().and_then(morse::decode);
                self.pattern.clear();

                #[cfg(feature = "defmt")]
                match decoded {
                    Some(c) => defmt::trace!("Decoded {}", c),
                    None => defmt::debug!("No codebook match"),
                }

                self.timer = speed.ticks_for(IWG_UNITS - ICG_UNITS);
                self.state = KeyerState::InterWordGap;
                decoded
            }
            KeyerState::InterWordGap => {
                self.state = KeyerState::Idle;
                report_words.then_some(' ')
            }
            _ => None,
        }
    }
}

impl Default for IambicFsm {
    fn default() -> Self {
        Self::new()
    }
}
