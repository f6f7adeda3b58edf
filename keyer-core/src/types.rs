//! Core data types for the iambic keyer

use core::ops::BitOr;

/// Morse code elements
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "std", derive(Hash))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Element {
    /// Dit (short element)
    Dit,
    /// Dah (long element)
    Dah,
}

impl Element {
    /// Returns the key-down duration of this element in dot-units
    pub const fn duration_units(&self) -> u16 {
        match self {
            Element::Dit => 1,
            Element::Dah => 3,
        }
    }

    /// Returns the opposite element (Dit <-> Dah)
    pub const fn opposite(&self) -> Element {
        match self {
            Element::Dit => Element::Dah,
            Element::Dah => Element::Dit,
        }
    }

    /// Dot/dash glyph used in traces and debug output
    pub const fn glyph(&self) -> char {
        match self {
            Element::Dit => '.',
            Element::Dah => '-',
        }
    }
}

/// Symbol scheduled by the iambic FSM.
///
/// `Opposite` is a deferred choice: it resolves to the element unlike the
/// current one, but only once the current element is fixed.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Symbol {
    #[default]
    None,
    Dit,
    Dah,
    Opposite,
}

impl Symbol {
    /// The concrete element behind this symbol, if it has one yet
    pub const fn element(&self) -> Option<Element> {
        match self {
            Symbol::Dit => Some(Element::Dit),
            Symbol::Dah => Some(Element::Dah),
            Symbol::None | Symbol::Opposite => None,
        }
    }
}

impl From<Element> for Symbol {
    fn from(element: Element) -> Self {
        match element {
            Element::Dit => Symbol::Dit,
            Element::Dah => Symbol::Dah,
        }
    }
}

/// Debounced paddle contacts as seen by the FSM on one tick
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PaddleState {
    #[default]
    None,
    Dit,
    Dah,
    /// Squeeze: both contacts closed
    Both,
}

impl PaddleState {
    /// Build from individual contact levels (true = closed)
    pub const fn from_contacts(dit: bool, dah: bool) -> Self {
        match (dit, dah) {
            (false, false) => PaddleState::None,
            (true, false) => PaddleState::Dit,
            (false, true) => PaddleState::Dah,
            (true, true) => PaddleState::Both,
        }
    }

    /// Dit contact closed (alone or in a squeeze)
    pub const fn dit(&self) -> bool {
        matches!(self, PaddleState::Dit | PaddleState::Both)
    }

    /// Dah contact closed (alone or in a squeeze)
    pub const fn dah(&self) -> bool {
        matches!(self, PaddleState::Dah | PaddleState::Both)
    }

    pub const fn is_none(&self) -> bool {
        matches!(self, PaddleState::None)
    }

    /// Exchange the dit and dah contacts (paddle swap)
    pub const fn swapped(&self) -> Self {
        PaddleState::from_contacts(self.dah(), self.dit())
    }

    /// Element of the single closed contact, `None` for idle or squeeze
    pub const fn single(&self) -> Option<Element> {
        match self {
            PaddleState::Dit => Some(Element::Dit),
            PaddleState::Dah => Some(Element::Dah),
            PaddleState::None | PaddleState::Both => None,
        }
    }
}

impl BitOr for PaddleState {
    type Output = PaddleState;

    fn bitor(self, rhs: PaddleState) -> PaddleState {
        PaddleState::from_contacts(self.dit() || rhs.dit(), self.dah() || rhs.dah())
    }
}

/// FSM states for the keyer
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyerState {
    /// No element or gap running
    #[default]
    Idle,
    /// About to start the scheduled element (never observed between ticks)
    ElementInit,
    /// Key down for the current element
    Elementing,
    /// Key up, one dot-unit after an element
    InterElementGap,
    /// Waiting to see whether the character is complete
    InterCharacterGap,
    /// Character decoded, waiting to see whether the word is complete
    InterWordGap,
}

/// Which paddles were seen while the current element or gap was running
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SqueezeMemory {
    #[default]
    None,
    One,
    Both,
    /// The next symbol is already decided; further paddle activity is ignored
    DontCare,
}

/// Keyer operating modes
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyerMode {
    /// Mode A: opposite element only for a squeeze seen while an element or its gap runs
    ModeA,
    /// Mode B: a squeeze at element start also schedules the opposite element
    #[default]
    ModeB,
}

impl KeyerMode {
    /// Returns true if a squeeze at element start pre-arms the opposite element
    pub const fn has_memory(&self) -> bool {
        match self {
            KeyerMode::ModeA => false,
            KeyerMode::ModeB => true,
        }
    }
}

/// Adjustment direction for speed, Farnsworth spacing and pitch
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Increase,
    Decrease,
}

/// Switchable keyer features
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FeatureFlag {
    /// Key the transmitter line
    TxKey,
    /// Sound the sidetone oscillator
    Sidetone,
    /// Invert the transmitter line polarity
    TxInvert,
    /// Exchange dit and dah paddles
    PaddleSwap,
}

/// Stored message slots
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MessageSlot {
    One,
    Two,
}

impl MessageSlot {
    /// Zero-based slot index
    pub const fn index(&self) -> usize {
        match self {
            MessageSlot::One => 0,
            MessageSlot::Two => 1,
        }
    }
}
