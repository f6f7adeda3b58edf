//! Morse codebook shared by the transmitter and the paddle decoder
//!
//! A [`Pattern`] packs up to seven elements into one byte, read from the
//! most significant bit: `0` is a dit, `1` is a dah. After the last element
//! comes a stop bit (`1`) followed only by zeros, so `A` (`.-`) is
//! `0b0110_0000` and the empty pattern is `0b1000_0000`.

use crate::types::Element;

/// Longest pattern the codebook can hold
pub const MAX_ELEMENTS: u8 = 7;

const EMPTY: u8 = 0b1000_0000;

/// Packed element sequence with a left-aligned stop bit
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pattern(u8);

impl Pattern {
    /// Wrap a packed byte. `0` has no stop bit and is rejected.
    pub const fn from_bits(bits: u8) -> Option<Self> {
        if bits == 0 {
            None
        } else {
            Some(Self(bits))
        }
    }

    /// Pack a slice of elements. `None` if it does not fit.
    pub fn from_elements(elements: &[Element]) -> Option<Self> {
        let mut acc = PatternAccumulator::new();
        for &element in elements {
            acc.push(element).ok()?;
        }
        acc.finish()
    }

    pub const fn bits(&self) -> u8 {
        self.0
    }

    /// Number of elements before the stop bit
    pub const fn len(&self) -> u8 {
        MAX_ELEMENTS - self.0.trailing_zeros() as u8
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == EMPTY
    }

    /// Elements in sending order
    pub fn elements(&self) -> Elements {
        Elements { code: self.0 }
    }
}

/// Iterator over the elements of a [`Pattern`]
#[derive(Clone, Debug)]
pub struct Elements {
    code: u8,
}

impl Iterator for Elements {
    type Item = Element;

    fn next(&mut self) -> Option<Element> {
        // Stop once the stop bit has reached the MSB
        if self.code == EMPTY || self.code == 0 {
            return None;
        }
        let element = if self.code & 0x80 != 0 {
            Element::Dah
        } else {
            Element::Dit
        };
        self.code <<= 1;
        Some(element)
    }
}

/// Accumulator overflowed the codebook's maximum pattern width
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PatternOverflow;

#[cfg(any(test, feature = "std"))]
impl core::fmt::Display for PatternOverflow {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "pattern longer than {} elements", MAX_ELEMENTS)
    }
}

#[cfg(any(test, feature = "std"))]
impl std::error::Error for PatternOverflow {}

/// Dot/dash sequence of the character currently being keyed
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct PatternAccumulator {
    bits: u8,
    len: u8,
    overflowed: bool,
}

impl PatternAccumulator {
    pub const fn new() -> Self {
        Self {
            bits: 0,
            len: 0,
            overflowed: false,
        }
    }

    /// Append an element. Past [`MAX_ELEMENTS`] the accumulator is marked
    /// overflowed instead of dropping the oldest element.
    pub fn push(&mut self, element: Element) -> Result<(), PatternOverflow> {
        if self.overflowed || self.len >= MAX_ELEMENTS {
            self.overflowed = true;
            return Err(PatternOverflow);
        }
        self.bits = (self.bits << 1) | matches!(element, Element::Dah) as u8;
        self.len += 1;
        Ok(())
    }

    pub fn len(&self) -> u8 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0 && !self.overflowed
    }

    pub fn is_overflowed(&self) -> bool {
        self.overflowed
    }

    /// Packed pattern of everything pushed so far; `None` after an overflow
    pub fn finish(&self) -> Option<Pattern> {
        if self.overflowed {
            return None;
        }
        let stopped = ((self.bits as u16) << 1) | 1;
        Some(Pattern((stopped << (MAX_ELEMENTS - self.len)) as u8))
    }

    /// Clear for the next character
    pub fn clear(&mut self) {
        *self = Self::new();
    }
}

macro_rules! code {
    ($bits:expr) => {
        Pattern($bits)
    };
}

/// Character to pattern table. Prosigns without a printable symbol use
/// a stand-in character (see [`PROSIGNS`]).
pub static CODEBOOK: [(char, Pattern); 60] = [
    ('0', code!(0b1111_1100)),
    ('1', code!(0b0111_1100)),
    ('2', code!(0b0011_1100)),
    ('3', code!(0b0001_1100)),
    ('4', code!(0b0000_1100)),
    ('5', code!(0b0000_0100)),
    ('6', code!(0b1000_0100)),
    ('7', code!(0b1100_0100)),
    ('8', code!(0b1110_0100)),
    ('9', code!(0b1111_0100)),
    ('A', code!(0b0110_0000)),
    ('B', code!(0b1000_1000)),
    ('C', code!(0b1010_1000)),
    ('D', code!(0b1001_0000)),
    ('E', code!(0b0100_0000)),
    ('F', code!(0b0010_1000)),
    ('G', code!(0b1101_0000)),
    ('H', code!(0b0000_1000)),
    ('I', code!(0b0010_0000)),
    ('J', code!(0b0111_1000)),
    ('K', code!(0b1011_0000)),
    ('L', code!(0b0100_1000)),
    ('M', code!(0b1110_0000)),
    ('N', code!(0b1010_0000)),
    ('O', code!(0b1111_0000)),
    ('P', code!(0b0110_1000)),
    ('Q', code!(0b1101_1000)),
    ('R', code!(0b0101_0000)),
    ('S', code!(0b0001_0000)),
    ('T', code!(0b1100_0000)),
    ('U', code!(0b0011_0000)),
    ('V', code!(0b0001_1000)),
    ('W', code!(0b0111_0000)),
    ('X', code!(0b1001_1000)),
    ('Y', code!(0b1011_1000)),
    ('Z', code!(0b1100_1000)),
    ('?', code!(0b0011_0010)),
    ('.', code!(0b0101_0110)),
    ('/', code!(0b1001_0100)),
    // American Morse exclamation mark, common on the ham bands
    ('!', code!(0b1110_1000)),
    (',', code!(0b1100_1110)),
    (':', code!(0b1110_0010)),
    (';', code!(0b1010_1010)),
    ('"', code!(0b0100_1010)),
    ('$', code!(0b0001_0011)),
    ('\'', code!(0b0111_1010)),
    // Also prosign KN
    ('(', code!(0b1011_0100)),
    (')', code!(0b1011_0110)),
    ('-', code!(0b1000_0110)),
    ('@', code!(0b0110_1010)),
    ('_', code!(0b0011_0110)),
    // Paragraph break
    ('|', code!(0b0101_0010)),
    // Also prosign BT
    ('=', code!(0b1000_1100)),
    // SK
    ('#', code!(0b0001_0110)),
    // Also prosign AR
    ('+', code!(0b0101_0100)),
    // BK
    ('*', code!(0b1000_1011)),
    // AS
    ('%', code!(0b0100_0100)),
    // KA
    ('&', code!(0b1010_1100)),
    // VE
    ('<', code!(0b0001_0100)),
    // AA
    ('>', code!(0b0101_1000)),
];

/// Prosign names and the codebook character that carries each of them
pub static PROSIGNS: [(&str, char); 10] = [
    ("AA", '>'),
    ("AR", '+'),
    ("AS", '%'),
    ("BK", '*'),
    ("BT", '='),
    ("KA", '&'),
    ("KN", '('),
    ("SK", '#'),
    ("VE", '<'),
    ("SN", '<'),
];

/// Canonical form of a character: ASCII letters upper-cased, brackets
/// folded onto parentheses.
pub fn normalize(c: char) -> char {
    match c {
        '[' => '(',
        ']' => ')',
        _ => c.to_ascii_uppercase(),
    }
}

/// Character to pattern. Space and unmapped characters yield `None`.
pub fn encode(c: char) -> Option<Pattern> {
    let c = normalize(c);
    CODEBOOK
        .iter()
        .find(|(entry, _)| *entry == c)
        .map(|(_, pattern)| *pattern)
}

/// Pattern to character by exact match
pub fn decode(pattern: Pattern) -> Option<char> {
    CODEBOOK
        .iter()
        .find(|(_, entry)| *entry == pattern)
        .map(|(c, _)| *c)
}

/// Codebook character for a prosign name such as `"SK"` or `"ar"`
pub fn prosign(name: &str) -> Option<char> {
    PROSIGNS
        .iter()
        .find(|(entry, _)| entry.eq_ignore_ascii_case(name))
        .map(|(_, c)| *c)
}
