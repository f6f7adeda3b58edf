//! Test utilities for keyer core functionality
//!
//! A simulated HAL driven by a virtual heartbeat counter. Every port shares
//! the counter, so paddle scripts, key events and command presses are all
//! expressed in heartbeat ticks.

use std::cell::Cell;
use std::rc::Rc;
use std::string::String;
use std::vec::Vec;

use crate::config::Settings;
use crate::hal::{
    CancelSignal, HalError, Heartbeat, Message, OutputKey, PaddleInput, PersistenceStore, Ports, Sidetone,
};
use crate::types::MessageSlot;

/// Shared virtual heartbeat count
pub type TickCounter = Rc<Cell<u32>>;

/// Heartbeat that only advances the shared counter
#[derive(Debug, Clone, Default)]
pub struct VirtualClock {
    now: TickCounter,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the counter for the other simulated ports
    pub fn counter(&self) -> TickCounter {
        Rc::clone(&self.now)
    }

    pub fn now(&self) -> u32 {
        self.now.get()
    }
}

impl Heartbeat for VirtualClock {
    fn wait_tick(&mut self) {
        self.now.set(self.now.get() + 1);
    }
}

/// Paddle contacts following a script of `(tick, dit, dah)` changes
#[derive(Debug, Clone)]
pub struct ScriptedPaddles {
    now: TickCounter,
    script: Vec<(u32, bool, bool)>,
    /// Every read fails while set
    pub failing: bool,
}

impl ScriptedPaddles {
    pub fn new(now: TickCounter, script: &[(u32, bool, bool)]) -> Self {
        let mut script = script.to_vec();
        script.sort_by_key(|&(tick, _, _)| tick);
        Self {
            now,
            script,
            failing: false,
        }
    }

    /// Contacts at the current tick
    pub fn contacts(&self) -> (bool, bool) {
        let now = self.now.get();
        self.script
            .iter()
            .take_while(|&&(tick, _, _)| tick <= now)
            .last()
            .map(|&(_, dit, dah)| (dit, dah))
            .unwrap_or((false, false))
    }
}

impl PaddleInput for ScriptedPaddles {
    type Error = HalError;

    fn read_dit(&mut self) -> Result<bool, Self::Error> {
        if self.failing {
            return Err(HalError::GpioError);
        }
        Ok(self.contacts().0)
    }

    fn read_dah(&mut self) -> Result<bool, Self::Error> {
        if self.failing {
            return Err(HalError::GpioError);
        }
        Ok(self.contacts().1)
    }
}

/// Key output that logs every level written, with its tick
#[derive(Debug, Clone)]
pub struct RecordingKey {
    now: TickCounter,
    events: Vec<(u32, bool)>,
    /// Every write fails while set (the level is not recorded)
    pub failing: bool,
}

impl RecordingKey {
    pub fn new(now: TickCounter) -> Self {
        Self {
            now,
            events: Vec::new(),
            failing: false,
        }
    }

    pub fn events(&self) -> &[(u32, bool)] {
        &self.events
    }

    /// Last level written, if any
    pub fn level(&self) -> Option<bool> {
        self.events.last().map(|&(_, level)| level)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl OutputKey for RecordingKey {
    type Error = HalError;

    fn set_state(&mut self, level: bool) -> Result<(), Self::Error> {
        if self.failing {
            return Err(HalError::GpioError);
        }
        self.events.push((self.now.get(), level));
        Ok(())
    }
}

/// Sidetone that logs starts (with pitch) and stops
#[derive(Debug, Clone)]
pub struct RecordingSidetone {
    now: TickCounter,
    events: Vec<(u32, Option<u16>)>,
}

impl RecordingSidetone {
    pub fn new(now: TickCounter) -> Self {
        Self {
            now,
            events: Vec::new(),
        }
    }

    /// `(tick, Some(pitch))` for a start, `(tick, None)` for a stop
    pub fn events(&self) -> &[(u32, Option<u16>)] {
        &self.events
    }

    pub fn is_sounding(&self) -> bool {
        matches!(self.events.last(), Some((_, Some(_))))
    }
}

impl Sidetone for RecordingSidetone {
    fn start(&mut self, pitch_hz: u16) {
        self.events.push((self.now.get(), Some(pitch_hz)));
    }

    fn stop(&mut self) {
        self.events.push((self.now.get(), None));
    }
}

/// Command key pressed once at a scripted tick
#[derive(Debug, Clone)]
pub struct ScriptedCommand {
    now: TickCounter,
    press_at: Option<u32>,
    pending: bool,
}

impl ScriptedCommand {
    pub fn new(now: TickCounter) -> Self {
        Self {
            now,
            press_at: None,
            pending: false,
        }
    }

    /// Schedule a press
    pub fn press_at(&mut self, tick: u32) {
        self.press_at = Some(tick);
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }
}

impl CancelSignal for ScriptedCommand {
    fn is_cancel_requested(&mut self, consume: bool) -> bool {
        if self.press_at.is_some_and(|tick| tick <= self.now.get()) {
            self.press_at = None;
            self.pending = true;
        }
        let requested = self.pending;
        if consume {
            self.pending = false;
        }
        requested
    }
}

/// In-memory settings and message slots
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub settings: Option<Settings>,
    pub messages: [Message; 2],
    /// Number of successful settings writes
    pub settings_writes: usize,
    /// Every read and write fails while set
    pub failing: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings: Some(settings),
            ..Self::default()
        }
    }

    /// Slot contents up to the terminator
    pub fn message_text(&self, slot: MessageSlot) -> String {
        self.messages[slot.index()]
            .iter()
            .take_while(|&&b| b != 0)
            .map(|&b| char::from(b))
            .collect()
    }
}

impl PersistenceStore for MemoryStore {
    type Error = HalError;

    fn load_settings(&mut self) -> Result<Option<Settings>, Self::Error> {
        if self.failing {
            return Err(HalError::StorageError);
        }
        Ok(self.settings)
    }

    fn save_settings(&mut self, settings: &Settings) -> Result<(), Self::Error> {
        if self.failing {
            return Err(HalError::StorageError);
        }
        self.settings = Some(*settings);
        self.settings_writes += 1;
        Ok(())
    }

    fn load_message(&mut self, slot: MessageSlot) -> Result<Message, Self::Error> {
        if self.failing {
            return Err(HalError::StorageError);
        }
        Ok(self.messages[slot.index()].clone())
    }

    fn save_message(&mut self, slot: MessageSlot, message: &[u8]) -> Result<(), Self::Error> {
        if self.failing {
            return Err(HalError::StorageError);
        }
        self.messages[slot.index()] = Message::from_slice(message).map_err(|_| HalError::StorageError)?;
        Ok(())
    }
}

/// Simulated HAL used throughout the tests
pub type MockHal = Ports<ScriptedPaddles, RecordingKey, RecordingSidetone, VirtualClock, ScriptedCommand, MemoryStore>;

/// Simulated HAL with a paddle script and an empty store
pub fn mock_hal(script: &[(u32, bool, bool)]) -> MockHal {
    let clock = VirtualClock::new();
    let now = clock.counter();
    Ports {
        paddles: ScriptedPaddles::new(Rc::clone(&now), script),
        key: RecordingKey::new(Rc::clone(&now)),
        sidetone: RecordingSidetone::new(Rc::clone(&now)),
        command: ScriptedCommand::new(now),
        clock,
        store: MemoryStore::new(),
    }
}

/// Key-down intervals reconstructed from a key event log
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyTrace {
    /// `(start tick, length)` of every mark
    pub marks: Vec<(u32, u32)>,
}

impl KeyTrace {
    /// `active` is the level that means key down
    pub fn new(events: &[(u32, bool)], active: bool) -> Self {
        let mut marks = Vec::new();
        let mut down_at = None;
        for &(tick, level) in events {
            match (down_at, level == active) {
                (None, true) => down_at = Some(tick),
                (Some(start), false) => {
                    marks.push((start, tick - start));
                    down_at = None;
                }
                _ => {}
            }
        }
        Self { marks }
    }

    /// Marks as `.` and `-`, anything of two units or more being a dah
    pub fn glyphs(&self, unit: u32) -> String {
        self.marks
            .iter()
            .map(|&(_, len)| if len >= 2 * unit { '-' } else { '.' })
            .collect()
    }

    pub fn durations(&self) -> Vec<u32> {
        self.marks.iter().map(|&(_, len)| len).collect()
    }

    /// Spaces between consecutive marks
    pub fn gaps(&self) -> Vec<u32> {
        self.marks
            .windows(2)
            .map(|pair| pair[1].0 - (pair[0].0 + pair[0].1))
            .collect()
    }
}
