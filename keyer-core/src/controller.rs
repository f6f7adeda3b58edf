//! Keyer context: settings, key gating and the paddle loop
//!
//! [`Keyer`] owns every piece of mutable keyer state (speed, flags, the
//! dirty bit, the iambic FSM and the paddle debouncer) together with the
//! hardware ports. The control loop holds the only instance and every
//! operation goes through it.

use crate::config::{secs_to_ticks, Settings, MAX_PITCH_HZ, MIN_PITCH_HZ, PITCH_STEP_HZ, TUNE_SECS};
use crate::fsm::{IambicFsm, KeyLine};
use crate::hal::{CancelSignal, Heartbeat, KeyerHal, OutputKey, PaddleInput, PersistenceStore, Sidetone};
use crate::paddle::PaddleDebouncer;
use crate::timing::Speed;
use crate::types::{Direction, FeatureFlag, KeyerMode, KeyerState};

/// Which outputs follow the key right now
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct KeyGate {
    tx: bool,
    sidetone: bool,
}

/// Key line seen by the FSM: applies gating, polarity and pitch
struct GatedKey<'a, H: KeyerHal> {
    hal: &'a mut H,
    gate: KeyGate,
    invert: bool,
    pitch_hz: u16,
}

impl<H: KeyerHal> KeyLine for GatedKey<'_, H> {
    fn key(&mut self, down: bool) {
        if self.gate.sidetone {
            if down {
                self.hal.sidetone().start(self.pitch_hz);
            } else {
                self.hal.sidetone().stop();
            }
        }

        if self.gate.tx && self.hal.key_output().set_state(down != self.invert).is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("Key line write failed");
        }
    }
}

/// The keyer: one per process, owned by the control loop
pub struct Keyer<H: KeyerHal> {
    pub(crate) hal: H,
    pub(crate) settings: Settings,
    pub(crate) speed: Speed,
    gate: KeyGate,
    inhibited: bool,
    dirty: bool,
    locked: bool,
    fsm: IambicFsm,
    paddles: PaddleDebouncer,
}

impl<H: KeyerHal> Keyer<H> {
    /// Create a keyer with known settings. Keying is enabled and the key is up.
    pub fn new(hal: H, settings: Settings) -> Self {
        let mut keyer = Self {
            hal,
            settings,
            speed: Speed::new(settings.wpm, settings.farnsworth),
            gate: KeyGate {
                tx: false,
                sidetone: false,
            },
            inhibited: false,
            dirty: false,
            locked: false,
            fsm: IambicFsm::new(),
            paddles: PaddleDebouncer::default(),
        };
        keyer.inhibit(false);
        keyer
    }

    /// Create a keyer from stored settings.
    ///
    /// Missing or out-of-range settings are replaced by the factory defaults,
    /// which are written back immediately.
    pub fn init(mut hal: H) -> Self {
        let stored = match hal.store().load_settings() {
            Ok(Some(settings)) => settings.validate().ok(),
            Ok(None) => None,
            Err(_) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Settings read failed, using defaults");
                None
            }
        };

        match stored {
            Some(settings) => {
                #[cfg(feature = "defmt")]
                defmt::info!("Settings loaded: {} WPM, mode {}", settings.wpm, settings.flags.mode);
                Self::new(hal, settings)
            }
            None => {
                let mut keyer = Self::new(hal, Settings::default());
                keyer.reset();
                keyer
            }
        }
    }

    /// Restore factory settings and save them
    pub fn reset(&mut self) {
        #[cfg(feature = "defmt")]
        defmt::info!("Resetting to factory settings");
        self.settings = Settings::default();
        self.speed = Speed::new(self.settings.wpm, self.settings.farnsworth);
        self.refresh_gate();
        self.dirty = true;
        self.save();
    }

    /// Write settings to storage if anything changed since the last save.
    ///
    /// Returns false if the write failed; the changes stay pending.
    pub fn save(&mut self) -> bool {
        if !self.dirty {
            return true;
        }
        match self.hal.store().save_settings(&self.settings) {
            Ok(()) => {
                self.dirty = false;
                #[cfg(feature = "defmt")]
                defmt::debug!("Settings saved");
                true
            }
            Err(_) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Settings write failed");
                false
            }
        }
    }

    /// Enter or leave a command phase.
    ///
    /// While inhibited the transmitter is never keyed and the sidetone always
    /// sounds, so the operator can talk to the keyer. Leaving restores the
    /// configured gating and releases the key.
    pub fn inhibit(&mut self, on: bool) {
        self.inhibited = on;
        self.refresh_gate();
        if !on {
            self.key(false);
        }
    }

    fn refresh_gate(&mut self) {
        self.gate = if self.inhibited {
            KeyGate {
                tx: false,
                sidetone: true,
            }
        } else {
            KeyGate {
                tx: self.settings.flags.tx_key,
                sidetone: self.settings.flags.sidetone,
            }
        };
    }

    /// Key down (`true`) or up through the current gating
    pub fn key(&mut self, down: bool) {
        let mut line = self.gated_key();
        line.key(down);
    }

    fn gated_key(&mut self) -> GatedKey<'_, H> {
        GatedKey {
            hal: &mut self.hal,
            gate: self.gate,
            invert: self.settings.flags.tx_invert,
            pitch_hz: self.settings.pitch_hz,
        }
    }

    /// Wait for the next heartbeat
    pub fn heartbeat(&mut self) {
        self.hal.clock().wait_tick();
    }

    /// Busy-wait a number of dot-units at the current speed
    pub fn delay_units(&mut self, units: u16) {
        for _ in 0..self.speed.ticks_for(units) {
            self.heartbeat();
        }
    }

    /// Poll the command key
    pub fn is_cancel_requested(&mut self, consume: bool) -> bool {
        self.hal.command().is_cancel_requested(consume)
    }

    fn read_contacts(&mut self) -> (bool, bool) {
        // A failed read counts as an open contact
        let paddles = self.hal.paddles();
        (paddles.read_dit().unwrap_or(false), paddles.read_dah().unwrap_or(false))
    }

    /// Run the iambic FSM for one heartbeat.
    ///
    /// Does not wait for the heartbeat itself. Returns a decoded character
    /// when one completes, and `' '` at word boundaries if `report_words`.
    pub fn tick_iambic(&mut self, report_words: bool) -> Option<char> {
        let (dit, dah) = self.read_contacts();
        self.paddles.poll(dit, dah, self.settings.flags.paddle_swap);
        let view = self.paddles.take();

        let mode = self.settings.flags.mode;
        let mut line = GatedKey {
            hal: &mut self.hal,
            gate: self.gate,
            invert: self.settings.flags.tx_invert,
            pitch_hz: self.settings.pitch_hz,
        };
        self.fsm.tick(view, mode, &self.speed, report_words, &mut line)
    }

    /// One heartbeat of normal paddle keying
    pub fn service(&mut self) -> Option<char> {
        let decoded = self.tick_iambic(false);
        self.heartbeat();
        decoded
    }

    /// Paddle keying driven by an embassy ticker until the command key is pressed.
    ///
    /// The pending command request is left for the caller to consume.
    #[cfg(feature = "embassy-time")]
    pub async fn run_paddles(&mut self) {
        use embassy_time::{Duration, Ticker};

        let mut ticker = Ticker::every(Duration::from_millis(crate::config::HEARTBEAT_MS as u64));
        while !self.is_cancel_requested(false) {
            self.tick_iambic(false);
            ticker.next().await;
        }
        #[cfg(feature = "defmt")]
        defmt::debug!("Paddle loop left for command mode");
    }

    /// Play a dit, a dah and a character gap to confirm a setting change
    fn chirp(&mut self) {
        use crate::timing::{ICG_UNITS, IEG_UNITS};
        use crate::types::Element;

        self.play_element(Element::Dit);
        self.delay_units(IEG_UNITS);
        self.play_element(Element::Dah);
        self.delay_units(ICG_UNITS);
        self.farnsworth_pause();
    }

    /// One WPM faster or slower, clamped. Confirms audibly.
    pub fn adjust_speed(&mut self, direction: Direction) -> u8 {
        let wpm = self.speed.adjust_wpm(direction);
        self.settings.wpm = wpm;
        self.dirty = true;
        #[cfg(feature = "defmt")]
        defmt::info!("Speed {} WPM", wpm);
        self.chirp();
        wpm
    }

    /// One unit more or less Farnsworth spacing, clamped. Confirms audibly.
    pub fn adjust_farnsworth(&mut self, direction: Direction) -> u8 {
        let farnsworth = self.speed.adjust_farnsworth(direction);
        self.settings.farnsworth = farnsworth;
        self.dirty = true;
        #[cfg(feature = "defmt")]
        defmt::info!("Farnsworth {} units", farnsworth);
        self.chirp();
        farnsworth
    }

    /// Raise or lower the sidetone pitch by one step, clamped
    pub fn adjust_pitch(&mut self, direction: Direction) -> u16 {
        let pitch = match direction {
            Direction::Increase => self.settings.pitch_hz.saturating_add(PITCH_STEP_HZ),
            Direction::Decrease => self.settings.pitch_hz.saturating_sub(PITCH_STEP_HZ),
        };
        self.settings.pitch_hz = pitch.clamp(MIN_PITCH_HZ, MAX_PITCH_HZ);
        self.dirty = true;
        self.settings.pitch_hz
    }

    /// Lock or unlock mode, flag and message changes
    pub fn set_config_lock(&mut self, locked: bool) {
        self.locked = locked;
    }

    pub fn is_config_locked(&self) -> bool {
        self.locked
    }

    /// Select iambic mode A or B. False if the configuration is locked.
    pub fn set_mode(&mut self, mode: KeyerMode) -> bool {
        if self.locked {
            #[cfg(feature = "defmt")]
            defmt::warn!("Mode change refused, configuration locked");
            return false;
        }
        self.settings.flags.mode = mode;
        self.dirty = true;
        #[cfg(feature = "defmt")]
        defmt::info!("Mode {}", mode);
        true
    }

    /// Flip a feature flag. False if the configuration is locked.
    pub fn toggle_flag(&mut self, flag: FeatureFlag) -> bool {
        if self.locked {
            #[cfg(feature = "defmt")]
            defmt::warn!("Flag change refused, configuration locked");
            return false;
        }
        self.settings.flags.toggle(flag);
        self.refresh_gate();
        self.dirty = true;
        #[cfg(feature = "defmt")]
        defmt::info!("{} = {}", flag, self.settings.flags.get(flag));
        true
    }

    /// Current state of a feature flag
    pub fn flag(&self, flag: FeatureFlag) -> bool {
        self.settings.flags.get(flag)
    }

    /// Steady key-down for tuning.
    ///
    /// Ends after the tune duration, on any paddle contact or on the
    /// command key, whichever comes first.
    pub fn tune(&mut self) {
        let mut remaining = secs_to_ticks(TUNE_SECS);
        self.key(true);
        while remaining > 0 {
            let (dit, dah) = self.read_contacts();
            if dit || dah || self.is_cancel_requested(true) {
                break;
            }
            remaining -= 1;
            self.heartbeat();
        }
        self.key(false);
    }

    /// Drop any half-keyed character and return the FSM to idle
    pub fn reset_paddles(&mut self) {
        if self.fsm.state() == KeyerState::Elementing {
            self.key(false);
        }
        self.fsm.reset();
        self.paddles.reset();
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn speed(&self) -> &Speed {
        &self.speed
    }

    pub fn wpm(&self) -> u8 {
        self.speed.wpm()
    }

    pub fn mode(&self) -> KeyerMode {
        self.settings.flags.mode
    }

    /// True while settings differ from what was last saved
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn fsm_state(&self) -> KeyerState {
        self.fsm.state()
    }

    pub fn hal(&self) -> &H {
        &self.hal
    }

    pub fn hal_mut(&mut self) -> &mut H {
        &mut self.hal
    }

    /// Give the ports back
    pub fn release(self) -> H {
        self.hal
    }
}
