//! Hardware Abstraction Layer for keyer implementation
//!
//! The core never touches registers. Everything it needs from the outside
//! world goes through the port traits below, bundled by [`KeyerHal`].

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use heapless::Vec;
use portable_atomic::{AtomicBool, Ordering};

use crate::config::{Settings, HEARTBEAT_MS, MESSAGE_CAPACITY};
use crate::types::MessageSlot;

/// Raw bytes of one stored message
pub type Message = Vec<u8, MESSAGE_CAPACITY>;

/// Error types for HAL operations
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HalError {
    /// GPIO operation failed
    GpioError,
    /// Persistent storage read or write failed
    StorageError,
}

#[cfg(any(test, feature = "std"))]
impl core::fmt::Display for HalError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            HalError::GpioError => write!(f, "GPIO operation failed"),
            HalError::StorageError => write!(f, "Storage operation failed"),
        }
    }
}

#[cfg(any(test, feature = "std"))]
impl std::error::Error for HalError {}

/// Trait for paddle input handling
pub trait PaddleInput {
    type Error;

    /// True while the dit contact is closed
    fn read_dit(&mut self) -> Result<bool, Self::Error>;

    /// True while the dah contact is closed
    fn read_dah(&mut self) -> Result<bool, Self::Error>;
}

/// Trait for key output control
pub trait OutputKey {
    type Error;

    /// Drive the transmitter line. Polarity is already applied by the caller.
    fn set_state(&mut self, level: bool) -> Result<(), Self::Error>;
}

/// Sidetone oscillator
pub trait Sidetone {
    fn start(&mut self, pitch_hz: u16);
    fn stop(&mut self);
}

/// Fixed-period tick source
pub trait Heartbeat {
    /// Block until the next heartbeat boundary
    fn wait_tick(&mut self);
}

/// Command key used to cancel playback and recording
pub trait CancelSignal {
    /// Whether a cancel request is pending. With `consume` the request is
    /// cleared after being reported once.
    fn is_cancel_requested(&mut self, consume: bool) -> bool;
}

/// Typed persistent storage for settings and message slots
pub trait PersistenceStore {
    type Error;

    /// `Ok(None)` when nothing valid has been stored yet
    fn load_settings(&mut self) -> Result<Option<Settings>, Self::Error>;

    fn save_settings(&mut self, settings: &Settings) -> Result<(), Self::Error>;

    /// Raw slot contents; the terminator convention belongs to the caller
    fn load_message(&mut self, slot: MessageSlot) -> Result<Message, Self::Error>;

    fn save_message(&mut self, slot: MessageSlot, message: &[u8]) -> Result<(), Self::Error>;
}

/// Complete keyer HAL interface
pub trait KeyerHal {
    type Paddles: PaddleInput;
    type KeyOutput: OutputKey;
    type Sidetone: Sidetone;
    type Clock: Heartbeat;
    type Command: CancelSignal;
    type Store: PersistenceStore;

    /// Access to the paddle contacts
    fn paddles(&mut self) -> &mut Self::Paddles;

    /// Access to key output
    fn key_output(&mut self) -> &mut Self::KeyOutput;

    /// Access to the sidetone oscillator
    fn sidetone(&mut self) -> &mut Self::Sidetone;

    /// Access to the heartbeat
    fn clock(&mut self) -> &mut Self::Clock;

    /// Access to the command key
    fn command(&mut self) -> &mut Self::Command;

    /// Access to persistent storage
    fn store(&mut self) -> &mut Self::Store;
}

/// Plain bundle of ports
#[derive(Debug)]
pub struct Ports<P, K, T, C, X, S> {
    pub paddles: P,
    pub key: K,
    pub sidetone: T,
    pub clock: C,
    pub command: X,
    pub store: S,
}

impl<P, K, T, C, X, S> KeyerHal for Ports<P, K, T, C, X, S>
where
    P: PaddleInput,
    K: OutputKey,
    T: Sidetone,
    C: Heartbeat,
    X: CancelSignal,
    S: PersistenceStore,
{
    type Paddles = P;
    type KeyOutput = K;
    type Sidetone = T;
    type Clock = C;
    type Command = X;
    type Store = S;

    fn paddles(&mut self) -> &mut P {
        &mut self.paddles
    }

    fn key_output(&mut self) -> &mut K {
        &mut self.key
    }

    fn sidetone(&mut self) -> &mut T {
        &mut self.sidetone
    }

    fn clock(&mut self) -> &mut C {
        &mut self.clock
    }

    fn command(&mut self) -> &mut X {
        &mut self.command
    }

    fn store(&mut self) -> &mut S {
        &mut self.store
    }
}

/// Paddle contacts on two embedded-hal input pins.
///
/// Assumes pull-ups with the contact grounding the pin when closed.
pub struct EmbeddedHalPaddles<DIT, DAH> {
    dit: DIT,
    dah: DAH,
}

impl<DIT, DAH> EmbeddedHalPaddles<DIT, DAH>
where
    DIT: InputPin,
    DAH: InputPin,
{
    pub fn new(dit: DIT, dah: DAH) -> Self {
        Self { dit, dah }
    }

    /// Give the pins back
    pub fn release(self) -> (DIT, DAH) {
        (self.dit, self.dah)
    }
}

impl<DIT, DAH> PaddleInput for EmbeddedHalPaddles<DIT, DAH>
where
    DIT: InputPin,
    DAH: InputPin,
{
    type Error = HalError;

    fn read_dit(&mut self) -> Result<bool, Self::Error> {
        self.dit.is_low().map_err(|_| HalError::GpioError)
    }

    fn read_dah(&mut self) -> Result<bool, Self::Error> {
        self.dah.is_low().map_err(|_| HalError::GpioError)
    }
}

/// Generic implementation for embedded-hal compatible output pins
pub struct EmbeddedHalKeyOutput<P> {
    pin: P,
}

impl<P> EmbeddedHalKeyOutput<P>
where
    P: OutputPin,
{
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    pub fn release(self) -> P {
        self.pin
    }
}

impl<P> OutputKey for EmbeddedHalKeyOutput<P>
where
    P: OutputPin,
{
    type Error = HalError;

    fn set_state(&mut self, level: bool) -> Result<(), Self::Error> {
        if level {
            self.pin.set_high().map_err(|_| HalError::GpioError)
        } else {
            self.pin.set_low().map_err(|_| HalError::GpioError)
        }
    }
}

/// Active-low command button on an embedded-hal input pin.
///
/// Each press is latched once, on the released-to-pressed edge, and stays
/// pending until consumed. Holding the button does not raise it again.
pub struct EmbeddedHalCommandKey<P> {
    pin: P,
    was_down: bool,
    pending: bool,
}

impl<P> EmbeddedHalCommandKey<P>
where
    P: InputPin,
{
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            was_down: false,
            pending: false,
        }
    }

    pub fn release(self) -> P {
        self.pin
    }
}

impl<P> CancelSignal for EmbeddedHalCommandKey<P>
where
    P: InputPin,
{
    fn is_cancel_requested(&mut self, consume: bool) -> bool {
        // A failed read counts as released
        let down = self.pin.is_low().unwrap_or(false);
        if down && !self.was_down {
            self.pending = true;
        }
        self.was_down = down;

        let requested = self.pending;
        if consume {
            self.pending = false;
        }
        requested
    }
}

/// Cancel request raised from interrupt context
#[derive(Debug, Default)]
pub struct AtomicCancel {
    pending: AtomicBool,
}

impl AtomicCancel {
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
        }
    }

    /// Raise a request (safe to call from an interrupt handler)
    pub fn request(&self) {
        self.pending.store(true, Ordering::Release);
    }

    fn check(&self, consume: bool) -> bool {
        if consume {
            self.pending.swap(false, Ordering::AcqRel)
        } else {
            self.pending.load(Ordering::Acquire)
        }
    }
}

impl CancelSignal for AtomicCancel {
    fn is_cancel_requested(&mut self, consume: bool) -> bool {
        self.check(consume)
    }
}

impl CancelSignal for &AtomicCancel {
    fn is_cancel_requested(&mut self, consume: bool) -> bool {
        self.check(consume)
    }
}

/// Schedule of fixed-period heartbeat boundaries on a microsecond clock.
///
/// The first boundary is one period after the first call. Later boundaries
/// follow on the same grid, so time spent between ticks is absorbed instead
/// of stretching the period. After falling more than a period behind, the
/// grid restarts from the current time rather than bursting to catch up.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickDeadline {
    next_us: Option<u64>,
}

impl TickDeadline {
    pub const PERIOD_US: u64 = HEARTBEAT_MS as u64 * 1_000;

    pub const fn new() -> Self {
        Self { next_us: None }
    }

    /// Microseconds to wait from `now_us` until the next boundary
    pub fn wait_from(&mut self, now_us: u64) -> u64 {
        let due = self.next_us.unwrap_or(now_us + Self::PERIOD_US);
        self.next_us = Some(if now_us > due + Self::PERIOD_US {
            now_us + Self::PERIOD_US
        } else {
            due + Self::PERIOD_US
        });
        due.saturating_sub(now_us)
    }
}

/// Heartbeat built on a blocking embedded-hal delay.
///
/// Waits a full period on every call, so work done between ticks adds to
/// the period. Use [`PacedHeartbeat`] when a monotonic clock is available.
pub struct DelayHeartbeat<D> {
    delay: D,
}

impl<D: DelayNs> DelayHeartbeat<D> {
    pub fn new(delay: D) -> Self {
        Self { delay }
    }

    pub fn release(self) -> D {
        self.delay
    }
}

impl<D: DelayNs> Heartbeat for DelayHeartbeat<D> {
    fn wait_tick(&mut self) {
        self.delay.delay_ms(HEARTBEAT_MS);
    }
}

/// Heartbeat on tick boundaries of a monotonic microsecond clock, waiting
/// out the remainder with an embedded-hal delay
pub struct PacedHeartbeat<D, C> {
    delay: D,
    now_us: C,
    deadline: TickDeadline,
}

impl<D, C> PacedHeartbeat<D, C>
where
    D: DelayNs,
    C: FnMut() -> u64,
{
    pub fn new(delay: D, now_us: C) -> Self {
        Self {
            delay,
            now_us,
            deadline: TickDeadline::new(),
        }
    }

    pub fn release(self) -> (D, C) {
        (self.delay, self.now_us)
    }
}

impl<D, C> Heartbeat for PacedHeartbeat<D, C>
where
    D: DelayNs,
    C: FnMut() -> u64,
{
    fn wait_tick(&mut self) {
        let wait = self.deadline.wait_from((self.now_us)());
        // Never more than one period
        self.delay.delay_us(wait as u32);
    }
}

/// Heartbeat that spins on the embassy time driver until the next boundary
#[cfg(feature = "embassy-time")]
#[derive(Debug, Default)]
pub struct EmbassyHeartbeat {
    deadline: TickDeadline,
}

#[cfg(feature = "embassy-time")]
impl EmbassyHeartbeat {
    pub const fn new() -> Self {
        Self {
            deadline: TickDeadline::new(),
        }
    }
}

#[cfg(feature = "embassy-time")]
impl Heartbeat for EmbassyHeartbeat {
    fn wait_tick(&mut self) {
        let wait = self.deadline.wait_from(embassy_time::Instant::now().as_micros());
        embassy_time::block_for(embassy_time::Duration::from_micros(wait));
    }
}

/// Sidetone for builds without an oscillator
#[derive(Debug, Default)]
pub struct NoSidetone;

impl Sidetone for NoSidetone {
    fn start(&mut self, _pitch_hz: u16) {}

    fn stop(&mut self) {}
}
