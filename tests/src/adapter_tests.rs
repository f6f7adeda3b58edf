//! embedded-hal pin adapters against scripted pin mocks

use std::rc::Rc;

use cw_keyer_core::test_utils::{MemoryStore, RecordingSidetone, ScriptedCommand, ScriptedPaddles, VirtualClock};
use cw_keyer_core::{
    CancelSignal, EmbeddedHalCommandKey, EmbeddedHalKeyOutput, EmbeddedHalPaddles, FeatureFlag, Keyer, OutputKey,
    PaddleInput, Ports, Settings,
};
use embedded_hal_mock::eh1::digital::{Mock as PinMock, State as PinState, Transaction as PinTransaction};
use rstest::rstest;

#[rstest]
#[case(PinState::Low, true)]
#[case(PinState::High, false)]
fn paddle_contacts_are_active_low(#[case] level: PinState, #[case] closed: bool) {
    let dit = PinMock::new(&[PinTransaction::get(level)]);
    let dah = PinMock::new(&[PinTransaction::get(level)]);
    let mut paddles = EmbeddedHalPaddles::new(dit, dah);

    assert_eq!(paddles.read_dit(), Ok(closed));
    assert_eq!(paddles.read_dah(), Ok(closed));

    let (mut dit, mut dah) = paddles.release();
    dit.done();
    dah.done();
}

#[test]
fn key_output_writes_levels() {
    let pin = PinMock::new(&[PinTransaction::set(PinState::High), PinTransaction::set(PinState::Low)]);
    let mut key = EmbeddedHalKeyOutput::new(pin);

    assert!(key.set_state(true).is_ok());
    assert!(key.set_state(false).is_ok());
    key.release().done();
}

#[test]
fn command_key_press_is_latched() {
    let pin = PinMock::new(&[
        PinTransaction::get(PinState::Low),
        PinTransaction::get(PinState::High),
        PinTransaction::get(PinState::High),
    ]);
    let mut command = EmbeddedHalCommandKey::new(pin);

    assert!(command.is_cancel_requested(false));
    assert!(command.is_cancel_requested(true));
    assert!(!command.is_cancel_requested(true));
    command.release().done();
}

#[test]
fn held_command_key_cancels_once() {
    let pin = PinMock::new(&[
        PinTransaction::get(PinState::Low),
        PinTransaction::get(PinState::Low),
        PinTransaction::get(PinState::Low),
        PinTransaction::get(PinState::High),
        PinTransaction::get(PinState::Low),
    ]);
    let mut command = EmbeddedHalCommandKey::new(pin);

    let held: Vec<bool> = (0..3).map(|_| command.is_cancel_requested(true)).collect();
    assert_eq!(held, vec![true, false, false]);
    assert!(!command.is_cancel_requested(true));
    assert!(command.is_cancel_requested(true));
    command.release().done();
}

type PinHal =
    Ports<ScriptedPaddles, EmbeddedHalKeyOutput<PinMock>, RecordingSidetone, VirtualClock, ScriptedCommand, MemoryStore>;

/// Simulated ports with the transmitter on a pin mock
fn keyer_on_pin(pin: PinMock, settings: Settings) -> Keyer<PinHal> {
    let clock = VirtualClock::new();
    let now = clock.counter();
    let ports = Ports {
        paddles: ScriptedPaddles::new(Rc::clone(&now), &[]),
        key: EmbeddedHalKeyOutput::new(pin),
        sidetone: RecordingSidetone::new(Rc::clone(&now)),
        clock,
        command: ScriptedCommand::new(now),
        store: MemoryStore::new(),
    };
    Keyer::new(ports, settings)
}

#[test]
fn keyer_drives_transmitter_pin() {
    // Released at start, then one dah
    let pin = PinMock::new(&[
        PinTransaction::set(PinState::Low),
        PinTransaction::set(PinState::High),
        PinTransaction::set(PinState::Low),
    ]);
    let mut keyer = keyer_on_pin(pin, Settings::default());

    keyer.send_char('T');
    keyer.release().key.release().done();
}

#[test]
fn inverted_transmitter_pin_rests_high() {
    let pin = PinMock::new(&[
        PinTransaction::set(PinState::Low),
        PinTransaction::set(PinState::High),
        PinTransaction::set(PinState::Low),
        PinTransaction::set(PinState::High),
    ]);
    let mut keyer = keyer_on_pin(pin, Settings::default());

    assert!(keyer.toggle_flag(FeatureFlag::TxInvert));
    keyer.inhibit(false);
    keyer.send_char('E');
    keyer.release().key.release().done();
}
