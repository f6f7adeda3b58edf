//! Single-paddle keying, element timing and settings that shape the output

use cw_keyer_core::test_utils::{mock_hal, KeyTrace, MockHal};
use cw_keyer_core::{timing, FeatureFlag, Keyer, KeyerMode, KeyerState, Settings};
use rstest::rstest;

fn keyer(wpm: u8, script: &[(u32, bool, bool)]) -> Keyer<MockHal> {
    Keyer::new(mock_hal(script), Settings { wpm, ..Settings::default() })
}

fn run(keyer: &mut Keyer<MockHal>, ticks: u32) -> String {
    (0..ticks).filter_map(|_| keyer.service()).collect()
}

fn trace(keyer: &Keyer<MockHal>) -> KeyTrace {
    KeyTrace::new(keyer.hal().key.events(), true)
}

#[rstest]
#[case(5)]
#[case(13)]
#[case(20)]
#[case(50)]
fn held_dit_repeats_at_one_unit(#[case] wpm: u8) {
    let unit = timing::unit_ticks(wpm) as u32;
    let mut keyer = keyer(wpm, &[(0, true, false)]);
    run(&mut keyer, 2 + 10 * unit);

    let trace = trace(&keyer);
    assert!(trace.marks.len() >= 4);
    assert!(trace.durations().iter().all(|&d| d == unit));
    assert!(trace.gaps().iter().all(|&g| g == unit));
}

#[rstest]
#[case(5)]
#[case(20)]
#[case(50)]
fn held_dah_is_three_units(#[case] wpm: u8) {
    let unit = timing::unit_ticks(wpm) as u32;
    let mut keyer = keyer(wpm, &[(0, false, true)]);
    run(&mut keyer, 2 + 9 * unit);

    let trace = trace(&keyer);
    assert_eq!(trace.durations(), vec![3 * unit; 2]);
    assert_eq!(trace.gaps(), vec![unit]);
}

#[rstest]
#[case::dit(true, false, "E")]
#[case::dah(false, true, "T")]
fn tap_decodes_single_element(#[case] dit: bool, #[case] dah: bool, #[case] expected: &str) {
    let mut keyer = keyer(20, &[(0, dit, dah), (5, false, false)]);
    assert_eq!(run(&mut keyer, 200), expected);
    assert_eq!(keyer.fsm_state(), KeyerState::Idle);
}

#[test]
fn pause_shorter_than_character_gap_joins_elements() {
    // Second tap lands inside the character gap: ".." = I
    let mut keyer = keyer(20, &[(0, true, false), (5, false, false), (30, true, false), (35, false, false)]);
    assert_eq!(run(&mut keyer, 200), "I");
}

#[test]
fn pause_after_character_gap_starts_new_character() {
    // Second tap after the character gap: two separate E
    let mut keyer = keyer(20, &[(0, true, false), (5, false, false), (60, true, false), (65, false, false)]);
    assert_eq!(run(&mut keyer, 200), "EE");
}

#[test]
fn contact_bounce_is_ignored() {
    // One-tick bounces on the dah contact never produce an element
    let mut keyer = keyer(20, &[(0, false, true), (1, false, false), (3, false, true), (4, false, false)]);
    run(&mut keyer, 100);

    assert!(trace(&keyer).marks.is_empty());
}

#[test]
fn mode_switch_applies_to_next_squeeze() {
    let mut keyer = keyer(20, &[(0, true, true), (40, false, false)]);
    assert!(keyer.set_mode(KeyerMode::ModeA));
    assert_eq!(run(&mut keyer, 300), "A");
}

#[rstest]
fn swapped_paddles_exchange_elements(#[values(false, true)] swap: bool) {
    let mut keyer = keyer(20, &[(0, true, false), (5, false, false)]);
    if swap {
        assert!(keyer.toggle_flag(FeatureFlag::PaddleSwap));
    }
    let expected = if swap { "T" } else { "E" };
    assert_eq!(run(&mut keyer, 200), expected);
}

#[test]
fn sidetone_follows_key_at_configured_pitch() {
    let mut keyer = keyer(20, &[(0, false, true), (5, false, false)]);
    run(&mut keyer, 100);

    let sidetone = keyer.hal().sidetone.events();
    assert!(sidetone.contains(&(2, Some(800))));
    assert!(sidetone.contains(&(38, None)));
    assert!(!keyer.hal().sidetone.is_sounding());
}
