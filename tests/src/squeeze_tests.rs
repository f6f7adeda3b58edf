//! Squeeze keying in Mode A and Mode B

use cw_keyer_core::test_utils::{mock_hal, KeyTrace, MockHal};
use cw_keyer_core::{Keyer, KeyerFlags, KeyerMode, Settings};
use rstest::rstest;

/// Ticks per dot-unit at 20 WPM
const UNIT: u32 = 12;

fn keyer(mode: KeyerMode, script: &[(u32, bool, bool)]) -> Keyer<MockHal> {
    let settings = Settings {
        wpm: 20,
        flags: KeyerFlags { mode, ..KeyerFlags::default() },
        ..Settings::default()
    };
    Keyer::new(mock_hal(script), settings)
}

/// Service the keyer for `ticks` heartbeats, collecting decoded characters
fn run(keyer: &mut Keyer<MockHal>, ticks: u32) -> String {
    (0..ticks).filter_map(|_| keyer.service()).collect()
}

fn glyphs(keyer: &Keyer<MockHal>) -> String {
    KeyTrace::new(keyer.hal().key.events(), true).glyphs(UNIT)
}

/// Both paddles from tick 0, released at `release`.
///
/// Elements start at ticks 2 (dit), 26 (dah), 74 (dit) and 98 (dah).
#[rstest]
#[case::mode_a_release_in_first(KeyerMode::ModeA, 10, ".")]
#[case::mode_b_release_in_first(KeyerMode::ModeB, 10, ".-")]
#[case::mode_a_release_in_second(KeyerMode::ModeA, 40, ".-")]
#[case::mode_b_release_in_second(KeyerMode::ModeB, 40, ".-.")]
#[case::mode_a_release_in_fourth(KeyerMode::ModeA, 100, ".-.-")]
#[case::mode_b_release_in_fourth(KeyerMode::ModeB, 100, ".-.-.")]
fn squeeze_release(#[case] mode: KeyerMode, #[case] release: u32, #[case] expected: &str) {
    let mut keyer = keyer(mode, &[(0, true, true), (release, false, false)]);
    run(&mut keyer, 300);

    assert_eq!(glyphs(&keyer), expected);
}

#[rstest]
#[case(KeyerMode::ModeA, "A")]
#[case(KeyerMode::ModeB, "R")]
fn squeeze_decodes_as_keyed(#[case] mode: KeyerMode, #[case] expected: &str) {
    let mut keyer = keyer(mode, &[(0, true, true), (40, false, false)]);
    assert_eq!(run(&mut keyer, 300), expected);
}

#[rstest]
fn held_squeeze_alternates(#[values(KeyerMode::ModeA, KeyerMode::ModeB)] mode: KeyerMode) {
    let mut keyer = keyer(mode, &[(0, true, true)]);
    run(&mut keyer, 2 + 6 * 4 * UNIT);

    assert!(glyphs(&keyer).starts_with(".-.-.-"));
}

#[rstest]
fn dah_first_squeeze_starts_with_dah(#[values(KeyerMode::ModeA, KeyerMode::ModeB)] mode: KeyerMode) {
    // Dah settles first, dit joins during the dah
    let mut keyer = keyer(mode, &[(0, false, true), (10, true, true), (30, false, false)]);
    run(&mut keyer, 300);

    assert_eq!(glyphs(&keyer), "-.");
}

#[rstest]
fn opposite_tap_during_element_is_remembered(#[values(KeyerMode::ModeA, KeyerMode::ModeB)] mode: KeyerMode) {
    // Dah held for one element, dit tapped and released while it sounds
    let mut keyer = keyer(mode, &[(0, false, true), (10, false, false), (15, true, false), (20, false, false)]);
    run(&mut keyer, 300);

    assert_eq!(glyphs(&keyer), "-.");
}

#[test]
fn alternating_squeeze_and_single_paddle_builds_c() {
    // Dah with the dit squeezed in, then dah alone again: -.-.
    let script = [(0, false, true), (20, true, true), (70, false, true), (100, true, true), (130, false, false)];
    let mut keyer = keyer(KeyerMode::ModeA, &script);

    assert_eq!(run(&mut keyer, 400), "C");
}

#[rstest]
fn second_paddle_joining_at_gap_end_keeps_held_dah(#[values(KeyerMode::ModeA, KeyerMode::ModeB)] mode: KeyerMode) {
    // Dit joins one tick before the gap after the first dah runs out.
    // The held dah still decides the second element while the squeeze settles.
    let mut keyer = keyer(mode, &[(0, false, true), (49, true, true), (75, false, false)]);
    let decoded = run(&mut keyer, 400);

    let trace = KeyTrace::new(keyer.hal().key.events(), true);
    assert_eq!(trace.marks, vec![(2, 3 * UNIT), (50, 3 * UNIT), (98, UNIT)]);
    assert_eq!(decoded, "G");
}
