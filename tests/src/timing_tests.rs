//! Transmitter timing and speed model properties

use cw_keyer_core::morse::{self, CODEBOOK};
use cw_keyer_core::test_utils::{mock_hal, KeyTrace, MockHal};
use cw_keyer_core::timing::{self, Speed};
use cw_keyer_core::{Direction, Keyer, Settings, MAX_WPM, MIN_WPM};
use proptest::prelude::*;
use proptest::sample::select;

fn keyer(wpm: u8, farnsworth: u8) -> Keyer<MockHal> {
    let mut keyer = Keyer::new(mock_hal(&[]), Settings { wpm, farnsworth, ..Settings::default() });
    keyer.hal_mut().key.clear();
    keyer
}

#[test]
fn e_at_twenty_wpm() {
    let mut keyer = keyer(20, 0);
    keyer.send_char('E');

    // 60 ms key-down, then 180 ms until the next character may start
    let trace = KeyTrace::new(keyer.hal().key.events(), true);
    assert_eq!(trace.marks, vec![(0, 12)]);
    assert_eq!(keyer.hal().clock.now() * 5, 240);
}

#[test]
fn paris_is_fifty_units() {
    let mut keyer = keyer(20, 0);
    keyer.send_string("PARIS ");

    assert_eq!(keyer.hal().clock.now(), 50 * 12);
}

#[test]
fn unit_length_shrinks_with_speed() {
    for wpm in MIN_WPM..MAX_WPM {
        assert!(timing::unit_ticks(wpm) >= timing::unit_ticks(wpm + 1), "at {wpm} WPM");
    }
}

proptest! {
    #[test]
    fn speed_always_within_bounds(wpm in any::<u8>(), farnsworth in any::<u8>()) {
        let speed = Speed::new(wpm, farnsworth);
        prop_assert!((MIN_WPM..=MAX_WPM).contains(&speed.wpm()));
        prop_assert_eq!(speed.farnsworth(), farnsworth);
        prop_assert!(speed.unit() >= 1);
    }

    #[test]
    fn adjustments_stay_clamped(
        wpm in MIN_WPM..=MAX_WPM,
        steps in prop::collection::vec(prop_oneof![Just(Direction::Increase), Just(Direction::Decrease)], 0..120),
    ) {
        let mut speed = Speed::new(wpm, 0);
        let mut expected_farnsworth = 0u8;
        for direction in steps {
            let wpm = speed.adjust_wpm(direction);
            prop_assert!((MIN_WPM..=MAX_WPM).contains(&wpm));
            prop_assert_eq!(speed.unit(), timing::unit_ticks(wpm));

            expected_farnsworth = match direction {
                Direction::Increase => expected_farnsworth.saturating_add(1),
                Direction::Decrease => expected_farnsworth.saturating_sub(1),
            };
            prop_assert_eq!(speed.adjust_farnsworth(direction), expected_farnsworth);
        }
    }

    #[test]
    fn character_time_matches_unit_count(
        entry in select(&CODEBOOK[..]),
        wpm in MIN_WPM..=MAX_WPM,
        farnsworth in 0u8..8,
    ) {
        let (c, pattern) = entry;
        let mut keyer = keyer(wpm, farnsworth);
        keyer.send_char(c);

        let unit = keyer.speed().unit() as u32;
        let element_units: u32 = pattern.elements().map(|e| e.duration_units() as u32 + 1).sum();
        let expected = element_units + 2 + farnsworth as u32;
        prop_assert_eq!(keyer.hal().clock.now(), expected * unit);

        let trace = KeyTrace::new(keyer.hal().key.events(), true);
        prop_assert_eq!(trace.marks.len(), pattern.len() as usize);
        prop_assert_eq!(morse::decode(pattern), Some(c));
    }
}
