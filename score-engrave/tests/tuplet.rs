use itertools::Itertools;
use score_engrave::{
    engrave::{detect, tuplet::score_candidate, Onset},
    primitives::{frac, Beat},
};

fn legato(starts: &[Beat], end: Beat) -> Vec<Onset> {
    starts
        .iter()
        .copied()
        .chain([end])
        .tuple_windows()
        .map(|(start, stop)| Onset::new(start, stop))
        .collect()
}

#[test]
fn even_thirds_prefer_three() {
    let onsets = legato(&[frac(0, 1), frac(1, 3), frac(2, 3)], frac(1, 1));
    let score = |divisor| {
        score_candidate(&onsets, frac(0, 1), frac(1, 1), divisor).unwrap()
    };
    assert!(score(3) > score(2));
    assert!(score(3) > score(4));
}

#[test]
fn quintuplet_in_a_beat() {
    let starts = (0..5).map(|idx| frac(idx, 5)).collect_vec();
    let onsets = legato(&starts, frac(1, 1));
    let found = detect(&onsets, frac(0, 1), frac(4, 1), false).unwrap();
    assert_eq!((found.beat, found.duration), (frac(0, 1), frac(1, 1)));
    assert_eq!(found.divisor, 5);
    assert_eq!(found.rhythm, 0b11111);
    assert!(!found.is_straight());
    assert_eq!(found.ratio().normal, 4);
}

#[test]
fn sixteenths_are_straight() {
    let starts = (0..4).map(|idx| frac(idx, 4)).collect_vec();
    let onsets = legato(&starts, frac(1, 1));
    let found = detect(&onsets, frac(0, 1), frac(4, 1), false).unwrap();
    assert!(found.is_straight());
}

#[test]
fn nothing_to_detect() {
    assert!(detect(&[], frac(0, 1), frac(4, 1), false).is_none());
    let late = legato(&[frac(1, 1)], frac(2, 1));
    assert!(detect(&late, frac(2, 1), frac(2, 1), false).is_none());
}
