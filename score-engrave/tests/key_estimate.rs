use score_engrave::{
    engrave::estimate,
    primitives::{frac, parse_events_str, Key},
};

const TUNE: &str = r#"[
    [0, "note", "D4", 0.5, 1],
    [1, "note", "F#4", 0.5, 1],
    [2, "note", "A4", 0.5, 1],
    [3, "note", "C#5", 0.5, 1],
    [4, "chord", "G", "", 4],
    [4, "note", "B4", 0.5, 2],
    [6, "note", "E5", 0.5, 2],
    [8, "note", "D5", 0.5, 4]
]"#;

#[test]
fn estimate_is_deterministic() {
    let events = parse_events_str(TUNE).unwrap();
    let first = estimate(&events);
    for _ in 0..5 {
        assert_eq!(estimate(&events), first);
    }
    assert_eq!(first.onsets().len(), 7);
    assert_eq!(first.key_at(frac(5, 1)), first.key_at(frac(4, 1)));
}

#[test]
fn scale_of_d_major() {
    let events = parse_events_str(TUNE).unwrap();
    let keys = estimate(&events);
    assert!(keys.path().iter().all(|centre| *centre == 2));
    assert_eq!(keys.key_at(frac(9, 1)), Some(Key::new(2).unwrap()));
}

#[test]
fn nothing_sounds() {
    let events =
        parse_events_str(r#"[[0, "key", "F"], [0, "lyric", "oh", 1]]"#)
            .unwrap();
    let keys = estimate(&events);
    assert!(keys.is_empty());
    assert_eq!(keys.key_at(frac(0, 1)), None);
}
