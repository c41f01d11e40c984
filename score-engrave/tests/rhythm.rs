use score_engrave::{
    engrave::fit_duration,
    primitives::{fraction_tools::round, frac, Bar, Key, Meter},
    settings::{default_head_durations, default_rest_durations},
};

/// Every span of the 16th grid splits into legal values without a gap.
#[test]
fn sixteenth_grid_is_complete() {
    for meter in [
        Meter::common(),
        Meter::new(frac(3, 1), frac(1, 1)),
        Meter::new(frac(3, 1), frac(3, 2)),
    ] {
        let bar = Bar::from_meter(meter, Key::C);
        let steps = round(&(meter.duration * frac(4, 1)));
        for table in [default_rest_durations(), default_head_durations()] {
            for from in 0..steps {
                for to in from + 1..=steps {
                    let stop = frac(to, 4);
                    let mut cursor = frac(from, 4);
                    while cursor < stop {
                        let fit =
                            fit_duration(&table, &bar, cursor, stop, None);
                        assert!(table.contains(&fit), "{} at {}", fit, cursor);
                        assert!(cursor + fit <= stop, "{} at {}", fit, cursor);
                        cursor += fit;
                    }
                    assert_eq!(cursor, stop);
                }
            }
        }
    }
}

#[test]
fn next_event_bounds_the_value() {
    let bar = Bar::from_meter(Meter::common(), Key::C);
    let heads = default_head_durations();
    let fit =
        fit_duration(&heads, &bar, frac(0, 1), frac(4, 1), Some(frac(1, 2)));
    assert_eq!(fit, frac(1, 2));
}

#[test]
fn short_spans_are_clamped() {
    let bar = Bar::from_meter(Meter::common(), Key::C);
    let rests = default_rest_durations();
    let fit = fit_duration(&rests, &bar, frac(0, 1), frac(1, 48), None);
    assert_eq!(fit, frac(1, 16));
}
