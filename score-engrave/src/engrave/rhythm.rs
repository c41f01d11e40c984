//! Choosing one legal written value for a span of the bar.

use std::collections::BTreeSet;

use crate::primitives::{
    fraction_tools::largest_power_of_two_dividing, frac, Bar, Beat,
};

/// Pick the written value for the span `start..stop` of the bar.
///
/// `stop` is bounded by the bar end and by `next_event`, when it comes
/// after `start`. The whole span is taken when it is legal and does not
/// syncopate against the grain of `start` (the largest power of two
/// dividing the distance from the previous division point). Otherwise the
/// span is cut at the next division point and at the end of the grain,
/// and the longest legal value that fits is taken.
///
/// Spans shorter than every legal value are clamped up to the shortest
/// one; the caller decides how to report that.
///
/// ```
/// # use score_engrave::primitives::{frac, Bar, Meter, Key};
/// # use score_engrave::settings::default_rest_durations;
/// # use score_engrave::engrave::rhythm::fit_duration;
/// let bar = Bar::from_meter(Meter::common(), Key::C);
/// let rests = default_rest_durations();
/// let fit = |start, stop| fit_duration(&rests, &bar, start, stop, None);
/// assert_eq!(fit(frac(1, 1), frac(3, 1)), frac(2, 1));
/// assert_eq!(fit(frac(1, 1), frac(4, 1)), frac(1, 1));
/// ```
pub fn fit_duration(
    durations: &BTreeSet<Beat>,
    bar: &Bar,
    start: Beat,
    stop: Beat,
    next_event: Option<Beat>,
) -> Beat {
    let minimum = match durations.iter().next() {
        Some(minimum) => *minimum,
        None => return stop - start,
    };
    let mut stop = stop.min(bar.duration);
    if let Some(next) = next_event {
        if next > start {
            stop = stop.min(next);
        }
    }
    if stop - start < minimum {
        return minimum;
    }
    let span = stop - start;
    let offset = start - bar.previous_division(start);
    let grain = match offset == frac(0, 1) {
        true => None,
        false => {
            Some(largest_power_of_two_dividing(&offset).unwrap_or(minimum))
        }
    };
    // compound beat groups are not crossed from inside
    let crosses_group = grain.is_some()
        && bar.is_compound()
        && bar.crosses_division(start, stop);
    if durations.contains(&span)
        && !crosses_group
        && grain.map_or(true, |grain| span <= grain * frac(2, 1))
    {
        return span;
    }
    let mut limit = stop;
    if let Some(division) = bar.next_division(start) {
        limit = limit.min(division);
    }
    if let Some(grain) = grain {
        limit = limit.min(start + grain);
    }
    durations
        .range(..=limit - start)
        .next_back()
        .copied()
        .unwrap_or(minimum)
}
