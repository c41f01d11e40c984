//! Guessing tuplet groups from onset positions.
//!
//! Every candidate window is split into `divisor` equal divisions, and each
//! event start and stop is weighed by how close it falls to a division
//! line. The simplest grid explaining the rhythm wins. This is a
//! best-effort classification and can be wrong about intent.

use std::f64::consts::PI;

use itertools::Itertools;
use log::debug;

use crate::primitives::{
    fraction_tools::{ceil_to, floor_to, is_power_of_two, round, to_f64},
    frac, Beat, TupletRatio,
};

/// Divisors tried for every window. 1 stands for the undivided window.
pub const DIVISORS: [u32; 8] = [1, 2, 3, 4, 5, 6, 7, 9];
const STOP_WEIGHT: f64 = 0.4;
const DIVISOR_PENALTY: f64 = 0.01;

/// Onset with its stop, relative to the bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Onset {
    pub start: Beat,
    pub stop: Beat,
}
impl Onset {
    pub fn new(start: Beat, stop: Beat) -> Self {
        Self { start, stop }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TupletMatch {
    pub beat: Beat,
    pub duration: Beat,
    pub divisor: u32,
    /// Bit `n` is set when division `n` has an onset.
    pub rhythm: u32,
    pub score: f64,
}
impl TupletMatch {
    pub fn division(&self) -> Beat {
        self.duration / frac(self.divisor as i64, 1)
    }
    pub fn end(&self) -> Beat {
        self.beat + self.duration
    }
    /// Divisions are plain written values, no bracket needed.
    pub fn is_straight(&self) -> bool {
        self.divisor == 1 || is_power_of_two(&self.division())
    }
    /// Long-short pair over a triplet grid.
    pub fn is_swing(&self) -> bool {
        self.divisor == 3 && self.rhythm == 0b101
    }
    pub fn ratio(&self) -> TupletRatio {
        TupletRatio {
            actual: self.divisor,
            normal: normal_notes(&self.duration, self.divisor),
        }
    }
    /// Written value of one division.
    pub fn written_division(&self) -> Beat {
        self.duration / frac(self.ratio().normal as i64, 1)
    }
}

/// How many plain values the window holds.
///
/// Power of two windows hold powers of two (3:2, 5:4, 9:8), dotted windows
/// hold three times a power of two (2:3, 4:3, 7:6).
pub fn normal_notes(duration: &Beat, divisor: u32) -> u32 {
    let base = match is_power_of_two(duration) {
        true => 1,
        false => 3,
    };
    let mut normal = base;
    while normal * 2 < divisor {
        normal *= 2;
    }
    normal
}

/// Raised cosine weight of a position, zero from a quarter division away.
fn weight(position: Beat, beat: Beat, division: Beat) -> f64 {
    let phase = to_f64(&((position - beat) / division));
    let offset = phase - phase.round();
    match offset.abs() < 0.25 {
        true => 0.5 * (1.0 + (2.0 * PI * offset).cos()),
        false => 0.0,
    }
}

fn division_index(position: Beat, beat: Beat, division: Beat) -> i64 {
    round(&((position - beat) / division))
}

/// Score of one window split by the divisor.
///
/// `None` when the window holds no onsets, or the grid leaves holes too
/// large to be a real group.
pub fn score_candidate(
    onsets: &[Onset],
    beat: Beat,
    duration: Beat,
    divisor: u32,
) -> Option<f64> {
    let end = beat + duration;
    let inside = onsets
        .iter()
        .filter(|onset| onset.start >= beat && onset.start < end)
        .collect_vec();
    if inside.is_empty() {
        return None;
    }
    let division = duration / frac(divisor as i64, 1);
    if divisor > 4 && has_holes(&inside, beat, division) {
        return None;
    }
    let (mut explained, mut possible) = (0.0, 0.0);
    for onset in inside {
        explained += weight(onset.start, beat, division);
        possible += 1.0;
        if onset.stop <= end {
            explained += STOP_WEIGHT * weight(onset.stop, beat, division);
        }
        possible += STOP_WEIGHT;
    }
    Some(explained / possible - DIVISOR_PENALTY * divisor as f64)
}

fn has_holes(inside: &[&Onset], beat: Beat, division: Beat) -> bool {
    inside
        .iter()
        .map(|onset| division_index(onset.start, beat, division))
        .sorted()
        .dedup()
        .tuple_windows()
        .any(|(a, b)| b - a > 2)
}

fn rhythm(
    onsets: &[Onset],
    beat: Beat,
    duration: Beat,
    divisor: u32,
) -> u32 {
    let division = duration / frac(divisor as i64, 1);
    let end = beat + duration;
    onsets
        .iter()
        .filter(|onset| onset.start >= beat && onset.start < end)
        .map(|onset| division_index(onset.start, beat, division))
        .filter(|idx| (0..divisor as i64).contains(idx))
        .fold(0, |mask, idx| mask | 1 << idx)
}

/// Plain windows from half a beat up to the window, with dotted ones from
/// a beat and a half in compound meters. Longest first.
fn candidate_durations(window: Beat, compound: bool) -> Vec<Beat> {
    let mut bases = vec![frac(1, 2)];
    if compound {
        bases.push(frac(3, 2));
    }
    bases
        .into_iter()
        .flat_map(|base| {
            itertools::iterate(base, |duration| *duration * frac(2, 1))
                .take_while(move |duration| *duration <= window)
        })
        .sorted_by(|a, b| b.cmp(a))
        .collect()
}

/// Window starts between the cursor and the first onset, on the grid of
/// half the duration.
fn candidate_starts(
    duration: Beat,
    window_start: Beat,
    first_onset: Beat,
) -> Vec<Beat> {
    let grid = duration / frac(2, 1);
    [
        ceil_to(window_start, duration),
        ceil_to(window_start, grid),
        floor_to(first_onset, duration),
        floor_to(first_onset, grid),
    ]
    .into_iter()
    .filter(|start| *start >= window_start && *start <= first_onset)
    .sorted()
    .dedup()
    .collect()
}

/// Find the best (duration, divisor, start) for onsets after the cursor.
///
/// The result may be straight: callers open a bracket only for
/// [TupletMatch::is_straight] being false. Ties keep the longer window,
/// then the earlier start, then the smaller divisor.
pub fn detect(
    onsets: &[Onset],
    window_start: Beat,
    window_duration: Beat,
    compound: bool,
) -> Option<TupletMatch> {
    let window_end = window_start + window_duration;
    let first_onset = onsets
        .iter()
        .map(|onset| onset.start)
        .filter(|start| *start >= window_start)
        .min()?;
    let mut best: Option<TupletMatch> = None;
    for duration in candidate_durations(window_duration, compound) {
        for beat in candidate_starts(duration, window_start, first_onset) {
            if beat + duration > window_end {
                continue;
            }
            for divisor in DIVISORS {
                let score =
                    match score_candidate(onsets, beat, duration, divisor) {
                        Some(score) if score > 0.0 => score,
                        _ => continue,
                    };
                if best.as_ref().map_or(true, |best| score > best.score) {
                    best = Some(TupletMatch {
                        beat,
                        duration,
                        divisor,
                        rhythm: rhythm(onsets, beat, duration, divisor),
                        score,
                    });
                }
            }
        }
    }
    if let Some(found) = &best {
        debug!(
            "tuplet candidate {}/{} at {} scored {:.3}",
            found.duration, found.divisor, found.beat, found.score
        );
    }
    best
}

/// Divisions of a triplet swing pair, moved to the straight grid.
pub(crate) fn swing_index(index: i64) -> i64 {
    (index + 1) / 2
}

pub(crate) fn is_swing_window(duration: &Beat) -> bool {
    *duration == frac(1, 1) || *duration == frac(1, 2)
}
