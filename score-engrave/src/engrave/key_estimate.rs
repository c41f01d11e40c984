//! Local key centres by Viterbi decoding over the twelve major keys.
//!
//! States are tonic pitch classes. The transition row favours small steps
//! on the circle of fifths, and each onset is scored by how diatonic its
//! sounding pitch classes are in every key.

use std::collections::BTreeSet;

use itertools::Itertools;
use log::debug;
use once_cell::sync::Lazy;

use crate::primitives::{parse_note_name, Beat, Event, Key};

const KEYS: usize = 12;
/// Relative weight of a step by 0..=6 fifths.
const FIFTHS_WEIGHTS: [f64; 7] = [32.0, 8.0, 4.0, 2.0, 1.0, 1.0, 1.0];
const MAJOR_SCALE: [usize; 7] = [0, 2, 4, 5, 7, 9, 11];
const DIATONIC_PROBABILITY: f64 = 0.9 / 7.0;
const CHROMATIC_PROBABILITY: f64 = 0.1 / 5.0;

fn fifths_distance(from: usize, to: usize) -> usize {
    let steps = ((to + KEYS - from) * 7) % KEYS;
    steps.min(KEYS - steps)
}

/// Log-probabilities of moving from key to key.
static TRANSITIONS: Lazy<[[f64; KEYS]; KEYS]> = Lazy::new(|| {
    let row: Vec<f64> = (0..KEYS)
        .map(|to| FIFTHS_WEIGHTS[fifths_distance(0, to)])
        .collect();
    let total: f64 = row.iter().sum();
    let mut matrix = [[0.0; KEYS]; KEYS];
    for (from, targets) in matrix.iter_mut().enumerate() {
        for (to, cell) in targets.iter_mut().enumerate() {
            *cell = (row[(to + KEYS - from) % KEYS] / total).ln();
        }
    }
    matrix
});

fn emission(key: usize, pitch_classes: &BTreeSet<usize>) -> f64 {
    pitch_classes
        .iter()
        .map(|pc| {
            match MAJOR_SCALE.contains(&((pc + KEYS - key) % KEYS)) {
                true => DIATONIC_PROBABILITY.ln(),
                false => CHROMATIC_PROBABILITY.ln(),
            }
        })
        .sum()
}

/// Key centre for every distinct onset.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct KeyEstimate {
    beats: Vec<Beat>,
    centres: Vec<usize>,
}
impl KeyEstimate {
    /// Tonic pitch classes, one per onset.
    pub fn path(&self) -> &[usize] {
        &self.centres
    }
    pub fn onsets(&self) -> &[Beat] {
        &self.beats
    }
    pub fn is_empty(&self) -> bool {
        self.centres.is_empty()
    }
    /// Key of the latest onset at or before the absolute beat.
    pub fn key_at(&self, beat: Beat) -> Option<Key> {
        let idx = self.beats.partition_point(|onset| *onset <= beat);
        match idx {
            0 => self.centres.first(),
            idx => self.centres.get(idx - 1),
        }
        .map(|centre| Key::from_pitch_class(*centre))
    }
}

fn pitch_classes(event: &Event) -> Vec<usize> {
    match event {
        Event::Note { pitch, .. } => pitch
            .number
            .map(|n| vec![n.rem_euclid(12) as usize])
            .unwrap_or_default(),
        Event::Chord {
            root, extension, ..
        } => match parse_note_name(root) {
            Ok((letter, accidental)) => {
                let root =
                    (letter.pitch_class() + accidental as i32).rem_euclid(12);
                let third = match extension.starts_with('m')
                    && !extension.starts_with("maj")
                {
                    true => 3,
                    false => 4,
                };
                [0, third, 7]
                    .iter()
                    .map(|step| ((root + step) % 12) as usize)
                    .collect()
            }
            Err(_) => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Decode the most likely key path.
///
/// Onsets are the distinct starts of notes and chords; the pitch classes
/// sounding at an onset are its emission. Empty input gives an empty path.
pub fn estimate(events: &[Event]) -> KeyEstimate {
    let sounding = events
        .iter()
        .filter(|event| !pitch_classes(event).is_empty())
        .collect_vec();
    let beats = sounding
        .iter()
        .map(|event| event.start())
        .sorted()
        .dedup()
        .collect_vec();
    if beats.is_empty() {
        return KeyEstimate::default();
    }
    let observations = beats
        .iter()
        .map(|beat| {
            sounding
                .iter()
                .filter(|event| {
                    event.start() <= *beat
                        && (*beat < event.stop() || event.start() == *beat)
                })
                .flat_map(|event| pitch_classes(event))
                .collect::<BTreeSet<usize>>()
        })
        .collect_vec();

    let initial = (1.0 / KEYS as f64).ln();
    let mut scores: Vec<f64> = (0..KEYS)
        .map(|key| initial + emission(key, &observations[0]))
        .collect();
    let mut back: Vec<[usize; KEYS]> = Vec::with_capacity(beats.len());
    for observation in observations.iter().skip(1) {
        let mut next = vec![f64::NEG_INFINITY; KEYS];
        let mut pointers = [0; KEYS];
        for to in 0..KEYS {
            for from in 0..KEYS {
                let score = scores[from] + TRANSITIONS[from][to];
                if score > next[to] {
                    next[to] = score;
                    pointers[to] = from;
                }
            }
            next[to] += emission(to, observation);
        }
        back.push(pointers);
        scores = next;
    }
    let mut state = (0..KEYS)
        .fold(0, |best, key| match scores[key] > scores[best] {
            true => key,
            false => best,
        });
    let mut centres = vec![state];
    for pointers in back.iter().rev() {
        state = pointers[state];
        centres.push(state);
    }
    centres.reverse();
    debug!(
        "estimated key centres: {:?}",
        centres.iter().dedup().collect_vec()
    );
    KeyEstimate { beats, centres }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{frac, Pitch};

    fn note(start: i64, pitch: i32) -> Event {
        Event::Note {
            start: frac(start, 1),
            pitch: Pitch::from_midi(pitch),
            velocity: 1.0,
            duration: frac(1, 1),
        }
    }

    #[test]
    fn test_transitions() {
        assert_eq!(fifths_distance(0, 7), 1);
        assert_eq!(fifths_distance(0, 6), 6);
        assert_eq!(fifths_distance(2, 9), 1);
        assert!(TRANSITIONS[0][0] > TRANSITIONS[0][7]);
        assert!(TRANSITIONS[0][7] > TRANSITIONS[0][2]);
        assert_eq!(TRANSITIONS[3][10], TRANSITIONS[0][7]);
        let total: f64 = TRANSITIONS[5].iter().map(|p| p.exp()).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty() {
        let estimate = estimate(&[]);
        assert!(estimate.is_empty());
        assert_eq!(estimate.key_at(frac(0, 1)), None);
    }

    #[test]
    fn test_g_major_scale() {
        let events = [67, 69, 71, 72, 74, 76, 78, 79]
            .iter()
            .enumerate()
            .map(|(idx, pitch)| note(idx as i64, *pitch))
            .collect_vec();
        let estimate = estimate(&events);
        assert_eq!(estimate.path().len(), 8);
        assert!(estimate.path().iter().all(|centre| *centre == 7));
        assert_eq!(estimate.key_at(frac(3, 1)), Key::new(1).ok());
    }

    #[test]
    fn test_chord_pitch_classes() {
        let chord = Event::Chord {
            start: frac(0, 1),
            root: "Bb".to_string(),
            extension: "m7".to_string(),
            duration: frac(4, 1),
        };
        assert_eq!(pitch_classes(&chord), vec![10, 1, 5]);
    }
}
