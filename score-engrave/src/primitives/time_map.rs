//! Main "ruler" for cutting the beat line into bars.
use log::{debug, warn};

use super::{
    event::Event,
    fraction_tools::{frac, is_integer, is_power_of_two, zero},
    Beat, Key,
};

/// Bar duration with the beat-group unit.
///
/// 4/4 is `{duration: 4, divisor: 1}`, 6/8 is `{duration: 3, divisor: 3/2}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Meter {
    pub duration: Beat,
    pub divisor: Beat,
}
impl Meter {
    pub fn new(duration: Beat, divisor: Beat) -> Self {
        Self { duration, divisor }
    }
    pub fn common() -> Self {
        Self::new(frac(4, 1), frac(1, 1))
    }
    /// Beat group is a dotted value.
    pub fn is_compound(&self) -> bool {
        !is_power_of_two(&self.divisor)
    }
    /// Internal points, where long values are split and beams break.
    pub fn division_points(&self) -> Vec<Beat> {
        let mut points = Vec::new();
        if self.is_compound() {
            let mut point = self.divisor;
            while point < self.duration {
                points.push(point);
                point += self.divisor;
            }
            return points;
        }
        let beats = self.duration / self.divisor;
        if !is_integer(&beats) || beats < frac(4, 1) {
            return points;
        }
        let pair = self.divisor * frac(2, 1);
        let mut point = pair;
        let last = match beats.floor() == beats && is_even(&beats) {
            true => self.duration,
            // keep the final group of three
            false => self.duration - self.divisor * frac(3, 1) + pair,
        };
        while point < last {
            points.push(point);
            point += pair;
        }
        points
    }
    /// Numerator and denominator as printed.
    pub fn time_signature(&self) -> (u32, u32) {
        let grain = match self.is_compound() {
            true => self.divisor / frac(3, 1),
            false => self.divisor,
        };
        let numerator = self.duration / grain;
        let denominator = frac(4, 1) / grain;
        match (is_integer(&numerator), is_integer(&denominator)) {
            (true, true) => (
                super::fraction_tools::round(&numerator) as u32,
                super::fraction_tools::round(&denominator) as u32,
            ),
            _ => {
                // fall back to quarters, rounded up to 16ths
                let sixteenths = self.duration * frac(4, 1);
                (super::fraction_tools::round(&sixteenths) as u32, 16)
            }
        }
    }
}
impl Default for Meter {
    fn default() -> Self {
        Self::common()
    }
}

fn is_even(beats: &Beat) -> bool {
    super::fraction_tools::round(beats) % 2 == 0
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarInfo {
    pub index: usize,
    pub beat: Beat,
    pub meter: Meter,
    pub key: Key,
    pub meter_changed: bool,
    pub key_changed: bool,
}
impl BarInfo {
    pub fn end(&self) -> Beat {
        self.beat + self.meter.duration
    }
}

/// Bars covering the whole event list.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeMap {
    bars: Vec<BarInfo>,
}
impl TimeMap {
    /// Lay bars out from meter and key events.
    ///
    /// Meter and key changes take effect at the first barline at or after
    /// their beat. There is always at least one bar.
    pub fn from_events(events: &[Event], default_key: Key) -> Self {
        let end = events
            .iter()
            .map(|event| event.stop())
            .max()
            .unwrap_or_else(zero);
        let mut changes: Vec<&Event> = events
            .iter()
            .filter(|event| {
                matches!(event, Event::Meter { .. } | Event::Key { .. })
            })
            .collect();
        changes.sort_by(|a, b| a.start().cmp(&b.start()));
        let mut changes = changes.into_iter().peekable();

        let mut bars = Vec::new();
        let mut beat = zero();
        let mut meter = Meter::common();
        let mut key = default_key;
        loop {
            let (old_meter, old_key) = (meter, key);
            while let Some(change) = changes.next_if(|e| e.start() <= beat) {
                if change.start() < beat {
                    warn!(
                        "{} change at beat {} is not on a barline, \
                        moved to {}",
                        change.kind(),
                        change.start(),
                        beat
                    );
                }
                match change {
                    Event::Meter {
                        numerator_beats,
                        divisor,
                        ..
                    } => meter = Meter::new(*numerator_beats, *divisor),
                    Event::Key { tonic, .. } => key = *tonic,
                    _ => (),
                }
            }
            let index = bars.len();
            bars.push(BarInfo {
                index,
                beat,
                meter,
                key,
                meter_changed: index == 0 || meter != old_meter,
                key_changed: index == 0 || key != old_key,
            });
            beat += meter.duration;
            if beat >= end {
                break;
            }
        }
        debug!("time map of {} bars, end at {}", bars.len(), beat);
        Self { bars }
    }
    pub fn bars(&self) -> &[BarInfo] {
        &self.bars
    }
    pub fn end(&self) -> Beat {
        self.bars.last().map(BarInfo::end).unwrap_or_else(zero)
    }
    /// Index of the bar sounding at the beat.
    pub fn bar_index_at(&self, beat: Beat) -> Option<usize> {
        self.bars
            .iter()
            .position(|bar| bar.beat <= beat && beat < bar.end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::event::Pitch;

    fn note(start: Beat, duration: Beat) -> Event {
        Event::Note {
            start,
            pitch: Pitch::from_midi(60),
            velocity: 1.0,
            duration,
        }
    }

    #[test]
    fn test_division_points() {
        assert_eq!(Meter::common().division_points(), vec![frac(2, 1)]);
        assert!(Meter::new(frac(3, 1), frac(1, 1))
            .division_points()
            .is_empty());
        assert_eq!(
            Meter::new(frac(3, 1), frac(3, 2)).division_points(),
            vec![frac(3, 2)]
        );
        assert_eq!(
            Meter::new(frac(6, 1), frac(3, 2)).division_points(),
            vec![frac(3, 2), frac(3, 1), frac(9, 2)]
        );
        assert_eq!(
            Meter::new(frac(5, 1), frac(1, 1)).division_points(),
            vec![frac(2, 1)]
        );
        assert_eq!(
            Meter::new(frac(7, 1), frac(1, 1)).division_points(),
            vec![frac(2, 1), frac(4, 1)]
        );
        assert_eq!(
            Meter::new(frac(6, 1), frac(1, 1)).division_points(),
            vec![frac(2, 1), frac(4, 1)]
        );
    }

    #[test]
    fn test_time_signature() {
        assert_eq!(Meter::common().time_signature(), (4, 4));
        assert_eq!(
            Meter::new(frac(3, 1), frac(3, 2)).time_signature(),
            (6, 8)
        );
        assert_eq!(
            Meter::new(frac(4, 1), frac(2, 1)).time_signature(),
            (2, 2)
        );
        assert_eq!(
            Meter::new(frac(3, 1), frac(1, 1)).time_signature(),
            (3, 4)
        );
        assert_eq!(
            Meter::new(frac(7, 2), frac(1, 2)).time_signature(),
            (7, 8)
        );
    }

    #[test]
    fn test_time_map() {
        let events = vec![
            Event::Meter {
                start: zero(),
                numerator_beats: frac(3, 1),
                divisor: frac(1, 1),
            },
            note(zero(), frac(5, 1)),
            Event::Key {
                start: frac(4, 1),
                tonic: Key::new(-1).unwrap(),
            },
        ];
        let map = TimeMap::from_events(&events, Key::C);
        assert_eq!(map.bars().len(), 2);
        assert_eq!(map.bars()[1].beat, frac(3, 1));
        assert_eq!(map.bars()[0].key, Key::C);
        assert_eq!(map.end(), frac(6, 1));
        assert_eq!(map.bar_index_at(frac(4, 1)), Some(1));
        assert_eq!(map.bar_index_at(frac(6, 1)), None);

        let map = TimeMap::from_events(
            &[note(zero(), frac(8, 1)), note(frac(8, 1), frac(1, 1))],
            Key::C,
        );
        assert_eq!(map.bars().len(), 3);
        assert!(map.bars()[0].meter_changed);
        assert!(!map.bars()[1].meter_changed);
    }

    #[test]
    fn test_empty_time_map() {
        let map = TimeMap::from_events(&[], Key::C);
        assert_eq!(map.bars().len(), 1);
        assert_eq!(map.end(), frac(4, 1));
    }
}
