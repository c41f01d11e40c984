use std::fmt;

use fraction::Fraction;
use itertools::Itertools;

use super::{
    fraction_tools::zero,
    symbol::{NoteSymbol, RestSymbol, Symbol},
    time_map::{BarInfo, Meter},
    Beat, Key,
};

/// Recoverable problem, found while engraving the bar.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// No legal value fits the span, so it was written approximately.
    UnfittableDuration { beat: Beat, duration: Beat },
    /// The stave has no place for the pitch, the head was omitted.
    UnsupportedPitch { beat: Beat, pitch: String },
}
impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnfittableDuration { beat, duration } => write!(
                f,
                "duration {} at beat {} has no legal value",
                duration, beat
            ),
            Self::UnsupportedPitch { beat, pitch } => {
                write!(f, "pitch {} at beat {} is not supported", pitch, beat)
            }
        }
    }
}

/// One bar of one part.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub index: usize,
    /// Absolute start.
    pub beat: Beat,
    pub duration: Beat,
    pub divisor: Beat,
    pub key: Key,
    pub meter: Meter,
    pub meter_changed: bool,
    pub key_changed: bool,
    pub divisions: Vec<Beat>,
    pub symbols: Vec<Symbol>,
    pub diagnostics: Vec<Diagnostic>,
}
impl Bar {
    pub fn new(info: &BarInfo) -> Self {
        Self {
            index: info.index,
            beat: info.beat,
            duration: info.meter.duration,
            divisor: info.meter.divisor,
            key: info.key,
            meter: info.meter,
            meter_changed: info.meter_changed,
            key_changed: info.key_changed,
            divisions: info.meter.division_points(),
            symbols: Vec::new(),
            diagnostics: Vec::new(),
        }
    }
    /// Standalone bar at beat 0.
    pub fn from_meter(meter: Meter, key: Key) -> Self {
        Self::new(&BarInfo {
            index: 0,
            beat: zero(),
            meter,
            key,
            meter_changed: true,
            key_changed: true,
        })
    }
    pub fn is_compound(&self) -> bool {
        self.meter.is_compound()
    }
    /// Some symbols were written approximately.
    pub fn is_approximate(&self) -> bool {
        !self.diagnostics.is_empty()
    }
    /// The last division point (or the bar start) not after the beat.
    pub fn previous_division(&self, beat: Beat) -> Beat {
        self.divisions
            .iter()
            .copied()
            .filter(|point| *point <= beat)
            .last()
            .unwrap_or_else(zero)
    }
    /// The first division point after the beat.
    pub fn next_division(&self, beat: Beat) -> Option<Beat> {
        self.divisions.iter().copied().find(|point| *point > beat)
    }
    /// Division point strictly inside the span.
    pub fn crosses_division(&self, start: Beat, stop: Beat) -> bool {
        self.divisions
            .iter()
            .any(|point| start < *point && *point < stop)
    }
    pub fn push(&mut self, symbol: Symbol) {
        self.symbols.push(symbol);
    }
    pub fn notes(&self) -> impl Iterator<Item = &NoteSymbol> {
        self.symbols.iter().filter_map(Symbol::as_note)
    }
    pub fn rests(&self) -> impl Iterator<Item = &RestSymbol> {
        self.symbols.iter().filter_map(Symbol::as_rest)
    }
    /// Sum of rests and notes, chord heads counted once per onset.
    pub fn rhythm_total(&self) -> Beat {
        let rests = self
            .rests()
            .fold(zero(), |total, rest| total + rest.duration);
        self.notes()
            .map(|note| (note.beat, note.duration))
            .dedup_by(|a, b| a.0 == b.0)
            .fold(rests, |total: Fraction, (_, duration)| total + duration)
    }
}
