//! Engraved symbols, appended to a bar in one forward pass.
//!
//! All beats are relative to the bar start.

use crate::notation::{Articulation, Clef, NoteHead};

use super::{Beat, Letter, Spelling};

/// `actual` notes in the time of `normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TupletRatio {
    pub actual: u32,
    pub normal: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NoteSymbol {
    pub beat: Beat,
    pub duration: Beat,
    pub pitch: i32,
    pub spelling: Spelling,
    pub row: i32,
    pub part: usize,
    pub stem_up: bool,
    /// Highest head of the chord.
    pub top: bool,
    /// Lowest head of the chord.
    pub bottom: bool,
    pub tie_start: bool,
    pub tie_stop: bool,
    pub head: NoteHead,
    pub articulation: Option<Articulation>,
    pub tuplet: Option<TupletRatio>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RestSymbol {
    pub beat: Beat,
    pub duration: Beat,
    pub part: usize,
    pub tuplet: Option<TupletRatio>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BeamSymbol {
    pub beat: Beat,
    pub duration: Beat,
    pub members: Vec<NoteSymbol>,
    /// Lowest and highest row under the beam.
    pub range: (i32, i32),
    pub stem_up: bool,
    pub part: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TupletSymbol {
    pub beat: Beat,
    pub duration: Beat,
    pub divisor: u32,
    pub ratio: TupletRatio,
    /// Bit `n` is set when division `n` has an onset.
    pub rhythm: u32,
    pub members: Vec<NoteSymbol>,
    /// Bracket above the heads.
    pub above: bool,
    /// Row the bracket starts from.
    pub row: i32,
    /// Rows per beat.
    pub angle: f64,
    pub part: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChordSymbol {
    pub beat: Beat,
    pub duration: Beat,
    pub root: (Letter, i8),
    pub extension: String,
    pub bass: Option<(Letter, i8)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    Clef {
        clef: Clef,
        part: usize,
    },
    TimeSignature {
        numerator: u32,
        denominator: u32,
    },
    Rest(RestSymbol),
    Note(NoteSymbol),
    Accidental {
        beat: Beat,
        pitch: i32,
        value: i8,
        part: usize,
    },
    Ledger {
        beat: Beat,
        pitch: i32,
        rows: Vec<i32>,
        part: usize,
    },
    Tie {
        beat: Beat,
        duration: Beat,
        pitch: i32,
        part: usize,
    },
    Beam(BeamSymbol),
    Tuplet(TupletSymbol),
    Chord(ChordSymbol),
    Lyric {
        beat: Beat,
        duration: Beat,
        text: String,
    },
}
impl Symbol {
    /// Clefs and time signatures live at the bar start.
    pub fn beat(&self) -> Option<Beat> {
        match self {
            Self::Clef { .. } | Self::TimeSignature { .. } => None,
            Self::Rest(RestSymbol { beat, .. })
            | Self::Note(NoteSymbol { beat, .. })
            | Self::Accidental { beat, .. }
            | Self::Ledger { beat, .. }
            | Self::Tie { beat, .. }
            | Self::Beam(BeamSymbol { beat, .. })
            | Self::Tuplet(TupletSymbol { beat, .. })
            | Self::Chord(ChordSymbol { beat, .. })
            | Self::Lyric { beat, .. } => Some(*beat),
        }
    }
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Clef { .. } => "clef",
            Self::TimeSignature { .. } => "time-signature",
            Self::Rest(_) => "rest",
            Self::Note(_) => "note",
            Self::Accidental { .. } => "accidental",
            Self::Ledger { .. } => "ledger",
            Self::Tie { .. } => "tie",
            Self::Beam(_) => "beam",
            Self::Tuplet(_) => "tuplet",
            Self::Chord(_) => "chord",
            Self::Lyric { .. } => "lyric",
        }
    }
    pub fn as_note(&self) -> Option<&NoteSymbol> {
        match self {
            Self::Note(note) => Some(note),
            _ => None,
        }
    }
    pub fn as_rest(&self) -> Option<&RestSymbol> {
        match self {
            Self::Rest(rest) => Some(rest),
            _ => None,
        }
    }
}
