//! Staves: where heads go, which part plays them, how stems point.
//!
//! A stave is chosen once per render, and the engraver only talks to it
//! through the [Stave] trait.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    errors::EngraveError,
    primitives::{spell, Key, Pitch, Spelling},
};

use super::NoteHead;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Clef {
    Treble,
    Bass,
    Percussion,
}
impl Clef {
    pub fn sign(&self) -> &'static str {
        match self {
            Self::Treble => "G",
            Self::Bass => "F",
            Self::Percussion => "percussion",
        }
    }
    pub fn line(&self) -> Option<u8> {
        match self {
            Self::Treble => Some(2),
            Self::Bass => Some(4),
            Self::Percussion => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StemPolicy {
    Up,
    Down,
    /// Up below the centre line.
    Auto,
}

/// A voice on the stave.
#[derive(Debug, Clone, PartialEq)]
pub struct PartSpec {
    pub name: &'static str,
    pub clef: Clef,
    /// 1-based staff number within the instrument.
    pub staff: usize,
    pub stem: StemPolicy,
    pub top_row: i32,
    pub bottom_row: i32,
}
impl PartSpec {
    pub fn centre_row(&self) -> i32 {
        (self.top_row + self.bottom_row) / 2
    }
    pub fn stem_up<'a>(
        &self,
        rows: impl IntoIterator<Item = &'a i32>,
    ) -> bool {
        match self.stem {
            StemPolicy::Up => true,
            StemPolicy::Down => false,
            StemPolicy::Auto => {
                let (sum, count) = rows
                    .into_iter()
                    .fold((0, 0), |(sum, count), row| {
                        (sum + row, count + 1)
                    });
                count == 0 || sum < self.centre_row() * count
            }
        }
    }
    /// Ledger lines needed by a head on the row.
    pub fn ledger_rows(&self, row: i32) -> Vec<i32> {
        if row >= self.top_row + 2 {
            (self.top_row + 2..=row).step_by(2).collect()
        } else {
            (1..)
                .map(|n| self.bottom_row - 2 * n)
                .take_while(|line| *line >= row)
                .collect()
        }
    }
}

const TREBLE_TOP: i32 = 38; // F5
const TREBLE_BOTTOM: i32 = 30; // E4
const BASS_TOP: i32 = 26; // A3
const BASS_BOTTOM: i32 = 18; // G2

/// Head placed on the stave.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub spelling: Spelling,
    pub row: i32,
    pub head: NoteHead,
}

pub trait Stave: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;
    /// Instrument name for the document.
    fn instrument(&self) -> &'static str;
    fn parts(&self) -> &[PartSpec];
    fn part_for(&self, _pitch: &Pitch) -> usize {
        0
    }
    /// Spell and place pitch, `None` when the stave can not hold it.
    fn place(&self, pitch: &Pitch, key: Key) -> Option<Placement> {
        let spelling = spell(pitch.number?, key);
        Some(Placement {
            spelling,
            row: spelling.row(),
            head: NoteHead::Normal,
        })
    }
    /// Pitched staves show accidentals.
    fn is_pitched(&self) -> bool {
        true
    }
    fn staves(&self) -> usize {
        self.parts().iter().map(|part| part.staff).max().unwrap_or(1)
    }
}

#[derive(Debug)]
pub struct TrebleStave;
static TREBLE_PARTS: [PartSpec; 1] = [PartSpec {
    name: "treble",
    clef: Clef::Treble,
    staff: 1,
    stem: StemPolicy::Auto,
    top_row: TREBLE_TOP,
    bottom_row: TREBLE_BOTTOM,
}];
impl Stave for TrebleStave {
    fn name(&self) -> &'static str {
        "treble"
    }
    fn instrument(&self) -> &'static str {
        "Treble"
    }
    fn parts(&self) -> &[PartSpec] {
        &TREBLE_PARTS
    }
}

#[derive(Debug)]
pub struct BassStave;
static BASS_PARTS: [PartSpec; 1] = [PartSpec {
    name: "bass",
    clef: Clef::Bass,
    staff: 1,
    stem: StemPolicy::Auto,
    top_row: BASS_TOP,
    bottom_row: BASS_BOTTOM,
}];
impl Stave for BassStave {
    fn name(&self) -> &'static str {
        "bass"
    }
    fn instrument(&self) -> &'static str {
        "Bass"
    }
    fn parts(&self) -> &[PartSpec] {
        &BASS_PARTS
    }
}

/// Grand stave, split at middle C.
#[derive(Debug)]
pub struct PianoStave;
static PIANO_PARTS: [PartSpec; 2] = [
    PartSpec {
        name: "upper",
        clef: Clef::Treble,
        staff: 1,
        stem: StemPolicy::Auto,
        top_row: TREBLE_TOP,
        bottom_row: TREBLE_BOTTOM,
    },
    PartSpec {
        name: "lower",
        clef: Clef::Bass,
        staff: 2,
        stem: StemPolicy::Auto,
        top_row: BASS_TOP,
        bottom_row: BASS_BOTTOM,
    },
];
impl Stave for PianoStave {
    fn name(&self) -> &'static str {
        "piano"
    }
    fn instrument(&self) -> &'static str {
        "Piano"
    }
    fn parts(&self) -> &[PartSpec] {
        &PIANO_PARTS
    }
    fn part_for(&self, pitch: &Pitch) -> usize {
        match pitch.number {
            Some(number) if number < 60 => 1,
            _ => 0,
        }
    }
}

struct DrumEntry {
    names: &'static [&'static str],
    numbers: &'static [i32],
    row: i32,
    head: NoteHead,
    part: usize,
}

const CYMBALS: usize = 0;
const DRUMS: usize = 1;

static DRUM_KIT: [DrumEntry; 13] = [
    DrumEntry {
        names: &["kick", "bass-drum"],
        numbers: &[35, 36],
        row: 31,
        head: NoteHead::Normal,
        part: DRUMS,
    },
    DrumEntry {
        names: &["snare"],
        numbers: &[38, 40],
        row: 35,
        head: NoteHead::Normal,
        part: DRUMS,
    },
    DrumEntry {
        names: &["side-stick", "rimshot"],
        numbers: &[37],
        row: 35,
        head: NoteHead::Cross,
        part: DRUMS,
    },
    DrumEntry {
        names: &["floor-tom", "tom-low"],
        numbers: &[41, 43],
        row: 33,
        head: NoteHead::Normal,
        part: DRUMS,
    },
    DrumEntry {
        names: &["tom-mid"],
        numbers: &[45, 47],
        row: 36,
        head: NoteHead::Normal,
        part: DRUMS,
    },
    DrumEntry {
        names: &["tom-high"],
        numbers: &[48, 50],
        row: 37,
        head: NoteHead::Normal,
        part: DRUMS,
    },
    DrumEntry {
        names: &["hihat-pedal"],
        numbers: &[44],
        row: 29,
        head: NoteHead::Cross,
        part: DRUMS,
    },
    DrumEntry {
        names: &["hihat", "hihat-closed"],
        numbers: &[42],
        row: 39,
        head: NoteHead::Cross,
        part: CYMBALS,
    },
    DrumEntry {
        names: &["hihat-open"],
        numbers: &[46],
        row: 39,
        head: NoteHead::CircleX,
        part: CYMBALS,
    },
    DrumEntry {
        names: &["crash"],
        numbers: &[49, 57],
        row: 40,
        head: NoteHead::Cross,
        part: CYMBALS,
    },
    DrumEntry {
        names: &["ride"],
        numbers: &[51, 59],
        row: 38,
        head: NoteHead::Cross,
        part: CYMBALS,
    },
    DrumEntry {
        names: &["ride-bell"],
        numbers: &[53],
        row: 38,
        head: NoteHead::Diamond,
        part: CYMBALS,
    },
    DrumEntry {
        names: &["cowbell"],
        numbers: &[56],
        row: 37,
        head: NoteHead::Triangle,
        part: CYMBALS,
    },
];

fn drum_entry(pitch: &Pitch) -> Option<&'static DrumEntry> {
    let name = pitch.name.to_lowercase();
    DRUM_KIT
        .iter()
        .find(|entry| entry.names.contains(&name.as_str()))
        .or_else(|| {
            let number = pitch.number?;
            DRUM_KIT.iter().find(|entry| entry.numbers.contains(&number))
        })
}

/// Drum kit on a five-line percussion stave, without transposition.
#[derive(Debug)]
pub struct DrumStave;
static DRUM_PARTS: [PartSpec; 2] = [
    PartSpec {
        name: "cymbals",
        clef: Clef::Percussion,
        staff: 1,
        stem: StemPolicy::Up,
        top_row: TREBLE_TOP,
        bottom_row: TREBLE_BOTTOM,
    },
    PartSpec {
        name: "drums",
        clef: Clef::Percussion,
        staff: 1,
        stem: StemPolicy::Down,
        top_row: TREBLE_TOP,
        bottom_row: TREBLE_BOTTOM,
    },
];
impl Stave for DrumStave {
    fn name(&self) -> &'static str {
        "drums"
    }
    fn instrument(&self) -> &'static str {
        "Drums"
    }
    fn parts(&self) -> &[PartSpec] {
        &DRUM_PARTS
    }
    fn part_for(&self, pitch: &Pitch) -> usize {
        drum_entry(pitch).map(|entry| entry.part).unwrap_or(DRUMS)
    }
    fn place(&self, pitch: &Pitch, _key: Key) -> Option<Placement> {
        let entry = drum_entry(pitch)?;
        Some(Placement {
            spelling: Spelling::from_row(entry.row),
            row: entry.row,
            head: entry.head,
        })
    }
    fn is_pitched(&self) -> bool {
        false
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum StaveKind {
    #[default]
    Treble,
    Bass,
    Piano,
    Drums,
}
impl StaveKind {
    pub fn stave(&self) -> &'static dyn Stave {
        static TREBLE: TrebleStave = TrebleStave;
        static BASS: BassStave = BassStave;
        static PIANO: PianoStave = PianoStave;
        static DRUMS: DrumStave = DrumStave;
        match self {
            Self::Treble => &TREBLE,
            Self::Bass => &BASS,
            Self::Piano => &PIANO,
            Self::Drums => &DRUMS,
        }
    }
}
impl FromStr for StaveKind {
    type Err = EngraveError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "treble" => Ok(Self::Treble),
            "bass" => Ok(Self::Bass),
            "piano" => Ok(Self::Piano),
            "drums" | "percussion" => Ok(Self::Drums),
            _ => Err(EngraveError::UnknownStave(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_rows() {
        let treble = &TREBLE_PARTS[0];
        assert_eq!(treble.ledger_rows(28), vec![28]);
        assert_eq!(treble.ledger_rows(27), vec![28]);
        assert_eq!(treble.ledger_rows(26), vec![28, 26]);
        assert_eq!(treble.ledger_rows(29), Vec::<i32>::new());
        assert_eq!(treble.ledger_rows(40), vec![40]);
        assert_eq!(treble.ledger_rows(43), vec![40, 42]);
        assert!(treble.ledger_rows(34).is_empty());
    }

    #[test]
    fn test_stems() {
        let treble = &TREBLE_PARTS[0];
        assert!(treble.stem_up(&[30]));
        assert!(!treble.stem_up(&[36]));
        assert!(!treble.stem_up(&[34]));
        assert!(DRUM_PARTS[0].stem_up(&[30]));
        assert!(!DRUM_PARTS[1].stem_up(&[40]));
    }

    #[test]
    fn test_piano_split() {
        let piano = StaveKind::Piano.stave();
        assert_eq!(piano.part_for(&Pitch::from_midi(60)), 0);
        assert_eq!(piano.part_for(&Pitch::from_midi(59)), 1);
        assert_eq!(piano.staves(), 2);
        assert_eq!(StaveKind::Treble.stave().staves(), 1);
    }

    #[test]
    fn test_drum_kit() {
        let drums = StaveKind::Drums.stave();
        let snare = drums.place(&Pitch::from_name("snare"), Key::C).unwrap();
        assert_eq!(snare.row, 35);
        let hihat = Pitch::from_midi(42);
        assert_eq!(drums.part_for(&hihat), 0);
        assert_eq!(drums.place(&hihat, Key::C).unwrap().head, NoteHead::Cross);
        // C2 is the kick
        let kick = drums.place(&Pitch::from_name("C2"), Key::C).unwrap();
        assert_eq!(kick.spelling.to_string(), "F4");
        assert!(drums.place(&Pitch::from_name("gong"), Key::C).is_none());
        assert!(!drums.is_pitched());
    }

    #[test]
    fn test_stave_kind() {
        assert_eq!(StaveKind::from_str("Piano").unwrap(), StaveKind::Piano);
        assert!(StaveKind::from_str("banjo").is_err());
        assert_eq!(StaveKind::default().stave().name(), "treble");
    }
}
