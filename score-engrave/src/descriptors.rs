//! Flat symbol list for graphical renderers.
//!
//! Every bar of every part becomes a `bar` descriptor, followed by `count`
//! descriptors of its symbols. Beats are float quarter notes: absolute for
//! bars, relative to the bar start for symbols.

use serde::Serialize;

use crate::{
    engrave::Score,
    errors::EngraveResult,
    primitives::{pitch::accidental_string, to_f64, Bar, Letter, Symbol},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Descriptor {
    Bar {
        part: usize,
        index: usize,
        beat: f64,
        duration: f64,
        count: usize,
        approximate: bool,
    },
    Clef {
        clef: &'static str,
        part: usize,
    },
    TimeSignature {
        numerator: u32,
        denominator: u32,
    },
    Rest {
        beat: f64,
        duration: f64,
        part: usize,
        tuplet: Option<(u32, u32)>,
    },
    Note {
        beat: f64,
        duration: f64,
        pitch: i32,
        name: String,
        row: i32,
        part: usize,
        stem_up: bool,
        tie_start: bool,
        tie_stop: bool,
        head: String,
        articulation: Option<String>,
        tuplet: Option<(u32, u32)>,
    },
    Accidental {
        beat: f64,
        pitch: i32,
        value: i8,
        part: usize,
    },
    Ledger {
        beat: f64,
        pitch: i32,
        rows: Vec<i32>,
        part: usize,
    },
    Tie {
        beat: f64,
        duration: f64,
        pitch: i32,
        part: usize,
    },
    Beam {
        beat: f64,
        duration: f64,
        notes: usize,
        range: (i32, i32),
        stem_up: bool,
        part: usize,
    },
    Tuplet {
        beat: f64,
        duration: f64,
        divisor: u32,
        actual: u32,
        normal: u32,
        rhythm: u32,
        above: bool,
        row: i32,
        angle: f64,
        part: usize,
    },
    Chord {
        beat: f64,
        duration: f64,
        root: String,
        extension: String,
        bass: Option<String>,
    },
    Lyric {
        beat: f64,
        duration: f64,
        text: String,
    },
}

fn note_name((letter, accidental): (Letter, i8)) -> String {
    format!("{}{}", letter, accidental_string(accidental))
}

impl From<&Symbol> for Descriptor {
    fn from(symbol: &Symbol) -> Self {
        match symbol {
            Symbol::Clef { clef, part } => Self::Clef {
                clef: clef.sign(),
                part: *part,
            },
            Symbol::TimeSignature {
                numerator,
                denominator,
            } => Self::TimeSignature {
                numerator: *numerator,
                denominator: *denominator,
            },
            Symbol::Rest(rest) => Self::Rest {
                beat: to_f64(&rest.beat),
                duration: to_f64(&rest.duration),
                part: rest.part,
                tuplet: rest.tuplet.map(|ratio| (ratio.actual, ratio.normal)),
            },
            Symbol::Note(note) => Self::Note {
                beat: to_f64(&note.beat),
                duration: to_f64(&note.duration),
                pitch: note.pitch,
                name: note.spelling.to_string(),
                row: note.row,
                part: note.part,
                stem_up: note.stem_up,
                tie_start: note.tie_start,
                tie_stop: note.tie_stop,
                head: note.head.to_string(),
                articulation: note.articulation.map(|art| art.to_string()),
                tuplet: note.tuplet.map(|ratio| (ratio.actual, ratio.normal)),
            },
            Symbol::Accidental {
                beat,
                pitch,
                value,
                part,
            } => Self::Accidental {
                beat: to_f64(beat),
                pitch: *pitch,
                value: *value,
                part: *part,
            },
            Symbol::Ledger {
                beat,
                pitch,
                rows,
                part,
            } => Self::Ledger {
                beat: to_f64(beat),
                pitch: *pitch,
                rows: rows.clone(),
                part: *part,
            },
            Symbol::Tie {
                beat,
                duration,
                pitch,
                part,
            } => Self::Tie {
                beat: to_f64(beat),
                duration: to_f64(duration),
                pitch: *pitch,
                part: *part,
            },
            Symbol::Beam(beam) => Self::Beam {
                beat: to_f64(&beam.beat),
                duration: to_f64(&beam.duration),
                notes: beam.members.len(),
                range: beam.range,
                stem_up: beam.stem_up,
                part: beam.part,
            },
            Symbol::Tuplet(tuplet) => Self::Tuplet {
                beat: to_f64(&tuplet.beat),
                duration: to_f64(&tuplet.duration),
                divisor: tuplet.divisor,
                actual: tuplet.ratio.actual,
                normal: tuplet.ratio.normal,
                rhythm: tuplet.rhythm,
                above: tuplet.above,
                row: tuplet.row,
                angle: tuplet.angle,
                part: tuplet.part,
            },
            Symbol::Chord(chord) => Self::Chord {
                beat: to_f64(&chord.beat),
                duration: to_f64(&chord.duration),
                root: note_name(chord.root),
                extension: chord.extension.clone(),
                bass: chord.bass.map(note_name),
            },
            Symbol::Lyric {
                beat,
                duration,
                text,
            } => Self::Lyric {
                beat: to_f64(beat),
                duration: to_f64(duration),
                text: text.clone(),
            },
        }
    }
}

/// Bar header and its symbols.
fn flatten_bar(
    part: usize,
    bar: &Bar,
) -> impl Iterator<Item = Descriptor> + '_ {
    std::iter::once(Descriptor::Bar {
        part,
        index: bar.index,
        beat: to_f64(&bar.beat),
        duration: to_f64(&bar.duration),
        count: bar.symbols.len(),
        approximate: bar.is_approximate(),
    })
    .chain(bar.symbols.iter().map(Descriptor::from))
}

/// Bars in time order, parts of one measure one after another.
pub fn flatten(score: &Score) -> Vec<Descriptor> {
    (0..score.bar_count())
        .flat_map(|index| {
            score.parts.iter().filter_map(move |part| {
                part.bars.get(index).map(|bar| (part.index, bar))
            })
        })
        .flat_map(|(part, bar)| flatten_bar(part, bar))
        .collect()
}

pub fn to_json(score: &Score) -> EngraveResult<String> {
    Ok(serde_json::to_string_pretty(&flatten(score))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        engrave::engrave,
        primitives::{frac, Event, Pitch},
        settings::RenderSettings,
    };

    fn quarter(start: i64, number: i32) -> Event {
        Event::Note {
            start: frac(start, 1),
            pitch: Pitch::from_midi(number),
            velocity: 0.5,
            duration: frac(1, 1),
        }
    }

    #[test]
    fn test_note_name() {
        assert_eq!(note_name((Letter::B, -1)), "Bb");
        assert_eq!(note_name((Letter::F, 2)), "F##");
        assert_eq!(note_name((Letter::C, 0)), "C");
    }

    #[test]
    fn test_bar_counts() {
        let events = (0..6).map(|beat| quarter(beat, 60)).collect::<Vec<_>>();
        let score = engrave(&events, &RenderSettings::default()).unwrap();
        let descriptors = flatten(&score);
        let mut position = 0;
        let mut bars = 0;
        while position < descriptors.len() {
            let count = match &descriptors[position] {
                Descriptor::Bar { count, index, .. } => {
                    assert_eq!(*index, bars);
                    *count
                }
                other => panic!("expected a bar, got {:?}", other),
            };
            bars += 1;
            position += count + 1;
        }
        assert_eq!(position, descriptors.len());
        assert_eq!(bars, 2);
    }

    #[test]
    fn test_json_tags() {
        let score =
            engrave(&[quarter(0, 62)], &RenderSettings::default()).unwrap();
        let json = to_json(&score).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let first = &value[0];
        assert_eq!(first["type"], "bar");
        assert_eq!(first["beat"], 0.0);
        assert_eq!(first["duration"], 4.0);
        let note = value
            .as_array()
            .unwrap()
            .iter()
            .find(|item| item["type"] == "note")
            .unwrap();
        assert_eq!(note["name"], "D4");
        assert_eq!(note["pitch"], 62);
        assert!(value
            .as_array()
            .unwrap()
            .iter()
            .any(|item| item["type"] == "time_signature"));
    }
}
