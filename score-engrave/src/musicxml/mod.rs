//! MusicXML 4.0 partwise documents.
//!
//! The instrument is one `<part>`. Its voices go one after another inside
//! every measure, separated by `<backup>` of the whole measure.

mod harmony;
mod note;

use std::collections::{BTreeMap, HashSet};

use itertools::Itertools;
use log::{debug, warn};

use crate::{
    engrave::{EngravedPart, Score},
    errors::{EngraveError, EngraveResult},
    notation::Clef,
    primitives::{
        fraction_tools::{checked_lcm, denominator, round},
        frac, Bar, Beat, ChordSymbol, Key, Meter, Symbol,
    },
};

pub use harmony::{HarmonyKind, PlacedHarmony};
pub use note::{
    accidental_name, note_type, written_duration, Beam, NoteElement,
    TupletMark,
};

/// Divisions per quarter when nothing finer is needed.
pub const DEFAULT_DIVISIONS: u32 = 4;

const HEADER: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>\n",
    "<!DOCTYPE score-partwise PUBLIC ",
    "\"-//Recordare//DTD MusicXML 4.0 Partwise//EN\" ",
    "\"http://www.musicxml.org/dtds/partwise.dtd\">\n",
);

pub trait RendersToMusicXml {
    fn render_musicxml(&self, divisions: u32) -> String;
}

impl RendersToMusicXml for Meter {
    fn render_musicxml(&self, _divisions: u32) -> String {
        let (beats, beat_type) = self.time_signature();
        format!(
            concat!(
                "<time>\n",
                "  <beats>{}</beats>\n",
                "  <beat-type>{}</beat-type>\n",
                "</time>\n"
            ),
            beats, beat_type
        )
    }
}

impl RendersToMusicXml for Key {
    fn render_musicxml(&self, _divisions: u32) -> String {
        format!("<key>\n  <fifths>{}</fifths>\n</key>\n", self.fifths())
    }
}

/// Clef on the numbered staff.
struct StaffClef {
    clef: Clef,
    staff: Option<usize>,
}
impl RendersToMusicXml for StaffClef {
    fn render_musicxml(&self, _divisions: u32) -> String {
        let mut xml = match self.staff {
            Some(staff) => format!("<clef number=\"{}\">\n", staff),
            None => "<clef>\n".to_string(),
        };
        xml.push_str(&format!("  <sign>{}</sign>\n", self.clef.sign()));
        if let Some(line) = self.clef.line() {
            xml.push_str(&format!("  <line>{}</line>\n", line));
        }
        xml.push_str("</clef>\n");
        xml
    }
}

pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            ch => escaped.push(ch),
        }
    }
    escaped
}

/// Smallest multiple of `base`, that writes every onset and duration of
/// the score as a whole number.
pub fn document_divisions(score: &Score, base: u32) -> EngraveResult<u32> {
    divisions_for(
        score
            .parts
            .iter()
            .flat_map(|part| part.bars.iter())
            .flat_map(|bar| bar.symbols.iter())
            .flat_map(|symbol| match symbol {
                Symbol::Note(note) => vec![note.beat, note.duration],
                Symbol::Rest(rest) => vec![rest.beat, rest.duration],
                Symbol::Chord(chord) => vec![chord.beat],
                _ => Vec::new(),
            }),
        base,
    )
}

fn divisions_for(
    beats: impl IntoIterator<Item = Beat>,
    base: u32,
) -> EngraveResult<u32> {
    let divisions = beats
        .into_iter()
        .map(|beat| denominator(&beat))
        .try_fold(base.max(1) as u64, checked_lcm)
        .ok_or(EngraveError::DivisionsOverflow)?;
    u32::try_from(divisions).map_err(|_| EngraveError::DivisionsOverflow)
}

/// Where the notes of one bar stand in beams, tuplets and lyrics.
#[derive(Debug, Default)]
struct BarMarks<'a> {
    accidentals: BTreeMap<(Beat, i32), i8>,
    beams: BTreeMap<Beat, Beam>,
    tuplet_starts: BTreeMap<Beat, bool>,
    tuplet_stops: Vec<Beat>,
    lyrics: BTreeMap<Beat, Vec<&'a str>>,
    chords: Vec<&'a ChordSymbol>,
}
impl<'a> BarMarks<'a> {
    fn new(bar: &'a Bar, unmapped: &mut HashSet<&'static str>) -> Self {
        let mut marks = Self::default();
        for symbol in bar.symbols.iter() {
            match symbol {
                Symbol::Accidental {
                    beat, pitch, value, ..
                } => {
                    marks.accidentals.insert((*beat, *pitch), *value);
                }
                Symbol::Beam(beam) => {
                    let onsets = beam
                        .members
                        .iter()
                        .map(|note| note.beat)
                        .dedup()
                        .collect_vec();
                    let last = onsets.len().saturating_sub(1);
                    for (idx, beat) in onsets.into_iter().enumerate() {
                        let mark = match idx {
                            0 => Beam::Begin,
                            idx if idx == last => Beam::End,
                            _ => Beam::Continue,
                        };
                        marks.beams.entry(beat).or_insert(mark);
                    }
                }
                Symbol::Tuplet(tuplet) => {
                    marks.tuplet_starts.insert(tuplet.beat, tuplet.above);
                    marks.tuplet_stops.push(tuplet.beat + tuplet.duration);
                }
                Symbol::Lyric { beat, text, .. } => {
                    marks.lyrics.entry(*beat).or_default().push(text);
                }
                Symbol::Chord(chord) => marks.chords.push(chord),
                Symbol::Ledger { .. } => {
                    if unmapped.insert(symbol.kind()) {
                        warn!(
                            "{} symbols have no MusicXML element, skipped",
                            symbol.kind()
                        );
                    }
                }
                Symbol::Clef { .. }
                | Symbol::TimeSignature { .. }
                | Symbol::Rest(_)
                | Symbol::Note(_)
                | Symbol::Tie { .. } => (),
            }
        }
        marks.chords.sort_by_key(|chord| chord.beat);
        marks
    }
    /// Tuplet bracket ends for the onset.
    fn tuplet_marks(&self, beat: Beat, stop: Beat) -> Vec<TupletMark> {
        let mut marks = Vec::new();
        if let Some(above) = self.tuplet_starts.get(&beat) {
            marks.push(TupletMark::Start { above: *above });
        }
        if self.tuplet_stops.contains(&stop) {
            marks.push(TupletMark::Stop);
        }
        marks
    }
}

/// Writes the score into MusicXML text.
#[derive(Debug)]
pub struct MusicXmlWriter {
    buffer: String,
    depth: usize,
    divisions: u32,
    unmapped: HashSet<&'static str>,
}
impl MusicXmlWriter {
    pub fn new(divisions: u32) -> Self {
        Self {
            buffer: String::from(HEADER),
            depth: 0,
            divisions,
            unmapped: HashSet::new(),
        }
    }
    pub fn divisions(&self) -> u32 {
        self.divisions
    }
    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.buffer.push_str("  ");
        }
        self.buffer.push_str(text);
        self.buffer.push('\n');
    }
    fn open(&mut self, tag: &str) {
        self.line(&format!("<{}>", tag));
        self.depth += 1;
    }
    fn close(&mut self, name: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.line(&format!("</{}>", name));
    }
    fn leaf(&mut self, name: &str, value: impl std::fmt::Display) {
        self.line(&format!("<{0}>{1}</{0}>", name, value));
    }
    fn block(&mut self, element: &impl RendersToMusicXml) {
        let text = element.render_musicxml(self.divisions);
        for line in text.lines() {
            self.line(line);
        }
    }
    fn ticks(&self, beat: Beat) -> i64 {
        round(&(beat * frac(self.divisions as i64, 1)))
    }

    pub fn write_score(mut self, score: &Score) -> String {
        self.open("score-partwise version=\"4.0\"");
        self.open("part-list");
        self.open("score-part id=\"P1\"");
        self.leaf("part-name", escape(score.instrument()));
        self.close("score-part");
        self.close("part-list");
        self.open("part id=\"P1\"");
        for index in 0..score.bar_count() {
            self.write_measure(score, index);
        }
        self.close("part");
        self.close("score-partwise");
        self.buffer
    }

    fn write_measure(&mut self, score: &Score, index: usize) {
        let bars = score
            .parts
            .iter()
            .filter_map(|part| part.bars.get(index).map(|bar| (part, bar)))
            .collect::<Vec<_>>();
        let first = match bars.first() {
            Some((_, bar)) => *bar,
            None => return,
        };
        self.open(&format!("measure number=\"{}\"", index + 1));
        self.write_attributes(score, first, &bars);
        for (order, (part, bar)) in bars.iter().enumerate() {
            if order > 0 {
                self.open("backup");
                let ticks = self.ticks(bar.duration);
                self.leaf("duration", ticks);
                self.close("backup");
            }
            self.write_voice(score, part, bar);
        }
        self.close("measure");
    }

    fn write_attributes(
        &mut self,
        score: &Score,
        bar: &Bar,
        bars: &[(&EngravedPart, &Bar)],
    ) {
        let first = bar.index == 0;
        if !(first || bar.key_changed || bar.meter_changed) {
            return;
        }
        self.open("attributes");
        if first {
            self.leaf("divisions", self.divisions);
        }
        if first || bar.key_changed {
            self.block(&bar.key);
        }
        if first || bar.meter_changed {
            self.block(&bar.meter);
        }
        if first {
            let staves = score.staves();
            if staves > 1 {
                self.leaf("staves", staves);
            }
            let mut written = HashSet::new();
            for (part, part_bar) in bars {
                let clef =
                    part_bar.symbols.iter().find_map(|symbol| match symbol {
                        Symbol::Clef { clef, .. } => Some(*clef),
                        _ => None,
                    });
                if let Some(clef) = clef {
                    if written.insert(part.staff) {
                        self.block(&StaffClef {
                            clef,
                            staff: (staves > 1).then_some(part.staff),
                        });
                    }
                }
            }
        }
        self.close("attributes");
    }

    fn write_harmonies(
        &mut self,
        chords: &mut std::iter::Peekable<std::vec::IntoIter<&ChordSymbol>>,
        position: Beat,
        until: Option<Beat>,
    ) {
        while let Some(chord) = chords.next_if(|chord| {
            until.map_or(true, |until| chord.beat <= until)
        }) {
            self.block(&PlacedHarmony {
                chord,
                offset: chord.beat - position,
            });
        }
    }

    fn write_voice(&mut self, score: &Score, part: &EngravedPart, bar: &Bar) {
        let marks = BarMarks::new(bar, &mut self.unmapped);
        let mut chords = marks.chords.clone().into_iter().peekable();
        let voice = part.index + 1;
        let staff = (score.staves() > 1).then_some(part.staff);
        let pitched = score.stave.stave().is_pitched();
        let mut onset: Option<Beat> = None;
        for symbol in bar.symbols.iter() {
            let beat = match symbol {
                Symbol::Note(note) => note.beat,
                Symbol::Rest(rest) => rest.beat,
                _ => continue,
            };
            let chord = onset == Some(beat);
            if !chord {
                self.write_harmonies(&mut chords, beat, Some(beat));
            }
            let mut element = match symbol {
                Symbol::Note(note) => {
                    let mut element = NoteElement::from_note(note, voice);
                    element.unpitched = !pitched;
                    element.accidental = marks
                        .accidentals
                        .get(&(note.beat, note.spelling.pitch()))
                        .copied()
                        .filter(|_| !note.tie_stop);
                    element
                }
                Symbol::Rest(rest) => {
                    let mut element = NoteElement::from_rest(rest, voice);
                    element.whole_bar_rest = rest.beat == frac(0, 1)
                        && rest.duration == bar.duration;
                    element
                }
                _ => continue,
            };
            element.chord = chord;
            element.staff = staff;
            if !chord {
                element.beam = marks.beams.get(&beat).copied();
                if element.tuplet.is_some() {
                    element.tuplet_marks =
                        marks.tuplet_marks(beat, beat + element.duration);
                }
                if let Some(lyrics) = marks.lyrics.get(&beat) {
                    match symbol {
                        Symbol::Note(_) => element.lyrics = lyrics.clone(),
                        _ => debug!(
                            "bar {}: lyric at {} falls on a rest",
                            bar.index, beat
                        ),
                    }
                }
            }
            let text = element.render(self.divisions);
            for line in text.lines() {
                self.line(line);
            }
            onset = Some(beat);
        }
        self.write_harmonies(&mut chords, bar.duration, None);
    }
}

impl Score {
    /// Whole partwise document.
    ///
    /// `divisions` is the wished resolution. It is raised when some
    /// durations need a finer one.
    pub fn render_musicxml(&self, divisions: u32) -> EngraveResult<String> {
        let divisions = document_divisions(self, divisions)?;
        debug!("writing MusicXML with {} divisions", divisions);
        Ok(MusicXmlWriter::new(divisions).write_score(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_divisions() {
        let beats = [frac(1, 3), frac(3, 4), frac(5, 6)];
        assert_eq!(divisions_for(beats, 4).unwrap(), 12);
        assert_eq!(divisions_for(Vec::<Beat>::new(), 0).unwrap(), 1);
        let coarse = [frac(1, 1_000_003), frac(1, 1_000_033)];
        assert!(matches!(
            divisions_for(coarse, 4),
            Err(EngraveError::DivisionsOverflow)
        ));
    }

    #[test]
    fn test_escape() {
        assert_eq!(
            escape("Tom & \"Jerry\" <3"),
            "Tom &amp; &quot;Jerry&quot; &lt;3"
        );
    }

    #[test]
    fn test_meter() {
        let xml = Meter::new(frac(3, 1), frac(3, 2)).render_musicxml(4);
        assert!(xml.contains("<beats>6</beats>"));
        assert!(xml.contains("<beat-type>8</beat-type>"));
    }

    #[test]
    fn test_clef() {
        let clef = StaffClef {
            clef: Clef::Bass,
            staff: Some(2),
        };
        let xml = clef.render_musicxml(4);
        assert!(xml.starts_with("<clef number=\"2\">"));
        assert!(xml.contains("<sign>F</sign>"));
        assert!(xml.contains("<line>4</line>"));
    }
}
