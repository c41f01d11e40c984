//! `<note>` elements for heads and rests.

use crate::{
    notation::{Articulation, NoteHead},
    primitives::{
        fraction_tools::{is_power_of_two, round},
        frac, Beat, NoteSymbol, RestSymbol, Spelling, TupletRatio,
    },
};

use super::escape;

const NOTE_TYPES: [(i64, u64, &str); 10] = [
    (8, 1, "breve"),
    (4, 1, "whole"),
    (2, 1, "half"),
    (1, 1, "quarter"),
    (1, 2, "eighth"),
    (1, 4, "16th"),
    (1, 8, "32nd"),
    (1, 16, "64th"),
    (1, 32, "128th"),
    (1, 64, "256th"),
];

/// Type name and dots of a written value.
///
/// ```
/// # use score_engrave::{musicxml::note_type, primitives::frac};
/// assert_eq!(note_type(frac(3, 2)), Some(("quarter", 1)));
/// assert_eq!(note_type(frac(7, 8)), Some(("eighth", 2)));
/// assert_eq!(note_type(frac(5, 4)), None);
/// ```
pub fn note_type(written: Beat) -> Option<(&'static str, u8)> {
    let base = [frac(1, 1), frac(2, 3), frac(4, 7)]
        .iter()
        .enumerate()
        .map(|(dots, factor)| (written * *factor, dots as u8))
        .find(|(base, _)| is_power_of_two(base))?;
    NOTE_TYPES
        .iter()
        .find(|(n, d, _)| frac(*n, *d) == base.0)
        .map(|(_, _, name)| (*name, base.1))
}

/// Type for approximate values too: the longest plain value inside it,
/// or the shortest type.
fn closest_note_type(written: Beat) -> (&'static str, u8) {
    note_type(written).unwrap_or_else(|| {
        NOTE_TYPES
            .iter()
            .find(|(n, d, _)| frac(*n, *d) <= written)
            .or(NOTE_TYPES.last())
            .map_or(("256th", 0), |(_, _, name)| (*name, 0))
    })
}

/// Value as it is written, before the tuplet squeezes it.
pub fn written_duration(duration: Beat, tuplet: Option<TupletRatio>) -> Beat {
    match tuplet {
        Some(ratio) => {
            duration * frac(ratio.actual as i64, ratio.normal as u64)
        }
        None => duration,
    }
}

pub fn accidental_name(value: i8) -> &'static str {
    match value {
        -2 => "flat-flat",
        -1 => "flat",
        1 => "sharp",
        2 => "double-sharp",
        _ => "natural",
    }
}

fn articulation_name(articulation: Articulation) -> Option<&'static str> {
    match articulation {
        Articulation::Marcato => Some("strong-accent"),
        Articulation::Accent => Some("accent"),
        Articulation::Ghost => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Beam {
    Begin,
    Continue,
    End,
}
impl Beam {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Begin => "begin",
            Self::Continue => "continue",
            Self::End => "end",
        }
    }
}

/// Bracket ends on the first and last onset of a tuplet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TupletMark {
    Start { above: bool },
    Stop,
}

/// Everything one `<note>` element shows.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteElement<'a> {
    pub chord: bool,
    /// `None` for rests.
    pub spelling: Option<Spelling>,
    pub unpitched: bool,
    pub whole_bar_rest: bool,
    pub duration: Beat,
    pub tie_start: bool,
    pub tie_stop: bool,
    pub voice: usize,
    pub tuplet: Option<TupletRatio>,
    pub accidental: Option<i8>,
    pub stem_up: Option<bool>,
    pub head: NoteHead,
    pub ghost: bool,
    pub staff: Option<usize>,
    pub beam: Option<Beam>,
    pub tuplet_marks: Vec<TupletMark>,
    pub articulation: Option<Articulation>,
    pub lyrics: Vec<&'a str>,
}
impl<'a> NoteElement<'a> {
    /// Bare rest, decorated by the caller.
    pub fn new(duration: Beat, voice: usize) -> Self {
        Self {
            chord: false,
            spelling: None,
            unpitched: false,
            whole_bar_rest: false,
            duration,
            tie_start: false,
            tie_stop: false,
            voice,
            tuplet: None,
            accidental: None,
            stem_up: None,
            head: NoteHead::Normal,
            ghost: false,
            staff: None,
            beam: None,
            tuplet_marks: Vec::new(),
            articulation: None,
            lyrics: Vec::new(),
        }
    }
    pub fn from_note(note: &NoteSymbol, voice: usize) -> Self {
        Self {
            spelling: Some(note.spelling),
            tie_start: note.tie_start,
            tie_stop: note.tie_stop,
            tuplet: note.tuplet,
            stem_up: Some(note.stem_up),
            head: note.head,
            ghost: note.articulation == Some(Articulation::Ghost),
            articulation: note.articulation,
            ..Self::new(note.duration, voice)
        }
    }
    pub fn from_rest(rest: &RestSymbol, voice: usize) -> Self {
        Self {
            tuplet: rest.tuplet,
            ..Self::new(rest.duration, voice)
        }
    }

    /// Element lines in schema order.
    pub fn render(&self, divisions: u32) -> String {
        let mut xml = String::from("<note>\n");
        if self.chord {
            xml.push_str("  <chord/>\n");
        }
        match (self.spelling, self.unpitched) {
            (None, _) if self.whole_bar_rest => {
                xml.push_str("  <rest measure=\"yes\"/>\n")
            }
            (None, _) => xml.push_str("  <rest/>\n"),
            (Some(spelling), true) => xml.push_str(&format!(
                concat!(
                    "  <unpitched>\n",
                    "    <display-step>{}</display-step>\n",
                    "    <display-octave>{}</display-octave>\n",
                    "  </unpitched>\n"
                ),
                spelling.letter, spelling.octave
            )),
            (Some(spelling), false) => {
                xml.push_str("  <pitch>\n");
                xml.push_str(&format!(
                    "    <step>{}</step>\n",
                    spelling.letter
                ));
                if spelling.accidental != 0 {
                    xml.push_str(&format!(
                        "    <alter>{}</alter>\n",
                        spelling.accidental
                    ));
                }
                xml.push_str(&format!(
                    "    <octave>{}</octave>\n",
                    spelling.octave
                ));
                xml.push_str("  </pitch>\n");
            }
        }
        let ticks = round(&(self.duration * frac(divisions as i64, 1)));
        xml.push_str(&format!("  <duration>{}</duration>\n", ticks));
        if self.tie_stop {
            xml.push_str("  <tie type=\"stop\"/>\n");
        }
        if self.tie_start {
            xml.push_str("  <tie type=\"start\"/>\n");
        }
        xml.push_str(&format!("  <voice>{}</voice>\n", self.voice));
        let written = written_duration(self.duration, self.tuplet);
        if !self.whole_bar_rest {
            let (name, dots) = closest_note_type(written);
            xml.push_str(&format!("  <type>{}</type>\n", name));
            for _ in 0..dots {
                xml.push_str("  <dot/>\n");
            }
        }
        if let Some(value) = self.accidental {
            xml.push_str(&format!(
                "  <accidental>{}</accidental>\n",
                accidental_name(value)
            ));
        }
        if let Some(ratio) = self.tuplet {
            xml.push_str(&format!(
                concat!(
                    "  <time-modification>\n",
                    "    <actual-notes>{}</actual-notes>\n",
                    "    <normal-notes>{}</normal-notes>\n",
                    "  </time-modification>\n"
                ),
                ratio.actual, ratio.normal
            ));
        }
        match self.stem_up {
            Some(_) if written >= frac(4, 1) => (),
            Some(true) => xml.push_str("  <stem>up</stem>\n"),
            Some(false) => xml.push_str("  <stem>down</stem>\n"),
            None => (),
        }
        if self.head != NoteHead::Normal || self.ghost {
            let parentheses = match self.ghost {
                true => " parentheses=\"yes\"",
                false => "",
            };
            xml.push_str(&format!(
                "  <notehead{}>{}</notehead>\n",
                parentheses,
                self.head.to_string()
            ));
        }
        if let Some(staff) = self.staff {
            xml.push_str(&format!("  <staff>{}</staff>\n", staff));
        }
        if let Some(beam) = self.beam {
            xml.push_str(&format!(
                "  <beam number=\"1\">{}</beam>\n",
                beam.as_str()
            ));
        }
        xml.push_str(&self.render_notations());
        for (number, text) in self.lyrics.iter().enumerate() {
            xml.push_str(&format!(
                concat!(
                    "  <lyric number=\"{}\">\n",
                    "    <syllabic>single</syllabic>\n",
                    "    <text>{}</text>\n",
                    "  </lyric>\n"
                ),
                number + 1,
                escape(text)
            ));
        }
        xml.push_str("</note>\n");
        xml
    }

    fn render_notations(&self) -> String {
        let mut inner = String::new();
        if self.tie_stop {
            inner.push_str("    <tied type=\"stop\"/>\n");
        }
        if self.tie_start {
            inner.push_str("    <tied type=\"start\"/>\n");
        }
        for mark in self.tuplet_marks.iter() {
            match mark {
                TupletMark::Start { above } => {
                    inner.push_str(&format!(
                        "    <tuplet type=\"start\" bracket=\"yes\" \
                         placement=\"{}\"/>\n",
                        match above {
                            true => "above",
                            false => "below",
                        }
                    ))
                }
                TupletMark::Stop => {
                    inner.push_str("    <tuplet type=\"stop\"/>\n")
                }
            }
        }
        if let Some(name) = self.articulation.and_then(articulation_name) {
            inner.push_str(&format!(
                "    <articulations>\n      <{}/>\n    </articulations>\n",
                name
            ));
        }
        match inner.is_empty() {
            true => inner,
            false => format!("  <notations>\n{}  </notations>\n", inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::Letter;

    #[test]
    fn test_note_types() {
        assert_eq!(note_type(frac(4, 1)), Some(("whole", 0)));
        assert_eq!(note_type(frac(3, 1)), Some(("half", 1)));
        assert_eq!(note_type(frac(1, 4)), Some(("16th", 0)));
        assert_eq!(note_type(frac(3, 16)), Some(("32nd", 1)));
        assert_eq!(note_type(frac(1, 3)), None);
        let triplet = TupletRatio {
            actual: 3,
            normal: 2,
        };
        assert_eq!(written_duration(frac(1, 3), Some(triplet)), frac(1, 2));
        assert_eq!(closest_note_type(frac(5, 4)), ("quarter", 0));
        assert_eq!(closest_note_type(frac(1, 10)), ("64th", 0));
        assert_eq!(closest_note_type(frac(1, 100)), ("256th", 0));
    }

    #[test]
    fn test_approximate_value_has_type() {
        let xml = NoteElement::new(frac(1, 10), 1).render(10);
        assert!(xml.contains("<duration>1</duration>"), "{}", xml);
        assert!(xml.contains("<type>64th</type>"), "{}", xml);
    }

    #[test]
    fn test_element_order() {
        let element = NoteElement {
            spelling: Some(Spelling::new(Letter::F, 1, 4)),
            tie_start: true,
            tuplet: Some(TupletRatio {
                actual: 3,
                normal: 2,
            }),
            accidental: Some(1),
            stem_up: Some(false),
            beam: Some(Beam::Begin),
            tuplet_marks: vec![TupletMark::Start { above: true }],
            ..NoteElement::new(frac(1, 3), 1)
        };
        let xml = element.render(3);
        let order = [
            "<step>F</step>",
            "<alter>1</alter>",
            "<duration>1</duration>",
            "<tie type=\"start\"/>",
            "<voice>1</voice>",
            "<type>eighth</type>",
            "<accidental>sharp</accidental>",
            "<actual-notes>3</actual-notes>",
            "<stem>down</stem>",
            "<beam number=\"1\">begin</beam>",
            "<tied type=\"start\"/>",
            "<tuplet type=\"start\"",
        ];
        let positions = order
            .iter()
            .map(|token| xml.find(token).expect(token))
            .collect::<Vec<_>>();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]), "{}", xml);
    }

    #[test]
    fn test_rest() {
        let rest = NoteElement {
            whole_bar_rest: true,
            ..NoteElement::new(frac(4, 1), 2)
        };
        let xml = rest.render(4);
        assert!(xml.contains("<rest measure=\"yes\"/>"));
        assert!(xml.contains("<duration>16</duration>"));
        assert!(!xml.contains("<type>"));
    }
}
