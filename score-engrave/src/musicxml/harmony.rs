//! `<harmony>` elements for chord symbols.

use crate::primitives::{
    fraction_tools::round, frac, Beat, ChordSymbol, Letter,
};

use super::{escape, RendersToMusicXml};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HarmonyKind {
    #[default]
    Major,
    Minor,
    Dominant,
    MajorSeventh,
    Diminished,
    Augmented,
    HalfDiminished,
}
impl HarmonyKind {
    /// Read the kind from the chord extension, major when unknown.
    pub fn from_extension(extension: &str) -> Self {
        let extension = extension.trim();
        let starts = |prefixes: &[&str]| {
            prefixes.iter().any(|prefix| extension.starts_with(prefix))
        };
        if starts(&["maj7", "maj9", "M7", "M9", "Δ", "^"]) {
            Self::MajorSeventh
        } else if starts(&["m7b5", "m7-5", "ø"]) {
            Self::HalfDiminished
        } else if starts(&["dim", "°", "o"]) {
            Self::Diminished
        } else if starts(&["aug", "+"]) {
            Self::Augmented
        } else if starts(&["maj", "M"]) {
            Self::Major
        } else if starts(&["m", "min", "-"]) {
            Self::Minor
        } else if starts(&["7", "9", "11", "13"]) {
            Self::Dominant
        } else {
            Self::Major
        }
    }
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Major => "major",
            Self::Minor => "minor",
            Self::Dominant => "dominant",
            Self::MajorSeventh => "major-seventh",
            Self::Diminished => "diminished",
            Self::Augmented => "augmented",
            Self::HalfDiminished => "half-diminished",
        }
    }
}

fn step_and_alter(prefix: &str, (letter, alter): (Letter, i8)) -> String {
    let mut xml = format!("    <{0}-step>{1}</{0}-step>\n", prefix, letter);
    if alter != 0 {
        xml.push_str(&format!(
            "    <{0}-alter>{1}</{0}-alter>\n",
            prefix, alter
        ));
    }
    xml
}

/// Chord symbol written at `offset` from the current position.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedHarmony<'a> {
    pub chord: &'a ChordSymbol,
    pub offset: Beat,
}
impl<'a> RendersToMusicXml for PlacedHarmony<'a> {
    fn render_musicxml(&self, divisions: u32) -> String {
        let chord = self.chord;
        let kind = HarmonyKind::from_extension(&chord.extension);
        let mut xml = String::from("<harmony>\n  <root>\n");
        xml.push_str(&step_and_alter("root", chord.root));
        xml.push_str("  </root>\n");
        match chord.extension.is_empty() {
            true => {
                xml.push_str(&format!("  <kind>{}</kind>\n", kind.as_str()))
            }
            false => xml.push_str(&format!(
                "  <kind text=\"{}\">{}</kind>\n",
                escape(&chord.extension),
                kind.as_str()
            )),
        }
        if let Some(bass) = chord.bass {
            xml.push_str("  <bass>\n");
            xml.push_str(&step_and_alter("bass", bass));
            xml.push_str("  </bass>\n");
        }
        let offset = round(&(self.offset * frac(divisions as i64, 1)));
        if offset != 0 {
            xml.push_str(&format!("  <offset>{}</offset>\n", offset));
        }
        xml.push_str("</harmony>\n");
        xml
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        for (extension, kind) in [
            ("", HarmonyKind::Major),
            ("m", HarmonyKind::Minor),
            ("m7", HarmonyKind::Minor),
            ("7", HarmonyKind::Dominant),
            ("maj7", HarmonyKind::MajorSeventh),
            ("dim", HarmonyKind::Diminished),
            ("aug", HarmonyKind::Augmented),
            ("m7b5", HarmonyKind::HalfDiminished),
            ("sus4", HarmonyKind::Major),
        ] {
            assert_eq!(HarmonyKind::from_extension(extension), kind);
        }
    }

    #[test]
    fn test_render() {
        let chord = ChordSymbol {
            beat: frac(2, 1),
            duration: frac(2, 1),
            root: (Letter::B, -1),
            extension: "m7".to_string(),
            bass: Some((Letter::F, 0)),
        };
        let xml = PlacedHarmony {
            chord: &chord,
            offset: frac(-1, 1),
        }
        .render_musicxml(4);
        assert!(xml.contains("<root-step>B</root-step>"));
        assert!(xml.contains("<root-alter>-1</root-alter>"));
        assert!(xml.contains("<kind text=\"m7\">minor</kind>"));
        assert!(xml.contains("<bass-step>F</bass-step>"));
        assert!(!xml.contains("bass-alter"));
        assert!(xml.contains("<offset>-4</offset>"));
    }
}
