//! Letter spelling of chromatic pitches in a key.
//!
//! Every spelled note has a place on the line of fifths (F=-1, C=0, G=1 …
//! B=5, F#=6, Bb=-2). A key with `n` sharps owns the seven places
//! `n-1..=n+5`, and chromatic notes take the enharmonic whose place is the
//! nearest to the middle of that range.

use std::{fmt, str::FromStr};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
)]
pub enum Letter {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}
impl Letter {
    pub const ALL: [Letter; 7] = [
        Letter::C,
        Letter::D,
        Letter::E,
        Letter::F,
        Letter::G,
        Letter::A,
        Letter::B,
    ];
    /// Position in C..B.
    pub fn index(&self) -> usize {
        *self as usize
    }
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 7]
    }
    pub fn pitch_class(&self) -> i32 {
        [0, 2, 4, 5, 7, 9, 11][self.index()]
    }
    /// Place of the natural note on the line of fifths.
    fn fifths(&self) -> i32 {
        [0, 2, 4, -1, 1, 3, 5][self.index()]
    }
    pub fn as_str(&self) -> &'static str {
        ["C", "D", "E", "F", "G", "A", "B"][self.index()]
    }
}
impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
impl FromStr for Letter {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "C" | "c" => Ok(Self::C),
            "D" | "d" => Ok(Self::D),
            "E" | "e" => Ok(Self::E),
            "F" | "f" => Ok(Self::F),
            "G" | "g" => Ok(Self::G),
            "A" | "a" => Ok(Self::A),
            "B" | "b" => Ok(Self::B),
            _ => Err(format!("Can not parse letter from `{}`", s)),
        }
    }
}

/// Key signature as a place on the circle of fifths.
///
/// Positive values count sharps, negative count flats.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Serialize,
    Deserialize,
)]
#[serde(try_from = "i8", into = "i8")]
pub struct Key(i8);
impl Key {
    pub const MIN: i8 = -8;
    pub const MAX: i8 = 8;
    pub const C: Key = Key(0);

    pub fn new(fifths: i8) -> Result<Self, String> {
        match (Self::MIN..=Self::MAX).contains(&fifths) {
            true => Ok(Self(fifths)),
            false => Err(format!(
                "Key with {} fifths is out of range {}..={}",
                fifths,
                Self::MIN,
                Self::MAX
            )),
        }
    }
    pub fn fifths(&self) -> i8 {
        self.0
    }
    /// Major key with the given tonic pitch class.
    ///
    /// The six-accidental key is written with sharps.
    pub fn from_pitch_class(pitch_class: usize) -> Self {
        let fifths = (pitch_class as i32 * 7).rem_euclid(12);
        match fifths > 6 {
            true => Self((fifths - 12) as i8),
            false => Self(fifths as i8),
        }
    }
    /// The enharmonic key of the same tonic closest to `other` on the
    /// circle of fifths, no further than seven accidentals.
    ///
    /// ```
    /// use score_engrave::primitives::Key;
    /// let f_sharp = Key::from_pitch_class(6);
    /// let g_flat = Key::new(-6).unwrap();
    /// assert_eq!(f_sharp.nearest_to(g_flat), g_flat);
    /// assert_eq!(f_sharp.nearest_to(Key::C), f_sharp);
    /// ```
    pub fn nearest_to(self, other: Key) -> Self {
        [self.0, self.0 - 12, self.0 + 12]
            .into_iter()
            .filter(|fifths| (-7..=7).contains(fifths))
            .min_by_key(|fifths| (*fifths as i16 - other.0 as i16).abs())
            .map(Self)
            .unwrap_or(self)
    }
    /// Parse tonic like "G", "Bb", "F#m" or "C minor".
    ///
    /// Minor tonics give the signature of their relative major.
    pub fn from_tonic_name(name: &str) -> Result<Self, String> {
        let name = name.trim();
        let (tonic, minor) = match name
            .strip_suffix("minor")
            .or_else(|| name.strip_suffix("min"))
            .or_else(|| name.strip_suffix('m'))
        {
            Some(tonic) => (tonic.trim(), true),
            None => (
                name.strip_suffix("major")
                    .or_else(|| name.strip_suffix("maj"))
                    .unwrap_or(name)
                    .trim(),
                false,
            ),
        };
        let (letter, accidental) = parse_note_name(tonic)?;
        let mut fifths = letter.fifths() + 7 * accidental as i32;
        if minor {
            fifths -= 3;
        }
        Self::new(fifths as i8)
            .map_err(|err| format!("Bad key `{}`: {}", name, err))
    }
    fn table_index(&self) -> usize {
        (self.0 - Self::MIN) as usize
    }
}
impl TryFrom<i8> for Key {
    type Error = String;
    fn try_from(value: i8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
impl From<Key> for i8 {
    fn from(key: Key) -> Self {
        key.0
    }
}

/// Accidentals the key signature puts on C, D, E, F, G, A and B.
pub fn key_scale(key: Key) -> [i8; 7] {
    let mut scale = [0; 7];
    for letter in Letter::ALL {
        let offset = key.fifths() as i32 + 5 - letter.fifths();
        scale[letter.index()] = offset.div_euclid(7) as i8;
    }
    scale
}

/// Letter with accidental for every pitch class of every key.
static SPELLINGS: Lazy<Vec<[(Letter, i8); 12]>> = Lazy::new(|| {
    (Key::MIN..=Key::MAX)
        .map(|fifths| {
            let mut table = [(Letter::C, 0); 12];
            for (pitch_class, entry) in table.iter_mut().enumerate() {
                *entry = choose_spelling(pitch_class as i32, fifths as i32);
            }
            table
        })
        .collect()
});

fn choose_spelling(pitch_class: i32, key: i32) -> (Letter, i8) {
    let centre = key + 2;
    let base = (pitch_class * 7).rem_euclid(12);
    let places = [base - 24, base - 12, base, base + 12, base + 24];
    if let Some(place) =
        places.iter().find(|place| (key - 1..=key + 5).contains(*place))
    {
        return from_fifths(*place);
    }
    places
        .into_iter()
        .filter(|place| from_fifths(*place).1.abs() <= 1)
        .min_by_key(|place| {
            // on a tie flat keys lean flat, sharp keys lean sharp
            let side = match (key > 0, *place > centre) {
                (true, true) | (false, false) => 0,
                _ => 1,
            };
            ((place - centre).abs(), from_fifths(*place).1.abs(), side)
        })
        .map(from_fifths)
        .unwrap_or_else(|| from_fifths(base))
}

fn from_fifths(place: i32) -> (Letter, i8) {
    let shifted = place + 1;
    let letter = [
        Letter::F,
        Letter::C,
        Letter::G,
        Letter::D,
        Letter::A,
        Letter::E,
        Letter::B,
    ][shifted.rem_euclid(7) as usize];
    (letter, shifted.div_euclid(7) as i8)
}

/// Note name with octave, where C4 is midi 60.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Spelling {
    pub letter: Letter,
    pub accidental: i8,
    pub octave: i32,
}
impl Spelling {
    pub fn new(letter: Letter, accidental: i8, octave: i32) -> Self {
        Self {
            letter,
            accidental,
            octave,
        }
    }
    /// Spelling of a stave row (diatonic step).
    pub fn from_row(row: i32) -> Self {
        Self::new(
            Letter::from_index(row.rem_euclid(7) as usize),
            0,
            row.div_euclid(7),
        )
    }
    pub fn pitch(&self) -> i32 {
        (self.octave + 1) * 12
            + self.letter.pitch_class()
            + self.accidental as i32
    }
    /// Diatonic step number: C4 is 28, D4 is 29.
    pub fn row(&self) -> i32 {
        self.octave * 7 + self.letter.index() as i32
    }
}
impl fmt::Display for Spelling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.letter,
            accidental_string(self.accidental),
            self.octave
        )
    }
}

pub fn accidental_string(accidental: i8) -> &'static str {
    match accidental {
        -2 => "bb",
        -1 => "b",
        1 => "#",
        2 => "##",
        _ => "",
    }
}

/// Spell pitch class in the key.
pub fn spell_pitch_class(pitch_class: i32, key: Key) -> (Letter, i8) {
    SPELLINGS[key.table_index()][pitch_class.rem_euclid(12) as usize]
}

/// Spell midi pitch in the key.
///
/// ```
/// # use score_engrave::primitives::{spell, Key, Letter};
/// let key = Key::new(-3).unwrap();
/// let spelled = spell(63, key);
/// assert_eq!((spelled.letter, spelled.accidental), (Letter::E, -1));
/// assert_eq!(spelled.octave, 4);
/// ```
pub fn spell(pitch: i32, key: Key) -> Spelling {
    let (letter, accidental) = spell_pitch_class(pitch, key);
    let natural = pitch - accidental as i32;
    Spelling::new(letter, accidental, natural.div_euclid(12) - 1)
}

/// Parse note name without octave: "C", "Bb", "F##", "E♭".
pub fn parse_note_name(name: &str) -> Result<(Letter, i8), String> {
    let mut chars = name.trim().chars();
    let letter = chars
        .next()
        .ok_or(format!("Empty note name: `{}`", name))?;
    let letter = Letter::from_str(&letter.to_string())?;
    let mut accidental: i8 = 0;
    for ch in chars {
        accidental += match ch {
            '#' | '♯' => 1,
            'b' | '♭' => -1,
            'x' | '𝄪' => 2,
            _ => {
                return Err(format!(
                    "Unexpected `{}` in note name `{}`",
                    ch, name
                ))
            }
        };
    }
    match (-2..=2).contains(&accidental) {
        true => Ok((letter, accidental)),
        false => Err(format!("Too many accidentals in `{}`", name)),
    }
}

/// Parse name with octave to midi pitch: "C4" is 60, "Bb3" is 58.
pub fn parse_pitch_name(name: &str) -> Result<i32, String> {
    let name = name.trim();
    let split = name
        .char_indices()
        .find(|(_, ch)| ch.is_ascii_digit() || *ch == '-')
        .map(|(idx, _)| idx)
        .ok_or(format!("No octave in pitch name `{}`", name))?;
    let (note, octave) = name.split_at(split);
    let (letter, accidental) = parse_note_name(note)?;
    let octave: i32 = octave
        .parse()
        .map_err(|_| format!("Bad octave in pitch name `{}`", name))?;
    Ok(Spelling::new(letter, accidental, octave).pitch())
}

/// Enharmonic rewrites applied to chord roots only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChordRootRewrites {
    pub cflat_as_b: bool,
    pub bsharp_as_c: bool,
    pub esharp_as_f: bool,
    pub fflat_as_e: bool,
}
impl ChordRootRewrites {
    pub fn apply(&self, root: (Letter, i8)) -> (Letter, i8) {
        match root {
            (Letter::C, -1) if self.cflat_as_b => (Letter::B, 0),
            (Letter::B, 1) if self.bsharp_as_c => (Letter::C, 0),
            (Letter::E, 1) if self.esharp_as_f => (Letter::F, 0),
            (Letter::F, -1) if self.fflat_as_e => (Letter::E, 0),
            root => root,
        }
    }
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use super::*;

    fn names(key: i8) -> Vec<String> {
        let key = Key::new(key).unwrap();
        (0..12)
            .map(|pc| {
                let (letter, acc) = spell_pitch_class(pc, key);
                format!("{}{}", letter, accidental_string(acc))
            })
            .collect()
    }

    #[test]
    fn test_key_scale() {
        assert_eq!(key_scale(Key::C), [0; 7]);
        assert_eq!(key_scale(Key::new(2).unwrap()), [1, 0, 0, 1, 0, 0, 0]);
        assert_eq!(
            key_scale(Key::new(-3).unwrap()),
            [0, 0, -1, 0, 0, -1, -1]
        );
        assert_eq!(key_scale(Key::new(7).unwrap()), [1; 7]);
        assert_eq!(key_scale(Key::new(8).unwrap())[3], 2);
        assert!(Key::new(9).is_err());
    }

    #[test]
    fn test_chromatic_spelling() {
        names(0)
            .iter()
            .zip_eq(vec![
                "C", "C#", "D", "Eb", "E", "F", "F#", "G", "Ab", "A", "Bb",
                "B",
            ])
            .map(|(a, b)| assert_eq!(a, b))
            .count();
        names(6)
            .iter()
            .zip_eq(vec![
                "B#", "C#", "D", "D#", "E", "E#", "F#", "G", "G#", "A", "A#",
                "B",
            ])
            .map(|(a, b)| assert_eq!(a, b))
            .count();
        names(-4)
            .iter()
            .zip_eq(vec![
                "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb",
                "Cb",
            ])
            .map(|(a, b)| assert_eq!(a, b))
            .count();
    }

    #[test]
    fn test_spell_octaves() {
        let sharp = Key::new(7).unwrap();
        assert_eq!(spell(60, sharp).to_string(), "B#3");
        let flat = Key::new(-7).unwrap();
        assert_eq!(spell(59, flat).to_string(), "Cb4");
        assert_eq!(spell(60, Key::C).row(), 28);
        assert_eq!(Spelling::from_row(30).to_string(), "E4");
    }

    #[test]
    fn test_parse_names() {
        assert_eq!(parse_pitch_name("C4"), Ok(60));
        assert_eq!(parse_pitch_name("Bb3"), Ok(58));
        assert_eq!(parse_pitch_name("F##5"), Ok(79));
        assert_eq!(parse_pitch_name("C♯4"), Ok(61));
        assert_eq!(parse_pitch_name("C-1"), Ok(0));
        assert!(parse_pitch_name("H2").is_err());
        assert!(parse_pitch_name("C").is_err());
        assert!(parse_note_name("Cbbb").is_err());
    }

    #[test]
    fn test_key_from_tonic() {
        assert_eq!(Key::from_tonic_name("G").unwrap().fifths(), 1);
        assert_eq!(Key::from_tonic_name("Eb").unwrap().fifths(), -3);
        assert_eq!(Key::from_tonic_name("Am").unwrap().fifths(), 0);
        assert_eq!(Key::from_tonic_name("C minor").unwrap().fifths(), -3);
        assert_eq!(Key::from_tonic_name("F# major").unwrap().fifths(), 6);
        assert_eq!(Key::from_pitch_class(1).fifths(), -5);
        assert_eq!(Key::from_pitch_class(6).fifths(), 6);
        let b = Key::from_pitch_class(11);
        assert_eq!(b.nearest_to(Key::new(-6).unwrap()).fifths(), -7);
        let d_flat = Key::from_pitch_class(1);
        assert_eq!(d_flat.nearest_to(Key::new(7).unwrap()).fifths(), 7);
        assert_eq!(d_flat.nearest_to(Key::new(-2).unwrap()).fifths(), -5);
        assert!(Key::from_tonic_name("Fbb").is_err());
    }

    #[test]
    fn test_chord_root_rewrites() {
        let rewrites = ChordRootRewrites {
            cflat_as_b: true,
            ..Default::default()
        };
        assert_eq!(rewrites.apply((Letter::C, -1)), (Letter::B, 0));
        assert_eq!(rewrites.apply((Letter::F, -1)), (Letter::F, -1));
    }
}
