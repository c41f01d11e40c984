//! Render settings, read from JSON. Every field may be omitted.

use std::{collections::BTreeSet, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    errors::{EngraveError, EngraveResult},
    notation::StaveKind,
    primitives::{frac, zero, Beat, ChordRootRewrites, Key},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    #[serde(rename = "spell_chord_root_Cflat_as_B")]
    pub spell_chord_root_cflat_as_b: bool,
    #[serde(rename = "spell_chord_root_Bsharp_as_C")]
    pub spell_chord_root_bsharp_as_c: bool,
    #[serde(rename = "spell_chord_root_Esharp_as_F")]
    pub spell_chord_root_esharp_as_f: bool,
    #[serde(rename = "spell_chord_root_Fflat_as_E")]
    pub spell_chord_root_fflat_as_e: bool,
    pub swing_as_straight_8ths: bool,
    pub swing_as_straight_16ths: bool,
    pub marcato_threshold: Option<f64>,
    pub accent_threshold: Option<f64>,
    pub ghost_threshold: Option<f64>,
    #[serde(with = "durations")]
    pub head_durations: BTreeSet<Beat>,
    #[serde(with = "durations")]
    pub rest_durations: BTreeSet<Beat>,
    /// Document divisions per quarter, raised when durations need it.
    pub divisions: Option<u32>,
    /// Key signature until the first key event.
    pub key: Key,
    /// Spell notes by the estimated local key.
    pub estimate_keys: bool,
    pub stave: StaveKind,
}
impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            spell_chord_root_cflat_as_b: true,
            spell_chord_root_bsharp_as_c: true,
            spell_chord_root_esharp_as_f: true,
            spell_chord_root_fflat_as_e: true,
            swing_as_straight_8ths: false,
            swing_as_straight_16ths: false,
            marcato_threshold: None,
            accent_threshold: None,
            ghost_threshold: None,
            head_durations: default_head_durations(),
            rest_durations: default_rest_durations(),
            divisions: None,
            key: Key::C,
            estimate_keys: true,
            stave: StaveKind::Treble,
        }
    }
}
impl RenderSettings {
    pub fn from_json(json: &str) -> EngraveResult<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }
    pub fn from_path(path: impl AsRef<Path>) -> EngraveResult<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }
    pub fn validate(&self) -> EngraveResult<()> {
        for (name, table) in [
            ("head_durations", &self.head_durations),
            ("rest_durations", &self.rest_durations),
        ] {
            if table.is_empty() {
                return Err(EngraveError::Settings(format!(
                    "{} can not be empty",
                    name
                )));
            }
            if table.iter().any(|d| *d <= zero()) {
                return Err(EngraveError::Settings(format!(
                    "{} should be positive",
                    name
                )));
            }
        }
        if self.divisions == Some(0) {
            return Err(EngraveError::Settings(
                "divisions should be positive".to_string(),
            ));
        }
        Ok(())
    }
    pub fn chord_root_rewrites(&self) -> ChordRootRewrites {
        ChordRootRewrites {
            cflat_as_b: self.spell_chord_root_cflat_as_b,
            bsharp_as_c: self.spell_chord_root_bsharp_as_c,
            esharp_as_f: self.spell_chord_root_esharp_as_f,
            fflat_as_e: self.spell_chord_root_fflat_as_e,
        }
    }
}

/// From 64th to double whole, with dotted values from dotted 32nd.
pub fn default_head_durations() -> BTreeSet<Beat> {
    [
        (1, 16),
        (1, 8),
        (3, 16),
        (1, 4),
        (3, 8),
        (1, 2),
        (3, 4),
        (1, 1),
        (3, 2),
        (2, 1),
        (3, 1),
        (4, 1),
        (6, 1),
        (8, 1),
    ]
    .into_iter()
    .map(|(n, d)| frac(n, d))
    .collect()
}

/// Rests skip the short dotted values and the dotted whole.
pub fn default_rest_durations() -> BTreeSet<Beat> {
    [
        (1, 16),
        (1, 8),
        (1, 4),
        (1, 2),
        (1, 1),
        (3, 2),
        (2, 1),
        (3, 1),
        (4, 1),
        (8, 1),
    ]
    .into_iter()
    .map(|(n, d)| frac(n, d))
    .collect()
}

/// Duration tables as lists of beat numbers.
mod durations {
    use std::collections::BTreeSet;

    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    use crate::primitives::{fraction_tools::from_f64, to_f64, Beat};

    pub fn serialize<S: Serializer>(
        table: &BTreeSet<Beat>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(table.iter().map(to_f64))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeSet<Beat>, D::Error> {
        Vec::<f64>::deserialize(deserializer)?
            .into_iter()
            .map(|value| from_f64(value).map_err(D::Error::custom))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let settings = RenderSettings::from_json("{}").unwrap();
        assert_eq!(settings, RenderSettings::default());
        assert!(settings.head_durations.contains(&frac(3, 16)));
        assert!(!settings.rest_durations.contains(&frac(3, 16)));
    }

    #[test]
    fn test_from_json() {
        let settings = RenderSettings::from_json(
            r#"{
                "spell_chord_root_Cflat_as_B": false,
                "swing_as_straight_8ths": true,
                "accent_threshold": 0.8,
                "head_durations": [0.25, 0.5, 1, 1.5, 2, 4],
                "key": -2,
                "stave": "piano"
            }"#,
        )
        .unwrap();
        assert!(!settings.spell_chord_root_cflat_as_b);
        assert!(settings.spell_chord_root_fflat_as_e);
        assert!(settings.swing_as_straight_8ths);
        assert_eq!(settings.accent_threshold, Some(0.8));
        assert_eq!(settings.head_durations.len(), 6);
        assert_eq!(settings.key.fifths(), -2);
        assert_eq!(settings.stave, StaveKind::Piano);
    }

    #[test]
    fn test_invalid() {
        assert!(RenderSettings::from_json(r#"{"key": 12}"#).is_err());
        assert!(
            RenderSettings::from_json(r#"{"rest_durations": []}"#).is_err()
        );
        assert!(
            RenderSettings::from_json(r#"{"head_durations": [0, 1]}"#)
                .is_err()
        );
        assert!(RenderSettings::from_json(r#"{"divisions": 0}"#).is_err());
    }

    #[test]
    fn test_round_trip() {
        let settings = RenderSettings::default();
        let json = serde_json::to_string(&settings).unwrap();
        assert_eq!(RenderSettings::from_json(&json).unwrap(), settings);
    }
}
