use std::str::FromStr;

use crate::settings::RenderSettings;

use super::NotationError;

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Default)]
pub enum NoteHead {
    #[default]
    Normal,
    Cross,
    CircleX,
    Diamond,
    Triangle,
}
impl ToString for NoteHead {
    fn to_string(&self) -> String {
        match self {
            Self::Normal => "normal",
            Self::Cross => "x",
            Self::CircleX => "circle-x",
            Self::Diamond => "diamond",
            Self::Triangle => "triangle",
        }
        .to_string()
    }
}
impl FromStr for NoteHead {
    type Err = NotationError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Self::Normal),
            "x" | "cross" => Ok(Self::Cross),
            "circle-x" => Ok(Self::CircleX),
            "diamond" => Ok(Self::Diamond),
            "triangle" => Ok(Self::Triangle),
            _ => Err(NotationError::UnexpectedToken(s.to_string())),
        }
    }
}

/// Emphasis, read from note velocity.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Articulation {
    Marcato,
    Accent,
    /// Bracketed head.
    Ghost,
}
impl ToString for Articulation {
    fn to_string(&self) -> String {
        match self {
            Self::Marcato => "marcato",
            Self::Accent => "accent",
            Self::Ghost => "ghost",
        }
        .to_string()
    }
}
impl Articulation {
    /// Thresholds are inclusive; unset thresholds are off.
    pub fn from_velocity(
        velocity: f64,
        settings: &RenderSettings,
    ) -> Option<Self> {
        if let Some(threshold) = settings.marcato_threshold {
            if velocity >= threshold {
                return Some(Self::Marcato);
            }
        }
        if let Some(threshold) = settings.accent_threshold {
            if velocity >= threshold {
                return Some(Self::Accent);
            }
        }
        match settings.ghost_threshold {
            Some(threshold) if velocity <= threshold => Some(Self::Ghost),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_head_tokens() {
        for head in [
            NoteHead::Normal,
            NoteHead::Cross,
            NoteHead::CircleX,
            NoteHead::Diamond,
            NoteHead::Triangle,
        ] {
            assert_eq!(NoteHead::from_str(&head.to_string()).unwrap(), head);
        }
        assert!(NoteHead::from_str("slash").is_err());
    }

    #[test]
    fn test_articulation_thresholds() {
        let mut settings = RenderSettings::default();
        assert_eq!(Articulation::from_velocity(1.0, &settings), None);
        settings.marcato_threshold = Some(0.95);
        settings.accent_threshold = Some(0.8);
        settings.ghost_threshold = Some(0.2);
        assert_eq!(
            Articulation::from_velocity(1.0, &settings),
            Some(Articulation::Marcato)
        );
        assert_eq!(
            Articulation::from_velocity(0.85, &settings),
            Some(Articulation::Accent)
        );
        assert_eq!(Articulation::from_velocity(0.5, &settings), None);
        assert_eq!(
            Articulation::from_velocity(0.1, &settings),
            Some(Articulation::Ghost)
        );
    }
}
