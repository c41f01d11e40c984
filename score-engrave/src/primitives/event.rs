//! Input events on the continuous beat line.
//!
//! Events come as JSON tuples `[beat, "type", ...]`, beats being quarter
//! notes. Beat values may be numbers or exact fractions written as strings
//! (`"1/3"`).

use fraction::Fraction;
use serde_json::Value;

use crate::errors::{EngraveError, EngraveResult};

use super::{
    fraction_tools::{from_f64, parse_fraction, zero},
    pitch::parse_pitch_name,
    Beat, Key,
};

/// Pitch as written in the event.
///
/// `number` is the midi pitch when the name could be read as one. Drum
/// names ("snare", "ride") keep only the name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pitch {
    pub number: Option<i32>,
    pub name: String,
}
impl Pitch {
    pub fn from_midi(number: i32) -> Self {
        Self {
            number: Some(number),
            name: number.to_string(),
        }
    }
    pub fn from_name(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            number: parse_pitch_name(&name).ok(),
            name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Note {
        start: Beat,
        pitch: Pitch,
        velocity: f64,
        duration: Beat,
    },
    Chord {
        start: Beat,
        root: String,
        extension: String,
        duration: Beat,
    },
    Key {
        start: Beat,
        tonic: Key,
    },
    Meter {
        start: Beat,
        numerator_beats: Beat,
        divisor: Beat,
    },
    Lyric {
        start: Beat,
        text: String,
        duration: Beat,
    },
    Sequence {
        start: Beat,
        id: String,
        duration: Beat,
    },
}
impl Event {
    pub fn start(&self) -> Beat {
        match self {
            Self::Note { start, .. }
            | Self::Chord { start, .. }
            | Self::Key { start, .. }
            | Self::Meter { start, .. }
            | Self::Lyric { start, .. }
            | Self::Sequence { start, .. } => *start,
        }
    }
    pub fn duration(&self) -> Beat {
        match self {
            Self::Note { duration, .. }
            | Self::Chord { duration, .. }
            | Self::Lyric { duration, .. }
            | Self::Sequence { duration, .. } => *duration,
            Self::Key { .. } | Self::Meter { .. } => zero(),
        }
    }
    pub fn stop(&self) -> Beat {
        self.start() + self.duration()
    }
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Note { .. } => "note",
            Self::Chord { .. } => "chord",
            Self::Key { .. } => "key",
            Self::Meter { .. } => "meter",
            Self::Lyric { .. } => "lyric",
            Self::Sequence { .. } => "sequence",
        }
    }

    /// Read one event tuple.
    pub fn from_json(value: &Value) -> Result<Self, String> {
        let fields = value
            .as_array()
            .ok_or("event should be an array".to_string())?;
        let start = beat_field(fields, 0, "beat")?;
        let kind = fields
            .get(1)
            .and_then(Value::as_str)
            .ok_or("second field should be the event type".to_string())?;
        match arity(kind) {
            Some(arity) if arity != fields.len() => {
                return Err(format!(
                    "`{}` takes {} fields, got {}",
                    kind,
                    arity,
                    fields.len()
                ))
            }
            _ => (),
        }
        let event = match kind {
            "note" => Self::Note {
                start,
                pitch: pitch_field(fields, 2)?,
                velocity: velocity_field(fields, 3)?,
                duration: duration_field(fields, 4)?,
            },
            "chord" => Self::Chord {
                start,
                root: string_field(fields, 2, "root")?,
                extension: optional_string_field(fields, 3),
                duration: duration_field(fields, 4)?,
            },
            "key" => Self::Key {
                start,
                tonic: Key::from_tonic_name(&string_field(
                    fields, 2, "tonic",
                )?)?,
            },
            "meter" => {
                let numerator_beats = duration_field(fields, 2)?;
                let divisor = duration_field(fields, 3)?;
                if numerator_beats == zero() || divisor == zero() {
                    return Err("meter can not be empty".to_string());
                }
                Self::Meter {
                    start,
                    numerator_beats,
                    divisor,
                }
            }
            "lyric" => Self::Lyric {
                start,
                text: string_field(fields, 2, "text")?,
                duration: duration_field(fields, 3)?,
            },
            "sequence" => Self::Sequence {
                start,
                id: match fields.get(2) {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Number(n)) => n.to_string(),
                    _ => return Err("sequence needs an id".to_string()),
                },
                duration: duration_field(fields, 3)?,
            },
            other => return Err(format!("unknown event type `{}`", other)),
        };
        Ok(event)
    }
}

/// Tuple length of every known event type.
fn arity(kind: &str) -> Option<usize> {
    match kind {
        "key" => Some(3),
        "meter" | "lyric" | "sequence" => Some(4),
        "note" | "chord" => Some(5),
        _ => None,
    }
}

fn beat_value(value: &Value) -> Result<Fraction, String> {
    match value {
        Value::Number(n) => from_f64(
            n.as_f64()
                .ok_or(format!("Can not read {} as a number", n))?,
        ),
        Value::String(s) => parse_fraction(s),
        other => Err(format!("{} is not a beat value", other)),
    }
}

fn beat_field(
    fields: &[Value],
    idx: usize,
    name: &str,
) -> Result<Beat, String> {
    let value = fields
        .get(idx)
        .ok_or(format!("missing {} at position {}", name, idx))?;
    let beat = beat_value(value)?;
    match beat.is_sign_negative() && beat != zero() {
        true => Err(format!("{} can not be negative", name)),
        false => Ok(beat),
    }
}

fn duration_field(fields: &[Value], idx: usize) -> Result<Beat, String> {
    beat_field(fields, idx, "duration")
}

fn string_field(
    fields: &[Value],
    idx: usize,
    name: &str,
) -> Result<String, String> {
    fields
        .get(idx)
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or(format!("missing {} at position {}", name, idx))
}

fn optional_string_field(fields: &[Value], idx: usize) -> String {
    fields
        .get(idx)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn pitch_field(fields: &[Value], idx: usize) -> Result<Pitch, String> {
    match fields.get(idx) {
        Some(Value::String(name)) if !name.trim().is_empty() => {
            Ok(Pitch::from_name(name.trim()))
        }
        Some(Value::Number(n)) => n
            .as_i64()
            .filter(|n| (0..=127).contains(n))
            .map(|n| Pitch::from_midi(n as i32))
            .ok_or(format!("{} is not a midi pitch", n)),
        _ => Err(format!("missing pitch at position {}", idx)),
    }
}

fn velocity_field(fields: &[Value], idx: usize) -> Result<f64, String> {
    let velocity = fields
        .get(idx)
        .and_then(Value::as_f64)
        .ok_or(format!("missing velocity at position {}", idx))?;
    match (0.0..=1.0).contains(&velocity) {
        true => Ok(velocity),
        false => Err(format!("velocity {} is out of 0..1", velocity)),
    }
}

/// Read the whole event list, sorted by start beat.
///
/// Any malformed tuple rejects the list.
pub fn parse_events(value: &Value) -> EngraveResult<Vec<Event>> {
    let list = value.as_array().ok_or(EngraveError::MalformedEvent {
        index: 0,
        event: value.to_string(),
        reason: "events should be a list".to_string(),
    })?;
    let mut events = list
        .iter()
        .enumerate()
        .map(|(index, value)| {
            Event::from_json(value).map_err(|reason| {
                EngraveError::MalformedEvent {
                    index,
                    event: value.to_string(),
                    reason,
                }
            })
        })
        .collect::<EngraveResult<Vec<Event>>>()?;
    events.sort_by(|a, b| a.start().cmp(&b.start()));
    Ok(events)
}

pub fn parse_events_str(json: &str) -> EngraveResult<Vec<Event>> {
    let value: Value = serde_json::from_str(json)?;
    parse_events(&value)
}
