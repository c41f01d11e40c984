//! Elements, from which the score is built.
//!
//! At first, events are read from the input list. Then the TimeMap lays
//! bars along the beat line, and every part fills its own Bars by symbols.

pub mod bar;
pub mod event;
pub mod fraction_tools;
pub mod pitch;
pub mod symbol;
pub mod time_map;

pub use bar::{Bar, Diagnostic};
pub use event::{parse_events, parse_events_str, Event, Pitch};
pub use fraction::Fraction;
pub use fraction_tools::{frac, limit_denominator, to_f64, zero};
pub use pitch::{
    key_scale, parse_note_name, parse_pitch_name, spell, spell_pitch_class,
    ChordRootRewrites, Key, Letter, Spelling,
};
pub use symbol::{
    BeamSymbol, ChordSymbol, NoteSymbol, RestSymbol, Symbol, TupletRatio,
    TupletSymbol,
};
pub use time_map::{BarInfo, Meter, TimeMap};

/// Position and length on the beat line, in quarter notes.
pub type Beat = Fraction;

/// Float beats are read as the closest fraction with this denominator.
static LIMIT_DENOMINATOR: u64 = 1920;
