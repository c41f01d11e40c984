//! Engraving: from the flat event list to bars of symbols.
//!
//! Keys are estimated once for the whole list, the time map cuts the beat
//! line into bars, and then every part of the stave fills its own bars.

pub mod bar;
pub mod key_estimate;
pub mod part;
pub mod rhythm;
pub mod tuplet;

use std::collections::HashSet;

use log::{debug, warn};

use crate::{
    errors::EngraveResult,
    notation::{Clef, StaveKind},
    primitives::{Bar, Diagnostic, Event, Pitch, TimeMap},
    settings::RenderSettings,
};

pub use bar::{Annotation, BarEngraver, Fragment};
pub use key_estimate::{estimate, KeyEstimate};
pub use part::PartEngraver;
pub use rhythm::fit_duration;
pub use tuplet::{detect, Onset, TupletMatch};

/// State shared by all bars of one render.
#[derive(Debug, Default)]
pub struct RenderContext {
    unsupported: HashSet<String>,
}
impl RenderContext {
    /// Warn about the pitch once per render.
    pub fn warn_unsupported(&mut self, pitch: &Pitch) {
        if self.unsupported.insert(pitch.name.clone()) {
            warn!("pitch `{}` has no place on the stave", pitch.name);
        }
    }
    pub fn unsupported(&self) -> impl Iterator<Item = &String> {
        self.unsupported.iter()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngravedPart {
    pub name: &'static str,
    pub index: usize,
    /// 1-based staff of the instrument.
    pub staff: usize,
    pub clef: Clef,
    pub bars: Vec<Bar>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    pub stave: StaveKind,
    pub time_map: TimeMap,
    pub parts: Vec<EngravedPart>,
}
impl Score {
    pub fn instrument(&self) -> &'static str {
        self.stave.stave().instrument()
    }
    pub fn staves(&self) -> usize {
        self.stave.stave().staves()
    }
    pub fn bar_count(&self) -> usize {
        self.time_map.bars().len()
    }
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.parts
            .iter()
            .flat_map(|part| part.bars.iter())
            .flat_map(|bar| bar.diagnostics.iter())
    }
}

/// Engrave the events on the stave chosen by the settings.
pub fn engrave(
    events: &[Event],
    settings: &RenderSettings,
) -> EngraveResult<Score> {
    settings.validate()?;
    let time_map = TimeMap::from_events(events, settings.key);
    let keys = match settings.estimate_keys {
        true => estimate(events),
        false => KeyEstimate::default(),
    };
    let stave = settings.stave.stave();
    debug!(
        "engraving {} events on {} stave in {} bars",
        events.len(),
        stave.name(),
        time_map.bars().len()
    );
    let mut context = RenderContext::default();
    let parts = stave
        .parts()
        .iter()
        .enumerate()
        .map(|(index, spec)| EngravedPart {
            name: spec.name,
            index,
            staff: spec.staff,
            clef: spec.clef,
            bars: PartEngraver::new(stave, index, settings, &keys).engrave(
                events,
                &time_map,
                &mut context,
            ),
        })
        .collect();
    Ok(Score {
        stave: settings.stave,
        time_map,
        parts,
    })
}
