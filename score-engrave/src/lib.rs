//! Engraving of beat-timed note events into notated bars.
//!
//! Events are read from JSON, laid into bars and written either as MusicXML
//! or as a flat list of symbols for graphical renderers.

pub mod descriptors;
pub mod engrave;
pub mod errors;
pub mod musicxml;
pub mod notation;
pub mod primitives;
pub mod settings;

use log::debug;

use errors::EngraveResult;
use musicxml::DEFAULT_DIVISIONS;
use primitives::parse_events_str;
use settings::RenderSettings;

pub use engrave::{engrave, Score};

/// Events JSON to a MusicXML document.
pub fn render_musicxml(
    json: &str,
    settings: &RenderSettings,
) -> EngraveResult<String> {
    let score = engrave(&parse_events_str(json)?, settings)?;
    report(&score);
    score.render_musicxml(settings.divisions.unwrap_or(DEFAULT_DIVISIONS))
}

/// Events JSON to the renderer symbol list, as JSON.
pub fn render_symbols(
    json: &str,
    settings: &RenderSettings,
) -> EngraveResult<String> {
    let score = engrave(&parse_events_str(json)?, settings)?;
    report(&score);
    descriptors::to_json(&score)
}

fn report(score: &Score) {
    for diagnostic in score.diagnostics() {
        debug!("{}", diagnostic);
    }
}
