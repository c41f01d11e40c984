use std::{error::Error, fs, path::PathBuf};

use clap::{Parser, ValueEnum};
use log::info;
use score_engrave::{
    musicxml::DEFAULT_DIVISIONS,
    notation::StaveKind,
    primitives::parse_events_str,
    settings::RenderSettings,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Musicxml,
    Symbols,
}

/// Engrave a JSON event list as MusicXML or renderer symbols.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// JSON array of `[beat, "type", ...]` events
    input: PathBuf,

    /// Render settings as JSON
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// treble, bass, piano or drums
    #[arg(short, long)]
    stave: Option<StaveKind>,

    #[arg(short, long, value_enum, default_value = "musicxml")]
    format: Format,

    /// Divisions per quarter note in the document
    #[arg(short, long)]
    divisions: Option<u32>,

    /// Write here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn settings(args: &Args) -> Result<RenderSettings, Box<dyn Error>> {
    let mut settings = match &args.config {
        Some(path) => RenderSettings::from_path(path)?,
        None => RenderSettings::default(),
    };
    if let Some(stave) = args.stave {
        settings.stave = stave;
    }
    if args.divisions.is_some() {
        settings.divisions = args.divisions;
    }
    settings.validate()?;
    Ok(settings)
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();
    let settings = settings(&args)?;
    let events = parse_events_str(&fs::read_to_string(&args.input)?)?;
    info!("read {} events from {:?}", events.len(), args.input);

    let score = score_engrave::engrave(&events, &settings)?;
    let approximate = score.diagnostics().count();
    if approximate > 0 {
        info!("{} symbols were written approximately", approximate);
    }
    let text = match args.format {
        Format::Musicxml => score.render_musicxml(
            settings.divisions.unwrap_or(DEFAULT_DIVISIONS),
        )?,
        Format::Symbols => score_engrave::descriptors::to_json(&score)?,
    };

    match &args.output {
        Some(path) => {
            fs::write(path, text)?;
            info!("{} bars written to {:?}", score.bar_count(), path);
        }
        None => println!("{}", text),
    }
    Ok(())
}
