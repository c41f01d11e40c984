//! How heads look and where they sit on the stave.

pub mod note_heads;
pub mod stave;

pub use note_heads::{Articulation, NoteHead};
pub use stave::{Clef, PartSpec, Placement, Stave, StaveKind, StemPolicy};

#[derive(Debug, thiserror::Error)]
pub enum NotationError {
    #[error("Unexpected Token: {0}")]
    UnexpectedToken(String),
}
