#[derive(Debug, thiserror::Error)]
pub enum EngraveError {
    #[error("Malformed event #{index}: {reason}. Event: `{event}`")]
    MalformedEvent {
        index: usize,
        event: String,
        reason: String,
    },
    #[error("Invalid render settings: {0}")]
    Settings(String),
    #[error("Score needs more than {} divisions per quarter", u32::MAX)]
    DivisionsOverflow,
    #[error("Unknown stave: `{0}`")]
    UnknownStave(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
pub type EngraveResult<T> = Result<T, EngraveError>;
