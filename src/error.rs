use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by a correction run. Every variant is fatal for the run.
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: symphonia::core::errors::Error,
    },

    #[error("unusable input {}: {reason}", path.display())]
    Input { path: PathBuf, reason: String },

    #[error("input buffer has no samples")]
    EmptyInput,

    #[error("pitch shifting failed: {0}")]
    Shift(String),

    #[error("failed to write WAV {}: {source}", path.display())]
    Wav {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },

    #[error("failed to write {}: {reason}", path.display())]
    Output { path: PathBuf, reason: String },

    #[error("invalid settings: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
