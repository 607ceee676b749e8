// Error types for the composer.
//
// Unknown genre, mood, key or mode text is never an error; those resolve to
// documented defaults. What remains is configuration that the generators
// cannot work with (`ConfigError`) and a generated song that fails its own
// structural checks (`ComposeError::Invariant`), which would indicate a bug.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("mood {0:?} has an empty key list")]
    EmptyKeyList(String),

    #[error("tempo range {name:?} is empty: [{min}, {max})")]
    EmptyTempoRange { name: String, min: u32, max: u32 },

    #[error("tempo clamp [{min}, {max}] is invalid")]
    BadTempoClamp { min: u32, max: u32 },

    #[error("section {section:?} bar range {min}..={max} is invalid")]
    BadSectionBars { section: String, min: u32, max: u32 },

    #[error("section {section:?} intensity {value} is outside [0, 1]")]
    BadIntensity { section: String, value: f32 },

    #[error("probability {name:?} = {value} is outside [0, 1]")]
    BadProbability { name: String, value: f64 },

    #[error("melody window [{low}, {high}) must span at least an octave of MIDI pitches")]
    BadMelodyWindow { low: u8, high: u8 },
}

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("composer configuration rejected: {0}")]
    Config(#[from] ConfigError),

    #[error("generated song violates an invariant: {0}")]
    Invariant(String),
}
