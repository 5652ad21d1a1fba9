//! Error types for keysynth-core.

use thiserror::Error;

/// Result type alias for keysynth-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced synchronously by the control plane.
#[derive(Debug, Error)]
pub enum Error {
    /// Pitch-class name outside the twelve sharps-only names.
    #[error("Unknown pitch class '{0}'")]
    UnknownPitchClass(String),

    /// Octave outside the playable range.
    #[error("Octave {0} is outside the playable range")]
    OctaveOutOfRange(i32),

    /// Instrument name not present in the profile registry.
    #[error("Unknown instrument '{0}'")]
    UnknownInstrument(String),

    /// Master volume must be finite and within [0, 1].
    #[error("Invalid volume {0}, expected a level in [0, 1]")]
    InvalidVolume(f64),

    /// The audio output cannot be driven (construction-time failure).
    #[error("Audio output unavailable: {0}")]
    AudioUnavailable(String),

    /// Invalid configuration parameter.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON (de)serialization of configs or recordings.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
