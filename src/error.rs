//! Error types for flypast
//!
//! Nothing on the sequence path is fatal to the host: the controller
//! degrades to silence or ignores redundant calls.

use thiserror::Error;

/// Main error type for flypast
#[derive(Error, Debug)]
pub enum FlypastError {
    /// The host cannot provide an audio context (no device, no backend)
    #[error("Unsupported audio environment: {0}")]
    UnsupportedAudioEnvironment(String),

    /// `start()` called while a session is active or finished
    #[error("Sequence already running")]
    AlreadyRunning,

    /// Closing a context that is already closed
    #[error("Disposal error: {0}")]
    Disposal(String),

    /// A cue was played without a live audio context
    #[error("Audio engine not ready")]
    NotReady,

    /// Rejected parameter automation event
    #[error("Invalid automation: {0}")]
    InvalidAutomation(String),

    /// Rejected cue parameter set
    #[error("Invalid cue: {0}")]
    InvalidCue(String),

    /// Rejected timeline table
    #[error("Invalid timeline: {0}")]
    InvalidTimeline(String),

    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// WAV encoding errors
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
}

/// Convenience Result type using FlypastError
pub type Result<T> = std::result::Result<T, FlypastError>;
