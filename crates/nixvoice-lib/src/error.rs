//! Error types for the voice guide.
//!
//! None of these reach the user: narration is an optional accessibility aid,
//! so public entry points log and swallow them.

use thiserror::Error;

pub type NarrationResult<T> = Result<T, NarrationError>;

#[derive(Error, Debug)]
pub enum NarrationError {
    #[error("speech synthesis is not available on this host")]
    CapabilityUnavailable,

    #[error("no voice selected")]
    NoVoiceSelected,

    #[error("synthesis failed: {0}")]
    Synthesis(String),

    #[error("recognition failed: {0}")]
    Recognition(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl NarrationError {
    /// Policy no-ops (missing capability or voice) as opposed to platform faults.
    pub fn is_policy(&self) -> bool {
        matches!(self, Self::CapabilityUnavailable | Self::NoVoiceSelected)
    }
}
