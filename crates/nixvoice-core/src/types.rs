//! Shared types for the voice guide.
//!
//! Kept in nixvoice-core so UI collaborators can depend on the types without
//! pulling in tokio, axum, or the platform backends.

use serde::{Deserialize, Serialize};

/// Default speaking rate, as a multiple of the platform baseline.
pub const DEFAULT_RATE: f32 = 0.9;

/// Default pitch, as a multiple of the platform baseline.
pub const DEFAULT_PITCH: f32 = 1.1;

// ─── Capability & voices ───────────────────────────────────────────────────

/// Whether the host offers speech synthesis at all. Fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct VoiceCapability {
    pub available: bool,
}

impl VoiceCapability {
    pub const UNAVAILABLE: Self = Self { available: false };
    pub const AVAILABLE: Self = Self { available: true };
}

/// A synthetic voice offered by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceOption {
    pub id: String,
    pub name: String,
    /// BCP-47 style tag, e.g. `en-US`.
    pub lang: String,
}

impl VoiceOption {
    pub fn new(id: impl Into<String>, name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            lang: lang.into(),
        }
    }
}

// ─── Narration ─────────────────────────────────────────────────────────────

/// One speak call, ready for the platform.
#[derive(Debug, Clone, PartialEq)]
pub struct NarrationRequest {
    pub text: String,
    pub rate: f32,
    pub pitch: f32,
}

impl NarrationRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            rate: DEFAULT_RATE,
            pitch: DEFAULT_PITCH,
        }
    }
}

/// How an utterance ended, as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UtteranceEnd {
    Completed,
    Cancelled,
    Failed(String),
}

/// Observable narration phase. `Speaking` implies narration is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NarrationPhase {
    Idle,
    Speaking,
}

/// Voice guide status snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NarrationStatus {
    pub available: bool,
    pub enabled: bool,
    pub speaking: bool,
    pub listening: bool,
    /// Name of the selected voice, if any.
    pub voice: Option<String>,
}

impl NarrationStatus {
    pub fn initial(capability: VoiceCapability, enabled: bool) -> Self {
        Self {
            available: capability.available,
            enabled,
            speaking: false,
            listening: false,
            voice: None,
        }
    }

    pub fn phase(&self) -> NarrationPhase {
        if self.enabled && self.speaking {
            NarrationPhase::Speaking
        } else {
            NarrationPhase::Idle
        }
    }
}

// ─── Configuration ─────────────────────────────────────────────────────────

/// Which speech backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    /// Probe for speech-dispatcher, then espeak.
    #[default]
    Auto,
    SpeechDispatcher,
    Espeak,
    /// Run without speech output.
    None,
}

impl std::str::FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "speech-dispatcher" | "spd" => Ok(Self::SpeechDispatcher),
            "espeak" | "espeak-ng" => Ok(Self::Espeak),
            "none" | "off" => Ok(Self::None),
            other => Err(format!("unknown backend: {other}")),
        }
    }
}

/// Voice guide configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrationConfig {
    pub rate: f32,
    pub pitch: f32,
    pub backend: Backend,
    /// Whether narration starts enabled. The guide is opt-in by default.
    pub start_enabled: bool,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            rate: DEFAULT_RATE,
            pitch: DEFAULT_PITCH,
            backend: Backend::Auto,
            start_enabled: false,
        }
    }
}

impl NarrationConfig {
    /// Build a request for `text` with this config's rate and pitch.
    pub fn request(&self, text: impl Into<String>) -> NarrationRequest {
        NarrationRequest {
            text: text.into(),
            rate: self.rate,
            pitch: self.pitch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_defaults_to_slow_and_bright() {
        let req = NarrationRequest::new("hello");
        assert_eq!(req.rate, 0.9);
        assert_eq!(req.pitch, 1.1);
    }

    #[test]
    fn phase_requires_enabled() {
        let mut status = NarrationStatus::initial(VoiceCapability::AVAILABLE, false);
        status.speaking = true;
        assert_eq!(status.phase(), NarrationPhase::Idle);
        status.enabled = true;
        assert_eq!(status.phase(), NarrationPhase::Speaking);
    }

    #[test]
    fn backend_parses_aliases() {
        assert_eq!("spd".parse::<Backend>().unwrap(), Backend::SpeechDispatcher);
        assert_eq!("espeak-ng".parse::<Backend>().unwrap(), Backend::Espeak);
        assert_eq!("AUTO".parse::<Backend>().unwrap(), Backend::Auto);
        assert!("festival".parse::<Backend>().is_err());
    }

    #[test]
    fn config_fills_missing_fields() {
        let config: NarrationConfig =
            serde_json::from_str(r#"{ "backend": "espeak", "start_enabled": true }"#).unwrap();
        assert_eq!(config.backend, Backend::Espeak);
        assert!(config.start_enabled);
        assert_eq!(config.rate, DEFAULT_RATE);
        assert_eq!(config.pitch, DEFAULT_PITCH);
    }
}
