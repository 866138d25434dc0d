//! Capability detection — finds a speech backend on the host, once, at startup.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use nixvoice_core::types::{Backend, VoiceCapability};

use crate::backend::{CommandSynthesizer, EngineKind};
use crate::platform::SpeechSynthesizer;

/// Outcome of [`detect`].
#[derive(Clone)]
pub struct Detection {
    pub capability: VoiceCapability,
    pub synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
}

impl Detection {
    pub fn unavailable() -> Self {
        Self {
            capability: VoiceCapability::UNAVAILABLE,
            synthesizer: None,
        }
    }

    pub fn with(synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        Self {
            capability: VoiceCapability::AVAILABLE,
            synthesizer: Some(synthesizer),
        }
    }
}

/// Probe the host for a speech backend.
///
/// `Auto` tries speech-dispatcher first, then espeak. Must be called from
/// async context: the chosen backend loads its voice list in the background.
pub fn detect(backend: Backend) -> Detection {
    let candidates: &[EngineKind] = match backend {
        Backend::Auto => &[EngineKind::SpeechDispatcher, EngineKind::Espeak],
        Backend::SpeechDispatcher => &[EngineKind::SpeechDispatcher],
        Backend::Espeak => &[EngineKind::Espeak],
        Backend::None => {
            info!("speech backend disabled by configuration");
            return Detection::unavailable();
        }
    };

    for kind in candidates {
        if let Some(bin) = kind.binaries().iter().find_map(|b| find_on_path(b)) {
            info!(backend = kind.name(), bin = ?bin, "detected speech backend");
            return Detection::with(CommandSynthesizer::new(*kind, bin));
        }
    }

    warn!(?backend, "no speech backend found, narration disabled");
    Detection::unavailable()
}

/// Resolve `bin` against `PATH`. Path-like names are checked directly.
pub fn find_on_path(bin: &str) -> Option<PathBuf> {
    if bin.contains(std::path::MAIN_SEPARATOR) {
        let p = PathBuf::from(bin);
        return p.is_file().then_some(p);
    }

    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(bin))
        .find(|candidate| candidate.is_file())
}
