//! Platform seams: speech synthesis and speech recognition.
//!
//! The narration controller and recognition bridge only talk to the host
//! through these traits, so both can be driven by fakes in tests.

use tokio::sync::{mpsc, oneshot, watch};

use nixvoice_core::types::{NarrationRequest, UtteranceEnd, VoiceOption};

use crate::error::NarrationResult;

/// Host text-to-speech service.
pub trait SpeechSynthesizer: Send + Sync {
    /// Short backend name for logs and status.
    fn name(&self) -> &str;

    /// Current voice list. May start empty and fill in later; every change is
    /// published on the channel.
    fn voices(&self) -> watch::Receiver<Vec<VoiceOption>>;

    /// Start rendering `request` with `voice`. Returns immediately; the
    /// receiver resolves when the utterance completes, is cancelled, or fails.
    fn speak(
        &self,
        voice: &VoiceOption,
        request: &NarrationRequest,
    ) -> NarrationResult<oneshot::Receiver<UtteranceEnd>>;

    /// Cancel whatever is currently playing. No-op when idle.
    fn cancel(&self);
}

/// Host speech-recognition service.
pub trait SpeechRecognizer: Send + Sync {
    /// Begin listening. Recognized phrases arrive on the returned channel
    /// until [`stop`](Self::stop) is called.
    fn start(&self) -> NarrationResult<mpsc::Receiver<String>>;

    /// Stop listening and close the phrase channel.
    fn stop(&self);
}
