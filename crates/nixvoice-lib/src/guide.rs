//! Voice guide — the one object UI collaborators talk to.
//!
//! Built once by the composition root and handed out by clone. Owns the
//! narration controller and the recognition bridge.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tracing::info;

use nixvoice_core::pages::Page;
use nixvoice_core::types::{NarrationConfig, NarrationStatus, VoiceOption};

use crate::capability::{self, Detection};
use crate::narrator::Narrator;
use crate::platform::SpeechRecognizer;
use crate::recognition::{NavigationIntent, RecognitionBridge};

#[derive(Clone)]
pub struct VoiceGuide {
    narrator: Narrator,
    bridge: RecognitionBridge,
}

impl VoiceGuide {
    /// Detect the host backend from `config` and build the guide.
    /// Must be called from async context.
    pub fn detect(config: NarrationConfig, recognizer: Option<Arc<dyn SpeechRecognizer>>) -> Self {
        let detection = capability::detect(config.backend);
        Self::new(detection, config, recognizer)
    }

    pub fn new(
        detection: Detection,
        config: NarrationConfig,
        recognizer: Option<Arc<dyn SpeechRecognizer>>,
    ) -> Self {
        let narrator = Narrator::new(detection, config);
        let bridge = RecognitionBridge::new(narrator.clone(), recognizer);
        Self { narrator, bridge }
    }

    pub fn is_enabled(&self) -> bool {
        self.narrator.is_enabled()
    }

    pub fn is_listening(&self) -> bool {
        self.bridge.is_listening()
    }

    pub fn speak(&self, text: &str) {
        self.narrator.speak(text);
    }

    /// Speak the page's mount-time guidance. Pages without one stay quiet.
    pub fn announce(&self, page: Page) {
        if let Some(prompt) = page.prompt() {
            self.narrator.speak(prompt);
        }
    }

    pub fn toggle_voice(&self) -> bool {
        self.narrator.toggle_voice()
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.narrator.set_enabled(enabled);
    }

    pub fn stop(&self) {
        self.narrator.stop();
    }

    pub fn start_listening(&self) {
        self.bridge.start_listening();
    }

    pub fn stop_listening(&self) {
        self.bridge.stop_listening();
    }

    pub fn status(&self) -> NarrationStatus {
        self.narrator.status()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<NarrationStatus> {
        self.narrator.subscribe_status()
    }

    pub fn subscribe_intents(&self) -> broadcast::Receiver<NavigationIntent> {
        self.bridge.subscribe_intents()
    }

    pub fn voices(&self) -> Vec<VoiceOption> {
        self.narrator.voices()
    }

    pub fn selected_voice(&self) -> Option<VoiceOption> {
        self.narrator.selected_voice()
    }

    pub fn narrator(&self) -> &Narrator {
        &self.narrator
    }

    pub fn bridge(&self) -> &RecognitionBridge {
        &self.bridge
    }

    /// Silence narration and stop listening. Call on application teardown.
    pub fn shutdown(&self) {
        self.bridge.stop_listening();
        self.narrator.stop();
        info!("voice guide shut down");
    }
}
