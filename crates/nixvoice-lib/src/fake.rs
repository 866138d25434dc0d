//! In-memory platform doubles for tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::{oneshot, watch};

use nixvoice_core::types::{NarrationRequest, UtteranceEnd, VoiceOption};

use crate::error::{NarrationError, NarrationResult};
use crate::platform::SpeechSynthesizer;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SynthEvent {
    Spoke {
        text: String,
        voice: String,
        rate: f32,
        pitch: f32,
    },
    Cancelled,
}

/// Records every call and completes utterances only when told to.
pub(crate) struct FakeSynthesizer {
    voices_tx: watch::Sender<Vec<VoiceOption>>,
    events: Mutex<Vec<SynthEvent>>,
    in_flight: Mutex<Option<oneshot::Sender<UtteranceEnd>>>,
    reject: AtomicBool,
}

impl FakeSynthesizer {
    pub(crate) fn new(voices: Vec<VoiceOption>) -> Arc<Self> {
        let (voices_tx, _) = watch::channel(voices);
        Arc::new(Self {
            voices_tx,
            events: Mutex::new(Vec::new()),
            in_flight: Mutex::new(None),
            reject: AtomicBool::new(false),
        })
    }

    pub(crate) fn with_default_voice() -> Arc<Self> {
        Self::new(vec![VoiceOption::new("en-us", "Default", "en-US")])
    }

    pub(crate) fn set_voices(&self, voices: Vec<VoiceOption>) {
        self.voices_tx.send_replace(voices);
    }

    pub(crate) fn reject_speech(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }

    pub(crate) fn events(&self) -> Vec<SynthEvent> {
        self.events.lock().unwrap().clone()
    }

    pub(crate) fn spoken(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SynthEvent::Spoke { text, .. } => Some(text),
                SynthEvent::Cancelled => None,
            })
            .collect()
    }

    /// Finish the in-flight utterance with `end`.
    pub(crate) fn finish(&self, end: UtteranceEnd) {
        if let Some(tx) = self.in_flight.lock().unwrap().take() {
            let _ = tx.send(end);
        }
    }
}

impl SpeechSynthesizer for FakeSynthesizer {
    fn name(&self) -> &str {
        "fake"
    }

    fn voices(&self) -> watch::Receiver<Vec<VoiceOption>> {
        self.voices_tx.subscribe()
    }

    fn speak(
        &self,
        voice: &VoiceOption,
        request: &NarrationRequest,
    ) -> NarrationResult<oneshot::Receiver<UtteranceEnd>> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(NarrationError::Synthesis("rejected".into()));
        }
        self.events.lock().unwrap().push(SynthEvent::Spoke {
            text: request.text.clone(),
            voice: voice.id.clone(),
            rate: request.rate,
            pitch: request.pitch,
        });
        let (tx, rx) = oneshot::channel();
        *self.in_flight.lock().unwrap() = Some(tx);
        Ok(rx)
    }

    fn cancel(&self) {
        self.events.lock().unwrap().push(SynthEvent::Cancelled);
        if let Some(tx) = self.in_flight.lock().unwrap().take() {
            let _ = tx.send(UtteranceEnd::Cancelled);
        }
    }
}

