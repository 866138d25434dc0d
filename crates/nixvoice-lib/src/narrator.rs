//! Narration controller — one utterance at a time, gated by the enabled flag.
//!
//! ```text
//! speak("text") → enabled? capable? voice selected?
//!     → synth.cancel() if speaking → synth.speak() → speaking = true
//!     → [oneshot] utterance end → speaking = false (if still current)
//! ```
//!
//! Last caller wins: a new `speak` cancels the utterance in flight before
//! starting its own. There is no queue.
//!
//! Epoch-based supersession: every dispatch bumps an [`AtomicU64`]. The end
//! signal of a superseded utterance carries an old epoch and is ignored, so it
//! cannot flip `speaking` back to false under the newer utterance.
//!
//! Disabling narration cancels the utterance in flight, which keeps
//! `speaking` from ever being true while narration is disabled.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{oneshot, watch};
use tracing::{debug, info, warn};

use nixvoice_core::select::select_voice;
use nixvoice_core::text_prep::prepare_narration;
use nixvoice_core::types::{
    NarrationConfig, NarrationPhase, NarrationStatus, UtteranceEnd, VoiceCapability, VoiceOption,
};

use crate::capability::Detection;
use crate::error::{NarrationError, NarrationResult};
use crate::platform::SpeechSynthesizer;

/// Cloneable handle to the narration controller. All methods are non-blocking.
#[derive(Clone)]
pub struct Narrator {
    inner: Arc<Inner>,
}

struct Inner {
    capability: VoiceCapability,
    synth: Option<Arc<dyn SpeechSynthesizer>>,
    config: NarrationConfig,
    /// Held across a whole dispatch so concurrent callers cannot interleave
    /// cancel and speak.
    state: Mutex<State>,
    epoch: AtomicU64,
    status_tx: watch::Sender<NarrationStatus>,
}

struct State {
    enabled: bool,
    voice: Option<VoiceOption>,
}

// ─── Construction ──────────────────────────────────────────────────────────

impl Narrator {
    /// Build the controller over a detected backend. Must be called from
    /// async context: a task follows the platform's voice list for as long as
    /// the narrator lives.
    pub fn new(detection: Detection, config: NarrationConfig) -> Self {
        let enabled = config.start_enabled;
        let (status_tx, _) =
            watch::channel(NarrationStatus::initial(detection.capability, enabled));

        let inner = Arc::new(Inner {
            capability: detection.capability,
            synth: detection.synthesizer,
            config,
            state: Mutex::new(State {
                enabled,
                voice: None,
            }),
            epoch: AtomicU64::new(0),
            status_tx,
        });

        if let Some(synth) = &inner.synth {
            let mut voices = synth.voices();
            let initial = voices.borrow_and_update().clone();
            inner.reselect(&initial);

            // Voices may load lazily; re-run selection on every change.
            let weak = Arc::downgrade(&inner);
            tokio::spawn(async move {
                while voices.changed().await.is_ok() {
                    let Some(inner) = weak.upgrade() else { break };
                    let list = voices.borrow_and_update().clone();
                    inner.reselect(&list);
                }
            });
        }

        Self { inner }
    }

    /// A narrator with no speech capability. Every `speak` is a no-op.
    pub fn unavailable(config: NarrationConfig) -> Self {
        Self::new(Detection::unavailable(), config)
    }
}

// ─── Public operations ─────────────────────────────────────────────────────

impl Narrator {
    /// Speak `text`, pre-empting anything already playing.
    ///
    /// Silently does nothing when narration is disabled, the host has no
    /// speech capability, no voice is selected, or the text is blank.
    /// Platform failures are logged and swallowed.
    pub fn speak(&self, text: &str) {
        match self.try_speak(text) {
            Ok(_) => {}
            Err(e) if e.is_policy() => debug!("speak skipped: {e}"),
            Err(e) => warn!("speak failed: {e}"),
        }
    }

    /// Like [`speak`](Self::speak) but reports why nothing was spoken.
    /// `Ok(false)` means narration is disabled or the text was blank.
    pub fn try_speak(&self, text: &str) -> NarrationResult<bool> {
        let inner = &self.inner;
        let state = inner.state();

        if !state.enabled {
            debug!("narration disabled, prompt dropped");
            return Ok(false);
        }
        let synth = inner
            .synth
            .as_ref()
            .ok_or(NarrationError::CapabilityUnavailable)?;
        let voice = state.voice.as_ref().ok_or(NarrationError::NoVoiceSelected)?;
        let Some(text) = prepare_narration(text) else {
            debug!("nothing speakable in prompt");
            return Ok(false);
        };

        let in_flight = inner.status_tx.borrow().speaking;
        if in_flight {
            synth.cancel();
        }
        let epoch = inner.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let request = inner.config.request(text);

        let done = match synth.speak(voice, &request) {
            Ok(done) => done,
            Err(e) => {
                inner.status_tx.send_modify(|s| s.speaking = false);
                return Err(e);
            }
        };

        debug!(epoch, voice = %voice.name, chars = request.text.len(), "speaking");
        inner.status_tx.send_modify(|s| s.speaking = true);
        drop(state);

        self.watch_completion(epoch, done);
        Ok(true)
    }

    /// Flip the enabled flag. Returns the new value.
    pub fn toggle_voice(&self) -> bool {
        let mut state = self.inner.state();
        let enabled = !state.enabled;
        self.inner.apply_enabled(&mut state, enabled);
        enabled
    }

    /// Set the enabled flag explicitly.
    pub fn set_enabled(&self, enabled: bool) {
        let mut state = self.inner.state();
        self.inner.apply_enabled(&mut state, enabled);
    }

    /// Cancel the utterance in flight, if any. Narration stays enabled.
    pub fn stop(&self) {
        let _state = self.inner.state();
        self.inner.silence();
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.state().enabled
    }

    pub fn is_speaking(&self) -> bool {
        self.inner.status_tx.borrow().speaking
    }

    pub fn phase(&self) -> NarrationPhase {
        self.inner.status_tx.borrow().phase()
    }

    pub fn capability(&self) -> VoiceCapability {
        self.inner.capability
    }

    pub fn config(&self) -> &NarrationConfig {
        &self.inner.config
    }

    pub fn selected_voice(&self) -> Option<VoiceOption> {
        self.inner.state().voice.clone()
    }

    /// The platform's current voice list (empty without a backend).
    pub fn voices(&self) -> Vec<VoiceOption> {
        self.inner
            .synth
            .as_ref()
            .map(|synth| synth.voices().borrow().clone())
            .unwrap_or_default()
    }

    /// Name of the active backend, if any.
    pub fn backend_name(&self) -> Option<String> {
        self.inner.synth.as_ref().map(|s| s.name().to_string())
    }

    /// Get current status.
    pub fn status(&self) -> NarrationStatus {
        self.inner.status_tx.borrow().clone()
    }

    /// Subscribe to status changes.
    pub fn subscribe_status(&self) -> watch::Receiver<NarrationStatus> {
        self.inner.status_tx.subscribe()
    }

    /// Mirror the recognition bridge's listening flag into the status.
    pub(crate) fn set_listening(&self, listening: bool) {
        self.inner
            .status_tx
            .send_if_modified(|s| std::mem::replace(&mut s.listening, listening) != listening);
    }

    fn watch_completion(&self, epoch: u64, done: oneshot::Receiver<UtteranceEnd>) {
        let weak = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            // A dropped sender means the backend went away mid-utterance.
            let end = done.await.unwrap_or(UtteranceEnd::Cancelled);
            match &end {
                UtteranceEnd::Failed(reason) => warn!(epoch, "utterance failed: {reason}"),
                other => debug!(epoch, ?other, "utterance ended"),
            }
            if let Some(inner) = weak.upgrade() {
                inner.finish(epoch);
            }
        });
    }
}

// ─── Internals ─────────────────────────────────────────────────────────────

impl Inner {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn reselect(&self, options: &[VoiceOption]) {
        let selected = select_voice(options).cloned();
        let mut state = self.state();
        if state.voice != selected {
            match &selected {
                Some(v) => info!(voice = %v.name, lang = %v.lang, "voice selected"),
                None => info!("no voices available"),
            }
        }
        let name = selected.as_ref().map(|v| v.name.clone());
        state.voice = selected;
        self.status_tx.send_modify(|s| s.voice = name);
    }

    fn apply_enabled(&self, state: &mut State, enabled: bool) {
        if state.enabled == enabled {
            return;
        }
        state.enabled = enabled;
        if !enabled {
            self.silence();
        }
        self.status_tx.send_modify(|s| s.enabled = enabled);
        info!(enabled, "voice guide toggled");
    }

    /// Cancel the utterance in flight. Caller holds the state lock.
    fn silence(&self) {
        if !self.status_tx.borrow().speaking {
            return;
        }
        if let Some(synth) = &self.synth {
            synth.cancel();
        }
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.status_tx.send_modify(|s| s.speaking = false);
        debug!("narration cancelled");
    }

    fn finish(&self, epoch: u64) {
        self.status_tx.send_if_modified(|s| {
            if s.speaking && self.epoch.load(Ordering::SeqCst) == epoch {
                s.speaking = false;
                true
            } else {
                false
            }
        });
    }
}
