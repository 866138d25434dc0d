//! Recognition bridge — recognized phrases in, navigation intents and canned
//! responses out.
//!
//! ```text
//! start_listening() → recognizer.start() → [mpsc] phrases
//!     → match_command() → Navigate(page) → [broadcast] NavigationIntent
//!                       → Respond(text)  → narrator.speak(text)
//!                       → Silence        → narrator.stop()
//! ```
//!
//! Unmatched phrases are dropped. Without a recognizer the listening flag
//! still toggles so the UI can show its state.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde::Serialize;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use nixvoice_core::commands::{CommandAction, VoiceCommand, match_command};
use nixvoice_core::pages::Page;

use crate::error::{NarrationError, NarrationResult};
use crate::narrator::Narrator;
use crate::platform::SpeechRecognizer;

/// Capacity of the intent broadcast channel. Slow subscribers lose the
/// oldest intents first.
const INTENT_CAPACITY: usize = 16;

/// Capacity of a [`ChannelRecognizer`] phrase channel.
const PHRASE_CAPACITY: usize = 32;

/// Request for the UI to navigate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavigationIntent {
    pub page: Page,
    pub route: &'static str,
}

impl From<Page> for NavigationIntent {
    fn from(page: Page) -> Self {
        Self {
            page,
            route: page.route(),
        }
    }
}

// ─── Bridge ────────────────────────────────────────────────────────────────

/// Cloneable handle to the recognition bridge.
#[derive(Clone)]
pub struct RecognitionBridge {
    inner: Arc<BridgeInner>,
}

struct BridgeInner {
    recognizer: Option<Arc<dyn SpeechRecognizer>>,
    narrator: Narrator,
    intents_tx: broadcast::Sender<NavigationIntent>,
    listening: AtomicBool,
    /// Bumped per listening session so a stale consumer cannot end a newer one.
    generation: AtomicU64,
    session: Mutex<Option<JoinHandle<()>>>,
}

impl RecognitionBridge {
    pub fn new(narrator: Narrator, recognizer: Option<Arc<dyn SpeechRecognizer>>) -> Self {
        let (intents_tx, _) = broadcast::channel(INTENT_CAPACITY);
        Self {
            inner: Arc::new(BridgeInner {
                recognizer,
                narrator,
                intents_tx,
                listening: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                session: Mutex::new(None),
            }),
        }
    }

    pub fn is_listening(&self) -> bool {
        self.inner.listening.load(Ordering::SeqCst)
    }

    /// Start listening. A recognizer that fails to start leaves the bridge
    /// idle; the failure is logged, never surfaced.
    pub fn start_listening(&self) {
        let inner = &self.inner;
        let mut session = inner.session();
        if inner.listening.load(Ordering::SeqCst) {
            return;
        }

        if let Some(recognizer) = &inner.recognizer {
            match recognizer.start() {
                Ok(phrases) => {
                    let generation = inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
                    let weak = Arc::downgrade(inner);
                    *session = Some(tokio::spawn(consume(phrases, weak, generation)));
                }
                Err(e) => {
                    warn!("recognizer failed to start: {e}");
                    return;
                }
            }
        }

        inner.set_listening(true);
        info!("listening started");
    }

    pub fn stop_listening(&self) {
        let inner = &self.inner;
        let mut session = inner.session();
        if !inner.listening.load(Ordering::SeqCst) {
            return;
        }

        if let Some(recognizer) = &inner.recognizer {
            recognizer.stop();
        }
        if let Some(task) = session.take() {
            task.abort();
        }

        inner.set_listening(false);
        info!("listening stopped");
    }

    /// Route one recognized phrase. Returns the matched command, if any.
    pub fn handle_phrase(&self, phrase: &str) -> Option<VoiceCommand> {
        self.inner.dispatch(phrase)
    }

    /// Subscribe to navigation intents.
    pub fn subscribe_intents(&self) -> broadcast::Receiver<NavigationIntent> {
        self.inner.intents_tx.subscribe()
    }
}

impl BridgeInner {
    fn session(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_listening(&self, listening: bool) {
        self.listening.store(listening, Ordering::SeqCst);
        self.narrator.set_listening(listening);
    }

    fn dispatch(&self, phrase: &str) -> Option<VoiceCommand> {
        let Some(command) = match_command(phrase) else {
            debug!(phrase, "unrecognized phrase dropped");
            return None;
        };

        info!(?command, "voice command");
        match command.action() {
            CommandAction::Respond(text) => self.narrator.speak(text),
            CommandAction::Navigate(page) => {
                // No subscribers is fine; nobody is routing right now.
                let _ = self.intents_tx.send(page.into());
            }
            CommandAction::Silence => self.narrator.stop(),
        }
        Some(command)
    }
}

async fn consume(mut phrases: mpsc::Receiver<String>, bridge: Weak<BridgeInner>, generation: u64) {
    while let Some(phrase) = phrases.recv().await {
        let Some(inner) = bridge.upgrade() else { return };
        inner.dispatch(&phrase);
    }

    // The recognizer hung up on its own.
    if let Some(inner) = bridge.upgrade() {
        let mut session = inner.session();
        if inner.generation.load(Ordering::SeqCst) == generation
            && inner.listening.load(Ordering::SeqCst)
        {
            session.take();
            inner.set_listening(false);
            debug!("recognizer closed its phrase stream");
        }
    }
}

// ─── Channel recognizer ────────────────────────────────────────────────────

/// Recognizer fed by the application itself: typed commands, an HTTP route,
/// or a transcription service living elsewhere.
#[derive(Default)]
pub struct ChannelRecognizer {
    tx: Mutex<Option<mpsc::Sender<String>>>,
}

impl ChannelRecognizer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Push a recognized phrase. Fails when not listening or when the
    /// bridge has fallen behind.
    pub fn feed(&self, phrase: impl Into<String>) -> NarrationResult<()> {
        let guard = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        let tx = guard
            .as_ref()
            .ok_or_else(|| NarrationError::Recognition("not listening".into()))?;
        tx.try_send(phrase.into())
            .map_err(|e| NarrationError::Recognition(e.to_string()))
    }
}

impl SpeechRecognizer for ChannelRecognizer {
    fn start(&self) -> NarrationResult<mpsc::Receiver<String>> {
        let (tx, rx) = mpsc::channel(PHRASE_CAPACITY);
        *self.tx.lock().unwrap_or_else(PoisonError::into_inner) = Some(tx);
        Ok(rx)
    }

    fn stop(&self) {
        self.tx.lock().unwrap_or_else(PoisonError::into_inner).take();
    }
}
