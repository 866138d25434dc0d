//! Command-line speech backends — speech-dispatcher (`spd-say`) and espeak.
//!
//! Each utterance is one child process. The child's exit is the completion
//! signal; cancelling kills it. speech-dispatcher queues audio in its daemon,
//! so cancelling a playing utterance there also sends `spd-say -C`.
//!
//! Utterances are chained: a new child is not spawned until the previous
//! utterance's task has killed its child and flushed the daemon.
//!
//! Voice lists are enumerated in a background task right after construction,
//! so the list starts empty and fills in once the backend answers.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot::error::TryRecvError;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use nixvoice_core::types::{NarrationRequest, UtteranceEnd, VoiceOption};

use crate::error::NarrationResult;
use crate::platform::SpeechSynthesizer;

/// espeak's default speaking rate in words per minute.
const ESPEAK_BASE_WPM: f32 = 175.0;
/// espeak's default pitch on its 0–99 scale.
const ESPEAK_BASE_PITCH: f32 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    SpeechDispatcher,
    Espeak,
}

impl EngineKind {
    pub fn name(self) -> &'static str {
        match self {
            EngineKind::SpeechDispatcher => "speech-dispatcher",
            EngineKind::Espeak => "espeak",
        }
    }

    /// Binaries to probe for, in order.
    pub fn binaries(self) -> &'static [&'static str] {
        match self {
            EngineKind::SpeechDispatcher => &["spd-say"],
            EngineKind::Espeak => &["espeak-ng", "espeak"],
        }
    }

    fn list_voices_arg(self) -> &'static str {
        match self {
            EngineKind::SpeechDispatcher => "-L",
            EngineKind::Espeak => "--voices",
        }
    }

    /// Arguments for one utterance.
    pub fn speak_args(self, voice: &VoiceOption, request: &NarrationRequest) -> Vec<String> {
        let text = request.text.clone();
        match self {
            EngineKind::SpeechDispatcher => {
                let rate = scale_signed(request.rate);
                let pitch = scale_signed(request.pitch);
                vec![
                    "-w".into(),
                    "-r".into(),
                    rate.to_string(),
                    "-p".into(),
                    pitch.to_string(),
                    "-y".into(),
                    voice.id.clone(),
                    "--".into(),
                    text,
                ]
            }
            EngineKind::Espeak => {
                let wpm = (ESPEAK_BASE_WPM * request.rate).round().clamp(80.0, 450.0) as u32;
                let pitch = (ESPEAK_BASE_PITCH * request.pitch).round().clamp(0.0, 99.0) as u32;
                vec![
                    "-s".into(),
                    wpm.to_string(),
                    "-p".into(),
                    pitch.to_string(),
                    "-v".into(),
                    voice.id.clone(),
                    "--".into(),
                    text,
                ]
            }
        }
    }

    pub fn parse_voices(self, output: &str) -> Vec<VoiceOption> {
        match self {
            EngineKind::SpeechDispatcher => parse_spd_voices(output),
            EngineKind::Espeak => parse_espeak_voices(output),
        }
    }
}

/// Map a baseline multiplier onto speech-dispatcher's -100..=100 scale.
fn scale_signed(multiplier: f32) -> i32 {
    ((multiplier - 1.0) * 100.0).round().clamp(-100.0, 100.0) as i32
}

/// Synthesizer backed by a speech CLI.
pub struct CommandSynthesizer {
    kind: EngineKind,
    bin: PathBuf,
    voices_tx: watch::Sender<Vec<VoiceOption>>,
    current: Mutex<Slot>,
}

/// The most recent utterance. `kill` is present while it may still be
/// playing; `task` is kept so the next utterance can wait for it to end.
#[derive(Default)]
struct Slot {
    kill: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl CommandSynthesizer {
    /// Create the backend and start loading its voice list. Must be called
    /// from async context.
    pub fn new(kind: EngineKind, bin: PathBuf) -> Arc<Self> {
        let (voices_tx, _) = watch::channel(Vec::new());
        let synth = Arc::new(Self {
            kind,
            bin,
            voices_tx,
            current: Mutex::new(Slot::default()),
        });

        let loader = synth.clone();
        tokio::spawn(async move {
            loader.load_voices().await;
        });

        synth
    }

    pub fn kind(&self) -> EngineKind {
        self.kind
    }

    pub fn bin(&self) -> &Path {
        &self.bin
    }

    async fn load_voices(&self) {
        let output = tokio::process::Command::new(&self.bin)
            .arg(self.kind.list_voices_arg())
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await;

        let voices = match output {
            Ok(out) if out.status.success() => {
                self.kind.parse_voices(&String::from_utf8_lossy(&out.stdout))
            }
            Ok(out) => {
                warn!(backend = self.kind.name(), status = %out.status, "voice listing failed");
                return;
            }
            Err(e) => {
                warn!(backend = self.kind.name(), "voice listing failed: {e}");
                return;
            }
        };

        info!(backend = self.kind.name(), count = voices.len(), "voices loaded");
        self.voices_tx.send_replace(voices);
    }

    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SpeechSynthesizer for CommandSynthesizer {
    fn name(&self) -> &str {
        self.kind.name()
    }

    fn voices(&self) -> watch::Receiver<Vec<VoiceOption>> {
        self.voices_tx.subscribe()
    }

    fn speak(
        &self,
        voice: &VoiceOption,
        request: &NarrationRequest,
    ) -> NarrationResult<oneshot::Receiver<UtteranceEnd>> {
        let (done_tx, done_rx) = oneshot::channel();
        let (kill_tx, kill_rx) = oneshot::channel();

        let utterance = Utterance {
            kind: self.kind,
            bin: self.bin.clone(),
            args: self.kind.speak_args(voice, request),
        };

        let mut slot = self.slot();
        // Dropping the previous kill switch cancels that utterance; the new
        // child is only spawned once the previous task has finished.
        slot.kill = Some(kill_tx);
        let previous = slot.task.take();
        slot.task = Some(tokio::spawn(utterance.run(previous, kill_rx, done_tx)));

        debug!(backend = self.kind.name(), chars = request.text.len(), "utterance queued");
        Ok(done_rx)
    }

    fn cancel(&self) {
        if let Some(kill) = self.slot().kill.take() {
            let _ = kill.send(());
        }
    }
}

/// One child process invocation.
struct Utterance {
    kind: EngineKind,
    bin: PathBuf,
    args: Vec<String>,
}

impl Utterance {
    async fn run(
        self,
        previous: Option<JoinHandle<()>>,
        mut kill_rx: oneshot::Receiver<()>,
        done_tx: oneshot::Sender<UtteranceEnd>,
    ) {
        if let Some(previous) = previous {
            let _ = previous.await;
        }

        // Superseded before it got to start.
        if !matches!(kill_rx.try_recv(), Err(TryRecvError::Empty)) {
            let _ = done_tx.send(UtteranceEnd::Cancelled);
            return;
        }

        let spawned = tokio::process::Command::new(&self.bin)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn();
        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                let _ = done_tx.send(UtteranceEnd::Failed(e.to_string()));
                return;
            }
        };
        debug!(backend = self.kind.name(), "utterance started");

        let exited = tokio::select! {
            status = child.wait() => Some(status),
            _ = kill_rx => None,
        };

        let end = match exited {
            Some(Ok(status)) if status.success() => UtteranceEnd::Completed,
            Some(Ok(status)) => UtteranceEnd::Failed(format!("exited with {status}")),
            Some(Err(e)) => UtteranceEnd::Failed(e.to_string()),
            None => {
                if let Err(e) = child.kill().await {
                    debug!("kill failed: {e}");
                }
                self.flush_daemon().await;
                UtteranceEnd::Cancelled
            }
        };

        let _ = done_tx.send(end);
    }

    /// speech-dispatcher may still hold our queued audio after the client
    /// dies. Only sent for an utterance that was actually playing.
    async fn flush_daemon(&self) {
        if self.kind != EngineKind::SpeechDispatcher {
            return;
        }
        let status = tokio::process::Command::new(&self.bin)
            .arg("-C")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
        if let Err(e) = status {
            debug!("spd-say -C failed: {e}");
        }
    }
}

// ─── Voice list parsing ────────────────────────────────────────────────────

/// Parse `spd-say -L`: a `NAME LANGUAGE VARIANT` table. Names may contain
/// spaces, so columns are taken from the right.
pub fn parse_spd_voices(output: &str) -> Vec<VoiceOption> {
    output
        .lines()
        .filter_map(|line| {
            let cols: Vec<&str> = line.split_whitespace().collect();
            if cols.len() < 3 || cols[0] == "NAME" {
                return None;
            }
            let lang = cols[cols.len() - 2];
            let name = cols[..cols.len() - 2].join(" ");
            Some(VoiceOption::new(name.clone(), name, canonical_lang(lang)))
        })
        .collect()
}

/// Parse `espeak-ng --voices`:
/// `Pty Language Age/Gender VoiceName File [Other Languages]`.
pub fn parse_espeak_voices(output: &str) -> Vec<VoiceOption> {
    output
        .lines()
        .filter_map(|line| {
            let cols: Vec<&str> = line.split_whitespace().collect();
            if cols.len() < 5 || cols[0] == "Pty" {
                return None;
            }
            let lang = cols[1];
            let name = cols[3].replace('_', " ");
            Some(VoiceOption::new(lang, name, canonical_lang(lang)))
        })
        .collect()
}

/// Canonical casing for a language tag: `en-us` → `en-US`,
/// `zh-hant-tw` → `zh-Hant-TW`.
pub fn canonical_lang(tag: &str) -> String {
    tag.split(['-', '_'])
        .enumerate()
        .map(|(i, part)| match (i, part.len()) {
            (0, _) => part.to_ascii_lowercase(),
            (_, 2) => part.to_ascii_uppercase(),
            (_, 4) => {
                let mut chars = part.chars();
                match chars.next() {
                    Some(first) => {
                        first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
                    }
                    None => String::new(),
                }
            }
            _ => part.to_ascii_lowercase(),
        })
        .collect::<Vec<_>>()
        .join("-")
}
