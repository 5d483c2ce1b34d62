//! Speech I/O shared by both conversational flows.
//!
//! Platform engines plug in through [`SpeechSynthesizer`] and
//! [`SpeechRecognizer`]. [`SpeechIo`] wraps a pair of them and enforces the
//! turn-taking rules: utterances never overlap, at most one recognition is in
//! flight, and every synthesized line lands in the session transcript.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::transcript::{Speaker, Transcript, TranscriptEntry};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpeechError {
    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),
    #[error("no speech detected")]
    NoSpeech,
    #[error("microphone permission denied")]
    PermissionDenied,
    #[error("speech operation aborted")]
    Aborted,
    #[error("speech platform error: {0}")]
    Platform(String),
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    fn is_available(&self) -> bool {
        true
    }

    /// Resolves once playback of `text` has finished.
    async fn speak(&self, text: &str) -> Result<(), SpeechError>;

    /// Halts playback; a pending `speak` must resolve promptly.
    fn cancel(&self);
}

#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    fn is_available(&self) -> bool {
        true
    }

    /// Resolves with one recognized utterance.
    async fn recognize(&self) -> Result<String, SpeechError>;

    /// Halts recognition; a pending `recognize` must resolve promptly.
    fn abort(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Availability {
    pub synthesis: bool,
    pub recognition: bool,
}

impl Availability {
    pub fn is_degraded(&self) -> bool {
        !(self.synthesis && self.recognition)
    }

    pub fn warning(&self) -> Option<&'static str> {
        match (self.synthesis, self.recognition) {
            (true, true) => None,
            (true, false) => Some("Speech recognition is not supported in this environment"),
            (false, true) => Some("Speech synthesis is not supported in this environment"),
            (false, false) => Some("Speech input and output are not supported in this environment"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenOutcome {
    Heard(String),
    /// Another listen was already active; nothing was started.
    AlreadyListening,
}

struct ListenTicket<'a> {
    slot: &'a AtomicU64,
    ticket: u64,
}

impl Drop for ListenTicket<'_> {
    fn drop(&mut self) {
        // A cancel may already have released the slot for a newer listen.
        let _ = self
            .slot
            .compare_exchange(self.ticket, 0, Ordering::AcqRel, Ordering::Acquire);
    }
}

pub struct SpeechIo {
    synth: Arc<dyn SpeechSynthesizer>,
    recognizer: Arc<dyn SpeechRecognizer>,
    transcript: Mutex<Transcript>,
    playback: tokio::sync::Mutex<()>,
    speaking: AtomicBool,
    active_listen: AtomicU64,
    next_ticket: AtomicU64,
}

impl SpeechIo {
    pub fn new(synth: Arc<dyn SpeechSynthesizer>, recognizer: Arc<dyn SpeechRecognizer>) -> Self {
        Self {
            synth,
            recognizer,
            transcript: Mutex::new(Transcript::default()),
            playback: tokio::sync::Mutex::new(()),
            speaking: AtomicBool::new(false),
            active_listen: AtomicU64::new(0),
            next_ticket: AtomicU64::new(1),
        }
    }

    pub fn availability(&self) -> Availability {
        Availability {
            synthesis: self.synth.is_available(),
            recognition: self.recognizer.is_available(),
        }
    }

    /// Records `text` as an AI line and plays it, waiting for any earlier
    /// utterance to finish first. Playback errors count as completion.
    pub async fn speak(&self, text: &str) {
        self.lock_transcript().push(Speaker::Ai, text);

        if !self.synth.is_available() {
            tracing::warn!("Speech synthesis unavailable, utterance only recorded");
            return;
        }

        let _turn = self.playback.lock().await;
        self.speaking.store(true, Ordering::Release);
        let result = self.synth.speak(text).await;
        self.speaking.store(false, Ordering::Release);

        if let Err(e) = result {
            tracing::warn!(error = %e, "Speech synthesis ended with an error");
        }
    }

    /// Waits for one utterance. A call made while another listen is active
    /// returns [`ListenOutcome::AlreadyListening`] without touching the
    /// recognizer.
    pub async fn listen(&self) -> Result<ListenOutcome, SpeechError> {
        if !self.recognizer.is_available() {
            return Err(SpeechError::Unsupported("speech recognition"));
        }

        let ticket = self.next_ticket.fetch_add(1, Ordering::AcqRel);
        if self
            .active_listen
            .compare_exchange(0, ticket, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Already listening, skipping");
            return Ok(ListenOutcome::AlreadyListening);
        }
        let _ticket = ListenTicket {
            slot: &self.active_listen,
            ticket,
        };

        tracing::debug!("Starting speech recognition");
        let text = self.recognizer.recognize().await?;
        Ok(ListenOutcome::Heard(text))
    }

    pub fn record_user(&self, text: &str) {
        self.lock_transcript().push(Speaker::User, text);
    }

    /// Synchronously halts playback and recognition.
    pub fn cancel(&self) {
        self.synth.cancel();
        self.recognizer.abort();
        self.active_listen.store(0, Ordering::Release);
        self.speaking.store(false, Ordering::Release);
    }

    pub fn clear_transcript(&self) {
        self.lock_transcript().clear();
    }

    pub fn transcript(&self) -> Vec<TranscriptEntry> {
        self.lock_transcript().entries().to_vec()
    }

    pub fn is_listening(&self) -> bool {
        self.active_listen.load(Ordering::Acquire) != 0
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::Acquire)
    }

    fn lock_transcript(&self) -> MutexGuard<'_, Transcript> {
        match self.transcript.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
