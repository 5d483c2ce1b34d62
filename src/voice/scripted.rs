//! In-memory speech engines. The synthesizer finishes every utterance at
//! once; the recognizer replays queued results and otherwise waits until a
//! result is pushed or it is aborted.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::Notify;

use super::speech::{SpeechError, SpeechRecognizer, SpeechSynthesizer};

pub struct ScriptedSynthesizer {
    spoken: Mutex<Vec<String>>,
    cancels: AtomicUsize,
    available: bool,
}

impl ScriptedSynthesizer {
    pub fn new() -> Self {
        Self {
            spoken: Mutex::new(Vec::new()),
            cancels: AtomicUsize::new(0),
            available: true,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn cancels(&self) -> usize {
        self.cancels.load(Ordering::Acquire)
    }
}

impl Default for ScriptedSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechSynthesizer for ScriptedSynthesizer {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn speak(&self, text: &str) -> Result<(), SpeechError> {
        if let Ok(mut spoken) = self.spoken.lock() {
            spoken.push(text.to_string());
        }
        tokio::task::yield_now().await;
        Ok(())
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::AcqRel);
    }
}

pub struct ScriptedRecognizer {
    queue: Mutex<VecDeque<Result<String, SpeechError>>>,
    wake: Notify,
    aborted: AtomicBool,
    calls: AtomicUsize,
    available: bool,
}

impl ScriptedRecognizer {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            wake: Notify::new(),
            aborted: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            available: true,
        }
    }

    pub fn with_script(results: impl IntoIterator<Item = Result<String, SpeechError>>) -> Self {
        let rec = Self::new();
        if let Ok(mut queue) = rec.queue.lock() {
            queue.extend(results);
        }
        rec
    }

    pub fn utterances<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_script(texts.into_iter().map(|t| Ok(t.into())))
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    pub fn push(&self, result: Result<String, SpeechError>) {
        if let Ok(mut queue) = self.queue.lock() {
            queue.push_back(result);
        }
        self.wake.notify_waiters();
    }

    /// Number of recognitions started so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Acquire)
    }
}

impl Default for ScriptedRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechRecognizer for ScriptedRecognizer {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn recognize(&self) -> Result<String, SpeechError> {
        self.calls.fetch_add(1, Ordering::AcqRel);
        self.aborted.store(false, Ordering::Release);

        loop {
            let notified = self.wake.notified();
            if self.aborted.swap(false, Ordering::AcqRel) {
                return Err(SpeechError::Aborted);
            }
            let next = self.queue.lock().ok().and_then(|mut q| q.pop_front());
            if let Some(result) = next {
                return result;
            }
            notified.await;
        }
    }

    fn abort(&self) {
        self.aborted.store(true, Ordering::Release);
        self.wake.notify_waiters();
    }
}
