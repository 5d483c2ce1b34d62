//! Terminal speech engines: lines are "spoken" to stdout and "heard" from
//! stdin.

use std::io::Write;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::{Mutex, Notify};

use super::speech::{SpeechError, SpeechRecognizer, SpeechSynthesizer};

#[derive(Default)]
pub struct ConsoleSynthesizer;

#[async_trait]
impl SpeechSynthesizer for ConsoleSynthesizer {
    async fn speak(&self, text: &str) -> Result<(), SpeechError> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "AI: {}", text).map_err(|e| SpeechError::Platform(e.to_string()))?;
        stdout.flush().map_err(|e| SpeechError::Platform(e.to_string()))
    }

    fn cancel(&self) {}
}

pub struct ConsoleRecognizer {
    lines: Mutex<Lines<BufReader<Stdin>>>,
    abort: Notify,
}

impl ConsoleRecognizer {
    pub fn new() -> Self {
        Self {
            lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
            abort: Notify::new(),
        }
    }
}

impl Default for ConsoleRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechRecognizer for ConsoleRecognizer {
    async fn recognize(&self) -> Result<String, SpeechError> {
        print!("You: ");
        let _ = std::io::stdout().flush();

        let mut lines = self.lines.lock().await;
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(text)) if text.trim().is_empty() => Err(SpeechError::NoSpeech),
                Ok(Some(text)) => Ok(text.trim().to_string()),
                Ok(None) => Err(SpeechError::Platform("input closed".to_string())),
                Err(e) => Err(SpeechError::Platform(e.to_string())),
            },
            _ = self.abort.notified() => Err(SpeechError::Aborted),
        }
    }

    fn abort(&self) {
        self.abort.notify_waiters();
    }
}
