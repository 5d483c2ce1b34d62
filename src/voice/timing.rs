use std::time::Duration;

/// Fixed pauses between conversational steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowTimings {
    /// Gap between the end of a prompt and the start of listening, so the
    /// recognizer does not pick up the synthesized audio.
    pub post_speech_delay: Duration,
    pub turn_pause: Duration,
    pub greeting_pause: Duration,
    pub confirmation_pause: Duration,
    pub readback_pause: Duration,
    pub completion_pause: Duration,
    pub navigate_delay: Duration,
}

impl Default for FlowTimings {
    fn default() -> Self {
        Self {
            post_speech_delay: Duration::from_millis(500),
            turn_pause: Duration::from_secs(1),
            greeting_pause: Duration::from_millis(1500),
            confirmation_pause: Duration::from_secs(2),
            readback_pause: Duration::from_secs(2),
            completion_pause: Duration::from_secs(1),
            navigate_delay: Duration::from_secs(2),
        }
    }
}

impl FlowTimings {
    pub fn immediate() -> Self {
        Self {
            post_speech_delay: Duration::ZERO,
            turn_pause: Duration::ZERO,
            greeting_pause: Duration::ZERO,
            confirmation_pause: Duration::ZERO,
            readback_pause: Duration::ZERO,
            completion_pause: Duration::ZERO,
            navigate_delay: Duration::ZERO,
        }
    }
}

pub(crate) async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
