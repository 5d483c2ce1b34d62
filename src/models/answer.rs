use serde::{Deserialize, Serialize};

/// One scored answer from a practice session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question: String,
    pub answer: String,
    pub score: f64,
    pub feedback: String,
}
