use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::answer::AnswerRecord;
use crate::models::interview_attempt::InterviewAttempt;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveAttemptRequest {
    pub interview_id: Option<Uuid>,
    pub user_id: Option<String>,
    pub answers: Option<Vec<AnswerRecord>>,
    pub total_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveAttemptResponse {
    pub success: bool,
    pub attempt_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptsQuery {
    pub user_id: Option<String>,
    pub interview_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptListResponse {
    pub success: bool,
    pub attempts: Vec<InterviewAttempt>,
}
