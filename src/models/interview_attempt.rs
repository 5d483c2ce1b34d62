use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use super::answer::AnswerRecord;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InterviewAttempt {
    pub id: Uuid,
    pub interview_id: Uuid,
    pub user_id: String,
    pub answers: Json<Vec<AnswerRecord>>,
    pub total_score: i32,
    pub completed_at: DateTime<Utc>,
}
