use crate::error::Result;
use crate::models::answer::AnswerRecord;
use crate::models::interview_attempt::InterviewAttempt;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

pub const MAX_LISTED_ATTEMPTS: i64 = 20;

#[derive(Clone)]
pub struct AttemptService {
    pool: PgPool,
}

impl AttemptService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn save_attempt(
        &self,
        interview_id: Uuid,
        user_id: &str,
        answers: Vec<AnswerRecord>,
        total_score: i32,
    ) -> Result<InterviewAttempt> {
        let attempt = sqlx::query_as::<_, InterviewAttempt>(
            r#"
            INSERT INTO interview_attempts (interview_id, user_id, answers, total_score, completed_at)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING *
            "#,
        )
        .bind(interview_id)
        .bind(user_id)
        .bind(Json(answers))
        .bind(total_score)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(
            attempt_id = %attempt.id,
            interview_id = %interview_id,
            total_score,
            "Interview attempt saved"
        );
        Ok(attempt)
    }

    pub async fn list_for_user(
        &self,
        user_id: &str,
        interview_id: Option<Uuid>,
    ) -> Result<Vec<InterviewAttempt>> {
        let rows = sqlx::query_as::<_, InterviewAttempt>(
            r#"
            SELECT * FROM interview_attempts
            WHERE user_id = $1 AND ($2::uuid IS NULL OR interview_id = $2)
            ORDER BY completed_at DESC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(interview_id)
        .bind(MAX_LISTED_ATTEMPTS)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
