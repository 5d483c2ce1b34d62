use crate::error::{Error, Result};
use crate::models::feedback::Feedback;
use crate::services::ai_service::FeedbackDraft;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct FeedbackService {
    pool: PgPool,
}

impl FeedbackService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a new feedback row, or overwrites `feedback_id` when given.
    pub async fn upsert(
        &self,
        feedback_id: Option<Uuid>,
        interview_id: Uuid,
        user_id: &str,
        draft: FeedbackDraft,
    ) -> Result<Feedback> {
        let id = feedback_id.unwrap_or_else(Uuid::new_v4);

        let feedback = sqlx::query_as::<_, Feedback>(
            r#"
            INSERT INTO feedback (
                id, interview_id, user_id, total_score, category_scores,
                strengths, areas_for_improvement, final_assessment, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
            ON CONFLICT (id) DO UPDATE SET
                interview_id = EXCLUDED.interview_id,
                user_id = EXCLUDED.user_id,
                total_score = EXCLUDED.total_score,
                category_scores = EXCLUDED.category_scores,
                strengths = EXCLUDED.strengths,
                areas_for_improvement = EXCLUDED.areas_for_improvement,
                final_assessment = EXCLUDED.final_assessment,
                created_at = EXCLUDED.created_at
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(interview_id)
        .bind(user_id)
        .bind(draft.total_score)
        .bind(Json(draft.category_scores))
        .bind(draft.strengths)
        .bind(draft.areas_for_improvement)
        .bind(draft.final_assessment)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(feedback_id = %feedback.id, interview_id = %interview_id, "Feedback stored");
        Ok(feedback)
    }

    pub async fn find_for_interview(&self, interview_id: Uuid, user_id: &str) -> Result<Feedback> {
        sqlx::query_as::<_, Feedback>(
            r#"
            SELECT * FROM feedback
            WHERE interview_id = $1 AND user_id = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(interview_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Feedback not found".to_string()))
    }
}
