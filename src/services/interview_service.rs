use crate::error::{Error, Result};
use crate::models::interview::{Interview, NewInterview};
use rand::seq::SliceRandom;
use rand::Rng;
use sqlx::PgPool;
use uuid::Uuid;

const COVER_IMAGES: [&str; 8] = [
    "/covers/adobe.png",
    "/covers/amazon.png",
    "/covers/facebook.png",
    "/covers/hostinger.png",
    "/covers/pinterest.png",
    "/covers/quora.png",
    "/covers/reddit.png",
    "/covers/spotify.png",
];

pub fn random_cover(rng: &mut impl Rng) -> String {
    COVER_IMAGES
        .choose(rng)
        .copied()
        .unwrap_or(COVER_IMAGES[0])
        .to_string()
}

#[derive(Clone)]
pub struct InterviewService {
    pool: PgPool,
}

impl InterviewService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Stores a finalized interview. Finalized interviews must carry questions.
    pub async fn create_finalized(&self, new: NewInterview) -> Result<Interview> {
        if new.questions.is_empty() {
            return Err(Error::BadRequest(
                "A finalized interview needs at least one question".to_string(),
            ));
        }

        let interview = sqlx::query_as::<_, Interview>(
            r#"
            INSERT INTO interviews (
                role, level, interview_type, techstack, questions,
                user_id, finalized, cover_image, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&new.role)
        .bind(&new.level)
        .bind(&new.interview_type)
        .bind(&new.techstack)
        .bind(&new.questions)
        .bind(&new.user_id)
        .bind(&new.cover_image)
        .bind(new.created_at)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(
            interview_id = %interview.id,
            questions = interview.questions.len(),
            owner = ?interview.user_id,
            "Interview stored"
        );
        Ok(interview)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Interview> {
        sqlx::query_as::<_, Interview>(r#"SELECT * FROM interviews WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Interview {} not found", id)))
    }

    pub async fn list_by_user(&self, user_id: &str, limit: i64) -> Result<Vec<Interview>> {
        let rows = sqlx::query_as::<_, Interview>(
            r#"
            SELECT * FROM interviews
            WHERE user_id = $1 AND finalized = TRUE
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Finalized interviews that belong to someone other than `user_id`,
    /// anonymous ones included.
    pub async fn list_latest_excluding(&self, user_id: &str, limit: i64) -> Result<Vec<Interview>> {
        let rows = sqlx::query_as::<_, Interview>(
            r#"
            SELECT * FROM interviews
            WHERE finalized = TRUE AND (user_id IS NULL OR user_id <> $1)
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn list_unowned(&self, limit: i64) -> Result<Vec<Interview>> {
        let rows = sqlx::query_as::<_, Interview>(
            r#"
            SELECT * FROM interviews
            WHERE finalized = TRUE AND user_id IS NULL
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
