use axum::{
    extract::State,
    response::{IntoResponse, Json, Response},
};

use crate::dto::attempt_dto::{
    AttemptListResponse, AttemptsQuery, SaveAttemptRequest, SaveAttemptResponse,
};
use crate::error::{Error, Result};
use crate::utils::api_json::{ApiJson, ApiQuery};
use crate::AppState;

#[axum::debug_handler]
pub async fn save_attempt(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SaveAttemptRequest>,
) -> Result<Response> {
    let (interview_id, user_id, answers, total_score) =
        match (req.interview_id, req.user_id, req.answers, req.total_score) {
            (Some(i), Some(u), Some(a), Some(t)) if !u.trim().is_empty() && t.is_finite() => {
                (i, u, a, t)
            }
            _ => return Err(Error::BadRequest("Missing required fields".to_string())),
        };

    let attempt = state
        .attempt_service
        .save_attempt(interview_id, &user_id, answers, total_score.round() as i32)
        .await?;

    Ok(Json(SaveAttemptResponse {
        success: true,
        attempt_id: attempt.id,
    })
    .into_response())
}

#[axum::debug_handler]
pub async fn list_attempts(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<AttemptsQuery>,
) -> Result<Response> {
    let user_id = query
        .user_id
        .as_deref()
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| Error::BadRequest("userId required".to_string()))?;

    let attempts = state
        .attempt_service
        .list_for_user(user_id, query.interview_id)
        .await?;

    Ok(Json(AttemptListResponse {
        success: true,
        attempts,
    })
    .into_response())
}
