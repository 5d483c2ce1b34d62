use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use validator::Validate;

use crate::dto::feedback_dto::{
    CreateFeedbackRequest, CreateFeedbackResponse, FeedbackQuery, FeedbackResponse,
};
use crate::error::Result;
use crate::utils::api_json::{ApiJson, ApiQuery};
use crate::AppState;

#[axum::debug_handler]
pub async fn create_feedback(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateFeedbackRequest>,
) -> Result<Response> {
    req.validate()?;

    let stored = async {
        let draft = state.ai_service.generate_feedback(&req.transcript).await?;
        state
            .feedback_service
            .upsert(req.feedback_id, req.interview_id, &req.user_id, draft)
            .await
    }
    .await;

    match stored {
        Ok(feedback) => Ok(Json(CreateFeedbackResponse {
            success: true,
            feedback_id: Some(feedback.id),
        })
        .into_response()),
        Err(e) => {
            tracing::error!(error = ?e, interview_id = %req.interview_id, "Error saving feedback");
            Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(CreateFeedbackResponse {
                    success: false,
                    feedback_id: None,
                }),
            )
                .into_response())
        }
    }
}

#[axum::debug_handler]
pub async fn get_feedback(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<FeedbackQuery>,
) -> Result<Response> {
    let feedback = state
        .feedback_service
        .find_for_interview(query.interview_id, &query.user_id)
        .await?;
    Ok(Json(FeedbackResponse {
        success: true,
        feedback,
    })
    .into_response())
}
