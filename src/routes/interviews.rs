use axum::{
    extract::State,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::dto::interview_dto::{
    EvaluateAnswerRequest, EvaluateAnswerResponse, GenerateInterviewRequest,
    GenerateInterviewResponse, InterviewListResponse, InterviewResponse, RandomInterviewsQuery,
    UserInterviewsQuery,
};
use crate::error::{Error, Result};
use crate::models::interview::{split_techstack, NewInterview};
use crate::services::ai_service::QuestionSpec;
use crate::services::interview_service::random_cover;
use crate::utils::api_json::{ApiJson, ApiPath, ApiQuery};
use crate::utils::time::now;
use crate::AppState;

const DEFAULT_USER_LIMIT: i64 = 10;
const DEFAULT_LATEST_LIMIT: i64 = 20;
const MAX_LIST_LIMIT: i64 = 100;

/// Follow-up questions are only worth asking after a strong answer.
const FOLLOW_UP_MIN_SCORE: f64 = 7.0;

#[axum::debug_handler]
pub async fn generate_interview(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<GenerateInterviewRequest>,
) -> Result<Response> {
    req.validate()?;
    let amount = req.clamped_amount(state.max_generated_questions);

    let spec = QuestionSpec {
        interview_type: req.interview_type.clone(),
        role: req.role.clone(),
        level: req.level.clone(),
        techstack: req.techstack.clone(),
    };
    let questions = state.ai_service.generate_questions(&spec, amount).await?;

    let cover = random_cover(&mut rand::thread_rng());
    let interview = state
        .interview_service
        .create_finalized(NewInterview {
            role: req.role,
            level: req.level,
            interview_type: req.interview_type,
            techstack: split_techstack(&req.techstack),
            questions: questions.clone(),
            user_id: req.user_id,
            cover_image: Some(cover),
            created_at: now(),
        })
        .await?;

    Ok(Json(GenerateInterviewResponse {
        success: true,
        questions,
        interview_id: Some(interview.id),
    })
    .into_response())
}

#[axum::debug_handler]
pub async fn evaluate_answer(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<EvaluateAnswerRequest>,
) -> Result<Response> {
    let (question, answer) = match (non_empty(&req.question), non_empty(&req.answer)) {
        (Some(q), Some(a)) => (q, a),
        _ => {
            return Err(Error::BadRequest(
                "Question and answer are required".to_string(),
            ))
        }
    };
    let role = req.role.as_deref();
    let level = req.level.as_deref();

    let evaluation = state
        .ai_service
        .evaluate_answer(question, answer, role, level)
        .await?;

    let follow_up_question =
        if evaluation.score >= FOLLOW_UP_MIN_SCORE && req.previous_answers.is_some() {
            match state
                .ai_service
                .follow_up_question(question, answer, role, level)
                .await
            {
                Ok(q) => Some(q),
                Err(e) => {
                    tracing::warn!(error = ?e, "Follow-up question generation failed");
                    None
                }
            }
        } else {
            None
        };

    Ok(Json(EvaluateAnswerResponse {
        success: true,
        evaluation,
        follow_up_question,
    })
    .into_response())
}

#[axum::debug_handler]
pub async fn get_interview(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Response> {
    let interview = state.interview_service.get_by_id(id).await?;
    Ok(Json(InterviewResponse {
        success: true,
        interview,
    })
    .into_response())
}

#[axum::debug_handler]
pub async fn user_interviews(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<UserInterviewsQuery>,
) -> Result<Response> {
    let user_id = require_user_id(&query.user_id)?;
    let limit = clamp_limit(query.limit, DEFAULT_USER_LIMIT);
    let interviews = state.interview_service.list_by_user(user_id, limit).await?;
    Ok(Json(InterviewListResponse {
        success: true,
        interviews,
    })
    .into_response())
}

#[axum::debug_handler]
pub async fn latest_interviews(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<UserInterviewsQuery>,
) -> Result<Response> {
    let user_id = require_user_id(&query.user_id)?;
    let limit = clamp_limit(query.limit, DEFAULT_LATEST_LIMIT);
    let interviews = state
        .interview_service
        .list_latest_excluding(user_id, limit)
        .await?;
    Ok(Json(InterviewListResponse {
        success: true,
        interviews,
    })
    .into_response())
}

#[axum::debug_handler]
pub async fn random_interviews(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<RandomInterviewsQuery>,
) -> Result<Response> {
    let interviews = state
        .random_interview_service
        .fetch_or_generate(query.clamped_count())
        .await?;
    Ok(Json(InterviewListResponse {
        success: true,
        interviews,
    })
    .into_response())
}

#[axum::debug_handler]
pub async fn regenerate_random_interview(State(state): State<AppState>) -> Result<Response> {
    let interview = state.random_interview_service.generate_one().await?;
    Ok(Json(json!({ "success": true, "interview": interview })).into_response())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn require_user_id(user_id: &Option<String>) -> Result<&str> {
    non_empty(user_id).ok_or_else(|| Error::BadRequest("userId is required".to_string()))
}

fn clamp_limit(limit: Option<i64>, default: i64) -> i64 {
    limit.unwrap_or(default).clamp(1, MAX_LIST_LIMIT)
}
