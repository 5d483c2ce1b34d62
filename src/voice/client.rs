//! Remote collaborators of the flows and their HTTP implementation against
//! the backend in this crate.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use url::Url;
use uuid::Uuid;

use super::error::ServiceError;
use crate::dto::attempt_dto::{SaveAttemptRequest, SaveAttemptResponse};
use crate::dto::interview_dto::{
    EvaluateAnswerRequest, EvaluateAnswerResponse, GenerateInterviewRequest,
    GenerateInterviewResponse, InterviewResponse,
};
use crate::models::answer::AnswerRecord;
use crate::models::interview::Interview;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub interview_type: String,
    pub role: String,
    pub level: String,
    pub techstack: String,
    pub amount: usize,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRequest {
    pub question: String,
    pub answer: String,
    pub role: String,
    pub level: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    pub score: f64,
    pub feedback: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttemptSubmission {
    pub interview_id: Uuid,
    pub user_id: String,
    pub answers: Vec<AnswerRecord>,
    pub total_score: i32,
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<Vec<String>, ServiceError>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait AnswerScorer: Send + Sync {
    async fn score(&self, request: ScoreRequest) -> Result<Score, ServiceError>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait AttemptRecorder: Send + Sync {
    async fn record(&self, attempt: AttemptSubmission) -> Result<Uuid, ServiceError>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait InterviewLookup: Send + Sync {
    async fn fetch(&self, id: Uuid) -> Result<Interview, ServiceError>;
}

/// Talks to the interview backend over JSON. Every response carries a
/// `success` flag; `false` bodies become [`ServiceError::Rejected`].
#[derive(Clone)]
pub struct HttpInterviewApi {
    client: Client,
    base: Url,
}

impl HttpInterviewApi {
    pub fn new(client: Client, base: Url) -> Self {
        Self { client, base }
    }

    fn endpoint(&self, path: &str) -> Result<Url, ServiceError> {
        self.base
            .join(path)
            .map_err(|e| ServiceError::Transport(format!("invalid endpoint {}: {}", path, e)))
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ServiceError> {
        let url = self.endpoint(path)?;
        let response = self.client.post(url).json(body).send().await?;
        Self::read_envelope(response).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ServiceError> {
        let url = self.endpoint(path)?;
        let response = self.client.get(url).send().await?;
        Self::read_envelope(response).await
    }

    async fn read_envelope<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ServiceError> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ServiceError::NotFound);
        }

        let body: JsonValue = response.json().await?;
        if body.get("success").and_then(JsonValue::as_bool) != Some(true) {
            let message = body
                .get("error")
                .and_then(JsonValue::as_str)
                .unwrap_or("request was not successful");
            tracing::warn!(%status, error = message, "Backend rejected request");
            return Err(ServiceError::Rejected(message.to_string()));
        }

        Ok(serde_json::from_value(body)?)
    }
}

#[async_trait]
impl QuestionGenerator for HttpInterviewApi {
    async fn generate(&self, request: GenerationRequest) -> Result<Vec<String>, ServiceError> {
        let body = GenerateInterviewRequest {
            interview_type: request.interview_type,
            role: request.role,
            level: request.level,
            techstack: request.techstack,
            amount: Some(request.amount as i64),
            user_id: Some(request.user_id),
        };
        let response: GenerateInterviewResponse =
            self.post("/api/vapi/generate", &body).await?;
        Ok(response.questions)
    }
}

#[async_trait]
impl AnswerScorer for HttpInterviewApi {
    async fn score(&self, request: ScoreRequest) -> Result<Score, ServiceError> {
        let body = EvaluateAnswerRequest {
            question: Some(request.question),
            answer: Some(request.answer),
            role: Some(request.role),
            level: Some(request.level),
            previous_answers: None,
        };
        let response: EvaluateAnswerResponse =
            self.post("/api/interviews/evaluate", &body).await?;
        Ok(Score {
            score: response.evaluation.score,
            feedback: response.evaluation.feedback,
        })
    }
}

#[async_trait]
impl AttemptRecorder for HttpInterviewApi {
    async fn record(&self, attempt: AttemptSubmission) -> Result<Uuid, ServiceError> {
        let body = SaveAttemptRequest {
            interview_id: Some(attempt.interview_id),
            user_id: Some(attempt.user_id),
            answers: Some(attempt.answers),
            total_score: Some(f64::from(attempt.total_score)),
        };
        let response: SaveAttemptResponse = self.post("/api/interviews/attempt", &body).await?;
        Ok(response.attempt_id)
    }
}

#[async_trait]
impl InterviewLookup for HttpInterviewApi {
    async fn fetch(&self, id: Uuid) -> Result<Interview, ServiceError> {
        let response: InterviewResponse = self.get(&format!("/api/interviews/{}", id)).await?;
        Ok(response.interview)
    }
}
