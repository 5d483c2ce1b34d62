use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;
use validator::Validate;

use crate::models::interview::Interview;
use crate::services::ai_service::Evaluation;

pub const DEFAULT_QUESTION_AMOUNT: usize = 10;
pub const DEFAULT_RANDOM_COUNT: usize = 3;
pub const MAX_RANDOM_COUNT: usize = 20;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateInterviewRequest {
    #[serde(rename = "type")]
    #[validate(length(min = 1))]
    pub interview_type: String,
    #[validate(length(min = 1))]
    pub role: String,
    #[validate(length(min = 1))]
    pub level: String,
    #[serde(default)]
    pub techstack: String,
    pub amount: Option<i64>,
    #[serde(alias = "userid")]
    pub user_id: Option<String>,
}

impl GenerateInterviewRequest {
    /// Requested amount clamped to `[1, max]`. A missing or zero amount
    /// means ten; negative amounts clamp up to one.
    pub fn clamped_amount(&self, max: usize) -> usize {
        let max = max.max(1);
        match self.amount {
            None | Some(0) => DEFAULT_QUESTION_AMOUNT.min(max),
            Some(n) => usize::try_from(n.max(1)).unwrap_or(max).min(max),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateInterviewResponse {
    pub success: bool,
    pub questions: Vec<String>,
    pub interview_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateAnswerRequest {
    pub question: Option<String>,
    pub answer: Option<String>,
    pub role: Option<String>,
    pub level: Option<String>,
    pub previous_answers: Option<JsonValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateAnswerResponse {
    pub success: bool,
    #[serde(flatten)]
    pub evaluation: Evaluation,
    pub follow_up_question: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInterviewsQuery {
    pub user_id: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomInterviewsQuery {
    pub count: Option<usize>,
}

impl RandomInterviewsQuery {
    pub fn clamped_count(&self) -> usize {
        self.count
            .unwrap_or(DEFAULT_RANDOM_COUNT)
            .clamp(1, MAX_RANDOM_COUNT)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewResponse {
    pub success: bool,
    pub interview: Interview,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewListResponse {
    pub success: bool,
    pub interviews: Vec<Interview>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(amount: Option<i64>) -> GenerateInterviewRequest {
        GenerateInterviewRequest {
            interview_type: "technical".into(),
            role: "Backend Developer".into(),
            level: "senior".into(),
            techstack: "Rust".into(),
            amount,
            user_id: None,
        }
    }

    #[test]
    fn amount_is_clamped() {
        assert_eq!(request(None).clamped_amount(50), 10);
        assert_eq!(request(Some(0)).clamped_amount(50), 10);
        assert_eq!(request(Some(-4)).clamped_amount(50), 1);
        assert_eq!(request(Some(3)).clamped_amount(50), 3);
        assert_eq!(request(Some(500)).clamped_amount(50), 50);
    }

    #[test]
    fn legacy_userid_field_is_accepted() {
        let req: GenerateInterviewRequest = serde_json::from_value(json!({
            "type": "mixed",
            "role": "DevOps Engineer",
            "level": "junior",
            "techstack": "AWS",
            "userid": "user-1"
        }))
        .unwrap();
        assert_eq!(req.user_id.as_deref(), Some("user-1"));
        assert!(req.validate().is_ok());
    }

    #[test]
    fn empty_role_fails_validation() {
        let mut req = request(None);
        req.role.clear();
        assert!(req.validate().is_err());
    }

    #[test]
    fn random_count_defaults_and_clamps() {
        assert_eq!(RandomInterviewsQuery { count: None }.clamped_count(), 3);
        assert_eq!(RandomInterviewsQuery { count: Some(0) }.clamped_count(), 1);
        assert_eq!(RandomInterviewsQuery { count: Some(99) }.clamped_count(), 20);
    }

    #[test]
    fn evaluate_response_flattens_evaluation() {
        let resp = EvaluateAnswerResponse {
            success: true,
            evaluation: Evaluation {
                score: 8.0,
                feedback: "Good".into(),
                key_points: vec![],
                missed_points: vec!["lifetimes".into()],
            },
            follow_up_question: None,
        };
        let v = serde_json::to_value(resp).unwrap();
        assert_eq!(v["score"], 8.0);
        assert_eq!(v["missedPoints"][0], "lifetimes");
        assert!(v["followUpQuestion"].is_null());
    }
}
