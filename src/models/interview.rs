use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Interview {
    pub id: Uuid,
    pub role: String,
    pub level: String,
    #[serde(rename = "type")]
    pub interview_type: String,
    pub techstack: Vec<String>,
    pub questions: Vec<String>,
    /// `None` for anonymous "random" interviews.
    pub user_id: Option<String>,
    pub finalized: bool,
    pub cover_image: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewInterview {
    pub role: String,
    pub level: String,
    pub interview_type: String,
    pub techstack: Vec<String>,
    pub questions: Vec<String>,
    pub user_id: Option<String>,
    pub cover_image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Splits a comma separated tech stack ("React, Node.js,") into trimmed entries.
pub fn split_techstack(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn techstack_is_split_and_trimmed() {
        assert_eq!(
            split_techstack(" Node.js, Postgres ,, Redis"),
            vec!["Node.js", "Postgres", "Redis"]
        );
        assert!(split_techstack("  ").is_empty());
    }

    #[test]
    fn interview_serializes_with_api_field_names() {
        let interview = Interview {
            id: Uuid::nil(),
            role: "Backend Developer".into(),
            level: "senior".into(),
            interview_type: "technical".into(),
            techstack: vec!["Rust".into()],
            questions: vec!["What is ownership?".into()],
            user_id: None,
            finalized: true,
            cover_image: None,
            created_at: Utc::now(),
        };
        let v = serde_json::to_value(&interview).unwrap();
        assert_eq!(v["type"], "technical");
        assert!(v["userId"].is_null());
        assert!(v.get("createdAt").is_some());
    }
}
