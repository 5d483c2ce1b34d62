use crate::error::{Error, Result};
use crate::models::feedback::{CategoryScore, FEEDBACK_CATEGORIES};
use crate::utils::json_extract::{extract_json_array, extract_json_object};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;

/// Parameters of one question-generation request.
#[derive(Debug, Clone)]
pub struct QuestionSpec {
    pub interview_type: String,
    pub role: String,
    pub level: String,
    pub techstack: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub score: f64,
    pub feedback: String,
    pub key_points: Vec<String>,
    pub missed_points: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackDraft {
    pub total_score: i32,
    pub category_scores: Vec<CategoryScore>,
    pub strengths: Vec<String>,
    pub areas_for_improvement: Vec<String>,
    pub final_assessment: String,
}

/// One line of a finished voice session, as sent for transcript feedback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptLine {
    pub role: String,
    pub content: String,
}

#[derive(Clone)]
pub struct AIService {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl AIService {
    pub fn new(api_key: String, base_url: String, model: String, client: Client) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        }
    }

    pub async fn generate_questions(&self, spec: &QuestionSpec, amount: usize) -> Result<Vec<String>> {
        let prompt = format!(
            r#"You are InterviewBuddy, an interview question generator.
Return ONLY a valid JSON array of strings.
No markdown. No explanation. No extra text.

Rules:
- Exactly {amount} questions
- {level} {role} role
- Focus: {kind}
- Tech stack: {stack}
- Questions must be clear for voice assistant reading
- Do not use slashes or asterisks

Return format example:
["Question 1","Question 2","Question 3"]"#,
            amount = amount,
            level = spec.level,
            role = spec.role,
            kind = spec.interview_type,
            stack = spec.techstack,
        );

        let raw = self.complete(&prompt).await?;
        let parsed: JsonValue = serde_json::from_str(extract_json_array(&raw)?)?;
        let questions = Self::sanitize_questions(&parsed, amount)?;
        tracing::info!(
            requested = amount,
            returned = questions.len(),
            role = %spec.role,
            "Generated interview questions"
        );
        Ok(questions)
    }

    pub async fn evaluate_answer(
        &self,
        question: &str,
        answer: &str,
        role: Option<&str>,
        level: Option<&str>,
    ) -> Result<Evaluation> {
        let strictness = if level.is_some_and(|l| l.eq_ignore_ascii_case("senior")) {
            "Senior level should be judged harder."
        } else {
            ""
        };
        let prompt = format!(
            r#"You are evaluating an interview answer. Rate it 0-10.

Question: {question}
Role: {role} ({level} level)
User Answer: {answer}

Return ONLY a valid JSON object (no markdown, no extra text):
{{
  "score":number (0-10),
  "feedback": "1-2 sentence feedback",
  "keyPoints": ["point1", "point2"],
  "missedPoints": ["point1", "point2"]
}}

Be fair but critical. {strictness}
Award partial credit for incomplete but correct answers.
Score 0 only if completely wrong or irrelevant."#,
            question = question,
            role = role.unwrap_or("Developer"),
            level = level.unwrap_or("Mid"),
            answer = answer,
            strictness = strictness,
        );

        let raw = self.complete(&prompt).await?;
        Self::parse_evaluation(&raw)
    }

    pub async fn follow_up_question(
        &self,
        question: &str,
        answer: &str,
        role: Option<&str>,
        level: Option<&str>,
    ) -> Result<String> {
        let prompt = format!(
            r#"Based on this interview answer, generate ONE intelligent follow-up question.

Original Question: {question}
User's Answer: {answer}
Role: {role} ({level} level)

The follow-up should:
- Dig deeper into their answer
- Test practical knowledge
- Be specific to what they mentioned
- Be brief and clear

Return ONLY the question text, nothing else."#,
            question = question,
            answer = answer,
            role = role.unwrap_or("Developer"),
            level = level.unwrap_or("Mid"),
        );

        let raw = self.complete(&prompt).await?;
        let follow_up = raw.trim().to_string();
        if follow_up.is_empty() {
            return Err(Error::Model("Empty follow-up question".to_string()));
        }
        Ok(follow_up)
    }

    pub async fn generate_feedback(&self, transcript: &[TranscriptLine]) -> Result<FeedbackDraft> {
        let formatted: String = transcript
            .iter()
            .map(|line| format!("- {}: {}\n", line.role, line.content))
            .collect();

        let prompt = format!(
            r#"Return ONLY a valid JSON object that matches this exact structure:
{{
  "totalScore": number,
  "categoryScores": [
    {{"name":"Communication Skills","score":number,"comment":string}},
    {{"name":"Technical Knowledge","score":number,"comment":string}},
    {{"name":"Problem-Solving","score":number,"comment":string}},
    {{"name":"Cultural & Role Fit","score":number,"comment":string}},
    {{"name":"Confidence & Clarity","score":number,"comment":string}}
  ],
  "strengths": string[],
  "areasForImprovement": string[],
  "finalAssessment": string
}}

Rules:
- No markdown
- No extra explanation text
- Only the JSON object

You are an AI interviewer analyzing a mock interview. Evaluate the candidate based on the structured categories. Be thorough and do not be lenient. Point out mistakes and areas for improvement.

Transcript:
{formatted}

Score the candidate from 0 to 100 in each category. Do not add categories other than the ones provided."#,
            formatted = formatted,
        );

        let raw = self.complete(&prompt).await?;
        Self::parse_feedback(&raw)
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let payload = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "user", "content": prompt}
            ],
            "temperature": 0.7
        });

        let res = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .timeout(Duration::from_secs(120))
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(Error::Model(format!("LLM API Error {}: {}", status, text)));
        }

        let body: JsonValue = res.json().await?;

        body.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .ok_or_else(|| Error::Model("Invalid LLM response format".to_string()))
    }

    /// Keeps string entries, trims them, drops empties, strips `/` and `*` and
    /// caps the list at `amount`. An empty result is an error.
    pub fn sanitize_questions(raw: &JsonValue, amount: usize) -> Result<Vec<String>> {
        let arr = raw
            .as_array()
            .ok_or_else(|| Error::Model("Questions is not an array.".to_string()))?;

        let mut questions: Vec<String> = arr
            .iter()
            .filter_map(|v| v.as_str())
            .map(|q| q.replace(['/', '*'], "").trim().to_string())
            .filter(|q| !q.is_empty())
            .collect();

        if questions.is_empty() {
            return Err(Error::Model("No valid questions returned.".to_string()));
        }

        questions.truncate(amount);
        Ok(questions)
    }

    pub fn parse_evaluation(raw: &str) -> Result<Evaluation> {
        let parsed: JsonValue = serde_json::from_str(extract_json_object(raw)?)?;

        let score = parsed
            .get("score")
            .and_then(|v| v.as_f64())
            .map(|s| s.clamp(0.0, 10.0))
            .unwrap_or(5.0);
        let feedback = parsed
            .get("feedback")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("No feedback provided.")
            .to_string();

        Ok(Evaluation {
            score,
            feedback,
            key_points: string_list(parsed.get("keyPoints")),
            missed_points: string_list(parsed.get("missedPoints")),
        })
    }

    pub fn parse_feedback(raw: &str) -> Result<FeedbackDraft> {
        let mut draft: FeedbackDraft = serde_json::from_str(extract_json_object(raw)?)?;

        for name in FEEDBACK_CATEGORIES {
            if !draft.category_scores.iter().any(|c| c.name == name) {
                return Err(Error::Model(format!("Missing feedback category: {}", name)));
            }
        }
        draft
            .category_scores
            .retain(|c| FEEDBACK_CATEGORIES.contains(&c.name.as_str()));
        for category in &mut draft.category_scores {
            category.score = category.score.clamp(0, 100);
        }
        draft.total_score = draft.total_score.clamp(0, 100);

        Ok(draft)
    }
}

fn string_list(value: Option<&JsonValue>) -> Vec<String> {
    value
        .and_then(|v| v.as_array())
        .map(|a| {
            a.iter()
                .filter_map(|x| x.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
