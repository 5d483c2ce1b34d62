use crate::error::{Error, Result};
use crate::models::interview::{Interview, NewInterview};
use crate::services::ai_service::{AIService, QuestionSpec};
use crate::services::interview_service::{random_cover, InterviewService};
use crate::utils::time::{now, random_days_ago};
use rand::seq::SliceRandom;
use rand::Rng;
use std::future::Future;

pub const RANDOM_INTERVIEW_QUESTIONS: usize = 10;

const ROLES: [&str; 6] = [
    "Backend Developer",
    "Frontend Developer",
    "Full Stack Developer",
    "DevOps Engineer",
    "Mobile Developer",
    "Data Engineer",
];

const LEVELS: [&str; 3] = ["Junior", "Mid-level", "Senior"];

const TYPES: [&str; 3] = ["Technical", "Behavioral", "Mixed"];

const TECH_STACKS: [&[&str]; 6] = [
    &["Node.js", "Express", "MongoDB"],
    &["React", "TypeScript", "Next.js"],
    &["Python", "Django", "PostgreSQL"],
    &["AWS", "Docker", "Kubernetes"],
    &["Java", "Spring Boot", "MySQL"],
    &["Vue.js", "Nuxt", "Tailwind CSS"],
];

#[derive(Debug, Clone, PartialEq)]
pub struct RandomBlueprint {
    pub role: String,
    pub level: String,
    pub interview_type: String,
    pub techstack: Vec<String>,
}

impl RandomBlueprint {
    pub fn pick(rng: &mut impl Rng) -> Self {
        let techstack = TECH_STACKS
            .choose(rng)
            .map(|s| s.iter().map(|t| t.to_string()).collect())
            .unwrap_or_default();

        Self {
            role: pick_one(&ROLES, rng),
            level: pick_one(&LEVELS, rng),
            interview_type: pick_one(&TYPES, rng),
            techstack,
        }
    }

    fn question_spec(&self) -> QuestionSpec {
        QuestionSpec {
            interview_type: self.interview_type.clone(),
            role: self.role.clone(),
            level: self.level.clone(),
            techstack: self.techstack.join(", "),
        }
    }
}

fn pick_one(items: &[&str], rng: &mut impl Rng) -> String {
    items.choose(rng).copied().unwrap_or_default().to_string()
}

/// Calls `generate` until `needed` items exist or `max_attempts` calls have
/// been spent. Returns what was produced plus the last failure, if any.
pub async fn backfill<T, F, Fut>(needed: usize, max_attempts: usize, mut generate: F) -> (Vec<T>, Option<Error>)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut produced = Vec::with_capacity(needed);
    let mut last_error = None;
    let mut attempts = 0;

    while produced.len() < needed && attempts < max_attempts {
        attempts += 1;
        match generate().await {
            Ok(item) => produced.push(item),
            Err(e) => {
                tracing::warn!(attempt = attempts, max_attempts, error = ?e, "Random interview generation failed");
                last_error = Some(e);
            }
        }
    }

    (produced, last_error)
}

#[derive(Clone)]
pub struct RandomInterviewService {
    interviews: InterviewService,
    ai: AIService,
    retry_budget: usize,
}

impl RandomInterviewService {
    pub fn new(interviews: InterviewService, ai: AIService, retry_budget: usize) -> Self {
        Self {
            interviews,
            ai,
            retry_budget,
        }
    }

    pub async fn generate_one(&self) -> Result<Interview> {
        let (blueprint, cover, created_at) = {
            let mut rng = rand::thread_rng();
            (
                RandomBlueprint::pick(&mut rng),
                random_cover(&mut rng),
                random_days_ago(now(), 7, &mut rng),
            )
        };

        let questions = self
            .ai
            .generate_questions(&blueprint.question_spec(), RANDOM_INTERVIEW_QUESTIONS)
            .await?;

        self.interviews
            .create_finalized(NewInterview {
                role: blueprint.role,
                level: blueprint.level,
                interview_type: blueprint.interview_type,
                techstack: blueprint.techstack,
                questions,
                user_id: None,
                cover_image: Some(cover),
                created_at,
            })
            .await
    }

    /// Returns `count` anonymous interviews in random order, generating the
    /// shortfall with at most `shortfall + retry_budget` generation attempts.
    pub async fn fetch_or_generate(&self, count: usize) -> Result<Vec<Interview>> {
        let mut interviews = self.interviews.list_unowned((count * 3) as i64).await?;

        if interviews.len() < count {
            let needed = count - interviews.len();
            let max_attempts = needed + self.retry_budget;
            tracing::info!(existing = interviews.len(), needed, max_attempts, "Backfilling random interviews");

            let (generated, last_error) = backfill(needed, max_attempts, || self.generate_one()).await;
            if interviews.is_empty() && generated.is_empty() {
                if let Some(e) = last_error {
                    return Err(e);
                }
            }
            interviews.extend(generated);
        }

        {
            let mut rng = rand::thread_rng();
            interviews.shuffle(&mut rng);
        }
        interviews.truncate(count);
        Ok(interviews)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn blueprint_draws_from_fixed_catalogues() {
        let mut rng = rand::thread_rng();
        let bp = RandomBlueprint::pick(&mut rng);
        assert!(ROLES.contains(&bp.role.as_str()));
        assert!(LEVELS.contains(&bp.level.as_str()));
        assert!(TYPES.contains(&bp.interview_type.as_str()));
        assert_eq!(bp.techstack.len(), 3);
        assert_eq!(bp.question_spec().techstack.matches(", ").count(), 2);
    }

    #[tokio::test]
    async fn backfill_stops_once_enough_items_exist() {
        let calls = Cell::new(0);
        let (items, err) = backfill(3, 10, || {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move { Ok::<_, Error>(n) }
        })
        .await;
        assert_eq!(items, vec![1, 2, 3]);
        assert!(err.is_none());
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn backfill_is_bounded_under_persistent_failure() {
        let calls = Cell::new(0);
        let (items, err) = backfill(2, 4, || {
            calls.set(calls.get() + 1);
            async { Err::<u32, _>(Error::Model("upstream down".into())) }
        })
        .await;
        assert!(items.is_empty());
        assert!(matches!(err, Some(Error::Model(_))));
        assert_eq!(calls.get(), 4);
    }

    #[tokio::test]
    async fn backfill_recovers_from_intermittent_failure() {
        let calls = Cell::new(0);
        let (items, err) = backfill(2, 3, || {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move {
                if n == 1 {
                    Err(Error::Model("flaky".into()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(items, vec![2, 3]);
        assert!(err.is_some());
    }
}
