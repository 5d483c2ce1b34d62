pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;
pub mod voice;

use crate::config::Config;
use crate::services::{
    ai_service::AIService, attempt_service::AttemptService, feedback_service::FeedbackService,
    interview_service::InterviewService, random_interview_service::RandomInterviewService,
};
use reqwest::Client;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub ai_service: AIService,
    pub interview_service: InterviewService,
    pub attempt_service: AttemptService,
    pub feedback_service: FeedbackService,
    pub random_interview_service: RandomInterviewService,
    pub max_generated_questions: usize,
}

impl AppState {
    pub fn new(pool: PgPool) -> error::Result<Self> {
        Self::from_config(pool, config::get_config())
    }

    pub fn from_config(pool: PgPool, config: &Config) -> error::Result<Self> {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()?;

        let ai_service = AIService::new(
            config.groq_api_key.clone(),
            config.llm_base_url.clone(),
            config.llm_model.clone(),
            http_client,
        );
        let interview_service = InterviewService::new(pool.clone());
        let attempt_service = AttemptService::new(pool.clone());
        let feedback_service = FeedbackService::new(pool.clone());
        let random_interview_service = RandomInterviewService::new(
            interview_service.clone(),
            ai_service.clone(),
            config.random_generation_retries,
        );

        Ok(Self {
            pool,
            ai_service,
            interview_service,
            attempt_service,
            feedback_service,
            random_interview_service,
            max_generated_questions: config.max_generated_questions,
        })
    }
}
