pub mod ai_service;
pub mod attempt_service;
pub mod feedback_service;
pub mod grading_service;
pub mod interview_service;
pub mod random_interview_service;
