pub mod attempt_dto;
pub mod feedback_dto;
pub mod interview_dto;
