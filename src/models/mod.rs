pub mod answer;
pub mod feedback;
pub mod interview;
pub mod interview_attempt;
