use crate::models::answer::AnswerRecord;

pub const MAX_ANSWER_SCORE: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Excellent,
    Great,
    GoodEffort,
    KeepPracticing,
}

impl ScoreBand {
    pub fn for_percentage(percentage: i32) -> Self {
        match percentage {
            p if p >= 90 => ScoreBand::Excellent,
            p if p >= 75 => ScoreBand::Great,
            p if p >= 60 => ScoreBand::GoodEffort,
            _ => ScoreBand::KeepPracticing,
        }
    }

    pub fn commentary(self) -> &'static str {
        match self {
            ScoreBand::Excellent => "Excellent performance! You really know your stuff.",
            ScoreBand::Great => "Great work! Keep it up.",
            ScoreBand::GoodEffort => "Good effort. There is room for improvement.",
            ScoreBand::KeepPracticing => "Keep practicing. You will get better!",
        }
    }
}

pub struct GradingService;

impl GradingService {
    /// `round(sum / (count * 10) * 100)`; an empty session scores 0.
    pub fn aggregate_percentage(answers: &[AnswerRecord]) -> i32 {
        Self::percentage_of(answers.iter().map(|a| a.score))
    }

    pub fn percentage_of(scores: impl IntoIterator<Item = f64>) -> i32 {
        let (total, count) = scores
            .into_iter()
            .fold((0.0_f64, 0usize), |(sum, n), s| (sum + s, n + 1));
        if count == 0 {
            return 0;
        }
        (total / (count as f64 * MAX_ANSWER_SCORE) * 100.0).round() as i32
    }

    pub fn summary(percentage: i32) -> String {
        format!(
            "Interview complete! You scored {} out of 100. {}",
            percentage,
            ScoreBand::for_percentage(percentage).commentary()
        )
    }
}
