//! Spoken question-and-answer session over a fixed list of questions.
//! Every answer is scored remotely; the last one produces the final grade
//! and a stored attempt.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

use super::client::{AnswerScorer, AttemptRecorder, AttemptSubmission, ScoreRequest};
use super::error::FlowError;
use super::speech::{ListenOutcome, SpeechError, SpeechIo};
use super::timing::{pause, FlowTimings};
use super::transcript::TranscriptEntry;
use crate::models::answer::AnswerRecord;
use crate::services::grading_service::GradingService;

#[derive(Debug, Clone)]
pub struct PracticeContext {
    pub interview_id: Uuid,
    pub user_id: String,
    pub user_name: String,
    pub role: String,
    pub level: String,
    pub questions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PracticeState {
    NotStarted,
    Asking { index: usize },
    Complete,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PracticeResult {
    pub total_score: i32,
    pub answers: Vec<AnswerRecord>,
    /// `None` when the attempt could not be stored.
    pub attempt_id: Option<Uuid>,
    pub results_path: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PracticeStatus {
    /// The question at `index` has been asked; trigger a listen to answer.
    AwaitingAnswer { index: usize },
    AlreadyListening,
    AwaitingRetry(SpeechError),
    /// An evaluation was already in flight, the input was dropped.
    Discarded,
    ScoringFailed { index: usize },
    Complete(PracticeResult),
}

#[derive(Debug, Default)]
struct PracticeSession {
    started: bool,
    index: usize,
    answers: Vec<AnswerRecord>,
    evaluating: bool,
    total_score: Option<i32>,
}

pub struct PracticeFlow {
    io: Arc<SpeechIo>,
    scorer: Arc<dyn AnswerScorer>,
    recorder: Arc<dyn AttemptRecorder>,
    context: PracticeContext,
    timings: FlowTimings,
    session: Mutex<PracticeSession>,
    epoch: AtomicU64,
}

impl PracticeFlow {
    pub fn new(
        io: Arc<SpeechIo>,
        scorer: Arc<dyn AnswerScorer>,
        recorder: Arc<dyn AttemptRecorder>,
        context: PracticeContext,
        timings: FlowTimings,
    ) -> Self {
        Self {
            io,
            scorer,
            recorder,
            context,
            timings,
            session: Mutex::new(PracticeSession::default()),
            epoch: AtomicU64::new(0),
        }
    }

    /// Welcomes the user and asks the first question. Listening is left to
    /// the caller.
    pub async fn start(&self) -> Result<PracticeStatus, FlowError> {
        if self.context.questions.is_empty() {
            return Err(FlowError::NoQuestions);
        }
        let availability = self.io.availability();
        if let Some(warning) = availability.warning() {
            tracing::warn!(?availability, "Refusing to start practice");
            return Err(FlowError::Unsupported(warning));
        }

        let epoch = self.reset();
        self.lock_session().started = true;
        tracing::info!(
            interview_id = %self.context.interview_id,
            questions = self.context.questions.len(),
            "Practice flow started"
        );

        self.io
            .speak(&format!(
                "Welcome {}! Let's begin your {} interview. I'll ask you {} questions. Click the microphone button when ready to answer.",
                self.context.user_name,
                self.context.role,
                self.context.questions.len()
            ))
            .await;
        self.checkpoint(epoch)?;
        pause(self.timings.turn_pause).await;
        self.checkpoint(epoch)?;

        self.ask(0, epoch).await
    }

    /// Manual listen trigger; a recognized utterance is submitted as the
    /// answer to the current question.
    pub async fn listen(&self) -> Result<PracticeStatus, FlowError> {
        self.current_question()?;
        let epoch = self.epoch.load(Ordering::Acquire);

        let outcome = self.io.listen().await;
        if let Ok(ListenOutcome::AlreadyListening) = outcome {
            return Ok(PracticeStatus::AlreadyListening);
        }
        self.checkpoint(epoch)?;

        match outcome {
            Ok(ListenOutcome::Heard(text)) => self.submit_answer(&text).await,
            Ok(ListenOutcome::AlreadyListening) => Ok(PracticeStatus::AlreadyListening),
            Err(SpeechError::Unsupported(what)) => Err(FlowError::Unsupported(what)),
            Err(e) => {
                tracing::warn!(error = %e, "Speech recognition error");
                Ok(PracticeStatus::AwaitingRetry(e))
            }
        }
    }

    /// Scores `answer` against the current question. Input arriving while
    /// an evaluation is pending is discarded.
    pub async fn submit_answer(&self, answer: &str) -> Result<PracticeStatus, FlowError> {
        let epoch = self.epoch.load(Ordering::Acquire);
        let (index, question) = {
            let mut session = self.lock_session();
            let index = self.asking_index(&session)?;
            if session.evaluating {
                tracing::debug!(index, "Evaluation in flight, discarding answer");
                return Ok(PracticeStatus::Discarded);
            }
            session.evaluating = true;
            (index, self.context.questions[index].clone())
        };
        self.io.record_user(answer);

        let result = self
            .scorer
            .score(ScoreRequest {
                question: question.clone(),
                answer: answer.to_string(),
                role: self.context.role.clone(),
                level: self.context.level.clone(),
            })
            .await;
        self.checkpoint(epoch)?;

        let score = match result {
            Ok(score) => score,
            Err(e) => {
                tracing::error!(index, error = %e, "Answer scoring failed");
                self.lock_session().evaluating = false;
                return Ok(PracticeStatus::ScoringFailed { index });
            }
        };
        tracing::debug!(index, score = score.score, "Answer scored");

        let next = {
            let mut session = self.lock_session();
            session.answers.push(AnswerRecord {
                question,
                answer: answer.to_string(),
                score: score.score,
                feedback: score.feedback,
            });
            if index + 1 < self.context.questions.len() {
                session.index = index + 1;
                session.evaluating = false;
                Some(index + 1)
            } else {
                None
            }
        };

        match next {
            Some(next) => {
                pause(self.timings.turn_pause).await;
                self.checkpoint(epoch)?;
                self.ask(next, epoch).await
            }
            None => self.finish(epoch).await,
        }
    }

    /// Halts speech, drops late scoring results and returns to `NotStarted`.
    pub fn stop(&self) {
        self.reset();
        tracing::info!("Practice flow stopped");
    }

    pub fn state(&self) -> PracticeState {
        let session = self.lock_session();
        if !session.started {
            PracticeState::NotStarted
        } else if session.total_score.is_some() {
            PracticeState::Complete
        } else {
            PracticeState::Asking {
                index: session.index,
            }
        }
    }

    pub fn answers(&self) -> Vec<AnswerRecord> {
        self.lock_session().answers.clone()
    }

    pub fn is_evaluating(&self) -> bool {
        self.lock_session().evaluating
    }

    pub fn total_score(&self) -> Option<i32> {
        self.lock_session().total_score
    }

    pub fn is_listening(&self) -> bool {
        self.io.is_listening()
    }

    pub fn transcript(&self) -> Vec<TranscriptEntry> {
        self.io.transcript()
    }

    async fn ask(&self, index: usize, epoch: u64) -> Result<PracticeStatus, FlowError> {
        let question = &self.context.questions[index];
        self.io
            .speak(&format!("Question {}: {}", index + 1, question))
            .await;
        self.checkpoint(epoch)?;
        Ok(PracticeStatus::AwaitingAnswer { index })
    }

    async fn finish(&self, epoch: u64) -> Result<PracticeStatus, FlowError> {
        let (answers, total_score) = {
            let mut session = self.lock_session();
            let total = GradingService::aggregate_percentage(&session.answers);
            session.total_score = Some(total);
            session.evaluating = false;
            (session.answers.clone(), total)
        };
        tracing::info!(total_score, answers = answers.len(), "Practice flow complete");

        self.io.speak(&GradingService::summary(total_score)).await;
        self.checkpoint(epoch)?;

        let attempt_id = match self
            .recorder
            .record(AttemptSubmission {
                interview_id: self.context.interview_id,
                user_id: self.context.user_id.clone(),
                answers: answers.clone(),
                total_score,
            })
            .await
        {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::error!(error = %e, "Failed to save interview attempt");
                None
            }
        };
        self.checkpoint(epoch)?;

        pause(self.timings.navigate_delay).await;
        self.checkpoint(epoch)?;

        Ok(PracticeStatus::Complete(PracticeResult {
            total_score,
            answers,
            attempt_id,
            results_path: format!(
                "/interview/{}/feedback?score={}",
                self.context.interview_id, total_score
            ),
        }))
    }

    fn current_question(&self) -> Result<usize, FlowError> {
        let session = self.lock_session();
        self.asking_index(&session)
    }

    fn asking_index(&self, session: &PracticeSession) -> Result<usize, FlowError> {
        if !session.started {
            return Err(FlowError::InvalidState("not started"));
        }
        if session.total_score.is_some() {
            return Err(FlowError::InvalidState("complete"));
        }
        Ok(session.index)
    }

    fn reset(&self) -> u64 {
        let epoch = self.epoch.fetch_add(1, Ordering::AcqRel) + 1;
        self.io.cancel();
        *self.lock_session() = PracticeSession::default();
        self.io.clear_transcript();
        epoch
    }

    fn checkpoint(&self, epoch: u64) -> Result<(), FlowError> {
        if self.epoch.load(Ordering::Acquire) == epoch {
            Ok(())
        } else {
            Err(FlowError::Stopped)
        }
    }

    fn lock_session(&self) -> MutexGuard<'_, PracticeSession> {
        match self.session.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice::client::{MockAnswerScorer, MockAttemptRecorder, Score};
    use crate::voice::error::ServiceError;
    use crate::voice::scripted::{ScriptedRecognizer, ScriptedSynthesizer};
    use crate::voice::transcript::Speaker;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    /// Holds every scoring call until the test opens the gate.
    #[derive(Default)]
    struct GatedScorer {
        gate: Notify,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AnswerScorer for GatedScorer {
        async fn score(&self, _request: ScoreRequest) -> Result<Score, ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            Ok(Score {
                score: 8.0,
                feedback: "Solid answer".into(),
            })
        }
    }

    fn context(questions: usize) -> PracticeContext {
        PracticeContext {
            interview_id: Uuid::new_v4(),
            user_id: "user-7".into(),
            user_name: "Ada".into(),
            role: "Frontend Developer".into(),
            level: "junior".into(),
            questions: (1..=questions).map(|i| format!("Question text {}", i)).collect(),
        }
    }

    fn flow_with(
        recognizer: Arc<ScriptedRecognizer>,
        scorer: Arc<dyn AnswerScorer>,
        recorder: MockAttemptRecorder,
        context: PracticeContext,
    ) -> PracticeFlow {
        flow_speaking_through(
            Arc::new(ScriptedSynthesizer::new()),
            recognizer,
            scorer,
            recorder,
            context,
        )
    }

    fn flow_speaking_through(
        synth: Arc<ScriptedSynthesizer>,
        recognizer: Arc<ScriptedRecognizer>,
        scorer: Arc<dyn AnswerScorer>,
        recorder: MockAttemptRecorder,
        context: PracticeContext,
    ) -> PracticeFlow {
        let io = Arc::new(SpeechIo::new(synth, recognizer));
        PracticeFlow::new(
            io,
            scorer,
            Arc::new(recorder),
            context,
            FlowTimings::immediate(),
        )
    }

    fn unused_recorder() -> MockAttemptRecorder {
        let mut recorder = MockAttemptRecorder::new();
        recorder.expect_record().never();
        recorder
    }

    #[tokio::test]
    async fn empty_question_list_is_rejected() {
        let flow = flow_with(
            Arc::new(ScriptedRecognizer::new()),
            Arc::new(MockAnswerScorer::new()),
            unused_recorder(),
            context(0),
        );
        assert_eq!(flow.start().await, Err(FlowError::NoQuestions));
        assert_eq!(flow.state(), PracticeState::NotStarted);
    }

    #[tokio::test]
    async fn start_is_refused_without_synthesis() {
        let synth = Arc::new(ScriptedSynthesizer::unavailable());
        let flow = flow_speaking_through(
            synth.clone(),
            Arc::new(ScriptedRecognizer::new()),
            Arc::new(MockAnswerScorer::new()),
            unused_recorder(),
            context(3),
        );

        assert_eq!(
            flow.start().await,
            Err(FlowError::Unsupported(
                "Speech synthesis is not supported in this environment"
            ))
        );
        assert_eq!(flow.state(), PracticeState::NotStarted);
        assert!(synth.spoken().is_empty());
        assert!(flow.transcript().is_empty());
    }

    #[tokio::test]
    async fn start_asks_first_question_without_listening() {
        let recognizer = Arc::new(ScriptedRecognizer::new());
        let flow = flow_with(
            recognizer.clone(),
            Arc::new(MockAnswerScorer::new()),
            unused_recorder(),
            context(3),
        );

        let status = flow.start().await.unwrap();

        assert_eq!(status, PracticeStatus::AwaitingAnswer { index: 0 });
        assert_eq!(recognizer.calls(), 0);
        let lines: Vec<_> = flow.transcript().into_iter().map(|e| e.text).collect();
        assert!(lines[0].starts_with("Welcome Ada! Let's begin your Frontend Developer interview. I'll ask you 3 questions."));
        assert_eq!(lines[1], "Question 1: Question text 1");
    }

    #[tokio::test]
    async fn ten_question_session_scores_fifty_percent() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut scorer = MockAnswerScorer::new();
        scorer.expect_score().times(10).returning(move |req| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            assert_eq!(req.role, "Frontend Developer");
            Ok(Score {
                score: if n < 5 { 10.0 } else { 0.0 },
                feedback: format!("feedback {}", n),
            })
        });

        let attempt_id = Uuid::new_v4();
        let mut recorder = MockAttemptRecorder::new();
        recorder
            .expect_record()
            .withf(|a| a.total_score == 50 && a.answers.len() == 10 && a.user_id == "user-7")
            .times(1)
            .returning(move |_| Ok(attempt_id));

        let ctx = context(10);
        let interview_id = ctx.interview_id;
        let answers: Vec<String> = (1..=10).map(|i| format!("answer {}", i)).collect();
        let flow = flow_with(
            Arc::new(ScriptedRecognizer::utterances(answers)),
            Arc::new(scorer),
            recorder,
            ctx,
        );

        let mut status = flow.start().await.unwrap();
        let mut turns = 0;
        while let PracticeStatus::AwaitingAnswer { index } = status {
            assert_eq!(index, turns);
            status = flow.listen().await.unwrap();
            turns += 1;
        }

        let PracticeStatus::Complete(result) = status else {
            panic!("expected completion, got {:?}", status);
        };
        assert_eq!(turns, 10);
        assert_eq!(result.total_score, 50);
        assert_eq!(result.answers.len(), 10);
        assert_eq!(result.answers[0].answer, "answer 1");
        assert_eq!(result.attempt_id, Some(attempt_id));
        assert_eq!(
            result.results_path,
            format!("/interview/{}/feedback?score=50", interview_id)
        );
        assert_eq!(flow.state(), PracticeState::Complete);

        let last_ai = flow
            .transcript()
            .into_iter()
            .filter(|e| e.role == Speaker::Ai)
            .last()
            .map(|e| e.text);
        assert_eq!(
            last_ai.as_deref(),
            Some("Interview complete! You scored 50 out of 100. Keep practicing. You will get better!")
        );
    }

    #[tokio::test]
    async fn concurrent_submission_is_discarded_while_evaluating() {
        let scorer = Arc::new(GatedScorer::default());
        let flow = flow_with(
            Arc::new(ScriptedRecognizer::new()),
            scorer.clone(),
            unused_recorder(),
            context(2),
        );
        flow.start().await.unwrap();

        let (first, second) = tokio::join!(flow.submit_answer("first answer"), async {
            while !flow.is_evaluating() {
                tokio::task::yield_now().await;
            }
            let second = flow.submit_answer("second answer").await;
            scorer.gate.notify_one();
            second
        });

        assert_eq!(second.unwrap(), PracticeStatus::Discarded);
        assert_eq!(first.unwrap(), PracticeStatus::AwaitingAnswer { index: 1 });
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 1);
        let answers = flow.answers();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].answer, "first answer");
    }

    #[tokio::test]
    async fn scoring_failure_clears_flag_without_advancing() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut scorer = MockAnswerScorer::new();
        scorer.expect_score().times(2).returning(move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(ServiceError::Transport("connection reset".into()))
            } else {
                Ok(Score {
                    score: 6.0,
                    feedback: "Okay".into(),
                })
            }
        });
        let flow = flow_with(
            Arc::new(ScriptedRecognizer::new()),
            Arc::new(scorer),
            unused_recorder(),
            context(2),
        );
        flow.start().await.unwrap();

        let status = flow.submit_answer("hash maps").await.unwrap();
        assert_eq!(status, PracticeStatus::ScoringFailed { index: 0 });
        assert!(!flow.is_evaluating());
        assert!(flow.answers().is_empty());
        assert_eq!(flow.state(), PracticeState::Asking { index: 0 });

        let status = flow.submit_answer("hash maps again").await.unwrap();
        assert_eq!(status, PracticeStatus::AwaitingAnswer { index: 1 });
    }

    #[tokio::test]
    async fn failed_attempt_save_still_completes() {
        let mut scorer = MockAnswerScorer::new();
        scorer.expect_score().returning(|_| {
            Ok(Score {
                score: 9.0,
                feedback: "Great".into(),
            })
        });
        let mut recorder = MockAttemptRecorder::new();
        recorder
            .expect_record()
            .times(1)
            .returning(|_| Err(ServiceError::Rejected("database unavailable".into())));

        let flow = flow_with(
            Arc::new(ScriptedRecognizer::new()),
            Arc::new(scorer),
            recorder,
            context(1),
        );
        flow.start().await.unwrap();

        let status = flow.submit_answer("closures capture their environment").await.unwrap();
        let PracticeStatus::Complete(result) = status else {
            panic!("expected completion, got {:?}", status);
        };
        assert_eq!(result.total_score, 90);
        assert_eq!(result.attempt_id, None);
        assert!(result.results_path.ends_with("/feedback?score=90"));
        assert!(matches!(
            flow.submit_answer("late").await,
            Err(FlowError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn recognition_error_changes_nothing() {
        let flow = flow_with(
            Arc::new(ScriptedRecognizer::with_script([Err(SpeechError::NoSpeech)])),
            Arc::new(MockAnswerScorer::new()),
            unused_recorder(),
            context(2),
        );
        flow.start().await.unwrap();

        let status = flow.listen().await.unwrap();

        assert_eq!(status, PracticeStatus::AwaitingRetry(SpeechError::NoSpeech));
        assert_eq!(flow.state(), PracticeState::Asking { index: 0 });
        assert!(!flow.is_listening());
        assert!(!flow.is_evaluating());
    }

    #[tokio::test]
    async fn stop_discards_late_scoring_result() {
        let scorer = Arc::new(GatedScorer::default());
        let flow = flow_with(
            Arc::new(ScriptedRecognizer::new()),
            scorer.clone(),
            unused_recorder(),
            context(2),
        );
        flow.start().await.unwrap();

        let (result, _) = tokio::join!(flow.submit_answer("pending"), async {
            while !flow.is_evaluating() {
                tokio::task::yield_now().await;
            }
            flow.stop();
            scorer.gate.notify_one();
        });

        assert_eq!(result, Err(FlowError::Stopped));
        assert_eq!(flow.state(), PracticeState::NotStarted);
        assert!(flow.answers().is_empty());
        assert!(flow.transcript().is_empty());
    }
}
