//! Spoken slot filling that gathers the parameters of a question generation
//! request, generates the questions and reads them back.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::client::{GenerationRequest, QuestionGenerator};
use super::error::FlowError;
use super::speech::{ListenOutcome, SpeechError, SpeechIo};
use super::timing::{pause, FlowTimings};
use super::transcript::TranscriptEntry;

pub const SETUP_QUESTION_COUNT: usize = 10;

const GENERATION_ANNOUNCEMENT: &str = "Great! I have all the information. Let me generate 10 custom interview questions for you. This will just take a moment.";
const GENERATION_APOLOGY: &str = "Sorry, there was an error generating questions. Please try again.";
const COMPLETION_MESSAGE: &str = "Those are all your interview questions. They have been saved to your account. Good luck with your interview preparation!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    InterviewType,
    Role,
    Level,
    Techstack,
}

pub struct SetupStep {
    pub slot: Slot,
    pub prompt: &'static str,
    pub extract: fn(&str) -> String,
}

pub static SETUP_STEPS: [SetupStep; 4] = [
    SetupStep {
        slot: Slot::InterviewType,
        prompt: "What type of interview are you preparing for? You can say Technical, Behavioral, or Mixed.",
        extract: extract_interview_type,
    },
    SetupStep {
        slot: Slot::Role,
        prompt: "Great! What role are you preparing for? For example, Backend Developer, Frontend Developer, or Full Stack Developer.",
        extract: verbatim,
    },
    SetupStep {
        slot: Slot::Level,
        prompt: "Perfect! What level position is this? Junior, Mid-level, or Senior?",
        extract: extract_level,
    },
    SetupStep {
        slot: Slot::Techstack,
        prompt: "Excellent! What tech stack or technologies should we focus on? For example, Node.js, React, Python, or AWS.",
        extract: verbatim,
    },
];

fn first_keyword(text: &str, keywords: &[(&str, &str)]) -> String {
    let lower = text.to_lowercase();
    keywords
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, value)| value.to_string())
        .unwrap_or(lower)
}

pub fn extract_interview_type(text: &str) -> String {
    first_keyword(
        text,
        &[
            ("technical", "technical"),
            ("behavioral", "behavioral"),
            ("mixed", "mixed"),
        ],
    )
}

/// Checked in order, so "junior to mid" resolves to junior.
pub fn extract_level(text: &str) -> String {
    first_keyword(
        text,
        &[("junior", "junior"), ("mid", "mid-level"), ("senior", "senior")],
    )
}

fn verbatim(text: &str) -> String {
    text.to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotValues {
    pub interview_type: Option<String>,
    pub role: Option<String>,
    pub level: Option<String>,
    pub techstack: Option<String>,
}

impl SlotValues {
    fn set(&mut self, slot: Slot, value: String) {
        let target = match slot {
            Slot::InterviewType => &mut self.interview_type,
            Slot::Role => &mut self.role,
            Slot::Level => &mut self.level,
            Slot::Techstack => &mut self.techstack,
        };
        *target = Some(value);
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupState {
    NotStarted,
    Asking(Slot),
    Generating,
    Done,
}

/// Where a call into the flow left the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupStatus {
    /// Recognition failed; call [`SetupFlow::listen`] to answer again.
    AwaitingRetry(SpeechError),
    /// A listen was already active; nothing changed.
    AlreadyListening,
    /// Call [`SetupFlow::retry_generation`] to try again.
    GenerationFailed,
    Completed(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct SetupContext {
    pub user_name: String,
    pub user_id: String,
}

#[derive(Debug)]
struct SetupSession {
    step: i32,
    slots: SlotValues,
    questions: Vec<String>,
    generating: bool,
}

impl Default for SetupSession {
    fn default() -> Self {
        Self {
            step: -1,
            slots: SlotValues::default(),
            questions: Vec::new(),
            generating: false,
        }
    }
}

enum Turn {
    Answered,
    Waiting(SetupStatus),
}

pub struct SetupFlow {
    io: Arc<SpeechIo>,
    generator: Arc<dyn QuestionGenerator>,
    context: SetupContext,
    timings: FlowTimings,
    session: Mutex<SetupSession>,
    epoch: AtomicU64,
}

impl SetupFlow {
    pub fn new(
        io: Arc<SpeechIo>,
        generator: Arc<dyn QuestionGenerator>,
        context: SetupContext,
        timings: FlowTimings,
    ) -> Self {
        Self {
            io,
            generator,
            context,
            timings,
            session: Mutex::new(SetupSession::default()),
            epoch: AtomicU64::new(0),
        }
    }

    /// Resets the session, greets the user and runs the slot loop until
    /// it needs outside input or finishes.
    pub async fn start(&self) -> Result<SetupStatus, FlowError> {
        let availability = self.io.availability();
        if let Some(warning) = availability.warning() {
            tracing::warn!(?availability, "Refusing to start setup");
            return Err(FlowError::Unsupported(warning));
        }

        let epoch = self.reset();
        self.lock_session().step = 0;
        tracing::info!(user_id = %self.context.user_id, "Setup flow started");

        self.io
            .speak(&format!(
                "Hello {}! I'll help you prepare for your interview. Let me ask you a few questions to generate personalized interview questions for you.",
                self.context.user_name
            ))
            .await;
        self.checkpoint(epoch)?;
        pause(self.timings.greeting_pause).await;
        self.checkpoint(epoch)?;

        self.drive(epoch).await
    }

    /// Manual listen trigger for the current slot.
    pub async fn listen(&self) -> Result<SetupStatus, FlowError> {
        if !matches!(self.state(), SetupState::Asking(_)) {
            return Err(FlowError::InvalidState("no answer is expected"));
        }
        let epoch = self.epoch.load(Ordering::Acquire);

        match self.listen_turn(epoch).await? {
            Turn::Answered => {
                pause(self.timings.turn_pause).await;
                self.checkpoint(epoch)?;
                self.drive(epoch).await
            }
            Turn::Waiting(status) => Ok(status),
        }
    }

    /// Re-issues a failed generation request with the collected slots.
    pub async fn retry_generation(&self) -> Result<SetupStatus, FlowError> {
        {
            let session = self.lock_session();
            if self.state_of(&session) != SetupState::Generating {
                return Err(FlowError::InvalidState("no generation has failed"));
            }
            if session.generating {
                return Err(FlowError::InvalidState("generating"));
            }
        }
        let epoch = self.epoch.load(Ordering::Acquire);
        self.generate(epoch).await
    }

    /// Halts speech and returns to `NotStarted`, discarding slots,
    /// questions and transcript. Work still in flight is dropped on resume.
    pub fn stop(&self) {
        self.reset();
        tracing::info!("Setup flow stopped");
    }

    pub fn state(&self) -> SetupState {
        let session = self.lock_session();
        self.state_of(&session)
    }

    pub fn step(&self) -> i32 {
        self.lock_session().step
    }

    pub fn slots(&self) -> SlotValues {
        self.lock_session().slots.clone()
    }

    pub fn questions(&self) -> Vec<String> {
        self.lock_session().questions.clone()
    }

    pub fn is_generating(&self) -> bool {
        self.lock_session().generating
    }

    pub fn is_listening(&self) -> bool {
        self.io.is_listening()
    }

    pub fn transcript(&self) -> Vec<TranscriptEntry> {
        self.io.transcript()
    }

    async fn drive(&self, epoch: u64) -> Result<SetupStatus, FlowError> {
        loop {
            let Some(step) = self.current_step() else {
                return self.generate(epoch).await;
            };

            self.io.speak(step.prompt).await;
            self.checkpoint(epoch)?;
            pause(self.timings.post_speech_delay).await;
            self.checkpoint(epoch)?;

            match self.listen_turn(epoch).await? {
                Turn::Answered => {
                    pause(self.timings.turn_pause).await;
                    self.checkpoint(epoch)?;
                }
                Turn::Waiting(status) => return Ok(status),
            }
        }
    }

    async fn listen_turn(&self, epoch: u64) -> Result<Turn, FlowError> {
        let outcome = self.io.listen().await;
        if let Ok(ListenOutcome::AlreadyListening) = outcome {
            return Ok(Turn::Waiting(SetupStatus::AlreadyListening));
        }
        self.checkpoint(epoch)?;

        match outcome {
            Ok(ListenOutcome::Heard(text)) => {
                self.accept(&text);
                Ok(Turn::Answered)
            }
            Ok(ListenOutcome::AlreadyListening) => Ok(Turn::Waiting(SetupStatus::AlreadyListening)),
            Err(SpeechError::Unsupported(what)) => Err(FlowError::Unsupported(what)),
            Err(e) => {
                tracing::warn!(error = %e, step = self.step(), "Speech recognition error");
                Ok(Turn::Waiting(SetupStatus::AwaitingRetry(e)))
            }
        }
    }

    fn accept(&self, text: &str) {
        self.io.record_user(text);

        let mut session = self.lock_session();
        let Some(step) = usize::try_from(session.step)
            .ok()
            .and_then(|i| SETUP_STEPS.get(i))
        else {
            return;
        };
        let value = (step.extract)(text);
        tracing::debug!(slot = ?step.slot, %value, "Slot filled");
        session.slots.set(step.slot, value);
        session.step += 1;
    }

    async fn generate(&self, epoch: u64) -> Result<SetupStatus, FlowError> {
        let request = {
            let mut session = self.lock_session();
            session.generating = true;
            let slots = &session.slots;
            GenerationRequest {
                interview_type: slots.interview_type.clone().unwrap_or_default(),
                role: slots.role.clone().unwrap_or_default(),
                level: slots.level.clone().unwrap_or_default(),
                techstack: slots.techstack.clone().unwrap_or_default(),
                amount: SETUP_QUESTION_COUNT,
                user_id: self.context.user_id.clone(),
            }
        };

        self.io.speak(GENERATION_ANNOUNCEMENT).await;
        self.checkpoint(epoch)?;

        let result = self.generator.generate(request.clone()).await;
        self.checkpoint(epoch)?;

        let questions = match result {
            Ok(questions) if !questions.is_empty() => questions,
            Ok(_) => {
                tracing::warn!("Generation returned no questions");
                return self.generation_failed(epoch).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Question generation failed");
                return self.generation_failed(epoch).await;
            }
        };

        {
            let mut session = self.lock_session();
            session.generating = false;
            session.questions = questions.clone();
        }
        tracing::info!(count = questions.len(), "Interview questions generated");

        pause(self.timings.confirmation_pause).await;
        self.checkpoint(epoch)?;
        self.io
            .speak(&format!(
                "Perfect! I've generated {} questions for your {} {} position. Let me read them to you.",
                questions.len(),
                request.level,
                request.role
            ))
            .await;
        self.checkpoint(epoch)?;

        for (i, question) in questions.iter().enumerate() {
            self.io
                .speak(&format!("Question {}: {}", i + 1, question))
                .await;
            self.checkpoint(epoch)?;
            pause(self.timings.readback_pause).await;
            self.checkpoint(epoch)?;
        }

        pause(self.timings.completion_pause).await;
        self.checkpoint(epoch)?;
        self.io.speak(COMPLETION_MESSAGE).await;
        self.checkpoint(epoch)?;

        Ok(SetupStatus::Completed(questions))
    }

    async fn generation_failed(&self, epoch: u64) -> Result<SetupStatus, FlowError> {
        self.lock_session().generating = false;
        self.io.speak(GENERATION_APOLOGY).await;
        self.checkpoint(epoch)?;
        Ok(SetupStatus::GenerationFailed)
    }

    fn current_step(&self) -> Option<&'static SetupStep> {
        let step = self.lock_session().step;
        usize::try_from(step).ok().and_then(|i| SETUP_STEPS.get(i))
    }

    fn state_of(&self, session: &SetupSession) -> SetupState {
        match usize::try_from(session.step) {
            Err(_) => SetupState::NotStarted,
            Ok(i) => match SETUP_STEPS.get(i) {
                Some(step) => SetupState::Asking(step.slot),
                None if session.questions.is_empty() => SetupState::Generating,
                None => SetupState::Done,
            },
        }
    }

    /// Starts a new epoch and clears everything the previous one produced.
    fn reset(&self) -> u64 {
        let epoch = self.epoch.fetch_add(1, Ordering::AcqRel) + 1;
        self.io.cancel();
        *self.lock_session() = SetupSession::default();
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

    fn lock_session(&self) -> MutexGuard<'_, SetupSession> {
        match self.session.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice::client::MockQuestionGenerator;
    use crate::voice::error::ServiceError;
    use crate::voice::scripted::{ScriptedRecognizer, ScriptedSynthesizer};
    use crate::voice::transcript::Speaker;
    use std::sync::atomic::AtomicUsize;

    const ANSWERS: [&str; 4] = [
        "technical",
        "Backend Developer",
        "senior",
        "Node.js and Postgres",
    ];

    fn ten_questions() -> Vec<String> {
        (1..=10).map(|i| format!("Explain concept number {}?", i)).collect()
    }

    fn context() -> SetupContext {
        SetupContext {
            user_name: "Sam".into(),
            user_id: "user-42".into(),
        }
    }

    fn flow_with(
        recognizer: Arc<ScriptedRecognizer>,
        generator: MockQuestionGenerator,
    ) -> (SetupFlow, Arc<SpeechIo>) {
        flow_speaking_through(Arc::new(ScriptedSynthesizer::new()), recognizer, generator)
    }

    fn flow_speaking_through(
        synth: Arc<ScriptedSynthesizer>,
        recognizer: Arc<ScriptedRecognizer>,
        generator: MockQuestionGenerator,
    ) -> (SetupFlow, Arc<SpeechIo>) {
        let io = Arc::new(SpeechIo::new(synth, recognizer));
        let flow = SetupFlow::new(
            io.clone(),
            Arc::new(generator),
            context(),
            FlowTimings::immediate(),
        );
        (flow, io)
    }

    fn ai_lines(flow: &SetupFlow) -> Vec<String> {
        flow.transcript()
            .into_iter()
            .filter(|e| e.role == Speaker::Ai)
            .map(|e| e.text)
            .collect()
    }

    #[test]
    fn extractors_map_known_keywords() {
        assert_eq!(extract_interview_type("I'd like technical please"), "technical");
        assert_eq!(extract_interview_type("Behavioral"), "behavioral");
        assert_eq!(extract_interview_type("a MIXED one"), "mixed");
        assert_eq!(extract_interview_type("System Design"), "system design");

        assert_eq!(extract_level("definitely senior level"), "senior");
        assert_eq!(extract_level("Mid level I think"), "mid-level");
        assert_eq!(extract_level("junior to mid"), "junior");
        assert_eq!(extract_level("Staff"), "staff");
    }

    #[tokio::test]
    async fn full_conversation_reads_back_every_question() {
        let mut generator = MockQuestionGenerator::new();
        generator
            .expect_generate()
            .withf(|req| {
                req.interview_type == "technical"
                    && req.role == "Backend Developer"
                    && req.level == "senior"
                    && req.techstack == "Node.js and Postgres"
                    && req.amount == 10
                    && req.user_id == "user-42"
            })
            .times(1)
            .returning(|_| Ok(ten_questions()));

        let (flow, _io) = flow_with(Arc::new(ScriptedRecognizer::utterances(ANSWERS)), generator);

        let status = flow.start().await.unwrap();

        assert_eq!(status, SetupStatus::Completed(ten_questions()));
        assert_eq!(flow.state(), SetupState::Done);
        assert!(!flow.is_generating());

        let lines = ai_lines(&flow);
        let readback = lines.iter().filter(|l| l.starts_with("Question ")).count();
        assert_eq!(readback, 10);
        assert!(lines.contains(&"Question 1: Explain concept number 1?".to_string()));
        assert_eq!(lines.last().map(String::as_str), Some(COMPLETION_MESSAGE));
        assert_eq!(
            lines.iter().filter(|l| l.as_str() == COMPLETION_MESSAGE).count(),
            1
        );

        let user_lines: Vec<_> = flow
            .transcript()
            .into_iter()
            .filter(|e| e.role == Speaker::User)
            .map(|e| e.text)
            .collect();
        assert_eq!(user_lines, ANSWERS);
    }

    #[tokio::test]
    async fn second_listen_while_listening_is_a_noop() {
        let mut generator = MockQuestionGenerator::new();
        generator.expect_generate().returning(|_| Ok(ten_questions()));
        let recognizer = Arc::new(ScriptedRecognizer::new());
        let (flow, io) = flow_with(recognizer.clone(), generator);

        let (first, second) = tokio::join!(flow.start(), async {
            while !io.is_listening() {
                tokio::task::yield_now().await;
            }
            let step_before = flow.step();
            let second = flow.listen().await;
            assert_eq!(flow.step(), step_before);
            for answer in ANSWERS {
                recognizer.push(Ok(answer.to_string()));
            }
            second
        });

        assert_eq!(second.unwrap(), SetupStatus::AlreadyListening);
        assert!(matches!(first.unwrap(), SetupStatus::Completed(_)));
        assert_eq!(recognizer.calls(), 4);
    }

    #[tokio::test]
    async fn recognition_error_waits_for_manual_listen() {
        let mut generator = MockQuestionGenerator::new();
        generator.expect_generate().returning(|_| Ok(ten_questions()));
        let recognizer = Arc::new(ScriptedRecognizer::with_script([Err(SpeechError::NoSpeech)]));
        let (flow, _io) = flow_with(recognizer.clone(), generator);

        let status = flow.start().await.unwrap();
        assert_eq!(status, SetupStatus::AwaitingRetry(SpeechError::NoSpeech));
        assert_eq!(flow.state(), SetupState::Asking(Slot::InterviewType));
        assert!(!flow.is_listening());

        for answer in ANSWERS {
            recognizer.push(Ok(answer.to_string()));
        }
        let status = flow.listen().await.unwrap();
        assert!(matches!(status, SetupStatus::Completed(_)));
        assert_eq!(flow.slots().level.as_deref(), Some("senior"));
    }

    #[tokio::test]
    async fn stop_mid_flow_resets_everything() {
        let generator = MockQuestionGenerator::new();
        let synth = Arc::new(ScriptedSynthesizer::new());
        let recognizer = Arc::new(ScriptedRecognizer::utterances(["mixed"]));
        let (flow, io) = flow_speaking_through(synth.clone(), recognizer, generator);

        let (result, cancels_before) = tokio::join!(flow.start(), async {
            while !(flow.step() == 1 && io.is_listening()) {
                tokio::task::yield_now().await;
            }
            let before = synth.cancels();
            flow.stop();
            before
        });

        assert!(synth.cancels() > cancels_before);

        assert_eq!(result, Err(FlowError::Stopped));
        assert_eq!(flow.step(), -1);
        assert_eq!(flow.state(), SetupState::NotStarted);
        assert!(flow.slots().is_empty());
        assert!(flow.transcript().is_empty());
        assert!(!flow.is_listening());
    }

    #[tokio::test]
    async fn empty_generation_halts_and_can_be_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut generator = MockQuestionGenerator::new();
        generator.expect_generate().times(2).returning(move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(vec![])
            } else {
                Ok(vec!["What is a mutex?".into(), "What is a deadlock?".into()])
            }
        });

        let (flow, _io) = flow_with(Arc::new(ScriptedRecognizer::utterances(ANSWERS)), generator);

        assert_eq!(flow.start().await.unwrap(), SetupStatus::GenerationFailed);
        assert_eq!(flow.state(), SetupState::Generating);
        assert!(!flow.is_generating());
        assert_eq!(
            ai_lines(&flow).last().map(String::as_str),
            Some(GENERATION_APOLOGY)
        );

        let status = flow.retry_generation().await.unwrap();
        assert_eq!(
            status,
            SetupStatus::Completed(vec!["What is a mutex?".into(), "What is a deadlock?".into()])
        );
        assert_eq!(flow.state(), SetupState::Done);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn generation_error_speaks_apology() {
        let mut generator = MockQuestionGenerator::new();
        generator
            .expect_generate()
            .returning(|_| Err(ServiceError::Rejected("model unavailable".into())));
        let (flow, _io) = flow_with(Arc::new(ScriptedRecognizer::utterances(ANSWERS)), generator);

        assert_eq!(flow.start().await.unwrap(), SetupStatus::GenerationFailed);
        assert!(flow.questions().is_empty());
        assert_eq!(flow.state(), SetupState::Generating);
    }

    #[tokio::test]
    async fn short_generation_is_accepted() {
        let mut generator = MockQuestionGenerator::new();
        generator
            .expect_generate()
            .returning(|_| Ok(vec!["One?".into(), "Two?".into(), "Three?".into()]));
        let (flow, _io) = flow_with(Arc::new(ScriptedRecognizer::utterances(ANSWERS)), generator);

        let status = flow.start().await.unwrap();
        assert_eq!(
            status,
            SetupStatus::Completed(vec!["One?".into(), "Two?".into(), "Three?".into()])
        );
        assert!(ai_lines(&flow)
            .iter()
            .any(|l| l.starts_with("Perfect! I've generated 3 questions for your senior Backend Developer")));
    }

    #[tokio::test]
    async fn start_is_refused_without_recognition() {
        let generator = MockQuestionGenerator::new();
        let (flow, _io) = flow_with(Arc::new(ScriptedRecognizer::unavailable()), generator);

        assert!(matches!(flow.start().await, Err(FlowError::Unsupported(_))));
        assert_eq!(flow.state(), SetupState::NotStarted);
        assert!(flow.transcript().is_empty());
    }

    #[tokio::test]
    async fn start_is_refused_without_synthesis() {
        let synth = Arc::new(ScriptedSynthesizer::unavailable());
        let (flow, _io) = flow_speaking_through(
            synth.clone(),
            Arc::new(ScriptedRecognizer::utterances(ANSWERS)),
            MockQuestionGenerator::new(),
        );

        assert_eq!(
            flow.start().await,
            Err(FlowError::Unsupported(
                "Speech synthesis is not supported in this environment"
            ))
        );
        assert_eq!(flow.state(), SetupState::NotStarted);
        assert!(synth.spoken().is_empty());
        assert!(flow.transcript().is_empty());
    }

    #[tokio::test]
    async fn retry_outside_failed_generation_is_rejected() {
        let (flow, _io) = flow_with(Arc::new(ScriptedRecognizer::new()), MockQuestionGenerator::new());
        assert!(matches!(
            flow.retry_generation().await,
            Err(FlowError::InvalidState(_))
        ));
        assert!(matches!(flow.listen().await, Err(FlowError::InvalidState(_))));
    }
}
