use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use tutor_core::model::{
    ConversationLog, ConversationTurn, ExamConfig, HistoryWindow, Mode, ProgressAction,
    ProgressState, ReferenceMaterial, is_marked_correct,
};
use tutor_core::prompt::{
    FIRST_QUESTION_REQUEST, NEXT_QUESTION_REQUEST, PromptAssembler, PromptContext,
    evaluation_request,
};
use tutor_core::{Clock, DashboardSummary};

use super::display::DisplayTurn;
use crate::error::{ErrorCode, LlmError};
use crate::llm::{LlmReply, LlmRequest, LlmTransport, TokenUsage};

/// Topic recorded for answers given while no topic is selected.
const GENERAL_TOPIC: &str = "general";

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// Why a turn was refused before any request was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    EmptyInput,
    Busy,
    NoQuestion,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReply {
    pub message: String,
    pub is_mock: bool,
    pub usage: Option<TokenUsage>,
    /// Set when the turn graded an answer.
    pub is_correct: Option<bool>,
}

/// Result of one accepted or refused turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Completed(TurnReply),
    /// The transport failed; an error turn was added to the display only.
    Failed { code: ErrorCode, message: String },
    Rejected(Rejection),
    /// The session moved on (mode, document or reset) while the request was
    /// in flight, so the response was dropped.
    Discarded,
}

impl TurnOutcome {
    #[must_use]
    pub fn reply(&self) -> Option<&TurnReply> {
        match self {
            TurnOutcome::Completed(reply) => Some(reply),
            _ => None,
        }
    }
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone)]
enum TurnKind {
    Chat { text: String },
    Question { first: bool },
    Answer { question: String, answer: String },
}

struct SessionState {
    mode: Mode,
    document: Arc<str>,
    references: Vec<ReferenceMaterial>,
    exam_config: Option<ExamConfig>,
    log: ConversationLog,
    display: Vec<DisplayTurn>,
    progress: ProgressState,
    current_topic: Option<String>,
    current_question: Option<String>,
    generation: u64,
    in_flight: bool,
    started_at: DateTime<Utc>,
}

impl SessionState {
    fn new(document: Arc<str>, started_at: DateTime<Utc>) -> Self {
        Self {
            mode: Mode::Learn,
            document,
            references: Vec::new(),
            exam_config: None,
            log: ConversationLog::new(),
            display: Vec::new(),
            progress: ProgressState::new(),
            current_topic: None,
            current_question: None,
            generation: 0,
            in_flight: false,
            started_at,
        }
    }

    fn admit(&self, kind: &TurnKind) -> Result<(), Rejection> {
        match kind {
            TurnKind::Chat { text } if text.trim().is_empty() => return Err(Rejection::EmptyInput),
            TurnKind::Answer { answer, .. } if answer.trim().is_empty() => {
                return Err(Rejection::EmptyInput);
            }
            _ => {}
        }
        if self.in_flight {
            return Err(Rejection::Busy);
        }
        Ok(())
    }

    fn topic(&self) -> String {
        self.current_topic
            .clone()
            .unwrap_or_else(|| GENERAL_TOPIC.to_string())
    }

    fn record_answer(&mut self, is_correct: bool) {
        let action = ProgressAction::question_answered(is_correct, self.topic());
        self.progress = self.progress.apply(&action);
    }

    fn complete(&mut self, kind: TurnKind, reply: LlmReply) -> TurnReply {
        let is_correct = match kind {
            TurnKind::Chat { text } => {
                self.log = self.log.append(&text, &reply.message);
                if self.mode == Mode::Quiz {
                    let is_correct = is_marked_correct(&reply.message);
                    self.record_answer(is_correct);
                    Some(is_correct)
                } else {
                    None
                }
            }
            TurnKind::Question { .. } => {
                self.current_question = Some(reply.message.clone());
                None
            }
            TurnKind::Answer { answer, .. } => {
                self.log = self.log.append(&answer, &reply.message);
                let is_correct = is_marked_correct(&reply.message);
                self.record_answer(is_correct);
                self.current_question = None;
                Some(is_correct)
            }
        };
        self.display
            .push(DisplayTurn::assistant(reply.message.clone(), reply.is_mock));
        TurnReply {
            message: reply.message,
            is_mock: reply.is_mock,
            usage: reply.usage,
            is_correct,
        }
    }

    fn fail(&mut self, err: &LlmError) -> TurnOutcome {
        let code = err.code();
        let message = err.to_string();
        self.display.push(DisplayTurn::Error {
            code,
            message: message.clone(),
        });
        TurnOutcome::Failed { code, message }
    }

    /// Invalidate any request currently in flight.
    fn bump_generation(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}

/// Clears the in-flight flag when a turn ends, including when its future is
/// dropped before the response arrives.
struct InFlightGuard<'a> {
    state: &'a Mutex<SessionState>,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        lock(self.state).in_flight = false;
    }
}

fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One tutoring session over a loaded document.
///
/// Owns the active mode, the durable conversation log and the progress
/// record. At most one turn is in flight at a time; a turn started while
/// another is pending is rejected, not queued. Responses that arrive after
/// the mode, document or session changed are dropped.
pub struct TutorSession {
    transport: Arc<dyn LlmTransport>,
    assembler: PromptAssembler,
    history_window: HistoryWindow,
    clock: Clock,
    state: Mutex<SessionState>,
}

impl TutorSession {
    #[must_use]
    pub fn new(transport: Arc<dyn LlmTransport>, document: impl Into<Arc<str>>) -> Self {
        let clock = Clock::default();
        Self {
            transport,
            assembler: PromptAssembler::new(),
            history_window: HistoryWindow::default(),
            clock,
            state: Mutex::new(SessionState::new(document.into(), clock.now())),
        }
    }

    #[must_use]
    pub fn with_references(mut self, references: Vec<ReferenceMaterial>) -> Self {
        self.state_mut().references = references;
        self
    }

    #[must_use]
    pub fn with_exam_config(mut self, exam_config: Option<ExamConfig>) -> Self {
        self.state_mut().exam_config = exam_config;
        self
    }

    #[must_use]
    pub fn with_history_window(mut self, window: HistoryWindow) -> Self {
        self.history_window = window;
        self
    }

    /// Use `clock` for timestamps; the session start is re-read from it.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self.state_mut().started_at = clock.now();
        self
    }

    fn state_mut(&mut self) -> &mut SessionState {
        self.state.get_mut().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        lock(&self.state)
    }

    // ─── Mode machine ──────────────────────────────────────────────────────────

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.lock().mode
    }

    /// Switch the active mode.
    ///
    /// Always allowed. Clears the current topic and drops any response still
    /// in flight; history and progress are kept.
    pub fn switch_mode(&self, mode: Mode) {
        let mut state = self.lock();
        info!(from = %state.mode, to = %mode, "switching mode");
        state.mode = mode;
        state.current_topic = None;
        state.bump_generation();
    }

    /// Replace the document and its reference materials.
    ///
    /// Clears the conversation and transcript; progress and exam settings
    /// carry over.
    pub fn load_document(&self, document: impl Into<Arc<str>>, references: Vec<ReferenceMaterial>) {
        let mut state = self.lock();
        state.document = document.into();
        info!(
            document_chars = state.document.chars().count(),
            references = references.len(),
            "document loaded"
        );
        state.references = references;
        state.log = ConversationLog::new();
        state.display.clear();
        state.current_question = None;
        state.bump_generation();
    }

    /// Replace the exam configuration; `None` removes it.
    pub fn set_exam_config(&self, exam_config: Option<ExamConfig>) {
        self.lock().exam_config = exam_config;
    }

    /// Mark `topic` as studied and make it the current topic.
    pub fn study_topic(&self, topic: &str) {
        let topic = topic.trim();
        if topic.is_empty() {
            return;
        }
        let mut state = self.lock();
        state.progress = state.progress.apply(&ProgressAction::topic_studied(topic));
        state.current_topic = Some(topic.to_string());
    }

    /// Start over: learn mode, empty history, zeroed progress.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.mode = Mode::Learn;
        state.log = ConversationLog::new();
        state.display.clear();
        state.progress = state.progress.apply(&ProgressAction::ResetSession);
        state.current_topic = None;
        state.current_question = None;
        state.started_at = self.clock.now();
        state.bump_generation();
        info!("session reset");
    }

    // ─── Turns ─────────────────────────────────────────────────────────────────

    /// Send a free-form user message in the current mode.
    ///
    /// In quiz mode the reply is graded and counted as an answered question.
    ///
    /// With a quiz question open, the message is taken as its answer and
    /// evaluated like [`TutorSession::submit_answer`].
    pub async fn send_message(&self, text: &str) -> TurnOutcome {
        let text = text.trim().to_string();
        let open_question = {
            let state = self.lock();
            (state.mode == Mode::Quiz)
                .then(|| state.current_question.clone())
                .flatten()
        };
        let kind = match open_question {
            Some(question) => TurnKind::Answer {
                question,
                answer: text,
            },
            None => TurnKind::Chat { text },
        };
        self.run_turn(kind).await
    }

    /// Ask for the first question of a quiz, without replaying history.
    pub async fn start_quiz(&self) -> TurnOutcome {
        self.run_turn(TurnKind::Question { first: true }).await
    }

    /// Ask for another question, different from those already asked.
    pub async fn next_question(&self) -> TurnOutcome {
        self.run_turn(TurnKind::Question { first: false }).await
    }

    /// Have the current question's answer evaluated and recorded.
    pub async fn submit_answer(&self, answer: &str) -> TurnOutcome {
        let question = self.lock().current_question.clone();
        let Some(question) = question else {
            debug!("answer submitted with no open question");
            return TurnOutcome::Rejected(Rejection::NoQuestion);
        };
        self.run_turn(TurnKind::Answer {
            question,
            answer: answer.trim().to_string(),
        })
        .await
    }

    async fn run_turn(&self, kind: TurnKind) -> TurnOutcome {
        let (request, generation) = {
            let mut state = self.lock();
            if let Err(rejection) = state.admit(&kind) {
                debug!(?rejection, "turn rejected");
                return TurnOutcome::Rejected(rejection);
            }
            state.in_flight = true;
            match &kind {
                TurnKind::Chat { text } => state.display.push(DisplayTurn::user(text.clone())),
                TurnKind::Answer { answer, .. } => {
                    state.display.push(DisplayTurn::user(answer.clone()));
                }
                TurnKind::Question { .. } => {}
            }
            (self.build_request(&state, &kind), state.generation)
        };
        let guard = InFlightGuard { state: &self.state };

        let result = self.transport.send(&request).await;

        let outcome = {
            let mut state = self.lock();
            if state.generation != generation {
                debug!(
                    started = generation,
                    current = state.generation,
                    "discarding stale response"
                );
                TurnOutcome::Discarded
            } else {
                match result {
                    Ok(reply) => TurnOutcome::Completed(state.complete(kind, reply)),
                    Err(err) => {
                        warn!(code = %err.code(), error = %err, "completion failed");
                        state.fail(&err)
                    }
                }
            }
        };
        drop(guard);
        outcome
    }

    fn build_request(&self, state: &SessionState, kind: &TurnKind) -> LlmRequest {
        let mode = match kind {
            TurnKind::Chat { .. } => state.mode,
            TurnKind::Question { .. } | TurnKind::Answer { .. } => Mode::Quiz,
        };
        let system = self.assembler.build(&PromptContext {
            mode,
            document_text: &state.document,
            progress: &state.progress,
            exam_config: state.exam_config.as_ref(),
            references: &state.references,
        });

        let empty: &[ConversationTurn] = &[];
        let (history, prompt) = match kind {
            TurnKind::Chat { text } => (state.log.replay(self.history_window), text.clone()),
            TurnKind::Question { first: true } => (empty, FIRST_QUESTION_REQUEST.to_string()),
            TurnKind::Question { first: false } => (
                state.log.replay(self.history_window),
                NEXT_QUESTION_REQUEST.to_string(),
            ),
            TurnKind::Answer { question, answer } => (
                state.log.replay(self.history_window),
                evaluation_request(question, answer),
            ),
        };
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.extend_from_slice(history);
        messages.push(ConversationTurn::user(prompt));

        LlmRequest {
            mode,
            system,
            messages,
            document_text: Arc::clone(&state.document),
            exam: state
                .exam_config
                .as_ref()
                .map(|config| (config.exam_type(), config.difficulty_level())),
            reference_count: state.references.len(),
        }
    }

    // ─── Views ─────────────────────────────────────────────────────────────────

    /// True while a turn is waiting for its response.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.lock().in_flight
    }

    #[must_use]
    pub fn is_mock(&self) -> bool {
        self.transport.is_mock()
    }

    #[must_use]
    pub fn progress(&self) -> ProgressState {
        self.lock().progress.clone()
    }

    #[must_use]
    pub fn log(&self) -> ConversationLog {
        self.lock().log.clone()
    }

    #[must_use]
    pub fn display(&self) -> Vec<DisplayTurn> {
        self.lock().display.clone()
    }

    #[must_use]
    pub fn current_topic(&self) -> Option<String> {
        self.lock().current_topic.clone()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<String> {
        self.lock().current_question.clone()
    }

    #[must_use]
    pub fn exam_config(&self) -> Option<ExamConfig> {
        self.lock().exam_config.clone()
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.lock().started_at
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    #[must_use]
    pub fn dashboard(&self) -> DashboardSummary {
        let state = self.lock();
        DashboardSummary::from_progress(&state.progress, state.started_at, self.clock.now())
    }
}
