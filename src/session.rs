use chrono::Utc;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::clock::{elapsed_ms, Clock, SystemClock};
use crate::error::QuizError;
use crate::metrics::{QuestionRecord, SessionMetrics};
use crate::question::{flatten_groups, Deck, Question};
use crate::scoring::{AnswerFeedback, ScoringEngine, TopicAggregate};
use crate::shuffle::shuffle;

pub const DEFAULT_ADVANCE_DELAY_MS: u64 = 800;
pub const DEFAULT_MASTERY_THRESHOLD: f64 = 0.9;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Pause after a correct answer before the next question is presented.
    pub advance_delay: Duration,
    /// Share of questions answered correctly (0..=1) a full run needs to count as mastered.
    pub mastery_threshold: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            advance_delay: Duration::from_millis(DEFAULT_ADVANCE_DELAY_MS),
            mastery_threshold: DEFAULT_MASTERY_THRESHOLD,
        }
    }
}

impl From<&crate::config::Config> for SessionConfig {
    fn from(cfg: &crate::config::Config) -> Self {
        Self {
            advance_delay: Duration::from_millis(cfg.advance_delay_ms),
            mastery_threshold: cfg.mastery_threshold,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionState {
    Unclicked,
    Correct,
    Incorrect,
}

/// The question currently on screen, with its options in presentation order.
#[derive(Debug, Clone)]
pub struct ActiveQuestion {
    pub question: Question,
    pub correct_index: usize,
    pub option_states: Vec<OptionState>,
    pub resolved: bool,
    pub explanation_visible: bool,
    presented_at: Instant,
}

impl ActiveQuestion {
    fn present(mut question: Question, rng: &mut StdRng, now: Instant) -> Option<Self> {
        shuffle(&mut question.options, rng);
        let correct_index = question.correct_index()?;
        let option_count = question.options.len();

        Some(Self {
            question,
            correct_index,
            option_states: vec![OptionState::Unclicked; option_count],
            resolved: false,
            explanation_visible: false,
            presented_at: now,
        })
    }

    pub fn presented_at(&self) -> Instant {
        self.presented_at
    }
}

/// Handle for the scheduled move to the next question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingAdvance {
    due: Instant,
}

impl PendingAdvance {
    pub fn due(&self) -> Instant {
        self.due
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.due
    }
}

#[derive(Debug, Clone)]
pub struct SessionState {
    pub remaining_questions: VecDeque<Question>,
    pub completed_count: usize,
    pub total_count: usize,
    pub is_first_attempt_on_current_question: bool,
    pub phase: Phase,
    pub ended_early: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            remaining_questions: VecDeque::new(),
            completed_count: 0,
            total_count: 0,
            is_first_attempt_on_current_question: true,
            phase: Phase::Idle,
            ended_early: false,
        }
    }
}

impl SessionState {
    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }
}

/// Live numbers for the stats row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub points: u64,
    pub streak: u32,
    pub done: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerResult {
    pub correct: bool,
    pub first_attempt: bool,
    pub elapsed_ms: u64,
    pub feedback: AnswerFeedback,
    pub advance_at: Option<Instant>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// Question already resolved, option already clicked, or no question active.
    Ignored,
    Answered(AnswerResult),
}

/// Drives one quiz at a time: sequencing, first-attempt tracking, timing and
/// completion. Scoring and metrics are delegated to their own components.
pub struct SessionController<C: Clock = SystemClock> {
    config: SessionConfig,
    clock: C,
    rng: StdRng,
    test_id: String,
    state: SessionState,
    scoring: ScoringEngine,
    metrics: SessionMetrics,
    current: Option<ActiveQuestion>,
    pending: Option<PendingAdvance>,
}

impl<C: Clock> SessionController<C> {
    pub fn new(config: SessionConfig, clock: C) -> Self {
        Self::with_rng(config, clock, StdRng::from_entropy())
    }

    pub fn with_seed(config: SessionConfig, clock: C, seed: u64) -> Self {
        Self::with_rng(config, clock, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: SessionConfig, clock: C, rng: StdRng) -> Self {
        Self {
            config,
            clock,
            rng,
            test_id: String::new(),
            state: SessionState::default(),
            scoring: ScoringEngine::new(),
            metrics: SessionMetrics::new(),
            current: None,
            pending: None,
        }
    }

    /// Begin a new test. Any previous session is discarded entirely. If the
    /// deck is malformed nothing changes and the error is returned.
    pub fn start(&mut self, deck: &Deck) -> Result<(), QuizError> {
        let mut questions = flatten_groups(&deck.topics)?;
        shuffle(&mut questions, &mut self.rng);

        self.test_id = deck.test_name.clone();
        self.state = SessionState {
            total_count: questions.len(),
            remaining_questions: questions.into(),
            phase: Phase::Running,
            ..SessionState::default()
        };
        self.scoring.reset();
        self.metrics = SessionMetrics::new();
        self.current = None;
        self.pending = None;

        info!(
            test_id = %self.test_id,
            questions = self.state.total_count,
            "session started"
        );
        Ok(())
    }

    /// Pull the next question off the queue, or complete the session when the
    /// queue is empty. Any pending advance is cancelled.
    pub fn present_next(&mut self) -> Option<&ActiveQuestion> {
        if !self.state.is_running() {
            return None;
        }
        self.pending = None;

        loop {
            let Some(question) = self.state.remaining_questions.pop_front() else {
                self.finish();
                return None;
            };

            match ActiveQuestion::present(question, &mut self.rng, self.clock.now()) {
                Some(active) => {
                    self.state.completed_count += 1;
                    self.state.is_first_attempt_on_current_question = true;
                    debug!(
                        done = self.state.completed_count,
                        total = self.state.total_count,
                        topic = %active.question.topic,
                        "presenting question"
                    );
                    self.current = Some(active);
                    return self.current.as_ref();
                }
                None => {
                    // flatten_groups validated every question, so this is unreachable
                    // unless the queue was edited from outside.
                    warn!("skipping question without a matching correct option");
                }
            }
        }
    }

    /// Select an option of the current question by its presented index.
    pub fn answer(&mut self, option: usize) -> Result<AnswerOutcome, QuizError> {
        if !self.state.is_running() {
            return Ok(AnswerOutcome::Ignored);
        }
        let Some(active) = self.current.as_mut() else {
            return Ok(AnswerOutcome::Ignored);
        };

        let len = active.option_states.len();
        if option >= len {
            return Err(QuizError::OptionOutOfRange { index: option, len });
        }
        if active.resolved || active.option_states[option] != OptionState::Unclicked {
            return Ok(AnswerOutcome::Ignored);
        }

        let now = self.clock.now();
        let elapsed = elapsed_ms(active.presented_at, now);
        let correct = option == active.correct_index;
        let first_attempt = self.state.is_first_attempt_on_current_question;
        let topic = active.question.topic.clone();

        self.metrics.record(&topic, elapsed, correct, first_attempt);
        let feedback = self.scoring.record_answer(&topic, correct, first_attempt);

        let advance_at = if correct {
            active.option_states[option] = OptionState::Correct;
            active.resolved = true;
            let due = now + self.config.advance_delay;
            self.pending = Some(PendingAdvance { due });
            Some(due)
        } else {
            active.option_states[option] = OptionState::Incorrect;
            active.explanation_visible = true;
            self.state.is_first_attempt_on_current_question = false;
            None
        };

        debug!(%topic, correct, first_attempt, elapsed, delta = feedback.points_delta, "answer");

        Ok(AnswerOutcome::Answered(AnswerResult {
            correct,
            first_attempt,
            elapsed_ms: elapsed,
            feedback,
            advance_at,
        }))
    }

    /// Select an option of the current question by its text.
    pub fn answer_option(&mut self, option: &str) -> Result<AnswerOutcome, QuizError> {
        let index = match &self.current {
            Some(active) if self.state.is_running() => active
                .question
                .options
                .iter()
                .position(|o| o == option)
                .ok_or_else(|| QuizError::UnknownOption(option.to_string()))?,
            _ => return Ok(AnswerOutcome::Ignored),
        };
        self.answer(index)
    }

    /// Fire the pending advance if its deadline has passed. Returns true when a
    /// transition happened.
    pub fn tick(&mut self) -> bool {
        match self.pending {
            Some(pending) if self.state.is_running() && pending.is_due(self.clock.now()) => {
                self.present_next();
                true
            }
            _ => false,
        }
    }

    pub fn pending_advance(&self) -> Option<PendingAdvance> {
        self.pending
    }

    /// Stop the test now. Only meaningful while running.
    pub fn end_early(&mut self) {
        if !self.state.is_running() {
            return;
        }
        self.state.ended_early = true;
        self.finish();
    }

    fn finish(&mut self) {
        self.state.phase = Phase::Complete;
        self.pending = None;
        self.current = None;
        info!(
            test_id = %self.test_id,
            completed = self.state.completed_count,
            total = self.state.total_count,
            points = self.scoring.total_points(),
            ended_early = self.state.ended_early,
            "session complete"
        );
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn current(&self) -> Option<&ActiveQuestion> {
        self.current.as_ref()
    }

    pub fn scoring(&self) -> &ScoringEngine {
        &self.scoring
    }

    pub fn metrics(&self) -> &SessionMetrics {
        &self.metrics
    }

    pub fn test_id(&self) -> &str {
        &self.test_id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn progress(&self) -> Progress {
        Progress {
            points: self.scoring.total_points(),
            streak: self.scoring.current_streak(),
            done: self.state.completed_count,
            total: self.state.total_count,
        }
    }

    /// Read-only snapshot, available once the session is complete.
    pub fn summary(&self) -> Option<SessionSummary> {
        if self.state.phase != Phase::Complete {
            return None;
        }
        Some(SessionSummary {
            test_id: self.test_id.clone(),
            completed_count: self.state.completed_count,
            total_count: self.state.total_count,
            total_points: self.scoring.total_points(),
            topic_aggregate: self.scoring.topics().clone(),
            ended_early: self.state.ended_early,
            metrics: self.metrics.clone(),
            mastery_threshold: self.config.mastery_threshold,
        })
    }
}

/// Terminal result of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub test_id: String,
    pub completed_count: usize,
    pub total_count: usize,
    pub total_points: u64,
    pub topic_aggregate: TopicAggregate,
    pub ended_early: bool,
    pub metrics: SessionMetrics,
    pub mastery_threshold: f64,
}

impl SessionSummary {
    /// Correct answers over the number of questions in the test. Retries do
    /// not count against it.
    pub fn mastery_ratio(&self) -> f64 {
        if self.total_count == 0 {
            0.0
        } else {
            self.topic_aggregate.total_correct() as f64 / self.total_count as f64
        }
    }

    pub fn is_mastered(&self) -> bool {
        self.total_count > 0
            && self.completed_count == self.total_count
            && !self.ended_early
            && self.mastery_ratio() >= self.mastery_threshold
    }

    /// Shape handed to a result store. Keeps the last `sample_size` attempts.
    pub fn report(&self, sample_size: usize) -> SessionReport {
        let topic_aggregate = self
            .topic_aggregate
            .iter()
            .map(|(topic, score)| {
                (
                    topic.to_string(),
                    TopicReport {
                        first_attempt_correct_count: score.first_attempt_correct_count,
                        total_count: score.total_count,
                        average_elapsed_ms: self
                            .metrics
                            .topic(topic)
                            .and_then(|t| t.average_elapsed_ms()),
                    },
                )
            })
            .collect();

        SessionReport {
            test_id: self.test_id.clone(),
            total_points: self.total_points,
            timestamp: Utc::now().to_rfc3339(),
            topic_aggregate,
            sample_questions: self.metrics.recent(sample_size).to_vec(),
        }
    }

    pub fn achievement(&self, user_id: &str) -> Option<Achievement> {
        self.is_mastered().then(|| Achievement {
            user_id: user_id.to_string(),
            achievement_label: format!("mastered {}", self.test_id),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicReport {
    pub first_attempt_correct_count: u64,
    pub total_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_elapsed_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    pub test_id: String,
    pub total_points: u64,
    pub timestamp: String,
    pub topic_aggregate: BTreeMap<String, TopicReport>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sample_questions: Vec<QuestionRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub user_id: String,
    pub achievement_label: String,
}
