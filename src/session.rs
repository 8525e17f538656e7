//! Quiz session state machine.
//!
//! A session moves through five explicit states:
//!
//! ```text
//! NotStarted --start--> Loading --ok--> InProgress --last correct--> Finished
//!     ^                    |                 |
//!     |                    +--fail--> Errored (start again to retry)
//!     +----------------------- reset (from anywhere) -------------------+
//! ```
//!
//! Wrong answers never advance; they are recorded in a session-wide set so the
//! front-end can mark options already tried. Every time a question becomes
//! current its answers are shuffled again with the session's own rng.

use std::collections::HashSet;
use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::domain::{Question, SessionConfig};
use crate::error::{FetchError, SessionError};
use crate::opentdb::TriviaProvider;
use crate::source::QuestionSource;
use crate::util::shuffle;

/// Data-less tag of `SessionState`, handy for logging and error reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
  NotStarted,
  Loading,
  InProgress,
  Errored,
  Finished,
}

impl fmt::Display for Phase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      Phase::NotStarted => "not started",
      Phase::Loading => "loading",
      Phase::InProgress => "in progress",
      Phase::Errored => "errored",
      Phase::Finished => "finished",
    };
    f.write_str(s)
  }
}

/// A running quiz: the fetched batch plus where the user is in it.
#[derive(Debug)]
pub struct Round {
  questions: Vec<Question>,
  position: usize,
  answer_order: Vec<String>,
  missed: HashSet<String>,
}

impl Round {
  pub fn total(&self) -> usize { self.questions.len() }
  pub fn answer_order(&self) -> &[String] { &self.answer_order }

  pub fn current(&self) -> &Question {
    &self.questions[self.position]
  }

  fn is_last(&self) -> bool {
    self.position + 1 == self.questions.len()
  }
}

/// Game Over report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
  pub total: usize,
  pub missed: HashSet<String>,
}

#[derive(Debug)]
pub enum SessionState {
  NotStarted,
  Loading,
  InProgress(Round),
  Errored(FetchError),
  Finished(Summary),
}

impl SessionState {
  pub fn phase(&self) -> Phase {
    match self {
      SessionState::NotStarted => Phase::NotStarted,
      SessionState::Loading => Phase::Loading,
      SessionState::InProgress(_) => Phase::InProgress,
      SessionState::Errored(_) => Phase::Errored,
      SessionState::Finished(_) => Phase::Finished,
    }
  }
}

/// Result of a single `submit_answer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
  /// Right answer; the next question (0-based) is now current.
  Correct { next_position: usize },
  /// Wrong answer; same question stays current. `already_missed` is true when
  /// this exact text had been tried before.
  Incorrect { already_missed: bool },
  /// Right answer on the last question; the session is over.
  Finished { total: usize },
}

pub struct QuizSession<R = StdRng> {
  id: Uuid,
  config: Option<SessionConfig>,
  state: SessionState,
  rng: R,
}

impl QuizSession<StdRng> {
  /// Session with an entropy-seeded rng.
  pub fn new() -> Self {
    Self::with_rng(StdRng::from_entropy())
  }
}

impl Default for QuizSession<StdRng> {
  fn default() -> Self {
    Self::new()
  }
}

impl<R: Rng> QuizSession<R> {
  pub fn with_rng(rng: R) -> Self {
    Self { id: Uuid::new_v4(), config: None, state: SessionState::NotStarted, rng }
  }

  pub fn id(&self) -> Uuid { self.id }
  pub fn config(&self) -> Option<&SessionConfig> { self.config.as_ref() }
  pub fn state(&self) -> &SessionState { &self.state }
  pub fn phase(&self) -> Phase { self.state.phase() }

  fn round(&self) -> Option<&Round> {
    match &self.state {
      SessionState::InProgress(round) => Some(round),
      _ => None,
    }
  }

  pub fn current_question(&self) -> Option<&Question> {
    self.round().map(Round::current)
  }

  #[allow(dead_code)]
  pub fn current_prompt(&self) -> Option<&str> {
    self.current_question().map(|q| q.prompt.as_str())
  }

  /// Shuffled options of the current question; empty outside `InProgress`.
  pub fn answer_order(&self) -> &[String] {
    self.round().map(Round::answer_order).unwrap_or(&[])
  }

  /// Wrong answers tried so far (still readable once finished).
  pub fn missed_answers(&self) -> Option<&HashSet<String>> {
    match &self.state {
      SessionState::InProgress(round) => Some(&round.missed),
      SessionState::Finished(summary) => Some(&summary.missed),
      _ => None,
    }
  }

  pub fn is_missed(&self, answer: &str) -> bool {
    self.missed_answers().is_some_and(|m| m.contains(answer))
  }

  /// `(current question number, total)`, 1-based, while in progress.
  pub fn progress(&self) -> Option<(usize, usize)> {
    self.round().map(|r| (r.position + 1, r.total()))
  }

  pub fn error(&self) -> Option<&FetchError> {
    match &self.state {
      SessionState::Errored(e) => Some(e),
      _ => None,
    }
  }

  /// Store the configuration for the next `start`.
  #[instrument(level = "debug", skip(self), fields(session = %self.id))]
  pub fn configure(&mut self, config: SessionConfig) -> Result<(), SessionError> {
    match self.phase() {
      Phase::NotStarted | Phase::Errored => {
        self.config = Some(config);
        Ok(())
      }
      phase => Err(SessionError::InvalidTransition { operation: "configure", phase }),
    }
  }

  /// NotStarted | Errored -> Loading. Returns the config the fetch should use.
  pub fn begin_loading(&mut self) -> Result<SessionConfig, SessionError> {
    match self.phase() {
      Phase::NotStarted | Phase::Errored => {}
      Phase::Loading => return Err(SessionError::AlreadyLoading),
      phase => return Err(SessionError::InvalidTransition { operation: "start", phase }),
    }
    let config = self.config.ok_or(SessionError::NotConfigured)?;
    self.state = SessionState::Loading;
    debug!(target: "quiz", session = %self.id, "Loading questions");
    Ok(config)
  }

  /// Loading -> InProgress (non-empty batch) or Errored.
  pub fn finish_loading(&mut self, fetched: Result<Vec<Question>, FetchError>) -> Result<Phase, SessionError> {
    if self.phase() != Phase::Loading {
      return Err(SessionError::InvalidTransition { operation: "finish loading", phase: self.phase() });
    }
    self.state = match fetched {
      Ok(questions) if !questions.is_empty() => {
        let answer_order = shuffle(questions[0].answers(), &mut self.rng);
        info!(target: "quiz", session = %self.id, total = questions.len(), "Quiz started");
        SessionState::InProgress(Round { questions, position: 0, answer_order, missed: HashSet::new() })
      }
      Ok(_) => {
        warn!(target: "quiz", session = %self.id, "Empty batch; session errored");
        SessionState::Errored(FetchError::NoQuestionsAvailable)
      }
      Err(e) => {
        warn!(target: "quiz", session = %self.id, error = %e, network = e.is_network(), "Fetch failed; session errored");
        SessionState::Errored(e)
      }
    };
    Ok(self.phase())
  }

  /// Fetch a batch for the stored config and enter `InProgress` or `Errored`.
  /// Provider failures end in `Errored` (returned as `Ok`); only contract
  /// violations are `Err`.
  #[instrument(level = "info", skip(self, source), fields(session = %self.id))]
  pub async fn start<P: TriviaProvider>(&mut self, source: &QuestionSource<P>) -> Result<Phase, SessionError> {
    let config = self.begin_loading()?;
    let fetched = source.fetch_batch(&config).await;
    self.finish_loading(fetched)
  }

  /// Check `answer` against the current question.
  #[instrument(level = "debug", skip(self, answer), fields(session = %self.id, answer_len = answer.len()))]
  pub fn submit_answer(&mut self, answer: &str) -> Result<AnswerOutcome, SessionError> {
    let phase = self.phase();
    let SessionState::InProgress(round) = &mut self.state else {
      return Err(SessionError::InvalidTransition { operation: "submit an answer", phase });
    };

    if !round.current().is_correct(answer) {
      let already_missed = !round.missed.insert(answer.to_string());
      debug!(target: "quiz", session = %self.id, position = round.position, already_missed, "Incorrect answer");
      return Ok(AnswerOutcome::Incorrect { already_missed });
    }

    if round.is_last() {
      let total = round.total();
      let missed = std::mem::take(&mut round.missed);
      info!(target: "quiz", session = %self.id, total, missed = missed.len(), "Quiz finished");
      self.state = SessionState::Finished(Summary { total, missed });
      return Ok(AnswerOutcome::Finished { total });
    }

    round.position += 1;
    round.answer_order = shuffle(round.current().answers(), &mut self.rng);
    debug!(target: "quiz", session = %self.id, position = round.position, "Advanced to next question");
    Ok(AnswerOutcome::Correct { next_position: round.position })
  }

  /// Back to a brand-new `NotStarted` session: new id, no config, no questions.
  pub fn reset(&mut self) {
    let previous = std::mem::replace(&mut self.id, Uuid::new_v4());
    debug!(target: "quiz", session = %previous, next = %self.id, from = %self.phase(), "Session reset");
    self.config = None;
    self.state = SessionState::NotStarted;
  }
}
