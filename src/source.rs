//! Question source: turns a `SessionConfig` into a bounded, decoded batch.
//!
//! Flow:
//! 1) With a category set, ask the provider how many questions exist
//!    (difficulty-specific when a difficulty is set) and clamp the request.
//! 2) Fetch the batch with the clamped amount.
//! 3) Decode every base64 field so sessions only ever see plain text.
//!
//! Both provider calls run sequentially, each under the configured timeout.

use std::future::Future;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::{debug, info, instrument, warn};

use crate::domain::{Difficulty, Question, QuestionKind, SessionConfig};
use crate::error::FetchError;
use crate::opentdb::{BatchRequest, RawQuestion, TriviaProvider};
use crate::util::trunc_for_log;

pub struct QuestionSource<P> {
  provider: P,
  timeout: Duration,
}

impl<P: TriviaProvider> QuestionSource<P> {
  pub fn new(provider: P, timeout: Duration) -> Self {
    Self { provider, timeout }
  }

  #[cfg(test)]
  pub fn provider(&self) -> &P {
    &self.provider
  }

  /// Fetch a batch for `config`. May return fewer questions than requested
  /// when the provider has fewer available; never returns an empty list.
  #[instrument(
    level = "info",
    skip(self, config),
    fields(desired = config.desired_count(), category = ?config.category(), difficulty = ?config.difficulty())
  )]
  pub async fn fetch_batch(&self, config: &SessionConfig) -> Result<Vec<Question>, FetchError> {
    let mut amount = config.desired_count();

    if let Some(category) = config.category() {
      let counts = bounded(self.timeout, self.provider.category_count(category)).await?;
      let ceiling = counts.available(config.difficulty());
      if ceiling == 0 {
        warn!(target: "provider", %category, "Provider reports no questions for this selection");
        return Err(FetchError::NoQuestionsAvailable);
      }
      if ceiling < amount {
        info!(target: "provider", requested = amount, available = ceiling, "Clamping request to available questions");
        amount = ceiling;
      }
    }

    let request = BatchRequest { amount, category: config.category(), difficulty: config.difficulty() };
    let raw = bounded(self.timeout, self.provider.fetch_batch(&request)).await?;
    if raw.is_empty() {
      warn!(target: "provider", amount, "Provider returned an empty batch");
      return Err(FetchError::NoQuestionsAvailable);
    }

    let questions = raw.iter().map(decode_question).collect::<Result<Vec<_>, _>>()?;
    debug!(
      target: "provider",
      count = questions.len(),
      first = %trunc_for_log(&questions[0].prompt, 40),
      "Batch decoded"
    );
    Ok(questions)
  }
}

/// Run a provider call under a deadline; expiry is a fetch failure.
async fn bounded<T>(
  limit: Duration,
  call: impl Future<Output = Result<T, FetchError>>,
) -> Result<T, FetchError> {
  match tokio::time::timeout(limit, call).await {
    Ok(result) => result,
    Err(_) => {
      warn!(target: "provider", ?limit, "Provider call timed out");
      Err(FetchError::Timeout)
    }
  }
}

/// Decode one base64 text field into UTF-8.
pub fn decode_field(encoded: &str) -> Result<String, FetchError> {
  let bytes = STANDARD
    .decode(encoded.trim())
    .map_err(|e| FetchError::Malformed(format!("invalid base64: {e}")))?;
  String::from_utf8(bytes).map_err(|e| FetchError::Malformed(format!("invalid utf-8: {e}")))
}

/// Decode a raw record and check its answer count against its kind.
pub fn decode_question(raw: &RawQuestion) -> Result<Question, FetchError> {
  let tag = decode_field(&raw.kind)?;
  let kind = QuestionKind::parse_tag(&tag)
    .ok_or_else(|| FetchError::Malformed(format!("unknown question type '{tag}'")))?;
  let difficulty = decode_field(&raw.difficulty)?
    .parse::<Difficulty>()
    .map_err(|e| FetchError::Malformed(e.to_string()))?;

  let incorrect_answers = raw
    .incorrect_answers
    .iter()
    .map(|a| decode_field(a))
    .collect::<Result<Vec<_>, _>>()?;
  if incorrect_answers.len() != kind.incorrect_count() {
    return Err(FetchError::Malformed(format!(
      "{tag} question carries {} incorrect answers, expected {}",
      incorrect_answers.len(),
      kind.incorrect_count()
    )));
  }

  Ok(Question {
    category: decode_field(&raw.category)?,
    kind,
    difficulty,
    prompt: decode_field(&raw.question)?,
    correct_answer: decode_field(&raw.correct_answer)?,
    incorrect_answers,
  })
}


#[cfg(test)]
mod tests {
  use super::fixtures::*;
  use super::*;
  use crate::domain::Category;
  use crate::opentdb::fake::FakeProvider;
  use crate::opentdb::CategoryCounts;

  fn source(p: FakeProvider) -> QuestionSource<FakeProvider> {
    QuestionSource::new(p, Duration::from_secs(5))
  }

  #[test]
  fn decodes_every_text_field() {
    let q = decode_question(&france()).unwrap();
    assert_eq!(q.prompt, "Capital of France?");
    assert_eq!(q.correct_answer, "Paris");
    assert_eq!(q.incorrect_answers, vec!["Berlin", "Madrid", "Rome"]);
    assert_eq!(q.category, "General Knowledge");
    assert_eq!(q.kind, QuestionKind::Multiple);
    assert_eq!(q.difficulty, Difficulty::Easy);
  }

  #[test]
  fn decodes_non_ascii_text() {
    let raw = raw_multiple("Quelle est la capitale de l'Allemagne ?", "Berlin", ["Zürich", "Wien", "Köln"]);
    let q = decode_question(&raw).unwrap();
    assert_eq!(q.incorrect_answers[0], "Zürich");
  }

  #[test]
  fn rejects_bad_payloads() {
    let mut raw = france();
    raw.correct_answer = "%%%not base64".into();
    assert!(matches!(decode_question(&raw), Err(FetchError::Malformed(_))));

    let mut raw = france();
    raw.kind = encode("essay");
    assert!(matches!(decode_question(&raw), Err(FetchError::Malformed(_))));

    let mut raw = raw_boolean("Sky is blue?", "True");
    raw.incorrect_answers.push(encode("Maybe"));
    assert!(matches!(decode_question(&raw), Err(FetchError::Malformed(_))));
  }

  #[tokio::test]
  async fn no_category_skips_count_lookup() {
    let src = source(FakeProvider::serving(vec![france()]));
    let cfg = SessionConfig::new(1, None, None).unwrap();

    let questions = src.fetch_batch(&cfg).await.unwrap();
    assert_eq!(questions.len(), 1);
    assert!(src.provider().count_requests().is_empty());
    assert_eq!(
      src.provider().batch_requests(),
      vec![BatchRequest { amount: 1, category: None, difficulty: None }]
    );
  }

  #[tokio::test]
  async fn clamps_to_difficulty_specific_ceiling() {
    let counts = CategoryCounts {
      total_question_count: 200,
      total_easy_question_count: 90,
      total_medium_question_count: 10,
      total_hard_question_count: 100,
    };
    let src = source(FakeProvider::serving(numbered(50)).with_counts(counts));
    let cfg = SessionConfig::new(50, Some(Category::Animals), Some(Difficulty::Medium)).unwrap();

    let questions = src.fetch_batch(&cfg).await.unwrap();
    assert_eq!(questions.len(), 10);
    assert_eq!(src.provider().count_requests(), vec![Category::Animals]);
    assert_eq!(
      src.provider().batch_requests(),
      vec![BatchRequest { amount: 10, category: Some(Category::Animals), difficulty: Some(Difficulty::Medium) }]
    );
  }

  #[tokio::test]
  async fn uses_total_count_without_difficulty() {
    let counts = CategoryCounts { total_question_count: 7, ..CategoryCounts::default() };
    let src = source(FakeProvider::serving(numbered(20)).with_counts(counts));
    let cfg = SessionConfig::new(20, Some(Category::Comics), None).unwrap();

    assert_eq!(src.fetch_batch(&cfg).await.unwrap().len(), 7);
    assert_eq!(src.provider().batch_requests()[0].amount, 7);
  }

  #[tokio::test]
  async fn ceiling_above_request_leaves_it_alone() {
    let src = source(FakeProvider::serving(numbered(20)));
    let cfg = SessionConfig::new(5, Some(Category::History), Some(Difficulty::Hard)).unwrap();

    assert_eq!(src.fetch_batch(&cfg).await.unwrap().len(), 5);
    assert_eq!(src.provider().batch_requests()[0].amount, 5);
  }

  #[tokio::test]
  async fn zero_ceiling_short_circuits() {
    let src = source(FakeProvider::serving(numbered(3)).with_counts(CategoryCounts::default()));
    let cfg = SessionConfig::new(3, Some(Category::Gadgets), Some(Difficulty::Hard)).unwrap();

    assert!(matches!(src.fetch_batch(&cfg).await, Err(FetchError::NoQuestionsAvailable)));
    assert!(src.provider().batch_requests().is_empty());
  }

  #[tokio::test]
  async fn empty_batch_is_no_questions_not_network() {
    let src = source(FakeProvider::serving(Vec::new()));
    let cfg = SessionConfig::new(4, None, None).unwrap();

    let err = src.fetch_batch(&cfg).await.unwrap_err();
    assert!(matches!(err, FetchError::NoQuestionsAvailable));
    assert!(!err.is_network());
  }

  #[tokio::test]
  async fn provider_failure_propagates() {
    let src = source(FakeProvider::failing(|| FetchError::HttpStatus(reqwest::StatusCode::BAD_GATEWAY)));
    let cfg = SessionConfig::new(4, Some(Category::Art), None).unwrap();

    let err = src.fetch_batch(&cfg).await.unwrap_err();
    assert!(err.is_network());
    assert!(src.provider().batch_requests().is_empty());
  }

  #[tokio::test(start_paused = true)]
  async fn slow_provider_times_out() {
    let mut p = FakeProvider::serving(vec![france()]);
    p.delay = Some(Duration::from_secs(30));
    let src = QuestionSource::new(p, Duration::from_secs(2));
    let cfg = SessionConfig::new(1, None, None).unwrap();

    let err = src.fetch_batch(&cfg).await.unwrap_err();
    assert!(matches!(err, FetchError::Timeout));
    assert!(err.is_network());
  }
}
