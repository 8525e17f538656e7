//! Minimal Open Trivia DB client for our use-cases.
//!
//! Two calls only: the per-category count lookup and the question batch.
//! Calls are instrumented and log status, latency and result sizes (not contents).
//!
//! NOTE: batch text fields arrive base64-encoded and stay encoded here;
//! `source` decodes them.

use std::future::Future;
use std::time::{Duration, Instant};

use reqwest::header::USER_AGENT;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::config::ProviderConfig;
use crate::domain::{Category, Difficulty};
use crate::error::FetchError;

const USER_AGENT_VALUE: &str = "trivia-quiz/0.1";

/// Provider response codes (`response_code` in batch replies).
const CODE_SUCCESS: u8 = 0;
const CODE_NO_RESULTS: u8 = 1;

/// Raw provider seam. `OpenTdb` talks HTTP; tests plug in fakes.
pub trait TriviaProvider {
  /// Available-question counts for one category.
  fn category_count(
    &self,
    category: Category,
  ) -> impl Future<Output = Result<CategoryCounts, FetchError>> + Send;

  /// One batch of still-encoded question records.
  fn fetch_batch(
    &self,
    request: &BatchRequest,
  ) -> impl Future<Output = Result<Vec<RawQuestion>, FetchError>> + Send;
}

/// Parameters of a batch call, after clamping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchRequest {
  pub amount: u32,
  pub category: Option<Category>,
  pub difficulty: Option<Difficulty>,
}

impl BatchRequest {
  /// Query pairs in provider order; base64 encoding is always requested.
  pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
    let mut pairs = vec![("amount", self.amount.to_string())];
    if let Some(c) = self.category {
      pairs.push(("category", c.id().to_string()));
    }
    if let Some(d) = self.difficulty {
      pairs.push(("difficulty", d.as_str().to_string()));
    }
    pairs.push(("encode", "base64".to_string()));
    pairs
  }
}

/// `category_question_count` object of the count endpoint.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct CategoryCounts {
  pub total_question_count: u32,
  #[serde(default)] pub total_easy_question_count: u32,
  #[serde(default)] pub total_medium_question_count: u32,
  #[serde(default)] pub total_hard_question_count: u32,
}

impl CategoryCounts {
  /// Ceiling for a difficulty, or the overall total for "any".
  pub fn available(&self, difficulty: Option<Difficulty>) -> u32 {
    match difficulty {
      None => self.total_question_count,
      Some(Difficulty::Easy) => self.total_easy_question_count,
      Some(Difficulty::Medium) => self.total_medium_question_count,
      Some(Difficulty::Hard) => self.total_hard_question_count,
    }
  }
}

/// One record of the batch endpoint, every string still base64-encoded.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct RawQuestion {
  pub category: String,
  #[serde(rename = "type")]
  pub kind: String,
  pub difficulty: String,
  pub question: String,
  pub correct_answer: String,
  pub incorrect_answers: Vec<String>,
}

#[derive(Deserialize)]
struct CountResponse {
  #[allow(dead_code)]
  #[serde(default)]
  category_id: Option<u32>,
  category_question_count: CategoryCounts,
}

#[derive(Deserialize)]
struct BatchResponse {
  response_code: u8,
  #[serde(default)]
  results: Vec<RawQuestion>,
}

#[derive(Clone)]
pub struct OpenTdb {
  pub client: reqwest::Client,
  pub base_url: String,
}

impl OpenTdb {
  /// Build the HTTP client with the configured base URL and request timeout.
  pub fn new(cfg: &ProviderConfig) -> Result<Self, FetchError> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(cfg.timeout_secs))
      .build()?;
    Ok(Self { client, base_url: cfg.base_url.trim_end_matches('/').to_string() })
  }

  #[instrument(level = "debug", skip(self, query), fields(%path))]
  async fn get_json<T: for<'a> Deserialize<'a>>(
    &self,
    path: &str,
    query: &[(&'static str, String)],
  ) -> Result<T, FetchError> {
    let url = format!("{}/{}", self.base_url, path);
    let start = Instant::now();
    let res = self.client.get(&url)
      .header(USER_AGENT, USER_AGENT_VALUE)
      .query(query)
      .send().await
      .map_err(classify)?;

    let status = res.status();
    if !status.is_success() {
      warn!(target: "provider", %path, %status, elapsed = ?start.elapsed(), "Provider returned non-success status");
      return Err(FetchError::HttpStatus(status));
    }

    let body = res.json::<T>().await.map_err(classify)?;
    debug!(target: "provider", %path, %status, elapsed = ?start.elapsed(), "Provider response received");
    Ok(body)
  }
}

/// Keep timeouts distinguishable from other transport failures.
fn classify(e: reqwest::Error) -> FetchError {
  if e.is_timeout() {
    FetchError::Timeout
  } else if e.is_decode() {
    FetchError::Malformed(e.to_string())
  } else {
    FetchError::Http(e)
  }
}

/// Map a batch reply onto results or a typed failure.
fn batch_results(body: BatchResponse) -> Result<Vec<RawQuestion>, FetchError> {
  match body.response_code {
    CODE_SUCCESS => Ok(body.results),
    CODE_NO_RESULTS => Err(FetchError::NoQuestionsAvailable),
    code => Err(FetchError::Provider { code }),
  }
}

impl TriviaProvider for OpenTdb {
  #[instrument(level = "info", skip(self), fields(category = category.id()))]
  async fn category_count(&self, category: Category) -> Result<CategoryCounts, FetchError> {
    let body: CountResponse = self
      .get_json("api_count.php", &[("category", category.id().to_string())])
      .await?;
    let counts = body.category_question_count;
    info!(target: "provider", category = %category, total = counts.total_question_count, "Category count fetched");
    Ok(counts)
  }

  #[instrument(level = "info", skip(self, request), fields(amount = request.amount))]
  async fn fetch_batch(&self, request: &BatchRequest) -> Result<Vec<RawQuestion>, FetchError> {
    let body: BatchResponse = self.get_json("api.php", &request.query_pairs()).await?;
    let code = body.response_code;
    let results = batch_results(body)?;
    info!(target: "provider", response_code = code, received = results.len(), "Question batch fetched");
    Ok(results)
  }
}
