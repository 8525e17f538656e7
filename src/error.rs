//! Error taxonomy: provider/fetch failures, session contract violations,
//! configuration parsing, and the terminal front-end.

use thiserror::Error;

use crate::session::Phase;

/// Failures while obtaining a batch of questions.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FetchError {
  #[error(transparent)]
  Http(#[from] reqwest::Error),
  #[error("provider answered with HTTP {0}")]
  HttpStatus(reqwest::StatusCode),
  #[error("provider did not answer in time")]
  Timeout,
  #[error("provider rejected the request (response code {code})")]
  Provider { code: u8 },
  #[error("no questions available for this selection")]
  NoQuestionsAvailable,
  #[error("malformed provider payload: {0}")]
  Malformed(String),
}

impl FetchError {
  /// Transport-level failure, as opposed to the provider having nothing to serve.
  pub fn is_network(&self) -> bool {
    matches!(self, FetchError::Http(_) | FetchError::HttpStatus(_) | FetchError::Timeout)
  }
}

/// Caller invoked an operation the current session state does not allow.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
  #[error("cannot {operation} while session is {phase}")]
  InvalidTransition { operation: &'static str, phase: Phase },
  #[error("a batch is already loading")]
  AlreadyLoading,
  #[error("session has no configuration")]
  NotConfigured,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
  #[error("question count must be between 1 and 50, got {0}")]
  CountOutOfRange(u32),
  #[error("unknown difficulty '{0}'")]
  UnknownDifficulty(String),
  #[error("unknown category '{0}'")]
  UnknownCategory(String),
}

/// Errors that end the interactive front-end.
#[derive(Debug, Error)]
pub enum CliError {
  #[error(transparent)]
  Io(#[from] std::io::Error),
  #[error(transparent)]
  Session(#[from] SessionError),
  #[error(transparent)]
  Config(#[from] ConfigError),
}
