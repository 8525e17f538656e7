//! Trivia Quiz · terminal client for the Open Trivia DB
//!
//! - Fetches multiple-choice / true-false questions (count lookup + batch, base64)
//! - One question at a time; wrong guesses are marked and may be retried
//! - "Game Over!" report with a play-again path
//!
//! Important env variables:
//!   TRIVIA_CONFIG_PATH  : path to TOML config (provider + setup defaults)
//!   OPENTDB_BASE_URL    : default "https://opentdb.com"
//!   TRIVIA_TIMEOUT_SECS : per-call provider timeout, default 10
//!   LOG_LEVEL           : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT          : "pretty" (default) or "json"

mod telemetry;
mod util;
mod error;
mod domain;
mod config;
mod opentdb;
mod source;
mod session;
mod cli;

use tokio::io::BufReader;
use tracing::{info, instrument};

use crate::cli::Console;
use crate::config::load_app_config;
use crate::opentdb::OpenTdb;
use crate::session::QuizSession;
use crate::source::QuestionSource;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let cfg = load_app_config();
  let provider = OpenTdb::new(&cfg.provider)?;
  info!(target: "trivia_quiz", base_url = %provider.base_url, timeout_secs = cfg.provider.timeout_secs, "Provider configured");
  let source = QuestionSource::new(provider, cfg.provider.timeout());

  let mut session = QuizSession::new();
  let mut console = Console::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout());

  tokio::select! {
    res = cli::run(&mut console, &mut session, &source, &cfg.defaults) => res?,
    _ = tokio::signal::ctrl_c() => {
      info!(target: "trivia_quiz", "Interrupted; bye");
    }
  }
  Ok(())
}
