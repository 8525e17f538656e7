//! Interactive terminal front-end. Thin layer over `QuizSession`:
//!
//!   - setup prompts (count, difficulty, category) pre-filled from config
//!   - question screen with numbered options, missed options marked, counter
//!   - "Something went wrong!" with a retry path, "Game Over!" with play again
//!
//! Reader/writer are generic so tests can script a whole game.

use rand::Rng;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, instrument};

use crate::config::Defaults;
use crate::domain::{
  parse_category_choice, parse_difficulty_choice, Category, Difficulty, SessionConfig, MAX_QUESTIONS,
};
use crate::error::CliError;
use crate::opentdb::TriviaProvider;
use crate::session::{AnswerOutcome, Phase, QuizSession, SessionState, Summary};
use crate::source::QuestionSource;

const MISSED_MARK: &str = " ✗";

pub struct Console<R, W> {
  input: R,
  output: W,
}

impl<R: AsyncBufRead + Unpin, W: AsyncWrite + Unpin> Console<R, W> {
  pub fn new(input: R, output: W) -> Self {
    Self { input, output }
  }

  #[cfg(test)]
  pub fn into_output(self) -> W {
    self.output
  }

  async fn say(&mut self, text: &str) -> std::io::Result<()> {
    self.output.write_all(text.as_bytes()).await?;
    self.output.write_all(b"\n").await?;
    self.output.flush().await
  }

  /// Print `prompt` and read one line without its terminator. `None` on EOF.
  async fn ask(&mut self, prompt: &str) -> std::io::Result<Option<String>> {
    self.output.write_all(prompt.as_bytes()).await?;
    self.output.flush().await?;
    let mut line = String::new();
    if self.input.read_line(&mut line).await? == 0 {
      return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
  }

  /// y/yes is true, anything else false. `None` on EOF.
  async fn confirm(&mut self, prompt: &str) -> std::io::Result<Option<bool>> {
    Ok(self
      .ask(prompt)
      .await?
      .map(|a| matches!(a.trim().to_ascii_lowercase().as_str(), "y" | "yes")))
  }
}

/// Run setup, quiz and restart loops until the user leaves or input ends.
#[instrument(level = "info", skip_all)]
pub async fn run<P, G, R, W>(
  console: &mut Console<R, W>,
  session: &mut QuizSession<G>,
  source: &QuestionSource<P>,
  defaults: &Defaults,
) -> Result<(), CliError>
where
  P: TriviaProvider,
  G: Rng,
  R: AsyncBufRead + Unpin,
  W: AsyncWrite + Unpin,
{
  loop {
    session.reset();
    console.say("Trivia is Fun!").await?;
    let Some(config) = prompt_config(console, defaults).await? else {
      return Ok(());
    };
    session.configure(config)?;
    debug!(target: "trivia_quiz", session = %session.id(), config = ?session.config(), "Starting quiz");

    loop {
      console.say("Loading...").await?;
      if session.start(source).await? != Phase::Errored {
        break;
      }
      let reason = session.error().map(|e| e.to_string()).unwrap_or_default();
      console.say(&format!("Something went wrong! ({reason})")).await?;
      match console.confirm("Try again? [y/n] ").await? {
        Some(true) => continue,
        Some(false) => break,
        None => return Ok(()),
      }
    }

    if session.phase() == Phase::InProgress && !play_round(console, session).await? {
      return Ok(());
    }

    if let SessionState::Finished(summary) = session.state() {
      console.say(&render_summary(summary)).await?;
      match console.confirm("Play again? [y/n] ").await? {
        Some(true) => continue,
        _ => return Ok(()),
      }
    }
  }
}

/// Ask questions until the session finishes. `false` when input ran out.
async fn play_round<G, R, W>(console: &mut Console<R, W>, session: &mut QuizSession<G>) -> Result<bool, CliError>
where
  G: Rng,
  R: AsyncBufRead + Unpin,
  W: AsyncWrite + Unpin,
{
  while session.phase() == Phase::InProgress {
    console.say(&render_question(session)).await?;
    let Some(line) = console.ask("Your answer: ").await? else {
      return Ok(false);
    };
    let Some(choice) = parse_choice(&line, session.answer_order()).map(str::to_string) else {
      console.say("Pick one of the listed options (number or exact text).").await?;
      continue;
    };
    let feedback = match session.submit_answer(&choice)? {
      AnswerOutcome::Correct { .. } | AnswerOutcome::Finished { .. } => "Correct!",
      AnswerOutcome::Incorrect { already_missed: true } => "You already tried that one.",
      AnswerOutcome::Incorrect { already_missed: false } => "Not quite, try again.",
    };
    console.say(feedback).await?;
  }
  Ok(true)
}

/// Collect a `SessionConfig`. `None` when input ends during setup.
async fn prompt_config<R, W>(console: &mut Console<R, W>, defaults: &Defaults) -> Result<Option<SessionConfig>, CliError>
where
  R: AsyncBufRead + Unpin,
  W: AsyncWrite + Unpin,
{
  console
    .say("(If your desired number of questions cannot be found, all available questions will be returned)")
    .await?;

  let count = loop {
    let hint = defaults.count.map(|c| format!(" [{c}]")).unwrap_or_default();
    let Some(line) = console.ask(&format!("How many questions would you like? (1-{MAX_QUESTIONS}){hint}: ")).await? else {
      return Ok(None);
    };
    match parse_count(&line, defaults.count) {
      Some(n) => break n,
      None => console.say(&format!("Please enter a number between 1 and {MAX_QUESTIONS}.")).await?,
    }
  };

  let default_difficulty = defaults.difficulty();
  let difficulty = loop {
    let hint = default_difficulty.map(Difficulty::as_str).unwrap_or("any");
    let Some(line) = console.ask(&format!("Difficulty (easy/medium/hard/any) [{hint}]: ")).await? else {
      return Ok(None);
    };
    if line.trim().is_empty() {
      break default_difficulty;
    }
    match parse_difficulty_choice(&line) {
      Ok(d) => break d,
      Err(e) => console.say(&e.to_string()).await?,
    }
  };

  console.say(&render_category_menu()).await?;
  let default_category = defaults.category();
  let category = loop {
    let hint = default_category.map(Category::display_name).unwrap_or("Any");
    let Some(line) = console.ask(&format!("Category menu number or name [{hint}]: ")).await? else {
      return Ok(None);
    };
    if line.trim().is_empty() {
      break default_category;
    }
    match parse_category_input(&line) {
      Ok(c) => break c,
      Err(e) => console.say(&e.to_string()).await?,
    }
  };

  Ok(Some(SessionConfig::new(count, category, difficulty)?))
}

/// Empty input takes the default; otherwise a number in range.
pub fn parse_count(input: &str, default: Option<u32>) -> Option<u32> {
  let t = input.trim();
  let n = if t.is_empty() { default? } else { t.parse::<u32>().ok()? };
  (1..=MAX_QUESTIONS).contains(&n).then_some(n)
}

/// Menu numbers (0 = Any, 1..=24 in catalog order) or a category name.
pub fn parse_category_input(input: &str) -> Result<Option<Category>, crate::error::ConfigError> {
  let t = input.trim();
  if let Ok(n) = t.parse::<usize>() {
    return match n {
      0 => Ok(None),
      n if n <= Category::ALL.len() => Ok(Some(Category::ALL[n - 1])),
      _ => Err(crate::error::ConfigError::UnknownCategory(t.to_string())),
    };
  }
  parse_category_choice(t)
}

/// An option number (1-based) or the exact text of an option.
/// Exact text wins so numeric answers ("1914") can be typed as-is.
pub fn parse_choice<'a>(input: &str, options: &'a [String]) -> Option<&'a str> {
  if let Some(exact) = options.iter().find(|o| o.as_str() == input) {
    return Some(exact.as_str());
  }
  let n = input.trim().parse::<usize>().ok()?;
  n.checked_sub(1).and_then(|i| options.get(i)).map(String::as_str)
}

pub fn render_category_menu() -> String {
  let mut out = String::from("  0) Any");
  for (i, c) in Category::ALL.iter().enumerate() {
    out.push_str(&format!("\n  {}) {}", i + 1, c.display_name()));
  }
  out
}

pub fn render_question<G: Rng>(session: &QuizSession<G>) -> String {
  let (Some(question), Some((n, total))) = (session.current_question(), session.progress()) else {
    return String::new();
  };
  let mut out = format!("\n[{} · {}]\n{}", question.category, question.difficulty, question.prompt);
  for (i, option) in session.answer_order().iter().enumerate() {
    let mark = if session.is_missed(option) { MISSED_MARK } else { "" };
    out.push_str(&format!("\n  {}) {}{}", i + 1, option, mark));
  }
  out.push_str(&format!("\n{n}/{total}"));
  out
}

pub fn render_summary(summary: &Summary) -> String {
  let questions = if summary.total == 1 { "question" } else { "questions" };
  let guesses = if summary.missed.len() == 1 { "wrong guess" } else { "wrong guesses" };
  format!(
    "Game Over!\nYou answered {} {} with {} {}.",
    summary.total,
    questions,
    summary.missed.len(),
    guesses
  )
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use rand::rngs::StdRng;
  use rand::SeedableRng;

  use super::*;
  use crate::error::FetchError;
  use crate::opentdb::fake::FakeProvider;
  use crate::source::fixtures::*;

  async fn play(script: &str, provider: FakeProvider, defaults: Defaults) -> (String, QuestionSource<FakeProvider>) {
    let source = QuestionSource::new(provider, Duration::from_secs(5));
    let mut session = QuizSession::with_rng(StdRng::seed_from_u64(3));
    let mut console = Console::new(script.as_bytes(), Vec::new());
    run(&mut console, &mut session, &source, &defaults).await.unwrap();
    (String::from_utf8(console.into_output()).unwrap(), source)
  }

  #[test]
  fn count_parsing_honors_range_and_default() {
    assert_eq!(parse_count("10", None), Some(10));
    assert_eq!(parse_count(" 50 ", None), Some(50));
    assert_eq!(parse_count("51", None), None);
    assert_eq!(parse_count("0", None), None);
    assert_eq!(parse_count("ten", None), None);
    assert_eq!(parse_count("", Some(5)), Some(5));
    assert_eq!(parse_count("", None), None);
  }

  #[test]
  fn category_input_uses_menu_numbers() {
    assert_eq!(parse_category_input("0").unwrap(), None);
    assert_eq!(parse_category_input("1").unwrap(), Some(Category::General));
    assert_eq!(parse_category_input("19").unwrap(), Some(Category::Animals));
    assert_eq!(parse_category_input("24").unwrap(), Some(Category::CartoonAndAnimation));
    assert!(parse_category_input("25").is_err());
    assert_eq!(parse_category_input("Board Games").unwrap(), Some(Category::BoardGames));
    assert_eq!(parse_category_input("any").unwrap(), None);
  }

  #[test]
  fn choice_accepts_number_or_exact_text() {
    let options = vec!["Rome".to_string(), "Paris".to_string()];
    assert_eq!(parse_choice("2", &options), Some("Paris"));
    assert_eq!(parse_choice("Rome", &options), Some("Rome"));
    assert_eq!(parse_choice("rome", &options), None);
    assert_eq!(parse_choice("0", &options), None);
    assert_eq!(parse_choice("3", &options), None);

    let years = vec!["1913".to_string(), "1914".to_string()];
    assert_eq!(parse_choice("1914", &years), Some("1914"));
    assert_eq!(parse_choice("1", &years), Some("1913"));
  }

  #[test]
  fn menu_lists_every_category() {
    let menu = render_category_menu();
    assert_eq!(menu.lines().count(), 25);
    assert!(menu.contains("19) Animals"));
    assert!(menu.contains("9) Science & Nature"));
  }

  #[test]
  fn summary_pluralizes() {
    let one = Summary { total: 1, missed: ["Rome".to_string()].into_iter().collect() };
    assert_eq!(render_summary(&one), "Game Over!\nYou answered 1 question with 1 wrong guess.");
  }

  #[tokio::test]
  async fn scripted_game_reaches_game_over() {
    let script = "1\nany\n0\nBerlin\nBerlin\nParis\nn\n";
    let (out, source) = play(script, FakeProvider::serving(vec![france()]), Defaults::default()).await;

    assert!(out.starts_with("Trivia is Fun!"));
    assert!(out.contains("Loading..."));
    assert!(out.contains("[General Knowledge · easy]\nCapital of France?"));
    assert!(out.contains("1/1"));
    assert!(out.contains("Not quite, try again."));
    assert!(out.contains("You already tried that one."));
    assert!(out.contains(&format!("Berlin{MISSED_MARK}")));
    assert!(out.contains("Correct!"));
    assert!(out.contains("Game Over!\nYou answered 1 question with 1 wrong guess."));
    assert_eq!(source.provider().batch_requests()[0].amount, 1);
  }

  #[tokio::test]
  async fn invalid_setup_input_reprompts() {
    let script = "0\nabc\n2\nextreme\nhard\n99\n19\n";
    let provider = FakeProvider::serving(numbered(2));
    let (out, source) = play(script, provider, Defaults::default()).await;

    assert_eq!(out.matches("Please enter a number between 1 and 50.").count(), 2);
    assert!(out.contains("unknown difficulty 'extreme'"));
    assert!(out.contains("unknown category '99'"));
    let req = source.provider().batch_requests()[0];
    assert_eq!(req.amount, 2);
    assert_eq!(req.difficulty, Some(Difficulty::Hard));
    assert_eq!(req.category, Some(Category::Animals));
  }

  #[tokio::test]
  async fn category_prompt_takes_menu_positions() {
    let (out, source) = play("1\nany\n9\n", FakeProvider::serving(numbered(1)), Defaults::default()).await;

    assert!(out.contains("Category menu number or name"));
    assert_eq!(source.provider().count_requests(), vec![Category::ScienceAndNature]);
    assert_ne!("9".parse::<Category>().unwrap(), Category::ScienceAndNature);
  }

  #[tokio::test]
  async fn empty_answers_take_configured_defaults() {
    let defaults = Defaults { count: Some(3), difficulty: Some("easy".into()), category: Some("Art".into()) };
    let (_, source) = play("\n\n\n", FakeProvider::serving(numbered(3)), defaults).await;

    let req = source.provider().batch_requests()[0];
    assert_eq!(req.amount, 3);
    assert_eq!(req.difficulty, Some(Difficulty::Easy));
    assert_eq!(req.category, Some(Category::Art));
  }

  #[tokio::test]
  async fn failure_offers_retry_then_returns_to_setup() {
    let script = "1\nany\n0\ny\nn\n";
    let provider = FakeProvider::failing(|| FetchError::Timeout);
    let (out, source) = play(script, provider, Defaults::default()).await;

    assert_eq!(out.matches("Something went wrong!").count(), 2);
    assert_eq!(out.matches("Trivia is Fun!").count(), 2);
    assert_eq!(source.provider().batch_requests().len(), 2);
  }

  #[tokio::test]
  async fn play_again_resets_session() {
    let script = "1\nany\n0\nParis\ny\n1\nany\n0\nParis\nn\n";
    let (out, source) = play(script, FakeProvider::serving(vec![france()]), Defaults::default()).await;

    assert_eq!(out.matches("Game Over!").count(), 2);
    assert_eq!(out.matches("You answered 1 question with 0 wrong guesses.").count(), 2);
    assert_eq!(source.provider().batch_requests().len(), 2);
  }
}
