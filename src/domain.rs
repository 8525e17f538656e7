//! Domain models: question kinds, difficulty, the provider's category catalog,
//! decoded questions and the per-session configuration.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Largest batch the provider serves in one request.
pub const MAX_QUESTIONS: u32 = 50;

/// What kind of question is presented to the user?
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuestionKind {
  /// Four options: one correct, three incorrect.
  Multiple,
  /// True / False.
  Boolean,
}

impl QuestionKind {
  /// Number of incorrect answers the provider ships for this kind.
  pub fn incorrect_count(self) -> usize {
    match self {
      QuestionKind::Multiple => 3,
      QuestionKind::Boolean => 1,
    }
  }

  pub fn parse_tag(tag: &str) -> Option<Self> {
    match tag {
      "multiple" => Some(QuestionKind::Multiple),
      "boolean" => Some(QuestionKind::Boolean),
      _ => None,
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Difficulty {
  Easy,
  Medium,
  Hard,
}

impl Difficulty {
  /// Query-string value understood by the provider.
  pub fn as_str(self) -> &'static str {
    match self {
      Difficulty::Easy => "easy",
      Difficulty::Medium => "medium",
      Difficulty::Hard => "hard",
    }
  }
}

impl fmt::Display for Difficulty {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Difficulty {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "easy" => Ok(Difficulty::Easy),
      "medium" => Ok(Difficulty::Medium),
      "hard" => Ok(Difficulty::Hard),
      _ => Err(ConfigError::UnknownDifficulty(s.to_string())),
    }
  }
}

/// Parse a difficulty choice where "any" (or nothing) means no filter.
pub fn parse_difficulty_choice(s: &str) -> Result<Option<Difficulty>, ConfigError> {
  let t = s.trim();
  if t.is_empty() || t.eq_ignore_ascii_case("any") {
    return Ok(None);
  }
  t.parse().map(Some)
}

/// Provider topic catalog. Discriminants are the provider's numeric ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Category {
  General = 9,
  Books = 10,
  Films = 11,
  Music = 12,
  Theatre = 13,
  Television = 14,
  VideoGames = 15,
  BoardGames = 16,
  ScienceAndNature = 17,
  Computers = 18,
  Mathematics = 19,
  Mythology = 20,
  Sports = 21,
  Geography = 22,
  History = 23,
  Politics = 24,
  Art = 25,
  Celebrities = 26,
  Animals = 27,
  Vehicles = 28,
  Comics = 29,
  Gadgets = 30,
  AnimeAndManga = 31,
  CartoonAndAnimation = 32,
}

impl Category {
  pub const ALL: [Category; 24] = [
    Category::General,
    Category::Books,
    Category::Films,
    Category::Music,
    Category::Theatre,
    Category::Television,
    Category::VideoGames,
    Category::BoardGames,
    Category::ScienceAndNature,
    Category::Computers,
    Category::Mathematics,
    Category::Mythology,
    Category::Sports,
    Category::Geography,
    Category::History,
    Category::Politics,
    Category::Art,
    Category::Celebrities,
    Category::Animals,
    Category::Vehicles,
    Category::Comics,
    Category::Gadgets,
    Category::AnimeAndManga,
    Category::CartoonAndAnimation,
  ];

  pub fn id(self) -> u8 {
    self as u8
  }

  pub fn from_id(id: u8) -> Option<Self> {
    Self::ALL.iter().copied().find(|c| c.id() == id)
  }

  pub fn display_name(self) -> &'static str {
    match self {
      Category::General => "General Knowledge",
      Category::Books => "Books",
      Category::Films => "Films",
      Category::Music => "Music",
      Category::Theatre => "Musicals & Theatres",
      Category::Television => "Television",
      Category::VideoGames => "Video Games",
      Category::BoardGames => "Board Games",
      Category::ScienceAndNature => "Science & Nature",
      Category::Computers => "Computers",
      Category::Mathematics => "Mathematics",
      Category::Mythology => "Mythology",
      Category::Sports => "Sports",
      Category::Geography => "Geography",
      Category::History => "History",
      Category::Politics => "Politics",
      Category::Art => "Art",
      Category::Celebrities => "Celebrities",
      Category::Animals => "Animals",
      Category::Vehicles => "Vehicles",
      Category::Comics => "Comics",
      Category::Gadgets => "Gadgets",
      Category::AnimeAndManga => "Anime & Manga",
      Category::CartoonAndAnimation => "Cartoon & Animations",
    }
  }

  fn variant_name(self) -> String {
    format!("{:?}", self)
  }
}

impl fmt::Display for Category {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.display_name())
  }
}

/// Comparison key: lowercase, no spaces, no "&" and no "and".
fn category_key(s: &str) -> String {
  s.chars()
    .filter(|c| !c.is_whitespace() && *c != '&')
    .flat_map(|c| c.to_lowercase())
    .collect::<String>()
    .replace("and", "")
}

impl FromStr for Category {
  type Err = ConfigError;

  /// Accepts the provider id ("27"), the display name ("Science & Nature")
  /// or the variant name ("ScienceAndNature"), case-insensitively.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let t = s.trim();
    if let Ok(id) = t.parse::<u8>() {
      return Category::from_id(id).ok_or_else(|| ConfigError::UnknownCategory(s.to_string()));
    }
    let key = category_key(t);
    Category::ALL
      .iter()
      .copied()
      .find(|c| category_key(c.display_name()) == key || category_key(&c.variant_name()) == key)
      .ok_or_else(|| ConfigError::UnknownCategory(s.to_string()))
  }
}

/// Parse a category choice where "any" (or nothing) means no filter.
pub fn parse_category_choice(s: &str) -> Result<Option<Category>, ConfigError> {
  let t = s.trim();
  if t.is_empty() || t.eq_ignore_ascii_case("any") {
    return Ok(None);
  }
  t.parse().map(Some)
}

/// A fetched question with every text field already decoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Question {
  pub category: String,
  pub kind: QuestionKind,
  pub difficulty: Difficulty,
  pub prompt: String,
  pub correct_answer: String,
  pub incorrect_answers: Vec<String>,
}

impl Question {
  /// Incorrect answers followed by the correct one (unshuffled).
  pub fn answers(&self) -> Vec<String> {
    let mut all = self.incorrect_answers.clone();
    all.push(self.correct_answer.clone());
    all
  }

  /// Exact comparison on decoded text: no case folding, no trimming.
  pub fn is_correct(&self, answer: &str) -> bool {
    self.correct_answer == answer
  }
}

/// What the user asked for. Built once per session and never mutated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionConfig {
  desired_count: u32,
  difficulty: Option<Difficulty>,
  category: Option<Category>,
}

impl SessionConfig {
  pub fn new(
    desired_count: u32,
    category: Option<Category>,
    difficulty: Option<Difficulty>,
  ) -> Result<Self, ConfigError> {
    if desired_count == 0 || desired_count > MAX_QUESTIONS {
      return Err(ConfigError::CountOutOfRange(desired_count));
    }
    Ok(Self { desired_count, difficulty, category })
  }

  pub fn desired_count(&self) -> u32 { self.desired_count }
  pub fn difficulty(&self) -> Option<Difficulty> { self.difficulty }
  pub fn category(&self) -> Option<Category> { self.category }
}
