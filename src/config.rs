//! Loading application configuration (provider endpoint + setup defaults) from TOML.
//!
//! See `AppConfig`, `ProviderConfig` and `Defaults` for expected schema.
//! Env overrides are applied on top of the file (or of the built-in defaults).

use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info, warn};

use crate::domain::{parse_category_choice, parse_difficulty_choice, Category, Difficulty};

#[derive(Clone, Debug, Deserialize, Default, PartialEq)]
pub struct AppConfig {
  #[serde(default)]
  pub provider: ProviderConfig,
  #[serde(default)]
  pub defaults: Defaults,
}

/// Where the trivia provider lives and how long we wait for it.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ProviderConfig {
  #[serde(default = "default_base_url")]
  pub base_url: String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

fn default_base_url() -> String { "https://opentdb.com".into() }
fn default_timeout_secs() -> u64 { 10 }

impl Default for ProviderConfig {
  fn default() -> Self {
    Self { base_url: default_base_url(), timeout_secs: default_timeout_secs() }
  }
}

impl ProviderConfig {
  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_secs)
  }
}

/// Values pre-filled at the setup prompts. Strings so the TOML can say
/// `difficulty = "any"` or `category = "Science & Nature"` / `category = "17"`.
#[derive(Clone, Debug, Deserialize, Default, PartialEq)]
pub struct Defaults {
  #[serde(default)] pub count: Option<u32>,
  #[serde(default)] pub difficulty: Option<String>,
  #[serde(default)] pub category: Option<String>,
}

impl Defaults {
  /// Parsed difficulty default; unknown values are logged and ignored.
  pub fn difficulty(&self) -> Option<Difficulty> {
    let raw = self.difficulty.as_deref()?;
    match parse_difficulty_choice(raw) {
      Ok(d) => d,
      Err(e) => {
        warn!(target: "trivia_quiz", error = %e, "Ignoring configured difficulty");
        None
      }
    }
  }

  /// Parsed category default; unknown values are logged and ignored.
  pub fn category(&self) -> Option<Category> {
    let raw = self.category.as_deref()?;
    match parse_category_choice(raw) {
      Ok(c) => c,
      Err(e) => {
        warn!(target: "trivia_quiz", error = %e, "Ignoring configured category");
        None
      }
    }
  }
}

/// Parse a TOML document into `AppConfig`. A zero timeout falls back to the default.
pub fn parse_app_config(s: &str) -> Result<AppConfig, toml::de::Error> {
  let mut cfg = toml::from_str::<AppConfig>(s)?;
  if cfg.provider.timeout_secs == 0 {
    warn!(target: "trivia_quiz", default = default_timeout_secs(), "Ignoring timeout_secs = 0 in config");
    cfg.provider.timeout_secs = default_timeout_secs();
  }
  Ok(cfg)
}

/// Attempt to load `AppConfig` from TRIVIA_CONFIG_PATH, then apply env overrides.
/// On any parsing/IO error the built-in defaults are used.
pub fn load_app_config() -> AppConfig {
  let mut cfg = load_file_from_env().unwrap_or_default();
  apply_env_overrides(&mut cfg, |k| std::env::var(k).ok());
  cfg
}

fn load_file_from_env() -> Option<AppConfig> {
  let path = std::env::var("TRIVIA_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_app_config(&s) {
      Ok(cfg) => {
        info!(target: "trivia_quiz", %path, "Loaded app config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "trivia_quiz", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "trivia_quiz", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

/// OPENTDB_BASE_URL and TRIVIA_TIMEOUT_SECS win over the file.
fn apply_env_overrides(cfg: &mut AppConfig, var: impl Fn(&str) -> Option<String>) {
  if let Some(url) = var("OPENTDB_BASE_URL").filter(|u| !u.trim().is_empty()) {
    cfg.provider.base_url = url;
  }
  if let Some(raw) = var("TRIVIA_TIMEOUT_SECS") {
    match raw.trim().parse::<u64>() {
      Ok(secs) if secs > 0 => cfg.provider.timeout_secs = secs,
      _ => warn!(target: "trivia_quiz", value = %raw, "Ignoring invalid TRIVIA_TIMEOUT_SECS"),
    }
  }
}
