//! Application configuration.
//!
//! All tunable values are resolved once into an explicit [`Config`] at
//! construction: remote model endpoint and sampling parameters, generation
//! ceilings, and the optional cloud-sync endpoints. The configuration is a
//! plain TOML file; every field has a default so an empty file (or no file
//! at all) yields a working offline setup.
//!
//! The API credential can come from three places, in order of precedence:
//! the config file, the `CRAM_API_KEY` environment variable, and the
//! persisted store key. [`Config::load`] applies the environment override;
//! callers that hold a store apply the last step.

use super::*;

/// Environment variable consulted for the API credential.
pub const API_KEY_ENV: &str = "CRAM_API_KEY";

/// Top-level configuration, resolved once at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Remote model endpoint and sampling parameters.
  pub api:    ApiConfig,
  /// Ceilings applied to generation requests.
  pub limits: Limits,
  /// Cloud auth/sync endpoints; `None` disables the session adapter.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub remote: Option<RemoteConfig>,
}

/// Remote chat-completion endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
  /// Bearer credential for the endpoint. `None` routes every generation
  /// to the mock path.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub api_key:           Option<String>,
  /// Base URL of the chat-completion API.
  pub base_url:          String,
  /// Model identifier sent with each request.
  pub model:             String,
  /// Maximum tokens to generate per reply.
  pub max_tokens:        u32,
  /// Sampling temperature.
  pub temperature:       f64,
  /// Nucleus sampling parameter.
  pub top_p:             f64,
  /// Frequency penalty.
  pub frequency_penalty: f64,
  /// Presence penalty.
  pub presence_penalty:  f64,
  /// Per-call timeout in seconds. Remote calls never hang the pipeline.
  pub timeout_secs:      u64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      api_key:           None,
      base_url:          "https://api.openai.com/v1".to_string(),
      model:             "gpt-3.5-turbo".to_string(),
      max_tokens:        1500,
      temperature:       0.7,
      top_p:             0.9,
      frequency_penalty: 0.1,
      presence_penalty:  0.1,
      timeout_secs:      30,
    }
  }
}

/// Ceilings clamped onto generation requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
  /// Maximum quiz questions per request.
  pub max_quiz_questions: usize,
  /// Maximum flashcards per request.
  pub max_flashcards:     usize,
  /// Maximum study-plan time in minutes.
  pub max_study_time:     u32,
}

impl Default for Limits {
  fn default() -> Self {
    Self { max_quiz_questions: 50, max_flashcards: 100, max_study_time: 120 }
  }
}

/// Endpoints for the identity provider and the snapshot document store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
  /// Base URL of the identity-toolkit-style auth API.
  pub auth_url:     String,
  /// Base URL of the user-document snapshot store.
  pub snapshot_url: String,
  /// API key appended to auth requests.
  pub api_key:      String,
}

impl Config {
  /// Returns the default configuration file path
  /// (`<config dir>/cram/config.toml`).
  pub fn default_path() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join("cram").join("config.toml")
  }

  /// Loads the configuration from a TOML file, applying the
  /// [`API_KEY_ENV`] environment override.
  ///
  /// # Errors
  ///
  /// Returns an error if the file cannot be read or parsed.
  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    let content = std::fs::read_to_string(path.as_ref())?;
    let mut config: Self = toml::from_str(&content)?;
    config.apply_env();
    Ok(config)
  }

  /// Loads the configuration if the file exists, otherwise returns the
  /// defaults (with the environment override applied either way).
  pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
    if path.as_ref().exists() {
      Self::load(path)
    } else {
      debug!("no configuration at {:?}, using defaults", path.as_ref());
      let mut config = Self::default();
      config.apply_env();
      Ok(config)
    }
  }

  /// Writes the configuration as TOML, creating parent directories.
  pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
      std::fs::create_dir_all(parent)?;
    }
    let content =
      toml::to_string_pretty(self).map_err(|e| CramError::Config(e.to_string()))?;
    std::fs::write(path, content)?;
    Ok(())
  }

  /// Sets the API credential, builder style.
  pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
    self.api.api_key = Some(api_key.into());
    self
  }

  /// Fills the credential from [`API_KEY_ENV`] when the file left it unset.
  fn apply_env(&mut self) {
    if self.api.api_key.is_none() {
      if let Ok(key) = std::env::var(API_KEY_ENV) {
        if !key.is_empty() {
          self.api.api_key = Some(key);
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_are_offline_and_sane() {
    let config = Config::default();
    assert!(config.api.api_key.is_none());
    assert_eq!(config.api.model, "gpt-3.5-turbo");
    assert_eq!(config.api.max_tokens, 1500);
    assert_eq!(config.limits.max_quiz_questions, 50);
    assert!(config.remote.is_none());
  }

  #[test]
  fn partial_file_fills_missing_fields() {
    let config: Config = toml::from_str(
      r#"
        [api]
        model = "gpt-4o-mini"
      "#,
    )
    .unwrap();
    assert_eq!(config.api.model, "gpt-4o-mini");
    assert_eq!(config.api.base_url, "https://api.openai.com/v1");
    assert_eq!(config.limits.max_flashcards, 100);
  }

  #[test]
  fn write_then_load_round_trips() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");

    let config = Config::default().with_api_key("sk-test");
    config.write(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded.api.api_key.as_deref(), Some("sk-test"));
    assert_eq!(loaded.api.timeout_secs, 30);
  }
}
