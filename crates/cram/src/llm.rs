//! Transport for the remote chat-completion endpoint.
//!
//! This module builds and sends OpenAI-style chat requests: a system
//! prompt, an optional course-context message, and the user prompt, plus
//! the sampling parameters from [`ApiConfig`](crate::config::ApiConfig).
//! It knows nothing about tasks or fallbacks; the generation client in
//! [`crate::generator`] owns that policy.
//!
//! Every call carries an explicit timeout; a hung endpoint fails the call
//! rather than stalling the pipeline.
//!
//! # Examples
//!
//! ```no_run
//! use cram::{config::ApiConfig, llm::ChatRequest, prompt::SYSTEM_PROMPT};
//!
//! # async fn example() -> Result<(), cram::error::CramError> {
//! let api = ApiConfig::default();
//! let http = reqwest::Client::new();
//! let reply = ChatRequest::from_api(&api)
//!   .with_system(SYSTEM_PROMPT)
//!   .with_user("Explique le théorème de Pythagore.")
//!   .send(&http, &api, "sk-...")
//!   .await?;
//! println!("{reply}");
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use crate::config::ApiConfig;

use super::*;

/// A single message in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
  /// The role of the message sender: "system", "user", or "assistant".
  pub role:    String,
  /// The message text.
  pub content: String,
}

impl Message {
  /// Builds a system-role message.
  pub fn system(content: impl Into<String>) -> Self {
    Self { role: "system".to_string(), content: content.into() }
  }

  /// Builds a user-role message.
  pub fn user(content: impl Into<String>) -> Self {
    Self { role: "user".to_string(), content: content.into() }
  }
}

/// Request body for the chat-completion endpoint.
///
/// Serializes directly to the wire format. Construct with
/// [`ChatRequest::from_api`] so the model id and sampling parameters come
/// from the resolved configuration, then append messages builder-style.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
  /// Model identifier.
  pub model:             String,
  /// Conversation messages, in order.
  pub messages:          Vec<Message>,
  /// Maximum tokens to generate.
  pub max_tokens:        u32,
  /// Sampling temperature.
  pub temperature:       f64,
  /// Nucleus sampling parameter.
  pub top_p:             f64,
  /// Frequency penalty.
  pub frequency_penalty: f64,
  /// Presence penalty.
  pub presence_penalty:  f64,
}

/// Response envelope from the chat-completion endpoint.
#[derive(Debug, Deserialize)]
struct ChatResponse {
  /// Generated completions; the first one is the reply.
  choices: Vec<Choice>,
}

/// One completion choice in the response envelope.
#[derive(Debug, Deserialize)]
struct Choice {
  /// The generated message.
  message: Message,
}

impl ChatRequest {
  /// Creates a request carrying the configuration's model and sampling
  /// parameters, with an empty message list.
  pub fn from_api(api: &ApiConfig) -> Self {
    Self {
      model:             api.model.clone(),
      messages:          Vec::new(),
      max_tokens:        api.max_tokens,
      temperature:       api.temperature,
      top_p:             api.top_p,
      frequency_penalty: api.frequency_penalty,
      presence_penalty:  api.presence_penalty,
    }
  }

  /// Appends a system message.
  pub fn with_system(mut self, content: impl Into<String>) -> Self {
    self.messages.push(Message::system(content));
    self
  }

  /// Appends the current course context as a system message, when present.
  pub fn with_context(mut self, context: Option<&str>) -> Self {
    if let Some(context) = context {
      self.messages.push(Message::system(format!(
        "CONTEXTE DU COURS ACTUEL :\n{context}\n\nUtilise ce contexte pour donner des réponses \
         précises et pertinentes."
      )));
    }
    self
  }

  /// Appends a user message.
  pub fn with_user(mut self, content: impl Into<String>) -> Self {
    self.messages.push(Message::user(content));
    self
  }

  /// Sends the request and returns the reply text.
  ///
  /// # Errors
  ///
  /// - [`CramError::Network`] on connection failure or timeout
  /// - [`CramError::Api`] on a non-success HTTP status
  /// - [`CramError::InvalidResponse`] when the envelope holds no choices
  pub async fn send(
    &self,
    http: &reqwest::Client,
    api: &ApiConfig,
    api_key: &str,
  ) -> Result<String> {
    let url = format!("{}/chat/completions", api.base_url.trim_end_matches('/'));
    trace!("sending chat request to {url} with {} messages", self.messages.len());

    let response = http
      .post(&url)
      .bearer_auth(api_key)
      .timeout(Duration::from_secs(api.timeout_secs))
      .json(self)
      .send()
      .await?;

    let status = response.status();
    if !status.is_success() {
      let body: Value = response.json().await.unwrap_or(Value::Null);
      let message =
        body.pointer("/error/message").and_then(Value::as_str).unwrap_or("unknown error");
      return Err(CramError::Api(format!("{status} - {message}")));
    }

    let envelope: ChatResponse = response.json().await?;
    envelope
      .choices
      .into_iter()
      .next()
      .map(|choice| choice.message.content)
      .ok_or_else(|| CramError::InvalidResponse("reply held no choices".to_string()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn from_api_copies_sampling_parameters() {
    let api = ApiConfig::default();
    let request = ChatRequest::from_api(&api);
    assert_eq!(request.model, api.model);
    assert_eq!(request.max_tokens, 1500);
    assert!(request.messages.is_empty());
  }

  #[test]
  fn context_message_is_optional() {
    let api = ApiConfig::default();
    let without = ChatRequest::from_api(&api).with_system("s").with_context(None).with_user("u");
    assert_eq!(without.messages.len(), 2);

    let with =
      ChatRequest::from_api(&api).with_system("s").with_context(Some("Thermodynamique")).with_user("u");
    assert_eq!(with.messages.len(), 3);
    assert_eq!(with.messages[1].role, "system");
    assert!(with.messages[1].content.contains("Thermodynamique"));
  }

  #[test]
  fn request_serializes_to_wire_format() {
    let api = ApiConfig::default();
    let request = ChatRequest::from_api(&api).with_user("bonjour");
    let body = serde_json::to_value(&request).unwrap();
    assert_eq!(body["model"], "gpt-3.5-turbo");
    assert_eq!(body["messages"][0]["role"], "user");
    assert_eq!(body["temperature"], 0.7);
  }
}
