//! Remote generation client with deterministic local fallback.
//!
//! [`Generator::generate`] is the one entry point for AI content and it
//! never fails its caller:
//!
//! - with no credential configured, it goes straight to the mock path;
//! - on a network or HTTP failure, it logs, records a diagnostic entry,
//!   and substitutes mock content;
//! - on a malformed or invalid reply (no JSON payload, wrong shape, no
//!   valid items), same substitution.
//!
//! Replies are parsed by taking the first balanced `{...}` span of the
//! text, deserializing it, and validating the per-task shape; valid items
//! are clipped to the requested count. Whatever comes back to the caller
//! has passed validation, whichever path produced it.

use crate::{
  config::ApiConfig,
  llm::ChatRequest,
  prompt::{self, GenerationTask, TaskParams, SYSTEM_PROMPT},
  store::Store,
};

use super::*;

/// Remote generation client.
///
/// Construct one per configuration; it owns its HTTP client and an
/// optional handle to the store for the bounded diagnostic error log.
pub struct Generator {
  /// Shared HTTP client.
  http:        reqwest::Client,
  /// Endpoint, credential, and sampling configuration.
  api:         ApiConfig,
  /// Diagnostic sink for generation failures.
  diagnostics: Option<Store>,
}

impl Generator {
  /// Creates a generator for the given API configuration.
  pub fn new(api: ApiConfig) -> Self {
    if api.api_key.is_none() {
      warn!("no API credential configured; generation will use mock content");
    }
    Self { http: reqwest::Client::new(), api, diagnostics: None }
  }

  /// Attaches a store so generation failures land in the diagnostic log.
  pub fn with_store(mut self, store: Store) -> Self {
    self.diagnostics = Some(store);
    self
  }

  /// Generates content for `task` from `source_text`.
  ///
  /// Never fails: any remote problem is recovered by substituting the
  /// deterministic mock content for the task.
  pub async fn generate(
    &self,
    task: GenerationTask,
    source_text: &str,
    params: &TaskParams,
  ) -> GenerationOutput {
    let Some(api_key) = self.api.api_key.clone() else {
      debug!("generating mock {task} (no credential)");
      return mock::generate(task, source_text, params);
    };

    match self.request(task, source_text, params, &api_key).await {
      Ok(output) => output,
      Err(e) => {
        warn!("remote {task} generation failed: {e}");
        self.record_failure(&task.to_string(), &e).await;
        mock::generate(task, source_text, params)
      },
    }
  }

  /// Free-form assistant reply, with the same never-fail contract.
  ///
  /// `context` is injected as a course-context message on the remote path
  /// and keys the canned reply on the mock path.
  pub async fn respond(&self, prompt_text: &str, context: Option<&str>) -> String {
    let Some(api_key) = self.api.api_key.clone() else {
      return mock::chat_reply(prompt_text, context);
    };

    let request = ChatRequest::from_api(&self.api)
      .with_system(SYSTEM_PROMPT)
      .with_context(context)
      .with_user(prompt_text);
    match request.send(&self.http, &self.api, &api_key).await {
      Ok(reply) => reply,
      Err(e) => {
        warn!("remote assistant reply failed: {e}");
        self.record_failure("chat", &e).await;
        mock::chat_reply(prompt_text, context)
      },
    }
  }

  /// One remote round trip: render the prompt, call the endpoint, parse
  /// and validate the reply.
  async fn request(
    &self,
    task: GenerationTask,
    source_text: &str,
    params: &TaskParams,
    api_key: &str,
  ) -> Result<GenerationOutput> {
    let rendered = prompt::render(task, source_text, params);
    let reply = ChatRequest::from_api(&self.api)
      .with_system(SYSTEM_PROMPT)
      .with_user(rendered)
      .send(&self.http, &self.api, api_key)
      .await?;

    parse_output(task, &reply, params.count)
  }

  /// Records a generation failure in the bounded diagnostic log.
  async fn record_failure(&self, context: &str, error: &CramError) {
    if let Some(store) = &self.diagnostics {
      if let Err(e) = store.record_error(context, &error.to_string()).await {
        warn!("could not record diagnostic entry: {e}");
      }
    }
  }
}

/// Parses and validates a reply for `task`, clipping item lists to
/// `count`.
fn parse_output(task: GenerationTask, reply: &str, count: usize) -> Result<GenerationOutput> {
  // The summary task asks for free text, not JSON.
  if task == GenerationTask::Summary {
    let summary = reply.trim();
    if summary.is_empty() {
      return Err(CramError::InvalidResponse("empty summary reply".to_string()));
    }
    return Ok(GenerationOutput::Summary(summary.to_string()));
  }

  let span = extract_json_span(reply)
    .ok_or_else(|| CramError::InvalidResponse("no JSON object in reply".to_string()))?;

  match task {
    GenerationTask::Quiz => {
      let questions = collect_valid::<QuizQuestion>(span, "questions", QuizQuestion::is_valid)?;
      let questions: Vec<_> = questions.into_iter().take(count).collect();
      if questions.is_empty() {
        return Err(CramError::InvalidResponse("reply held no valid questions".to_string()));
      }
      Ok(GenerationOutput::Quiz(questions))
    },
    GenerationTask::Flashcards => {
      let cards = collect_valid::<Flashcard>(span, "flashcards", Flashcard::is_valid)?;
      let cards: Vec<_> = cards.into_iter().take(count).collect();
      if cards.is_empty() {
        return Err(CramError::InvalidResponse("reply held no valid flashcards".to_string()));
      }
      Ok(GenerationOutput::Flashcards(cards))
    },
    GenerationTask::Analysis => Ok(GenerationOutput::Analysis(serde_json::from_str(span)?)),
    GenerationTask::StudyPlan => Ok(GenerationOutput::StudyPlan(serde_json::from_str(span)?)),
    GenerationTask::Summary => unreachable!("handled above"),
  }
}

/// Deserializes the array under `field`, keeping only entries that both
/// deserialize and pass `valid`. Malformed entries are dropped, not
/// fatal.
fn collect_valid<T: serde::de::DeserializeOwned>(
  span: &str,
  field: &str,
  valid: fn(&T) -> bool,
) -> Result<Vec<T>> {
  let envelope: Value = serde_json::from_str(span)?;
  let items = envelope
    .get(field)
    .and_then(Value::as_array)
    .ok_or_else(|| CramError::InvalidResponse(format!("reply held no `{field}` array")))?;

  Ok(
    items
      .iter()
      .filter_map(|item| serde_json::from_value::<T>(item.clone()).ok())
      .filter(|item| valid(item))
      .collect(),
  )
}

/// Returns the first balanced `{...}` span of `reply`, skipping braces
/// inside JSON strings.
pub(crate) fn extract_json_span(reply: &str) -> Option<&str> {
  let start = reply.find('{')?;
  let mut depth = 0usize;
  let mut in_string = false;
  let mut escaped = false;

  for (offset, byte) in reply.as_bytes()[start..].iter().enumerate() {
    if in_string {
      if escaped {
        escaped = false;
      } else if *byte == b'\\' {
        escaped = true;
      } else if *byte == b'"' {
        in_string = false;
      }
      continue;
    }
    match byte {
      b'"' => in_string = true,
      b'{' => depth += 1,
      b'}' => {
        depth -= 1;
        if depth == 0 {
          return Some(&reply[start..=start + offset]);
        }
      },
      _ => {},
    }
  }
  None
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn every_task_yields_a_valid_mock_without_credential() {
    let generator = Generator::new(ApiConfig::default());
    let params = TaskParams { count: 4, study_time: 40 };

    for task in [
      GenerationTask::Quiz,
      GenerationTask::Flashcards,
      GenerationTask::Summary,
      GenerationTask::Analysis,
      GenerationTask::StudyPlan,
    ] {
      let output = generator.generate(task, "du contenu de cours", &params).await;
      assert_eq!(output.task(), task);
      if let GenerationOutput::Quiz(questions) = &output {
        assert_eq!(questions.len(), 4);
        assert!(questions.iter().all(QuizQuestion::is_valid));
      }
    }
  }

  #[traced_test]
  #[tokio::test]
  async fn unreachable_endpoint_falls_back_and_logs() {
    let dir = tempdir().unwrap();
    let store = Store::open(dir.path().join("diag.db")).await.unwrap();

    let api = ApiConfig {
      api_key: Some("sk-test".to_string()),
      base_url: "http://127.0.0.1:9".to_string(),
      timeout_secs: 2,
      ..ApiConfig::default()
    };
    let generator = Generator::new(api).with_store(store.clone());

    let output =
      generator.generate(GenerationTask::Quiz, "contenu", &TaskParams::default()).await;
    match output {
      GenerationOutput::Quiz(questions) => assert_eq!(questions.len(), 10),
      other => panic!("expected quiz, got {other:?}"),
    }

    let log = store.error_log().await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].context, "quiz");
  }

  #[test]
  fn json_span_extraction_is_balanced() {
    assert_eq!(extract_json_span(r#"voila: {"a": {"b": 1}} et après"#), Some(r#"{"a": {"b": 1}}"#));
    assert_eq!(extract_json_span(r#"{"s": "br{ace}"}"#), Some(r#"{"s": "br{ace}"}"#));
    assert_eq!(extract_json_span(r#"{"s": "esc\"}"}"#), Some(r#"{"s": "esc\"}"}"#));
    assert_eq!(extract_json_span("pas de JSON ici"), None);
    assert_eq!(extract_json_span("{\"troncature\": "), None);
  }

  #[test]
  fn quiz_parsing_drops_invalid_entries_and_clips() {
    let reply = r#"Voici vos questions.
    {"questions": [
      {"question": "Q1", "answers": ["a","b","c","d"], "correctAnswer": 1,
       "explanation": "E1", "difficulty": "easy"},
      {"question": "Q2", "answers": ["a","b","c"], "correctAnswer": 0,
       "explanation": "E2", "difficulty": "easy"},
      {"question": "Q3", "answers": ["a","b","c","d"], "correctAnswer": 7,
       "explanation": "E3", "difficulty": "hard"},
      {"question": "Q4", "answers": ["a","b","c","d"], "correctAnswer": 3,
       "explanation": "E4", "difficulty": "medium"},
      {"question": "Q5", "answers": ["a","b","c","d"], "correctAnswer": 0,
       "explanation": "E5", "difficulty": "medium"}
    ]}"#;

    match parse_output(GenerationTask::Quiz, reply, 2).unwrap() {
      GenerationOutput::Quiz(questions) => {
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].question, "Q1");
        assert_eq!(questions[1].question, "Q4");
      },
      other => panic!("expected quiz, got {other:?}"),
    }
  }

  #[test]
  fn quiz_with_no_valid_question_is_an_error() {
    let reply = r#"{"questions": [{"question": "Q", "answers": ["a"], "correctAnswer": 0,
                    "explanation": "E"}]}"#;
    assert!(parse_output(GenerationTask::Quiz, reply, 5).is_err());
  }

  #[test]
  fn flashcards_require_both_sides() {
    let reply = r#"{"flashcards": [
      {"question": "Q1", "answer": "A1", "category": "definition"},
      {"question": "", "answer": "A2"},
      {"question": "Q3", "answer": "   "}
    ]}"#;
    match parse_output(GenerationTask::Flashcards, reply, 10).unwrap() {
      GenerationOutput::Flashcards(cards) => {
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].question, "Q1");
      },
      other => panic!("expected flashcards, got {other:?}"),
    }
  }

  #[test]
  fn analysis_parses_the_documented_shape() {
    let reply = r#"{"subject": "Thermodynamique",
                    "mainConcepts": ["Entropie", "Enthalpie"],
                    "difficulty": "intermediate",
                    "keywords": ["chaleur"],
                    "structure": "Trois chapitres",
                    "estimatedTime": "45"}"#;
    match parse_output(GenerationTask::Analysis, reply, 0).unwrap() {
      GenerationOutput::Analysis(analysis) => {
        assert_eq!(analysis.subject, "Thermodynamique");
        assert_eq!(analysis.main_concepts.len(), 2);
      },
      other => panic!("expected analysis, got {other:?}"),
    }
  }

  #[test]
  fn empty_summary_reply_is_an_error() {
    assert!(parse_output(GenerationTask::Summary, "   \n ", 0).is_err());
    assert!(parse_output(GenerationTask::Summary, "Un résumé.", 0).is_ok());
  }
}
