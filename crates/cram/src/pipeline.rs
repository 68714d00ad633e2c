//! Orchestration from extracted text to persisted study artifacts.
//!
//! [`Pipeline::build_bundle`] runs the full generation flow: local surface
//! analysis, remote (or heuristic) content analysis, key-concept
//! extraction, then the enabled generation tasks issued concurrently and
//! joined, so end-to-end latency is bounded by the slowest single call
//! rather than their sum. Every step follows the generator's fallback
//! contract, so the bundle always comes back complete.
//!
//! [`Pipeline::persist`] writes the bundle into the store with provenance
//! (subject, source file, timestamp, generated flag) and registers its
//! subject.

use crate::{
  config::{Config, Limits},
  generator::{extract_json_span, Generator},
  heuristics::{self, Complexity, TextAnalysis},
  prompt::{self, GenerationTask, TaskParams},
  store::{QuizSet, Store, StoredFlashcard, SummaryRecord},
};

use super::*;

/// Subject reported by the mock analysis when nothing better is known.
const DEFAULT_SUBJECT: &str = "Matière générale";

/// Length of the source excerpt kept on persisted summaries.
const EXCERPT_CHARS: usize = 500;

/// Which artifacts to build, and with what parameters.
#[derive(Debug, Clone)]
pub struct BundleOptions {
  /// Subject override; otherwise taken from the analysis.
  pub subject:         Option<String>,
  /// Requested number of quiz questions.
  pub quiz_count:      usize,
  /// Requested number of flashcards.
  pub flashcard_count: usize,
  /// Available study time in minutes, for the plan.
  pub study_time:      u32,
  /// Generate a summary.
  pub summary:         bool,
  /// Generate a quiz.
  pub quiz:            bool,
  /// Generate flashcards.
  pub flashcards:      bool,
  /// Generate a study plan.
  pub study_plan:      bool,
  /// Run the remote content analysis (heuristics otherwise).
  pub analysis:        bool,
}

impl Default for BundleOptions {
  fn default() -> Self {
    Self {
      subject:         None,
      quiz_count:      15,
      flashcard_count: 20,
      study_time:      60,
      summary:         true,
      quiz:            true,
      flashcards:      true,
      study_plan:      true,
      analysis:        true,
    }
  }
}

/// The aggregate result of one generation run.
#[derive(Debug, Clone, Serialize)]
pub struct StudyBundle {
  /// Resolved subject.
  pub subject:        String,
  /// Local surface statistics.
  pub stats:          TextAnalysis,
  /// Content analysis (remote or heuristic).
  pub analysis:       ContentAnalysis,
  /// Extracted key concepts.
  pub concepts:       Vec<Concept>,
  /// Generated summary, when enabled.
  pub summary:        Option<String>,
  /// Generated quiz questions, when enabled.
  pub quiz:           Option<Vec<QuizQuestion>>,
  /// Generated flashcards, when enabled.
  pub flashcards:     Option<Vec<Flashcard>>,
  /// Generated study plan, when enabled.
  pub study_plan:     Option<StudyPlan>,
  /// Opening excerpt of the source text, kept on persisted summaries.
  pub source_excerpt: String,
  /// When the bundle was built.
  pub generated_at:   DateTime<Utc>,
}

/// Counts of artifacts written by [`Pipeline::persist`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveReport {
  /// Flashcards appended.
  pub flashcards:     usize,
  /// Quiz questions stored.
  pub quiz_questions: usize,
  /// Summaries stored.
  pub summaries:      usize,
}

/// The content orchestrator.
pub struct Pipeline {
  /// Generation client (remote with mock fallback).
  generator: Generator,
  /// Ceilings clamped onto requested counts.
  limits:    Limits,
}

impl Pipeline {
  /// Creates a pipeline from the resolved configuration.
  pub fn new(config: &Config) -> Self {
    Self { generator: Generator::new(config.api.clone()), limits: config.limits.clone() }
  }

  /// Attaches a store so generation failures land in the diagnostic log.
  pub fn with_store(mut self, store: Store) -> Self {
    self.generator = self.generator.with_store(store);
    self
  }

  /// Builds the full artifact bundle for `text`. Never fails: every step
  /// has a local fallback.
  pub async fn build_bundle(&self, text: &str, options: &BundleOptions) -> StudyBundle {
    let stats = heuristics::analyze(text);

    let analysis = if options.analysis {
      match self.generator.generate(GenerationTask::Analysis, text, &TaskParams::default()).await
      {
        GenerationOutput::Analysis(analysis) => analysis,
        _ => heuristic_analysis(&stats),
      }
    } else {
      heuristic_analysis(&stats)
    };

    // A real subject detected by the analysis wins over the caller's.
    let subject = if analysis.subject != DEFAULT_SUBJECT && !analysis.subject.is_empty() {
      analysis.subject.clone()
    } else {
      options.subject.clone().unwrap_or_else(|| "Général".to_string())
    };

    let concepts = self.extract_concepts(text).await;

    let study_time = options.study_time.min(self.limits.max_study_time);
    // Summary and study plan carry no item count.
    let uncounted = TaskParams { count: 0, study_time };
    let quiz_params =
      TaskParams { count: options.quiz_count.min(self.limits.max_quiz_questions), study_time };
    let card_params =
      TaskParams { count: options.flashcard_count.min(self.limits.max_flashcards), study_time };

    let (summary, quiz, flashcards, study_plan) = tokio::join!(
      self.run_if(options.summary, GenerationTask::Summary, text, uncounted),
      self.run_if(options.quiz, GenerationTask::Quiz, text, quiz_params),
      self.run_if(options.flashcards, GenerationTask::Flashcards, text, card_params),
      self.run_if(options.study_plan, GenerationTask::StudyPlan, text, uncounted),
    );

    StudyBundle {
      subject,
      stats,
      analysis,
      concepts,
      summary: match summary {
        Some(GenerationOutput::Summary(summary)) => Some(summary),
        _ => None,
      },
      quiz: match quiz {
        Some(GenerationOutput::Quiz(questions)) => Some(questions),
        _ => None,
      },
      flashcards: match flashcards {
        Some(GenerationOutput::Flashcards(cards)) => Some(cards),
        _ => None,
      },
      study_plan: match study_plan {
        Some(GenerationOutput::StudyPlan(plan)) => Some(plan),
        _ => None,
      },
      source_excerpt: format!("{}...", prompt::truncate_chars(text, EXCERPT_CHARS)),
      generated_at: Utc::now(),
    }
  }

  /// Runs one generation task when enabled.
  async fn run_if(
    &self,
    enabled: bool,
    task: GenerationTask,
    text: &str,
    params: TaskParams,
  ) -> Option<GenerationOutput> {
    if enabled {
      Some(self.generator.generate(task, text, &params).await)
    } else {
      None
    }
  }

  /// Extracts key concepts via the secondary prompt, falling back to the
  /// heading heuristic when the reply holds no usable payload.
  async fn extract_concepts(&self, text: &str) -> Vec<Concept> {
    let reply = self.generator.respond(&prompt::render_concepts(text), None).await;
    match parse_concepts(&reply) {
      Some(concepts) if !concepts.is_empty() => concepts,
      _ => heuristics::extract_concepts(text),
    }
  }

  /// Persists the bundle's artifacts under their store keys and registers
  /// the subject.
  pub async fn persist(
    &self,
    bundle: &StudyBundle,
    file_name: &str,
    store: &Store,
  ) -> Result<SaveReport> {
    let mut report = SaveReport::default();
    let stamp = bundle.generated_at.timestamp_millis();

    if let Some(cards) = &bundle.flashcards {
      if !cards.is_empty() {
        let records = cards
          .iter()
          .enumerate()
          .map(|(index, card)| StoredFlashcard {
            id:                format!("generated_{stamp}_{index}"),
            question:          card.question.clone(),
            answer:            card.answer.clone(),
            category:          card.category.clone(),
            subject:           bundle.subject.clone(),
            source:            file_name.to_string(),
            generated:         true,
            studied:           false,
            correct_answers:   0,
            incorrect_answers: 0,
            last_studied:      None,
          })
          .collect::<Vec<_>>();
        report.flashcards = records.len();
        store.add_flashcards(records).await?;
      }
    }

    if let Some(questions) = &bundle.quiz {
      if !questions.is_empty() {
        report.quiz_questions = questions.len();
        store
          .insert_quiz_set(QuizSet {
            id:         format!("generated_{stamp}"),
            title:      format!("QCM généré - {file_name}"),
            subject:    bundle.subject.clone(),
            questions:  questions.clone(),
            source:     file_name.to_string(),
            generated:  true,
            created_at: bundle.generated_at,
            completed:  false,
          })
          .await?;
      }
    }

    if let Some(summary) = &bundle.summary {
      report.summaries = 1;
      store
        .insert_summary(SummaryRecord {
          id:            format!("generated_{stamp}"),
          title:         format!("Résumé - {file_name}"),
          content:       summary.clone(),
          subject:       bundle.subject.clone(),
          source:        file_name.to_string(),
          generated:     true,
          created_at:    bundle.generated_at,
          original_text: bundle.source_excerpt.clone(),
        })
        .await?;
    }

    store.add_subject(&bundle.subject).await?;
    Ok(report)
  }
}

/// Builds a content analysis from the local heuristics alone.
fn heuristic_analysis(stats: &TextAnalysis) -> ContentAnalysis {
  ContentAnalysis {
    subject:        DEFAULT_SUBJECT.to_string(),
    main_concepts:  stats.topics.iter().take(3).cloned().collect(),
    difficulty:     match stats.complexity {
      Complexity::Low => "beginner".to_string(),
      Complexity::Medium => "intermediate".to_string(),
      Complexity::High => "advanced".to_string(),
    },
    keywords:       stats.topics.clone(),
    structure:      format!(
      "{} paragraphes, {} phrases",
      stats.paragraph_count, stats.sentence_count
    ),
    estimated_time: stats.reading_minutes.to_string(),
  }
}

/// Parses a `{"concepts": [...]}` payload out of an assistant reply.
fn parse_concepts(reply: &str) -> Option<Vec<Concept>> {
  let span = extract_json_span(reply)?;
  let envelope: Value = serde_json::from_str(span).ok()?;
  let items = envelope.get("concepts")?.as_array()?;
  Some(items.iter().filter_map(|item| serde_json::from_value(item.clone()).ok()).collect())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn heuristic_analysis_maps_complexity_tiers() {
    let stats = heuristics::analyze(
      "La thermodynamique est une branche de la physique. Elle étudie la chaleur.",
    );
    let analysis = heuristic_analysis(&stats);
    assert_eq!(analysis.subject, DEFAULT_SUBJECT);
    assert!(analysis.keywords.contains(&"physique".to_string()));
    assert!(["beginner", "intermediate", "advanced"].contains(&analysis.difficulty.as_str()));
  }

  #[test]
  fn concept_replies_parse_or_reject() {
    let reply = r#"Voici : {"concepts": [{"concept": "Entropie", "definition": "Mesure du désordre", "importance": "high"}]}"#;
    let concepts = parse_concepts(reply).unwrap();
    assert_eq!(concepts.len(), 1);
    assert_eq!(concepts[0].concept, "Entropie");

    assert!(parse_concepts("pas de JSON").is_none());
    assert!(parse_concepts(r#"{"autre": []}"#).is_none());
  }

  #[tokio::test]
  async fn requested_counts_are_clamped_to_the_limits() {
    let config = Config::default();
    let pipeline = Pipeline::new(&config);
    let options =
      BundleOptions { quiz_count: 200, flashcard_count: 500, ..BundleOptions::default() };

    let bundle = pipeline.build_bundle("Un cours court.", &options).await;
    assert_eq!(bundle.quiz.as_ref().unwrap().len(), config.limits.max_quiz_questions);
    assert_eq!(bundle.flashcards.as_ref().unwrap().len(), config.limits.max_flashcards);
  }

  #[tokio::test]
  async fn disabled_tasks_stay_empty() {
    let pipeline = Pipeline::new(&Config::default());
    let options = BundleOptions {
      summary: false,
      study_plan: false,
      quiz_count: 3,
      ..BundleOptions::default()
    };

    let bundle = pipeline.build_bundle("Un cours court.", &options).await;
    assert!(bundle.summary.is_none());
    assert!(bundle.study_plan.is_none());
    assert_eq!(bundle.quiz.as_ref().unwrap().len(), 3);
    assert!(bundle.flashcards.is_some());
  }
}
