//! End-to-end workflows over the full library: extraction, generation
//! with no credential configured, and persistence.

use cram::{
  config::Config,
  document::{self, SourceFile},
  pipeline::{BundleOptions, Pipeline},
  store::Store,
};
use tempfile::tempdir;

/// A course text comfortably above the per-task content caps.
fn course_text() -> String {
  let text = "La thermodynamique étudie les transferts d'énergie entre les systèmes. "
    .repeat(80);
  assert!(text.chars().count() >= 5000);
  text
}

#[tokio::test]
async fn offline_import_generates_and_persists_everything() -> anyhow::Result<()> {
  let dir = tempdir()?;
  let store = Store::open(dir.path().join("test.db")).await?;

  // No credential configured: every task must take the mock path.
  let config = Config::default();
  assert!(config.api.api_key.is_none());

  let pipeline = Pipeline::new(&config).with_store(store.clone());
  let options = BundleOptions { quiz_count: 10, ..BundleOptions::default() };
  let bundle = pipeline.build_bundle(&course_text(), &options).await;

  let questions = bundle.quiz.as_ref().expect("quiz requested");
  assert_eq!(questions.len(), 10);
  for question in questions {
    assert_eq!(question.answers.len(), 4);
    assert!(question.correct_answer < 4);
  }
  assert!(!bundle.summary.as_ref().expect("summary requested").trim().is_empty());
  assert!(!bundle.flashcards.as_ref().expect("flashcards requested").is_empty());
  assert!(bundle.study_plan.is_some());
  assert!(!bundle.concepts.is_empty() || bundle.stats.word_count > 0);

  let report = pipeline.persist(&bundle, "cours-thermo.pdf", &store).await?;
  assert_eq!(report.quiz_questions, 10);
  assert_eq!(report.summaries, 1);
  assert!(report.flashcards > 0);

  // Every persisted artifact carries provenance and the generated flag.
  let sets = store.quiz_sets().await?;
  assert_eq!(sets.len(), 1);
  let set = sets.values().next().unwrap();
  assert!(set.generated);
  assert_eq!(set.questions.len(), 10);
  assert_eq!(set.source, "cours-thermo.pdf");

  let cards = store.flashcards().await?;
  assert!(!cards.is_empty());
  assert!(cards.iter().all(|c| c.generated && c.source == "cours-thermo.pdf"));

  let summaries = store.summaries().await?;
  assert_eq!(summaries.len(), 1);
  assert!(summaries.values().next().unwrap().generated);

  assert!(store.subjects().await?.contains(&bundle.subject));
  Ok(())
}

#[tokio::test]
async fn stubbed_word_document_flows_through_the_pipeline() -> anyhow::Result<()> {
  let dir = tempdir()?;
  let store = Store::open(dir.path().join("test.db")).await?;

  let file = SourceFile::from_mime(
    "notes.docx",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    vec![0; 512],
  )?;
  let document = document::extract(&file)?;
  assert!(document.stubbed);
  assert!(!document.text.is_empty());

  let pipeline = Pipeline::new(&Config::default()).with_store(store.clone());
  let options = BundleOptions { quiz_count: 5, flashcard_count: 5, ..BundleOptions::default() };
  let bundle = pipeline.build_bundle(&document.text, &options).await;

  // The placeholder course has numbered headings, so the heuristic
  // concept extractor finds real entries.
  assert!(!bundle.concepts.is_empty());

  let report = pipeline.persist(&bundle, &file.name, &store).await?;
  assert_eq!(report.quiz_questions, 5);
  assert_eq!(report.flashcards, 5);
  Ok(())
}
