//! Module for importing a course document and generating study material.

use chrono::Utc;
use clap::Args;
use cram::{
  document::{self, SourceFile},
  pipeline::{BundleOptions, Pipeline},
  store::ImportedFile,
};

use super::*;

/// Arguments for [`Commands::Import`].
#[derive(Args)]
pub struct ImportArgs {
  /// Path to the course document (PDF or Word)
  pub file: PathBuf,

  /// Subject to file the generated material under (detected otherwise)
  #[arg(long)]
  pub subject: Option<String>,

  /// Number of quiz questions to generate
  #[arg(long, default_value_t = 15)]
  pub qcm: usize,

  /// Number of flashcards to generate
  #[arg(long, default_value_t = 20)]
  pub flashcards: usize,

  /// Study time in minutes for the plan
  #[arg(long, default_value_t = 60)]
  pub study_time: u32,

  /// Skip summary generation
  #[arg(long)]
  pub no_summary: bool,

  /// Skip quiz generation
  #[arg(long)]
  pub no_qcm: bool,

  /// Skip flashcard generation
  #[arg(long)]
  pub no_flashcards: bool,

  /// Skip study-plan generation
  #[arg(long)]
  pub no_plan: bool,
}

/// Runs the full import flow: validate, extract, generate, persist.
pub async fn import<I: UserInteraction>(
  interaction: &I,
  config: &Config,
  store: &Store,
  args: ImportArgs,
) -> Result<()> {
  let file = SourceFile::from_path(&args.file).await?;
  interaction.reply(ResponseContent::Info(&format!("Extracting text from {}", file.name)))?;

  let document = document::extract(&file)?;
  if document.stubbed {
    interaction.reply(ResponseContent::Info(
      "Word extraction is a stub: generated material is based on placeholder content.",
    ))?;
  }

  store
    .record_import(ImportedFile {
      name:        file.name.clone(),
      kind:        document.kind,
      page_count:  document.page_count,
      imported_at: Utc::now(),
    })
    .await?;

  let options = BundleOptions {
    subject:         args.subject,
    quiz_count:      args.qcm,
    flashcard_count: args.flashcards,
    study_time:      args.study_time,
    summary:         !args.no_summary,
    quiz:            !args.no_qcm,
    flashcards:      !args.no_flashcards,
    study_plan:      !args.no_plan,
    analysis:        true,
  };

  let pipeline = Pipeline::new(config).with_store(store.clone());
  let bundle = pipeline.build_bundle(&document.text, &options).await;
  let report = pipeline.persist(&bundle, &file.name, store).await?;

  interaction.reply(ResponseContent::Bundle(&bundle, &report))?;
  Ok(())
}
