//! Module for listing the stored study data.

use super::*;

/// Prints the registered subjects and stored artifact counts.
pub async fn list<I: UserInteraction>(interaction: &I, store: &Store) -> Result<()> {
  let subjects = store.subjects().await?;
  let flashcards = store.flashcards().await?.len();
  let quizzes = store.quiz_sets().await?.len();
  let summaries = store.summaries().await?.len();
  let imports = store.imported_files().await?.len();

  if subjects.is_empty() && flashcards == 0 && quizzes == 0 && summaries == 0 {
    interaction.reply(ResponseContent::Info(
      "Nothing stored yet. Import a course document with `cram import <file>`.",
    ))?;
    return Ok(());
  }

  interaction.reply(ResponseContent::Overview {
    subjects: &subjects,
    flashcards,
    quizzes,
    summaries,
    imports,
  })?;
  Ok(())
}
