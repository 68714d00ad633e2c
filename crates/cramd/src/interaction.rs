//! Console interaction: prompts, confirmations, and formatted replies.

use console::style;
use cram::{auth::Session, pipeline::{SaveReport, StudyBundle}};
use dialoguer::{Confirm, Input, Password};

use super::*;

/// Prefix for information messages.
pub static INFO_PREFIX: &str = "ℹ ";
/// Prefix for success messages.
pub static SUCCESS_PREFIX: &str = "✓ ";
/// Prefix for error messages.
pub static ERROR_PREFIX: &str = "✗ ";
/// Branch character for detail lines.
pub static ITEM_PREFIX: &str = "├─";
/// Leaf character for the last detail line.
pub static LAST_ITEM_PREFIX: &str = "└─";

/// Structured content a command can send back to the user.
#[derive(Debug)]
pub enum ResponseContent<'a> {
  /// A generation run's outcome with its persistence report.
  Bundle(&'a StudyBundle, &'a SaveReport),
  /// The signed-in session.
  Session(&'a Session),
  /// Stored-artifact counts, with the registered subjects.
  Overview {
    /// Registered subjects.
    subjects:   &'a [String],
    /// Stored flashcard count.
    flashcards: usize,
    /// Stored quiz-set count.
    quizzes:    usize,
    /// Stored summary count.
    summaries:  usize,
    /// Imported-file count.
    imports:    usize,
  },
  /// A long assistant reply, printed without decoration.
  Assistant(&'a str),
  /// A short success line.
  Success(&'a str),
  /// A short informational line.
  Info(&'a str),
  /// A surfaced (non-fatal) error.
  Error(CramdError),
}

/// How commands talk to the user; implemented by the console and by test
/// doubles.
pub trait UserInteraction {
  /// Asks a yes/no question.
  fn confirm(&self, message: &str) -> Result<bool>;
  /// Prompts for a line of input.
  fn prompt(&self, message: &str) -> Result<String>;
  /// Prompts for a secret (no echo).
  fn prompt_password(&self, message: &str) -> Result<String>;
  /// Presents structured content.
  fn reply(&self, content: ResponseContent) -> Result<()>;
}

/// Interactive console implementation.
pub struct ConsoleInteraction {
  /// When set, confirmations are auto-accepted and prompts fail instead
  /// of blocking (for tests and scripted use).
  accept_defaults: bool,
}

impl ConsoleInteraction {
  /// Creates a console interaction.
  pub fn new(accept_defaults: bool) -> Self { Self { accept_defaults } }
}

impl UserInteraction for ConsoleInteraction {
  fn confirm(&self, message: &str) -> Result<bool> {
    if self.accept_defaults {
      return Ok(true);
    }
    Ok(Confirm::new().with_prompt(message).default(false).interact()?)
  }

  fn prompt(&self, message: &str) -> Result<String> {
    if self.accept_defaults {
      return Err(CramdError::Io(std::io::Error::new(
        std::io::ErrorKind::InvalidInput,
        "prompt required but --accept-defaults was passed",
      )));
    }
    Ok(Input::new().with_prompt(message).interact_text()?)
  }

  fn prompt_password(&self, message: &str) -> Result<String> {
    if self.accept_defaults {
      return Err(CramdError::Io(std::io::Error::new(
        std::io::ErrorKind::InvalidInput,
        "prompt required but --accept-defaults was passed",
      )));
    }
    Ok(Password::new().with_prompt(message).interact()?)
  }

  fn reply(&self, content: ResponseContent) -> Result<()> {
    match content {
      ResponseContent::Bundle(bundle, report) => {
        println!("{} Import complete", style(SUCCESS_PREFIX).green());
        println!("{ITEM_PREFIX} Subject: {}", bundle.subject);
        println!("{ITEM_PREFIX} Quiz questions: {}", report.quiz_questions);
        println!("{ITEM_PREFIX} Flashcards: {}", report.flashcards);
        println!("{ITEM_PREFIX} Summaries: {}", report.summaries);
        println!(
          "{LAST_ITEM_PREFIX} Reading time: {} min ({} words, {} complexity)",
          bundle.stats.reading_minutes, bundle.stats.word_count, bundle.stats.complexity
        );
      },
      ResponseContent::Session(session) => {
        println!(
          "{} Signed in as {} <{}>",
          style(SUCCESS_PREFIX).green(),
          style(&session.name).bold(),
          session.email
        );
      },
      ResponseContent::Overview { subjects, flashcards, quizzes, summaries, imports } => {
        println!("{} Stored study data", style(INFO_PREFIX).blue());
        println!("{ITEM_PREFIX} Subjects: {}", subjects.join(", "));
        println!("{ITEM_PREFIX} Flashcards: {flashcards}");
        println!("{ITEM_PREFIX} Quiz sets: {quizzes}");
        println!("{ITEM_PREFIX} Summaries: {summaries}");
        println!("{LAST_ITEM_PREFIX} Imported files: {imports}");
      },
      ResponseContent::Assistant(reply) => println!("{reply}"),
      ResponseContent::Success(message) =>
        println!("{} {message}", style(SUCCESS_PREFIX).green()),
      ResponseContent::Info(message) => println!("{} {message}", style(INFO_PREFIX).blue()),
      ResponseContent::Error(error) => eprintln!("{} {error}", style(ERROR_PREFIX).red()),
    }
    Ok(())
  }
}
