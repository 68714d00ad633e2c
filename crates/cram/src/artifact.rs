//! Generated study-content types and their shape validation.
//!
//! These types describe what the remote model is asked to produce for each
//! [`GenerationTask`](crate::prompt::GenerationTask). The wire format is
//! camelCase JSON (the shape spelled out in the prompt templates); the mock
//! generator produces the same shapes, so downstream code never needs to
//! know which path a value came from.
//!
//! A value of one of these types that reaches persistence has always passed
//! shape validation: the generation client discards invalid entries and
//! substitutes mock content when nothing valid remains.

use super::*;

/// Difficulty level attached to a quiz question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
  /// Introductory question.
  Easy,
  /// Standard question.
  Medium,
  /// Advanced question.
  Hard,
}

impl Default for Difficulty {
  fn default() -> Self { Self::Medium }
}

/// A single multiple-choice quiz question.
///
/// Valid only with exactly four answer options and a correct-answer index
/// in `[0, 4)`; see [`QuizQuestion::is_valid`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
  /// The question text.
  pub question:       String,
  /// The four answer options, in display order.
  pub answers:        Vec<String>,
  /// Index of the correct option within `answers`.
  pub correct_answer: usize,
  /// Explanation of the correct answer.
  pub explanation:    String,
  /// Difficulty level.
  #[serde(default = "Difficulty::default")]
  pub difficulty:     Difficulty,
}

impl QuizQuestion {
  /// Returns whether this question satisfies the required shape:
  /// non-empty text, exactly 4 answers, and a correct index in range.
  pub fn is_valid(&self) -> bool {
    !self.question.trim().is_empty() && self.answers.len() == 4 && self.correct_answer < 4
  }
}

/// A question/answer flashcard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flashcard {
  /// The prompt side of the card.
  pub question: String,
  /// The answer side of the card.
  pub answer:   String,
  /// Optional category tag (definition, formula, concept, application).
  #[serde(default)]
  pub category: Option<String>,
}

impl Flashcard {
  /// Returns whether both sides of the card are non-empty.
  pub fn is_valid(&self) -> bool {
    !self.question.trim().is_empty() && !self.answer.trim().is_empty()
  }
}

/// Model-provided analysis of a course text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentAnalysis {
  /// Main subject of the material.
  pub subject:        String,
  /// Key concepts covered.
  pub main_concepts:  Vec<String>,
  /// Estimated difficulty (beginner, intermediate, advanced).
  pub difficulty:     String,
  /// Important keywords.
  pub keywords:       Vec<String>,
  /// Description of how the material is structured.
  #[serde(default)]
  pub structure:      String,
  /// Estimated revision time in minutes, as reported by the model.
  #[serde(default)]
  pub estimated_time: String,
}

/// A key concept extracted from the course text, with its definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Concept {
  /// Name or heading of the concept.
  pub concept:    String,
  /// Short definition, possibly assembled from surrounding lines.
  pub definition: String,
  /// Importance marker (the heuristic extractor always reports "high").
  #[serde(default = "default_importance")]
  pub importance: String,
}

/// Default importance for concepts that omit the field.
fn default_importance() -> String { "high".to_string() }

/// One session of a study plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySession {
  /// 1-based session number.
  pub session:    u32,
  /// Session title.
  pub title:      String,
  /// Learning objectives for the session.
  pub objectives: Vec<String>,
  /// Recommended revision methods.
  pub methods:    Vec<String>,
  /// Session length in minutes.
  pub duration:   u32,
  /// What the session concentrates on.
  pub focus:      String,
}

/// A complete session-by-session study plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyPlan {
  /// The ordered sessions.
  pub plan:            Vec<StudySession>,
  /// Total planned time in minutes.
  pub total_time:      u32,
  /// General revision recommendations.
  pub recommendations: Vec<String>,
}

/// Tagged union over the five generation task outputs.
///
/// Every variant carried here has passed the shape validation for its
/// task, whether it came from the remote model or the mock generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GenerationOutput {
  /// Validated quiz questions.
  Quiz(Vec<QuizQuestion>),
  /// Validated flashcards.
  Flashcards(Vec<Flashcard>),
  /// A non-empty summary text.
  Summary(String),
  /// A typed content analysis.
  Analysis(ContentAnalysis),
  /// A typed study plan.
  StudyPlan(StudyPlan),
}

impl GenerationOutput {
  /// The task kind this output answers.
  pub fn task(&self) -> crate::prompt::GenerationTask {
    use crate::prompt::GenerationTask;
    match self {
      Self::Quiz(_) => GenerationTask::Quiz,
      Self::Flashcards(_) => GenerationTask::Flashcards,
      Self::Summary(_) => GenerationTask::Summary,
      Self::Analysis(_) => GenerationTask::Analysis,
      Self::StudyPlan(_) => GenerationTask::StudyPlan,
    }
  }
}
