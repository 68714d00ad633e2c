//! Local text-analysis fallbacks.
//!
//! These heuristics run entirely offline and back up the remote analysis
//! path: surface statistics (word/sentence/paragraph counts), a reading
//! time estimate, a complexity tier, topic tags matched against a fixed
//! vocabulary, and a heading-based key-concept extractor.

use super::*;

/// Reading speed assumed for the time estimate, in words per minute.
const WORDS_PER_MINUTE: usize = 200;

/// Word length above which a word counts as "complex".
const COMPLEX_WORD_LENGTH: usize = 8;

/// Fixed vocabulary matched (as substrings) for topic tagging.
const TOPIC_VOCABULARY: [&str; 12] = [
  "mathématiques",
  "physique",
  "chimie",
  "biologie",
  "histoire",
  "géographie",
  "formule",
  "théorème",
  "principe",
  "loi",
  "concept",
  "définition",
];

lazy_static! {
  /// Sentence terminators.
  static ref SENTENCE_BREAK: Regex = Regex::new(r"[.!?]+").unwrap();
  /// Blank-line paragraph separator.
  static ref PARAGRAPH_BREAK: Regex = Regex::new(r"\n\s*\n").unwrap();
  /// Numbered headings such as `1.2 Applications`.
  static ref NUMBERED_HEADING: Regex = Regex::new(r"^[0-9]+\.[0-9]*\s+").unwrap();
  /// All-caps headings.
  static ref CAPS_HEADING: Regex = Regex::new(r"^[A-ZÀ-Þ][A-ZÀ-Þ\s]+$").unwrap();
}

/// Complexity tier derived from the share of long words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
  /// Fewer than 15% complex words.
  Low,
  /// Between 15% and 30% complex words.
  Medium,
  /// At least 30% complex words.
  High,
}

impl Display for Complexity {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Low => write!(f, "low"),
      Self::Medium => write!(f, "medium"),
      Self::High => write!(f, "high"),
    }
  }
}

/// Surface statistics for a course text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextAnalysis {
  /// Whitespace-separated word count.
  pub word_count:      usize,
  /// Sentence count.
  pub sentence_count:  usize,
  /// Blank-line-separated paragraph count.
  pub paragraph_count: usize,
  /// Estimated reading time in minutes.
  pub reading_minutes: usize,
  /// Complexity tier.
  pub complexity:      Complexity,
  /// Topic tags found in the text.
  pub topics:          Vec<String>,
}

/// Computes surface statistics for `text`.
pub fn analyze(text: &str) -> TextAnalysis {
  let word_count = text.split_whitespace().count();
  let sentence_count = SENTENCE_BREAK.split(text).filter(|s| !s.trim().is_empty()).count();
  let paragraph_count = PARAGRAPH_BREAK.split(text).filter(|p| !p.trim().is_empty()).count();

  TextAnalysis {
    word_count,
    sentence_count,
    paragraph_count,
    reading_minutes: word_count.div_ceil(WORDS_PER_MINUTE),
    complexity: assess_complexity(text),
    topics: extract_topics(text),
  }
}

/// Classifies `text` by the ratio of words longer than
/// [`COMPLEX_WORD_LENGTH`] characters.
pub fn assess_complexity(text: &str) -> Complexity {
  let words: Vec<&str> = text.split_whitespace().collect();
  if words.is_empty() {
    return Complexity::Low;
  }

  let complex = words.iter().filter(|w| w.chars().count() > COMPLEX_WORD_LENGTH).count();
  let ratio = complex as f64 / words.len() as f64;

  if ratio >= 0.3 {
    Complexity::High
  } else if ratio >= 0.15 {
    Complexity::Medium
  } else {
    Complexity::Low
  }
}

/// Returns the vocabulary entries present in `text` (case-insensitive
/// substring match), in vocabulary order.
pub fn extract_topics(text: &str) -> Vec<String> {
  let lower = text.to_lowercase();
  TOPIC_VOCABULARY.iter().filter(|t| lower.contains(**t)).map(|t| t.to_string()).collect()
}

/// Extracts up to ten key concepts from headings.
///
/// A heading is a numbered line (`1.2 …`) or an all-caps line; its
/// definition is assembled from up to three following non-heading lines.
pub fn extract_concepts(text: &str) -> Vec<Concept> {
  let lines: Vec<&str> = text.lines().map(str::trim).collect();
  let mut concepts = Vec::new();

  for (index, line) in lines.iter().enumerate() {
    if concepts.len() == 10 {
      break;
    }
    if line.is_empty() || !(NUMBERED_HEADING.is_match(line) || CAPS_HEADING.is_match(line)) {
      continue;
    }

    let definition = lines[index + 1..]
      .iter()
      .take(3)
      .filter(|next| !next.is_empty() && !NUMBERED_HEADING.is_match(next))
      .copied()
      .collect::<Vec<_>>()
      .join(" ");

    concepts.push(Concept {
      concept:    line.to_string(),
      definition: if definition.is_empty() {
        "Définition à compléter".to_string()
      } else {
        definition
      },
      importance: "high".to_string(),
    });
  }

  concepts
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn counts_and_reading_time() {
    let text = "Première phrase. Deuxième phrase!\n\nSecond paragraphe?";
    let analysis = analyze(text);
    assert_eq!(analysis.word_count, 6);
    assert_eq!(analysis.sentence_count, 3);
    assert_eq!(analysis.paragraph_count, 2);
    assert_eq!(analysis.reading_minutes, 1);
  }

  #[test]
  fn complexity_tiers_follow_the_ratio() {
    assert_eq!(assess_complexity("le chat dort sur le lit"), Complexity::Low);
    // 1 of 6 words is longer than 8 characters.
    assert_eq!(
      assess_complexity("la thermodynamique est une science dure"),
      Complexity::Medium
    );
    assert_eq!(
      assess_complexity("électromagnétisme thermodynamique photosynthèse"),
      Complexity::High
    );
    assert_eq!(assess_complexity(""), Complexity::Low);
  }

  #[test]
  fn topics_match_the_fixed_vocabulary() {
    let topics = extract_topics("Un théorème de mathématiques et une loi de la physique.");
    assert_eq!(topics, vec!["mathématiques", "physique", "théorème", "loi"]);
  }

  #[test]
  fn concepts_come_from_headings() {
    let text = "1.1 Concepts de base\nLe premier concept important.\nSuite de la définition.\n\n1.\
                2 Applications\nLes applications pratiques.";
    let concepts = extract_concepts(text);
    assert_eq!(concepts.len(), 2);
    assert_eq!(concepts[0].concept, "1.1 Concepts de base");
    assert!(concepts[0].definition.starts_with("Le premier concept"));
    assert_eq!(concepts[1].importance, "high");
  }

  #[test]
  fn headless_text_yields_no_concepts() {
    assert!(extract_concepts("du texte sans structure particulière").is_empty());
  }
}
