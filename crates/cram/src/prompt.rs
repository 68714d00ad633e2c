//! Fixed prompt templates and placeholder substitution.
//!
//! Every generation task uses a static template with `{count}`, `{content}`,
//! and `{study_time}` placeholders. Rendering truncates the source text to
//! the task's character cap before substitution, so a given template and
//! variable set always produce byte-identical output.
//!
//! The templates are written in French: the assistant is aimed at French
//! course material and is instructed to reply in French.

use super::*;

/// System prompt sent with every chat request.
pub static SYSTEM_PROMPT: &str = "Tu es un assistant pédagogique intelligent spécialisé dans \
                                  l'aide aux étudiants français.

MISSION : Aider les étudiants à mieux comprendre et réviser leurs cours.

RÈGLES IMPORTANTES :
1. Réponds TOUJOURS en français
2. Sois pédagogique, clair et précis
3. Adapte tes réponses au niveau de l'étudiant
4. Utilise des exemples concrets quand c'est possible
5. Structure tes réponses de manière logique
6. Si tu génères du JSON, respecte strictement le format demandé
7. Sois encourageant et motivant

CONTEXTE : Tu as accès aux documents de cours de l'étudiant pour donner des réponses \
                                  personnalisées.";

/// Template for multiple-choice quiz (QCM) generation.
static QUIZ_TEMPLATE: &str = r#"Génère {count} questions de QCM de qualité basées sur ce contenu de cours.

REQUIS :
- Questions variées : définitions, applications pratiques, calculs, concepts théoriques
- 4 réponses possibles par question (A, B, C, D)
- Une seule réponse correcte
- Explication détaillée de la réponse correcte
- Niveau de difficulté (easy, medium, hard)

FORMAT JSON STRICT :
{
  "questions": [
    {
      "question": "Question claire et précise",
      "answers": ["Réponse A", "Réponse B", "Réponse C", "Réponse D"],
      "correctAnswer": 0,
      "explanation": "Explication pédagogique détaillée",
      "difficulty": "easy"
    }
  ]
}

CONTENU DU COURS :
{content}

IMPORTANT : Respecte exactement le format JSON demandé."#;

/// Template for flashcard generation.
static FLASHCARD_TEMPLATE: &str = r#"Génère {count} flashcards de qualité basées sur ce contenu de cours.

REQUIS :
- Couvrir les concepts clés, définitions importantes, formules, théorèmes
- Questions claires et précises
- Réponses détaillées et pédagogiques
- Catégorisation (definition, formula, concept, application)

FORMAT JSON STRICT :
{
  "flashcards": [
    {
      "question": "Question claire et précise",
      "answer": "Réponse détaillée et pédagogique avec exemples si possible",
      "category": "definition"
    }
  ]
}

CONTENU DU COURS :
{content}

IMPORTANT : Respecte exactement le format JSON demandé."#;

/// Template for summary generation. The reply is free text, not JSON.
static SUMMARY_TEMPLATE: &str = r#"Génère un résumé clair et structuré de ce contenu de cours.

REQUIS :
- Points clés principaux mis en évidence
- Concepts importants expliqués
- Structure logique et organisée
- Maximum 400 mots
- Style pédagogique et accessible

STRUCTURE SUGGÉRÉE :
1. Introduction générale
2. Points clés principaux
3. Concepts importants
4. Applications pratiques
5. Conclusion

CONTENU DU COURS :
{content}

IMPORTANT : Sois précis, pédagogique et structuré."#;

/// Template for content analysis.
static ANALYSIS_TEMPLATE: &str = r#"Analyse ce contenu de cours et fournis une analyse détaillée.

REQUIS :
- Sujet principal identifié
- Concepts clés extraits
- Niveau de difficulté estimé
- Mots-clés importants
- Structure du contenu

FORMAT JSON STRICT :
{
  "subject": "Sujet principal",
  "mainConcepts": ["Concept 1", "Concept 2", "Concept 3"],
  "difficulty": "beginner|intermediate|advanced",
  "keywords": ["mot-clé 1", "mot-clé 2", "mot-clé 3"],
  "structure": "Description de la structure",
  "estimatedTime": "Temps estimé de révision en minutes"
}

CONTENU :
{content}

IMPORTANT : Respecte exactement le format JSON demandé."#;

/// Template for study plan generation.
static STUDY_PLAN_TEMPLATE: &str = r#"Génère un plan d'étude personnalisé basé sur ce contenu.

REQUIS :
- Plan structuré par sessions
- Objectifs d'apprentissage clairs
- Méthodes de révision recommandées
- Durée estimée par session

FORMAT JSON STRICT :
{
  "plan": [
    {
      "session": 1,
      "title": "Titre de la session",
      "objectives": ["Objectif 1", "Objectif 2"],
      "methods": ["Méthode 1", "Méthode 2"],
      "duration": 15,
      "focus": "Description du focus"
    }
  ],
  "totalTime": {study_time},
  "recommendations": ["Recommandation 1", "Recommandation 2"]
}

CONTENU :
{content}

TEMPS DISPONIBLE : {study_time} minutes

IMPORTANT : Respecte exactement le format JSON demandé."#;

/// Secondary template used by the pipeline for key-concept extraction.
pub static CONCEPT_TEMPLATE: &str = "Extrais les concepts clés de ce texte de cours.
Retourne un objet JSON de la forme {\"concepts\": [{\"concept\": ..., \"definition\": ..., \
                                    \"importance\": ...}]}.

Texte : {content}";

/// Character cap applied to `{content}` in the concept template.
pub const CONCEPT_CONTENT_CAP: usize = 2000;

/// The generation tasks the remote client understands.
///
/// Each task pairs a fixed prompt template with a source-text character
/// cap and an expected reply shape (see [`crate::artifact`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenerationTask {
  /// Multiple-choice quiz questions.
  Quiz,
  /// Question/answer flashcards.
  Flashcards,
  /// A free-text structured summary.
  Summary,
  /// Content analysis (subject, concepts, difficulty, keywords).
  Analysis,
  /// A session-by-session study plan.
  StudyPlan,
}

impl GenerationTask {
  /// Returns the fixed prompt template for this task.
  pub fn template(&self) -> &'static str {
    match self {
      Self::Quiz => QUIZ_TEMPLATE,
      Self::Flashcards => FLASHCARD_TEMPLATE,
      Self::Summary => SUMMARY_TEMPLATE,
      Self::Analysis => ANALYSIS_TEMPLATE,
      Self::StudyPlan => STUDY_PLAN_TEMPLATE,
    }
  }

  /// Returns the maximum number of source-text characters substituted
  /// into `{content}` for this task.
  pub fn content_cap(&self) -> usize {
    match self {
      Self::Quiz | Self::Flashcards | Self::Summary => 4000,
      Self::Analysis | Self::StudyPlan => 3000,
    }
  }
}

impl Display for GenerationTask {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Quiz => write!(f, "quiz"),
      Self::Flashcards => write!(f, "flashcards"),
      Self::Summary => write!(f, "summary"),
      Self::Analysis => write!(f, "analysis"),
      Self::StudyPlan => write!(f, "study plan"),
    }
  }
}

/// Numeric parameters substituted into the templates.
///
/// `count` is the requested number of items (questions or cards);
/// `study_time` is the available revision time in minutes for the
/// study-plan task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskParams {
  /// Requested number of generated items.
  pub count:      usize,
  /// Available study time in minutes.
  pub study_time: u32,
}

impl Default for TaskParams {
  fn default() -> Self { Self { count: 10, study_time: 60 } }
}

/// Renders the prompt for `task`, substituting the numeric parameters and
/// the (capped) source text into the template.
///
/// The source text is truncated to [`GenerationTask::content_cap`]
/// characters on a char boundary. `{content}` is substituted last so that
/// placeholder-like sequences inside the course text are never expanded.
pub fn render(task: GenerationTask, source_text: &str, params: &TaskParams) -> String {
  let content = truncate_chars(source_text, task.content_cap());
  task
    .template()
    .replace("{count}", &params.count.to_string())
    .replace("{study_time}", &params.study_time.to_string())
    .replace("{content}", content)
}

/// Renders the secondary concept-extraction prompt.
pub fn render_concepts(source_text: &str) -> String {
  CONCEPT_TEMPLATE.replace("{content}", truncate_chars(source_text, CONCEPT_CONTENT_CAP))
}

/// Truncates `text` to at most `cap` characters, respecting char boundaries.
pub(crate) fn truncate_chars(text: &str, cap: usize) -> &str {
  match text.char_indices().nth(cap) {
    Some((index, _)) => &text[..index],
    None => text,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn render_is_idempotent_on_substitution() {
    let params = TaskParams { count: 12, study_time: 45 };
    let first = render(GenerationTask::Quiz, "Le théorème de Pythagore.", &params);
    let second = render(GenerationTask::Quiz, "Le théorème de Pythagore.", &params);
    assert_eq!(first, second);
    assert!(first.contains("12 questions"));
    assert!(first.contains("Le théorème de Pythagore."));
    assert!(!first.contains("{count}"));
    assert!(!first.contains("{content}"));
  }

  #[test]
  fn study_plan_substitutes_time_twice() {
    let params = TaskParams { count: 1, study_time: 90 };
    let prompt = render(GenerationTask::StudyPlan, "contenu", &params);
    assert_eq!(prompt.matches("90").count(), 2);
    assert!(!prompt.contains("{study_time}"));
  }

  #[test]
  fn content_is_capped_per_task() {
    let long = "x".repeat(5000);
    let quiz = render(GenerationTask::Quiz, &long, &TaskParams::default());
    let plan = render(GenerationTask::StudyPlan, &long, &TaskParams::default());
    assert!(quiz.contains(&"x".repeat(4000)));
    assert!(!quiz.contains(&"x".repeat(4001)));
    assert!(plan.contains(&"x".repeat(3000)));
    assert!(!plan.contains(&"x".repeat(3001)));
  }

  #[test]
  fn placeholders_inside_content_are_not_expanded() {
    let text = "un cours qui mentionne {count} littéralement";
    let prompt = render(GenerationTask::Flashcards, text, &TaskParams { count: 3, study_time: 60 });
    assert!(prompt.contains("{count} littéralement"));
    assert!(prompt.contains("3 flashcards"));
  }

  #[test]
  fn truncation_respects_char_boundaries() {
    let text = "éèàç";
    assert_eq!(truncate_chars(text, 2), "éè");
    assert_eq!(truncate_chars(text, 10), text);
  }
}
