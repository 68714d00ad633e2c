//! Local key-value persistence for study artifacts.
//!
//! Everything the application remembers lives in a flat key-value store
//! backed by SQLite, one JSON document per key. The fixed key set covers
//! subjects, quiz sets and results, flashcards, summaries, imported files,
//! chat history, the sync timestamp, the API credential, and a bounded
//! diagnostic error log.
//!
//! All writes go through the single async connection, and every
//! read-modify-write runs inside one connection call, so concurrent
//! writers (e.g. two generation tasks appending to the same collection)
//! cannot drop each other's entries.
//!
//! # Examples
//!
//! ```no_run
//! # async fn example() -> Result<(), cram::error::CramError> {
//! let store = cram::store::Store::open("study.db").await?;
//! store.add_subject("Thermodynamique").await?;
//! for subject in store.subjects().await? {
//!   println!("{subject}");
//! }
//! # Ok(())
//! # }
//! ```

use rusqlite::params;
use serde::de::DeserializeOwned;
use tokio_rusqlite::Connection;

use crate::{auth::Session, document::FileKind};

use super::*;

/// The fixed keys used by the application.
pub mod keys {
  /// Registered subjects (list of names).
  pub const SUBJECTS: &str = "subjects";
  /// Stored quiz sets, keyed by id.
  pub const QUIZ_DATA: &str = "qcm_data";
  /// Quiz attempt results, keyed by quiz id.
  pub const QUIZ_RESULTS: &str = "qcm_results";
  /// Stored flashcards (list).
  pub const FLASHCARDS: &str = "flashcards";
  /// Stored summaries, keyed by id.
  pub const SUMMARIES: &str = "resumes";
  /// Imported-file records (list).
  pub const IMPORTED_FILES: &str = "imported_files";
  /// Chat history, keyed by subject.
  pub const CHAT_HISTORY: &str = "chat_history";
  /// Timestamp of the last applied cloud snapshot.
  pub const LAST_SYNC: &str = "last_sync";
  /// Persisted API credential.
  pub const API_KEY: &str = "openai_api_key";
  /// Bounded diagnostic error log.
  pub const ERROR_LOG: &str = "ai_error_logs";
  /// Mirrored authenticated session.
  pub const SESSION: &str = "session";
}

/// Number of diagnostic entries retained in the error log.
pub const ERROR_LOG_CAP: usize = 50;

/// A persisted flashcard with provenance and review statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFlashcard {
  /// Unique identifier.
  pub id:                String,
  /// The prompt side of the card.
  pub question:          String,
  /// The answer side of the card.
  pub answer:            String,
  /// Optional category tag.
  #[serde(default)]
  pub category:          Option<String>,
  /// Subject the card belongs to.
  pub subject:           String,
  /// Name of the originating file.
  pub source:            String,
  /// True when the card was AI- or mock-generated rather than authored.
  pub generated:         bool,
  /// True once the card has been reviewed at least once.
  pub studied:           bool,
  /// Number of correct reviews.
  pub correct_answers:   u32,
  /// Number of incorrect reviews.
  pub incorrect_answers: u32,
  /// Time of the most recent review.
  #[serde(default)]
  pub last_studied:      Option<DateTime<Utc>>,
}

/// A persisted quiz set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSet {
  /// Unique identifier.
  pub id:         String,
  /// Display title.
  pub title:      String,
  /// Subject the quiz belongs to.
  pub subject:    String,
  /// The validated questions.
  pub questions:  Vec<QuizQuestion>,
  /// Name of the originating file.
  pub source:     String,
  /// True when the quiz was AI- or mock-generated.
  pub generated:  bool,
  /// Creation time.
  pub created_at: DateTime<Utc>,
  /// True once the quiz has been taken.
  pub completed:  bool,
}

/// The outcome of one quiz attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
  /// Number of correct answers.
  pub score:        u32,
  /// Number of questions asked.
  pub total:        u32,
  /// When the attempt finished.
  pub completed_at: DateTime<Utc>,
}

/// A persisted summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRecord {
  /// Unique identifier.
  pub id:            String,
  /// Display title.
  pub title:         String,
  /// The summary text.
  pub content:       String,
  /// Subject the summary belongs to.
  pub subject:       String,
  /// Name of the originating file.
  pub source:        String,
  /// True when the summary was AI- or mock-generated.
  pub generated:     bool,
  /// Creation time.
  pub created_at:    DateTime<Utc>,
  /// Opening excerpt of the source text.
  pub original_text: String,
}

/// A record of one imported course document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedFile {
  /// Original file name.
  pub name:        String,
  /// Document kind.
  pub kind:        FileKind,
  /// Page count reported by extraction.
  pub page_count:  usize,
  /// When the file was imported.
  pub imported_at: DateTime<Utc>,
}

/// One turn of the chat assistant's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
  /// "user" or "assistant".
  pub role:    String,
  /// The message text.
  pub content: String,
  /// When the turn happened.
  pub at:      DateTime<Utc>,
}

/// One entry of the bounded diagnostic error log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorLogEntry {
  /// When the error occurred.
  pub timestamp: DateTime<Utc>,
  /// Which operation failed.
  pub context:   String,
  /// The error message.
  pub message:   String,
}

/// A full snapshot of the study data, as pushed to and pulled from the
/// cloud document store.
///
/// Sections are carried as raw JSON so sync never needs to understand
/// (or migrate) their contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
  /// Registered subjects.
  #[serde(default)]
  pub subjects:       Value,
  /// Stored quiz sets.
  #[serde(default)]
  pub qcm_data:       Value,
  /// Quiz attempt results.
  #[serde(default)]
  pub qcm_results:    Value,
  /// Stored flashcards.
  #[serde(default)]
  pub flashcards:     Value,
  /// Stored summaries.
  #[serde(default)]
  pub resumes:        Value,
  /// Imported-file records.
  #[serde(default)]
  pub imported_files: Value,
  /// Chat history.
  #[serde(default)]
  pub chat_history:   Value,
  /// When this snapshot was taken.
  #[serde(rename = "lastSync")]
  pub last_sync:      DateTime<Utc>,
}

/// Handle for the local key-value store.
///
/// Cloning is cheap: clones share the same underlying connection actor.
#[derive(Clone)]
pub struct Store {
  /// Async SQLite connection handle.
  conn: Connection,
}

impl Store {
  /// Opens an existing store or creates a new one at `path`, initializing
  /// the schema and creating parent directories as needed.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    if let Some(parent) = path.as_ref().parent() {
      if !parent.as_os_str().is_empty() {
        std::fs::create_dir_all(parent)?;
      }
    }
    let conn = Connection::open(path.as_ref()).await?;

    conn
      .call(|conn| {
        conn.execute_batch(include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/migrations/init.sql")))?;
        Ok(())
      })
      .await?;

    Ok(Self { conn })
  }

  /// Returns the default path for the store file
  /// (`<data dir>/cram/cram.db`).
  pub fn default_path() -> PathBuf {
    dirs::data_dir().unwrap_or_else(|| PathBuf::from(".")).join("cram").join("cram.db")
  }

  /// Reads and deserializes the value stored under `key`.
  pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
    let key = key.to_string();
    let value = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare_cached("SELECT value FROM store WHERE key = ?1")?;
        match stmt.query_row([key], |row| row.get::<_, String>(0)) {
          Ok(value) => Ok(Some(value)),
          Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    value.map(|v| serde_json::from_str(&v)).transpose().map_err(CramError::from)
  }

  /// Serializes and stores `value` under `key`, replacing any previous
  /// value.
  pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
    let key = key.to_string();
    let json = serde_json::to_string(value)?;
    self
      .conn
      .call(move |conn| {
        conn
          .execute("INSERT OR REPLACE INTO store (key, value) VALUES (?1, ?2)", params![
            key, json
          ])?;
        Ok(())
      })
      .await
      .map_err(CramError::from)
  }

  /// Removes the value stored under `key`.
  pub async fn remove(&self, key: &str) -> Result<()> {
    let key = key.to_string();
    self
      .conn
      .call(move |conn| {
        conn.execute("DELETE FROM store WHERE key = ?1", [key])?;
        Ok(())
      })
      .await
      .map_err(CramError::from)
  }

  /// Atomically rewrites the value under `key`.
  ///
  /// The whole read-modify-write runs inside a single connection call, so
  /// two concurrent appends to the same collection cannot lose entries.
  async fn update<T, F>(&self, key: &str, f: F) -> Result<()>
  where
    T: DeserializeOwned + Serialize + Send + 'static,
    F: FnOnce(Option<T>) -> T + Send + 'static,
  {
    let key = key.to_string();
    self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare_cached("SELECT value FROM store WHERE key = ?1")?;
        let current = match stmt.query_row([&key], |row| row.get::<_, String>(0)) {
          Ok(value) => Some(value),
          Err(rusqlite::Error::QueryReturnedNoRows) => None,
          Err(e) => return Err(e.into()),
        };
        let parsed: Option<T> = current
          .as_deref()
          .map(serde_json::from_str)
          .transpose()
          .map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))?;

        let json = serde_json::to_string(&f(parsed))
          .map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))?;
        conn
          .execute("INSERT OR REPLACE INTO store (key, value) VALUES (?1, ?2)", params![
            key, json
          ])?;
        Ok(())
      })
      .await
      .map_err(CramError::from)
  }

  /// Returns the registered subjects.
  pub async fn subjects(&self) -> Result<Vec<String>> {
    Ok(self.get(keys::SUBJECTS).await?.unwrap_or_default())
  }

  /// Registers a subject if it is not already present.
  pub async fn add_subject(&self, subject: &str) -> Result<()> {
    let subject = subject.to_string();
    self
      .update(keys::SUBJECTS, move |subjects: Option<Vec<String>>| {
        let mut subjects = subjects.unwrap_or_default();
        if !subjects.contains(&subject) {
          subjects.push(subject);
        }
        subjects
      })
      .await
  }

  /// Returns all stored flashcards.
  pub async fn flashcards(&self) -> Result<Vec<StoredFlashcard>> {
    Ok(self.get(keys::FLASHCARDS).await?.unwrap_or_default())
  }

  /// Appends flashcards to the stored collection.
  pub async fn add_flashcards(&self, cards: Vec<StoredFlashcard>) -> Result<()> {
    self
      .update(keys::FLASHCARDS, move |existing: Option<Vec<StoredFlashcard>>| {
        let mut existing = existing.unwrap_or_default();
        existing.extend(cards);
        existing
      })
      .await
  }

  /// Records the outcome of reviewing the flashcard with `id`, updating
  /// its statistics. Unknown ids are ignored.
  pub async fn record_flashcard_review(&self, id: &str, correct: bool) -> Result<()> {
    let id = id.to_string();
    let now = Utc::now();
    self
      .update(keys::FLASHCARDS, move |cards: Option<Vec<StoredFlashcard>>| {
        let mut cards = cards.unwrap_or_default();
        if let Some(card) = cards.iter_mut().find(|c| c.id == id) {
          card.studied = true;
          card.last_studied = Some(now);
          if correct {
            card.correct_answers += 1;
          } else {
            card.incorrect_answers += 1;
          }
        }
        cards
      })
      .await
  }

  /// Returns all stored quiz sets, keyed by id.
  pub async fn quiz_sets(&self) -> Result<BTreeMap<String, QuizSet>> {
    Ok(self.get(keys::QUIZ_DATA).await?.unwrap_or_default())
  }

  /// Stores a quiz set under its id.
  pub async fn insert_quiz_set(&self, set: QuizSet) -> Result<()> {
    self
      .update(keys::QUIZ_DATA, move |sets: Option<BTreeMap<String, QuizSet>>| {
        let mut sets = sets.unwrap_or_default();
        sets.insert(set.id.clone(), set);
        sets
      })
      .await
  }

  /// Appends a quiz attempt result and marks the quiz set completed.
  pub async fn record_quiz_result(&self, quiz_id: &str, result: QuizResult) -> Result<()> {
    let id = quiz_id.to_string();
    self
      .update(keys::QUIZ_RESULTS, {
        let id = id.clone();
        move |results: Option<BTreeMap<String, Vec<QuizResult>>>| {
          let mut results = results.unwrap_or_default();
          results.entry(id).or_default().push(result);
          results
        }
      })
      .await?;

    self
      .update(keys::QUIZ_DATA, move |sets: Option<BTreeMap<String, QuizSet>>| {
        let mut sets = sets.unwrap_or_default();
        if let Some(set) = sets.get_mut(&id) {
          set.completed = true;
        }
        sets
      })
      .await
  }

  /// Returns the recorded quiz attempt results, keyed by quiz id.
  pub async fn quiz_results(&self) -> Result<BTreeMap<String, Vec<QuizResult>>> {
    Ok(self.get(keys::QUIZ_RESULTS).await?.unwrap_or_default())
  }

  /// Returns all stored summaries, keyed by id.
  pub async fn summaries(&self) -> Result<BTreeMap<String, SummaryRecord>> {
    Ok(self.get(keys::SUMMARIES).await?.unwrap_or_default())
  }

  /// Stores a summary under its id.
  pub async fn insert_summary(&self, summary: SummaryRecord) -> Result<()> {
    self
      .update(keys::SUMMARIES, move |summaries: Option<BTreeMap<String, SummaryRecord>>| {
        let mut summaries = summaries.unwrap_or_default();
        summaries.insert(summary.id.clone(), summary);
        summaries
      })
      .await
  }

  /// Returns the imported-file records.
  pub async fn imported_files(&self) -> Result<Vec<ImportedFile>> {
    Ok(self.get(keys::IMPORTED_FILES).await?.unwrap_or_default())
  }

  /// Appends an imported-file record.
  pub async fn record_import(&self, file: ImportedFile) -> Result<()> {
    self
      .update(keys::IMPORTED_FILES, move |files: Option<Vec<ImportedFile>>| {
        let mut files = files.unwrap_or_default();
        files.push(file);
        files
      })
      .await
  }

  /// Appends a chat turn under `subject`.
  pub async fn append_chat(&self, subject: &str, turn: ChatTurn) -> Result<()> {
    let subject = subject.to_string();
    self
      .update(keys::CHAT_HISTORY, move |history: Option<BTreeMap<String, Vec<ChatTurn>>>| {
        let mut history = history.unwrap_or_default();
        history.entry(subject).or_default().push(turn);
        history
      })
      .await
  }

  /// Returns the chat history, keyed by subject.
  pub async fn chat_history(&self) -> Result<BTreeMap<String, Vec<ChatTurn>>> {
    Ok(self.get(keys::CHAT_HISTORY).await?.unwrap_or_default())
  }

  /// Returns the persisted API credential, if any.
  pub async fn api_key(&self) -> Result<Option<String>> { self.get(keys::API_KEY).await }

  /// Persists the API credential.
  pub async fn set_api_key(&self, api_key: &str) -> Result<()> {
    self.set(keys::API_KEY, &api_key).await
  }

  /// Appends a diagnostic entry, keeping only the most recent
  /// [`ERROR_LOG_CAP`] entries.
  pub async fn record_error(&self, context: &str, message: &str) -> Result<()> {
    let entry = ErrorLogEntry {
      timestamp: Utc::now(),
      context:   context.to_string(),
      message:   message.to_string(),
    };
    self
      .update(keys::ERROR_LOG, move |entries: Option<Vec<ErrorLogEntry>>| {
        let mut entries = entries.unwrap_or_default();
        entries.push(entry);
        let excess = entries.len().saturating_sub(ERROR_LOG_CAP);
        entries.drain(..excess);
        entries
      })
      .await
  }

  /// Returns the diagnostic error log.
  pub async fn error_log(&self) -> Result<Vec<ErrorLogEntry>> {
    Ok(self.get(keys::ERROR_LOG).await?.unwrap_or_default())
  }

  /// Returns the timestamp of the last applied cloud snapshot.
  pub async fn last_sync(&self) -> Result<Option<DateTime<Utc>>> {
    self.get(keys::LAST_SYNC).await
  }

  /// Records the timestamp of an applied cloud snapshot.
  pub async fn set_last_sync(&self, at: DateTime<Utc>) -> Result<()> {
    self.set(keys::LAST_SYNC, &at).await
  }

  /// Returns the mirrored session, if a user is signed in.
  pub async fn session(&self) -> Result<Option<Session>> { self.get(keys::SESSION).await }

  /// Mirrors the authenticated session.
  pub async fn set_session(&self, session: &Session) -> Result<()> {
    self.set(keys::SESSION, session).await
  }

  /// Clears the mirrored session, leaving study data untouched.
  pub async fn clear_session(&self) -> Result<()> { self.remove(keys::SESSION).await }

  /// Captures a snapshot of all study data, stamped with the current
  /// time. Absent sections default to their empty shapes.
  pub async fn snapshot(&self) -> Result<Snapshot> {
    /// Reads a section, falling back to `empty` when the key is absent.
    async fn section(store: &Store, key: &str, empty: Value) -> Result<Value> {
      Ok(store.get(key).await?.unwrap_or(empty))
    }

    Ok(Snapshot {
      subjects:       section(self, keys::SUBJECTS, Value::Array(Vec::new())).await?,
      qcm_data:       section(self, keys::QUIZ_DATA, Value::Object(Default::default())).await?,
      qcm_results:    section(self, keys::QUIZ_RESULTS, Value::Object(Default::default())).await?,
      flashcards:     section(self, keys::FLASHCARDS, Value::Array(Vec::new())).await?,
      resumes:        section(self, keys::SUMMARIES, Value::Object(Default::default())).await?,
      imported_files: section(self, keys::IMPORTED_FILES, Value::Array(Vec::new())).await?,
      chat_history:   section(self, keys::CHAT_HISTORY, Value::Object(Default::default())).await?,
      last_sync:      Utc::now(),
    })
  }

  /// Overwrites the study-data keys from `snapshot` and records its
  /// timestamp. Null sections (absent in the remote document) are left
  /// alone. Callers are responsible for the newest-wins check.
  pub async fn apply_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
    /// Writes a section unless the snapshot left it null.
    async fn section(store: &Store, key: &str, value: &Value) -> Result<()> {
      if value.is_null() {
        return Ok(());
      }
      store.set(key, value).await
    }

    section(self, keys::SUBJECTS, &snapshot.subjects).await?;
    section(self, keys::QUIZ_DATA, &snapshot.qcm_data).await?;
    section(self, keys::QUIZ_RESULTS, &snapshot.qcm_results).await?;
    section(self, keys::FLASHCARDS, &snapshot.flashcards).await?;
    section(self, keys::SUMMARIES, &snapshot.resumes).await?;
    section(self, keys::IMPORTED_FILES, &snapshot.imported_files).await?;
    section(self, keys::CHAT_HISTORY, &snapshot.chat_history).await?;
    self.set_last_sync(snapshot.last_sync).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  /// Helper to set up a scratch store.
  async fn setup_test_store() -> (Store, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let store = Store::open(dir.path().join("test.db")).await.unwrap();
    (store, dir)
  }

  /// Minimal flashcard fixture.
  fn card(id: &str) -> StoredFlashcard {
    StoredFlashcard {
      id:                id.to_string(),
      question:          "Qu'est-ce que l'entropie ?".to_string(),
      answer:            "Une mesure du désordre.".to_string(),
      category:          Some("definition".to_string()),
      subject:           "Physique".to_string(),
      source:            "cours.pdf".to_string(),
      generated:         true,
      studied:           false,
      correct_answers:   0,
      incorrect_answers: 0,
      last_studied:      None,
    }
  }

  #[traced_test]
  #[tokio::test]
  async fn subjects_are_deduplicated() {
    let (store, _dir) = setup_test_store().await;
    store.add_subject("Chimie").await.unwrap();
    store.add_subject("Physique").await.unwrap();
    store.add_subject("Chimie").await.unwrap();
    assert_eq!(store.subjects().await.unwrap(), vec!["Chimie", "Physique"]);
  }

  #[traced_test]
  #[tokio::test]
  async fn flashcard_review_updates_statistics() {
    let (store, _dir) = setup_test_store().await;
    store.add_flashcards(vec![card("c1"), card("c2")]).await.unwrap();

    store.record_flashcard_review("c1", true).await.unwrap();
    store.record_flashcard_review("c1", false).await.unwrap();
    store.record_flashcard_review("missing", true).await.unwrap();

    let cards = store.flashcards().await.unwrap();
    let first = cards.iter().find(|c| c.id == "c1").unwrap();
    assert!(first.studied);
    assert_eq!(first.correct_answers, 1);
    assert_eq!(first.incorrect_answers, 1);
    assert!(first.last_studied.is_some());

    let second = cards.iter().find(|c| c.id == "c2").unwrap();
    assert!(!second.studied);
  }

  #[traced_test]
  #[tokio::test]
  async fn concurrent_appends_lose_nothing() {
    let (store, _dir) = setup_test_store().await;

    let a = store.clone();
    let b = store.clone();
    let (left, right) = tokio::join!(
      a.add_flashcards((0..25).map(|i| card(&format!("a{i}"))).collect()),
      b.add_flashcards((0..25).map(|i| card(&format!("b{i}"))).collect()),
    );
    left.unwrap();
    right.unwrap();

    assert_eq!(store.flashcards().await.unwrap().len(), 50);
  }

  #[traced_test]
  #[tokio::test]
  async fn error_log_is_bounded() {
    let (store, _dir) = setup_test_store().await;
    for i in 0..60 {
      store.record_error("generation", &format!("failure {i}")).await.unwrap();
    }

    let log = store.error_log().await.unwrap();
    assert_eq!(log.len(), ERROR_LOG_CAP);
    assert_eq!(log.first().unwrap().message, "failure 10");
    assert_eq!(log.last().unwrap().message, "failure 59");
  }

  #[traced_test]
  #[tokio::test]
  async fn snapshot_round_trips_through_apply() {
    let (store, _dir) = setup_test_store().await;
    store.add_subject("Histoire").await.unwrap();
    store.add_flashcards(vec![card("c1")]).await.unwrap();

    let snapshot = store.snapshot().await.unwrap();

    let (other, _dir2) = setup_test_store().await;
    other.apply_snapshot(&snapshot).await.unwrap();

    assert_eq!(other.subjects().await.unwrap(), vec!["Histoire"]);
    assert_eq!(other.flashcards().await.unwrap().len(), 1);
    assert_eq!(other.last_sync().await.unwrap(), Some(snapshot.last_sync));
  }

  #[traced_test]
  #[tokio::test]
  async fn credential_persists_across_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.db");

    {
      let store = Store::open(&path).await.unwrap();
      store.set_api_key("sk-local").await.unwrap();
    }

    let store = Store::open(&path).await.unwrap();
    assert_eq!(store.api_key().await.unwrap(), Some("sk-local".to_string()));
  }
}
