//! Identity/session adapter and cloud snapshot sync.
//!
//! Sign-in, sign-up, and sign-out are delegated to an external identity
//! provider behind the [`AuthProvider`] trait; the resulting [`Session`]
//! is mirrored into the local store. A successful sign-in triggers a
//! two-way sync against a user-keyed document store ([`SnapshotStore`]):
//! the full local snapshot is pushed, then the remote snapshot is pulled
//! and applied **only** when its timestamp is strictly newer than the
//! locally recorded one. Sync never downgrades local data.
//!
//! Everything remote here fails soft: a sync error is reported through
//! the event channel and the diagnostic log, and local state is left
//! exactly as it was (no partial overwrite). Sign-out clears the session
//! and touches nothing else.
//!
//! State changes are surfaced as [`AuthEvent`] messages on an mpsc
//! channel rather than fire-and-forget callbacks, so consumers observe
//! them in a well-defined order.

use std::time::Duration;

use tokio::sync::mpsc;
use url::Url;

use crate::{
  config::RemoteConfig,
  store::{Snapshot, Store},
};

use super::*;

/// Timeout for identity and snapshot calls, in seconds.
const REMOTE_TIMEOUT_SECS: u64 = 30;

/// The current authenticated identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
  /// Opaque user identifier from the provider.
  pub id:         String,
  /// Display name (falls back to the email).
  pub name:       String,
  /// Account email.
  pub email:      String,
  /// Avatar URL, when the provider supplies one.
  #[serde(default)]
  pub photo_url:  Option<String>,
  /// When this session was established.
  pub created_at: DateTime<Utc>,
}

/// Auth-state changes, delivered in order on the event channel.
#[derive(Debug, Clone)]
pub enum AuthEvent {
  /// A user signed in.
  SignedIn(Session),
  /// The user signed out.
  SignedOut,
  /// A sync attempt failed; local data is untouched.
  SyncFailed(String),
}

/// External identity provider operations.
#[async_trait]
pub trait AuthProvider: Send + Sync {
  /// Signs in with email and password.
  async fn sign_in(&self, email: &str, password: &str) -> Result<Session>;

  /// Creates an account with a display name, email, and password.
  async fn sign_up(&self, name: &str, email: &str, password: &str) -> Result<Session>;

  /// Signs in with an OAuth identity token from `provider_id`
  /// (e.g. `google.com`).
  async fn sign_in_with_token(&self, provider_id: &str, id_token: &str) -> Result<Session>;
}

/// External user-keyed snapshot document store.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
  /// Fetches the stored snapshot for `user_id`, if any.
  async fn fetch(&self, user_id: &str) -> Result<Option<Snapshot>>;

  /// Stores `snapshot` under `user_id`, replacing any previous document.
  async fn store(&self, user_id: &str, snapshot: &Snapshot) -> Result<()>;
}

/// Identity provider backed by an identity-toolkit-style REST API.
pub struct HttpAuthProvider {
  /// HTTP client.
  http:     reqwest::Client,
  /// Base URL of the auth API.
  base_url: Url,
  /// API key appended to every call.
  api_key:  String,
}

impl HttpAuthProvider {
  /// Creates a provider from the remote configuration.
  pub fn new(remote: &RemoteConfig) -> Result<Self> {
    let base_url = Url::parse(&remote.auth_url)
      .map_err(|e| CramError::Config(format!("invalid auth URL: {e}")))?;
    Ok(Self { http: reqwest::Client::new(), base_url, api_key: remote.api_key.clone() })
  }

  /// Builds the endpoint URL for an `accounts:...` action.
  ///
  /// Built by string concatenation: the `accounts:` prefix would read as
  /// a URL scheme under `Url::join`.
  fn endpoint(&self, action: &str) -> Result<Url> {
    let mut url =
      Url::parse(&format!("{}/{action}", self.base_url.as_str().trim_end_matches('/')))
        .map_err(|e| CramError::Config(format!("invalid auth endpoint: {e}")))?;
    url.query_pairs_mut().append_pair("key", &self.api_key);
    Ok(url)
  }

  /// POSTs `body` to `action` and builds a [`Session`] from the reply.
  async fn call(&self, action: &str, body: Value) -> Result<Session> {
    let response = self
      .http
      .post(self.endpoint(action)?)
      .timeout(Duration::from_secs(REMOTE_TIMEOUT_SECS))
      .json(&body)
      .send()
      .await?;

    let status = response.status();
    if !status.is_success() {
      let body: Value = response.json().await.unwrap_or(Value::Null);
      let message =
        body.pointer("/error/message").and_then(Value::as_str).unwrap_or("unknown error");
      return Err(CramError::Auth(format!("{status} - {message}")));
    }

    let reply: Value = response.json().await?;
    let id = reply
      .get("localId")
      .and_then(Value::as_str)
      .ok_or_else(|| CramError::Auth("reply held no user id".to_string()))?
      .to_string();
    let email =
      reply.get("email").and_then(Value::as_str).unwrap_or_default().to_string();
    let name = reply
      .get("displayName")
      .and_then(Value::as_str)
      .filter(|name| !name.is_empty())
      .unwrap_or(&email)
      .to_string();
    let photo_url =
      reply.get("photoUrl").and_then(Value::as_str).map(str::to_string);

    Ok(Session { id, name, email, photo_url, created_at: Utc::now() })
  }
}

#[async_trait]
impl AuthProvider for HttpAuthProvider {
  async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
    self
      .call(
        "accounts:signInWithPassword",
        serde_json::json!({ "email": email, "password": password, "returnSecureToken": true }),
      )
      .await
  }

  async fn sign_up(&self, name: &str, email: &str, password: &str) -> Result<Session> {
    let mut session = self
      .call(
        "accounts:signUp",
        serde_json::json!({
          "email": email,
          "password": password,
          "displayName": name,
          "returnSecureToken": true,
        }),
      )
      .await?;
    // Some providers echo the display name only on later calls.
    if session.name == session.email && !name.is_empty() {
      session.name = name.to_string();
    }
    Ok(session)
  }

  async fn sign_in_with_token(&self, provider_id: &str, id_token: &str) -> Result<Session> {
    self
      .call(
        "accounts:signInWithIdp",
        serde_json::json!({
          "postBody": format!("id_token={id_token}&providerId={provider_id}"),
          "requestUri": "http://localhost",
          "returnSecureToken": true,
        }),
      )
      .await
  }
}

/// Snapshot store backed by a REST document API
/// (`GET`/`PUT {base}/users/{id}`).
pub struct HttpSnapshotStore {
  /// HTTP client.
  http:     reqwest::Client,
  /// Base URL of the document API.
  base_url: Url,
}

impl HttpSnapshotStore {
  /// Creates a snapshot store from the remote configuration.
  pub fn new(remote: &RemoteConfig) -> Result<Self> {
    let base_url = Url::parse(&remote.snapshot_url)
      .map_err(|e| CramError::Config(format!("invalid snapshot URL: {e}")))?;
    Ok(Self { http: reqwest::Client::new(), base_url })
  }

  /// Builds the document URL for `user_id`.
  fn document(&self, user_id: &str) -> Result<Url> {
    Url::parse(&format!("{}/users/{user_id}", self.base_url.as_str().trim_end_matches('/')))
      .map_err(|e| CramError::Config(format!("invalid snapshot endpoint: {e}")))
  }
}

#[async_trait]
impl SnapshotStore for HttpSnapshotStore {
  async fn fetch(&self, user_id: &str) -> Result<Option<Snapshot>> {
    let response = self
      .http
      .get(self.document(user_id)?)
      .timeout(Duration::from_secs(REMOTE_TIMEOUT_SECS))
      .send()
      .await?;

    if response.status() == reqwest::StatusCode::NOT_FOUND {
      return Ok(None);
    }
    if !response.status().is_success() {
      return Err(CramError::Api(format!("snapshot fetch failed: {}", response.status())));
    }
    Ok(Some(response.json().await?))
  }

  async fn store(&self, user_id: &str, snapshot: &Snapshot) -> Result<()> {
    let response = self
      .http
      .put(self.document(user_id)?)
      .timeout(Duration::from_secs(REMOTE_TIMEOUT_SECS))
      .json(snapshot)
      .send()
      .await?;

    if !response.status().is_success() {
      return Err(CramError::Api(format!("snapshot push failed: {}", response.status())));
    }
    Ok(())
  }
}

/// Owns the current session and drives sign-in/out and sync.
pub struct SessionManager {
  /// Local store, both for the session mirror and the synced data.
  store:     Store,
  /// External identity provider.
  provider:  Box<dyn AuthProvider>,
  /// External snapshot document store.
  snapshots: Box<dyn SnapshotStore>,
  /// The signed-in session, if any.
  current:   Option<Session>,
  /// Event channel sender, once a consumer subscribed.
  events:    Option<mpsc::UnboundedSender<AuthEvent>>,
}

impl SessionManager {
  /// Creates a manager, restoring any session mirrored in the store.
  pub async fn new(
    store: Store,
    provider: Box<dyn AuthProvider>,
    snapshots: Box<dyn SnapshotStore>,
  ) -> Result<Self> {
    let current = store.session().await?;
    Ok(Self { store, provider, snapshots, current, events: None })
  }

  /// Convenience constructor wiring the HTTP provider and snapshot store
  /// from the remote configuration.
  pub async fn from_config(remote: &RemoteConfig, store: Store) -> Result<Self> {
    Self::new(
      store,
      Box::new(HttpAuthProvider::new(remote)?),
      Box::new(HttpSnapshotStore::new(remote)?),
    )
    .await
  }

  /// Returns a receiver for auth-state events. Replaces any previous
  /// subscription.
  pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<AuthEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    self.events = Some(tx);
    rx
  }

  /// Returns the signed-in session, if any.
  pub fn current_session(&self) -> Option<&Session> { self.current.as_ref() }

  /// Signs in with email and password, mirrors the session, and triggers
  /// a (fail-soft) sync.
  pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<Session> {
    let session = self.provider.sign_in(email, password).await?;
    self.establish(session).await
  }

  /// Creates an account, mirrors the session, and triggers a sync.
  pub async fn sign_up(&mut self, name: &str, email: &str, password: &str) -> Result<Session> {
    let session = self.provider.sign_up(name, email, password).await?;
    self.establish(session).await
  }

  /// Signs in with an OAuth identity token, mirrors the session, and
  /// triggers a sync.
  pub async fn sign_in_with_token(
    &mut self,
    provider_id: &str,
    id_token: &str,
  ) -> Result<Session> {
    let session = self.provider.sign_in_with_token(provider_id, id_token).await?;
    self.establish(session).await
  }

  /// Signs out: clears the mirrored session and leaves all study data
  /// untouched.
  pub async fn sign_out(&mut self) -> Result<()> {
    self.store.clear_session().await?;
    self.current = None;
    self.emit(AuthEvent::SignedOut);
    Ok(())
  }

  /// Two-way sync with the cloud snapshot store. No-op when signed out.
  ///
  /// Pushes the full local snapshot, then pulls the remote one and
  /// applies it only when its timestamp is strictly newer than the
  /// locally recorded sync time.
  pub async fn sync(&self) -> Result<()> {
    let Some(session) = &self.current else {
      debug!("sync skipped: no session");
      return Ok(());
    };

    let local = self.store.snapshot().await?;
    self.snapshots.store(&session.id, &local).await?;

    if let Some(cloud) = self.snapshots.fetch(&session.id).await? {
      let recorded = self.store.last_sync().await?;
      if recorded.map_or(true, |at| cloud.last_sync > at) {
        debug!("applying cloud snapshot from {}", cloud.last_sync);
        self.store.apply_snapshot(&cloud).await?;
      } else {
        trace!("cloud snapshot is not newer; keeping local data");
      }
    }
    Ok(())
  }

  /// Mirrors a fresh session, announces it, and runs the fail-soft sync.
  async fn establish(&mut self, session: Session) -> Result<Session> {
    self.store.set_session(&session).await?;
    self.current = Some(session.clone());
    self.emit(AuthEvent::SignedIn(session.clone()));

    if let Err(e) = self.sync().await {
      warn!("post-sign-in sync failed: {e}");
      if let Err(log_err) = self.store.record_error("sync", &e.to_string()).await {
        warn!("could not record diagnostic entry: {log_err}");
      }
      self.emit(AuthEvent::SyncFailed(e.to_string()));
    }
    Ok(session)
  }

  /// Sends an event if anyone is listening.
  fn emit(&self, event: AuthEvent) {
    if let Some(events) = &self.events {
      let _ = events.send(event);
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use chrono::TimeZone;

  use super::*;

  /// Provider that accepts any credentials.
  struct StaticAuth;

  #[async_trait]
  impl AuthProvider for StaticAuth {
    async fn sign_in(&self, email: &str, _password: &str) -> Result<Session> {
      Ok(Session {
        id:         "user-1".to_string(),
        name:       email.to_string(),
        email:      email.to_string(),
        photo_url:  None,
        created_at: Utc::now(),
      })
    }

    async fn sign_up(&self, name: &str, email: &str, password: &str) -> Result<Session> {
      let mut session = self.sign_in(email, password).await?;
      session.name = name.to_string();
      Ok(session)
    }

    async fn sign_in_with_token(&self, _provider_id: &str, _id_token: &str) -> Result<Session> {
      self.sign_in("oauth@example.com", "").await
    }
  }

  /// In-memory snapshot store that serves a fixed document and records
  /// pushes, so staleness scenarios are easy to stage.
  #[derive(Clone, Default)]
  struct MemorySnapshots {
    served: Arc<Mutex<Option<Snapshot>>>,
    pushed: Arc<Mutex<Vec<Snapshot>>>,
  }

  #[async_trait]
  impl SnapshotStore for MemorySnapshots {
    async fn fetch(&self, _user_id: &str) -> Result<Option<Snapshot>> {
      Ok(self.served.lock().unwrap().clone())
    }

    async fn store(&self, _user_id: &str, snapshot: &Snapshot) -> Result<()> {
      self.pushed.lock().unwrap().push(snapshot.clone());
      Ok(())
    }
  }

  /// Sets up a signed-in manager over a scratch store.
  async fn setup(
    snapshots: MemorySnapshots,
  ) -> (SessionManager, Store, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let store = Store::open(dir.path().join("test.db")).await.unwrap();
    let manager =
      SessionManager::new(store.clone(), Box::new(StaticAuth), Box::new(snapshots))
        .await
        .unwrap();
    (manager, store, dir)
  }

  /// Snapshot fixture holding one marker subject.
  fn snapshot_with(subject: &str, last_sync: DateTime<Utc>) -> Snapshot {
    Snapshot {
      subjects: serde_json::json!([subject]),
      qcm_data: Value::Null,
      qcm_results: Value::Null,
      flashcards: Value::Null,
      resumes: Value::Null,
      imported_files: Value::Null,
      chat_history: Value::Null,
      last_sync,
    }
  }

  #[traced_test]
  #[tokio::test]
  async fn sign_in_mirrors_session_and_emits_events() {
    let (mut manager, store, _dir) = setup(MemorySnapshots::default()).await;
    let mut events = manager.subscribe();

    manager.sign_in("etu@example.com", "secret").await.unwrap();
    assert_eq!(manager.current_session().unwrap().email, "etu@example.com");
    assert_eq!(store.session().await.unwrap().unwrap().id, "user-1");
    assert!(matches!(events.try_recv().unwrap(), AuthEvent::SignedIn(_)));

    manager.sign_out().await.unwrap();
    assert!(manager.current_session().is_none());
    assert!(store.session().await.unwrap().is_none());
    assert!(matches!(events.try_recv().unwrap(), AuthEvent::SignedOut));
  }

  #[traced_test]
  #[tokio::test]
  async fn sync_never_downgrades_local_data() {
    let snapshots = MemorySnapshots::default();
    let stale = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    *snapshots.served.lock().unwrap() = Some(snapshot_with("Vieille matière", stale));

    let (mut manager, store, _dir) = setup(snapshots.clone()).await;
    store.add_subject("Matière locale").await.unwrap();
    store.set_last_sync(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()).await.unwrap();

    manager.sign_in("etu@example.com", "secret").await.unwrap();

    // The push went out, but the stale cloud snapshot was not applied.
    assert_eq!(snapshots.pushed.lock().unwrap().len(), 1);
    assert_eq!(store.subjects().await.unwrap(), vec!["Matière locale"]);
    assert_eq!(
      store.last_sync().await.unwrap(),
      Some(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap())
    );
  }

  #[traced_test]
  #[tokio::test]
  async fn newer_cloud_snapshot_overwrites_local_keys() {
    let snapshots = MemorySnapshots::default();
    let (mut manager, store, _dir) = setup(snapshots.clone()).await;

    store.add_subject("Matière locale").await.unwrap();
    store.set_last_sync(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()).await.unwrap();

    let fresh = Utc::now() + chrono::Duration::hours(1);
    *snapshots.served.lock().unwrap() = Some(snapshot_with("Matière cloud", fresh));

    manager.sign_in("etu@example.com", "secret").await.unwrap();

    assert_eq!(store.subjects().await.unwrap(), vec!["Matière cloud"]);
    assert_eq!(store.last_sync().await.unwrap(), Some(fresh));
  }

  #[traced_test]
  #[tokio::test]
  async fn session_survives_a_manager_restart() {
    let dir = tempdir().unwrap();
    let store = Store::open(dir.path().join("test.db")).await.unwrap();

    {
      let mut manager = SessionManager::new(
        store.clone(),
        Box::new(StaticAuth),
        Box::new(MemorySnapshots::default()),
      )
      .await
      .unwrap();
      manager.sign_in("etu@example.com", "secret").await.unwrap();
    }

    let manager = SessionManager::new(
      store.clone(),
      Box::new(StaticAuth),
      Box::new(MemorySnapshots::default()),
    )
    .await
    .unwrap();
    assert_eq!(manager.current_session().unwrap().email, "etu@example.com");
  }
}
