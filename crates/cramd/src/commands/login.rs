//! Module for signing in and triggering the post-sign-in sync.

use clap::Args;
use cram::auth::{AuthEvent, SessionManager};

use super::*;

/// Arguments for [`Commands::Login`].
#[derive(Args)]
pub struct LoginArgs {
  /// Account email. Prompted for when omitted.
  #[arg(long)]
  pub email: Option<String>,

  /// Create the account instead of signing in
  #[arg(long)]
  pub register: bool,

  /// Display name for account creation
  #[arg(long, requires = "register")]
  pub name: Option<String>,

  /// OAuth identity token (skips the email/password flow)
  #[arg(long, conflicts_with_all = ["email", "register"])]
  pub oauth_token: Option<String>,

  /// OAuth provider id, e.g. google.com
  #[arg(long, default_value = "google.com", requires = "oauth_token")]
  pub oauth_provider: String,
}

/// Signs in (or up), mirrors the session, and reports the sync outcome.
pub async fn login<I: UserInteraction>(
  interaction: &I,
  config: &Config,
  store: &Store,
  args: LoginArgs,
) -> Result<()> {
  let Some(remote) = &config.remote else {
    interaction.reply(ResponseContent::Info(
      "Cloud sync is not configured; add a [remote] section to the configuration.",
    ))?;
    return Ok(());
  };

  let mut manager = SessionManager::from_config(remote, store.clone()).await?;
  let mut events = manager.subscribe();

  let session = if let Some(token) = &args.oauth_token {
    manager.sign_in_with_token(&args.oauth_provider, token).await?
  } else {
    let email = match args.email {
      Some(email) => email,
      None => interaction.prompt("Email")?,
    };
    let password = interaction.prompt_password("Password")?;

    if args.register {
      let name = match args.name {
        Some(name) => name,
        None => interaction.prompt("Display name")?,
      };
      manager.sign_up(&name, &email, &password).await?
    } else {
      manager.sign_in(&email, &password).await?
    }
  };

  interaction.reply(ResponseContent::Session(&session))?;

  // The sync inside sign-in fails soft; surface its outcome.
  let mut sync_failed = false;
  while let Ok(event) = events.try_recv() {
    if let AuthEvent::SyncFailed(message) = event {
      sync_failed = true;
      interaction
        .reply(ResponseContent::Info(&format!("Sync failed, local data untouched: {message}")))?;
    }
  }
  if !sync_failed {
    interaction.reply(ResponseContent::Success("Study data synced."))?;
  }
  Ok(())
}
