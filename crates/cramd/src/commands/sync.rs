//! Module for the manual cloud sync.

use cram::auth::SessionManager;

use super::*;

/// Pushes the local snapshot and pulls the remote one (newest wins).
///
/// Failures are surfaced as notifications, never as partial overwrites:
/// the library leaves local data untouched when anything remote breaks.
pub async fn sync<I: UserInteraction>(
  interaction: &I,
  config: &Config,
  store: &Store,
) -> Result<()> {
  let Some(remote) = &config.remote else {
    interaction.reply(ResponseContent::Info(
      "Cloud sync is not configured; add a [remote] section to the configuration.",
    ))?;
    return Ok(());
  };

  let manager = SessionManager::from_config(remote, store.clone()).await?;
  if manager.current_session().is_none() {
    interaction.reply(ResponseContent::Info("Not signed in. Run `cram login` first."))?;
    return Ok(());
  }

  match manager.sync().await {
    Ok(()) => interaction.reply(ResponseContent::Success("Study data synced."))?,
    Err(e) => interaction.reply(ResponseContent::Error(CramdError::from(e)))?,
  }
  Ok(())
}
