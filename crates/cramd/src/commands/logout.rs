//! Module for signing out.

use super::*;

/// Clears the mirrored session. Local study data is left untouched.
pub async fn logout<I: UserInteraction>(interaction: &I, store: &Store) -> Result<()> {
  if store.session().await?.is_none() {
    interaction.reply(ResponseContent::Info("No one is signed in."))?;
    return Ok(());
  }

  store.clear_session().await?;
  interaction.reply(ResponseContent::Success("Signed out. Local study data kept."))?;
  Ok(())
}
