//! Module for removing the local store.

use super::*;

/// Deletes the store file after confirmation.
pub async fn clean<I: UserInteraction>(interaction: &I, store_path: &PathBuf) -> Result<()> {
  if !store_path.exists() {
    interaction.reply(ResponseContent::Info("No local store to remove."))?;
    return Ok(());
  }

  if !interaction.confirm(&format!("Remove the local store at {store_path:?}?"))? {
    interaction.reply(ResponseContent::Info("Keeping the local store."))?;
    return Ok(());
  }

  std::fs::remove_file(store_path)?;
  interaction.reply(ResponseContent::Success("Local store removed."))?;
  Ok(())
}
