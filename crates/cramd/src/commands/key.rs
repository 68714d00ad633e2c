//! Module for persisting the generation API credential.

use clap::Args;

use super::*;

/// Arguments for [`Commands::Key`].
#[derive(Args)]
pub struct KeyArgs {
  /// The API key. Prompted for (without echo) when omitted.
  pub api_key: Option<String>,
}

/// Stores the API credential in the local store.
pub async fn key<I: UserInteraction>(interaction: &I, store: &Store, args: KeyArgs) -> Result<()> {
  let api_key = match args.api_key {
    Some(api_key) => api_key,
    None => interaction.prompt_password("API key")?,
  };

  if api_key.trim().is_empty() {
    interaction.reply(ResponseContent::Info("Empty key; nothing stored."))?;
    return Ok(());
  }

  store.set_api_key(api_key.trim()).await?;
  interaction.reply(ResponseContent::Success("API credential stored."))?;
  Ok(())
}
