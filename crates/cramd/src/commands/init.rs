//! Module for setting up a cram workspace.

use clap::Args;

use super::*;

/// Arguments for [`Commands::Init`].
#[derive(Args)]
pub struct InitArgs {
  /// Overwrite an existing configuration without asking
  #[arg(long)]
  pub force: bool,
}

/// Writes the default configuration and creates the local store.
pub async fn init<I: UserInteraction>(
  interaction: &I,
  config_path: &PathBuf,
  store_path: &PathBuf,
  args: InitArgs,
) -> Result<()> {
  if config_path.exists()
    && !args.force
    && !interaction.confirm(&format!(
      "A configuration already exists at {config_path:?}. Overwrite it?"
    ))?
  {
    interaction.reply(ResponseContent::Info("Keeping the existing configuration."))?;
    return Ok(());
  }

  let config = Config::default();
  config.write(config_path).map_err(CramdError::from)?;

  // Opening the store creates the file and its schema.
  Store::open(store_path).await?;

  interaction.reply(ResponseContent::Success(&format!(
    "Initialized cram successfully\nConfig path: {config_path:?}\nStore path: {store_path:?}"
  )))?;
  Ok(())
}
