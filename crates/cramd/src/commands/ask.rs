//! Module for the chat study assistant.

use chrono::Utc;
use clap::Args;
use cram::{generator::Generator, store::ChatTurn};

use super::*;

/// Arguments for [`Commands::Ask`].
#[derive(Args)]
pub struct AskArgs {
  /// The question for the assistant
  pub question: String,

  /// Subject used as conversation context
  #[arg(long)]
  pub subject: Option<String>,
}

/// Sends a question to the assistant and records the exchange.
///
/// Follows the generation fallback contract: without a credential (or on
/// any remote failure) the reply is the deterministic offline one.
pub async fn ask<I: UserInteraction>(
  interaction: &I,
  config: &Config,
  store: &Store,
  args: AskArgs,
) -> Result<()> {
  let generator = Generator::new(config.api.clone()).with_store(store.clone());
  let reply = generator.respond(&args.question, args.subject.as_deref()).await;

  let subject = args.subject.unwrap_or_else(|| "Général".to_string());
  store
    .append_chat(&subject, ChatTurn {
      role:    "user".to_string(),
      content: args.question.clone(),
      at:      Utc::now(),
    })
    .await?;
  store
    .append_chat(&subject, ChatTurn {
      role:    "assistant".to_string(),
      content: reply.clone(),
      at:      Utc::now(),
    })
    .await?;

  interaction.reply(ResponseContent::Assistant(&reply))?;
  Ok(())
}
