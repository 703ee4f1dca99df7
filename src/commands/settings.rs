//! Implements the `/settings` command.

use tracing::instrument;

use crate::lib::i18n::Language;
use crate::lib::i18n::Msg;
use crate::log::ephemeral_reply;
use crate::Context;
use crate::GlipaError;

/// Configure bot settings
#[instrument(skip(ctx))]
#[poise::command(
    slash_command,
    required_permissions = "ADMINISTRATOR",
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn settings(
    ctx: Context<'_>,
    #[description = "Choose language / Выберите язык"] language: Language,
) -> Result<(), GlipaError> {
    ctx.data()
        .settings
        .update(|s| s.language = language)
        .await?;

    tracing::info!("Language changed to {language:?}");
    ephemeral_reply(&ctx, Msg::LanguageSet.text(language)).await;
    Ok(())
}
