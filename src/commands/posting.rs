//! Implements the `/posting` command.
//!
//! Tunes the background poster: on/off, chance per cycle, interval and jitter.

use tracing::instrument;

use crate::data::MAX_INTERVAL_HOURS;
use crate::error::UserError;
use crate::lib::i18n::Msg;
use crate::log::ephemeral_reply;
use crate::Context;
use crate::GlipaError;

/// Configure automatic posting
#[instrument(skip(ctx))]
#[poise::command(
    slash_command,
    required_permissions = "ADMINISTRATOR",
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn posting(
    ctx: Context<'_>,
    #[description = "Turn automatic posting on or off"] enabled: Option<bool>,
    #[description = "Chance to post each cycle, from 0 to 1"]
    #[min = 0]
    #[max = 1]
    probability: Option<f64>,
    #[description = "Hours between posts"]
    #[min = 1]
    #[max = 168]
    interval_hours: Option<u64>,
    #[description = "Max random offset in minutes"]
    #[max = 720]
    jitter_minutes: Option<u64>,
) -> Result<(), GlipaError> {
    validate(probability, interval_hours)?;

    let settings = ctx
        .data()
        .settings
        .update(|s| {
            if let Some(enabled) = enabled {
                s.posting_enabled = enabled;
            }
            if let Some(probability) = probability {
                s.posting_probability = probability;
            }
            if let Some(hours) = interval_hours {
                s.posting_interval_hours = hours;
            }
            if let Some(minutes) = jitter_minutes {
                s.posting_jitter_minutes = minutes;
            }
        })
        .await?;

    let summary = Msg::PostingUpdated {
        enabled: settings.posting_enabled,
        probability: settings.posting_probability,
        interval_hours: settings.posting_interval_hours,
        jitter_minutes: settings.posting_jitter_minutes,
    };
    ephemeral_reply(&ctx, summary.text(settings.language)).await;
    Ok(())
}

/// Reject values discord's min/max can't catch.
fn validate(probability: Option<f64>, interval_hours: Option<u64>) -> Result<(), UserError> {
    if let Some(p) = probability {
        if !(0.0..=1.0).contains(&p) {
            return Err(UserError::InvalidProbability(p));
        }
    }
    if let Some(hours) = interval_hours {
        if !(1..=MAX_INTERVAL_HOURS).contains(&hours) {
            return Err(UserError::InvalidInterval);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_values() {
        assert!(validate(None, None).is_ok());
        assert!(validate(Some(0.0), Some(1)).is_ok());
        assert!(validate(Some(1.0), Some(24)).is_ok());
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(matches!(
            validate(Some(1.5), None),
            Err(UserError::InvalidProbability(_))
        ));
        assert!(matches!(
            validate(Some(f64::NAN), None),
            Err(UserError::InvalidProbability(_))
        ));
        assert!(matches!(
            validate(None, Some(0)),
            Err(UserError::InvalidInterval)
        ));
        assert!(matches!(
            validate(None, Some(MAX_INTERVAL_HOURS + 1)),
            Err(UserError::InvalidInterval)
        ));
    }
}
