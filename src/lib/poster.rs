//! Background task that posts a random stored media on a schedule.
//!
//! Every cycle waits the configured interval plus a random offset, then posts with
//! the configured probability to every target channel.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use serenity::ChannelId;
use tokio::task::JoinHandle;

use crate::data::MediaLibrary;
use crate::data::Settings;
use crate::data::SettingsHandle;
use crate::data::Words;
use crate::serenity;
use crate::GlipaError;

/// What happened on a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Disabled,
    Unlucky,
    NoMedia,
    NoChannels,
    /// Posted to this many channels.
    Posted(usize),
}

/// Time until the next tick: `interval ± jitter`, never negative.
pub fn next_delay(interval_hours: u64, jitter_minutes: u64, rng: &mut impl Rng) -> Duration {
    let interval = interval_hours.saturating_mul(3600);
    let jitter = jitter_minutes.saturating_mul(60);
    // Offset drawn from [0, 2 * jitter] then shifted down by jitter.
    let offset = if jitter > 0 {
        rng.random_range(0..=jitter.saturating_mul(2))
    } else {
        0
    };
    Duration::from_secs(interval.saturating_add(offset).saturating_sub(jitter))
}

/// Roll against `probability`.
pub fn should_post(probability: f64, rng: &mut impl Rng) -> bool {
    rng.random::<f64>() < probability
}

/// A post that passed every check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostPlan {
    pub url: String,
    pub channels: Vec<ChannelId>,
}

/// Decide what a tick does. Checks run in order: posting enabled, probability,
/// stored media, target channels.
pub fn plan_post(
    settings: &Settings,
    url: Option<String>,
    rng: &mut impl Rng,
) -> Result<PostPlan, TickOutcome> {
    if !settings.posting_enabled {
        return Err(TickOutcome::Disabled);
    }
    if !should_post(settings.posting_probability, rng) {
        return Err(TickOutcome::Unlucky);
    }
    let url = url.ok_or(TickOutcome::NoMedia)?;
    if settings.target_channels.is_empty() {
        return Err(TickOutcome::NoChannels);
    }
    Ok(PostPlan {
        url,
        channels: settings.target_channels.clone(),
    })
}

/// Send to every channel in turn. A failed channel is logged and skipped.
/// Returns how many channels were posted to.
async fn deliver<F, Fut>(channels: &[ChannelId], mut send: F) -> usize
where
    F: FnMut(ChannelId) -> Fut,
    Fut: Future<Output = Result<(), GlipaError>>,
{
    let mut posted = 0;
    for &channel in channels {
        match send(channel).await {
            Ok(()) => posted += 1,
            Err(e) => tracing::error!("Could not post to {channel}: {e}"),
        }
    }
    posted
}

/// Posts media to the target channels.
#[derive(Debug, Clone)]
pub struct Poster {
    pub library: MediaLibrary,
    pub settings: SettingsHandle,
    pub words: Words,
}

impl Poster {
    /// Run the posting loop forever on its own task.
    pub fn spawn(self, ctx: serenity::Context) -> JoinHandle<()> {
        tracing::info!("Starting media poster.");
        tokio::spawn(async move { self.run(ctx).await })
    }

    async fn run(self, ctx: serenity::Context) {
        loop {
            let Settings {
                posting_interval_hours,
                posting_jitter_minutes,
                ..
            } = self.settings.snapshot().await;
            let delay = next_delay(
                posting_interval_hours,
                posting_jitter_minutes,
                &mut rand::rng(),
            );
            tracing::debug!("Next media post in {}s.", delay.as_secs());
            tokio::time::sleep(delay).await;

            match self.tick(&ctx).await {
                TickOutcome::Posted(n) => tracing::info!("Posted media to {n} channel(s)."),
                TickOutcome::Disabled => tracing::info!("Media posting disabled."),
                TickOutcome::Unlucky => {
                    tracing::info!("Media posting skipped (probability check failed).")
                }
                TickOutcome::NoMedia => tracing::warn!("No media available for posting."),
                TickOutcome::NoChannels => tracing::warn!("No target channels configured."),
            }
        }
    }

    /// One scheduled post.
    async fn tick(&self, ctx: &serenity::Context) -> TickOutcome {
        let settings = self.settings.snapshot().await;
        let url = self.library.random().await;

        let plan = match plan_post(&settings, url, &mut rand::rng()) {
            Ok(plan) => plan,
            Err(outcome) => return outcome,
        };

        let url = plan.url.as_str();
        let posted = deliver(&plan.channels, move |channel| self.post_to(ctx, channel, url)).await;
        TickOutcome::Posted(posted)
    }

    /// Send a generated message followed by `url`, as plain messages so discord
    /// shows the media without an embed border.
    async fn post_to(
        &self,
        ctx: &serenity::Context,
        channel_id: ChannelId,
        url: &str,
    ) -> Result<(), GlipaError> {
        let channel = channel_id
            .to_channel(ctx)
            .await?
            .guild()
            .ok_or_else(|| GlipaError::UnusableChannel {
                channel: channel_id,
                reason: "not a server channel".to_string(),
            })?;

        let me = ctx.cache.current_user().id;
        let permissions = channel.permissions_for_user(ctx, me)?;
        if !permissions.send_messages() {
            return Err(GlipaError::UnusableChannel {
                channel: channel_id,
                reason: "missing permission to send messages".to_string(),
            });
        }

        channel.say(ctx, self.words.message()).await?;
        channel.say(ctx, url).await?;

        let guild = channel
            .guild_id
            .name(ctx)
            .unwrap_or("<MISSING GUILD>".to_string());
        tracing::info!("Posted media to {guild}#{}", channel.name);
        Ok(())
    }
}
