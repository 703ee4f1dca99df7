//! Scanning channel history for media links.

use std::sync::LazyLock;
use std::time::Instant;

use futures::StreamExt;
use regex::Regex;
use serenity::ChannelId;
use tokio::task::JoinHandle;
use tracing::instrument;

use crate::data::MediaKind;
use crate::data::MediaLibrary;
use crate::data::ScanGuard;
use crate::data::SettingsHandle;
use crate::lib::i18n::Msg;
use crate::serenity;
use crate::GlipaError;

/// Tenor pages, e.g. `https://tenor.com/view/...` or `https://tenor.com/ru/view/...`.
static TENOR_VIEW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://(?:www\.)?tenor\.com/(?:ru/)?view/[^\s>]*").expect("valid regex")
});

/// Links to image files.
static IMAGE_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)https?://[^\s]*\.(?:gif|jpg|jpeg|png|webp)[^\s>]*").expect("valid regex")
});

/// Media kind of an uploaded file, `None` if it isn't an image.
pub fn attachment_kind(content_type: Option<&str>) -> Option<MediaKind> {
    let content_type = content_type?;
    if !content_type.starts_with("image/") {
        return None;
    }
    if content_type.contains("gif") {
        Some(MediaKind::Gif)
    } else {
        Some(MediaKind::Image)
    }
}

/// Media links written in message text.
pub fn links_in_text(content: &str) -> Vec<(String, MediaKind)> {
    let tenor = TENOR_VIEW
        .find_iter(content)
        .map(|m| (m.as_str().to_string(), MediaKind::Gif));

    let images = IMAGE_LINK
        .find_iter(content)
        .map(|m| m.as_str())
        // Tenor pages are covered above and direct tenor links are never kept.
        .filter(|url| !url.contains("tenor.com"))
        .map(|url| {
            let kind = if url.to_lowercase().ends_with(".gif") {
                MediaKind::Gif
            } else {
                MediaKind::Image
            };
            (url.to_string(), kind)
        });

    tenor.chain(images).collect()
}

/// Every media link in a message: uploads first, then links in the text.
pub fn media_in_message(message: &serenity::Message) -> Vec<(String, MediaKind)> {
    let mut found: Vec<(String, MediaKind)> = message
        .attachments
        .iter()
        .filter_map(|a| attachment_kind(a.content_type.as_deref()).map(|k| (a.url.clone(), k)))
        .collect();
    if !message.content.is_empty() {
        found.extend(links_in_text(&message.content));
    }
    found
}

/// Scan `channel` in the background and report the result there.
/// `guard` keeps the channel marked as scanning until the task ends.
pub fn spawn(
    ctx: serenity::Context,
    channel: ChannelId,
    library: MediaLibrary,
    settings: SettingsHandle,
    guard: ScanGuard,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let _guard = guard;
        let started = Instant::now();
        let result = scan_history(&ctx, channel, &library).await;

        // Keep whatever was found, even if the scan failed part way.
        let result = match (result, library.save().await) {
            (Ok(count), Ok(())) => Ok(count),
            (Ok(_), Err(save_err)) => Err(GlipaError::from(save_err)),
            (Err(e), saved) => {
                if let Err(save_err) = saved {
                    tracing::error!("Could not save partial scan results: {save_err}");
                }
                Err(e)
            }
        };
        let lang = settings.language().await;

        let reply = match result {
            Ok(count) => {
                let time_ms = started.elapsed().as_millis();
                tracing::info!("Scan of {channel} found {count} new files in {time_ms}ms.");
                Msg::ScanFinished { count, time_ms }.text(lang)
            }
            Err(e) => {
                tracing::error!("Scan of {channel} failed: {e}");
                Msg::Error {
                    error: &e.to_string(),
                }
                .text(lang)
            }
        };

        if let Err(e) = channel.say(&ctx, reply).await {
            tracing::error!("Could not send scan results to {channel}: {e}");
        }
    })
}

/// Walk the whole history of `channel`, returning how many new links were stored.
#[instrument(skip(ctx, library))]
async fn scan_history(
    ctx: &serenity::Context,
    channel: ChannelId,
    library: &MediaLibrary,
) -> Result<usize, GlipaError> {
    let mut messages = channel.messages_iter(&ctx.http).boxed();
    let mut added = 0;
    let mut seen = 0usize;

    while let Some(message) = messages.next().await {
        let message = message?;
        seen += 1;

        let found = media_in_message(&message);
        if !found.is_empty() {
            added += library.add_all(&found).await;
        }

        if seen % 1000 == 0 {
            tracing::debug!("Scanned {seen} messages, {added} new files so far.");
        }
    }

    Ok(added)
}
