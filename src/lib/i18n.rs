//! User facing text in every supported language.

use serde::Deserialize;
use serde::Serialize;

/// Languages the bot can answer in.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, poise::ChoiceParameter,
)]
pub enum Language {
    #[default]
    #[name = "English"]
    #[serde(rename = "en")]
    En,
    #[name = "Русский"]
    #[serde(rename = "ru")]
    Ru,
}

/// A message shown to users.
#[derive(Debug, Clone)]
pub enum Msg<'a> {
    NoMedia,
    MediaStory { count: usize },
    NeedAdmin,
    NoMediaRandom,
    Cleaned { count: usize },
    NoTenor,
    Error { error: &'a str },
    LanguageSet,
    ChannelsSet { channels: &'a str },
    NoChannels,
    ScanStarted,
    ScanFinished { count: usize, time_ms: u128 },
    ScanInProgress,
    PostingUpdated {
        enabled: bool,
        probability: f64,
        interval_hours: u64,
        jitter_minutes: u64,
    },
    InvalidProbability,
    InvalidInterval,
}

impl Msg<'_> {
    /// Render this message in `lang`.
    pub fn text(&self, lang: Language) -> String {
        match lang {
            Language::En => self.english(),
            Language::Ru => self.russian(),
        }
    }

    fn english(&self) -> String {
        match self {
            Msg::NoMedia => "No media stored yet. Use `/scan` to start collecting.".into(),
            Msg::MediaStory { count } => format!("📚 Media Story - {count} items found"),
            Msg::NeedAdmin => {
                "❌ You need administrator permissions to use this command.".into()
            }
            Msg::NoMediaRandom => "No media in storage. Use `/scan` to collect some!".into(),
            Msg::Cleaned { count } => {
                format!("🧹 Cleaned {count} media.tenor.com links from storage")
            }
            Msg::NoTenor => "No media.tenor.com links found in storage".into(),
            Msg::Error { error } => format!("Error: {error}"),
            Msg::LanguageSet => "✅ Language set to English".into(),
            Msg::ChannelsSet { channels } => format!("✅ Target channels updated: {channels}"),
            Msg::NoChannels => "❌ You must select at least one channel".into(),
            Msg::ScanStarted => {
                "🔍 Scan started! This may take a while. I'll send results here when done."
                    .into()
            }
            Msg::ScanFinished { count, time_ms } => {
                format!("✅ Scan finished! Found {count} new files in {time_ms}ms")
            }
            Msg::ScanInProgress => "⏳ A scan is already running in this channel.".into(),
            Msg::PostingUpdated {
                enabled,
                probability,
                interval_hours,
                jitter_minutes,
            } => {
                let state = if *enabled { "enabled" } else { "disabled" };
                format!(
                    "✅ Posting {state}: chance {:.0}%, every {interval_hours}h ± {jitter_minutes}m",
                    probability * 100.0
                )
            }
            Msg::InvalidProbability => "❌ Probability must be between 0 and 1".into(),
            Msg::InvalidInterval => "❌ Interval must be between 1 and 168 hours".into(),
        }
    }

    fn russian(&self) -> String {
        match self {
            Msg::NoMedia => "Медиа не найдено. Используйте `/scan` чтобы начать сбор.".into(),
            Msg::MediaStory { count } => format!("📚 История медиа - {count} элементов найдено"),
            Msg::NeedAdmin => {
                "❌ Вам нужны права администратора для использования этой команды.".into()
            }
            Msg::NoMediaRandom => {
                "Нет медиа в хранилище. Используйте `/scan` чтобы собрать медиа!".into()
            }
            Msg::Cleaned { count } => {
                format!("🧹 Удалено {count} ссылок media.tenor.com из хранилища")
            }
            Msg::NoTenor => "Ссылки media.tenor.com не найдены в хранилище".into(),
            Msg::Error { error } => format!("Ошибка: {error}"),
            Msg::LanguageSet => "✅ Язык установлен на Русский".into(),
            Msg::ChannelsSet { channels } => format!("✅ Целевые каналы обновлены: {channels}"),
            Msg::NoChannels => "❌ Вы должны выбрать хотя бы один канал".into(),
            Msg::ScanStarted => "🔍 Сканирование началось! Это может занять некоторое время. \
                                 Я отправлю результаты сюда, когда закончу."
                .into(),
            Msg::ScanFinished { count, time_ms } => {
                format!("✅ Сканирование завершено! Найдено {count} новых файлов за {time_ms}мс")
            }
            Msg::ScanInProgress => "⏳ Сканирование в этом канале уже идёт.".into(),
            Msg::PostingUpdated {
                enabled,
                probability,
                interval_hours,
                jitter_minutes,
            } => {
                let state = if *enabled { "включена" } else { "выключена" };
                format!(
                    "✅ Публикация {state}: шанс {:.0}%, каждые {interval_hours}ч ± {jitter_minutes}м",
                    probability * 100.0
                )
            }
            Msg::InvalidProbability => "❌ Вероятность должна быть от 0 до 1".into(),
            Msg::InvalidInterval => "❌ Интервал должен быть от 1 до 168 часов".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_serializes_as_code() {
        assert_eq!(serde_json::to_string(&Language::Ru).unwrap(), "\"ru\"");
        let lang: Language = serde_json::from_str("\"en\"").unwrap();
        assert_eq!(lang, Language::En);
    }

    #[test]
    fn language_set_is_in_new_language() {
        assert!(Msg::LanguageSet.text(Language::En).contains("English"));
        assert!(Msg::LanguageSet.text(Language::Ru).contains("Русский"));
    }

    #[test]
    fn arguments_are_formatted() {
        let msg = Msg::ScanFinished {
            count: 12,
            time_ms: 345,
        };
        assert_eq!(
            msg.text(Language::En),
            "✅ Scan finished! Found 12 new files in 345ms"
        );
        assert!(msg.text(Language::Ru).contains("12"));
        assert!(msg.text(Language::Ru).contains("345мс"));
    }

    #[test]
    fn posting_summary_shows_percent() {
        let msg = Msg::PostingUpdated {
            enabled: true,
            probability: 0.6,
            interval_hours: 2,
            jitter_minutes: 10,
        };
        assert_eq!(
            msg.text(Language::En),
            "✅ Posting enabled: chance 60%, every 2h ± 10m"
        );
    }
}
