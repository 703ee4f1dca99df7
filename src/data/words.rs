//! Message generation from `word_base.json`.

use std::path::Path;
use std::path::PathBuf;

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::Deserialize;

/// File holding the [WordBase].
pub const WORD_BASE_FILE: &str = "word_base.json";

/// Sent whenever a message can't be generated.
pub const FALLBACK_MESSAGE: &str = "Check out this awesome content!";

const DEFAULT_GREETING: &str = "Check this out!";
const DEFAULT_ADJECTIVE: &str = "amazing";

/// Templates and words used to build a message.
#[derive(Debug, Default, Deserialize)]
pub struct WordBase {
    #[serde(default)]
    templates: Vec<String>,
    greetings: Option<Vec<String>>,
    descriptive_words: Option<Vec<String>>,
}

impl WordBase {
    /// Fill a random template, `None` if any list is empty or the template is broken.
    pub fn generate(&self, rng: &mut impl Rng) -> Option<String> {
        let template = self.templates.choose(rng)?;
        let greeting = pick(&self.greetings, DEFAULT_GREETING, rng)?;
        let adjective = pick(&self.descriptive_words, DEFAULT_ADJECTIVE, rng)?;
        fill_template(template, greeting, adjective)
    }
}

/// Random word from `words`, or `default` when the list isn't present at all.
fn pick<'a>(
    words: &'a Option<Vec<String>>,
    default: &'a str,
    rng: &mut impl Rng,
) -> Option<&'a str> {
    match words {
        Some(words) => words.choose(rng).map(String::as_str),
        None => Some(default),
    }
}

/// Replace `{greeting}` and `{adjective}` in `template`.
/// `{{` and `}}` are literal braces. Unknown placeholders or stray braces give `None`.
fn fill_template(template: &str, greeting: &str, adjective: &str) -> Option<String> {
    let mut out = String::with_capacity(template.len() + greeting.len() + adjective.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next()? {
                        '}' => break,
                        c => name.push(c),
                    }
                }
                match name.as_str() {
                    "greeting" => out.push_str(greeting),
                    "adjective" => out.push_str(adjective),
                    _ => return None,
                }
            }
            '}' => return None,
            c => out.push(c),
        }
    }
    Some(out)
}

/// Generates messages from the word base file, re-reading it every time so edits
/// apply without a restart.
#[derive(Debug, Clone)]
pub struct Words {
    path: PathBuf,
}

impl Words {
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(WORD_BASE_FILE),
        }
    }

    /// A generated message, or [FALLBACK_MESSAGE].
    pub fn message(&self) -> String {
        let Some(base) = self.load() else {
            return FALLBACK_MESSAGE.to_string();
        };
        base.generate(&mut rand::rng())
            .unwrap_or_else(|| FALLBACK_MESSAGE.to_string())
    }

    fn load(&self) -> Option<WordBase> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                tracing::error!("Could not read {}: {e}", self.path.display());
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(base) => Some(base),
            Err(e) => {
                tracing::error!("Invalid JSON in {}: {e}", self.path.display());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn base(json: &str) -> WordBase {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn fills_placeholders() {
        assert_eq!(
            fill_template("{greeting} So {adjective}!", "Hey", "cool").as_deref(),
            Some("Hey So cool!")
        );
        assert_eq!(
            fill_template("{{literal}} {adjective}", "", "nice").as_deref(),
            Some("{literal} nice")
        );
    }

    #[test]
    fn broken_templates_fail() {
        assert_eq!(fill_template("{name} hi", "a", "b"), None);
        assert_eq!(fill_template("{greeting", "a", "b"), None);
        assert_eq!(fill_template("oops }", "a", "b"), None);
    }

    #[test]
    fn generate_uses_lists() {
        let base = base(
            r#"{"templates": ["{greeting} - {adjective}"],
                "greetings": ["Yo"],
                "descriptive_words": ["epic"]}"#,
        );
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(base.generate(&mut rng).as_deref(), Some("Yo - epic"));
    }

    #[test]
    fn missing_lists_use_defaults() {
        let base = base(r#"{"templates": ["{greeting} {adjective}"]}"#);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            base.generate(&mut rng).as_deref(),
            Some("Check this out! amazing")
        );
    }

    #[test]
    fn empty_lists_fail() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(base(r#"{}"#).generate(&mut rng), None);
        assert_eq!(
            base(r#"{"templates": ["{greeting}"], "greetings": []}"#).generate(&mut rng),
            None
        );
    }

    #[test]
    fn words_fall_back_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let words = Words::new(dir.path());
        assert_eq!(words.message(), FALLBACK_MESSAGE);

        std::fs::write(dir.path().join(WORD_BASE_FILE), "not json").unwrap();
        assert_eq!(words.message(), FALLBACK_MESSAGE);
    }

    #[test]
    fn words_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(WORD_BASE_FILE),
            r#"{"templates": ["{adjective}!"], "descriptive_words": ["wow"]}"#,
        )
        .unwrap();
        assert_eq!(Words::new(dir.path()).message(), "wow!");
    }
}
