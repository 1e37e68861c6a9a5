//! `AdvancedLocaleNormalizer`: locale-specific pre-synthesis cleanup.
//! Stage `{tts_input}` only — it runs last in the default chain, after
//! `NumberNormalizer` has already spelled digits out, so its rules operate
//! on already-worded text (abbreviation expansion, locale idioms) rather
//! than on raw digits.

use crate::normalizer::Normalizer;
use crate::stage::Stage;
use crate::Result;
use std::collections::BTreeMap;

const STAGES: &[Stage] = &[Stage::TtsInput];

pub struct AdvancedLocaleNormalizer {
    pub locale: String,
    rules: Vec<(String, String)>,
}

impl AdvancedLocaleNormalizer {
    pub fn new(locale: impl Into<String>) -> Self {
        let locale = locale.into();
        let rules = built_in_rules(&locale);
        Self { locale, rules }
    }
}

impl Default for AdvancedLocaleNormalizer {
    fn default() -> Self {
        Self::new("en")
    }
}

impl Normalizer for AdvancedLocaleNormalizer {
    fn name(&self) -> &'static str {
        "advanced_locale"
    }

    fn stages(&self) -> &'static [Stage] {
        STAGES
    }

    fn normalize(&self, text: &str, _stage: Stage) -> Result<String> {
        let mut out = text.to_string();
        for (from, to) in &self.rules {
            out = replace_word_boundary(&out, from, to);
        }
        Ok(out)
    }
}

/// Whole-word, case-sensitive replace (abbreviations are exact tokens, not
/// substrings of other words).
fn replace_word_boundary(text: &str, from: &str, to: &str) -> String {
    text.split(' ')
        .map(|w| {
            let trailing_comma = w.ends_with(',');
            let core = w.strip_suffix(',').unwrap_or(w);
            if core == from {
                if trailing_comma {
                    format!("{to},")
                } else {
                    to.to_string()
                }
            } else {
                w.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn built_in_rules(locale: &str) -> Vec<(String, String)> {
    let table: &[(&str, &str)] = match locale {
        "ru" => &[
            ("т.е.", "то есть"),
            ("и т.д.", "и так далее"),
            ("и т.п.", "и тому подобное"),
            ("руб.", "рублей"),
        ],
        "en" => &[
            ("e.g.", "for example"),
            ("i.e.", "that is"),
            ("etc.", "et cetera"),
            ("Dr.", "Doctor"),
            ("Mr.", "Mister"),
            ("Mrs.", "Missus"),
        ],
        _ => &[],
    };
    let mut map: BTreeMap<String, String> = BTreeMap::new();
    for (from, to) in table {
        map.insert(from.to_string(), to.to_string());
    }
    map.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_english_abbreviations() {
        let normalizer = AdvancedLocaleNormalizer::new("en");
        let out = normalizer.normalize("see the docs e.g. the readme", Stage::TtsInput).unwrap();
        assert_eq!(out, "see the docs for example the readme");
    }

    #[test]
    fn expands_russian_abbreviations() {
        let normalizer = AdvancedLocaleNormalizer::new("ru");
        let out = normalizer.normalize("пятница, т.е. завтра", Stage::TtsInput).unwrap();
        assert_eq!(out, "пятница, то есть завтра");
    }

    #[test]
    fn unknown_locale_is_a_no_op() {
        let normalizer = AdvancedLocaleNormalizer::new("fr");
        let out = normalizer.normalize("e.g. rien", Stage::TtsInput).unwrap();
        assert_eq!(out, "e.g. rien");
    }

    #[test]
    fn idempotent_within_stage() {
        let normalizer = AdvancedLocaleNormalizer::new("en");
        let once = normalizer.normalize("etc. and etc.", Stage::TtsInput).unwrap();
        let twice = normalizer.normalize(&once, Stage::TtsInput).unwrap();
        assert_eq!(once, twice);
    }
}
