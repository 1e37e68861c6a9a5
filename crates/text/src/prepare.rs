//! `PrepareNormalizer`: transliteration (Latin<->Cyrillic as
//! configured), symbol folding, whitespace collapse. Stages
//! `{tts_input, general}`.

use crate::normalizer::Normalizer;
use crate::stage::Stage;
use crate::Result;
use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

const STAGES: &[Stage] = &[Stage::TtsInput, Stage::General];

const SYMBOL_FOLDS: &[(&str, &str)] = &[
    ("&", " and "),
    ("%", " percent "),
    ("@", " at "),
    ("#", " number "),
    ("+", " plus "),
    ("=", " equals "),
];

/// Latin -> Cyrillic phonetic transliteration table. Deliberately partial:
/// only letters with an unambiguous single-letter Cyrillic counterpart are
/// mapped; anything else passes through untouched, which keeps the
/// transform idempotent (a second pass finds no more mappable Latin
/// letters after the first).
const LATIN_TO_CYRILLIC: &[(char, char)] = &[
    ('a', 'а'), ('b', 'б'), ('v', 'в'), ('g', 'г'), ('d', 'д'), ('e', 'е'),
    ('z', 'з'), ('i', 'и'), ('k', 'к'), ('l', 'л'), ('m', 'м'), ('n', 'н'),
    ('o', 'о'), ('p', 'п'), ('r', 'р'), ('s', 'с'), ('t', 'т'), ('u', 'у'),
    ('f', 'ф'), ('h', 'х'), ('c', 'ц'), ('y', 'ы'),
];

pub struct PrepareNormalizer {
    pub transliterate: bool,
}

impl PrepareNormalizer {
    pub fn new(transliterate: bool) -> Self {
        Self { transliterate }
    }
}

impl Default for PrepareNormalizer {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Normalizer for PrepareNormalizer {
    fn name(&self) -> &'static str {
        "prepare"
    }

    fn stages(&self) -> &'static [Stage] {
        STAGES
    }

    fn normalize(&self, text: &str, _stage: Stage) -> Result<String> {
        // Symbols must fold to words before transliteration: the injected
        // connective words ("and", "percent", ...) are plain Latin letters,
        // and transliterating them on a second pass would break idempotence.
        let mut out = fold_symbols(text);
        if self.transliterate {
            out = transliterate_latin_to_cyrillic(&out);
        }
        out = collapse_whitespace(&out);
        Ok(out)
    }
}

fn transliterate_latin_to_cyrillic(text: &str) -> String {
    text.chars()
        .map(|c| {
            let lower = c.to_ascii_lowercase();
            match LATIN_TO_CYRILLIC.iter().find(|(l, _)| *l == lower) {
                Some((_, cyr)) if c.is_lowercase() => *cyr,
                Some((_, cyr)) => cyr.to_uppercase().next().unwrap_or(*cyr),
                None => c,
            }
        })
        .collect()
}

fn fold_symbols(text: &str) -> String {
    let mut out = text.to_string();
    for (symbol, replacement) in SYMBOL_FOLDS {
        out = out.replace(symbol, replacement);
    }
    out
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_and_trims_whitespace() {
        let normalizer = PrepareNormalizer::default();
        let out = normalizer.normalize("  hello   world  ", Stage::General).unwrap();
        assert_eq!(out, "hello world");
    }

    #[test]
    fn folds_symbols_to_words() {
        let normalizer = PrepareNormalizer::default();
        let out = normalizer.normalize("cats & dogs 50%", Stage::General).unwrap();
        assert_eq!(out, "cats and dogs 50 percent");
    }

    #[test]
    fn transliterates_when_enabled() {
        let normalizer = PrepareNormalizer::new(true);
        let out = normalizer.normalize("privet", Stage::TtsInput).unwrap();
        assert_eq!(out, "привет");
    }

    #[test]
    fn transliteration_off_by_default() {
        let normalizer = PrepareNormalizer::default();
        let out = normalizer.normalize("privet", Stage::TtsInput).unwrap();
        assert_eq!(out, "privet");
    }

    #[test]
    fn idempotent_within_stage() {
        let normalizer = PrepareNormalizer::new(true);
        let once = normalizer.normalize("privet & mir", Stage::TtsInput).unwrap();
        let twice = normalizer.normalize(&once, Stage::TtsInput).unwrap();
        assert_eq!(once, twice);
    }
}
