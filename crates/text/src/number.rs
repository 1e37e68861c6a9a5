//! `NumberNormalizer`: digit runs -> locale words. Stages
//! `{asr_output, general, tts_input}`. A small pluggable cardinal-word table
//! so additional locales can be added without touching the matching logic.

use crate::normalizer::Normalizer;
use crate::stage::Stage;
use crate::Result;
use once_cell::sync::Lazy;
use regex::Regex;

static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

const STAGES: &[Stage] = &[Stage::AsrOutput, Stage::General, Stage::TtsInput];

/// Cardinal-word table for one locale. Russian's hundreds are irregular
/// words (not "X hundred"), so `hundreds` is a full 1-9 table rather than
/// composed from `ones`; gender/case agreement (e.g. "одна тысяча" vs "два
/// часа") is not modeled — every scale name is rendered in its nominative
/// singular form regardless of the count in front of it.
struct LocaleTable {
    zero: &'static str,
    ones: [&'static str; 20],
    tens: [&'static str; 10],
    hundreds: [&'static str; 10],
    compound_separator: &'static str,
    scales: [(u64, &'static str); 3],
}

const ONES_EN: [&str; 20] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen",
    "nineteen",
];
const TENS_EN: [&str; 10] = [
    "", "", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];
const HUNDREDS_EN: [&str; 10] = [
    "",
    "one hundred",
    "two hundred",
    "three hundred",
    "four hundred",
    "five hundred",
    "six hundred",
    "seven hundred",
    "eight hundred",
    "nine hundred",
];

const ONES_RU: [&str; 20] = [
    "ноль",
    "один",
    "два",
    "три",
    "четыре",
    "пять",
    "шесть",
    "семь",
    "восемь",
    "девять",
    "десять",
    "одиннадцать",
    "двенадцать",
    "тринадцать",
    "четырнадцать",
    "пятнадцать",
    "шестнадцать",
    "семнадцать",
    "восемнадцать",
    "девятнадцать",
];
const TENS_RU: [&str; 10] =
    ["", "", "двадцать", "тридцать", "сорок", "пятьдесят", "шестьдесят", "семьдесят", "восемьдесят", "девяносто"];
const HUNDREDS_RU: [&str; 10] = [
    "",
    "сто",
    "двести",
    "триста",
    "четыреста",
    "пятьсот",
    "шестьсот",
    "семьсот",
    "восемьсот",
    "девятьсот",
];

const EN: LocaleTable = LocaleTable {
    zero: "zero",
    ones: ONES_EN,
    tens: TENS_EN,
    hundreds: HUNDREDS_EN,
    compound_separator: "-",
    scales: [(1_000_000_000, "billion"), (1_000_000, "million"), (1_000, "thousand")],
};

const RU: LocaleTable = LocaleTable {
    zero: "ноль",
    ones: ONES_RU,
    tens: TENS_RU,
    hundreds: HUNDREDS_RU,
    compound_separator: " ",
    scales: [(1_000_000_000, "миллиард"), (1_000_000, "миллион"), (1_000, "тысяча")],
};

fn table_for(locale: &str) -> &'static LocaleTable {
    match locale {
        "ru" => &RU,
        _ => &EN,
    }
}

pub struct NumberNormalizer {
    pub locale: String,
}

impl NumberNormalizer {
    pub fn new(locale: impl Into<String>) -> Self {
        Self { locale: locale.into() }
    }
}

impl Default for NumberNormalizer {
    fn default() -> Self {
        Self::new("en")
    }
}

impl Normalizer for NumberNormalizer {
    fn name(&self) -> &'static str {
        "number"
    }

    fn stages(&self) -> &'static [Stage] {
        STAGES
    }

    fn normalize(&self, text: &str, _stage: Stage) -> Result<String> {
        let table = table_for(&self.locale);
        let replaced = DIGIT_RUN.replace_all(text, |caps: &regex::Captures| {
            let digits = &caps[0];
            match digits.parse::<u64>() {
                Ok(n) => cardinal_words(n, table),
                Err(_) => digits.to_string(), // too large to render; leave untouched
            }
        });
        Ok(replaced.into_owned())
    }
}

fn cardinal_words(n: u64, table: &LocaleTable) -> String {
    if n == 0 {
        return table.zero.to_string();
    }
    let mut parts = Vec::new();
    let mut remainder = n;
    for (scale, name) in table.scales {
        if remainder >= scale {
            let chunk = remainder / scale;
            remainder %= scale;
            if chunk > 0 {
                parts.push(format!("{} {name}", below_thousand(chunk, table)));
            }
        }
    }
    if remainder > 0 || parts.is_empty() {
        parts.push(below_thousand(remainder, table));
    }
    parts.join(" ")
}

fn below_thousand(n: u64, table: &LocaleTable) -> String {
    if n >= 100 {
        let hundreds = n / 100;
        let rest = n % 100;
        if rest == 0 {
            table.hundreds[hundreds as usize].to_string()
        } else {
            format!("{} {}", table.hundreds[hundreds as usize], below_hundred(rest, table))
        }
    } else {
        below_hundred(n, table)
    }
}

fn below_hundred(n: u64, table: &LocaleTable) -> String {
    if n < 20 {
        table.ones[n as usize].to_string()
    } else {
        let tens = n / 10;
        let ones = n % 10;
        if ones == 0 {
            table.tens[tens as usize].to_string()
        } else {
            format!("{}{}{}", table.tens[tens as usize], table.compound_separator, table.ones[ones as usize])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(text: &str) -> String {
        NumberNormalizer::default()
            .normalize(text, Stage::General)
            .unwrap()
    }

    #[test]
    fn single_digit() {
        assert_eq!(normalize("I have 5 apples"), "I have five apples");
    }

    #[test]
    fn teen_and_compound() {
        assert_eq!(normalize("turn 13 pages"), "turn thirteen pages");
        assert_eq!(normalize("42"), "forty-two");
    }

    #[test]
    fn hundreds_thousands() {
        assert_eq!(normalize("103"), "one hundred three");
        assert_eq!(normalize("2024"), "two thousand twenty-four");
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize("temperature is 72 degrees");
        let twice = NumberNormalizer::default()
            .normalize(&once, Stage::General)
            .unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn zero_is_spelled_out() {
        assert_eq!(normalize("count: 0"), "count: zero");
    }

    #[test]
    fn russian_locale_uses_russian_words() {
        let normalizer = NumberNormalizer::new("ru");
        let out = normalizer.normalize("у меня 5 яблок", Stage::General).unwrap();
        assert_eq!(out, "у меня пять яблок");
    }

    #[test]
    fn russian_hundreds_are_irregular_words_not_composed() {
        let normalizer = NumberNormalizer::new("ru");
        assert_eq!(normalizer.normalize("200", Stage::General).unwrap(), "двести");
        // Scale-word agreement ("две тысячи" for a count of 2) isn't modeled;
        // "тысяча" always stays nominative singular regardless of the count.
        assert_eq!(normalizer.normalize("2024", Stage::General).unwrap(), "два тысяча двадцать четыре");
    }

    #[test]
    fn unknown_locale_falls_back_to_english() {
        let normalizer = NumberNormalizer::new("fr");
        let out = normalizer.normalize("3", Stage::General).unwrap();
        assert_eq!(out, "three");
    }
}
