//! Utterance tokenization. Donation patterns are authored against lemmas,
//! surface text, and a part-of-speech tag, but this workspace carries no
//! language model or POS tagger — lemma matching here is lowercase surface
//! matching, and `Pos` is a coarse numeric/word split. Good enough to drive
//! a declarative, admin-editable matcher; a real lemmatizer would slot in
//! behind the same `Token` shape without touching the matcher.

use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub surface: String,
    pub lemma: String,
    pub pos: String,
}

pub fn tokenize(text: &str) -> Vec<Token> {
    text.unicode_words()
        .map(|word| Token {
            surface: word.to_string(),
            lemma: word.to_lowercase(),
            pos: coarse_pos(word),
        })
        .collect()
}

fn coarse_pos(word: &str) -> String {
    if word.chars().all(|c| c.is_numeric()) {
        "NUM".to_string()
    } else {
        "WORD".to_string()
    }
}
