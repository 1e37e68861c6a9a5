//! Two-level intent matcher: a lemma-index prunes candidate methods for an
//! utterance, then each candidate's token patterns are matched to find the
//! longest consuming match, with slot values pulled from `slot_patterns`.

use crate::tokenize::{tokenize, Token};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use vox_core::donation::{Donation, MethodDonation, Quantifier, TokenMatcher, TokenPattern};
use vox_core::request::IntentResult;
use vox_core::{Error, Result};

struct CompiledMethod {
    handler: String,
    declared_index: usize,
    lemmas: BTreeSet<String>,
    method: MethodDonation,
}

/// Compiled, immutable view of every donation for one language. Rebuilt
/// (never mutated) whenever the backing donation store changes; see
/// `store::DonationStore`.
pub struct IntentMatcher {
    language: String,
    methods: Vec<CompiledMethod>,
    lemma_index: HashMap<String, Vec<usize>>,
    confidence_threshold: f32,
}

impl IntentMatcher {
    pub fn build(language: &str, donations: &[Arc<Donation>], confidence_threshold: f32) -> Self {
        let mut methods = Vec::new();
        for donation in donations {
            for (declared_index, method) in donation.method_donations.iter().enumerate() {
                methods.push(CompiledMethod {
                    handler: donation.handler_domain.clone(),
                    declared_index,
                    lemmas: method.lemmas.iter().map(|l| l.to_lowercase()).collect(),
                    method: method.clone(),
                });
            }
        }
        let mut lemma_index: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, compiled) in methods.iter().enumerate() {
            for lemma in &compiled.lemmas {
                lemma_index.entry(lemma.clone()).or_default().push(i);
            }
        }
        Self {
            language: language.to_string(),
            methods,
            lemma_index,
            confidence_threshold,
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    /// Tokenizes `text`, prunes to methods whose lemma-index overlaps one of
    /// the utterance's lemmas, then picks the candidate with the longest
    /// token-pattern match. Ties broken by declaration order within the
    /// handler; a confidence below threshold resolves to `IntentUnresolved`
    /// rather than a low-quality guess.
    pub fn match_utterance(&self, text: &str) -> Result<IntentResult> {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return Err(Error::IntentUnresolved);
        }

        let mut candidates: BTreeSet<usize> = BTreeSet::new();
        for token in &tokens {
            if let Some(indices) = self.lemma_index.get(&token.lemma) {
                candidates.extend(indices.iter().copied());
            }
        }
        if candidates.is_empty() {
            return Err(Error::IntentUnresolved);
        }

        let mut best: Option<(usize, usize)> = None; // (method index, match length)
        for &idx in &candidates {
            let compiled = &self.methods[idx];
            let match_len = compiled
                .method
                .token_patterns
                .iter()
                .filter_map(|pattern| match_pattern_anywhere(&tokens, pattern))
                .map(|(start, end)| end - start)
                .max()
                .unwrap_or(0);
            if match_len == 0 {
                continue;
            }
            let better = match best {
                None => true,
                Some((best_idx, best_len)) => {
                    match_len > best_len
                        || (match_len == best_len
                            && compiled.declared_index < self.methods[best_idx].declared_index)
                }
            };
            if better {
                best = Some((idx, match_len));
            }
        }

        let (idx, match_len) = best.ok_or(Error::IntentUnresolved)?;
        let confidence = (match_len as f32 / tokens.len() as f32).min(1.0);
        if confidence < self.confidence_threshold {
            return Err(Error::IntentUnresolved);
        }

        let compiled = &self.methods[idx];
        let mut slots = BTreeMap::new();
        for slot in &compiled.method.slot_patterns {
            for pattern in &slot.patterns {
                if let Some((start, end)) = match_pattern_anywhere(&tokens, pattern) {
                    let value = tokens[start..end]
                        .iter()
                        .map(|t| t.surface.as_str())
                        .collect::<Vec<_>>()
                        .join(" ");
                    slots.insert(slot.slot_name.clone(), value);
                    break;
                }
            }
        }

        Ok(IntentResult {
            handler: Some(compiled.handler.clone()),
            method: Some(compiled.method.method_name.clone()),
            confidence,
            slots,
        })
    }
}

fn matcher_matches(matcher: &TokenMatcher, token: &Token) -> bool {
    match matcher {
        TokenMatcher::Lemma { lemma } => token.lemma == lemma.to_lowercase(),
        TokenMatcher::LemmaIn { lemmas } => lemmas.iter().any(|l| l.to_lowercase() == token.lemma),
        TokenMatcher::Text { text } => token.surface.to_lowercase() == text.to_lowercase(),
        TokenMatcher::Pos { pos } => token.pos.eq_ignore_ascii_case(pos),
    }
}

/// Attempts to consume `elements` starting at `pos`, returning the index
/// just past the match. Quantified elements try the greediest consumption
/// first and backtrack only as far as needed for the remaining elements to
/// still match.
fn match_elements(tokens: &[Token], pos: usize, elements: &[vox_core::donation::TokenPatternElement]) -> Option<usize> {
    let Some((element, rest)) = elements.split_first() else {
        return Some(pos);
    };
    match element.op {
        Quantifier::One => {
            if pos < tokens.len() && matcher_matches(&element.matcher, &tokens[pos]) {
                match_elements(tokens, pos + 1, rest)
            } else {
                None
            }
        }
        Quantifier::ZeroOrOne => {
            if pos < tokens.len() && matcher_matches(&element.matcher, &tokens[pos]) {
                if let Some(end) = match_elements(tokens, pos + 1, rest) {
                    return Some(end);
                }
            }
            match_elements(tokens, pos, rest)
        }
        Quantifier::ZeroOrMore | Quantifier::OneOrMore => {
            let mut max_consumed = pos;
            while max_consumed < tokens.len() && matcher_matches(&element.matcher, &tokens[max_consumed]) {
                max_consumed += 1;
            }
            let min_consumed = if element.op == Quantifier::OneOrMore { pos + 1 } else { pos };
            if max_consumed < min_consumed {
                return None;
            }
            let mut try_pos = max_consumed;
            loop {
                if try_pos < min_consumed {
                    break;
                }
                if let Some(end) = match_elements(tokens, try_pos, rest) {
                    return Some(end);
                }
                if try_pos == 0 {
                    break;
                }
                try_pos -= 1;
            }
            None
        }
    }
}

/// Searches every start offset for the longest match of `pattern`, since a
/// trigger phrase or slot value can appear anywhere in the utterance.
fn match_pattern_anywhere(tokens: &[Token], pattern: &TokenPattern) -> Option<(usize, usize)> {
    let mut best: Option<(usize, usize)> = None;
    for start in 0..=tokens.len() {
        if let Some(end) = match_elements(tokens, start, pattern) {
            if end > start {
                let is_longer = best.map_or(true, |(bs, be)| end - start > be - bs);
                if is_longer {
                    best = Some((start, end));
                }
            }
        }
    }
    best
}
