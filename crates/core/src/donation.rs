//! Intent donation data model: the declarative mapping a handler registers
//! between natural-language token patterns and one of its methods. Expressed
//! as a typed, serde-round-trippable document like the rest of the
//! configuration surface.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemaVersion(pub u32);

impl SchemaVersion {
    pub const CURRENT: SchemaVersion = SchemaVersion(1);
}

/// One element of a token pattern: `LEMMA`, `LEMMA.IN`, `TEXT`, or `POS`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TokenMatcher {
    Lemma { lemma: String },
    LemmaIn { lemmas: Vec<String> },
    Text { text: String },
    Pos { pos: String },
}

impl TokenMatcher {
    /// Lemmas this matcher references, used by the lemma-sync validator.
    pub fn referenced_lemmas(&self) -> Vec<&str> {
        match self {
            TokenMatcher::Lemma { lemma } => vec![lemma.as_str()],
            TokenMatcher::LemmaIn { lemmas } => lemmas.iter().map(|s| s.as_str()).collect(),
            TokenMatcher::Text { .. } | TokenMatcher::Pos { .. } => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quantifier {
    #[default]
    One,
    ZeroOrOne,
    ZeroOrMore,
    OneOrMore,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPatternElement {
    pub matcher: TokenMatcher,
    #[serde(default)]
    pub op: Quantifier,
}

pub type TokenPattern = Vec<TokenPatternElement>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotPattern {
    pub slot_name: String,
    pub patterns: Vec<TokenPattern>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonationExample {
    pub text: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDonation {
    /// Structural key; immutable once donated.
    pub method_name: String,
    /// Structural key; immutable once donated.
    pub intent_suffix: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub global_params: Vec<String>,
    #[serde(default)]
    pub lemmas: Vec<String>,
    #[serde(default)]
    pub token_patterns: Vec<TokenPattern>,
    #[serde(default)]
    pub slot_patterns: Vec<SlotPattern>,
    #[serde(default)]
    pub examples: Vec<DonationExample>,
}

impl MethodDonation {
    /// Union of lemmas appearing inside `token_patterns` and `slot_patterns`,
    /// used to check the lemma-sync invariant `lemmas ⊇ referenced`.
    pub fn referenced_lemmas(&self) -> BTreeSet<String> {
        let mut set = BTreeSet::new();
        for pattern in &self.token_patterns {
            for element in pattern {
                for lemma in element.matcher.referenced_lemmas() {
                    set.insert(lemma.to_string());
                }
            }
        }
        for slot in &self.slot_patterns {
            for pattern in &slot.patterns {
                for element in pattern {
                    for lemma in element.matcher.referenced_lemmas() {
                        set.insert(lemma.to_string());
                    }
                }
            }
        }
        set
    }

    /// Parameter names this method declares: the union of `global_params`
    /// and every `slot_name`, used by the cross-language parity check.
    pub fn parameter_names(&self) -> BTreeSet<String> {
        let mut set: BTreeSet<String> = self.global_params.iter().cloned().collect();
        set.extend(self.slot_patterns.iter().map(|s| s.slot_name.clone()));
        set
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Donation {
    pub handler_domain: String,
    #[serde(default)]
    pub description: String,
    pub schema_version: SchemaVersion,
    pub donation_version: u32,
    pub language: String,
    pub method_donations: Vec<MethodDonation>,
}

impl Donation {
    pub fn method(&self, method_name: &str) -> Option<&MethodDonation> {
        self.method_donations
            .iter()
            .find(|m| m.method_name == method_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lemma_pattern(lemma: &str) -> TokenPattern {
        vec![TokenPatternElement {
            matcher: TokenMatcher::Lemma {
                lemma: lemma.to_string(),
            },
            op: Quantifier::One,
        }]
    }

    #[test]
    fn referenced_lemmas_collects_from_token_and_slot_patterns() {
        let method = MethodDonation {
            method_name: "turn_on".into(),
            intent_suffix: "turn_on".into(),
            description: String::new(),
            global_params: vec![],
            lemmas: vec!["включи".into()],
            token_patterns: vec![lemma_pattern("включи")],
            slot_patterns: vec![SlotPattern {
                slot_name: "device".into(),
                patterns: vec![lemma_pattern("свет")],
            }],
            examples: vec![],
        };
        let referenced = method.referenced_lemmas();
        assert!(referenced.contains("включи"));
        assert!(referenced.contains("свет"));
    }

    #[test]
    fn parameter_names_include_slots_and_globals() {
        let method = MethodDonation {
            method_name: "add".into(),
            intent_suffix: "add".into(),
            description: String::new(),
            global_params: vec!["count".into()],
            lemmas: vec![],
            token_patterns: vec![],
            slot_patterns: vec![SlotPattern {
                slot_name: "item".into(),
                patterns: vec![],
            }],
            examples: vec![],
        };
        let params = method.parameter_names();
        assert_eq!(params.len(), 2);
        assert!(params.contains("count"));
        assert!(params.contains("item"));
    }
}
