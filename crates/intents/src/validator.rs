//! Donation validation: required-field checks, the immutable-key rule for
//! `method_name`/`intent_suffix`, the lemma-sync invariant, and
//! cross-language parameter/method parity reporting.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use vox_core::donation::{Donation, SchemaVersion};
use vox_core::{Error, Result};

/// Validates `donation` in isolation. `previous` is the donation being
/// replaced, if any — required to enforce that `method_name`/`intent_suffix`
/// never change in place at a given array position. Returns non-fatal
/// lemma-sync warnings on success; in `strict` mode a lemma-sync violation
/// is promoted to a hard error instead.
pub fn validate_donation(donation: &Donation, previous: Option<&Donation>, strict: bool) -> Result<Vec<String>> {
    if donation.handler_domain.trim().is_empty() {
        return Err(Error::DonationInvalid("handler_domain must not be empty".to_string()));
    }
    if donation.language.trim().is_empty() {
        return Err(Error::DonationInvalid("language must not be empty".to_string()));
    }
    if donation.schema_version != SchemaVersion::CURRENT {
        return Err(Error::SchemaMismatch(format!(
            "donation schema version {:?} unsupported, expected {:?}",
            donation.schema_version,
            SchemaVersion::CURRENT
        )));
    }
    for method in &donation.method_donations {
        if method.method_name.trim().is_empty() || method.intent_suffix.trim().is_empty() {
            return Err(Error::DonationInvalid(
                "method_name and intent_suffix are required".to_string(),
            ));
        }
    }

    if let Some(previous) = previous {
        for (index, prior_method) in previous.method_donations.iter().enumerate() {
            if let Some(new_method) = donation.method_donations.get(index) {
                if new_method.method_name != prior_method.method_name
                    || new_method.intent_suffix != prior_method.intent_suffix
                {
                    return Err(Error::DonationInvalid(format!(
                        "method at position {index} changed its immutable key: \
                         method_name/intent_suffix cannot be edited, only added or removed"
                    )));
                }
            }
        }
    }

    let mut warnings = Vec::new();
    for method in &donation.method_donations {
        let declared: BTreeSet<String> = method.lemmas.iter().map(|l| l.to_lowercase()).collect();
        let referenced = method.referenced_lemmas();
        let missing: Vec<String> = referenced.difference(&declared).cloned().collect();
        if !missing.is_empty() {
            let message = format!(
                "method '{}' references lemmas not declared in `lemmas`: {}",
                method.method_name,
                missing.join(", ")
            );
            if strict {
                return Err(Error::DonationInvalid(message));
            }
            warnings.push(message);
        }
    }

    Ok(warnings)
}

/// Cross-language completeness: which methods are missing per language, and
/// for methods present in more than one language, which parameters are
/// missing per language.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CompletenessReport {
    pub missing_methods: BTreeMap<String, Vec<String>>,
    pub missing_params: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

/// `donations_by_language` must all belong to the same handler.
pub fn cross_language_parity(donations_by_language: &BTreeMap<String, Arc<Donation>>) -> CompletenessReport {
    let mut all_methods: BTreeSet<String> = BTreeSet::new();
    for donation in donations_by_language.values() {
        all_methods.extend(donation.method_donations.iter().map(|m| m.method_name.clone()));
    }

    let mut report = CompletenessReport::default();
    for (language, donation) in donations_by_language {
        let present: BTreeSet<String> = donation
            .method_donations
            .iter()
            .map(|m| m.method_name.clone())
            .collect();
        let missing: Vec<String> = all_methods.difference(&present).cloned().collect();
        if !missing.is_empty() {
            report.missing_methods.insert(language.clone(), missing);
        }
    }

    for method_name in &all_methods {
        let mut union_params: BTreeSet<String> = BTreeSet::new();
        let mut per_language_params: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (language, donation) in donations_by_language {
            if let Some(method) = donation.method(method_name) {
                let params = method.parameter_names();
                union_params.extend(params.iter().cloned());
                per_language_params.insert(language.clone(), params);
            }
        }
        for (language, params) in &per_language_params {
            let missing: Vec<String> = union_params.difference(params).cloned().collect();
            if !missing.is_empty() {
                report
                    .missing_params
                    .entry(method_name.clone())
                    .or_default()
                    .insert(language.clone(), missing);
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use vox_core::donation::{MethodDonation, Quantifier, TokenMatcher, TokenPatternElement};

    fn method(name: &str, lemmas: Vec<&str>, referenced: Vec<&str>, params: Vec<&str>) -> MethodDonation {
        MethodDonation {
            method_name: name.to_string(),
            intent_suffix: name.to_string(),
            description: String::new(),
            global_params: params.into_iter().map(String::from).collect(),
            lemmas: lemmas.into_iter().map(String::from).collect(),
            token_patterns: vec![referenced
                .into_iter()
                .map(|lemma| TokenPatternElement {
                    matcher: TokenMatcher::Lemma { lemma: lemma.to_string() },
                    op: Quantifier::One,
                })
                .collect()],
            slot_patterns: vec![],
            examples: vec![],
        }
    }

    fn donation(handler: &str, language: &str, methods: Vec<MethodDonation>) -> Donation {
        Donation {
            handler_domain: handler.to_string(),
            description: String::new(),
            schema_version: SchemaVersion::CURRENT,
            donation_version: 1,
            language: language.to_string(),
            method_donations: methods,
        }
    }

    #[test]
    fn rejects_empty_handler_domain() {
        let d = donation("", "en", vec![]);
        assert!(matches!(validate_donation(&d, None, false), Err(Error::DonationInvalid(_))));
    }

    #[test]
    fn rejects_unsupported_schema_version() {
        let mut d = donation("lights", "en", vec![]);
        d.schema_version = SchemaVersion(99);
        assert!(matches!(validate_donation(&d, None, false), Err(Error::SchemaMismatch(_))));
    }

    #[test]
    fn lemma_sync_violation_is_warning_unless_strict() {
        let d = donation("lights", "en", vec![method("turn_on", vec!["turn"], vec!["turn", "on"], vec![])]);
        let warnings = validate_donation(&d, None, false).unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("on"));

        let err = validate_donation(&d, None, true).unwrap_err();
        assert!(matches!(err, Error::DonationInvalid(_)));
    }

    #[test]
    fn renaming_method_name_in_place_is_rejected() {
        let previous = donation("lights", "en", vec![method("turn_on", vec!["turn", "on"], vec!["turn", "on"], vec![])]);
        let edited = donation("lights", "en", vec![method("turn_on_v2", vec!["turn", "on"], vec!["turn", "on"], vec![])]);
        assert!(matches!(
            validate_donation(&edited, Some(&previous), false),
            Err(Error::DonationInvalid(_))
        ));
    }

    #[test]
    fn adding_a_new_method_at_the_end_is_allowed() {
        let previous = donation("lights", "en", vec![method("turn_on", vec!["turn", "on"], vec!["turn", "on"], vec![])]);
        let edited = donation(
            "lights",
            "en",
            vec![
                method("turn_on", vec!["turn", "on"], vec!["turn", "on"], vec![]),
                method("turn_off", vec!["turn", "off"], vec!["turn", "off"], vec![]),
            ],
        );
        assert!(validate_donation(&edited, Some(&previous), false).is_ok());
    }

    #[test]
    fn cross_language_parity_reports_missing_method() {
        let mut by_language = BTreeMap::new();
        by_language.insert(
            "A".to_string(),
            Arc::new(donation(
                "todo",
                "A",
                vec![method("add", vec!["add"], vec!["add"], vec![]), method("remove", vec!["remove"], vec!["remove"], vec![])],
            )),
        );
        by_language.insert(
            "B".to_string(),
            Arc::new(donation("todo", "B", vec![method("add", vec!["add"], vec!["add"], vec![])])),
        );

        let report = cross_language_parity(&by_language);
        assert_eq!(report.missing_methods.get("B"), Some(&vec!["remove".to_string()]));
        assert!(report.missing_methods.get("A").is_none());
    }

    #[test]
    fn cross_language_parity_reports_missing_params() {
        let mut by_language = BTreeMap::new();
        by_language.insert(
            "A".to_string(),
            Arc::new(donation("todo", "A", vec![method("add", vec!["add"], vec!["add"], vec!["item", "quantity"])])),
        );
        by_language.insert(
            "B".to_string(),
            Arc::new(donation("todo", "B", vec![method("add", vec!["add"], vec!["add"], vec!["item"])])),
        );

        let report = cross_language_parity(&by_language);
        let missing = report.missing_params.get("add").unwrap().get("B").unwrap();
        assert_eq!(missing, &vec!["quantity".to_string()]);
    }
}
