//! Donation store: loads `(handler, language)` documents from disk, keeps a
//! validated snapshot plus one compiled `IntentMatcher` per language, and
//! publishes edits through validate → stage → atomic swap → notify, the
//! same discipline `vox_registry::Registry` and `vox_config::ConfigWatcher`
//! use for their own snapshots.

use crate::matcher::IntentMatcher;
use crate::validator::{cross_language_parity, validate_donation, CompletenessReport};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use vox_core::donation::{Donation, MethodDonation, SchemaVersion, SlotPattern};
use vox_core::{Error, Result};

type DonationKey = (String, String);
type DonationMap = BTreeMap<DonationKey, Arc<Donation>>;
type MatcherMap = BTreeMap<String, Arc<IntentMatcher>>;

pub struct DonationStore {
    donations: RwLock<Arc<DonationMap>>,
    matchers: RwLock<Arc<MatcherMap>>,
    strict_mode: bool,
    confidence_threshold: f32,
    changed_tx: watch::Sender<u64>,
    changed_rx: watch::Receiver<u64>,
    generation: AtomicU64,
}

impl DonationStore {
    /// Loads every `<root>/<handler>/<language>.toml` file, validates each
    /// (lemma-sync warnings are logged, not fatal, unless `strict_mode`),
    /// and compiles the initial matcher for every language present.
    pub fn load(root: &Path, strict_mode: bool, confidence_threshold: f32) -> Result<Self> {
        let loaded = load_dir(root)?;
        for donation in loaded.values() {
            let warnings = validate_donation(donation, None, strict_mode)?;
            for warning in warnings {
                tracing::warn!(handler = %donation.handler_domain, language = %donation.language, %warning, "donation lemma-sync warning");
            }
        }
        let donations: DonationMap = loaded.into_iter().map(|(k, v)| (k, Arc::new(v))).collect();
        let matchers = build_matchers(&donations, confidence_threshold);
        let (changed_tx, changed_rx) = watch::channel(0);
        Ok(Self {
            donations: RwLock::new(Arc::new(donations)),
            matchers: RwLock::new(Arc::new(matchers)),
            strict_mode,
            confidence_threshold,
            changed_tx,
            changed_rx,
            generation: AtomicU64::new(0),
        })
    }

    pub fn get(&self, handler: &str, language: &str) -> Option<Arc<Donation>> {
        self.donations.read().get(&(handler.to_string(), language.to_string())).cloned()
    }

    pub fn matcher(&self, language: &str) -> Option<Arc<IntentMatcher>> {
        self.matchers.read().get(language).cloned()
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changed_rx.clone()
    }

    /// Validates `donation` against the prior version at the same key (if
    /// any), then atomically publishes a new donation snapshot and a
    /// rebuilt matcher set. Readers never observe a torn intermediate
    /// state: on error the previous snapshot is untouched.
    pub fn stage_update(&self, handler: &str, language: &str, donation: Donation) -> Result<Vec<String>> {
        let key = (handler.to_string(), language.to_string());
        let previous = self.donations.read().get(&key).cloned();
        let warnings = validate_donation(&donation, previous.as_deref(), self.strict_mode)?;

        let mut new_donations = (**self.donations.read()).clone();
        new_donations.insert(key, Arc::new(donation));
        let new_matchers = build_matchers(&new_donations, self.confidence_threshold);

        *self.donations.write() = Arc::new(new_donations);
        *self.matchers.write() = Arc::new(new_matchers);

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let _ = self.changed_tx.send(generation);
        Ok(warnings)
    }

    pub fn parity_report(&self, handler: &str) -> CompletenessReport {
        let snapshot = self.donations.read();
        let by_language: BTreeMap<String, Arc<Donation>> = snapshot
            .iter()
            .filter(|((h, _), _)| h == handler)
            .map(|((_, language), donation)| (language.clone(), donation.clone()))
            .collect();
        cross_language_parity(&by_language)
    }

    /// Cross-language parameter sync: for every method present in
    /// `source`'s donation but absent from a target language, stage a
    /// skeleton method (structural fields and slot names copied, trigger
    /// lemmas/patterns left empty pending translation) in that language.
    /// Returns the `(language, method_name)` pairs created.
    pub fn sync_parameters(&self, handler: &str, source: &str, targets: &[String]) -> Result<Vec<(String, String)>> {
        let source_donation = self.get(handler, source).ok_or_else(|| {
            Error::DonationInvalid(format!("no donation for handler '{handler}' language '{source}'"))
        })?;

        let mut created = Vec::new();
        for target in targets {
            let mut target_donation = match self.get(handler, target) {
                Some(existing) => (*existing).clone(),
                None => Donation {
                    handler_domain: handler.to_string(),
                    description: source_donation.description.clone(),
                    schema_version: SchemaVersion::CURRENT,
                    donation_version: 0,
                    language: target.clone(),
                    method_donations: Vec::new(),
                },
            };
            let existing_methods: BTreeSet<String> = target_donation
                .method_donations
                .iter()
                .map(|m| m.method_name.clone())
                .collect();

            for method in &source_donation.method_donations {
                if existing_methods.contains(&method.method_name) {
                    continue;
                }
                target_donation.method_donations.push(MethodDonation {
                    method_name: method.method_name.clone(),
                    intent_suffix: method.intent_suffix.clone(),
                    description: method.description.clone(),
                    global_params: method.global_params.clone(),
                    lemmas: Vec::new(),
                    token_patterns: Vec::new(),
                    slot_patterns: method
                        .slot_patterns
                        .iter()
                        .map(|slot| SlotPattern {
                            slot_name: slot.slot_name.clone(),
                            patterns: Vec::new(),
                        })
                        .collect(),
                    examples: Vec::new(),
                });
                created.push((target.clone(), method.method_name.clone()));
            }

            if target_donation.method_donations.len() != existing_methods.len() {
                target_donation.donation_version += 1;
                self.stage_update(handler, target, target_donation)?;
            }
        }
        Ok(created)
    }
}

fn build_matchers(donations: &DonationMap, confidence_threshold: f32) -> MatcherMap {
    let mut by_language: BTreeMap<String, Vec<Arc<Donation>>> = BTreeMap::new();
    for ((_, language), donation) in donations {
        by_language.entry(language.clone()).or_default().push(donation.clone());
    }
    by_language
        .into_iter()
        .map(|(language, donations)| {
            let matcher = IntentMatcher::build(&language, &donations, confidence_threshold);
            (language, Arc::new(matcher))
        })
        .collect()
}

fn load_dir(root: &Path) -> Result<BTreeMap<DonationKey, Donation>> {
    let mut out = BTreeMap::new();
    if !root.exists() {
        return Ok(out);
    }
    for handler_entry in std::fs::read_dir(root)? {
        let handler_entry = handler_entry?;
        let handler_path = handler_entry.path();
        if !handler_path.is_dir() {
            continue;
        }
        let handler = handler_path.file_name().unwrap().to_string_lossy().to_string();
        for file_entry in std::fs::read_dir(&handler_path)? {
            let file_entry = file_entry?;
            let file_path = file_entry.path();
            if file_path.extension().and_then(|e| e.to_str()) != Some("toml") {
                continue;
            }
            let language = file_path.file_stem().unwrap().to_string_lossy().to_string();
            let contents = std::fs::read_to_string(&file_path)?;
            let donation: Donation = toml::from_str(&contents)
                .map_err(|e| Error::DonationInvalid(format!("{}: {e}", file_path.display())))?;
            out.insert((handler.clone(), language), donation);
        }
    }
    Ok(out)
}
