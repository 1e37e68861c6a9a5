//! `TextProcessor`: applies every enabled normalizer whose stage set
//! includes the requested stage, in configuration order.

use crate::advanced_locale::AdvancedLocaleNormalizer;
use crate::normalizer::Normalizer;
use crate::number::NumberNormalizer;
use crate::prepare::PrepareNormalizer;
use crate::stage::Stage;
use crate::{Result, TextProcessingError};
use vox_config::TextProcessingConfig;

pub struct TextProcessor {
    chain: Vec<Box<dyn Normalizer>>,
}

impl TextProcessor {
    /// Builds the chain from config in declared order. An entry naming a
    /// normalizer this build doesn't know about is an error rather than a
    /// silent skip: a misconfigured pipeline should fail fast.
    pub fn from_config(config: &TextProcessingConfig) -> Result<Self> {
        let mut chain: Vec<Box<dyn Normalizer>> = Vec::new();
        for entry in &config.normalizers {
            if !entry.enabled {
                continue;
            }
            let normalizer: Box<dyn Normalizer> = match entry.name.as_str() {
                "number" => Box::new(NumberNormalizer::new(config.locale.clone())),
                "prepare" => Box::new(PrepareNormalizer::new(config.transliterate)),
                "advanced_locale" => Box::new(AdvancedLocaleNormalizer::new(config.locale.clone())),
                other => return Err(TextProcessingError::UnknownNormalizer(other.to_string())),
            };
            chain.push(normalizer);
        }
        Ok(Self { chain })
    }

    pub fn normalize(&self, text: &str, stage: Stage) -> Result<String> {
        let mut current = text.to_string();
        for normalizer in &self.chain {
            if normalizer.applies_to(stage) {
                current = normalizer
                    .normalize(&current, stage)
                    .map_err(|e| TextProcessingError::NormalizationFailed {
                        normalizer: normalizer.name().to_string(),
                        message: e.to_string(),
                    })?;
            }
        }
        Ok(current)
    }
}
