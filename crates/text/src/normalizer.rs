use crate::stage::Stage;
use crate::Result;

/// A pure, stage-scoped text transform. Implementations must be
/// deterministic and idempotent within one stage: `normalize(normalize(t,
/// s), s) == normalize(t, s)`.
pub trait Normalizer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Stages this normalizer participates in.
    fn stages(&self) -> &'static [Stage];

    fn normalize(&self, text: &str, stage: Stage) -> Result<String>;

    fn applies_to(&self, stage: Stage) -> bool {
        self.stages().contains(&stage)
    }
}
