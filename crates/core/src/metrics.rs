//! Thin facade over the `metrics` crate macros so call sites in pipeline,
//! coordinator, and server code depend on this module rather than on the
//! exporter crate directly.

pub fn record_stage_latency(stage: &str, elapsed_ms: u64) {
    metrics::histogram!("vox_stage_latency_ms", "stage" => stage.to_string()).record(elapsed_ms as f64);
}

pub fn record_provider_fallback(kind: &str, from: &str, to: &str) {
    metrics::counter!(
        "vox_provider_fallback_total",
        "kind" => kind.to_string(),
        "from" => from.to_string(),
        "to" => to.to_string()
    )
    .increment(1);
}

pub fn record_donation_validation_failure(handler: &str, language: &str) {
    metrics::counter!(
        "vox_donation_validation_failures_total",
        "handler" => handler.to_string(),
        "language" => language.to_string()
    )
    .increment(1);
}

pub fn record_intent_unresolved() {
    metrics::counter!("vox_intent_unresolved_total").increment(1);
}
