//! # Governance Metrics
//!
//! Prometheus counters for the proposal lifecycle.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! bhap-governance = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `bhap_drafts_created_total`
//! - `bhap_proposals_published_total`
//! - `bhap_votes_cast_total` - labeled by value
//! - `bhap_votes_retracted_total`
//! - `bhap_decisions_total` - labeled by outcome
//! - `bhap_operations_rejected_total` - labeled by error kind

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

#[cfg(feature = "metrics")]
lazy_static! {
    pub static ref DRAFTS_CREATED: IntCounter = register_int_counter!(
        "bhap_drafts_created_total",
        "Total number of proposals created in Draft"
    )
    .expect("Failed to create DRAFTS_CREATED metric");

    pub static ref PROPOSALS_PUBLISHED: IntCounter = register_int_counter!(
        "bhap_proposals_published_total",
        "Total number of proposals moved to Discussion"
    )
    .expect("Failed to create PROPOSALS_PUBLISHED metric");

    pub static ref VOTES_CAST: IntCounterVec = register_int_counter_vec!(
        "bhap_votes_cast_total",
        "Total number of votes cast or replaced",
        &["value"]
    )
    .expect("Failed to create VOTES_CAST metric");

    pub static ref VOTES_RETRACTED: IntCounter = register_int_counter!(
        "bhap_votes_retracted_total",
        "Total number of votes retracted"
    )
    .expect("Failed to create VOTES_RETRACTED metric");

    pub static ref DECISIONS: IntCounterVec = register_int_counter_vec!(
        "bhap_decisions_total",
        "Proposals decided by the tally",
        &["outcome"]
    )
    .expect("Failed to create DECISIONS metric");

    pub static ref OPERATIONS_REJECTED: IntCounterVec = register_int_counter_vec!(
        "bhap_operations_rejected_total",
        "Governance operations that failed, by error kind",
        &["kind"]
    )
    .expect("Failed to create OPERATIONS_REJECTED metric");
}

#[cfg(feature = "metrics")]
pub fn record_draft_created() {
    DRAFTS_CREATED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_published() {
    PROPOSALS_PUBLISHED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_vote_cast(value: &str) {
    VOTES_CAST.with_label_values(&[value]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_vote_retracted() {
    VOTES_RETRACTED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_decision(outcome: &str) {
    DECISIONS.with_label_values(&[outcome]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_rejected(kind: &str) {
    OPERATIONS_REJECTED.with_label_values(&[kind]).inc();
}

// No-op implementations when metrics feature is disabled
#[cfg(not(feature = "metrics"))]
pub fn record_draft_created() {}

#[cfg(not(feature = "metrics"))]
pub fn record_published() {}

#[cfg(not(feature = "metrics"))]
pub fn record_vote_cast(_value: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_vote_retracted() {}

#[cfg(not(feature = "metrics"))]
pub fn record_decision(_outcome: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_rejected(_kind: &str) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_record_without_panic() {
        record_draft_created();
        record_published();
        record_vote_cast("accept");
        record_vote_retracted();
        record_decision("Accepted");
        record_rejected("unauthorized");
    }
}
