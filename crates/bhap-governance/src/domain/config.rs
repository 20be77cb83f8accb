//! Governance configuration

/// Configuration for the governance service
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GovernanceConfig {
    /// Compare-and-put attempts when applying a tally decision
    pub transition_retries: u32,
    /// Digits used when rendering a permanent ID (`0007`)
    pub id_padding: usize,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            transition_retries: 3,
            id_padding: 4,
        }
    }
}
