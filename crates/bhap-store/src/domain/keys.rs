//! Key layout
//!
//! | Key                         | Value                  |
//! |-----------------------------|------------------------|
//! | `p:{proposal key}`          | `Proposal` (JSON)      |
//! | `i:{id, 10 digits}`         | `ProposalKey` (JSON)   |
//! | `v:{proposal key}:{member}` | `Vote` (JSON)          |
//! | `u:{member id}`             | `Member` (JSON)        |
//! | `e:{email}`                 | `MemberId` (JSON)      |
//! | `n:{uid}`                   | `Invitation` (JSON)    |
//! | `m:last_proposal_id`        | `ProposalId` (JSON)    |
//!
//! ID keys are zero padded so a prefix scan returns them in numeric order.

use bhap_governance::{MemberId, ProposalId, ProposalKey};

/// Record families in the key-value store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyPrefix {
    Proposal,
    ProposalById,
    Vote,
    Member,
    MemberByEmail,
    Invitation,
    Metadata,
}

impl KeyPrefix {
    /// Get the byte prefix for this key type.
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            KeyPrefix::Proposal => b"p:",
            KeyPrefix::ProposalById => b"i:",
            KeyPrefix::Vote => b"v:",
            KeyPrefix::Member => b"u:",
            KeyPrefix::MemberByEmail => b"e:",
            KeyPrefix::Invitation => b"n:",
            KeyPrefix::Metadata => b"m:",
        }
    }

    /// Build a full key with the given suffix.
    pub fn key(&self, suffix: &str) -> Vec<u8> {
        let mut key = self.as_bytes().to_vec();
        key.extend_from_slice(suffix.as_bytes());
        key
    }

    pub fn proposal_key(key: &ProposalKey) -> Vec<u8> {
        KeyPrefix::Proposal.key(key.as_str())
    }

    pub fn proposal_id_key(id: ProposalId) -> Vec<u8> {
        KeyPrefix::ProposalById.key(&format!("{:010}", id.0))
    }

    /// Prefix shared by every vote on `proposal`.
    pub fn votes_prefix(proposal: &ProposalKey) -> Vec<u8> {
        KeyPrefix::Vote.key(&format!("{}:", proposal))
    }

    pub fn vote_key(proposal: &ProposalKey, voter: &MemberId) -> Vec<u8> {
        KeyPrefix::Vote.key(&format!("{}:{}", proposal, voter))
    }

    pub fn member_key(id: &MemberId) -> Vec<u8> {
        KeyPrefix::Member.key(&id.to_string())
    }

    pub fn email_key(email: &str) -> Vec<u8> {
        KeyPrefix::MemberByEmail.key(email)
    }

    pub fn invitation_key(uid: &str) -> Vec<u8> {
        KeyPrefix::Invitation.key(uid)
    }

    pub fn last_proposal_id_key() -> Vec<u8> {
        KeyPrefix::Metadata.key("last_proposal_id")
    }
}
