//! Driven ports (Outbound dependencies)

use crate::domain::{
    GovernanceError, Invitation, Member, MemberId, Proposal, ProposalId, ProposalKey,
    SessionToken, Status, Vote, VoteValue,
};
use crate::events::GovernanceEvent;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Errors raised by an [`EntityStore`] adapter.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness or revision check failed; re-read and retry.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<StoreError> for GovernanceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => GovernanceError::ConflictingWrite(msg),
            other => GovernanceError::Storage(other.to_string()),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence for proposals, votes, members and invitations.
///
/// Adapters guarantee single-record atomicity plus the three compound steps
/// below, each of which must be one indivisible operation:
/// - `replace_proposal` compares the stored revision before writing
/// - `allocate_proposal_id` reads and advances the ID counter
/// - `upsert_vote` and `delete_vote` check the stored proposal is still in
///   Discussion and write the (proposal, voter) record under the same guard
#[async_trait]
pub trait EntityStore: Send + Sync {
    // === PROPOSALS ===

    async fn proposal(&self, key: &ProposalKey) -> StoreResult<Option<Proposal>>;

    async fn proposal_by_id(&self, id: ProposalId) -> StoreResult<Option<Proposal>>;

    /// All proposals ordered by permanent ID, drafts last.
    async fn proposals(&self) -> StoreResult<Vec<Proposal>>;

    /// Proposals in any of `statuses`, ordered like [`proposals`](Self::proposals).
    async fn proposals_by_status(&self, statuses: &[Status]) -> StoreResult<Vec<Proposal>>;

    /// Fails with `Conflict` if the key or permanent ID is already taken.
    async fn insert_proposal(&self, proposal: &Proposal) -> StoreResult<()>;

    /// Overwrite the stored proposal if its revision is still `expected_revision`.
    async fn replace_proposal(&self, expected_revision: u64, proposal: &Proposal)
        -> StoreResult<()>;

    /// Issue the next permanent ID.
    async fn allocate_proposal_id(&self) -> StoreResult<ProposalId>;

    // === VOTES ===

    async fn vote(&self, proposal: &ProposalKey, voter: &MemberId) -> StoreResult<Option<Vote>>;

    async fn votes_for(&self, proposal: &ProposalKey) -> StoreResult<Vec<Vote>>;

    /// Create or overwrite the vote for (proposal, voter). Returns the value
    /// that was replaced, if any. Fails with `Conflict` unless the proposal is
    /// stored and in Discussion.
    async fn upsert_vote(&self, vote: &Vote) -> StoreResult<Option<VoteValue>>;

    /// Remove the vote for (proposal, voter), returning it if it existed.
    /// Fails with `Conflict` unless the proposal is stored and in Discussion.
    async fn delete_vote(&self, proposal: &ProposalKey, voter: &MemberId)
        -> StoreResult<Option<Vote>>;

    // === MEMBERS ===

    async fn member(&self, id: &MemberId) -> StoreResult<Option<Member>>;

    async fn member_by_email(&self, email: &str) -> StoreResult<Option<Member>>;

    /// Fails with `Conflict` on a duplicate email.
    async fn insert_member(&self, member: &Member) -> StoreResult<()>;

    async fn member_count(&self) -> StoreResult<u32>;

    // === INVITATIONS ===

    async fn invitation(&self, uid: &str) -> StoreResult<Option<Invitation>>;

    async fn insert_invitation(&self, invitation: &Invitation) -> StoreResult<()>;

    async fn unsent_invitations(&self) -> StoreResult<Vec<Invitation>>;

    /// Returns `false` if no such invitation exists.
    async fn mark_invitation_sent(&self, uid: &str) -> StoreResult<bool>;

    /// Returns `false` if no such invitation exists.
    async fn delete_invitation(&self, uid: &str) -> StoreResult<bool>;
}

/// Maps a session token onto a member.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// `Ok(None)` means the request is anonymous.
    async fn current_member(&self, session: &SessionToken) -> Result<Option<MemberId>, String>;
}

/// Receives events after the state change they describe is persisted.
#[async_trait]
pub trait GovernanceEventSink: Send + Sync {
    async fn publish(&self, event: GovernanceEvent) -> Result<(), String>;
}

/// Time source for proposal timestamps
pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

impl<T: TimeSource + ?Sized> TimeSource for std::sync::Arc<T> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Default time source using the system clock
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Fixed or manually advanced clock (for testing)
pub struct ManualTimeSource {
    now: parking_lot::RwLock<DateTime<Utc>>,
}

impl ManualTimeSource {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: parking_lot::RwLock::new(now),
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.write();
        *now += by;
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read()
    }
}
