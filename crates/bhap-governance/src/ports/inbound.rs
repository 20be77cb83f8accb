//! Driving ports (Inbound API)

use crate::domain::{
    AvailableActions, GovernanceResult, Invitation, Member, NewMember, NewProposal, Proposal,
    ProposalEdit, ProposalRef, SessionToken, Status, TallySummary, VoteValue,
};
use async_trait::async_trait;

/// Outcome of a successful `cast_vote`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoteReceipt {
    /// Value of the vote this cast overwrote
    pub replaced: Option<VoteValue>,
    /// Tally after the cast
    pub tally: TallySummary,
    /// Proposal status after any decision the cast triggered
    pub status: Status,
}

/// Read model of one proposal for one viewer.
#[derive(Clone, Debug, PartialEq)]
pub struct ProposalView {
    pub proposal: Proposal,
    /// `First Last <email>` of the author
    pub author_name: String,
    /// Zero-padded permanent ID, `None` for drafts
    pub padded_id: Option<String>,
    pub editable: bool,
    pub actions: AvailableActions,
    pub tally: TallySummary,
    pub viewer_vote: Option<VoteValue>,
}

/// Primary Governance API
#[async_trait]
pub trait GovernanceApi: Send + Sync {
    // === PROPOSAL LIFECYCLE ===

    /// Create a proposal in Draft authored by the session's member
    async fn create_draft(
        &self,
        session: &SessionToken,
        draft: NewProposal,
    ) -> GovernanceResult<Proposal>;

    /// Draft → Discussion, assigning the next permanent ID
    async fn publish_to_discussion(
        &self,
        session: &SessionToken,
        proposal: &ProposalRef,
    ) -> GovernanceResult<Proposal>;

    /// Draft or Discussion → Withdrawn
    async fn withdraw(
        &self,
        session: &SessionToken,
        proposal: &ProposalRef,
    ) -> GovernanceResult<Proposal>;

    async fn edit(
        &self,
        session: &SessionToken,
        proposal: &ProposalRef,
        changes: ProposalEdit,
    ) -> GovernanceResult<Proposal>;

    // === VOTING ===

    /// Cast or replace the session member's vote, then tally
    async fn cast_vote(
        &self,
        session: &SessionToken,
        proposal: &ProposalRef,
        value: VoteValue,
    ) -> GovernanceResult<VoteReceipt>;

    async fn retract_vote(
        &self,
        session: &SessionToken,
        proposal: &ProposalRef,
    ) -> GovernanceResult<()>;

    // === QUERIES ===

    /// Anonymous sessions may view; they get no actions.
    async fn proposal_view(
        &self,
        session: &SessionToken,
        proposal: &ProposalRef,
    ) -> GovernanceResult<ProposalView>;

    /// `None` lists every proposal.
    async fn list_proposals(&self, statuses: Option<&[Status]>) -> GovernanceResult<Vec<Proposal>>;

    // === MEMBERSHIP ===

    async fn invite(&self, email: &str) -> GovernanceResult<Invitation>;

    async fn redeem_invitation(&self, uid: &str, member: NewMember) -> GovernanceResult<Member>;

    async fn unsent_invitations(&self) -> GovernanceResult<Vec<Invitation>>;

    async fn mark_invitation_sent(&self, uid: &str) -> GovernanceResult<()>;
}
