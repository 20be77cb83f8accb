//! # Governance Service
//!
//! Binds the Lifecycle Engine, Voting Engine and Sequencer to the driven
//! ports and implements [`GovernanceApi`].
//!
//! ## Request Flow
//!
//! ```text
//! session ──→ [IdentityResolver] ──→ member          (Unauthenticated)
//! reference ─→ [EntityStore] ───────→ proposal        (NotFound)
//!                   lifecycle::validate              (Unauthorized, InvalidTransition)
//!                   store write (compare-and-put)    (ConflictingWrite)
//!                   [GovernanceEventSink]            (failures logged only)
//! ```
//!
//! Nothing is written until every check has passed.

mod membership;
mod proposals;
mod voting;

use crate::domain::{
    ErrorKind, GovernanceConfig, GovernanceError, GovernanceResult, Invitation, Member, MemberId,
    NewMember, NewProposal, Proposal, ProposalEdit, ProposalRef, SessionToken, Status,
    VoteValue,
};
use crate::events::GovernanceEvent;
use crate::metrics;
use crate::ports::{
    EntityStore, GovernanceApi, GovernanceEventSink, IdentityResolver, ProposalView,
    SystemTimeSource, TimeSource, VoteReceipt,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Governance Service
pub struct GovernanceService<S, I, E>
where
    S: EntityStore,
    I: IdentityResolver,
    E: GovernanceEventSink,
{
    store: Arc<S>,
    identity: Arc<I>,
    events: Arc<E>,
    config: GovernanceConfig,
    time_source: Box<dyn TimeSource>,
}

/// Dependencies for GovernanceService
pub struct GovernanceDependencies<S, I, E> {
    pub store: Arc<S>,
    pub identity: Arc<I>,
    pub events: Arc<E>,
    pub config: GovernanceConfig,
}

impl<S, I, E> GovernanceService<S, I, E>
where
    S: EntityStore,
    I: IdentityResolver,
    E: GovernanceEventSink,
{
    /// Create a new GovernanceService
    pub fn new(deps: GovernanceDependencies<S, I, E>) -> Self {
        Self {
            store: deps.store,
            identity: deps.identity,
            events: deps.events,
            config: deps.config,
            time_source: Box::new(SystemTimeSource),
        }
    }

    /// Set custom time source (for testing)
    pub fn with_time_source(mut self, time_source: Box<dyn TimeSource>) -> Self {
        self.time_source = time_source;
        self
    }

    pub fn config(&self) -> &GovernanceConfig {
        &self.config
    }

    // === HELPERS ===

    /// Resolve the session to a known member.
    async fn authenticate(&self, session: &SessionToken) -> GovernanceResult<Member> {
        let member_id = self
            .identity
            .current_member(session)
            .await
            .map_err(GovernanceError::Storage)?
            .ok_or(GovernanceError::Unauthenticated)?;
        self.store
            .member(&member_id)
            .await?
            .ok_or(GovernanceError::Unauthenticated)
    }

    /// Like [`authenticate`](Self::authenticate), but anonymous is allowed.
    async fn viewer(&self, session: &SessionToken) -> GovernanceResult<Option<MemberId>> {
        self.identity
            .current_member(session)
            .await
            .map_err(GovernanceError::Storage)
    }

    async fn load(&self, reference: &ProposalRef) -> GovernanceResult<Proposal> {
        let found = match reference {
            ProposalRef::Draft(key) => self.store.proposal(key).await?,
            ProposalRef::Published(id) => self.store.proposal_by_id(*id).await?,
        };
        found.ok_or_else(|| GovernanceError::ProposalNotFound(reference.clone()))
    }

    /// Compare-and-put `after` over `before`.
    async fn persist(&self, before: &Proposal, after: &Proposal) -> GovernanceResult<()> {
        self.store
            .replace_proposal(before.revision(), after)
            .await
            .map_err(GovernanceError::from)
    }

    /// The state change is already persisted, so a sink failure is only logged.
    async fn emit(&self, event: GovernanceEvent) {
        let name = event.name();
        if let Err(e) = self.events.publish(event).await {
            warn!("[governance] Failed to publish {} event: {}", name, e);
        }
    }

    fn padded(&self, proposal: &Proposal) -> Option<String> {
        proposal.id().map(|id| id.padded(self.config.id_padding))
    }

    /// Log and count a failed operation.
    fn track<T>(&self, operation: &'static str, result: GovernanceResult<T>) -> GovernanceResult<T> {
        if let Err(e) = &result {
            let kind = e.kind();
            metrics::record_rejected(kind.as_str());
            match kind {
                ErrorKind::Internal | ErrorKind::ConflictingWrite => {
                    warn!(operation, kind = %kind, error = %e, "[governance] Operation failed")
                }
                _ => debug!(operation, kind = %kind, error = %e, "[governance] Operation rejected"),
            }
        }
        result
    }
}

#[async_trait]
impl<S, I, E> GovernanceApi for GovernanceService<S, I, E>
where
    S: EntityStore,
    I: IdentityResolver,
    E: GovernanceEventSink,
{
    async fn create_draft(
        &self,
        session: &SessionToken,
        draft: NewProposal,
    ) -> GovernanceResult<Proposal> {
        let result = self.create_draft_inner(session, draft).await;
        self.track("create_draft", result)
    }

    async fn publish_to_discussion(
        &self,
        session: &SessionToken,
        proposal: &ProposalRef,
    ) -> GovernanceResult<Proposal> {
        let result = self.publish_inner(session, proposal).await;
        self.track("publish_to_discussion", result)
    }

    async fn withdraw(
        &self,
        session: &SessionToken,
        proposal: &ProposalRef,
    ) -> GovernanceResult<Proposal> {
        let result = self.withdraw_inner(session, proposal).await;
        self.track("withdraw", result)
    }

    async fn edit(
        &self,
        session: &SessionToken,
        proposal: &ProposalRef,
        changes: ProposalEdit,
    ) -> GovernanceResult<Proposal> {
        let result = self.edit_inner(session, proposal, changes).await;
        self.track("edit", result)
    }

    async fn cast_vote(
        &self,
        session: &SessionToken,
        proposal: &ProposalRef,
        value: VoteValue,
    ) -> GovernanceResult<VoteReceipt> {
        let result = self.cast_vote_inner(session, proposal, value).await;
        self.track("cast_vote", result)
    }

    async fn retract_vote(
        &self,
        session: &SessionToken,
        proposal: &ProposalRef,
    ) -> GovernanceResult<()> {
        let result = self.retract_vote_inner(session, proposal).await;
        self.track("retract_vote", result)
    }

    async fn proposal_view(
        &self,
        session: &SessionToken,
        proposal: &ProposalRef,
    ) -> GovernanceResult<ProposalView> {
        let result = self.proposal_view_inner(session, proposal).await;
        self.track("proposal_view", result)
    }

    async fn list_proposals(&self, statuses: Option<&[Status]>) -> GovernanceResult<Vec<Proposal>> {
        let result = match statuses {
            Some(statuses) => self.store.proposals_by_status(statuses).await,
            None => self.store.proposals().await,
        }
        .map_err(GovernanceError::from);
        self.track("list_proposals", result)
    }

    async fn invite(&self, email: &str) -> GovernanceResult<Invitation> {
        let result = self.invite_inner(email).await;
        self.track("invite", result)
    }

    async fn redeem_invitation(&self, uid: &str, member: NewMember) -> GovernanceResult<Member> {
        let result = self.redeem_invitation_inner(uid, member).await;
        self.track("redeem_invitation", result)
    }

    async fn unsent_invitations(&self) -> GovernanceResult<Vec<Invitation>> {
        let result = self
            .store
            .unsent_invitations()
            .await
            .map_err(GovernanceError::from);
        self.track("unsent_invitations", result)
    }

    async fn mark_invitation_sent(&self, uid: &str) -> GovernanceResult<()> {
        let result = match self.store.mark_invitation_sent(uid).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(GovernanceError::InvitationNotFound(uid.to_string())),
            Err(e) => Err(e.into()),
        };
        self.track("mark_invitation_sent", result)
    }
}
