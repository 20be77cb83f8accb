//! # Voting Operations
//!
//! Vote casting and retraction, and application of the tally decision.
//!
//! The vote write is a single upsert keyed by (proposal, voter), refused by
//! the store once the proposal has left Discussion. The tally that follows
//! re-reads the proposal and applies any decision with a compare-and-put; a
//! concurrent writer forces a re-read, up to `transition_retries` attempts.
//! When the budget runs out the vote still stands and the decision is
//! delayed: the receipt reports Discussion, and the next cast on the proposal
//! (a re-cast of the same vote included) tallies again.

use super::*;
use crate::domain::{lifecycle, Action, ProposalKey, Tally, TallySummary, Vote};
use crate::ports::StoreError;
use tracing::info;

impl<S, I, E> GovernanceService<S, I, E>
where
    S: EntityStore,
    I: IdentityResolver,
    E: GovernanceEventSink,
{
    pub(super) async fn cast_vote_inner(
        &self,
        session: &SessionToken,
        reference: &ProposalRef,
        value: VoteValue,
    ) -> GovernanceResult<VoteReceipt> {
        let voter = self.authenticate(session).await?;
        let proposal = self.load(reference).await?;
        lifecycle::validate(Action::Vote, &proposal, &voter.id)?;

        let vote = Vote {
            proposal: proposal.key().clone(),
            voter: voter.id,
            value,
        };
        let replaced = match self.store.upsert_vote(&vote).await {
            Ok(replaced) => replaced,
            Err(StoreError::Conflict(reason)) => {
                return Err(self
                    .refused_vote_write(reference, Action::Vote, &voter.id, reason)
                    .await)
            }
            Err(e) => return Err(e.into()),
        };

        info!(
            proposal = %proposal.key(),
            voter = %voter.id,
            value = %value,
            replaced = replaced.is_some(),
            "[governance] Vote cast"
        );
        metrics::record_vote_cast(&value.to_string());
        self.emit(GovernanceEvent::VoteCast {
            proposal: proposal.key().clone(),
            voter: voter.id,
            value,
            replaced,
        })
        .await;

        let (tally, status) = self.apply_tally(proposal.key()).await?;
        Ok(VoteReceipt {
            replaced,
            tally,
            status,
        })
    }

    pub(super) async fn retract_vote_inner(
        &self,
        session: &SessionToken,
        reference: &ProposalRef,
    ) -> GovernanceResult<()> {
        let voter = self.authenticate(session).await?;
        let proposal = self.load(reference).await?;
        lifecycle::validate(Action::RetractVote, &proposal, &voter.id)?;

        // Retraction only moves a proposal away from quorum, so no re-tally.
        match self.store.delete_vote(proposal.key(), &voter.id).await {
            Ok(Some(_)) => {}
            Ok(None) => return Err(GovernanceError::VoteNotFound(reference.clone())),
            Err(StoreError::Conflict(reason)) => {
                return Err(self
                    .refused_vote_write(reference, Action::RetractVote, &voter.id, reason)
                    .await)
            }
            Err(e) => return Err(e.into()),
        }

        info!(
            proposal = %proposal.key(),
            voter = %voter.id,
            "[governance] Vote retracted"
        );
        metrics::record_vote_retracted();
        self.emit(GovernanceEvent::VoteRetracted {
            proposal: proposal.key().clone(),
            voter: voter.id,
        })
        .await;
        Ok(())
    }

    /// The store refused a vote write because the proposal changed after it
    /// was loaded. Re-read it and report the guard that now fails.
    async fn refused_vote_write(
        &self,
        reference: &ProposalRef,
        action: Action,
        actor: &MemberId,
        reason: String,
    ) -> GovernanceError {
        let current = match self.load(reference).await {
            Ok(current) => current,
            Err(e) => return e,
        };
        match lifecycle::validate(action, &current, actor) {
            Err(e) => e,
            Ok(()) => GovernanceError::ConflictingWrite(reason),
        }
    }

    /// Count the votes and, if they carry an outcome, move the proposal out of
    /// Discussion. Returns the tally and the resulting status.
    async fn apply_tally(&self, key: &ProposalKey) -> GovernanceResult<(TallySummary, Status)> {
        let attempts = self.config.transition_retries.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let proposal = self
                .store
                .proposal(key)
                .await?
                .ok_or_else(|| GovernanceError::ProposalNotFound(ProposalRef::Draft(key.clone())))?;
            let votes = self.store.votes_for(key).await?;
            let member_count = self.store.member_count().await?;
            let tally = Tally::count(&votes, member_count);

            let Some(outcome) = tally.decision() else {
                debug!(
                    proposal = %key,
                    accepted = tally.accepted,
                    rejected = tally.rejected,
                    population = tally.voting_population,
                    "[governance] No decision yet"
                );
                return Ok((tally.summary(), proposal.status()));
            };
            // Someone else already decided or withdrew it.
            let Some(decided) = lifecycle::decide(&proposal, outcome, self.time_source.now())
            else {
                return Ok((tally.summary(), proposal.status()));
            };

            match self.store.replace_proposal(proposal.revision(), &decided).await {
                Ok(()) => {
                    info!(
                        proposal = %key,
                        outcome = %decided.status(),
                        accepted = tally.accepted,
                        rejected = tally.rejected,
                        "[governance] Quorum reached"
                    );
                    metrics::record_decision(decided.status().as_str());
                    self.emit(GovernanceEvent::Decided {
                        proposal: key.clone(),
                        id: decided.id(),
                        outcome: decided.status(),
                    })
                    .await;
                    return Ok((tally.summary(), decided.status()));
                }
                Err(StoreError::Conflict(reason)) if attempt < attempts => {
                    debug!(
                        proposal = %key,
                        attempt,
                        reason = %reason,
                        "[governance] Decision lost a write race, re-reading"
                    );
                }
                Err(StoreError::Conflict(reason)) => {
                    warn!(
                        proposal = %key,
                        attempts,
                        reason = %reason,
                        "[governance] Decision delayed, retry budget spent"
                    );
                    return Ok((tally.summary(), proposal.status()));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
