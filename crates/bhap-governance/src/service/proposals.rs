//! # Proposal Lifecycle Operations
//!
//! Draft creation, publication, withdrawal, edits and the per-viewer read model.

use super::*;
use crate::domain::{is_editable, lifecycle, Action, AvailableActions, Tally};
use tracing::info;

impl<S, I, E> GovernanceService<S, I, E>
where
    S: EntityStore,
    I: IdentityResolver,
    E: GovernanceEventSink,
{
    pub(super) async fn create_draft_inner(
        &self,
        session: &SessionToken,
        draft: NewProposal,
    ) -> GovernanceResult<Proposal> {
        let author = self.authenticate(session).await?;
        if draft.title.trim().is_empty() {
            return Err(GovernanceError::InvalidInput("title must not be empty".into()));
        }

        let proposal = Proposal::new_draft(author.id, draft, self.time_source.now());
        self.store.insert_proposal(&proposal).await?;

        info!(
            proposal = %proposal.key(),
            author = %author.id,
            "[governance] Draft created: {}",
            proposal.title
        );
        metrics::record_draft_created();
        self.emit(GovernanceEvent::DraftCreated {
            proposal: proposal.key().clone(),
            author: author.id,
        })
        .await;
        Ok(proposal)
    }

    pub(super) async fn publish_inner(
        &self,
        session: &SessionToken,
        reference: &ProposalRef,
    ) -> GovernanceResult<Proposal> {
        let member = self.authenticate(session).await?;
        let current = self.load(reference).await?;
        // Checked before allocation so rejected requests do not consume IDs.
        lifecycle::validate(Action::Publish, &current, &member.id)?;

        let id = self.store.allocate_proposal_id().await?;
        let published = lifecycle::publish(&current, &member.id, id, self.time_source.now())?;
        self.persist(&current, &published).await?;

        info!(
            proposal = %published.key(),
            id = %id,
            "[governance] BHAP {} moved to Discussion",
            id.padded(self.config.id_padding)
        );
        metrics::record_published();
        self.emit(GovernanceEvent::PublishedToDiscussion {
            proposal: published.key().clone(),
            id,
        })
        .await;
        Ok(published)
    }

    pub(super) async fn withdraw_inner(
        &self,
        session: &SessionToken,
        reference: &ProposalRef,
    ) -> GovernanceResult<Proposal> {
        let member = self.authenticate(session).await?;
        let current = self.load(reference).await?;
        let withdrawn = lifecycle::withdraw(&current, &member.id, self.time_source.now())?;
        self.persist(&current, &withdrawn).await?;

        info!(
            proposal = %withdrawn.key(),
            from = %current.status(),
            "[governance] Proposal withdrawn"
        );
        self.emit(GovernanceEvent::Withdrawn {
            proposal: withdrawn.key().clone(),
            from: current.status(),
        })
        .await;
        Ok(withdrawn)
    }

    pub(super) async fn edit_inner(
        &self,
        session: &SessionToken,
        reference: &ProposalRef,
        changes: ProposalEdit,
    ) -> GovernanceResult<Proposal> {
        let member = self.authenticate(session).await?;
        let current = self.load(reference).await?;
        let edited = lifecycle::edit(&current, &member.id, changes, self.time_source.now())?;
        self.persist(&current, &edited).await?;

        info!(proposal = %edited.key(), "[governance] Proposal edited");
        self.emit(GovernanceEvent::Edited {
            proposal: edited.key().clone(),
        })
        .await;
        Ok(edited)
    }

    pub(super) async fn proposal_view_inner(
        &self,
        session: &SessionToken,
        reference: &ProposalRef,
    ) -> GovernanceResult<ProposalView> {
        let viewer = self.viewer(session).await?;
        let proposal = self.load(reference).await?;

        let author_name = match self.store.member(&proposal.author()).await? {
            Some(author) => author.display_name(),
            None => proposal.author().to_string(),
        };
        let votes = self.store.votes_for(proposal.key()).await?;
        let member_count = self.store.member_count().await?;
        let tally = Tally::count(&votes, member_count).summary();
        let viewer_vote = viewer.and_then(|viewer| {
            votes
                .iter()
                .find(|vote| vote.voter == viewer)
                .map(|vote| vote.value)
        });
        let actions =
            AvailableActions::for_viewer(&proposal, viewer.as_ref(), viewer_vote.is_some());
        debug!(
            proposal = %proposal.key(),
            anonymous = viewer.is_none(),
            "[governance] Proposal viewed"
        );

        Ok(ProposalView {
            author_name,
            padded_id: self.padded(&proposal),
            editable: is_editable(proposal.status()) && actions.edit,
            actions,
            tally,
            viewer_vote,
            proposal,
        })
    }
}
