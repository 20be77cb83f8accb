//! Proposal Lifecycle Engine
//!
//! Owns the status transition table and the author / non-author guards.
//! Everything here is pure: callers load state, ask the engine, and persist
//! the returned proposal themselves.
//!
//! ## Transition Table
//!
//! | From               | Action   | Guard       | To                    |
//! |--------------------|----------|-------------|-----------------------|
//! | Draft              | Publish  | author      | Discussion            |
//! | Draft, Discussion  | Withdraw | author      | Withdrawn             |
//! | Draft, Discussion  | Edit     | author      | (unchanged)           |
//! | Discussion         | Vote     | non-author  | (tally may decide)    |
//! | Discussion         | Retract  | non-author  | (unchanged)           |
//! | Discussion         | (tally)  | system      | Accepted / Rejected   |
//!
//! Guards are checked before status, so a non-author asking to publish an
//! Accepted proposal is told `Unauthorized`, not `InvalidTransition`.

use super::{
    Action, GovernanceError, GovernanceResult, MemberId, Proposal, ProposalEdit, ProposalId,
    Role, Status, VoteValue,
};
use chrono::{DateTime, Utc};

/// Only Draft and Discussion proposals accept edits.
pub fn is_editable(status: Status) -> bool {
    matches!(status, Status::Draft | Status::Discussion)
}

/// The party `action` is reserved for.
pub fn required_role(action: Action) -> Role {
    match action {
        Action::Publish | Action::Withdraw | Action::Edit => Role::Author,
        Action::Vote | Action::RetractVote => Role::NonAuthor,
    }
}

/// Whether `action` is legal from `status`, ignoring who asks.
pub fn permits(action: Action, status: Status) -> bool {
    match action {
        Action::Publish => status == Status::Draft,
        Action::Withdraw | Action::Edit => is_editable(status),
        Action::Vote | Action::RetractVote => status == Status::Discussion,
    }
}

/// Check the author / non-author relation for `action`.
pub fn authorize(action: Action, proposal: &Proposal, actor: &MemberId) -> GovernanceResult<()> {
    let required = required_role(action);
    let allowed = match required {
        Role::Author => proposal.is_author(actor),
        Role::NonAuthor => !proposal.is_author(actor),
    };
    if allowed {
        Ok(())
    } else {
        Err(GovernanceError::Unauthorized { action, required })
    }
}

/// Check that `action` is legal from the proposal's current status.
pub fn check_transition(action: Action, proposal: &Proposal) -> GovernanceResult<()> {
    if permits(action, proposal.status()) {
        Ok(())
    } else {
        Err(GovernanceError::InvalidTransition {
            action,
            status: proposal.status(),
        })
    }
}

/// Guard followed by transition check, in that order.
pub fn validate(action: Action, proposal: &Proposal, actor: &MemberId) -> GovernanceResult<()> {
    authorize(action, proposal, actor)?;
    check_transition(action, proposal)
}

/// Draft → Discussion, assigning the permanent ID.
pub fn publish(
    proposal: &Proposal,
    actor: &MemberId,
    id: ProposalId,
    now: DateTime<Utc>,
) -> GovernanceResult<Proposal> {
    validate(Action::Publish, proposal, actor)?;
    let mut next = proposal.clone();
    next.assign_id(id);
    next.set_status(Status::Discussion);
    next.last_modified = now;
    next.bump_revision();
    Ok(next)
}

/// Draft or Discussion → Withdrawn.
pub fn withdraw(
    proposal: &Proposal,
    actor: &MemberId,
    now: DateTime<Utc>,
) -> GovernanceResult<Proposal> {
    validate(Action::Withdraw, proposal, actor)?;
    let mut next = proposal.clone();
    next.set_status(Status::Withdrawn);
    next.last_modified = now;
    next.bump_revision();
    Ok(next)
}

/// Apply an author's edit. Status is unchanged.
pub fn edit(
    proposal: &Proposal,
    actor: &MemberId,
    changes: ProposalEdit,
    now: DateTime<Utc>,
) -> GovernanceResult<Proposal> {
    validate(Action::Edit, proposal, actor)?;
    if changes.is_empty() {
        return Err(GovernanceError::InvalidInput("edit changes nothing".into()));
    }
    if matches!(&changes.title, Some(title) if title.trim().is_empty()) {
        return Err(GovernanceError::InvalidInput("title must not be empty".into()));
    }

    let mut next = proposal.clone();
    if let Some(title) = changes.title {
        next.title = title;
    }
    if let Some(short_description) = changes.short_description {
        next.short_description = short_description;
    }
    if let Some(content) = changes.content {
        next.content = content;
    }
    next.last_modified = now;
    next.bump_revision();
    Ok(next)
}

/// Discussion → Accepted / Rejected. System-triggered by the tally, so there
/// is no actor guard. Returns `None` if the proposal already left Discussion.
pub fn decide(proposal: &Proposal, outcome: VoteValue, now: DateTime<Utc>) -> Option<Proposal> {
    if proposal.status() != Status::Discussion {
        return None;
    }
    let mut next = proposal.clone();
    next.set_status(outcome.outcome());
    next.last_modified = now;
    next.bump_revision();
    Some(next)
}

/// What a given viewer may do with a proposal right now.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AvailableActions {
    pub publish: bool,
    pub withdraw: bool,
    pub edit: bool,
    /// Casting again replaces the existing vote.
    pub vote: bool,
    pub retract_vote: bool,
}

impl AvailableActions {
    /// Derive the per-viewer affordances. Anonymous viewers get nothing.
    pub fn for_viewer(proposal: &Proposal, viewer: Option<&MemberId>, has_voted: bool) -> Self {
        let Some(viewer) = viewer else {
            return Self::default();
        };
        let status = proposal.status();
        let is_author = proposal.is_author(viewer);
        let allowed = |action: Action| {
            let role_ok = match required_role(action) {
                Role::Author => is_author,
                Role::NonAuthor => !is_author,
            };
            role_ok && permits(action, status)
        };

        Self {
            publish: allowed(Action::Publish),
            withdraw: allowed(Action::Withdraw),
            edit: allowed(Action::Edit),
            vote: allowed(Action::Vote),
            retract_vote: allowed(Action::RetractVote) && has_voted,
        }
    }

    pub fn any(&self) -> bool {
        self.publish || self.withdraw || self.edit || self.vote || self.retract_vote
    }
}
