//! Published events (Outgoing)

use crate::domain::{MemberId, ProposalId, ProposalKey, Status, VoteValue};
use serde::{Deserialize, Serialize};

/// A persisted governance state change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GovernanceEvent {
    DraftCreated {
        proposal: ProposalKey,
        author: MemberId,
    },
    PublishedToDiscussion {
        proposal: ProposalKey,
        id: ProposalId,
    },
    Withdrawn {
        proposal: ProposalKey,
        /// Status the proposal was withdrawn from
        from: Status,
    },
    Edited {
        proposal: ProposalKey,
    },
    VoteCast {
        proposal: ProposalKey,
        voter: MemberId,
        value: VoteValue,
        /// Value of the vote this one overwrote
        replaced: Option<VoteValue>,
    },
    VoteRetracted {
        proposal: ProposalKey,
        voter: MemberId,
    },
    /// The tally carried the proposal to Accepted or Rejected
    Decided {
        proposal: ProposalKey,
        id: Option<ProposalId>,
        outcome: Status,
    },
    MemberJoined {
        member: MemberId,
        email: String,
    },
    InvitationIssued {
        uid: String,
        email: String,
    },
}

impl GovernanceEvent {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            GovernanceEvent::DraftCreated { .. } => "draft_created",
            GovernanceEvent::PublishedToDiscussion { .. } => "published_to_discussion",
            GovernanceEvent::Withdrawn { .. } => "withdrawn",
            GovernanceEvent::Edited { .. } => "edited",
            GovernanceEvent::VoteCast { .. } => "vote_cast",
            GovernanceEvent::VoteRetracted { .. } => "vote_retracted",
            GovernanceEvent::Decided { .. } => "decided",
            GovernanceEvent::MemberJoined { .. } => "member_joined",
            GovernanceEvent::InvitationIssued { .. } => "invitation_issued",
        }
    }

    /// The proposal this event concerns, if any.
    pub fn proposal(&self) -> Option<&ProposalKey> {
        match self {
            GovernanceEvent::DraftCreated { proposal, .. }
            | GovernanceEvent::PublishedToDiscussion { proposal, .. }
            | GovernanceEvent::Withdrawn { proposal, .. }
            | GovernanceEvent::Edited { proposal }
            | GovernanceEvent::VoteCast { proposal, .. }
            | GovernanceEvent::VoteRetracted { proposal, .. }
            | GovernanceEvent::Decided { proposal, .. } => Some(proposal),
            GovernanceEvent::MemberJoined { .. } | GovernanceEvent::InvitationIssued { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_variant_tag() {
        let event = GovernanceEvent::Decided {
            proposal: ProposalKey::from("abc"),
            id: Some(ProposalId(3)),
            outcome: Status::Accepted,
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["Decided"]["outcome"], "Accepted");
        assert_eq!(json["Decided"]["id"], 3);
        assert_eq!(event.name(), "decided");
        assert_eq!(event.proposal(), Some(&ProposalKey::from("abc")));
    }
}
