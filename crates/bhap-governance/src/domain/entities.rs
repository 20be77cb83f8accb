//! Governance entities
//!
//! Proposals, votes, members and invitations as persisted by the Entity Store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle status of a proposal.
///
/// ```text
/// [Draft] ──ready──→ [Discussion] ──quorum accept──→ [Accepted]
///    │                    │ └──────quorum reject──→ [Rejected]
///    └──withdraw──→ [Withdrawn] ←──withdraw──┘
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Draft,
    Discussion,
    Accepted,
    Rejected,
    Withdrawn,
}

impl Status {
    pub const ALL: [Status; 5] = [
        Status::Draft,
        Status::Discussion,
        Status::Accepted,
        Status::Rejected,
        Status::Withdrawn,
    ];

    /// No transition leaves a terminal status.
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Accepted | Status::Rejected | Status::Withdrawn)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Draft => "Draft",
            Status::Discussion => "Discussion",
            Status::Accepted => "Accepted",
            Status::Rejected => "Rejected",
            Status::Withdrawn => "Withdrawn",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown status: {s}"))
    }
}

/// A member's ballot on a proposal in Discussion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteValue {
    Accept,
    Reject,
}

impl VoteValue {
    /// The status a proposal moves to when this value carries the quorum.
    pub fn outcome(self) -> Status {
        match self {
            VoteValue::Accept => Status::Accepted,
            VoteValue::Reject => Status::Rejected,
        }
    }
}

impl fmt::Display for VoteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoteValue::Accept => f.write_str("accept"),
            VoteValue::Reject => f.write_str("reject"),
        }
    }
}

impl FromStr for VoteValue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accept" | "accepted" | "yes" => Ok(VoteValue::Accept),
            "reject" | "rejected" | "no" => Ok(VoteValue::Reject),
            other => Err(format!("unknown vote value: {other}")),
        }
    }
}

/// Kind of rule a proposal introduces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalType {
    /// Describes the proposal process itself.
    Meta,
    /// A rule house members must follow. Most proposals are of this type.
    #[default]
    HouseRule,
}

impl fmt::Display for ProposalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProposalType::Meta => f.write_str("Meta"),
            ProposalType::HouseRule => f.write_str("House Rule"),
        }
    }
}

/// Record key issued when a proposal is created. Doubles as the draft token.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProposalKey(String);

impl ProposalKey {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProposalKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ProposalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Permanent number assigned when a proposal leaves Draft.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ProposalId(pub u32);

impl ProposalId {
    /// Zero-padded rendering, e.g. `0007` for a width of 4.
    pub fn padded(self, width: usize) -> String {
        format!("{:0width$}", self.0, width = width)
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How callers address a proposal.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ProposalRef {
    Draft(ProposalKey),
    Published(ProposalId),
}

impl fmt::Display for ProposalRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProposalRef::Draft(key) => write!(f, "draft {key}"),
            ProposalRef::Published(id) => write!(f, "#{id}"),
        }
    }
}

impl FromStr for ProposalRef {
    type Err = String;

    /// Numbers address published proposals; anything else is a draft token.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().trim_start_matches('#');
        if s.is_empty() {
            return Err("empty proposal reference".to_string());
        }
        match s.parse::<u32>() {
            Ok(id) => Ok(ProposalRef::Published(ProposalId(id))),
            Err(_) => Ok(ProposalRef::Draft(ProposalKey::from(s))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemberId(Uuid);

impl MemberId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque credential presented by an inbound request.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionToken(pub String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

/// A proposal ("BHAP").
///
/// INVARIANT: `status == Draft` exactly when `id` is `None`. The ID is set once,
/// on leaving Draft, and never changes afterwards. Status and ID are only
/// mutated through the lifecycle engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    key: ProposalKey,
    id: Option<ProposalId>,
    pub title: String,
    pub short_description: String,
    /// Stored in Markdown.
    pub content: String,
    author: MemberId,
    status: Status,
    pub proposal_type: ProposalType,
    created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    /// Bumped on every persisted mutation (optimistic concurrency).
    revision: u64,
}

impl Proposal {
    /// Create a fresh draft authored by `author`.
    pub fn new_draft(author: MemberId, draft: NewProposal, now: DateTime<Utc>) -> Self {
        Self {
            key: ProposalKey::generate(),
            id: None,
            title: draft.title,
            short_description: draft.short_description,
            content: draft.content,
            author,
            status: Status::Draft,
            proposal_type: draft.proposal_type,
            created_at: now,
            last_modified: now,
            revision: 0,
        }
    }

    pub fn key(&self) -> &ProposalKey {
        &self.key
    }

    pub fn id(&self) -> Option<ProposalId> {
        self.id
    }

    pub fn author(&self) -> MemberId {
        self.author
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_author(&self, member: &MemberId) -> bool {
        self.author == *member
    }

    /// The identifier callers should use from now on.
    pub fn reference(&self) -> ProposalRef {
        match self.id {
            Some(id) => ProposalRef::Published(id),
            None => ProposalRef::Draft(self.key.clone()),
        }
    }

    pub fn matches(&self, reference: &ProposalRef) -> bool {
        match reference {
            ProposalRef::Draft(key) => self.key == *key,
            ProposalRef::Published(id) => self.id == Some(*id),
        }
    }

    /// Listing order: by permanent ID, drafts last (oldest first).
    pub fn listing_order(a: &Proposal, b: &Proposal) -> std::cmp::Ordering {
        match (a.id, b.id) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a
                .created_at
                .cmp(&b.created_at)
                .then_with(|| a.key.cmp(&b.key)),
        }
    }

    pub(crate) fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    pub(crate) fn assign_id(&mut self, id: ProposalId) {
        debug_assert!(self.id.is_none(), "proposal ID is assigned once");
        self.id = Some(id);
    }

    pub(crate) fn bump_revision(&mut self) {
        self.revision += 1;
    }
}

/// Input for `create_draft`.
#[derive(Clone, Debug, Default)]
pub struct NewProposal {
    pub title: String,
    pub short_description: String,
    pub content: String,
    pub proposal_type: ProposalType,
}

/// Fields an author may change while the proposal is editable.
/// `None` leaves the field untouched.
#[derive(Clone, Debug, Default)]
pub struct ProposalEdit {
    pub title: Option<String>,
    pub short_description: Option<String>,
    pub content: Option<String>,
}

impl ProposalEdit {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.short_description.is_none() && self.content.is_none()
    }
}

/// One member's vote on one proposal. At most one exists per (proposal, voter).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub proposal: ProposalKey,
    pub voter: MemberId,
    pub value: VoteValue,
}

/// A member of the voting body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Produced and checked by the authentication layer; opaque here.
    pub credential_hash: Vec<u8>,
}

impl Member {
    pub fn new(
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        credential_hash: Vec<u8>,
    ) -> Self {
        Self {
            id: MemberId::generate(),
            email: email.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            credential_hash,
        }
    }

    pub fn display_name(&self) -> String {
        format!("{} {} <{}>", self.first_name, self.last_name, self.email)
    }
}

/// Input for redeeming an invitation.
#[derive(Clone, Debug, Default)]
pub struct NewMember {
    pub first_name: String,
    pub last_name: String,
    pub credential_hash: Vec<u8>,
}

/// An outstanding offer to join, addressed to an email.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    pub uid: String,
    pub email: String,
    pub email_sent: bool,
}

impl Invitation {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            uid: Uuid::new_v4().simple().to_string(),
            email: email.into(),
            email_sent: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_draft_has_no_id() {
        let author = MemberId::generate();
        let draft = Proposal::new_draft(author, NewProposal::default(), Utc::now());

        assert_eq!(draft.status(), Status::Draft);
        assert_eq!(draft.id(), None);
        assert_eq!(draft.revision(), 0);
        assert!(draft.is_author(&author));
        assert_eq!(draft.reference(), ProposalRef::Draft(draft.key().clone()));
    }

    #[test]
    fn test_proposal_ref_parsing() {
        assert_eq!(
            "12".parse::<ProposalRef>().unwrap(),
            ProposalRef::Published(ProposalId(12))
        );
        assert_eq!(
            "#0007".parse::<ProposalRef>().unwrap(),
            ProposalRef::Published(ProposalId(7))
        );
        assert_eq!(
            "3f2a9c".parse::<ProposalRef>().unwrap(),
            ProposalRef::Draft(ProposalKey::from("3f2a9c"))
        );
        assert!("".parse::<ProposalRef>().is_err());
    }

    #[test]
    fn test_padded_id() {
        assert_eq!(ProposalId(7).padded(4), "0007");
        assert_eq!(ProposalId(12345).padded(4), "12345");
    }

    #[test]
    fn test_status_parsing_is_case_insensitive() {
        assert_eq!("discussion".parse::<Status>().unwrap(), Status::Discussion);
        assert_eq!("ACCEPTED".parse::<Status>().unwrap(), Status::Accepted);
        assert!("Replaced".parse::<Status>().is_err());
    }

    #[test]
    fn test_vote_value_outcome() {
        assert_eq!(VoteValue::Accept.outcome(), Status::Accepted);
        assert_eq!(VoteValue::Reject.outcome(), Status::Rejected);
    }

    #[test]
    fn test_member_display_name() {
        let member = Member::new("ada@example.com", "Ada", "Lovelace", vec![]);
        assert_eq!(member.display_name(), "Ada Lovelace <ada@example.com>");
    }
}
