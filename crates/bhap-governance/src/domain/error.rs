//! Error types for the governance subsystem

use super::{ProposalRef, Status};
use std::fmt;

/// Coarse error category surfaced to callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Unauthenticated,
    Unauthorized,
    InvalidTransition,
    ConflictingWrite,
    InvalidInput,
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Unauthenticated => "unauthenticated",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::InvalidTransition => "invalid_transition",
            ErrorKind::ConflictingWrite => "conflicting_write",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which party an action is reserved for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Author,
    NonAuthor,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Author => f.write_str("the author"),
            Role::NonAuthor => f.write_str("a member other than the author"),
        }
    }
}

/// Governance error types
#[derive(Debug, thiserror::Error)]
pub enum GovernanceError {
    #[error("Proposal not found: {0}")]
    ProposalNotFound(ProposalRef),

    #[error("No vote recorded for this member on {0}")]
    VoteNotFound(ProposalRef),

    #[error("Member not found: {0}")]
    MemberNotFound(String),

    #[error("Invitation not found: {0}")]
    InvitationNotFound(String),

    #[error("No valid session")]
    Unauthenticated,

    #[error("Only {required} may {action}")]
    Unauthorized { action: Action, required: Role },

    #[error("Cannot {action} a proposal in {status}")]
    InvalidTransition { action: Action, status: Status },

    #[error("Conflicting write: {0}")]
    ConflictingWrite(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl GovernanceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GovernanceError::ProposalNotFound(_)
            | GovernanceError::VoteNotFound(_)
            | GovernanceError::MemberNotFound(_)
            | GovernanceError::InvitationNotFound(_) => ErrorKind::NotFound,
            GovernanceError::Unauthenticated => ErrorKind::Unauthenticated,
            GovernanceError::Unauthorized { .. } => ErrorKind::Unauthorized,
            GovernanceError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            GovernanceError::ConflictingWrite(_) => ErrorKind::ConflictingWrite,
            GovernanceError::InvalidInput(_) => ErrorKind::InvalidInput,
            GovernanceError::Storage(_) => ErrorKind::Internal,
        }
    }
}

/// Every operation a member can request on a proposal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Publish,
    Withdraw,
    Edit,
    Vote,
    RetractVote,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Publish => f.write_str("publish"),
            Action::Withdraw => f.write_str("withdraw"),
            Action::Edit => f.write_str("edit"),
            Action::Vote => f.write_str("vote on"),
            Action::RetractVote => f.write_str("retract a vote on"),
        }
    }
}

/// Result type for governance operations
pub type GovernanceResult<T> = Result<T, GovernanceError>;
