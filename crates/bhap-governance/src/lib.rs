//! # bhap-governance
//!
//! Proposal lifecycle, voting and sequencing for BHAPs (house proposals
//! ratified by a small, fixed body of members).
//!
//! ## Architecture
//!
//! ```text
//!                 ┌──────────────── GovernanceService ────────────────┐
//! GovernanceApi ──┤ lifecycle (guards, transitions)   tally (quorum)  │
//!                 │ sequencer (permanent IDs)                         │
//!                 └───┬──────────────────┬─────────────────────┬──────┘
//!                     ↓                  ↓                     ↓
//!              [EntityStore]    [IdentityResolver]   [GovernanceEventSink]
//! ```
//!
//! ### Lifecycle
//!
//! Proposals start in Draft, addressed by an opaque key. Publishing moves them
//! to Discussion and assigns a permanent number. Only the author may publish,
//! edit or withdraw; only other members may vote. Once every eligible member
//! has voted, a strict majority moves the proposal to Accepted or Rejected.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bhap_governance::{GovernanceDependencies, GovernanceService, GovernanceApi};
//!
//! let service = GovernanceService::new(GovernanceDependencies {
//!     store,
//!     identity,
//!     events,
//!     config: GovernanceConfig::default(),
//! });
//!
//! let draft = service.create_draft(&session, new_proposal).await?;
//! let published = service.publish_to_discussion(&session, &draft.reference()).await?;
//! ```

pub mod adapters;
pub mod domain;
pub mod events;
pub mod metrics;
pub mod ports;
pub mod service;

// Re-export main types
pub use adapters::{
    InMemoryEntityStore, InMemoryEventSink, InMemoryIdentityResolver, LoggingEventSink,
};
pub use domain::{
    AvailableActions, ErrorKind, GovernanceConfig, GovernanceError, GovernanceResult, Invitation,
    Member, MemberId, NewMember, NewProposal, Proposal, ProposalEdit, ProposalId, ProposalKey,
    ProposalRef, ProposalType, SessionToken, Status, Tally, TallySummary, Vote, VoteValue,
};
pub use events::GovernanceEvent;
pub use ports::{
    EntityStore, GovernanceApi, GovernanceEventSink, IdentityResolver, ProposalView, StoreError,
    StoreResult, TimeSource, VoteReceipt,
};
pub use service::{GovernanceDependencies, GovernanceService};
