//! Domain layer for the governance subsystem
//!
//! - entities: proposals, votes, members, invitations
//! - lifecycle: status transition table and author guards
//! - tally: quorum decision over a proposal's votes
//! - sequencer: permanent ID issuance

mod config;
mod entities;
mod error;
pub mod lifecycle;
mod sequencer;
mod tally;

pub use config::*;
pub use entities::*;
pub use error::*;
pub use lifecycle::{is_editable, AvailableActions};
pub use sequencer::*;
pub use tally::*;
