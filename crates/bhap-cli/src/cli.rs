//! Command-line surface.

use bhap_governance::{ProposalRef, Status, VoteValue};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "bhap", about = "House proposals: draft, discuss, vote, ratify")]
#[command(version)]
pub struct Cli {
    /// Data file for the file backend
    #[arg(long, global = true)]
    pub data_file: Option<PathBuf>,

    /// Keep records in memory only (nothing survives the command)
    #[arg(long, global = true, conflicts_with = "data_file")]
    pub memory: bool,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// The acting member.
#[derive(Args, Debug, Clone)]
pub struct Actor {
    /// Email of the member performing the action
    #[arg(long = "as", value_name = "EMAIL", env = "BHAP_AS")]
    pub email: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Invite someone to become a member
    Invite {
        email: String,
    },

    /// Redeem an invitation and become a member
    Join {
        /// Invitation UID
        uid: String,
        #[arg(long)]
        first: String,
        #[arg(long)]
        last: String,
        /// Opaque credential hash, hex encoded
        #[arg(long, value_name = "HEX")]
        credential_hash: Option<String>,
    },

    /// Create a draft proposal
    Propose {
        #[command(flatten)]
        actor: Actor,
        #[arg(long)]
        title: String,
        /// One-line summary
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        content: String,
        /// Proposal changes the proposal process itself
        #[arg(long)]
        meta: bool,
    },

    /// Move a draft into discussion, assigning its number
    Publish {
        #[command(flatten)]
        actor: Actor,
        /// Proposal number or draft token
        reference: ProposalRef,
    },

    /// Withdraw a draft or a proposal under discussion
    Withdraw {
        #[command(flatten)]
        actor: Actor,
        reference: ProposalRef,
    },

    /// Change the text of a draft or a proposal under discussion
    Edit {
        #[command(flatten)]
        actor: Actor,
        reference: ProposalRef,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        content: Option<String>,
    },

    /// Vote on a proposal under discussion, replacing any earlier vote
    Vote {
        #[command(flatten)]
        actor: Actor,
        reference: ProposalRef,
        /// accept or reject
        value: VoteValue,
    },

    /// Take back a vote
    Retract {
        #[command(flatten)]
        actor: Actor,
        reference: ProposalRef,
    },

    /// Show one proposal with its tally
    Show {
        /// View as this member, to see available actions
        #[arg(long = "as", value_name = "EMAIL")]
        email: Option<String>,
        reference: ProposalRef,
    },

    /// List proposals, optionally filtered by status
    List {
        /// Repeat to include several statuses
        #[arg(long)]
        status: Vec<Status>,
    },

    /// List invitations whose email has not been sent
    Invitations {
        /// Mark every listed invitation as sent
        #[arg(long)]
        mark_sent: bool,
    },
}

impl Command {
    /// Operation name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Invite { .. } => "invite",
            Command::Join { .. } => "join",
            Command::Propose { .. } => "propose",
            Command::Publish { .. } => "publish",
            Command::Withdraw { .. } => "withdraw",
            Command::Edit { .. } => "edit",
            Command::Vote { .. } => "vote",
            Command::Retract { .. } => "retract",
            Command::Show { .. } => "show",
            Command::List { .. } => "list",
            Command::Invitations { .. } => "invitations",
        }
    }
}
