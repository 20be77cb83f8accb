//! Command dispatch and plain-text rendering.

use crate::cli::{Actor, Command};
use bhap_governance::{
    GovernanceApi, GovernanceError, GovernanceResult, NewMember, NewProposal, Proposal,
    ProposalEdit, ProposalType, ProposalView, SessionToken, TallySummary, VoteReceipt,
};
use std::fmt::Write;

impl Actor {
    fn session(&self) -> SessionToken {
        SessionToken::new(self.email.clone())
    }
}

/// Run one command against the governance API and render its result.
pub async fn execute<A>(api: &A, command: Command, id_padding: usize) -> GovernanceResult<String>
where
    A: GovernanceApi + ?Sized,
{
    let output = match command {
        Command::Invite { email } => {
            let invitation = api.invite(&email).await?;
            format!(
                "Invited {}\ninvitation: {}",
                invitation.email, invitation.uid
            )
        }

        Command::Join {
            uid,
            first,
            last,
            credential_hash,
        } => {
            let credential_hash = match credential_hash {
                Some(encoded) => hex::decode(encoded.trim()).map_err(|e| {
                    GovernanceError::InvalidInput(format!("credential hash is not hex: {e}"))
                })?,
                None => Vec::new(),
            };
            let member = api
                .redeem_invitation(
                    &uid,
                    NewMember {
                        first_name: first,
                        last_name: last,
                        credential_hash,
                    },
                )
                .await?;
            format!("Welcome, {}", member.display_name())
        }

        Command::Propose {
            actor,
            title,
            description,
            content,
            meta,
        } => {
            let draft = NewProposal {
                title,
                short_description: description,
                content,
                proposal_type: if meta {
                    ProposalType::Meta
                } else {
                    ProposalType::HouseRule
                },
            };
            let proposal = api.create_draft(&actor.session(), draft).await?;
            format!(
                "Created {}: {}\ndraft token: {}",
                label(&proposal, id_padding),
                proposal.title,
                proposal.key()
            )
        }

        Command::Publish { actor, reference } => {
            let proposal = api.publish_to_discussion(&actor.session(), &reference).await?;
            format!(
                "Published {}: {} (now in {})",
                label(&proposal, id_padding),
                proposal.title,
                proposal.status()
            )
        }

        Command::Withdraw { actor, reference } => {
            let proposal = api.withdraw(&actor.session(), &reference).await?;
            format!("Withdrew {}: {}", label(&proposal, id_padding), proposal.title)
        }

        Command::Edit {
            actor,
            reference,
            title,
            description,
            content,
        } => {
            let changes = ProposalEdit {
                title,
                short_description: description,
                content,
            };
            let proposal = api.edit(&actor.session(), &reference, changes).await?;
            format!("Updated {}: {}", label(&proposal, id_padding), proposal.title)
        }

        Command::Vote {
            actor,
            reference,
            value,
        } => {
            let receipt = api.cast_vote(&actor.session(), &reference, value).await?;
            render_receipt(&reference.to_string(), value, &receipt)
        }

        Command::Retract { actor, reference } => {
            api.retract_vote(&actor.session(), &reference).await?;
            format!("Retracted vote on {reference}")
        }

        Command::Show { email, reference } => {
            let session = SessionToken::new(email.unwrap_or_default());
            let view = api.proposal_view(&session, &reference).await?;
            render_view(&view)
        }

        Command::List { status } => {
            let filter = (!status.is_empty()).then_some(status.as_slice());
            let proposals = api.list_proposals(filter).await?;
            render_list(&proposals, id_padding)
        }

        Command::Invitations { mark_sent } => {
            let invitations = api.unsent_invitations().await?;
            let mut out = String::new();
            for invitation in &invitations {
                if mark_sent {
                    api.mark_invitation_sent(&invitation.uid).await?;
                }
                let _ = writeln!(out, "{}  {}", invitation.uid, invitation.email);
            }
            if invitations.is_empty() {
                out.push_str("No unsent invitations");
            } else if mark_sent {
                let _ = write!(out, "Marked {} as sent", invitations.len());
            }
            out.trim_end().to_string()
        }
    };
    Ok(output)
}

/// `#0007` once published, `draft <token>` before.
fn label(proposal: &Proposal, id_padding: usize) -> String {
    match proposal.id() {
        Some(id) => format!("#{}", id.padded(id_padding)),
        None => format!("draft {}", proposal.key()),
    }
}

fn render_tally(summary: &TallySummary) -> String {
    format!(
        "accept {} ({}%)  reject {} ({}%)  undecided {} ({}%)",
        summary.tally.accepted,
        summary.percent_accepted,
        summary.tally.rejected,
        summary.percent_rejected,
        summary.tally.undecided(),
        summary.percent_undecided
    )
}

fn render_receipt(
    reference: &str,
    value: bhap_governance::VoteValue,
    receipt: &VoteReceipt,
) -> String {
    let mut out = match receipt.replaced {
        Some(previous) if previous != value => {
            format!("Changed vote on {reference} from {previous} to {value}")
        }
        Some(_) => format!("Vote on {reference} unchanged ({value})"),
        None => format!("Voted {value} on {reference}"),
    };
    let _ = write!(out, "\n{}", render_tally(&receipt.tally));
    if receipt.status.is_terminal() {
        let _ = write!(out, "\nQuorum reached: {}", receipt.status);
    }
    out
}

fn render_view(view: &ProposalView) -> String {
    let proposal = &view.proposal;
    let mut out = String::new();
    let heading = match &view.padded_id {
        Some(id) => format!("BHAP {id}"),
        None => format!("Draft {}", proposal.key()),
    };
    let _ = writeln!(out, "{heading}: {}", proposal.title);
    let _ = writeln!(out, "Author:  {}", view.author_name);
    let _ = writeln!(out, "Type:    {}", proposal.proposal_type);
    let _ = writeln!(out, "Status:  {}", proposal.status());
    let _ = writeln!(
        out,
        "Updated: {}",
        proposal.last_modified.format("%Y-%m-%d %H:%M UTC")
    );
    if !proposal.short_description.is_empty() {
        let _ = writeln!(out, "\n{}", proposal.short_description);
    }
    if !proposal.content.is_empty() {
        let _ = writeln!(out, "\n{}", proposal.content);
    }
    let _ = writeln!(out, "\nTally:   {}", render_tally(&view.tally));
    if let Some(vote) = view.viewer_vote {
        let _ = writeln!(out, "You voted {vote}");
    }

    let actions = &view.actions;
    if actions.any() {
        let names: Vec<&str> = [
            (actions.publish, "publish"),
            (actions.edit, "edit"),
            (actions.withdraw, "withdraw"),
            (actions.vote, "vote"),
            (actions.retract_vote, "retract"),
        ]
        .into_iter()
        .filter_map(|(allowed, name)| allowed.then_some(name))
        .collect();
        let _ = writeln!(out, "You may: {}", names.join(", "));
    }
    out.trim_end().to_string()
}

fn render_list(proposals: &[Proposal], id_padding: usize) -> String {
    if proposals.is_empty() {
        return "No proposals".to_string();
    }
    proposals
        .iter()
        .map(|p| {
            let number = match p.id() {
                Some(id) => id.padded(id_padding),
                None => "draft".to_string(),
            };
            format!("{number:>6}  {:<10}  {}", p.status().as_str(), p.title)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
