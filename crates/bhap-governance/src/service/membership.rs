//! # Membership Operations
//!
//! Invitations and their redemption. The member count is the quorum
//! denominator, so joining is the only way the voting population grows.

use super::*;
use tracing::info;

/// Emails are compared after trimming and lowercasing.
fn normalize_email(email: &str) -> GovernanceResult<String> {
    let email = email.trim().to_ascii_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(GovernanceError::InvalidInput(format!(
            "not an email address: {email:?}"
        ))),
    }
}

fn required_name(field: &str, value: &str) -> GovernanceResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(GovernanceError::InvalidInput(format!("{field} is required")));
    }
    Ok(value.to_string())
}

impl<S, I, E> GovernanceService<S, I, E>
where
    S: EntityStore,
    I: IdentityResolver,
    E: GovernanceEventSink,
{
    pub(super) async fn invite_inner(&self, email: &str) -> GovernanceResult<Invitation> {
        let email = normalize_email(email)?;
        if self.store.member_by_email(&email).await?.is_some() {
            return Err(GovernanceError::InvalidInput(format!(
                "{email} is already a member"
            )));
        }

        let invitation = Invitation::new(email);
        self.store.insert_invitation(&invitation).await?;

        info!(uid = %invitation.uid, email = %invitation.email, "[governance] Invitation issued");
        self.emit(GovernanceEvent::InvitationIssued {
            uid: invitation.uid.clone(),
            email: invitation.email.clone(),
        })
        .await;
        Ok(invitation)
    }

    pub(super) async fn redeem_invitation_inner(
        &self,
        uid: &str,
        new_member: NewMember,
    ) -> GovernanceResult<Member> {
        let invitation = self
            .store
            .invitation(uid)
            .await?
            .ok_or_else(|| GovernanceError::InvitationNotFound(uid.to_string()))?;
        let first_name = required_name("first name", &new_member.first_name)?;
        let last_name = required_name("last name", &new_member.last_name)?;

        let member = Member::new(
            invitation.email,
            first_name,
            last_name,
            new_member.credential_hash,
        );
        self.store.insert_member(&member).await?;
        if !self.store.delete_invitation(uid).await? {
            debug!(uid, "[governance] Invitation already removed");
        }

        info!(
            member = %member.id,
            "[governance] {} joined",
            member.display_name()
        );
        self.emit(GovernanceEvent::MemberJoined {
            member: member.id,
            email: member.email.clone(),
        })
        .await;
        Ok(member)
    }
}
