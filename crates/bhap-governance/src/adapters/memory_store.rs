//! In-memory Entity Store adapter
//!
//! All records live behind one `RwLock`, so every compound step the port
//! requires (revision check, ID allocation, vote upsert) happens under a
//! single write guard.

use crate::domain::{
    IdSequence, Invitation, Member, MemberId, Proposal, ProposalId, ProposalKey, Status, Vote,
    VoteValue,
};
use crate::ports::{EntityStore, StoreError, StoreResult};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

#[derive(Default)]
struct Records {
    proposals: HashMap<ProposalKey, Proposal>,
    ids: HashMap<ProposalId, ProposalKey>,
    votes: HashMap<(ProposalKey, MemberId), Vote>,
    members: HashMap<MemberId, Member>,
    emails: HashMap<String, MemberId>,
    invitations: BTreeMap<String, Invitation>,
    sequence: IdSequence,
}

impl Records {
    fn sorted(&self, keep: impl Fn(&Proposal) -> bool) -> Vec<Proposal> {
        let mut proposals: Vec<Proposal> =
            self.proposals.values().filter(|p| keep(*p)).cloned().collect();
        proposals.sort_by(Proposal::listing_order);
        proposals
    }

    fn check_id_free(&self, proposal: &Proposal) -> StoreResult<()> {
        if let Some(id) = proposal.id() {
            match self.ids.get(&id) {
                Some(holder) if holder != proposal.key() => {
                    return Err(StoreError::Conflict(format!(
                        "proposal ID {id} already assigned"
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn check_open(&self, key: &ProposalKey) -> StoreResult<()> {
        match self.proposals.get(key).map(Proposal::status) {
            Some(Status::Discussion) => Ok(()),
            Some(status) => Err(StoreError::Conflict(format!(
                "proposal {key} is {status}, not open for votes"
            ))),
            None => Err(StoreError::Conflict(format!("proposal {key} vanished"))),
        }
    }
}

/// In-memory store for tests and the CLI's `--memory` mode
#[derive(Default)]
pub struct InMemoryEntityStore {
    records: RwLock<Records>,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn proposal_count(&self) -> usize {
        self.records.read().proposals.len()
    }

    pub fn vote_count(&self) -> usize {
        self.records.read().votes.len()
    }
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn proposal(&self, key: &ProposalKey) -> StoreResult<Option<Proposal>> {
        Ok(self.records.read().proposals.get(key).cloned())
    }

    async fn proposal_by_id(&self, id: ProposalId) -> StoreResult<Option<Proposal>> {
        let records = self.records.read();
        Ok(records
            .ids
            .get(&id)
            .and_then(|key| records.proposals.get(key))
            .cloned())
    }

    async fn proposals(&self) -> StoreResult<Vec<Proposal>> {
        Ok(self.records.read().sorted(|_| true))
    }

    async fn proposals_by_status(&self, statuses: &[Status]) -> StoreResult<Vec<Proposal>> {
        Ok(self
            .records
            .read()
            .sorted(|p| statuses.contains(&p.status())))
    }

    async fn insert_proposal(&self, proposal: &Proposal) -> StoreResult<()> {
        let mut records = self.records.write();
        if records.proposals.contains_key(proposal.key()) {
            return Err(StoreError::Conflict(format!(
                "proposal {} already exists",
                proposal.key()
            )));
        }
        records.check_id_free(proposal)?;
        if let Some(id) = proposal.id() {
            records.ids.insert(id, proposal.key().clone());
            records.sequence.observe(id);
        }
        records
            .proposals
            .insert(proposal.key().clone(), proposal.clone());
        Ok(())
    }

    async fn replace_proposal(
        &self,
        expected_revision: u64,
        proposal: &Proposal,
    ) -> StoreResult<()> {
        let mut records = self.records.write();
        let current_revision = records
            .proposals
            .get(proposal.key())
            .map(Proposal::revision)
            .ok_or_else(|| StoreError::Conflict(format!("proposal {} vanished", proposal.key())))?;
        if current_revision != expected_revision {
            return Err(StoreError::Conflict(format!(
                "proposal {} is at revision {current_revision}, expected {expected_revision}",
                proposal.key()
            )));
        }
        records.check_id_free(proposal)?;
        if let Some(id) = proposal.id() {
            records.ids.insert(id, proposal.key().clone());
            records.sequence.observe(id);
        }
        records
            .proposals
            .insert(proposal.key().clone(), proposal.clone());
        Ok(())
    }

    async fn allocate_proposal_id(&self) -> StoreResult<ProposalId> {
        self.records
            .write()
            .sequence
            .allocate()
            .ok_or_else(|| StoreError::Conflict("proposal ID space exhausted".into()))
    }

    async fn vote(&self, proposal: &ProposalKey, voter: &MemberId) -> StoreResult<Option<Vote>> {
        Ok(self
            .records
            .read()
            .votes
            .get(&(proposal.clone(), *voter))
            .cloned())
    }

    async fn votes_for(&self, proposal: &ProposalKey) -> StoreResult<Vec<Vote>> {
        Ok(self
            .records
            .read()
            .votes
            .values()
            .filter(|vote| vote.proposal == *proposal)
            .cloned()
            .collect())
    }

    async fn upsert_vote(&self, vote: &Vote) -> StoreResult<Option<VoteValue>> {
        let mut records = self.records.write();
        records.check_open(&vote.proposal)?;
        let previous = records
            .votes
            .insert((vote.proposal.clone(), vote.voter), vote.clone());
        Ok(previous.map(|v| v.value))
    }

    async fn delete_vote(
        &self,
        proposal: &ProposalKey,
        voter: &MemberId,
    ) -> StoreResult<Option<Vote>> {
        let mut records = self.records.write();
        records.check_open(proposal)?;
        Ok(records.votes.remove(&(proposal.clone(), *voter)))
    }

    async fn member(&self, id: &MemberId) -> StoreResult<Option<Member>> {
        Ok(self.records.read().members.get(id).cloned())
    }

    async fn member_by_email(&self, email: &str) -> StoreResult<Option<Member>> {
        let records = self.records.read();
        Ok(records
            .emails
            .get(email)
            .and_then(|id| records.members.get(id))
            .cloned())
    }

    async fn insert_member(&self, member: &Member) -> StoreResult<()> {
        let mut records = self.records.write();
        if records.emails.contains_key(&member.email) {
            return Err(StoreError::Conflict(format!(
                "a member with email {} already exists",
                member.email
            )));
        }
        if records.members.contains_key(&member.id) {
            return Err(StoreError::Conflict(format!("member {} already exists", member.id)));
        }
        records.emails.insert(member.email.clone(), member.id);
        records.members.insert(member.id, member.clone());
        Ok(())
    }

    async fn member_count(&self) -> StoreResult<u32> {
        Ok(self.records.read().members.len() as u32)
    }

    async fn invitation(&self, uid: &str) -> StoreResult<Option<Invitation>> {
        Ok(self.records.read().invitations.get(uid).cloned())
    }

    async fn insert_invitation(&self, invitation: &Invitation) -> StoreResult<()> {
        let mut records = self.records.write();
        if records.invitations.contains_key(&invitation.uid) {
            return Err(StoreError::Conflict(format!(
                "invitation {} already exists",
                invitation.uid
            )));
        }
        records
            .invitations
            .insert(invitation.uid.clone(), invitation.clone());
        Ok(())
    }

    async fn unsent_invitations(&self) -> StoreResult<Vec<Invitation>> {
        Ok(self
            .records
            .read()
            .invitations
            .values()
            .filter(|invitation| !invitation.email_sent)
            .cloned()
            .collect())
    }

    async fn mark_invitation_sent(&self, uid: &str) -> StoreResult<bool> {
        Ok(match self.records.write().invitations.get_mut(uid) {
            Some(invitation) => {
                invitation.email_sent = true;
                true
            }
            None => false,
        })
    }

    async fn delete_invitation(&self, uid: &str) -> StoreResult<bool> {
        Ok(self.records.write().invitations.remove(uid).is_some())
    }
}
