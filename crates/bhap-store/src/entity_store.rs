//! # Key-Value Entity Store
//!
//! Implements the governance `EntityStore` port over any [`KeyValueStore`].
//! Records are JSON; secondary indexes (permanent ID, member email) are
//! written in the same atomic batch as the record they point to.
//!
//! The key-value store and the ID sequence share one lock, so the compound
//! steps the port requires (revision check then write, ID allocation, vote
//! upsert) never interleave.

use crate::domain::{KVStoreError, KeyPrefix};
use crate::ports::{BatchOperation, KeyValueStore};
use async_trait::async_trait;
use bhap_governance::domain::IdSequence;
use bhap_governance::{
    EntityStore, Invitation, Member, MemberId, Proposal, ProposalId, ProposalKey, Status,
    StoreError, StoreResult, Vote, VoteValue,
};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;

struct State<K> {
    kv: K,
    sequence: IdSequence,
}

/// Entity Store over a byte key-value store.
pub struct KvEntityStore<K: KeyValueStore> {
    state: RwLock<State<K>>,
}

fn encode<T: Serialize>(value: &T) -> StoreResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StoreResult<T> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
}

impl<K: KeyValueStore> State<K> {
    fn read<T: DeserializeOwned>(&self, key: &[u8]) -> StoreResult<Option<T>> {
        match self.kv.get(key)? {
            Some(bytes) => decode(&bytes).map(Some),
            None => Ok(None),
        }
    }

    fn scan<T: DeserializeOwned>(&self, prefix: KeyPrefix) -> StoreResult<Vec<T>> {
        self.scan_bytes(prefix.as_bytes())
    }

    fn scan_bytes<T: DeserializeOwned>(&self, prefix: &[u8]) -> StoreResult<Vec<T>> {
        self.kv
            .prefix_scan(prefix)?
            .into_iter()
            .map(|(_, bytes)| decode(&bytes))
            .collect()
    }

    fn proposals_sorted(&self, keep: impl Fn(&Proposal) -> bool) -> StoreResult<Vec<Proposal>> {
        let mut proposals: Vec<Proposal> = self
            .scan::<Proposal>(KeyPrefix::Proposal)?
            .into_iter()
            .filter(|p| keep(p))
            .collect();
        proposals.sort_by(Proposal::listing_order);
        Ok(proposals)
    }

    fn id_holder(&self, id: ProposalId) -> StoreResult<Option<ProposalKey>> {
        self.read(&KeyPrefix::proposal_id_key(id))
    }

    /// Batch writing `proposal` and its ID index entry, after checking the ID
    /// is not held by a different record.
    fn proposal_batch(&self, proposal: &Proposal) -> StoreResult<Vec<BatchOperation>> {
        let mut batch = vec![BatchOperation::put(
            KeyPrefix::proposal_key(proposal.key()),
            encode(proposal)?,
        )];
        if let Some(id) = proposal.id() {
            match self.id_holder(id)? {
                Some(holder) if holder != *proposal.key() => {
                    return Err(StoreError::Conflict(format!(
                        "proposal ID {id} already assigned"
                    )));
                }
                Some(_) => {}
                None => batch.push(BatchOperation::put(
                    KeyPrefix::proposal_id_key(id),
                    encode(proposal.key())?,
                )),
            }
        }
        Ok(batch)
    }

    /// Votes may only change while the proposal is in Discussion.
    fn check_open(&self, key: &ProposalKey) -> StoreResult<()> {
        match self.read::<Proposal>(&KeyPrefix::proposal_key(key))? {
            Some(p) if p.status() == Status::Discussion => Ok(()),
            Some(p) => Err(StoreError::Conflict(format!(
                "proposal {key} is {}, not open for votes",
                p.status()
            ))),
            None => Err(StoreError::Conflict(format!("proposal {key} vanished"))),
        }
    }

    fn write(&mut self, batch: Vec<BatchOperation>) -> StoreResult<()> {
        self.kv.atomic_batch_write(batch).map_err(StoreError::from)
    }
}

impl<K: KeyValueStore> KvEntityStore<K> {
    /// Wrap `kv`, resuming the ID sequence from what it already holds.
    pub fn open(kv: K) -> StoreResult<Self> {
        let ids: Vec<ProposalId> = kv
            .prefix_scan(KeyPrefix::ProposalById.as_bytes())?
            .into_iter()
            .map(|(key, _)| parse_id_key(&key))
            .collect::<Result<_, _>>()?;
        let last_allocated: Option<ProposalId> = match kv.get(&KeyPrefix::last_proposal_id_key())? {
            Some(bytes) => Some(decode(&bytes)?),
            None => None,
        };

        let sequence = IdSequence::seeded(ids.iter().copied().chain(last_allocated));
        tracing::debug!(
            "[bhap-store] Opened entity store: {} published proposals, next ID {:?}",
            ids.len(),
            sequence.peek()
        );

        Ok(Self {
            state: RwLock::new(State { kv, sequence }),
        })
    }
}

fn parse_id_key(key: &[u8]) -> Result<ProposalId, KVStoreError> {
    std::str::from_utf8(&key[KeyPrefix::ProposalById.as_bytes().len()..])
        .ok()
        .and_then(|digits| digits.parse().ok())
        .map(ProposalId)
        .ok_or_else(|| KVStoreError::CorruptionError {
            message: format!("malformed ID index key {:?}", String::from_utf8_lossy(key)),
        })
}

#[async_trait]
impl<K: KeyValueStore> EntityStore for KvEntityStore<K> {
    async fn proposal(&self, key: &ProposalKey) -> StoreResult<Option<Proposal>> {
        self.state.read().read(&KeyPrefix::proposal_key(key))
    }

    async fn proposal_by_id(&self, id: ProposalId) -> StoreResult<Option<Proposal>> {
        let state = self.state.read();
        match state.id_holder(id)? {
            Some(key) => state.read(&KeyPrefix::proposal_key(&key)),
            None => Ok(None),
        }
    }

    async fn proposals(&self) -> StoreResult<Vec<Proposal>> {
        self.state.read().proposals_sorted(|_| true)
    }

    async fn proposals_by_status(&self, statuses: &[Status]) -> StoreResult<Vec<Proposal>> {
        self.state
            .read()
            .proposals_sorted(|p| statuses.contains(&p.status()))
    }

    async fn insert_proposal(&self, proposal: &Proposal) -> StoreResult<()> {
        let mut state = self.state.write();
        if state.kv.exists(&KeyPrefix::proposal_key(proposal.key()))? {
            return Err(StoreError::Conflict(format!(
                "proposal {} already exists",
                proposal.key()
            )));
        }
        let batch = state.proposal_batch(proposal)?;
        state.write(batch)?;
        if let Some(id) = proposal.id() {
            state.sequence.observe(id);
        }
        Ok(())
    }

    async fn replace_proposal(
        &self,
        expected_revision: u64,
        proposal: &Proposal,
    ) -> StoreResult<()> {
        let mut state = self.state.write();
        let current: Proposal = state
            .read(&KeyPrefix::proposal_key(proposal.key()))?
            .ok_or_else(|| StoreError::Conflict(format!("proposal {} vanished", proposal.key())))?;
        if current.revision() != expected_revision {
            return Err(StoreError::Conflict(format!(
                "proposal {} is at revision {}, expected {expected_revision}",
                proposal.key(),
                current.revision()
            )));
        }
        let batch = state.proposal_batch(proposal)?;
        state.write(batch)?;
        if let Some(id) = proposal.id() {
            state.sequence.observe(id);
        }
        Ok(())
    }

    async fn allocate_proposal_id(&self) -> StoreResult<ProposalId> {
        let mut state = self.state.write();
        let mut sequence = state.sequence;
        let id = sequence
            .allocate()
            .ok_or_else(|| StoreError::Conflict("proposal ID space exhausted".into()))?;
        // Persist before handing the ID out so a restart never reissues it.
        let batch = vec![BatchOperation::put(
            KeyPrefix::last_proposal_id_key(),
            encode(&id)?,
        )];
        state.write(batch)?;
        state.sequence = sequence;
        Ok(id)
    }

    async fn vote(&self, proposal: &ProposalKey, voter: &MemberId) -> StoreResult<Option<Vote>> {
        self.state.read().read(&KeyPrefix::vote_key(proposal, voter))
    }

    async fn votes_for(&self, proposal: &ProposalKey) -> StoreResult<Vec<Vote>> {
        self.state
            .read()
            .scan_bytes(&KeyPrefix::votes_prefix(proposal))
    }

    async fn upsert_vote(&self, vote: &Vote) -> StoreResult<Option<VoteValue>> {
        let mut state = self.state.write();
        state.check_open(&vote.proposal)?;
        let key = KeyPrefix::vote_key(&vote.proposal, &vote.voter);
        let previous: Option<Vote> = state.read(&key)?;
        state.write(vec![BatchOperation::put(key, encode(vote)?)])?;
        Ok(previous.map(|v| v.value))
    }

    async fn delete_vote(
        &self,
        proposal: &ProposalKey,
        voter: &MemberId,
    ) -> StoreResult<Option<Vote>> {
        let mut state = self.state.write();
        state.check_open(proposal)?;
        let key = KeyPrefix::vote_key(proposal, voter);
        let previous: Option<Vote> = state.read(&key)?;
        if previous.is_some() {
            state.write(vec![BatchOperation::delete(key)])?;
        }
        Ok(previous)
    }

    async fn member(&self, id: &MemberId) -> StoreResult<Option<Member>> {
        self.state.read().read(&KeyPrefix::member_key(id))
    }

    async fn member_by_email(&self, email: &str) -> StoreResult<Option<Member>> {
        let state = self.state.read();
        match state.read::<MemberId>(&KeyPrefix::email_key(email))? {
            Some(id) => state.read(&KeyPrefix::member_key(&id)),
            None => Ok(None),
        }
    }

    async fn insert_member(&self, member: &Member) -> StoreResult<()> {
        let mut state = self.state.write();
        let email_key = KeyPrefix::email_key(&member.email);
        if state.kv.exists(&email_key)? {
            return Err(StoreError::Conflict(format!(
                "a member with email {} already exists",
                member.email
            )));
        }
        let member_key = KeyPrefix::member_key(&member.id);
        if state.kv.exists(&member_key)? {
            return Err(StoreError::Conflict(format!("member {} already exists", member.id)));
        }
        state.write(vec![
            BatchOperation::put(member_key, encode(member)?),
            BatchOperation::put(email_key, encode(&member.id)?),
        ])
    }

    async fn member_count(&self) -> StoreResult<u32> {
        let count = self
            .state
            .read()
            .kv
            .prefix_scan(KeyPrefix::Member.as_bytes())?
            .len();
        Ok(count as u32)
    }

    async fn invitation(&self, uid: &str) -> StoreResult<Option<Invitation>> {
        self.state.read().read(&KeyPrefix::invitation_key(uid))
    }

    async fn insert_invitation(&self, invitation: &Invitation) -> StoreResult<()> {
        let mut state = self.state.write();
        let key = KeyPrefix::invitation_key(&invitation.uid);
        if state.kv.exists(&key)? {
            return Err(StoreError::Conflict(format!(
                "invitation {} already exists",
                invitation.uid
            )));
        }
        state.write(vec![BatchOperation::put(key, encode(invitation)?)])
    }

    async fn unsent_invitations(&self) -> StoreResult<Vec<Invitation>> {
        Ok(self
            .state
            .read()
            .scan::<Invitation>(KeyPrefix::Invitation)?
            .into_iter()
            .filter(|invitation| !invitation.email_sent)
            .collect())
    }

    async fn mark_invitation_sent(&self, uid: &str) -> StoreResult<bool> {
        let mut state = self.state.write();
        let key = KeyPrefix::invitation_key(uid);
        let Some(mut invitation) = state.read::<Invitation>(&key)? else {
            return Ok(false);
        };
        invitation.email_sent = true;
        state.write(vec![BatchOperation::put(key, encode(&invitation)?)])?;
        Ok(true)
    }

    async fn delete_invitation(&self, uid: &str) -> StoreResult<bool> {
        let mut state = self.state.write();
        let key = KeyPrefix::invitation_key(uid);
        if !state.kv.exists(&key)? {
            return Ok(false);
        }
        state.write(vec![BatchOperation::delete(key)])?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{FileBackedKVStore, InMemoryKVStore};
    use bhap_governance::domain::lifecycle;
    use bhap_governance::NewProposal;
    use chrono::Utc;

    fn draft(author: MemberId) -> Proposal {
        Proposal::new_draft(
            author,
            NewProposal {
                title: "Quiet hours".into(),
                ..Default::default()
            },
            Utc::now(),
        )
    }

    fn memory_store() -> KvEntityStore<InMemoryKVStore> {
        KvEntityStore::open(InMemoryKVStore::new()).unwrap()
    }

    async fn open_proposal<K: KeyValueStore>(store: &KvEntityStore<K>) -> ProposalKey {
        let author = MemberId::generate();
        let id = store.allocate_proposal_id().await.unwrap();
        let published = lifecycle::publish(&draft(author), &author, id, Utc::now()).unwrap();
        store.insert_proposal(&published).await.unwrap();
        published.key().clone()
    }

    #[tokio::test]
    async fn test_proposal_round_trip_and_index() {
        let store = memory_store();
        let author = MemberId::generate();
        let proposal = draft(author);
        store.insert_proposal(&proposal).await.unwrap();

        let id = store.allocate_proposal_id().await.unwrap();
        let published = lifecycle::publish(&proposal, &author, id, Utc::now()).unwrap();
        store.replace_proposal(0, &published).await.unwrap();

        assert_eq!(id, ProposalId(0));
        assert_eq!(store.proposal_by_id(id).await.unwrap(), Some(published.clone()));
        assert_eq!(store.proposal(proposal.key()).await.unwrap(), Some(published));
    }

    #[tokio::test]
    async fn test_stale_revision_conflicts() {
        let store = memory_store();
        let author = MemberId::generate();
        let proposal = draft(author);
        store.insert_proposal(&proposal).await.unwrap();
        let withdrawn = lifecycle::withdraw(&proposal, &author, Utc::now()).unwrap();
        store.replace_proposal(0, &withdrawn).await.unwrap();

        let result = store.replace_proposal(0, &withdrawn).await;

        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_duplicate_id_conflicts() {
        let store = memory_store();
        let author = MemberId::generate();
        let first = lifecycle::publish(&draft(author), &author, ProposalId(3), Utc::now()).unwrap();
        let second = lifecycle::publish(&draft(author), &author, ProposalId(3), Utc::now()).unwrap();

        store.insert_proposal(&first).await.unwrap();
        let result = store.insert_proposal(&second).await;

        assert!(matches!(result, Err(StoreError::Conflict(_))));
        assert_eq!(store.proposals().await.unwrap().len(), 1);
        assert_eq!(store.allocate_proposal_id().await.unwrap(), ProposalId(4));
    }

    #[tokio::test]
    async fn test_votes_scoped_to_proposal() {
        let store = memory_store();
        let first = open_proposal(&store).await;
        let second = open_proposal(&store).await;
        let voter = MemberId::generate();
        for (proposal, value) in [(&first, VoteValue::Accept), (&second, VoteValue::Reject)] {
            store
                .upsert_vote(&Vote {
                    proposal: proposal.clone(),
                    voter,
                    value,
                })
                .await
                .unwrap();
        }

        let replaced = store
            .upsert_vote(&Vote {
                proposal: first.clone(),
                voter,
                value: VoteValue::Reject,
            })
            .await
            .unwrap();

        assert_eq!(replaced, Some(VoteValue::Accept));
        assert_eq!(store.votes_for(&first).await.unwrap().len(), 1);
        assert_eq!(store.votes_for(&second).await.unwrap().len(), 1);
        assert!(store.delete_vote(&first, &voter).await.unwrap().is_some());
        assert!(store.vote(&first, &voter).await.unwrap().is_none());
        assert!(store.vote(&second, &voter).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_vote_on_decided_proposal_conflicts() {
        let store = memory_store();
        let key = open_proposal(&store).await;
        let voter = MemberId::generate();
        let vote = Vote {
            proposal: key.clone(),
            voter,
            value: VoteValue::Reject,
        };
        store.upsert_vote(&vote).await.unwrap();

        let open = store.proposal(&key).await.unwrap().unwrap();
        let decided = lifecycle::decide(&open, VoteValue::Reject, Utc::now()).unwrap();
        store.replace_proposal(open.revision(), &decided).await.unwrap();

        assert!(matches!(
            store.upsert_vote(&vote).await,
            Err(StoreError::Conflict(_))
        ));
        assert!(matches!(
            store.delete_vote(&key, &voter).await,
            Err(StoreError::Conflict(_))
        ));
        assert_eq!(store.votes_for(&key).await.unwrap(), vec![vote]);
    }

    #[tokio::test]
    async fn test_members_and_invitations() {
        let store = memory_store();
        let ada = Member::new("ada@example.com", "Ada", "Lovelace", vec![7]);
        store.insert_member(&ada).await.unwrap();
        let twin = Member::new("ada@example.com", "Ada", "Twin", vec![]);

        assert!(matches!(
            store.insert_member(&twin).await,
            Err(StoreError::Conflict(_))
        ));
        assert_eq!(store.member_count().await.unwrap(), 1);
        assert_eq!(store.member_by_email("ada@example.com").await.unwrap(), Some(ada.clone()));
        assert_eq!(store.member(&ada.id).await.unwrap(), Some(ada));

        let invitation = Invitation::new("bob@example.com");
        store.insert_invitation(&invitation).await.unwrap();
        assert_eq!(store.unsent_invitations().await.unwrap(), vec![invitation.clone()]);
        assert!(store.mark_invitation_sent(&invitation.uid).await.unwrap());
        assert!(store.unsent_invitations().await.unwrap().is_empty());
        assert!(store.delete_invitation(&invitation.uid).await.unwrap());
        assert!(store.invitation(&invitation.uid).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sequence_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bhap.db");
        let author = MemberId::generate();

        {
            let store = KvEntityStore::open(FileBackedKVStore::open(&path).unwrap()).unwrap();
            let proposal = draft(author);
            store.insert_proposal(&proposal).await.unwrap();
            let id = store.allocate_proposal_id().await.unwrap();
            let published = lifecycle::publish(&proposal, &author, id, Utc::now()).unwrap();
            store.replace_proposal(0, &published).await.unwrap();
            // Allocated but never used: must not be reissued either.
            assert_eq!(store.allocate_proposal_id().await.unwrap(), ProposalId(1));
        }

        let store = KvEntityStore::open(FileBackedKVStore::open(&path).unwrap()).unwrap();
        assert_eq!(store.proposals().await.unwrap().len(), 1);
        assert_eq!(store.allocate_proposal_id().await.unwrap(), ProposalId(2));
    }

    #[test]
    fn test_parse_id_key() {
        let key = KeyPrefix::proposal_id_key(ProposalId(42));
        assert_eq!(parse_id_key(&key).unwrap(), ProposalId(42));
        assert!(parse_id_key(b"i:xyz").is_err());
    }
}
