//! The file-backed store across process restarts.

use super::world::World;
use bhap_governance::{EntityStore, GovernanceApi, ProposalId, ProposalRef, Status, VoteValue};
use bhap_store::{FileBackedKVStore, KvEntityStore};
use std::path::Path;

fn open(path: &Path) -> World<KvEntityStore<FileBackedKVStore>> {
    World::over(KvEntityStore::open(FileBackedKVStore::open(path).unwrap()).unwrap())
}

#[tokio::test]
async fn test_records_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("house").join("bhap.db");

    let (members, decided, open_key) = {
        let world = open(&path);
        let house = world.house(3).await;
        let decided = world.published(&house[0].1, "Decided").await;
        let pending = world.published(&house[0].1, "Pending").await;
        for (_, session) in &house[1..] {
            world
                .service
                .cast_vote(session, &decided.reference(), VoteValue::Reject)
                .await
                .unwrap();
        }
        world
            .service
            .cast_vote(&house[1].1, &pending.reference(), VoteValue::Accept)
            .await
            .unwrap();
        let members: Vec<_> = house.into_iter().map(|(member, _)| member).collect();
        (members, decided, pending.key().clone())
    };

    let world = open(&path);
    assert_eq!(world.store.member_count().await.unwrap(), 3);
    for member in &members {
        assert_eq!(
            world.store.member_by_email(&member.email).await.unwrap().as_ref(),
            Some(member)
        );
    }

    let reloaded = world.store.proposal_by_id(ProposalId(0)).await.unwrap().unwrap();
    assert_eq!(reloaded.key(), decided.key());
    assert_eq!(reloaded.status(), Status::Rejected);
    assert_eq!(world.store.votes_for(&open_key).await.unwrap().len(), 1);

    // The remaining voter completes the pending proposal after the restart.
    let session = world.identity.login(members[2].id);
    let pending = ProposalRef::Published(ProposalId(1));
    let receipt = world
        .service
        .cast_vote(&session, &pending, VoteValue::Accept)
        .await
        .unwrap();
    assert_eq!(receipt.status, Status::Accepted);

    let author = world.identity.login(members[0].id);
    let next = world.published(&author, "After restart").await;
    assert_eq!(next.id(), Some(ProposalId(2)));
}

#[tokio::test]
async fn test_second_process_is_locked_out() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bhap.db");

    let _world = open(&path);
    let second = FileBackedKVStore::open(&path);

    assert!(matches!(
        second,
        Err(bhap_store::KVStoreError::Locked { .. })
    ));
}
