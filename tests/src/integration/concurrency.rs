//! Racing operations against one store.

use super::world::World;
use bhap_governance::{EntityStore, GovernanceApi, GovernanceEvent, ProposalId, Status, VoteValue};
use futures::future::join_all;
use std::collections::BTreeSet;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_publishes_get_distinct_ids() {
    let world = World::in_memory();
    let house = world.house(2).await;
    let session = house[0].1.clone();

    let mut drafts = Vec::new();
    for i in 0..24 {
        drafts.push(world.draft(&session, &format!("Draft {i}")).await);
    }

    let tasks = drafts.into_iter().map(|draft| {
        let service = world.service.clone();
        let session = session.clone();
        tokio::spawn(async move {
            service
                .publish_to_discussion(&session, &draft.reference())
                .await
        })
    });
    let ids: BTreeSet<ProposalId> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap().id().unwrap())
        .collect();

    assert_eq!(ids.len(), 24);
    assert_eq!(ids, (0..24).map(ProposalId).collect());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_casts_by_one_voter_leave_one_vote() {
    let world = World::in_memory();
    // Large house so no decision interferes.
    let house = world.house(5).await;
    let proposal = world.published(&house[0].1, "Quiet hours").await;
    let (voter, session) = house[1].clone();

    let tasks = (0..32).map(|i| {
        let service = world.service.clone();
        let session = session.clone();
        let reference = proposal.reference();
        let value = if i % 2 == 0 {
            VoteValue::Accept
        } else {
            VoteValue::Reject
        };
        tokio::spawn(async move { service.cast_vote(&session, &reference, value).await })
    });
    for joined in join_all(tasks).await {
        joined.unwrap().unwrap();
    }

    let votes = world.store.votes_for(proposal.key()).await.unwrap();
    assert_eq!(votes.len(), 1);
    assert_eq!(votes[0].voter, voter.id);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_final_votes_decide_once() {
    let world = World::in_memory();
    let house = world.house(9).await;
    let proposal = world.published(&house[0].1, "Solar panels").await;

    let tasks = house[1..].iter().map(|(_, session)| {
        let service = world.service.clone();
        let session = session.clone();
        let reference = proposal.reference();
        tokio::spawn(async move {
            service
                .cast_vote(&session, &reference, VoteValue::Accept)
                .await
        })
    });
    for joined in join_all(tasks).await {
        joined.unwrap().unwrap();
    }

    let stored = world.store.proposal(proposal.key()).await.unwrap().unwrap();
    assert_eq!(stored.status(), Status::Accepted);
    let decisions = world
        .events
        .get_events()
        .into_iter()
        .filter(|event| matches!(event, GovernanceEvent::Decided { .. }))
        .count();
    assert_eq!(decisions, 1);
}
