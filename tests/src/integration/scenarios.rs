//! Lifecycle and quorum scenarios end to end.

use super::world::World;
use bhap_governance::{
    ErrorKind, GovernanceApi, GovernanceError, GovernanceEvent, EntityStore, ProposalEdit,
    ProposalId, Status, VoteValue,
};

#[tokio::test]
async fn test_split_vote_with_full_participation_stays_in_discussion() {
    let world = World::in_memory();
    let house = world.house(3).await;
    let (_, a) = &house[0];
    let (_, b) = &house[1];
    let (_, c) = &house[2];

    let proposal = world.published(a, "Dishes by midnight").await;
    assert_eq!(proposal.status(), Status::Discussion);
    let reference = proposal.reference();

    let first = world
        .service
        .cast_vote(b, &reference, VoteValue::Accept)
        .await
        .unwrap();
    assert_eq!(first.status, Status::Discussion);
    assert_eq!(first.tally.percent_undecided, 50);

    let second = world
        .service
        .cast_vote(c, &reference, VoteValue::Reject)
        .await
        .unwrap();
    assert_eq!(second.tally.tally.cast(), 2);
    assert_eq!(second.status, Status::Discussion);
}

#[tokio::test]
async fn test_unanimous_vote_accepts() {
    let world = World::in_memory();
    let house = world.house(3).await;
    let (_, a) = &house[0];

    let proposal = world.published(a, "Dishes by midnight").await;
    let reference = proposal.reference();
    world
        .service
        .cast_vote(&house[1].1, &reference, VoteValue::Accept)
        .await
        .unwrap();
    let receipt = world
        .service
        .cast_vote(&house[2].1, &reference, VoteValue::Accept)
        .await
        .unwrap();

    assert_eq!(receipt.status, Status::Accepted);
    assert_eq!(receipt.tally.percent_accepted, 100);
    let stored = world.store.proposal(proposal.key()).await.unwrap().unwrap();
    assert_eq!(stored.status(), Status::Accepted);
    assert_eq!(stored.id(), proposal.id());
    assert!(world.events.get_events().iter().any(|e| matches!(
        e,
        GovernanceEvent::Decided {
            outcome: Status::Accepted,
            ..
        }
    )));
}

#[tokio::test]
async fn test_lopsided_partial_tally_does_not_decide() {
    let world = World::in_memory();
    let house = world.house(6).await;
    let reference = world.published(&house[0].1, "Bike rack").await.reference();

    // 4 of 5 eligible voters reject; one is still out.
    for (_, session) in &house[1..5] {
        let receipt = world
            .service
            .cast_vote(session, &reference, VoteValue::Reject)
            .await
            .unwrap();
        assert_eq!(receipt.status, Status::Discussion);
    }

    let receipt = world
        .service
        .cast_vote(&house[5].1, &reference, VoteValue::Accept)
        .await
        .unwrap();
    assert_eq!(receipt.status, Status::Rejected);
}

#[tokio::test]
async fn test_strict_majority_over_four_voters() {
    let world = World::in_memory();
    let house = world.house(5).await;
    let author = &house[0].1;

    let tied = world.published(author, "Tie").await.reference();
    let carried = world.published(author, "Carried").await.reference();

    for (i, (_, session)) in house[1..].iter().enumerate() {
        let tie_value = if i < 2 { VoteValue::Accept } else { VoteValue::Reject };
        // Reject first so the carried proposal cannot decide before the last vote.
        let carried_value = if i == 0 { VoteValue::Reject } else { VoteValue::Accept };
        world.service.cast_vote(session, &tied, tie_value).await.unwrap();
        world
            .service
            .cast_vote(session, &carried, carried_value)
            .await
            .unwrap();
    }

    let listed = world
        .service
        .list_proposals(Some(&[Status::Discussion][..]))
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].title, "Tie");

    let accepted = world
        .service
        .list_proposals(Some(&[Status::Accepted][..]))
        .await
        .unwrap();
    assert_eq!(accepted.len(), 1);
    assert_eq!(accepted[0].title, "Carried");
}

#[tokio::test]
async fn test_author_vote_is_unauthorized_and_leaves_no_record() {
    let world = World::in_memory();
    let house = world.house(2).await;
    let (author, session) = &house[0];
    let proposal = world.published(session, "Own proposal").await;

    let err = world
        .service
        .cast_vote(session, &proposal.reference(), VoteValue::Accept)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert!(world
        .store
        .vote(proposal.key(), &author.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_retract_missing_vote_is_not_found() {
    let world = World::in_memory();
    let house = world.house(3).await;
    let (voter, session) = &house[1];
    let proposal = world.published(&house[0].1, "Plants").await;

    let err = world
        .service
        .retract_vote(session, &proposal.reference())
        .await
        .unwrap_err();

    assert!(matches!(err, GovernanceError::VoteNotFound(_)));
    assert!(world.store.vote(proposal.key(), &voter.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_recast_replaces_and_retract_reopens() {
    let world = World::in_memory();
    let house = world.house(3).await;
    let (voter, session) = &house[1];
    let proposal = world.published(&house[0].1, "Plants").await;
    let reference = proposal.reference();

    world.service.cast_vote(session, &reference, VoteValue::Accept).await.unwrap();
    let receipt = world
        .service
        .cast_vote(session, &reference, VoteValue::Reject)
        .await
        .unwrap();
    assert_eq!(receipt.replaced, Some(VoteValue::Accept));
    assert_eq!(world.store.votes_for(proposal.key()).await.unwrap().len(), 1);

    world.service.retract_vote(session, &reference).await.unwrap();
    assert!(world.store.vote(proposal.key(), &voter.id).await.unwrap().is_none());
    let view = world.service.proposal_view(session, &reference).await.unwrap();
    assert!(view.actions.vote);
    assert!(!view.actions.retract_vote);
}

#[tokio::test]
async fn test_edit_guards() {
    let world = World::in_memory();
    let house = world.house(3).await;
    let (_, author) = &house[0];
    let (_, other) = &house[1];
    let retitle = || ProposalEdit {
        title: Some("Retitled".into()),
        ..Default::default()
    };

    let draft = world.draft(author, "Original").await;
    let edited = world
        .service
        .edit(author, &draft.reference(), retitle())
        .await
        .unwrap();
    assert_eq!(edited.title, "Retitled");

    let err = world
        .service
        .edit(other, &draft.reference(), retitle())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    let published = world
        .service
        .publish_to_discussion(author, &draft.reference())
        .await
        .unwrap();
    world
        .service
        .edit(author, &published.reference(), retitle())
        .await
        .unwrap();

    world.service.withdraw(author, &published.reference()).await.unwrap();
    let err = world
        .service
        .edit(author, &published.reference(), retitle())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTransition);
}

#[tokio::test]
async fn test_drafts_have_no_id_and_ids_are_immutable() {
    let world = World::in_memory();
    let house = world.house(3).await;
    let (_, author) = &house[0];

    let draft = world.draft(author, "Late draft").await;
    assert_eq!(draft.id(), None);
    let first = world.published(author, "First").await;
    assert_eq!(first.id(), Some(ProposalId(0)));

    world
        .service
        .edit(
            author,
            &first.reference(),
            ProposalEdit {
                content: Some("Amended".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    world.service.withdraw(author, &first.reference()).await.unwrap();

    for proposal in world.store.proposals().await.unwrap() {
        match proposal.status() {
            Status::Draft => assert_eq!(proposal.id(), None),
            _ => assert_eq!(proposal.id(), Some(ProposalId(0))),
        }
    }

    // Publishing again is an invalid transition and burns no ID.
    let err = world
        .service
        .publish_to_discussion(author, &first.reference())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTransition);
    let second = world
        .service
        .publish_to_discussion(author, &draft.reference())
        .await
        .unwrap();
    assert_eq!(second.id(), Some(ProposalId(1)));
}

#[tokio::test]
async fn test_invitation_is_consumed() {
    let world = World::in_memory();
    let invitation = world.service.invite("Fay@Example.com").await.unwrap();
    assert_eq!(invitation.email, "fay@example.com");
    assert_eq!(world.service.unsent_invitations().await.unwrap().len(), 1);

    let new_member = || bhap_governance::NewMember {
        first_name: "Fay".into(),
        last_name: "Housemate".into(),
        credential_hash: Vec::new(),
    };
    world
        .service
        .redeem_invitation(&invitation.uid, new_member())
        .await
        .unwrap();

    let err = world
        .service
        .redeem_invitation(&invitation.uid, new_member())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(world.service.unsent_invitations().await.unwrap().is_empty());

    let err = world.service.invite("fay@example.com").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}
