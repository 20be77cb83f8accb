//! # Integration Flows
//!
//! Every flow runs the real `GovernanceService` over `KvEntityStore`, so the
//! storage guarantees (ID uniqueness, vote upsert, compare-and-put) are the
//! ones the binary relies on.

#[cfg(test)]
mod concurrency;
#[cfg(test)]
mod persistence;
#[cfg(test)]
mod scenarios;

#[cfg(test)]
pub(crate) mod world {
    use bhap_governance::ports::ManualTimeSource;
    use bhap_governance::{
        EntityStore, GovernanceApi, GovernanceConfig, GovernanceDependencies, GovernanceService,
        InMemoryEventSink, InMemoryIdentityResolver, Member, NewProposal, Proposal, SessionToken,
    };
    use bhap_store::{InMemoryKVStore, KvEntityStore};
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    pub type Service<S> = GovernanceService<S, InMemoryIdentityResolver, InMemoryEventSink>;

    /// A house: a store, its members' sessions and a service over both.
    pub struct World<S: EntityStore> {
        pub service: Arc<Service<S>>,
        pub store: Arc<S>,
        pub identity: Arc<InMemoryIdentityResolver>,
        pub events: Arc<InMemoryEventSink>,
    }

    impl World<KvEntityStore<InMemoryKVStore>> {
        pub fn in_memory() -> Self {
            Self::over(KvEntityStore::open(InMemoryKVStore::new()).unwrap())
        }
    }

    impl<S: EntityStore> World<S> {
        pub fn over(store: S) -> Self {
            let store = Arc::new(store);
            let identity = Arc::new(InMemoryIdentityResolver::new());
            let events = Arc::new(InMemoryEventSink::new());
            let clock = ManualTimeSource::new(Utc.with_ymd_and_hms(2024, 4, 1, 9, 0, 0).unwrap());
            let service = GovernanceService::new(GovernanceDependencies {
                store: store.clone(),
                identity: identity.clone(),
                events: events.clone(),
                config: GovernanceConfig::default(),
            })
            .with_time_source(Box::new(clock));
            Self {
                service: Arc::new(service),
                store,
                identity,
                events,
            }
        }

        /// Invite and redeem, then log the new member in.
        pub async fn join(&self, first_name: &str) -> (Member, SessionToken) {
            let email = format!("{}@example.com", first_name.to_lowercase());
            let invitation = self.service.invite(&email).await.unwrap();
            let member = self
                .service
                .redeem_invitation(
                    &invitation.uid,
                    bhap_governance::NewMember {
                        first_name: first_name.into(),
                        last_name: "Housemate".into(),
                        credential_hash: vec![0xAB; 4],
                    },
                )
                .await
                .unwrap();
            let session = self.identity.login(member.id);
            (member, session)
        }

        /// `n` members named m0, m1, ...
        pub async fn house(&self, n: usize) -> Vec<(Member, SessionToken)> {
            let mut members = Vec::with_capacity(n);
            for i in 0..n {
                members.push(self.join(&format!("m{i}")).await);
            }
            members
        }

        pub async fn draft(&self, session: &SessionToken, title: &str) -> Proposal {
            self.service
                .create_draft(
                    session,
                    NewProposal {
                        title: title.into(),
                        ..Default::default()
                    },
                )
                .await
                .unwrap()
        }

        pub async fn published(&self, session: &SessionToken, title: &str) -> Proposal {
            let draft = self.draft(session, title).await;
            self.service
                .publish_to_discussion(session, &draft.reference())
                .await
                .unwrap()
        }
    }
}
