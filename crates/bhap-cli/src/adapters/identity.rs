//! Identity for a single-user command line
//!
//! The session token is the acting member's email address (`--as`). There is
//! no authentication step: whoever runs the binary against a data file acts
//! for any member in it.

use async_trait::async_trait;
use bhap_governance::{EntityStore, IdentityResolver, MemberId, SessionToken};
use std::sync::Arc;

/// Resolves `--as EMAIL` to the member registered under that email.
pub struct EmailIdentityResolver<S> {
    store: Arc<S>,
}

impl<S: EntityStore> EmailIdentityResolver<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: EntityStore> IdentityResolver for EmailIdentityResolver<S> {
    async fn current_member(&self, session: &SessionToken) -> Result<Option<MemberId>, String> {
        let email = session.0.trim().to_ascii_lowercase();
        if email.is_empty() {
            return Ok(None);
        }
        let member = self
            .store
            .member_by_email(&email)
            .await
            .map_err(|e| e.to_string())?;
        Ok(member.map(|m| m.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bhap_governance::{InMemoryEntityStore, Member};

    #[tokio::test]
    async fn test_resolves_case_insensitively() {
        let store = Arc::new(InMemoryEntityStore::new());
        let ada = Member::new("ada@example.com", "Ada", "Lovelace", Vec::new());
        store.insert_member(&ada).await.unwrap();
        let resolver = EmailIdentityResolver::new(store);

        let resolved = resolver
            .current_member(&SessionToken::new(" Ada@Example.COM "))
            .await
            .unwrap();

        assert_eq!(resolved, Some(ada.id));
    }

    #[tokio::test]
    async fn test_unknown_and_empty_are_anonymous() {
        let resolver = EmailIdentityResolver::new(Arc::new(InMemoryEntityStore::new()));

        for token in ["", "   ", "nobody@example.com"] {
            let resolved = resolver.current_member(&SessionToken::new(token)).await.unwrap();
            assert_eq!(resolved, None, "{token:?}");
        }
    }
}
