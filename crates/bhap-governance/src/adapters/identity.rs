//! Session-token identity adapter

use crate::domain::{MemberId, SessionToken};
use crate::ports::IdentityResolver;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

/// Token-to-member map, standing in for a session cookie store
#[derive(Default)]
pub struct InMemoryIdentityResolver {
    sessions: RwLock<HashMap<SessionToken, MemberId>>,
}

impl InMemoryIdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session for `member` and return its token.
    pub fn login(&self, member: MemberId) -> SessionToken {
        let token = SessionToken(Uuid::new_v4().simple().to_string());
        self.sessions.write().insert(token.clone(), member);
        token
    }

    /// Returns `false` if the token was not logged in.
    pub fn logout(&self, session: &SessionToken) -> bool {
        self.sessions.write().remove(session).is_some()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }
}

#[async_trait]
impl IdentityResolver for InMemoryIdentityResolver {
    async fn current_member(&self, session: &SessionToken) -> Result<Option<MemberId>, String> {
        Ok(self.sessions.read().get(session).copied())
    }
}
