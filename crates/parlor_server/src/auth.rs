//! Handshake authentication.
//!
//! Sockets present a bearer token in the Socket.IO connect payload; the
//! relay validates it against an [`AuthBackend`] before any game handler is
//! registered. Unauthenticated sockets are told why and disconnected.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account identity resolved from a handshake token. The `id` is what the
/// engine uses as the stable player identity across reconnects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthedUser {
    pub id: Uuid,
    pub name: String,
    pub avatar_url: Option<String>,
}

/// Connect payload sent by clients.
#[derive(Debug, Default, Deserialize)]
pub struct HandshakeAuth {
    pub token: Option<String>,
}

/// Validates bearer credentials against whatever session store fronts this
/// server.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Resolves a token to a user, or `None` for unknown/expired tokens.
    async fn validate(&self, token: &str) -> Option<AuthedUser>;
}

/// Token store backed by an in-process map. Entries are issued by the
/// login flow (or the config file, for development); the relay only ever
/// reads them.
#[derive(Default)]
pub struct MemoryAuthBackend {
    tokens: DashMap<String, AuthedUser>,
}

impl MemoryAuthBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self, token: impl Into<String>, user: AuthedUser) {
        self.tokens.insert(token.into(), user);
    }

    pub fn revoke(&self, token: &str) {
        self.tokens.remove(token);
    }
}

#[async_trait]
impl AuthBackend for MemoryAuthBackend {
    async fn validate(&self, token: &str) -> Option<AuthedUser> {
        self.tokens.get(token).map(|entry| entry.clone())
    }
}
