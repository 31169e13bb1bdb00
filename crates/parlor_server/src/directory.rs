//! Live transport addressing.
//!
//! Tracks which socket a player is currently on and which session they are
//! in. This is relay-side bookkeeping only; session membership itself
//! lives in the engine's rosters. The reaper prunes entries whose session
//! the engine has already dropped.

use std::collections::HashSet;

use dashmap::DashMap;
use uuid::Uuid;

use crate::auth::AuthedUser;

/// A connected, authenticated socket.
#[derive(Debug, Clone)]
pub struct ConnectedClient {
    pub user: AuthedUser,
    pub socket_id: String,
}

#[derive(Default)]
pub struct ClientDirectory {
    clients: DashMap<Uuid, ConnectedClient>,
    /// player id → join code of the session they are in
    memberships: DashMap<Uuid, String>,
}

impl ClientDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_client(&self, user: AuthedUser, socket_id: String) {
        self.clients
            .insert(user.id, ConnectedClient { user, socket_id });
    }

    pub fn remove_client(&self, player: Uuid) {
        self.clients.remove(&player);
    }

    pub fn client(&self, player: Uuid) -> Option<ConnectedClient> {
        self.clients.get(&player).map(|entry| entry.clone())
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    pub fn set_membership(&self, player: Uuid, code: String) {
        self.memberships.insert(player, code);
    }

    pub fn membership(&self, player: Uuid) -> Option<String> {
        self.memberships.get(&player).map(|entry| entry.clone())
    }

    pub fn clear_membership(&self, player: Uuid) {
        self.memberships.remove(&player);
    }

    /// Every session code at least one tracked player points at.
    pub fn tracked_codes(&self) -> HashSet<String> {
        self.memberships
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Drops every membership pointing at `code`.
    pub fn forget_session(&self, code: &str) {
        self.memberships.retain(|_, tracked| tracked != code);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str) -> AuthedUser {
        AuthedUser {
            id: Uuid::new_v4(),
            name: name.into(),
            avatar_url: None,
        }
    }

    #[test]
    fn memberships_track_and_forget_by_code() {
        let directory = ClientDirectory::new();
        let a = user("a");
        let b = user("b");
        directory.insert_client(a.clone(), "sid-a".into());
        directory.insert_client(b.clone(), "sid-b".into());
        directory.set_membership(a.id, "AAAAAA".into());
        directory.set_membership(b.id, "BBBBBB".into());

        assert_eq!(directory.tracked_codes().len(), 2);
        directory.forget_session("AAAAAA");
        assert!(directory.membership(a.id).is_none());
        assert_eq!(directory.membership(b.id).as_deref(), Some("BBBBBB"));
        assert_eq!(directory.client_count(), 2);
    }

    #[test]
    fn clients_resolve_to_their_latest_socket() {
        let directory = ClientDirectory::new();
        let a = user("a");
        directory.insert_client(a.clone(), "sid-1".into());
        directory.insert_client(a.clone(), "sid-2".into());
        assert_eq!(directory.client(a.id).unwrap().socket_id, "sid-2");
        directory.remove_client(a.id);
        assert!(directory.client(a.id).is_none());
    }
}
