//! Session data structure

use chrono::{DateTime, Utc};
use serde::Serialize;
use solifin_api::Principal;
use tokio::time::Instant;
use uuid::Uuid;

use crate::state::AuthState;

#[derive(Debug, Clone)]
pub struct Session {
    /// Id of the current authenticated session, for log correlation
    /// only; renewed on every entry into `Authenticated`
    pub id: String,
    principal: Option<Principal>,
    state: AuthState,
    last_activity: Instant,
    /// Wall-clock time of the last transition into `Authenticated`
    pub authenticated_at: Option<DateTime<Utc>>,
    /// Path recalled from storage on login, for post-login redirect
    pub pending_last_visited_path: Option<String>,
    /// Bumped on every clear; lets in-flight checks detect a logout
    generation: u64,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            principal: None,
            state: AuthState::Unauthenticated,
            last_activity: Instant::now(),
            authenticated_at: None,
            pending_last_visited_path: None,
            generation: 0,
        }
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    /// True iff a principal is present
    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }

    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Move to `Authenticating`. Returns false when the current state
    /// does not allow it (a live session stays `Authenticated`).
    pub fn begin_authenticating(&mut self) -> bool {
        self.transition(AuthState::Authenticating)
    }

    /// Install the principal. Returns true when this entered
    /// `Authenticated` from another state.
    ///
    /// Re-validating a live session replaces the principal but does not
    /// count as user activity.
    pub fn authenticate(&mut self, principal: Principal, now: Instant) -> bool {
        let entered = self.state != AuthState::Authenticated;
        if !self.transition(AuthState::Authenticated) {
            return false;
        }
        self.principal = Some(principal);
        if entered {
            self.id = Uuid::new_v4().to_string();
            self.authenticated_at = Some(Utc::now());
            self.touch(now);
        }
        entered
    }

    /// Drop the principal and return to `Unauthenticated`. Returns true
    /// when a principal was present.
    pub fn clear(&mut self) -> bool {
        let had_principal = self.principal.take().is_some();
        self.transition(AuthState::Unauthenticated);
        self.authenticated_at = None;
        self.pending_last_visited_path = None;
        self.generation = self.generation.wrapping_add(1);
        had_principal
    }

    /// Apply a state change the state machine allows; anything else is
    /// logged and ignored
    fn transition(&mut self, target: AuthState) -> bool {
        if !self.state.can_transition_to(target) {
            tracing::warn!(
                session_id = %self.id,
                from = %self.state,
                to = %target,
                "Rejected auth state transition"
            );
            return false;
        }
        self.state = target;
        true
    }

    /// Refresh `last_activity`; never moves it backwards
    pub fn touch(&mut self, at: Instant) {
        if at > self.last_activity {
            self.last_activity = at;
        }
    }

    pub fn snapshot(&self) -> AuthSnapshot {
        AuthSnapshot {
            state: self.state,
            principal: self.principal.clone(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// What views observe through `SessionManager::subscribe`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthSnapshot {
    pub state: AuthState,
    pub principal: Option<Principal>,
}

impl AuthSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }
}

impl Default for AuthSnapshot {
    fn default() -> Self {
        Self {
            state: AuthState::Unauthenticated,
            principal: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_session_creation() {
        let session = Session::new();
        assert!(!session.id.is_empty());
        assert_eq!(session.state(), AuthState::Unauthenticated);
        assert!(!session.is_authenticated());
        assert!(session.authenticated_at.is_none());
    }

    #[test]
    fn test_authenticate_and_clear() {
        let mut session = Session::new();
        assert!(session.begin_authenticating());
        assert!(!session.is_authenticated());

        let first_id = session.id.clone();
        assert!(session.authenticate(Principal::new("42"), Instant::now()));
        assert!(session.is_authenticated());
        assert_ne!(session.id, first_id);
        let authenticated_id = session.id.clone();
        assert_eq!(session.state(), AuthState::Authenticated);
        assert!(session.authenticated_at.is_some());

        // Re-validation keeps the state and reports no transition
        assert!(!session.begin_authenticating());
        assert!(!session.authenticate(Principal::new("42"), Instant::now()));
        assert_eq!(session.state(), AuthState::Authenticated);
        assert_eq!(session.id, authenticated_id);

        let generation = session.generation();
        session.pending_last_visited_path = Some("/dashboard/wallet".to_string());
        assert!(session.clear());
        assert!(!session.is_authenticated());
        assert_eq!(session.state(), AuthState::Unauthenticated);
        assert!(session.pending_last_visited_path.is_none());
        assert_eq!(session.generation(), generation + 1);

        assert!(!session.clear());

        assert!(session.authenticate(Principal::new("42"), Instant::now()));
        assert_ne!(session.id, authenticated_id);
    }

    #[test]
    fn test_last_activity_never_decreases() {
        let mut session = Session::new();
        let start = session.last_activity();
        let later = start + Duration::from_secs(30);

        session.touch(later);
        assert_eq!(session.last_activity(), later);

        session.touch(start);
        assert_eq!(session.last_activity(), later);
    }

    #[test]
    fn test_snapshot_tracks_principal() {
        let mut session = Session::new();
        assert_eq!(session.snapshot(), AuthSnapshot::default());

        session.authenticate(Principal::new("7"), Instant::now());
        let snapshot = session.snapshot();
        assert!(snapshot.is_authenticated());
        assert_eq!(snapshot.state, AuthState::Authenticated);
    }
}
