//! Authentication State Machine
//!
//! ```text
//! Unauthenticated
//!   ↓ login / initial check_auth
//! Authenticating
//!   ↓ principal returned        ↘ failure
//! Authenticated ──────────────→ Unauthenticated
//!        logout / inactivity / expired signal
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    /// No principal; initial and resting state
    Unauthenticated,
    /// A login or initial identity check is in flight
    Authenticating,
    /// The backend returned a valid principal
    Authenticated,
}

impl AuthState {
    /// Check if transition to another state is valid
    pub fn can_transition_to(&self, target: AuthState) -> bool {
        match (self, target) {
            (AuthState::Unauthenticated, AuthState::Authenticating) => true,
            (AuthState::Authenticating, AuthState::Authenticated) => true,
            (AuthState::Authenticating, AuthState::Unauthenticated) => true,
            (AuthState::Authenticated, AuthState::Unauthenticated) => true,
            // A login that finishes after a concurrent failed check reset the state
            (AuthState::Unauthenticated, AuthState::Authenticated) => true,
            (a, b) if *a == b => true,
            _ => false,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthState::Unauthenticated => "unauthenticated",
            AuthState::Authenticating => "authenticating",
            AuthState::Authenticated => "authenticated",
        }
    }
}

impl std::fmt::Display for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AuthState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unauthenticated" => Ok(AuthState::Unauthenticated),
            "authenticating" => Ok(AuthState::Authenticating),
            "authenticated" => Ok(AuthState::Authenticated),
            _ => Err(format!("Unknown auth state: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        assert!(AuthState::Unauthenticated.can_transition_to(AuthState::Authenticating));
        assert!(AuthState::Authenticating.can_transition_to(AuthState::Authenticated));
        assert!(AuthState::Authenticating.can_transition_to(AuthState::Unauthenticated));
        assert!(AuthState::Authenticated.can_transition_to(AuthState::Unauthenticated));
        assert!(AuthState::Authenticated.can_transition_to(AuthState::Authenticated));
    }

    #[test]
    fn test_invalid_transitions() {
        // A live session is re-validated without leaving Authenticated
        assert!(!AuthState::Authenticated.can_transition_to(AuthState::Authenticating));
    }

    #[test]
    fn test_round_trip_names() {
        for state in [
            AuthState::Unauthenticated,
            AuthState::Authenticating,
            AuthState::Authenticated,
        ] {
            assert_eq!(state.as_str().parse::<AuthState>().unwrap(), state);
        }
        assert!("expired".parse::<AuthState>().is_err());
    }
}
