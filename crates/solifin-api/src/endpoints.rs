//! Remote endpoint table

use serde::{Deserialize, Serialize};

/// Paths of the authentication endpoints, relative to the API base URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub csrf_bootstrap: String,
    pub login: String,
    pub logout: String,
    pub whoami: String,
    pub register: String,
    pub forgot_password: String,
    pub reset_password: String,
    pub resend_verification: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            csrf_bootstrap: "/csrf-bootstrap".to_string(),
            login: "/login".to_string(),
            logout: "/logout".to_string(),
            whoami: "/whoami".to_string(),
            register: "/register".to_string(),
            forgot_password: "/password/forgot".to_string(),
            reset_password: "/password/reset".to_string(),
            resend_verification: "/verification/resend".to_string(),
        }
    }
}

impl Endpoints {
    /// Authentication endpoints never raise the session-expired signal:
    /// a 401 there is an expected answer, not a revocation.
    pub fn is_auth_endpoint(&self, path: &str) -> bool {
        [
            &self.csrf_bootstrap,
            &self.login,
            &self.logout,
            &self.whoami,
            &self.register,
            &self.forgot_password,
            &self.reset_password,
            &self.resend_verification,
        ]
        .iter()
        .any(|p| p.as_str() == path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_endpoint_detection() {
        let endpoints = Endpoints::default();
        assert!(endpoints.is_auth_endpoint("/whoami"));
        assert!(endpoints.is_auth_endpoint("/password/reset"));
        assert!(!endpoints.is_auth_endpoint("/feed/ads"));
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let endpoints: Endpoints =
            serde_json::from_str(r#"{"csrf_bootstrap": "/sanctum/csrf-cookie"}"#).unwrap();
        assert_eq!(endpoints.csrf_bootstrap, "/sanctum/csrf-cookie");
        assert_eq!(endpoints.login, "/login");
    }
}
