//! Session timing and routing policy

use std::time::Duration;

use solifin_api::Principal;

#[derive(Debug, Clone)]
pub struct SessionPolicy {
    /// Period of the silent re-validation poll
    pub liveness_interval: Duration,
    /// How often the inactivity watch wakes up
    pub inactivity_check_interval: Duration,
    /// Idle period after which the session is logged out
    pub inactivity_timeout: Duration,
    pub login_path: String,
    pub member_landing_path: String,
    pub admin_landing_path: String,
    /// Login/registration-like paths: never recorded as last visited,
    /// and redirected away from once authenticated
    pub public_paths: Vec<String>,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            liveness_interval: Duration::from_secs(5 * 60),
            inactivity_check_interval: Duration::from_secs(60),
            inactivity_timeout: Duration::from_secs(10 * 60),
            login_path: "/login".to_string(),
            member_landing_path: "/dashboard".to_string(),
            admin_landing_path: "/admin/dashboard".to_string(),
            public_paths: vec![
                "/login".to_string(),
                "/register".to_string(),
                "/forgot-password".to_string(),
                "/reset-password".to_string(),
            ],
        }
    }
}

impl SessionPolicy {
    pub fn is_public_path(&self, path: &str) -> bool {
        let path = normalize(path);
        self.public_paths.iter().any(|public| {
            let public = normalize(public);
            path == public
                || path
                    .strip_prefix(public)
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    pub fn landing_path(&self, principal: &Principal) -> &str {
        if principal.is_admin {
            &self.admin_landing_path
        } else {
            &self.member_landing_path
        }
    }
}

/// Strip query, fragment and trailing slash
fn normalize(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let path = &path[..end];
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}
