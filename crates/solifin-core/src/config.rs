//! Client configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use solifin_api::Endpoints;
use solifin_session::SessionPolicy;

use crate::error::CoreError;
use crate::Result;

pub const ENV_API_URL: &str = "SOLIFIN_API_URL";
pub const ENV_DATA_DIR: &str = "SOLIFIN_DATA_DIR";
pub const ENV_INACTIVITY_TIMEOUT_SECS: &str = "SOLIFIN_INACTIVITY_TIMEOUT_SECS";

const DATABASE_FILE: &str = "solifin.db";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the SOLIFIN backend
    pub api_base_url: String,
    /// Path to the local store
    pub database_path: PathBuf,
    pub request_timeout_secs: u64,
    pub liveness_interval_secs: u64,
    pub inactivity_check_interval_secs: u64,
    pub inactivity_timeout_secs: u64,
    pub login_path: String,
    pub member_landing_path: String,
    pub admin_landing_path: String,
    /// Login/registration-like pages
    pub public_paths: Vec<String>,
    pub endpoints: Endpoints,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        let policy = SessionPolicy::default();

        Self {
            api_base_url: "http://localhost:8000".to_string(),
            database_path: data_dir.join(DATABASE_FILE),
            request_timeout_secs: 15,
            liveness_interval_secs: policy.liveness_interval.as_secs(),
            inactivity_check_interval_secs: policy.inactivity_check_interval.as_secs(),
            inactivity_timeout_secs: policy.inactivity_timeout.as_secs(),
            login_path: policy.login_path,
            member_landing_path: policy.member_landing_path,
            admin_landing_path: policy.admin_landing_path,
            public_paths: policy.public_paths,
            endpoints: Endpoints::default(),
        }
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("SOLIFIN"))
            .unwrap_or_else(|| PathBuf::from(".solifin"))
    }

    /// Read a JSON config file; missing keys take their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `SOLIFIN_*` environment variables on top of this config
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }

        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|v| !v.trim().is_empty()) {
            self.database_path = PathBuf::from(dir.trim()).join(DATABASE_FILE);
        }

        if let Some(raw) = lookup(ENV_INACTIVITY_TIMEOUT_SECS) {
            self.inactivity_timeout_secs = raw.trim().parse().map_err(|_| {
                CoreError::Config(format!(
                    "{ENV_INACTIVITY_TIMEOUT_SECS} must be a whole number of seconds, got {raw:?}"
                ))
            })?;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(CoreError::Config("api_base_url is empty".to_string()));
        }
        for (name, secs) in [
            ("request_timeout_secs", self.request_timeout_secs),
            ("liveness_interval_secs", self.liveness_interval_secs),
            ("inactivity_check_interval_secs", self.inactivity_check_interval_secs),
            ("inactivity_timeout_secs", self.inactivity_timeout_secs),
        ] {
            if secs == 0 {
                return Err(CoreError::Config(format!("{name} must be greater than zero")));
            }
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn session_policy(&self) -> SessionPolicy {
        SessionPolicy {
            liveness_interval: Duration::from_secs(self.liveness_interval_secs),
            inactivity_check_interval: Duration::from_secs(self.inactivity_check_interval_secs),
            inactivity_timeout: Duration::from_secs(self.inactivity_timeout_secs),
            login_path: self.login_path.clone(),
            member_landing_path: self.member_landing_path.clone(),
            admin_landing_path: self.admin_landing_path.clone(),
            public_paths: self.public_paths.clone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}

mod dirs {
    use std::path::PathBuf;

    pub fn data_local_dir() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            std::env::var("LOCALAPPDATA").ok().map(PathBuf::from)
        }
        #[cfg(target_os = "macos")]
        {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join("Library/Application Support"))
        }
        #[cfg(target_os = "linux")]
        {
            std::env::var("XDG_DATA_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(|| {
                    std::env::var("HOME")
                        .ok()
                        .map(|h| PathBuf::from(h).join(".local/share"))
                })
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
        {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_match_session_policy() {
        let config = Config::new(PathBuf::from("/tmp/solifin"));
        assert_eq!(config.database_path, PathBuf::from("/tmp/solifin/solifin.db"));
        assert_eq!(config.request_timeout(), Duration::from_secs(15));

        let policy = config.session_policy();
        assert_eq!(policy.liveness_interval, Duration::from_secs(300));
        assert_eq!(policy.inactivity_check_interval, Duration::from_secs(60));
        assert_eq!(policy.inactivity_timeout, Duration::from_secs(600));
        assert!(policy.is_public_path("/register"));
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::new(PathBuf::from("/tmp/solifin"))
            .with_overrides(lookup(&[
                (ENV_API_URL, "https://api.solifin.com"),
                (ENV_DATA_DIR, "/var/lib/solifin"),
                (ENV_INACTIVITY_TIMEOUT_SECS, " 900 "),
            ]))
            .unwrap();

        assert_eq!(config.api_base_url, "https://api.solifin.com");
        assert_eq!(config.database_path, PathBuf::from("/var/lib/solifin/solifin.db"));
        assert_eq!(
            config.session_policy().inactivity_timeout,
            Duration::from_secs(900)
        );
    }

    #[test]
    fn test_invalid_overrides_are_rejected() {
        let result = Config::new(PathBuf::from("/tmp/solifin"))
            .with_overrides(lookup(&[(ENV_INACTIVITY_TIMEOUT_SECS, "ten minutes")]));
        assert!(matches!(result, Err(CoreError::Config(_))));

        let result = Config::new(PathBuf::from("/tmp/solifin"))
            .with_overrides(lookup(&[(ENV_INACTIVITY_TIMEOUT_SECS, "0")]));
        assert!(matches!(result, Err(CoreError::Config(_))));
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config: Config = serde_json::from_str(
            r#"{"api_base_url": "https://api.solifin.com", "inactivity_timeout_secs": 300,
                "endpoints": {"whoami": "/api/user"}}"#,
        )
        .unwrap();

        assert_eq!(config.api_base_url, "https://api.solifin.com");
        assert_eq!(config.inactivity_timeout_secs, 300);
        assert_eq!(config.liveness_interval_secs, 300);
        assert_eq!(config.endpoints.whoami, "/api/user");
        assert_eq!(config.endpoints.login, "/login");
        assert!(config.validate().is_ok());
    }
}
