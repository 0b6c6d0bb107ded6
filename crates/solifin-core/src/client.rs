//! Client state container
//!
//! Wires storage, transport and the session manager. One instance per
//! process; the UI tree holds it and reads session state from it.

use std::sync::Arc;

use solifin_api::{ApiClient, SignalBus};
use solifin_session::{SessionManager, SessionUi};
use solifin_storage::Database;

use crate::config::Config;
use crate::Result;

pub struct Solifin {
    config: Config,
    db: Database,
    api: ApiClient,
    session_manager: SessionManager,
}

impl Solifin {
    /// Open the local store at `config.database_path` and build the client
    pub fn new(config: Config, ui: Arc<dyn SessionUi>) -> Result<Self> {
        let db = Database::open(&config.database_path)?;
        Self::with_database(config, db, ui)
    }

    pub fn with_database(config: Config, db: Database, ui: Arc<dyn SessionUi>) -> Result<Self> {
        config.validate()?;

        let signals = SignalBus::new();
        let api = ApiClient::new(&config.api_base_url, config.request_timeout(), signals.clone())?
            .with_endpoints(config.endpoints.clone());

        let session_manager = SessionManager::new(
            Arc::new(api.clone()),
            db.clone(),
            signals,
            ui,
            config.session_policy(),
        );

        tracing::info!(
            api_base_url = %config.api_base_url,
            database = %config.database_path.display(),
            "SOLIFIN client created"
        );

        Ok(Self {
            config,
            db,
            api,
            session_manager,
        })
    }

    /// Subscribe to session signals, then run the startup identity check.
    /// Returns whether a session is active.
    pub async fn start(&self, current_path: &str) -> bool {
        self.session_manager.start();
        let authenticated = self.session_manager.initialize(current_path).await;
        tracing::info!(authenticated, "SOLIFIN client started");
        authenticated
    }

    /// Cancel timers, listeners and the signal subscription
    pub fn shutdown(&self) {
        self.session_manager.shutdown();
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Transport for collaborators (feeds, pages, admin panels)
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn session(&self) -> &SessionManager {
        &self.session_manager
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CoreError;
    use solifin_session::{AuthState, LogUi};
    use std::path::PathBuf;
    use std::time::Duration;

    fn config() -> Config {
        let mut config = Config::new(PathBuf::from("/tmp/solifin-test"));
        // Nothing listens on the discard port
        config.api_base_url = "http://127.0.0.1:9".to_string();
        config.request_timeout_secs = 2;
        config
    }

    fn client(config: Config) -> Result<Solifin> {
        Solifin::with_database(config, Database::open_in_memory()?, Arc::new(LogUi))
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        let mut config = config();
        config.api_base_url = "not a url".to_string();
        assert!(matches!(client(config), Err(CoreError::Api(_))));
    }

    #[test]
    fn test_wires_components() {
        let solifin = client(config()).unwrap();
        assert_eq!(solifin.api().base_url().as_str(), "http://127.0.0.1:9/");
        assert_eq!(
            solifin.session().policy().inactivity_timeout,
            Duration::from_secs(600)
        );
        assert_eq!(solifin.session().state(), AuthState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_start_without_backend_and_shutdown() {
        let solifin = client(config()).unwrap();

        assert!(!solifin.start("/login").await);
        assert!(!solifin.session().is_authenticated());
        assert_eq!(solifin.api().signals().subscriber_count(), 1);

        solifin.shutdown();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(solifin.api().signals().subscriber_count(), 0);
        assert_eq!(solifin.session().active_timer_count(), 0);
    }
}
