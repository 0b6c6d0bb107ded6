//! SOLIFIN Core
//!
//! Configuration, logging and the `Solifin` container that wires the
//! local store, the HTTP transport and the session manager.

mod client;
mod config;
mod error;

pub use client::Solifin;
pub use config::{Config, ENV_API_URL, ENV_DATA_DIR, ENV_INACTIVITY_TIMEOUT_SECS};
pub use error::CoreError;

// Re-export components
pub use solifin_api::{
    redact_secrets, ApiClient, ApiError, AuthApi, Endpoints, FieldErrors, Principal,
    RegistrationProfile, SessionSignal, SignalBus,
};
pub use solifin_session::{
    ActionResponse, ActivityBus, ActivityEvent, ActivityKind, AuthSnapshot, AuthState, Failure,
    FailureKind, LogUi, LoginSuccess, LogoutReason, Notice, NoticeLevel, Outcome, SessionError,
    SessionManager, SessionPolicy, SessionUi,
};
pub use solifin_storage::{Database, StorageError};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
