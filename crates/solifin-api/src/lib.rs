//! SOLIFIN API Transport
//!
//! Everything the client knows about the remote authority:
//! - `AuthApi`: the authentication endpoints the session manager calls
//! - `ApiClient`: cookie-jar HTTP client with CSRF bootstrap
//! - `SignalBus`: in-process "session expired" broadcast raised when any
//!   collaborator call sees the backend revoke the session

mod api;
mod client;
mod endpoints;
mod error;
mod model;
mod redact;
mod signal;

pub use api::AuthApi;
pub use client::ApiClient;
pub use endpoints::Endpoints;
pub use error::ApiError;
pub use model::{
    principal_from_body, Credentials, FieldErrors, PasswordReset, Principal, Registration,
    RegistrationProfile,
};
pub use redact::redact_secrets;
pub use signal::{SessionSignal, SignalBus};

pub type Result<T> = std::result::Result<T, ApiError>;
