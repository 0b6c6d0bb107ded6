//! SOLIFIN Session Management
//!
//! Client-side authentication lifecycle:
//! - `Unauthenticated → Authenticating → Authenticated` state machine
//! - Liveness poll re-validating the session every few minutes
//! - Inactivity watch forcing logout after an idle period
//! - Activity listeners attached only while authenticated
//! - Forced logout on the transport's session-expired signal

mod activity;
mod background;
mod error;
mod manager;
mod outcome;
mod policy;
mod session;
mod state;
mod store;
mod ui;

pub use activity::{ActivityBus, ActivityEvent, ActivityKind};
pub use error::SessionError;
pub use manager::SessionManager;
pub use outcome::{ActionResponse, Failure, FailureKind, LoginSuccess, Outcome};
pub use policy::SessionPolicy;
pub use session::{AuthSnapshot, Session};
pub use state::AuthState;
pub use store::{LocalStore, KEY_REMEMBERED_IDENTIFIER, KEY_REMEMBER_ME};
pub use ui::{LogUi, LogoutReason, Notice, NoticeLevel, SessionUi};

pub type Result<T> = std::result::Result<T, SessionError>;
