//! Authentication API seam

use async_trait::async_trait;

use crate::model::{Credentials, PasswordReset, Principal, Registration, RegistrationProfile};
use crate::Result;

/// The authentication endpoints the session manager depends on.
///
/// `ApiClient` is the HTTP implementation; tests substitute scripted ones.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Pre-flight that makes the backend issue the anti-forgery cookie
    async fn csrf_bootstrap(&self) -> Result<()>;

    async fn login(&self, credentials: &Credentials) -> Result<Principal>;

    async fn logout(&self) -> Result<()>;

    /// "Who am I": succeeds only while the ambient session cookie is valid
    async fn whoami(&self) -> Result<Principal>;

    async fn register(&self, profile: &RegistrationProfile) -> Result<Registration>;

    async fn forgot_password(&self, email: &str) -> Result<String>;

    async fn reset_password(&self, request: &PasswordReset) -> Result<String>;

    async fn resend_verification(&self, email: &str) -> Result<String>;
}
