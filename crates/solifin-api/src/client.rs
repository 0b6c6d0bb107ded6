//! HTTP client
//!
//! Cookie-based session transport. The backend authenticates by session
//! cookie and guards mutating requests with an anti-forgery token that it
//! hands out as the `XSRF-TOKEN` cookie; we echo it back in the
//! `X-XSRF-TOKEN` header.

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{ACCEPT, ORIGIN};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::api::AuthApi;
use crate::endpoints::Endpoints;
use crate::error::ApiError;
use crate::model::{
    principal_from_body, read_message, Credentials, ErrorBody, PasswordReset, Principal,
    Registration, RegistrationProfile,
};
use crate::redact::redact_secrets;
use crate::signal::SignalBus;
use crate::Result;

const XSRF_COOKIE: &str = "XSRF-TOKEN";
const XSRF_HEADER: &str = "X-XSRF-TOKEN";

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    jar: Arc<Jar>,
    base_url: Url,
    endpoints: Endpoints,
    signals: SignalBus,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration, signals: SignalBus) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;

        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            jar,
            base_url,
            endpoints: Endpoints::default(),
            signals,
        })
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn signals(&self) -> &SignalBus {
        &self.signals
    }

    pub fn has_csrf_token(&self) -> bool {
        self.xsrf_token().is_some()
    }

    /// GET a JSON resource on behalf of a collaborator (feeds, pages, admin
    /// panels). A 401/419 here raises the session-expired signal.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.request(Method::GET, path)?;
        let value = self.execute(path, request).await?;
        serde_json::from_value(value).map_err(|e| ApiError::Malformed(e.to_string()))
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::POST, path)?.json(body);
        let value = self.execute(path, request).await?;
        serde_json::from_value(value).map_err(|e| ApiError::Malformed(e.to_string()))
    }

    fn url(&self, path: &str) -> Result<Url> {
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|e| ApiError::InvalidUrl(format!("{joined}: {e}")))
    }

    fn xsrf_token(&self) -> Option<String> {
        let header = self.jar.cookies(&self.base_url)?;
        let cookies = header.to_str().ok()?;
        cookies
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == XSRF_COOKIE)
            .and_then(|(_, value)| urlencoding::decode(value).ok())
            .map(|value| value.into_owned())
            .filter(|value| !value.is_empty())
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self.url(path)?;
        let mutating = method != Method::GET;

        let mut request = self
            .http
            .request(method, url)
            .header(ACCEPT, "application/json")
            .header("X-Requested-With", "XMLHttpRequest");

        if mutating {
            request = request.header(ORIGIN, self.base_url.origin().ascii_serialization());
            if let Some(token) = self.xsrf_token() {
                request = request.header(XSRF_HEADER, token);
            }
        }

        Ok(request)
    }

    async fn execute(&self, path: &str, request: RequestBuilder) -> Result<Value> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;

        tracing::debug!(path = %path, status = status.as_u16(), "API call completed");

        if status.is_success() {
            if text.trim().is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_str(&text).map_err(|e| ApiError::Malformed(e.to_string()));
        }

        let error = map_status(status.as_u16(), &text);
        if error.is_unauthorized() && !self.endpoints.is_auth_endpoint(path) {
            tracing::warn!(
                path = %path,
                status = status.as_u16(),
                "Backend revoked the session"
            );
            self.signals.emit_expired();
        }

        Err(error)
    }

    async fn post_for_message(&self, path: &str, body: &Value, fallback: &str) -> Result<String> {
        let request = self.request(Method::POST, path)?.json(body);
        let value = self.execute(path, request).await?;
        Ok(read_message(&value).unwrap_or_else(|| fallback.to_string()))
    }
}

fn transport_error(error: reqwest::Error) -> ApiError {
    ApiError::Transport(redact_secrets(&error.to_string()).into_owned())
}

fn map_status(status: u16, text: &str) -> ApiError {
    let body = ErrorBody::parse(text);
    let message = body.message();

    match status {
        401 | 419 => ApiError::Unauthorized {
            status,
            message: message.unwrap_or_else(|| "Unauthenticated.".to_string()),
        },
        422 => ApiError::Validation {
            message: message.unwrap_or_else(|| "The given data was invalid.".to_string()),
            errors: body.errors.unwrap_or_default(),
        },
        429 => ApiError::RateLimited(
            message.unwrap_or_else(|| "Too many attempts. Try again later.".to_string()),
        ),
        _ => ApiError::Status {
            status,
            message: message.unwrap_or_else(|| format!("Request failed with status {status}")),
        },
    }
}

#[async_trait]
impl AuthApi for ApiClient {
    async fn csrf_bootstrap(&self) -> Result<()> {
        let path = self.endpoints.csrf_bootstrap.as_str();
        let request = self.request(Method::GET, path)?;
        self.execute(path, request).await?;

        if !self.has_csrf_token() {
            tracing::debug!("CSRF bootstrap returned no XSRF-TOKEN cookie");
        }
        Ok(())
    }

    async fn login(&self, credentials: &Credentials) -> Result<Principal> {
        let path = self.endpoints.login.as_str();
        let request = self.request(Method::POST, path)?.json(credentials);
        principal_from_body(self.execute(path, request).await?)
    }

    async fn logout(&self) -> Result<()> {
        let path = self.endpoints.logout.as_str();
        let request = self.request(Method::POST, path)?;
        self.execute(path, request).await?;
        Ok(())
    }

    async fn whoami(&self) -> Result<Principal> {
        let path = self.endpoints.whoami.as_str();
        let request = self.request(Method::GET, path)?;
        principal_from_body(self.execute(path, request).await?)
    }

    async fn register(&self, profile: &RegistrationProfile) -> Result<Registration> {
        let path = self.endpoints.register.as_str();
        let request = self.request(Method::POST, path)?.json(profile);
        Ok(Registration::from_body(self.execute(path, request).await?))
    }

    async fn forgot_password(&self, email: &str) -> Result<String> {
        self.post_for_message(
            &self.endpoints.forgot_password,
            &json!({ "email": email }),
            "If this address is registered, a reset link has been sent.",
        )
        .await
    }

    async fn reset_password(&self, request: &PasswordReset) -> Result<String> {
        let body = serde_json::to_value(request).map_err(|e| ApiError::Malformed(e.to_string()))?;
        self.post_for_message(
            &self.endpoints.reset_password,
            &body,
            "Your password has been reset.",
        )
        .await
    }

    async fn resend_verification(&self, email: &str) -> Result<String> {
        self.post_for_message(
            &self.endpoints.resend_verification,
            &json!({ "email": email }),
            "A new verification link has been sent.",
        )
        .await
    }
}
