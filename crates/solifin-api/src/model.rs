//! Wire models

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::ApiError;
use crate::Result;

/// Field name -> validation messages, as returned with a 422
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Authenticated identity returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    #[serde(deserialize_with = "id_from_number_or_string")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Sent as `0`/`1` by the backend
    #[serde(default, deserialize_with = "flag_from_int_or_bool")]
    pub is_admin: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Principal {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            email: None,
            is_admin: false,
            extra: Map::new(),
        }
    }

    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(self.id.as_str())
    }
}

fn id_from_number_or_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        other => Err(de::Error::custom(format!("invalid principal id: {other}"))),
    }
}

fn flag_from_int_or_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Bool(b) => Ok(b),
        Value::Number(n) => Ok(n.as_f64().map(|v| v != 0.0).unwrap_or(false)),
        Value::String(s) => Ok(matches!(s.trim(), "1" | "true")),
        Value::Null => Ok(false),
        other => Err(de::Error::custom(format!("invalid flag: {other}"))),
    }
}

/// Pull the principal out of a login/whoami response.
///
/// Accepts `{"user": {...}}`, `{"principal": {...}}` or a bare object
/// carrying an `id`.
pub fn principal_from_body(body: Value) -> Result<Principal> {
    let Value::Object(mut map) = body else {
        return Err(ApiError::Malformed("expected a JSON object".to_string()));
    };

    let candidate = match map.remove("user").or_else(|| map.remove("principal")) {
        Some(user) => user,
        None if map.contains_key("id") => Value::Object(map),
        None => {
            return Err(ApiError::Malformed(
                "response carries no principal".to_string(),
            ))
        }
    };

    serde_json::from_value(candidate).map_err(|e| ApiError::Malformed(e.to_string()))
}

#[derive(Clone, Serialize)]
pub struct Credentials {
    #[serde(rename = "email")]
    pub identifier: String,
    #[serde(rename = "password")]
    pub secret: String,
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("secret", &"REDACTED")
            .finish()
    }
}

/// Registration form payload. Fields beyond the core four (phone,
/// country, sponsor code, ...) travel in `extra`.
#[derive(Clone, Serialize, Deserialize)]
pub struct RegistrationProfile {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl fmt::Debug for RegistrationProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationProfile")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("extra", &self.extra)
            .finish_non_exhaustive()
    }
}

/// Successful registration. The backend may or may not echo the new
/// account; it usually asks the user to verify their email first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Registration {
    pub principal: Option<Principal>,
    pub message: Option<String>,
}

impl Registration {
    pub fn from_body(body: Value) -> Self {
        let message = read_message(&body);
        let principal = principal_from_body(body).ok();
        Self { principal, message }
    }
}

#[derive(Clone, Serialize)]
pub struct PasswordReset {
    pub token: String,
    pub email: String,
    #[serde(rename = "password")]
    pub secret: String,
    #[serde(rename = "password_confirmation")]
    pub secret_confirmation: String,
}

impl fmt::Debug for PasswordReset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordReset")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Error envelope used by the backend for non-2xx responses
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub errors: Option<FieldErrors>,
}

impl ErrorBody {
    pub(crate) fn parse(text: &str) -> Self {
        serde_json::from_str(text).unwrap_or_default()
    }

    pub(crate) fn message(&self) -> Option<String> {
        self.message
            .as_deref()
            .or(self.error.as_deref())
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
    }
}

pub(crate) fn read_message(body: &Value) -> Option<String> {
    body.get("message")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_principal_numeric_id_and_int_flag() {
        let principal =
            principal_from_body(json!({"user": {"id": 42, "is_admin": 0, "name": "Awa"}}))
                .unwrap();
        assert_eq!(principal.id, "42");
        assert!(!principal.is_admin);
        assert_eq!(principal.display_name(), "Awa");

        let admin = principal_from_body(json!({"principal": {"id": "7", "is_admin": 1}})).unwrap();
        assert_eq!(admin.id, "7");
        assert!(admin.is_admin);
    }

    #[test]
    fn test_principal_keeps_unknown_fields() {
        let principal = principal_from_body(json!({
            "id": 3,
            "email": "a@b.com",
            "pack_id": 2,
            "status": "active"
        }))
        .unwrap();
        assert_eq!(principal.display_name(), "a@b.com");
        assert_eq!(principal.extra.get("pack_id"), Some(&json!(2)));
        assert_eq!(principal.extra.get("status"), Some(&json!("active")));
    }

    #[test]
    fn test_principal_rejects_malformed_bodies() {
        assert!(matches!(
            principal_from_body(json!({"message": "ok"})),
            Err(ApiError::Malformed(_))
        ));
        assert!(matches!(
            principal_from_body(json!({"user": null})),
            Err(ApiError::Malformed(_))
        ));
        assert!(matches!(
            principal_from_body(json!({"user": {"id": ""}})),
            Err(ApiError::Malformed(_))
        ));
        assert!(principal_from_body(json!([1, 2])).is_err());
    }

    #[test]
    fn test_credentials_wire_names_and_debug() {
        let credentials = Credentials::new("a@b.com", "secret123");
        let wire = serde_json::to_value(&credentials).unwrap();
        assert_eq!(wire, json!({"email": "a@b.com", "password": "secret123"}));
        assert!(!format!("{credentials:?}").contains("secret123"));
    }

    #[test]
    fn test_registration_profile_flattens_extra_fields() {
        let mut extra = Map::new();
        extra.insert("sponsor_code".to_string(), json!("SPX1"));
        let profile = RegistrationProfile {
            name: "Awa".to_string(),
            email: "a@b.com".to_string(),
            password: "secret123".to_string(),
            password_confirmation: "secret123".to_string(),
            extra,
        };
        let wire = serde_json::to_value(&profile).unwrap();
        assert_eq!(wire["sponsor_code"], json!("SPX1"));
        assert_eq!(wire["password_confirmation"], json!("secret123"));
        assert!(!format!("{profile:?}").contains("secret123"));
    }

    #[test]
    fn test_error_body_parsing() {
        let body = ErrorBody::parse(r#"{"message":"The given data was invalid.","errors":{"email":["taken"]}}"#);
        assert_eq!(body.message().as_deref(), Some("The given data was invalid."));
        assert_eq!(
            body.errors.unwrap().get("email"),
            Some(&vec!["taken".to_string()])
        );

        let empty = ErrorBody::parse("<html>bad gateway</html>");
        assert!(empty.message().is_none());
        assert!(empty.errors.is_none());
    }

    #[test]
    fn test_registration_from_body() {
        let registration = Registration::from_body(json!({"message": "Check your inbox."}));
        assert!(registration.principal.is_none());
        assert_eq!(registration.message.as_deref(), Some("Check your inbox."));
    }
}
