//! Results handed back to UI forms

use serde::Serialize;
use solifin_api::{ApiError, FieldErrors, Principal};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Network, timeout or client construction problems
    Transport,
    /// Bad credentials or no valid session
    Unauthorized,
    /// Field-level validation errors
    Validation,
    /// Any other refusal (rate limiting, forbidden, server error)
    Rejected,
    /// Response did not have the expected shape
    Malformed,
}

/// A remote call that did not succeed, in a form the UI can display
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("{message}")]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            errors: None,
        }
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        self.errors.as_ref()
    }
}

impl From<ApiError> for Failure {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::Transport(message) | ApiError::InvalidUrl(message) => {
                Failure::new(FailureKind::Transport, message)
            }
            ApiError::Unauthorized { message, .. } => {
                Failure::new(FailureKind::Unauthorized, message)
            }
            ApiError::Validation { message, errors } => Failure {
                kind: FailureKind::Validation,
                message,
                errors: Some(errors),
            },
            ApiError::RateLimited(message) | ApiError::Status { message, .. } => {
                Failure::new(FailureKind::Rejected, message)
            }
            ApiError::Malformed(message) => Failure::new(FailureKind::Malformed, message),
        }
    }
}

pub type Outcome<T> = std::result::Result<T, Failure>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoginSuccess {
    pub principal: Principal,
    /// Where the user was before their previous session ended
    pub pending_last_visited_path: Option<String>,
}

/// `{success, data, message, error, errors}` envelope
#[derive(Debug, Clone, Serialize)]
pub struct ActionResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub error: Option<String>,
    pub errors: Option<FieldErrors>,
}

impl<T> ActionResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error: None,
            errors: None,
        }
    }

    pub fn err(failure: Failure) -> Self {
        Self {
            success: false,
            data: None,
            message: None,
            error: Some(failure.message),
            errors: failure.errors,
        }
    }
}

impl ActionResponse<()> {
    /// Success carrying only a server message (password and
    /// verification pass-throughs)
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
            error: None,
            errors: None,
        }
    }
}

impl<T> From<Outcome<T>> for ActionResponse<T> {
    fn from(outcome: Outcome<T>) -> Self {
        match outcome {
            Ok(data) => Self::ok(data),
            Err(failure) => Self::err(failure),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failure_from_api_error() {
        let failure = Failure::from(ApiError::Transport("timed out".to_string()));
        assert_eq!(failure.kind, FailureKind::Transport);
        assert!(failure.errors.is_none());

        let failure = Failure::from(ApiError::Status {
            status: 403,
            message: "Forbidden".to_string(),
        });
        assert_eq!(failure.kind, FailureKind::Rejected);
        assert_eq!(failure.to_string(), "Forbidden");

        let failure = Failure::from(ApiError::RateLimited("slow down".to_string()));
        assert_eq!(failure.kind, FailureKind::Rejected);
    }

    #[test]
    fn test_validation_failure_keeps_field_map() {
        let mut errors = FieldErrors::new();
        errors.insert("email".to_string(), vec!["taken".to_string()]);

        let failure = Failure::from(ApiError::Validation {
            message: "The given data was invalid.".to_string(),
            errors: errors.clone(),
        });
        assert_eq!(failure.kind, FailureKind::Validation);
        assert_eq!(failure.field_errors(), Some(&errors));

        let wire = serde_json::to_value(&failure).unwrap();
        assert_eq!(wire["kind"], json!("validation"));
        assert_eq!(wire["errors"]["email"], json!(["taken"]));
    }

    #[test]
    fn test_action_response_shapes() {
        let ok = ActionResponse::from(Ok::<u32, Failure>(5));
        assert!(ok.success);
        assert_eq!(ok.data, Some(5));

        let err = ActionResponse::from(Err::<u32, Failure>(Failure::new(
            FailureKind::Unauthorized,
            "Invalid credentials",
        )));
        assert!(!err.success);
        assert_eq!(err.error.as_deref(), Some("Invalid credentials"));

        let wire = serde_json::to_value(ActionResponse::<()>::message("Link sent.")).unwrap();
        assert_eq!(
            wire,
            json!({
                "success": true,
                "data": null,
                "message": "Link sent.",
                "error": null,
                "errors": null
            })
        );
    }
}
