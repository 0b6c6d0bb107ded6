//! UI seam: notices and redirects

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Warning,
}

/// A user-facing toast
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }
}

/// Why a session was ended without the user asking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoutReason {
    Inactivity,
    Expired,
}

impl LogoutReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogoutReason::Inactivity => "inactivity",
            LogoutReason::Expired => "expired",
        }
    }

    pub fn notice(&self) -> Notice {
        match self {
            LogoutReason::Inactivity => {
                Notice::info("You have been logged out due to inactivity.")
            }
            LogoutReason::Expired => {
                Notice::warning("Your session has expired. Please log in again.")
            }
        }
    }
}

/// Implemented by the UI shell hosting the session manager
pub trait SessionUi: Send + Sync {
    fn notify(&self, notice: Notice);

    fn redirect(&self, path: &str);
}

/// Headless implementation that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct LogUi;

impl SessionUi for LogUi {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => tracing::info!(notice = %notice.message, "Session notice"),
            NoticeLevel::Warning => tracing::warn!(notice = %notice.message, "Session notice"),
        }
    }

    fn redirect(&self, path: &str) {
        tracing::info!(path = %path, "Redirect requested");
    }
}
