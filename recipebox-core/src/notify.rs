//! User-visible outcome messages.
//!
//! Coordinators never print; they hand back [`Notification`]s and let the
//! front end decide how to show them.

use std::fmt;

use crate::error::{ApiError, ImportError, SubmitError, TagError, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Info,
    Warning,
    Error,
}

impl NotificationKind {
    pub fn title(&self) -> &'static str {
        match self {
            NotificationKind::Success => "Success",
            NotificationKind::Info => "Info",
            NotificationKind::Warning => "Warning",
            NotificationKind::Error => "Error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub description: String,
}

impl Notification {
    pub fn new(kind: NotificationKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            title: kind.title().to_string(),
            description: description.into(),
        }
    }

    pub fn success(description: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, description)
    }

    pub fn info(description: impl Into<String>) -> Self {
        Self::new(NotificationKind::Info, description)
    }

    pub fn warning(description: impl Into<String>) -> Self {
        Self::new(NotificationKind::Warning, description)
    }

    pub fn error(description: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, description)
    }

    /// Replace the default title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn is_error(&self) -> bool {
        self.kind == NotificationKind::Error
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.description)
    }
}

impl From<&ApiError> for Notification {
    fn from(err: &ApiError) -> Self {
        Notification::error(err.to_string())
    }
}

impl From<&ValidationError> for Notification {
    fn from(err: &ValidationError) -> Self {
        Notification::error(err.to_string())
    }
}

impl From<&SubmitError> for Notification {
    fn from(err: &SubmitError) -> Self {
        match err {
            SubmitError::Invalid(e) => e.into(),
            SubmitError::Api(_) => Notification::error(err.to_string()).with_title("Saving failed"),
        }
    }
}

impl From<&TagError> for Notification {
    fn from(err: &TagError) -> Self {
        Notification::error(err.to_string())
    }
}

impl From<&ImportError> for Notification {
    fn from(err: &ImportError) -> Self {
        Notification::error(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message() {
        let n = Notification::from(&ValidationError::NoSteps);
        assert!(n.is_error());
        assert_eq!(
            n.to_string(),
            "Error: Title, ingredients and steps cannot be empty"
        );
    }

    #[test]
    fn test_submit_api_failure_title() {
        let err = SubmitError::Api(ApiError::Status {
            status: 500,
            body: "boom".to_string(),
        });
        let n = Notification::from(&err);
        assert_eq!(n.title, "Saving failed");
        assert_eq!(n.description, "Recipe couldn't be saved: Server returned 500: boom");
    }

    #[test]
    fn test_import_timeout_message() {
        let n = Notification::from(&ImportError::Timeout {
            url: "https://example.com/r".to_string(),
        });
        assert_eq!(n.kind, NotificationKind::Error);
        assert_eq!(
            n.description,
            "Importing recipe from URL: https://example.com/r took too long."
        );
    }
}
