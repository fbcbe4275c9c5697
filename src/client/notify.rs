use serde::{Deserialize, Serialize};

use super::api::ApiError;
use super::records::{Complaint, ComplaintStatus, RecordError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    #[default]
    Info,
    Success,
    Warning,
    Danger,
}

/// The one message shape every page renders as a transient, dismissible toast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
}

impl Notification {
    pub fn new(message: impl Into<String>, kind: NotificationKind) -> Self {
        Self { message: message.into(), kind }
    }

    pub fn info(message: impl Into<String>) -> Self { Self::new(message, NotificationKind::Info) }
    pub fn success(message: impl Into<String>) -> Self { Self::new(message, NotificationKind::Success) }
    pub fn warning(message: impl Into<String>) -> Self { Self::new(message, NotificationKind::Warning) }
    pub fn danger(message: impl Into<String>) -> Self { Self::new(message, NotificationKind::Danger) }
}

impl From<&ApiError> for Notification {
    fn from(err: &ApiError) -> Self {
        match err {
            ApiError::Status { message, .. } => Notification::danger(message.clone()),
            _ => Notification::danger("Could not reach the server. Please try again."),
        }
    }
}

impl From<&RecordError> for Notification {
    fn from(err: &RecordError) -> Self {
        match err {
            RecordError::Invalid(msg) => Notification::danger(msg.clone()),
            RecordError::Storage(_) => Notification::danger("Could not save. Please try again."),
        }
    }
}

/// Shown on page load when any stored complaint has been resolved.
pub fn resolution_notice(user: &str, complaints: &[Complaint]) -> Option<Notification> {
    complaints
        .iter()
        .any(|c| c.status == ComplaintStatus::Resolved)
        .then(|| Notification::info(format!("{}, Your complaint has been resolved!", user)))
}
