use serde::{Deserialize, Serialize};

use super::domain::{ApplicationId, DelegateTarget, EmployeeProfile};

/// Outbound notification hook (e-mail, chat, etc.). Delivery is best-effort.
pub trait ReviewNotifier: Send + Sync {
    fn notify(&self, notice: ReviewNotice) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NoticeRecipient {
    Reviewer(EmployeeProfile),
    Delegate(DelegateTarget),
}

impl NoticeRecipient {
    pub fn email(&self) -> &str {
        match self {
            NoticeRecipient::Reviewer(profile) => &profile.email,
            NoticeRecipient::Delegate(target) => &target.email,
        }
    }
}

/// Payload so transports and tests can assert what was sent to whom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewNotice {
    pub recipient: NoticeRecipient,
    pub application_id: ApplicationId,
    pub summary: String,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
