use super::domain::{ApplicationId, ApplicationStatus, EmployeeId, JobApplication};
use super::ledger::LedgerError;

/// Request data rejected before any state is touched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("malformed request body: {0}")]
    MalformedBody(String),
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("`{field}` is not a valid email address: {value}")]
    InvalidEmail { field: &'static str, value: String },
    #[error("invalid decision '{0}', expected 'select' or 'reject'")]
    InvalidDecision(String),
    #[error("unable to parse meeting time '{value}'")]
    InvalidDateTime { value: String },
    #[error("reviewer {0} is not present in the employee directory")]
    UnknownReviewer(EmployeeId),
}

/// Workflow invariant violations. These are raised, never silently absorbed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowViolation {
    #[error("round {round} of application {application_id} already has a decision")]
    DuplicateRoundDecision {
        application_id: ApplicationId,
        round: u8,
    },
    #[error("application {application_id} cannot advance past round {max_rounds}")]
    RoundLimitExceeded {
        application_id: ApplicationId,
        max_rounds: u8,
    },
    #[error("application {application_id} is closed ({})", .status.label())]
    ApplicationClosed {
        application_id: ApplicationId,
        status: ApplicationStatus,
    },
    #[error("application {application_id} has no reviewer assigned for round {round}")]
    NotAssigned {
        application_id: ApplicationId,
        round: u8,
    },
    #[error("application {application_id} must be selected in its latest round before hiring")]
    NotShortlisted { application_id: ApplicationId },
    #[error("application {application_id} is in round {actual}, request targeted round {expected}")]
    StaleRound {
        application_id: ApplicationId,
        expected: u8,
        actual: u8,
    },
    #[error("{approver} already decided a round of application {application_id}")]
    ReviewerAlreadyDecided {
        application_id: ApplicationId,
        approver: String,
    },
}

pub(crate) fn ensure_open(application: &JobApplication) -> Result<(), WorkflowViolation> {
    if application.is_terminal() {
        return Err(WorkflowViolation::ApplicationClosed {
            application_id: application.id.clone(),
            status: application.status,
        });
    }
    Ok(())
}

pub(crate) fn ledger_violation(
    application_id: &ApplicationId,
    err: LedgerError,
) -> WorkflowViolation {
    match err {
        LedgerError::DuplicateRound { round } | LedgerError::OutOfOrder { round, .. } => {
            WorkflowViolation::DuplicateRoundDecision {
                application_id: application_id.clone(),
                round,
            }
        }
    }
}

pub(crate) fn required<'a>(
    field: &'static str,
    value: &'a str,
) -> Result<&'a str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(trimmed)
    }
}

pub(crate) fn email(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let value = required(field, value)?;
    let valid = value
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && domain.contains('.') && !domain.starts_with('.'))
        .unwrap_or(false);

    if valid {
        Ok(value.to_string())
    } else {
        Err(ValidationError::InvalidEmail {
            field,
            value: value.to_string(),
        })
    }
}

/// Treats absent and whitespace-only text the same.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|text| !text.is_empty())
}
