use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    ApplicationStatus, ApprovalState, JobApplication, RoundDecision, RoundOutcome,
};
use super::guard::{self, ensure_open, ledger_violation, ValidationError, WorkflowViolation};

/// A reviewer's verdict on the active round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundResolution {
    pub outcome: RoundOutcome,
    pub approver: String,
    pub remark: Option<String>,
    /// Round the caller believes is active; a mismatch means the caller acted on stale state.
    pub expected_round: Option<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Workflow(#[from] WorkflowViolation),
}

/// Records the verdict for the active round and moves the application accordingly.
pub fn resolve(
    application: &mut JobApplication,
    resolution: &RoundResolution,
    now: DateTime<Utc>,
) -> Result<RoundDecision, ResolutionError> {
    let approver = guard::required("round_approver", &resolution.approver)?.to_string();
    ensure_open(application)?;

    let round = application.current_round;
    if let Some(expected) = resolution.expected_round {
        if expected != round {
            return Err(WorkflowViolation::StaleRound {
                application_id: application.id.clone(),
                expected,
                actual: round,
            }
            .into());
        }
    }

    if application.current_round_decided() {
        return Err(WorkflowViolation::DuplicateRoundDecision {
            application_id: application.id.clone(),
            round,
        }
        .into());
    }

    if application.approval_state != ApprovalState::Assigned {
        return Err(WorkflowViolation::NotAssigned {
            application_id: application.id.clone(),
            round,
        }
        .into());
    }

    let decision = RoundDecision {
        round,
        approver: approver.clone(),
        reviewer: application.assigned_reviewer.clone(),
        outcome: resolution.outcome,
        decided_at: now,
    };
    let application_id = application.id.clone();
    let recorded = application
        .rounds
        .record(decision)
        .map_err(|err| ledger_violation(&application_id, err))?
        .clone();

    match resolution.outcome {
        RoundOutcome::Rejected => {
            application.status = ApplicationStatus::Rejected;
            application.approval_state = ApprovalState::Rejected;
        }
        RoundOutcome::Approved => {
            application.status = ApplicationStatus::Shortlisted;
            application.approval_state = ApprovalState::Selected;
        }
    }

    application.history.push(
        now,
        Some(&approver),
        format!("Round {} by {}", resolution.outcome.verb(), approver),
    );
    if let Some(remark) = guard::non_blank(resolution.remark.as_deref()) {
        application.remarks.push(now, Some(&approver), remark);
    }
    application.updated_at = now;

    Ok(recorded)
}

/// The single terminal decision on an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalDecision {
    Select,
    Reject,
}

impl FinalDecision {
    pub const fn label(self) -> &'static str {
        match self {
            FinalDecision::Select => "select",
            FinalDecision::Reject => "reject",
        }
    }
}

impl fmt::Display for FinalDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FinalDecision {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "select" => Ok(FinalDecision::Select),
            "reject" => Ok(FinalDecision::Reject),
            _ => Err(ValidationError::InvalidDecision(raw.to_string())),
        }
    }
}

/// Closes the application as hired or rejected.
///
/// Hiring requires the latest round to have been approved. Rejection is allowed from any open
/// state.
pub fn decide(
    application: &mut JobApplication,
    decision: FinalDecision,
    now: DateTime<Utc>,
) -> Result<(), WorkflowViolation> {
    ensure_open(application)?;

    match decision {
        FinalDecision::Select => {
            if application.approval_state != ApprovalState::Selected {
                return Err(WorkflowViolation::NotShortlisted {
                    application_id: application.id.clone(),
                });
            }
            application.status = ApplicationStatus::Hired;
            application.history.push(now, None, "Candidate hired");
        }
        FinalDecision::Reject => {
            application.status = ApplicationStatus::Rejected;
            application.approval_state = ApprovalState::Rejected;
            application.history.push(now, None, "Candidate rejected");
        }
    }
    application.updated_at = now;

    Ok(())
}
