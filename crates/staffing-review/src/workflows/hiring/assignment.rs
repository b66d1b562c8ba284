use chrono::{DateTime, Utc};

use super::domain::{ApplicationStatus, ApprovalState, EmployeeId, EmployeeProfile, JobApplication};
use super::guard::{ensure_open, WorkflowViolation};
use super::policy::ReviewPolicy;

/// What an assignment did to the application, for logging and notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentChange {
    pub previous_reviewer: Option<EmployeeId>,
    pub round: u8,
    pub round_advanced: bool,
}

/// Binds `reviewer` to the application.
///
/// When the active round already carries a decision the application moves to the next round
/// (never past `policy.max_rounds`). Otherwise the round is kept, which covers both the first
/// assignment and swapping out a reviewer who has not decided yet.
pub fn assign(
    application: &mut JobApplication,
    reviewer: &EmployeeProfile,
    policy: &ReviewPolicy,
    now: DateTime<Utc>,
) -> Result<AssignmentChange, WorkflowViolation> {
    ensure_open(application)?;

    let round_advanced = application.current_round_decided();
    let holds_decided_round =
        round_advanced && application.assigned_reviewer.as_ref() == Some(&reviewer.id);
    if holds_decided_round || application.rounds.decided_by(reviewer) {
        return Err(WorkflowViolation::ReviewerAlreadyDecided {
            application_id: application.id.clone(),
            approver: reviewer.display_name(),
        });
    }

    if round_advanced {
        if application.current_round >= policy.max_rounds {
            return Err(WorkflowViolation::RoundLimitExceeded {
                application_id: application.id.clone(),
                max_rounds: policy.max_rounds,
            });
        }
        application.current_round += 1;
        application.status = ApplicationStatus::InReview;
    }

    let previous_reviewer = application.assigned_reviewer.replace(reviewer.id.clone());
    application.approval_state = ApprovalState::Assigned;
    application.updated_at = now;

    Ok(AssignmentChange {
        previous_reviewer,
        round: application.current_round,
        round_advanced,
    })
}

/// Reviewers a caller may hand the application to next: everyone on the roster except the
/// current assignee and anyone who already decided one of its rounds.
pub fn eligible_reviewers(
    application: &JobApplication,
    roster: Vec<EmployeeProfile>,
) -> Vec<EmployeeProfile> {
    roster
        .into_iter()
        .filter(|candidate| application.assigned_reviewer.as_ref() != Some(&candidate.id))
        .filter(|candidate| !application.rounds.decided_by(candidate))
        .collect()
}
