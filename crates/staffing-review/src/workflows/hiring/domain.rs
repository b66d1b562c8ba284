use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ledger::{RoundLedger, Trail};

/// Identifier wrapper for candidate applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier for an employee owned by the external directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EmployeeId(pub String);

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    pub email: String,
}

/// Intake payload captured when a candidate submits an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewApplication {
    pub candidate: Candidate,
    pub job_role: String,
    pub position: String,
    /// Opaque pointer to the stored resume; file storage lives outside this crate.
    pub resume_ref: String,
    pub created_by: EmployeeId,
}

/// Externally visible lifecycle stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    InReview,
    Shortlisted,
    Rejected,
    Hired,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::InReview => "in_review",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Hired => "hired",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, ApplicationStatus::Rejected | ApplicationStatus::Hired)
    }
}

/// Whether the active round has been decided, orthogonal to [`ApplicationStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalState {
    Unassigned,
    Assigned,
    Selected,
    Rejected,
}

impl ApprovalState {
    pub const fn label(self) -> &'static str {
        match self {
            ApprovalState::Unassigned => "unassigned",
            ApprovalState::Assigned => "assigned",
            ApprovalState::Selected => "selected",
            ApprovalState::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundOutcome {
    Approved,
    Rejected,
}

impl RoundOutcome {
    pub const fn verb(self) -> &'static str {
        match self {
            RoundOutcome::Approved => "approved",
            RoundOutcome::Rejected => "rejected",
        }
    }
}

/// One reviewer's verdict for a single round. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundDecision {
    pub round: u8,
    pub approver: String,
    /// Reviewer who held the application when the round was decided.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewer: Option<EmployeeId>,
    pub outcome: RoundOutcome,
    pub decided_at: DateTime<Utc>,
}

/// Optional informational CC recipient. Does not change ownership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegateTarget {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingDetails {
    pub remarks: Option<String>,
    pub link: String,
    pub scheduled_at: DateTime<Utc>,
}

/// Root entity of the review pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobApplication {
    pub id: ApplicationId,
    pub candidate: Candidate,
    pub job_role: String,
    pub position: String,
    pub resume_ref: String,
    pub status: ApplicationStatus,
    pub approval_state: ApprovalState,
    pub current_round: u8,
    pub rounds: RoundLedger,
    pub assigned_reviewer: Option<EmployeeId>,
    pub delegate: Option<DelegateTarget>,
    pub history: Trail,
    pub remarks: Trail,
    pub meeting: Option<MeetingDetails>,
    pub created_by: EmployeeId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobApplication {
    pub fn new(id: ApplicationId, submission: NewApplication, now: DateTime<Utc>) -> Self {
        let NewApplication {
            candidate,
            job_role,
            position,
            resume_ref,
            created_by,
        } = submission;

        Self {
            id,
            candidate,
            job_role,
            position,
            resume_ref,
            status: ApplicationStatus::Pending,
            approval_state: ApprovalState::Unassigned,
            current_round: 1,
            rounds: RoundLedger::default(),
            assigned_reviewer: None,
            delegate: None,
            history: Trail::default(),
            remarks: Trail::default(),
            meeting: None,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// True once the active round carries a recorded decision.
    pub fn current_round_decided(&self) -> bool {
        self.rounds.decision_for(self.current_round).is_some()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} ({}) for {} / {}, round {}",
            self.candidate.name, self.id, self.job_role, self.position, self.current_round
        )
    }
}

/// Directory record for an employee who may create or review applications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeProfile {
    pub id: EmployeeId,
    pub name: String,
    pub surname: String,
    pub role: String,
    pub email: String,
}

impl EmployeeProfile {
    pub fn display_name(&self) -> String {
        if self.surname.trim().is_empty() {
            self.name.trim().to_string()
        } else {
            format!("{} {}", self.name.trim(), self.surname.trim())
        }
    }

    /// Whether `approver`, as typed by a reviewer when deciding a round, spells out this
    /// employee's full name.
    pub fn matches_approver(&self, approver: &str) -> bool {
        approver.trim().eq_ignore_ascii_case(&self.display_name())
    }

    pub fn summary(&self) -> EmployeeSummary {
        EmployeeSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            surname: self.surname.clone(),
            role: self.role.clone(),
        }
    }
}

/// Display fields joined into application listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeSummary {
    pub id: EmployeeId,
    pub name: String,
    pub surname: String,
    pub role: String,
}
