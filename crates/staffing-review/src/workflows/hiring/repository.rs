use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    ApplicationId, Candidate, DelegateTarget, EmployeeId, EmployeeProfile, EmployeeSummary,
    JobApplication, MeetingDetails, RoundDecision,
};
use super::ledger::TrailEntry;

/// Stored application plus the optimistic-concurrency version it was read at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub application: JobApplication,
    pub version: u64,
}

impl ApplicationRecord {
    pub fn id(&self) -> &ApplicationId {
        &self.application.id
    }

    pub fn view(&self) -> ApplicationView {
        let application = &self.application;
        ApplicationView {
            id: application.id.clone(),
            candidate: application.candidate.clone(),
            job_role: application.job_role.clone(),
            position: application.position.clone(),
            resume_ref: application.resume_ref.clone(),
            status: application.status.label(),
            approval_state: application.approval_state.label(),
            current_round: application.current_round,
            round_decisions: application.rounds.iter().cloned().collect(),
            round_approvers: application.rounds.approvers_by_round(),
            assigned_reviewer: application.assigned_reviewer.clone(),
            delegate: application.delegate.clone(),
            history: application.history.entries().to_vec(),
            remarks: application.remarks.entries().to_vec(),
            remarks_text: application.remarks.render(REMARK_DELIMITER),
            meeting: application.meeting.clone(),
            created_by: application.created_by.clone(),
            created_at: application.created_at,
            updated_at: application.updated_at,
            version: self.version,
        }
    }
}

const REMARK_DELIMITER: &str = "\n";

/// Storage abstraction so the service module can be exercised in isolation.
///
/// `update` is a compare-and-swap: it only succeeds when the stored version equals
/// `expected_version`, and it returns the record with its version bumped.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, application: JobApplication) -> Result<ApplicationRecord, RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError>;
    fn list(&self) -> Result<Vec<ApplicationRecord>, RepositoryError>;
    fn update(
        &self,
        application: JobApplication,
        expected_version: u64,
    ) -> Result<ApplicationRecord, RepositoryError>;
    fn delete(&self, id: &ApplicationId) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("record changed concurrently (expected version {expected}, found {actual})")]
    VersionConflict { expected: u64, actual: u64 },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Read access to the employee directory, which is owned by another system.
pub trait EmployeeDirectory: Send + Sync {
    fn lookup(&self, id: &EmployeeId) -> Result<Option<EmployeeProfile>, DirectoryError>;
    fn reviewers(&self) -> Result<Vec<EmployeeProfile>, DirectoryError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    #[error("employee directory unavailable: {0}")]
    Unavailable(String),
}

/// Serialized shape of an application returned over HTTP.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationView {
    pub id: ApplicationId,
    pub candidate: Candidate,
    pub job_role: String,
    pub position: String,
    pub resume_ref: String,
    pub status: &'static str,
    pub approval_state: &'static str,
    pub current_round: u8,
    pub round_decisions: Vec<RoundDecision>,
    pub round_approvers: BTreeMap<u8, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_reviewer: Option<EmployeeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delegate: Option<DelegateTarget>,
    pub history: Vec<TrailEntry>,
    pub remarks: Vec<TrailEntry>,
    pub remarks_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting: Option<MeetingDetails>,
    pub created_by: EmployeeId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: u64,
}

/// List entry with reviewer and creator display fields joined from the directory.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationListing {
    #[serde(flatten)]
    pub application: ApplicationView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewer: Option<EmployeeSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<EmployeeSummary>,
}
