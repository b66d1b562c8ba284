//! Multi-round candidate review and approval pipeline.
//!
//! An application is created pending, handed to reviewers round by round, and closed by a
//! final hire/reject decision. Every mutation goes through [`ReviewPipelineService`], which
//! applies the pure transitions in [`assignment`] and [`resolution`] under a version check.

pub mod assignment;
pub mod domain;
pub(crate) mod guard;
pub mod ledger;
pub mod notify;
pub mod policy;
pub mod repository;
pub mod resolution;
pub mod router;
pub mod scheduler;
pub mod service;

#[cfg(test)]
mod tests;

pub use assignment::{eligible_reviewers, AssignmentChange};
pub use domain::{
    ApplicationId, ApplicationStatus, ApprovalState, Candidate, DelegateTarget, EmployeeId,
    EmployeeProfile, EmployeeSummary, JobApplication, MeetingDetails, NewApplication,
    RoundDecision, RoundOutcome,
};
pub use guard::{ValidationError, WorkflowViolation};
pub use ledger::{LedgerError, RoundLedger, Trail, TrailEntry};
pub use notify::{NoticeRecipient, NotifyError, ReviewNotice, ReviewNotifier};
pub use policy::ReviewPolicy;
pub use repository::{
    ApplicationListing, ApplicationRecord, ApplicationRepository, ApplicationView,
    DirectoryError, EmployeeDirectory, RepositoryError,
};
pub use resolution::{FinalDecision, RoundResolution};
pub use router::application_router;
pub use scheduler::{
    Attendee, HttpMeetingScheduler, MeetingHandle, MeetingRequest, MeetingScheduler,
    SchedulerError, UnconfiguredScheduler,
};
pub use service::{MeetingSchedule, ReviewPipelineService, ReviewServiceError};
