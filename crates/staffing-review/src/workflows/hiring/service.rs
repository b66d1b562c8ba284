use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::assignment::{self, AssignmentChange};
use super::domain::{
    ApplicationId, Candidate, DelegateTarget, EmployeeId, EmployeeProfile, EmployeeSummary,
    JobApplication, MeetingDetails, NewApplication,
};
use super::guard::{self, ensure_open, ValidationError, WorkflowViolation};
use super::notify::{NoticeRecipient, ReviewNotice, ReviewNotifier};
use super::policy::ReviewPolicy;
use super::repository::{
    ApplicationListing, ApplicationRecord, ApplicationRepository, DirectoryError,
    EmployeeDirectory, RepositoryError,
};
use super::resolution::{self, FinalDecision, ResolutionError, RoundResolution};
use super::scheduler::{
    parse_meeting_time, Attendee, MeetingRequest, MeetingScheduler, SchedulerError,
};

/// Service composing the repository, employee directory, and external adapters into the
/// multi-round review workflow.
pub struct ReviewPipelineService<R, N> {
    repository: Arc<R>,
    notifier: Arc<N>,
    directory: Arc<dyn EmployeeDirectory>,
    scheduler: Arc<dyn MeetingScheduler>,
    policy: ReviewPolicy,
}

/// Caller input for scheduling an interview.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeetingSchedule {
    pub remarks: Option<String>,
    pub scheduled_at: Option<String>,
    pub candidate_email: Option<String>,
}

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("app-{id:06}"))
}

impl<R, N> ReviewPipelineService<R, N>
where
    R: ApplicationRepository + 'static,
    N: ReviewNotifier + 'static,
{
    pub fn new(
        repository: Arc<R>,
        notifier: Arc<N>,
        directory: Arc<dyn EmployeeDirectory>,
        scheduler: Arc<dyn MeetingScheduler>,
        policy: ReviewPolicy,
    ) -> Self {
        Self {
            repository,
            notifier,
            directory,
            scheduler,
            policy,
        }
    }

    pub fn policy(&self) -> &ReviewPolicy {
        &self.policy
    }

    /// Record a new candidate submission as a pending, unassigned round-1 application.
    pub fn create(
        &self,
        submission: NewApplication,
    ) -> Result<ApplicationRecord, ReviewServiceError> {
        let submission = validate_submission(submission)?;
        let application = JobApplication::new(next_application_id(), submission, Utc::now());

        let stored = self.repository.insert(application)?;
        info!(
            application_id = %stored.id(),
            job_role = %stored.application.job_role,
            "application created"
        );
        Ok(stored)
    }

    pub fn get(&self, id: &ApplicationId) -> Result<ApplicationRecord, ReviewServiceError> {
        self.repository
            .fetch(id)?
            .ok_or_else(|| ReviewServiceError::NotFound(id.clone()))
    }

    /// Newest applications first, with reviewer and creator display fields joined in.
    pub fn list(&self) -> Result<Vec<ApplicationListing>, ReviewServiceError> {
        let mut records = self.repository.list()?;
        records.sort_by(|left, right| {
            right
                .application
                .created_at
                .cmp(&left.application.created_at)
                .then_with(|| right.application.id.cmp(&left.application.id))
        });

        Ok(records
            .into_iter()
            .map(|record| {
                let reviewer = record
                    .application
                    .assigned_reviewer
                    .as_ref()
                    .and_then(|id| self.employee_summary(id));
                let creator = self.employee_summary(&record.application.created_by);
                ApplicationListing {
                    application: record.view(),
                    reviewer,
                    creator,
                }
            })
            .collect())
    }

    pub fn delete(&self, id: &ApplicationId) -> Result<(), ReviewServiceError> {
        match self.repository.delete(id) {
            Ok(()) => {
                info!(application_id = %id, "application deleted");
                Ok(())
            }
            Err(RepositoryError::NotFound) => Err(ReviewServiceError::NotFound(id.clone())),
            Err(err) => Err(err.into()),
        }
    }

    /// Assign or reassign the application and tell the new reviewer about it.
    pub fn assign(
        &self,
        id: &ApplicationId,
        reviewer_id: &EmployeeId,
    ) -> Result<ApplicationRecord, ReviewServiceError> {
        let reviewer = self
            .directory
            .lookup(reviewer_id)?
            .ok_or_else(|| ValidationError::UnknownReviewer(reviewer_id.clone()))?;

        let (record, change) = self.mutate(id, |application, now| {
            assignment::assign(application, &reviewer, &self.policy, now)
        })?;

        let AssignmentChange {
            previous_reviewer,
            round,
            round_advanced,
        } = change;
        info!(
            application_id = %id,
            reviewer = %reviewer.id,
            previous = ?previous_reviewer,
            round,
            round_advanced,
            "application assigned"
        );

        self.send_notice(ReviewNotice {
            recipient: NoticeRecipient::Reviewer(reviewer),
            application_id: id.clone(),
            summary: record.application.summary(),
        });

        Ok(record)
    }

    /// Reviewers the application may be handed to next.
    pub fn eligible_reviewers(
        &self,
        id: &ApplicationId,
    ) -> Result<Vec<EmployeeProfile>, ReviewServiceError> {
        let record = self.get(id)?;
        let roster = self.directory.reviewers()?;
        Ok(assignment::eligible_reviewers(&record.application, roster))
    }

    /// Apply a reviewer's verdict to the active round.
    pub fn resolve(
        &self,
        id: &ApplicationId,
        verdict: RoundResolution,
    ) -> Result<ApplicationRecord, ReviewServiceError> {
        let (record, decision) = self.mutate(id, |application, now| {
            resolution::resolve(application, &verdict, now)
        })?;

        info!(
            application_id = %id,
            round = decision.round,
            approver = %decision.approver,
            outcome = decision.outcome.verb(),
            status = record.application.status.label(),
            "round resolved"
        );
        Ok(record)
    }

    /// Close the application as hired or rejected.
    pub fn decide(
        &self,
        id: &ApplicationId,
        decision: FinalDecision,
    ) -> Result<ApplicationRecord, ReviewServiceError> {
        let (record, ()) = self.mutate(id, |application, now| {
            resolution::decide(application, decision, now)
        })?;

        info!(
            application_id = %id,
            decision = decision.label(),
            status = record.application.status.label(),
            "final decision recorded"
        );
        Ok(record)
    }

    /// Book an interview through the external scheduler and store the meeting on success.
    ///
    /// The scheduler call happens outside the write path; if it fails or times out the
    /// application is left untouched.
    pub async fn schedule_meeting(
        &self,
        id: &ApplicationId,
        request: MeetingSchedule,
    ) -> Result<ApplicationRecord, ReviewServiceError> {
        let raw_start = guard::non_blank(request.scheduled_at.as_deref())
            .ok_or(ValidationError::MissingField("meet_datetime"))?;
        let start = parse_meeting_time(raw_start)?;
        let attendee = guard::non_blank(request.candidate_email.as_deref())
            .map(|email| guard::email("candidate_email", email))
            .transpose()?;
        let remarks = guard::non_blank(request.remarks.as_deref()).map(str::to_string);

        let current = self.get(id)?;
        ensure_open(&current.application)?;

        let meeting_request = MeetingRequest {
            summary: format!(
                "Interview: {} for {}",
                current.application.candidate.name, current.application.position
            ),
            start,
            attendees: vec![Attendee {
                email: attendee.unwrap_or_else(|| current.application.candidate.email.clone()),
            }],
        };

        let timeout = self.policy.scheduler_timeout;
        let handle =
            match tokio::time::timeout(timeout, self.scheduler.create_meeting(&meeting_request))
                .await
            {
                Ok(Ok(handle)) => handle,
                Ok(Err(err)) => {
                    warn!(application_id = %id, error = %err, "meeting scheduling failed");
                    return Err(err.into());
                }
                Err(_) => {
                    warn!(application_id = %id, ?timeout, "meeting scheduler timed out");
                    return Err(SchedulerError::Timeout(timeout).into());
                }
            };

        let (record, ()) = self.mutate(id, |application, now| {
            ensure_open(application)?;
            application.meeting = Some(MeetingDetails {
                remarks: remarks.clone(),
                link: handle.meet_link.clone(),
                scheduled_at: start,
            });
            application.updated_at = now;
            Ok::<_, WorkflowViolation>(())
        })?;

        info!(application_id = %id, scheduled_at = %start, "meeting scheduled");
        Ok(record)
    }

    /// Forward the application to an informational CC recipient.
    pub fn set_delegate(
        &self,
        id: &ApplicationId,
        target: DelegateTarget,
    ) -> Result<ApplicationRecord, ReviewServiceError> {
        let target = DelegateTarget {
            name: guard::required("employee_name", &target.name)?.to_string(),
            email: guard::email("send_to", &target.email)?,
        };

        let (record, ()) = self.mutate(id, |application, now| {
            application.delegate = Some(target.clone());
            application.updated_at = now;
            Ok::<_, WorkflowViolation>(())
        })?;

        info!(application_id = %id, delegate = %target.email, "delegate set");
        self.send_notice(ReviewNotice {
            recipient: NoticeRecipient::Delegate(target),
            application_id: id.clone(),
            summary: record.application.summary(),
        });

        Ok(record)
    }
}

impl<R, N> ReviewPipelineService<R, N>
where
    R: ApplicationRepository + 'static,
    N: ReviewNotifier + 'static,
{
    /// Read-modify-write against a single application with a version check on the write.
    ///
    /// A lost race re-reads the record and re-applies `apply`, so every precondition is
    /// checked against the state that is actually written over.
    fn mutate<T, E, F>(
        &self,
        id: &ApplicationId,
        mut apply: F,
    ) -> Result<(ApplicationRecord, T), ReviewServiceError>
    where
        F: FnMut(&mut JobApplication, DateTime<Utc>) -> Result<T, E>,
        E: Into<ReviewServiceError>,
    {
        let attempts = self.policy.write_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let ApplicationRecord {
                mut application,
                version,
            } = self.get(id)?;

            let outcome = apply(&mut application, Utc::now()).map_err(Into::into)?;

            match self.repository.update(application, version) {
                Ok(stored) => return Ok((stored, outcome)),
                Err(RepositoryError::VersionConflict { expected, actual }) if attempt < attempts => {
                    warn!(
                        application_id = %id,
                        expected,
                        actual,
                        attempt,
                        "application changed concurrently, retrying"
                    );
                }
                Err(RepositoryError::NotFound) => {
                    return Err(ReviewServiceError::NotFound(id.clone()))
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    fn send_notice(&self, notice: ReviewNotice) {
        let application_id = notice.application_id.clone();
        let recipient = notice.recipient.email().to_string();
        if let Err(err) = self.notifier.notify(notice) {
            warn!(
                application_id = %application_id,
                recipient = %recipient,
                error = %err,
                "notification failed; continuing"
            );
        }
    }

    fn employee_summary(&self, id: &EmployeeId) -> Option<EmployeeSummary> {
        match self.directory.lookup(id) {
            Ok(profile) => profile.map(|profile| profile.summary()),
            Err(err) => {
                warn!(employee_id = %id, error = %err, "employee lookup failed");
                None
            }
        }
    }
}

fn validate_submission(submission: NewApplication) -> Result<NewApplication, ValidationError> {
    let NewApplication {
        candidate,
        job_role,
        position,
        resume_ref,
        created_by,
    } = submission;

    let name = guard::required("candidate.name", &candidate.name)?.to_string();
    let email = guard::email("candidate.email", &candidate.email)?;
    let job_role = guard::required("job_role", &job_role)?.to_string();
    let position = guard::required("position", &position)?.to_string();
    let created_by = EmployeeId(guard::required("created_by", &created_by.0)?.to_string());

    Ok(NewApplication {
        candidate: Candidate { name, email },
        job_role,
        position,
        resume_ref: resume_ref.trim().to_string(),
        created_by,
    })
}

/// Error raised by the review pipeline service.
#[derive(Debug, thiserror::Error)]
pub enum ReviewServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Workflow(#[from] WorkflowViolation),
    #[error("application {0} not found")]
    NotFound(ApplicationId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

impl From<ResolutionError> for ReviewServiceError {
    fn from(value: ResolutionError) -> Self {
        match value {
            ResolutionError::Validation(err) => Self::Validation(err),
            ResolutionError::Workflow(err) => Self::Workflow(err),
        }
    }
}
