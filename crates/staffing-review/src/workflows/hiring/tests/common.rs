use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::to_bytes;
use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::hiring::domain::{
    ApplicationId, Candidate, EmployeeId, EmployeeProfile, JobApplication, NewApplication,
};
use crate::workflows::hiring::notify::{NotifyError, ReviewNotice, ReviewNotifier};
use crate::workflows::hiring::policy::ReviewPolicy;
use crate::workflows::hiring::repository::{
    ApplicationRecord, ApplicationRepository, DirectoryError, EmployeeDirectory, RepositoryError,
};
use crate::workflows::hiring::scheduler::{
    MeetingHandle, MeetingRequest, MeetingScheduler, SchedulerError,
};
use crate::workflows::hiring::service::ReviewPipelineService;

pub(super) fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn employee(id: &str, name: &str, surname: &str) -> EmployeeProfile {
    EmployeeProfile {
        id: EmployeeId(id.to_string()),
        name: name.to_string(),
        surname: surname.to_string(),
        role: "Engineering Manager".to_string(),
        email: format!("{}@staffing.example", name.to_ascii_lowercase()),
    }
}

pub(super) fn riya() -> EmployeeProfile {
    employee("emp-101", "Riya", "Shah")
}

pub(super) fn marco() -> EmployeeProfile {
    employee("emp-102", "Marco", "Diaz")
}

pub(super) fn lena() -> EmployeeProfile {
    employee("emp-103", "Lena", "Okafor")
}

pub(super) fn recruiter() -> EmployeeProfile {
    EmployeeProfile {
        role: "Recruiter".to_string(),
        ..employee("emp-001", "Hana", "Ito")
    }
}

pub(super) fn roster() -> Vec<EmployeeProfile> {
    vec![riya(), marco(), lena(), recruiter()]
}

pub(super) fn submission() -> NewApplication {
    NewApplication {
        candidate: Candidate {
            name: "A. Patel".to_string(),
            email: "a.patel@candidates.example".to_string(),
        },
        job_role: "Engineer".to_string(),
        position: "Backend Engineer II".to_string(),
        resume_ref: "resumes/a-patel.pdf".to_string(),
        created_by: recruiter().id,
    }
}

pub(super) fn fresh_application() -> JobApplication {
    JobApplication::new(ApplicationId("app-test-1".to_string()), submission(), at(9))
}

type CompetingWrite = Box<dyn FnOnce(&mut JobApplication) + Send>;

#[derive(Default)]
pub(super) struct MemoryRepository {
    records: Mutex<HashMap<ApplicationId, ApplicationRecord>>,
    /// Number of upcoming `update` calls that lose a simulated race.
    contention: AtomicUsize,
    /// Applied to the stored application just before the next `update` compares versions.
    competing_write: Mutex<Option<CompetingWrite>>,
    pub(super) updates: AtomicUsize,
}

impl MemoryRepository {
    pub(super) fn with_contention(conflicts: usize) -> Self {
        Self {
            contention: AtomicUsize::new(conflicts),
            ..Self::default()
        }
    }

    /// Another writer commits `write` between the caller's read and its next `update`.
    pub(super) fn interleave_write(
        &self,
        write: impl FnOnce(&mut JobApplication) + Send + 'static,
    ) {
        *self.competing_write.lock().expect("lock") = Some(Box::new(write));
    }

    pub(super) fn snapshot(&self, id: &ApplicationId) -> Option<ApplicationRecord> {
        self.records.lock().expect("lock").get(id).cloned()
    }
}

impl ApplicationRepository for MemoryRepository {
    fn insert(&self, application: JobApplication) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("lock");
        if guard.contains_key(&application.id) {
            return Err(RepositoryError::Conflict);
        }
        let record = ApplicationRecord {
            application,
            version: 1,
        };
        guard.insert(record.application.id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Ok(self.records.lock().expect("lock").get(id).cloned())
    }

    fn list(&self) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        Ok(self.records.lock().expect("lock").values().cloned().collect())
    }

    fn update(
        &self,
        application: JobApplication,
        expected_version: u64,
    ) -> Result<ApplicationRecord, RepositoryError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        let mut guard = self.records.lock().expect("lock");
        let current = guard
            .get_mut(&application.id)
            .ok_or(RepositoryError::NotFound)?;

        let pending = self.contention.load(Ordering::SeqCst);
        if pending > 0 {
            // Another writer slipped in: bump the stored version without touching the data.
            self.contention.store(pending - 1, Ordering::SeqCst);
            current.version += 1;
        }

        if let Some(write) = self.competing_write.lock().expect("lock").take() {
            write(&mut current.application);
            current.version += 1;
        }

        if current.version != expected_version {
            return Err(RepositoryError::VersionConflict {
                expected: expected_version,
                actual: current.version,
            });
        }

        *current = ApplicationRecord {
            application,
            version: expected_version + 1,
        };
        Ok(current.clone())
    }

    fn delete(&self, id: &ApplicationId) -> Result<(), RepositoryError> {
        self.records
            .lock()
            .expect("lock")
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}

pub(super) struct UnavailableRepository;

impl ApplicationRepository for UnavailableRepository {
    fn insert(&self, _application: JobApplication) -> Result<ApplicationRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(
        &self,
        _application: JobApplication,
        _expected_version: u64,
    ) -> Result<ApplicationRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete(&self, _id: &ApplicationId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default)]
pub(super) struct MemoryNotifier {
    pub(super) notices: Mutex<Vec<ReviewNotice>>,
}

impl ReviewNotifier for MemoryNotifier {
    fn notify(&self, notice: ReviewNotice) -> Result<(), NotifyError> {
        self.notices.lock().expect("lock").push(notice);
        Ok(())
    }
}

pub(super) struct FailingNotifier;

impl ReviewNotifier for FailingNotifier {
    fn notify(&self, _notice: ReviewNotice) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("smtp relay refused".to_string()))
    }
}

pub(super) struct MemoryDirectory {
    employees: Vec<EmployeeProfile>,
}

impl MemoryDirectory {
    pub(super) fn new(employees: Vec<EmployeeProfile>) -> Self {
        Self { employees }
    }
}

impl EmployeeDirectory for MemoryDirectory {
    fn lookup(&self, id: &EmployeeId) -> Result<Option<EmployeeProfile>, DirectoryError> {
        Ok(self.employees.iter().find(|employee| &employee.id == id).cloned())
    }

    fn reviewers(&self) -> Result<Vec<EmployeeProfile>, DirectoryError> {
        Ok(self
            .employees
            .iter()
            .filter(|employee| employee.role != "Recruiter")
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub(super) struct FixedScheduler {
    pub(super) requests: Mutex<Vec<MeetingRequest>>,
}

pub(super) const MEET_LINK: &str = "https://meet.example/abc-defg-hij";

#[async_trait]
impl MeetingScheduler for FixedScheduler {
    async fn create_meeting(
        &self,
        request: &MeetingRequest,
    ) -> Result<MeetingHandle, SchedulerError> {
        self.requests.lock().expect("lock").push(request.clone());
        Ok(MeetingHandle {
            meet_link: MEET_LINK.to_string(),
        })
    }
}

pub(super) struct RejectingScheduler;

#[async_trait]
impl MeetingScheduler for RejectingScheduler {
    async fn create_meeting(
        &self,
        _request: &MeetingRequest,
    ) -> Result<MeetingHandle, SchedulerError> {
        Err(SchedulerError::Rejected("calendar quota exceeded".to_string()))
    }
}

pub(super) struct StalledScheduler;

#[async_trait]
impl MeetingScheduler for StalledScheduler {
    async fn create_meeting(
        &self,
        _request: &MeetingRequest,
    ) -> Result<MeetingHandle, SchedulerError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(MeetingHandle {
            meet_link: MEET_LINK.to_string(),
        })
    }
}

pub(super) fn policy() -> ReviewPolicy {
    ReviewPolicy {
        scheduler_timeout: Duration::from_millis(50),
        ..ReviewPolicy::default()
    }
}

pub(super) type TestService = ReviewPipelineService<MemoryRepository, MemoryNotifier>;

pub(super) fn build_service_with(
    repository: Arc<MemoryRepository>,
    notifier: Arc<MemoryNotifier>,
    scheduler: Arc<dyn MeetingScheduler>,
) -> TestService {
    ReviewPipelineService::new(
        repository,
        notifier,
        Arc::new(MemoryDirectory::new(roster())),
        scheduler,
        policy(),
    )
}

pub(super) fn build_service() -> (TestService, Arc<MemoryRepository>, Arc<MemoryNotifier>) {
    let repository = Arc::new(MemoryRepository::default());
    let notifier = Arc::new(MemoryNotifier::default());
    let service = build_service_with(
        repository.clone(),
        notifier.clone(),
        Arc::new(FixedScheduler::default()),
    );
    (service, repository, notifier)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    serde_json::from_slice(&bytes).expect("json body")
}
