use async_trait::async_trait;
use metrics_exporter_prometheus::PrometheusHandle;
use staffing_review::error::AppError;
use staffing_review::workflows::hiring::{
    ApplicationId, ApplicationRecord, ApplicationRepository, DirectoryError, EmployeeDirectory,
    EmployeeId, EmployeeProfile, JobApplication, MeetingHandle, MeetingRequest, MeetingScheduler,
    NotifyError, RepositoryError, ReviewNotice, ReviewNotifier, SchedulerError,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local store with version checks on every write.
#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicationRepository {
    records: Arc<Mutex<HashMap<ApplicationId, ApplicationRecord>>>,
}

impl ApplicationRepository for InMemoryApplicationRepository {
    fn insert(&self, application: JobApplication) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
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
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list(&self) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.values().cloned().collect())
    }

    fn update(
        &self,
        application: JobApplication,
        expected_version: u64,
    ) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let current = guard
            .get_mut(&application.id)
            .ok_or(RepositoryError::NotFound)?;
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
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }
}

/// Read-only roster standing in for the HR employee directory.
#[derive(Debug, Clone)]
pub(crate) struct InMemoryEmployeeDirectory {
    employees: Arc<Vec<EmployeeProfile>>,
}

impl InMemoryEmployeeDirectory {
    pub(crate) fn new(employees: Vec<EmployeeProfile>) -> Self {
        Self {
            employees: Arc::new(employees),
        }
    }

    /// Loads a JSON array of employee profiles.
    pub(crate) fn from_path(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub(crate) fn from_json(raw: &str) -> Result<Self, AppError> {
        let employees: Vec<EmployeeProfile> = serde_json::from_str(raw)?;
        Ok(Self::new(employees))
    }

    pub(crate) fn len(&self) -> usize {
        self.employees.len()
    }
}

impl Default for InMemoryEmployeeDirectory {
    fn default() -> Self {
        Self::new(default_roster())
    }
}

impl EmployeeDirectory for InMemoryEmployeeDirectory {
    fn lookup(&self, id: &EmployeeId) -> Result<Option<EmployeeProfile>, DirectoryError> {
        Ok(self
            .employees
            .iter()
            .find(|employee| &employee.id == id)
            .cloned())
    }

    fn reviewers(&self) -> Result<Vec<EmployeeProfile>, DirectoryError> {
        Ok(self
            .employees
            .iter()
            .filter(|employee| !employee.role.eq_ignore_ascii_case("recruiter"))
            .cloned()
            .collect())
    }
}

fn profile(id: &str, name: &str, surname: &str, role: &str) -> EmployeeProfile {
    EmployeeProfile {
        id: EmployeeId(id.to_string()),
        name: name.to_string(),
        surname: surname.to_string(),
        role: role.to_string(),
        email: format!(
            "{}.{}@staffing.example",
            name.to_ascii_lowercase(),
            surname.to_ascii_lowercase()
        ),
    }
}

pub(crate) fn default_roster() -> Vec<EmployeeProfile> {
    vec![
        profile("emp-001", "Hana", "Ito", "Recruiter"),
        profile("emp-101", "Riya", "Shah", "Engineering Manager"),
        profile("emp-102", "Marco", "Diaz", "Staff Engineer"),
        profile("emp-103", "Lena", "Okafor", "Principal Engineer"),
        profile("emp-104", "Tomas", "Berg", "Director of Engineering"),
    ]
}

/// Writes notices to the log; a mail relay would replace this in production.
#[derive(Default, Clone)]
pub(crate) struct TracingNotifier {
    sent: Arc<Mutex<Vec<ReviewNotice>>>,
}

impl ReviewNotifier for TracingNotifier {
    fn notify(&self, notice: ReviewNotice) -> Result<(), NotifyError> {
        info!(
            recipient = %notice.recipient.email(),
            application_id = %notice.application_id,
            summary = %notice.summary,
            "review notice sent"
        );
        self.sent
            .lock()
            .expect("notifier mutex poisoned")
            .push(notice);
        Ok(())
    }
}

impl TracingNotifier {
    pub(crate) fn sent(&self) -> Vec<ReviewNotice> {
        self.sent.lock().expect("notifier mutex poisoned").clone()
    }
}

/// Offline scheduler for the demo; links are derived from the start time.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct DemoMeetingScheduler;

#[async_trait]
impl MeetingScheduler for DemoMeetingScheduler {
    async fn create_meeting(
        &self,
        request: &MeetingRequest,
    ) -> Result<MeetingHandle, SchedulerError> {
        Ok(MeetingHandle {
            meet_link: format!(
                "https://meet.staffing.example/{}",
                request.start.format("%Y%m%d-%H%M")
            ),
        })
    }
}
