use std::sync::Arc;

use chrono::{TimeZone, Utc};

use super::common::*;

use crate::workflows::hiring::domain::ApplicationStatus;
use crate::workflows::hiring::guard::{ValidationError, WorkflowViolation};
use crate::workflows::hiring::resolution::FinalDecision;
use crate::workflows::hiring::scheduler::SchedulerError;
use crate::workflows::hiring::service::{MeetingSchedule, ReviewServiceError};

fn schedule(at: &str) -> MeetingSchedule {
    MeetingSchedule {
        remarks: Some("Panel interview".to_string()),
        scheduled_at: Some(at.to_string()),
        candidate_email: None,
    }
}

#[tokio::test]
async fn successful_scheduling_stores_the_meeting() {
    let repository = Arc::new(MemoryRepository::default());
    let scheduler = Arc::new(FixedScheduler::default());
    let service = build_service_with(
        repository.clone(),
        Arc::new(MemoryNotifier::default()),
        scheduler.clone(),
    );
    let id = service.create(submission()).expect("create").id().clone();

    let record = service
        .schedule_meeting(&id, schedule("2025-04-02T14:30"))
        .await
        .expect("scheduled");

    let meeting = record.application.meeting.expect("meeting stored");
    assert_eq!(meeting.link, MEET_LINK);
    assert_eq!(meeting.remarks.as_deref(), Some("Panel interview"));
    assert_eq!(
        meeting.scheduled_at,
        Utc.with_ymd_and_hms(2025, 4, 2, 14, 30, 0).unwrap()
    );

    let requests = scheduler.requests.lock().expect("lock");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].summary, "Interview: A. Patel for Backend Engineer II");
    assert_eq!(requests[0].attendees[0].email, "a.patel@candidates.example");
}

#[tokio::test]
async fn explicit_candidate_email_overrides_the_stored_one() {
    let scheduler = Arc::new(FixedScheduler::default());
    let service = build_service_with(
        Arc::new(MemoryRepository::default()),
        Arc::new(MemoryNotifier::default()),
        scheduler.clone(),
    );
    let id = service.create(submission()).expect("create").id().clone();

    service
        .schedule_meeting(
            &id,
            MeetingSchedule {
                candidate_email: Some("patel.personal@mail.example".to_string()),
                ..schedule("2025-04-02T14:30:00Z")
            },
        )
        .await
        .expect("scheduled");

    let requests = scheduler.requests.lock().expect("lock");
    assert_eq!(requests[0].attendees[0].email, "patel.personal@mail.example");
}

#[tokio::test]
async fn scheduler_rejection_leaves_the_application_untouched() {
    let repository = Arc::new(MemoryRepository::default());
    let service = build_service_with(
        repository.clone(),
        Arc::new(MemoryNotifier::default()),
        Arc::new(RejectingScheduler),
    );
    let created = service.create(submission()).expect("create");
    let id = created.id().clone();

    let err = service
        .schedule_meeting(&id, schedule("2025-04-02T14:30"))
        .await
        .expect_err("scheduler failure");
    assert!(matches!(
        err,
        ReviewServiceError::Scheduler(SchedulerError::Rejected(_))
    ));
    assert_eq!(repository.snapshot(&id), Some(created));
}

#[tokio::test]
async fn scheduler_timeout_leaves_the_application_untouched() {
    let repository = Arc::new(MemoryRepository::default());
    let service = build_service_with(
        repository.clone(),
        Arc::new(MemoryNotifier::default()),
        Arc::new(StalledScheduler),
    );
    let created = service.create(submission()).expect("create");
    let id = created.id().clone();

    let err = service
        .schedule_meeting(&id, schedule("2025-04-02T14:30"))
        .await
        .expect_err("timeout");
    assert!(matches!(
        err,
        ReviewServiceError::Scheduler(SchedulerError::Timeout(timeout))
            if timeout == service.policy().scheduler_timeout
    ));
    assert_eq!(repository.snapshot(&id), Some(created));
}

#[tokio::test]
async fn meeting_time_is_required_and_parsed() {
    let (service, _repository, _notifier) = build_service();
    let id = service.create(submission()).expect("create").id().clone();

    let missing = service
        .schedule_meeting(&id, MeetingSchedule::default())
        .await
        .expect_err("missing time");
    assert!(matches!(
        missing,
        ReviewServiceError::Validation(ValidationError::MissingField("meet_datetime"))
    ));

    let garbled = service
        .schedule_meeting(&id, schedule("tomorrow at noon"))
        .await
        .expect_err("bad time");
    assert!(matches!(
        garbled,
        ReviewServiceError::Validation(ValidationError::InvalidDateTime { .. })
    ));
}

#[tokio::test]
async fn closed_applications_cannot_book_meetings() {
    let scheduler = Arc::new(FixedScheduler::default());
    let service = build_service_with(
        Arc::new(MemoryRepository::default()),
        Arc::new(MemoryNotifier::default()),
        scheduler.clone(),
    );
    let id = service.create(submission()).expect("create").id().clone();
    let rejected = service.decide(&id, FinalDecision::Reject).expect("reject");
    assert_eq!(rejected.application.status, ApplicationStatus::Rejected);

    let err = service
        .schedule_meeting(&id, schedule("2025-04-02T14:30"))
        .await
        .expect_err("closed");
    assert!(matches!(
        err,
        ReviewServiceError::Workflow(WorkflowViolation::ApplicationClosed { .. })
    ));
    assert!(scheduler.requests.lock().expect("lock").is_empty());
}
