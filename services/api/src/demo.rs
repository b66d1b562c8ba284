use crate::infra::{
    default_roster, DemoMeetingScheduler, InMemoryApplicationRepository, InMemoryEmployeeDirectory,
    TracingNotifier,
};
use chrono::{Duration, Timelike, Utc};
use clap::Args;
use std::sync::Arc;
use staffing_review::error::AppError;
use staffing_review::workflows::hiring::{
    ApplicationId, ApplicationRecord, Candidate, EmployeeId, EmployeeProfile, FinalDecision,
    MeetingSchedule, NewApplication, ReviewPipelineService, ReviewPolicy, RoundOutcome,
    RoundResolution,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Candidate name used for the walkthrough.
    #[arg(long)]
    pub(crate) candidate: Option<String>,
    /// Round ceiling for the demo pipeline (defaults to 5).
    #[arg(long)]
    pub(crate) max_rounds: Option<u8>,
    /// Skip booking an interview for the hired candidate.
    #[arg(long)]
    pub(crate) skip_meeting: bool,
}

type DemoService = ReviewPipelineService<InMemoryApplicationRepository, TracingNotifier>;

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        candidate,
        max_rounds,
        skip_meeting,
    } = args;

    let mut policy = ReviewPolicy::default();
    if let Some(rounds) = max_rounds {
        policy.max_rounds = rounds.max(2);
    }

    let notifier = Arc::new(TracingNotifier::default());
    let service = DemoService::new(
        Arc::new(InMemoryApplicationRepository::default()),
        notifier.clone(),
        Arc::new(InMemoryEmployeeDirectory::default()),
        Arc::new(DemoMeetingScheduler),
        policy,
    );
    let roster = default_roster();
    let (riya, marco, lena) = (&roster[1], &roster[2], &roster[3]);
    let candidate = candidate.unwrap_or_else(|| "A. Patel".to_string());

    println!("Candidate review pipeline demo");
    println!("Max rounds: {}", service.policy().max_rounds);

    println!("\n-- Rejected after two rounds --");
    let created = service.create(submission(&candidate))?;
    let id = created.id().clone();
    render_step("created", &created);

    render_step("assigned", &service.assign(&id, &riya.id)?);
    render_step(
        "round resolved",
        &service.resolve(&id, approve(riya, "Solid fundamentals"))?,
    );
    render_step("reassigned", &service.assign(&id, &marco.id)?);
    render_pool(&service, &id)?;
    render_step(
        "round resolved",
        &service.resolve(
            &id,
            RoundResolution {
                outcome: RoundOutcome::Rejected,
                approver: marco.display_name(),
                remark: Some("Not ready for on-call ownership".to_string()),
                expected_round: Some(2),
            },
        )?,
    );
    match service.assign(&id, &lena.id) {
        Ok(_) => println!("  unexpected: closed application accepted a reviewer"),
        Err(err) => println!("  follow-up assignment refused: {err}"),
    }
    render_trail(&service.get(&id)?);

    println!("\n-- Hired after one round --");
    let created = service.create(submission(&format!("{candidate} (referral)")))?;
    let id = created.id().clone();
    service.assign(&id, &lena.id)?;
    service.resolve(&id, approve(lena, "Exceptional systems design"))?;
    if !skip_meeting {
        let start = (Utc::now() + Duration::days(2))
            .with_minute(0)
            .and_then(|time| time.with_second(0))
            .unwrap_or_else(Utc::now);
        let record = service
            .schedule_meeting(
                &id,
                MeetingSchedule {
                    remarks: Some("Offer conversation".to_string()),
                    scheduled_at: Some(start.to_rfc3339()),
                    candidate_email: None,
                },
            )
            .await?;
        if let Some(meeting) = &record.application.meeting {
            println!("  meeting booked for {} at {}", meeting.scheduled_at, meeting.link);
        }
    }
    let hired = service.decide(&id, FinalDecision::Select)?;
    render_step("final decision", &hired);
    render_trail(&hired);

    let sent = notifier.sent();
    println!("\nNotifications sent: {}", sent.len());
    for notice in sent {
        println!("  - {} :: {}", notice.recipient.email(), notice.summary);
    }

    Ok(())
}

fn submission(candidate: &str) -> NewApplication {
    let slug: String = candidate
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    NewApplication {
        candidate: Candidate {
            name: candidate.to_string(),
            email: format!("{slug}@candidates.example"),
        },
        job_role: "Engineer".to_string(),
        position: "Backend Engineer II".to_string(),
        resume_ref: format!("resumes/{slug}.pdf"),
        created_by: EmployeeId("emp-001".to_string()),
    }
}

fn approve(reviewer: &EmployeeProfile, remark: &str) -> RoundResolution {
    RoundResolution {
        outcome: RoundOutcome::Approved,
        approver: reviewer.display_name(),
        remark: Some(remark.to_string()),
        expected_round: None,
    }
}

fn render_step(label: &str, record: &ApplicationRecord) {
    let application = &record.application;
    println!(
        "  {label:<15} status={:<11} approval={:<10} round={} reviewer={}",
        application.status.label(),
        application.approval_state.label(),
        application.current_round,
        application
            .assigned_reviewer
            .as_ref()
            .map(|id| id.0.as_str())
            .unwrap_or("-"),
    );
}

fn render_pool(service: &DemoService, id: &ApplicationId) -> Result<(), AppError> {
    let pool = service.eligible_reviewers(id)?;
    let names: Vec<String> = pool.iter().map(EmployeeProfile::display_name).collect();
    println!("  eligible next reviewers: {}", names.join(", "));
    Ok(())
}

fn render_trail(record: &ApplicationRecord) {
    let application = &record.application;
    println!("  history:");
    for entry in application.history.entries() {
        println!(
            "    {} {}",
            entry.recorded_at.format("%Y-%m-%d %H:%M"),
            entry.text
        );
    }
    for (round, approver) in application.rounds.approvers_by_round() {
        println!("    round {round} decided by {approver}");
    }
    if !application.remarks.is_empty() {
        println!("  remarks:");
        for line in application.remarks.render("\n").lines() {
            println!("    {line}");
        }
    }
}
