//! Contract for the external meeting scheduler plus an HTTP implementation of it.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::guard::ValidationError;

/// Creates joinable meetings for candidate interviews.
#[async_trait]
pub trait MeetingScheduler: Send + Sync {
    async fn create_meeting(&self, request: &MeetingRequest)
        -> Result<MeetingHandle, SchedulerError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingRequest {
    pub summary: String,
    pub start: DateTime<Utc>,
    pub attendees: Vec<Attendee>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingHandle {
    pub meet_link: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("meeting scheduler did not answer within {0:?}")]
    Timeout(Duration),
    #[error("meeting scheduler transport error: {0}")]
    Transport(String),
    #[error("meeting scheduler rejected the request: {0}")]
    Rejected(String),
    #[error("meeting scheduler returned an unexpected payload: {0}")]
    InvalidResponse(String),
    #[error("meeting scheduler is not configured")]
    Unavailable,
}

/// Accepts RFC 3339 timestamps or a bare `YYYY-MM-DDTHH:MM[:SS]` (taken as UTC), which is what
/// browser datetime inputs submit.
pub fn parse_meeting_time(raw: &str) -> Result<DateTime<Utc>, ValidationError> {
    let trimmed = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ValidationError::InvalidDateTime {
            value: raw.to_string(),
        })
}

/// Posts meeting requests as JSON to a scheduler endpoint.
#[derive(Debug, Clone)]
pub struct HttpMeetingScheduler {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SchedulerResponse {
    #[serde(default)]
    meet_link: Option<String>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

impl HttpMeetingScheduler {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, SchedulerError> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|err| SchedulerError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl MeetingScheduler for HttpMeetingScheduler {
    async fn create_meeting(
        &self,
        request: &MeetingRequest,
    ) -> Result<MeetingHandle, SchedulerError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    SchedulerError::Timeout(self.timeout)
                } else {
                    SchedulerError::Transport(err.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| SchedulerError::Transport(err.to_string()))?;

        let parsed = serde_json::from_str::<SchedulerResponse>(&body);

        if !status.is_success() {
            let message = parsed
                .ok()
                .and_then(|payload| payload.error)
                .map(|error| error_message(&error))
                .unwrap_or_else(|| format!("HTTP {}: {}", status.as_u16(), body.trim()));
            return Err(SchedulerError::Rejected(message));
        }

        let payload =
            parsed.map_err(|err| SchedulerError::InvalidResponse(format!("{err}: {body}")))?;

        if let Some(error) = payload.error {
            return Err(SchedulerError::Rejected(error_message(&error)));
        }

        match payload.meet_link {
            Some(link) if !link.trim().is_empty() => Ok(MeetingHandle { meet_link: link }),
            _ => Err(SchedulerError::InvalidResponse(
                "response is missing meetLink".to_string(),
            )),
        }
    }
}

fn error_message(error: &serde_json::Value) -> String {
    match error {
        serde_json::Value::String(message) => message.clone(),
        serde_json::Value::Object(map) => map
            .get("message")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
        other => other.to_string(),
    }
}

/// Stand-in used when no scheduler endpoint is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredScheduler;

#[async_trait]
impl MeetingScheduler for UnconfiguredScheduler {
    async fn create_meeting(
        &self,
        _request: &MeetingRequest,
    ) -> Result<MeetingHandle, SchedulerError> {
        Err(SchedulerError::Unavailable)
    }
}
