use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequest, Path, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Router,
};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;

use super::domain::{
    ApplicationId, Candidate, DelegateTarget, EmployeeId, NewApplication, RoundOutcome,
};
use super::guard::ValidationError;
use super::notify::ReviewNotifier;
use super::repository::{ApplicationRepository, RepositoryError};
use super::resolution::{FinalDecision, RoundResolution};
use super::scheduler::SchedulerError;
use super::service::{MeetingSchedule, ReviewPipelineService, ReviewServiceError};

type SharedService<R, N> = Arc<ReviewPipelineService<R, N>>;

/// Router builder exposing the review pipeline over HTTP.
pub fn application_router<R, N>(service: SharedService<R, N>) -> Router
where
    R: ApplicationRepository + 'static,
    N: ReviewNotifier + 'static,
{
    Router::new()
        .route(
            "/api/v1/applications",
            get(list_handler::<R, N>).post(create_handler::<R, N>),
        )
        .route(
            "/api/v1/applications/:application_id",
            get(get_handler::<R, N>)
                .put(resolve_handler::<R, N>)
                .delete(delete_handler::<R, N>),
        )
        .route(
            "/api/v1/applications/:application_id/assign",
            put(assign_handler::<R, N>),
        )
        .route(
            "/api/v1/applications/:application_id/reviewers",
            get(reviewers_handler::<R, N>),
        )
        .route(
            "/api/v1/applications/:application_id/meet",
            put(meet_handler::<R, N>),
        )
        .route(
            "/api/v1/applications/:application_id/send",
            put(send_handler::<R, N>),
        )
        .route(
            "/api/v1/applications/:application_id/decision",
            put(decision_handler::<R, N>),
        )
        .with_state(service)
}

/// JSON body extractor that reports unreadable bodies as validation errors.
pub struct ReviewJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ReviewJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(request, state).await {
            Ok(axum::Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(error_response(
                ValidationError::MalformedBody(rejection.body_text()).into(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateApplicationRequest {
    #[serde(default)]
    pub candidate_name: String,
    #[serde(default)]
    pub candidate_email: String,
    #[serde(default)]
    pub job_role: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub resume_ref: String,
    #[serde(default)]
    pub created_by: String,
}

impl From<CreateApplicationRequest> for NewApplication {
    fn from(value: CreateApplicationRequest) -> Self {
        NewApplication {
            candidate: Candidate {
                name: value.candidate_name,
                email: value.candidate_email,
            },
            job_role: value.job_role,
            position: value.position,
            resume_ref: value.resume_ref,
            created_by: EmployeeId(value.created_by),
        }
    }
}

/// Round verdict body. Legacy clients also send `status`; it is derived server-side and ignored.
#[derive(Debug, Deserialize)]
pub struct ResolveRoundRequest {
    pub is_approved: bool,
    #[serde(default)]
    pub round_approver: String,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub current_round: Option<u8>,
}

impl From<ResolveRoundRequest> for RoundResolution {
    fn from(value: ResolveRoundRequest) -> Self {
        RoundResolution {
            outcome: if value.is_approved {
                RoundOutcome::Approved
            } else {
                RoundOutcome::Rejected
            },
            approver: value.round_approver,
            remark: value.remarks,
            expected_round: value.current_round,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    #[serde(default)]
    pub assign_to: String,
}

#[derive(Debug, Deserialize)]
pub struct MeetRequest {
    #[serde(default)]
    pub meet_remarks: Option<String>,
    #[serde(default)]
    pub meet_datetime: Option<String>,
    #[serde(default)]
    pub candidate_email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    #[serde(default)]
    pub send_to: String,
    #[serde(default)]
    pub employee_name: String,
}

#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    #[serde(default)]
    pub decision: String,
}

pub(crate) async fn create_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    ReviewJson(request): ReviewJson<CreateApplicationRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    N: ReviewNotifier + 'static,
{
    match service.create(request.into()) {
        Ok(record) => (StatusCode::CREATED, axum::Json(record.view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_handler<R, N>(State(service): State<SharedService<R, N>>) -> Response
where
    R: ApplicationRepository + 'static,
    N: ReviewNotifier + 'static,
{
    match service.list() {
        Ok(listings) => (StatusCode::OK, axum::Json(listings)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn get_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    Path(application_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    N: ReviewNotifier + 'static,
{
    match service.get(&ApplicationId(application_id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record.view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn resolve_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    Path(application_id): Path<String>,
    ReviewJson(request): ReviewJson<ResolveRoundRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    N: ReviewNotifier + 'static,
{
    match service.resolve(&ApplicationId(application_id), request.into()) {
        Ok(record) => (StatusCode::OK, axum::Json(record.view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn assign_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    Path(application_id): Path<String>,
    ReviewJson(request): ReviewJson<AssignRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    N: ReviewNotifier + 'static,
{
    let reviewer = request.assign_to.trim();
    if reviewer.is_empty() {
        return error_response(ValidationError::MissingField("assign_to").into());
    }

    match service.assign(
        &ApplicationId(application_id),
        &EmployeeId(reviewer.to_string()),
    ) {
        Ok(record) => (StatusCode::OK, axum::Json(record.view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn reviewers_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    Path(application_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    N: ReviewNotifier + 'static,
{
    match service.eligible_reviewers(&ApplicationId(application_id)) {
        Ok(reviewers) => (StatusCode::OK, axum::Json(reviewers)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn meet_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    Path(application_id): Path<String>,
    ReviewJson(request): ReviewJson<MeetRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    N: ReviewNotifier + 'static,
{
    let schedule = MeetingSchedule {
        remarks: request.meet_remarks,
        scheduled_at: request.meet_datetime,
        candidate_email: request.candidate_email,
    };

    match service
        .schedule_meeting(&ApplicationId(application_id), schedule)
        .await
    {
        Ok(record) => (StatusCode::OK, axum::Json(record.view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn send_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    Path(application_id): Path<String>,
    ReviewJson(request): ReviewJson<SendRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    N: ReviewNotifier + 'static,
{
    let target = DelegateTarget {
        name: request.employee_name,
        email: request.send_to,
    };

    match service.set_delegate(&ApplicationId(application_id), target) {
        Ok(record) => (StatusCode::OK, axum::Json(record.view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn decision_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    Path(application_id): Path<String>,
    ReviewJson(request): ReviewJson<DecisionRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    N: ReviewNotifier + 'static,
{
    let decision = match request.decision.parse::<FinalDecision>() {
        Ok(decision) => decision,
        Err(err) => return error_response(err.into()),
    };

    match service.decide(&ApplicationId(application_id), decision) {
        Ok(record) => (StatusCode::OK, axum::Json(record.view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn delete_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    Path(application_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    N: ReviewNotifier + 'static,
{
    let id = ApplicationId(application_id);
    match service.delete(&id) {
        Ok(()) => (StatusCode::OK, axum::Json(json!({ "deleted": id.0 }))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) fn status_for(err: &ReviewServiceError) -> StatusCode {
    match err {
        ReviewServiceError::Validation(_) => StatusCode::BAD_REQUEST,
        ReviewServiceError::NotFound(_)
        | ReviewServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        ReviewServiceError::Workflow(_)
        | ReviewServiceError::Repository(RepositoryError::Conflict)
        | ReviewServiceError::Repository(RepositoryError::VersionConflict { .. }) => {
            StatusCode::CONFLICT
        }
        ReviewServiceError::Scheduler(SchedulerError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
        ReviewServiceError::Scheduler(_) => StatusCode::BAD_GATEWAY,
        ReviewServiceError::Repository(RepositoryError::Unavailable(_))
        | ReviewServiceError::Directory(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: ReviewServiceError) -> Response {
    let status = status_for(&err);
    let payload = json!({
        "error": err.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
