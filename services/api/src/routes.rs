use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use staffing_review::workflows::hiring::{
    application_router, ApplicationRepository, ReviewNotifier, ReviewPipelineService,
};

pub(crate) fn with_application_routes<R, N>(
    service: Arc<ReviewPipelineService<R, N>>,
) -> axum::Router
where
    R: ApplicationRepository + 'static,
    N: ReviewNotifier + 'static,
{
    application_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{
        DemoMeetingScheduler, InMemoryApplicationRepository, InMemoryEmployeeDirectory,
        TracingNotifier,
    };
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use staffing_review::workflows::hiring::ReviewPolicy;
    use tower::ServiceExt;

    fn router() -> axum::Router {
        let service = Arc::new(ReviewPipelineService::new(
            Arc::new(InMemoryApplicationRepository::default()),
            Arc::new(TracingNotifier::default()),
            Arc::new(InMemoryEmployeeDirectory::default()),
            Arc::new(DemoMeetingScheduler),
            ReviewPolicy::default(),
        ));
        with_application_routes(service)
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let response = router()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn application_routes_are_mounted() {
        let response = router()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/applications")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        assert_eq!(&bytes[..], b"[]");
    }
}
