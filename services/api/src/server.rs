use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryApplicationRepository, InMemoryEmployeeDirectory, TracingNotifier,
};
use crate::routes::with_application_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use staffing_review::config::AppConfig;
use staffing_review::error::AppError;
use staffing_review::telemetry;
use staffing_review::workflows::hiring::{
    HttpMeetingScheduler, MeetingScheduler, ReviewPipelineService, UnconfiguredScheduler,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry, config.environment)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let directory = match &config.directory.roster_path {
        Some(path) => InMemoryEmployeeDirectory::from_path(path)?,
        None => InMemoryEmployeeDirectory::default(),
    };
    info!(employees = directory.len(), "employee directory loaded");

    let scheduler: Arc<dyn MeetingScheduler> = match &config.scheduler.endpoint {
        Some(endpoint) => {
            let http = HttpMeetingScheduler::new(endpoint.clone(), config.scheduler.timeout)
                .map_err(|err| AppError::Review(err.into()))?;
            info!(endpoint = http.endpoint(), "meeting scheduler configured");
            Arc::new(http)
        }
        None => {
            warn!("APP_SCHEDULER_URL not set; meeting scheduling is disabled");
            Arc::new(UnconfiguredScheduler)
        }
    };

    let policy = config.review_policy();
    info!(
        max_rounds = policy.max_rounds,
        write_attempts = policy.write_attempts,
        scheduler_timeout = ?policy.scheduler_timeout,
        "review policy configured"
    );

    let review_service = Arc::new(ReviewPipelineService::new(
        Arc::new(InMemoryApplicationRepository::default()),
        Arc::new(TracingNotifier::default()),
        Arc::new(directory),
        scheduler,
        policy,
    ));

    let app = with_application_routes(review_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "staffing review pipeline ready");

    axum::serve(listener, app).await?;
    Ok(())
}
