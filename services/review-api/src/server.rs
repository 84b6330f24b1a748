use crate::cli::ServeArgs;
use crate::infra::{read_workbook, AppState};
use crate::routes::with_review_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use holiday_review::config::AppConfig;
use holiday_review::error::AppError;
use holiday_review::telemetry;
use holiday_review::workflows::holidays::{ComputeForm, HttpSolver, ReviewService};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

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

    let solver = Arc::new(HttpSolver::new(&config.solver)?);
    let review_service = Arc::new(ReviewService::new(
        solver,
        ComputeForm::from_defaults(&config.defaults),
    ));

    if let Some(path) = args.input.take() {
        let (name, bytes) = read_workbook(&path)?;
        review_service.select_input(&name, bytes)?;
    }

    let app = with_review_routes(review_service, config.server.max_upload_bytes)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        solver = %config.solver.base_url,
        "holiday review service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
