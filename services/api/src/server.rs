use crate::cli::ServeArgs;
use crate::demo::{upcoming_sunday, DemoContext};
use crate::infra::AppState;
use crate::routes::with_assignment_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Local;
use duty_rota::config::AppConfig;
use duty_rota::error::AppError;
use duty_rota::telemetry;
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

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let anchor = upcoming_sunday(Local::now().date_naive());
    let context = DemoContext::seed(anchor, None, config.assignment.clone())?;
    info!(
        organization = %context.organization,
        event_type = %context.event_type,
        "seeded demo organization"
    );

    let app = with_assignment_routes(Arc::new(context.service))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "duty rota service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
