use crate::cli::ServeArgs;
use crate::infra::{scoring_client, AppState};
use crate::routes::with_coach_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use credit_coach::config::AppConfig;
use credit_coach::error::AppError;
use credit_coach::simulation::CreditCoach;
use credit_coach::telemetry;
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

    let client = scoring_client(&config.scoring, args.scoring_url.take())?;
    let scoring_url = client.base_url().to_string();
    let coach = Arc::new(CreditCoach::new(client));

    let app = with_coach_routes(coach)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, %scoring_url, "credit coaching service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
