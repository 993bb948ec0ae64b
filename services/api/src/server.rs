use crate::cli::ServeArgs;
use crate::infra::{in_memory_services, AppState, InMemoryNotifications};
use crate::routes::router;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Utc;
use propease::config::AppConfig;
use propease::error::AppError;
use propease::services::Services;
use propease::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

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
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        support_mailto: config.support_mailto(),
    };

    let notifications = Arc::new(InMemoryNotifications::default());
    let services = in_memory_services(&config, notifications);
    tokio::spawn(hourly_sweep(services.clone()));

    let app = router(services)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "propease api ready");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Once an hour: expire active leases whose end date has passed and drop
/// storage grants nobody used in time.
async fn hourly_sweep(services: Services) {
    let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
    loop {
        ticker.tick().await;
        let now = Utc::now();
        match services.leases.expire_lapsed(now.date_naive()) {
            Ok(expired) if !expired.is_empty() => {
                info!(count = expired.len(), "expired lapsed leases");
            }
            Ok(_) => {}
            Err(err) => warn!(error = %err, "lease expiry sweep failed"),
        }
        if let Err(err) = services.uploads.purge_expired(now) {
            warn!(error = %err, "storage grant sweep failed");
        }
    }
}
