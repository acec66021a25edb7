use crate::cli::ServeArgs;
use crate::infra::{config_with_database, AppState};
use crate::routes::with_map_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use neighbourhood_map::boundary::BoundaryState;
use neighbourhood_map::error::AppError;
use neighbourhood_map::payload::MapService;
use neighbourhood_map::store::SqliteRegionStore;
use neighbourhood_map::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = config_with_database(args.database.take())?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(boundaries) = args.boundaries.take() {
        config.data.boundary_path = boundaries;
    }

    telemetry::init(&config.telemetry)?;

    let boundaries = BoundaryState::default().load(&config.data.boundary_path);
    let boundaries_ready = boundaries.is_ready();
    if !boundaries_ready {
        warn!(
            path = %config.data.boundary_path.display(),
            "boundary data unavailable; map requests will fail until restart"
        );
    }

    let store = Arc::new(SqliteRegionStore::new(&config.data.database_path));
    let service = Arc::new(MapService::new(store, boundaries));

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let app = with_map_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(boundaries_ready, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        database = %config.data.database_path.display(),
        "neighbourhood map service listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
