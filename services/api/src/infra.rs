use metrics_exporter_prometheus::PrometheusHandle;
use neighbourhood_map::config::AppConfig;
use neighbourhood_map::error::AppError;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Loads configuration and applies a command-line database override.
pub(crate) fn config_with_database(database: Option<PathBuf>) -> Result<AppConfig, AppError> {
    let mut config = AppConfig::load()?;
    if let Some(path) = database {
        config.data.database_path = path;
    }
    Ok(config)
}
