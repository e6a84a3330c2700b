//! VOC Verification API Server
//!
//! Serves the verification engine over HTTP: verify attempts, hot model
//! reload, user registration, the verification log, health and metrics.

use axum::{
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use std::time::Instant;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

pub mod config;
mod error;
mod purge;
mod routes;

pub use config::{ConfigError, ServiceConfig};
pub use error::{ApiError, ApiResult};
pub use purge::PurgeNotifier;

use data_validator::{SignalValidator, ValidationConfig};
use storage::Repository;
use verification::VerificationEngine;

/// Application state shared across handlers
pub struct AppState {
    pub engine: Arc<VerificationEngine>,
    pub repository: Arc<Repository>,
    /// Used to flag poor-quality samples in submitted rounds
    pub validator: SignalValidator,
    pub purge: Option<PurgeNotifier>,
    pub metrics: Option<PrometheusHandle>,
    pub config: ServiceConfig,
    pub version: String,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(engine: Arc<VerificationEngine>, repository: Arc<Repository>, config: ServiceConfig) -> Self {
        Self {
            engine,
            repository,
            validator: SignalValidator::new(ValidationConfig::default()),
            purge: None,
            metrics: None,
            config,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
        }
    }

    pub fn with_purge(mut self, purge: PurgeNotifier) -> Self {
        self.purge = Some(purge);
        self
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(routes::health::get_health))
        .route("/api/v1/verify", post(routes::verify::verify))
        .route("/api/v1/models/reload", post(routes::models::reload))
        .route(
            "/api/v1/users",
            get(routes::users::list_users).post(routes::users::register_user),
        )
        .route("/api/v1/verifications", get(routes::verifications::recent))
        .route("/metrics", get(routes::metrics::render))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Initialize logging
pub fn init_logging(json: bool) {
    let builder = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true);

    let result = if json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    result.expect("Failed to set tracing subscriber");
}

/// Assemble the service from configuration and serve until shutdown
pub async fn run_server(config: ServiceConfig) -> Result<(), Box<dyn std::error::Error>> {
    let repository = Arc::new(match &config.users_file {
        Some(path) => Repository::with_users_file(path)?,
        None => Repository::new(),
    });

    let (purge, _fan) = PurgeNotifier::spawn();
    let engine = VerificationEngine::load(config.model_dir(), config.verification())?
        .with_user_directory(repository.clone())
        .with_purge(Arc::new(purge.clone()));

    let mut state = AppState::new(Arc::new(engine), repository, config.clone()).with_purge(purge);
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => state = state.with_metrics(handle),
        Err(e) => warn!("Prometheus recorder not installed: {}", e),
    }

    let app = create_router(Arc::new(state));

    info!(
        "Starting API server on {} ({}-sensor mode, {} rounds of {} samples)",
        config.bind_addr,
        config.sensor_mode,
        config.rounds(),
        config.samples_per_round
    );

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use inference_engine::{
        Classifier, EnsembleMember, FeatureOrder, InferenceError, LabelEncoder, ModelBundle,
    };
    use verification::VerificationConfig;

    /// Favours identity "1001" when the first aligned feature is positive
    pub struct SignOfFirst;

    impl Classifier for SignOfFirst {
        fn n_classes(&self) -> usize {
            2
        }

        fn n_features(&self) -> Option<usize> {
            Some(2)
        }

        fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, InferenceError> {
            Ok(if features[0] > 0.0 { vec![0.9, 0.1] } else { vec![0.4, 0.6] })
        }
    }

    pub fn state() -> Arc<AppState> {
        let bundle = ModelBundle::from_parts(
            FeatureOrder::new(vec!["mq6_1_mean".to_string(), "mq6_1_std".to_string()]),
            LabelEncoder::new(vec!["1001".to_string(), "1002".to_string()]),
            vec![
                EnsembleMember::new("RF", Box::new(SignOfFirst)),
                EnsembleMember::new("ANN", Box::new(SignOfFirst)),
            ],
        )
        .unwrap();

        let repository = Arc::new(Repository::new());
        repository.insert_user("1001", "Asha").unwrap();

        let engine = VerificationEngine::new(bundle, VerificationConfig::default())
            .with_user_directory(repository.clone());
        Arc::new(AppState::new(Arc::new(engine), repository, ServiceConfig::default()))
    }
}
