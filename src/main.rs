use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use audio_label_hw::{
    app_state::AppState,
    config::AppConfig,
    db::{self, PgIdentityStore, PgItemStore},
    routes,
    services::{auth::TokenService, lease::RedisLeaseStore, storage::S3BlobStore},
};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing audio-label-hw server");

    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);
    routes::metrics::describe();

    tracing::info!("Connecting to PostgreSQL database");
    let db_pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Running database migrations");
    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!(bucket = %config.s3_bucket, "Initializing object storage client");
    let blobs = S3BlobStore::new(
        &config.s3_bucket,
        &config.s3_region,
        config.s3_endpoint.as_deref(),
        &config.s3_access_key,
        &config.s3_secret_key,
        config.s3_path_style,
    )
    .expect("Failed to initialize object storage client");

    let tokens = TokenService::new(&config.jwt_secret, config.token_ttl());

    let mut state = AppState::new(
        PgItemStore::new(db_pool.clone()),
        PgIdentityStore::new(db_pool),
        blobs,
        tokens,
        config.labeling(),
        config.admin(),
    );

    if let Some(redis_url) = config.lease_redis_url() {
        tracing::info!(lease_secs = config.lease_secs, "Enabling Redis item leases");
        let leases = RedisLeaseStore::new(redis_url, config.lease_secs)
            .expect("Failed to initialize Redis leases");
        state = state.with_leases(leases);
    }

    if let Some(cooldown) = state.policy.cooldown {
        tracing::info!(cooldown_secs = cooldown.num_seconds(), "Label cooldown enabled");
    }

    let app = routes::router(state).merge(routes::metrics::router(prometheus_handle));

    tracing::info!("Starting audio-label-hw on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
