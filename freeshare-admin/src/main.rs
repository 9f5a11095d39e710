use axum::http::{header, HeaderValue, Method};
use axum::middleware;
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use freeshare_admin::config::AppConfig;
use freeshare_admin::events::subscriber;
use freeshare_admin::AppState;
use freeshare_shared::clients::db::create_pool;
use freeshare_shared::clients::rabbitmq::RabbitMQClient;
use freeshare_shared::clients::storage::StorageUrls;
use freeshare_shared::middleware::{init_metrics, init_tracing, metrics_middleware, JWT_SECRET_ENV};
use freeshare_shared::records::ChangeFeed;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("freeshare-admin");

    let config = AppConfig::load()?;
    let port = config.port;

    // the auth extractors read the secret from the environment
    if std::env::var(JWT_SECRET_ENV).is_err() {
        std::env::set_var(JWT_SECRET_ENV, &config.jwt_secret);
    }

    let metrics_handle = init_metrics()?;

    let db = create_pool(&config.database_url, config.db_pool_size)?;
    tracing::info!(pool_size = config.db_pool_size, "database pool ready");

    let rabbitmq = RabbitMQClient::connect(&config.rabbitmq_url).await?;
    tracing::info!("connected to RabbitMQ");

    let allowed_origins: Vec<HeaderValue> = config
        .cors_origins()
        .into_iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let state = Arc::new(AppState {
        db,
        storage: StorageUrls::new(&config.storage_public_url),
        config,
        rabbitmq,
        feed: ChangeFeed::new(),
        metrics_handle,
    });

    let listener_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = subscriber::listen_auto_flag_events(listener_state).await {
            tracing::error!(error = %e, "auto-flag listener stopped");
        }
    });

    let app = freeshare_admin::app(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(allowed_origins))
                .allow_methods(AllowMethods::list([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::OPTIONS,
                ]))
                .allow_headers(AllowHeaders::list([
                    header::AUTHORIZATION,
                    header::CONTENT_TYPE,
                    header::ACCEPT,
                ]))
                .allow_credentials(true),
        )
        .layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "freeshare-admin starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
