use axum::extract::State;
use axum::Json;
use diesel::prelude::*;
use std::sync::Arc;

use freeshare_shared::types::api::{HealthCheck, HealthResponse};

use crate::AppState;

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let database = match state.db.get() {
        Ok(mut conn) => match diesel::sql_query("SELECT 1").execute(&mut conn) {
            Ok(_) => HealthCheck::healthy("database"),
            Err(e) => HealthCheck::unhealthy("database", e.to_string()),
        },
        Err(e) => HealthCheck::unhealthy("database", e.to_string()),
    };

    let rabbitmq = if state.rabbitmq.is_connected() {
        HealthCheck::healthy("rabbitmq")
    } else {
        HealthCheck::unhealthy("rabbitmq", "channel disconnected")
    };

    Json(
        HealthResponse::healthy("freeshare-admin", env!("CARGO_PKG_VERSION"))
            .with_checks(vec![database, rabbitmq]),
    )
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> String {
    state.metrics_handle.render()
}
