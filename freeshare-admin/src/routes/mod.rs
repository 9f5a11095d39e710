pub mod broadcasts;
pub mod dashboard;
pub mod health;
pub mod records;
pub mod reviews;
pub mod support;
pub mod user_routes;

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;

use crate::access;
use crate::AppState;

/// Back-office routes, mounted under `/admin` behind the route rules.
fn admin_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tables", get(records::list_tables))
        .route("/tables/:table", get(records::list))
        .route("/tables/:table/count", get(records::count))
        .route("/tables/:table/meta", get(records::meta))
        .route("/tables/:table/by/:field/:value", get(records::find_one))
        .route("/tables/:table/:id", get(records::get).patch(records::update))
        .route("/tables/:table/:id/subscribe", get(records::subscribe))
        .route("/reviews/:subject", post(reviews::create))
        .route("/reviews/:subject/:id", get(reviews::detail))
        .route("/reviews/:subject/:id/claim", post(reviews::claim))
        .route("/reviews/:subject/:id/release", post(reviews::release))
        .route("/reviews/:subject/:id/decision", post(reviews::decide))
        .route("/reviews/:subject/:id/appeal/claim", post(reviews::claim_appeal))
        .route("/reviews/:subject/:id/appeal/release", post(reviews::release_appeal))
        .route("/reviews/:subject/:id/appeal/decision", post(reviews::decide_appeal))
        .route("/support/:id/status", put(support::update_status))
        .route("/support/:id/assign", put(support::assign))
        .route("/support/:id/sla", get(support::sla))
        .route("/broadcasts", post(broadcasts::create))
        .route("/broadcasts/:id/send", post(broadcasts::send))
        .route("/items/:id", get(dashboard::item_detail))
        .route("/stats", get(dashboard::stats))
        .route("/audit-log", get(dashboard::audit_log))
        .layer(middleware::from_fn(access::enforce))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::metrics))
        .route("/report", post(user_routes::create_report))
        .route("/reviews/:subject/:id/appeal", post(user_routes::file_appeal))
        .route("/support", post(user_routes::create_support_request))
        .nest("/admin", admin_routes())
}
