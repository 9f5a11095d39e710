pub mod access;
pub mod config;
pub mod decision;
pub mod events;
pub mod lifecycle;
pub mod models;
pub mod routes;
pub mod schema;
pub mod services;
pub mod sla;
pub mod tables;

use std::sync::Arc;

use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;

use freeshare_shared::clients::db::DbPool;
use freeshare_shared::clients::rabbitmq::RabbitMQClient;
use freeshare_shared::clients::storage::StorageUrls;
use freeshare_shared::records::{ChangeFeed, Record, RecordService, TableMeta};

use crate::config::AppConfig;
use crate::decision::DecisionPolicy;
use crate::models::{Review, SubjectType};

pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
    pub rabbitmq: RabbitMQClient,
    pub feed: ChangeFeed,
    pub storage: StorageUrls,
    pub metrics_handle: PrometheusHandle,
}

impl AppState {
    pub fn records<T: Record>(&self, meta: &'static TableMeta) -> RecordService<T> {
        RecordService::new(meta, self.feed.clone())
    }

    pub fn reviews(&self, subject: SubjectType) -> RecordService<Review> {
        self.records(subject.review_table())
    }

    pub fn decision_policy(&self) -> DecisionPolicy {
        DecisionPolicy {
            appeal_window: self.config.appeal_window(),
            default_suspension_days: self.config.default_suspension_days,
        }
    }
}

/// The full HTTP surface, without the outer CORS/trace/metrics layers.
pub fn app(state: Arc<AppState>) -> Router {
    routes::router().with_state(state)
}
