pub mod audit_service;
pub mod broadcast_service;
pub mod item_service;
pub mod notification_service;
pub mod report_service;
pub mod review_service;
pub mod sanction_service;
pub mod stats_service;
pub mod support_service;
