use chrono::{DateTime, TimeZone, Utc};
use diesel::dsl::count_star;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde::Serialize;

use freeshare_shared::errors::AppResult;

use crate::lifecycle::ReviewStatus;
use crate::models::{report_status, SupportStatus};
use crate::schema::{item_reviews, reports, support_requests, user_bans, user_reviews, user_suspensions};
use crate::services::support_service;

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct ReviewCounts {
    pub pending: i64,
    pub in_review: i64,
    pub review_completed: i64,
    pub appeal_pending: i64,
    pub appeal_in_review: i64,
    pub appeal_completed: i64,
}

impl ReviewCounts {
    /// Fold `(status, count)` rows into per-status counters. Unknown
    /// statuses are ignored.
    pub fn from_rows(rows: &[(String, i64)]) -> Self {
        let mut counts = Self::default();
        for (status, n) in rows {
            let slot = match status.parse::<ReviewStatus>() {
                Ok(ReviewStatus::Pending) => &mut counts.pending,
                Ok(ReviewStatus::InReview) => &mut counts.in_review,
                Ok(ReviewStatus::ReviewCompleted) => &mut counts.review_completed,
                Ok(ReviewStatus::AppealPending) => &mut counts.appeal_pending,
                Ok(ReviewStatus::AppealInReview) => &mut counts.appeal_in_review,
                Ok(ReviewStatus::AppealCompleted) => &mut counts.appeal_completed,
                Err(_) => continue,
            };
            *slot += n;
        }
        counts
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub item_reviews: ReviewCounts,
    pub user_reviews: ReviewCounts,
    pub pending_reports: i64,
    pub reports_today: i64,
    pub open_support_requests: i64,
    pub breached_support_requests: i64,
    pub active_suspensions: i64,
    pub active_bans: i64,
    pub generated_at: DateTime<Utc>,
}

/// Midnight UTC of the day `now` falls on.
pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.from_utc_datetime(&now.date_naive().and_time(chrono::NaiveTime::default()))
}

pub fn dashboard(conn: &mut PgConnection) -> AppResult<DashboardStats> {
    let now = Utc::now();

    let item_rows = item_reviews::table
        .group_by(item_reviews::status)
        .select((item_reviews::status, count_star()))
        .load::<(String, i64)>(conn)?;
    let user_rows = user_reviews::table
        .group_by(user_reviews::status)
        .select((user_reviews::status, count_star()))
        .load::<(String, i64)>(conn)?;

    let pending_reports = reports::table
        .filter(reports::status.eq(report_status::PENDING))
        .count()
        .get_result::<i64>(conn)?;
    let reports_today = reports::table
        .filter(reports::created_at.ge(start_of_day(now)))
        .count()
        .get_result::<i64>(conn)?;

    let open_support_requests = support_requests::table
        .filter(support_requests::status.eq_any(SupportStatus::OPEN))
        .count()
        .get_result::<i64>(conn)?;
    let breached_support_requests = support_service::breached_open_count(conn, now)?;

    let active_suspensions = user_suspensions::table
        .filter(user_suspensions::is_active.eq(true))
        .filter(user_suspensions::expires_at.gt(now))
        .count()
        .get_result::<i64>(conn)?;
    let active_bans = user_bans::table
        .filter(user_bans::is_active.eq(true))
        .count()
        .get_result::<i64>(conn)?;

    Ok(DashboardStats {
        item_reviews: ReviewCounts::from_rows(&item_rows),
        user_reviews: ReviewCounts::from_rows(&user_rows),
        pending_reports,
        reports_today,
        open_support_requests,
        breached_support_requests,
        active_suspensions,
        active_bans,
        generated_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn start_of_day_truncates_to_midnight() {
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 17, 42, 9).unwrap();
        let start = start_of_day(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 14, 0, 0, 0).unwrap());
        assert_eq!(start.hour(), 0);
        assert_eq!(start_of_day(start), start);
    }

    #[test]
    fn review_counts_fold_by_status() {
        let rows = vec![
            ("pending".to_string(), 4),
            ("in_review".to_string(), 2),
            ("appeal_pending".to_string(), 1),
            ("archived".to_string(), 9),
        ];
        let counts = ReviewCounts::from_rows(&rows);
        assert_eq!(counts.pending, 4);
        assert_eq!(counts.in_review, 2);
        assert_eq!(counts.appeal_pending, 1);
        assert_eq!(counts.review_completed, 0);
    }
}
