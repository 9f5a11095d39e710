use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use freeshare_shared::errors::{AppError, AppResult, ErrorCode};
use freeshare_shared::records::ChangeKind;
use freeshare_shared::types::auth::AuthUser;

use crate::events::publisher;
use crate::lifecycle::TriggerType;
use crate::models::{report_status, NewReport, Report, Review, SubjectType, REPORTS};
use crate::schema::reports;
use crate::services::{item_service, review_service, sanction_service};
use crate::AppState;

/// What a new report led to.
#[derive(Debug, serde::Serialize)]
pub struct ReportReceipt {
    pub report: Report,
    /// The review the report now counts towards, if any.
    pub review_id: Option<Uuid>,
    /// Whether this report opened that review.
    pub review_opened: bool,
}

fn pending_for(conn: &mut PgConnection, subject: SubjectType, subject_id: Uuid) -> AppResult<Vec<Report>> {
    Ok(reports::table
        .filter(reports::subject_type.eq(subject.as_str()))
        .filter(reports::subject_id.eq(subject_id))
        .filter(reports::status.eq(report_status::PENDING))
        .order(reports::created_at.asc())
        .load::<Report>(conn)?)
}

fn link(conn: &mut PgConnection, report_ids: &[Uuid], review_id: Uuid) -> AppResult<Vec<Report>> {
    Ok(diesel::update(reports::table.filter(reports::id.eq_any(report_ids)))
        .set((
            reports::status.eq(report_status::LINKED),
            reports::review_id.eq(review_id),
        ))
        .get_results::<Report>(conn)?)
}

/// Whether enough pending reports have piled up to open a review.
pub fn threshold_reached(pending: usize, threshold: i64) -> bool {
    pending as i64 >= threshold
}

/// File a report against an item or a user.
///
/// Reports against a subject that is already under review are linked to
/// that review straight away. Otherwise they stay pending until the
/// configured number of pending reports is reached, at which point a review
/// is opened and all of them are linked to it.
pub async fn create_report(
    state: &AppState,
    reporter: &AuthUser,
    subject: SubjectType,
    subject_id: Uuid,
    reason: String,
    details: Option<String>,
) -> AppResult<ReportReceipt> {
    let reviews = state.reviews(subject);
    let threshold = state.config.report_review_threshold;
    let mut conn = state.db.get()?;

    let (report, linked, opened) = conn.transaction::<_, AppError, _>(|conn| {
        let owner = match subject {
            SubjectType::Item => item_service::get_item(conn, subject_id)?.owner_id,
            SubjectType::User => sanction_service::get_profile(conn, subject_id)?.id,
        };
        if owner == reporter.id {
            return Err(AppError::new(ErrorCode::CannotReportSelf, format!("you cannot report your own {subject}")));
        }

        let duplicate = diesel::select(diesel::dsl::exists(
            reports::table
                .filter(reports::reporter_id.eq(reporter.id))
                .filter(reports::subject_type.eq(subject.as_str()))
                .filter(reports::subject_id.eq(subject_id))
                .filter(reports::status.eq_any([report_status::PENDING, report_status::LINKED])),
        ))
        .get_result::<bool>(conn)?;
        if duplicate {
            return Err(AppError::new(
                ErrorCode::DuplicateReport,
                format!("you already reported this {subject}"),
            ));
        }

        let report = diesel::insert_into(reports::table)
            .values(&NewReport {
                reporter_id: reporter.id,
                subject_type: subject.as_str().to_string(),
                subject_id,
                reason,
                details,
            })
            .get_result::<Report>(conn)?;

        if let Some(review) = review_service::open_review_for(conn, subject, subject_id)? {
            let linked = link(conn, &[report.id], review.id)?;
            return Ok((report, linked, None::<Review>));
        }

        let pending = pending_for(conn, subject, subject_id)?;
        if !threshold_reached(pending.len(), threshold) {
            return Ok((report, Vec::new(), None));
        }

        let ids: Vec<Uuid> = pending.iter().map(|r| r.id).collect();
        let data = serde_json::json!({ "report_ids": ids, "report_count": ids.len() });
        let review = review_service::insert_review(conn, &reviews, subject, subject_id, TriggerType::Reports, Some(data))?;
        let linked = link(conn, &ids, review.id)?;
        Ok((report, linked, Some(review)))
    })?;

    tracing::info!(
        report_id = %report.id,
        reporter_id = %reporter.id,
        subject_type = subject.as_str(),
        subject_id = %subject_id,
        "report filed"
    );

    let feed = state.records::<Report>(&REPORTS);
    let report = linked.iter().find(|r| r.id == report.id).cloned().unwrap_or(report);
    feed.notify(ChangeKind::Insert, &report);
    for other in linked.iter().filter(|r| r.id != report.id) {
        feed.notify(ChangeKind::Update, other);
    }
    publisher::publish_report_created(&state.rabbitmq, report.id, reporter.id, subject, subject_id).await;

    let review_opened = opened.is_some();
    if let Some(review) = &opened {
        reviews.notify(ChangeKind::Insert, review);
        publisher::publish_review_opened(&state.rabbitmq, subject, review).await;
    }

    Ok(ReportReceipt {
        review_id: report.review_id,
        review_opened,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_counts_the_new_report() {
        assert!(!threshold_reached(2, 3));
        assert!(threshold_reached(3, 3));
        assert!(threshold_reached(5, 3));
        assert!(threshold_reached(1, 1));
    }
}
