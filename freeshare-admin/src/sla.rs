use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{SupportRequest, SupportSlaConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlaThresholds {
    pub response_time_hours: i64,
    pub resolution_time_hours: i64,
}

impl From<&SupportSlaConfig> for SlaThresholds {
    fn from(config: &SupportSlaConfig) -> Self {
        Self {
            response_time_hours: config.response_time_hours.into(),
            resolution_time_hours: config.resolution_time_hours.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlaStatus {
    pub hours_since_creation: f64,
    pub response_time_hours: i64,
    pub resolution_time_hours: i64,
    pub response_breached: bool,
    pub resolution_breached: bool,
}

/// Breach flags for a request created at `created_at`, as seen at `now`.
///
/// A threshold is breached once strictly more hours than it allows have
/// elapsed. Requests dated in the future count as zero hours old.
pub fn evaluate(created_at: DateTime<Utc>, now: DateTime<Utc>, thresholds: SlaThresholds) -> SlaStatus {
    let elapsed_secs = (now - created_at).num_seconds().max(0);
    let hours_since_creation = elapsed_secs as f64 / 3600.0;

    SlaStatus {
        hours_since_creation,
        response_time_hours: thresholds.response_time_hours,
        resolution_time_hours: thresholds.resolution_time_hours,
        response_breached: elapsed_secs > thresholds.response_time_hours * 3600,
        resolution_breached: elapsed_secs > thresholds.resolution_time_hours * 3600,
    }
}

/// Like [`evaluate`], but a request that already got its first response or
/// was resolved stops accruing against the matching threshold.
pub fn evaluate_request(request: &SupportRequest, now: DateTime<Utc>, thresholds: SlaThresholds) -> SlaStatus {
    let mut status = evaluate(request.created_at, now, thresholds);
    if let Some(responded) = request.first_response_at {
        status.response_breached = evaluate(request.created_at, responded, thresholds).response_breached;
    }
    if let Some(resolved) = request.resolved_at {
        status.resolution_breached = evaluate(request.created_at, resolved, thresholds).resolution_breached;
    }
    status
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    const THRESHOLDS: SlaThresholds = SlaThresholds {
        response_time_hours: 4,
        resolution_time_hours: 48,
    };

    fn request(created_at: DateTime<Utc>) -> SupportRequest {
        SupportRequest {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            category: "account".into(),
            priority: "normal".into(),
            subject: "cannot log in".into(),
            body: "reset link expired".into(),
            status: "open".into(),
            assigned_to: None,
            first_response_at: None,
            resolved_at: None,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn exactly_at_threshold_is_not_breached() {
        let created = Utc::now();
        let status = evaluate(created, created + Duration::hours(4), THRESHOLDS);
        assert!(!status.response_breached);
        assert_eq!(status.hours_since_creation, 4.0);

        let status = evaluate(created, created + Duration::hours(4) + Duration::seconds(1), THRESHOLDS);
        assert!(status.response_breached);
        assert!(!status.resolution_breached);
    }

    #[test]
    fn breach_flags_are_monotonic_in_elapsed_time() {
        let created = Utc::now();
        let mut previous = evaluate(created, created, THRESHOLDS);
        for minutes in (0..=60 * 72).step_by(7) {
            let current = evaluate(created, created + Duration::minutes(minutes), THRESHOLDS);
            assert!(current.response_breached >= previous.response_breached, "at {minutes}m");
            assert!(current.resolution_breached >= previous.resolution_breached, "at {minutes}m");
            assert!(current.hours_since_creation >= previous.hours_since_creation);
            previous = current;
        }
        assert!(previous.response_breached && previous.resolution_breached);
    }

    #[test]
    fn future_creation_counts_as_new() {
        let now = Utc::now();
        let status = evaluate(now + Duration::hours(2), now, THRESHOLDS);
        assert_eq!(status.hours_since_creation, 0.0);
        assert!(!status.response_breached);
    }

    #[test]
    fn first_response_stops_response_clock() {
        let created = Utc::now() - Duration::hours(10);
        let mut req = request(created);
        req.first_response_at = Some(created + Duration::hours(1));

        let status = evaluate_request(&req, Utc::now(), THRESHOLDS);
        assert!(!status.response_breached);
        assert!(!status.resolution_breached);

        req.first_response_at = Some(created + Duration::hours(6));
        assert!(evaluate_request(&req, Utc::now(), THRESHOLDS).response_breached);
    }
}
