//! Role-based access to the back-office routes.
//!
//! Patterns are `/`-separated. A `*` segment matches exactly one path
//! segment, except as the last segment where it matches one or more. Rules
//! are checked in order and the first matching pattern decides; paths no
//! rule matches are denied. Path segments are percent-decoded before
//! matching, the same way the router decodes them for handlers.

use std::borrow::Cow;

use axum::extract::{OriginalUri, Request};
use axum::middleware::Next;
use axum::response::Response;
use percent_encoding::percent_decode_str;

use freeshare_shared::errors::AppError;
use freeshare_shared::types::auth::{AuthUser, UserRole};

use UserRole::{Admin, Moderator};

pub struct RouteRule {
    pub pattern: &'static str,
    pub roles: &'static [UserRole],
}

const fn rule(pattern: &'static str, roles: &'static [UserRole]) -> RouteRule {
    RouteRule { pattern, roles }
}

const STAFF: &[UserRole] = &[Admin, Moderator];
const ADMIN_ONLY: &[UserRole] = &[Admin];

pub static RULES: &[RouteRule] = &[
    rule("/admin/audit-log", ADMIN_ONLY),
    rule("/admin/broadcasts", ADMIN_ONLY),
    rule("/admin/broadcasts/*", ADMIN_ONLY),
    rule("/admin/tables/support_sla_configs/*", ADMIN_ONLY),
    rule("/admin/tables/devices", ADMIN_ONLY),
    rule("/admin/tables/devices/*", ADMIN_ONLY),
    rule("/admin/tables", STAFF),
    rule("/admin/tables/*", STAFF),
    rule("/admin/reviews/*", STAFF),
    rule("/admin/support/*", STAFF),
    rule("/admin/items/*", STAFF),
    rule("/admin/stats", STAFF),
];

fn segments(path: &str) -> Vec<Cow<'_, str>> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| percent_decode_str(s).decode_utf8_lossy())
        .collect()
}

/// Whether `path` matches `pattern`.
pub fn matches(pattern: &str, path: &str) -> bool {
    let pattern = segments(pattern);
    let path = segments(path);

    for (i, expected) in pattern.iter().enumerate() {
        let expected = expected.as_ref();
        if expected == "*" && i + 1 == pattern.len() {
            return path.len() > i;
        }
        match path.get(i) {
            Some(actual) if expected == "*" || expected == actual.as_ref() => {}
            _ => return false,
        }
    }
    path.len() == pattern.len()
}

/// First rule whose pattern matches `path`.
pub fn find_rule<'a>(rules: &'a [RouteRule], path: &str) -> Option<&'a RouteRule> {
    rules.iter().find(|r| matches(r.pattern, path))
}

pub fn is_allowed_by(rules: &[RouteRule], path: &str, role: UserRole) -> bool {
    find_rule(rules, path).map_or(false, |r| r.roles.contains(&role))
}

pub fn is_allowed(path: &str, role: UserRole) -> bool {
    is_allowed_by(RULES, path, role)
}

/// Rejects requests whose role is not listed for the matched route.
pub async fn enforce(
    OriginalUri(uri): OriginalUri,
    user: AuthUser,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = uri.path();
    if !is_allowed(path, user.role) {
        tracing::warn!(user_id = %user.id, role = %user.role, path, "route access denied");
        return Err(AppError::forbidden(format!("role '{}' may not access {path}", user.role)));
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::Path;
    use axum::http::{Request as HttpRequest, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use freeshare_shared::middleware::jwt_secret;
    use freeshare_shared::types::auth::{Claims, UserRole::User};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use tower::ServiceExt;
    use uuid::Uuid;

    #[test]
    fn star_matches_exactly_one_inner_segment() {
        assert!(matches("/admin/tables/*/count", "/admin/tables/items/count"));
        assert!(!matches("/admin/tables/*/count", "/admin/tables/count"));
        assert!(!matches("/admin/tables/*/count", "/admin/tables/a/b/count"));
    }

    #[test]
    fn trailing_star_matches_one_or_more() {
        assert!(matches("/admin/reviews/*", "/admin/reviews/item"));
        assert!(matches("/admin/reviews/*", "/admin/reviews/item/42/claim"));
        assert!(!matches("/admin/reviews/*", "/admin/reviews"));
    }

    #[test]
    fn literal_patterns_need_exact_paths() {
        assert!(matches("/admin/stats", "/admin/stats"));
        assert!(matches("/admin/stats", "/admin/stats/"));
        assert!(!matches("/admin/stats", "/admin/stats/today"));
        assert!(!matches("/admin/stats", "/admin"));
    }

    #[test]
    fn encoded_segments_are_decoded_before_matching() {
        assert!(matches("/admin/tables/devices", "/admin/tables/%64evices"));
        assert!(matches("/admin/tables/devices/*", "/admin/tables/de%76ices/5"));
        assert!(!is_allowed("/admin/tables/%64evices", Moderator));
        assert!(!is_allowed("/admin/tables/support_sla_configs/%35", Moderator));
    }

    #[test]
    fn listed_roles_only() {
        let cases = [
            ("/admin/stats", Moderator, true),
            ("/admin/stats", Admin, true),
            ("/admin/stats", User, false),
            ("/admin/broadcasts", Moderator, false),
            ("/admin/broadcasts/3/send", Admin, true),
            ("/admin/audit-log", Moderator, false),
            ("/admin/tables", Moderator, true),
            ("/admin/tables/items", Moderator, true),
            ("/admin/tables/support_sla_configs", Moderator, true),
            ("/admin/tables/support_sla_configs/5", Moderator, false),
            ("/admin/tables/devices", Moderator, false),
            ("/admin/tables/devices/5/subscribe", Admin, true),
            ("/admin/tables/profiles/5/subscribe", Moderator, true),
            ("/admin/unknown", Admin, false),
            ("/report", Admin, false),
        ];
        for (path, role, expected) in cases {
            assert_eq!(is_allowed(path, role), expected, "{role} on {path}");
        }
    }

    #[test]
    fn first_matching_rule_wins() {
        let rules = [rule("/a/*", &[Admin]), rule("/a/b", &[Moderator])];
        assert!(is_allowed_by(&rules, "/a/b", Admin));
        assert!(!is_allowed_by(&rules, "/a/b", Moderator));
    }

    #[test]
    fn every_rule_is_reachable() {
        for (i, r) in RULES.iter().enumerate() {
            let sample = r.pattern.replace('*', "x");
            let hit = find_rule(RULES, &sample).map(|found| found.pattern);
            assert_eq!(hit, Some(r.pattern), "rule {i} shadowed");
        }
    }

    fn bearer(role: UserRole) -> String {
        let claims = Claims::new(Uuid::new_v4(), role, 600);
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(jwt_secret().as_bytes())).unwrap();
        format!("Bearer {token}")
    }

    fn app() -> Router {
        Router::new()
            .route("/admin/stats", get(|| async { "stats" }))
            .route("/admin/broadcasts", get(|| async { "broadcasts" }))
            .route("/admin/tables/:table", get(|Path(table): Path<String>| async move { table }))
            .layer(axum::middleware::from_fn(enforce))
    }

    async fn status_for(path: &str, role: Option<UserRole>) -> StatusCode {
        let mut req = HttpRequest::builder().uri(path);
        if let Some(role) = role {
            req = req.header("Authorization", bearer(role));
        }
        app().oneshot(req.body(Body::empty()).unwrap()).await.unwrap().status()
    }

    #[tokio::test]
    async fn middleware_applies_rules() {
        assert_eq!(status_for("/admin/stats", None).await, StatusCode::UNAUTHORIZED);
        assert_eq!(status_for("/admin/stats", Some(User)).await, StatusCode::FORBIDDEN);
        assert_eq!(status_for("/admin/stats", Some(Moderator)).await, StatusCode::OK);
        assert_eq!(status_for("/admin/broadcasts", Some(Moderator)).await, StatusCode::FORBIDDEN);
        assert_eq!(status_for("/admin/broadcasts", Some(Admin)).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn encoded_table_name_cannot_bypass_rules() {
        assert_eq!(status_for("/admin/tables/devices", Some(Moderator)).await, StatusCode::FORBIDDEN);
        assert_eq!(status_for("/admin/tables/%64evices", Some(Moderator)).await, StatusCode::FORBIDDEN);
        assert_eq!(status_for("/admin/tables/%64evices", Some(Admin)).await, StatusCode::OK);
        assert_eq!(status_for("/admin/tables/%69tems", Some(Moderator)).await, StatusCode::OK);
    }
}
