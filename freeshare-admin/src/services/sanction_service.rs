//! Warnings, suspensions and bans, and the profile status they imply.

use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use freeshare_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{
    profile_status, NewUserBan, NewUserSuspension, NewUserWarning, Profile, UserBan, UserSuspension, UserWarning,
};
use crate::schema::{profiles, user_bans, user_suspensions, user_warnings};

pub fn get_profile(conn: &mut PgConnection, user_id: Uuid) -> AppResult<Profile> {
    profiles::table
        .find(user_id)
        .first::<Profile>(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))
}

pub fn warn(
    conn: &mut PgConnection,
    user_id: Uuid,
    review_id: Option<Uuid>,
    reason: &str,
    issued_by: Uuid,
) -> AppResult<UserWarning> {
    get_profile(conn, user_id)?;

    let warning = diesel::insert_into(user_warnings::table)
        .values(&NewUserWarning {
            user_id,
            review_id,
            reason: reason.to_string(),
            issued_by,
        })
        .get_result::<UserWarning>(conn)?;

    tracing::info!(user_id = %user_id, warning_id = %warning.id, "warning issued");
    Ok(warning)
}

pub fn suspend(
    conn: &mut PgConnection,
    user_id: Uuid,
    review_id: Option<Uuid>,
    reason: &str,
    issued_by: Uuid,
    expires_at: DateTime<Utc>,
) -> AppResult<(UserSuspension, Profile)> {
    get_profile(conn, user_id)?;

    let suspension = diesel::insert_into(user_suspensions::table)
        .values(&NewUserSuspension {
            user_id,
            review_id,
            reason: reason.to_string(),
            issued_by,
            expires_at,
        })
        .get_result::<UserSuspension>(conn)?;

    let profile = refresh_profile_status(conn, user_id, Utc::now())?;
    tracing::info!(user_id = %user_id, suspension_id = %suspension.id, %expires_at, "user suspended");
    Ok((suspension, profile))
}

pub fn ban(
    conn: &mut PgConnection,
    user_id: Uuid,
    review_id: Option<Uuid>,
    reason: &str,
    issued_by: Uuid,
) -> AppResult<(UserBan, Profile)> {
    get_profile(conn, user_id)?;

    let ban = diesel::insert_into(user_bans::table)
        .values(&NewUserBan {
            user_id,
            review_id,
            reason: reason.to_string(),
            issued_by,
        })
        .get_result::<UserBan>(conn)?;

    let profile = refresh_profile_status(conn, user_id, Utc::now())?;
    tracing::info!(user_id = %user_id, ban_id = %ban.id, "user banned");
    Ok((ban, profile))
}

/// Lift the active suspensions a review imposed on a user. Fails when there
/// is none.
pub fn lift_suspensions(
    conn: &mut PgConnection,
    user_id: Uuid,
    review_id: Uuid,
    lifted_by: Uuid,
) -> AppResult<(usize, Profile)> {
    let now = Utc::now();
    let lifted = diesel::update(
        user_suspensions::table
            .filter(user_suspensions::user_id.eq(user_id))
            .filter(user_suspensions::review_id.eq(review_id))
            .filter(user_suspensions::is_active.eq(true)),
    )
    .set((
        user_suspensions::is_active.eq(false),
        user_suspensions::lifted_at.eq(now),
        user_suspensions::lifted_by.eq(lifted_by),
    ))
    .execute(conn)?;

    if lifted == 0 {
        return Err(AppError::new(ErrorCode::SanctionNotFound, "review left no active suspension to lift"));
    }

    let profile = refresh_profile_status(conn, user_id, now)?;
    tracing::info!(user_id = %user_id, review_id = %review_id, lifted, "suspensions lifted");
    Ok((lifted, profile))
}

/// Lift the active bans a review imposed on a user. Fails when there is none.
pub fn lift_bans(conn: &mut PgConnection, user_id: Uuid, review_id: Uuid, lifted_by: Uuid) -> AppResult<(usize, Profile)> {
    let now = Utc::now();
    let lifted = diesel::update(
        user_bans::table
            .filter(user_bans::user_id.eq(user_id))
            .filter(user_bans::review_id.eq(review_id))
            .filter(user_bans::is_active.eq(true)),
    )
    .set((
        user_bans::is_active.eq(false),
        user_bans::lifted_at.eq(now),
        user_bans::lifted_by.eq(lifted_by),
    ))
    .execute(conn)?;

    if lifted == 0 {
        return Err(AppError::new(ErrorCode::SanctionNotFound, "review left no active ban to lift"));
    }

    let profile = refresh_profile_status(conn, user_id, now)?;
    tracing::info!(user_id = %user_id, review_id = %review_id, lifted, "bans lifted");
    Ok((lifted, profile))
}

/// Profile status implied by the active sanctions: a ban wins over a
/// suspension, and only unexpired suspensions count.
pub fn derive_status(
    has_active_ban: bool,
    suspension_ends: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> (&'static str, Option<DateTime<Utc>>) {
    if has_active_ban {
        return (profile_status::BANNED, None);
    }
    match suspension_ends {
        Some(until) if until > now => (profile_status::SUSPENDED, Some(until)),
        _ => (profile_status::ACTIVE, None),
    }
}

fn refresh_profile_status(conn: &mut PgConnection, user_id: Uuid, now: DateTime<Utc>) -> AppResult<Profile> {
    let has_active_ban: bool = diesel::select(diesel::dsl::exists(
        user_bans::table
            .filter(user_bans::user_id.eq(user_id))
            .filter(user_bans::is_active.eq(true)),
    ))
    .get_result(conn)?;

    let suspension_ends: Option<DateTime<Utc>> = user_suspensions::table
        .filter(user_suspensions::user_id.eq(user_id))
        .filter(user_suspensions::is_active.eq(true))
        .select(diesel::dsl::max(user_suspensions::expires_at))
        .first(conn)?;

    let (status, suspended_until) = derive_status(has_active_ban, suspension_ends, now);

    Ok(diesel::update(profiles::table.find(user_id))
        .set((
            profiles::status.eq(status),
            profiles::suspended_until.eq(suspended_until),
            profiles::updated_at.eq(now),
        ))
        .get_result::<Profile>(conn)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn ban_outranks_suspension() {
        let now = Utc::now();
        assert_eq!(
            derive_status(true, Some(now + Duration::days(3)), now),
            (profile_status::BANNED, None)
        );
    }

    #[test]
    fn running_suspension_sets_until() {
        let now = Utc::now();
        let until = now + Duration::days(7);
        assert_eq!(derive_status(false, Some(until), now), (profile_status::SUSPENDED, Some(until)));
    }

    #[test]
    fn expired_or_no_suspension_is_active() {
        let now = Utc::now();
        assert_eq!(derive_status(false, Some(now - Duration::hours(1)), now), (profile_status::ACTIVE, None));
        assert_eq!(derive_status(false, None, now), (profile_status::ACTIVE, None));
    }
}
