use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use freeshare_shared::errors::AppResult;

use crate::models::{NewNotification, Notification};
use crate::schema::notifications;

const INSERT_CHUNK: usize = 1000;

/// Create a new notification and insert it into the database.
pub fn create_notification(
    conn: &mut PgConnection,
    user_id: Uuid,
    notification_type: &str,
    title: &str,
    body: &str,
    data: Option<serde_json::Value>,
) -> AppResult<Notification> {
    let new_notification = NewNotification {
        user_id,
        notification_type: notification_type.to_string(),
        title: title.to_string(),
        body: body.to_string(),
        data,
    };

    let notification = diesel::insert_into(notifications::table)
        .values(&new_notification)
        .get_result::<Notification>(conn)?;

    tracing::debug!(
        notification_id = %notification.id,
        user_id = %user_id,
        notification_type = %notification_type,
        "notification created"
    );

    Ok(notification)
}

/// Insert the same notification for many users. Returns the number of rows written.
pub fn create_many(
    conn: &mut PgConnection,
    user_ids: &[Uuid],
    notification_type: &str,
    title: &str,
    body: &str,
    data: Option<serde_json::Value>,
) -> AppResult<usize> {
    let mut written = 0;
    for chunk in user_ids.chunks(INSERT_CHUNK) {
        let rows: Vec<NewNotification> = chunk
            .iter()
            .map(|user_id| NewNotification {
                user_id: *user_id,
                notification_type: notification_type.to_string(),
                title: title.to_string(),
                body: body.to_string(),
                data: data.clone(),
            })
            .collect();

        written += diesel::insert_into(notifications::table)
            .values(&rows)
            .execute(conn)?;
    }
    Ok(written)
}
