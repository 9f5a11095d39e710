use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use freeshare_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{Item, ItemStatus, Profile, Review, PROFILES};
use crate::schema::{item_reviews, items};
use crate::AppState;

pub fn get_item(conn: &mut PgConnection, item_id: Uuid) -> AppResult<Item> {
    items::table
        .find(item_id)
        .first::<Item>(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::ItemNotFound, "item not found"))
}

pub fn set_status(conn: &mut PgConnection, item_id: Uuid, status: ItemStatus) -> AppResult<Item> {
    let item = diesel::update(items::table.find(item_id))
        .set((
            items::status.eq(status.as_str()),
            items::updated_at.eq(Utc::now()),
        ))
        .get_result::<Item>(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::ItemNotFound, "item not found"))?;

    tracing::info!(item_id = %item_id, status = status.as_str(), "item status changed");
    Ok(item)
}

/// Most recent review of an item, whatever its status.
pub fn latest_review(conn: &mut PgConnection, item_id: Uuid) -> AppResult<Option<Review>> {
    Ok(item_reviews::table
        .filter(item_reviews::subject_id.eq(item_id))
        .order(item_reviews::created_at.desc())
        .first::<Review>(conn)
        .optional()?)
}

#[derive(Debug, Serialize)]
pub struct ItemDetail {
    pub item: Item,
    pub owner: Option<Profile>,
    pub image_url: Option<String>,
    pub owner_avatar_url: Option<String>,
    pub latest_review: Option<Review>,
}

/// An item with its owner, media links and most recent review.
pub fn detail(state: &AppState, item_id: Uuid) -> AppResult<ItemDetail> {
    let mut conn = state.db.get()?;
    let item = get_item(&mut conn, item_id)?;
    let owner = state
        .records::<Profile>(&PROFILES)
        .get_one_or_null(&mut conn, "id", &item.owner_id.to_string())?;
    let latest_review = latest_review(&mut conn, item.id)?;

    let image_url = item
        .image_path
        .as_deref()
        .and_then(|path| state.storage.public_url(&state.config.item_image_bucket, path));
    let owner_avatar_url = owner
        .as_ref()
        .and_then(|o| o.avatar_path.as_deref())
        .and_then(|path| state.storage.public_url(&state.config.avatar_bucket, path));

    Ok(ItemDetail {
        item,
        owner,
        image_url,
        owner_avatar_url,
        latest_review,
    })
}
