//! Database operations for `instagram_posts` and `instagram_post_children`.

use chrono::{DateTime, Utc};
use nestsync_core::{MediaType, NormalizedChild, NormalizedPost};
use sqlx::PgPool;

use crate::DbError;

/// Minimal projection of a stored post used to drive per-post stages.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct PostRef {
    pub id: String,
    pub media_type: String,
}

impl PostRef {
    #[must_use]
    pub fn media_type(&self) -> MediaType {
        MediaType::from_graph(&self.media_type)
    }
}

/// A row from the `instagram_post_children` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostChildRow {
    pub id: String,
    pub post_id: String,
    pub client_id: String,
    pub media_type: String,
    pub media_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Upserts a post keyed by its provider id.
///
/// Conflicts update the caption, media URLs, and engagement counters in place.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_post(
    pool: &PgPool,
    client_id: &str,
    post: &NormalizedPost,
) -> Result<u64, DbError> {
    let affected = sqlx::query(
        "INSERT INTO instagram_posts \
             (id, client_id, account_id, caption, media_type, media_product_type, \
              media_url, thumbnail_url, permalink, timestamp, like_count, comments_count) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
         ON CONFLICT (id) DO UPDATE SET \
             caption            = EXCLUDED.caption, \
             media_type         = EXCLUDED.media_type, \
             media_product_type = EXCLUDED.media_product_type, \
             media_url          = EXCLUDED.media_url, \
             thumbnail_url      = EXCLUDED.thumbnail_url, \
             permalink          = EXCLUDED.permalink, \
             timestamp          = EXCLUDED.timestamp, \
             like_count         = EXCLUDED.like_count, \
             comments_count     = EXCLUDED.comments_count, \
             updated_at         = NOW()",
    )
    .bind(&post.id)
    .bind(client_id)
    .bind(&post.account_id)
    .bind(&post.caption)
    .bind(post.media_type.as_str())
    .bind(&post.media_product_type)
    .bind(&post.media_url)
    .bind(&post.thumbnail_url)
    .bind(&post.permalink)
    .bind(post.posted_at)
    .bind(post.like_count)
    .bind(post.comments_count)
    .execute(pool)
    .await?
    .rows_affected();

    Ok(affected)
}

/// Upserts a carousel child. The parent post must already exist.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails, including a foreign-key
/// violation when the parent post is missing.
pub async fn upsert_post_child(
    pool: &PgPool,
    client_id: &str,
    child: &NormalizedChild,
) -> Result<u64, DbError> {
    let affected = sqlx::query(
        "INSERT INTO instagram_post_children \
             (id, post_id, client_id, media_type, media_url, thumbnail_url, timestamp) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         ON CONFLICT (id) DO UPDATE SET \
             post_id       = EXCLUDED.post_id, \
             media_type    = EXCLUDED.media_type, \
             media_url     = EXCLUDED.media_url, \
             thumbnail_url = EXCLUDED.thumbnail_url, \
             timestamp     = EXCLUDED.timestamp, \
             updated_at    = NOW()",
    )
    .bind(&child.id)
    .bind(&child.post_id)
    .bind(client_id)
    .bind(child.media_type.as_str())
    .bind(&child.media_url)
    .bind(&child.thumbnail_url)
    .bind(child.posted_at)
    .execute(pool)
    .await?
    .rows_affected();

    Ok(affected)
}

/// Lists the tenant's live posts, newest first, optionally restricted to
/// posts published at or after `since`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_posts_for_insights(
    pool: &PgPool,
    client_id: &str,
    since: Option<DateTime<Utc>>,
) -> Result<Vec<PostRef>, DbError> {
    let rows = sqlx::query_as::<_, PostRef>(
        "SELECT id, media_type \
         FROM instagram_posts \
         WHERE client_id = $1 \
           AND ($2::timestamptz IS NULL OR timestamp >= $2) \
         ORDER BY timestamp DESC NULLS LAST, id",
    )
    .bind(client_id)
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Lists ids of the tenant's carousel posts, optionally restricted by `since`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_carousel_post_ids(
    pool: &PgPool,
    client_id: &str,
    since: Option<DateTime<Utc>>,
) -> Result<Vec<String>, DbError> {
    let rows = sqlx::query_scalar::<_, String>(
        "SELECT id \
         FROM instagram_posts \
         WHERE client_id = $1 \
           AND media_type = $2 \
           AND ($3::timestamptz IS NULL OR timestamp >= $3) \
         ORDER BY timestamp DESC NULLS LAST, id",
    )
    .bind(client_id)
    .bind(MediaType::CarouselAlbum.as_str())
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Counts the tenant's stored posts.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_posts(pool: &PgPool, client_id: &str) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM instagram_posts WHERE client_id = $1",
    )
    .bind(client_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Returns all children of a post, ordered by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_post_children(
    pool: &PgPool,
    post_id: &str,
) -> Result<Vec<PostChildRow>, DbError> {
    let rows = sqlx::query_as::<_, PostChildRow>(
        "SELECT id, post_id, client_id, media_type, media_url, thumbnail_url, timestamp \
         FROM instagram_post_children \
         WHERE post_id = $1 \
         ORDER BY id",
    )
    .bind(post_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
