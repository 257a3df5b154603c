use anyhow::{Context, Result};
use sqlx::SqlitePool;

use super::models::{NewPost, StoredPost, UpsertOutcome};

/// Get a post by its permalink.
pub async fn get_post_by_url(pool: &SqlitePool, post_url: &str) -> Result<Option<StoredPost>> {
    sqlx::query_as("SELECT * FROM posts WHERE post_url = ?")
        .bind(post_url)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch post by url")
}

/// Check whether a post with this permalink is already stored.
pub async fn post_exists(pool: &SqlitePool, post_url: &str) -> Result<bool> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM posts WHERE post_url = ? LIMIT 1")
        .bind(post_url)
        .fetch_optional(pool)
        .await
        .context("Failed to check post existence")?;

    Ok(row.is_some())
}

/// Insert a post, or refresh every column except `created_at` if the permalink exists.
pub async fn upsert_post(pool: &SqlitePool, post: &NewPost) -> Result<UpsertOutcome> {
    let existed = post_exists(pool, &post.post_url).await?;

    sqlx::query(
        r"
        INSERT INTO posts (date, author, author_url, post_url, text_snippet, full_text, score, likes, comments)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(post_url) DO UPDATE SET
            date = excluded.date,
            author = excluded.author,
            author_url = excluded.author_url,
            text_snippet = excluded.text_snippet,
            full_text = excluded.full_text,
            score = excluded.score,
            likes = excluded.likes,
            comments = excluded.comments,
            updated_at = datetime('now')
        ",
    )
    .bind(&post.date)
    .bind(&post.author)
    .bind(&post.author_url)
    .bind(&post.post_url)
    .bind(&post.text_snippet)
    .bind(&post.full_text)
    .bind(post.score)
    .bind(post.likes)
    .bind(post.comments)
    .execute(pool)
    .await
    .context("Failed to upsert post")?;

    Ok(if existed {
        UpsertOutcome::Updated
    } else {
        UpsertOutcome::Inserted
    })
}

/// Most recently first-seen posts.
pub async fn get_recent_posts(pool: &SqlitePool, limit: i64) -> Result<Vec<StoredPost>> {
    sqlx::query_as("SELECT * FROM posts ORDER BY created_at DESC, id DESC LIMIT ?")
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("Failed to fetch recent posts")
}

/// Highest-scoring stored posts.
pub async fn get_top_posts(pool: &SqlitePool, limit: i64) -> Result<Vec<StoredPost>> {
    sqlx::query_as("SELECT * FROM posts ORDER BY score DESC, id ASC LIMIT ?")
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("Failed to fetch top posts")
}

/// Count stored posts.
pub async fn count_posts(pool: &SqlitePool) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts")
        .fetch_one(pool)
        .await
        .context("Failed to count posts")?;

    Ok(count)
}
