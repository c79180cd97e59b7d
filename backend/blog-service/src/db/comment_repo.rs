use crate::models::{Comment, CommentDraft, CommentView};
use sqlx::{FromRow, PgPool};

#[derive(Debug, FromRow)]
struct CommentViewRow {
    id: i64,
    post_id: i64,
    author_id: i64,
    text: String,
    created_at: chrono::DateTime<chrono::Utc>,
    author_username: String,
}

impl From<CommentViewRow> for CommentView {
    fn from(row: CommentViewRow) -> Self {
        CommentView {
            comment: Comment {
                id: row.id,
                post_id: row.post_id,
                author_id: row.author_id,
                text: row.text,
                created_at: row.created_at,
            },
            author_username: row.author_username,
        }
    }
}

/// Create a new comment on a post
pub async fn create_comment(
    pool: &PgPool,
    post_id: i64,
    author_id: i64,
    text: &str,
) -> Result<Comment, sqlx::Error> {
    sqlx::query_as::<_, Comment>(
        r#"
        INSERT INTO comments (post_id, author_id, text)
        VALUES ($1, $2, $3)
        RETURNING id, post_id, author_id, text, created_at
        "#,
    )
    .bind(post_id)
    .bind(author_id)
    .bind(text)
    .fetch_one(pool)
    .await
}

/// All comments for a post, oldest first
pub async fn get_comments_by_post(
    pool: &PgPool,
    post_id: i64,
) -> Result<Vec<CommentView>, sqlx::Error> {
    let rows = sqlx::query_as::<_, CommentViewRow>(
        r#"
        SELECT cm.id, cm.post_id, cm.author_id, cm.text, cm.created_at,
               u.username AS author_username
        FROM comments cm
        JOIN users u ON u.id = cm.author_id
        WHERE cm.post_id = $1
        ORDER BY cm.created_at ASC, cm.id ASC
        "#,
    )
    .bind(post_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(CommentView::from).collect())
}

/// Get a comment by ID within a post
pub async fn find_comment_in_post(
    pool: &PgPool,
    post_id: i64,
    comment_id: i64,
) -> Result<Option<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(
        r#"
        SELECT id, post_id, author_id, text, created_at
        FROM comments
        WHERE id = $1 AND post_id = $2
        "#,
    )
    .bind(comment_id)
    .bind(post_id)
    .fetch_optional(pool)
    .await
}

/// Update comment text
pub async fn update_comment(
    pool: &PgPool,
    comment_id: i64,
    draft: &CommentDraft,
) -> Result<Option<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(
        r#"
        UPDATE comments
        SET text = $1
        WHERE id = $2
        RETURNING id, post_id, author_id, text, created_at
        "#,
    )
    .bind(&draft.text)
    .bind(comment_id)
    .fetch_optional(pool)
    .await
}

/// Delete a comment
pub async fn delete_comment(pool: &PgPool, comment_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(comment_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
