use crate::models::{CategoryRef, LocationRef, Post, PostCard, PostDraft};
use crate::pagination::PageWindow;
use crate::services::visibility::{FeedScope, PostQuery, Visibility};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

const POST_COLUMNS: &str = "id, title, text, pub_date, is_published, created_at, image, \
                            author_id, category_id, location_id";

const POST_CARD_SELECT: &str = r#"
    SELECT p.id, p.title, p.text, p.pub_date, p.is_published, p.created_at, p.image,
           p.author_id, p.category_id, p.location_id,
           u.username AS author_username,
           c.title AS category_title,
           c.slug AS category_slug,
           c.is_published AS category_is_published,
           l.name AS location_name,
           l.is_published AS location_is_published,
           (SELECT COUNT(*) FROM comments cm WHERE cm.post_id = p.id) AS comment_count
    FROM posts p
    JOIN users u ON u.id = p.author_id
    LEFT JOIN categories c ON c.id = p.category_id
    LEFT JOIN locations l ON l.id = p.location_id
"#;

/// Flat row behind [`PostCard`]; LEFT JOIN columns are nullable.
#[derive(Debug, FromRow)]
struct PostCardRow {
    id: i64,
    title: String,
    text: String,
    pub_date: chrono::DateTime<chrono::Utc>,
    is_published: bool,
    created_at: chrono::DateTime<chrono::Utc>,
    image: Option<String>,
    author_id: i64,
    category_id: Option<i64>,
    location_id: Option<i64>,
    author_username: String,
    category_title: Option<String>,
    category_slug: Option<String>,
    category_is_published: Option<bool>,
    location_name: Option<String>,
    location_is_published: Option<bool>,
    comment_count: i64,
}

impl From<PostCardRow> for PostCard {
    fn from(row: PostCardRow) -> Self {
        let category = match (
            row.category_id,
            row.category_title,
            row.category_slug,
            row.category_is_published,
        ) {
            (Some(id), Some(title), Some(slug), Some(is_published)) => Some(CategoryRef {
                id,
                title,
                slug,
                is_published,
            }),
            _ => None,
        };
        let location = match (row.location_id, row.location_name, row.location_is_published) {
            (Some(id), Some(name), Some(is_published)) => Some(LocationRef {
                id,
                name,
                is_published,
            }),
            _ => None,
        };

        PostCard {
            post: Post {
                id: row.id,
                title: row.title,
                text: row.text,
                pub_date: row.pub_date,
                is_published: row.is_published,
                created_at: row.created_at,
                image: row.image,
                author_id: row.author_id,
                category_id: row.category_id,
                location_id: row.location_id,
            },
            author_username: row.author_username,
            category,
            location,
            comment_count: row.comment_count,
        }
    }
}

/// Append the WHERE clause for a feed query. Mirrors `is_publicly_visible`.
fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &PostQuery) {
    qb.push(" WHERE TRUE");

    match query.scope {
        FeedScope::All => {}
        FeedScope::Category(category_id) => {
            qb.push(" AND p.category_id = ").push_bind(category_id);
        }
        FeedScope::Author(author_id) => {
            qb.push(" AND p.author_id = ").push_bind(author_id);
        }
    }

    if let Visibility::Public { now } = query.visibility {
        qb.push(" AND p.is_published = TRUE AND p.pub_date <= ")
            .push_bind(now)
            .push(" AND c.is_published = TRUE");
    }
}

/// Find a post by ID
pub async fn find_post_by_id(pool: &PgPool, post_id: i64) -> Result<Option<Post>, sqlx::Error> {
    sqlx::query_as::<_, Post>(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1"))
        .bind(post_id)
        .fetch_optional(pool)
        .await
}

/// Find a post joined with author, taxonomy and comment count
pub async fn find_post_card(pool: &PgPool, post_id: i64) -> Result<Option<PostCard>, sqlx::Error> {
    let row = sqlx::query_as::<_, PostCardRow>(&format!("{POST_CARD_SELECT} WHERE p.id = $1"))
        .bind(post_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(PostCard::from))
}

/// Count posts matching a feed query
pub async fn count_posts(pool: &PgPool, query: &PostQuery) -> Result<i64, sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new(
        "SELECT COUNT(*) FROM posts p LEFT JOIN categories c ON c.id = p.category_id",
    );
    push_filters(&mut qb, query);

    let (count,): (i64,) = qb.build_query_as().fetch_one(pool).await?;
    Ok(count)
}

/// One page of a feed, newest publication first
pub async fn list_posts(
    pool: &PgPool,
    query: &PostQuery,
    window: PageWindow,
) -> Result<Vec<PostCard>, sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new(POST_CARD_SELECT);
    push_filters(&mut qb, query);
    qb.push(" ORDER BY p.pub_date DESC, p.created_at DESC, p.id DESC LIMIT ")
        .push_bind(window.limit as i64)
        .push(" OFFSET ")
        .push_bind(window.offset as i64);

    let rows = qb.build_query_as::<PostCardRow>().fetch_all(pool).await?;
    Ok(rows.into_iter().map(PostCard::from).collect())
}

/// Create a new post owned by `author_id`
pub async fn create_post(
    pool: &PgPool,
    author_id: i64,
    draft: &PostDraft,
) -> Result<Post, sqlx::Error> {
    sqlx::query_as::<_, Post>(&format!(
        r#"
        INSERT INTO posts (title, text, pub_date, is_published, image,
                           author_id, category_id, location_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {POST_COLUMNS}
        "#
    ))
    .bind(&draft.title)
    .bind(&draft.text)
    .bind(draft.pub_date)
    .bind(draft.is_published)
    .bind(&draft.image)
    .bind(author_id)
    .bind(draft.category_id)
    .bind(draft.location_id)
    .fetch_one(pool)
    .await
}

/// Overwrite the editable fields of a post
pub async fn update_post(
    pool: &PgPool,
    post_id: i64,
    draft: &PostDraft,
) -> Result<Option<Post>, sqlx::Error> {
    sqlx::query_as::<_, Post>(&format!(
        r#"
        UPDATE posts
        SET title = $1, text = $2, pub_date = $3, is_published = $4, image = $5,
            category_id = $6, location_id = $7
        WHERE id = $8
        RETURNING {POST_COLUMNS}
        "#
    ))
    .bind(&draft.title)
    .bind(&draft.text)
    .bind(draft.pub_date)
    .bind(draft.is_published)
    .bind(&draft.image)
    .bind(draft.category_id)
    .bind(draft.location_id)
    .bind(post_id)
    .fetch_optional(pool)
    .await
}

/// Delete a post; comments go with it via ON DELETE CASCADE
pub async fn delete_post(pool: &PgPool, post_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(post_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
