use crate::models::{Category, NewCategory};
use sqlx::PgPool;

/// Find a published category by slug
pub async fn find_published_by_slug(
    pool: &PgPool,
    slug: &str,
) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(
        r#"
        SELECT id, title, description, slug, is_published, created_at
        FROM categories
        WHERE slug = $1 AND is_published = TRUE
        "#,
    )
    .bind(slug)
    .fetch_optional(pool)
    .await
}

/// All categories, alphabetical by title
pub async fn list_categories(pool: &PgPool) -> Result<Vec<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(
        r#"
        SELECT id, title, description, slug, is_published, created_at
        FROM categories
        ORDER BY title ASC, id ASC
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn create_category(pool: &PgPool, new: &NewCategory) -> Result<Category, sqlx::Error> {
    sqlx::query_as::<_, Category>(
        r#"
        INSERT INTO categories (title, description, slug, is_published)
        VALUES ($1, $2, $3, $4)
        RETURNING id, title, description, slug, is_published, created_at
        "#,
    )
    .bind(&new.title)
    .bind(&new.description)
    .bind(&new.slug)
    .bind(new.is_published)
    .fetch_one(pool)
    .await
}

pub async fn set_published(
    pool: &PgPool,
    category_id: i64,
    is_published: bool,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE categories SET is_published = $1 WHERE id = $2")
        .bind(is_published)
        .bind(category_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete a category; referencing posts are set to NULL by the foreign key
pub async fn delete_category(pool: &PgPool, category_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(category_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
