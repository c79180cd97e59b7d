use crate::models::{Location, NewLocation};
use sqlx::PgPool;

/// All locations, alphabetical by name
pub async fn list_locations(pool: &PgPool) -> Result<Vec<Location>, sqlx::Error> {
    sqlx::query_as::<_, Location>(
        r#"
        SELECT id, name, is_published, created_at
        FROM locations
        ORDER BY name ASC, id ASC
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn create_location(pool: &PgPool, new: &NewLocation) -> Result<Location, sqlx::Error> {
    sqlx::query_as::<_, Location>(
        r#"
        INSERT INTO locations (name, is_published)
        VALUES ($1, $2)
        RETURNING id, name, is_published, created_at
        "#,
    )
    .bind(&new.name)
    .bind(new.is_published)
    .fetch_one(pool)
    .await
}

/// Delete a location; referencing posts are set to NULL by the foreign key
pub async fn delete_location(pool: &PgPool, location_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM locations WHERE id = $1")
        .bind(location_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
