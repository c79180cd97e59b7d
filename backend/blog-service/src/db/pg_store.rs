//! [`BlogStore`] backed by PostgreSQL.

use async_trait::async_trait;
use sqlx::PgPool;

use super::{
    category_repo, comment_repo, location_repo, post_repo, user_repo, BlogStore,
    CategoryRepository, CommentRepository, LocationRepository, PostRepository, UserRepository,
};
use crate::error::Result;
use crate::models::{
    Category, Comment, CommentDraft, CommentView, Location, NewCategory, NewLocation, Post,
    PostCard, PostDraft, User,
};
use crate::pagination::PageWindow;
use crate::services::visibility::PostQuery;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the embedded migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Database migrations completed successfully");
        Ok(())
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn find_user_by_id(&self, user_id: i64) -> Result<Option<User>> {
        Ok(user_repo::find_user_by_id(&self.pool, user_id).await?)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(user_repo::find_user_by_username(&self.pool, username).await?)
    }

    async fn create_user(&self, username: &str) -> Result<User> {
        Ok(user_repo::create_user(&self.pool, username).await?)
    }

    async fn delete_user(&self, user_id: i64) -> Result<bool> {
        Ok(user_repo::delete_user(&self.pool, user_id).await?)
    }
}

#[async_trait]
impl CategoryRepository for PgStore {
    async fn find_published_category(&self, slug: &str) -> Result<Option<Category>> {
        Ok(category_repo::find_published_by_slug(&self.pool, slug).await?)
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        Ok(category_repo::list_categories(&self.pool).await?)
    }

    async fn create_category(&self, new: NewCategory) -> Result<Category> {
        Ok(category_repo::create_category(&self.pool, &new).await?)
    }

    async fn set_category_published(&self, category_id: i64, is_published: bool) -> Result<bool> {
        Ok(category_repo::set_published(&self.pool, category_id, is_published).await?)
    }

    async fn delete_category(&self, category_id: i64) -> Result<bool> {
        Ok(category_repo::delete_category(&self.pool, category_id).await?)
    }
}

#[async_trait]
impl LocationRepository for PgStore {
    async fn list_locations(&self) -> Result<Vec<Location>> {
        Ok(location_repo::list_locations(&self.pool).await?)
    }

    async fn create_location(&self, new: NewLocation) -> Result<Location> {
        Ok(location_repo::create_location(&self.pool, &new).await?)
    }

    async fn delete_location(&self, location_id: i64) -> Result<bool> {
        Ok(location_repo::delete_location(&self.pool, location_id).await?)
    }
}

#[async_trait]
impl PostRepository for PgStore {
    async fn find_post(&self, post_id: i64) -> Result<Option<Post>> {
        Ok(post_repo::find_post_by_id(&self.pool, post_id).await?)
    }

    async fn find_post_card(&self, post_id: i64) -> Result<Option<PostCard>> {
        Ok(post_repo::find_post_card(&self.pool, post_id).await?)
    }

    async fn count_posts(&self, query: &PostQuery) -> Result<u64> {
        let count = post_repo::count_posts(&self.pool, query).await?;
        Ok(count.max(0) as u64)
    }

    async fn list_posts(&self, query: &PostQuery, window: PageWindow) -> Result<Vec<PostCard>> {
        Ok(post_repo::list_posts(&self.pool, query, window).await?)
    }

    async fn insert_post(&self, author_id: i64, draft: &PostDraft) -> Result<Post> {
        Ok(post_repo::create_post(&self.pool, author_id, draft).await?)
    }

    async fn update_post(&self, post_id: i64, draft: &PostDraft) -> Result<Option<Post>> {
        Ok(post_repo::update_post(&self.pool, post_id, draft).await?)
    }

    async fn delete_post(&self, post_id: i64) -> Result<bool> {
        Ok(post_repo::delete_post(&self.pool, post_id).await?)
    }
}

#[async_trait]
impl CommentRepository for PgStore {
    async fn list_comments(&self, post_id: i64) -> Result<Vec<CommentView>> {
        Ok(comment_repo::get_comments_by_post(&self.pool, post_id).await?)
    }

    async fn find_comment(&self, post_id: i64, comment_id: i64) -> Result<Option<Comment>> {
        Ok(comment_repo::find_comment_in_post(&self.pool, post_id, comment_id).await?)
    }

    async fn insert_comment(
        &self,
        post_id: i64,
        author_id: i64,
        draft: &CommentDraft,
    ) -> Result<Comment> {
        Ok(comment_repo::create_comment(&self.pool, post_id, author_id, &draft.text).await?)
    }

    async fn update_comment(
        &self,
        comment_id: i64,
        draft: &CommentDraft,
    ) -> Result<Option<Comment>> {
        Ok(comment_repo::update_comment(&self.pool, comment_id, draft).await?)
    }

    async fn delete_comment(&self, comment_id: i64) -> Result<bool> {
        Ok(comment_repo::delete_comment(&self.pool, comment_id).await?)
    }
}

#[async_trait]
impl BlogStore for PgStore {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
