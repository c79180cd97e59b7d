/// Database access layer
///
/// One repository trait per entity, gathered into [`BlogStore`]. Two
/// implementations exist:
/// - [`PgStore`]: PostgreSQL via sqlx, referential rules enforced by
///   foreign keys in `migrations/`
/// - [`MemoryStore`]: process-local tables for development and tests, with
///   the same cascade / set-null rules applied in code
pub mod category_repo;
pub mod comment_repo;
pub mod location_repo;
pub mod memory;
pub mod pg_store;
pub mod post_repo;
pub mod user_repo;

pub use memory::MemoryStore;
pub use pg_store::PgStore;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    Category, Comment, CommentDraft, CommentView, Location, NewCategory, NewLocation, Post,
    PostCard, PostDraft, User,
};
use crate::pagination::PageWindow;
use crate::services::visibility::PostQuery;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user_by_id(&self, user_id: i64) -> Result<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn create_user(&self, username: &str) -> Result<User>;

    /// Deletes the user together with their posts and comments.
    async fn delete_user(&self, user_id: i64) -> Result<bool>;
}

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Published category by slug; unpublished ones are treated as absent.
    async fn find_published_category(&self, slug: &str) -> Result<Option<Category>>;

    /// All categories ordered by title.
    async fn list_categories(&self) -> Result<Vec<Category>>;

    async fn create_category(&self, new: NewCategory) -> Result<Category>;

    async fn set_category_published(&self, category_id: i64, is_published: bool)
        -> Result<bool>;

    /// Deletes the category; posts keep existing with no category.
    async fn delete_category(&self, category_id: i64) -> Result<bool>;
}

#[async_trait]
pub trait LocationRepository: Send + Sync {
    /// All locations ordered by name.
    async fn list_locations(&self) -> Result<Vec<Location>>;

    async fn create_location(&self, new: NewLocation) -> Result<Location>;

    /// Deletes the location; posts keep existing with no location.
    async fn delete_location(&self, location_id: i64) -> Result<bool>;
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn find_post(&self, post_id: i64) -> Result<Option<Post>>;

    /// Joined feed entry regardless of visibility.
    async fn find_post_card(&self, post_id: i64) -> Result<Option<PostCard>>;

    async fn count_posts(&self, query: &PostQuery) -> Result<u64>;

    /// Entries ordered by pub_date desc, created_at desc.
    async fn list_posts(&self, query: &PostQuery, window: PageWindow) -> Result<Vec<PostCard>>;

    async fn insert_post(&self, author_id: i64, draft: &PostDraft) -> Result<Post>;

    async fn update_post(&self, post_id: i64, draft: &PostDraft) -> Result<Option<Post>>;

    /// Deletes the post and its comments.
    async fn delete_post(&self, post_id: i64) -> Result<bool>;
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Comments of a post, oldest first.
    async fn list_comments(&self, post_id: i64) -> Result<Vec<CommentView>>;

    /// Comment by id, only if it belongs to `post_id`.
    async fn find_comment(&self, post_id: i64, comment_id: i64) -> Result<Option<Comment>>;

    async fn insert_comment(
        &self,
        post_id: i64,
        author_id: i64,
        draft: &CommentDraft,
    ) -> Result<Comment>;

    async fn update_comment(&self, comment_id: i64, draft: &CommentDraft)
        -> Result<Option<Comment>>;

    async fn delete_comment(&self, comment_id: i64) -> Result<bool>;
}

/// Everything the handlers need from storage.
#[async_trait]
pub trait BlogStore:
    UserRepository + CategoryRepository + LocationRepository + PostRepository + CommentRepository
{
    /// Cheap round trip used by the readiness probe.
    async fn ping(&self) -> Result<()>;
}
