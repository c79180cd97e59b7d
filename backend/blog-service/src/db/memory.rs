//! In-process [`BlogStore`] used for local development and the HTTP tests.
//!
//! All tables sit behind one lock so that cascades are applied atomically,
//! the same way the foreign keys in `migrations/` behave in PostgreSQL.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{
    BlogStore, CategoryRepository, CommentRepository, LocationRepository, PostRepository,
    UserRepository,
};
use crate::error::{AppError, Result};
use crate::models::{
    Category, CategoryRef, Comment, CommentDraft, CommentView, Location, LocationRef, NewCategory,
    NewLocation, Post, PostCard, PostDraft, User,
};
use crate::pagination::PageWindow;
use crate::services::visibility::PostQuery;

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    categories: BTreeMap<i64, Category>,
    locations: BTreeMap<i64, Location>,
    posts: BTreeMap<i64, Post>,
    comments: BTreeMap<i64, Comment>,
    last_id: i64,
}

impl Tables {
    /// Ids are unique across tables, which is fine for BIGSERIAL semantics.
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn card(&self, post: &Post) -> Option<PostCard> {
        let author = self.users.get(&post.author_id)?;
        let category = post
            .category_id
            .and_then(|id| self.categories.get(&id))
            .map(|c| CategoryRef {
                id: c.id,
                title: c.title.clone(),
                slug: c.slug.clone(),
                is_published: c.is_published,
            });
        let location = post
            .location_id
            .and_then(|id| self.locations.get(&id))
            .map(|l| LocationRef {
                id: l.id,
                name: l.name.clone(),
                is_published: l.is_published,
            });
        let comment_count = self
            .comments
            .values()
            .filter(|c| c.post_id == post.id)
            .count() as i64;

        Some(PostCard {
            post: post.clone(),
            author_username: author.username.clone(),
            category,
            location,
            comment_count,
        })
    }

    fn matching_cards(&self, query: &PostQuery) -> Vec<PostCard> {
        let mut cards: Vec<PostCard> = self
            .posts
            .values()
            .filter_map(|post| self.card(post))
            .filter(|card| query.matches(card))
            .collect();
        cards.sort_by(|a, b| {
            b.post
                .pub_date
                .cmp(&a.post.pub_date)
                .then(b.post.created_at.cmp(&a.post.created_at))
                .then(b.post.id.cmp(&a.post.id))
        });
        cards
    }

    fn check_references(&self, author_id: i64, draft: &PostDraft) -> Result<()> {
        if !self.users.contains_key(&author_id) {
            return Err(AppError::Database(format!(
                "posts.author_id references missing user {}",
                author_id
            )));
        }
        if let Some(id) = draft.category_id.filter(|id| !self.categories.contains_key(id)) {
            return Err(AppError::Database(format!(
                "posts.category_id references missing category {}",
                id
            )));
        }
        if let Some(id) = draft.location_id.filter(|id| !self.locations.contains_key(id)) {
            return Err(AppError::Database(format!(
                "posts.location_id references missing location {}",
                id
            )));
        }
        Ok(())
    }

    fn remove_post(&mut self, post_id: i64) -> bool {
        let removed = self.posts.remove(&post_id).is_some();
        if removed {
            self.comments.retain(|_, c| c.post_id != post_id);
        }
        removed
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_user_by_id(&self, user_id: i64) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.get(&user_id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create_user(&self, username: &str) -> Result<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == username) {
            return Err(AppError::Conflict(format!(
                "username '{}' already exists",
                username
            )));
        }
        let user = User {
            id: tables.next_id(),
            username: username.to_string(),
            date_joined: Utc::now(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete_user(&self, user_id: i64) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if tables.users.remove(&user_id).is_none() {
            return Ok(false);
        }

        let owned_posts: Vec<i64> = tables
            .posts
            .values()
            .filter(|p| p.author_id == user_id)
            .map(|p| p.id)
            .collect();
        for post_id in owned_posts {
            tables.remove_post(post_id);
        }
        tables.comments.retain(|_, c| c.author_id != user_id);
        Ok(true)
    }
}

#[async_trait]
impl CategoryRepository for MemoryStore {
    async fn find_published_category(&self, slug: &str) -> Result<Option<Category>> {
        let tables = self.tables.read().await;
        Ok(tables
            .categories
            .values()
            .find(|c| c.slug == slug && c.is_published)
            .cloned())
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let tables = self.tables.read().await;
        let mut categories: Vec<Category> = tables.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(categories)
    }

    async fn create_category(&self, new: NewCategory) -> Result<Category> {
        let mut tables = self.tables.write().await;
        if tables.categories.values().any(|c| c.slug == new.slug) {
            return Err(AppError::Conflict(format!(
                "category slug '{}' already exists",
                new.slug
            )));
        }
        let category = Category {
            id: tables.next_id(),
            title: new.title,
            description: new.description,
            slug: new.slug,
            is_published: new.is_published,
            created_at: Utc::now(),
        };
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn set_category_published(&self, category_id: i64, is_published: bool) -> Result<bool> {
        let mut tables = self.tables.write().await;
        Ok(match tables.categories.get_mut(&category_id) {
            Some(category) => {
                category.is_published = is_published;
                true
            }
            None => false,
        })
    }

    async fn delete_category(&self, category_id: i64) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if tables.categories.remove(&category_id).is_none() {
            return Ok(false);
        }
        for post in tables.posts.values_mut() {
            if post.category_id == Some(category_id) {
                post.category_id = None;
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl LocationRepository for MemoryStore {
    async fn list_locations(&self) -> Result<Vec<Location>> {
        let tables = self.tables.read().await;
        let mut locations: Vec<Location> = tables.locations.values().cloned().collect();
        locations.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(locations)
    }

    async fn create_location(&self, new: NewLocation) -> Result<Location> {
        let mut tables = self.tables.write().await;
        let location = Location {
            id: tables.next_id(),
            name: new.name,
            is_published: new.is_published,
            created_at: Utc::now(),
        };
        tables.locations.insert(location.id, location.clone());
        Ok(location)
    }

    async fn delete_location(&self, location_id: i64) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if tables.locations.remove(&location_id).is_none() {
            return Ok(false);
        }
        for post in tables.posts.values_mut() {
            if post.location_id == Some(location_id) {
                post.location_id = None;
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn find_post(&self, post_id: i64) -> Result<Option<Post>> {
        Ok(self.tables.read().await.posts.get(&post_id).cloned())
    }

    async fn find_post_card(&self, post_id: i64) -> Result<Option<PostCard>> {
        let tables = self.tables.read().await;
        Ok(tables.posts.get(&post_id).and_then(|p| tables.card(p)))
    }

    async fn count_posts(&self, query: &PostQuery) -> Result<u64> {
        let tables = self.tables.read().await;
        Ok(tables.matching_cards(query).len() as u64)
    }

    async fn list_posts(&self, query: &PostQuery, window: PageWindow) -> Result<Vec<PostCard>> {
        let tables = self.tables.read().await;
        Ok(window.slice(tables.matching_cards(query)))
    }

    async fn insert_post(&self, author_id: i64, draft: &PostDraft) -> Result<Post> {
        let mut tables = self.tables.write().await;
        tables.check_references(author_id, draft)?;

        let post = Post {
            id: tables.next_id(),
            title: draft.title.clone(),
            text: draft.text.clone(),
            pub_date: draft.pub_date,
            is_published: draft.is_published,
            created_at: Utc::now(),
            image: draft.image.clone(),
            author_id,
            category_id: draft.category_id,
            location_id: draft.location_id,
        };
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update_post(&self, post_id: i64, draft: &PostDraft) -> Result<Option<Post>> {
        let mut tables = self.tables.write().await;
        let author_id = match tables.posts.get(&post_id) {
            Some(post) => post.author_id,
            None => return Ok(None),
        };
        tables.check_references(author_id, draft)?;

        let Some(post) = tables.posts.get_mut(&post_id) else {
            return Ok(None);
        };
        post.title = draft.title.clone();
        post.text = draft.text.clone();
        post.pub_date = draft.pub_date;
        post.is_published = draft.is_published;
        post.image = draft.image.clone();
        post.category_id = draft.category_id;
        post.location_id = draft.location_id;
        Ok(Some(post.clone()))
    }

    async fn delete_post(&self, post_id: i64) -> Result<bool> {
        Ok(self.tables.write().await.remove_post(post_id))
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn list_comments(&self, post_id: i64) -> Result<Vec<CommentView>> {
        let tables = self.tables.read().await;
        let mut comments: Vec<CommentView> = tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .filter_map(|c| {
                let author = tables.users.get(&c.author_id)?;
                Some(CommentView {
                    comment: c.clone(),
                    author_username: author.username.clone(),
                })
            })
            .collect();
        comments.sort_by(|a, b| {
            a.comment
                .created_at
                .cmp(&b.comment.created_at)
                .then(a.comment.id.cmp(&b.comment.id))
        });
        Ok(comments)
    }

    async fn find_comment(&self, post_id: i64, comment_id: i64) -> Result<Option<Comment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .comments
            .get(&comment_id)
            .filter(|c| c.post_id == post_id)
            .cloned())
    }

    async fn insert_comment(
        &self,
        post_id: i64,
        author_id: i64,
        draft: &CommentDraft,
    ) -> Result<Comment> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&post_id) || !tables.users.contains_key(&author_id) {
            return Err(AppError::Database(format!(
                "comment references missing post {} or user {}",
                post_id, author_id
            )));
        }
        let comment = Comment {
            id: tables.next_id(),
            post_id,
            author_id,
            text: draft.text.clone(),
            created_at: Utc::now(),
        };
        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn update_comment(
        &self,
        comment_id: i64,
        draft: &CommentDraft,
    ) -> Result<Option<Comment>> {
        let mut tables = self.tables.write().await;
        Ok(tables.comments.get_mut(&comment_id).map(|comment| {
            comment.text = draft.text.clone();
            comment.clone()
        }))
    }

    async fn delete_comment(&self, comment_id: i64) -> Result<bool> {
        Ok(self
            .tables
            .write()
            .await
            .comments
            .remove(&comment_id)
            .is_some())
    }
}

#[async_trait]
impl BlogStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::visibility::FeedScope;
    use chrono::Duration;

    async fn seed_category(store: &MemoryStore, slug: &str, is_published: bool) -> Category {
        store
            .create_category(NewCategory {
                title: slug.to_uppercase(),
                description: format!("{} posts", slug),
                slug: slug.to_string(),
                is_published,
            })
            .await
            .unwrap()
    }

    fn draft(title: &str, category_id: i64, hours_ago: i64) -> PostDraft {
        PostDraft {
            title: title.to_string(),
            text: "body".to_string(),
            pub_date: Utc::now() - Duration::hours(hours_ago),
            is_published: true,
            image: None,
            category_id: Some(category_id),
            location_id: None,
        }
    }

    fn window(limit: u64) -> PageWindow {
        PageWindow {
            number: 1,
            offset: 0,
            limit,
        }
    }

    #[tokio::test]
    async fn test_feed_is_ordered_newest_first() {
        let store = MemoryStore::new();
        let alice = store.create_user("alice").await.unwrap();
        let travel = seed_category(&store, "travel", true).await;

        store.insert_post(alice.id, &draft("old", travel.id, 5)).await.unwrap();
        store.insert_post(alice.id, &draft("new", travel.id, 1)).await.unwrap();
        store.insert_post(alice.id, &draft("mid", travel.id, 3)).await.unwrap();

        let query = PostQuery::public(FeedScope::All, Utc::now());
        let titles: Vec<String> = store
            .list_posts(&query, window(10))
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.post.title)
            .collect();
        assert_eq!(titles, vec!["new", "mid", "old"]);
        assert_eq!(store.count_posts(&query).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_deleting_user_cascades_to_posts_and_comments() {
        let store = MemoryStore::new();
        let alice = store.create_user("alice").await.unwrap();
        let bob = store.create_user("bob").await.unwrap();
        let travel = seed_category(&store, "travel", true).await;

        let alice_post = store.insert_post(alice.id, &draft("a", travel.id, 1)).await.unwrap();
        let bob_post = store.insert_post(bob.id, &draft("b", travel.id, 1)).await.unwrap();
        let text = CommentDraft { text: "hi".into() };
        store.insert_comment(alice_post.id, bob.id, &text).await.unwrap();
        store.insert_comment(bob_post.id, alice.id, &text).await.unwrap();
        store.insert_comment(bob_post.id, bob.id, &text).await.unwrap();

        assert!(store.delete_user(alice.id).await.unwrap());

        assert!(store.find_post(alice_post.id).await.unwrap().is_none());
        assert!(store.list_comments(alice_post.id).await.unwrap().is_empty());
        let remaining = store.list_comments(bob_post.id).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].author_username, "bob");
    }

    #[tokio::test]
    async fn test_deleting_category_and_location_nulls_references() {
        let store = MemoryStore::new();
        let alice = store.create_user("alice").await.unwrap();
        let travel = seed_category(&store, "travel", true).await;
        let island = store
            .create_location(NewLocation {
                name: "Island".into(),
                is_published: true,
            })
            .await
            .unwrap();

        let mut with_location = draft("trip", travel.id, 1);
        with_location.location_id = Some(island.id);
        let post = store.insert_post(alice.id, &with_location).await.unwrap();

        assert!(store.delete_category(travel.id).await.unwrap());
        assert!(store.delete_location(island.id).await.unwrap());

        let post = store.find_post(post.id).await.unwrap().unwrap();
        assert_eq!(post.category_id, None);
        assert_eq!(post.location_id, None);

        // No category means no longer public, but the author still sees it.
        let public = PostQuery::public(FeedScope::Author(alice.id), Utc::now());
        assert_eq!(store.count_posts(&public).await.unwrap(), 0);
        let own = PostQuery::unrestricted(FeedScope::Author(alice.id));
        assert_eq!(store.count_posts(&own).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unique_slug_and_username() {
        let store = MemoryStore::new();
        store.create_user("alice").await.unwrap();
        assert!(matches!(
            store.create_user("alice").await,
            Err(AppError::Conflict(_))
        ));

        seed_category(&store, "travel", true).await;
        assert!(matches!(
            store
                .create_category(NewCategory {
                    title: "Again".into(),
                    description: String::new(),
                    slug: "travel".into(),
                    is_published: false,
                })
                .await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_find_comment_requires_matching_post() {
        let store = MemoryStore::new();
        let alice = store.create_user("alice").await.unwrap();
        let travel = seed_category(&store, "travel", true).await;
        let first = store.insert_post(alice.id, &draft("1", travel.id, 1)).await.unwrap();
        let second = store.insert_post(alice.id, &draft("2", travel.id, 1)).await.unwrap();
        let comment = store
            .insert_comment(first.id, alice.id, &CommentDraft { text: "x".into() })
            .await
            .unwrap();

        assert!(store.find_comment(first.id, comment.id).await.unwrap().is_some());
        assert!(store.find_comment(second.id, comment.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unpublished_category_hidden_from_public_feed() {
        let store = MemoryStore::new();
        let alice = store.create_user("alice").await.unwrap();
        let drafts = seed_category(&store, "drafts", true).await;
        store.insert_post(alice.id, &draft("p", drafts.id, 1)).await.unwrap();

        let query = PostQuery::public(FeedScope::All, Utc::now());
        assert_eq!(store.count_posts(&query).await.unwrap(), 1);

        store.set_category_published(drafts.id, false).await.unwrap();
        assert_eq!(store.count_posts(&query).await.unwrap(), 0);
        assert!(store.find_published_category("drafts").await.unwrap().is_none());
    }
}
