/// Post service - feeds, detail authorization and post mutations
use chrono::SubsecRound;
use std::sync::Arc;

use crate::db::{
    BlogStore, CategoryRepository, CommentRepository, LocationRepository, PostRepository,
    UserRepository,
};
use crate::error::{AppError, Result};
use crate::forms::PostChoices;
use crate::metrics;
use crate::middleware::{ensure_owner, is_owner, AuthUser};
use crate::models::{Category, CommentView, Post, PostCard, PostDraft, User};
use crate::pagination::{Page, Paginator, POSTS_PER_PAGE};
use crate::routes;
use crate::services::visibility::{FeedScope, PostQuery, Visibility};

pub struct PostService {
    store: Arc<dyn BlogStore>,
}

impl PostService {
    pub fn new(store: Arc<dyn BlogStore>) -> Self {
        Self { store }
    }

    async fn feed(&self, query: PostQuery, requested: i64) -> Result<Page<PostCard>> {
        let total = self.store.count_posts(&query).await?;
        let paginator = Paginator::new(total, POSTS_PER_PAGE);
        let window = paginator.window(requested);
        let items = self.store.list_posts(&query, window).await?;
        Ok(paginator.page(window, items))
    }

    /// Publicly visible posts, newest first
    pub async fn home_feed(&self, requested: i64) -> Result<Page<PostCard>> {
        self.feed(PostQuery::public(FeedScope::All, chrono::Utc::now()), requested)
            .await
    }

    /// Publicly visible posts of a published category
    pub async fn category_feed(
        &self,
        slug: &str,
        requested: i64,
    ) -> Result<(Category, Page<PostCard>)> {
        let category = self
            .store
            .find_published_category(slug)
            .await?
            .ok_or_else(|| AppError::not_found(format!("category '{}'", slug)))?;

        let query = PostQuery::public(FeedScope::Category(category.id), chrono::Utc::now());
        let page = self.feed(query, requested).await?;
        Ok((category, page))
    }

    /// An author's posts; unrestricted when the viewer is the author
    pub async fn profile_feed(
        &self,
        username: &str,
        viewer: Option<&AuthUser>,
        requested: i64,
    ) -> Result<(User, Page<PostCard>)> {
        let profile = self
            .store
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| AppError::not_found(format!("user '{}'", username)))?;

        let scope = FeedScope::Author(profile.id);
        let query = if is_owner(viewer, profile.id) {
            PostQuery::unrestricted(scope)
        } else {
            PostQuery::public(scope, chrono::Utc::now())
        };
        let page = self.feed(query, requested).await?;
        Ok((profile, page))
    }

    /// Post with its comments. The author always sees it; everyone else only
    /// when it is publicly visible, otherwise it does not exist.
    pub async fn detail(
        &self,
        post_id: i64,
        viewer: Option<&AuthUser>,
    ) -> Result<(PostCard, Vec<CommentView>)> {
        let card = self
            .store
            .find_post_card(post_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("post {}", post_id)))?;

        if !is_owner(viewer, card.post.author_id) && !Visibility::public_now().admits(&card) {
            return Err(AppError::not_found(format!("post {}", post_id)));
        }

        let comments = self.store.list_comments(post_id).await?;
        Ok((card, comments))
    }

    /// Categories and locations offered by the post form
    pub async fn choices(&self) -> Result<PostChoices> {
        Ok(PostChoices {
            categories: self.store.list_categories().await?,
            locations: self.store.list_locations().await?,
        })
    }

    pub async fn create(&self, actor: &AuthUser, draft: &PostDraft) -> Result<Post> {
        let post = self.store.insert_post(actor.id, draft).await?;
        metrics::record_mutation("post", "create");
        tracing::info!(post_id = post.id, user_id = actor.id, "post created");
        Ok(post)
    }

    /// Load a post for mutation: 404 when missing, redirect for non-owners.
    pub async fn owned_post(&self, actor: &AuthUser, post_id: i64) -> Result<Post> {
        let post = self
            .store
            .find_post(post_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("post {}", post_id)))?;
        ensure_owner(actor, post.author_id, routes::post_detail_path(post_id))?;
        Ok(post)
    }

    /// Owner-only post card for the delete confirmation page
    pub async fn owned_post_card(&self, actor: &AuthUser, post_id: i64) -> Result<PostCard> {
        self.owned_post(actor, post_id).await?;
        self.store
            .find_post_card(post_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("post {}", post_id)))
    }

    pub async fn update(&self, actor: &AuthUser, post_id: i64, draft: &PostDraft) -> Result<Post> {
        let current = self.owned_post(actor, post_id).await?;
        // The edit form shows whole seconds; an untouched date keeps its stored value.
        let mut draft = draft.clone();
        if draft.pub_date == current.pub_date.trunc_subsecs(0) {
            draft.pub_date = current.pub_date;
        }
        let post = self
            .store
            .update_post(post_id, &draft)
            .await?
            .ok_or_else(|| AppError::not_found(format!("post {}", post_id)))?;
        metrics::record_mutation("post", "update");
        tracing::info!(post_id, user_id = actor.id, "post updated");
        Ok(post)
    }

    pub async fn delete(&self, actor: &AuthUser, post_id: i64) -> Result<()> {
        self.owned_post(actor, post_id).await?;
        if self.store.delete_post(post_id).await? {
            metrics::record_mutation("post", "delete");
            tracing::info!(post_id, user_id = actor.id, "post deleted");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{CommentDraft, NewCategory};
    use chrono::{Duration, Utc};

    struct Fixture {
        service: PostService,
        store: Arc<MemoryStore>,
        alice: AuthUser,
        bob: AuthUser,
        category: Category,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let alice = store.create_user("alice").await.unwrap();
        let bob = store.create_user("bob").await.unwrap();
        let category = store
            .create_category(NewCategory {
                title: "Travel".into(),
                description: "Trips".into(),
                slug: "travel".into(),
                is_published: true,
            })
            .await
            .unwrap();

        Fixture {
            service: PostService::new(store.clone()),
            store,
            alice: AuthUser {
                id: alice.id,
                username: alice.username,
            },
            bob: AuthUser {
                id: bob.id,
                username: bob.username,
            },
            category,
        }
    }

    fn draft(category_id: i64, offset: Duration, is_published: bool) -> PostDraft {
        PostDraft {
            title: "Post".into(),
            text: "Body".into(),
            pub_date: Utc::now() + offset,
            is_published,
            image: None,
            category_id: Some(category_id),
            location_id: None,
        }
    }

    #[tokio::test]
    async fn test_scheduled_post_visible_only_to_author() {
        let f = fixture().await;
        let post = f
            .service
            .create(&f.alice, &draft(f.category.id, Duration::days(2), true))
            .await
            .unwrap();

        assert!(f.service.detail(post.id, Some(&f.alice)).await.is_ok());
        assert!(matches!(
            f.service.detail(post.id, Some(&f.bob)).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            f.service.detail(post.id, None).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_profile_feed_depends_on_viewer() {
        let f = fixture().await;
        f.service
            .create(&f.alice, &draft(f.category.id, -Duration::hours(1), true))
            .await
            .unwrap();
        f.service
            .create(&f.alice, &draft(f.category.id, -Duration::hours(1), false))
            .await
            .unwrap();

        let (_, own) = f
            .service
            .profile_feed("alice", Some(&f.alice), 1)
            .await
            .unwrap();
        let (_, public) = f.service.profile_feed("alice", Some(&f.bob), 1).await.unwrap();
        assert_eq!(own.total, 2);
        assert_eq!(public.total, 1);

        assert!(matches!(
            f.service.profile_feed("nobody", None, 1).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_non_owner_cannot_update_or_delete() {
        let f = fixture().await;
        let post = f
            .service
            .create(&f.alice, &draft(f.category.id, -Duration::hours(1), true))
            .await
            .unwrap();

        let mut changed = draft(f.category.id, -Duration::hours(1), true);
        changed.title = "Hijacked".into();
        match f.service.update(&f.bob, post.id, &changed).await {
            Err(AppError::NotOwner { fallback }) => {
                assert_eq!(fallback, format!("/posts/{}/", post.id))
            }
            other => panic!("expected NotOwner, got {:?}", other),
        }
        assert!(matches!(
            f.service.delete(&f.bob, post.id).await,
            Err(AppError::NotOwner { .. })
        ));

        let stored = f.store.find_post(post.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Post");
    }

    #[tokio::test]
    async fn test_delete_removes_comments() {
        let f = fixture().await;
        let post = f
            .service
            .create(&f.alice, &draft(f.category.id, -Duration::hours(1), true))
            .await
            .unwrap();
        f.store
            .insert_comment(post.id, f.bob.id, &CommentDraft { text: "hi".into() })
            .await
            .unwrap();

        f.service.delete(&f.alice, post.id).await.unwrap();
        assert!(f.store.list_comments(post.id).await.unwrap().is_empty());
        assert!(matches!(
            f.service.detail(post.id, Some(&f.alice)).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_category_feed_requires_published_category() {
        let f = fixture().await;
        assert!(f.service.category_feed("travel", 1).await.is_ok());

        f.store
            .set_category_published(f.category.id, false)
            .await
            .unwrap();
        assert!(matches!(
            f.service.category_feed("travel", 1).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_untouched_pub_date_survives_edit() {
        let f = fixture().await;
        let post = f
            .service
            .create(&f.alice, &draft(f.category.id, Duration::minutes(-5), true))
            .await
            .unwrap();
        let form = crate::forms::PostForm::from_post(&post);
        let choices = f.service.choices().await.unwrap();
        let resubmitted = crate::forms::PostForm {
            title: "Retitled".into(),
            ..form
        }
        .clean(&choices)
        .unwrap();

        let updated = f
            .service
            .update(&f.alice, post.id, &resubmitted)
            .await
            .unwrap();
        assert_eq!(updated.title, "Retitled");
        assert_eq!(updated.pub_date, post.pub_date);
    }
}
