/// Comment service - comment mutations, always scoped to their post
use std::sync::Arc;

use crate::db::{BlogStore, CommentRepository, PostRepository};
use crate::error::{AppError, Result};
use crate::metrics;
use crate::middleware::{ensure_owner, AuthUser};
use crate::models::{Comment, CommentDraft, Post};
use crate::routes;

pub struct CommentService {
    store: Arc<dyn BlogStore>,
}

impl CommentService {
    pub fn new(store: Arc<dyn BlogStore>) -> Self {
        Self { store }
    }

    /// The post a comment hangs off; 404 when it does not exist.
    pub async fn post(&self, post_id: i64) -> Result<Post> {
        self.store
            .find_post(post_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("post {}", post_id)))
    }

    /// Append a comment. Any existing post accepts comments.
    pub async fn add(&self, actor: &AuthUser, post_id: i64, draft: &CommentDraft) -> Result<Comment> {
        self.post(post_id).await?;
        let comment = self.store.insert_comment(post_id, actor.id, draft).await?;
        metrics::record_mutation("comment", "create");
        tracing::info!(
            post_id,
            comment_id = comment.id,
            user_id = actor.id,
            "comment added"
        );
        Ok(comment)
    }

    /// Load a comment for mutation: 404 unless it exists under `post_id`,
    /// redirect to the post for non-owners.
    pub async fn owned_comment(
        &self,
        actor: &AuthUser,
        post_id: i64,
        comment_id: i64,
    ) -> Result<Comment> {
        self.post(post_id).await?;
        let comment = self
            .store
            .find_comment(post_id, comment_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("comment {}", comment_id)))?;
        ensure_owner(actor, comment.author_id, routes::post_detail_path(post_id))?;
        Ok(comment)
    }

    pub async fn update(
        &self,
        actor: &AuthUser,
        post_id: i64,
        comment_id: i64,
        draft: &CommentDraft,
    ) -> Result<Comment> {
        self.owned_comment(actor, post_id, comment_id).await?;
        let comment = self
            .store
            .update_comment(comment_id, draft)
            .await?
            .ok_or_else(|| AppError::not_found(format!("comment {}", comment_id)))?;
        metrics::record_mutation("comment", "update");
        tracing::info!(post_id, comment_id, user_id = actor.id, "comment updated");
        Ok(comment)
    }

    pub async fn delete(&self, actor: &AuthUser, post_id: i64, comment_id: i64) -> Result<()> {
        self.owned_comment(actor, post_id, comment_id).await?;
        if self.store.delete_comment(comment_id).await? {
            metrics::record_mutation("comment", "delete");
            tracing::info!(post_id, comment_id, user_id = actor.id, "comment deleted");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{CategoryRepository, MemoryStore, UserRepository};
    use crate::models::{NewCategory, PostDraft};
    use chrono::Utc;

    async fn setup() -> (CommentService, Arc<MemoryStore>, AuthUser, AuthUser, Post) {
        let store = Arc::new(MemoryStore::new());
        let alice = store.create_user("alice").await.unwrap();
        let bob = store.create_user("bob").await.unwrap();
        let category = store
            .create_category(NewCategory {
                title: "Food".into(),
                description: "Recipes".into(),
                slug: "food".into(),
                is_published: false,
            })
            .await
            .unwrap();
        let post = store
            .insert_post(
                alice.id,
                &PostDraft {
                    title: "Soup".into(),
                    text: "Hot".into(),
                    pub_date: Utc::now(),
                    is_published: false,
                    image: None,
                    category_id: Some(category.id),
                    location_id: None,
                },
            )
            .await
            .unwrap();

        let as_actor = |u: crate::models::User| AuthUser {
            id: u.id,
            username: u.username,
        };
        (
            CommentService::new(store.clone()),
            store,
            as_actor(alice),
            as_actor(bob),
            post,
        )
    }

    #[tokio::test]
    async fn test_comment_on_hidden_post_is_accepted() {
        let (service, store, _, bob, post) = setup().await;
        let comment = service
            .add(&bob, post.id, &CommentDraft { text: "yum".into() })
            .await
            .unwrap();
        assert_eq!(comment.post_id, post.id);
        assert_eq!(comment.author_id, bob.id);
        assert_eq!(store.list_comments(post.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_comment_on_missing_post_is_not_found() {
        let (service, _, _, bob, _) = setup().await;
        assert!(matches!(
            service
                .add(&bob, 9999, &CommentDraft { text: "?".into() })
                .await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_only_author_edits_comment() {
        let (service, store, alice, bob, post) = setup().await;
        let comment = service
            .add(&bob, post.id, &CommentDraft { text: "first".into() })
            .await
            .unwrap();

        let edit = CommentDraft {
            text: "edited".into(),
        };
        assert!(matches!(
            service.update(&alice, post.id, comment.id, &edit).await,
            Err(AppError::NotOwner { .. })
        ));
        assert!(matches!(
            service.delete(&alice, post.id, comment.id).await,
            Err(AppError::NotOwner { .. })
        ));

        let updated = service.update(&bob, post.id, comment.id, &edit).await.unwrap();
        assert_eq!(updated.text, "edited");

        service.delete(&bob, post.id, comment.id).await.unwrap();
        assert!(store.list_comments(post.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_comment_under_wrong_post_is_not_found() {
        let (service, store, alice, bob, post) = setup().await;
        let comment = service
            .add(&bob, post.id, &CommentDraft { text: "x".into() })
            .await
            .unwrap();
        let other = store
            .insert_post(
                alice.id,
                &PostDraft {
                    title: "Other".into(),
                    text: "Other".into(),
                    pub_date: Utc::now(),
                    is_published: true,
                    image: None,
                    category_id: None,
                    location_id: None,
                },
            )
            .await
            .unwrap();

        assert!(matches!(
            service.owned_comment(&bob, other.id, comment.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
