//! Public visibility of posts.
//!
//! A post is publicly visible when it is published, its publication time has
//! passed and it belongs to a published category. Posts with no category are
//! never public. Whether an author may bypass this is decided by the caller.

use chrono::{DateTime, Utc};

use crate::models::{Post, PostCard};

/// Pure predicate behind every public feed and the non-owner detail view.
pub fn is_publicly_visible(
    post: &Post,
    category_published: Option<bool>,
    now: DateTime<Utc>,
) -> bool {
    post.is_published && post.pub_date <= now && category_published == Some(true)
}

/// Visibility applied to a post query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Only posts passing [`is_publicly_visible`] at `now`
    Public { now: DateTime<Utc> },
    /// Every post in scope (an author looking at their own posts)
    Unrestricted,
}

impl Visibility {
    pub fn public_now() -> Self {
        Visibility::Public { now: Utc::now() }
    }

    pub fn admits(&self, card: &PostCard) -> bool {
        match self {
            Visibility::Public { now } => {
                is_publicly_visible(&card.post, card.category_published(), *now)
            }
            Visibility::Unrestricted => true,
        }
    }
}

/// Which posts a feed draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedScope {
    All,
    Category(i64),
    Author(i64),
}

/// A feed request: scope plus visibility, paginated by the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostQuery {
    pub scope: FeedScope,
    pub visibility: Visibility,
}

impl PostQuery {
    pub fn public(scope: FeedScope, now: DateTime<Utc>) -> Self {
        Self {
            scope,
            visibility: Visibility::Public { now },
        }
    }

    pub fn unrestricted(scope: FeedScope) -> Self {
        Self {
            scope,
            visibility: Visibility::Unrestricted,
        }
    }

    /// In-scope and admitted; used by stores that filter in process.
    pub fn matches(&self, card: &PostCard) -> bool {
        let in_scope = match self.scope {
            FeedScope::All => true,
            FeedScope::Category(id) => card.post.category_id == Some(id),
            FeedScope::Author(id) => card.post.author_id == id,
        };
        in_scope && self.visibility.admits(card)
    }
}
