/// Business logic layer for blog-service
///
/// - Visibility: the public-visibility predicate and feed queries
/// - Post service: feeds, ownership-aware detail, post mutations
/// - Comment service: comment mutations scoped to their post
pub mod comments;
pub mod posts;
pub mod visibility;

pub use comments::CommentService;
pub use posts::PostService;
