/// Ownership checks for posts and comments
///
/// Every guard in the service compares user ids through [`is_owner`]. A
/// failed mutation guard does not produce 403: the actor is sent back to a
/// neutral page (the post detail) without anything being changed.
use super::AuthUser;
use crate::error::{AppError, Result};

/// True when the viewer is authenticated and authored the content.
pub fn is_owner(viewer: Option<&AuthUser>, author_id: i64) -> bool {
    viewer.is_some_and(|user| user.id == author_id)
}

/// Guard for mutations; non-owners are redirected to `fallback`.
pub fn ensure_owner(actor: &AuthUser, author_id: i64, fallback: impl Into<String>) -> Result<()> {
    if is_owner(Some(actor), author_id) {
        Ok(())
    } else {
        let fallback = fallback.into();
        tracing::debug!(
            user_id = actor.id,
            author_id,
            %fallback,
            "non-owner mutation attempt redirected"
        );
        Err(AppError::NotOwner { fallback })
    }
}
