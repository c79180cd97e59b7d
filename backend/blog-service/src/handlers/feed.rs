/// Feed handlers - paginated post listings
use actix_web::{web, HttpResponse};

use super::page;
use crate::error::Result;
use crate::middleware::Viewer;
use crate::pagination::PageQuery;
use crate::render;
use crate::services::PostService;
use crate::AppState;

/// Home feed: every publicly visible post
pub async fn index(
    state: web::Data<AppState>,
    viewer: Viewer,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let service = PostService::new(state.store.clone());
    let posts = service.home_feed(query.requested()).await?;
    Ok(page(render::index(&posts, viewer.user()), None))
}

/// Feed of one published category
pub async fn category_posts(
    state: web::Data<AppState>,
    viewer: Viewer,
    slug: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let service = PostService::new(state.store.clone());
    let (category, posts) = service.category_feed(&slug, query.requested()).await?;
    Ok(page(
        render::category(&category, &posts, viewer.user()),
        None,
    ))
}

/// An author's posts; the author also sees unpublished and scheduled ones
pub async fn profile(
    state: web::Data<AppState>,
    viewer: Viewer,
    username: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let service = PostService::new(state.store.clone());
    let (user, posts) = service
        .profile_feed(&username, viewer.user(), query.requested())
        .await?;
    Ok(page(render::profile(&user, &posts, viewer.user()), None))
}
