/// Comment handlers - every route is nested under its post
use actix_web::{web, HttpRequest, HttpResponse};

use super::{page, redirect};
use crate::error::Result;
use crate::forms::{CommentForm, ConfirmForm, FormErrors};
use crate::middleware::{csrf, AuthUser, CsrfToken};
use crate::render;
use crate::routes;
use crate::services::CommentService;
use crate::AppState;

/// Add a comment. Invalid input is dropped and the actor lands on the post.
pub async fn add_comment(
    req: HttpRequest,
    state: web::Data<AppState>,
    user: AuthUser,
    post_id: web::Path<i64>,
    form: web::Form<CommentForm>,
) -> Result<HttpResponse> {
    csrf::verify(&req, &form.csrf_token)?;

    let post_id = post_id.into_inner();
    let service = CommentService::new(state.store.clone());
    service.post(post_id).await?;
    match form.clean() {
        Ok(draft) => {
            service.add(&user, post_id, &draft).await?;
        }
        Err(_) => {
            tracing::debug!(post_id, user_id = user.id, "empty comment ignored");
        }
    }
    Ok(redirect(routes::post_detail_path(post_id)))
}

/// Edit form pre-populated with the comment text
pub async fn edit_comment_form(
    state: web::Data<AppState>,
    user: AuthUser,
    csrf: CsrfToken,
    path: web::Path<(i64, i64)>,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let service = CommentService::new(state.store.clone());
    let comment = service.owned_comment(&user, post_id, comment_id).await?;
    Ok(page(
        render::comment_form(
            post_id,
            comment_id,
            &CommentForm::from_comment(&comment),
            &FormErrors::new(),
            &csrf,
            Some(&user),
        ),
        Some(&csrf),
    ))
}

pub async fn edit_comment(
    req: HttpRequest,
    state: web::Data<AppState>,
    user: AuthUser,
    csrf: CsrfToken,
    path: web::Path<(i64, i64)>,
    form: web::Form<CommentForm>,
) -> Result<HttpResponse> {
    csrf::verify(&req, &form.csrf_token)?;

    let (post_id, comment_id) = path.into_inner();
    let service = CommentService::new(state.store.clone());
    service.owned_comment(&user, post_id, comment_id).await?;
    match form.clean() {
        Ok(draft) => {
            service.update(&user, post_id, comment_id, &draft).await?;
            Ok(redirect(routes::post_detail_path(post_id)))
        }
        Err(errors) => Ok(page(
            render::comment_form(post_id, comment_id, &form, &errors, &csrf, Some(&user)),
            Some(&csrf),
        )),
    }
}

/// Delete confirmation showing the comment
pub async fn delete_comment_form(
    state: web::Data<AppState>,
    user: AuthUser,
    csrf: CsrfToken,
    path: web::Path<(i64, i64)>,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let service = CommentService::new(state.store.clone());
    let comment = service.owned_comment(&user, post_id, comment_id).await?;
    Ok(page(
        render::comment_delete(post_id, &comment, &csrf, Some(&user)),
        Some(&csrf),
    ))
}

pub async fn delete_comment(
    req: HttpRequest,
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<(i64, i64)>,
    form: web::Form<ConfirmForm>,
) -> Result<HttpResponse> {
    csrf::verify(&req, &form.csrf_token)?;

    let (post_id, comment_id) = path.into_inner();
    let service = CommentService::new(state.store.clone());
    service.delete(&user, post_id, comment_id).await?;
    Ok(redirect(routes::post_detail_path(post_id)))
}
