/// Post handlers - detail view and owner-only mutations
use actix_web::{web, HttpRequest, HttpResponse};

use super::{page, redirect};
use crate::error::Result;
use crate::forms::{ConfirmForm, FormErrors, PostForm};
use crate::middleware::{csrf, AuthUser, CsrfToken, Viewer};
use crate::render;
use crate::routes;
use crate::services::PostService;
use crate::AppState;

/// Single post with its comments
pub async fn post_detail(
    state: web::Data<AppState>,
    viewer: Viewer,
    csrf: CsrfToken,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let service = PostService::new(state.store.clone());
    let (card, comments) = service.detail(*post_id, viewer.user()).await?;
    Ok(page(
        render::post_detail(&card, &comments, viewer.user(), &csrf),
        Some(&csrf),
    ))
}

/// Blank post form
pub async fn create_post_form(
    state: web::Data<AppState>,
    user: AuthUser,
    csrf: CsrfToken,
) -> Result<HttpResponse> {
    let service = PostService::new(state.store.clone());
    let choices = service.choices().await?;
    Ok(page(
        render::post_form(
            &PostForm::blank(),
            &FormErrors::new(),
            &choices,
            &csrf,
            None,
            Some(&user),
        ),
        Some(&csrf),
    ))
}

/// Create a post, then go to the author's profile
pub async fn create_post(
    req: HttpRequest,
    state: web::Data<AppState>,
    user: AuthUser,
    csrf: CsrfToken,
    form: web::Form<PostForm>,
) -> Result<HttpResponse> {
    csrf::verify(&req, &form.csrf_token)?;

    let service = PostService::new(state.store.clone());
    let choices = service.choices().await?;
    match form.clean(&choices) {
        Ok(draft) => {
            service.create(&user, &draft).await?;
            Ok(redirect(routes::profile_path(&user.username)))
        }
        Err(errors) => {
            tracing::debug!(user_id = user.id, "post form rejected");
            Ok(page(
                render::post_form(&form, &errors, &choices, &csrf, None, Some(&user)),
                Some(&csrf),
            ))
        }
    }
}

/// Edit form pre-populated from the stored post
pub async fn edit_post_form(
    state: web::Data<AppState>,
    user: AuthUser,
    csrf: CsrfToken,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let post_id = post_id.into_inner();
    let service = PostService::new(state.store.clone());
    let post = service.owned_post(&user, post_id).await?;
    let choices = service.choices().await?;
    Ok(page(
        render::post_form(
            &PostForm::from_post(&post),
            &FormErrors::new(),
            &choices,
            &csrf,
            Some(post_id),
            Some(&user),
        ),
        Some(&csrf),
    ))
}

/// Apply an edit, then go back to the post
pub async fn edit_post(
    req: HttpRequest,
    state: web::Data<AppState>,
    user: AuthUser,
    csrf: CsrfToken,
    post_id: web::Path<i64>,
    form: web::Form<PostForm>,
) -> Result<HttpResponse> {
    csrf::verify(&req, &form.csrf_token)?;

    let post_id = post_id.into_inner();
    let service = PostService::new(state.store.clone());
    service.owned_post(&user, post_id).await?;
    let choices = service.choices().await?;
    match form.clean(&choices) {
        Ok(draft) => {
            service.update(&user, post_id, &draft).await?;
            Ok(redirect(routes::post_detail_path(post_id)))
        }
        Err(errors) => Ok(page(
            render::post_form(&form, &errors, &choices, &csrf, Some(post_id), Some(&user)),
            Some(&csrf),
        )),
    }
}

/// Delete confirmation showing the post
pub async fn delete_post_form(
    state: web::Data<AppState>,
    user: AuthUser,
    csrf: CsrfToken,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let service = PostService::new(state.store.clone());
    let card = service.owned_post_card(&user, *post_id).await?;
    Ok(page(
        render::post_delete(&card, &csrf, Some(&user)),
        Some(&csrf),
    ))
}

/// Delete the post, then go to the author's profile
pub async fn delete_post(
    req: HttpRequest,
    state: web::Data<AppState>,
    user: AuthUser,
    post_id: web::Path<i64>,
    form: web::Form<ConfirmForm>,
) -> Result<HttpResponse> {
    csrf::verify(&req, &form.csrf_token)?;

    let service = PostService::new(state.store.clone());
    service.delete(&user, *post_id).await?;
    Ok(redirect(routes::profile_path(&user.username)))
}
