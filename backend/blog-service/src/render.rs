//! HTML pages rendered with maud.
//!
//! Pages are deliberately plain; everything dynamic is escaped by maud.

use actix_web::http::StatusCode;
use chrono::{DateTime, Utc};
use maud::{html, Markup, DOCTYPE};

use crate::forms::{CommentForm, FormErrors, PostChoices, PostForm};
use crate::middleware::csrf::CSRF_FIELD;
use crate::middleware::{is_owner, AuthUser, CsrfToken};
use crate::models::{Category, Comment, CommentView, PostCard, User};
use crate::pagination::Page;
use crate::routes;

const EXCERPT_WORDS: usize = 30;

fn display_date(dt: &DateTime<Utc>) -> String {
    dt.format("%d.%m.%Y %H:%M").to_string()
}

fn excerpt(text: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= EXCERPT_WORDS {
        words.join(" ")
    } else {
        format!("{} …", words[..EXCERPT_WORDS].join(" "))
    }
}

fn layout(title: &str, viewer: Option<&AuthUser>, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                title { (title) " | Blogicum" }
            }
            body {
                header {
                    nav {
                        a href="/" { "Home" }
                        @if let Some(user) = viewer {
                            " · "
                            a href=(routes::POST_CREATE_PATH) { "New post" }
                            " · "
                            a href=(routes::profile_path(&user.username)) { (user.username) }
                        }
                    }
                }
                main { (content) }
                footer {
                    a href=(routes::ABOUT_PATH) { "About" }
                    " · "
                    a href=(routes::RULES_PATH) { "Rules" }
                }
            }
        }
    }
}

fn csrf_input(csrf: &CsrfToken) -> Markup {
    html! {
        input type="hidden" name=(CSRF_FIELD) value=(csrf.value());
    }
}

fn field_errors(errors: &FormErrors, field: &str) -> Markup {
    html! {
        @let messages = errors.field(field);
        @if !messages.is_empty() {
            ul class="errorlist" {
                @for message in messages {
                    li { (message) }
                }
            }
        }
    }
}

fn post_meta(card: &PostCard) -> Markup {
    html! {
        p class="meta" {
            (display_date(&card.post.pub_date))
            " · "
            a href=(routes::profile_path(&card.author_username)) { "@" (card.author_username) }
            @if let Some(location) = card.location.as_ref().filter(|l| l.is_published) {
                " · " (location.name)
            }
            @if let Some(category) = card.category.as_ref().filter(|c| c.is_published) {
                " · "
                a href=(routes::category_path(&category.slug)) { (category.title) }
            }
        }
    }
}

fn post_card(card: &PostCard) -> Markup {
    html! {
        article class="post" {
            h2 {
                a href=(routes::post_detail_path(card.post.id)) { (card.post.title) }
            }
            (post_meta(card))
            @if !card.post.is_published {
                p class="badge" { "Unpublished" }
            }
            p { (excerpt(&card.post.text)) }
            p {
                a href=(routes::post_detail_path(card.post.id)) {
                    "Comments: " (card.comment_count)
                }
            }
        }
    }
}

fn paginator(page: &Page<PostCard>, base: &str) -> Markup {
    html! {
        @if page.num_pages > 1 {
            nav class="pagination" {
                @if let Some(prev) = page.previous_page_number() {
                    a href={ (base) "?page=1" } { "« first" }
                    " "
                    a href={ (base) "?page=" (prev) } { "previous" }
                    " "
                }
                span { "Page " (page.number) " of " (page.num_pages) }
                @if let Some(next) = page.next_page_number() {
                    " "
                    a href={ (base) "?page=" (next) } { "next" }
                    " "
                    a href={ (base) "?page=" (page.num_pages) } { "last »" }
                }
            }
        }
    }
}

fn feed(page: &Page<PostCard>, base: &str) -> Markup {
    html! {
        @if page.items.is_empty() {
            p { "No posts yet." }
        }
        @for card in &page.items {
            (post_card(card))
        }
        (paginator(page, base))
    }
}

pub fn index(page: &Page<PostCard>, viewer: Option<&AuthUser>) -> Markup {
    layout(
        "Latest posts",
        viewer,
        html! {
            h1 { "Latest posts" }
            (feed(page, "/"))
        },
    )
}

pub fn category(category: &Category, page: &Page<PostCard>, viewer: Option<&AuthUser>) -> Markup {
    layout(
        &category.title,
        viewer,
        html! {
            h1 { (category.title) }
            p { (category.description) }
            (feed(page, &routes::category_path(&category.slug)))
        },
    )
}

pub fn profile(profile: &User, page: &Page<PostCard>, viewer: Option<&AuthUser>) -> Markup {
    layout(
        &profile.username,
        viewer,
        html! {
            h1 { "@" (profile.username) }
            p { "Joined " (display_date(&profile.date_joined)) }
            (feed(page, &routes::profile_path(&profile.username)))
        },
    )
}

fn comment_fields(form: &CommentForm, errors: &FormErrors, csrf: &CsrfToken) -> Markup {
    html! {
        (csrf_input(csrf))
        (field_errors(errors, "text"))
        textarea name="text" rows="4" required { (form.text) }
    }
}

pub fn post_detail(
    card: &PostCard,
    comments: &[CommentView],
    viewer: Option<&AuthUser>,
    csrf: &CsrfToken,
) -> Markup {
    let post = &card.post;
    layout(
        &post.title,
        viewer,
        html! {
            article class="post" {
                h1 { (post.title) }
                (post_meta(card))
                @if let Some(image) = &post.image {
                    img src=(image) alt=(post.title);
                }
                @for paragraph in post.text.split("\n\n") {
                    p { (paragraph) }
                }
                @if is_owner(viewer, post.author_id) {
                    p class="actions" {
                        a href=(routes::post_edit_path(post.id)) { "Edit" }
                        " · "
                        a href=(routes::post_delete_path(post.id)) { "Delete" }
                    }
                }
            }
            section class="comments" {
                h2 { "Comments (" (comments.len()) ")" }
                @for view in comments {
                    div class="comment" id={ "comment-" (view.comment.id) } {
                        p class="meta" {
                            a href=(routes::profile_path(&view.author_username)) {
                                "@" (view.author_username)
                            }
                            " · " (display_date(&view.comment.created_at))
                        }
                        p { (view.comment.text) }
                        @if is_owner(viewer, view.comment.author_id) {
                            p class="actions" {
                                a href=(routes::comment_edit_path(post.id, view.comment.id)) { "Edit" }
                                " · "
                                a href=(routes::comment_delete_path(post.id, view.comment.id)) { "Delete" }
                            }
                        }
                    }
                }
                @if viewer.is_some() {
                    form method="post" action=(routes::comment_create_path(post.id)) {
                        (comment_fields(&CommentForm::default(), &FormErrors::new(), csrf))
                        button type="submit" { "Send" }
                    }
                }
            }
        },
    )
}

pub fn post_form(
    form: &PostForm,
    errors: &FormErrors,
    choices: &PostChoices,
    csrf: &CsrfToken,
    editing: Option<i64>,
    viewer: Option<&AuthUser>,
) -> Markup {
    let (heading, action) = match editing {
        Some(post_id) => ("Edit post", routes::post_edit_path(post_id)),
        None => ("New post", routes::POST_CREATE_PATH.to_string()),
    };

    layout(
        heading,
        viewer,
        html! {
            h1 { (heading) }
            form method="post" action=(action) {
                (csrf_input(csrf))
                p {
                    label for="id_title" { "Title" }
                    (field_errors(errors, "title"))
                    input id="id_title" type="text" name="title" maxlength="256" value=(form.title) required;
                }
                p {
                    label for="id_text" { "Text" }
                    (field_errors(errors, "text"))
                    textarea id="id_text" name="text" rows="10" required { (form.text) }
                }
                p {
                    label for="id_pub_date" { "Publication date" }
                    (field_errors(errors, "pub_date"))
                    input id="id_pub_date" type="datetime-local" name="pub_date" step="1" value=(form.pub_date) required;
                }
                p {
                    label for="id_category" { "Category" }
                    (field_errors(errors, "category"))
                    select id="id_category" name="category" required {
                        option value="" selected[form.category.is_empty()] { "---------" }
                        @for category in &choices.categories {
                            @let value = category.id.to_string();
                            option value=(value) selected[form.category == value] { (category.title) }
                        }
                    }
                }
                p {
                    label for="id_location" { "Location" }
                    (field_errors(errors, "location"))
                    select id="id_location" name="location" {
                        option value="" selected[form.location.is_empty()] { "---------" }
                        @for location in &choices.locations {
                            @let value = location.id.to_string();
                            option value=(value) selected[form.location == value] { (location.name) }
                        }
                    }
                }
                p {
                    label for="id_image" { "Image" }
                    (field_errors(errors, "image"))
                    input id="id_image" type="text" name="image" maxlength="100" value=(form.image);
                }
                p {
                    label for="id_is_published" {
                        input id="id_is_published" type="checkbox" name="is_published" checked[form.published_checked()];
                        " Published"
                    }
                    (field_errors(errors, "is_published"))
                }
                button type="submit" { "Save" }
            }
        },
    )
}

pub fn post_delete(card: &PostCard, csrf: &CsrfToken, viewer: Option<&AuthUser>) -> Markup {
    layout(
        "Delete post",
        viewer,
        html! {
            h1 { "Delete post?" }
            (post_card(card))
            form method="post" action=(routes::post_delete_path(card.post.id)) {
                (csrf_input(csrf))
                button type="submit" { "Delete" }
                " "
                a href=(routes::post_detail_path(card.post.id)) { "Cancel" }
            }
        },
    )
}

pub fn comment_form(
    post_id: i64,
    comment_id: i64,
    form: &CommentForm,
    errors: &FormErrors,
    csrf: &CsrfToken,
    viewer: Option<&AuthUser>,
) -> Markup {
    layout(
        "Edit comment",
        viewer,
        html! {
            h1 { "Edit comment" }
            form method="post" action=(routes::comment_edit_path(post_id, comment_id)) {
                (comment_fields(form, errors, csrf))
                button type="submit" { "Save" }
            }
        },
    )
}

pub fn comment_delete(
    post_id: i64,
    comment: &Comment,
    csrf: &CsrfToken,
    viewer: Option<&AuthUser>,
) -> Markup {
    layout(
        "Delete comment",
        viewer,
        html! {
            h1 { "Delete comment?" }
            blockquote { (comment.text) }
            p class="meta" { (display_date(&comment.created_at)) }
            form method="post" action=(routes::comment_delete_path(post_id, comment.id)) {
                (csrf_input(csrf))
                button type="submit" { "Delete" }
                " "
                a href=(routes::post_detail_path(post_id)) { "Cancel" }
            }
        },
    )
}

pub fn about(viewer: Option<&AuthUser>) -> Markup {
    layout(
        "About",
        viewer,
        html! {
            h1 { "About" }
            p {
                "Blogicum is a place to write about your days and read what others "
                "publish. Posts are grouped by category and can be tied to a place."
            }
        },
    )
}

pub fn rules(viewer: Option<&AuthUser>) -> Markup {
    layout(
        "Rules",
        viewer,
        html! {
            h1 { "Rules" }
            ol {
                li { "Be polite in posts and comments." }
                li { "Publish only content you have the right to share." }
                li { "Authors may edit or delete their own posts and comments only." }
            }
        },
    )
}

/// Stand-alone page for error statuses; never depends on request state.
pub fn error_page(status: StatusCode) -> Markup {
    let (title, message) = match status.as_u16() {
        403 => (
            "Forbidden",
            "CSRF verification failed. The request was aborted.",
        ),
        404 => ("Page not found", "The page you requested does not exist."),
        405 => ("Method not allowed", "This page does not accept that kind of request."),
        409 => ("Conflict", "The submitted data conflicts with existing data."),
        413 => ("Request too large", "The submitted form is too large."),
        _ if status.is_client_error() => (
            status.canonical_reason().unwrap_or("Bad request"),
            "The request could not be processed.",
        ),
        _ => ("Server error", "Something went wrong on our side. Try again later."),
    };

    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                title { (status.as_u16()) " " (title) " | Blogicum" }
            }
            body class={ "error error-" (status.as_u16()) } {
                h1 { (status.as_u16()) }
                h2 { (title) }
                p { (message) }
                p { a href="/" { "Back to the home page" } }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_truncates_long_text() {
        let long = (0..40).map(|i| i.to_string()).collect::<Vec<_>>().join(" ");
        let short = excerpt(&long);
        assert!(short.ends_with('…'));
        assert_eq!(short.split_whitespace().count(), EXCERPT_WORDS + 1);
        assert_eq!(excerpt("a  b\nc"), "a b c");
    }

    #[test]
    fn test_markup_is_escaped() {
        let csrf = CsrfToken::generate();
        let form = PostForm {
            title: "<script>alert(1)</script>".into(),
            ..PostForm::blank()
        };
        let page = post_form(
            &form,
            &FormErrors::new(),
            &PostChoices::default(),
            &csrf,
            None,
            None,
        )
        .into_string();
        assert!(!page.contains("<script>"));
        assert!(page.contains("&lt;script&gt;"));
        assert!(page.contains(csrf.value()));
    }

    #[test]
    fn test_error_page_server_error_fallback() {
        let page = error_page(StatusCode::BAD_GATEWAY).into_string();
        assert!(page.contains("502"));
        assert!(page.contains("Server error"));
    }

    #[test]
    fn test_error_page_client_error_fallback() {
        let page = error_page(StatusCode::BAD_REQUEST).into_string();
        assert!(page.contains("400"));
        assert!(page.contains("Bad Request"));
        assert!(!page.contains("Server error"));
    }
}
