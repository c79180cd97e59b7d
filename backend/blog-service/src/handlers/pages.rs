/// Static pages
use actix_web::HttpResponse;

use super::page;
use crate::middleware::Viewer;
use crate::render;

pub async fn about(viewer: Viewer) -> HttpResponse {
    page(render::about(viewer.user()), None)
}

pub async fn rules(viewer: Viewer) -> HttpResponse {
    page(render::rules(viewer.user()), None)
}
