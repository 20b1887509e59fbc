//! 404 page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use tracing::warn;

use super::Layout;
use super::pages::layout;
use crate::seo::SeoMetadata;
use crate::state::AppState;

/// Not-found page template.
#[derive(Template, WebTemplate)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
    pub layout: Layout,
    pub path: String,
}

/// Fallback for every unmatched route.
pub async fn not_found(State(state): State<AppState>, uri: Uri) -> Response {
    render(&state, &uri)
}

/// Render the 404 page for `uri`.
pub fn render(state: &AppState, uri: &Uri) -> Response {
    warn!(path = %uri.path(), "Page not found");

    let metadata = SeoMetadata::new(
        "Page Not Found",
        "The page you are looking for does not exist.",
    );
    // Poisoned lock: render with default styling.
    let settings = state.settings().unwrap_or_default();

    let page = NotFoundTemplate {
        layout: layout(state, uri, &metadata, &settings),
        path: uri.path().to_owned(),
    };
    (StatusCode::NOT_FOUND, page).into_response()
}
