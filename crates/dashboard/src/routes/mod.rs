//! HTTP route handlers for the dashboard.
//!
//! # Route Structure
//!
//! ```text
//! GET    /                      - Overview
//! GET    /products              - Catalog, optional ?category=<slug>
//! GET    /subscription          - Plans, optional ?billing=monthly|yearly
//! GET    /health                - Health check
//!
//! # Settings API
//! GET    /api/settings          - Current settings record
//! PATCH  /api/settings          - Apply {"key": .., "value": ..}
//! DELETE /api/settings          - Restore defaults
//!
//! *                             - 404 page
//! ```

pub mod not_found;
pub mod pages;
pub mod settings;

use axum::{Router, routing::get};

use crate::seo::HeadDocument;
use crate::state::AppState;

/// Values every page layout needs.
pub struct Layout {
    pub head: HeadDocument,
    pub theme: &'static str,
    pub sidebar_collapsed: bool,
}

/// Create all routes for the dashboard.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::home))
        .route("/products", get(pages::catalog))
        .route("/subscription", get(pages::subscription))
        .route("/health", get(health))
        .route(
            "/api/settings",
            get(settings::show)
                .patch(settings::update)
                .delete(settings::reset),
        )
        .fallback(not_found::not_found)
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}
