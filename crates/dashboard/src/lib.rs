//! POS Dashboard library.
//!
//! Server-rendered pages over the shared settings store, plus a small JSON
//! API for reading and changing settings. The binary in `main.rs` adds
//! Sentry and binds a listener; everything else lives here so it can be
//! tested with `tower::ServiceExt::oneshot`.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod seo;
pub mod state;
pub mod storage;

use axum::{Router, middleware::from_fn};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the dashboard router with its request-scoped middleware.
pub fn app(state: AppState) -> Router {
    routes::routes()
        .layer(from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request, StatusCode, header};
    use pos_dashboard_core::settings::SETTINGS_STORAGE_KEY;
    use pos_dashboard_core::{KeyValueStore, MemoryStore};
    use tower::ServiceExt;
    use url::Url;

    use super::*;
    use crate::config::DashboardConfig;

    fn test_app(store: Arc<MemoryStore>) -> Router {
        let config = DashboardConfig::local(
            Url::parse("https://pos.example.com").unwrap(),
            ".pos-dashboard",
        );
        app(AppState::new(config, store))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get(test_app(Arc::new(MemoryStore::new())), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn test_unknown_route_renders_not_found_page() {
        let (status, body) = get(test_app(Arc::new(MemoryStore::new())), "/nowhere").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("<title>Page Not Found</title>"));
        assert!(body.contains("/nowhere"));
        assert!(body.contains(r#"href="/""#));
    }

    #[tokio::test]
    async fn test_unknown_category_is_not_found() {
        let (status, body) = get(
            test_app(Arc::new(MemoryStore::new())),
            "/products?category=furniture",
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("Page Not Found"));
    }

    #[tokio::test]
    async fn test_products_use_stored_currency() {
        let store = Arc::new(MemoryStore::with_entry(
            SETTINGS_STORAGE_KEY,
            r#"{"currency":"EUR"}"#,
        ));
        let (status, body) = get(test_app(store), "/products?category=bakery").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Croissant"));
        assert!(!body.contains("Espresso"));
        assert!(body.contains("€3.25"));
    }

    #[tokio::test]
    async fn test_page_view_records_last_visited_page() {
        let store = Arc::new(MemoryStore::new());
        let (status, _) = get(test_app(Arc::clone(&store)), "/subscription?billing=yearly").await;
        assert_eq!(status, StatusCode::OK);

        let raw = store.get(SETTINGS_STORAGE_KEY).unwrap().unwrap();
        let stored: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored["lastVisitedPage"], "/subscription?billing=yearly");
    }

    #[tokio::test]
    async fn test_invalid_billing_cycle_is_bad_request() {
        let (status, _) = get(
            test_app(Arc::new(MemoryStore::new())),
            "/subscription?billing=weekly",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_patch_then_delete_settings() {
        let store = Arc::new(MemoryStore::new());
        let app = test_app(Arc::clone(&store));

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::PATCH)
                    .uri("/api/settings")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"key":"theme","value":"dark"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let settings: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(settings["theme"], "dark");
        assert!(store.contains_key(SETTINGS_STORAGE_KEY));

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::DELETE)
                    .uri("/api/settings")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!store.contains_key(SETTINGS_STORAGE_KEY));
    }

    #[tokio::test]
    async fn test_non_local_last_visited_page_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let app = test_app(Arc::clone(&store));

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::PATCH)
                    .uri("/api/settings")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"key":"lastVisitedPage","value":"javascript:alert(document.cookie)"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(!store.contains_key(SETTINGS_STORAGE_KEY));

        let (status, body) = get(app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(!body.contains("javascript:"));
        assert!(body.contains(r#"<a href="/">"#));
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let response = test_app(Arc::new(MemoryStore::new()))
            .oneshot(
                Request::get("/health")
                    .header(middleware::REQUEST_ID_HEADER, "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.headers()[middleware::REQUEST_ID_HEADER],
            "abc-123"
        );
    }
}
