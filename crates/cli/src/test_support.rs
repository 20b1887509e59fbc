//! Local fake Supabase servers for tests.

#![allow(clippy::unwrap_used)]

use axum::{Router, http::HeaderMap};
use secrecy::SecretString;
use url::Url;

use crate::config::SupabaseConfig;
use crate::supabase::SupabaseClient;

pub const TEST_KEY: &str = "test-service-key";

/// Serve `app` on an ephemeral port and return its base URL.
pub async fn spawn(app: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Url::parse(&format!("http://{addr}/")).unwrap()
}

/// A base URL nothing listens on.
pub async fn closed_port_url() -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    Url::parse(&format!("http://{addr}/")).unwrap()
}

pub fn client_for(base_url: Url) -> SupabaseClient {
    SupabaseClient::new(&SupabaseConfig {
        base_url,
        key: SecretString::from(TEST_KEY),
    })
}

/// Whether both the `apikey` header and the bearer token carry the test key.
pub fn authorized(headers: &HeaderMap) -> bool {
    let bearer = format!("Bearer {TEST_KEY}");
    headers.get("apikey").is_some_and(|v| v == TEST_KEY)
        && headers.get("authorization").is_some_and(|v| v == bearer.as_str())
}
