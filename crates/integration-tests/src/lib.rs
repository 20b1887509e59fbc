//! Integration tests for the POS dashboard.
//!
//! Each test starts a real dashboard server on an ephemeral port, backed by
//! file storage in a fresh temporary directory, and talks to it over HTTP.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p pos-dashboard-integration-tests
//! ```

use std::net::SocketAddr;
use std::path::Path;

use pos_dashboard::config::DashboardConfig;
use pos_dashboard::state::AppState;
use pos_dashboard_core::settings::SETTINGS_STORAGE_KEY;
use reqwest::Client;
use tempfile::TempDir;
use url::Url;

/// Public origin the test server believes it runs at.
pub const TEST_ORIGIN: &str = "https://pos.example.com";

/// A running dashboard and a client pointed at it.
pub struct TestContext {
    pub client: Client,
    pub addr: SocketAddr,
    data_dir: TempDir,
}

impl TestContext {
    /// Start a dashboard over an empty data directory.
    ///
    /// # Panics
    ///
    /// Panics if the server cannot be started.
    pub async fn start() -> Self {
        let data_dir = tempfile::tempdir().expect("Failed to create temp dir");
        Self::start_in(data_dir).await
    }

    /// Start a dashboard whose data directory already holds `record` as the
    /// stored settings.
    ///
    /// # Panics
    ///
    /// Panics if the record cannot be written or the server cannot start.
    pub async fn start_with_settings(record: &str) -> Self {
        let data_dir = tempfile::tempdir().expect("Failed to create temp dir");
        std::fs::write(record_path(data_dir.path()), record)
            .expect("Failed to seed settings");
        Self::start_in(data_dir).await
    }

    async fn start_in(data_dir: TempDir) -> Self {
        let config = DashboardConfig::local(
            Url::parse(TEST_ORIGIN).expect("Invalid test origin"),
            data_dir.path(),
        );
        let state = AppState::open(config).expect("Failed to open storage");

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("No local address");
        tokio::spawn(async move {
            axum::serve(listener, pos_dashboard::app(state))
                .await
                .expect("Server error");
        });

        Self {
            client: Client::new(),
            addr,
            data_dir,
        }
    }

    /// Absolute URL for `path` on the test server.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Directory holding the stored records.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        self.data_dir.path()
    }

    /// The stored settings record, if any.
    ///
    /// # Panics
    ///
    /// Panics if the file exists but is not valid JSON.
    #[must_use]
    pub fn stored_settings(&self) -> Option<serde_json::Value> {
        let raw = std::fs::read_to_string(record_path(self.data_dir())).ok()?;
        Some(serde_json::from_str(&raw).expect("Stored settings are not JSON"))
    }
}

fn record_path(data_dir: &Path) -> std::path::PathBuf {
    data_dir.join(format!("{SETTINGS_STORAGE_KEY}.json"))
}
