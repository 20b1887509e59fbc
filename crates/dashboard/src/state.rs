//! Application state shared across handlers.

use std::sync::{Arc, Mutex, MutexGuard};

use pos_dashboard_core::{
    AppSettings, KeyValueStore, SettingUpdate, SettingsStore, StorageError, resolve_currency,
    types::Price,
};
use tracing::debug;

use crate::config::DashboardConfig;
use crate::error::AppError;
use crate::seo::{HeadDocument, SeoInjector, SeoMetadata};
use crate::storage::FileStore;

/// Storage shared by the settings store and one-shot currency lookups.
pub type SharedStore = Arc<dyn KeyValueStore + Send + Sync>;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. The settings store sits behind
/// a mutex that is never held across an `.await`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: DashboardConfig,
    origin: String,
    storage: SharedStore,
    settings: Mutex<SettingsStore<SharedStore>>,
}

impl AppState {
    /// Create state over `storage`, loading the settings record from it.
    #[must_use]
    pub fn new(config: DashboardConfig, storage: SharedStore) -> Self {
        let mut settings = SettingsStore::open(Arc::clone(&storage));
        settings.subscribe(|s| {
            debug!(
                theme = ?s.theme,
                currency = %s.currency,
                last_visited_page = %s.last_visited_page,
                "Settings changed"
            );
        });

        Self {
            inner: Arc::new(AppStateInner {
                origin: config.origin(),
                config,
                storage,
                settings: Mutex::new(settings),
            }),
        }
    }

    /// Create state backed by files in the configured data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created.
    pub fn open(config: DashboardConfig) -> Result<Self, StorageError> {
        let storage = FileStore::open(&config.data_dir)?;
        Ok(Self::new(config, Arc::new(storage)))
    }

    /// Get a reference to the dashboard configuration.
    #[must_use]
    pub fn config(&self) -> &DashboardConfig {
        &self.inner.config
    }

    /// The backing key-value store.
    #[must_use]
    pub fn storage(&self) -> &SharedStore {
        &self.inner.storage
    }

    /// Copy of the current settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings lock is poisoned.
    pub fn settings(&self) -> Result<AppSettings, AppError> {
        Ok(self.lock_settings()?.settings().clone())
    }

    /// Apply one settings update and return the new record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    pub fn update_setting(&self, update: SettingUpdate) -> Result<AppSettings, AppError> {
        let mut store = self.lock_settings()?;
        Ok(store.update(update)?.clone())
    }

    /// Restore default settings and delete the stored record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be removed.
    pub fn reset_settings(&self) -> Result<AppSettings, AppError> {
        let mut store = self.lock_settings()?;
        Ok(store.reset()?.clone())
    }

    /// Remember `path` as the last visited page and return the settings
    /// as they were before the visit.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    pub fn record_visit(&self, path: &str) -> Result<AppSettings, AppError> {
        let mut store = self.lock_settings()?;
        let previous = store.settings().clone();
        store.update(SettingUpdate::LastVisitedPage(path.to_owned()))?;
        Ok(previous)
    }

    /// Price formatter for the stored currency and configured locale.
    #[must_use]
    pub fn price_formatter(&self) -> PriceFormatter {
        PriceFormatter {
            currency: resolve_currency(self.storage()),
            locale: self.inner.config.locale.clone(),
        }
    }

    /// Render the head for the page at `path`.
    #[must_use]
    pub fn head(&self, path: &str, metadata: &SeoMetadata) -> HeadDocument {
        let layout = HeadDocument::new(self.inner.origin.as_str(), path)
            .with_title("POS Dashboard")
            .with_meta("description", "Point-of-sale dashboard");
        let mut injector = SeoInjector::new(layout);
        injector.apply(metadata);
        injector.into_document()
    }

    fn lock_settings(&self) -> Result<MutexGuard<'_, SettingsStore<SharedStore>>, AppError> {
        self.inner
            .settings
            .lock()
            .map_err(|_| AppError::Internal("settings lock poisoned".to_string()))
    }
}

/// Formats prices in one currency and locale.
#[derive(Debug, Clone)]
pub struct PriceFormatter {
    currency: String,
    locale: String,
}

impl PriceFormatter {
    #[must_use]
    pub fn currency(&self) -> &str {
        &self.currency
    }

    #[must_use]
    pub fn format(&self, price: Price) -> String {
        price.display(&self.currency, Some(&self.locale))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pos_dashboard_core::MemoryStore;
    use pos_dashboard_core::settings::SETTINGS_STORAGE_KEY;
    use url::Url;

    use super::*;

    fn state_with(store: MemoryStore) -> AppState {
        let config = DashboardConfig::local(
            Url::parse("https://pos.example.com").unwrap(),
            ".pos-dashboard",
        );
        AppState::new(config, Arc::new(store))
    }

    #[test]
    fn test_loads_stored_settings() {
        let state = state_with(MemoryStore::with_entry(
            SETTINGS_STORAGE_KEY,
            r#"{"currency":"EUR","sidebarCollapsed":true}"#,
        ));
        let settings = state.settings().unwrap();
        assert_eq!(settings.currency, "EUR");
        assert!(settings.sidebar_collapsed);
    }

    #[test]
    fn test_record_visit_returns_previous_page() {
        let state = state_with(MemoryStore::new());
        assert_eq!(state.record_visit("/products").unwrap().last_visited_page, "/");
        assert_eq!(
            state.record_visit("/subscription").unwrap().last_visited_page,
            "/products"
        );
    }

    #[test]
    fn test_price_formatter_follows_currency_update() {
        let state = state_with(MemoryStore::new());
        assert_eq!(state.price_formatter().format(Price::from_cents(300)), "$3.00");

        state
            .update_setting(SettingUpdate::Currency("GBP".to_owned()))
            .unwrap();
        assert_eq!(state.price_formatter().format(Price::from_cents(300)), "£3.00");
    }

    #[test]
    fn test_head_replaces_layout_defaults() {
        let state = state_with(MemoryStore::new());
        let head = state.head("/products", &SeoMetadata::new("Products", "Catalog"));

        assert_eq!(head.title(), "Products");
        assert_eq!(head.metas().len(), 1);
        assert_eq!(head.metas()[0].content, "Catalog");
        assert_eq!(head.links()[0].href, "https://pos.example.com/products");
    }
}
