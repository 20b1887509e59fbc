//! Persisted user settings.
//!
//! The whole [`AppSettings`] record lives as one JSON object under
//! [`SETTINGS_STORAGE_KEY`]. Reading never fails: missing or corrupt data
//! falls back to defaults. Every update after the initial load writes the
//! full record back.
//!
//! # Example
//!
//! ```
//! use pos_dashboard_core::{MemoryStore, SettingUpdate, SettingsStore};
//! use pos_dashboard_core::settings::Theme;
//!
//! let mut store = SettingsStore::open(MemoryStore::new());
//! store.update(SettingUpdate::Theme(Theme::Dark)).unwrap();
//! assert_eq!(store.settings().theme, Theme::Dark);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::storage::{KeyValueStore, StorageError};

/// Storage key holding the serialized settings record.
pub const SETTINGS_STORAGE_KEY: &str = "pos-settings";

/// Errors returned when writing settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The storage backend rejected the write.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The record could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The update carries a value the field does not accept.
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

/// Whether `path` is a path on this site, such as `/products?category=meals`.
///
/// Rejects schemes (`javascript:`), protocol-relative URLs (`//host`) and
/// anything else that does not start with a single `/`.
#[must_use]
pub fn is_local_path(path: &str) -> bool {
    let mut chars = path.chars();
    chars.next() == Some('/')
        && !matches!(chars.next(), Some('/' | '\\'))
        && !path.chars().any(char::is_control)
}

/// Color theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Clock display format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TimeFormat {
    #[default]
    #[serde(rename = "12")]
    TwelveHour,
    #[serde(rename = "24")]
    TwentyFourHour,
}

impl Theme {
    /// The stored string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl TimeFormat {
    /// The stored string form, `"12"` or `"24"`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TwelveHour => "12",
            Self::TwentyFourHour => "24",
        }
    }
}

/// User preferences for one dashboard profile.
///
/// Field names serialize in camelCase to match the stored record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    pub theme: Theme,
    pub sidebar_collapsed: bool,
    /// Path of the last page the user opened.
    pub last_visited_page: String,
    pub auto_save: bool,
    /// Locale code, e.g. `en`.
    pub language: String,
    /// ISO 4217 currency code.
    pub currency: String,
    pub date_format: String,
    pub time_format: TimeFormat,
    /// Receipt template identifier.
    pub receipt_template: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            sidebar_collapsed: false,
            last_visited_page: "/".to_owned(),
            auto_save: true,
            language: "en".to_owned(),
            currency: crate::currency::DEFAULT_CURRENCY.to_owned(),
            date_format: "MM/DD/YYYY".to_owned(),
            time_format: TimeFormat::TwelveHour,
            receipt_template: "default".to_owned(),
        }
    }
}

/// A change to a single settings field.
///
/// Serialized as `{"key": "<field>", "value": <value>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "key", content = "value", rename_all = "camelCase")]
pub enum SettingUpdate {
    Theme(Theme),
    SidebarCollapsed(bool),
    LastVisitedPage(String),
    AutoSave(bool),
    Language(String),
    Currency(String),
    DateFormat(String),
    TimeFormat(TimeFormat),
    ReceiptTemplate(String),
}

impl SettingUpdate {
    /// The JSON key of the field this update touches.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Theme(_) => "theme",
            Self::SidebarCollapsed(_) => "sidebarCollapsed",
            Self::LastVisitedPage(_) => "lastVisitedPage",
            Self::AutoSave(_) => "autoSave",
            Self::Language(_) => "language",
            Self::Currency(_) => "currency",
            Self::DateFormat(_) => "dateFormat",
            Self::TimeFormat(_) => "timeFormat",
            Self::ReceiptTemplate(_) => "receiptTemplate",
        }
    }
}

impl SettingUpdate {
    /// Check the new value before it is applied.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidValue`] when a last visited page is
    /// not a local path.
    pub fn validate(&self) -> Result<(), SettingsError> {
        match self {
            Self::LastVisitedPage(path) if !is_local_path(path) => {
                Err(SettingsError::InvalidValue {
                    key: self.key(),
                    reason: format!("{path:?} is not a local path"),
                })
            }
            _ => Ok(()),
        }
    }
}

impl AppSettings {
    /// Apply a single-field update, leaving every other field untouched.
    pub fn apply(&mut self, update: SettingUpdate) {
        match update {
            SettingUpdate::Theme(theme) => self.theme = theme,
            SettingUpdate::SidebarCollapsed(collapsed) => self.sidebar_collapsed = collapsed,
            SettingUpdate::LastVisitedPage(path) => self.last_visited_page = path,
            SettingUpdate::AutoSave(enabled) => self.auto_save = enabled,
            SettingUpdate::Language(language) => self.language = language,
            SettingUpdate::Currency(currency) => self.currency = currency,
            SettingUpdate::DateFormat(format) => self.date_format = format,
            SettingUpdate::TimeFormat(format) => self.time_format = format,
            SettingUpdate::ReceiptTemplate(template) => self.receipt_template = template,
        }
    }

    /// Merge a stored JSON object over the defaults.
    ///
    /// Top-level keys present in `stored` win. Unknown keys are ignored, and
    /// a key whose value has the wrong type keeps its default.
    #[must_use]
    pub fn merge_over_defaults(stored: Map<String, Value>) -> Self {
        let Ok(Value::Object(mut merged)) = serde_json::to_value(Self::default()) else {
            return Self::default();
        };

        for (key, value) in stored {
            if !merged.contains_key(&key) {
                debug!(key = %key, "Ignoring unknown stored setting");
                continue;
            }

            let previous = merged.insert(key.clone(), value);
            if serde_json::from_value::<Self>(Value::Object(merged.clone())).is_err() {
                warn!(key = %key, "Stored setting has an unexpected type, keeping default");
                if let Some(previous) = previous {
                    merged.insert(key, previous);
                }
            }
        }

        let mut settings: Self = serde_json::from_value(Value::Object(merged)).unwrap_or_default();
        if !is_local_path(&settings.last_visited_page) {
            warn!("Stored last visited page is not a local path, keeping default");
            settings.last_visited_page = Self::default().last_visited_page;
        }
        settings
    }
}

/// Read the raw stored settings object.
///
/// Returns `None` when nothing is stored, the backend fails, or the stored
/// text is not a JSON object. Failures are logged, never returned.
pub fn read_stored_record<S: KeyValueStore + ?Sized>(storage: &S) -> Option<Map<String, Value>> {
    let raw = match storage.get(SETTINGS_STORAGE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(error = %e, "Failed to read stored settings");
            return None;
        }
    };

    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(map)) => Some(map),
        Ok(Value::Null) => None,
        Ok(_) => {
            warn!("Stored settings are not a JSON object");
            None
        }
        Err(e) => {
            warn!(error = %e, "Failed to parse stored settings");
            None
        }
    }
}

type Listener = Box<dyn Fn(&AppSettings) + Send + Sync>;

/// The settings record for one profile, backed by a [`KeyValueStore`].
///
/// A new store is in the loading state until [`SettingsStore::load`] runs.
/// While loading, updates change memory only so defaults never overwrite
/// a record that has not been read yet.
pub struct SettingsStore<S> {
    storage: S,
    settings: AppSettings,
    loading: bool,
    listeners: Vec<Listener>,
}

impl<S> std::fmt::Debug for SettingsStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore")
            .field("settings", &self.settings)
            .field("loading", &self.loading)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl<S: KeyValueStore> SettingsStore<S> {
    /// Create a store holding defaults, not yet loaded.
    #[must_use]
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            settings: AppSettings::default(),
            loading: true,
            listeners: Vec::new(),
        }
    }

    /// Create a store and load it immediately.
    #[must_use]
    pub fn open(storage: S) -> Self {
        let mut store = Self::new(storage);
        store.load();
        store
    }

    /// Read the stored record and merge it over the defaults.
    ///
    /// Absent or unreadable data yields the defaults.
    pub fn load(&mut self) -> &AppSettings {
        self.settings = read_stored_record(&self.storage)
            .map(AppSettings::merge_over_defaults)
            .unwrap_or_default();
        self.loading = false;
        debug!(settings = ?self.settings, "Settings loaded");
        self.notify();
        &self.settings
    }

    /// Current in-memory settings.
    #[must_use]
    pub const fn settings(&self) -> &AppSettings {
        &self.settings
    }

    /// Whether the initial load has not completed yet.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// The backing store.
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Set one field and write the full record.
    ///
    /// Before the initial load only memory changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is rejected by
    /// [`SettingUpdate::validate`], leaving the record unchanged, or if the
    /// record cannot be written.
    pub fn update(&mut self, update: SettingUpdate) -> Result<&AppSettings, SettingsError> {
        debug!(key = update.key(), "Updating setting");
        update.validate()?;
        self.settings.apply(update);
        self.persist()?;
        self.notify();
        Ok(&self.settings)
    }

    /// Restore defaults and delete the stored record.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored record cannot be removed.
    pub fn reset(&mut self) -> Result<&AppSettings, SettingsError> {
        self.settings = AppSettings::default();
        self.storage.remove(SETTINGS_STORAGE_KEY)?;
        self.notify();
        Ok(&self.settings)
    }

    /// Register a callback run with the new record after every load,
    /// update and reset.
    pub fn subscribe(&mut self, listener: impl Fn(&AppSettings) + Send + Sync + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn persist(&self) -> Result<(), SettingsError> {
        if self.loading {
            debug!("Skipping settings persist while loading");
            return Ok(());
        }

        let json = serde_json::to_string(&self.settings)?;
        self.storage.set(SETTINGS_STORAGE_KEY, &json)?;
        Ok(())
    }

    fn notify(&self) {
        for listener in &self.listeners {
            listener(&self.settings);
        }
    }
}
