//! Supabase connection settings.
//!
//! # Environment Variables
//!
//! The first variable found in each list wins:
//!
//! - Base URL: `SUPABASE_URL`, `VITE_SUPABASE_URL`
//! - Access key: `SUPABASE_SERVICE_ROLE_KEY`, `VITE_SUPABASE_ANON_KEY`
//!
//! `--base-url` and `--key` override the environment.

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Variables consulted for the project URL, in order.
pub const BASE_URL_VARS: [&str; 2] = ["SUPABASE_URL", "VITE_SUPABASE_URL"];

/// Variables consulted for the access key, in order.
pub const KEY_VARS: [&str; 2] = ["SUPABASE_SERVICE_ROLE_KEY", "VITE_SUPABASE_ANON_KEY"];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: set one of {0}")]
    Missing(String),
    #[error("Invalid base URL {0}: {1}")]
    InvalidUrl(String, String),
}

/// Where to reach the Supabase project and how to authenticate.
///
/// Implements `Debug` manually to redact the key.
#[derive(Clone)]
pub struct SupabaseConfig {
    /// Project URL, always ending in `/`.
    pub base_url: Url,
    pub key: SecretString,
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("base_url", &self.base_url.as_str())
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl SupabaseConfig {
    /// Load from flags, then the process environment.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the URL or key is missing, or the URL is invalid.
    pub fn from_env(base_url: Option<String>, key: Option<String>) -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::resolve(base_url, key, |name| std::env::var(name).ok())
    }

    /// Resolve from flags, falling back to `lookup` for each variable list.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the URL or key is missing, or the URL is invalid.
    pub fn resolve(
        base_url: Option<String>,
        key: Option<String>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let first_set = |names: &[&str]| {
            names
                .iter()
                .find_map(|name| lookup(name).filter(|v| !v.trim().is_empty()))
        };

        let raw_url = base_url
            .filter(|v| !v.trim().is_empty())
            .or_else(|| first_set(&BASE_URL_VARS))
            .ok_or_else(|| ConfigError::Missing(BASE_URL_VARS.join(" or ")))?;
        let key = key
            .filter(|v| !v.trim().is_empty())
            .or_else(|| first_set(&KEY_VARS))
            .ok_or_else(|| ConfigError::Missing(KEY_VARS.join(" or ")))?;

        Ok(Self {
            base_url: parse_base_url(raw_url.trim())?,
            key: SecretString::from(key),
        })
    }
}

/// Parse the project URL, adding a trailing slash so endpoint paths join
/// beneath it.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |msg: String| ConfigError::InvalidUrl(raw.to_string(), msg);

    let mut url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_primary_variables_win() {
        let config = SupabaseConfig::resolve(
            None,
            None,
            env(&[
                ("SUPABASE_URL", "https://primary.supabase.co"),
                ("VITE_SUPABASE_URL", "https://vite.supabase.co"),
                ("SUPABASE_SERVICE_ROLE_KEY", "service-key"),
                ("VITE_SUPABASE_ANON_KEY", "anon-key"),
            ]),
        )
        .unwrap();

        assert_eq!(config.base_url.as_str(), "https://primary.supabase.co/");
        assert_eq!(config.key.expose_secret(), "service-key");
    }

    #[test]
    fn test_falls_back_to_alternate_variables() {
        let config = SupabaseConfig::resolve(
            None,
            None,
            env(&[
                ("VITE_SUPABASE_URL", "https://vite.supabase.co"),
                ("VITE_SUPABASE_ANON_KEY", "anon-key"),
            ]),
        )
        .unwrap();

        assert_eq!(config.base_url.host_str(), Some("vite.supabase.co"));
        assert_eq!(config.key.expose_secret(), "anon-key");
    }

    #[test]
    fn test_flags_override_environment() {
        let config = SupabaseConfig::resolve(
            Some("http://localhost:54321".to_string()),
            Some("flag-key".to_string()),
            env(&[
                ("SUPABASE_URL", "https://primary.supabase.co"),
                ("SUPABASE_SERVICE_ROLE_KEY", "service-key"),
            ]),
        )
        .unwrap();

        assert_eq!(config.base_url.as_str(), "http://localhost:54321/");
        assert_eq!(config.key.expose_secret(), "flag-key");
    }

    #[test]
    fn test_missing_values() {
        let err = SupabaseConfig::resolve(None, None, env(&[("SUPABASE_SERVICE_ROLE_KEY", "k")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Missing(ref vars) if vars.contains("SUPABASE_URL")));

        let err = SupabaseConfig::resolve(None, None, env(&[("SUPABASE_URL", "https://x.co")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Missing(ref vars) if vars.contains("ANON_KEY")));
    }

    #[test]
    fn test_invalid_url() {
        let err = SupabaseConfig::resolve(
            Some("not a url".to_string()),
            Some("k".to_string()),
            env(&[]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl(_, _)));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = SupabaseConfig::resolve(
            Some("https://x.supabase.co".to_string()),
            Some("super_secret_service_key".to_string()),
            env(&[]),
        )
        .unwrap();

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("x.supabase.co"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_service_key"));
    }
}
