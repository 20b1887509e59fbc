//! Settings JSON API.

use axum::{Json, extract::State};
use pos_dashboard_core::{AppSettings, SettingUpdate};
use tracing::{info, instrument};

use crate::error::{Result, add_breadcrumb};
use crate::state::AppState;

/// Return the current settings record.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> Result<Json<AppSettings>> {
    Ok(Json(state.settings()?))
}

/// Apply a single-field update and return the new record.
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    Json(update): Json<SettingUpdate>,
) -> Result<Json<AppSettings>> {
    let key = update.key();
    let settings = state.update_setting(update)?;

    info!(key, "Setting updated");
    add_breadcrumb("settings", "Setting updated", &[("key", key)]);
    Ok(Json(settings))
}

/// Restore defaults and delete the stored record.
#[instrument(skip(state))]
pub async fn reset(State(state): State<AppState>) -> Result<Json<AppSettings>> {
    let settings = state.reset_settings()?;

    info!("Settings reset");
    add_breadcrumb("settings", "Settings reset", &[]);
    Ok(Json(settings))
}
