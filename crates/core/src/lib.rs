//! POS Dashboard Core - settings, currency, catalog and name utilities.
//!
//! This crate provides the logic shared by every POS dashboard component:
//! - `dashboard` - Server-rendered web dashboard and settings API
//! - `cli` - Admin tools talking to the hosted Supabase backend
//!
//! # Architecture
//!
//! The core crate performs no network I/O. Durable state goes through the
//! [`storage::KeyValueStore`] port, so callers pick the backing store
//! (in-memory for tests, files on disk for the dashboard).
//!
//! # Modules
//!
//! - [`storage`] - Key-value persistence port and in-memory store
//! - [`settings`] - Persisted user settings record with merge-over-defaults
//! - [`currency`] - Stored currency resolution and locale-aware formatting
//! - [`names`] - Company name normalization
//! - [`catalog`] - Static product catalog
//! - [`plans`] - Subscription plans
//! - [`types`] - Newtype wrappers for ids and prices

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod currency;
pub mod names;
pub mod plans;
pub mod settings;
pub mod storage;
pub mod types;

pub use catalog::{Category, Product};
pub use currency::{format_currency, format_currency_with_store, resolve_currency};
pub use names::normalize_company_name;
pub use plans::{BillingCycle, PlanTier, SubscriptionPlan};
pub use settings::{AppSettings, SettingUpdate, SettingsError, SettingsStore};
pub use storage::{KeyValueStore, MemoryStore, StorageError};
pub use types::*;
