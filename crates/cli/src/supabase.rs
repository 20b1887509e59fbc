//! Supabase REST and Edge Function client.
//!
//! Every request carries the access key both as the `apikey` header and as
//! a bearer token, which is what PostgREST and the functions gateway expect.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::config::SupabaseConfig;

/// Aggregate RPC returning one row per company.
pub const USER_COUNTS_RPC: &str = "get_company_user_counts";

/// Edge Function that re-checks every subscription.
pub const VALIDATE_SUBSCRIPTIONS_FUNCTION: &str = "validate-subscriptions";

/// Errors from talking to Supabase.
#[derive(Debug, Error)]
pub enum SupabaseError {
    #[error("Invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),

    /// The request never got a response (DNS, refused connection, TLS).
    #[error("Request failed: {0}")]
    Request(String),

    /// The server answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not the expected JSON.
    #[error("Failed to parse response: {0}")]
    Response(String),
}

/// A row of the `companies` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CompanyRecord {
    pub id: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CompanyRecord {
    /// The name, or an empty string when unset.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct UserCountRow {
    company_id: String,
    user_count: u64,
}

/// Status and body of a function call, whatever the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionResponse {
    pub status: u16,
    pub body: String,
}

impl FunctionResponse {
    /// Whether the status is 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Supabase client for one project.
#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: Url,
    key: SecretString,
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("base_url", &self.base_url.as_str())
            .field("key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl SupabaseClient {
    #[must_use]
    pub fn new(config: &SupabaseConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.clone(),
            key: config.key.clone(),
        }
    }

    /// Every company, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the rows cannot be parsed.
    #[instrument(skip(self))]
    pub async fn fetch_companies(&self) -> Result<Vec<CompanyRecord>, SupabaseError> {
        let url = self.endpoint(
            "rest/v1/companies",
            &[("select", "id,name,created_at"), ("order", "created_at.asc")],
        )?;

        let response = send(self.authorized(self.client.get(url))).await?;
        let companies: Vec<CompanyRecord> = parse_json(response).await?;

        debug!(count = companies.len(), "Fetched companies");
        Ok(companies)
    }

    /// Users per company from the aggregate RPC.
    ///
    /// # Errors
    ///
    /// Returns an error if the RPC is missing, fails, or returns unexpected rows.
    #[instrument(skip(self))]
    pub async fn company_user_counts(&self) -> Result<HashMap<String, u64>, SupabaseError> {
        let url = self.endpoint(&format!("rest/v1/rpc/{USER_COUNTS_RPC}"), &[])?;

        let request = self
            .authorized(self.client.post(url))
            .json(&serde_json::json!({}));
        let response = send(request).await?;
        let rows: Vec<UserCountRow> = parse_json(response).await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.company_id, row.user_count))
            .collect())
    }

    /// Count profiles belonging to one company.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the rows cannot be parsed.
    #[instrument(skip(self))]
    pub async fn count_company_users(&self, company_id: &str) -> Result<u64, SupabaseError> {
        let filter = format!("eq.{company_id}");
        let url = self.endpoint(
            "rest/v1/profiles",
            &[("select", "id"), ("company_id", filter.as_str())],
        )?;

        let response = send(self.authorized(self.client.get(url))).await?;
        let rows: Vec<serde_json::Value> = parse_json(response).await?;
        Ok(u64::try_from(rows.len()).unwrap_or(u64::MAX))
    }

    /// Invoke the subscription validation function with an empty JSON body.
    ///
    /// Non-2xx answers are returned, not raised, so the caller can report
    /// the body.
    ///
    /// # Errors
    ///
    /// Returns an error only if no response was received.
    #[instrument(skip(self))]
    pub async fn invoke_validate_subscriptions(&self) -> Result<FunctionResponse, SupabaseError> {
        let url = self.endpoint(
            &format!("functions/v1/{VALIDATE_SUBSCRIPTIONS_FUNCTION}"),
            &[],
        )?;

        let response = self
            .client
            .post(url)
            .bearer_auth(self.key.expose_secret())
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| SupabaseError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| SupabaseError::Response(e.to_string()))?;

        Ok(FunctionResponse { status, body })
    }

    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, SupabaseError> {
        let mut url = self.base_url.join(path)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let key = self.key.expose_secret();
        request.header("apikey", key).bearer_auth(key)
    }
}

/// Send and turn non-2xx statuses into [`SupabaseError::Status`].
async fn send(request: RequestBuilder) -> Result<Response, SupabaseError> {
    let response = request
        .send()
        .await
        .map_err(|e| SupabaseError::Request(e.to_string()))?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(SupabaseError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn parse_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, SupabaseError> {
    response
        .json()
        .await
        .map_err(|e| SupabaseError::Response(e.to_string()))
}
