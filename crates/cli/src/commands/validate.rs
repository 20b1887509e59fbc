//! Subscription validation trigger.
//!
//! # Usage
//!
//! ```bash
//! pos-cli validate-subscriptions
//! ```
//!
//! Calls the `validate-subscriptions` Edge Function once. Succeeds only on a
//! 2xx answer. There is no retry.

use thiserror::Error;
use tracing::{info, instrument};

use crate::supabase::{FunctionResponse, SupabaseClient, SupabaseError};

/// Errors from a validation run.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// No response was received.
    #[error("Validation request failed: {0}")]
    Request(#[from] SupabaseError),

    /// The function answered with a non-2xx status.
    #[error("Validation rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Invoke the validation function and return its response.
///
/// # Errors
///
/// Returns [`ValidationError::Request`] on a network failure and
/// [`ValidationError::Rejected`] on a non-2xx status.
#[instrument(skip(client))]
pub async fn run(client: &SupabaseClient) -> Result<FunctionResponse, ValidationError> {
    let response = client.invoke_validate_subscriptions().await?;
    info!(status = response.status, body = %response.body, "Validation response");

    if response.is_success() {
        Ok(response)
    } else {
        Err(ValidationError::Rejected {
            status: response.status,
            body: response.body,
        })
    }
}
