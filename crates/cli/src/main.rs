//! POS CLI - admin tools for the dashboard's Supabase backend.
//!
//! # Usage
//!
//! ```bash
//! # Report duplicate and near-duplicate company names
//! pos-cli audit-companies
//!
//! # Trigger the subscription validation Edge Function
//! pos-cli validate-subscriptions
//!
//! # Point at another project
//! pos-cli --base-url http://localhost:54321 --key "$KEY" validate-subscriptions
//! ```
//!
//! # Commands
//!
//! - `audit-companies` - Find duplicate companies with their user counts
//! - `validate-subscriptions` - Run server-side subscription validation
//!
//! Both exit with status 1 on missing configuration or any request failure.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;
mod config;
mod supabase;
#[cfg(test)]
mod test_support;

use config::SupabaseConfig;
use supabase::SupabaseClient;

#[derive(Parser)]
#[command(name = "pos-cli")]
#[command(author, version, about = "POS dashboard admin tools")]
struct Cli {
    /// Supabase project URL (default: `SUPABASE_URL` or `VITE_SUPABASE_URL`)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Access key (default: `SUPABASE_SERVICE_ROLE_KEY` or `VITE_SUPABASE_ANON_KEY`)
    #[arg(long, global = true)]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report companies with duplicate names and their user counts
    AuditCompanies,
    /// Trigger the subscription validation function
    ValidateSubscriptions,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result = run(cli).await;
    if let Err(e) = &result {
        tracing::error!("Command failed: {e}");
    }
    std::process::exit(exit_code(&result));
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = SupabaseConfig::from_env(cli.base_url, cli.key)?;
    let client = SupabaseClient::new(&config);

    match cli.command {
        Commands::AuditCompanies => {
            let report = commands::audit::run(&client).await?;
            #[allow(clippy::print_stdout)]
            {
                println!("{report}");
            }
        }
        Commands::ValidateSubscriptions => {
            let response = commands::validate::run(&client).await?;
            #[allow(clippy::print_stdout)]
            {
                println!("Status: {}", response.status);
                println!("{}", response.body);
            }
        }
    }
    Ok(())
}

/// 0 on success, 1 on any failure.
fn exit_code<T, E>(result: &Result<T, E>) -> i32 {
    i32::from(result.is_err())
}

#[cfg(test)]
mod tests {
    use axum::{Router, http::StatusCode, routing::post};
    use clap::CommandFactory;

    use super::*;
    use crate::test_support::{TEST_KEY, closed_port_url, spawn};

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "pos-cli",
            "validate-subscriptions",
            "--base-url",
            "http://localhost:54321",
            "--key",
            "k",
        ])
        .unwrap_or_else(|e| panic!("{e}"));

        assert!(matches!(cli.command, Commands::ValidateSubscriptions));
        assert_eq!(cli.base_url.as_deref(), Some("http://localhost:54321"));
        assert_eq!(cli.key.as_deref(), Some("k"));
    }

    #[test]
    fn test_exit_code() {
        assert_eq!(exit_code::<(), ()>(&Ok(())), 0);
        assert_eq!(exit_code::<(), &str>(&Err("boom")), 1);
    }

    #[tokio::test]
    async fn test_validate_subscriptions_exit_codes() {
        let path = "/functions/v1/validate-subscriptions";
        let ok = spawn(Router::new().route(path, post(|| async { r#"{"ok":true}"# }))).await;
        let failing = spawn(Router::new().route(
            path,
            post(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
        ))
        .await;

        for (url, expected) in [(ok, 0), (failing, 1), (closed_port_url().await, 1)] {
            let cli = Cli {
                base_url: Some(url.to_string()),
                key: Some(TEST_KEY.to_string()),
                command: Commands::ValidateSubscriptions,
            };
            assert_eq!(exit_code(&run(cli).await), expected, "base url {url}");
        }
    }
}
