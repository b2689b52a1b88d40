use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cyberark_auth::cache::token_manager::TokenManager;
use cyberark_auth::client::ApiClient;
use cyberark_auth::config::credentials::Credentials;
use cyberark_auth::config::loader;
use cyberark_auth::helpers::secret::mask;
use cyberark_auth::resilience::retry::RetrySettings;
use cyberark_auth::server;
use cyberark_auth::utils::logging;
use cyberark_auth::utils::logging::LogLevel;
use http::header::AUTHORIZATION;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Optional YAML settings file (logging, retry, metrics, server)
    #[arg(short, long, env = "CONFIG")]
    config: Option<String>,
    #[arg(long, env = "LOG_LEVEL" , value_enum)]
    log_level: Option<LogLevel>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch a platform token and print it (masked unless --reveal)
    Token {
        #[arg(long)]
        reveal: bool,
    },
    /// Print the Authorization header value for the current token
    Header,
    /// Authenticated GET against the Privilege Cloud API, printing the JSON response
    Get {
        /// Path relative to the API base, e.g. /Safes
        path: String,
        /// Query parameters as key=value
        #[arg(short, long = "query", value_parser = parse_query)]
        query: Vec<(String, String)>,
    },
    /// Serve /healthz and the metrics endpoint
    Serve,
}

fn parse_query(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Settings and logging
    // -------------------------------

    let args = Args::parse();
    let settings = loader::load(args.config.as_deref())?;
    logging::run(&settings, args.log_level.to_owned());

    // -------------------------------
    // 2. Credentials and token manager
    // -------------------------------

    let credentials = Credentials::from_env().context("invalid CyberArk credentials")?;
    let tokens = Arc::new(
        TokenManager::from_credentials(&credentials)?
            .with_safety_margin_seconds(settings.safety_margin_seconds),
    );
    info!("token endpoint: {}", tokens.source().endpoint());

    // -------------------------------
    // 3. Run command
    // -------------------------------

    match args.command {
        Command::Token { reveal } => {
            let token = tokens.get_valid_token().await?;
            match reveal {
                true => println!("{}", token),
                false => println!("{}", mask(&token)),
            }
            if let Some(expires_at) = tokens.cached_expiry().await {
                info!("token expires at {}", expires_at.to_rfc3339());
            }
        }
        Command::Header => {
            let headers = tokens.get_auth_header().await?;
            if let Some(value) = headers.get(AUTHORIZATION) {
                println!("{}: {}", AUTHORIZATION, value.to_str()?);
            }
        }
        Command::Get { path, query } => {
            let retry = RetrySettings::from_config(&settings.retry);
            let client = ApiClient::from_credentials(&credentials, tokens.clone(), retry)?;
            let query: Vec<(&str, &str)> = query.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
            let response = client.get(&path, &query).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Serve => {
            info!("Service starting...");
            server::server::start(&settings, tokens).await?;
        }
    }

    Ok(())
}
