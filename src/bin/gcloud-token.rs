use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use gcloud_rest::config::loader;
use gcloud_rest::config::settings::SettingsConfig;
use gcloud_rest::observability::metrics::get_metrics;
use gcloud_rest::resilience::retry::RetrySettings;
use gcloud_rest::utils::logging::{self, LogLevel};
use gcloud_rest::{AnonymousToken, GcpToken};
use reqwest::Client;
use tracing::info;

/// Print a currently valid Google Cloud access token to stdout.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML settings file
    #[arg(short, long, env = "GCLOUD_TOKEN_CONFIG")]
    config: Option<PathBuf>,
    /// Credentials file, overrides discovery and the settings file
    #[arg(long)]
    credentials: Option<PathBuf>,
    /// OAuth scope, repeat for several
    #[arg(short, long = "scope")]
    scopes: Vec<String>,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
    /// Print the placeholder token without touching the network
    #[arg(long)]
    anonymous: bool,
    /// Refresh timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,
    /// Dump the collected metrics to stderr before exiting
    #[arg(long)]
    print_metrics: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let settings = match &args.config {
        Some(path) => loader::file_to_config(path)?,
        None => SettingsConfig::default(),
    };
    logging::init_logging(&logging::resolve(settings.logging.as_ref(), args.log_level));

    let mut auth = settings.auth;
    if args.credentials.is_some() {
        auth.credentials = args.credentials;
    }
    if !args.scopes.is_empty() {
        auth.scopes = args.scopes;
    }
    let timeout = Duration::from_secs(args.timeout.unwrap_or(auth.timeout_seconds));

    let token = if args.anonymous || auth.anonymous {
        AnonymousToken::new(auth.scopes).get_token().await?
    } else {
        let client = Client::builder().build().context("failed to build HTTP client")?;
        let mut builder = GcpToken::builder(client)
            .scopes(auth.scopes)
            .default_token_ttl(auth.default_token_ttl)
            .token_ttl_leeway(auth.token_ttl_leeway)
            .timeout(timeout);
        if let Some(retry) = RetrySettings::from_config(settings.retry.as_ref()) {
            builder = builder.retry(retry.decorator());
        }
        if let Some(path) = auth.credentials {
            builder = builder.credentials(path);
        }

        let session = builder.build()?;
        info!(credential_type = %session.credential_type(), "fetching access token");
        session.get_token().await?
    };

    println!("{token}");

    if args.print_metrics {
        eprintln!("{}", get_metrics().await.encode()?);
    }
    Ok(())
}
