mod auth;
mod batch;
mod classify;
mod config;
mod error;
mod executor;
mod gmail;
mod header;
mod links;
mod mailbox;
mod memory;
mod models;
mod prompt;
#[cfg(test)]
mod testing;

use crate::classify::Engine;
use crate::config::{Cli, Config};
use crate::gmail::GmailClient;
use crate::mailbox::LabelSet;
use crate::prompt::TerminalPrompter;
use anyhow::Context;
use clap::Parser;
use google_gmail1::Gmail;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_target(false).without_time())
        .init();

    let config = Config::load(&cli.config);

    // Handle token reset
    if cli.reset_token {
        auth::RingStorage.clear_token().await?;
        println!("Token cleared. Please restart without --reset-token to re-authenticate.");
        return Ok(());
    }

    let secret = auth::Authenticator::load_secret(&config.credentials_path).await?;
    let authenticator = auth::Authenticator::authenticate(secret).await?;

    let hub = Gmail::new(
        hyper::Client::builder().build(
            hyper_rustls::HttpsConnectorBuilder::new()
                .with_native_roots()
                .context("Failed to load native roots")?
                .https_only()
                .enable_http1()
                .build(),
        ),
        authenticator,
    );
    let client = GmailClient::new(hub);

    let labels = LabelSet::resolve(&client, &config.labels).await?;
    let count = cli.count.unwrap_or(config.default_count);

    let engine = Engine::new(&client, &TerminalPrompter, &labels, &config.mailto);
    let summary = engine.run(&config.candidate_query(), count).await?;
    info!("{}", summary);

    Ok(())
}
